//! `go-back-n` — reliable, in-order byte stream delivery over a lossy,
//! order-preserving channel using Go-Back-N ARQ.
//!
//! # Architecture
//!
//! ```text
//!  byte source                                               byte sink
//!      │                                                         ▲
//!  ┌───▼──────┐  DataFrame   ┌────────────┐  DataFrame  ┌────────┴─┐
//!  │  Sender  │─────────────▶│ LossPolicy │────────────▶│ Receiver │
//!  │ (Window) │              └────────────┘             └────┬─────┘
//!  └───▲──────┘                                               │
//!      │                    AckFrame (cumulative)             │
//!      └──────────────────────────────────────────────────────┘
//! ```
//!
//! Each module has a single responsibility:
//! - [`config`]      — protocol parameters and validation
//! - [`error`]       — error types
//! - [`event`]       — structured protocol events and sinks
//! - [`packet`]      — packet type and wire format
//! - [`packetizer`]  — byte stream → numbered packets
//! - [`simulator`]   — injectable loss policies
//! - [`transport`]   — in-process data/ack conduit pair
//! - [`window`]      — Go-Back-N send window (base, slots, timeouts)
//! - [`state`]       — endpoint state-machine types
//! - [`sender`]      — sender endpoint: event loop over acks and timeouts
//! - [`receiver`]    — receiver endpoint: in-order reassembly, cumulative acks
//!
//! # Example
//!
//! ```no_run
//! use go_back_n::{transport, GbnConfig, GbnReceiver, GbnSender, NeverDrop};
//!
//! # async fn demo() -> Result<(), go_back_n::GbnError> {
//! let config = GbnConfig::default();
//! let (tx_link, rx_link) = transport::pair(NeverDrop);
//!
//! let receiver = GbnReceiver::new(&config, rx_link)?;
//! let rx = tokio::spawn(async move {
//!     let mut out = Vec::new();
//!     receiver.run(&mut out).await.map(|report| (report, out))
//! });
//!
//! let report = GbnSender::new(config, tx_link)?.run(&b"hello"[..]).await?;
//! assert!(report.all_packets_acknowledged);
//! # let _ = rx.await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod packet;
pub mod packetizer;
pub mod receiver;
pub mod sender;
pub mod simulator;
pub mod state;
pub mod transport;
pub mod window;

pub use config::GbnConfig;
pub use error::{ConduitClosed, GbnError, PacketError};
pub use event::{Event, EventKind, EventLog, EventSink, LogSink, Role};
pub use packet::{Packet, SeqNum};
pub use receiver::{GbnReceiver, ReceiverReport};
pub use sender::{GbnSender, SenderReport};
pub use simulator::{DropFirstAttempt, EveryNth, LossPolicy, NeverDrop, RandomLoss};
pub use tokio_util::sync::CancellationToken;
