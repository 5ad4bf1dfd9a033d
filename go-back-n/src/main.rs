//! Entry point for `gbn`.
//!
//! Reads a file, pushes it through an in-process Go-Back-N sender and
//! receiver joined by a lossy transport, and writes the reassembled stream
//! to the output file.  All protocol work lives in the library; `main.rs`
//! owns only process setup (logging, argument parsing, file I/O).

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::{ArgGroup, Parser};

use go_back_n::{
    transport, DropFirstAttempt, EveryNth, GbnConfig, GbnReceiver, GbnSender,
    LossPolicy, NeverDrop, RandomLoss, SeqNum,
};

/// Go-Back-N ARQ file transfer over a simulated lossy channel.
#[derive(Parser)]
#[command(author, version, about)]
#[command(group(ArgGroup::new("loss").args(["drop_every", "drop_seq", "loss_rate"])))]
struct Cli {
    /// File to send.
    #[arg(short, long)]
    input: PathBuf,

    /// File the receiver writes the reassembled stream to.
    #[arg(short, long)]
    output: PathBuf,

    /// Maximum number of unacknowledged packets in flight.
    #[arg(short, long, default_value_t = 4)]
    window: usize,

    /// Packet size in bytes, including the sequence-number field.
    #[arg(short = 'c', long, default_value_t = 64)]
    packet_capacity: usize,

    /// Width of the sequence-number field in bytes (1-4).
    #[arg(long, default_value_t = 2)]
    seq_width: usize,

    /// Retransmission timeout in milliseconds.
    #[arg(short, long, default_value_t = 1000)]
    timeout_ms: u64,

    /// How often the sender checks for a timeout, in milliseconds.
    #[arg(long, default_value_t = 100)]
    poll_ms: u64,

    /// Drop every N-th transmission attempt (each sequence number at most once).
    #[arg(long, value_name = "N")]
    drop_every: Option<u64>,

    /// Drop the first transmission of these sequence numbers.
    #[arg(long, value_name = "SEQ", value_delimiter = ',')]
    drop_seq: Vec<SeqNum>,

    /// Drop each attempt with this probability (each sequence number at most once).
    #[arg(long, value_name = "P")]
    loss_rate: Option<f64>,

    /// Seed for --loss-rate.
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

impl Cli {
    fn config(&self) -> GbnConfig {
        GbnConfig {
            window_size: self.window,
            packet_capacity: self.packet_capacity,
            seq_width: self.seq_width,
            timeout: Duration::from_millis(self.timeout_ms),
            poll_interval: Duration::from_millis(self.poll_ms),
            ..GbnConfig::default()
        }
    }

    fn loss_policy(&self) -> Box<dyn LossPolicy> {
        if let Some(n) = self.drop_every {
            Box::new(EveryNth::new(n))
        } else if !self.drop_seq.is_empty() {
            Box::new(DropFirstAttempt::new(self.drop_seq.iter().copied()))
        } else if let Some(rate) = self.loss_rate {
            Box::new(RandomLoss::new(rate, self.seed))
        } else {
            Box::new(NeverDrop)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialise env_logger; set RUST_LOG to control verbosity.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Cli::parse()).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(2),
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Returns whether the transfer completed.
async fn run(cli: Cli) -> anyhow::Result<bool> {
    let config = cli.config();
    config.validate()?;

    let data = tokio::fs::read(&cli.input)
        .await
        .with_context(|| format!("reading {}", cli.input.display()))?;
    let total = data.len().div_ceil(config.payload_capacity());

    let (tx_link, rx_link) = transport::pair(cli.loss_policy());
    let receiver = GbnReceiver::new(&config, rx_link)?.with_expected_total(total);

    let output = cli.output.clone();
    let rx_task = tokio::spawn(async move {
        let file = tokio::fs::File::create(&output)
            .await
            .with_context(|| format!("creating {}", output.display()))?;
        anyhow::Ok(receiver.run(file).await?)
    });

    let sent = GbnSender::new(config, tx_link)?.run(&data[..]).await?;
    let received = rx_task.await.context("receiver task panicked")??;

    log::info!(
        "sender: {} packets, {} transmissions ({} retransmissions), all sent: {}, all acknowledged: {}",
        sent.total_packets,
        sent.transmissions,
        sent.retransmissions,
        sent.all_packets_sent,
        sent.all_packets_acknowledged
    );
    log::info!(
        "receiver: {} packets, {} bytes, all received: {}",
        received.packets_received,
        received.bytes_received,
        received.all_packets_received
    );

    Ok(sent.all_packets_sent && sent.all_packets_acknowledged && received.all_packets_received)
}
