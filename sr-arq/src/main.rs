//! Entry point for `sr-arq`.
//!
//! Parses CLI arguments and dispatches into the emulator or one of the two
//! UDP endpoints.  All protocol work is delegated to library modules;
//! `main.rs` owns only process setup (logging, argument parsing).

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use sr_arq::config::{ArqConfig, DEFAULT_RTT, DEFAULT_SEQ_SPACE, DEFAULT_WINDOW_SIZE};
use sr_arq::packet::Message;
use sr_arq::simulator::{Simulation, SimulatorConfig};
use sr_arq::socket::Socket;
use sr_arq::transfer;

/// Selective-Repeat ARQ over an emulated or real (UDP) channel.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    mode: Mode,
}

/// Protocol parameters shared by every mode.
#[derive(Args)]
struct ProtocolArgs {
    /// Maximum number of outstanding / buffered packets.
    #[arg(short, long, default_value_t = DEFAULT_WINDOW_SIZE)]
    window: usize,
    /// Size of the sequence-number ring (at least twice the window).
    #[arg(long, default_value_t = DEFAULT_SEQ_SPACE)]
    seq_space: usize,
    /// Retransmission timeout in time units.
    #[arg(long, default_value_t = DEFAULT_RTT)]
    rtt: f64,
}

impl ProtocolArgs {
    fn config(&self) -> Result<ArqConfig> {
        ArqConfig::new(self.window, self.seq_space, self.rtt).context("invalid protocol parameters")
    }
}

#[derive(Subcommand)]
enum Mode {
    /// Run the discrete-event emulator and print a statistics summary.
    Simulate {
        #[command(flatten)]
        protocol: ProtocolArgs,
        /// Number of messages to send from A.
        #[arg(short, long, default_value_t = 20)]
        messages: usize,
        /// Packet loss probability.
        #[arg(long, default_value_t = 0.0)]
        loss: f64,
        /// Packet corruption probability.
        #[arg(long, default_value_t = 0.0)]
        corrupt: f64,
        /// Mean time between messages from A's application.
        #[arg(long, default_value_t = 10.0)]
        interarrival: f64,
        /// RNG seed.
        #[arg(long, default_value_t = 1)]
        seed: u64,
    },
    /// Send generated messages to a receiver over UDP.
    Send {
        #[command(flatten)]
        protocol: ProtocolArgs,
        /// Receiver address (e.g. 127.0.0.1:9000).
        #[arg(short, long)]
        server: SocketAddr,
        /// Local address to bind.
        #[arg(short, long, default_value = "0.0.0.0:0")]
        bind: SocketAddr,
        /// Number of messages to send.
        #[arg(short, long, default_value_t = 20)]
        count: usize,
        /// Wall-clock length of one time unit, in milliseconds.
        #[arg(long, default_value_t = 1)]
        time_unit_ms: u64,
    },
    /// Receive messages over UDP and print them.
    Receive {
        #[command(flatten)]
        protocol: ProtocolArgs,
        /// Local address to bind.
        #[arg(short, long, default_value = "0.0.0.0:9000")]
        bind: SocketAddr,
        /// Number of messages to wait for.
        #[arg(short, long, default_value_t = 20)]
        count: usize,
        /// Quiet period after the last delivery before exiting, in milliseconds.
        #[arg(long, default_value_t = 500)]
        linger_ms: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise env_logger; set RUST_LOG to control verbosity.
    env_logger::init();

    let cli = Cli::parse();

    match cli.mode {
        Mode::Simulate {
            protocol,
            messages,
            loss,
            corrupt,
            interarrival,
            seed,
        } => {
            let config = SimulatorConfig {
                messages,
                loss_prob: loss,
                corrupt_prob: corrupt,
                mean_interarrival: interarrival,
                seed,
                ..SimulatorConfig::default()
            };
            log::info!(
                "Simulating {messages} messages (loss={loss}, corrupt={corrupt}, seed={seed})"
            );
            let report = Simulation::new(protocol.config()?, config)
                .context("invalid emulator parameters")?
                .run();
            println!("{report}");
        }
        Mode::Send {
            protocol,
            server,
            bind,
            count,
            time_unit_ms,
        } => {
            let config = protocol.config()?;
            let socket = Socket::bind(bind).await.context("bind failed")?;
            log::info!("Sending {count} messages from {} to {server}", socket.local_addr);
            let stats = transfer::send_messages(
                &socket,
                server,
                config,
                (0..count).map(Message::letter),
                Duration::from_millis(time_unit_ms),
            )
            .await?;
            println!("{stats:#?}");
        }
        Mode::Receive {
            protocol,
            bind,
            count,
            linger_ms,
        } => {
            let config = protocol.config()?;
            let socket = Socket::bind(bind).await.context("bind failed")?;
            log::info!("Receiving {count} messages on {}", socket.local_addr);
            let delivery = transfer::receive_messages(
                &socket,
                config,
                count,
                Duration::from_millis(linger_ms),
            )
            .await?;
            for payload in &delivery.payloads {
                println!("{}", String::from_utf8_lossy(payload));
            }
            println!("{:#?}", delivery.stats);
        }
    }

    Ok(())
}
