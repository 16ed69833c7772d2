//! Depthcast receiver — entry point.
//!
//! ```text
//! depthcast-receiver                  Run with defaults
//! depthcast-receiver --config <path>  Load a custom config TOML
//! depthcast-receiver --gen-config     Write default config to stdout
//! ```
//!
//! Listens for frame datagrams, reassembles them, and periodically
//! logs a stream summary. A real consumer would clone the client's
//! frame receiver and render the points instead.

mod config;

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tokio::net::UdpSocket;
use tracing::info;
use tracing_subscriber::EnvFilter;

use depthcast_core::stream::StreamClient;
use depthcast_core::BroadcastChannel;

use crate::config::ReceiverConfig;

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "depthcast-receiver", about = "Depthcast frame reassembly client")]
struct Cli {
    /// Path to configuration TOML file.
    #[arg(short, long, default_value = "depthcast-receiver.toml")]
    config: PathBuf,

    /// Print the default configuration to stdout and exit.
    #[arg(long)]
    gen_config: bool,
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // --gen-config: dump defaults and exit.
    if cli.gen_config {
        let text = toml::to_string_pretty(&ReceiverConfig::default())?;
        println!("{text}");
        return Ok(());
    }

    // Load config.
    let config = ReceiverConfig::load(&cli.config);

    // Init tracing.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("depthcast-receiver v{}", env!("CARGO_PKG_VERSION"));
    info!("listening on {}", config.network.listen_addr);
    info!("channel: {}", config.network.channel);

    let socket = UdpSocket::bind(&config.network.listen_addr).await?;
    let transport = BroadcastChannel::listen(socket, config.network.channel);

    let mut client = StreamClient::new(transport);
    let stats_rx = client.stats_receiver();
    let frame_rx = client.frame_receiver();
    let stop = client.stop_handle();
    let range = config.depth_range();

    // Ctrl-C handler.
    let stop_clone = stop.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Ctrl-C received — shutting down");
        stop_clone.store(false, std::sync::atomic::Ordering::SeqCst);
    });

    // Periodic stream summary.
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(2));
        loop {
            ticker.tick().await;
            let stats = stats_rx.borrow().clone();
            let frame = frame_rx.borrow().clone();
            let valid = (0..frame.len())
                .filter(|&i| frame.depth_valid(i, &range))
                .count();
            info!(
                "{}x{} | {:.1} cycles/s | {} msgs | {} valid points | desyncs {} truncated {} malformed {}",
                stats.width,
                stats.height,
                stats.cycles_per_second,
                stats.total_messages,
                valid,
                stats.decode.desyncs,
                stats.decode.truncated,
                stats.malformed,
            );
        }
    });

    client.run().await?;

    Ok(())
}
