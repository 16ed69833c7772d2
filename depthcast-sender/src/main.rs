//! Depthcast sender — entry point.
//!
//! ```text
//! depthcast-sender                  Run with defaults
//! depthcast-sender --config <path>  Load a custom config TOML
//! depthcast-sender --gen-config     Write default config to stdout
//! ```

mod config;
mod source;

use std::path::PathBuf;

use clap::Parser;
use tokio::net::UdpSocket;
use tracing::info;
use tracing_subscriber::EnvFilter;

use depthcast_core::stream::{Resolution, StreamService};
use depthcast_core::BroadcastChannel;

use crate::config::SenderConfig;
use crate::source::SyntheticSource;

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "depthcast-sender", about = "Depthcast frame broadcast service")]
struct Cli {
    /// Path to configuration TOML file.
    #[arg(short, long, default_value = "depthcast-sender.toml")]
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
        let text = toml::to_string_pretty(&SenderConfig::default())?;
        println!("{text}");
        return Ok(());
    }

    // Load config.
    let config = SenderConfig::load(&cli.config);

    // Init tracing.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("depthcast-sender v{}", env!("CARGO_PKG_VERSION"));
    info!("target: {}", config.network.target_addr);
    info!("channel: {}", config.network.channel);
    info!("tick rate: {}", config.stream.tick_rate);

    // Broadcast socket.
    let socket = UdpSocket::bind(&config.network.bind_addr).await?;
    socket.set_broadcast(true)?;
    let remote = config.network.target_addr.parse()?;
    let transport = BroadcastChannel::connect(socket, remote, config.network.channel);

    let source = SyntheticSource::new(
        Resolution::new(config.capture.depth_width, config.capture.depth_height),
        Resolution::new(config.capture.color_width, config.capture.color_height),
    );

    let mut service = StreamService::with_config(source, transport, config.to_service_config())?;
    let stop = service.stop_handle();

    // Ctrl-C handler.
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Ctrl-C received — shutting down");
        stop.store(false, std::sync::atomic::Ordering::SeqCst);
    });

    service.run().await?;
    info!(
        "stopped after {} frames, {} bytes",
        service.frames_sent(),
        service.bytes_sent()
    );

    Ok(())
}
