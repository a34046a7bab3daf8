//! hid-relay-host: serve the control page and forward commands to the relay.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;

use hid_relay_host::config::{self, BridgeConfig, Overrides};
use hid_relay_host::routes::{AppState, DEFAULT_INDEX_HTML};
use hid_relay_host::serial::{self, LogSink, SerialHandle};
use hid_relay_host::server;

#[derive(Parser)]
#[command(
    name = "hid-relay-host",
    version,
    about = "HTTP bridge to a UART HID relay"
)]
struct Args {
    /// TOML config file (default: ./hid-relay.toml if present).
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: Overrides,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hid_relay_host=info".into()),
        )
        .init();

    let args = Args::parse();

    let mut config = config::load(args.config.as_deref()).context("Failed to load config")?;
    config.apply_overrides(&args.overrides);
    config.validate().context("Invalid config")?;

    let serial = start_writer(&config)?;
    let index_html = load_index(&config)?;

    let state = Arc::new(AppState {
        serial,
        grammar: config.grammar.into(),
        index_html,
        video: config.video.clone(),
    });

    let listener = TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen))?;

    tracing::info!(
        listen = %config.listen,
        grammar = ?config.grammar,
        port = %config.serial.port,
        dry_run = config.serial.dry_run,
        video = config.video.enabled,
        "hid-relay-host listening"
    );

    server::serve(listener, state).await;
    Ok(())
}

fn start_writer(config: &BridgeConfig) -> anyhow::Result<SerialHandle> {
    let depth = config.serial.queue_depth;
    let handle = if config.serial.dry_run {
        serial::spawn_writer(LogSink, depth)
    } else {
        let port = serial::open_port(&config.serial).context("Failed to open serial port")?;
        serial::spawn_writer(port, depth)
    };
    handle.context("Failed to start serial writer")
}

fn load_index(config: &BridgeConfig) -> anyhow::Result<String> {
    match &config.static_dir {
        Some(dir) => {
            let path = dir.join("index.html");
            std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))
        }
        None => Ok(DEFAULT_INDEX_HTML.to_string()),
    }
}
