//! Volbridge Daemon - Keeps a Display Device in Sync with Host Audio Apps
//!
//! Opens the device endpoint, performs the handshake and full sync, then
//! forwards app appearances, disappearances and volume changes until it is
//! stopped. Lost connections are retried forever.
//!
//! # Usage
//!
//! ```bash
//! # USB serial device with defaults
//! volbridge-daemon
//!
//! # Serial-over-network bridge
//! volbridge-daemon --endpoint tcp://192.168.1.40:7000
//!
//! # Fixed app list from the config file, custom icons
//! volbridge-daemon --mixer static --icon-dir ~/.local/share/volbridge/icons
//!
//! # Verbose logging
//! RUST_LOG=debug volbridge-daemon
//! ```
//!
//! # Signals
//!
//! - `SIGTERM` / `SIGINT`: Graceful shutdown

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::watch;
use tracing::{error, info, warn};

use volbridge_core::{
    default_config_path, load_config_from_path, AudioMixer, BridgeConfig, ConfigOverrides,
    Endpoint, EndpointConnector, IconChain, IconSource, InMemoryMixer, MixerBackend, PactlMixer,
    PlaceholderIcons, PpmDirectoryIcons, Supervisor,
};

/// Volbridge Daemon - drives an app volume display over a serial link
#[derive(Parser, Debug)]
#[command(name = "volbridge-daemon")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Device endpoint: device path, tcp://host:port or unix:///path
    #[arg(short = 'e', long, env = "VOLBRIDGE_ENDPOINT", value_name = "ENDPOINT")]
    endpoint: Option<Endpoint>,

    /// Configuration file path
    #[arg(short = 'c', long, env = "VOLBRIDGE_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Mixer backend (pactl, static)
    #[arg(long, env = "VOLBRIDGE_MIXER", value_name = "BACKEND")]
    mixer: Option<MixerBackend>,

    /// Directory of .ppm/.pgm app icons
    #[arg(long, env = "VOLBRIDGE_ICON_DIR", value_name = "DIR")]
    icon_dir: Option<PathBuf>,

    /// Icon payload chunk size in bytes
    #[arg(long, env = "VOLBRIDGE_CHUNK_SIZE", value_name = "BYTES")]
    chunk_size: Option<usize>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, env = "VOLBRIDGE_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            endpoint: self.endpoint.clone(),
            mixer: self.mixer,
            icon_dir: self.icon_dir.clone(),
            chunk_size: self.chunk_size,
        }
    }
}

/// Initialize logging with the specified level
fn init_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!(
            "volbridge_daemon={level},volbridge_core={level},device={level}"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

/// File, environment and CLI layered into one configuration
fn resolve_config(args: &Args) -> Result<BridgeConfig> {
    let path = args.config.clone().or_else(default_config_path);
    let mut config = load_config_from_path(path.clone())
        .with_context(|| format!("Failed to load configuration from {path:?}"))?;
    args.overrides()
        .apply(&mut config)
        .context("Invalid command-line options")?;
    Ok(config)
}

fn build_mixer(config: &BridgeConfig) -> Arc<dyn AudioMixer> {
    match config.mixer {
        MixerBackend::Pactl => {
            let mixer = match config.pactl_program {
                Some(ref program) => PactlMixer::with_program(program),
                None => PactlMixer::new(),
            };
            Arc::new(mixer)
        }
        MixerBackend::Static => {
            if config.static_apps.is_empty() {
                warn!("Static mixer selected but no [[mixer.apps]] are configured");
            }
            Arc::new(InMemoryMixer::with_apps(config.static_apps.clone()))
        }
    }
}

fn build_icons(config: &BridgeConfig) -> Arc<dyn IconSource> {
    let mut chain = IconChain::new();
    if let Some(ref dir) = config.icon_dir {
        chain = chain.with(PpmDirectoryIcons::new(dir));
    }
    if config.placeholder_icons {
        chain = chain.with(PlaceholderIcons);
    }
    if chain.is_empty() {
        warn!("No icon sources configured; every app will be skipped");
    }
    Arc::new(chain)
}

/// Flip the shutdown flag on SIGINT or SIGTERM
async fn wait_for_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm =
            signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;
        let mut sigint =
            signal(SignalKind::interrupt()).context("Failed to install SIGINT handler")?;
        tokio::select! {
            _ = sigterm.recv() => info!("Received SIGTERM, initiating shutdown"),
            _ = sigint.recv() => info!("Received SIGINT, initiating shutdown"),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c()
            .await
            .context("Failed to install Ctrl+C handler")?;
        info!("Received Ctrl+C, initiating shutdown");
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);

    info!("Volbridge daemon starting");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = resolve_config(&args)?;
    info!(
        endpoint = %config.transport.endpoint,
        mixer = %config.mixer,
        source = %config.source(),
        chunk_size = config.transport.chunk_size,
        diff_interval_ms = config.protocol.diff_interval_ms,
        "Configuration resolved"
    );
    if let Some(ref path) = config.config_file_path {
        info!(config_path = ?path, "Config file");
    }

    let supervisor = Supervisor::new(
        Arc::new(EndpointConnector::new(config.transport.clone())),
        build_mixer(&config),
        build_icons(&config),
        config.protocol.clone(),
        config.transport.reconnect_delay(),
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = wait_for_signal().await {
            error!(error = %e, "Signal handling failed, shutting down");
        }
        let _ = shutdown_tx.send(true);
    });

    let stats = supervisor.run(shutdown_rx).await;
    info!(sessions = stats.sessions, "Volbridge daemon stopped cleanly");
    Ok(())
}
