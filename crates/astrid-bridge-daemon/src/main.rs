//! Bridge daemon entry point: parses CLI arguments, loads configuration,
//! installs logging, and serves the bridge until interrupted.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

use astrid_bridge_config::BridgeConfig;
use astrid_bridge_telemetry::{setup_logging, LogConfig};

/// Event-bus bridge daemon.
#[derive(Debug, Parser)]
#[command(name = "astrid-bridge-daemon")]
struct Args {
    /// Address to listen for client connections on.
    #[arg(long, env = "ASTRID_BRIDGE_LISTEN", default_value = "127.0.0.1:9877")]
    listen: SocketAddr,

    /// Path to a TOML config file (section 6's options).
    #[arg(long, env = "ASTRID_BRIDGE_CONFIG")]
    config: Option<PathBuf>,

    /// `tracing` log level or filter directive.
    #[arg(long, env = "ASTRID_BRIDGE_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    setup_logging(&LogConfig::new(&args.log_level))?;

    let config = BridgeConfig::load(args.config.as_deref())?;
    astrid_bridge_daemon::serve(config, args.listen).await
}
