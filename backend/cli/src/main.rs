mod config_cmd;
mod status_cmd;

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use fingate_config::{load_and_prepare, redacted_snapshot, GatewayConfig};
use fingate_gateway::{start_server, GatewayState};

#[derive(Parser)]
#[command(name = "fingate")]
#[command(about = "Signed, rate-limited gateway to the upstream financial API")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the gateway server
    Serve {
        /// Port to bind the HTTP server to
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Query a running gateway's health endpoint
    Status {
        /// Port the gateway listens on
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Print the effective configuration with secrets masked
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port } => {
            let mut config = load_and_prepare().await?;
            if let Some(port) = port {
                config.server.port = port;
            }
            run_server(config).await?;
        }
        Commands::Status { port } => status_cmd::run(port).await?,
        Commands::Config => config_cmd::run().await?,
    }

    Ok(())
}

async fn run_server(config: GatewayConfig) -> Result<()> {
    fingate_logging::init_logger(&config.logging.dir, &config.logging.level);

    info!(config = %redacted_snapshot(&config), "Starting fingate gateway");

    let addr: SocketAddr = format!("{}:{}", config.server.bind_address, config.server.port)
        .parse()
        .with_context(|| format!("Invalid bind address {}", config.server.bind_address))?;

    let state = GatewayState::from_config(&config)?;
    start_server(
        addr,
        state,
        Duration::from_secs(config.rate_limit.sweep_interval_secs),
    )
    .await
}
