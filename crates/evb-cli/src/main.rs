use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};

use evb_config::EvbConfig;
use evb_runtime::lifecycle::Reactor;
use evb_runtime::tracing_init::init_tracing;

#[derive(Parser)]
#[command(name = "evbatch", about = "Rotating batch writer for user events")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Receive events over HTTP and write them into time-windowed CSV files
    Run {
        /// Path to evbatch.toml config file (defaults apply when omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Output directory for batch files; must already exist
        #[arg(short = 'o', long = "output-dir")]
        output_dir: Option<PathBuf>,
        /// Host to listen on
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on
        #[arg(long)]
        port: Option<u16>,
    },
}

/// Load `evbatch.toml` (or defaults) and return it with the directory that
/// relative paths resolve against.
fn load_config(config: Option<PathBuf>) -> Result<(EvbConfig, PathBuf)> {
    match config {
        Some(config) => {
            let config_path = config
                .canonicalize()
                .map_err(|e| anyhow::anyhow!("config path '{}': {e}", config.display()))?;
            let evb_config = EvbConfig::load(&config_path)?;
            let base_dir = config_path
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| anyhow::anyhow!("config path has no parent directory"))?;
            Ok((evb_config, base_dir))
        }
        None => Ok((EvbConfig::default(), std::env::current_dir()?)),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            output_dir,
            host,
            port,
        } => {
            let (mut evb_config, base_dir) = load_config(config)?;
            if let Some(dir) = output_dir {
                evb_config.writer.output_dir = dir;
            }
            if let Some(host) = host {
                evb_config.server.set_host(&host);
            }
            if let Some(port) = port {
                evb_config.server.set_port(port);
            }
            evb_config.validate()?;

            let _guard = init_tracing(&evb_config.logging, &base_dir)?;

            let mut reactor = Reactor::start(evb_config, &base_dir)
                .await
                .map_err(|e| anyhow::anyhow!("{e}"))?;
            tracing::info!(domain = "sys", listen = %reactor.listen_addr(), "evbatch reactor started");

            reactor.wait_for_trigger().await;
            reactor.shutdown();
            reactor.wait().await.map_err(|e| anyhow::anyhow!("{e}"))?;
        }
    }

    Ok(())
}
