use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use thermowatch::{agent, AgentConfig};

#[derive(Parser, Debug)]
#[command(name = "thermowatch")]
#[command(about = "Publish DS18B20 temperature readings to an MQTT broker")]
struct Args {
    /// Optional TOML file; environment variables override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log debug output, including suppressed and not-ready cycles
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// RUST_LOG takes precedence over the default directive.
fn init_logging(verbose: bool) {
    let default = if verbose {
        "thermowatch=debug"
    } else {
        "thermowatch=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run(args: Args) -> Result<()> {
    let config = AgentConfig::load(args.config.as_deref()).context("loading configuration")?;
    info!("Starting DS18B20 temperature sensor service");

    let shutdown = agent::install_signal_handlers()?;
    agent::run(config, shutdown).await?;

    info!("Service stopped");
    Ok(())
}
