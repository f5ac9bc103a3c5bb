//! boxtrail main entry point

use anyhow::Context;
use boxtrail_api::start_server;
use boxtrail_config::{Config, ConfigError};
use boxtrail_source::JsonFileSource;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Runtime;

const DEFAULT_CONFIG: &str = "config.yaml";

#[derive(Parser, Debug)]
#[command(name = "boxtrail")]
#[command(version = "0.1.0")]
#[command(about = "Stock movement history for box inventories", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = DEFAULT_CONFIG)]
    config: PathBuf,

    /// Print the default configuration and exit
    #[arg(long)]
    print_default_config: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.print_default_config {
        print!("{}", Config::generate_default());
        return Ok(());
    }

    let config = match Config::load(args.config.clone()) {
        Ok(config) => config,
        Err(ConfigError::FileNotFound { .. }) if args.config == PathBuf::from(DEFAULT_CONFIG) => {
            init_logging(&Config::default());
            log::warn!(
                "Config file {} not found, using defaults",
                args.config.display()
            );
            return run(Config::default());
        }
        Err(e) => {
            eprintln!("{}", e.to_details());
            return Err(e).context("Failed to load configuration");
        }
    };

    init_logging(&config);
    run(config)
}

/// `RUST_LOG` wins over the configured level
fn init_logging(config: &Config) {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();
}

fn run(config: Config) -> anyhow::Result<()> {
    let rt = Runtime::new()?;

    rt.block_on(async {
        log::info!("Transaction file: {}", config.source.path.display());

        let source = Arc::new(JsonFileSource::new(config.source.path.clone()));
        match source.reload().await {
            Ok(count) => log::info!("Loaded {} transaction record(s)", count),
            Err(e) => log::warn!(
                "Could not load {}: {}; queries will report failures until reloaded",
                config.source.path.display(),
                e
            ),
        }

        start_server(config, source)
            .await
            .context("Server error")
    })
}
