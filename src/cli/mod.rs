pub mod apply;
pub mod ask;
pub mod commands;
pub mod dispatch;
pub mod env;
pub mod info;
pub mod output;
pub mod runtime;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use self::env::CliArgs;
use self::runtime::{init_logging, load_config, load_local_env_overrides};

/// Entry point shared by the `easyapply` binary.
pub async fn run() -> Result<()> {
    let cli = CliArgs::parse();

    init_logging(&cli.log_level, cli.debug)?;
    load_local_env_overrides();

    info!("Starting EasyApply v{}", env!("CARGO_PKG_VERSION"));

    let loaded = load_config(cli.config.as_ref()).await?;

    match dispatch::dispatch(&cli, &loaded).await {
        Ok(()) => {
            info!("Command completed successfully");
            Ok(())
        }
        Err(e) => {
            error!("Command failed: {:#}", e);
            std::process::exit(1);
        }
    }
}
