use anyhow::Result;

use super::apply::cmd_apply;
use super::ask::cmd_ask;
use super::env::CliArgs;
use super::info::cmd_info;
use super::runtime::LoadedConfig;
use crate::cli::commands::Commands;

pub async fn dispatch(cli: &CliArgs, loaded: &LoadedConfig) -> Result<()> {
    match cli.command.clone() {
        Commands::Apply(args) => cmd_apply(args, &loaded.config, cli.output).await,
        Commands::Ask(args) => cmd_ask(args, &loaded.config, cli.output).await,
        Commands::Info => cmd_info(loaded).await,
    }
}
