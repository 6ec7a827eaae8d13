use clap::Subcommand;

use super::apply::ApplyArgs;
use super::ask::AskArgs;

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Apply to a batch of jobs, one after another
    Apply(ApplyArgs),

    /// Ask the answer oracle a single question
    Ask(AskArgs),

    /// Show version, resolved configuration and profile summary
    Info,
}
