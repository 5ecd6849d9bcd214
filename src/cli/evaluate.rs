//! CLI entry-point for rule operating statistics.

use anyhow::Result;
use clap::Args as ClapArgs;
use tracing::instrument;

use crate::{
    analysis,
    cli::{CohortArgs, RuleArgs},
    config::Settings,
    data::cohort::Outcome,
};

/// Args for the `evaluate` command.
#[derive(Debug, Clone, ClapArgs)]
pub struct Args {
    #[command(flatten)]
    pub cohort: CohortArgs,
    #[command(flatten)]
    pub rules: RuleArgs,
    /// Ground truth the rules are scored against.
    #[arg(long, value_enum, default_value = "angus")]
    pub outcome: Outcome,
}

#[instrument(skip(settings))]
pub fn run(args: Args, settings: Settings) -> Result<()> {
    let cohort = args.cohort.load(&settings)?;
    analysis::evaluate(&settings, &cohort, args.outcome, &args.rules.resolve())?;
    Ok(())
}
