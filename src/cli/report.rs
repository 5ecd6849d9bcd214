//! CLI entry-point for the full evaluation report.

use anyhow::Result;
use clap::Args as ClapArgs;
use tracing::instrument;

use crate::{
    analysis,
    cli::{CohortArgs, RuleArgs},
    config::Settings,
};

/// Args for the `report` command.
#[derive(Debug, Clone, ClapArgs)]
pub struct Args {
    #[command(flatten)]
    pub cohort: CohortArgs,
    #[command(flatten)]
    pub rules: RuleArgs,
}

#[instrument(skip(settings))]
pub fn run(args: Args, settings: Settings) -> Result<()> {
    let cohort = args.cohort.load(&settings)?;
    let path = args.cohort.path(&settings);
    analysis::report(
        &settings,
        &cohort,
        &path,
        args.cohort.exclusion(&settings),
        &args.rules.resolve(),
    )?;
    Ok(())
}
