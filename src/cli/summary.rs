//! CLI entry-point for cohort summaries.

use anyhow::Result;
use clap::Args as ClapArgs;
use tracing::instrument;

use crate::{analysis, cli::CohortArgs, config::Settings};

/// Args for the `summary` command.
#[derive(Debug, Clone, ClapArgs)]
pub struct Args {
    #[command(flatten)]
    pub cohort: CohortArgs,
}

#[instrument(skip(settings))]
pub fn run(args: Args, settings: Settings) -> Result<()> {
    let cohort = args.cohort.load(&settings)?;
    analysis::summarize(&cohort)?;
    Ok(())
}
