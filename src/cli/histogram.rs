//! CLI entry-point for score histograms.

use anyhow::Result;
use clap::Args as ClapArgs;
use tracing::{info, instrument};

use crate::{
    analysis,
    cli::CohortArgs,
    config::Settings,
    data::cohort::{Outcome, Score},
    plot::HistogramWeighting,
};

/// Args for the `histogram` command.
#[derive(Debug, Clone, ClapArgs)]
pub struct Args {
    #[command(flatten)]
    pub cohort: CohortArgs,
    /// Score to plot.
    #[arg(long, value_enum, default_value = "sofa")]
    pub score: Score,
    /// Outcome used to split the cohort.
    #[arg(long, value_enum, default_value = "angus")]
    pub outcome: Outcome,
    /// Bar scaling.
    #[arg(long, value_enum, default_value = "count")]
    pub weighting: HistogramWeighting,
}

#[instrument(skip(settings))]
pub fn run(args: Args, settings: Settings) -> Result<()> {
    let cohort = args.cohort.load(&settings)?;
    let path = analysis::histogram(&settings, &cohort, args.score, args.outcome, args.weighting)?;
    info!(path = %path.display(), "histogram written");
    Ok(())
}
