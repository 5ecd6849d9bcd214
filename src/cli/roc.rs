//! CLI entry-point for AUROC tables and ROC plots.

use anyhow::Result;
use clap::Args as ClapArgs;
use tracing::instrument;

use crate::{
    analysis,
    cli::{CohortArgs, RuleArgs},
    config::Settings,
    data::cohort::{Outcome, Score},
};

/// Args for the `roc` command.
#[derive(Debug, Clone, ClapArgs)]
pub struct Args {
    #[command(flatten)]
    pub cohort: CohortArgs,
    #[command(flatten)]
    pub rules: RuleArgs,
    /// Ground truth the scores are ranked against.
    #[arg(long, value_enum, default_value = "angus")]
    pub outcome: Outcome,
    /// Scores to include (defaults to all four).
    #[arg(long, value_enum, value_delimiter = ',')]
    pub scores: Vec<Score>,
    /// Skip the rules and report raw scores only.
    #[arg(long)]
    pub scores_only: bool,
    /// Also write roc_<outcome>.svg.
    #[arg(long)]
    pub plot: bool,
}

#[instrument(skip(settings))]
pub fn run(args: Args, settings: Settings) -> Result<()> {
    let cohort = args.cohort.load(&settings)?;
    let scores = if args.scores.is_empty() {
        Score::ALL.to_vec()
    } else {
        args.scores.clone()
    };
    let rules = if args.scores_only {
        Vec::new()
    } else {
        args.rules.resolve()
    };
    analysis::roc(&settings, &cohort, args.outcome, &scores, &rules, args.plot)?;
    Ok(())
}
