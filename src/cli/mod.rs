//! Command-line interface wiring for sepsis-eval.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};

use crate::{
    config::Settings,
    data::cohort::{self, Cohort},
    metrics::Rule,
};

pub mod evaluate;
pub mod histogram;
pub mod report;
pub mod roc;
pub mod summary;

/// Top-level CLI definition.
#[derive(Debug, Parser)]
#[command(author, version, about = "Sepsis-3 versus Angus and mortality evaluation", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Parse CLI arguments from the environment.
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// Dispatch the selected sub-command.
    pub fn dispatch(self, settings: Settings) -> Result<()> {
        match self.command {
            Commands::Summary(args) => summary::run(args, settings),
            Commands::Evaluate(args) => evaluate::run(args, settings),
            Commands::Roc(args) => roc::run(args, settings),
            Commands::Histogram(args) => histogram::run(args, settings),
            Commands::Report(args) => report::run(args, settings),
        }
    }
}

/// Supported sub-commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Cohort size, outcome prevalence and score summaries.
    Summary(summary::Args),
    /// Confusion matrices and operating statistics for prediction rules.
    Evaluate(evaluate::Args),
    /// AUROC with bootstrap intervals and optional ROC plot.
    Roc(roc::Args),
    /// Score distribution split by outcome.
    Histogram(histogram::Args),
    /// Run every stage for both outcomes and write report.json.
    Report(report::Args),
}

/// Where the cohort comes from and which rows to drop.
#[derive(Debug, Clone, ClapArgs)]
pub struct CohortArgs {
    /// Cohort CSV (defaults to COHORT_FILE).
    #[arg(long)]
    pub cohort: Option<PathBuf>,
    /// SQL predicate; rows where it holds are excluded (defaults to COHORT_EXCLUSION).
    #[arg(long)]
    pub exclude: Option<String>,
}

impl CohortArgs {
    pub fn path(&self, settings: &Settings) -> PathBuf {
        self.cohort
            .clone()
            .unwrap_or_else(|| settings.cohort_file.clone())
    }

    pub fn exclusion<'a>(&'a self, settings: &'a Settings) -> Option<&'a str> {
        self.exclude
            .as_deref()
            .or(settings.exclusion.as_deref())
            .filter(|expr| !expr.trim().is_empty())
    }

    /// Load the cohort; any failure here aborts the command.
    pub fn load(&self, settings: &Settings) -> Result<Cohort> {
        let path = self.path(settings);
        cohort::load_cohort(&path, self.exclusion(settings))
            .with_context(|| format!("loading cohort from {}", path.display()))
    }
}

/// Prediction rules given with `--rule`, in flag order.
#[derive(Debug, Clone, ClapArgs)]
pub struct RuleArgs {
    /// Rule such as `sepsis3=qsofa>=2&sofa>=2`; repeatable. Defaults to the
    /// qSOFA, SOFA, SIRS, LODS and Sepsis-3 rules.
    #[arg(long = "rule", value_name = "RULE")]
    pub rules: Vec<Rule>,
}

impl RuleArgs {
    pub fn resolve(&self) -> Vec<Rule> {
        if self.rules.is_empty() {
            Rule::defaults()
        } else {
            self.rules.clone()
        }
    }
}
