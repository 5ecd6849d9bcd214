//! Runtime configuration utilities for sepsis-eval.

use std::{
    env,
    path::{Path, PathBuf},
};

use anyhow::Context;
use serde::Deserialize;

use crate::plot::PlotStyle;

/// Application configuration resolved from `.env` and defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Root folder holding the extracted cohort.
    pub data_dir: PathBuf,
    /// Root folder for analytic outputs.
    pub outputs_dir: PathBuf,
    /// Cohort CSV used when no `--cohort` flag is given.
    pub cohort_file: PathBuf,
    /// SQL predicate selecting rows to drop from the cohort.
    pub exclusion: Option<String>,
    /// Number of bootstrap resamples for AUROC intervals.
    pub bootstrap_resamples: usize,
    /// Seed for the bootstrap RNG.
    pub bootstrap_seed: u64,
    /// Presentation settings handed to the renderer.
    pub plot_style: PlotStyle,
}

impl Settings {
    /// Load configuration from environment with reasonable defaults.
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let data_dir = env::var("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data"));
        let outputs_dir = env::var("OUTPUTS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./outputs"));
        let cohort_file = env::var("COHORT_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("cohort.csv"));
        let exclusion = env::var("COHORT_EXCLUSION")
            .ok()
            .filter(|value| !value.trim().is_empty());
        let bootstrap_resamples = env::var("BOOTSTRAP_RESAMPLES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(1000);
        let bootstrap_seed = env::var("BOOTSTRAP_SEED")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(42);
        let plot_style = match env::var("PLOT_STYLE") {
            Ok(path) => PlotStyle::from_json_file(Path::new(&path))
                .with_context(|| format!("loading plot style from {path}"))?,
            Err(_) => PlotStyle::default(),
        };

        std::fs::create_dir_all(&outputs_dir).context("creating outputs dir")?;

        Ok(Self {
            data_dir,
            outputs_dir,
            cohort_file,
            exclusion,
            bootstrap_resamples,
            bootstrap_seed,
            plot_style,
        })
    }

    /// Convenience helper for derived output path segments.
    pub fn join_output<P: AsRef<Path>>(&self, path: P) -> PathBuf {
        self.outputs_dir.join(path)
    }
}
