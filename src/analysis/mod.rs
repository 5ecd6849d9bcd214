//! Analysis stages run against a loaded cohort: summaries, rule evaluation,
//! AUROC tables and figures.

pub mod summary;

use std::{fs::File, path::Path, path::PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{info, warn};

use crate::{
    config::Settings,
    data::cohort::{Cohort, Outcome, Score},
    metrics::{self, bootstrap_auc_ci, op_stats, print_op_stats, roc_curve, OpStats, RocCurve, Rule},
    plot::{self, HistogramWeighting},
};

pub use summary::{cohort_summary, scores_by_outcome, CohortSummary};

/// Whether an AUROC row comes from a raw score or a thresholded rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictorKind {
    Score,
    Rule,
}

/// Bootstrap settings for AUROC intervals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bootstrap {
    pub resamples: usize,
    pub alpha: f64,
    pub seed: u64,
}

impl Bootstrap {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            resamples: settings.bootstrap_resamples,
            alpha: 0.05,
            seed: settings.bootstrap_seed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AurocRow {
    pub outcome: String,
    pub predictor: String,
    pub kind: PredictorKind,
    pub auc: f64,
    pub ci_low: Option<f64>,
    pub ci_high: Option<f64>,
    pub resamples: usize,
}

/// Everything the `report` command produces, serialised to `report.json`.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub cohort_file: PathBuf,
    pub exclusion: Option<String>,
    pub summary: CohortSummary,
    pub rules: Vec<String>,
    pub op_stats: IndexMap<String, IndexMap<String, OpStats>>,
    pub auroc: Vec<AurocRow>,
}

/// Prediction vectors for every rule, in rule order.
pub fn rule_predictions(cohort: &Cohort, rules: &[Rule]) -> metrics::Result<Vec<(String, Vec<bool>)>> {
    rules
        .iter()
        .map(|rule| Ok((rule.name.clone(), rule.predict(cohort)?)))
        .collect()
}

/// Binary rule predictions recast as 0/1 scores.
fn as_scores(predictions: &[bool]) -> Vec<f64> {
    predictions.iter().map(|&p| if p { 1.0 } else { 0.0 }).collect()
}

/// ROC curves for each score followed by each rule.
pub fn roc_curves(
    cohort: &Cohort,
    outcome: Outcome,
    scores: &[Score],
    rules: &[Rule],
) -> metrics::Result<Vec<(String, RocCurve)>> {
    let y_true = cohort.outcome(outcome);
    let mut curves = Vec::with_capacity(scores.len() + rules.len());
    for score in scores {
        let curve = roc_curve(&y_true, &cohort.score_values(*score))?;
        curves.push((score.label().to_string(), curve));
    }
    for (name, predictions) in rule_predictions(cohort, rules)? {
        curves.push((name, roc_curve(&y_true, &as_scores(&predictions))?));
    }
    Ok(curves)
}

/// AUROC with bootstrap interval per score and per rule.
pub fn auroc_table(
    cohort: &Cohort,
    outcome: Outcome,
    scores: &[Score],
    rules: &[Rule],
    bootstrap: Bootstrap,
) -> metrics::Result<Vec<AurocRow>> {
    let y_true = cohort.outcome(outcome);
    let mut predictors: Vec<(String, PredictorKind, Vec<f64>)> = scores
        .iter()
        .map(|score| {
            (
                score.column().to_string(),
                PredictorKind::Score,
                cohort.score_values(*score),
            )
        })
        .collect();
    for (name, predictions) in rule_predictions(cohort, rules)? {
        predictors.push((name, PredictorKind::Rule, as_scores(&predictions)));
    }

    predictors
        .into_iter()
        .map(|(predictor, kind, values)| {
            let interval = bootstrap_auc_ci(
                &y_true,
                &values,
                bootstrap.resamples,
                bootstrap.alpha,
                bootstrap.seed,
            )?;
            Ok(AurocRow {
                outcome: outcome.to_string(),
                predictor,
                kind,
                auc: interval.auc,
                ci_low: interval.lower,
                ci_high: interval.upper,
                resamples: interval.resamples,
            })
        })
        .collect()
}

/// Serialise rows to a CSV file with a header.
pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    info!(path = %path.display(), rows = rows.len(), "wrote csv");
    Ok(())
}

/// Print cohort size, prevalence and per-outcome score summaries.
pub fn summarize(cohort: &Cohort) -> Result<CohortSummary> {
    // the grouped table is wider than polars' default column limit
    for (key, value) in [("POLARS_FMT_MAX_COLS", "-1"), ("POLARS_TABLE_WIDTH", "240")] {
        if std::env::var_os(key).is_none() {
            std::env::set_var(key, value);
        }
    }
    let summary = cohort_summary(cohort);
    println!("cohort: {} ICU stays", summary.n);
    for (name, outcome) in &summary.outcomes {
        println!(
            "  {name}: {} positive ({:.1}%)",
            outcome.positives,
            outcome.prevalence * 100.0
        );
    }
    for outcome in Outcome::ALL {
        let table = scores_by_outcome(cohort, outcome)
            .with_context(|| format!("summarising scores by {outcome}"))?;
        println!("\nscores by {outcome}:\n{table}");
    }
    Ok(summary)
}

/// Print the op-stats table for each rule and save it as CSV.
pub fn evaluate(
    settings: &Settings,
    cohort: &Cohort,
    outcome: Outcome,
    rules: &[Rule],
) -> Result<IndexMap<String, OpStats>> {
    let y_true = cohort.outcome(outcome);
    let predictions = rule_predictions(cohort, rules)?;
    println!("operating statistics against {outcome} (n = {}):", cohort.len());
    let table = print_op_stats(
        &y_true,
        predictions.iter().map(|(name, p)| (name.as_str(), p.as_slice())),
    )?;
    let rows: Vec<&OpStats> = table.values().collect();
    write_csv(&settings.join_output(format!("op_stats_{outcome}.csv")), &rows)?;
    Ok(table)
}

/// Print and save AUROC rows; optionally render the overlaid ROC curves.
pub fn roc(
    settings: &Settings,
    cohort: &Cohort,
    outcome: Outcome,
    scores: &[Score],
    rules: &[Rule],
    render: bool,
) -> Result<Vec<AurocRow>> {
    let rows = auroc_table(
        cohort,
        outcome,
        scores,
        rules,
        Bootstrap::from_settings(settings),
    )?;
    println!("AUROC against {outcome}:");
    for row in &rows {
        match (row.ci_low, row.ci_high) {
            (Some(low), Some(high)) => println!(
                "  {:<12} {:.3} [{:.3}, {:.3}]",
                row.predictor, row.auc, low, high
            ),
            _ => println!("  {:<12} {:.3}", row.predictor, row.auc),
        }
    }
    write_csv(&settings.join_output(format!("auroc_{outcome}.csv")), &rows)?;

    if render {
        let curves = roc_curves(cohort, outcome, scores, rules)?;
        plot::render_roc(
            &settings.join_output(format!("roc_{outcome}.svg")),
            &format!("ROC against {outcome}"),
            &curves,
            &settings.plot_style,
        )?;
    }
    Ok(rows)
}

/// Render the distribution of one score split by an outcome flag.
pub fn histogram(
    settings: &Settings,
    cohort: &Cohort,
    score: Score,
    outcome: Outcome,
    weighting: HistogramWeighting,
) -> Result<PathBuf> {
    let (mut positive, mut negative) = (Vec::new(), Vec::new());
    for record in cohort.records() {
        if record.outcome(outcome) {
            positive.push(record.score(score));
        } else {
            negative.push(record.score(score));
        }
    }
    if positive.is_empty() || negative.is_empty() {
        warn!(%outcome, "outcome has a single class; histogram shows one group");
    }
    let groups = vec![
        (format!("{outcome} = 0"), negative),
        (format!("{outcome} = 1"), positive),
    ];
    let path = settings.join_output(format!("hist_{score}_{outcome}.svg"));
    plot::render_histogram(
        &path,
        &format!("{} by {outcome}", score.label()),
        score.label(),
        &groups,
        weighting,
        &settings.plot_style,
    )?;
    Ok(path)
}

/// Run every stage for both outcomes and write `report.json`.
pub fn report(
    settings: &Settings,
    cohort: &Cohort,
    cohort_file: &Path,
    exclusion: Option<&str>,
    rules: &[Rule],
) -> Result<Report> {
    let summary = summarize(cohort)?;
    let mut op_tables = IndexMap::new();
    let mut auroc = Vec::new();
    for outcome in Outcome::ALL {
        let table = evaluate(settings, cohort, outcome, rules)?;
        op_tables.insert(outcome.to_string(), table);
        auroc.extend(roc(settings, cohort, outcome, &Score::ALL, rules, true)?);
    }

    let report = Report {
        generated_at: Utc::now(),
        cohort_file: cohort_file.to_path_buf(),
        exclusion: exclusion.map(str::to_string),
        summary,
        rules: rules.iter().map(Rule::to_string).collect(),
        op_stats: op_tables,
        auroc,
    };
    let path = settings.join_output("report.json");
    let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
    serde_json::to_writer_pretty(file, &report)?;
    info!(path = %path.display(), "wrote report");
    Ok(report)
}

/// Operating statistics without printing, for callers that only need the numbers.
pub fn rule_op_stats(
    cohort: &Cohort,
    outcome: Outcome,
    rules: &[Rule],
) -> metrics::Result<IndexMap<String, OpStats>> {
    let y_true = cohort.outcome(outcome);
    let predictions = rule_predictions(cohort, rules)?;
    op_stats(
        &y_true,
        predictions.iter().map(|(name, p)| (name.as_str(), p.as_slice())),
    )
}
