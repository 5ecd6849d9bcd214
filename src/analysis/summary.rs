//! Descriptive cohort tables.

use indexmap::IndexMap;
use polars::prelude::*;
use serde::Serialize;

use crate::data::cohort::{Cohort, Outcome, Score};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutcomeSummary {
    pub positives: usize,
    pub prevalence: f64,
}

/// Cohort size and outcome prevalence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CohortSummary {
    pub n: usize,
    pub outcomes: IndexMap<String, OutcomeSummary>,
}

pub fn cohort_summary(cohort: &Cohort) -> CohortSummary {
    let outcomes = Outcome::ALL
        .into_iter()
        .map(|outcome| {
            let positives = cohort.outcome(outcome).into_iter().filter(|&y| y).count();
            (
                outcome.to_string(),
                OutcomeSummary {
                    positives,
                    prevalence: cohort.prevalence(outcome),
                },
            )
        })
        .collect();
    CohortSummary {
        n: cohort.len(),
        outcomes,
    }
}

/// Record count plus mean and median of every score, grouped by the outcome flag.
pub fn scores_by_outcome(cohort: &Cohort, outcome: Outcome) -> PolarsResult<DataFrame> {
    let group = outcome.column();
    let mut aggs = vec![len().alias("n")];
    for score in Score::ALL {
        let name = score.column();
        aggs.push(col(name).mean().alias(format!("{name}_mean").as_str()));
        aggs.push(col(name).median().alias(format!("{name}_median").as_str()));
    }
    cohort
        .to_frame()?
        .lazy()
        .group_by([col(group)])
        .agg(aggs)
        .sort_by_exprs([col(group)], SortMultipleOptions::default())
        .collect()
}
