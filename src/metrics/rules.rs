//! Threshold rules turning severity scores into binary predictions.

use std::{fmt, str::FromStr};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use super::{ensure_same_len, EvalError, Result};
use crate::data::cohort::{Cohort, Score};

static TERM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*([A-Za-z_]+)\s*>=\s*(\d+)\s*$").expect("valid regex"));

/// How per-score comparisons are joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Combinator {
    And,
    Or,
}

impl Combinator {
    fn symbol(self) -> char {
        match self {
            Self::And => '&',
            Self::Or => '|',
        }
    }
}

/// Apply `score >= threshold` per column and combine the comparisons per record.
///
/// Every column must have the same length; the thresholds pair with the columns
/// positionally.
pub fn evaluate(scores: &[&[u32]], thresholds: &[u32], combinator: Combinator) -> Result<Vec<bool>> {
    let Some(first) = scores.first() else {
        return Err(EvalError::Empty("score columns"));
    };
    ensure_same_len("thresholds", scores.len(), thresholds.len())?;
    let n = first.len();
    for column in &scores[1..] {
        ensure_same_len("score column", n, column.len())?;
    }

    let predictions = (0..n)
        .map(|row| {
            let mut hits = scores
                .iter()
                .zip(thresholds)
                .map(|(column, threshold)| column[row] >= *threshold);
            match combinator {
                Combinator::And => hits.all(|hit| hit),
                Combinator::Or => hits.any(|hit| hit),
            }
        })
        .collect();
    Ok(predictions)
}

/// A single `score >= threshold` comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RuleTerm {
    pub score: Score,
    pub threshold: u32,
}

/// A named prediction rule such as `sepsis3=qsofa>=2&sofa>=2`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rule {
    pub name: String,
    pub terms: Vec<RuleTerm>,
    pub combinator: Combinator,
}

impl Rule {
    pub fn new(name: impl Into<String>, terms: Vec<RuleTerm>, combinator: Combinator) -> Self {
        Self {
            name: name.into(),
            terms,
            combinator,
        }
    }

    /// Rule set reported when the caller names none.
    pub fn defaults() -> Vec<Rule> {
        let single = |name: &str, score| {
            Rule::new(
                name,
                vec![RuleTerm {
                    score,
                    threshold: 2,
                }],
                Combinator::And,
            )
        };
        vec![
            single("qsofa", Score::Qsofa),
            single("sofa", Score::Sofa),
            single("sirs", Score::Sirs),
            single("lods", Score::Lods),
            Rule::new(
                "sepsis3",
                vec![
                    RuleTerm {
                        score: Score::Qsofa,
                        threshold: 2,
                    },
                    RuleTerm {
                        score: Score::Sofa,
                        threshold: 2,
                    },
                ],
                Combinator::And,
            ),
        ]
    }

    /// Predictions for every record of the cohort, in cohort order.
    pub fn predict(&self, cohort: &Cohort) -> Result<Vec<bool>> {
        let columns: Vec<Vec<u32>> = self
            .terms
            .iter()
            .map(|term| cohort.scores(term.score))
            .collect();
        let views: Vec<&[u32]> = columns.iter().map(Vec::as_slice).collect();
        let thresholds: Vec<u32> = self.terms.iter().map(|term| term.threshold).collect();
        evaluate(&views, &thresholds, self.combinator)
    }

    fn expression(&self) -> String {
        self.terms
            .iter()
            .map(|term| format!("{}>={}", term.score, term.threshold))
            .collect::<Vec<_>>()
            .join(&self.combinator.symbol().to_string())
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.expression())
    }
}

impl FromStr for Rule {
    type Err = EvalError;

    fn from_str(text: &str) -> Result<Self> {
        let invalid = |reason: &str| EvalError::InvalidRule {
            text: text.to_string(),
            reason: reason.to_string(),
        };

        let (name, body) = match text.split_once('=') {
            Some((name, body)) if !name.ends_with('>') => (Some(name.trim()), body),
            _ => (None, text),
        };
        if body.contains('&') && body.contains('|') {
            return Err(invalid("cannot mix `&` and `|`"));
        }
        let combinator = if body.contains('|') {
            Combinator::Or
        } else {
            Combinator::And
        };

        let mut terms = Vec::new();
        for part in body.split(combinator.symbol()) {
            let caps = TERM
                .captures(part)
                .ok_or_else(|| invalid("expected terms of the form `score>=N`"))?;
            let score: Score = caps[1]
                .parse()
                .map_err(|_| invalid(&format!("unknown score `{}`", &caps[1])))?;
            let threshold: u32 = caps[2]
                .parse()
                .map_err(|_| invalid("threshold out of range"))?;
            terms.push(RuleTerm { score, threshold });
        }

        let mut rule = Rule::new(String::new(), terms, combinator);
        rule.name = match name {
            Some("") => return Err(invalid("empty rule name")),
            Some(name) => name.to_string(),
            None => rule.expression(),
        };
        Ok(rule)
    }
}
