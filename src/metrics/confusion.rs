//! Confusion matrices and the operating statistics derived from them.

use std::fmt::Write as _;

use indexmap::IndexMap;
use serde::Serialize;

use super::{ensure_same_len, EvalError, Result};

/// 2x2 counts of predicted versus actual class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConfusionMatrix {
    #[serde(rename = "tp")]
    pub true_pos: u64,
    #[serde(rename = "fp")]
    pub false_pos: u64,
    #[serde(rename = "fn")]
    pub false_neg: u64,
    #[serde(rename = "tn")]
    pub true_neg: u64,
}

impl ConfusionMatrix {
    pub fn total(&self) -> u64 {
        self.true_pos + self.false_pos + self.false_neg + self.true_neg
    }

    pub fn accuracy(&self) -> Option<f64> {
        ratio(self.true_pos + self.true_neg, self.total())
    }

    pub fn sensitivity(&self) -> Option<f64> {
        ratio(self.true_pos, self.true_pos + self.false_neg)
    }

    pub fn specificity(&self) -> Option<f64> {
        ratio(self.true_neg, self.true_neg + self.false_pos)
    }

    /// Positive predictive value.
    pub fn ppv(&self) -> Option<f64> {
        ratio(self.true_pos, self.true_pos + self.false_pos)
    }

    /// Negative predictive value.
    pub fn npv(&self) -> Option<f64> {
        ratio(self.true_neg, self.true_neg + self.false_neg)
    }

    /// Counts as the `(tp, fp, fn, tn)` tuple.
    pub fn as_tuple(&self) -> (u64, u64, u64, u64) {
        (
            self.true_pos,
            self.false_pos,
            self.false_neg,
            self.true_neg,
        )
    }
}

fn ratio(num: u64, den: u64) -> Option<f64> {
    (den > 0).then(|| num as f64 / den as f64)
}

/// Tabulate predictions against ground truth.
pub fn confusion_matrix(y_true: &[bool], y_pred: &[bool]) -> Result<ConfusionMatrix> {
    if y_true.is_empty() {
        return Err(EvalError::Empty("ground truth"));
    }
    ensure_same_len("predictions", y_true.len(), y_pred.len())?;

    let mut matrix = ConfusionMatrix::default();
    for (&actual, &predicted) in y_true.iter().zip(y_pred) {
        match (predicted, actual) {
            (true, true) => matrix.true_pos += 1,
            (true, false) => matrix.false_pos += 1,
            (false, true) => matrix.false_neg += 1,
            (false, false) => matrix.true_neg += 1,
        }
    }
    Ok(matrix)
}

/// Fraction of predictions matching the ground truth.
pub fn accuracy(y_true: &[bool], y_pred: &[bool]) -> Result<f64> {
    let matrix = confusion_matrix(y_true, y_pred)?;
    // non-empty input guarantees a positive total
    Ok(matrix.accuracy().unwrap_or_default())
}

/// One reported row per rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpStats {
    pub rule: String,
    pub n: u64,
    pub tp: u64,
    pub fp: u64,
    #[serde(rename = "fn")]
    pub fn_: u64,
    pub tn: u64,
    pub accuracy: f64,
    pub sensitivity: Option<f64>,
    pub specificity: Option<f64>,
    pub ppv: Option<f64>,
    pub npv: Option<f64>,
}

impl OpStats {
    fn new(rule: &str, matrix: ConfusionMatrix) -> Self {
        let (tp, fp, fn_, tn) = matrix.as_tuple();
        Self {
            rule: rule.to_string(),
            n: matrix.total(),
            tp,
            fp,
            fn_,
            tn,
            accuracy: matrix.accuracy().unwrap_or_default(),
            sensitivity: matrix.sensitivity(),
            specificity: matrix.specificity(),
            ppv: matrix.ppv(),
            npv: matrix.npv(),
        }
    }
}

/// Compute operating statistics for each named prediction vector.
///
/// The returned map keeps the caller's order.
pub fn op_stats<'a, I>(y_true: &[bool], predictions: I) -> Result<IndexMap<String, OpStats>>
where
    I: IntoIterator<Item = (&'a str, &'a [bool])>,
{
    let mut table = IndexMap::new();
    for (name, y_pred) in predictions {
        if table.contains_key(name) {
            return Err(EvalError::DuplicateRule(name.to_string()));
        }
        let matrix = confusion_matrix(y_true, y_pred)?;
        table.insert(name.to_string(), OpStats::new(name, matrix));
    }
    Ok(table)
}

/// Compute operating statistics and print them as an aligned table on stdout.
pub fn print_op_stats<'a, I>(y_true: &[bool], predictions: I) -> Result<IndexMap<String, OpStats>>
where
    I: IntoIterator<Item = (&'a str, &'a [bool])>,
{
    let table = op_stats(y_true, predictions)?;
    print!("{}", format_op_stats(&table));
    Ok(table)
}

/// Render an op-stats table as fixed-width text.
pub fn format_op_stats(table: &IndexMap<String, OpStats>) -> String {
    let width = table.keys().map(String::len).max().unwrap_or(4).max(4);
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<width$} {:>7} {:>7} {:>7} {:>7} {:>6} {:>6} {:>6} {:>6} {:>6}",
        "rule", "tp", "fp", "fn", "tn", "acc", "sens", "spec", "ppv", "npv"
    );
    for stats in table.values() {
        let _ = writeln!(
            out,
            "{:<width$} {:>7} {:>7} {:>7} {:>7} {:>6.3} {:>6} {:>6} {:>6} {:>6}",
            stats.rule,
            stats.tp,
            stats.fp,
            stats.fn_,
            stats.tn,
            stats.accuracy,
            fmt_rate(stats.sensitivity),
            fmt_rate(stats.specificity),
            fmt_rate(stats.ppv),
            fmt_rate(stats.npv),
        );
    }
    out
}

fn fmt_rate(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.3}"))
}
