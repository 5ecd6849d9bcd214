//! Diagnostic accuracy metrics: rule predictions, confusion matrices and ROC analysis.

pub mod confusion;
pub mod roc;
pub mod rules;

use thiserror::Error;

pub use confusion::{
    accuracy, confusion_matrix, format_op_stats, op_stats, print_op_stats, ConfusionMatrix, OpStats,
};
pub use roc::{auc, bootstrap_auc_ci, roc_auc, roc_curve, AucInterval, RocCurve, RocPoint};
pub use rules::{evaluate, Combinator, Rule, RuleTerm};

/// Failures raised by the metric layer.
#[derive(Debug, Error, PartialEq)]
pub enum EvalError {
    #[error("length mismatch: {what} has {found} entries, expected {expected}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("{0} is empty")]
    Empty(&'static str),
    #[error("outcome has no {0} examples; ROC is undefined")]
    SingleClass(&'static str),
    #[error("score at index {0} is not finite")]
    NonFiniteScore(usize),
    #[error("invalid rule `{text}`: {reason}")]
    InvalidRule { text: String, reason: String },
    #[error("rule `{0}` listed more than once")]
    DuplicateRule(String),
}

pub type Result<T> = std::result::Result<T, EvalError>;

pub(crate) fn ensure_same_len(what: &'static str, expected: usize, found: usize) -> Result<()> {
    if expected != found {
        return Err(EvalError::LengthMismatch {
            what,
            expected,
            found,
        });
    }
    Ok(())
}
