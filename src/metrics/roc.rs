//! Stepwise ROC curves, trapezoidal AUROC and bootstrap intervals.

use std::cmp::Ordering;

use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::Serialize;

use super::{ensure_same_len, EvalError, Result};

/// A single operating point on the ROC curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RocPoint {
    /// Records scoring at or above this value are called positive.
    pub threshold: f64,
    pub fpr: f64,
    pub tpr: f64,
}

/// Ordered ROC points running from (0, 0) to (1, 1).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RocCurve {
    pub points: Vec<RocPoint>,
}

impl RocCurve {
    /// `(fpr, tpr)` pairs in curve order.
    pub fn coordinates(&self) -> Vec<(f64, f64)> {
        self.points.iter().map(|p| (p.fpr, p.tpr)).collect()
    }
}

/// Build the ROC curve of `scores` against the binary outcome.
///
/// Each distinct score value is one threshold step, so tied records move the
/// curve together. The origin carries an infinite threshold.
pub fn roc_curve(y_true: &[bool], scores: &[f64]) -> Result<RocCurve> {
    if y_true.is_empty() {
        return Err(EvalError::Empty("ground truth"));
    }
    ensure_same_len("scores", y_true.len(), scores.len())?;
    if let Some(idx) = scores.iter().position(|s| !s.is_finite()) {
        return Err(EvalError::NonFiniteScore(idx));
    }

    let total_pos = y_true.iter().filter(|&&y| y).count();
    let total_neg = y_true.len() - total_pos;
    if total_pos == 0 {
        return Err(EvalError::SingleClass("positive"));
    }
    if total_neg == 0 {
        return Err(EvalError::SingleClass("negative"));
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].partial_cmp(&scores[a]).unwrap_or(Ordering::Equal));

    let p = total_pos as f64;
    let n = total_neg as f64;
    let mut points = vec![RocPoint {
        threshold: f64::INFINITY,
        fpr: 0.0,
        tpr: 0.0,
    }];

    let (mut tp, mut fp) = (0usize, 0usize);
    let mut i = 0;
    while i < order.len() {
        let threshold = scores[order[i]];
        while i < order.len() && scores[order[i]] == threshold {
            if y_true[order[i]] {
                tp += 1;
            } else {
                fp += 1;
            }
            i += 1;
        }
        points.push(RocPoint {
            threshold,
            fpr: fp as f64 / n,
            tpr: tp as f64 / p,
        });
    }

    // the lowest threshold calls everything positive
    if let Some(last) = points.last() {
        if last.fpr < 1.0 || last.tpr < 1.0 {
            points.push(RocPoint {
                threshold: f64::NEG_INFINITY,
                fpr: 1.0,
                tpr: 1.0,
            });
        }
    }

    Ok(RocCurve { points })
}

/// Trapezoidal area under the curve.
pub fn auc(curve: &RocCurve) -> f64 {
    curve
        .points
        .windows(2)
        .map(|w| (w[1].fpr - w[0].fpr) * (w[0].tpr + w[1].tpr) / 2.0)
        .sum()
}

/// Shorthand for `auc(&roc_curve(..)?)`.
pub fn roc_auc(y_true: &[bool], scores: &[f64]) -> Result<f64> {
    Ok(auc(&roc_curve(y_true, scores)?))
}

/// Point AUROC with a percentile bootstrap interval.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AucInterval {
    pub auc: f64,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
    /// Resamples that contained both classes.
    pub resamples: usize,
}

/// Percentile bootstrap for AUROC at level `1 - alpha`.
///
/// Resamples that draw a single class carry no ROC and are skipped. When none
/// survive the bounds are `None`.
pub fn bootstrap_auc_ci(
    y_true: &[bool],
    scores: &[f64],
    resamples: usize,
    alpha: f64,
    seed: u64,
) -> Result<AucInterval> {
    let point = roc_auc(y_true, scores)?;
    let n = y_true.len();
    let mut rng = StdRng::seed_from_u64(seed);

    let mut draws = Vec::with_capacity(resamples);
    let mut sample_truth = vec![false; n];
    let mut sample_scores = vec![0.0; n];
    for _ in 0..resamples {
        for slot in 0..n {
            let idx = rng.gen_range(0..n);
            sample_truth[slot] = y_true[idx];
            sample_scores[slot] = scores[idx];
        }
        match roc_auc(&sample_truth, &sample_scores) {
            Ok(value) => draws.push(value),
            Err(EvalError::SingleClass(_)) => continue,
            Err(other) => return Err(other),
        }
    }

    if draws.is_empty() {
        return Ok(AucInterval {
            auc: point,
            lower: None,
            upper: None,
            resamples: 0,
        });
    }
    draws.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let alpha = alpha.clamp(0.0, 1.0);
    Ok(AucInterval {
        auc: point,
        lower: Some(percentile(&draws, alpha / 2.0)),
        upper: Some(percentile(&draws, 1.0 - alpha / 2.0)),
        resamples: draws.len(),
    })
}

fn percentile(sorted: &[f64], q: f64) -> f64 {
    let rank = (q * (sorted.len() - 1) as f64).round() as usize;
    sorted[rank.min(sorted.len() - 1)]
}
