use proptest::prelude::*;
use sepsis_eval::metrics::{accuracy, auc, confusion_matrix, roc_auc, roc_curve};

fn both_classes(y: &[bool]) -> bool {
    y.iter().any(|&v| v) && y.iter().any(|&v| !v)
}

fn mann_whitney(y: &[bool], scores: &[f64]) -> f64 {
    let mut wins = 0.0;
    let mut pairs = 0.0;
    for (i, &pos) in y.iter().enumerate() {
        if !pos {
            continue;
        }
        for (j, &neg) in y.iter().enumerate() {
            if neg {
                continue;
            }
            pairs += 1.0;
            if scores[i] > scores[j] {
                wins += 1.0;
            } else if scores[i] == scores[j] {
                wins += 0.5;
            }
        }
    }
    wins / pairs
}

proptest! {
    #[test]
    fn confusion_counts_cover_every_record(pairs in prop::collection::vec(any::<(bool, bool)>(), 1..200)) {
        let (truth, preds): (Vec<bool>, Vec<bool>) = pairs.into_iter().unzip();
        let matrix = confusion_matrix(&truth, &preds).unwrap();
        prop_assert_eq!(matrix.total(), truth.len() as u64);
        let acc = accuracy(&truth, &preds).unwrap();
        prop_assert!((0.0..=1.0).contains(&acc));
        prop_assert_eq!(accuracy(&truth, &truth).unwrap(), 1.0);
    }

    #[test]
    fn roc_is_monotone_between_fixed_endpoints(rows in prop::collection::vec((any::<bool>(), 0u8..20), 2..150)) {
        let (y, raw): (Vec<bool>, Vec<u8>) = rows.into_iter().unzip();
        prop_assume!(both_classes(&y));
        let scores: Vec<f64> = raw.iter().map(|&s| f64::from(s)).collect();
        let curve = roc_curve(&y, &scores).unwrap();
        let coords = curve.coordinates();
        prop_assert_eq!(coords.first().copied(), Some((0.0, 0.0)));
        prop_assert_eq!(coords.last().copied(), Some((1.0, 1.0)));
        for w in coords.windows(2) {
            prop_assert!(w[1].0 >= w[0].0 && w[1].1 >= w[0].1);
        }
        let area = auc(&curve);
        prop_assert!((0.0..=1.0).contains(&area));
        prop_assert!((area - mann_whitney(&y, &scores)).abs() < 1e-9);
    }

    #[test]
    fn auc_ignores_strictly_monotonic_transforms(rows in prop::collection::vec((any::<bool>(), 0u8..30), 2..120)) {
        let (y, raw): (Vec<bool>, Vec<u8>) = rows.into_iter().unzip();
        prop_assume!(both_classes(&y));
        let scores: Vec<f64> = raw.iter().map(|&s| f64::from(s)).collect();
        let affine: Vec<f64> = scores.iter().map(|s| 3.0 * s + 7.0).collect();
        let exponential: Vec<f64> = scores.iter().map(|s| (s / 4.0).exp()).collect();
        let base = roc_auc(&y, &scores).unwrap();
        prop_assert!((base - roc_auc(&y, &affine).unwrap()).abs() < 1e-12);
        prop_assert!((base - roc_auc(&y, &exponential).unwrap()).abs() < 1e-12);
    }

    #[test]
    fn constant_scores_sit_on_the_diagonal(y in prop::collection::vec(any::<bool>(), 2..100), level in 0u8..10) {
        prop_assume!(both_classes(&y));
        let scores = vec![f64::from(level); y.len()];
        prop_assert!((roc_auc(&y, &scores).unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn separating_scores_reach_unit_auc(n_pos in 1usize..40, n_neg in 1usize..40) {
        let mut y = vec![true; n_pos];
        y.extend(vec![false; n_neg]);
        let scores: Vec<f64> = y.iter().enumerate().map(|(i, &p)| if p { 100.0 + i as f64 } else { i as f64 - 100.0 }).collect();
        prop_assert!((roc_auc(&y, &scores).unwrap() - 1.0).abs() < 1e-12);
    }
}
