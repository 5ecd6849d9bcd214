use sepsis_eval::metrics::{
    accuracy, confusion_matrix, format_op_stats, op_stats, ConfusionMatrix, EvalError,
};

#[test]
fn balanced_example_fills_every_cell_once() {
    let truth = [true, true, false, false];
    let preds = [true, false, true, false];
    let matrix = confusion_matrix(&truth, &preds).unwrap();
    assert_eq!(matrix.as_tuple(), (1, 1, 1, 1));
    assert_eq!(accuracy(&truth, &preds).unwrap(), 0.5);
    insta::assert_json_snapshot!(matrix, @r###"
    {
      "tp": 1,
      "fp": 1,
      "fn": 1,
      "tn": 1
    }
    "###);
}

#[test]
fn operating_rates_follow_their_definitions() {
    let matrix = ConfusionMatrix {
        true_pos: 30,
        false_pos: 10,
        false_neg: 20,
        true_neg: 40,
    };
    assert_eq!(matrix.total(), 100);
    assert_eq!(matrix.accuracy(), Some(0.7));
    assert_eq!(matrix.sensitivity(), Some(0.6));
    assert_eq!(matrix.specificity(), Some(0.8));
    assert_eq!(matrix.ppv(), Some(0.75));
    assert_eq!(matrix.npv(), Some(40.0 / 60.0));
}

#[test]
fn undefined_rates_are_none() {
    let matrix = confusion_matrix(&[false, false], &[false, false]).unwrap();
    assert_eq!(matrix.sensitivity(), None);
    assert_eq!(matrix.ppv(), None);
    assert_eq!(matrix.specificity(), Some(1.0));
}

#[test]
fn size_mismatch_and_empty_input_fail() {
    assert!(matches!(
        confusion_matrix(&[true, false], &[true]),
        Err(EvalError::LengthMismatch {
            expected: 2,
            found: 1,
            ..
        })
    ));
    assert_eq!(accuracy(&[], &[]), Err(EvalError::Empty("ground truth")));
}

#[test]
fn op_stats_keep_caller_order() {
    let truth = [true, false, true, false];
    let sirs = [true, true, true, true];
    let qsofa = [true, false, false, false];
    let table = op_stats(&truth, [("sirs", &sirs[..]), ("qsofa", &qsofa[..])]).unwrap();
    let names: Vec<&str> = table.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["sirs", "qsofa"]);
    assert_eq!(table["sirs"].sensitivity, Some(1.0));
    assert_eq!(table["sirs"].specificity, Some(0.0));
    assert_eq!(table["qsofa"].ppv, Some(1.0));

    let text = format_op_stats(&table);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("rule"));
    assert!(lines[1].starts_with("sirs"));
    assert!(lines[2].starts_with("qsofa"));
}

#[test]
fn op_stats_reject_repeated_rule_names() {
    let truth = [true, false];
    let preds = [true, false];
    let result = op_stats(&truth, [("sofa", &preds[..]), ("sofa", &preds[..])]);
    assert_eq!(result, Err(EvalError::DuplicateRule("sofa".into())));
}
