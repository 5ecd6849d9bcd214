use std::{fs, path::PathBuf};

use sepsis_eval::analysis::{cohort_summary, rule_op_stats, scores_by_outcome};
use sepsis_eval::data::cohort::{load_cohort, CohortError, Outcome, Score};
use sepsis_eval::metrics::Rule;
use tempfile::TempDir;

const COHORT: &str = "\
icustay_id,subject_id,age,excluded,qsofa,sofa,sirs,lods,angus,hospital_expire_flag
200001,10,65,0,2,3,2,4,1,0
200002,11,70,0,0,1,1,1,0,0
200003,12,80,0,3,5,3,6,1,1
200004,13,15,1,1,0,2,0,0,0
200005,14,54,0,1,2,3,2,0,1
";

fn write_cohort(dir: &TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("cohort.csv");
    fs::write(&path, body).unwrap();
    path
}

#[test]
fn loads_records_in_file_order() {
    let dir = TempDir::new().unwrap();
    let cohort = load_cohort(&write_cohort(&dir, COHORT), None).unwrap();
    assert_eq!(cohort.len(), 5);
    assert_eq!(cohort.records()[0].icustay_id, 200001);
    assert_eq!(cohort.records()[0].subject_id, Some(10));
    assert_eq!(cohort.scores(Score::Sofa), vec![3, 1, 5, 0, 2]);
    assert_eq!(
        cohort.outcome(Outcome::Mortality),
        vec![false, false, true, false, true]
    );
    assert!((cohort.prevalence(Outcome::Angus) - 0.4).abs() < 1e-12);
}

#[test]
fn exclusion_expression_drops_matching_rows() {
    let dir = TempDir::new().unwrap();
    let path = write_cohort(&dir, COHORT);
    let cohort = load_cohort(&path, Some("excluded = 1")).unwrap();
    assert_eq!(cohort.len(), 4);
    assert!(cohort.records().iter().all(|r| r.icustay_id != 200004));

    let adults = load_cohort(&path, Some("age < 16 OR sofa > 4")).unwrap();
    let ids: Vec<i64> = adults.records().iter().map(|r| r.icustay_id).collect();
    assert_eq!(ids, vec![200001, 200002, 200005]);
}

#[test]
fn missing_required_column_is_fatal() {
    let dir = TempDir::new().unwrap();
    let body = "icustay_id,qsofa,sofa,sirs,angus,hospital_expire_flag\n1,1,1,1,0,0\n";
    let err = load_cohort(&write_cohort(&dir, body), None).unwrap_err();
    assert!(matches!(err, CohortError::MissingColumn(ref c) if c == "lods"));
}

#[test]
fn repeated_patient_is_rejected() {
    let dir = TempDir::new().unwrap();
    let body = "\
icustay_id,subject_id,qsofa,sofa,sirs,lods,angus,hospital_expire_flag
1,10,1,1,1,1,0,0
2,10,2,2,2,2,1,0
";
    let err = load_cohort(&write_cohort(&dir, body), None).unwrap_err();
    assert!(matches!(err, CohortError::DuplicatePatient(10)));
}

#[test]
fn negative_and_missing_scores_are_rejected() {
    let dir = TempDir::new().unwrap();
    let negative = "\
icustay_id,qsofa,sofa,sirs,lods,angus,hospital_expire_flag
1,1,-1,1,1,0,0
";
    let err = load_cohort(&write_cohort(&dir, negative), None).unwrap_err();
    assert!(matches!(err, CohortError::NegativeScore { value: -1, row: 0, .. }));

    let missing = "\
icustay_id,qsofa,sofa,sirs,lods,angus,hospital_expire_flag
1,1,2,1,1,0,0
2,1,,1,1,0,0
";
    let err = load_cohort(&write_cohort(&dir, missing), None).unwrap_err();
    assert!(matches!(err, CohortError::NullValue { ref column, row: 1 } if column == "sofa"));
}

#[test]
fn fractional_scores_are_rejected_rather_than_truncated() {
    let dir = TempDir::new().unwrap();
    let body = "\
icustay_id,qsofa,sofa,sirs,lods,angus,hospital_expire_flag
1,1.9,2,1,1,0,0
2,1,2,1,1,1,0
";
    let err = load_cohort(&write_cohort(&dir, body), None).unwrap_err();
    assert!(matches!(
        err,
        CohortError::NonInteger { ref column, row: 0, value } if column == "qsofa" && value == 1.9
    ));
}

#[test]
fn outcome_flags_outside_zero_one_are_rejected() {
    let dir = TempDir::new().unwrap();
    let angus = "\
icustay_id,qsofa,sofa,sirs,lods,angus,hospital_expire_flag
1,1,2,1,1,7,0
2,1,2,1,1,0,1
";
    let err = load_cohort(&write_cohort(&dir, angus), None).unwrap_err();
    assert!(matches!(
        err,
        CohortError::InvalidFlag { ref column, row: 0, value: 7 } if column == "angus"
    ));

    let mortality = "\
icustay_id,qsofa,sofa,sirs,lods,angus,hospital_expire_flag
1,1,2,1,1,1,0
2,1,2,1,1,0,-1
";
    let err = load_cohort(&write_cohort(&dir, mortality), None).unwrap_err();
    assert!(matches!(
        err,
        CohortError::InvalidFlag { ref column, row: 1, value: -1 } if column == "hospital_expire_flag"
    ));
}

#[test]
fn scores_above_their_maximum_are_rejected() {
    let dir = TempDir::new().unwrap();
    let sofa = "\
icustay_id,qsofa,sofa,sirs,lods,angus,hospital_expire_flag
1,1,30,1,1,1,0
";
    let err = load_cohort(&write_cohort(&dir, sofa), None).unwrap_err();
    assert!(matches!(
        err,
        CohortError::ScoreOutOfRange { ref column, row: 0, value: 30, max: 24 } if column == "sofa"
    ));

    let huge = "\
icustay_id,qsofa,sofa,sirs,lods,angus,hospital_expire_flag
1,1,2,1,4000000000,1,0
";
    let err = load_cohort(&write_cohort(&dir, huge), None).unwrap_err();
    assert!(matches!(
        err,
        CohortError::ScoreOutOfRange { ref column, value: 4_000_000_000, max: 22, .. } if column == "lods"
    ));
}

#[test]
fn repeated_stay_is_rejected_without_subject_ids() {
    let dir = TempDir::new().unwrap();
    let body = "\
icustay_id,qsofa,sofa,sirs,lods,angus,hospital_expire_flag
7,1,1,1,1,0,0
7,2,2,2,2,1,1
";
    let err = load_cohort(&write_cohort(&dir, body), None).unwrap_err();
    assert!(matches!(err, CohortError::DuplicateStay(7)));
}

#[test]
fn null_predicate_keeps_the_row() {
    let dir = TempDir::new().unwrap();
    let body = "\
icustay_id,age,qsofa,sofa,sirs,lods,angus,hospital_expire_flag
1,70,1,2,1,1,1,0
2,,2,3,2,2,0,1
3,12,0,1,1,1,0,0
";
    let cohort = load_cohort(&write_cohort(&dir, body), Some("age < 16")).unwrap();
    let ids: Vec<i64> = cohort.records().iter().map(|r| r.icustay_id).collect();
    assert_eq!(ids, vec![1, 2]);
}

#[test]
fn excluding_everything_is_an_error() {
    let dir = TempDir::new().unwrap();
    let err = load_cohort(&write_cohort(&dir, COHORT), Some("age > 0")).unwrap_err();
    assert!(matches!(err, CohortError::Empty));
}

#[test]
fn sepsis3_rule_runs_against_loaded_cohort() {
    let dir = TempDir::new().unwrap();
    let cohort = load_cohort(&write_cohort(&dir, COHORT), None).unwrap();
    let rule: Rule = "sepsis3=qsofa>=2&sofa>=2".parse().unwrap();
    assert_eq!(
        rule.predict(&cohort).unwrap(),
        vec![true, false, true, false, false]
    );

    let table = rule_op_stats(&cohort, Outcome::Angus, &[rule]).unwrap();
    let stats = &table["sepsis3"];
    assert_eq!((stats.tp, stats.fp, stats.fn_, stats.tn), (2, 0, 0, 3));
    assert_eq!(stats.accuracy, 1.0);
}

#[test]
fn summaries_group_by_outcome() {
    let dir = TempDir::new().unwrap();
    let cohort = load_cohort(&write_cohort(&dir, COHORT), None).unwrap();
    let summary = cohort_summary(&cohort);
    assert_eq!(summary.n, 5);
    assert_eq!(summary.outcomes["angus"].positives, 2);
    assert_eq!(summary.outcomes["mortality"].positives, 2);

    let table = scores_by_outcome(&cohort, Outcome::Angus).unwrap();
    assert_eq!(table.height(), 2);
    let counts: Vec<u32> = table
        .column("n")
        .unwrap()
        .u32()
        .unwrap()
        .into_no_null_iter()
        .collect();
    assert_eq!(counts, vec![3, 2]);
}
