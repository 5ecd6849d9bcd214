//! Loading the extracted ICU cohort into typed records.

use std::{collections::HashSet, fmt, path::Path, str::FromStr};

use clap::ValueEnum;
use polars::prelude::*;
use polars::sql::SQLContext;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

/// Severity scores carried per ICU stay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Score {
    Qsofa,
    Sofa,
    Sirs,
    Lods,
}

impl Score {
    pub const ALL: [Score; 4] = [Score::Qsofa, Score::Sofa, Score::Sirs, Score::Lods];

    pub fn column(self) -> &'static str {
        match self {
            Self::Qsofa => "qsofa",
            Self::Sofa => "sofa",
            Self::Sirs => "sirs",
            Self::Lods => "lods",
        }
    }

    /// Highest value the scoring system can produce.
    pub fn max(self) -> u32 {
        match self {
            Self::Qsofa => 3,
            Self::Sofa => 24,
            Self::Sirs => 4,
            Self::Lods => 22,
        }
    }

    /// Conventional clinical spelling, used in plot legends.
    pub fn label(self) -> &'static str {
        match self {
            Self::Qsofa => "qSOFA",
            Self::Sofa => "SOFA",
            Self::Sirs => "SIRS",
            Self::Lods => "LODS",
        }
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for Score {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Score::ALL
            .into_iter()
            .find(|score| score.column().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown score `{s}`"))
    }
}

/// Binary outcomes the scores are judged against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// Sepsis per the Angus claims-based criteria.
    Angus,
    /// In-hospital death.
    Mortality,
}

impl Outcome {
    pub const ALL: [Outcome; 2] = [Outcome::Angus, Outcome::Mortality];

    pub fn column(self) -> &'static str {
        match self {
            Self::Angus => "angus",
            Self::Mortality => "hospital_expire_flag",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Angus => f.write_str("angus"),
            Self::Mortality => f.write_str("mortality"),
        }
    }
}

/// Failures while reading or validating the cohort. All of them abort a run.
#[derive(Debug, Error)]
pub enum CohortError {
    #[error("reading cohort: {0}")]
    Polars(#[from] PolarsError),
    #[error("cohort is missing required column `{0}`")]
    MissingColumn(String),
    #[error("column `{column}` has a missing value at row {row}")]
    NullValue { column: String, row: usize },
    #[error("score `{column}` is negative ({value}) at row {row}")]
    NegativeScore {
        column: String,
        row: usize,
        value: i64,
    },
    #[error("score `{column}` is {value} at row {row}, above its maximum of {max}")]
    ScoreOutOfRange {
        column: String,
        row: usize,
        value: i64,
        max: u32,
    },
    #[error("column `{column}` holds non-integer value {value} at row {row}")]
    NonInteger {
        column: String,
        row: usize,
        value: f64,
    },
    #[error("flag `{column}` must be 0 or 1, found {value} at row {row}")]
    InvalidFlag {
        column: String,
        row: usize,
        value: i64,
    },
    #[error("subject {0} contributes more than one ICU stay")]
    DuplicatePatient(i64),
    #[error("ICU stay {0} appears more than once")]
    DuplicateStay(i64),
    #[error("cohort has no rows after exclusions")]
    Empty,
}

/// One adult first ICU stay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CohortRecord {
    pub icustay_id: i64,
    pub subject_id: Option<i64>,
    pub qsofa: u32,
    pub sofa: u32,
    pub sirs: u32,
    pub lods: u32,
    pub angus: bool,
    pub hospital_expire_flag: bool,
}

impl CohortRecord {
    pub fn score(&self, score: Score) -> u32 {
        match score {
            Score::Qsofa => self.qsofa,
            Score::Sofa => self.sofa,
            Score::Sirs => self.sirs,
            Score::Lods => self.lods,
        }
    }

    pub fn outcome(&self, outcome: Outcome) -> bool {
        match outcome {
            Outcome::Angus => self.angus,
            Outcome::Mortality => self.hospital_expire_flag,
        }
    }
}

/// The loaded cohort. Record order is the order of the source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cohort {
    records: Vec<CohortRecord>,
}

impl Cohort {
    /// Wrap validated records; rejects an empty set, repeated stays and repeated patients.
    pub fn from_records(records: Vec<CohortRecord>) -> Result<Self, CohortError> {
        if records.is_empty() {
            return Err(CohortError::Empty);
        }
        let mut stays = HashSet::new();
        for record in &records {
            if !stays.insert(record.icustay_id) {
                return Err(CohortError::DuplicateStay(record.icustay_id));
            }
        }
        let mut seen = HashSet::new();
        for subject in records.iter().filter_map(|r| r.subject_id) {
            if !seen.insert(subject) {
                return Err(CohortError::DuplicatePatient(subject));
            }
        }
        Ok(Self { records })
    }

    pub fn records(&self) -> &[CohortRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn scores(&self, score: Score) -> Vec<u32> {
        self.records.iter().map(|r| r.score(score)).collect()
    }

    /// Scores widened to `f64` for ROC analysis.
    pub fn score_values(&self, score: Score) -> Vec<f64> {
        self.records.iter().map(|r| f64::from(r.score(score))).collect()
    }

    pub fn outcome(&self, outcome: Outcome) -> Vec<bool> {
        self.records.iter().map(|r| r.outcome(outcome)).collect()
    }

    /// Fraction of records with a positive outcome.
    pub fn prevalence(&self, outcome: Outcome) -> f64 {
        let positives = self.records.iter().filter(|r| r.outcome(outcome)).count();
        positives as f64 / self.records.len().max(1) as f64
    }

    /// Columnar view for grouped summaries.
    pub fn to_frame(&self) -> PolarsResult<DataFrame> {
        let score_series = Score::ALL.into_iter().map(|score| {
            Series::new(
                score.column().into(),
                self.records
                    .iter()
                    .map(|r| i64::from(r.score(score)))
                    .collect::<Vec<_>>(),
            )
        });
        let mut columns = vec![
            Series::new(
                "icustay_id".into(),
                self.records.iter().map(|r| r.icustay_id).collect::<Vec<_>>(),
            ),
            Series::new(
                "subject_id".into(),
                self.records.iter().map(|r| r.subject_id).collect::<Vec<_>>(),
            ),
        ];
        columns.extend(score_series);
        for outcome in Outcome::ALL {
            columns.push(Series::new(
                outcome.column().into(),
                self.records
                    .iter()
                    .map(|r| r.outcome(outcome))
                    .collect::<Vec<_>>(),
            ));
        }
        DataFrame::new(columns)
    }
}

/// Read the cohort CSV, drop excluded rows and validate what remains.
pub fn load_cohort(path: &Path, exclusion: Option<&str>) -> Result<Cohort, CohortError> {
    let df = read_frame(path)?;
    let raw_rows = df.height();
    let df = match exclusion {
        Some(expr) => apply_exclusion(df, expr)?,
        None => df,
    };
    if df.height() < raw_rows {
        info!(
            excluded = raw_rows - df.height(),
            kept = df.height(),
            "applied cohort exclusion"
        );
    }
    let cohort = from_frame(&df)?;
    info!(path = %path.display(), rows = cohort.len(), "loaded cohort");
    Ok(cohort)
}

/// Parse the CSV into a data frame with inferred column types.
pub fn read_frame(path: &Path) -> Result<DataFrame, CohortError> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(10_000))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;
    Ok(df)
}

/// Drop every row for which the SQL predicate is true.
///
/// Rows where the predicate evaluates to NULL are kept.
pub fn apply_exclusion(df: DataFrame, expr: &str) -> Result<DataFrame, CohortError> {
    let mut ctx = SQLContext::new();
    ctx.register("cohort", df.lazy());
    let query = format!("SELECT * FROM cohort WHERE NOT COALESCE(({expr}), FALSE)");
    let filtered = ctx.execute(&query)?.collect()?;
    Ok(filtered)
}

/// Convert a frame holding the cohort schema into validated records.
pub fn from_frame(df: &DataFrame) -> Result<Cohort, CohortError> {
    let icustay_ids = int_column(df, "icustay_id")?;
    let subject_ids = if df.column("subject_id").is_ok() {
        Some(int_column(df, "subject_id")?)
    } else {
        warn!("no subject_id column; one-stay-per-patient check skipped");
        None
    };
    let qsofa = score_column(df, Score::Qsofa)?;
    let sofa = score_column(df, Score::Sofa)?;
    let sirs = score_column(df, Score::Sirs)?;
    let lods = score_column(df, Score::Lods)?;
    let angus = flag_column(df, Outcome::Angus.column())?;
    let expired = flag_column(df, Outcome::Mortality.column())?;

    let records = (0..df.height())
        .map(|row| CohortRecord {
            icustay_id: icustay_ids[row],
            subject_id: subject_ids.as_ref().map(|ids| ids[row]),
            qsofa: qsofa[row],
            sofa: sofa[row],
            sirs: sirs[row],
            lods: lods[row],
            angus: angus[row],
            hospital_expire_flag: expired[row],
        })
        .collect();
    Cohort::from_records(records)
}

fn int_column(df: &DataFrame, name: &str) -> Result<Vec<i64>, CohortError> {
    let column = df
        .column(name)
        .map_err(|_| CohortError::MissingColumn(name.to_string()))?;
    // float columns must hold whole numbers; never truncate
    let casted = if column.dtype().is_float() {
        let floats = column.cast(&DataType::Float64)?;
        let inexact = floats
            .f64()?
            .into_iter()
            .enumerate()
            .find_map(|(row, value)| {
                value
                    .filter(|v| !v.is_finite() || v.fract() != 0.0)
                    .map(|v| (row, v))
            });
        if let Some((row, value)) = inexact {
            return Err(CohortError::NonInteger {
                column: name.to_string(),
                row,
                value,
            });
        }
        floats.cast(&DataType::Int64)?
    } else {
        column.strict_cast(&DataType::Int64)?
    };
    let values = casted.i64()?;
    values
        .into_iter()
        .enumerate()
        .map(|(row, value)| {
            value.ok_or_else(|| CohortError::NullValue {
                column: name.to_string(),
                row,
            })
        })
        .collect()
}

fn score_column(df: &DataFrame, score: Score) -> Result<Vec<u32>, CohortError> {
    let name = score.column();
    int_column(df, name)?
        .into_iter()
        .enumerate()
        .map(|(row, value)| {
            if value < 0 {
                return Err(CohortError::NegativeScore {
                    column: name.to_string(),
                    row,
                    value,
                });
            }
            match u32::try_from(value) {
                Ok(points) if points <= score.max() => Ok(points),
                _ => Err(CohortError::ScoreOutOfRange {
                    column: name.to_string(),
                    row,
                    value,
                    max: score.max(),
                }),
            }
        })
        .collect()
}

fn flag_column(df: &DataFrame, name: &str) -> Result<Vec<bool>, CohortError> {
    int_column(df, name)?
        .into_iter()
        .enumerate()
        .map(|(row, value)| match value {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(CohortError::InvalidFlag {
                column: name.to_string(),
                row,
                value: other,
            }),
        })
        .collect()
}
