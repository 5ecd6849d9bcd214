//! Cohort ingestion layer.

pub mod cohort;
