//! Evaluation of Sepsis-3 criteria against Angus sepsis and in-hospital mortality.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod data;
pub mod logging;
pub mod metrics;
pub mod plot;
