//! `tracecheck-recon`: cross-validation of two recordings of one session.
//!
//! Per-person exports and the centralized multi-channel export are each
//! normalized into ordered (timestamp, value) observations, then compared
//! with a rounding tolerance. Every observation without a counterpart on the
//! other side is reported.

pub mod config;
pub mod day;
pub mod engine;
pub mod error;
pub mod metric;
pub mod model;
pub mod naming;
pub mod person;
pub mod reconcile;
pub mod report;
pub mod table;

pub use config::ReconConfig;
pub use engine::{load_sources, reconcile_sources, run, ReconResult};
pub use error::ReconError;
pub use model::{Observation, ObservationSequence, ReconciliationReport, Side};
pub use reconcile::{reconcile, reconcile_into, RoundingPolicy};
pub use report::{ReportSink, TextReport};
