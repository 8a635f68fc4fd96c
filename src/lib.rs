//! # Driftwatch - Distribution Drift and Anomaly Scoring
//!
//! Driftwatch quantifies how two snapshots of a tabular dataset differ and
//! flags individual rows that look anomalous. It is meant to sit inside a
//! data-quality monitoring job: feed it snapshots, get back flat metric
//! records that a threshold checker or report renderer can consume.
//!
//! ## Quick Start
//!
//! ```
//! use driftwatch::compare::compare;
//! use driftwatch::config::ComparisonOptions;
//! use driftwatch::snapshot::Snapshot;
//! use polars::prelude::*;
//!
//! # fn main() -> driftwatch::error::Result<()> {
//! let reference = Snapshot::from_columns(
//!     "january",
//!     vec![Column::from(Series::new("age".into(), vec![21.0, 35.0, 42.0, 58.0]))],
//! )?;
//! let current = Snapshot::from_columns(
//!     "february",
//!     vec![Column::from(Series::new("age".into(), vec![22.0, 36.0, 61.0, 70.0]))],
//! )?;
//!
//! let report = compare(&current, &reference, &ComparisonOptions::default(), None)?;
//! assert!(report.value("dq.represent.psi.age").is_some());
//! assert!(report.value("dq.represent.ks.age").is_some());
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Modules
//!
//! - [`snapshot`]: Named read-only views over a `polars` `DataFrame`
//! - [`stats`]: Pure numerics (quantile bins, PSI, KS, robust scores)
//! - [`compare`]: Candidate-vs-reference comparison
//! - [`drift`]: Drift relabelling and drift history over time
//! - [`anomaly`]: Row-level outlier scoring (auto or pluggable model)
//! - [`metrics`]: Metric ids, records and the result container
//! - [`sink`]: Where side tables (bin edges, flagged rows) go
//! - [`config`]: Settings file and per-call options
//! - [`error`]: Error types and handling utilities
//! - [`logging`]: `tracing` subscriber setup
//!
//! ## Degenerate Data
//!
//! Empty samples, constant columns and unseen categories never raise errors.
//! The affected statistic is reported as `NaN` (serialized as `null`) and
//! left out of dataset-level aggregates. Errors are reserved for invalid
//! options, missing columns, a failing sink or a failing model.

#![warn(clippy::all, rust_2018_idioms)]

pub mod anomaly;
pub mod compare;
pub mod config;
pub mod drift;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod sink;
pub mod snapshot;
pub mod stats;
