//! LeagueTable Runner — orchestration and sinks around `leaguetable-core`.
//!
//! The runner owns everything with side effects beyond HTTP extraction:
//! environment-driven configuration, the warehouse (Parquet tables plus the
//! append-only metrics CSV), CSV export, email alerting, and the pipeline
//! that wires the per-source extract/transform/load passes together.

pub mod alert;
pub mod config;
pub mod export;
pub mod pipeline;
pub mod warehouse;

pub use alert::{AlertConfig, Alerter, EmailAlerter};
pub use config::{ConfigError, PipelineConfig};
pub use pipeline::{run_pipeline, Pipeline, RunParams, RunReport};
pub use warehouse::{LoadError, LocalWarehouse, Warehouse};
