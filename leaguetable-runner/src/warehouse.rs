//! Warehouse sinks: full-refresh Parquet tables and the append-only
//! execution metrics CSV.
//!
//! Table loads are atomic: the frame is written to a `.tmp` sibling and
//! renamed into place, so a crash mid-write never leaves a truncated table.
//! The metrics file is append-only with the header written once, on first
//! creation.

use crate::export::records_to_dataframe;
use leaguetable_core::{MetricsRow, TeamRecord};
use polars::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("warehouse I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to build table frame: {0}")]
    Frame(String),

    #[error("failed to write parquet table: {0}")]
    Parquet(String),

    #[error("failed to append metrics row: {0}")]
    Metrics(String),
}

/// Sink for transformed records and run metrics. The production
/// implementation is [`LocalWarehouse`]; tests substitute failing stubs.
pub trait Warehouse {
    /// Replace the named table with exactly these records (full refresh).
    fn load_table(&self, records: &[TeamRecord], table: &str) -> Result<(), LoadError>;

    /// Append one run's metrics row to the execution metrics table.
    fn append_metrics(&self, row: &MetricsRow) -> Result<(), LoadError>;
}

/// Directory-backed warehouse: one Parquet file per table plus
/// `execution_metrics.csv`.
pub struct LocalWarehouse {
    root: PathBuf,
}

impl LocalWarehouse {
    pub fn new(root: impl AsRef<Path>) -> Result<Self, LoadError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn table_path(&self, table: &str) -> PathBuf {
        self.root.join(format!("{table}.parquet"))
    }

    pub fn metrics_path(&self) -> PathBuf {
        self.root.join("execution_metrics.csv")
    }
}

impl Warehouse for LocalWarehouse {
    fn load_table(&self, records: &[TeamRecord], table: &str) -> Result<(), LoadError> {
        let mut df = records_to_dataframe(records).map_err(|e| LoadError::Frame(e.to_string()))?;

        let path = self.table_path(table);
        let tmp_path = path.with_extension("parquet.tmp");

        let file = fs::File::create(&tmp_path)?;
        ParquetWriter::new(file)
            .finish(&mut df)
            .map_err(|e| LoadError::Parquet(e.to_string()))?;

        fs::rename(&tmp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            LoadError::Io(e)
        })?;

        tracing::info!(
            table,
            rows = records.len(),
            path = %path.display(),
            "table refreshed"
        );
        Ok(())
    }

    fn append_metrics(&self, row: &MetricsRow) -> Result<(), LoadError> {
        let path = self.metrics_path();
        let write_header = !path.exists();

        let file = fs::OpenOptions::new().create(true).append(true).open(&path)?;
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(write_header)
            .from_writer(file);
        wtr.serialize(row)
            .map_err(|e| LoadError::Metrics(e.to_string()))?;
        wtr.flush()?;

        tracing::info!(path = %path.display(), status = %row.pipeline_status, "metrics row appended");
        Ok(())
    }
}
