//! LeagueTable Core — unified team schema, extraction, validation, transformation.
//!
//! This crate contains the heart of the nightly standings pipeline:
//! - Domain types (the unified 15-field team record and its draft form)
//! - Error and metrics accumulators shared across the run
//! - A parametrized retrying HTTP extractor with transport classification
//! - Structural and schema validators for the two upstream payload shapes
//! - Per-source transformers joining teams and standings into unified records
//!
//! Everything here is synchronous and single-threaded; accumulators are
//! passed as `&mut` so exclusive access is enforced by the borrow checker.
//! An implementation that extracts the two sources in parallel would need to
//! put the accumulators behind a lock to keep error and call counts exact.

pub mod accumulate;
pub mod extract;
pub mod raw;
pub mod record;
pub mod source;
pub mod transform;
pub mod validate;

pub use accumulate::{ErrorCategory, ErrorLog, MetricsRow, RunMetrics, RunStatus};
pub use extract::{
    AuthScheme, ExtractError, Extractor, HttpTransport, ResourceStyle, Sleeper, SourceEndpoint,
    ThreadSleeper, Transport, TransportError, TransportResponse,
};
pub use record::{RecordDraft, TeamRecord, REQUIRED_FIELDS};
pub use source::{DataKind, SourceId};
pub use transform::{
    ApiFootballTransformer, ApiSportsTransformer, TransformError, TransformOutcome,
};
pub use validate::PayloadShape;
