//! Source and payload-kind identifiers shared across the pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The two upstream providers. Their raw schemas are incompatible; each gets
/// its own endpoint descriptor, schema check, and transformer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceId {
    ApiSports,
    ApiFootball,
}

impl SourceId {
    /// Human-readable label used in log and error messages.
    pub fn label(&self) -> &'static str {
        match self {
            SourceId::ApiSports => "API-Sports",
            SourceId::ApiFootball => "API-Football",
        }
    }

    /// Stable key used in metrics columns and table names.
    pub fn key(&self) -> &'static str {
        match self {
            SourceId::ApiSports => "api_sports",
            SourceId::ApiFootball => "api_football",
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which of the two endpoint payloads a value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataKind {
    Teams,
    Standings,
}

impl DataKind {
    pub fn label(&self) -> &'static str {
        match self {
            DataKind::Teams => "teams",
            DataKind::Standings => "standings",
        }
    }
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
