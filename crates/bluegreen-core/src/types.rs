//! Domain types for deployment color state.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::color::Color;

/// One deployment's color state, as the domain sees it.
///
/// Exactly zero or one of these exists per deployment key. `last_updated`
/// and `metadata` are informational and never consulted for control logic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentState {
    /// Caller-chosen identifier, the table's partition key. Immutable.
    pub deployment_key: String,
    pub active_color: Color,
    /// ISO-8601 timestamp of the last write, UTC.
    pub last_updated: String,
    /// Provenance of the last write: who triggered it, the previous
    /// color, run identifiers. Additive, string-to-string.
    pub metadata: HashMap<String, String>,
}

/// The raw row shape persisted in the backing table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateRow {
    pub deployment_key: String,
    pub active_color: String,
    pub last_updated: String,
    pub metadata: HashMap<String, String>,
}

/// Who and what triggered this invocation, as reported by the host
/// orchestrator. Merged into row metadata on every write.
#[derive(Debug, Clone, Default)]
pub struct Provenance {
    pub actor: Option<String>,
    pub run_id: Option<String>,
    pub workflow: Option<String>,
}
