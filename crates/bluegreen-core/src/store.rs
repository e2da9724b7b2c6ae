//! Store client seam — the table operations the repository needs.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::StateRow;

/// Backing-table operations behind the repository.
///
/// Implemented by [`crate::dynamo::DynamoStore`] for production and
/// [`crate::memory::MemoryStore`] for tests.
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Whether the backing table exists. A "resource not found" answer
    /// from the store is `Ok(false)`; any other failure is
    /// [`StoreUnavailable`](crate::Error::StoreUnavailable).
    async fn table_exists(&self) -> Result<bool>;

    /// Create the backing table: single string partition key
    /// (`deployment_key`), on-demand capacity. Does not wait for the
    /// table to become active.
    async fn create_table(&self) -> Result<()>;

    /// Poll until the table reports active status, within a bounded
    /// attempt budget. Transient describe failures count against the
    /// same budget.
    async fn wait_until_active(&self) -> Result<()>;

    /// Point read by deployment key. An absent row is `Ok(None)`, not
    /// an error.
    async fn get_item(&self, deployment_key: &str) -> Result<Option<StateRow>>;

    /// Unconditional overwrite of the row for the row's key.
    /// Last-writer-wins; there is no conditional-write guard.
    async fn put_item(&self, row: StateRow) -> Result<()>;
}

/// Configuration for the backing table and its activation poll.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub table_name: String,
    /// Optional endpoint override (e.g. LocalStack).
    pub endpoint: Option<String>,
    /// Attempts for the table-activation poll.
    pub active_poll_attempts: u32,
    /// Spacing between activation poll attempts.
    pub active_poll_interval: Duration,
}

impl StoreConfig {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            endpoint: None,
            active_poll_attempts: 30,
            active_poll_interval: Duration::from_secs(5),
        }
    }
}
