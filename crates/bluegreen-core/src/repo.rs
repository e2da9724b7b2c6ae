//! Deployment state repository — domain get/put over a table store.

use std::collections::HashMap;

use chrono::{SecondsFormat, Utc};
use tracing::{debug, info};

use crate::color::Color;
use crate::error::Result;
use crate::store::TableStore;
use crate::types::{DeploymentState, Provenance, StateRow};

/// Maps deployment keys to [`DeploymentState`] records over any
/// [`TableStore`], stamping each write with a timestamp and provenance.
pub struct StateRepository<S> {
    store: S,
    provenance: Provenance,
}

impl<S: TableStore> StateRepository<S> {
    pub fn new(store: S, provenance: Provenance) -> Self {
        Self { store, provenance }
    }

    /// The underlying store (tests assert call counts through this).
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Make sure the backing table exists, creating it on first use and
    /// waiting for it to become active. Returns whether a create
    /// happened. Idempotent, safe to call before every operation.
    pub async fn ensure_table(&self) -> Result<bool> {
        if self.store.table_exists().await? {
            return Ok(false);
        }
        info!("backing table missing, creating it");
        self.store.create_table().await?;
        self.store.wait_until_active().await?;
        Ok(true)
    }

    /// Read the state for a key. Absent rows are `Ok(None)`.
    pub async fn get(&self, deployment_key: &str) -> Result<Option<DeploymentState>> {
        let Some(row) = self.store.get_item(deployment_key).await? else {
            return Ok(None);
        };
        let active_color = Color::parse(&row.active_color)?;
        Ok(Some(DeploymentState {
            deployment_key: row.deployment_key,
            active_color,
            last_updated: row.last_updated,
            metadata: row.metadata,
        }))
    }

    /// Write the state for a key, unconditionally. The row is stamped
    /// with the current UTC time; caller metadata is merged over the
    /// fixed provenance fields.
    pub async fn put(
        &self,
        deployment_key: &str,
        color: Color,
        extra_metadata: HashMap<String, String>,
    ) -> Result<()> {
        let mut metadata = HashMap::new();
        if let Some(actor) = &self.provenance.actor {
            metadata.insert("actor".to_string(), actor.clone());
        }
        if let Some(run_id) = &self.provenance.run_id {
            metadata.insert("run_id".to_string(), run_id.clone());
        }
        if let Some(workflow) = &self.provenance.workflow {
            metadata.insert("workflow".to_string(), workflow.clone());
        }
        metadata.extend(extra_metadata);

        let row = StateRow {
            deployment_key: deployment_key.to_string(),
            active_color: color.as_str().to_string(),
            last_updated: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            metadata,
        };
        debug!(key = %deployment_key, %color, "writing deployment state");
        self.store.put_item(row).await
    }
}
