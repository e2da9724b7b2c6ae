//! In-memory table store (for testing).

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::error::Result;
use crate::store::TableStore;
use crate::types::StateRow;

/// HashMap-backed [`TableStore`] with call counters, so tests can assert
/// exactly which store operations an action performed.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: Mutex<HashMap<String, StateRow>>,
    exists: AtomicBool,
    create_calls: AtomicUsize,
    wait_calls: AtomicUsize,
    put_calls: AtomicUsize,
}

impl MemoryStore {
    /// A store whose backing table does not exist yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose backing table already exists.
    pub fn with_table() -> Self {
        let store = Self::default();
        store.exists.store(true, Ordering::SeqCst);
        store
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn wait_calls(&self) -> usize {
        self.wait_calls.load(Ordering::SeqCst)
    }

    pub fn put_calls(&self) -> usize {
        self.put_calls.load(Ordering::SeqCst)
    }

    /// Snapshot of the stored row for a key, if any.
    pub fn row(&self, deployment_key: &str) -> Option<StateRow> {
        self.rows
            .lock()
            .expect("memory store mutex poisoned")
            .get(deployment_key)
            .cloned()
    }

    /// Seed a row directly, bypassing the counters.
    pub fn insert_row(&self, row: StateRow) {
        self.rows
            .lock()
            .expect("memory store mutex poisoned")
            .insert(row.deployment_key.clone(), row);
    }
}

#[async_trait]
impl TableStore for MemoryStore {
    async fn table_exists(&self) -> Result<bool> {
        Ok(self.exists.load(Ordering::SeqCst))
    }

    async fn create_table(&self) -> Result<()> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.exists.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn wait_until_active(&self) -> Result<()> {
        self.wait_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn get_item(&self, deployment_key: &str) -> Result<Option<StateRow>> {
        Ok(self.row(deployment_key))
    }

    async fn put_item(&self, row: StateRow) -> Result<()> {
        self.put_calls.fetch_add(1, Ordering::SeqCst);
        self.rows
            .lock()
            .expect("memory store mutex poisoned")
            .insert(row.deployment_key.clone(), row);
        Ok(())
    }
}
