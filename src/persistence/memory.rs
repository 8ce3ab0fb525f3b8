//! In-process record store for the native demo and tests

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use serde_json::{Value, json};

use super::{RecordStore, StoreError, USERS_TABLE};

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<HashMap<&'static str, Vec<Value>>>,
    unavailable: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every call fails, for exercising the failure path
    pub fn unavailable() -> Self {
        Self {
            tables: Mutex::default(),
            unavailable: true,
        }
    }

    fn tables(&self) -> Result<MutexGuard<'_, HashMap<&'static str, Vec<Value>>>, StoreError> {
        if self.unavailable {
            return Err(StoreError::Unavailable("store is offline".into()));
        }
        self.tables
            .lock()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".into()))
    }

    /// Snapshot of a table's rows
    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.tables
            .lock()
            .map(|tables| tables.get(table).cloned().unwrap_or_default())
            .unwrap_or_default()
    }

    pub fn add_user(&self, id: &str, xp: u64) {
        if let Ok(mut tables) = self.tables.lock() {
            tables
                .entry(USERS_TABLE)
                .or_default()
                .push(json!({ "id": id, "xp": xp }));
        }
    }

    pub fn xp(&self, id: &str) -> Option<u64> {
        self.rows(USERS_TABLE)
            .into_iter()
            .find(|row| row["id"] == id)
            .and_then(|row| row["xp"].as_u64())
    }
}

impl RecordStore for MemoryStore {
    async fn insert(&self, table: &'static str, record: Value) -> Result<(), StoreError> {
        self.tables()?.entry(table).or_default().push(record);
        Ok(())
    }

    async fn select_one(&self, table: &'static str, id: &str) -> Result<Option<Value>, StoreError> {
        Ok(self
            .tables()?
            .get(table)
            .and_then(|rows| rows.iter().find(|row| row["id"] == id).cloned()))
    }

    async fn update(&self, table: &'static str, id: &str, patch: Value) -> Result<(), StoreError> {
        let mut tables = self.tables()?;
        let row = tables
            .get_mut(table)
            .and_then(|rows| rows.iter_mut().find(|row| row["id"] == id))
            .ok_or_else(|| StoreError::NotFound {
                table,
                id: id.to_string(),
            })?;
        if let (Some(row), Value::Object(patch)) = (row.as_object_mut(), patch) {
            row.extend(patch);
        }
        Ok(())
    }
}
