//! Storage seam for table/character rows (§6 "Persisted state"). The
//! exact column layout is left to the implementation; this trait only
//! commits to a dictionary-shaped JSON blob as the authoritative row
//! format. `InMemoryStore` is what `ActionCore`/`CharacterStore`
//! use in tests and is a perfectly valid standalone deployment backend
//! for a single-process server; a real deployment swaps in a database-
//! backed implementation behind the same trait.

use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::Value;

use crate::error::ServerError;

/// Implementations are held behind `Arc<S>` and passed generically (no
/// `dyn` dispatch needed here), so this can stay a plain trait with
/// native `async fn` rather than pulling in an object-safety shim.
pub trait PersistenceStore: Send + Sync {
    fn put_table(&self, table_id: &str, row: Value) -> impl std::future::Future<Output = Result<(), ServerError>> + Send;
    fn get_table(&self, table_id: &str) -> impl std::future::Future<Output = Result<Option<Value>, ServerError>> + Send;
    fn delete_table(&self, table_id: &str) -> impl std::future::Future<Output = Result<(), ServerError>> + Send;

    fn put_character(&self, character_id: &str, row: Value) -> impl std::future::Future<Output = Result<(), ServerError>> + Send;
    fn get_character(&self, character_id: &str) -> impl std::future::Future<Output = Result<Option<Value>, ServerError>> + Send;
    fn delete_character(&self, character_id: &str) -> impl std::future::Future<Output = Result<(), ServerError>> + Send;
}

#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<HashMap<String, Value>>,
    characters: Mutex<HashMap<String, Value>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        InMemoryStore::default()
    }
}

impl PersistenceStore for InMemoryStore {
    async fn put_table(&self, table_id: &str, row: Value) -> Result<(), ServerError> {
        self.tables
            .lock()
            .map_err(|_| ServerError::LockPoisoned)?
            .insert(table_id.to_string(), row);
        Ok(())
    }

    async fn get_table(&self, table_id: &str) -> Result<Option<Value>, ServerError> {
        Ok(self.tables.lock().map_err(|_| ServerError::LockPoisoned)?.get(table_id).cloned())
    }

    async fn delete_table(&self, table_id: &str) -> Result<(), ServerError> {
        self.tables.lock().map_err(|_| ServerError::LockPoisoned)?.remove(table_id);
        Ok(())
    }

    async fn put_character(&self, character_id: &str, row: Value) -> Result<(), ServerError> {
        self.characters
            .lock()
            .map_err(|_| ServerError::LockPoisoned)?
            .insert(character_id.to_string(), row);
        Ok(())
    }

    async fn get_character(&self, character_id: &str) -> Result<Option<Value>, ServerError> {
        Ok(self.characters.lock().map_err(|_| ServerError::LockPoisoned)?.get(character_id).cloned())
    }

    async fn delete_character(&self, character_id: &str) -> Result<(), ServerError> {
        self.characters.lock().map_err(|_| ServerError::LockPoisoned)?.remove(character_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn put_then_get_table_round_trips() {
        let store = InMemoryStore::new();
        store.put_table("t1", json!({"name": "Test"})).await.unwrap();
        let row = store.get_table("t1").await.unwrap();
        assert_eq!(row.unwrap()["name"], "Test");
    }

    #[tokio::test]
    async fn delete_table_removes_the_row() {
        let store = InMemoryStore::new();
        store.put_table("t1", json!({})).await.unwrap();
        store.delete_table("t1").await.unwrap();
        assert!(store.get_table("t1").await.unwrap().is_none());
    }
}
