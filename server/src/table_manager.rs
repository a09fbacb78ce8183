//! In-memory table store owned by `ActionCore` (§5 "Shared resources").
//! Per-session serialization happens one layer up (the async scheduler
//! running one operation per session at a time), so this holds no locks
//! of its own beyond the `RwLock` needed to share it across tasks.

use std::collections::HashMap;

use tokio::sync::RwLock;
use vtt_core::types::Table;

#[derive(Default)]
pub struct TableManager {
    tables: RwLock<HashMap<String, Table>>,
}

impl TableManager {
    pub fn new() -> Self {
        TableManager::default()
    }

    pub async fn insert(&self, table: Table) {
        self.tables.write().await.insert(table.table_id.clone(), table);
    }

    pub async fn remove(&self, table_id: &str) -> Option<Table> {
        self.tables.write().await.remove(table_id)
    }

    pub async fn get(&self, table_id: &str) -> Option<Table> {
        self.tables.read().await.get(table_id).cloned()
    }

    pub async fn contains(&self, table_id: &str) -> bool {
        self.tables.read().await.contains_key(table_id)
    }

    pub async fn with_table_mut<F, R>(&self, table_id: &str, f: F) -> Option<R>
    where
        F: FnOnce(&mut Table) -> R,
    {
        let mut guard = self.tables.write().await;
        guard.get_mut(table_id).map(f)
    }

    pub async fn table_ids(&self) -> Vec<String> {
        self.tables.read().await.keys().cloned().collect()
    }
}
