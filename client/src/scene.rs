//! Holds the set of tables the client knows about and tracks which one
//! is current (§4.3, §4.8). Coordinate transforms and bounds checks
//! themselves live on `vtt_core::types::Table` — this module is the
//! client-side collection around it.

use std::collections::HashMap;

use vtt_core::error::VttError;
use vtt_core::types::Table;

#[derive(Debug, Default)]
pub struct Scene {
    tables: HashMap<String, Table>,
    current_table_id: Option<String>,
}

impl Scene {
    pub fn new() -> Self {
        Scene::default()
    }

    pub fn insert(&mut self, table: Table) {
        if self.current_table_id.is_none() {
            self.current_table_id = Some(table.table_id.clone());
        }
        self.tables.insert(table.table_id.clone(), table);
    }

    pub fn remove(&mut self, table_id: &str) -> Option<Table> {
        let removed = self.tables.remove(table_id);
        if self.current_table_id.as_deref() == Some(table_id) {
            self.current_table_id = self.tables.keys().next().cloned();
        }
        removed
    }

    pub fn has_current_table(&self) -> bool {
        self.current_table_id
            .as_ref()
            .is_some_and(|id| self.tables.contains_key(id))
    }

    pub fn current_table(&self) -> Option<&Table> {
        self.current_table_id.as_ref().and_then(|id| self.tables.get(id))
    }

    pub fn current_table_mut(&mut self) -> Option<&mut Table> {
        let id = self.current_table_id.clone()?;
        self.tables.get_mut(&id)
    }

    pub fn set_current_table(&mut self, table_id: impl Into<String>) -> Result<(), VttError> {
        let id = table_id.into();
        if !self.tables.contains_key(&id) {
            return Err(VttError::not_found("table", id));
        }
        self.current_table_id = Some(id);
        Ok(())
    }

    pub fn table(&self, table_id: &str) -> Option<&Table> {
        self.tables.get(table_id)
    }

    pub fn table_mut(&mut self, table_id: &str) -> Option<&mut Table> {
        self.tables.get_mut(table_id)
    }

    pub fn table_ids(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(|s| s.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn freshly_constructed_scene_has_no_current_table() {
        let scene = Scene::new();
        assert!(!scene.has_current_table());
    }

    #[test]
    fn first_inserted_table_becomes_current() {
        let mut scene = Scene::new();
        scene.insert(Table::new("t1", "Table 1", 100.0, 100.0));
        assert!(scene.has_current_table());
        assert_eq!(scene.current_table().unwrap().table_id, "t1");
    }

    #[test]
    fn removing_current_table_falls_back_to_another() {
        let mut scene = Scene::new();
        scene.insert(Table::new("t1", "Table 1", 100.0, 100.0));
        scene.insert(Table::new("t2", "Table 2", 100.0, 100.0));
        scene.set_current_table("t1").unwrap();
        scene.remove("t1");
        assert_eq!(scene.current_table().unwrap().table_id, "t2");
    }

    #[test]
    fn removing_last_table_leaves_scene_without_a_current_table() {
        let mut scene = Scene::new();
        scene.insert(Table::new("t1", "Table 1", 100.0, 100.0));
        scene.remove("t1");
        assert!(!scene.has_current_table());
    }
}
