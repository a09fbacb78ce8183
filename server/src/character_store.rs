//! Server-owned character store (§4.7). Grounded in the Python
//! original's `ServerCharacterManager`: owner checks, monotonic version
//! bump on every update, and a session-code to session-id lookup used by
//! several replication handlers.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;

use vtt_core::error::VttError;
use vtt_core::types::{Character, CharacterSummary};

use crate::persistence::PersistenceStore;

#[derive(Default)]
struct Inner {
    characters: HashMap<String, Character>,
    session_codes: HashMap<String, String>, // session_code -> session_id
}

pub struct CharacterStore<S: PersistenceStore> {
    inner: RwLock<Inner>,
    store: Arc<S>,
}

impl<S: PersistenceStore> CharacterStore<S> {
    pub fn new(store: Arc<S>) -> Self {
        CharacterStore {
            inner: RwLock::new(Inner::default()),
            store,
        }
    }

    pub async fn register_session_code(&self, session_code: impl Into<String>, session_id: impl Into<String>) {
        self.inner.write().await.session_codes.insert(session_code.into(), session_id.into());
    }

    /// Recovered `get_session_id_from_code` (SPEC_FULL.md §2).
    pub async fn session_id_from_code(&self, session_code: &str) -> Option<String> {
        self.inner.read().await.session_codes.get(session_code).cloned()
    }

    async fn persist(&self, character: &Character) {
        let row = serde_json::to_value(character).unwrap_or_default();
        let _ = self.store.put_character(&character.character_id, row).await;
    }

    /// §4.7 `save_character`: creates a new record, or — when
    /// `character_id` names an existing one — requires owner match and
    /// bumps `version`.
    pub async fn save_character(
        &self,
        session_id: &str,
        character_id: Option<&str>,
        character_name: &str,
        data: Value,
        user_id: &str,
        now: f64,
    ) -> Result<(String, u64), VttError> {
        let mut inner = self.inner.write().await;

        if let Some(id) = character_id {
            if let Some(existing) = inner.characters.get_mut(id) {
                if existing.owner_user_id != user_id {
                    return Err(VttError::PermissionDenied("not the character owner".into()));
                }
                existing.character_data = data;
                existing.character_name = character_name.to_string();
                existing.version += 1;
                existing.updated_at = now;
                existing.last_modified_by = user_id.to_string();
                let version = existing.version;
                let snapshot = existing.clone();
                drop(inner);
                self.persist(&snapshot).await;
                return Ok((id.to_string(), version));
            }
        }

        let new_id = uuid::Uuid::new_v4().to_string();
        let character = Character::new(new_id.clone(), session_id, user_id, character_name, data, now);
        inner.characters.insert(new_id.clone(), character.clone());
        drop(inner);
        self.persist(&character).await;
        Ok((new_id, 1))
    }

    /// §4.7 `update_character`: row-locked by `self.inner`'s write guard;
    /// optimistic concurrency via `expected_version`.
    pub async fn update_character(
        &self,
        character_id: &str,
        updates: Value,
        user_id: &str,
        expected_version: Option<u64>,
        now: f64,
    ) -> Result<u64, VttError> {
        let mut inner = self.inner.write().await;
        let character = inner
            .characters
            .get_mut(character_id)
            .ok_or_else(|| VttError::not_found("character", character_id))?;

        if character.owner_user_id != user_id {
            return Err(VttError::PermissionDenied("not the character owner".into()));
        }
        if let Some(expected) = expected_version {
            if expected != character.version {
                return Err(VttError::VersionConflict {
                    expected,
                    current: character.version,
                });
            }
        }

        deep_merge(&mut character.character_data, &updates);
        character.version += 1;
        character.updated_at = now;
        character.last_modified_by = user_id.to_string();
        let version = character.version;
        let snapshot = character.clone();
        drop(inner);
        self.persist(&snapshot).await;
        Ok(version)
    }

    pub async fn load_character(&self, character_id: &str, user_id: &str) -> Result<Character, VttError> {
        let inner = self.inner.read().await;
        let character = inner.characters.get(character_id).ok_or_else(|| VttError::not_found("character", character_id))?;
        if character.owner_user_id != user_id {
            return Err(VttError::PermissionDenied("not the character owner".into()));
        }
        Ok(character.clone())
    }

    pub async fn list_characters(&self, user_id: &str) -> Vec<CharacterSummary> {
        let inner = self.inner.read().await;
        let mut summaries: Vec<CharacterSummary> = inner
            .characters
            .values()
            .filter(|c| c.owner_user_id == user_id)
            .map(CharacterSummary::from)
            .collect();
        summaries.sort_by(|a, b| b.updated_at.partial_cmp(&a.updated_at).unwrap_or(std::cmp::Ordering::Equal));
        summaries
    }

    pub async fn delete_character(&self, character_id: &str, user_id: &str) -> Result<(), VttError> {
        let mut inner = self.inner.write().await;
        let character = inner.characters.get(character_id).ok_or_else(|| VttError::not_found("character", character_id))?;
        if character.owner_user_id != user_id {
            return Err(VttError::PermissionDenied("not the character owner".into()));
        }
        inner.characters.remove(character_id);
        drop(inner);
        let _ = self.store.delete_character(character_id).await;
        Ok(())
    }
}

/// Deep-merges `updates`'s top-level (and nested object) fields into
/// `target`, per §4.7 "deep-merge top-level fields of the JSON payload".
fn deep_merge(target: &mut Value, updates: &Value) {
    if let (Value::Object(target_map), Value::Object(update_map)) = (target.clone(), updates) {
        let mut merged = target_map;
        for (k, v) in update_map {
            match merged.get_mut(k) {
                Some(existing) if existing.is_object() && v.is_object() => deep_merge(existing, v),
                _ => {
                    merged.insert(k.clone(), v.clone());
                }
            }
        }
        *target = Value::Object(merged);
    } else {
        *target = updates.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::InMemoryStore;
    use serde_json::json;

    fn store() -> CharacterStore<InMemoryStore> {
        CharacterStore::new(Arc::new(InMemoryStore::new()))
    }

    #[tokio::test]
    async fn save_character_creates_with_version_one() {
        let store = store();
        let (id, version) = store
            .save_character("s1", None, "Aria", json!({"hp": 10}), "user-1", 0.0)
            .await
            .unwrap();
        assert_eq!(version, 1);
        let loaded = store.load_character(&id, "user-1").await.unwrap();
        assert_eq!(loaded.version, 1);
    }

    #[tokio::test]
    async fn updating_someone_elses_character_is_denied() {
        let store = store();
        let (id, _) = store.save_character("s1", None, "Aria", json!({}), "user-1", 0.0).await.unwrap();
        let result = store.update_character(&id, json!({"hp": 5}), "user-2", None, 1.0).await;
        assert!(matches!(result, Err(VttError::PermissionDenied(_))));
    }

    #[tokio::test]
    async fn update_with_stale_expected_version_returns_conflict() {
        let store = store();
        let (id, _) = store.save_character("s1", None, "Aria", json!({}), "user-1", 0.0).await.unwrap();
        let result = store.update_character(&id, json!({"hp": 5}), "user-1", Some(99), 1.0).await;
        assert!(matches!(result, Err(VttError::VersionConflict { .. })));
    }

    #[tokio::test]
    async fn update_deep_merges_nested_fields_without_clobbering_siblings() {
        let store = store();
        let (id, _) = store
            .save_character("s1", None, "Aria", json!({"stats": {"hp": 10, "mp": 5}}), "user-1", 0.0)
            .await
            .unwrap();
        store
            .update_character(&id, json!({"stats": {"hp": 8}}), "user-1", None, 1.0)
            .await
            .unwrap();
        let loaded = store.load_character(&id, "user-1").await.unwrap();
        assert_eq!(loaded.character_data["stats"]["hp"], 8);
        assert_eq!(loaded.character_data["stats"]["mp"], 5);
    }

    #[tokio::test]
    async fn list_characters_orders_by_updated_at_descending() {
        let store = store();
        let (id_a, _) = store.save_character("s1", None, "A", json!({}), "user-1", 0.0).await.unwrap();
        let (_id_b, _) = store.save_character("s1", None, "B", json!({}), "user-1", 5.0).await.unwrap();
        store.update_character(&id_a, json!({}), "user-1", None, 10.0).await.unwrap();

        let list = store.list_characters("user-1").await;
        assert_eq!(list[0].character_name, "A");
    }

    #[tokio::test]
    async fn delete_character_is_owner_only() {
        let store = store();
        let (id, _) = store.save_character("s1", None, "Aria", json!({}), "user-1", 0.0).await.unwrap();
        assert!(store.delete_character(&id, "user-2").await.is_err());
        assert!(store.delete_character(&id, "user-1").await.is_ok());
        assert!(store.load_character(&id, "user-1").await.is_err());
    }
}
