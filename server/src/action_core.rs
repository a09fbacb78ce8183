//! Server-side action core (§4.5 server half). Mirrors the debounced
//! batch-save pattern from the Python original's
//! `actions_core._persist_table_state` / `_delayed_save`: a mutation
//! marks its table dirty and schedules a save `T=2.0s` later; a second
//! mutation on the same table cancels the pending task and reschedules a
//! fresh one. Fog updates and table create/delete bypass the debounce.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use log::warn;
use serde_json::json;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use vtt_core::constants::{MAX_TABLE_SCALE, MIN_TABLE_SCALE};
use vtt_core::error::VttError;
use vtt_core::types::{Layer, Position, Sprite, SpriteUpdate, Table, TableRect, TableUpdate};

use crate::persistence::PersistenceStore;
use crate::table_manager::TableManager;

/// One entry in a `batch_actions` call. Mirrors the Python original's
/// `method_map` dispatch table, typed instead of stringly-matched.
#[derive(Debug, Clone)]
pub enum BatchAction {
    CreateTable { name: String, width: f64, height: f64 },
    DeleteTable { table_id: String },
    UpdateTable { table_id: String, update: TableUpdate },
    MoveTable { table_id: String, position: Position },
    ScaleTable { table_id: String, scale_x: f64, scale_y: f64 },
    CreateSprite { table_id: String, sprite: Sprite },
    DeleteSprite { table_id: String, sprite_id: String },
    MoveSprite { table_id: String, sprite_id: String, old_pos: Position, new_pos: Position },
    ScaleSprite { table_id: String, sprite_id: String, sx: f64, sy: f64 },
    RotateSprite { table_id: String, sprite_id: String, angle: f64 },
    UpdateSprite { table_id: String, sprite_id: String, update: SpriteUpdate },
    SetLayerVisibility { table_id: String, layer: Layer, visible: bool },
    MoveSpriteToLayer { table_id: String, sprite_id: String, layer: Layer },
}

pub struct ActionCore<S: PersistenceStore> {
    tables: TableManager,
    store: Arc<S>,
    debounce: Duration,
    pending_saves: Mutex<HashMap<String, JoinHandle<()>>>,
}

impl<S: PersistenceStore + 'static> ActionCore<S> {
    pub fn new(store: Arc<S>, debounce: Duration) -> Self {
        ActionCore {
            tables: TableManager::new(),
            store,
            debounce,
            pending_saves: Mutex::new(HashMap::new()),
        }
    }

    async fn row_for(&self, table_id: &str) -> Option<serde_json::Value> {
        let table = self.tables.get(table_id).await?;
        Some(serde_json::to_value(&table).unwrap_or(json!({})))
    }

    /// Cancels any pending save for `table_id` and schedules a fresh one
    /// `self.debounce` from now.
    async fn schedule_debounced_save(self: &Arc<Self>, table_id: &str) {
        let mut pending = self.pending_saves.lock().await;
        if let Some(handle) = pending.remove(table_id) {
            handle.abort();
        }
        let this = Arc::clone(self);
        let key = table_id.to_string();
        let task_table_id = key.clone();
        let debounce = self.debounce;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            this.save_now(&task_table_id).await;
            this.pending_saves.lock().await.remove(&task_table_id);
        });
        pending.insert(key, handle);
    }

    async fn save_now(&self, table_id: &str) {
        if let Some(row) = self.row_for(table_id).await {
            if let Err(e) = self.store.put_table(table_id, row).await {
                warn!("failed to persist table {table_id}: {e}");
            }
        }
    }

    /// §4.5 "A flush operation drains all pending saves synchronously."
    pub async fn flush_all_pending_saves(&self) {
        let handles: Vec<(String, JoinHandle<()>)> = {
            let mut pending = self.pending_saves.lock().await;
            pending.drain().collect()
        };
        for (table_id, handle) in handles {
            handle.abort();
            self.save_now(&table_id).await;
        }
    }

    pub async fn create_table(self: &Arc<Self>, name: &str, width: f64, height: f64) -> Result<String, VttError> {
        if width <= 0.0 || height <= 0.0 {
            return Err(VttError::InvalidArgument("table dimensions must be positive".into()));
        }
        let table_id = uuid::Uuid::new_v4().to_string();
        let table = Table::new(table_id.clone(), name, width, height);
        self.tables.insert(table).await;
        self.save_now(&table_id).await; // immediate save: table create bypasses debounce
        Ok(table_id)
    }

    pub async fn delete_table(&self, table_id: &str) -> Result<(), VttError> {
        if self.tables.remove(table_id).await.is_none() {
            return Err(VttError::not_found("table", table_id));
        }
        if let Err(e) = self.store.delete_table(table_id).await {
            warn!("failed to delete persisted table {table_id}: {e}");
        }
        Ok(())
    }

    /// Recovered `update_table` (`core_table/actions_core.py:275`).
    pub async fn update_table(self: &Arc<Self>, table_id: &str, update: TableUpdate) -> Result<(), VttError> {
        if update.is_empty() {
            return Err(VttError::InvalidArgument("update_table requires at least one field".into()));
        }
        if matches!(update.width, Some(w) if w <= 0.0) || matches!(update.height, Some(h) if h <= 0.0) {
            return Err(VttError::InvalidArgument("table dimensions must be positive".into()));
        }
        self.tables
            .with_table_mut(table_id, |table| {
                if let Some(name) = update.name {
                    table.name = name;
                }
                if let Some(width) = update.width {
                    table.width = width;
                }
                if let Some(height) = update.height {
                    table.height = height;
                }
            })
            .await
            .ok_or_else(|| VttError::not_found("table", table_id))?;
        self.schedule_debounced_save(table_id).await;
        Ok(())
    }

    /// Recovered `move_table` (`core_table/actions_core.py:313`): sets the
    /// table's viewport origin to an absolute position.
    pub async fn move_table(self: &Arc<Self>, table_id: &str, position: Position) -> Result<(), VttError> {
        self.tables
            .with_table_mut(table_id, |table| {
                table.viewport_x = position.x;
                table.viewport_y = position.y;
            })
            .await
            .ok_or_else(|| VttError::not_found("table", table_id))?;
        self.schedule_debounced_save(table_id).await;
        Ok(())
    }

    /// Recovered `scale_table` (`core_table/actions_core.py:339`): sets the
    /// table's uniform scale to an absolute factor, clamped like `Table::zoom`.
    pub async fn scale_table(self: &Arc<Self>, table_id: &str, scale_x: f64, scale_y: f64) -> Result<(), VttError> {
        if scale_x <= 0.0 || scale_y <= 0.0 {
            return Err(VttError::InvalidArgument("table scale must be positive".into()));
        }
        self.tables
            .with_table_mut(table_id, |table| {
                table.table_scale = scale_x.clamp(MIN_TABLE_SCALE, MAX_TABLE_SCALE);
            })
            .await
            .ok_or_else(|| VttError::not_found("table", table_id))?;
        self.schedule_debounced_save(table_id).await;
        Ok(())
    }

    /// Recovered `set_layer_visibility` (`core_table/actions_core.py:593`).
    pub async fn set_layer_visibility(self: &Arc<Self>, table_id: &str, layer: Layer, visible: bool) -> Result<(), VttError> {
        self.tables
            .with_table_mut(table_id, |table| {
                for sprite in table.layers.entry(layer).or_default().iter_mut() {
                    sprite.visible = visible;
                }
            })
            .await
            .ok_or_else(|| VttError::not_found("table", table_id))?;
        self.schedule_debounced_save(table_id).await;
        Ok(())
    }

    pub async fn create_sprite(self: &Arc<Self>, table_id: &str, sprite: Sprite) -> Result<(), VttError> {
        if !self.tables.contains(table_id).await {
            return Err(VttError::not_found("table", table_id));
        }
        let sprite_id = sprite.sprite_id.clone();
        let already_identical = self
            .tables
            .with_table_mut(table_id, |table| table.find_sprite(&sprite_id).map(|existing| existing == &sprite))
            .await
            .flatten()
            .unwrap_or(false);
        if already_identical {
            return Ok(()); // idempotent: byte-identical re-creation is a success no-op
        }
        let layer = sprite.layer;
        let duplicate = self
            .tables
            .with_table_mut(table_id, |table| {
                if table.find_sprite(&sprite_id).is_some() {
                    true
                } else {
                    table.layers.entry(layer).or_default().push(sprite);
                    false
                }
            })
            .await
            .unwrap_or(true);
        if duplicate {
            return Err(VttError::Duplicate { kind: "sprite", id: sprite_id });
        }
        self.schedule_debounced_save(table_id).await;
        Ok(())
    }

    pub async fn delete_sprite(self: &Arc<Self>, table_id: &str, sprite_id: &str) -> Result<(), VttError> {
        let removed = self
            .tables
            .with_table_mut(table_id, |table| {
                let mut removed = false;
                for sprites in table.layers.values_mut() {
                    let before = sprites.len();
                    sprites.retain(|s| s.sprite_id != sprite_id);
                    removed |= sprites.len() != before;
                }
                removed
            })
            .await
            .ok_or_else(|| VttError::not_found("table", table_id))?;
        if !removed {
            return Err(VttError::not_found("sprite", sprite_id));
        }
        self.schedule_debounced_save(table_id).await;
        Ok(())
    }

    /// §4.5 desync handling: mismatch between client-provided `old_pos`
    /// and the server's stored position is logged as a warning; the new
    /// position is still applied. No rollback.
    pub async fn move_sprite(
        self: &Arc<Self>,
        table_id: &str,
        sprite_id: &str,
        old_pos: Position,
        new_pos: Position,
    ) -> Result<(), VttError> {
        let result = self
            .tables
            .with_table_mut(table_id, |table| {
                let sprite = table.find_sprite_mut(sprite_id)?;
                let actual = sprite.position;
                sprite.position = new_pos;
                Some(actual)
            })
            .await
            .ok_or_else(|| VttError::not_found("table", table_id))?;
        let Some(actual) = result else {
            return Err(VttError::not_found("sprite", sprite_id));
        };
        if (actual.x - old_pos.x).abs() > f64::EPSILON || (actual.y - old_pos.y).abs() > f64::EPSILON {
            warn!(
                "position desync for sprite {sprite_id}: client expected {:?}, server had {:?}",
                (old_pos.x, old_pos.y),
                (actual.x, actual.y)
            );
        }
        self.schedule_debounced_save(table_id).await;
        Ok(())
    }

    pub async fn scale_sprite(self: &Arc<Self>, table_id: &str, sprite_id: &str, sx: f64, sy: f64) -> Result<(), VttError> {
        self.mutate_sprite(table_id, sprite_id, |sprite| {
            sprite.scale_x = sx;
            sprite.scale_y = sy;
        })
        .await?;
        self.schedule_debounced_save(table_id).await;
        Ok(())
    }

    pub async fn rotate_sprite(self: &Arc<Self>, table_id: &str, sprite_id: &str, angle: f64) -> Result<(), VttError> {
        self.mutate_sprite(table_id, sprite_id, |sprite| sprite.rotation = angle).await?;
        self.schedule_debounced_save(table_id).await;
        Ok(())
    }

    pub async fn move_sprite_to_layer(self: &Arc<Self>, table_id: &str, sprite_id: &str, layer: Layer) -> Result<(), VttError> {
        let moved = self
            .tables
            .with_table_mut(table_id, |table| {
                let mut found = None;
                for sprites in table.layers.values_mut() {
                    if let Some(idx) = sprites.iter().position(|s| s.sprite_id == sprite_id) {
                        found = Some(sprites.remove(idx));
                        break;
                    }
                }
                if let Some(mut sprite) = found {
                    sprite.layer = layer;
                    table.layers.entry(layer).or_default().push(sprite);
                    true
                } else {
                    false
                }
            })
            .await
            .ok_or_else(|| VttError::not_found("table", table_id))?;
        if !moved {
            return Err(VttError::not_found("sprite", sprite_id));
        }
        self.schedule_debounced_save(table_id).await;
        Ok(())
    }

    /// Recovered `update_sprite` (`core_table/actions_core.py:562`). Layer
    /// reassignment is not part of this patch; use `move_sprite_to_layer`.
    pub async fn update_sprite(self: &Arc<Self>, table_id: &str, sprite_id: &str, update: SpriteUpdate) -> Result<(), VttError> {
        if update.is_empty() {
            return Err(VttError::InvalidArgument("update_sprite requires at least one field".into()));
        }
        if matches!(update.scale_x, Some(s) if s <= 0.0) || matches!(update.scale_y, Some(s) if s <= 0.0) {
            return Err(VttError::InvalidArgument("sprite scale must be positive".into()));
        }
        let found = self
            .tables
            .with_table_mut(table_id, |table| {
                let Some(sprite) = table.find_sprite_mut(sprite_id) else {
                    return false;
                };
                if let Some(position) = update.position {
                    sprite.position = position;
                }
                if let Some(sx) = update.scale_x {
                    sprite.scale_x = sx;
                }
                if let Some(sy) = update.scale_y {
                    sprite.scale_y = sy;
                }
                if let Some(angle) = update.rotation {
                    sprite.rotation = angle;
                }
                if let Some(visible) = update.visible {
                    sprite.visible = visible;
                }
                if let Some(texture_path) = update.texture_path {
                    sprite.texture_path = Some(texture_path);
                }
                true
            })
            .await
            .ok_or_else(|| VttError::not_found("table", table_id))?;
        if !found {
            return Err(VttError::not_found("sprite", sprite_id));
        }
        self.schedule_debounced_save(table_id).await;
        Ok(())
    }

    async fn mutate_sprite<F>(&self, table_id: &str, sprite_id: &str, f: F) -> Result<(), VttError>
    where
        F: FnOnce(&mut Sprite),
    {
        let found = self
            .tables
            .with_table_mut(table_id, |table| {
                if let Some(sprite) = table.find_sprite_mut(sprite_id) {
                    f(sprite);
                    true
                } else {
                    false
                }
            })
            .await
            .ok_or_else(|| VttError::not_found("table", table_id))?;
        if !found {
            return Err(VttError::not_found("sprite", sprite_id));
        }
        Ok(())
    }

    /// §4.5 `update_fog`: bypasses the debounce and saves immediately.
    pub async fn update_fog(&self, table_id: &str, hide: Vec<TableRect>, reveal: Vec<TableRect>) -> Result<(), VttError> {
        self.tables
            .with_table_mut(table_id, |table| {
                table.fog_rectangles.hide = hide;
                table.fog_rectangles.reveal = reveal;
            })
            .await
            .ok_or_else(|| VttError::not_found("table", table_id))?;
        self.save_now(table_id).await;
        Ok(())
    }

    /// Recovered `get_sprites_in_area` (SPEC_FULL.md §2).
    pub async fn get_sprites_in_area(&self, table_id: &str, rect: TableRect) -> Vec<String> {
        let (x1, y1, x2, y2) = rect.normalized();
        self.tables
            .get(table_id)
            .await
            .map(|table| {
                table
                    .layers
                    .values()
                    .flat_map(|sprites| sprites.iter())
                    .filter(|s| s.position.x >= x1 && s.position.x <= x2 && s.position.y >= y1 && s.position.y <= y2)
                    .map(|s| s.sprite_id.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Recovered `batch_actions` (`core_table/actions_core.py:788`):
    /// applies each sub-action in order, continuing past individual
    /// failures and returning a per-action result.
    pub async fn batch_actions(self: &Arc<Self>, actions: Vec<BatchAction>) -> Vec<Result<(), VttError>> {
        let mut results = Vec::with_capacity(actions.len());
        for action in actions {
            let result = match action {
                BatchAction::CreateTable { name, width, height } => self.create_table(&name, width, height).await.map(|_| ()),
                BatchAction::DeleteTable { table_id } => self.delete_table(&table_id).await,
                BatchAction::UpdateTable { table_id, update } => self.update_table(&table_id, update).await,
                BatchAction::MoveTable { table_id, position } => self.move_table(&table_id, position).await,
                BatchAction::ScaleTable { table_id, scale_x, scale_y } => self.scale_table(&table_id, scale_x, scale_y).await,
                BatchAction::CreateSprite { table_id, sprite } => self.create_sprite(&table_id, sprite).await,
                BatchAction::DeleteSprite { table_id, sprite_id } => self.delete_sprite(&table_id, &sprite_id).await,
                BatchAction::MoveSprite { table_id, sprite_id, old_pos, new_pos } => {
                    self.move_sprite(&table_id, &sprite_id, old_pos, new_pos).await
                }
                BatchAction::ScaleSprite { table_id, sprite_id, sx, sy } => self.scale_sprite(&table_id, &sprite_id, sx, sy).await,
                BatchAction::RotateSprite { table_id, sprite_id, angle } => self.rotate_sprite(&table_id, &sprite_id, angle).await,
                BatchAction::UpdateSprite { table_id, sprite_id, update } => self.update_sprite(&table_id, &sprite_id, update).await,
                BatchAction::SetLayerVisibility { table_id, layer, visible } => {
                    self.set_layer_visibility(&table_id, layer, visible).await
                }
                BatchAction::MoveSpriteToLayer { table_id, sprite_id, layer } => {
                    self.move_sprite_to_layer(&table_id, &sprite_id, layer).await
                }
            };
            results.push(result);
        }
        results
    }

    pub fn table_manager(&self) -> &TableManager {
        &self.tables
    }

    pub async fn pending_save_count(&self) -> usize {
        self.pending_saves.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::InMemoryStore;

    fn core() -> Arc<ActionCore<InMemoryStore>> {
        Arc::new(ActionCore::new(Arc::new(InMemoryStore::new()), Duration::from_millis(30)))
    }

    #[tokio::test]
    async fn create_table_rejects_non_positive_dimensions() {
        let core = core();
        let result = core.create_table("Bad", 0.0, 10.0).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn create_table_persists_immediately() {
        let core = core();
        let table_id = core.create_table("T", 10.0, 10.0).await.unwrap();
        let stored = core.store.get_table(&table_id).await.unwrap();
        assert!(stored.is_some());
    }

    #[tokio::test]
    async fn move_sprite_on_missing_table_returns_not_found() {
        let core = core();
        let result = core.move_sprite("nope", "s1", Position::ZERO, Position::new(1.0, 1.0)).await;
        assert!(matches!(result, Err(VttError::NotFound { .. })));
    }

    #[tokio::test]
    async fn debounced_save_is_cancelled_and_rescheduled_by_a_second_mutation() {
        let core = core();
        let table_id = core.create_table("T", 100.0, 100.0).await.unwrap();
        core.create_sprite(&table_id, Sprite::new("s1", Position::ZERO, Layer::Tokens)).await.unwrap();
        assert_eq!(core.pending_save_count().await, 1);

        core.rotate_sprite(&table_id, "s1", 45.0).await.unwrap();
        assert_eq!(core.pending_save_count().await, 1, "second mutation should reuse a single pending slot");

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(core.pending_save_count().await, 0);
    }

    #[tokio::test]
    async fn flush_all_pending_saves_drains_synchronously() {
        let core = core();
        let table_id = core.create_table("T", 100.0, 100.0).await.unwrap();
        core.create_sprite(&table_id, Sprite::new("s1", Position::ZERO, Layer::Tokens)).await.unwrap();
        core.flush_all_pending_saves().await;
        assert_eq!(core.pending_save_count().await, 0);
        let row = core.store.get_table(&table_id).await.unwrap().unwrap();
        assert!(row["layers"].is_object() || row["layers"].is_array());
    }

    #[tokio::test]
    async fn update_table_applies_only_given_fields() {
        let core = core();
        let table_id = core.create_table("T", 100.0, 100.0).await.unwrap();
        core.update_table(&table_id, TableUpdate { name: Some("Renamed".into()), ..Default::default() }).await.unwrap();
        let table = core.table_manager().get(&table_id).await.unwrap();
        assert_eq!(table.name, "Renamed");
        assert_eq!(table.width, 100.0);
    }

    #[tokio::test]
    async fn move_table_sets_absolute_viewport_position() {
        let core = core();
        let table_id = core.create_table("T", 100.0, 100.0).await.unwrap();
        core.move_table(&table_id, Position::new(12.0, 34.0)).await.unwrap();
        let table = core.table_manager().get(&table_id).await.unwrap();
        assert_eq!((table.viewport_x, table.viewport_y), (12.0, 34.0));
    }

    #[tokio::test]
    async fn scale_table_clamps_to_bounds() {
        let core = core();
        let table_id = core.create_table("T", 100.0, 100.0).await.unwrap();
        core.scale_table(&table_id, 999.0, 999.0).await.unwrap();
        let table = core.table_manager().get(&table_id).await.unwrap();
        assert_eq!(table.table_scale, MAX_TABLE_SCALE);
    }

    #[tokio::test]
    async fn set_layer_visibility_hides_every_sprite_on_the_layer() {
        let core = core();
        let table_id = core.create_table("T", 100.0, 100.0).await.unwrap();
        core.create_sprite(&table_id, Sprite::new("s1", Position::ZERO, Layer::Tokens)).await.unwrap();
        core.set_layer_visibility(&table_id, Layer::Tokens, false).await.unwrap();
        let table = core.table_manager().get(&table_id).await.unwrap();
        assert!(!table.find_sprite("s1").unwrap().visible);
    }

    #[tokio::test]
    async fn update_sprite_applies_patch() {
        let core = core();
        let table_id = core.create_table("T", 100.0, 100.0).await.unwrap();
        core.create_sprite(&table_id, Sprite::new("s1", Position::ZERO, Layer::Tokens)).await.unwrap();
        core.update_sprite(&table_id, "s1", SpriteUpdate { rotation: Some(45.0), ..Default::default() }).await.unwrap();
        let table = core.table_manager().get(&table_id).await.unwrap();
        assert_eq!(table.find_sprite("s1").unwrap().rotation, 45.0);
    }

    #[tokio::test]
    async fn batch_actions_runs_each_sub_action_and_reports_per_action_results() {
        let core = core();
        let table_id = core.create_table("T", 100.0, 100.0).await.unwrap();
        let results = core
            .batch_actions(vec![
                BatchAction::CreateSprite { table_id: table_id.clone(), sprite: Sprite::new("s1", Position::ZERO, Layer::Tokens) },
                BatchAction::DeleteSprite { table_id: table_id.clone(), sprite_id: "missing".into() },
            ])
            .await;
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
    }

    #[tokio::test]
    async fn desync_on_move_sprite_still_applies_new_position() {
        let core = core();
        let table_id = core.create_table("T", 100.0, 100.0).await.unwrap();
        core.create_sprite(&table_id, Sprite::new("s1", Position::ZERO, Layer::Tokens)).await.unwrap();

        // Claim a bogus old position; server must still apply new_pos.
        core.move_sprite(&table_id, "s1", Position::new(999.0, 999.0), Position::new(5.0, 5.0))
            .await
            .unwrap();

        let table = core.table_manager().get(&table_id).await.unwrap();
        assert_eq!(table.find_sprite("s1").unwrap().position, Position::new(5.0, 5.0));
    }
}
