//! Client-side action bus (§4.5 client half). Every mutation goes
//! through `Actions`; it never blocks on I/O — intents are hashed off to
//! whatever replication layer the caller wires in, and the method
//! returns immediately with the outcome of the *local* mutation.

use std::collections::VecDeque;

use serde_json::{json, Value};
use vtt_core::constants::{CHAT_HISTORY_DEPTH, HISTORY_DEPTH, MAX_TABLE_SCALE, MIN_TABLE_SCALE};
use vtt_core::types::{ActionRecord, ChatMessage, Layer, Position, Sprite, SpriteUpdate, Table, TableUpdate};

use crate::scene::Scene;

#[derive(Debug, Clone, PartialEq)]
pub struct ActionResult {
    pub success: bool,
    pub message: String,
    pub data: Option<Value>,
}

impl ActionResult {
    pub fn ok(message: impl Into<String>) -> Self {
        ActionResult {
            success: true,
            message: message.into(),
            data: None,
        }
    }

    pub fn ok_with(message: impl Into<String>, data: Value) -> Self {
        ActionResult {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        ActionResult {
            success: false,
            message: message.into(),
            data: None,
        }
    }
}

/// A network intent the bus hands off when `to_server` is true. The
/// replication module owns actually sending it; the bus just produces it.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplicationIntent {
    pub action_type: String,
    pub payload: Value,
}

/// §3 "History entry: ... bounded ring buffer of 100; cleared redo stack
/// on any new entry."
#[derive(Debug, Default)]
struct History {
    undo: VecDeque<ActionRecord>,
    redo: Vec<ActionRecord>,
}

impl History {
    fn push(&mut self, record: ActionRecord) {
        if self.undo.len() >= HISTORY_DEPTH {
            self.undo.pop_front();
        }
        self.undo.push_back(record);
        self.redo.clear();
    }
}

pub struct Actions {
    scene: Scene,
    history: History,
    pending_intents: Vec<ReplicationIntent>,
    chat_messages: VecDeque<ChatMessage>,
}

impl Actions {
    pub fn new(scene: Scene) -> Self {
        Actions {
            scene,
            history: History::default(),
            pending_intents: Vec::new(),
            chat_messages: VecDeque::new(),
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    /// Drains replication intents queued by mutating calls with
    /// `to_server = true`. The bus never sends these itself.
    pub fn drain_pending_intents(&mut self) -> Vec<ReplicationIntent> {
        std::mem::take(&mut self.pending_intents)
    }

    fn emit(&mut self, to_server: bool, action_type: &str, payload: Value) {
        if to_server {
            self.pending_intents.push(ReplicationIntent {
                action_type: action_type.to_string(),
                payload,
            });
        }
    }

    pub fn create_table(&mut self, name: &str, width: f64, height: f64, to_server: bool) -> ActionResult {
        if width <= 0.0 || height <= 0.0 {
            return ActionResult::err("invalid dimensions");
        }
        let table_id = uuid::Uuid::new_v4().to_string();
        let table = Table::new(table_id.clone(), name, width, height);
        self.scene.insert(table);
        self.history.push(ActionRecord::new("create_table").with_table(table_id.clone()));
        self.emit(to_server, "create_table", json!({"table_id": table_id, "name": name, "width": width, "height": height}));
        ActionResult::ok_with("table created", json!({"table_id": table_id}))
    }

    pub fn delete_table(&mut self, table_id: &str, to_server: bool) -> ActionResult {
        if self.scene.table(table_id).is_none() {
            return ActionResult::err("table not found");
        }
        self.scene.remove(table_id);
        self.history.push(ActionRecord::new("delete_table").with_table(table_id));
        self.emit(to_server, "delete_table", json!({"table_id": table_id}));
        ActionResult::ok("table deleted")
    }

    /// Recovered `update_table` (`Actions.py:325`): applies whichever
    /// fields of `update` are set, recording only those in history.
    pub fn update_table(&mut self, table_id: &str, update: TableUpdate, to_server: bool) -> ActionResult {
        if update.is_empty() {
            return ActionResult::err("update_table requires at least one field");
        }
        if matches!(update.width, Some(w) if w <= 0.0) || matches!(update.height, Some(h) if h <= 0.0) {
            return ActionResult::err("invalid dimensions");
        }
        let Some(table) = self.scene.table_mut(table_id) else {
            return ActionResult::err("table not found");
        };
        let mut old_values = json!({});
        let mut new_values = json!({});
        if let Some(name) = update.name {
            old_values["name"] = json!(table.name);
            new_values["name"] = json!(name);
            table.name = name;
        }
        if let Some(width) = update.width {
            old_values["width"] = json!(table.width);
            new_values["width"] = json!(width);
            table.width = width;
        }
        if let Some(height) = update.height {
            old_values["height"] = json!(table.height);
            new_values["height"] = json!(height);
            table.height = height;
        }
        self.history
            .push(ActionRecord::new("update_table").with_table(table_id).with_values(old_values.clone(), new_values.clone()));
        self.emit(to_server, "update_table", json!({"table_id": table_id, "old_values": old_values, "new_values": new_values}));
        ActionResult::ok_with("table updated", new_values)
    }

    /// Recovered `move_table` (`Actions.py:430`): sets the table's viewport
    /// origin to an absolute position, unlike `Table::pan`'s relative delta.
    pub fn move_table(&mut self, table_id: &str, position: Position, to_server: bool) -> ActionResult {
        let Some(table) = self.scene.table_mut(table_id) else {
            return ActionResult::err("table not found");
        };
        let old_position = Position::new(table.viewport_x, table.viewport_y);
        table.viewport_x = position.x;
        table.viewport_y = position.y;
        self.history.push(
            ActionRecord::new("move_table")
                .with_table(table_id)
                .with_values(json!({"x": old_position.x, "y": old_position.y}), json!({"x": position.x, "y": position.y})),
        );
        self.emit(to_server, "move_table", json!({"table_id": table_id, "x": position.x, "y": position.y}));
        ActionResult::ok(format!("table moved to ({}, {})", position.x, position.y))
    }

    /// Recovered `scale_table` (`Actions.py:408`): sets the table's uniform
    /// scale to an absolute factor, clamped to the same bounds as `Table::zoom`.
    pub fn scale_table(&mut self, table_id: &str, scale_x: f64, scale_y: f64, to_server: bool) -> ActionResult {
        if scale_x <= 0.0 || scale_y <= 0.0 {
            return ActionResult::err("invalid scale");
        }
        let Some(table) = self.scene.table_mut(table_id) else {
            return ActionResult::err("table not found");
        };
        let old_scale = table.table_scale;
        table.table_scale = scale_x.clamp(MIN_TABLE_SCALE, MAX_TABLE_SCALE);
        let new_scale = table.table_scale;
        self.history.push(
            ActionRecord::new("scale_table")
                .with_table(table_id)
                .with_values(json!({"scale": old_scale}), json!({"scale": new_scale})),
        );
        self.emit(to_server, "scale_table", json!({"table_id": table_id, "scale_x": scale_x, "scale_y": scale_y}));
        ActionResult::ok(format!("table scaled to {new_scale}"))
    }

    pub fn move_sprite(
        &mut self,
        table_id: &str,
        sprite_id: &str,
        old_pos: Position,
        new_pos: Position,
        to_server: bool,
    ) -> ActionResult {
        let Some(table) = self.scene.table_mut(table_id) else {
            return ActionResult::err("table not found");
        };
        let Some(sprite) = table.find_sprite_mut(sprite_id) else {
            return ActionResult::err("sprite not found");
        };
        sprite.position = new_pos;
        self.history.push(
            ActionRecord::new("move_sprite")
                .with_table(table_id)
                .with_sprite(sprite_id)
                .with_values(json!({"x": old_pos.x, "y": old_pos.y}), json!({"x": new_pos.x, "y": new_pos.y})),
        );
        self.emit(
            to_server,
            "move_sprite",
            json!({
                "table_id": table_id, "sprite_id": sprite_id,
                "from": {"x": old_pos.x, "y": old_pos.y},
                "to": {"x": new_pos.x, "y": new_pos.y},
            }),
        );
        ActionResult::ok("sprite moved")
    }

    pub fn scale_sprite(&mut self, table_id: &str, sprite_id: &str, sx: f64, sy: f64, to_server: bool) -> ActionResult {
        if sx <= 0.0 || sy <= 0.0 {
            return ActionResult::err("invalid scale");
        }
        let Some(table) = self.scene.table_mut(table_id) else {
            return ActionResult::err("table not found");
        };
        let Some(sprite) = table.find_sprite_mut(sprite_id) else {
            return ActionResult::err("sprite not found");
        };
        let old = (sprite.scale_x, sprite.scale_y);
        sprite.scale_x = sx;
        sprite.scale_y = sy;
        self.history.push(
            ActionRecord::new("scale_sprite")
                .with_table(table_id)
                .with_sprite(sprite_id)
                .with_values(json!({"sx": old.0, "sy": old.1}), json!({"sx": sx, "sy": sy})),
        );
        self.emit(to_server, "scale_sprite", json!({"table_id": table_id, "sprite_id": sprite_id, "sx": sx, "sy": sy}));
        ActionResult::ok("sprite scaled")
    }

    pub fn rotate_sprite(&mut self, table_id: &str, sprite_id: &str, angle: f64, to_server: bool) -> ActionResult {
        let Some(table) = self.scene.table_mut(table_id) else {
            return ActionResult::err("table not found");
        };
        let Some(sprite) = table.find_sprite_mut(sprite_id) else {
            return ActionResult::err("sprite not found");
        };
        let old = sprite.rotation;
        sprite.rotation = angle;
        self.history.push(
            ActionRecord::new("rotate_sprite")
                .with_table(table_id)
                .with_sprite(sprite_id)
                .with_values(json!({"angle": old}), json!({"angle": angle})),
        );
        self.emit(to_server, "rotate_sprite", json!({"table_id": table_id, "sprite_id": sprite_id, "angle": angle}));
        ActionResult::ok("sprite rotated")
    }

    /// Recovered `update_sprite` (`Actions.py:593`): applies whichever
    /// fields of `update` are set. Layer reassignment is not part of this
    /// patch — use `move_sprite_to_layer`, since sprites are stored keyed
    /// by layer rather than as a flat list.
    pub fn update_sprite(&mut self, table_id: &str, sprite_id: &str, update: SpriteUpdate, to_server: bool) -> ActionResult {
        if update.is_empty() {
            return ActionResult::err("update_sprite requires at least one field");
        }
        if matches!(update.scale_x, Some(s) if s <= 0.0) || matches!(update.scale_y, Some(s) if s <= 0.0) {
            return ActionResult::err("invalid scale");
        }
        let Some(table) = self.scene.table_mut(table_id) else {
            return ActionResult::err("table not found");
        };
        let Some(sprite) = table.find_sprite_mut(sprite_id) else {
            return ActionResult::err("sprite not found");
        };
        let mut old_values = json!({});
        let mut new_values = json!({});
        if let Some(position) = update.position {
            old_values["position"] = json!({"x": sprite.position.x, "y": sprite.position.y});
            new_values["position"] = json!({"x": position.x, "y": position.y});
            sprite.position = position;
        }
        if let Some(sx) = update.scale_x {
            old_values["scale_x"] = json!(sprite.scale_x);
            new_values["scale_x"] = json!(sx);
            sprite.scale_x = sx;
        }
        if let Some(sy) = update.scale_y {
            old_values["scale_y"] = json!(sprite.scale_y);
            new_values["scale_y"] = json!(sy);
            sprite.scale_y = sy;
        }
        if let Some(angle) = update.rotation {
            old_values["rotation"] = json!(sprite.rotation);
            new_values["rotation"] = json!(angle);
            sprite.rotation = angle;
        }
        if let Some(visible) = update.visible {
            old_values["visible"] = json!(sprite.visible);
            new_values["visible"] = json!(visible);
            sprite.visible = visible;
        }
        if let Some(texture_path) = update.texture_path {
            old_values["texture_path"] = json!(sprite.texture_path);
            new_values["texture_path"] = json!(texture_path);
            sprite.texture_path = Some(texture_path);
        }
        self.history.push(
            ActionRecord::new("update_sprite")
                .with_table(table_id)
                .with_sprite(sprite_id)
                .with_values(old_values.clone(), new_values.clone()),
        );
        self.emit(
            to_server,
            "update_sprite",
            json!({"table_id": table_id, "sprite_id": sprite_id, "old_values": old_values, "new_values": new_values}),
        );
        ActionResult::ok_with("sprite updated", new_values)
    }

    pub fn create_sprite(&mut self, table_id: &str, sprite: Sprite, to_server: bool) -> ActionResult {
        let Some(table) = self.scene.table_mut(table_id) else {
            return ActionResult::err("table not found");
        };
        if table.find_sprite(&sprite.sprite_id).is_some() {
            return ActionResult::err("duplicate sprite id");
        }
        let layer = sprite.layer;
        let sprite_id = sprite.sprite_id.clone();
        table.layers.entry(layer).or_default().push(sprite);
        self.history.push(ActionRecord::new("create_sprite").with_table(table_id).with_sprite(sprite_id.clone()));
        self.emit(to_server, "create_sprite", json!({"table_id": table_id, "sprite_id": sprite_id}));
        ActionResult::ok_with("sprite created", json!({"sprite_id": sprite_id}))
    }

    pub fn delete_sprite(&mut self, table_id: &str, sprite_id: &str, to_server: bool) -> ActionResult {
        let Some(table) = self.scene.table_mut(table_id) else {
            return ActionResult::err("table not found");
        };
        let mut removed = false;
        for sprites in table.layers.values_mut() {
            let before = sprites.len();
            sprites.retain(|s| s.sprite_id != sprite_id);
            removed |= sprites.len() != before;
        }
        if !removed {
            return ActionResult::err("sprite not found");
        }
        self.history.push(ActionRecord::new("delete_sprite").with_table(table_id).with_sprite(sprite_id));
        self.emit(to_server, "delete_sprite", json!({"table_id": table_id, "sprite_id": sprite_id}));
        ActionResult::ok("sprite deleted")
    }

    pub fn move_sprite_to_layer(&mut self, table_id: &str, sprite_id: &str, layer: Layer, to_server: bool) -> ActionResult {
        let Some(table) = self.scene.table_mut(table_id) else {
            return ActionResult::err("table not found");
        };
        let mut found: Option<Sprite> = None;
        for sprites in table.layers.values_mut() {
            if let Some(idx) = sprites.iter().position(|s| s.sprite_id == sprite_id) {
                found = Some(sprites.remove(idx));
                break;
            }
        }
        let Some(mut sprite) = found else {
            return ActionResult::err("sprite not found");
        };
        sprite.layer = layer;
        table.layers.entry(layer).or_default().push(sprite);
        self.history.push(ActionRecord::new("move_sprite_to_layer").with_table(table_id).with_sprite(sprite_id));
        self.emit(
            to_server,
            "move_sprite_to_layer",
            json!({"table_id": table_id, "sprite_id": sprite_id, "layer": layer.as_str()}),
        );
        ActionResult::ok("sprite moved to layer")
    }

    pub fn set_layer_visibility(&mut self, table_id: &str, layer: Layer, visible: bool, to_server: bool) -> ActionResult {
        let Some(table) = self.scene.table_mut(table_id) else {
            return ActionResult::err("table not found");
        };
        for sprite in table.layers.entry(layer).or_default().iter_mut() {
            sprite.visible = visible;
        }
        self.history.push(ActionRecord::new("set_layer_visibility").with_table(table_id));
        self.emit(
            to_server,
            "set_layer_visibility",
            json!({"table_id": table_id, "layer": layer.as_str(), "visible": visible}),
        );
        ActionResult::ok("layer visibility set")
    }

    pub fn update_fog(
        &mut self,
        table_id: &str,
        hide: Vec<vtt_core::types::TableRect>,
        reveal: Vec<vtt_core::types::TableRect>,
        to_server: bool,
    ) -> ActionResult {
        let Some(table) = self.scene.table_mut(table_id) else {
            return ActionResult::err("table not found");
        };
        table.fog_rectangles.hide = hide;
        table.fog_rectangles.reveal = reveal;
        self.history.push(ActionRecord::new("update_fog").with_table(table_id));
        self.emit(to_server, "fog_update", json!({"table_id": table_id}));
        ActionResult::ok("fog updated")
    }

    /// Recovered from `Actions.get_sprites_in_area` (not in spec.md; see
    /// SPEC_FULL.md §2). Read-only: emits nothing, touches no history.
    pub fn get_sprites_in_area(&self, table_id: &str, rect: vtt_core::types::TableRect) -> Vec<String> {
        let (x1, y1, x2, y2) = rect.normalized();
        let Some(table) = self.scene.table(table_id) else {
            return Vec::new();
        };
        table
            .layers
            .values()
            .flat_map(|sprites| sprites.iter())
            .filter(|s| s.position.x >= x1 && s.position.x <= x2 && s.position.y >= y1 && s.position.y <= y2)
            .map(|s| s.sprite_id.clone())
            .collect()
    }

    /// Recovered from `Actions.get_sprite_at_position`.
    pub fn get_sprite_at_position(&self, table_id: &str, position: Position) -> Option<String> {
        let table = self.scene.table(table_id)?;
        table
            .layers
            .values()
            .flat_map(|sprites| sprites.iter())
            .find(|s| {
                let (near, far) = s.table_bounds();
                position.x >= near.x && position.x <= far.x && position.y >= near.y && position.y <= far.y
            })
            .map(|s| s.sprite_id.clone())
    }

    /// Recovered `add_chat_message` (SPEC_FULL.md §2): appends to the
    /// session-scoped chat log, bounded at `CHAT_HISTORY_DEPTH`. Not part
    /// of the undo/redo history — chat is not an inversion candidate.
    pub fn add_chat_message(&mut self, user_id: &str, text: &str, timestamp: f64, to_server: bool) -> ActionResult {
        if text.trim().is_empty() {
            return ActionResult::err("chat message text must not be empty");
        }
        if self.chat_messages.len() >= CHAT_HISTORY_DEPTH {
            self.chat_messages.pop_front();
        }
        self.chat_messages.push_back(ChatMessage::new(user_id, text, timestamp));
        self.emit(to_server, "chat_message", json!({"user_id": user_id, "text": text, "timestamp": timestamp}));
        ActionResult::ok("chat message added")
    }

    pub fn chat_messages(&self) -> impl Iterator<Item = &ChatMessage> {
        self.chat_messages.iter()
    }

    /// Recovered `batch_sprite_update` (SPEC_FULL.md §2): applies a list
    /// of per-sprite field updates in one call, distinct from the
    /// general `batch_actions` envelope.
    pub fn batch_sprite_update(&mut self, table_id: &str, updates: Vec<(String, Position)>, to_server: bool) -> ActionResult {
        let mut applied = 0usize;
        for (sprite_id, new_pos) in updates {
            let Some(table) = self.scene.table_mut(table_id) else {
                continue;
            };
            let Some(sprite) = table.find_sprite_mut(&sprite_id) else {
                continue;
            };
            sprite.position = new_pos;
            applied += 1;
        }
        self.history.push(ActionRecord::new("batch_sprite_update").with_table(table_id));
        self.emit(to_server, "batch_sprite_update", json!({"table_id": table_id, "count": applied}));
        ActionResult::ok_with("batch sprite update applied", json!({"applied": applied}))
    }

    pub fn batch_actions<F>(&mut self, ops: Vec<F>) -> ActionResult
    where
        F: FnOnce(&mut Actions) -> ActionResult,
    {
        let mut results = Vec::with_capacity(ops.len());
        for op in ops {
            results.push(op(self));
        }
        let all_ok = results.iter().all(|r| r.success);
        ActionResult {
            success: all_ok,
            message: if all_ok { "batch applied".into() } else { "one or more sub-actions failed".into() },
            data: Some(json!(results
                .iter()
                .map(|r| json!({"success": r.success, "message": r.message}))
                .collect::<Vec<_>>())),
        }
    }

    /// Pops the most recent history entry and applies its inverse.
    /// Supports `move_sprite`, the only operation with enough information
    /// recorded to invert generically; other kinds are acknowledged but
    /// left to full undo-stack replay in a richer caller.
    pub fn undo(&mut self) -> ActionResult {
        let Some(record) = self.history.undo.pop_back() else {
            return ActionResult::err("history is empty");
        };
        let result = self.apply_inverse(&record);
        self.history.redo.push(record);
        result
    }

    pub fn redo(&mut self) -> ActionResult {
        let Some(record) = self.history.redo.pop() else {
            return ActionResult::err("redo stack is empty");
        };
        let result = self.apply_forward(&record);
        self.history.undo.push_back(record);
        result
    }

    fn apply_inverse(&mut self, record: &ActionRecord) -> ActionResult {
        if record.action_type == "move_sprite" {
            if let (Some(table_id), Some(sprite_id), Some(old)) = (&record.table_id, &record.sprite_id, &record.old_values) {
                if let Some(table) = self.scene.table_mut(table_id) {
                    if let Some(sprite) = table.find_sprite_mut(sprite_id) {
                        sprite.position = Position::new(
                            old["x"].as_f64().unwrap_or(sprite.position.x),
                            old["y"].as_f64().unwrap_or(sprite.position.y),
                        );
                        return ActionResult::ok("undone");
                    }
                }
            }
        }
        ActionResult::ok("undone (no-op: nothing to invert for this action type)")
    }

    fn apply_forward(&mut self, record: &ActionRecord) -> ActionResult {
        if record.action_type == "move_sprite" {
            if let (Some(table_id), Some(sprite_id), Some(new)) = (&record.table_id, &record.sprite_id, &record.new_values) {
                if let Some(table) = self.scene.table_mut(table_id) {
                    if let Some(sprite) = table.find_sprite_mut(sprite_id) {
                        sprite.position = Position::new(
                            new["x"].as_f64().unwrap_or(sprite.position.x),
                            new["y"].as_f64().unwrap_or(sprite.position.y),
                        );
                        return ActionResult::ok("redone");
                    }
                }
            }
        }
        ActionResult::ok("redone (no-op: nothing to reapply for this action type)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bus() -> Actions {
        Actions::new(Scene::new())
    }

    #[test]
    fn create_table_rejects_invalid_dimensions() {
        let mut actions = bus();
        let result = actions.create_table("Bad", 0.0, 10.0, true);
        assert!(!result.success);
    }

    #[test]
    fn create_table_with_to_server_false_emits_no_intent() {
        let mut actions = bus();
        actions.create_table("T", 10.0, 10.0, false);
        assert!(actions.drain_pending_intents().is_empty());
    }

    #[test]
    fn create_table_with_to_server_true_emits_intent() {
        let mut actions = bus();
        actions.create_table("T", 10.0, 10.0, true);
        assert_eq!(actions.drain_pending_intents().len(), 1);
    }

    #[test]
    fn history_ring_buffer_is_bounded_and_clears_redo() {
        let mut actions = bus();
        actions.create_table("T", 10.0, 10.0, false);
        for _ in 0..(HISTORY_DEPTH + 5) {
            actions.create_table("T2", 10.0, 10.0, false);
        }
        assert_eq!(actions.history.undo.len(), HISTORY_DEPTH);
    }

    #[test]
    fn move_sprite_then_undo_restores_old_position() {
        let mut actions = bus();
        actions.create_table("T", 100.0, 100.0, false);
        let table_id = actions.scene().current_table().unwrap().table_id.clone();
        let sprite = Sprite::new("s1", Position::new(0.0, 0.0), Layer::Tokens);
        actions.create_sprite(&table_id, sprite, false);

        actions.move_sprite(&table_id, "s1", Position::new(0.0, 0.0), Position::new(50.0, 60.0), false);
        assert_eq!(
            actions.scene().table(&table_id).unwrap().find_sprite("s1").unwrap().position,
            Position::new(50.0, 60.0)
        );

        let undo_result = actions.undo();
        assert!(undo_result.success);
        assert_eq!(
            actions.scene().table(&table_id).unwrap().find_sprite("s1").unwrap().position,
            Position::new(0.0, 0.0)
        );
    }

    #[test]
    fn update_table_applies_only_given_fields() {
        let mut actions = bus();
        actions.create_table("T", 100.0, 100.0, false);
        let table_id = actions.scene().current_table().unwrap().table_id.clone();
        let result = actions.update_table(&table_id, TableUpdate { name: Some("Renamed".into()), ..Default::default() }, false);
        assert!(result.success);
        let table = actions.scene().table(&table_id).unwrap();
        assert_eq!(table.name, "Renamed");
        assert_eq!(table.width, 100.0);
    }

    #[test]
    fn update_table_rejects_empty_patch() {
        let mut actions = bus();
        actions.create_table("T", 100.0, 100.0, false);
        let table_id = actions.scene().current_table().unwrap().table_id.clone();
        let result = actions.update_table(&table_id, TableUpdate::default(), false);
        assert!(!result.success);
    }

    #[test]
    fn move_table_sets_absolute_viewport_position() {
        let mut actions = bus();
        actions.create_table("T", 100.0, 100.0, false);
        let table_id = actions.scene().current_table().unwrap().table_id.clone();
        let result = actions.move_table(&table_id, Position::new(12.0, 34.0), false);
        assert!(result.success);
        let table = actions.scene().table(&table_id).unwrap();
        assert_eq!((table.viewport_x, table.viewport_y), (12.0, 34.0));
    }

    #[test]
    fn scale_table_clamps_to_bounds() {
        let mut actions = bus();
        actions.create_table("T", 100.0, 100.0, false);
        let table_id = actions.scene().current_table().unwrap().table_id.clone();
        actions.scale_table(&table_id, 999.0, 999.0, false);
        assert_eq!(actions.scene().table(&table_id).unwrap().table_scale, MAX_TABLE_SCALE);
    }

    #[test]
    fn update_sprite_applies_patch_and_records_history() {
        let mut actions = bus();
        actions.create_table("T", 100.0, 100.0, false);
        let table_id = actions.scene().current_table().unwrap().table_id.clone();
        actions.create_sprite(&table_id, Sprite::new("s1", Position::new(0.0, 0.0), Layer::Tokens), false);
        let update = SpriteUpdate {
            position: Some(Position::new(5.0, 5.0)),
            rotation: Some(90.0),
            ..Default::default()
        };
        let result = actions.update_sprite(&table_id, "s1", update, false);
        assert!(result.success);
        let sprite = actions.scene().table(&table_id).unwrap().find_sprite("s1").unwrap();
        assert_eq!(sprite.position, Position::new(5.0, 5.0));
        assert_eq!(sprite.rotation, 90.0);
    }

    #[test]
    fn chat_message_is_rejected_when_blank() {
        let mut actions = bus();
        let result = actions.add_chat_message("u1", "   ", 0.0, false);
        assert!(!result.success);
    }

    #[test]
    fn chat_history_is_bounded_at_chat_history_depth() {
        let mut actions = bus();
        for i in 0..(CHAT_HISTORY_DEPTH + 5) {
            actions.add_chat_message("u1", &format!("msg {i}"), i as f64, false);
        }
        assert_eq!(actions.chat_messages().count(), CHAT_HISTORY_DEPTH);
        assert_eq!(actions.chat_messages().next().unwrap().text, "msg 5");
    }

    #[test]
    fn new_mutation_after_undo_clears_redo_stack() {
        let mut actions = bus();
        actions.create_table("T", 100.0, 100.0, false);
        actions.create_table("T2", 100.0, 100.0, false);
        actions.undo();
        assert!(!actions.history.redo.is_empty());
        actions.create_table("T3", 100.0, 100.0, false);
        assert!(actions.history.redo.is_empty());
    }
}
