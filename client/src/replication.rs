//! Client-side replication handling (§4.6 client half). Owns the session
//! context established at `WELCOME`, dispatches incoming envelopes to
//! `handle_<message_type>`, and tracks pending asset uploads across
//! reconnects by `asset_id` (§4.6 "Cancellation").

use std::collections::HashSet;

use log::warn;
use serde_json::Value;
use vtt_core::types::{Message, MessageType, Position, Sprite, SpriteUpdate, TableRect, TableUpdate};

use crate::action_bus::Actions;

#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    pub user_id: Option<String>,
    pub username: Option<String>,
    pub session_code: Option<String>,
}

/// §4.6 "Cancellation": pending upload tracking is retained across
/// reconnect by `asset_id`; it is cleared only by explicit cancellation
/// or completion, never by a transport drop.
#[derive(Debug, Default)]
pub struct PendingUploads {
    in_flight: HashSet<String>,
}

impl PendingUploads {
    pub fn start(&mut self, asset_id: impl Into<String>) {
        self.in_flight.insert(asset_id.into());
    }

    pub fn complete(&mut self, asset_id: &str) {
        self.in_flight.remove(asset_id);
    }

    pub fn cancel(&mut self, asset_id: &str) {
        self.in_flight.remove(asset_id);
    }

    pub fn is_pending(&self, asset_id: &str) -> bool {
        self.in_flight.contains(asset_id)
    }

    pub fn pending_count(&self) -> usize {
        self.in_flight.len()
    }
}

/// Result of routing one incoming envelope: either it was a known type
/// and got dispatched, or it's logged and ignored (§4.6 "Handler dispatch").
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    Handled(MessageType),
    Ignored,
}

pub struct ReplicationClient {
    pub session: SessionContext,
    pub pending_uploads: PendingUploads,
}

impl ReplicationClient {
    pub fn new() -> Self {
        ReplicationClient {
            session: SessionContext::default(),
            pending_uploads: PendingUploads::default(),
        }
    }

    /// Applies the `WELCOME` envelope's data to establish session context.
    pub fn handle_welcome(&mut self, message: &Message) {
        self.session.user_id = message.data.get("user_id").and_then(|v| v.as_str()).map(String::from);
        self.session.username = message.data.get("username").and_then(|v| v.as_str()).map(String::from);
        self.session.session_code = message.data.get("session_code").and_then(|v| v.as_str()).map(String::from);
    }

    /// Routes an incoming envelope to its handler per §4.6, applying the
    /// replicated mutation to `actions` with `to_server = false` so it
    /// isn't echoed back to the server that just sent it.
    pub fn dispatch(&mut self, message: &Message, actions: &mut Actions) -> DispatchOutcome {
        if message.message_type == MessageType::Unknown {
            warn!("ignoring unknown message type on handler {}", message.message_type.handler_name());
            return DispatchOutcome::Ignored;
        }

        match message.message_type {
            MessageType::Welcome => self.handle_welcome(message),
            MessageType::TableUpdate => apply_table_update(actions, message),
            MessageType::TableDelete => apply_table_delete(actions, message),
            MessageType::SpriteCreate => apply_sprite_create(actions, message),
            MessageType::SpriteDelete => apply_sprite_delete(actions, message),
            MessageType::SpriteMove => apply_sprite_move(actions, message),
            MessageType::SpriteScale => apply_sprite_scale(actions, message),
            MessageType::SpriteRotate => apply_sprite_rotate(actions, message),
            MessageType::SpriteUpdate => apply_sprite_update(actions, message),
            MessageType::FogUpdate => apply_fog_update(actions, message),
            MessageType::ChatMessage => apply_chat_message(actions, message),
            // Request/response, asset transport, player roster, and
            // keepalive types carry no table/scene mutation of their own.
            _ => {}
        }

        DispatchOutcome::Handled(message.message_type.clone())
    }
}

fn parse_position(value: Option<&Value>) -> Option<Position> {
    let value = value?;
    Some(Position::new(value.get("x")?.as_f64()?, value.get("y")?.as_f64()?))
}

fn parse_rects(value: Option<&Value>) -> Vec<TableRect> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|pair| {
            let pair = pair.as_array()?;
            let p1 = pair.first()?.as_array()?;
            let p2 = pair.get(1)?.as_array()?;
            Some(TableRect::new(
                Position::new(p1.first()?.as_f64()?, p1.get(1)?.as_f64()?),
                Position::new(p2.first()?.as_f64()?, p2.get(1)?.as_f64()?),
            ))
        })
        .collect()
}

fn apply_table_update(actions: &mut Actions, message: &Message) {
    let Some(table_id) = message.data.get("table_id").and_then(|v| v.as_str()) else {
        return;
    };
    let update = TableUpdate {
        name: message.data.get("name").and_then(|v| v.as_str()).map(String::from),
        width: message.data.get("width").and_then(|v| v.as_f64()),
        height: message.data.get("height").and_then(|v| v.as_f64()),
    };
    actions.update_table(table_id, update, false);
}

fn apply_table_delete(actions: &mut Actions, message: &Message) {
    let Some(table_id) = message.data.get("table_id").and_then(|v| v.as_str()) else {
        return;
    };
    actions.delete_table(table_id, false);
}

fn apply_sprite_create(actions: &mut Actions, message: &Message) {
    let Some(table_id) = message.data.get("table_id").and_then(|v| v.as_str()) else {
        return;
    };
    let Some(sprite) = message.data.get("sprite").cloned().and_then(|v| serde_json::from_value::<Sprite>(v).ok()) else {
        return;
    };
    actions.create_sprite(table_id, sprite, false);
}

fn apply_sprite_delete(actions: &mut Actions, message: &Message) {
    let (Some(table_id), Some(sprite_id)) = (
        message.data.get("table_id").and_then(|v| v.as_str()),
        message.data.get("sprite_id").and_then(|v| v.as_str()),
    ) else {
        return;
    };
    actions.delete_sprite(table_id, sprite_id, false);
}

fn apply_sprite_move(actions: &mut Actions, message: &Message) {
    let data = &message.data;
    let (Some(table_id), Some(sprite_id)) = (data.get("table_id").and_then(|v| v.as_str()), data.get("sprite_id").and_then(|v| v.as_str())) else {
        return;
    };
    let (Some(from), Some(to)) = (parse_position(data.get("from")), parse_position(data.get("to"))) else {
        return;
    };
    actions.move_sprite(table_id, sprite_id, from, to, false);
}

fn apply_sprite_scale(actions: &mut Actions, message: &Message) {
    let data = &message.data;
    let (Some(table_id), Some(sprite_id)) = (data.get("table_id").and_then(|v| v.as_str()), data.get("sprite_id").and_then(|v| v.as_str())) else {
        return;
    };
    let (Some(sx), Some(sy)) = (data.get("scale_x").and_then(|v| v.as_f64()), data.get("scale_y").and_then(|v| v.as_f64())) else {
        return;
    };
    actions.scale_sprite(table_id, sprite_id, sx, sy, false);
}

fn apply_sprite_rotate(actions: &mut Actions, message: &Message) {
    let data = &message.data;
    let (Some(table_id), Some(sprite_id)) = (data.get("table_id").and_then(|v| v.as_str()), data.get("sprite_id").and_then(|v| v.as_str())) else {
        return;
    };
    let Some(angle) = data.get("angle").and_then(|v| v.as_f64()) else {
        return;
    };
    actions.rotate_sprite(table_id, sprite_id, angle, false);
}

fn apply_sprite_update(actions: &mut Actions, message: &Message) {
    let data = &message.data;
    let (Some(table_id), Some(sprite_id)) = (data.get("table_id").and_then(|v| v.as_str()), data.get("sprite_id").and_then(|v| v.as_str())) else {
        return;
    };
    let update = SpriteUpdate {
        position: parse_position(data.get("position")),
        scale_x: data.get("scale_x").and_then(|v| v.as_f64()),
        scale_y: data.get("scale_y").and_then(|v| v.as_f64()),
        rotation: data.get("rotation").and_then(|v| v.as_f64()),
        visible: data.get("visible").and_then(|v| v.as_bool()),
        texture_path: data.get("texture_path").and_then(|v| v.as_str()).map(String::from),
    };
    actions.update_sprite(table_id, sprite_id, update, false);
}

fn apply_fog_update(actions: &mut Actions, message: &Message) {
    let Some(table_id) = message.data.get("table_id").and_then(|v| v.as_str()) else {
        return;
    };
    let hide = parse_rects(message.data.get("hide_rectangles"));
    let reveal = parse_rects(message.data.get("reveal_rectangles"));
    actions.update_fog(table_id, hide, reveal, false);
}

fn apply_chat_message(actions: &mut Actions, message: &Message) {
    let Some(text) = message.data.get("text").and_then(|v| v.as_str()) else {
        return;
    };
    let user_id = message.data.get("user_id").and_then(|v| v.as_str()).unwrap_or(&message.client_id);
    actions.add_chat_message(user_id, text, message.timestamp, false);
}

impl Default for ReplicationClient {
    fn default() -> Self {
        ReplicationClient::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Scene;
    use serde_json::json;

    fn actions_with_table(table_id: &str) -> Actions {
        let mut actions = Actions::new(Scene::new());
        actions.scene_mut().insert(vtt_core::types::Table::new(table_id, "T", 100.0, 100.0));
        actions
    }

    #[test]
    fn welcome_message_populates_session_context() {
        let mut client = ReplicationClient::new();
        let mut actions = Actions::new(Scene::new());
        let message = Message::new(
            MessageType::Welcome,
            json!({"user_id": "u1", "username": "alice", "session_code": "ABCD"}),
            "c1",
            0.0,
        );
        client.dispatch(&message, &mut actions);
        assert_eq!(client.session.user_id.as_deref(), Some("u1"));
        assert_eq!(client.session.session_code.as_deref(), Some("ABCD"));
    }

    #[test]
    fn unknown_message_type_is_ignored_not_dispatched() {
        let mut client = ReplicationClient::new();
        let mut actions = Actions::new(Scene::new());
        let message = Message::new(MessageType::Unknown, json!({}), "c1", 0.0);
        assert_eq!(client.dispatch(&message, &mut actions), DispatchOutcome::Ignored);
    }

    #[test]
    fn pending_uploads_survive_cancel_of_a_different_asset() {
        let mut uploads = PendingUploads::default();
        uploads.start("asset-1");
        uploads.start("asset-2");
        uploads.cancel("asset-2");
        assert!(uploads.is_pending("asset-1"));
        assert!(!uploads.is_pending("asset-2"));
    }

    /// A second client observing client A's `SpriteMove` broadcast must see
    /// the same position locally, without re-sending it to the server.
    #[test]
    fn sprite_move_from_another_client_updates_local_scene_without_a_server_round_trip() {
        let mut client = ReplicationClient::new();
        let table_id = "t1";
        let mut actions = actions_with_table(table_id);
        actions.create_sprite(
            table_id,
            Sprite::new("s1", Position::new(0.0, 0.0), vtt_core::types::Layer::Tokens),
            false,
        );

        let message = Message::new(
            MessageType::SpriteMove,
            json!({"table_id": table_id, "sprite_id": "s1", "from": {"x": 0.0, "y": 0.0}, "to": {"x": 20.0, "y": 30.0}}),
            "client-a",
            0.0,
        );
        client.dispatch(&message, &mut actions);

        let sprite = actions.scene().table(table_id).unwrap().find_sprite("s1").unwrap();
        assert_eq!((sprite.position.x, sprite.position.y), (20.0, 30.0));
    }

    #[test]
    fn table_update_from_another_client_renames_the_local_table() {
        let mut client = ReplicationClient::new();
        let table_id = "t1";
        let mut actions = actions_with_table(table_id);

        let message = Message::new(MessageType::TableUpdate, json!({"table_id": table_id, "name": "Renamed"}), "client-a", 0.0);
        client.dispatch(&message, &mut actions);

        assert_eq!(actions.scene().table(table_id).unwrap().name, "Renamed");
    }

    #[test]
    fn chat_message_from_another_client_is_appended_locally() {
        let mut client = ReplicationClient::new();
        let mut actions = Actions::new(Scene::new());

        let message = Message::new(MessageType::ChatMessage, json!({"user_id": "u2", "text": "hi"}), "client-b", 0.0);
        client.dispatch(&message, &mut actions);

        assert_eq!(actions.chat_messages().count(), 1);
    }
}
