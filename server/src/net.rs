//! Server-side replication (§4.6 server half), idiom grounded in the
//! teacher's `api` crate (`axum` handlers, bearer-token auth via
//! `jsonwebtoken`, structured `log` calls).

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use jsonwebtoken::{decode, DecodingKey, Validation};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use vtt_core::types::{ChatMessage, Message, MessageType, Sprite, SpriteUpdate, TableUpdate};

use crate::action_core::ActionCore;
use crate::broadcast::Broadcaster;
use crate::character_store::CharacterStore;
use crate::chat::ChatStore;
use crate::persistence::PersistenceStore;

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
}

/// A connected participant (§4.6 "Session lifecycle"). One exists per
/// authenticated client, independent of the transport it arrived on.
#[derive(Debug, Clone)]
pub struct PlayerSession {
    pub user_id: String,
    pub username: String,
    pub session_code: String,
    pub client_id: String,
}

pub struct AppState<S: PersistenceStore> {
    pub action_core: Arc<ActionCore<S>>,
    pub character_store: Arc<CharacterStore<S>>,
    pub chat_store: Arc<ChatStore>,
    pub broadcaster: Broadcaster,
    pub jwt_secret: String,
}

fn now_seconds() -> f64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs_f64()).unwrap_or(0.0)
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

fn verify_token(token: &str, secret: &str) -> Option<String> {
    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &Validation::default())
        .ok()
        .map(|data| data.claims.sub)
}

/// §4.6 step 2: server sends `WELCOME` with `{user_id, username,
/// session_code, message}` once a client authenticates and connects.
pub async fn welcome<S: PersistenceStore>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    let Some(token) = bearer_token(&headers) else {
        warn!("welcome rejected: missing bearer token");
        return (StatusCode::UNAUTHORIZED, Json(json!({"success": false, "error": "missing token"})));
    };
    let Some(user_id) = verify_token(&token, &state.jwt_secret) else {
        warn!("welcome rejected: invalid token");
        return (StatusCode::UNAUTHORIZED, Json(json!({"success": false, "error": "invalid token"})));
    };

    let session_code = Uuid::new_v4().to_string()[..8].to_string();
    state.character_store.register_session_code(session_code.clone(), user_id.clone()).await;

    info!("player {user_id} joined, session_code={session_code}");

    let message = Message::new(
        MessageType::Welcome,
        json!({"user_id": user_id, "username": user_id, "session_code": session_code, "message": "welcome"}),
        session_code,
        now_seconds(),
    );
    (StatusCode::OK, Json(json!({"success": true, "welcome": message})))
}

/// Generic envelope handler. In the real server this is the inbound side
/// of the persistent message channel per client; exposed here as a
/// single POST route so the dispatch logic can be exercised without a
/// websocket transport, which is out of scope (§1 window/input platform
/// layer; transport is a collaborator with a defined interface only).
pub async fn handle_envelope<S: PersistenceStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(message): Json<Message>,
) -> (StatusCode, Json<Value>) {
    let response = match message.message_type {
        MessageType::TableRequest => dispatch_table_request(&state, &message).await,
        MessageType::TableUpdate => dispatch_table_update(&state, &message).await,
        MessageType::TableDelete => dispatch_table_delete(&state, &message).await,
        MessageType::SpriteRequest => dispatch_sprite_request(&state, &message).await,
        MessageType::SpriteUpdate => dispatch_sprite_update(&state, &message).await,
        MessageType::SpriteCreate => dispatch_sprite_create(&state, &message).await,
        MessageType::SpriteDelete => dispatch_sprite_delete(&state, &message).await,
        MessageType::SpriteMove => dispatch_sprite_move(&state, &message).await,
        MessageType::SpriteScale => dispatch_sprite_scale(&state, &message).await,
        MessageType::SpriteRotate => dispatch_sprite_rotate(&state, &message).await,
        MessageType::FogUpdate => dispatch_fog_update(&state, &message).await,
        MessageType::CharacterSave => dispatch_character_save(&state, &message).await,
        MessageType::CharacterLoad => dispatch_character_load(&state, &message).await,
        MessageType::CharacterList => dispatch_character_list(&state, &message).await,
        MessageType::CharacterDelete => dispatch_character_delete(&state, &message).await,
        MessageType::ChatMessage => dispatch_chat_message(&state, &message).await,
        MessageType::Ping => json!({"success": true, "type": "PONG"}),
        MessageType::Pong => json!({"success": true}),
        MessageType::AssetUploadRequest
        | MessageType::AssetUploadResponse
        | MessageType::AssetDownloadRequest
        | MessageType::AssetDownloadResponse
        | MessageType::AssetListRequest
        | MessageType::AssetListResponse => {
            json!({"success": false, "error": "asset transport is out of scope"})
        }
        MessageType::PlayerList | MessageType::PlayerJoined | MessageType::PlayerLeft | MessageType::KickPlayer | MessageType::BanPlayer => {
            json!({"success": false, "error": "player roster/moderation is not implemented"})
        }
        MessageType::TableResponse | MessageType::Welcome => {
            json!({"success": false, "error": "server-originated message type received from a client"})
        }
        MessageType::Unknown => {
            warn!("ignoring unknown message type on handler {}", message.message_type.handler_name());
            json!({"success": false, "error": "unhandled message type"})
        }
    };

    if response.get("success").and_then(Value::as_bool).unwrap_or(false) && is_replicated(&message.message_type) {
        state.broadcaster.publish(message.clone());
    }

    (StatusCode::OK, Json(response))
}

/// §4.6 "the server broadcasts confirmed mutations": which message types
/// fan out to other sessions once applied successfully.
fn is_replicated(message_type: &MessageType) -> bool {
    matches!(
        message_type,
        MessageType::TableUpdate
            | MessageType::TableDelete
            | MessageType::SpriteMove
            | MessageType::SpriteUpdate
            | MessageType::SpriteCreate
            | MessageType::SpriteDelete
            | MessageType::SpriteScale
            | MessageType::SpriteRotate
            | MessageType::FogUpdate
            | MessageType::ChatMessage
    )
}

async fn dispatch_table_request<S: PersistenceStore + 'static>(state: &Arc<AppState<S>>, message: &Message) -> Value {
    let Some(table_id) = message.data.get("table_id").and_then(|v| v.as_str()) else {
        return json!({"success": false, "error": "missing table_id"});
    };
    match state.action_core.table_manager().get(table_id).await {
        Some(table) => json!({"success": true, "table": table}),
        None => json!({"success": false, "error": "not_found"}),
    }
}

async fn dispatch_table_update<S: PersistenceStore + 'static>(state: &Arc<AppState<S>>, message: &Message) -> Value {
    let Some(table_id) = message.data.get("table_id").and_then(|v| v.as_str()) else {
        return json!({"success": false, "error": "missing table_id"});
    };
    let update = TableUpdate {
        name: message.data.get("name").and_then(|v| v.as_str()).map(String::from),
        width: message.data.get("width").and_then(|v| v.as_f64()),
        height: message.data.get("height").and_then(|v| v.as_f64()),
    };
    match state.action_core.update_table(table_id, update).await {
        Ok(()) => json!({"success": true}),
        Err(e) => json!({"success": false, "error": e.user_message()}),
    }
}

async fn dispatch_table_delete<S: PersistenceStore + 'static>(state: &Arc<AppState<S>>, message: &Message) -> Value {
    let Some(table_id) = message.data.get("table_id").and_then(|v| v.as_str()) else {
        return json!({"success": false, "error": "missing table_id"});
    };
    match state.action_core.delete_table(table_id).await {
        Ok(()) => json!({"success": true}),
        Err(e) => json!({"success": false, "error": e.user_message()}),
    }
}

async fn dispatch_sprite_request<S: PersistenceStore + 'static>(state: &Arc<AppState<S>>, message: &Message) -> Value {
    let (Some(table_id), Some(sprite_id)) = (
        message.data.get("table_id").and_then(|v| v.as_str()),
        message.data.get("sprite_id").and_then(|v| v.as_str()),
    ) else {
        return json!({"success": false, "error": "missing table_id/sprite_id"});
    };
    match state.action_core.table_manager().get(table_id).await {
        Some(table) => match table.find_sprite(sprite_id) {
            Some(sprite) => json!({"success": true, "sprite": sprite}),
            None => json!({"success": false, "error": "not_found"}),
        },
        None => json!({"success": false, "error": "not_found"}),
    }
}

async fn dispatch_sprite_update<S: PersistenceStore + 'static>(state: &Arc<AppState<S>>, message: &Message) -> Value {
    let data = &message.data;
    let (Some(table_id), Some(sprite_id)) = (data.get("table_id").and_then(|v| v.as_str()), data.get("sprite_id").and_then(|v| v.as_str())) else {
        return json!({"success": false, "error": "missing table_id/sprite_id"});
    };
    let update = SpriteUpdate {
        position: parse_position(data.get("position")),
        scale_x: data.get("scale_x").and_then(|v| v.as_f64()),
        scale_y: data.get("scale_y").and_then(|v| v.as_f64()),
        rotation: data.get("rotation").and_then(|v| v.as_f64()),
        visible: data.get("visible").and_then(|v| v.as_bool()),
        texture_path: data.get("texture_path").and_then(|v| v.as_str()).map(String::from),
    };
    match state.action_core.update_sprite(table_id, sprite_id, update).await {
        Ok(()) => json!({"success": true}),
        Err(e) => json!({"success": false, "error": e.user_message()}),
    }
}

async fn dispatch_sprite_create<S: PersistenceStore + 'static>(state: &Arc<AppState<S>>, message: &Message) -> Value {
    let Some(table_id) = message.data.get("table_id").and_then(|v| v.as_str()) else {
        return json!({"success": false, "error": "missing table_id"});
    };
    let sprite: Sprite = match serde_json::from_value(message.data.get("sprite").cloned().unwrap_or(Value::Null)) {
        Ok(s) => s,
        Err(e) => return json!({"success": false, "error": format!("invalid sprite payload: {e}")}),
    };
    match state.action_core.create_sprite(table_id, sprite).await {
        Ok(()) => json!({"success": true}),
        Err(e) => json!({"success": false, "error": e.user_message()}),
    }
}

async fn dispatch_sprite_delete<S: PersistenceStore + 'static>(state: &Arc<AppState<S>>, message: &Message) -> Value {
    let (Some(table_id), Some(sprite_id)) = (
        message.data.get("table_id").and_then(|v| v.as_str()),
        message.data.get("sprite_id").and_then(|v| v.as_str()),
    ) else {
        return json!({"success": false, "error": "missing table_id/sprite_id"});
    };
    match state.action_core.delete_sprite(table_id, sprite_id).await {
        Ok(()) => json!({"success": true}),
        Err(e) => json!({"success": false, "error": e.user_message()}),
    }
}

async fn dispatch_sprite_scale<S: PersistenceStore + 'static>(state: &Arc<AppState<S>>, message: &Message) -> Value {
    let data = &message.data;
    let (Some(table_id), Some(sprite_id)) = (data.get("table_id").and_then(|v| v.as_str()), data.get("sprite_id").and_then(|v| v.as_str())) else {
        return json!({"success": false, "error": "missing table_id/sprite_id"});
    };
    let (Some(sx), Some(sy)) = (data.get("scale_x").and_then(|v| v.as_f64()), data.get("scale_y").and_then(|v| v.as_f64())) else {
        return json!({"success": false, "error": "missing scale_x/scale_y"});
    };
    match state.action_core.scale_sprite(table_id, sprite_id, sx, sy).await {
        Ok(()) => json!({"success": true}),
        Err(e) => json!({"success": false, "error": e.user_message()}),
    }
}

async fn dispatch_sprite_rotate<S: PersistenceStore + 'static>(state: &Arc<AppState<S>>, message: &Message) -> Value {
    let data = &message.data;
    let (Some(table_id), Some(sprite_id)) = (data.get("table_id").and_then(|v| v.as_str()), data.get("sprite_id").and_then(|v| v.as_str())) else {
        return json!({"success": false, "error": "missing table_id/sprite_id"});
    };
    let Some(angle) = data.get("angle").and_then(|v| v.as_f64()) else {
        return json!({"success": false, "error": "missing angle"});
    };
    match state.action_core.rotate_sprite(table_id, sprite_id, angle).await {
        Ok(()) => json!({"success": true}),
        Err(e) => json!({"success": false, "error": e.user_message()}),
    }
}

async fn dispatch_character_save<S: PersistenceStore + 'static>(state: &Arc<AppState<S>>, message: &Message) -> Value {
    let data = &message.data;
    let Some(user_id) = data.get("user_id").and_then(|v| v.as_str()) else {
        return json!({"success": false, "error": "missing user_id"});
    };
    let Some(character_name) = data.get("character_name").and_then(|v| v.as_str()) else {
        return json!({"success": false, "error": "missing character_name"});
    };
    let character_id = data.get("character_id").and_then(|v| v.as_str());
    let character_data = data.get("character_data").cloned().unwrap_or_else(|| json!({}));
    match state
        .character_store
        .save_character(&message.client_id, character_id, character_name, character_data, user_id, message.timestamp)
        .await
    {
        Ok((id, version)) => json!({"success": true, "character_id": id, "version": version}),
        Err(e) => json!({"success": false, "error": e.user_message()}),
    }
}

async fn dispatch_character_load<S: PersistenceStore + 'static>(state: &Arc<AppState<S>>, message: &Message) -> Value {
    let data = &message.data;
    let (Some(character_id), Some(user_id)) = (data.get("character_id").and_then(|v| v.as_str()), data.get("user_id").and_then(|v| v.as_str())) else {
        return json!({"success": false, "error": "missing character_id/user_id"});
    };
    match state.character_store.load_character(character_id, user_id).await {
        Ok(character) => json!({"success": true, "character": character}),
        Err(e) => json!({"success": false, "error": e.user_message()}),
    }
}

async fn dispatch_character_list<S: PersistenceStore + 'static>(state: &Arc<AppState<S>>, message: &Message) -> Value {
    let Some(user_id) = message.data.get("user_id").and_then(|v| v.as_str()) else {
        return json!({"success": false, "error": "missing user_id"});
    };
    let characters = state.character_store.list_characters(user_id).await;
    json!({"success": true, "characters": characters})
}

async fn dispatch_character_delete<S: PersistenceStore + 'static>(state: &Arc<AppState<S>>, message: &Message) -> Value {
    let data = &message.data;
    let (Some(character_id), Some(user_id)) = (data.get("character_id").and_then(|v| v.as_str()), data.get("user_id").and_then(|v| v.as_str())) else {
        return json!({"success": false, "error": "missing character_id/user_id"});
    };
    match state.character_store.delete_character(character_id, user_id).await {
        Ok(()) => json!({"success": true}),
        Err(e) => json!({"success": false, "error": e.user_message()}),
    }
}

async fn dispatch_sprite_move<S: PersistenceStore + 'static>(state: &Arc<AppState<S>>, message: &Message) -> Value {
    let data = &message.data;
    let (table_id, sprite_id) = match (data.get("table_id").and_then(|v| v.as_str()), data.get("sprite_id").and_then(|v| v.as_str())) {
        (Some(t), Some(s)) => (t, s),
        _ => return json!({"success": false, "error": "missing table_id/sprite_id"}),
    };
    let from = parse_position(data.get("from"));
    let to = parse_position(data.get("to"));
    let (Some(from), Some(to)) = (from, to) else {
        return json!({"success": false, "error": "missing from/to"});
    };
    match state.action_core.move_sprite(table_id, sprite_id, from, to).await {
        Ok(()) => json!({"success": true}),
        Err(e) => json!({"success": false, "error": e.user_message()}),
    }
}

async fn dispatch_fog_update<S: PersistenceStore + 'static>(state: &Arc<AppState<S>>, message: &Message) -> Value {
    let Some(table_id) = message.data.get("table_id").and_then(|v| v.as_str()) else {
        return json!({"success": false, "error": "missing table_id"});
    };
    let hide = parse_rects(message.data.get("hide_rectangles"));
    let reveal = parse_rects(message.data.get("reveal_rectangles"));
    match state.action_core.update_fog(table_id, hide, reveal).await {
        Ok(()) => json!({"success": true}),
        Err(e) => json!({"success": false, "error": e.user_message()}),
    }
}

/// Recovered `add_chat_message` server half (SPEC_FULL.md §2). Scoped by
/// `client_id`, which doubles as the session identifier on this envelope.
async fn dispatch_chat_message<S: PersistenceStore + 'static>(state: &Arc<AppState<S>>, message: &Message) -> Value {
    let Some(text) = message.data.get("text").and_then(|v| v.as_str()) else {
        return json!({"success": false, "error": "missing text"});
    };
    let user_id = message.data.get("user_id").and_then(|v| v.as_str()).unwrap_or(&message.client_id);
    state
        .chat_store
        .add_message(&message.client_id, ChatMessage::new(user_id, text, message.timestamp))
        .await;
    json!({"success": true})
}

fn parse_position(value: Option<&Value>) -> Option<vtt_core::types::Position> {
    let value = value?;
    Some(vtt_core::types::Position::new(value.get("x")?.as_f64()?, value.get("y")?.as_f64()?))
}

fn parse_rects(value: Option<&Value>) -> Vec<vtt_core::types::TableRect> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|pair| {
            let pair = pair.as_array()?;
            let p1 = pair.first()?.as_array()?;
            let p2 = pair.get(1)?.as_array()?;
            Some(vtt_core::types::TableRect::new(
                vtt_core::types::Position::new(p1.first()?.as_f64()?, p1.get(1)?.as_f64()?),
                vtt_core::types::Position::new(p2.first()?.as_f64()?, p2.get(1)?.as_f64()?),
            ))
        })
        .collect()
}

pub fn router<S: PersistenceStore + 'static>(state: Arc<AppState<S>>) -> Router {
    Router::new()
        .route("/welcome", post(welcome::<S>))
        .route("/messages", post(handle_envelope::<S>))
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct PlayerListEntry {
    pub user_id: String,
    pub username: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::InMemoryStore;
    use std::time::Duration;

    fn test_state() -> Arc<AppState<InMemoryStore>> {
        let store = Arc::new(InMemoryStore::new());
        Arc::new(AppState {
            action_core: Arc::new(ActionCore::new(Arc::clone(&store), Duration::from_millis(30))),
            character_store: Arc::new(CharacterStore::new(Arc::clone(&store))),
            chat_store: Arc::new(ChatStore::new()),
            broadcaster: Broadcaster::new(),
            jwt_secret: "test-secret".into(),
        })
    }

    fn envelope(message_type: MessageType, data: Value) -> Message {
        Message::new(message_type, data, "client-a", 0.0)
    }

    #[tokio::test]
    async fn table_update_then_sprite_round_trip_through_handle_envelope() {
        let state = test_state();
        let table_id = state.action_core.create_table("Table", 100.0, 100.0).await.unwrap();

        let rename = handle_envelope(
            State(Arc::clone(&state)),
            Json(envelope(MessageType::TableUpdate, json!({"table_id": table_id, "name": "Renamed"}))),
        )
        .await;
        assert_eq!(rename.1.get("success").and_then(Value::as_bool), Some(true));
        assert_eq!(state.action_core.table_manager().get(&table_id).await.unwrap().name, "Renamed");
    }

    #[tokio::test]
    async fn sprite_create_then_request_round_trips_through_handle_envelope() {
        let state = test_state();
        let table_id = state.action_core.create_table("Table", 100.0, 100.0).await.unwrap();
        let sprite = vtt_core::types::Sprite::new("s1", vtt_core::types::Position::new(0.0, 0.0), vtt_core::types::Layer::Tokens);

        let created = handle_envelope(
            State(Arc::clone(&state)),
            Json(envelope(
                MessageType::SpriteCreate,
                json!({"table_id": table_id, "sprite": serde_json::to_value(&sprite).unwrap()}),
            )),
        )
        .await;
        assert_eq!(created.1.get("success").and_then(Value::as_bool), Some(true));

        let fetched = handle_envelope(
            State(Arc::clone(&state)),
            Json(envelope(MessageType::SpriteRequest, json!({"table_id": table_id, "sprite_id": "s1"}))),
        )
        .await;
        assert_eq!(fetched.1.get("success").and_then(Value::as_bool), Some(true));
        assert_eq!(fetched.1.get("sprite").and_then(|s| s.get("sprite_id")).and_then(Value::as_str), Some("s1"));
    }

    #[tokio::test]
    async fn character_save_then_load_round_trips_through_handle_envelope() {
        let state = test_state();
        let saved = handle_envelope(
            State(Arc::clone(&state)),
            Json(envelope(
                MessageType::CharacterSave,
                json!({"user_id": "u1", "character_name": "Hero", "character_data": {"hp": 10}}),
            )),
        )
        .await;
        assert_eq!(saved.1.get("success").and_then(Value::as_bool), Some(true));
        let character_id = saved.1.get("character_id").and_then(Value::as_str).unwrap().to_string();

        let loaded = handle_envelope(
            State(Arc::clone(&state)),
            Json(envelope(MessageType::CharacterLoad, json!({"character_id": character_id, "user_id": "u1"}))),
        )
        .await;
        assert_eq!(loaded.1.get("success").and_then(Value::as_bool), Some(true));
    }

    #[tokio::test]
    async fn asset_and_player_roster_message_types_report_out_of_scope() {
        let state = test_state();
        let asset = handle_envelope(State(Arc::clone(&state)), Json(envelope(MessageType::AssetUploadRequest, json!({})))).await;
        assert_eq!(asset.1.get("success").and_then(Value::as_bool), Some(false));

        let roster = handle_envelope(State(Arc::clone(&state)), Json(envelope(MessageType::KickPlayer, json!({})))).await;
        assert_eq!(roster.1.get("success").and_then(Value::as_bool), Some(false));
    }

    #[tokio::test]
    async fn successful_sprite_move_broadcasts_to_other_subscribers() {
        let state = test_state();
        let table_id = state.action_core.create_table("Table", 100.0, 100.0).await.unwrap();
        let sprite = vtt_core::types::Sprite::new("s1", vtt_core::types::Position::new(0.0, 0.0), vtt_core::types::Layer::Tokens);
        state.action_core.create_sprite(&table_id, sprite).await.unwrap();

        let mut subscriber = state.broadcaster.subscribe();
        let response = handle_envelope(
            State(Arc::clone(&state)),
            Json(envelope(
                MessageType::SpriteMove,
                json!({"table_id": table_id, "sprite_id": "s1", "from": {"x": 0.0, "y": 0.0}, "to": {"x": 20.0, "y": 30.0}}),
            )),
        )
        .await;
        assert_eq!(response.1.get("success").and_then(Value::as_bool), Some(true));

        let broadcast = subscriber.try_recv().expect("move should have broadcast");
        assert_eq!(broadcast.message_type, MessageType::SpriteMove);
    }

    #[tokio::test]
    async fn ping_does_not_broadcast() {
        let state = test_state();
        let mut subscriber = state.broadcaster.subscribe();
        handle_envelope(State(Arc::clone(&state)), Json(envelope(MessageType::Ping, json!({})))).await;
        assert!(subscriber.try_recv().is_err());
    }

    #[test]
    fn bearer_token_strips_the_scheme_prefix() {
        let mut headers = HeaderMap::new();
        headers.insert(axum::http::header::AUTHORIZATION, "Bearer abc.def.ghi".parse().unwrap());
        assert_eq!(bearer_token(&headers).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn missing_authorization_header_yields_no_token() {
        let headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn parse_rects_reads_nested_coordinate_pairs() {
        let value = json!([[[0.0, 0.0], [10.0, 10.0]]]);
        let rects = parse_rects(Some(&value));
        assert_eq!(rects.len(), 1);
        assert_eq!(rects[0].normalized(), (0.0, 0.0, 10.0, 10.0));
    }
}
