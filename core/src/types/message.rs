use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Replication envelope message types (§4.6), minimum set. `Unknown`
/// carries the raw string so the dispatcher can log-and-ignore per the
/// spec's handler-dispatch rule instead of failing deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    TableRequest,
    TableResponse,
    TableUpdate,
    TableDelete,
    SpriteRequest,
    SpriteUpdate,
    SpriteCreate,
    SpriteDelete,
    SpriteMove,
    SpriteScale,
    SpriteRotate,
    FogUpdate,
    CharacterSave,
    CharacterLoad,
    CharacterList,
    CharacterDelete,
    AssetUploadRequest,
    AssetUploadResponse,
    AssetDownloadRequest,
    AssetDownloadResponse,
    AssetListRequest,
    AssetListResponse,
    Welcome,
    PlayerList,
    PlayerJoined,
    PlayerLeft,
    KickPlayer,
    BanPlayer,
    Ping,
    Pong,
    ChatMessage,
    #[serde(other)]
    Unknown,
}

impl MessageType {
    /// The `handle_<message_type>` method name a client dispatcher routes
    /// this variant to (§4.6 "Handler dispatch").
    pub fn handler_name(&self) -> String {
        format!("handle_{}", self.wire_name())
    }

    fn wire_name(&self) -> &'static str {
        match self {
            MessageType::TableRequest => "table_request",
            MessageType::TableResponse => "table_response",
            MessageType::TableUpdate => "table_update",
            MessageType::TableDelete => "table_delete",
            MessageType::SpriteRequest => "sprite_request",
            MessageType::SpriteUpdate => "sprite_update",
            MessageType::SpriteCreate => "sprite_create",
            MessageType::SpriteDelete => "sprite_delete",
            MessageType::SpriteMove => "sprite_move",
            MessageType::SpriteScale => "sprite_scale",
            MessageType::SpriteRotate => "sprite_rotate",
            MessageType::FogUpdate => "fog_update",
            MessageType::CharacterSave => "character_save",
            MessageType::CharacterLoad => "character_load",
            MessageType::CharacterList => "character_list",
            MessageType::CharacterDelete => "character_delete",
            MessageType::AssetUploadRequest => "asset_upload_request",
            MessageType::AssetUploadResponse => "asset_upload_response",
            MessageType::AssetDownloadRequest => "asset_download_request",
            MessageType::AssetDownloadResponse => "asset_download_response",
            MessageType::AssetListRequest => "asset_list_request",
            MessageType::AssetListResponse => "asset_list_response",
            MessageType::Welcome => "welcome",
            MessageType::PlayerList => "player_list",
            MessageType::PlayerJoined => "player_joined",
            MessageType::PlayerLeft => "player_left",
            MessageType::KickPlayer => "kick_player",
            MessageType::BanPlayer => "ban_player",
            MessageType::Ping => "ping",
            MessageType::Pong => "pong",
            MessageType::ChatMessage => "chat_message",
            MessageType::Unknown => "unknown",
        }
    }
}

/// The wire envelope (§3, §4.6, §6): `{type, data, client_id, timestamp}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub data: Value,
    pub client_id: String,
    pub timestamp: f64,
}

impl Message {
    pub fn new(message_type: MessageType, data: Value, client_id: impl Into<String>, timestamp: f64) -> Self {
        Message {
            message_type,
            data,
            client_id: client_id.into(),
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handler_name_matches_message_type_dispatch_convention() {
        assert_eq!(MessageType::SpriteMove.handler_name(), "handle_sprite_move");
        assert_eq!(MessageType::FogUpdate.handler_name(), "handle_fog_update");
    }

    #[test]
    fn unrecognized_wire_type_deserializes_to_unknown() {
        let v: MessageType = serde_json::from_str("\"SOME_FUTURE_TYPE\"").unwrap();
        assert_eq!(v, MessageType::Unknown);
    }

    #[test]
    fn message_type_serializes_screaming_snake_case() {
        let s = serde_json::to_string(&MessageType::SpriteMove).unwrap();
        assert_eq!(s, "\"SPRITE_MOVE\"");
    }
}
