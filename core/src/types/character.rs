use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Server-owned character record (§3, §4.7). `character_data` is opaque
/// to this crate — the character store only ever deep-merges its
/// top-level fields, never interprets them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Character {
    pub character_id: String,
    pub session_id: String,
    pub owner_user_id: String,
    pub character_name: String,
    pub character_data: Value,
    pub version: u64,
    pub created_at: f64,
    pub updated_at: f64,
    pub last_modified_by: String,
}

impl Character {
    pub fn new(
        character_id: impl Into<String>,
        session_id: impl Into<String>,
        owner_user_id: impl Into<String>,
        character_name: impl Into<String>,
        character_data: Value,
        created_at: f64,
    ) -> Self {
        let owner = owner_user_id.into();
        Character {
            character_id: character_id.into(),
            session_id: session_id.into(),
            character_name: character_name.into(),
            character_data,
            version: 1,
            created_at,
            updated_at: created_at,
            last_modified_by: owner.clone(),
            owner_user_id: owner,
        }
    }
}

/// The summary row returned by `list_characters` (§4.7), ordered by
/// `updated_at` descending by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterSummary {
    pub character_id: String,
    pub character_name: String,
    pub created_at: f64,
    pub updated_at: f64,
}

impl From<&Character> for CharacterSummary {
    fn from(c: &Character) -> Self {
        CharacterSummary {
            character_id: c.character_id.clone(),
            character_name: c.character_name.clone(),
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}
