use serde_json::Value;

/// One history entry (§3). `old_values`/`new_values` carry whatever the
/// originating operation needs to build an inverse for undo; their shape
/// is operation-specific, so they stay as opaque JSON rather than a fixed
/// struct.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ActionRecord {
    #[serde(rename = "type")]
    pub action_type: String,
    pub table_id: Option<String>,
    pub sprite_id: Option<String>,
    pub old_values: Option<Value>,
    pub new_values: Option<Value>,
}

impl ActionRecord {
    pub fn new(action_type: impl Into<String>) -> Self {
        ActionRecord {
            action_type: action_type.into(),
            table_id: None,
            sprite_id: None,
            old_values: None,
            new_values: None,
        }
    }

    pub fn with_table(mut self, table_id: impl Into<String>) -> Self {
        self.table_id = Some(table_id.into());
        self
    }

    pub fn with_sprite(mut self, sprite_id: impl Into<String>) -> Self {
        self.sprite_id = Some(sprite_id.into());
        self
    }

    pub fn with_values(mut self, old_values: Value, new_values: Value) -> Self {
        self.old_values = Some(old_values);
        self.new_values = Some(new_values);
        self
    }
}
