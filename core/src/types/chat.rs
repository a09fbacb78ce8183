use serde::{Deserialize, Serialize};

/// One chat line (SPEC_FULL.md §2 `add_chat_message`). Session-scoped: the
/// store that holds these keys them by `session_id`, not by table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub user_id: String,
    pub text: String,
    pub timestamp: f64,
}

impl ChatMessage {
    pub fn new(user_id: impl Into<String>, text: impl Into<String>, timestamp: f64) -> Self {
        ChatMessage {
            user_id: user_id.into(),
            text: text.into(),
            timestamp,
        }
    }
}
