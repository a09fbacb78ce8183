//! Session-scoped chat message store (SPEC_FULL.md §2 `add_chat_message`).
//! Data-plane only — no chat panel UI, no persistence beyond the process
//! lifetime.

use std::collections::{HashMap, VecDeque};

use tokio::sync::RwLock;

use vtt_core::constants::CHAT_HISTORY_DEPTH;
use vtt_core::types::ChatMessage;

#[derive(Default)]
pub struct ChatStore {
    sessions: RwLock<HashMap<String, VecDeque<ChatMessage>>>,
}

impl ChatStore {
    pub fn new() -> Self {
        ChatStore::default()
    }

    pub async fn add_message(&self, session_id: &str, message: ChatMessage) {
        let mut sessions = self.sessions.write().await;
        let log = sessions.entry(session_id.to_string()).or_default();
        if log.len() >= CHAT_HISTORY_DEPTH {
            log.pop_front();
        }
        log.push_back(message);
    }

    pub async fn messages(&self, session_id: &str) -> Vec<ChatMessage> {
        self.sessions.read().await.get(session_id).map(|log| log.iter().cloned().collect()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn messages_are_scoped_per_session() {
        let store = ChatStore::new();
        store.add_message("s1", ChatMessage::new("u1", "hi", 0.0)).await;
        store.add_message("s2", ChatMessage::new("u2", "hey", 1.0)).await;
        assert_eq!(store.messages("s1").await.len(), 1);
        assert_eq!(store.messages("s2").await.len(), 1);
    }

    #[tokio::test]
    async fn chat_history_is_bounded_per_session() {
        let store = ChatStore::new();
        for i in 0..(CHAT_HISTORY_DEPTH + 3) {
            store.add_message("s1", ChatMessage::new("u1", format!("msg {i}"), i as f64)).await;
        }
        let messages = store.messages("s1").await;
        assert_eq!(messages.len(), CHAT_HISTORY_DEPTH);
        assert_eq!(messages[0].text, "msg 3");
    }
}
