//! Fan-out of replicated state changes (§4.6 "the server broadcasts
//! confirmed mutations to every other connected client"). `/messages` is a
//! one-shot POST per envelope rather than a held connection, so a session
//! observes other clients' mutations by subscribing to this channel and
//! filtering out its own `client_id` — it is not an echo back to the caller.

use tokio::sync::broadcast;

use vtt_core::types::Message;

const CHANNEL_CAPACITY: usize = 256;

pub struct Broadcaster {
    sender: broadcast::Sender<Message>,
}

impl Broadcaster {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Broadcaster { sender }
    }

    /// Fans `message` out to every current subscriber. A lagging or absent
    /// subscriber is not an error here — `send` only fails when nobody is
    /// subscribed at all, which is the normal state between test runs.
    pub fn publish(&self, message: Message) {
        let _ = self.sender.send(message);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Message> {
        self.sender.subscribe()
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Broadcaster::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use vtt_core::types::MessageType;

    #[tokio::test]
    async fn a_published_message_reaches_every_subscriber() {
        let broadcaster = Broadcaster::new();
        let mut a = broadcaster.subscribe();
        let mut b = broadcaster.subscribe();
        broadcaster.publish(Message::new(MessageType::SpriteMove, json!({"sprite_id": "s1"}), "client-a", 0.0));
        assert_eq!(a.recv().await.unwrap().client_id, "client-a");
        assert_eq!(b.recv().await.unwrap().client_id, "client-a");
    }

    #[tokio::test]
    async fn a_subscriber_can_filter_out_its_own_client_id() {
        let broadcaster = Broadcaster::new();
        let mut receiver = broadcaster.subscribe();
        broadcaster.publish(Message::new(MessageType::SpriteMove, json!({}), "self", 0.0));
        broadcaster.publish(Message::new(MessageType::SpriteMove, json!({}), "other", 0.0));
        let from_others: Vec<Message> = std::iter::from_fn(|| receiver.try_recv().ok()).filter(|m| m.client_id != "self").collect();
        assert_eq!(from_others.len(), 1);
        assert_eq!(from_others[0].client_id, "other");
    }
}
