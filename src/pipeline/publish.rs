//! Payload classification and fan-out to subscriber queues.
//!
//! For every bus message: check the topic against the subscription
//! manager, classify the payload, and enqueue the resulting
//! [`ChannelMessage`] on every matched queue. Classification and
//! serialization are skipped entirely when nothing matches.

use crate::pipeline::event::Event;
use crate::submgr::{ChannelMessage, SubscriptionManager};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Event type tag for payloads that validate as event envelopes.
pub const EVENT_TYPE_EDGEX: &str = "edgex";

/// JSON content type expected from the bus.
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Pipeline stage that fans bus messages out to subscriber queues.
pub struct Processor {
    subscriptions: Arc<SubscriptionManager>,
    warned_about_json: AtomicBool,
}

impl Processor {
    pub fn new(subscriptions: Arc<SubscriptionManager>) -> Self {
        Self {
            subscriptions,
            warned_about_json: AtomicBool::new(false),
        }
    }

    /// Handle one raw bus message. Returns the number of queues the
    /// message was delivered to.
    pub async fn publish_raw(&self, topic: &str, payload: &[u8], content_type: &str) -> usize {
        if !content_type.is_empty()
            && content_type != CONTENT_TYPE_JSON
            && !self.warned_about_json.swap(true, Ordering::Relaxed)
        {
            tracing::warn!(
                content_type,
                "bus messages have an unexpected content type, treating as JSON"
            );
        }
        let channels = self.subscriptions.subscribed_channels(topic);
        tracing::trace!(topic, matches = channels.len(), "message received");
        // Rather likely nobody is subscribed to this; don't bother
        // parsing or classifying.
        if channels.is_empty() {
            return 0;
        }
        let data: serde_json::Value = match serde_json::from_slice(payload) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(topic, error = %err, "dropping unparseable payload");
                return 0;
            }
        };
        deliver(&channels, classify(&data)).await
    }

    /// Handle one already-decoded bus message.
    pub async fn publish(&self, topic: &str, data: &serde_json::Value) -> usize {
        let channels = self.subscriptions.subscribed_channels(topic);
        tracing::trace!(topic, matches = channels.len(), "message received");
        if channels.is_empty() {
            return 0;
        }
        deliver(&channels, classify(data)).await
    }
}

async fn deliver(
    channels: &[tokio::sync::mpsc::Sender<ChannelMessage>],
    msg: ChannelMessage,
) -> usize {
    let mut delivered = 0;
    for ch in channels {
        // A send failure means the subscription was deleted after
        // matching; nothing to do for that subscriber.
        if ch.send(msg.clone()).await.is_ok() {
            delivered += 1;
        }
    }
    delivered
}

/// Decide how a payload should appear on the SSE stream.
///
/// An `event` member whose inner object validates as an [`Event`] wins
/// and is re-serialized on its own; a payload that itself validates is
/// passed through as-is; anything else goes out untagged.
fn classify(data: &serde_json::Value) -> ChannelMessage {
    if let Some(inner) = data.get("event") {
        if let Ok(event) = serde_json::from_value::<Event>(inner.clone()) {
            if event.is_valid() {
                return ChannelMessage {
                    event_type: EVENT_TYPE_EDGEX.to_string(),
                    payload: inner.to_string(),
                };
            }
        }
    }
    if data.get("readings").is_some() {
        if let Ok(event) = serde_json::from_value::<Event>(data.clone()) {
            if event.is_valid() {
                return ChannelMessage {
                    event_type: EVENT_TYPE_EDGEX.to_string(),
                    payload: data.to_string(),
                };
            }
        }
    }
    ChannelMessage {
        event_type: String::new(),
        payload: data.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::submgr::Limits;
    use std::time::Duration;

    fn test_manager() -> Arc<SubscriptionManager> {
        SubscriptionManager::new(Limits {
            subscription_limit: 10,
            include_exclude_limit: 10,
            queue_capacity: 16,
            idle_expiration: Duration::from_secs(60),
            check_interval: Duration::from_secs(5),
        })
    }

    fn valid_event() -> serde_json::Value {
        serde_json::json!({
            "apiVersion": "v3",
            "id": "7a1707f0-166c-4683-8a7c-26ea03442bf3",
            "deviceName": "Device1",
            "profileName": "Profile1",
            "sourceName": "Resource1",
            "origin": 1_723_012_345_000_000_000_i64,
            "readings": [{
                "origin": 1_723_012_345_000_000_000_i64,
                "deviceName": "Device1",
                "resourceName": "Resource1",
                "profileName": "Profile1",
                "valueType": "Int64",
                "value": "42"
            }]
        })
    }

    #[test]
    fn classify_unwraps_add_event_requests() {
        let request = serde_json::json!({
            "apiVersion": "v3",
            "event": valid_event()
        });
        let msg = classify(&request);
        assert_eq!(msg.event_type, EVENT_TYPE_EDGEX);
        // The inner event is re-serialized on its own.
        let round: serde_json::Value = serde_json::from_str(&msg.payload).unwrap();
        assert_eq!(round["deviceName"], "Device1");
        assert!(round.get("event").is_none());
    }

    #[test]
    fn classify_passes_bare_events_through() {
        let msg = classify(&valid_event());
        assert_eq!(msg.event_type, EVENT_TYPE_EDGEX);
        let round: serde_json::Value = serde_json::from_str(&msg.payload).unwrap();
        assert_eq!(round["readings"][0]["valueType"], "Int64");
    }

    #[test]
    fn classify_leaves_foreign_payloads_untagged() {
        let msg = classify(&serde_json::json!({"status": "up"}));
        assert_eq!(msg.event_type, "");
        assert_eq!(msg.payload, r#"{"status":"up"}"#);

        // Has readings but fails validation.
        let msg = classify(&serde_json::json!({"readings": []}));
        assert_eq!(msg.event_type, "");
    }

    #[tokio::test]
    async fn publish_short_circuits_without_subscribers() {
        let processor = Processor::new(test_manager());
        assert_eq!(processor.publish("any/topic", &valid_event()).await, 0);
    }

    #[tokio::test]
    async fn publish_raw_drops_unparseable_payloads() {
        let mgr = test_manager();
        let id = mgr.new_subscription().unwrap();
        let sub = mgr.lookup(&id).unwrap();
        mgr.include(&sub, "").unwrap();
        mgr.set_active(&sub, true);
        let processor = Processor::new(Arc::clone(&mgr));
        assert_eq!(
            processor
                .publish_raw("a/b", b"not json", CONTENT_TYPE_JSON)
                .await,
            0
        );
    }

    #[tokio::test]
    async fn publish_delivers_to_matching_queues() {
        let mgr = test_manager();
        let id = mgr.new_subscription().unwrap();
        let sub = mgr.lookup(&id).unwrap();
        mgr.include(&sub, "edgex/events").unwrap();
        let mut stream = mgr.attach_stream(&sub).unwrap();
        let processor = Processor::new(Arc::clone(&mgr));

        let delivered = processor
            .publish("edgex/events/device/Profile1/Device1/Resource1", &valid_event())
            .await;
        assert_eq!(delivered, 1);
        let msg = stream.recv().await.unwrap();
        assert_eq!(msg.event_type, EVENT_TYPE_EDGEX);
    }
}
