//! MQTT bus source.
//!
//! Subscribes to the configured topic filter and hands every publish to
//! the [`Processor`]. Reconnects with exponential backoff and stops when
//! the runtime signals shutdown.

use crate::core::config::BusConfig;
use crate::pipeline::publish::Processor;
use anyhow::{Context, Result};
use rumqttc::{AsyncClient, ConnectionError, Event, Incoming, MqttOptions, QoS};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::sleep;

/// Backoff configuration for reconnection attempts.
struct Backoff {
    current_ms: u64,
    max_ms: u64,
}

impl Backoff {
    fn new() -> Self {
        Self {
            current_ms: 100,
            max_ms: 30_000,
        }
    }

    fn next_delay(&mut self) -> Duration {
        let delay = self.current_ms;
        // Exponential backoff with cap
        self.current_ms = (self.current_ms * 2).min(self.max_ms);
        Duration::from_millis(delay)
    }

    fn reset(&mut self) {
        self.current_ms = 100;
    }
}

/// Strip the transport prefix from an incoming topic, if configured.
fn strip_transport_prefix<'a>(topic: &'a str, prefix: &str) -> &'a str {
    if prefix.is_empty() {
        return topic;
    }
    topic
        .strip_prefix(prefix)
        .map_or(topic, |rest| rest.trim_start_matches('/'))
}

/// Run the bus source until shutdown is signalled.
///
/// The subscription to the topic filter is re-issued on every ConnAck
/// so that broker restarts do not silently drop the feed.
pub async fn run_bus_source(
    config: BusConfig,
    processor: Arc<Processor>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    let mut options = MqttOptions::new(config.client_id.clone(), config.host.clone(), config.port);
    options.set_keep_alive(Duration::from_secs(30));
    let (client, mut eventloop) = AsyncClient::new(options, 64);
    client
        .subscribe(config.topic_filter.clone(), QoS::AtMostOnce)
        .await
        .with_context(|| format!("subscribe to topic filter '{}'", config.topic_filter))?;

    let mut backoff = Backoff::new();
    let mut connected = false;

    loop {
        tokio::select! {
            biased;
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    let _ = client.disconnect().await;
                    break;
                }
            }
            res = eventloop.poll() => {
                match res {
                    Ok(Event::Incoming(Incoming::ConnAck(_))) => {
                        if connected {
                            tracing::info!(host = %config.host, port = config.port, "reconnected to message bus");
                        } else {
                            tracing::info!(host = %config.host, port = config.port, "connected to message bus");
                            connected = true;
                        }
                        backoff.reset();
                        client
                            .subscribe(config.topic_filter.clone(), QoS::AtMostOnce)
                            .await
                            .context("re-subscribe after reconnect")?;
                    }
                    Ok(Event::Incoming(Incoming::Publish(publish))) => {
                        let topic = strip_transport_prefix(&publish.topic, &config.strip_prefix);
                        processor
                            .publish_raw(topic, &publish.payload, super::publish::CONTENT_TYPE_JSON)
                            .await;
                    }
                    Ok(_) => {}
                    Err(ConnectionError::ConnectionRefused(code)) => {
                        anyhow::bail!("message bus connection refused: {code:?}");
                    }
                    Err(err) => {
                        connected = false;
                        let delay = backoff.next_delay();
                        tracing::warn!(
                            error = %err,
                            delay_ms = delay.as_millis() as u64,
                            "message bus connection error; reconnecting"
                        );
                        sleep(delay).await;
                    }
                }
            }
        }
    }
    Ok(())
}
