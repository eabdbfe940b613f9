//! Configuration parsing and validation.
//!
//! Loaded from a TOML file with an `[sse]` section for the gateway
//! proper and a `[bus]` section for the message-bus connection.
//! Durations are human strings ("1m", "5s") and are validated before
//! the runtime starts.

use crate::submgr::Limits;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::net::{IpAddr, ToSocketAddrs};
use std::path::Path;
use std::time::Duration;

fn default_log_level() -> String {
    "info".to_string()
}

fn default_subscription_limit() -> u32 {
    50
}

fn default_prefixes_limit() -> usize {
    100
}

fn default_event_buffer() -> usize {
    100
}

fn default_api_addr() -> String {
    "127.0.0.1".to_string()
}

fn default_api_port() -> u16 {
    59_747
}

fn default_api_request_timeout() -> String {
    "15s".to_string()
}

fn default_events_addr() -> String {
    "127.0.0.1".to_string()
}

fn default_events_port() -> u16 {
    59_748
}

fn default_idle_expiration() -> String {
    "1m".to_string()
}

fn default_check_interval() -> String {
    "5s".to_string()
}

fn default_bus_host() -> String {
    "127.0.0.1".to_string()
}

fn default_bus_port() -> u16 {
    1883
}

fn default_bus_client_id() -> String {
    "fanout".to_string()
}

fn default_bus_topic_filter() -> String {
    "edgex/events/#".to_string()
}

fn default_true() -> bool {
    true
}

/// Top-level configuration for the gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub sse: SseConfig,
    #[serde(default)]
    pub bus: BusConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            sse: SseConfig::default(),
            bus: BusConfig::default(),
        }
    }
}

/// The `[sse]` section: subscription limits, listener binds, and
/// idle-expiration timing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SseConfig {
    /// Limit on the number of simultaneous subscriptions.
    #[serde(default = "default_subscription_limit")]
    pub subscription_limit: u32,
    /// Limit on entries in each subscription's include and exclude
    /// lists; the limit applies separately to each list.
    #[serde(default = "default_prefixes_limit")]
    pub prefixes_limit: usize,
    /// Messages buffered per subscription. A balance between memory
    /// usage and blocking at high event volumes.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
    /// Bind address of the management listener.
    #[serde(default = "default_api_addr")]
    pub api_addr: String,
    #[serde(default = "default_api_port")]
    pub api_port: u16,
    /// Per-request timeout on the management listener. The streaming
    /// listener never times out.
    #[serde(default = "default_api_request_timeout")]
    pub api_request_timeout: String,
    /// Bind address of the SSE streaming listener.
    #[serde(default = "default_events_addr")]
    pub events_addr: String,
    #[serde(default = "default_events_port")]
    pub events_port: u16,
    /// How long a subscription may have nobody listening before it is
    /// auto-deleted.
    #[serde(default = "default_idle_expiration")]
    pub subscription_idle_expiration: String,
    /// How often to check for auto-deletion.
    #[serde(default = "default_check_interval")]
    pub subscription_expiration_check_interval: String,
}

impl Default for SseConfig {
    fn default() -> Self {
        Self {
            subscription_limit: default_subscription_limit(),
            prefixes_limit: default_prefixes_limit(),
            event_buffer: default_event_buffer(),
            api_addr: default_api_addr(),
            api_port: default_api_port(),
            api_request_timeout: default_api_request_timeout(),
            events_addr: default_events_addr(),
            events_port: default_events_port(),
            subscription_idle_expiration: default_idle_expiration(),
            subscription_expiration_check_interval: default_check_interval(),
        }
    }
}

/// The `[bus]` section: MQTT message-bus connection.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BusConfig {
    /// Disable to run the gateway without a bus connection, serving
    /// only what the management API is fed by tests or tooling.
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_bus_host")]
    pub host: String,
    #[serde(default = "default_bus_port")]
    pub port: u16,
    #[serde(default = "default_bus_client_id")]
    pub client_id: String,
    /// Topic filter subscribed on the bus.
    #[serde(default = "default_bus_topic_filter")]
    pub topic_filter: String,
    /// Transport prefix stripped from incoming topics before matching.
    #[serde(default)]
    pub strip_prefix: String,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: default_bus_host(),
            port: default_bus_port(),
            client_id: default_bus_client_id(),
            topic_filter: default_bus_topic_filter(),
            strip_prefix: String::new(),
        }
    }
}

fn check_addr(addr: &str, what: &str) -> Result<()> {
    if addr.parse::<IpAddr>().is_ok() {
        return Ok(());
    }
    if (addr, 0u16).to_socket_addrs().is_err() {
        bail!("{what} must be a valid IP address or hostname");
    }
    Ok(())
}

fn check_port(port: u16, what: &str) -> Result<()> {
    if port < 1024 {
        bail!("{what} must be a valid non-reserved TCP port number, 1024-65535");
    }
    Ok(())
}

impl SseConfig {
    pub fn idle_expiration(&self) -> Result<Duration> {
        humantime::parse_duration(&self.subscription_idle_expiration)
            .context("subscription_idle_expiration must be in the form of a duration, e.g. '30s'")
    }

    pub fn check_interval(&self) -> Result<Duration> {
        humantime::parse_duration(&self.subscription_expiration_check_interval).context(
            "subscription_expiration_check_interval must be in the form of a duration, e.g. '30s'",
        )
    }

    pub fn request_timeout(&self) -> Result<Duration> {
        humantime::parse_duration(&self.api_request_timeout)
            .context("api_request_timeout must be in the form of a duration, e.g. '15s'")
    }

    /// The subscription manager knobs carried by this section.
    pub fn limits(&self) -> Result<Limits> {
        Ok(Limits {
            subscription_limit: self.subscription_limit,
            include_exclude_limit: self.prefixes_limit,
            queue_capacity: self.event_buffer,
            idle_expiration: self.idle_expiration()?,
            check_interval: self.check_interval()?,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.event_buffer < 10 {
            bail!("event_buffer must be at least 10 events");
        }
        if self.subscription_limit == 0 || self.prefixes_limit == 0 {
            bail!("limits must be greater than zero");
        }
        check_port(self.events_port, "events_port")?;
        check_port(self.api_port, "api_port")?;
        check_addr(&self.events_addr, "events_addr")?;
        check_addr(&self.api_addr, "api_addr")?;
        let idle = self.idle_expiration()?;
        if idle < Duration::from_secs(5) {
            bail!("subscription_idle_expiration must be at least 5 seconds");
        }
        let interval = self.check_interval()?;
        if interval.is_zero() {
            bail!("subscription_expiration_check_interval must be longer than zero");
        }
        if interval * 2 > idle {
            bail!(
                "subscription_idle_expiration must be at least twice \
                 subscription_expiration_check_interval"
            );
        }
        let timeout = self.request_timeout()?;
        if timeout.is_zero() {
            bail!("api_request_timeout must be longer than zero");
        }
        Ok(())
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.sse.validate()?;
        if self.bus.enabled {
            if self.bus.host.is_empty() {
                bail!("bus host must not be empty");
            }
            if self.bus.topic_filter.is_empty() {
                bail!("bus topic_filter must not be empty");
            }
        }
        Ok(())
    }
}
