//! Event envelope DTOs.
//!
//! Mirrors the EdgeX v3 event shape closely enough to recognize a
//! well-formed event and tag it for SSE clients. Anything that fails
//! validation is passed through untagged rather than rejected.

use serde::{Deserialize, Serialize};

/// One reading inside an event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub origin: i64,
    #[serde(default)]
    pub device_name: String,
    #[serde(default)]
    pub resource_name: String,
    #[serde(default)]
    pub profile_name: String,
    #[serde(default)]
    pub value_type: String,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
    #[serde(default)]
    pub binary_value: Option<String>,
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub object_value: Option<serde_json::Value>,
}

/// A device event: metadata plus one or more readings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(default)]
    pub api_version: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub device_name: String,
    #[serde(default)]
    pub profile_name: String,
    #[serde(default)]
    pub source_name: String,
    #[serde(default)]
    pub origin: i64,
    #[serde(default)]
    pub readings: Vec<Reading>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<serde_json::Map<String, serde_json::Value>>,
}

impl Event {
    /// Checks the fields the contract marks required. Returns false for
    /// anything that should not be tagged as an event envelope.
    pub fn is_valid(&self) -> bool {
        if self.device_name.is_empty()
            || self.profile_name.is_empty()
            || self.source_name.is_empty()
            || self.origin == 0
            || self.readings.is_empty()
        {
            return false;
        }
        self.readings.iter().all(Reading::is_valid)
    }
}

impl Reading {
    fn is_valid(&self) -> bool {
        !self.device_name.is_empty()
            && !self.resource_name.is_empty()
            && !self.profile_name.is_empty()
            && !self.value_type.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_event() -> serde_json::Value {
        serde_json::json!({
            "apiVersion": "v3",
            "id": "7a1707f0-166c-4683-8a7c-26ea03442bf3",
            "deviceName": "Device1",
            "profileName": "Profile1",
            "sourceName": "Resource1",
            "origin": 1_723_012_345_000_000_000_i64,
            "readings": [{
                "id": "82eb2e26-0f24-48aa-ae4c-de9dac3fb9bc",
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
    fn well_formed_event_validates() {
        let event: Event = serde_json::from_value(sample_event()).unwrap();
        assert!(event.is_valid());
    }

    #[test]
    fn missing_required_fields_fail_validation() {
        let mut value = sample_event();
        value["deviceName"] = serde_json::json!("");
        let event: Event = serde_json::from_value(value).unwrap();
        assert!(!event.is_valid());

        let mut value = sample_event();
        value["readings"] = serde_json::json!([]);
        let event: Event = serde_json::from_value(value).unwrap();
        assert!(!event.is_valid());
    }

    #[test]
    fn foreign_json_deserializes_but_fails_validation() {
        let event: Event =
            serde_json::from_value(serde_json::json!({"hello": "world"})).unwrap();
        assert!(!event.is_valid());
    }
}
