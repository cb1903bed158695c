// ── Last-known values ──
//
// Answers `:get` commands from the most recent value event instead of
// asking the device again. Entries are overwritten, never expired.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

/// Payload of a value event as sent to the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueRecord {
    pub value: serde_json::Value,
    #[serde(rename = "lastUpdate")]
    pub last_update: i64,
}

/// Concurrent `{deviceId}-{serviceId}` -> [`ValueRecord`] map. Ids are the
/// gateway-facing ones, prefix and `:get` suffix included.
#[derive(Default)]
pub struct ValueStore {
    records: DashMap<String, ValueRecord>,
}

impl ValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save(&self, device_id: &str, service_id: &str, record: ValueRecord) {
        self.records.insert(record_key(device_id, service_id), record);
    }

    pub fn get(&self, device_id: &str, service_id: &str) -> Option<ValueRecord> {
        self.records
            .get(&record_key(device_id, service_id))
            .map(|r| r.value().clone())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn record_key(device_id: &str, service_id: &str) -> String {
    format!("{device_id}-{service_id}")
}
