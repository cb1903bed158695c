// Shared test doubles for the connector integration tests.
#![allow(dead_code, clippy::unwrap_used)]

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use url::Url;

use zwdc_api::{CatalogClient, StaticToken};
use zwdc_core::devicetypes::{ATTRIBUTE_TYPE_MAPPING_KEY, ATTRIBUTE_USED_FOR_ZWAVE};
use zwdc_core::{
    CacheConfig, Command, CoreError, DeviceInfo, DeviceTypeCache, FallbackStore, Gateway,
    RegistryEntry, ZwaveController,
};

// ── Gateway double ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum GatewayCall {
    SetDevice(String, RegistryEntry),
    RemoveDevice(String),
    Listen(String),
    StopListen(String),
    Event(String, String, serde_json::Value),
    Respond(String, String, Command),
    CommandError(String, String),
    ClientError(String),
}

/// Records every gateway call; selected device ids can be made to fail.
#[derive(Default)]
pub struct RecordingGateway {
    calls: Mutex<Vec<GatewayCall>>,
    fail_set_device: Mutex<HashSet<String>>,
    fail_remove: Mutex<HashSet<String>>,
    remove_gate: Mutex<Option<(String, Arc<tokio::sync::Semaphore>)>>,
}

impl RecordingGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn fail_set_device(&self, device_id: &str) {
        self.fail_set_device
            .lock()
            .unwrap()
            .insert(device_id.to_owned());
    }

    pub fn fail_remove(&self, device_id: &str) {
        self.fail_remove.lock().unwrap().insert(device_id.to_owned());
    }

    /// Hold `remove_device(device_id)` until a permit is added to the
    /// returned semaphore.
    pub fn gate_remove(&self, device_id: &str) -> Arc<tokio::sync::Semaphore> {
        let gate = Arc::new(tokio::sync::Semaphore::new(0));
        *self.remove_gate.lock().unwrap() = Some((device_id.to_owned(), Arc::clone(&gate)));
        gate
    }

    pub fn removed(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                GatewayCall::RemoveDevice(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn client_errors(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                GatewayCall::ClientError(msg) => Some(msg),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: GatewayCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Gateway for RecordingGateway {
    async fn set_device(&self, device_id: &str, entry: &RegistryEntry) -> Result<(), CoreError> {
        if self.fail_set_device.lock().unwrap().contains(device_id) {
            return Err(CoreError::gateway("publish rejected"));
        }
        self.record(GatewayCall::SetDevice(device_id.into(), entry.clone()));
        Ok(())
    }

    async fn remove_device(&self, device_id: &str) -> Result<(), CoreError> {
        let gate = self
            .remove_gate
            .lock()
            .unwrap()
            .as_ref()
            .filter(|(id, _)| id == device_id)
            .map(|(_, gate)| Arc::clone(gate));
        if let Some(gate) = gate {
            let _permit = gate.acquire().await.unwrap();
        }
        if self.fail_remove.lock().unwrap().contains(device_id) {
            return Err(CoreError::gateway("remove rejected"));
        }
        self.record(GatewayCall::RemoveDevice(device_id.into()));
        Ok(())
    }

    async fn listen_to_device_commands(&self, device_id: &str) -> Result<(), CoreError> {
        self.record(GatewayCall::Listen(device_id.into()));
        Ok(())
    }

    async fn stop_listen_to_device_commands(&self, device_id: &str) -> Result<(), CoreError> {
        self.record(GatewayCall::StopListen(device_id.into()));
        Ok(())
    }

    async fn send_event(
        &self,
        device_id: &str,
        service_id: &str,
        payload: &serde_json::Value,
    ) -> Result<(), CoreError> {
        self.record(GatewayCall::Event(
            device_id.into(),
            service_id.into(),
            payload.clone(),
        ));
        Ok(())
    }

    async fn respond(
        &self,
        device_id: &str,
        service_id: &str,
        response: &Command,
    ) -> Result<(), CoreError> {
        self.record(GatewayCall::Respond(
            device_id.into(),
            service_id.into(),
            response.clone(),
        ));
        Ok(())
    }

    async fn send_command_error(&self, command_id: &str, message: &str) {
        self.record(GatewayCall::CommandError(command_id.into(), message.into()));
    }

    async fn send_client_error(&self, message: &str) {
        self.record(GatewayCall::ClientError(message.into()));
    }
}

// ── Controller double ───────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingController {
    pub update_requests: Mutex<usize>,
    pub writes: Mutex<Vec<(String, serde_json::Value)>>,
    pub fail_updates: bool,
}

impl RecordingController {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail_updates: true,
            ..Self::default()
        })
    }

    pub fn update_requests(&self) -> usize {
        *self.update_requests.lock().unwrap()
    }

    pub fn writes(&self) -> Vec<(String, serde_json::Value)> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl ZwaveController for RecordingController {
    async fn request_device_info_update(&self) -> Result<(), CoreError> {
        *self.update_requests.lock().unwrap() += 1;
        if self.fail_updates {
            return Err(CoreError::controller("broker unavailable"));
        }
        Ok(())
    }

    async fn set_value_by_value_id(
        &self,
        value_id: &str,
        value: serde_json::Value,
    ) -> Result<(), CoreError> {
        self.writes.lock().unwrap().push((value_id.into(), value));
        Ok(())
    }
}

// ── Catalog fixtures ────────────────────────────────────────────────

pub fn fast_cache_config() -> CacheConfig {
    CacheConfig {
        min_cache_duration: Duration::from_millis(100),
        max_cache_duration: Duration::from_secs(60),
        page_size: 0,
        creation_settle_delay: Duration::ZERO,
    }
}

pub fn cache_for(catalog_url: &str, fallback_file: &Path, config: CacheConfig) -> DeviceTypeCache {
    let url = Url::parse(catalog_url).unwrap();
    let catalog = CatalogClient::with_client(reqwest::Client::new(), url.clone(), url);
    DeviceTypeCache::new(
        catalog,
        Arc::new(StaticToken("Bearer test".into())),
        FallbackStore::open(fallback_file).unwrap(),
        config,
    )
}

pub fn device_type_json(id: &str, key: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": format!("type {id}"),
        "attributes": [
            { "key": ATTRIBUTE_USED_FOR_ZWAVE, "value": "true" },
            { "key": ATTRIBUTE_TYPE_MAPPING_KEY, "value": key }
        ]
    })
}

pub fn danfoss() -> DeviceInfo {
    DeviceInfo {
        node_id: 5,
        manufacturer: "Danfoss".into(),
        manufacturer_id: "0x0002".into(),
        product: "Thermostat".into(),
        product_type: "0x0005".into(),
        product_id: "0x0175".into(),
        ..DeviceInfo::default()
    }
}

pub const DANFOSS_KEY: &str = "0x0002.0x0005.0x0175";
