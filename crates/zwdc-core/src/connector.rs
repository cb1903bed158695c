// ── Connector ──
//
// Service object tying the cache, registry and value store to the
// gateway and the Z-Wave controller. Adapters push normalized events into
// an mpsc channel consumed by `run`; the periodic device-info request runs
// in `run_update_loop`. Both stop when their `CancellationToken` fires.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use strum::Display;
use tokio::sync::{Notify, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use zwdc_api::{AccessTokenSource, CatalogClient};

use crate::config::ConnectorConfig;
use crate::definition::build_definition;
use crate::devicetypes::DeviceTypeCache;
use crate::error::CoreError;
use crate::fallback::FallbackStore;
use crate::gateway::{Gateway, ZwaveController};
use crate::local_id;
use crate::model::{
    Command, DeviceIdScheme, DeviceInfo, DeviceState, NodeValue, STATISTICS_SERVICE,
    classify_nodes, is_get_service,
};
use crate::registry::{DeviceRegistry, RegistryEntry};
use crate::values::{ValueRecord, ValueStore};

// ── Resolution result ────────────────────────────────────────────────

/// Where a device-type id came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum TypeSource {
    NodeOverwrite,
    StaticMapping,
    CacheHit,
    /// Found in a list loaded from the fallback store.
    Fallback,
    Created,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedType {
    pub type_id: String,
    pub source: TypeSource,
}

// ── Events ───────────────────────────────────────────────────────────

/// One discovery pass as reported by a controller adapter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiscoveryBatch {
    /// Fully identified nodes.
    pub nodes: Vec<DeviceInfo>,
    pub husk_ids: Vec<i64>,
    /// Forward each node's values as events after registering it.
    pub with_values: bool,
    /// `nodes` is the complete node list; anything else is missing.
    pub all_known: bool,
}

impl DiscoveryBatch {
    /// Build a batch from an unfiltered node list.
    pub fn from_nodes(
        nodes: impl IntoIterator<Item = DeviceInfo>,
        with_values: bool,
        all_known: bool,
    ) -> Self {
        let classified = classify_nodes(nodes);
        Self {
            nodes: classified.devices,
            husk_ids: classified.husk_ids,
            with_values,
            all_known,
        }
    }
}

/// Inbound events consumed by [`Connector::run`].
#[derive(Debug, Clone)]
pub enum ControllerEvent {
    DevicesDiscovered(DiscoveryBatch),
    ValueChanged(NodeValue),
    AvailabilityChanged {
        node_id: i64,
        online: bool,
    },
    Command {
        device_id: String,
        service_id: String,
        command: Command,
    },
    /// The gateway asked for a fresh device list.
    RefreshRequested,
}

// ── Connector ────────────────────────────────────────────────────────

struct ConnectorInner {
    config: ConnectorConfig,
    ids: DeviceIdScheme,
    cache: Arc<DeviceTypeCache>,
    registry: DeviceRegistry,
    values: ValueStore,
    gateway: Arc<dyn Gateway>,
    controller: Arc<dyn ZwaveController>,
    update_reset: Notify,
}

/// Cheaply cloneable handle to the connector service.
#[derive(Clone)]
pub struct Connector {
    inner: Arc<ConnectorInner>,
}

impl Connector {
    pub fn new(
        config: ConnectorConfig,
        cache: Arc<DeviceTypeCache>,
        gateway: Arc<dyn Gateway>,
        controller: Arc<dyn ZwaveController>,
    ) -> Self {
        let ids = DeviceIdScheme::new(config.device_id_prefix.clone());
        let registry = DeviceRegistry::new(Arc::clone(&gateway), ids.clone(), config.registry);
        Self {
            inner: Arc::new(ConnectorInner {
                config,
                ids,
                cache,
                registry,
                values: ValueStore::new(),
                gateway,
                controller,
                update_reset: Notify::new(),
            }),
        }
    }

    /// Open the fallback store and assemble the device-type cache from
    /// `config`, then build the connector around it.
    pub fn build(
        config: ConnectorConfig,
        catalog: CatalogClient,
        auth: Arc<dyn AccessTokenSource>,
        gateway: Arc<dyn Gateway>,
        controller: Arc<dyn ZwaveController>,
    ) -> Result<Self, CoreError> {
        let fallback = FallbackStore::open(&config.fallback_file)?;
        let cache = Arc::new(DeviceTypeCache::new(
            catalog,
            auth,
            fallback,
            config.cache.clone(),
        ));
        Ok(Self::new(config, cache, gateway, controller))
    }

    pub fn config(&self) -> &ConnectorConfig {
        &self.inner.config
    }

    pub fn device_ids(&self) -> &DeviceIdScheme {
        &self.inner.ids
    }

    pub fn cache(&self) -> &DeviceTypeCache {
        &self.inner.cache
    }

    pub fn registry(&self) -> &DeviceRegistry {
        &self.inner.registry
    }

    pub fn values(&self) -> &ValueStore {
        &self.inner.values
    }

    // ── Type provisioning ────────────────────────────────────────────

    /// Resolve the catalog type for `node`: node overwrite, then static
    /// mapping, then the catalog. An unknown key is created in the catalog
    /// when enabled, unless the cache is running on fallback data.
    pub async fn provide_device_type(
        &self,
        node: &DeviceInfo,
    ) -> Result<ResolvedType, CoreError> {
        let config = &self.inner.config;

        if let Some(type_id) = config
            .node_device_type_overwrite
            .get(&node.node_id.to_string())
        {
            return Ok(ResolvedType {
                type_id: type_id.clone(),
                source: TypeSource::NodeOverwrite,
            });
        }

        let key = node.type_mapping_key();
        if let Some(type_id) = config.device_type_mapping.get(&key) {
            return Ok(ResolvedType {
                type_id: type_id.clone(),
                source: TypeSource::StaticMapping,
            });
        }

        match self.inner.cache.resolve(&key).await {
            Ok(found) => Ok(ResolvedType {
                type_id: found.type_id,
                source: if found.used_fallback {
                    TypeSource::Fallback
                } else {
                    TypeSource::CacheHit
                },
            }),
            Err(CoreError::NoMatchingDeviceType { used_fallback, .. })
                if !used_fallback && config.create_missing_device_types =>
            {
                info!(key = %key, node_id = node.node_id, "creating missing device type");
                let definition = build_definition(node, &config.definition);
                let created = self.inner.cache.create_type(&key, &definition).await?;
                Ok(ResolvedType {
                    type_id: created.id,
                    source: TypeSource::Created,
                })
            }
            Err(e) => Err(e),
        }
    }

    // ── Event handling ───────────────────────────────────────────────

    /// Register every resolvable node of `batch`, then reconcile missing
    /// devices and husks. A registration failure is reported to the
    /// gateway and aborts the batch.
    pub async fn on_devices_discovered(&self, batch: DiscoveryBatch) -> Result<(), CoreError> {
        let mut current = HashSet::new();

        for node in &batch.nodes {
            let device_id = self.inner.ids.device_id(node.node_id);
            let resolved = match self.provide_device_type(node).await {
                Ok(resolved) => resolved,
                Err(e) => {
                    warn!(
                        device_id = %device_id,
                        error = %e,
                        "unable to create device info for node"
                    );
                    continue;
                }
            };
            debug!(
                device_id = %device_id,
                type_id = %resolved.type_id,
                source = %resolved.source,
                "device type resolved"
            );

            let entry = RegistryEntry {
                name: node.display_name(),
                state: DeviceState::Online,
                device_type: resolved.type_id,
            };
            if let Err(e) = self.inner.registry.register(&device_id, entry).await {
                self.inner
                    .gateway
                    .send_client_error(&format!("unable to register device: {e}"))
                    .await;
                return Err(e);
            }
            current.insert(device_id);

            if batch.with_values {
                for value in node.values.values() {
                    self.on_value_changed(value.clone()).await;
                }
            }
            self.send_statistics(node).await;
        }

        let handled = if batch.all_known {
            self.inner.registry.reconcile_full_snapshot(&current).await
        } else {
            HashSet::new()
        };
        if let Err(e) = self
            .inner
            .registry
            .reconcile_husks(&batch.husk_ids, &handled)
            .await
        {
            warn!(error = %e, "husk cleanup incomplete");
        }
        Ok(())
    }

    /// Store a value event and forward it to the gateway. Events for
    /// unregistered devices are dropped unless configured otherwise.
    pub async fn on_value_changed(&self, value: NodeValue) {
        let device_id = self.inner.ids.device_id(value.node_id);
        let service_id = value.service_id(true);

        if !self.should_forward(&device_id) {
            debug!(device_id = %device_id, "ignoring event for unregistered device");
            return;
        }

        let record = ValueRecord {
            value: value.value,
            last_update: value.last_update,
        };
        let payload = match serde_json::to_value(&record) {
            Ok(payload) => payload,
            Err(e) => {
                error!(device_id = %device_id, error = %e, "unable to encode value event");
                return;
            }
        };
        self.inner.values.save(&device_id, &service_id, record);

        if let Err(e) = self
            .inner
            .gateway
            .send_event(&device_id, &service_id, &payload)
            .await
        {
            error!(
                device_id = %device_id,
                service_id = %service_id,
                error = %e,
                "unable to send event"
            );
            self.inner
                .gateway
                .send_client_error(&format!("unable to send event: {e}"))
                .await;
        }
    }

    fn should_forward(&self, device_id: &str) -> bool {
        self.inner.config.events_for_unregistered_devices
            || self.inner.registry.contains(device_id)
    }

    async fn send_statistics(&self, node: &DeviceInfo) {
        let device_id = self.inner.ids.device_id(node.node_id);
        if let Err(e) = self
            .inner
            .gateway
            .send_event(&device_id, STATISTICS_SERVICE, &node.statistics)
            .await
        {
            error!(device_id = %device_id, error = %e, "unable to send statistics");
            self.inner
                .gateway
                .send_client_error(&format!("unable to send event: {e}"))
                .await;
        }
    }

    pub async fn on_availability_changed(
        &self,
        node_id: i64,
        online: bool,
    ) -> Result<(), CoreError> {
        self.inner.registry.set_state(node_id, online).await
    }

    /// Answer a gateway command. `:get` services are served from the value
    /// store; every other service is written through to the controller.
    pub async fn handle_command(&self, device_id: &str, service_id: &str, command: Command) {
        let result = if is_get_service(service_id) {
            self.handle_get(device_id, service_id, &command).await
        } else {
            self.handle_set(device_id, service_id, &command).await
        };
        if let Err(message) = result {
            warn!(device_id, service_id, command_id = %command.command_id, "{message}");
            self.inner
                .gateway
                .send_command_error(&command.command_id, &message)
                .await;
        }
    }

    async fn handle_get(
        &self,
        device_id: &str,
        service_id: &str,
        command: &Command,
    ) -> Result<(), String> {
        let Some(record) = self.inner.values.get(device_id, service_id) else {
            return Err("no value saved to send as response".into());
        };
        let data = serde_json::to_string(&record)
            .map_err(|e| format!("unable to marshal saved value to send as response: {e}"))?;
        let response = Command {
            command_id: command.command_id.clone(),
            data,
        };
        self.respond(device_id, service_id, &response).await
    }

    async fn handle_set(
        &self,
        device_id: &str,
        service_id: &str,
        command: &Command,
    ) -> Result<(), String> {
        let value_id = format!(
            "{}-{}",
            self.inner.ids.node_part(device_id),
            local_id::decode(service_id)
        );
        let value = command_value(&command.data).map_err(|e| e.to_string())?;
        self.inner
            .controller
            .set_value_by_value_id(&value_id, value)
            .await
            .map_err(|e| format!("unable to send value to controller: {e}"))?;

        let response = Command {
            command_id: command.command_id.clone(),
            data: String::new(),
        };
        self.respond(device_id, service_id, &response).await
    }

    async fn respond(
        &self,
        device_id: &str,
        service_id: &str,
        response: &Command,
    ) -> Result<(), String> {
        self.inner
            .gateway
            .respond(device_id, service_id, response)
            .await
            .map_err(|e| format!("unable to send response to gateway: {e}"))
    }

    /// Dispatch one inbound event.
    pub async fn dispatch(&self, event: ControllerEvent) {
        match event {
            ControllerEvent::DevicesDiscovered(batch) => {
                if let Err(e) = self.on_devices_discovered(batch).await {
                    error!(error = %e, "device discovery aborted");
                }
            }
            ControllerEvent::ValueChanged(value) => self.on_value_changed(value).await,
            ControllerEvent::AvailabilityChanged { node_id, online } => {
                if let Err(e) = self.on_availability_changed(node_id, online).await {
                    warn!(node_id, online, error = %e, "unable to update device state");
                }
            }
            ControllerEvent::Command {
                device_id,
                service_id,
                command,
            } => self.handle_command(&device_id, &service_id, command).await,
            ControllerEvent::RefreshRequested => self.notify_refresh().await,
        }
    }

    // ── Background tasks ─────────────────────────────────────────────

    /// Consume events until `cancel` fires or every sender is dropped.
    pub async fn run(
        &self,
        mut events: mpsc::Receiver<ControllerEvent>,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                event = events.recv() => {
                    let Some(event) = event else { break };
                    self.dispatch(event).await;
                }
            }
        }
        debug!("event loop stopped");
    }

    /// Ask the controller for a device-info update now and restart the
    /// periodic timer.
    pub async fn notify_refresh(&self) {
        if let Err(e) = self.inner.controller.request_device_info_update().await {
            error!(error = %e, "device info update request failed");
            self.inner.gateway.send_client_error(&e.to_string()).await;
        }
        self.inner.update_reset.notify_one();
    }

    /// Request a device-info update every `period` until cancelled. A
    /// [`notify_refresh`](Self::notify_refresh) restarts the period.
    /// A zero period disables the loop.
    pub async fn run_update_loop(&self, period: Duration, cancel: CancellationToken) {
        if period.is_zero() {
            warn!("update period is zero, periodic update requests disabled");
            return;
        }
        let mut interval = tokio::time::interval(period);
        interval.tick().await; // consume the immediate first tick

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                () = self.inner.update_reset.notified() => interval.reset(),
                _ = interval.tick() => {
                    if let Err(e) = self.inner.controller.request_device_info_update().await {
                        warn!(error = %e, "periodic update request failed");
                    }
                }
            }
        }
    }

    /// Issue the initial device-info request and spawn the delayed initial
    /// request and, when configured, the periodic update loop.
    pub async fn start(&self, cancel: &CancellationToken) -> Vec<JoinHandle<()>> {
        match self.inner.controller.request_device_info_update().await {
            Ok(()) => info!("initial update request sent"),
            Err(e) => warn!(error = %e, "initial update request failed"),
        }

        let mut handles = Vec::new();

        let delayed = self.clone();
        let delay = self.inner.config.initial_update_request_delay;
        let token = cancel.child_token();
        handles.push(tokio::spawn(async move {
            tokio::select! {
                biased;
                () = token.cancelled() => {}
                () = tokio::time::sleep(delay) => {
                    match delayed.inner.controller.request_device_info_update().await {
                        Ok(()) => info!("delayed initial update request sent"),
                        Err(e) => warn!(error = %e, "delayed initial update request failed"),
                    }
                }
            }
        }));

        if let Some(period) = self.inner.config.update_period.filter(|p| !p.is_zero()) {
            let periodic = self.clone();
            let token = cancel.child_token();
            handles.push(tokio::spawn(async move {
                periodic.run_update_loop(period, token).await;
            }));
        }

        handles
    }
}

/// Decode the JSON value carried by a set command.
fn command_value(data: &str) -> Result<serde_json::Value, CoreError> {
    serde_json::from_str(data).map_err(|e| CoreError::InvalidPayload {
        message: format!("unable to parse command data as value: {e}"),
    })
}
