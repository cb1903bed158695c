// ── Connector configuration ──
//
// Everything the core needs, already validated. Building it from files
// and environment variables is `zwdc-config`'s job.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::definition::DefinitionSettings;
use crate::devicetypes::CacheConfig;
use crate::registry::RegistryPolicy;

#[derive(Debug, Clone)]
pub struct ConnectorConfig {
    /// Prefix of every gateway device id (`{prefix}:{nodeId}`).
    pub device_id_prefix: String,
    /// Type mapping key -> catalog type id, consulted before the catalog.
    pub device_type_mapping: HashMap<String, String>,
    /// Node id (as string) -> catalog type id, consulted first.
    pub node_device_type_overwrite: HashMap<String, String>,
    /// Create catalog types for unknown nodes (never while on fallback data).
    pub create_missing_device_types: bool,
    pub definition: DefinitionSettings,
    pub registry: RegistryPolicy,
    /// Forward value events for devices that are not registered.
    pub events_for_unregistered_devices: bool,
    /// Period of the device-info update request; `None` disables it.
    pub update_period: Option<Duration>,
    pub initial_update_request_delay: Duration,
    pub cache: CacheConfig,
    pub fallback_file: PathBuf,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            device_id_prefix: "zwave".into(),
            device_type_mapping: HashMap::new(),
            node_device_type_overwrite: HashMap::new(),
            create_missing_device_types: false,
            definition: DefinitionSettings::default(),
            registry: RegistryPolicy::default(),
            events_for_unregistered_devices: false,
            update_period: None,
            initial_update_request_delay: Duration::from_secs(60),
            cache: CacheConfig::default(),
            fallback_file: PathBuf::from("fallback.json"),
        }
    }
}
