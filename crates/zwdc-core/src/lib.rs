//! Identity resolution and device lifecycle for the Z-Wave connector.
//!
//! This crate sits between the Z-Wave controller adapters and the gateway
//! publisher. It never speaks MQTT itself; both sides are reached through
//! the traits in [`gateway`].
//!
//! - **[`local_id`]**: reversible escaping of ids used as topic segments.
//!
//! - **[`DeviceTypeCache`]**: catalog device types keyed by type mapping
//!   key, cached with a min/max age policy, mirrored to a
//!   [`FallbackStore`] and extended on demand with
//!   [`create_type`](DeviceTypeCache::create_type).
//!
//! - **[`DeviceRegistry`]**: devices published to the gateway, with
//!   online/offline transitions and missing-device and husk cleanup.
//!
//! - **[`ValueStore`]**: last value per device service, used to answer
//!   `:get` commands.
//!
//! - **[`Connector`]**: the service object that wires these together and
//!   consumes [`ControllerEvent`]s.

pub mod config;
pub mod connector;
pub mod definition;
pub mod devicetypes;
pub mod error;
pub mod fallback;
pub mod gateway;
pub mod local_id;
pub mod model;
pub mod registry;
pub mod values;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::ConnectorConfig;
pub use connector::{Connector, ControllerEvent, DiscoveryBatch, ResolvedType, TypeSource};
pub use definition::{DefinitionSettings, build_definition};
pub use devicetypes::{CacheConfig, CatalogMatch, DeviceTypeCache};
pub use error::CoreError;
pub use fallback::FallbackStore;
pub use gateway::{Gateway, ZwaveController};
pub use model::{Command, DeviceIdScheme, DeviceInfo, DeviceState, NodeValue, classify_nodes};
pub use registry::{DeviceRegistry, MissingDevicePolicy, RegistryEntry, RegistryPolicy};
pub use values::{ValueRecord, ValueStore};
