// ── Domain model ──
//
// Normalized shapes handed to the core by the Z-Wave dialect adapters,
// plus the id composition rules shared by the registry, the value store
// and the command path.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::{debug, warn};

use crate::local_id;

/// Suffix marking the read variant of a value service.
pub const GET_SUFFIX: &str = ":get";

/// Service id of the per-node statistics event.
pub const STATISTICS_SERVICE: &str = "statistics";

/// Node ids reserved for the controller itself.
const RESERVED_NODE_IDS: [i64; 2] = [0, 1];

/// A physical node as reported by the adapter. Immutable per event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceInfo {
    pub node_id: i64,
    pub name: String,
    pub manufacturer: String,
    pub manufacturer_id: String,
    pub product: String,
    pub product_type: String,
    pub product_id: String,
    /// Values keyed by their adapter-side value id.
    pub values: BTreeMap<String, NodeValue>,
    pub statistics: serde_json::Value,
}

impl DeviceInfo {
    /// `manufacturerId.productType.productId`
    pub fn type_mapping_key(&self) -> String {
        format!(
            "{}.{}.{}",
            self.manufacturer_id, self.product_type, self.product_id
        )
    }

    fn identifying_fields(&self) -> [&str; 5] {
        [
            self.manufacturer.as_str(),
            self.manufacturer_id.as_str(),
            self.product.as_str(),
            self.product_id.as_str(),
            self.product_type.as_str(),
        ]
    }

    /// A real device: non-reserved node id with every identifying field set.
    pub fn is_valid(&self) -> bool {
        !RESERVED_NODE_IDS.contains(&self.node_id)
            && self.identifying_fields().iter().all(|f| !f.is_empty())
    }

    /// A node that reports an id but none of the identifying fields.
    pub fn is_husk(&self) -> bool {
        !RESERVED_NODE_IDS.contains(&self.node_id)
            && self.identifying_fields().iter().all(|f| f.is_empty())
    }

    /// Display name used when the controller reports none.
    pub fn default_name(&self) -> String {
        format!("{} ({})", self.product, self.node_id)
    }

    pub fn display_name(&self) -> String {
        if self.name.is_empty() {
            self.default_name()
        } else {
            self.name.clone()
        }
    }
}

/// Valid devices and husk node ids of one discovery pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeClassification {
    pub devices: Vec<DeviceInfo>,
    pub husk_ids: Vec<i64>,
}

/// Split a raw node list into devices and husks. Reserved nodes are
/// skipped; partially identified nodes are dropped with a warning.
pub fn classify_nodes(nodes: impl IntoIterator<Item = DeviceInfo>) -> NodeClassification {
    let mut result = NodeClassification::default();
    for node in nodes {
        if node.is_valid() {
            result.devices.push(node);
        } else if node.is_husk() {
            result.husk_ids.push(node.node_id);
        } else if RESERVED_NODE_IDS.contains(&node.node_id) {
            debug!(node_id = node.node_id, "skipping controller node");
        } else {
            warn!(
                node_id = node.node_id,
                manufacturer_id = %node.manufacturer_id,
                product_type = %node.product_type,
                product_id = %node.product_id,
                "dropping partially identified node"
            );
        }
    }
    result
}

/// One value of a node, normalized across both controller dialects.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeValue {
    #[serde(rename = "computedServiceId")]
    pub computed_service_id: String,
    pub value_id: String,
    pub node_id: i64,
    pub class_id: i64,
    #[serde(rename = "type")]
    pub value_type: String,
    pub instance: i64,
    pub index: i64,
    pub label: String,
    pub read_only: bool,
    pub write_only: bool,
    pub values: serde_json::Value,
    pub value: serde_json::Value,
    #[serde(rename = "lastUpdate")]
    pub last_update: i64,
}

impl NodeValue {
    /// Gateway service id: the adapter's computed id (or the legacy
    /// `classId-instance-index` form) escaped for topic use, with
    /// [`GET_SUFFIX`] for the read service.
    pub fn service_id(&self, get: bool) -> String {
        let raw = if self.computed_service_id.is_empty() {
            format!("{}-{}-{}", self.class_id, self.instance, self.index)
        } else {
            self.computed_service_id.clone()
        };
        let mut id = local_id::encode(&raw);
        if get {
            id.push_str(GET_SUFFIX);
        }
        id
    }
}

pub fn is_get_service(service_id: &str) -> bool {
    service_id.ends_with(GET_SUFFIX)
}

/// Composes gateway device ids as `{prefix}:{nodeId}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdScheme {
    prefix: String,
}

impl DeviceIdScheme {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn device_id(&self, node_id: i64) -> String {
        format!("{}:{node_id}", self.prefix)
    }

    /// Reverse of [`device_id`](Self::device_id) for inbound commands.
    /// Ids without the prefix are returned unchanged.
    pub fn node_part<'a>(&self, device_id: &'a str) -> &'a str {
        device_id
            .strip_prefix(self.prefix.as_str())
            .and_then(|rest| rest.strip_prefix(':'))
            .unwrap_or(device_id)
    }
}

/// Availability as published to the gateway.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DeviceState {
    Online,
    Offline,
}

impl DeviceState {
    pub fn from_online(online: bool) -> Self {
        if online { Self::Online } else { Self::Offline }
    }
}

/// A command received from the gateway for one device service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub command_id: String,
    #[serde(default)]
    pub data: String,
}
