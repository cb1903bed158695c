// ── Catalog wire types ──
//
// Device types as the catalog serializes them. Collections may arrive as
// JSON `null` from the server, so every list field tolerates that.

use serde::{Deserialize, Deserializer, Serialize};

/// Variable type identifiers used by the catalog.
pub mod variable_type {
    pub const TEXT: &str = "https://schema.org/Text";
    pub const INTEGER: &str = "https://schema.org/Integer";
    pub const FLOAT: &str = "https://schema.org/Float";
    pub const BOOLEAN: &str = "https://schema.org/Boolean";
    pub const LIST: &str = "https://schema.org/ItemList";
    pub const STRUCTURE: &str = "https://schema.org/StructuredValue";
}

/// Serialization format identifier for JSON payloads.
pub const SERIALIZATION_JSON: &str = "json";

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceType {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub device_class_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub attributes: Vec<Attribute>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub services: Vec<Service>,
}

impl DeviceType {
    /// All trimmed values stored under `key`.
    pub fn attribute_values<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.attributes
            .iter()
            .filter(move |a| a.key == key)
            .map(|a| a.value.trim())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub key: String,
    #[serde(default)]
    pub value: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub origin: String,
}

impl Attribute {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            origin: String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Interaction {
    #[serde(rename = "event")]
    Event,
    #[serde(rename = "request")]
    #[default]
    Request,
    #[serde(rename = "event+request")]
    EventAndRequest,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Service {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub local_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub interaction: Interaction,
    #[serde(default)]
    pub protocol_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub inputs: Vec<Content>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub outputs: Vec<Content>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub content_variable: ContentVariable,
    #[serde(default)]
    pub serialization: String,
    #[serde(default)]
    pub protocol_segment_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentVariable {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_void: bool,
    #[serde(default, rename = "type")]
    pub variable_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sub_content_variables: Vec<ContentVariable>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub characteristic_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub function_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub unit_reference: String,
}

impl ContentVariable {
    pub fn new(name: impl Into<String>, variable_type: &str) -> Self {
        Self {
            name: name.into(),
            variable_type: variable_type.to_owned(),
            ..Self::default()
        }
    }
}
