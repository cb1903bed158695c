//! Configuration for the Z-Wave connector.
//!
//! A JSON or TOML file (chosen by extension) layered over built-in
//! defaults, then overlaid with environment variables named after the
//! upper-cased keys (`AUTH_PASSWORD`, `DEVICE_TYPE_MAPPING`, ...).
//! [`Config::to_runtime`] validates the result and splits it into the
//! pieces `zwdc-core` and `zwdc-api` consume.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    Figment,
    providers::{Format, Json, Serialized, Toml},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;
use tracing::debug;
use url::Url;

use zwdc_api::AuthConfig;
use zwdc_core::{
    CacheConfig, ConnectorConfig, DefinitionSettings, MissingDevicePolicy, RegistryPolicy,
};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("config file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("failed to serialize config: {0}")]
    Serialization(String),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        field: field.to_owned(),
        reason: reason.into(),
    }
}

// ── Config struct ───────────────────────────────────────────────────

/// Z-Wave controller dialect spoken on the controller broker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ControllerDialect {
    #[default]
    Zwave2mqtt,
    Zwavejs2mqtt,
}

/// The connector's configuration file, key for key.
///
/// Secrets serialize as a fixed mask so that printing a config never leaks
/// them; the file itself is only ever read.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct Config {
    pub connector_id: String,
    pub device_id_prefix: String,
    pub debug: bool,

    // ── MQTT (used by the transport adapters) ──
    pub zwave_mqtt_broker: String,
    pub zwave_mqtt_user: String,
    #[serde(with = "masked")]
    pub zwave_mqtt_pw: SecretString,
    pub zwave_mqtt_client_id: String,
    pub mgw_mqtt_broker: String,
    pub mgw_mqtt_user: String,
    #[serde(with = "masked")]
    pub mgw_mqtt_pw: SecretString,
    pub mgw_mqtt_client_id: String,
    /// `zwave2mqtt` (also when empty) or `zwavejs2mqtt`.
    pub zwave_controller: String,
    pub zwave_mqtt_device_state_topic: String,
    pub zvave_value_event_topic: String,
    pub zwave_mqtt_api_topic: String,
    pub zwave_network_events_topic: String,

    // ── Update requests ──
    /// Period of the device-info request; empty or `-` disables it.
    pub update_period: String,
    pub initial_update_request_delay: String,

    // ── Device policies ──
    pub device_type_mapping: HashMap<String, String>,
    pub node_device_type_overwrite: HashMap<String, String>,
    pub delete_missing_devices: bool,
    pub delete_husks: bool,
    pub events_for_unregistered_devices: bool,

    // ── Auth ──
    pub auth_endpoint: String,
    pub auth_client_id: String,
    /// Seconds subtracted from token lifetimes.
    pub auth_expiration_time_buffer: f64,
    pub auth_username: String,
    #[serde(with = "masked")]
    pub auth_password: SecretString,

    // ── Catalog ──
    pub device_manager_url: String,
    pub device_repository_url: String,
    pub fallback_file: String,
    pub min_cache_duration: String,
    pub max_cache_duration: String,

    // ── Device-type creation ──
    pub create_missing_device_types: bool,
    pub create_missing_device_types_with_device_class: String,
    pub create_missing_device_types_with_protocol: String,
    pub create_missing_device_types_with_protocol_segment: String,
    pub create_missing_device_types_last_update_function: String,
    pub create_missing_device_types_last_update_characteristic: String,
    pub disown_created_device_types: bool,
}

impl Default for Config {
    fn default() -> Self {
        let empty = || SecretString::from(String::new());
        Self {
            connector_id: String::new(),
            device_id_prefix: "zwave".into(),
            debug: false,
            zwave_mqtt_broker: String::new(),
            zwave_mqtt_user: String::new(),
            zwave_mqtt_pw: empty(),
            zwave_mqtt_client_id: String::new(),
            mgw_mqtt_broker: String::new(),
            mgw_mqtt_user: String::new(),
            mgw_mqtt_pw: empty(),
            mgw_mqtt_client_id: String::new(),
            zwave_controller: String::new(),
            zwave_mqtt_device_state_topic: String::new(),
            zvave_value_event_topic: String::new(),
            zwave_mqtt_api_topic: String::new(),
            zwave_network_events_topic: String::new(),
            update_period: String::new(),
            initial_update_request_delay: "1m".into(),
            device_type_mapping: HashMap::new(),
            node_device_type_overwrite: HashMap::new(),
            delete_missing_devices: false,
            delete_husks: false,
            events_for_unregistered_devices: false,
            auth_endpoint: String::new(),
            auth_client_id: String::new(),
            auth_expiration_time_buffer: 1.0,
            auth_username: String::new(),
            auth_password: empty(),
            device_manager_url: String::new(),
            device_repository_url: String::new(),
            fallback_file: "fallback.json".into(),
            min_cache_duration: "1m".into(),
            max_cache_duration: "1h".into(),
            create_missing_device_types: false,
            create_missing_device_types_with_device_class: String::new(),
            create_missing_device_types_with_protocol: String::new(),
            create_missing_device_types_with_protocol_segment: String::new(),
            create_missing_device_types_last_update_function: String::new(),
            create_missing_device_types_last_update_characteristic: String::new(),
            disown_created_device_types: false,
        }
    }
}

mod masked {
    use secrecy::{ExposeSecret, SecretString};
    use serde::{Deserialize, Deserializer, Serializer};

    pub const MASK: &str = "********";

    pub fn serialize<S: Serializer>(secret: &SecretString, s: S) -> Result<S::Ok, S::Error> {
        if secret.expose_secret().is_empty() {
            s.serialize_str("")
        } else {
            s.serialize_str(MASK)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<SecretString, D::Error> {
        String::deserialize(d).map(SecretString::from)
    }
}

// ── Environment overlay ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
enum EnvKind {
    Text,
    Flag,
    Number,
    /// `key:value,key2:value2`
    Mapping,
}

/// Keys that may be overridden from the environment. The variable name is
/// the upper-cased key.
const ENV_OVERLAY: &[(&str, EnvKind)] = &[
    ("connector_id", EnvKind::Text),
    ("device_id_prefix", EnvKind::Text),
    ("debug", EnvKind::Flag),
    ("zwave_mqtt_broker", EnvKind::Text),
    ("zwave_mqtt_user", EnvKind::Text),
    ("zwave_mqtt_pw", EnvKind::Text),
    ("zwave_mqtt_client_id", EnvKind::Text),
    ("mgw_mqtt_broker", EnvKind::Text),
    ("mgw_mqtt_user", EnvKind::Text),
    ("mgw_mqtt_pw", EnvKind::Text),
    ("mgw_mqtt_client_id", EnvKind::Text),
    ("zwave_controller", EnvKind::Text),
    ("zwave_mqtt_device_state_topic", EnvKind::Text),
    ("zvave_value_event_topic", EnvKind::Text),
    ("zwave_mqtt_api_topic", EnvKind::Text),
    ("zwave_network_events_topic", EnvKind::Text),
    ("update_period", EnvKind::Text),
    ("initial_update_request_delay", EnvKind::Text),
    ("device_type_mapping", EnvKind::Mapping),
    ("node_device_type_overwrite", EnvKind::Mapping),
    ("delete_missing_devices", EnvKind::Flag),
    ("delete_husks", EnvKind::Flag),
    ("events_for_unregistered_devices", EnvKind::Flag),
    ("auth_endpoint", EnvKind::Text),
    ("auth_client_id", EnvKind::Text),
    ("auth_expiration_time_buffer", EnvKind::Number),
    ("auth_username", EnvKind::Text),
    ("auth_password", EnvKind::Text),
    ("device_manager_url", EnvKind::Text),
    ("device_repository_url", EnvKind::Text),
    ("fallback_file", EnvKind::Text),
    ("min_cache_duration", EnvKind::Text),
    ("max_cache_duration", EnvKind::Text),
    ("create_missing_device_types", EnvKind::Flag),
    ("create_missing_device_types_with_device_class", EnvKind::Text),
    ("create_missing_device_types_with_protocol", EnvKind::Text),
    ("create_missing_device_types_with_protocol_segment", EnvKind::Text),
    ("create_missing_device_types_last_update_function", EnvKind::Text),
    ("create_missing_device_types_last_update_characteristic", EnvKind::Text),
    ("disown_created_device_types", EnvKind::Flag),
];

/// Environment variable that overrides `key`.
pub fn env_name(key: &str) -> String {
    key.to_ascii_uppercase()
}

/// Collect overrides for every key whose variable is set and non-empty.
fn env_overlay(
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<serde_json::Map<String, serde_json::Value>, ConfigError> {
    let mut overlay = serde_json::Map::new();
    for &(key, kind) in ENV_OVERLAY {
        let name = env_name(key);
        let Some(raw) = lookup(&name).filter(|v| !v.is_empty()) else {
            continue;
        };
        debug!(variable = %name, "using environment variable");
        overlay.insert(key.to_owned(), parse_env_value(&name, &raw, kind)?);
    }
    Ok(overlay)
}

fn parse_env_value(name: &str, raw: &str, kind: EnvKind) -> Result<serde_json::Value, ConfigError> {
    use serde_json::Value;

    match kind {
        EnvKind::Text => Ok(Value::String(raw.to_owned())),
        EnvKind::Flag => parse_flag(raw)
            .map(Value::Bool)
            .ok_or_else(|| invalid(name, format!("expected a boolean, got '{raw}'"))),
        EnvKind::Number => raw
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| invalid(name, format!("expected a number, got '{raw}'"))),
        EnvKind::Mapping => parse_mapping(raw)
            .map(|m| Value::Object(m.into_iter().map(|(k, v)| (k, Value::String(v))).collect()))
            .map_err(|reason| invalid(name, reason)),
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim() {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

/// Parse `key:value,key2:value2`. Only the first `:` of an entry separates
/// key and value, so values may themselves contain colons.
fn parse_mapping(raw: &str) -> Result<HashMap<String, String>, String> {
    raw.split(',')
        .filter(|entry| !entry.trim().is_empty())
        .map(|entry| {
            entry
                .split_once(':')
                .map(|(k, v)| (k.trim().to_owned(), v.trim().to_owned()))
                .ok_or_else(|| format!("entry '{}' is not key:value", entry.trim()))
        })
        .collect()
}

// ── Loading ─────────────────────────────────────────────────────────

/// Load `path` over the defaults and apply the process environment.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    load_config_with(path, |name| std::env::var(name).ok())
}

/// Like [`load_config`] with an explicit variable lookup.
pub fn load_config_with(
    path: &Path,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Config, ConfigError> {
    if !path.is_file() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));
    figment = match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => figment.merge(Toml::file(path)),
        _ => figment.merge(Json::file(path)),
    };
    figment = figment.merge(Serialized::defaults(env_overlay(lookup)?));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Translation to runtime types ────────────────────────────────────

/// Everything the connector needs at startup, validated.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub connector: ConnectorConfig,
    pub auth: AuthConfig,
    pub device_repository_url: Url,
    pub device_manager_url: Url,
    pub dialect: ControllerDialect,
}

impl Config {
    pub fn controller_dialect(&self) -> Result<ControllerDialect, ConfigError> {
        if self.zwave_controller.trim().is_empty() {
            return Ok(ControllerDialect::default());
        }
        self.zwave_controller
            .trim()
            .parse()
            .map_err(|_| {
                invalid(
                    "zwave_controller",
                    format!("unknown dialect '{}'", self.zwave_controller),
                )
            })
    }

    /// Catalog URLs only, for tools that never log in.
    pub fn catalog_urls(&self) -> Result<(Url, Url), ConfigError> {
        Ok((
            parse_url("device_repository_url", &self.device_repository_url)?,
            parse_url("device_manager_url", &self.device_manager_url)?,
        ))
    }

    pub fn auth_config(&self) -> Result<AuthConfig, ConfigError> {
        let expiration_buffer = Duration::try_from_secs_f64(self.auth_expiration_time_buffer)
            .map_err(|e| invalid("auth_expiration_time_buffer", e.to_string()))?;
        Ok(AuthConfig {
            endpoint: parse_url("auth_endpoint", &self.auth_endpoint)?,
            client_id: self.auth_client_id.clone(),
            username: self.auth_username.clone(),
            password: SecretString::from(self.auth_password.expose_secret().to_owned()),
            expiration_buffer,
        })
    }

    /// Validate and convert into runtime configuration.
    pub fn to_runtime(&self) -> Result<RuntimeConfig, ConfigError> {
        let (device_repository_url, device_manager_url) = self.catalog_urls()?;

        if self.device_id_prefix.trim().is_empty() {
            return Err(invalid("device_id_prefix", "must not be empty"));
        }
        if self.create_missing_device_types {
            for (field, value) in [
                (
                    "create_missing_device_types_with_device_class",
                    &self.create_missing_device_types_with_device_class,
                ),
                (
                    "create_missing_device_types_with_protocol",
                    &self.create_missing_device_types_with_protocol,
                ),
            ] {
                if value.trim().is_empty() {
                    return Err(invalid(field, "required when creating missing device types"));
                }
            }
        }

        let cache = CacheConfig {
            min_cache_duration: parse_duration("min_cache_duration", &self.min_cache_duration)?,
            max_cache_duration: parse_duration("max_cache_duration", &self.max_cache_duration)?,
            ..CacheConfig::default()
        };
        if cache.min_cache_duration > cache.max_cache_duration {
            return Err(invalid(
                "min_cache_duration",
                "must not exceed max_cache_duration",
            ));
        }

        let update_period = match self.update_period.trim() {
            "" | "-" => None,
            period => Some(parse_duration("update_period", period)?),
        };
        if update_period.is_some_and(|p| p.is_zero()) {
            return Err(invalid("update_period", "must be non-zero; use \"-\" to disable"));
        }

        let connector = ConnectorConfig {
            device_id_prefix: self.device_id_prefix.clone(),
            device_type_mapping: self.device_type_mapping.clone(),
            node_device_type_overwrite: self.node_device_type_overwrite.clone(),
            create_missing_device_types: self.create_missing_device_types,
            definition: DefinitionSettings {
                device_class_id: self.create_missing_device_types_with_device_class.clone(),
                protocol_id: self.create_missing_device_types_with_protocol.clone(),
                protocol_segment_id: self
                    .create_missing_device_types_with_protocol_segment
                    .clone(),
                last_update_function_id: self
                    .create_missing_device_types_last_update_function
                    .clone(),
                last_update_characteristic_id: self
                    .create_missing_device_types_last_update_characteristic
                    .clone(),
            },
            registry: RegistryPolicy {
                missing_devices: if self.delete_missing_devices {
                    MissingDevicePolicy::Delete
                } else {
                    MissingDevicePolicy::MarkOffline
                },
                delete_husks: self.delete_husks,
            },
            events_for_unregistered_devices: self.events_for_unregistered_devices,
            update_period,
            initial_update_request_delay: parse_duration(
                "initial_update_request_delay",
                &self.initial_update_request_delay,
            )?,
            cache,
            fallback_file: PathBuf::from(&self.fallback_file),
        };

        Ok(RuntimeConfig {
            connector,
            auth: self.auth_config()?,
            device_repository_url,
            device_manager_url,
            dialect: self.controller_dialect()?,
        })
    }

    /// Render as pretty TOML, secrets masked.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialization(e.to_string()))
    }

    /// Render as pretty JSON, secrets masked.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Serialization(e.to_string()))
    }
}

fn parse_url(field: &str, value: &str) -> Result<Url, ConfigError> {
    if value.trim().is_empty() {
        return Err(invalid(field, "must be set"));
    }
    Url::parse(value.trim()).map_err(|e| invalid(field, e.to_string()))
}

/// `30s`, `5m`, `1h30m`, `500ms`.
pub fn parse_duration(field: &str, value: &str) -> Result<Duration, ConfigError> {
    humantime::parse_duration(value.trim()).map_err(|e| invalid(field, e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn write_file(dir: &tempfile::TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::File::create(&path)
            .unwrap()
            .write_all(body.as_bytes())
            .unwrap();
        path
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    const MINIMAL_JSON: &str = r#"{
        "connector_id": "zwave-1",
        "auth_endpoint": "http://auth.local",
        "auth_client_id": "client",
        "auth_username": "user",
        "auth_password": "secret",
        "device_manager_url": "http://manager.local",
        "device_repository_url": "http://repo.local",
        "device_type_mapping": { "0x0002.0x0005.0x0175": "urn:dt:danfoss" }
    }"#;

    #[test]
    fn json_file_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "config.json", MINIMAL_JSON);

        let config = load_config_with(&path, no_env).unwrap();
        assert_eq!(config.connector_id, "zwave-1");
        assert_eq!(config.device_id_prefix, "zwave");
        assert_eq!(config.auth_password.expose_secret(), "secret");
        assert_eq!(
            config.device_type_mapping.get("0x0002.0x0005.0x0175").map(String::as_str),
            Some("urn:dt:danfoss")
        );
    }

    #[test]
    fn toml_file_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "config.toml",
            r#"
device_id_prefix = "zw"
delete_husks = true
update_period = "10m"

[node_device_type_overwrite]
"5" = "urn:dt:over"
"#,
        );

        let config = load_config_with(&path, no_env).unwrap();
        assert_eq!(config.device_id_prefix, "zw");
        assert!(config.delete_husks);
        assert_eq!(config.update_period, "10m");
        assert_eq!(config.node_device_type_overwrite.len(), 1);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config_with(&dir.path().join("nope.json"), no_env).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }

    #[test]
    fn environment_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "config.json", MINIMAL_JSON);

        let env = HashMap::from([
            ("AUTH_PASSWORD", "from-env"),
            ("DELETE_MISSING_DEVICES", "true"),
            ("AUTH_EXPIRATION_TIME_BUFFER", "2.5"),
            (
                "DEVICE_TYPE_MAPPING",
                "0x0001.0x0002.0x0003:urn:infai:dt:1, 0x0004.0x0005.0x0006:urn:infai:dt:2",
            ),
            ("CONNECTOR_ID", ""),
        ]);
        let config =
            load_config_with(&path, |name| env.get(name).map(|v| (*v).to_owned())).unwrap();

        assert_eq!(config.auth_password.expose_secret(), "from-env");
        assert!(config.delete_missing_devices);
        assert!((config.auth_expiration_time_buffer - 2.5).abs() < f64::EPSILON);
        assert_eq!(config.connector_id, "zwave-1");
        assert_eq!(
            config.device_type_mapping,
            HashMap::from([
                ("0x0001.0x0002.0x0003".to_owned(), "urn:infai:dt:1".to_owned()),
                ("0x0004.0x0005.0x0006".to_owned(), "urn:infai:dt:2".to_owned()),
            ])
        );
    }

    #[test]
    fn malformed_environment_values_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "config.json", MINIMAL_JSON);

        let err = load_config_with(&path, |name| {
            (name == "DELETE_HUSKS").then(|| "maybe".to_owned())
        })
        .unwrap_err();
        assert!(err.to_string().contains("DELETE_HUSKS"), "got: {err}");

        let err = load_config_with(&path, |name| {
            (name == "NODE_DEVICE_TYPE_OVERWRITE").then(|| "5".to_owned())
        })
        .unwrap_err();
        assert!(err.to_string().contains("key:value"), "got: {err}");
    }

    #[test]
    fn runtime_translation() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "config.json", MINIMAL_JSON);
        let mut config = load_config_with(&path, no_env).unwrap();
        config.update_period = "1h30m".into();
        config.delete_missing_devices = true;

        let runtime = config.to_runtime().unwrap();
        assert_eq!(runtime.connector.update_period, Some(Duration::from_secs(5400)));
        assert_eq!(
            runtime.connector.initial_update_request_delay,
            Duration::from_secs(60)
        );
        assert_eq!(
            runtime.connector.registry.missing_devices,
            MissingDevicePolicy::Delete
        );
        assert_eq!(runtime.connector.cache.max_cache_duration, Duration::from_secs(3600));
        assert_eq!(runtime.auth.expiration_buffer, Duration::from_secs(1));
        assert_eq!(runtime.device_repository_url.as_str(), "http://repo.local/");
        assert_eq!(runtime.dialect, ControllerDialect::Zwave2mqtt);
    }

    #[test]
    fn update_period_can_be_disabled() {
        let mut config: Config = serde_json::from_str(MINIMAL_JSON).unwrap();
        for disabled in ["", "-"] {
            config.update_period = disabled.into();
            assert_eq!(config.to_runtime().unwrap().connector.update_period, None);
        }
    }

    #[test]
    fn zero_update_period_is_rejected() {
        let mut config: Config = serde_json::from_str(MINIMAL_JSON).unwrap();
        config.update_period = "0s".into();
        let err = config.to_runtime().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Validation { ref field, .. } if field == "update_period"
        ));
    }

    #[test]
    fn invalid_values_name_the_field() {
        let base: Config = serde_json::from_str(MINIMAL_JSON).unwrap();

        let mut config = base.clone();
        config.device_manager_url = "not a url".into();
        assert!(config.to_runtime().unwrap_err().to_string().contains("device_manager_url"));

        let mut config = base.clone();
        config.min_cache_duration = "soon".into();
        assert!(config.to_runtime().unwrap_err().to_string().contains("min_cache_duration"));

        let mut config = base.clone();
        config.auth_expiration_time_buffer = -1.0;
        assert!(
            config
                .to_runtime()
                .unwrap_err()
                .to_string()
                .contains("auth_expiration_time_buffer")
        );

        let mut config = base.clone();
        config.create_missing_device_types = true;
        assert!(
            config
                .to_runtime()
                .unwrap_err()
                .to_string()
                .contains("create_missing_device_types_with_device_class")
        );

        let mut config = base;
        config.zwave_controller = "openzwave".into();
        assert!(config.to_runtime().unwrap_err().to_string().contains("zwave_controller"));
    }

    #[test]
    fn dialect_names() {
        let mut config = Config::default();
        config.zwave_controller = "zwavejs2mqtt".into();
        assert_eq!(
            config.controller_dialect().unwrap(),
            ControllerDialect::Zwavejs2mqtt
        );
        config.zwave_controller = "zwave2mqtt".into();
        assert_eq!(
            config.controller_dialect().unwrap(),
            ControllerDialect::Zwave2mqtt
        );
    }

    #[test]
    fn secrets_are_masked_when_rendered() {
        let config: Config = serde_json::from_str(MINIMAL_JSON).unwrap();
        let rendered = config.to_json().unwrap();
        assert!(!rendered.contains("secret\""));
        assert!(rendered.contains(masked::MASK));

        let toml = Config::default().to_toml().unwrap();
        assert!(toml.contains("auth_password = \"\""));
    }
}
