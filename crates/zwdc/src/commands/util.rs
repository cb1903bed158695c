//! Shared helpers for command handlers.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use zwdc_api::{CatalogClient, TlsMode, TokenManager, TransportConfig};
use zwdc_config::{Config, RuntimeConfig};
use zwdc_core::{DeviceInfo, DeviceTypeCache, FallbackStore};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Transport settings from the global flags.
pub fn transport(global: &GlobalOpts) -> TransportConfig {
    let tls = if global.insecure {
        TlsMode::DangerAcceptInvalid
    } else if let Some(ref ca) = global.ca_cert {
        TlsMode::CustomCa(ca.clone())
    } else {
        TlsMode::System
    };
    TransportConfig {
        tls,
        timeout: Duration::from_secs(global.timeout),
    }
}

pub fn token_manager(runtime: &RuntimeConfig, global: &GlobalOpts) -> Result<TokenManager, CliError> {
    Ok(TokenManager::new(runtime.auth.clone(), &transport(global))?)
}

/// Device-type cache wired to the configured catalog, credentials and
/// fallback file.
pub fn device_type_cache(
    config: &Config,
    global: &GlobalOpts,
) -> Result<(RuntimeConfig, DeviceTypeCache), CliError> {
    let runtime = config.to_runtime()?;
    let catalog = CatalogClient::new(
        runtime.device_repository_url.clone(),
        runtime.device_manager_url.clone(),
        &transport(global),
    )?;
    let auth = Arc::new(token_manager(&runtime, global)?);
    let fallback = FallbackStore::open(&runtime.connector.fallback_file)?;
    let cache = DeviceTypeCache::new(catalog, auth, fallback, runtime.connector.cache.clone());
    Ok((runtime, cache))
}

/// Read a node description from a JSON file.
pub fn read_node(path: &Path) -> Result<DeviceInfo, CliError> {
    let raw = std::fs::read_to_string(path)?;
    let node: DeviceInfo = serde_json::from_str(&raw)?;
    if !node.is_valid() {
        return Err(CliError::Validation {
            field: "node".into(),
            reason: format!(
                "{} lacks manufacturer/product identification",
                path.display()
            ),
        });
    }
    Ok(node)
}
