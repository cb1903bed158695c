// ── Device registry ──
//
// Authoritative map of devices published to the gateway. Map access is a
// short `std::sync::Mutex` section; gateway calls happen outside it.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::{debug, error, info, warn};

use crate::error::CoreError;
use crate::gateway::Gateway;
use crate::model::{DeviceIdScheme, DeviceState};

/// A device as published to the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub name: String,
    pub state: DeviceState,
    pub device_type: String,
}

/// What happens to a registered device missing from a full discovery pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum MissingDevicePolicy {
    /// Remove it from the gateway.
    Delete,
    /// Republish it as offline.
    #[default]
    MarkOffline,
}

/// Cleanup policy for [`DeviceRegistry`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryPolicy {
    pub missing_devices: MissingDevicePolicy,
    pub delete_husks: bool,
}

pub struct DeviceRegistry {
    gateway: Arc<dyn Gateway>,
    ids: DeviceIdScheme,
    policy: RegistryPolicy,
    devices: Mutex<HashMap<String, RegistryEntry>>,
}

impl DeviceRegistry {
    pub fn new(gateway: Arc<dyn Gateway>, ids: DeviceIdScheme, policy: RegistryPolicy) -> Self {
        Self {
            gateway,
            ids,
            policy,
            devices: Mutex::new(HashMap::new()),
        }
    }

    fn devices(&self) -> MutexGuard<'_, HashMap<String, RegistryEntry>> {
        self.devices.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn policy(&self) -> RegistryPolicy {
        self.policy
    }

    // ── Readers ──────────────────────────────────────────────────────

    pub fn get(&self, device_id: &str) -> Option<RegistryEntry> {
        self.devices().get(device_id).cloned()
    }

    pub fn contains(&self, device_id: &str) -> bool {
        self.devices().contains_key(device_id)
    }

    /// Registered ids, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.devices().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.devices().len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices().is_empty()
    }

    pub fn snapshot(&self) -> HashMap<String, RegistryEntry> {
        self.devices().clone()
    }

    // ── Transitions ──────────────────────────────────────────────────

    /// Publish `entry`, subscribe to its commands, then store it. A
    /// failure in either gateway call leaves the map untouched.
    pub async fn register(&self, device_id: &str, entry: RegistryEntry) -> Result<(), CoreError> {
        if let Err(e) = self.gateway.set_device(device_id, &entry).await {
            error!(device_id, error = %e, "unable to send device info to gateway");
            return Err(e);
        }
        if let Err(e) = self.gateway.listen_to_device_commands(device_id).await {
            error!(device_id, error = %e, "unable to subscribe to device commands");
            return Err(e);
        }
        debug!(device_id, device_type = %entry.device_type, "device registered");
        self.devices().insert(device_id.to_owned(), entry);
        Ok(())
    }

    /// Flip the availability of a registered node and republish it.
    pub async fn set_state(&self, node_id: i64, online: bool) -> Result<(), CoreError> {
        let device_id = self.ids.device_id(node_id);
        let entry = {
            let mut devices = self.devices();
            let Some(entry) = devices.get_mut(&device_id) else {
                return Err(CoreError::UnknownDevice { node_id });
            };
            entry.state = DeviceState::from_online(online);
            entry.clone()
        };
        self.gateway.set_device(&device_id, &entry).await
    }

    /// Handle registered devices absent from a complete discovery pass,
    /// per [`MissingDevicePolicy`]. Returns the ids that were handled.
    ///
    /// A failed publish is reported to the gateway and ends the pass; ids
    /// handled up to that point are still returned.
    pub async fn reconcile_full_snapshot(&self, current: &HashSet<String>) -> HashSet<String> {
        let mut missing: Vec<(String, RegistryEntry)> = self
            .snapshot()
            .into_iter()
            .filter(|(id, _)| !current.contains(id))
            .collect();
        missing.sort_by(|a, b| a.0.cmp(&b.0));

        let mut handled = HashSet::new();
        for (device_id, seen) in missing {
            let mut entry = seen.clone();
            let published = match self.policy.missing_devices {
                MissingDevicePolicy::Delete => {
                    warn!(device_id = %device_id, "remove missing device");
                    self.gateway
                        .remove_device(&device_id)
                        .await
                        .map_err(|e| ("delete", e))
                }
                MissingDevicePolicy::MarkOffline => {
                    warn!(device_id = %device_id, "set missing device offline");
                    entry.state = DeviceState::Offline;
                    self.gateway
                        .set_device(&device_id, &entry)
                        .await
                        .map_err(|e| ("offline", e))
                }
            };
            if let Err((action, e)) = published {
                error!(
                    device_id = %device_id,
                    error = %e,
                    "unable to send device info ({action}) to gateway"
                );
                self.gateway
                    .send_client_error(&format!(
                        "unable to send device info ({action}) to gateway: {e}"
                    ))
                    .await;
                return handled;
            }

            if !self.remove_if_unchanged(&device_id, &seen) {
                debug!(device_id = %device_id, "device re-registered during reconciliation");
                continue;
            }
            self.stop_listening(&device_id).await;
            handled.insert(device_id);
        }
        handled
    }

    /// Remove every husk not already handled by a snapshot reconciliation.
    /// No-op unless husk deletion is enabled. Stops at the first failure.
    pub async fn reconcile_husks(
        &self,
        husk_ids: &[i64],
        already_handled: &HashSet<String>,
    ) -> Result<usize, CoreError> {
        if !self.policy.delete_husks {
            return Ok(0);
        }
        let mut removed = 0;
        for &node_id in husk_ids {
            let device_id = self.ids.device_id(node_id);
            if already_handled.contains(&device_id) {
                continue;
            }
            if let Err(e) = self.gateway.remove_device(&device_id).await {
                error!(device_id = %device_id, error = %e, "unable to delete husk in gateway");
                return Err(e);
            }
            info!(device_id = %device_id, "husk removed");
            let was_registered = self.devices().remove(&device_id).is_some();
            if was_registered {
                self.stop_listening(&device_id).await;
            }
            removed += 1;
        }
        Ok(removed)
    }

    /// Remove a device from the gateway and forget it. Returns whether the
    /// device was registered.
    pub async fn unregister(&self, device_id: &str) -> Result<bool, CoreError> {
        self.gateway.remove_device(device_id).await?;
        self.stop_listening(device_id).await;
        Ok(self.devices().remove(device_id).is_some())
    }

    /// Drop `device_id` only if it still holds `expected`; a concurrent
    /// `register` in the meantime wins.
    fn remove_if_unchanged(&self, device_id: &str, expected: &RegistryEntry) -> bool {
        let mut devices = self.devices();
        if devices.get(device_id) != Some(expected) {
            return false;
        }
        devices.remove(device_id);
        true
    }

    async fn stop_listening(&self, device_id: &str) {
        if let Err(e) = self.gateway.stop_listen_to_device_commands(device_id).await {
            warn!(device_id, error = %e, "unable to stop listening to device commands");
            self.gateway
                .send_client_error(&format!("unable to stop listening to device commands: {e}"))
                .await;
        }
    }
}
