// ── Boundary traits ──
//
// The core never speaks MQTT. Everything it publishes goes through a
// `Gateway`, and everything it asks of the Z-Wave side goes through a
// `ZwaveController`. Transport implementations live outside this crate.

use async_trait::async_trait;

use crate::error::CoreError;
use crate::model::Command;
use crate::registry::RegistryEntry;

/// Outbound device-management surface of the gateway.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Publish (or republish) a device with its name, state and type.
    async fn set_device(&self, device_id: &str, entry: &RegistryEntry) -> Result<(), CoreError>;

    async fn remove_device(&self, device_id: &str) -> Result<(), CoreError>;

    /// Subscribe to commands for `device_id`. Received commands are fed
    /// back through `Connector::handle_command`.
    async fn listen_to_device_commands(&self, device_id: &str) -> Result<(), CoreError>;

    async fn stop_listen_to_device_commands(&self, device_id: &str) -> Result<(), CoreError>;

    async fn send_event(
        &self,
        device_id: &str,
        service_id: &str,
        payload: &serde_json::Value,
    ) -> Result<(), CoreError>;

    /// Answer a command, echoing its `command_id`.
    async fn respond(
        &self,
        device_id: &str,
        service_id: &str,
        response: &Command,
    ) -> Result<(), CoreError>;

    /// Report a failed command. Best effort, never fails.
    async fn send_command_error(&self, command_id: &str, message: &str);

    /// Report a connector-level problem. Best effort, never fails.
    async fn send_client_error(&self, message: &str);
}

/// What the core needs from a Z-Wave controller dialect.
#[async_trait]
pub trait ZwaveController: Send + Sync {
    /// Ask the controller to re-announce all nodes.
    async fn request_device_info_update(&self) -> Result<(), CoreError>;

    /// Write `value` to the value addressed as `{nodeId}-{serviceId}`.
    async fn set_value_by_value_id(
        &self,
        value_id: &str,
        value: serde_json::Value,
    ) -> Result<(), CoreError>;
}
