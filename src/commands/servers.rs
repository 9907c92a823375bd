use crate::proxy::registry::ServerRegistry;
use crate::proxy::success_tracker::{last_worked_hint, SuccessTracker};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ServerStatus {
    pub id: String,
    pub name: String,
    pub disabled: bool,
    pub last_worked: String,
}

pub fn list_public_servers(registry: &ServerRegistry) -> Result<String, String> {
    serde_json::to_string_pretty(registry.public_view())
        .map_err(|e| format!("failed_to_serialize_servers: {}", e))
}

// Operator view: every configured server, disabled ones included.
pub fn server_statuses(
    registry: &ServerRegistry,
    tracker: &dyn SuccessTracker,
) -> Vec<ServerStatus> {
    registry
        .iter()
        .map(|server| ServerStatus {
            id: server.id_str().to_string(),
            name: server.name.clone(),
            disabled: server.disabled,
            last_worked: last_worked_hint(tracker.time_since_last_success(server.id_str())),
        })
        .collect()
}
