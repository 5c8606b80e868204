// Wire types for the Tailscale `/api/v2/tailnet/{tailnet}/devices` endpoint.

use serde::{Deserialize, Serialize};

/// Envelope returned by the device-list endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct DeviceList {
    #[serde(default)]
    pub devices: Vec<Device>,
}

/// A single tailnet member as reported by the control plane.
///
/// List fields the API leaves out (routes are only present with
/// `fields=all`) decode as empty vectors; absent flags decode as `false`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Device {
    /// Legacy numeric-string device ID (`"id"` on the wire).
    pub id: String,
    /// Preferred stable node ID.
    pub node_id: Option<String>,
    pub name: String,
    pub hostname: String,
    pub user: String,
    pub os: String,
    pub client_version: String,

    /// Tailnet addresses; the IPv4 address comes first.
    pub addresses: Vec<String>,
    pub tags: Vec<String>,
    pub enabled_routes: Vec<String>,
    pub advertised_routes: Vec<String>,

    pub is_external: bool,
    pub authorized: bool,
    pub update_available: bool,
    pub key_expiry_disabled: bool,
    pub blocks_incoming_connections: bool,
}

/// Error body shape returned by the Tailscale API.
#[derive(Deserialize)]
pub(crate) struct ErrorResponse {
    #[serde(default)]
    pub message: Option<String>,
}
