// ── Prometheus label names ──
//
// Names must match what Prometheus relabel configs expect byte for byte.

use std::collections::BTreeMap;

/// Label name to label value. Ordered so serialized output is stable.
pub type LabelSet = BTreeMap<String, String>;

/// Scrape address of a target.
pub const ADDRESS_LABEL: &str = "__address__";

pub const DEVICE_ID: &str = "__meta_tailscale_device_id";
pub const DEVICE_OS: &str = "__meta_tailscale_device_os";
pub const DEVICE_CLIENT_VERSION: &str = "__meta_tailscale_device_client_version";
pub const DEVICE_NAME: &str = "__meta_tailscale_device_name";
pub const DEVICE_HOSTNAME: &str = "__meta_tailscale_device_hostname";
pub const DEVICE_USER: &str = "__meta_tailscale_device_user";
pub const DEVICE_IS_EXTERNAL: &str = "__meta_tailscale_device_is_external";
pub const DEVICE_AUTHORIZED: &str = "__meta_tailscale_device_authorized";
pub const DEVICE_UPDATE_AVAILABLE: &str = "__meta_tailscale_device_update_available";
pub const DEVICE_KEY_EXPIRY_DISABLED: &str = "__meta_tailscale_device_key_expiry_disabled";
pub const DEVICE_BLOCKS_INCOMING_CONNECTIONS: &str =
    "__meta_tailscale_device_blocks_incoming_connections";
pub const DEVICE_ADDRESSES: &str = "__meta_tailscale_device_addresses";
pub const DEVICE_TAGS: &str = "__meta_tailscale_device_tags";
pub const DEVICE_ENABLED_ROUTES: &str = "__meta_tailscale_device_enabled_routes";
pub const DEVICE_ADVERTISED_ROUTES: &str = "__meta_tailscale_device_advertised_routes";

/// Encode a list as a single label value, fenced by the separator on both
/// ends (`,a,b,`) so relabel regexes can match `.*,a,.*` for any element.
///
/// Returns `None` for an empty list; such labels are left out entirely.
pub fn join_fenced<S: AsRef<str>>(values: &[S], separator: &str) -> Option<String> {
    if values.is_empty() {
        return None;
    }

    let mut out = String::from(separator);
    for value in values {
        out.push_str(value.as_ref());
        out.push_str(separator);
    }
    Some(out)
}
