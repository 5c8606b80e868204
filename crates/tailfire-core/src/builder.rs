// ── Device to target group conversion ──
//
// Pure transformation: no I/O, deterministic for identical input.

use tracing::warn;

use crate::labels::{self, LabelSet, join_fenced};
use crate::target::TargetGroup;
use tailfire_api::Device;

/// Turns a device list into Prometheus target groups, one group per device.
#[derive(Debug, Clone)]
pub struct TargetGroupBuilder {
    source: String,
    separator: String,
}

impl TargetGroupBuilder {
    /// `source` is stamped on every group (the API base URL); `separator`
    /// fences list-valued labels.
    pub fn new(source: impl Into<String>, separator: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            separator: separator.into(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Build groups in input order.
    ///
    /// Devices without any address have nothing to scrape and are skipped
    /// with a warning, so the output can be shorter than the input.
    pub fn build(&self, devices: &[Device]) -> Vec<TargetGroup> {
        devices
            .iter()
            .filter_map(|device| {
                let labels = self.device_labels(device);
                if labels.is_none() {
                    warn!(
                        device_id = %device.id,
                        name = %device.name,
                        "device has no addresses, skipping"
                    );
                }
                labels.map(|labels| TargetGroup::single(self.source.as_str(), labels))
            })
            .collect()
    }

    /// Full label set for one device, or `None` if it has no address.
    pub fn device_labels(&self, device: &Device) -> Option<LabelSet> {
        let address = device.addresses.first()?;

        let mut set = LabelSet::new();
        let mut put = |name: &str, value: String| {
            set.insert(name.to_owned(), value);
        };

        put(labels::DEVICE_ID, device.id.clone());
        put(labels::DEVICE_OS, device.os.clone());
        put(labels::DEVICE_CLIENT_VERSION, device.client_version.clone());
        put(labels::DEVICE_NAME, device.name.clone());
        put(labels::DEVICE_HOSTNAME, device.hostname.clone());
        put(labels::DEVICE_USER, device.user.clone());
        put(labels::DEVICE_IS_EXTERNAL, device.is_external.to_string());
        put(labels::DEVICE_AUTHORIZED, device.authorized.to_string());
        put(labels::DEVICE_UPDATE_AVAILABLE, device.update_available.to_string());
        put(labels::DEVICE_KEY_EXPIRY_DISABLED, device.key_expiry_disabled.to_string());
        put(
            labels::DEVICE_BLOCKS_INCOMING_CONNECTIONS,
            device.blocks_incoming_connections.to_string(),
        );

        put(labels::ADDRESS_LABEL, address.clone());

        for (name, values) in [
            (labels::DEVICE_ADDRESSES, &device.addresses),
            (labels::DEVICE_TAGS, &device.tags),
            (labels::DEVICE_ENABLED_ROUTES, &device.enabled_routes),
            (labels::DEVICE_ADVERTISED_ROUTES, &device.advertised_routes),
        ] {
            if let Some(joined) = join_fenced(values, &self.separator) {
                put(name, joined);
            }
        }

        Some(set)
    }
}
