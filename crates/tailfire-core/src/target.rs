// ── Prometheus target groups ──

use serde::ser::{Serialize, SerializeSeq, SerializeStruct, Serializer};

use crate::labels::{ADDRESS_LABEL, LabelSet};

/// One entry of a Prometheus HTTP SD response.
///
/// Prometheus applies `labels` to every target in the group, so each
/// device gets its own group with exactly one target whose label set is
/// identical to the group's.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetGroup {
    /// Where the group came from. Shared by all groups of a refresh.
    pub source: String,
    pub targets: Vec<LabelSet>,
    pub labels: LabelSet,
}

impl TargetGroup {
    /// Group holding a single target described by `labels`.
    pub fn single(source: impl Into<String>, labels: LabelSet) -> Self {
        Self {
            source: source.into(),
            targets: vec![labels.clone()],
            labels,
        }
    }
}

/// HTTP SD wire format: `{"targets": ["<address>", ...], "labels": {...}}`.
///
/// Each target is rendered as its `__address__` value, which is the only
/// part of a target Prometheus reads from the `targets` array. `source` is
/// not part of the wire format.
impl Serialize for TargetGroup {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        struct Addresses<'a>(&'a [LabelSet]);

        impl Serialize for Addresses<'_> {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
                for target in self.0 {
                    let addr = target.get(ADDRESS_LABEL).map_or("", String::as_str);
                    seq.serialize_element(addr)?;
                }
                seq.end()
            }
        }

        let mut state = serializer.serialize_struct("TargetGroup", 2)?;
        state.serialize_field("targets", &Addresses(&self.targets))?;
        state.serialize_field("labels", &self.labels)?;
        state.end()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn single_target_mirrors_group_labels() {
        let mut labels = LabelSet::new();
        labels.insert(ADDRESS_LABEL.into(), "100.64.0.1".into());
        let group = TargetGroup::single("https://api.tailscale.com", labels.clone());

        assert_eq!(group.targets, vec![labels.clone()]);
        assert_eq!(group.labels, labels);
    }

    #[test]
    fn serializes_to_http_sd_shape() {
        let mut labels = LabelSet::new();
        labels.insert(ADDRESS_LABEL.into(), "100.64.0.1".into());
        labels.insert("__meta_tailscale_device_os".into(), "linux".into());
        let group = TargetGroup::single("https://api.tailscale.com", labels);

        let value = serde_json::to_value(&group).unwrap();
        assert_eq!(
            value,
            json!({
                "targets": ["100.64.0.1"],
                "labels": {
                    "__address__": "100.64.0.1",
                    "__meta_tailscale_device_os": "linux"
                }
            })
        );
    }
}
