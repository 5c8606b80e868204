//! Discovery metrics and their Prometheus registry.
//!
//! A [`Metrics`] handle owns its own [`Registry`] instead of using the
//! process-wide default, so every test can start from zero. Clones share
//! the same underlying counters.

use prometheus::{Encoder, IntCounter, Registry, TextEncoder};

/// Counters updated by [`Discovery`](crate::Discovery).
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    failures: IntCounter,
    skipped_devices: IntCounter,
}

impl Metrics {
    /// Create a fresh registry with all discovery counters registered.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let failures = IntCounter::new(
            "tailfire_sd_failures_total",
            "Number of tailscale service discovery refresh failures.",
        )?;
        let skipped_devices = IntCounter::new(
            "tailfire_sd_skipped_devices_total",
            "Number of devices left out of a refresh because they have no address.",
        )?;

        registry.register(Box::new(failures.clone()))?;
        registry.register(Box::new(skipped_devices.clone()))?;

        Ok(Self {
            registry,
            failures,
            skipped_devices,
        })
    }

    pub(crate) fn record_failure(&self) {
        self.failures.inc();
    }

    pub(crate) fn record_skipped(&self, count: usize) {
        self.skipped_devices
            .inc_by(u64::try_from(count).unwrap_or(u64::MAX));
    }

    /// Refresh failures since this handle was created.
    pub fn failures(&self) -> u64 {
        self.failures.get()
    }

    /// Devices skipped for lack of an address since this handle was created.
    pub fn skipped_devices(&self) -> u64 {
        self.skipped_devices.get()
    }

    /// Render every registered metric in the Prometheus text format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics")
            .field("failures", &self.failures())
            .field("skipped_devices", &self.skipped_devices())
            .finish_non_exhaustive()
    }
}
