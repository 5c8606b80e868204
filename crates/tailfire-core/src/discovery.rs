// ── Refresh orchestration ──
//
// Fetch the device list, count failures, hand the result to the builder.
// Every call goes upstream; nothing is cached between calls.

use std::future::Future;

use tracing::{debug, instrument};

use crate::builder::TargetGroupBuilder;
use crate::error::CoreError;
use crate::metrics::Metrics;
use crate::target::TargetGroup;
use tailfire_api::{Device, TailscaleClient};

/// Anything that can produce the current device list of a tailnet.
pub trait DeviceSource: Send + Sync {
    fn fetch_devices(&self) -> impl Future<Output = Result<Vec<Device>, CoreError>> + Send;
}

impl DeviceSource for TailscaleClient {
    async fn fetch_devices(&self) -> Result<Vec<Device>, CoreError> {
        Ok(self.devices().await?)
    }
}

/// One on-demand discovery pass.
///
/// The HTTP layer only depends on this trait, so a caching or
/// single-flight wrapper can be slotted in front of [`Discovery`].
pub trait Refresh: Send + Sync + 'static {
    fn refresh(&self) -> impl Future<Output = Result<Vec<TargetGroup>, CoreError>> + Send;
}

/// Fetcher + builder + failure accounting.
///
/// Safe to share across concurrent requests: the only shared mutable
/// state is the atomic counters inside [`Metrics`].
pub struct Discovery<S> {
    source: S,
    builder: TargetGroupBuilder,
    metrics: Metrics,
}

impl<S: DeviceSource> Discovery<S> {
    pub fn new(source: S, builder: TargetGroupBuilder, metrics: Metrics) -> Self {
        Self {
            source,
            builder,
            metrics,
        }
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

impl<S: DeviceSource + 'static> Refresh for Discovery<S> {
    /// Fetch once and transform. A fetch error increments
    /// `tailfire_sd_failures_total` and is returned unchanged; there is no
    /// retry and no partial result.
    #[instrument(skip_all, fields(source = %self.builder.source()))]
    async fn refresh(&self) -> Result<Vec<TargetGroup>, CoreError> {
        let devices = match self.source.fetch_devices().await {
            Ok(devices) => devices,
            Err(err) => {
                self.metrics.record_failure();
                return Err(err);
            }
        };

        let groups = self.builder.build(&devices);
        let skipped = devices.len() - groups.len();
        if skipped > 0 {
            self.metrics.record_skipped(skipped);
        }

        debug!(devices = devices.len(), groups = groups.len(), "refresh complete");
        Ok(groups)
    }
}
