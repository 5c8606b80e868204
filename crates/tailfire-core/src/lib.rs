// tailfire-core: Tailnet devices in, Prometheus HTTP SD target groups out.

pub mod builder;
pub mod discovery;
pub mod error;
pub mod labels;
pub mod metrics;
pub mod target;

// ── Primary re-exports ──────────────────────────────────────────────
pub use builder::TargetGroupBuilder;
pub use discovery::{DeviceSource, Discovery, Refresh};
pub use error::CoreError;
pub use labels::LabelSet;
pub use metrics::Metrics;
pub use target::TargetGroup;

pub use tailfire_api::Device;
