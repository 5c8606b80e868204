// tailfire-api: Async Rust client for the Tailscale control-plane device API

pub mod client;
pub mod error;
pub mod models;
pub mod transport;

pub use client::{DEFAULT_API_URL, DEFAULT_TAILNET, TailscaleClient};
pub use error::Error;
pub use models::Device;
pub use transport::TransportConfig;
