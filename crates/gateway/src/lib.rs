//! # Oak Ops Gateway
//!
//! Read-only gateway yang merekonsiliasi status cluster Oak menjadi snapshot
//! stabil untuk dashboard operasional.
//!
//! ## Architecture
//! ```text
//! Dashboard → server (front door) → SnapshotResolver → UpstreamClient → Oak node
//!                  │                                        │
//!                  └──→ canned (static mode)                └──→ UpstreamCache
//! ```
//!
//! ## Modules
//! - `config`: environment configuration
//! - `cache`: bounded TTL cache untuk fallback 429
//! - `upstream`: HTTP client, snapshot fallback
//! - `leader`: leader base URL resolution
//! - `payload`: typed views atas payload upstream
//! - `snapshot`: satu resolver per endpoint
//! - `envelope`: versioned response envelope
//! - `server`: axum router dan middleware front door
//! - `metrics`: Prometheus counters

pub mod cache;
pub mod canned;
pub mod config;
pub mod envelope;
pub mod error;
pub mod leader;
pub mod metrics;
pub mod paths;
pub mod payload;
pub mod server;
pub mod snapshot;
pub mod upstream;

pub use cache::UpstreamCache;
pub use config::{GatewayConfig, GatewayMode};
pub use envelope::{Envelope, ErrorEnvelope};
pub use error::{ConfigError, GatewayError, UpstreamError};
pub use metrics::GatewayMetrics;
pub use server::{router, AppState, Endpoint};
pub use snapshot::SnapshotResolver;
pub use upstream::UpstreamClient;
