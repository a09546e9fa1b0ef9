//! # Oak Ops Common
//!
//! Primitive rekonsiliasi yang bebas I/O untuk ops telemetry gateway.
//!
//! ## Modules
//! - `field`: Field Resolver (ordered candidate keys + typed coercion)
//! - `text_parse`: Text-Fallback Parser (stats blobs, malformed deep health)
//! - `node_identity`: Node Identity Normalizer
//! - `queue_signals`: Queue/Proposal Signal Resolver
//! - `format`: byte / wallet rendering
//!
//! ## Layering
//! ```text
//! queue_signals ──┐
//! node_identity ──┼──→ field
//! text_parse ─────┘
//! ```

pub mod field;
pub mod format;
pub mod node_identity;
pub mod queue_signals;
pub mod text_parse;

pub use field::Candidates;
pub use node_identity::{normalize_node_ids, NormalizedNode};
pub use queue_signals::{resolve_queue_signals, QueueSignals, QueueStatsView};
pub use text_parse::{BackpressureStats, BlobStoreRescue, PendingEpochStats};
