//! # Snapshot Resolvers
//!
//! Satu resolver per endpoint ops. Setiap resolver mengambil 1–5 payload
//! upstream (paralel jika independen), me-decode lewat typed view, lalu
//! membangun output schema yang stabil.
//!
//! ## Prinsip
//!
//! - Stateless per call; satu-satunya state bersama adalah cache upstream
//! - Fetch dan build dipisah: `build` murni dan bisa dites tanpa HTTP
//! - Field yang absen selalu punya default terdokumentasi, tidak pernah panic
//!
//! ## Leader Routing
//!
//! `overview`, `replication`, `queue`, `proposals`, dan `durability` membaca
//! snapshot dari base URL leader (lihat [`crate::leader`]).

use serde_json::Value;

use crate::envelope::now_iso;
use crate::error::UpstreamError;
use crate::leader::resolve_leader_base;
use crate::upstream::UpstreamClient;

pub mod cluster;
pub mod events;
pub mod header;
pub mod health;
pub mod overview;
pub mod queue;
pub mod raft;
pub mod tar;

pub use cluster::{ClusterNode, ClusterSnapshot};
pub use events::{clamp_event_limit, EventsRecent, EventsStats, TransactionDetail, TransactionsSummary};
pub use header::HeaderSnapshot;
pub use health::HealthSnapshot;
pub use overview::OverviewSnapshot;
pub use queue::{DurabilitySnapshot, FinalitySnapshot, ProposalsSnapshot, QueueSnapshot};
pub use raft::{RaftSnapshot, ReplicationSnapshot};
pub use tar::{TarChainSnapshot, TarGrowthSnapshot};

#[derive(Debug, Clone)]
pub struct SnapshotResolver {
    upstream: UpstreamClient,
    chain_mode: String,
}

impl SnapshotResolver {
    pub fn new(upstream: UpstreamClient, chain_mode: impl Into<String>) -> Self {
        Self {
            upstream,
            chain_mode: chain_mode.into(),
        }
    }

    pub fn upstream(&self) -> &UpstreamClient {
        &self.upstream
    }

    pub fn chain_mode(&self) -> &str {
        &self.chain_mode
    }

    async fn leader_base(&self) -> String {
        resolve_leader_base(&self.upstream).await
    }

    /// Snapshot read against the default upstream base.
    async fn default_snapshot(&self, pair: (&str, &str)) -> Result<Value, UpstreamError> {
        self.upstream
            .get_snapshot_pair(pair, self.upstream.default_base())
            .await
    }
}

/// Value or the current time; used for timestamps upstream did not report.
fn or_now(value: Option<String>) -> String {
    value.unwrap_or_else(now_iso)
}

/// Value or a fixed default string.
fn or_str(value: Option<String>, default: &str) -> String {
    value.unwrap_or_else(|| default.to_string())
}
