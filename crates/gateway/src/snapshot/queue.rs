//! Queue-derived snapshots: `/ops/v1/queue`, `/ops/v1/proposals`,
//! `/ops/v1/durability`, `/ops/v1/finality`.
//!
//! Semua counter pressure melewati [`resolve_queue_signals`] agar keempat
//! endpoint melaporkan angka yang sama untuk payload yang sama.

use oak_ops_common::field::count_from;
use oak_ops_common::queue_signals::{resolve_queue_signals, QueueSignals, QueueStatsView};
use serde::Serialize;
use serde_json::Value;

use super::SnapshotResolver;
use crate::envelope::now_iso;
use crate::error::UpstreamError;
use crate::paths;
use crate::payload::ConsensusStatusView;

/// Marker for per-type state counts the upstream does not expose yet.
pub const NEEDS_UPSTREAM_COUNTERS: &str = "needs_upstream_counters";

// ════════════════════════════════════════════════════════════════════════════
// QUEUE
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueSnapshot {
    pub pending_count: u64,
    pub queue_pending_count: u64,
    pub mempool_count: u64,
    pub backpressure_pending_count: u64,
    pub backpressure_max_pending: u64,
    pub backpressure_active: bool,
    pub epoch_queue_depth: u64,
    pub oldest_pending_age_ms: f64,
    pub ingress_rate_per_sec: f64,
    pub egress_rate_per_sec: f64,
}

impl QueueSnapshot {
    pub fn build(raw: &Value) -> Self {
        let view = QueueStatsView::from_value(raw);
        let signals = resolve_queue_signals(&view);
        Self {
            pending_count: signals.queue_pending,
            queue_pending_count: signals.queue_pending,
            mempool_count: signals.mempool,
            backpressure_pending_count: signals.backpressure_pending,
            backpressure_max_pending: signals.backpressure_max,
            backpressure_active: signals.backpressure_active,
            epoch_queue_depth: count_from(view.epoch_queue_depth).max(signals.pending_epochs),
            oldest_pending_age_ms: view.oldest_pending_age_ms.unwrap_or(0.0),
            ingress_rate_per_sec: view.ingress_rate_per_sec.unwrap_or(0.0),
            egress_rate_per_sec: view.egress_rate_per_sec.unwrap_or(0.0),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// PROPOSALS
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuePressure {
    pub pending: u64,
    pub queue_pending: u64,
    pub mempool: u64,
    pub backpressure_pending: u64,
    pub backpressure_max: u64,
    pub backpressure_active: bool,
    pub backpressure_sent: u64,
    pub backpressure_acked: u64,
}

impl From<&QueueSignals> for QueuePressure {
    fn from(s: &QueueSignals) -> Self {
        Self {
            pending: s.queue_pending,
            queue_pending: s.queue_pending,
            mempool: s.mempool,
            backpressure_pending: s.backpressure_pending,
            backpressure_max: s.backpressure_max,
            backpressure_active: s.backpressure_active,
            backpressure_sent: s.backpressure_sent,
            backpressure_acked: s.backpressure_acked,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProposalStates {
    pub unverified: u64,
    pub verified: u64,
    pub finalized: u64,
    pub rejected: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProposalTypes {
    pub write: u64,
    pub delete: u64,
    pub total: u64,
}

/// Per-type state slice. All `None` until upstream publishes the counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TypeStateCounts {
    pub unverified: Option<u64>,
    pub verified: Option<u64>,
    pub finalized: Option<u64>,
    pub rejected: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateByType {
    pub write: TypeStateCounts,
    pub delete: TypeStateCounts,
    pub availability: &'static str,
}

impl StateByType {
    pub fn unavailable() -> Self {
        Self {
            write: TypeStateCounts::default(),
            delete: TypeStateCounts::default(),
            availability: NEEDS_UPSTREAM_COUNTERS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalEpochs {
    pub current_epoch: u64,
    pub finalized_epoch: u64,
    pub epochs_until_finality: u64,
    pub pending_epochs: u64,
    pub total_queued: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalsSnapshot {
    pub queue_pressure: QueuePressure,
    pub states: ProposalStates,
    pub types: ProposalTypes,
    pub state_by_type: StateByType,
    pub epochs: ProposalEpochs,
}

impl ProposalsSnapshot {
    pub fn build(raw: &Value) -> Self {
        let view = QueueStatsView::from_value(raw);
        let signals = resolve_queue_signals(&view);

        let write = count_from(view.write_proposals);
        let delete = count_from(view.delete_proposals);
        let total = count_from(view.total_proposals).max(write.saturating_add(delete));

        Self {
            queue_pressure: QueuePressure::from(&signals),
            states: ProposalStates {
                unverified: count_from(view.unverified_queue_size)
                    .saturating_add(count_from(view.pending_count)),
                verified: count_from(view.total_verified),
                finalized: count_from(view.total_finalized),
                rejected: count_from(view.total_rejected),
            },
            types: ProposalTypes { write, delete, total },
            state_by_type: StateByType::unavailable(),
            epochs: ProposalEpochs {
                current_epoch: count_from(view.current_epoch),
                finalized_epoch: count_from(view.finalized_epoch),
                epochs_until_finality: count_from(view.epochs_until_finality),
                pending_epochs: signals.pending_epochs,
                total_queued: signals.total_queued_from_stats.unwrap_or(total),
            },
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// DURABILITY
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DurabilitySnapshot {
    pub status: &'static str,
    pub pending_acks: u64,
    #[serde(rename = "ackTimeouts1h")]
    pub ack_timeouts_1h: u64,
    pub last_ack_at: String,
}

impl DurabilitySnapshot {
    pub fn build(raw: &Value) -> Self {
        let view = QueueStatsView::from_value(raw);
        Self {
            status: "ok",
            pending_acks: count_from(view.persistence_pending_changes),
            ack_timeouts_1h: count_from(view.max_retry_count),
            last_ack_at: now_iso(),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// FINALITY
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalitySnapshot {
    pub current_epoch: u64,
    pub ethereum_epoch: u64,
    pub finalized_epoch: u64,
    pub epochs_until_finality: u64,
    pub pending_proposals: u64,
    pub pending_epochs: u64,
    pub total_queued: u64,
    pub backpressure_pending: u64,
    pub total_finalized: u64,
}

impl FinalitySnapshot {
    pub fn build(consensus: &Value, queue: &Value) -> Self {
        let consensus = ConsensusStatusView::from_value(consensus);
        let view = QueueStatsView::from_value(queue);
        let signals = resolve_queue_signals(&view);

        Self {
            current_epoch: count_from(view.current_epoch.or(consensus.current_epoch)),
            ethereum_epoch: count_from(consensus.ethereum_epoch),
            finalized_epoch: count_from(view.finalized_epoch),
            epochs_until_finality: count_from(view.epochs_until_finality),
            pending_proposals: signals.queue_pending,
            pending_epochs: signals.pending_epochs,
            total_queued: signals
                .total_queued_from_stats
                .unwrap_or_else(|| count_from(view.total_proposals.or(view.write_proposals))),
            backpressure_pending: signals.backpressure_pending,
            total_finalized: count_from(view.total_finalized),
        }
    }
}

impl SnapshotResolver {
    async fn leader_queue(&self) -> Result<Value, UpstreamError> {
        let leader_base = self.leader_base().await;
        self.upstream()
            .get_snapshot_pair(paths::snapshot::QUEUE, &leader_base)
            .await
    }

    pub async fn queue(&self) -> Result<QueueSnapshot, UpstreamError> {
        Ok(QueueSnapshot::build(&self.leader_queue().await?))
    }

    pub async fn proposals(&self) -> Result<ProposalsSnapshot, UpstreamError> {
        Ok(ProposalsSnapshot::build(&self.leader_queue().await?))
    }

    pub async fn durability(&self) -> Result<DurabilitySnapshot, UpstreamError> {
        Ok(DurabilitySnapshot::build(&self.leader_queue().await?))
    }

    pub async fn finality(&self) -> Result<FinalitySnapshot, UpstreamError> {
        let (consensus, queue) = tokio::try_join!(
            self.upstream().get(paths::CONSENSUS_STATUS),
            self.default_snapshot(paths::snapshot::QUEUE),
        )?;
        Ok(FinalitySnapshot::build(&consensus, &queue))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_queue_epoch_depth_takes_max() {
        let snap = QueueSnapshot::build(&json!({
            "epochDepth": 1,
            "pendingEpochStats": "Pending Epochs: 3",
            "inRate": 24.5,
            "backpressureStats": "pending=5 max=100 active=true",
        }));
        assert_eq!(snap.epoch_queue_depth, 3);
        assert_eq!(snap.ingress_rate_per_sec, 24.5);
        assert_eq!(snap.egress_rate_per_sec, 0.0);
        assert!(snap.backpressure_active);
        assert_eq!(snap.backpressure_max_pending, 100);
    }

    #[test]
    fn test_proposals_totals_and_gap_marker() {
        let snap = ProposalsSnapshot::build(&json!({
            "writeProposals": 12186,
            "deleteProposals": 88,
            "totalProposals": 100,
            "unverifiedQueueSize": 2000,
            "pendingCount": 488,
            "verifiedCount": 9698,
            "verifierRejectedCount": 24,
        }));
        assert_eq!(snap.types.total, 12274);
        assert_eq!(snap.states.unverified, 2488);
        assert_eq!(snap.states.verified, 9698);
        assert_eq!(snap.states.rejected, 24);
        assert_eq!(snap.epochs.total_queued, 12274);
        assert_eq!(snap.queue_pressure.mempool, 2000);

        let value = serde_json::to_value(&snap).unwrap();
        assert_eq!(value["stateByType"]["availability"], "needs_upstream_counters");
        assert!(value["stateByType"]["write"]["verified"].is_null());
        assert!(value["stateByType"]["delete"]["rejected"].is_null());
    }

    #[test]
    fn test_proposals_total_queued_prefers_stats_text() {
        let snap = ProposalsSnapshot::build(&json!({
            "totalProposals": 50,
            "pendingEpochStats": "Total Queued: 40",
        }));
        assert_eq!(snap.epochs.total_queued, 40);
    }

    #[test]
    fn test_durability_field_names() {
        let snap = DurabilitySnapshot::build(&json!({ "persistencePendingChanges": 2, "maxRetryCount": 1 }));
        let value = serde_json::to_value(&snap).unwrap();
        assert_eq!(value["pendingAcks"], 2);
        assert_eq!(value["ackTimeouts1h"], 1);
        assert_eq!(value["status"], "ok");
    }

    #[test]
    fn test_finality_epoch_sources() {
        let snap = FinalitySnapshot::build(
            &json!({ "currentEpoch": 1047, "ethereumEpoch": 1046 }),
            &json!({ "finalizedEpoch": 1045, "writeProposals": 12186, "totalFinalizedCount": 9698 }),
        );
        assert_eq!(snap.current_epoch, 1047);
        assert_eq!(snap.ethereum_epoch, 1046);
        assert_eq!(snap.finalized_epoch, 1045);
        assert_eq!(snap.total_queued, 12186);
        assert_eq!(snap.total_finalized, 9698);
    }
}
