//! # Queue / Proposal Signal Resolver
//!
//! Menggabungkan counter mentah yang tumpang-tindih menjadi satu set sinyal
//! queue-pressure kanonik.
//!
//! ## Prinsip
//!
//! Upstream mengekspos counter logis yang sama lewat beberapa channel:
//! field bertipe (dengan nama berbeda per deployment) dan blob teks
//! statistik legacy. Nilai kanonik diambil sebagai MAKSIMUM dari semua
//! channel, sehingga channel yang tertinggal atau kosong ditoleransi dan
//! pressure tidak pernah under-reported.
//!
//! ## Invariant
//!
//! Monotonik: menaikkan satu input terstruktur tidak pernah menurunkan
//! output kanonik yang bersesuaian.

use serde::Serialize;
use serde_json::Value;

use crate::field::{self, count_from, Candidates};
use crate::text_parse::{
    parse_backpressure_stats, parse_pending_epoch_stats, BackpressureStats, PendingEpochStats,
};

// ════════════════════════════════════════════════════════════════════════════
// CANDIDATE FIELDS
// ════════════════════════════════════════════════════════════════════════════

const PENDING: Candidates = &["pendingCount", "pending"];
const BATCH_QUEUE_SIZE: Candidates = &["batchQueueSize"];
const MEMPOOL: Candidates = &[
    "mempoolPendingCount",
    "mempoolCount",
    "mempool",
    "mempoolSize",
    "unverifiedQueueSize",
];
const BACKPRESSURE_PENDING: Candidates = &["backpressurePendingCount"];
const BACKPRESSURE_MAX: Candidates = &["backpressureMaxPending"];
const BACKPRESSURE_ACTIVE: Candidates = &["backpressureActive"];
const PENDING_EPOCH_STATS: Candidates = &["pendingEpochStats"];
const BACKPRESSURE_STATS: Candidates = &["backpressureStats"];

const OLDEST_PENDING_AGE: Candidates = &["oldestPendingAgeMs", "oldestAgeMs"];
const EPOCH_QUEUE_DEPTH: Candidates = &["epochQueueDepth", "epochDepth", "epochsUntilFinality"];
const INGRESS_RATE: Candidates = &["ingressRatePerSec", "inRate"];
const EGRESS_RATE: Candidates = &["egressRatePerSec", "outRate"];
const WRITE_PROPOSALS: Candidates = &["writeProposals"];
const DELETE_PROPOSALS: Candidates = &["deleteProposals"];
const TOTAL_PROPOSALS: Candidates = &["totalProposals"];
const TOTAL_FINALIZED: Candidates = &["totalFinalizedCount"];
const TOTAL_VERIFIED: Candidates = &["totalVerifiedCount", "verifiedCount"];
const TOTAL_REJECTED: Candidates = &["totalRejectedCount", "rejectedCount", "verifierRejectedCount"];
const UNVERIFIED_QUEUE_SIZE: Candidates = &["unverifiedQueueSize"];
const PENDING_COUNT_ONLY: Candidates = &["pendingCount"];
const CURRENT_EPOCH: Candidates = &["currentEpoch"];
const FINALIZED_EPOCH: Candidates = &["finalizedEpoch"];
const EPOCHS_UNTIL_FINALITY: Candidates = &["epochsUntilFinality"];
const PERSISTENCE_PENDING: Candidates = &["persistencePendingChanges"];
const MAX_RETRY_COUNT: Candidates = &["maxRetryCount"];

// ════════════════════════════════════════════════════════════════════════════
// QUEUE STATS VIEW
// ════════════════════════════════════════════════════════════════════════════

/// Typed view over a raw queue-stats payload (`/v1/ops/snapshots/queue` or
/// `/v1/proposals/queue/stats`).
///
/// Every field is optional: `None` means the upstream did not report it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueueStatsView {
    pub pending: Option<f64>,
    pub batch_queue_size: Option<f64>,
    pub mempool: Option<f64>,
    pub backpressure_pending_count: Option<f64>,
    pub backpressure_max_pending: Option<f64>,
    pub backpressure_active: Option<bool>,
    pub pending_epoch_stats: Option<String>,
    pub backpressure_stats: Option<String>,

    pub oldest_pending_age_ms: Option<f64>,
    pub epoch_queue_depth: Option<f64>,
    pub ingress_rate_per_sec: Option<f64>,
    pub egress_rate_per_sec: Option<f64>,
    pub write_proposals: Option<f64>,
    pub delete_proposals: Option<f64>,
    pub total_proposals: Option<f64>,
    pub total_finalized: Option<f64>,
    pub total_verified: Option<f64>,
    pub total_rejected: Option<f64>,
    pub unverified_queue_size: Option<f64>,
    /// `pendingCount` alone, without the `pending` alias.
    pub pending_count: Option<f64>,
    pub current_epoch: Option<f64>,
    pub finalized_epoch: Option<f64>,
    pub epochs_until_finality: Option<f64>,
    pub persistence_pending_changes: Option<f64>,
    pub max_retry_count: Option<f64>,
}

impl QueueStatsView {
    /// Decode from a raw payload. Never fails.
    pub fn from_value(raw: &Value) -> Self {
        let num = |c: Candidates| field::pick_opt_num(raw, c);
        let text = |c: Candidates| {
            field::pick(raw, c)
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        Self {
            pending: num(PENDING),
            batch_queue_size: num(BATCH_QUEUE_SIZE),
            mempool: num(MEMPOOL),
            backpressure_pending_count: num(BACKPRESSURE_PENDING),
            backpressure_max_pending: num(BACKPRESSURE_MAX),
            backpressure_active: field::pick(raw, BACKPRESSURE_ACTIVE).map(field::truthy),
            pending_epoch_stats: text(PENDING_EPOCH_STATS),
            backpressure_stats: text(BACKPRESSURE_STATS),

            oldest_pending_age_ms: num(OLDEST_PENDING_AGE),
            epoch_queue_depth: num(EPOCH_QUEUE_DEPTH),
            ingress_rate_per_sec: num(INGRESS_RATE),
            egress_rate_per_sec: num(EGRESS_RATE),
            write_proposals: num(WRITE_PROPOSALS),
            delete_proposals: num(DELETE_PROPOSALS),
            total_proposals: num(TOTAL_PROPOSALS),
            total_finalized: num(TOTAL_FINALIZED),
            total_verified: num(TOTAL_VERIFIED),
            total_rejected: num(TOTAL_REJECTED),
            unverified_queue_size: num(UNVERIFIED_QUEUE_SIZE),
            pending_count: num(PENDING_COUNT_ONLY),
            current_epoch: num(CURRENT_EPOCH),
            finalized_epoch: num(FINALIZED_EPOCH),
            epochs_until_finality: num(EPOCHS_UNTIL_FINALITY),
            persistence_pending_changes: num(PERSISTENCE_PENDING),
            max_retry_count: num(MAX_RETRY_COUNT),
        }
    }

    pub fn pending_epoch_text(&self) -> PendingEpochStats {
        parse_pending_epoch_stats(self.pending_epoch_stats.as_deref())
    }

    pub fn backpressure_text(&self) -> BackpressureStats {
        parse_backpressure_stats(self.backpressure_stats.as_deref())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// QUEUE SIGNALS
// ════════════════════════════════════════════════════════════════════════════

/// Canonical queue-pressure counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueSignals {
    pub queue_pending: u64,
    pub mempool: u64,
    pub backpressure_pending: u64,
    pub backpressure_max: u64,
    pub backpressure_active: bool,
    pub backpressure_sent: u64,
    pub backpressure_acked: u64,
    pub pending_epochs: u64,
    /// `None` when the stats blob carried no `Total Queued` line.
    pub total_queued_from_stats: Option<u64>,
}

impl QueueSignals {
    /// Shorthand for `resolve_queue_signals(&QueueStatsView::from_value(raw))`.
    pub fn from_raw(raw: &Value) -> Self {
        resolve_queue_signals(&QueueStatsView::from_value(raw))
    }
}

/// Merge structured and text-derived counters into [`QueueSignals`].
pub fn resolve_queue_signals(view: &QueueStatsView) -> QueueSignals {
    let epoch_text = view.pending_epoch_text();
    let bp_text = view.backpressure_text();

    let queue_pending = count_from(view.pending)
        .max(count_from(view.batch_queue_size))
        .max(epoch_text.pending_proposals.unwrap_or(0));

    let backpressure_pending =
        count_from(view.backpressure_pending_count).max(bp_text.pending.unwrap_or(0));
    let backpressure_max =
        count_from(view.backpressure_max_pending).max(bp_text.max.unwrap_or(0));

    QueueSignals {
        queue_pending,
        mempool: count_from(view.mempool),
        backpressure_pending,
        backpressure_max,
        backpressure_active: view.backpressure_active.unwrap_or(false)
            || bp_text.active == Some(true),
        backpressure_sent: bp_text.sent.unwrap_or(0),
        backpressure_acked: bp_text.acked.unwrap_or(0),
        pending_epochs: epoch_text.pending_epochs.unwrap_or(0),
        total_queued_from_stats: epoch_text.total_queued,
    }
}

// ════════════════════════════════════════════════════════════════════════════
// UNIT TESTS
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_queue_pending_takes_maximum() {
        let signals = QueueSignals::from_raw(&json!({
            "pendingCount": 5,
            "batchQueueSize": 9,
            "pendingEpochStats": "Pending Proposals: 3",
        }));
        assert_eq!(signals.queue_pending, 9);
    }

    #[test]
    fn test_text_value_wins_when_larger() {
        let signals = QueueSignals::from_raw(&json!({
            "pending": 2,
            "pendingEpochStats": "Pending Proposals: 30\nPending Epochs: 4",
        }));
        assert_eq!(signals.queue_pending, 30);
        assert_eq!(signals.pending_epochs, 4);
    }

    #[test]
    fn test_mempool_first_present_alias() {
        let signals = QueueSignals::from_raw(&json!({ "mempoolSize": 8, "unverifiedQueueSize": 99 }));
        assert_eq!(signals.mempool, 8);
        assert_eq!(QueueSignals::from_raw(&json!({})).mempool, 0);
    }

    #[test]
    fn test_backpressure_merge() {
        let signals = QueueSignals::from_raw(&json!({
            "backpressurePendingCount": 10,
            "backpressureMaxPending": 500,
            "backpressureActive": false,
            "backpressureStats": "pending=40 max=100 active=true sent=7 acked=6",
        }));
        assert_eq!(signals.backpressure_pending, 40);
        assert_eq!(signals.backpressure_max, 500);
        assert!(signals.backpressure_active);
        assert_eq!(signals.backpressure_sent, 7);
        assert_eq!(signals.backpressure_acked, 6);
    }

    #[test]
    fn test_structured_active_alone() {
        let signals = QueueSignals::from_raw(&json!({ "backpressureActive": true }));
        assert!(signals.backpressure_active);
    }

    #[test]
    fn test_total_queued_absent_is_none_not_zero() {
        let signals = QueueSignals::from_raw(&json!({ "pendingEpochStats": "Pending Epochs: 1" }));
        assert_eq!(signals.total_queued_from_stats, None);

        let signals = QueueSignals::from_raw(&json!({ "pendingEpochStats": "Total Queued: 0" }));
        assert_eq!(signals.total_queued_from_stats, Some(0));
    }

    #[test]
    fn test_monotonic_in_structured_inputs() {
        let base = json!({
            "pendingCount": 4,
            "batchQueueSize": 6,
            "backpressurePendingCount": 3,
            "backpressureMaxPending": 20,
            "pendingEpochStats": "Pending Proposals: 5",
            "backpressureStats": "pending=8 max=15",
        });
        let before = QueueSignals::from_raw(&base);

        for (key, bump) in [
            ("pendingCount", 1u64),
            ("pendingCount", 50),
            ("batchQueueSize", 1),
            ("batchQueueSize", 50),
            ("backpressurePendingCount", 1),
            ("backpressurePendingCount", 50),
            ("backpressureMaxPending", 1),
        ] {
            let mut raised = base.clone();
            let current = raised[key].as_u64().unwrap();
            raised[key] = json!(current + bump);
            let after = QueueSignals::from_raw(&raised);
            assert!(after.queue_pending >= before.queue_pending, "{key}");
            assert!(after.backpressure_pending >= before.backpressure_pending, "{key}");
            assert!(after.backpressure_max >= before.backpressure_max, "{key}");
        }
    }

    #[test]
    fn test_serializes_camel_case_with_null() {
        let value = serde_json::to_value(QueueSignals::default()).unwrap();
        assert_eq!(value["queuePending"], 0);
        assert!(value["totalQueuedFromStats"].is_null());
    }
}
