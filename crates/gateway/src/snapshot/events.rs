//! Event feed and transaction snapshots: `/ops/v1/events/*` and
//! `/ops/v1/transactions/*`.

use oak_ops_common::field::{self, count_from};
use serde::Serialize;
use serde_json::{json, Map, Value};

use super::{or_now, or_str, SnapshotResolver};
use crate::error::UpstreamError;
use crate::paths;
use crate::payload::{ConsensusStatusView, EventView};

pub const DEFAULT_EVENT_LIMIT: u32 = 12;
pub const MAX_EVENT_LIMIT: u32 = 50;

/// Window the transaction state counters cover.
pub const TRANSACTION_WINDOW_MINUTES: u64 = 60;

/// Parse the `limit` query value. Absent or unparseable input uses the
/// default; numeric input is clamped to `1..=50`.
pub fn clamp_event_limit(raw: Option<&str>) -> u32 {
    let requested = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|n| n.is_finite())
        .unwrap_or(DEFAULT_EVENT_LIMIT as f64);
    requested.clamp(1.0, MAX_EVENT_LIMIT as f64) as u32
}

// ════════════════════════════════════════════════════════════════════════════
// EVENTS
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub id: String,
    pub timestamp: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub severity: String,
    pub message: String,
    pub attributes: Value,
}

impl Event {
    fn project(view: EventView, index: usize) -> Self {
        Self {
            id: view.id.unwrap_or_else(|| format!("evt-{}", index + 1)),
            timestamp: or_now(view.timestamp),
            event_type: or_str(view.event_type, "EVENT"),
            severity: or_str(view.severity, "info"),
            message: or_str(view.message, ""),
            attributes: view.attributes.unwrap_or_else(|| Value::Object(Map::new())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventsRecent {
    pub events: Vec<Event>,
}

impl EventsRecent {
    pub fn build(raw: &Value) -> Self {
        Self {
            events: field::pick_array(raw, EventView::LIST)
                .iter()
                .enumerate()
                .map(|(i, item)| Event::project(EventView::from_value(item), i))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventsStats {
    #[serde(rename = "total24h")]
    pub total_24h: u64,
    pub by_severity: Value,
    pub by_type: Value,
}

impl EventsStats {
    pub fn build(raw: &Value) -> Self {
        Self {
            total_24h: field::pick_count(
                raw,
                &["total24h", "totalEventsBroadcast", "totalEvents", "total"],
            ),
            by_severity: field::pick_or(raw, &["bySeverity"], json!({})),
            by_type: field::pick_or(raw, &["byType"], json!({})),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// TRANSACTIONS
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct TransactionStates {
    pub started: u64,
    pub committed: u64,
    pub aborted: u64,
    pub timed_out: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionsSummary {
    pub states: TransactionStates,
    pub window_minutes: u64,
}

impl TransactionsSummary {
    pub fn build(consensus: &Value) -> Self {
        let consensus = ConsensusStatusView::from_value(consensus);
        Self {
            states: TransactionStates {
                started: count_from(consensus.tx_started),
                committed: count_from(consensus.tx_committed),
                aborted: count_from(consensus.tx_aborted),
                timed_out: count_from(consensus.tx_timed_out),
            },
            window_minutes: TRANSACTION_WINDOW_MINUTES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDetail {
    pub transaction_id: String,
    pub correlation_id: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub timeout_ms: f64,
    pub reason: Value,
}

impl TransactionDetail {
    pub fn build(transaction_id: &str, consensus: &Value) -> Self {
        let consensus = ConsensusStatusView::from_value(consensus);
        Self {
            transaction_id: transaction_id.to_string(),
            correlation_id: or_str(consensus.correlation_id, "unknown"),
            status: or_str(consensus.transaction_status, "UNKNOWN"),
            started_at: or_now(consensus.started_at),
            updated_at: or_now(consensus.updated_at),
            timeout_ms: consensus.timeout_ms.unwrap_or(0.0),
            reason: consensus.reason.unwrap_or(Value::Null),
        }
    }
}

impl SnapshotResolver {
    pub async fn events_recent(&self, limit: u32) -> Result<EventsRecent, UpstreamError> {
        let path = paths::events_recent(limit.clamp(1, MAX_EVENT_LIMIT));
        let raw = self.upstream().get(&path).await?;
        Ok(EventsRecent::build(&raw))
    }

    pub async fn events_stats(&self) -> Result<EventsStats, UpstreamError> {
        let raw = self.upstream().get(paths::EVENTS_STATS).await?;
        Ok(EventsStats::build(&raw))
    }

    pub async fn transactions_summary(&self) -> Result<TransactionsSummary, UpstreamError> {
        let raw = self.upstream().get(paths::CONSENSUS_STATUS).await?;
        Ok(TransactionsSummary::build(&raw))
    }

    pub async fn transaction_detail(&self, transaction_id: &str) -> Result<TransactionDetail, UpstreamError> {
        let raw = self.upstream().get(paths::CONSENSUS_STATUS).await?;
        Ok(TransactionDetail::build(transaction_id, &raw))
    }
}
