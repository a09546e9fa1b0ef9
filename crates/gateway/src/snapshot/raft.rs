//! `/ops/v1/raft` and `/ops/v1/replication`.

use oak_ops_common::field::count_from;
use serde::Serialize;
use serde_json::Value;

use super::{or_now, or_str, SnapshotResolver};
use crate::error::UpstreamError;
use crate::paths;
use crate::payload::{RaftMetricsView, ReplicationView};

// ════════════════════════════════════════════════════════════════════════════
// RAFT
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RaftSnapshot {
    pub term: u64,
    pub commit_index: u64,
    pub append_rate_per_sec: f64,
    #[serde(rename = "electionCount24h")]
    pub election_count_24h: u64,
    pub last_election_at: String,
    pub reachable_validators: u64,
}

impl RaftSnapshot {
    pub fn build(raw: &Value) -> Self {
        let raft = RaftMetricsView::from_value(raw);
        Self {
            term: count_from(raft.term),
            commit_index: count_from(raft.commit_index),
            append_rate_per_sec: raft.append_rate_per_sec.unwrap_or(0.0),
            election_count_24h: count_from(raft.election_count_24h),
            last_election_at: or_now(raft.last_election_at),
            reachable_validators: count_from(raft.reachable_validators),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// REPLICATION
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplicaLag {
    pub node_id: u64,
    pub lag_ms: f64,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplicationSnapshot {
    pub status: String,
    pub max_lag_ms: f64,
    pub p95_lag_ms: f64,
    pub nodes: Vec<ReplicaLag>,
}

impl ReplicationSnapshot {
    pub fn build(raw: &Value) -> Self {
        let replication = ReplicationView::from_value(raw);
        Self {
            status: replication.status_or_derived(),
            max_lag_ms: replication.max_lag_ms.unwrap_or(0.0),
            p95_lag_ms: replication.p95_lag_ms.unwrap_or(0.0),
            nodes: replication
                .nodes
                .into_iter()
                .map(|node| ReplicaLag {
                    node_id: count_from(node.node_id),
                    lag_ms: node.lag_ms.unwrap_or(0.0),
                    status: or_str(node.status, "unknown"),
                })
                .collect(),
        }
    }
}

impl SnapshotResolver {
    pub async fn raft(&self) -> Result<RaftSnapshot, UpstreamError> {
        let raw = self.upstream().get(paths::RAFT_METRICS).await?;
        Ok(RaftSnapshot::build(&raw))
    }

    pub async fn replication(&self) -> Result<ReplicationSnapshot, UpstreamError> {
        let leader_base = self.leader_base().await;
        let raw = self
            .upstream()
            .get_snapshot_pair(paths::snapshot::REPLICATION, &leader_base)
            .await?;
        Ok(ReplicationSnapshot::build(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_raft_defaults() {
        let snap = RaftSnapshot::build(&json!({ "commitIndex": "12502", "appendRate": 138.5 }));
        assert_eq!(snap.term, 0);
        assert_eq!(snap.commit_index, 12502);
        assert_eq!(snap.append_rate_per_sec, 138.5);
        assert!(!snap.last_election_at.is_empty());

        let value = serde_json::to_value(&snap).unwrap();
        assert!(value.get("electionCount24h").is_some());
    }

    #[test]
    fn test_replication_per_node_aliases() {
        let snap = ReplicationSnapshot::build(&json!({
            "maxLag": 55,
            "p95Lag": 31,
            "perNode": [{ "id": 2, "lag": 55.5 }, { "nodeId": 0, "lagMs": 24, "status": "ok" }],
        }));
        assert_eq!(snap.status, "degraded");
        assert_eq!(snap.max_lag_ms, 55.0);
        assert_eq!(snap.p95_lag_ms, 31.0);
        assert_eq!(snap.nodes[0], ReplicaLag { node_id: 2, lag_ms: 55.5, status: "unknown".to_string() });
        assert_eq!(snap.nodes[1].status, "ok");
    }
}
