//! # Typed Upstream Payload Views
//!
//! Setiap view di-decode dari `serde_json::Value` mentah lewat Field
//! Resolver dengan daftar kandidat konstan. Semua field `Option<_>`:
//! `None` berarti upstream tidak melaporkannya.
//!
//! Decode tidak pernah gagal. Payload yang bukan object menghasilkan view
//! kosong.

use oak_ops_common::field::{self, Candidates};
use oak_ops_common::node_identity::{normalize_node_ids, NormalizedNode};
use serde_json::Value;

pub use oak_ops_common::queue_signals::QueueStatsView;

fn num(raw: &Value, candidates: Candidates) -> Option<f64> {
    field::pick_opt_num(raw, candidates)
}

fn text(raw: &Value, candidates: Candidates) -> Option<String> {
    field::to_opt_string(field::pick(raw, candidates))
}

fn nonempty(raw: &Value, candidates: Candidates) -> Option<String> {
    field::pick_nonempty_str(raw, candidates)
}

fn flag(raw: &Value, candidates: Candidates) -> Option<bool> {
    field::pick(raw, candidates).map(field::truthy)
}

// ════════════════════════════════════════════════════════════════════════════
// CLUSTER STATE
// ════════════════════════════════════════════════════════════════════════════

/// `/v1/ops/snapshots/cluster` (unwrapped) or `/v1/aeron/cluster-state`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClusterStateView {
    pub leader_node_id: Option<f64>,
    pub term: Option<f64>,
    pub member_id: Option<f64>,
    pub role: Option<String>,
    pub reachable_count: Option<f64>,
    pub quorum_size: Option<f64>,
    /// `clusterState` alone, as reported.
    pub cluster_state: Option<String>,
    /// `state`, an older alias of `clusterState`.
    pub state: Option<String>,
    pub health_status: Option<String>,
    pub identity_wallet: Option<String>,
    /// Raw member list; `None` when upstream sent no array.
    pub members: Option<Vec<Value>>,
}

impl ClusterStateView {
    pub const MEMBERS: Candidates = &["nodes", "members", "validators"];
    pub const LEADER_NODE_ID: Candidates = &["leaderNodeId", "leader", "leaderId"];

    pub fn from_value(raw: &Value) -> Self {
        Self {
            leader_node_id: num(raw, Self::LEADER_NODE_ID),
            term: num(raw, &["term", "currentTerm", "electionMetrics.currentTerm"]),
            member_id: num(raw, &["memberId"]),
            role: text(raw, &["role"]),
            reachable_count: num(raw, &["reachableCount"]),
            quorum_size: num(raw, &["quorumSize", "quorum.required"]),
            cluster_state: nonempty(raw, &["clusterState"]),
            state: nonempty(raw, &["state"]),
            health_status: nonempty(raw, &["health.status"]),
            identity_wallet: nonempty(raw, &["validatorIdentity.walletAddress"]),
            members: field::pick(raw, Self::MEMBERS)
                .and_then(Value::as_array)
                .cloned(),
        }
    }

    pub fn members(&self) -> &[Value] {
        self.members.as_deref().unwrap_or(&[])
    }

    /// Members with resolved, unique node ids.
    pub fn normalized_members(&self) -> Vec<NormalizedNode> {
        match &self.members {
            Some(items) => normalize_node_ids(&Value::Array(items.clone())),
            None => Vec::new(),
        }
    }

    /// Members whose `reachable`/`online` flag is truthy (absent counts as reachable).
    pub fn reachable_members(&self) -> u64 {
        self.members()
            .iter()
            .filter(|m| field::pick_bool(m, &["reachable", "online"], true))
            .count() as u64
    }

    /// First raw member with role `LEADER`.
    pub fn leader_member(&self) -> Option<&Value> {
        self.members()
            .iter()
            .find(|m| field::pick_str(m, &["role"], "").to_uppercase() == "LEADER")
    }
}

// ════════════════════════════════════════════════════════════════════════════
// CONSENSUS STATUS
// ════════════════════════════════════════════════════════════════════════════

/// `/v1/consensus/status`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConsensusStatusView {
    pub reachable_validators: Option<f64>,
    pub current_role: Option<String>,
    pub wallet_address: Option<String>,
    pub leader_wallet: Option<String>,
    pub leader_since: Option<String>,
    pub cluster_size: Option<f64>,
    pub current_epoch: Option<f64>,
    pub ethereum_epoch: Option<f64>,
    pub tx_started: Option<f64>,
    pub tx_committed: Option<f64>,
    pub tx_aborted: Option<f64>,
    pub tx_timed_out: Option<f64>,
    pub correlation_id: Option<String>,
    pub transaction_status: Option<String>,
    pub started_at: Option<String>,
    pub updated_at: Option<String>,
    pub timeout_ms: Option<f64>,
    pub reason: Option<Value>,
}

impl ConsensusStatusView {
    pub fn from_value(raw: &Value) -> Self {
        Self {
            reachable_validators: num(raw, &["reachableValidators"]),
            current_role: text(raw, &["currentRole"]),
            wallet_address: nonempty(raw, &["walletAddress"]),
            leader_wallet: nonempty(raw, &["leaderWallet"]),
            leader_since: text(raw, &["leaderSince", "lastLeaderChangeAt"]),
            cluster_size: num(raw, &["clusterSize"]),
            current_epoch: num(raw, &["currentEpoch"]),
            ethereum_epoch: num(raw, &["ethereumEpoch"]),
            tx_started: num(raw, &["txStarted", "startedCount"]),
            tx_committed: num(raw, &["txCommitted", "committedCount"]),
            tx_aborted: num(raw, &["txAborted", "abortedCount"]),
            tx_timed_out: num(raw, &["txTimedOut", "timedOutCount"]),
            correlation_id: text(raw, &["correlationId"]),
            transaction_status: text(raw, &["transactionStatus"]),
            started_at: text(raw, &["startedAt"]),
            updated_at: text(raw, &["updatedAt"]),
            timeout_ms: num(raw, &["timeoutMs"]),
            reason: field::pick(raw, &["reason"]).cloned(),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// REPLICATION
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplicaLagView {
    pub node_id: Option<f64>,
    pub lag_ms: Option<f64>,
    pub status: Option<String>,
}

/// `/v1/ops/snapshots/replication` (unwrapped) or `/v1/aeron/replication-lag`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplicationView {
    pub status: Option<String>,
    pub healthy: Option<bool>,
    pub max_lag_ms: Option<f64>,
    pub max_lag_node_id: Option<f64>,
    pub p95_lag_ms: Option<f64>,
    pub nodes: Vec<ReplicaLagView>,
}

impl ReplicationView {
    pub fn from_value(raw: &Value) -> Self {
        Self {
            status: text(raw, &["status"]),
            healthy: flag(raw, &["healthy"]),
            max_lag_ms: num(raw, &["maxLagMs", "maxLag", "replicationLag"]),
            max_lag_node_id: num(raw, &["maxLagNodeId", "worstNodeId"]),
            p95_lag_ms: num(raw, &["p95LagMs", "p95Lag"]),
            nodes: field::pick_array(raw, &["nodes", "perNode"])
                .iter()
                .map(|node| ReplicaLagView {
                    node_id: num(node, &["nodeId", "id"]),
                    lag_ms: num(node, &["lagMs", "lag"]),
                    status: text(node, &["status"]),
                })
                .collect(),
        }
    }

    /// Reported status, else `ok`/`degraded` from the `healthy` flag.
    pub fn status_or_derived(&self) -> String {
        self.status.clone().unwrap_or_else(|| {
            if self.healthy.unwrap_or(false) {
                "ok".to_string()
            } else {
                "degraded".to_string()
            }
        })
    }
}

// ════════════════════════════════════════════════════════════════════════════
// RAFT METRICS
// ════════════════════════════════════════════════════════════════════════════

/// `/v1/aeron/raft-metrics`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RaftMetricsView {
    pub term: Option<f64>,
    pub commit_index: Option<f64>,
    pub append_rate_per_sec: Option<f64>,
    pub election_count_24h: Option<f64>,
    pub last_election_at: Option<String>,
    pub reachable_validators: Option<f64>,
}

impl RaftMetricsView {
    pub fn from_value(raw: &Value) -> Self {
        Self {
            term: num(raw, &["electionMetrics.currentTerm", "term", "currentTerm"]),
            commit_index: num(raw, &["commitIndex"]),
            append_rate_per_sec: num(raw, &["appendRatePerSec", "appendRate"]),
            election_count_24h: num(
                raw,
                &["electionMetrics.electionCount24h", "electionMetrics.electionCount"],
            ),
            last_election_at: text(raw, &["electionMetrics.lastElectionAt"]),
            reachable_validators: num(raw, &["replicationMetrics.reachableValidators"]),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HEALTH
// ════════════════════════════════════════════════════════════════════════════

/// `/health`, or `/v1/ops/snapshots/health` (unwrapped).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HealthStatusView {
    pub status: Option<String>,
    pub cluster_status: Option<String>,
    pub blob_store_type: Option<String>,
}

impl HealthStatusView {
    pub fn from_value(raw: &Value) -> Self {
        Self {
            status: text(raw, &["status"]),
            cluster_status: text(raw, &["clusterStatus"]),
            blob_store_type: text(raw, &["blobStoreType"]),
        }
    }
}

/// `/health/deep`, already decoded (possibly the partial rescue shape).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeepHealthView {
    pub success: bool,

    pub cluster_status: Option<String>,
    pub cluster_reachable_count: Option<f64>,
    pub cluster_total_members: Option<f64>,
    pub cluster_quorum_size: Option<f64>,

    pub disk_status: Option<String>,
    pub disk_usage_percent: Option<f64>,
    pub disk_usable_gb: Option<f64>,
    pub node_store_status: Option<String>,

    pub media_status: Option<String>,
    pub media_health_status: Option<String>,
    pub media_error_count: Option<f64>,
    pub media_timeout_count: Option<f64>,
    pub media_backpressure_count: Option<f64>,

    pub consensus_status: Option<String>,
    pub consensus_mode: Option<String>,
    pub consensus_role: Option<String>,
    pub consensus_term: Option<f64>,
    pub consensus_epoch: Option<f64>,

    pub clients_status: Option<String>,
    pub registered_clients: Option<f64>,
    pub registered_validators: Option<f64>,

    pub blob_store_type: Option<String>,
    pub blob_store_status: Option<String>,
    pub blob_store_cid_mapping: Option<bool>,
    pub blob_store_ipfs_gateway: Option<Value>,

    pub file_store_latest_head: Option<String>,
}

impl DeepHealthView {
    pub fn from_value(raw: &Value) -> Self {
        Self {
            success: field::pick_bool(raw, &["success"], false),

            cluster_status: text(raw, &["cluster.status"]),
            cluster_reachable_count: num(raw, &["cluster.reachableCount"]),
            cluster_total_members: num(raw, &["cluster.totalMembers"]),
            cluster_quorum_size: num(raw, &["cluster.quorumSize"]),

            disk_status: text(raw, &["diskSpace.status"]),
            disk_usage_percent: num(raw, &["diskSpace.usagePercent"]),
            disk_usable_gb: num(raw, &["diskSpace.usableGb"]),
            node_store_status: text(raw, &["nodeStore.status"]),

            media_status: text(raw, &["mediaDriver.status"]),
            media_health_status: text(raw, &["mediaDriver.healthStatus"]),
            media_error_count: num(raw, &["mediaDriver.errorCount"]),
            media_timeout_count: num(raw, &["mediaDriver.timeoutCount"]),
            media_backpressure_count: num(raw, &["mediaDriver.backpressureCount"]),

            consensus_status: text(raw, &["consensus.status"]),
            consensus_mode: text(raw, &["consensus.mode"]),
            consensus_role: text(raw, &["consensus.role"]),
            consensus_term: num(raw, &["consensus.term"]),
            consensus_epoch: num(raw, &["consensus.epoch"]),

            clients_status: text(raw, &["clients.status"]),
            registered_clients: num(raw, &["clients.registeredClients"]),
            registered_validators: num(raw, &["clients.registeredValidators"]),

            blob_store_type: text(raw, &["blobStore.type"]),
            blob_store_status: text(raw, &["blobStore.status"]),
            blob_store_cid_mapping: flag(raw, &["blobStore.cidMappingAvailable"]),
            blob_store_ipfs_gateway: field::pick(raw, &["blobStore.ipfsGateway"]).cloned(),

            file_store_latest_head: text(raw, &["fileStore.latestHead", "fileStore.head"]),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// EVENTS
// ════════════════════════════════════════════════════════════════════════════

/// One entry of `/v1/events/recent`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventView {
    pub id: Option<String>,
    pub timestamp: Option<String>,
    pub event_type: Option<String>,
    pub severity: Option<String>,
    pub message: Option<String>,
    pub attributes: Option<Value>,
}

impl EventView {
    pub const LIST: Candidates = &["events", "recentEvents"];

    pub fn from_value(raw: &Value) -> Self {
        Self {
            id: text(raw, &["id"]),
            timestamp: text(raw, &["timestamp", "time"]),
            event_type: text(raw, &["type", "eventType"]),
            severity: text(raw, &["severity", "level"]),
            message: text(raw, &["message", "description"]),
            attributes: field::pick(raw, &["attributes"]).cloned(),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// TAR FILES
// ════════════════════════════════════════════════════════════════════════════

/// One entry of `/api/segments/tars`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TarFileView {
    pub name: Option<String>,
    pub size: Option<f64>,
    pub size_formatted: Option<String>,
    pub segment_count: Option<f64>,
    pub created: Option<String>,
}

impl TarFileView {
    pub fn from_value(raw: &Value) -> Self {
        Self {
            name: nonempty(raw, &["name"]),
            size: num(raw, &["size"]),
            size_formatted: nonempty(raw, &["sizeFormatted"]),
            segment_count: num(raw, &["segmentCount"]),
            created: text(raw, &["created"]),
        }
    }

    /// Decode a tar listing; anything but a top-level array is empty.
    pub fn list(raw: &Value) -> Vec<Self> {
        raw.as_array()
            .map(|items| items.iter().map(Self::from_value).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cluster_view_aliases() {
        let view = ClusterStateView::from_value(&json!({
            "leader": "2",
            "currentTerm": 9,
            "quorum": { "required": 2 },
            "health": { "status": "healthy" },
            "validatorIdentity": { "walletAddress": "0xabc" },
            "members": [{ "reachable": false }, { "online": true }, {}],
        }));
        assert_eq!(view.leader_node_id, Some(2.0));
        assert_eq!(view.term, Some(9.0));
        assert_eq!(view.quorum_size, Some(2.0));
        assert_eq!(view.health_status.as_deref(), Some("healthy"));
        assert_eq!(view.identity_wallet.as_deref(), Some("0xabc"));
        assert_eq!(view.members().len(), 3);
        assert_eq!(view.reachable_members(), 2);
    }

    #[test]
    fn test_cluster_view_term_from_election_metrics() {
        let view = ClusterStateView::from_value(&json!({ "electionMetrics": { "currentTerm": 4 } }));
        assert_eq!(view.term, Some(4.0));
        assert!(view.members.is_none());
        assert!(view.normalized_members().is_empty());
    }

    #[test]
    fn test_raft_view_prefers_election_metrics() {
        let view = RaftMetricsView::from_value(&json!({
            "term": 3,
            "electionMetrics": { "currentTerm": 5, "electionCount": 2 },
            "replicationMetrics": { "reachableValidators": 3 },
        }));
        assert_eq!(view.term, Some(5.0));
        assert_eq!(view.election_count_24h, Some(2.0));
        assert_eq!(view.reachable_validators, Some(3.0));
        assert_eq!(view.commit_index, None);
    }

    #[test]
    fn test_replication_status_derivation() {
        assert_eq!(ReplicationView::from_value(&json!({ "healthy": true })).status_or_derived(), "ok");
        assert_eq!(ReplicationView::from_value(&json!({})).status_or_derived(), "degraded");
        assert_eq!(
            ReplicationView::from_value(&json!({ "status": "lagging", "healthy": true })).status_or_derived(),
            "lagging"
        );
    }

    #[test]
    fn test_tar_list_requires_array() {
        assert!(TarFileView::list(&json!({ "files": [] })).is_empty());
        let files = TarFileView::list(&json!([{ "name": "", "size": "1024" }]));
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, None);
        assert_eq!(files[0].size, Some(1024.0));
    }

    #[test]
    fn test_deep_health_rescue_shape() {
        let view = DeepHealthView::from_value(&json!({
            "blobStore": { "type": "ipfs", "status": "up", "ipfsGateway": null }
        }));
        assert_eq!(view.blob_store_type.as_deref(), Some("ipfs"));
        assert_eq!(view.blob_store_ipfs_gateway, None);
        assert!(!view.success);
    }
}
