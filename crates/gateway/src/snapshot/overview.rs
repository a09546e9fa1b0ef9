//! `/ops/v1/overview`: one-glance cluster state.

use oak_ops_common::field::{self, count_from};
use oak_ops_common::queue_signals::{resolve_queue_signals, QueueStatsView};
use serde::Serialize;
use serde_json::Value;

use super::{or_now, SnapshotResolver};
use crate::error::UpstreamError;
use crate::paths;
use crate::payload::{ClusterStateView, ConsensusStatusView, ReplicationView};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewLeader {
    pub node_id: u64,
    pub wallet: String,
    pub role: String,
    pub term: u64,
    pub since: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewCluster {
    pub node_count: u64,
    pub quorum: u64,
    pub reachable_nodes: u64,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewQueue {
    pub pending: u64,
    pub queue_pending: u64,
    pub mempool: u64,
    pub backpressure_pending: u64,
    pub oldest_pending_age_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewReplication {
    pub max_lag_ms: f64,
    pub max_lag_node_id: u64,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewDurability {
    pub pending_acks: u64,
    pub ack_timeouts: u64,
    pub status: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverviewSnapshot {
    pub status: &'static str,
    pub leader: OverviewLeader,
    pub cluster: OverviewCluster,
    pub queue: OverviewQueue,
    pub replication: OverviewReplication,
    pub durability: OverviewDurability,
}

impl OverviewSnapshot {
    pub fn build(consensus: &Value, cluster: &Value, queue: &Value, replication: &Value) -> Self {
        let consensus = ConsensusStatusView::from_value(consensus);
        let cluster = ClusterStateView::from_value(cluster);
        let queue = QueueStatsView::from_value(queue);
        let replication = ReplicationView::from_value(replication);
        let signals = resolve_queue_signals(&queue);

        let reachable_nodes = cluster.reachable_members();
        let reachable_validators = consensus
            .reachable_validators
            .or(cluster.reachable_count)
            .map(|n| count_from(Some(n)))
            .unwrap_or(reachable_nodes);

        let leader_member = cluster.leader_member();
        let role = cluster
            .role
            .clone()
            .or_else(|| consensus.current_role.clone())
            .or_else(|| leader_member.and_then(|m| field::to_opt_string(field::pick(m, &["role"]))))
            .unwrap_or_else(|| "UNKNOWN".to_string())
            .to_uppercase();

        let wallet = consensus
            .leader_wallet
            .clone()
            .or_else(|| consensus.wallet_address.clone())
            .or_else(|| leader_member.and_then(|m| field::pick_nonempty_str(m, &["walletAddress"])))
            .unwrap_or_else(|| "unknown".to_string());

        let node_count = match &cluster.members {
            Some(members) => members.len() as u64,
            None => count_from(consensus.cluster_size),
        };

        Self {
            status: if reachable_validators > 0 { "healthy" } else { "degraded" },
            leader: OverviewLeader {
                node_id: count_from(cluster.leader_node_id),
                wallet,
                role: role.clone(),
                term: count_from(cluster.term),
                since: or_now(consensus.leader_since),
            },
            cluster: OverviewCluster {
                node_count,
                quorum: count_from(cluster.quorum_size),
                reachable_nodes: reachable_validators,
                role,
            },
            queue: OverviewQueue {
                pending: signals.queue_pending,
                queue_pending: signals.queue_pending,
                mempool: signals.mempool,
                backpressure_pending: signals.backpressure_pending,
                oldest_pending_age_ms: queue.oldest_pending_age_ms.unwrap_or(0.0),
            },
            replication: OverviewReplication {
                max_lag_ms: replication.max_lag_ms.unwrap_or(0.0),
                max_lag_node_id: count_from(replication.max_lag_node_id),
                status: replication.status_or_derived(),
            },
            durability: OverviewDurability {
                pending_acks: count_from(queue.persistence_pending_changes),
                ack_timeouts: count_from(queue.max_retry_count),
                status: "ok",
            },
        }
    }
}

impl SnapshotResolver {
    pub async fn overview(&self) -> Result<OverviewSnapshot, UpstreamError> {
        let leader_base = self.leader_base().await;
        let upstream = self.upstream();

        let (consensus, cluster, queue, replication) = tokio::try_join!(
            upstream.get(paths::CONSENSUS_STATUS),
            upstream.get_snapshot_pair(paths::snapshot::CLUSTER, &leader_base),
            upstream.get_snapshot_pair(paths::snapshot::QUEUE, &leader_base),
            upstream.get_snapshot_pair(paths::snapshot::REPLICATION, &leader_base),
        )?;

        Ok(OverviewSnapshot::build(&consensus, &cluster, &queue, &replication))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_overview_healthy_from_reachable_nodes() {
        let cluster = json!({
            "leaderNodeId": 1,
            "term": 42,
            "quorumSize": 2,
            "nodes": [
                { "role": "FOLLOWER" },
                { "role": "LEADER", "walletAddress": "0xleader" },
                { "role": "FOLLOWER", "reachable": false },
            ],
        });
        let queue = json!({
            "pendingCount": 4,
            "persistencePendingChanges": 2,
            "pendingEpochStats": "Pending Proposals: 9",
        });
        let snap = OverviewSnapshot::build(&json!({}), &cluster, &queue, &json!({ "healthy": true }));

        assert_eq!(snap.status, "healthy");
        assert_eq!(snap.leader.node_id, 1);
        assert_eq!(snap.leader.term, 42);
        assert_eq!(snap.leader.wallet, "0xleader");
        assert_eq!(snap.leader.role, "LEADER");
        assert_eq!(snap.cluster.node_count, 3);
        assert_eq!(snap.cluster.reachable_nodes, 2);
        assert_eq!(snap.queue.pending, 9);
        assert_eq!(snap.replication.status, "ok");
        assert_eq!(snap.durability.pending_acks, 2);
    }

    #[test]
    fn test_overview_degraded_when_nothing_reachable() {
        let snap = OverviewSnapshot::build(
            &json!({ "reachableValidators": 0, "clusterSize": 3 }),
            &json!({}),
            &json!({}),
            &json!({}),
        );
        assert_eq!(snap.status, "degraded");
        assert_eq!(snap.cluster.node_count, 3);
        assert_eq!(snap.leader.role, "UNKNOWN");
        assert_eq!(snap.leader.wallet, "unknown");
        assert_eq!(snap.replication.status, "degraded");
    }

    #[test]
    fn test_overview_consensus_reachability_wins() {
        let snap = OverviewSnapshot::build(
            &json!({ "reachableValidators": 3, "currentRole": "follower" }),
            &json!({ "reachableCount": 0, "nodes": [] }),
            &json!({}),
            &json!({}),
        );
        assert_eq!(snap.cluster.reachable_nodes, 3);
        assert_eq!(snap.cluster.role, "FOLLOWER");
        assert_eq!(snap.status, "healthy");
    }
}
