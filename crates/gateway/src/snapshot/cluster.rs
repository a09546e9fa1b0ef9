//! `/ops/v1/cluster`: membership table with normalized node ids.

use oak_ops_common::field::{self, count_from, Candidates};
use oak_ops_common::node_identity::NormalizedNode;
use serde::Serialize;
use serde_json::Value;

use super::{or_now, or_str, SnapshotResolver};
use crate::error::UpstreamError;
use crate::paths;
use crate::payload::ClusterStateView;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterNode {
    pub node_id: u64,
    pub display_id: u64,
    pub wallet: String,
    pub url: String,
    pub port: u16,
    pub role: String,
    pub status: String,
    pub reachable: bool,
    pub last_seen_at: String,
}

impl ClusterNode {
    fn project(node: &NormalizedNode) -> Self {
        let record = node.record();
        let text = |candidates: Candidates| field::to_opt_string(field::pick(record, candidates));
        Self {
            node_id: node.node_id,
            display_id: node.node_id,
            wallet: or_str(text(&["wallet", "walletAddress"]), "unknown"),
            url: or_str(text(&["url"]), ""),
            port: node.port.unwrap_or(0),
            role: or_str(text(&["role"]), "UNKNOWN"),
            status: or_str(text(&["status"]), "unknown"),
            reachable: field::pick_bool(record, &["reachable", "online"], true),
            last_seen_at: or_now(text(&["lastSeenAt", "lastHeartbeatAt"])),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSnapshot {
    pub cluster_state: String,
    pub term: u64,
    pub leader_node_id: u64,
    pub nodes: Vec<ClusterNode>,
}

impl ClusterSnapshot {
    pub fn build(raw: &Value) -> Self {
        let cluster = ClusterStateView::from_value(raw);
        let nodes = cluster.normalized_members();

        let leader_node_id = cluster
            .leader_node_id
            .map(|id| count_from(Some(id)))
            .or_else(|| nodes.iter().find(|n| n.is_leader()).map(|n| n.node_id))
            .unwrap_or(0);

        Self {
            cluster_state: or_str(
                cluster
                    .cluster_state
                    .clone()
                    .or_else(|| cluster.state.clone())
                    .or_else(|| cluster.health_status.clone()),
                "unknown",
            ),
            term: count_from(cluster.term),
            leader_node_id,
            nodes: nodes.iter().map(ClusterNode::project).collect(),
        }
    }
}

impl SnapshotResolver {
    pub async fn cluster(&self) -> Result<ClusterSnapshot, UpstreamError> {
        let raw = self.default_snapshot(paths::snapshot::CLUSTER).await?;
        Ok(ClusterSnapshot::build(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cluster_ids_and_projection() {
        let raw = json!({
            "clusterState": "ACTIVE",
            "currentTerm": 42,
            "members": [
                { "nodeId": 0, "url": "http://h:8090", "role": "FOLLOWER", "walletAddress": "0x111" },
                { "nodeId": 0, "url": "http://h:8092", "role": "LEADER", "online": false },
                { "url": "http://h:8094", "lastHeartbeatAt": "2026-01-01T00:00:00.000Z" },
            ],
        });
        let snap = ClusterSnapshot::build(&raw);

        assert_eq!(snap.cluster_state, "ACTIVE");
        assert_eq!(snap.term, 42);
        let ids: Vec<u64> = snap.nodes.iter().map(|n| n.node_id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert_eq!(snap.leader_node_id, 1);

        assert_eq!(snap.nodes[0].wallet, "0x111");
        assert_eq!(snap.nodes[0].port, 8090);
        assert!(!snap.nodes[1].reachable);
        assert_eq!(snap.nodes[2].role, "UNKNOWN");
        assert_eq!(snap.nodes[2].last_seen_at, "2026-01-01T00:00:00.000Z");
    }

    #[test]
    fn test_cluster_explicit_leader_and_empty() {
        let snap = ClusterSnapshot::build(&json!({ "leaderId": 2, "health": { "status": "degraded" } }));
        assert_eq!(snap.leader_node_id, 2);
        assert_eq!(snap.cluster_state, "degraded");
        assert!(snap.nodes.is_empty());

        let snap = ClusterSnapshot::build(&json!("not an object"));
        assert_eq!(snap.cluster_state, "unknown");
        assert_eq!(snap.leader_node_id, 0);
    }
}
