//! `/ops/v1/header`: identity strip shown above every dashboard page.

use oak_ops_common::field::{self, count_from};
use oak_ops_common::format::short_wallet;
use oak_ops_common::text_parse::decode_deep_health;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

use super::{or_str, SnapshotResolver};
use crate::error::UpstreamError;
use crate::paths;
use crate::payload::{ClusterStateView, ConsensusStatusView, DeepHealthView, HealthStatusView};

pub const HEADER_TITLE: &str = "Blockchain AEM";
pub const HEADER_SUBTITLE: &str = "Global P2P Oak Repository";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatorBadge {
    pub node_id: u64,
    pub role: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinariesBadge {
    #[serde(rename = "type")]
    pub store_type: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IpfsBadge {
    pub daemon_status: String,
    pub enabled: bool,
    pub gateway: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderSnapshot {
    pub title: &'static str,
    pub subtitle: &'static str,
    pub validator: ValidatorBadge,
    pub binaries: BinariesBadge,
    pub ipfs: IpfsBadge,
    pub mode: String,
    pub cluster_wallet: String,
    pub cluster_wallet_short: String,
    pub network_status: String,
}

/// Inputs of the header, already fetched. Optional sources are decoded
/// to their empty forms by the caller.
#[derive(Debug, Clone, Default)]
pub struct HeaderSources {
    pub cluster: Value,
    pub consensus: Value,
    pub health_snapshot: Value,
    pub deep_health_text: String,
    pub shallow_health: Value,
}

const MEMBER_WALLET: &[&str] = &["walletAddress", "wallet"];

impl HeaderSnapshot {
    pub fn build(sources: &HeaderSources, chain_mode: &str) -> Self {
        let cluster = ClusterStateView::from_value(&sources.cluster);
        let consensus = ConsensusStatusView::from_value(&sources.consensus);
        let health = HealthStatusView::from_value(&sources.health_snapshot);
        let shallow = HealthStatusView::from_value(&sources.shallow_health);
        let deep = DeepHealthView::from_value(&decode_deep_health(&sources.deep_health_text));

        let members = cluster.normalized_members();
        let self_member_id = count_from(cluster.member_id.or(cluster.leader_node_id));

        let role = or_str(
            cluster.role.clone().or_else(|| consensus.current_role.clone()),
            "FOLLOWER",
        )
        .to_uppercase();

        let own_wallet = || {
            members
                .iter()
                .find(|m| m.node_id == self_member_id)
                .and_then(|m| field::pick_nonempty_str(m.record(), MEMBER_WALLET))
        };
        let leader_wallet = || {
            members
                .iter()
                .find(|m| m.is_leader())
                .and_then(|m| field::pick_nonempty_str(m.record(), MEMBER_WALLET))
        };
        let wallet = cluster
            .identity_wallet
            .clone()
            .or_else(|| consensus.wallet_address.clone())
            .or_else(|| consensus.leader_wallet.clone())
            .or_else(own_wallet)
            .or_else(leader_wallet)
            .unwrap_or_else(|| "unknown".to_string());

        let store_type = or_str(
            health.blob_store_type.clone().or_else(|| deep.blob_store_type.clone()),
            "file",
        )
        .to_uppercase();
        let ipfs_enabled = store_type == "IPFS";
        let daemon_status = if ipfs_enabled {
            or_str(deep.blob_store_status.clone().or_else(|| health.status.clone()), "unknown")
                .to_uppercase()
        } else {
            "DISABLED".to_string()
        };

        let network_status = cluster
            .health_status
            .clone()
            .or_else(|| shallow.cluster_status.clone().filter(|s| !s.is_empty()))
            .or_else(|| cluster.cluster_state.clone())
            .unwrap_or_else(|| "unknown".to_string())
            .to_uppercase();

        Self {
            title: HEADER_TITLE,
            subtitle: HEADER_SUBTITLE,
            validator: ValidatorBadge {
                node_id: self_member_id,
                label: format!("Validator {} {}", self_member_id, role),
                role,
            },
            binaries: BinariesBadge {
                label: format!("Binaries {}", store_type),
                store_type,
            },
            ipfs: IpfsBadge {
                daemon_status,
                enabled: ipfs_enabled,
                gateway: deep.blob_store_ipfs_gateway.unwrap_or(Value::Null),
            },
            mode: chain_mode.to_lowercase(),
            cluster_wallet_short: short_wallet(&wallet),
            cluster_wallet: wallet,
            network_status,
        }
    }
}

impl SnapshotResolver {
    pub async fn header(&self) -> Result<HeaderSnapshot, UpstreamError> {
        let upstream = self.upstream();

        let (cluster, consensus, health_snapshot, deep_text, shallow) = tokio::join!(
            self.default_snapshot(paths::snapshot::CLUSTER),
            upstream.get(paths::CONSENSUS_STATUS),
            self.default_snapshot(paths::snapshot::HEALTH),
            upstream.get_text(paths::HEALTH_DEEP),
            upstream.get(paths::HEALTH),
        );

        let sources = HeaderSources {
            cluster: cluster?,
            consensus: consensus?,
            health_snapshot: health_snapshot?,
            deep_health_text: deep_text.unwrap_or_else(|e| {
                debug!(error = %e, "deep health unavailable for header");
                String::new()
            }),
            shallow_health: shallow.unwrap_or_else(|e| {
                debug!(error = %e, "shallow health unavailable for header");
                json!({})
            }),
        };

        Ok(HeaderSnapshot::build(&sources, self.chain_mode()))
    }
}
