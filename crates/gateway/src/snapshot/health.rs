//! `/ops/v1/health`: shallow checks plus the deep-health breakdown.

use oak_ops_common::field::count_from;
use oak_ops_common::text_parse::decode_deep_health;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

use super::{or_str, SnapshotResolver};
use crate::error::UpstreamError;
use crate::paths;
use crate::payload::{DeepHealthView, HealthStatusView};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthChecks {
    pub cluster: String,
    pub storage: String,
    pub network: String,
    pub api: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeepCluster {
    pub status: String,
    pub reachable_count: u64,
    pub total_members: u64,
    pub quorum_size: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeepDiskSpace {
    pub status: String,
    pub usage_percent: f64,
    pub usable_gb: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeepMediaDriver {
    pub status: String,
    pub health_status: String,
    pub error_count: u64,
    pub timeout_count: u64,
    pub backpressure_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeepConsensus {
    pub status: String,
    pub mode: String,
    pub role: String,
    pub term: u64,
    pub epoch: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeepClients {
    pub status: String,
    pub registered_clients: u64,
    pub registered_validators: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeepBlobStore {
    #[serde(rename = "type")]
    pub store_type: String,
    pub status: String,
    pub cid_mapping_available: bool,
    pub ipfs_gateway: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeepHealth {
    pub cluster: DeepCluster,
    pub disk_space: DeepDiskSpace,
    pub media_driver: DeepMediaDriver,
    pub consensus: DeepConsensus,
    pub clients: DeepClients,
    pub blob_store: DeepBlobStore,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthSnapshot {
    pub status: String,
    pub checks: HealthChecks,
    pub deep: DeepHealth,
}

impl DeepHealth {
    fn from_view(deep: &DeepHealthView) -> Self {
        let unknown = |v: &Option<String>| or_str(v.clone(), "unknown");
        Self {
            cluster: DeepCluster {
                status: unknown(&deep.cluster_status),
                reachable_count: count_from(deep.cluster_reachable_count),
                total_members: count_from(deep.cluster_total_members),
                quorum_size: count_from(deep.cluster_quorum_size),
            },
            disk_space: DeepDiskSpace {
                status: unknown(&deep.disk_status),
                usage_percent: deep.disk_usage_percent.unwrap_or(0.0),
                usable_gb: deep.disk_usable_gb.unwrap_or(0.0),
            },
            media_driver: DeepMediaDriver {
                status: unknown(&deep.media_status),
                health_status: unknown(&deep.media_health_status),
                error_count: count_from(deep.media_error_count),
                timeout_count: count_from(deep.media_timeout_count),
                backpressure_count: count_from(deep.media_backpressure_count),
            },
            consensus: DeepConsensus {
                status: unknown(&deep.consensus_status),
                mode: unknown(&deep.consensus_mode),
                role: unknown(&deep.consensus_role),
                term: count_from(deep.consensus_term),
                epoch: count_from(deep.consensus_epoch),
            },
            clients: DeepClients {
                status: unknown(&deep.clients_status),
                registered_clients: count_from(deep.registered_clients),
                registered_validators: count_from(deep.registered_validators),
            },
            blob_store: DeepBlobStore {
                store_type: unknown(&deep.blob_store_type).to_uppercase(),
                status: unknown(&deep.blob_store_status).to_uppercase(),
                cid_mapping_available: deep.blob_store_cid_mapping.unwrap_or(false),
                ipfs_gateway: deep.blob_store_ipfs_gateway.clone().unwrap_or(Value::Null),
            },
        }
    }
}

impl HealthSnapshot {
    /// `ops_health` and `deep_text` may be their empty forms when unavailable.
    pub fn build(ops_health: &Value, shallow: &Value, deep_text: &str) -> Self {
        let ops = HealthStatusView::from_value(ops_health);
        let shallow = HealthStatusView::from_value(shallow);
        let deep = DeepHealthView::from_value(&decode_deep_health(deep_text));

        let derived = if deep.success { "healthy" } else { "degraded" };
        let status = ops
            .status
            .clone()
            .or_else(|| shallow.status.clone())
            .unwrap_or_else(|| derived.to_string())
            .to_lowercase();

        Self {
            status,
            checks: HealthChecks {
                cluster: or_str(ops.status.or_else(|| deep.cluster_status.clone()), "unknown"),
                storage: or_str(
                    deep.node_store_status.clone().or_else(|| deep.disk_status.clone()),
                    "unknown",
                ),
                network: or_str(shallow.cluster_status.clone(), "unknown"),
                api: or_str(shallow.status.clone(), "unknown"),
            },
            deep: DeepHealth::from_view(&deep),
        }
    }
}

impl SnapshotResolver {
    pub async fn health(&self) -> Result<HealthSnapshot, UpstreamError> {
        let upstream = self.upstream();
        let (ops_health, shallow, deep_text) = tokio::join!(
            self.default_snapshot(paths::snapshot::HEALTH),
            upstream.get(paths::HEALTH),
            upstream.get_text(paths::HEALTH_DEEP),
        );

        let shallow = shallow?;
        let ops_health = ops_health.unwrap_or_else(|e| {
            debug!(error = %e, "ops health snapshot unavailable");
            json!({})
        });
        let deep_text = deep_text.unwrap_or_else(|e| {
            debug!(error = %e, "deep health unavailable");
            String::new()
        });

        Ok(HealthSnapshot::build(&ops_health, &shallow, &deep_text))
    }
}
