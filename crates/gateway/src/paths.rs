//! Upstream endpoint paths.

pub const CONSENSUS_STATUS: &str = "/v1/consensus/status";
pub const CLUSTER_STATE: &str = "/v1/aeron/cluster-state";
pub const REPLICATION_LAG: &str = "/v1/aeron/replication-lag";
pub const RAFT_METRICS: &str = "/v1/aeron/raft-metrics";
pub const QUEUE_STATS: &str = "/v1/proposals/queue/stats";

pub const SNAPSHOT_CLUSTER: &str = "/v1/ops/snapshots/cluster";
pub const SNAPSHOT_QUEUE: &str = "/v1/ops/snapshots/queue";
pub const SNAPSHOT_REPLICATION: &str = "/v1/ops/snapshots/replication";
pub const SNAPSHOT_HEALTH: &str = "/v1/ops/snapshots/health";

pub const HEALTH: &str = "/health";
pub const HEALTH_DEEP: &str = "/health/deep";

pub const EVENTS_STATS: &str = "/v1/events/stats";
pub const TAR_SEGMENTS: &str = "/api/segments/tars";

/// `/v1/events/recent?limit={limit}`.
pub fn events_recent(limit: u32) -> String {
    format!("/v1/events/recent?limit={limit}")
}

/// `(primary, fallback)` pairs for snapshot reads.
pub mod snapshot {
    use super::*;

    pub const CLUSTER: (&str, &str) = (SNAPSHOT_CLUSTER, CLUSTER_STATE);
    pub const QUEUE: (&str, &str) = (SNAPSHOT_QUEUE, QUEUE_STATS);
    pub const REPLICATION: (&str, &str) = (SNAPSHOT_REPLICATION, REPLICATION_LAG);
    pub const HEALTH: (&str, &str) = (SNAPSHOT_HEALTH, super::HEALTH);
}
