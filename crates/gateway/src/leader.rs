//! # Leader Locator
//!
//! Menentukan base URL node leader untuk pembacaan yang harus linearizable
//! (queue, replication, proposals).
//!
//! ## Urutan Strategi
//!
//! 1. `currentLeader` dari consensus status
//! 2. `currentLeader` dari cluster state, atau `url` member ber-role `LEADER`
//! 3. Default upstream base
//!
//! Tidak pernah gagal: setiap kegagalan turun ke strategi berikutnya.

use oak_ops_common::field::{self, Candidates};
use serde_json::Value;
use tracing::debug;

use crate::config::normalize_base;
use crate::paths;
use crate::upstream::UpstreamClient;

const CURRENT_LEADER: Candidates = &["currentLeader"];
const MEMBERS: Candidates = &["members", "nodes", "validators"];

fn leader_member_url(cluster: &Value) -> Option<String> {
    field::pick_array(cluster, MEMBERS)
        .iter()
        .find(|m| field::pick_str(m, &["role"], "").to_uppercase() == "LEADER")
        .and_then(|m| field::pick_nonempty_str(m, &["url"]))
}

/// Resolve the leader's base URL, falling back to the default base.
pub async fn resolve_leader_base(client: &UpstreamClient) -> String {
    match client.get(paths::CONSENSUS_STATUS).await {
        Ok(consensus) => {
            if let Some(leader) = field::pick_nonempty_str(&consensus, CURRENT_LEADER) {
                return normalize_base(&leader);
            }
            debug!("consensus status has no currentLeader");
        }
        Err(e) => debug!(error = %e, "consensus status unavailable for leader lookup"),
    }

    match client.get(paths::CLUSTER_STATE).await {
        Ok(cluster) => {
            let found = field::pick_nonempty_str(&cluster, CURRENT_LEADER)
                .or_else(|| leader_member_url(&cluster));
            if let Some(leader) = found {
                return normalize_base(&leader);
            }
            debug!("cluster state names no leader");
        }
        Err(e) => debug!(error = %e, "cluster state unavailable for leader lookup"),
    }

    client.metrics().leader_fallbacks.inc();
    debug!(base = %client.default_base(), "leader unknown, using default upstream");
    client.default_base().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_leader_member_url() {
        let cluster = json!({
            "nodes": [
                { "role": "follower", "url": "http://a:8090" },
                { "role": "Leader", "url": "http://b:8092/" },
            ]
        });
        assert_eq!(leader_member_url(&cluster).as_deref(), Some("http://b:8092/"));
    }

    #[test]
    fn test_leader_member_without_url() {
        let cluster = json!({ "members": [{ "role": "LEADER", "url": "" }] });
        assert_eq!(leader_member_url(&cluster), None);
        assert_eq!(leader_member_url(&json!({})), None);
    }
}
