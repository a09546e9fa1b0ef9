//! # Integration Tests for Oak Ops Common
//!
//! Skenario rekonsiliasi end-to-end atas payload upstream mentah, lewat
//! API publik crate saja.

use oak_ops_common::field;
use oak_ops_common::text_parse::decode_deep_health;
use oak_ops_common::{normalize_node_ids, QueueSignals};
use serde_json::json;

#[test]
fn test_queue_pending_reconciled_across_channels() {
    let signals = QueueSignals::from_raw(&json!({
        "pendingCount": 5,
        "batchQueueSize": 9,
        "pendingEpochStats": "Pending Proposals: 3",
    }));
    assert_eq!(signals.queue_pending, 9);
}

#[test]
fn test_truncated_deep_health_keeps_blob_store() {
    let body = r#"{"success":true,"blobStore": {"type":"IPFS","status":"UP","ipfsGateway":"http://h/ipfs/"}, "cluster": {"status"#;
    let decoded = decode_deep_health(body);
    assert_eq!(
        decoded,
        json!({ "blobStore": { "type": "IPFS", "status": "UP", "ipfsGateway": "http://h/ipfs/" } })
    );
    assert_eq!(field::pick_str(&decoded, &["blobStore.type"], "file"), "IPFS");
}

#[test]
fn test_member_list_from_three_node_deployment() {
    // Semua member melaporkan nodeId 0; port URL memisahkan identitasnya.
    let raw = json!([
        { "nodeId": 0, "url": "http://10.0.0.1:8090", "role": "FOLLOWER" },
        { "nodeId": 0, "url": "http://10.0.0.2:8092", "role": "LEADER" },
        { "nodeId": 0, "url": "http://10.0.0.3:8094", "role": "FOLLOWER" },
    ]);
    let nodes = normalize_node_ids(&raw);

    let ids: Vec<u64> = nodes.iter().map(|n| n.node_id).collect();
    assert_eq!(ids, vec![0, 1, 2]);
    let leader = nodes.iter().find(|n| n.is_leader()).unwrap();
    assert_eq!(leader.node_id, 1);
    assert_eq!(leader.port, Some(8092));
}
