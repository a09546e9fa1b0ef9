//! # Static Mode Fixtures
//!
//! Payload tetap untuk `GatewayMode::Static`. Tidak ada kontak upstream;
//! dipakai untuk development dashboard dan demo offline. Shape setiap
//! payload sama dengan output resolver live.

use serde_json::{json, Value};

use crate::envelope::now_iso;
use crate::server::Endpoint;
use crate::snapshot::header::{HEADER_SUBTITLE, HEADER_TITLE};
use crate::snapshot::queue::NEEDS_UPSTREAM_COUNTERS;
use crate::snapshot::tar::TAR_TARGET_BYTES;

/// Canned `data` payload untuk satu endpoint.
pub fn payload(endpoint: &Endpoint, chain_mode: &str) -> Value {
    match endpoint {
        Endpoint::Overview => overview(),
        Endpoint::Header => header(chain_mode),
        Endpoint::Cluster => cluster(),
        Endpoint::Raft => json!({
            "term": 42,
            "commitIndex": 12502,
            "appendRatePerSec": 138,
            "electionCount24h": 1,
            "lastElectionAt": now_iso(),
            "reachableValidators": 3,
        }),
        Endpoint::Replication => json!({
            "status": "ok",
            "maxLagMs": 55,
            "p95LagMs": 31,
            "nodes": [
                { "nodeId": 0, "lagMs": 24, "status": "ok" },
                { "nodeId": 1, "lagMs": 9, "status": "ok" },
                { "nodeId": 2, "lagMs": 55, "status": "ok" },
            ],
        }),
        Endpoint::Queue => json!({
            "pendingCount": 4,
            "queuePendingCount": 4,
            "mempoolCount": 11,
            "backpressurePendingCount": 92,
            "backpressureMaxPending": 10000,
            "backpressureActive": false,
            "epochQueueDepth": 2,
            "oldestPendingAgeMs": 820,
            "ingressRatePerSec": 24,
            "egressRatePerSec": 22,
        }),
        Endpoint::Proposals => proposals(),
        Endpoint::Durability => json!({
            "status": "ok",
            "pendingAcks": 2,
            "ackTimeouts1h": 0,
            "lastAckAt": now_iso(),
        }),
        Endpoint::Health => health(chain_mode),
        Endpoint::EventsRecent { limit } => events(*limit),
        Endpoint::EventsStats => json!({
            "total24h": 211,
            "bySeverity": { "info": 192, "warn": 17, "error": 2 },
            "byType": { "LEADERSHIP_CHANGE": 2, "QUEUE_BACKPRESSURE": 9 },
        }),
        Endpoint::Finality => json!({
            "currentEpoch": 1047,
            "ethereumEpoch": 1046,
            "finalizedEpoch": 1045,
            "epochsUntilFinality": 2,
            "pendingProposals": 2488,
            "pendingEpochs": 3,
            "totalQueued": 12186,
            "backpressurePending": 92,
            "totalFinalized": 9698,
        }),
        Endpoint::Tarmk => tarmk(),
        Endpoint::TarChain => tar_chain(),
        Endpoint::TransactionsSummary => json!({
            "states": { "STARTED": 3, "COMMITTED": 1201, "ABORTED": 8, "TIMED_OUT": 1 },
            "windowMinutes": 60,
        }),
        Endpoint::TransactionDetail(id) => json!({
            "transactionId": id,
            "correlationId": "corr-123",
            "status": "COMMITTED",
            "startedAt": now_iso(),
            "updatedAt": now_iso(),
            "timeoutMs": 30000,
            "reason": null,
        }),
    }
}

fn overview() -> Value {
    json!({
        "status": "healthy",
        "leader": {
            "nodeId": 1,
            "wallet": "0xabc123...def",
            "role": "LEADER",
            "term": 42,
            "since": now_iso(),
        },
        "cluster": { "nodeCount": 3, "quorum": 2, "reachableNodes": 3, "role": "LEADER" },
        "queue": {
            "pending": 4,
            "queuePending": 4,
            "mempool": 11,
            "backpressurePending": 92,
            "oldestPendingAgeMs": 820,
        },
        "replication": { "maxLagMs": 55, "maxLagNodeId": 2, "status": "ok" },
        "durability": { "pendingAcks": 2, "ackTimeouts": 0, "status": "ok" },
    })
}

fn header(chain_mode: &str) -> Value {
    json!({
        "title": HEADER_TITLE,
        "subtitle": HEADER_SUBTITLE,
        "validator": { "nodeId": 0, "role": "LEADER", "label": "Validator 0 LEADER" },
        "binaries": { "type": "IPFS", "label": "Binaries IPFS" },
        "ipfs": { "daemonStatus": "UP", "enabled": true, "gateway": "http://127.0.0.1:8080/ipfs/" },
        "mode": chain_mode.to_lowercase(),
        "clusterWallet": "0xb677f46bf164d6b3c62fc1b643c3a294466bbc9d",
        "clusterWalletShort": "0xb677f46b...466bbc9d",
        "networkStatus": "HEALTHY",
    })
}

fn cluster() -> Value {
    let node = |id: u64, wallet: &str, role: &str| {
        let port = 8090 + id;
        json!({
            "nodeId": id,
            "displayId": id,
            "wallet": wallet,
            "url": format!("http://127.0.0.1:{port}"),
            "port": port,
            "role": role,
            "status": "ready",
            "reachable": true,
            "lastSeenAt": now_iso(),
        })
    };
    json!({
        "clusterState": "ACTIVE",
        "term": 42,
        "leaderNodeId": 1,
        "nodes": [
            node(0, "0x111...", "FOLLOWER"),
            node(1, "0x222...", "LEADER"),
            node(2, "0x333...", "FOLLOWER"),
        ],
    })
}

fn proposals() -> Value {
    let unknown_states = json!({
        "unverified": null,
        "verified": null,
        "finalized": null,
        "rejected": null,
    });
    json!({
        "queuePressure": {
            "pending": 2488,
            "queuePending": 2488,
            "mempool": 217,
            "backpressurePending": 92,
            "backpressureMax": 10000,
            "backpressureActive": false,
            "backpressureSent": 9402,
            "backpressureAcked": 9310,
        },
        "states": { "unverified": 2488, "verified": 9698, "finalized": 9440, "rejected": 24 },
        "types": { "write": 12186, "delete": 88, "total": 12274 },
        "stateByType": {
            "write": unknown_states.clone(),
            "delete": unknown_states,
            "availability": NEEDS_UPSTREAM_COUNTERS,
        },
        "epochs": {
            "currentEpoch": 1057,
            "finalizedEpoch": 1055,
            "epochsUntilFinality": 2,
            "pendingEpochs": 3,
            "totalQueued": 12186,
        },
    })
}

fn health(chain_mode: &str) -> Value {
    json!({
        "status": "healthy",
        "checks": { "cluster": "pass", "storage": "pass", "network": "pass", "api": "pass" },
        "deep": {
            "cluster": { "status": "UP", "reachableCount": 3, "totalMembers": 3, "quorumSize": 2 },
            "diskSpace": { "status": "UP", "usagePercent": 41.5, "usableGb": 120 },
            "mediaDriver": {
                "status": "UP",
                "healthStatus": "HEALTHY",
                "errorCount": 0,
                "timeoutCount": 0,
                "backpressureCount": 0,
            },
            "consensus": {
                "status": "UP",
                "mode": chain_mode.to_uppercase(),
                "role": "LEADER",
                "term": 42,
                "epoch": 1047,
            },
            "clients": { "status": "UP", "registeredClients": 4, "registeredValidators": 3 },
            "blobStore": {
                "type": "IPFS",
                "status": "UP",
                "cidMappingAvailable": true,
                "ipfsGateway": "http://127.0.0.1:8080/ipfs/",
            },
        },
    })
}

/// Sintetis: setiap event ke-4 leadership change, setiap ke-7 warn.
fn events(limit: u32) -> Value {
    let events: Vec<Value> = (0..limit.max(1))
        .map(|i| {
            let leadership = i % 4 == 0;
            json!({
                "id": format!("evt-{}", i + 1),
                "timestamp": now_iso(),
                "type": if leadership { "LEADERSHIP_CHANGE" } else { "QUEUE_BACKPRESSURE" },
                "severity": if i % 7 == 0 { "warn" } else { "info" },
                "message": if leadership {
                    "Leader changed to node 1"
                } else {
                    "Queue pressure above baseline"
                },
                "attributes": if leadership {
                    json!({ "previousLeader": 0, "newLeader": 1 })
                } else {
                    json!({ "pendingCount": 4 + i, "mempoolCount": 11 + i })
                },
            })
        })
        .collect();
    json!({ "events": events })
}

fn tarmk() -> Value {
    json!({
        "tarFileCount": 3,
        "segmentCount": 1617,
        "totalSizeBytes": 31_628_800,
        "totalSizeFormatted": "30.2 MB",
        "avgSizeBytes": 10_542_933,
        "avgSizeFormatted": "10.1 MB",
        "minSizeBytes": 11_264,
        "minSizeFormatted": "11.0 KB",
        "maxSizeBytes": 31_597_056,
        "maxSizeFormatted": "30.1 MB",
        "targetTarSizeBytes": TAR_TARGET_BYTES,
        "targetTarSizeFormatted": "256.0 MB",
        "packingEfficiencyPct": 3.9,
        "packingStatus": "Low packing efficiency",
        "latestHead": "c4d4d2b6-d4b8-4ab2-ae49-7c1e2d89633d:464",
    })
}

fn tar_chain() -> Value {
    json!({
        "maxTarSizeBytes": TAR_TARGET_BYTES,
        "maxTarSizeFormatted": "256.0 MB",
        "tarFiles": [
            {
                "id": 0,
                "name": "data00000a.tar",
                "sizeBytes": 31_597_056,
                "sizeFormatted": "30.1 MB",
                "segmentCount": 1616,
                "efficiencyPct": 11.8,
                "widthPct": 11.77,
                "created": "2026-02-05T04:28:17Z",
            },
            {
                "id": 1,
                "name": "data00001a.tar",
                "sizeBytes": 11_264,
                "sizeFormatted": "11.0 KB",
                "segmentCount": 0,
                "efficiencyPct": 0.0,
                "widthPct": 4.0,
                "created": "2026-02-06T15:53:41Z",
            },
        ],
    })
}
