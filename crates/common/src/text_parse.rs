//! # Text-Fallback Parser
//!
//! Ekstraksi counter dari teks statistik human-readable dan dari body JSON
//! yang rusak.
//!
//! Dipakai HANYA ketika parsing terstruktur gagal atau kosong. Semua parser
//! mengembalikan `None` untuk field yang tidak ditemukan; caller wajib
//! membedakan `None` ("unknown") dari nilai `0`.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::{json, Map, Value};

static PENDING_PROPOSALS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Pending Proposals:\s*(\d+)").expect("valid regex")
});
static PENDING_EPOCHS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Pending Epochs:\s*(\d+)").expect("valid regex"));
static TOTAL_QUEUED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Total Queued:\s*(\d+)").expect("valid regex"));

static BP_PENDING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)pending=(\d+)").expect("valid regex"));
static BP_MAX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)max=(\d+)").expect("valid regex"));
static BP_ACTIVE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)active=(true|false)").expect("valid regex"));
static BP_SENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)sent=(\d+)").expect("valid regex"));
static BP_ACKED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)acked=(\d+)").expect("valid regex"));

// The blobStore object is flat, so the first closing brace ends it. A
// truncated body may stop right after that brace.
static BLOB_STORE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""blobStore"\s*:\s*\{([\s\S]*?)\}\s*(?:,|\}|$)"#).expect("valid regex")
});
static BLOB_TYPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)"type"\s*:\s*"([^"]+)""#).expect("valid regex"));
static BLOB_STATUS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)"status"\s*:\s*"([^"]+)""#).expect("valid regex"));
static BLOB_GATEWAY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)"ipfsGateway"\s*:\s*"([^"]+)""#).expect("valid regex"));

fn capture_u64(re: &Regex, text: &str) -> Option<u64> {
    re.captures(text)?.get(1)?.as_str().parse().ok()
}

fn capture_string(re: &Regex, text: &str) -> Option<String> {
    Some(re.captures(text)?.get(1)?.as_str().to_string())
}

// ════════════════════════════════════════════════════════════════════════════
// PENDING EPOCH STATS
// ════════════════════════════════════════════════════════════════════════════

/// Counters extracted from a `pendingEpochStats` text blob.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PendingEpochStats {
    pub pending_proposals: Option<u64>,
    pub pending_epochs: Option<u64>,
    pub total_queued: Option<u64>,
}

/// Parse `Pending Proposals: N`, `Pending Epochs: N`, `Total Queued: N`.
pub fn parse_pending_epoch_stats(text: Option<&str>) -> PendingEpochStats {
    let Some(text) = text else {
        return PendingEpochStats::default();
    };
    PendingEpochStats {
        pending_proposals: capture_u64(&PENDING_PROPOSALS_RE, text),
        pending_epochs: capture_u64(&PENDING_EPOCHS_RE, text),
        total_queued: capture_u64(&TOTAL_QUEUED_RE, text),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// BACKPRESSURE STATS
// ════════════════════════════════════════════════════════════════════════════

/// Counters extracted from a `backpressureStats` `key=value` blob.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackpressureStats {
    pub pending: Option<u64>,
    pub max: Option<u64>,
    pub active: Option<bool>,
    pub sent: Option<u64>,
    pub acked: Option<u64>,
}

pub fn parse_backpressure_stats(text: Option<&str>) -> BackpressureStats {
    let Some(text) = text else {
        return BackpressureStats::default();
    };
    BackpressureStats {
        pending: capture_u64(&BP_PENDING_RE, text),
        max: capture_u64(&BP_MAX_RE, text),
        active: capture_string(&BP_ACTIVE_RE, text).map(|s| s.eq_ignore_ascii_case("true")),
        sent: capture_u64(&BP_SENT_RE, text),
        acked: capture_u64(&BP_ACKED_RE, text),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// MALFORMED DEEP-HEALTH RESCUE
// ════════════════════════════════════════════════════════════════════════════

/// Blob store fields recovered from a deep-health body that failed to parse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobStoreRescue {
    #[serde(rename = "type")]
    pub store_type: Option<String>,
    pub status: Option<String>,
    pub ipfs_gateway: Option<String>,
}

impl BlobStoreRescue {
    /// Render as the partial deep-health shape `{"blobStore": {...}}`.
    pub fn into_deep_health(self) -> Value {
        json!({
            "blobStore": {
                "type": self.store_type,
                "status": self.status,
                "ipfsGateway": self.ipfs_gateway,
            }
        })
    }
}

/// Best-effort extraction of the `"blobStore": {...}` fragment from a deep
/// health body that is not valid JSON.
///
/// Compatibility shim for one known upstream defect (deep health emitting
/// truncated JSON). Only this single nested object is targeted; it is not a
/// JSON repair tool. Remove once upstream no longer emits the broken body.
pub fn extract_blob_store_from_malformed_deep_health(text: &str) -> Option<BlobStoreRescue> {
    if text.is_empty() {
        return None;
    }
    let body = BLOB_STORE_RE.captures(text)?.get(1)?.as_str();
    Some(BlobStoreRescue {
        store_type: capture_string(&BLOB_TYPE_RE, body),
        status: capture_string(&BLOB_STATUS_RE, body),
        ipfs_gateway: capture_string(&BLOB_GATEWAY_RE, body),
    })
}

// ════════════════════════════════════════════════════════════════════════════
// TOLERANT JSON
// ════════════════════════════════════════════════════════════════════════════

/// Parse a body as JSON, treating empty or malformed input as `{}`.
pub fn parse_json_or_empty(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Object(Map::new());
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::Object(Map::new()))
}

/// Decode a deep-health body: full JSON first, then the blobStore rescue
/// when the result is not a non-empty object, then `{}`.
pub fn decode_deep_health(text: &str) -> Value {
    let parsed = parse_json_or_empty(text);
    if parsed.as_object().is_some_and(|o| !o.is_empty()) {
        return parsed;
    }
    extract_blob_store_from_malformed_deep_health(text)
        .map(BlobStoreRescue::into_deep_health)
        .unwrap_or_else(|| Value::Object(Map::new()))
}

// ════════════════════════════════════════════════════════════════════════════
// UNIT TESTS
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_epoch_stats_full() {
        let stats = parse_pending_epoch_stats(Some(
            "Pending Proposals: 12\nPending Epochs: 3\nTotal Queued: 40",
        ));
        assert_eq!(stats.pending_proposals, Some(12));
        assert_eq!(stats.pending_epochs, Some(3));
        assert_eq!(stats.total_queued, Some(40));
    }

    #[test]
    fn test_pending_epoch_stats_case_insensitive_and_partial() {
        let stats = parse_pending_epoch_stats(Some("pending proposals:7"));
        assert_eq!(stats.pending_proposals, Some(7));
        assert_eq!(stats.pending_epochs, None);
        assert_eq!(stats.total_queued, None);
    }

    #[test]
    fn test_pending_epoch_stats_zero_is_not_none() {
        let stats = parse_pending_epoch_stats(Some("Total Queued: 0"));
        assert_eq!(stats.total_queued, Some(0));
        assert_eq!(parse_pending_epoch_stats(None), PendingEpochStats::default());
    }

    #[test]
    fn test_backpressure_stats() {
        let stats = parse_backpressure_stats(Some("pending=92 max=10000 active=TRUE sent=9402 acked=9310"));
        assert_eq!(stats.pending, Some(92));
        assert_eq!(stats.max, Some(10000));
        assert_eq!(stats.active, Some(true));
        assert_eq!(stats.sent, Some(9402));
        assert_eq!(stats.acked, Some(9310));

        let partial = parse_backpressure_stats(Some("active=false"));
        assert_eq!(partial.active, Some(false));
        assert_eq!(partial.pending, None);
    }

    #[test]
    fn test_blob_store_rescue_truncated_body() {
        let body = r#"{"success":true,"blobStore": {"type":"IPFS","status":"UP","ipfsGateway":"http://h/ipfs/"}, "diskSpace": {"sta"#;
        let rescued = extract_blob_store_from_malformed_deep_health(body).unwrap();
        assert_eq!(rescued.store_type.as_deref(), Some("IPFS"));
        assert_eq!(rescued.status.as_deref(), Some("UP"));
        assert_eq!(rescued.ipfs_gateway.as_deref(), Some("http://h/ipfs/"));
    }

    #[test]
    fn test_blob_store_rescue_missing_fragment() {
        assert_eq!(extract_blob_store_from_malformed_deep_health(""), None);
        assert_eq!(extract_blob_store_from_malformed_deep_health("{\"cluster\": {"), None);
    }

    #[test]
    fn test_decode_deep_health_prefers_valid_json() {
        let decoded = decode_deep_health(r#"{"cluster":{"status":"UP"}}"#);
        assert_eq!(decoded["cluster"]["status"], "UP");
    }

    #[test]
    fn test_decode_deep_health_rescue_shape() {
        let decoded = decode_deep_health(
            r#"{"blobStore": {"type":"IPFS","status":"UP","ipfsGateway":"http://h/ipfs/"}"#,
        );
        assert_eq!(
            decoded,
            json!({ "blobStore": { "type": "IPFS", "status": "UP", "ipfsGateway": "http://h/ipfs/" } })
        );
    }

    #[test]
    fn test_decode_deep_health_garbage_is_empty() {
        assert_eq!(decode_deep_health("<html>oops"), json!({}));
        assert_eq!(parse_json_or_empty(""), json!({}));
    }
}
