//! # Node Identity Normalizer
//!
//! Memberikan `nodeId` integer yang unik dan stabil untuk daftar member
//! cluster mentah dari upstream.
//!
//! ## Algoritma (per entry, urut input)
//!
//! 1. Kandidat id dari `nodeId` / `memberId` / `id` (integer non-negatif)
//! 2. Jika absen atau sudah dipakai: port URL → id via [`KNOWN_PORT_IDS`],
//!    hanya jika id tersebut belum dipakai
//! 3. Jika masih belum resolve: integer terkecil ≥ index input yang belum dipakai
//! 4. Tandai sebagai dipakai
//!
//! ## Invariant
//!
//! `nodeId` pairwise distinct dalam satu pemanggilan.

use std::collections::HashSet;

use serde_json::{Map, Value};
use url::Url;

use crate::field::{self, Candidates};

/// Fixed port → node id mapping of the reference three-node deployment.
pub const KNOWN_PORT_IDS: [(u16, u64); 3] = [(8090, 0), (8092, 1), (8094, 2)];

const ID_FIELDS: Candidates = &["nodeId", "memberId", "id"];

/// A raw member record with its resolved identity attached.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedNode {
    pub node_id: u64,
    pub port: Option<u16>,
    record: Value,
}

impl NormalizedNode {
    /// The original record (always an object).
    pub fn record(&self) -> &Value {
        &self.record
    }

    /// Role upper-cased, empty string when absent.
    pub fn role(&self) -> String {
        field::pick_str(&self.record, &["role"], "").to_uppercase()
    }

    pub fn is_leader(&self) -> bool {
        self.role() == "LEADER"
    }

    /// The record passed through with `nodeId` and `port` overwritten.
    pub fn to_value(&self) -> Value {
        let mut out = self.record.as_object().cloned().unwrap_or_default();
        out.insert("nodeId".to_string(), Value::from(self.node_id));
        out.insert(
            "port".to_string(),
            self.port.map(Value::from).unwrap_or(Value::Null),
        );
        Value::Object(out)
    }
}

/// Port of a URL string; scheme default (443 for https, 80 otherwise) when
/// the URL carries no explicit port. Unparseable input yields `None`.
pub fn parse_port(url: &str) -> Option<u16> {
    if url.is_empty() {
        return None;
    }
    let parsed = Url::parse(url).ok()?;
    Some(
        parsed
            .port()
            .unwrap_or(if parsed.scheme() == "https" { 443 } else { 80 }),
    )
}

fn known_port_id(port: u16) -> Option<u64> {
    KNOWN_PORT_IDS
        .iter()
        .find(|(p, _)| *p == port)
        .map(|(_, id)| *id)
}

fn candidate_id(record: &Value) -> Option<u64> {
    let n = field::to_opt_num(field::pick(record, ID_FIELDS))?;
    (n >= 0.0 && n.fract() == 0.0 && n <= u64::MAX as f64).then_some(n as u64)
}

/// Normalize a raw member list. Non-array input yields an empty list;
/// non-object entries are treated as empty records.
pub fn normalize_node_ids(raw: &Value) -> Vec<NormalizedNode> {
    let Some(entries) = raw.as_array() else {
        return Vec::new();
    };

    let mut used: HashSet<u64> = HashSet::with_capacity(entries.len());
    let mut out = Vec::with_capacity(entries.len());

    for (index, entry) in entries.iter().enumerate() {
        let record = if entry.is_object() {
            entry.clone()
        } else {
            Value::Object(Map::new())
        };

        let port = field::pick(&record, &["url"])
            .and_then(Value::as_str)
            .and_then(parse_port);

        let node_id = match candidate_id(&record) {
            Some(id) if !used.contains(&id) => id,
            _ => match port.and_then(known_port_id) {
                Some(mapped) if !used.contains(&mapped) => mapped,
                _ => {
                    let mut candidate = index as u64;
                    while used.contains(&candidate) {
                        candidate += 1;
                    }
                    candidate
                }
            },
        };

        used.insert(node_id);
        out.push(NormalizedNode { node_id, port, record });
    }

    out
}

/// First node whose role is `LEADER`.
pub fn find_leader(nodes: &[NormalizedNode]) -> Option<&NormalizedNode> {
    nodes.iter().find(|n| n.is_leader())
}

// ════════════════════════════════════════════════════════════════════════════
// UNIT TESTS
// ════════════════════════════════════════════════════════════════════════════
