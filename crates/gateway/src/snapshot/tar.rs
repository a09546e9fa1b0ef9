//! `/ops/v1/tarmk` dan `/ops/v1/tar-chain`: pertumbuhan file TAR di storage.
//!
//! Semua persentase dihitung terhadap target ukuran TAR tetap (256 MiB).

use oak_ops_common::field::count_from;
use oak_ops_common::format::{format_bytes, round_to};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

use super::{or_str, SnapshotResolver};
use crate::error::UpstreamError;
use crate::paths;
use crate::payload::{DeepHealthView, TarFileView};

/// Target ukuran satu file TAR.
pub const TAR_TARGET_BYTES: u64 = 256 * 1024 * 1024;

/// Lebar minimum bar TAR chain (persen).
pub const MIN_WIDTH_PCT: f64 = 4.0;

fn packing_status(efficiency_pct: f64) -> &'static str {
    if efficiency_pct >= 80.0 {
        "Very high packing efficiency"
    } else if efficiency_pct >= 50.0 {
        "Moderate packing efficiency"
    } else {
        "Low packing efficiency"
    }
}

// ════════════════════════════════════════════════════════════════════════════
// GROWTH
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TarGrowthSnapshot {
    pub tar_file_count: u64,
    pub segment_count: u64,
    pub total_size_bytes: u64,
    pub total_size_formatted: String,
    pub avg_size_bytes: u64,
    pub avg_size_formatted: String,
    pub min_size_bytes: u64,
    pub min_size_formatted: String,
    pub max_size_bytes: u64,
    pub max_size_formatted: String,
    pub target_tar_size_bytes: u64,
    pub target_tar_size_formatted: String,
    pub packing_efficiency_pct: f64,
    pub packing_status: String,
    pub latest_head: String,
}

impl TarGrowthSnapshot {
    /// `deep_health` may be `{}` when the deep endpoint is unavailable.
    pub fn build(tar_raw: &Value, deep_health: &Value) -> Self {
        let files = TarFileView::list(tar_raw);
        let deep = DeepHealthView::from_value(deep_health);

        // Ukuran negatif dibuang dari statistik, tetapi file tetap dihitung.
        let sizes: Vec<u64> = files
            .iter()
            .map(|f| f.size.unwrap_or(0.0))
            .filter(|s| *s >= 0.0)
            .map(|s| count_from(Some(s)))
            .collect();

        let tar_file_count = files.len() as u64;
        let total_size_bytes = sizes.iter().copied().fold(0, u64::saturating_add);
        let avg_size_bytes = if tar_file_count > 0 {
            (total_size_bytes as f64 / tar_file_count as f64).round() as u64
        } else {
            0
        };
        let min_size_bytes = sizes.iter().copied().min().unwrap_or(0);
        let max_size_bytes = sizes.iter().copied().max().unwrap_or(0);
        let segment_count = files
            .iter()
            .map(|f| count_from(f.segment_count))
            .fold(0, u64::saturating_add);

        let efficiency = avg_size_bytes as f64 / TAR_TARGET_BYTES as f64 * 100.0;
        let packing_efficiency_pct = round_to(efficiency.max(0.0), 1);

        Self {
            tar_file_count,
            segment_count,
            total_size_bytes,
            total_size_formatted: format_bytes(total_size_bytes),
            avg_size_bytes,
            avg_size_formatted: format_bytes(avg_size_bytes),
            min_size_bytes,
            min_size_formatted: format_bytes(min_size_bytes),
            max_size_bytes,
            max_size_formatted: format_bytes(max_size_bytes),
            target_tar_size_bytes: TAR_TARGET_BYTES,
            target_tar_size_formatted: format_bytes(TAR_TARGET_BYTES),
            packing_efficiency_pct,
            packing_status: packing_status(packing_efficiency_pct).to_string(),
            latest_head: or_str(deep.file_store_latest_head, "unknown"),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// CHAIN
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TarChainFile {
    pub id: u64,
    pub name: String,
    pub size_bytes: u64,
    pub size_formatted: String,
    pub segment_count: u64,
    pub efficiency_pct: f64,
    pub width_pct: f64,
    pub created: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TarChainSnapshot {
    pub max_tar_size_bytes: u64,
    pub max_tar_size_formatted: String,
    pub tar_files: Vec<TarChainFile>,
}

impl TarChainSnapshot {
    pub fn build(tar_raw: &Value) -> Self {
        let files = TarFileView::list(tar_raw);
        let largest = files
            .iter()
            .map(|f| count_from(f.size))
            .max()
            .unwrap_or(0);
        let scaling_max = TAR_TARGET_BYTES.max(largest) as f64;

        let tar_files = files
            .into_iter()
            .enumerate()
            .map(|(index, file)| {
                let size_bytes = count_from(file.size);
                let size = size_bytes as f64;
                let efficiency = size / TAR_TARGET_BYTES as f64 * 100.0;
                let width = size / scaling_max * 100.0;
                TarChainFile {
                    id: index as u64,
                    name: file.name.unwrap_or_else(|| format!("data{index}.tar")),
                    size_bytes,
                    size_formatted: file
                        .size_formatted
                        .unwrap_or_else(|| format_bytes(size_bytes)),
                    segment_count: count_from(file.segment_count),
                    efficiency_pct: round_to(efficiency, 1),
                    width_pct: round_to(width, 2).max(MIN_WIDTH_PCT),
                    created: file.created.unwrap_or_default(),
                }
            })
            .collect();

        Self {
            max_tar_size_bytes: TAR_TARGET_BYTES,
            max_tar_size_formatted: format_bytes(TAR_TARGET_BYTES),
            tar_files,
        }
    }
}

impl SnapshotResolver {
    pub async fn tarmk(&self) -> Result<TarGrowthSnapshot, UpstreamError> {
        let upstream = self.upstream();
        let (tar_raw, deep_health) = tokio::join!(
            upstream.get(paths::TAR_SEGMENTS),
            upstream.get(paths::HEALTH_DEEP),
        );

        let tar_raw = tar_raw?;
        let deep_health = deep_health.unwrap_or_else(|e| {
            debug!(error = %e, "deep health unavailable for tar growth");
            json!({})
        });

        Ok(TarGrowthSnapshot::build(&tar_raw, &deep_health))
    }

    pub async fn tar_chain(&self) -> Result<TarChainSnapshot, UpstreamError> {
        let tar_raw = self.upstream().get(paths::TAR_SEGMENTS).await?;
        Ok(TarChainSnapshot::build(&tar_raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tars() -> Value {
        json!([
            { "name": "data00000a.tar", "size": 31_597_056, "segmentCount": 1616, "created": "2026-02-05T04:28:17Z" },
            { "name": "data00001a.tar", "size": 11_264, "segmentCount": 0, "created": "2026-02-06T15:53:41Z" },
            { "size": 20_480, "segmentCount": 1 },
        ])
    }

    #[test]
    fn test_tar_growth_stats() {
        let snap = TarGrowthSnapshot::build(
            &sample_tars(),
            &json!({ "fileStore": { "latestHead": "c4d4:464" } }),
        );

        assert_eq!(snap.tar_file_count, 3);
        assert_eq!(snap.segment_count, 1617);
        assert_eq!(snap.total_size_bytes, 31_628_800);
        assert_eq!(snap.total_size_formatted, "30.2 MB");
        assert_eq!(snap.avg_size_bytes, 10_542_933);
        assert_eq!(snap.min_size_bytes, 11_264);
        assert_eq!(snap.min_size_formatted, "11.0 KB");
        assert_eq!(snap.max_size_bytes, 31_597_056);
        assert_eq!(snap.target_tar_size_formatted, "256.0 MB");
        assert_eq!(snap.packing_efficiency_pct, 3.9);
        assert_eq!(snap.packing_status, "Low packing efficiency");
        assert_eq!(snap.latest_head, "c4d4:464");
    }

    #[test]
    fn test_tar_growth_empty_and_negative_sizes() {
        let snap = TarGrowthSnapshot::build(&json!({ "unexpected": true }), &json!({}));
        assert_eq!(snap.tar_file_count, 0);
        assert_eq!(snap.avg_size_bytes, 0);
        assert_eq!(snap.min_size_formatted, "0 B");
        assert_eq!(snap.latest_head, "unknown");

        let snap = TarGrowthSnapshot::build(&json!([{ "size": -50 }, { "size": 100 }]), &json!({}));
        assert_eq!(snap.tar_file_count, 2);
        assert_eq!(snap.min_size_bytes, 100);
        assert_eq!(snap.avg_size_bytes, 50);
    }

    #[test]
    fn test_tar_growth_saturates_huge_sizes() {
        let snap = TarGrowthSnapshot::build(
            &json!([
                { "size": 1.8e19, "segmentCount": 1.8e19 },
                { "size": 1.8e19, "segmentCount": 1.8e19 },
            ]),
            &json!({}),
        );
        assert_eq!(snap.tar_file_count, 2);
        assert_eq!(snap.total_size_bytes, u64::MAX);
        assert_eq!(snap.segment_count, u64::MAX);
        assert_eq!(snap.packing_status, "Very high packing efficiency");
    }

    #[test]
    fn test_packing_status_thresholds() {
        assert_eq!(packing_status(80.0), "Very high packing efficiency");
        assert_eq!(packing_status(50.0), "Moderate packing efficiency");
        assert_eq!(packing_status(49.9), "Low packing efficiency");

        let full = json!([{ "size": TAR_TARGET_BYTES }]);
        let snap = TarGrowthSnapshot::build(&full, &json!({}));
        assert_eq!(snap.packing_efficiency_pct, 100.0);
        assert_eq!(snap.packing_status, "Very high packing efficiency");
    }

    #[test]
    fn test_tar_chain_width_and_names() {
        let snap = TarChainSnapshot::build(&sample_tars());
        assert_eq!(snap.max_tar_size_bytes, TAR_TARGET_BYTES);
        assert_eq!(snap.tar_files.len(), 3);

        let first = &snap.tar_files[0];
        assert_eq!(first.id, 0);
        assert_eq!(first.size_formatted, "30.1 MB");
        assert_eq!(first.efficiency_pct, 11.8);
        assert_eq!(first.width_pct, 11.77);

        let small = &snap.tar_files[1];
        assert_eq!(small.efficiency_pct, 0.0);
        assert_eq!(small.width_pct, MIN_WIDTH_PCT);

        let unnamed = &snap.tar_files[2];
        assert_eq!(unnamed.name, "data2.tar");
        assert_eq!(unnamed.created, "");
    }

    #[test]
    fn test_tar_chain_scales_to_oversized_file() {
        let oversized = TAR_TARGET_BYTES * 2;
        let snap = TarChainSnapshot::build(&json!([
            { "name": "big.tar", "size": oversized, "sizeFormatted": "512 MiB" },
            { "name": "half.tar", "size": TAR_TARGET_BYTES },
        ]));
        assert_eq!(snap.tar_files[0].width_pct, 100.0);
        assert_eq!(snap.tar_files[0].efficiency_pct, 200.0);
        assert_eq!(snap.tar_files[0].size_formatted, "512 MiB");
        assert_eq!(snap.tar_files[1].width_pct, 50.0);
    }
}
