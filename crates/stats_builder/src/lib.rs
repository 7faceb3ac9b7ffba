//! Stats Builder Library
//!
//! File-format side of the aggregation pipeline:
//! play-by-play CSV → [`hockey_core::aggregate`] → report CSV + SHA256 metadata

pub mod events_csv;
pub mod reference;

use anyhow::{Context, Result};
use hockey_core::{AggregationConfig, ShiftRecord, StatsReport, REPORT_COLUMNS};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

pub use events_csv::{read_events, read_events_from, write_events, CsvEventSource, LoadStats};
pub use reference::{read_roster, read_roster_from, read_xg, read_xg_from};

/// Report metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Crate version that produced the report
    pub version: String,
    /// Data rows (header excluded)
    pub row_count: usize,
    /// SHA256 checksum of the CSV bytes (hex)
    pub checksum: String,
    /// Creation time (RFC3339)
    pub created_at: String,
    /// Settings the report was built with
    pub config: AggregationConfig,
}

/// Render the report as CSV. The header is always written, even for an
/// empty report; undefined ratios become empty cells.
pub fn report_to_csv(report: &StatsReport) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(REPORT_COLUMNS)?;
    for row in &report.rows {
        writer.serialize(row).context("Failed to serialize report row")?;
    }
    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush report CSV: {}", e))
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Write the report CSV and return its metadata.
pub fn write_report(
    report: &StatsReport,
    config: &AggregationConfig,
    out: &Path,
) -> Result<ReportMetadata> {
    let bytes = report_to_csv(report)?;

    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {}", parent.display()))?;
    }
    fs::write(out, &bytes)
        .with_context(|| format!("Failed to write report: {}", out.display()))?;

    Ok(ReportMetadata {
        version: hockey_core::VERSION.to_string(),
        row_count: report.len(),
        checksum: sha256_hex(&bytes),
        created_at: chrono::Utc::now().to_rfc3339(),
        config: config.clone(),
    })
}

pub fn save_metadata(path: &Path, meta: &ReportMetadata) -> Result<()> {
    let json = serde_json::to_string_pretty(meta)?;
    fs::write(path, json)
        .with_context(|| format!("Failed to write metadata: {}", path.display()))
}

pub fn load_metadata(path: &Path) -> Result<ReportMetadata> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read metadata: {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse metadata: {}", path.display()))
}

/// Whether the report file still matches the recorded checksum.
pub fn verify_report(report: &Path, expected_checksum: &str) -> Result<bool> {
    let bytes = fs::read(report)
        .with_context(|| format!("Failed to read report: {}", report.display()))?;
    Ok(sha256_hex(&bytes) == expected_checksum)
}

/// Write shift intervals, one row per player stint.
pub fn write_shifts(shifts: &[ShiftRecord], out: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(out)
        .with_context(|| format!("Failed to create shift CSV: {}", out.display()))?;
    for shift in shifts {
        writer.serialize(shift)?;
    }
    writer.flush()?;
    Ok(())
}
