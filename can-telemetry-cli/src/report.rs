//! Plain-text reports
//!
//! Identifier count tables for captured logs and the summary printed after a
//! run.

use anyhow::{Context, Result};
use can_telemetry_decoder::messages::parse_identifier;
use can_telemetry_decoder::{DispatchStats, DocumentKind, EngineConfig, MessageKind};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Identifiers seen on the vehicle bus that are not decoded
const UNDECODED_IDS: [(u32, &str); 4] = [
    (0x036, "Battery Cell Broadcast"),
    (0x076, "Thermistor Broadcast"),
    (0x127, "DU1Diagnostic (limit flags)"),
    (0x357, "BMSCCSCommands (charging commands)"),
];

pub fn describe(identifier: &str) -> &'static str {
    let Some(can_id) = parse_identifier(identifier) else {
        return "-";
    };
    if let Some(kind) = MessageKind::from_can_id(can_id) {
        return kind.description();
    }
    UNDECODED_IDS
        .iter()
        .find(|(id, _)| *id == can_id)
        .map_or("-", |(_, description)| *description)
}

#[derive(Deserialize)]
struct IdOnly {
    #[serde(default)]
    id: String,
}

/// Count frames per identifier in a JSON-lines log (upper-cased ids)
pub fn count_log_ids(path: &Path) -> Result<HashMap<String, u64>> {
    let reader = BufReader::new(
        File::open(path).with_context(|| format!("Failed to open file: {:?}", path))?,
    );

    let mut counts = HashMap::new();
    for line in reader.lines() {
        let line = line.context("Failed to read file")?;
        let msg: IdOnly = match serde_json::from_str(&line) {
            Ok(msg) => msg,
            Err(e) => {
                log::warn!("Skipping invalid JSON: {}", e);
                continue;
            }
        };
        if msg.id.is_empty() {
            continue;
        }
        *counts.entry(msg.id.to_ascii_uppercase()).or_insert(0) += 1;
    }

    Ok(counts)
}

/// Counts ordered by numeric identifier
pub fn sorted_counts(counts: &HashMap<String, u64>) -> Vec<(&str, u64)> {
    let mut rows: Vec<(&str, u64)> = counts.iter().map(|(id, count)| (id.as_str(), *count)).collect();
    rows.sort_by_key(|(id, _)| (parse_identifier(id).unwrap_or(u32::MAX), *id));
    rows
}

pub fn print_log_analysis(counts: &HashMap<String, u64>) {
    println!("{:<6} {:<7} Description", "ID", "Count");
    println!("----------------------------------------------");
    for (id, count) in sorted_counts(counts) {
        println!("{:<6} {:<7} {}", id, count, describe(id));
    }
}

pub fn print_raw_analysis(counts: &HashMap<String, u64>) {
    println!("{:<6} Count", "ID");
    println!("----------------");
    for (id, count) in sorted_counts(counts) {
        println!("{:<6} {}", id, count);
    }
}

pub fn print_run_summary(stats: &DispatchStats, config: &EngineConfig) {
    println!("\n═══════════════════════════════════════════════");
    println!("  Run Summary");
    println!("═══════════════════════════════════════════════");
    println!("  Frames:    {}", stats.frames);
    println!("  Decoded:   {}", stats.decoded);
    println!("  Failed:    {}", stats.failed);
    println!("  Ignored:   {}", stats.ignored);
    if stats.publish_failures > 0 {
        println!("  Publish failures: {}", stats.publish_failures);
    }

    if !stats.per_message.is_empty() {
        println!("\n  Per message:");
        for kind in MessageKind::ALL {
            if let Some(count) = stats.per_message.get(&kind) {
                println!("    {:<28} {}", kind.to_string(), count);
            }
        }
    }

    println!("\n  Documents:");
    for document in DocumentKind::ALL {
        println!("    {:<10} {}", document.to_string(), config.document_path(document).display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_describe() {
        assert_eq!(describe("6b0"), "Battery Pack Status");
        assert_eq!(describe("357"), "BMSCCSCommands (charging commands)");
        assert_eq!(describe("036"), "Battery Cell Broadcast");
        assert_eq!(describe("7FF"), "-");
        assert_eq!(describe("xyz"), "-");
    }

    #[test]
    fn test_count_log_ids() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frames.jsonl");
        fs::write(
            &path,
            "{\"id\":\"6b0\",\"data\":\"00\"}\n{\"id\":\"6B0\"}\nnot json\n{\"data\":\"00\"}\n{\"id\":\"036\"}\n",
        )
        .unwrap();

        let counts = count_log_ids(&path).unwrap();
        assert_eq!(counts.len(), 2);
        assert_eq!(counts["6B0"], 2);
        assert_eq!(counts["036"], 1);
    }

    #[test]
    fn test_sorted_counts_are_numeric() {
        let counts: HashMap<String, u64> = [("6B0", 1), ("36", 2), ("125", 3), ("ZZ", 4)]
            .into_iter()
            .map(|(id, count)| (id.to_string(), count))
            .collect();

        let ids: Vec<&str> = sorted_counts(&counts).into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["36", "125", "6B0", "ZZ"]);
    }
}
