//! slcan-style raw capture logs
//!
//! Each line looks like `t<id:3 hex><dlc:1 hex><data:2*dlc hex><meta>`, for
//! example `t6B0800A100486E50005F0012`.

use anyhow::{Context, Result};
use can_telemetry_decoder::FrameEnvelope;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Shortest line that can carry a frame
const MIN_LINE_LEN: usize = 8;

/// Parse one raw line into an envelope, `meta` being the trailing text
pub fn parse_line(line: &str) -> Option<FrameEnvelope> {
    if line.len() < MIN_LINE_LEN {
        return None;
    }
    let id = line.get(1..4)?;
    let length = usize::from_str_radix(line.get(4..5)?, 16).ok()?;
    if length == 0 {
        return None;
    }
    let data_end = 5 + length * 2;
    let data = line.get(5..data_end)?;
    let meta = line.get(data_end..)?;

    Some(FrameEnvelope::new(id, length, data).with_meta(meta))
}

/// Result of a conversion run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConvertStats {
    pub converted: usize,
    pub skipped: usize,
}

/// Convert a raw log into JSON-lines envelopes, overwriting `output`
pub fn convert(input: &Path, output: &Path) -> Result<ConvertStats> {
    let reader = BufReader::new(
        File::open(input).with_context(|| format!("Failed to open input file: {:?}", input))?,
    );
    let mut writer = BufWriter::new(
        File::create(output).with_context(|| format!("Failed to create output file: {:?}", output))?,
    );

    let mut stats = ConvertStats::default();
    for line in reader.lines() {
        let line = line.context("Failed to read input file")?;
        match parse_line(&line) {
            Some(envelope) => {
                writeln!(writer, "{}", envelope.to_json()?)?;
                stats.converted += 1;
            }
            None => {
                log::debug!("Skipping line: {}", line);
                stats.skipped += 1;
            }
        }
    }
    writer.flush()?;

    Ok(stats)
}

/// Count frames per identifier in a raw log (upper-cased ids)
pub fn count_ids(input: &Path) -> Result<HashMap<String, u64>> {
    let reader = BufReader::new(
        File::open(input).with_context(|| format!("Failed to open file: {:?}", input))?,
    );

    let mut counts = HashMap::new();
    for line in reader.lines() {
        let line = line.context("Failed to read file")?;
        let line = line.trim();
        if !line.starts_with('t') {
            continue;
        }
        if let Some(id) = line.get(1..4) {
            *counts.entry(id.to_ascii_uppercase()).or_insert(0) += 1;
        }
    }

    Ok(counts)
}
