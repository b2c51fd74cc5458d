use anyhow::{Context, Result};
use serde::Serialize;

use crate::data::collector::Transfer;

/// One display line per transfer:
/// `[  pid] name path 25.0% (250 kB / 1.0 MB) 10 kB/s`
pub fn format_line(t: &Transfer) -> String {
    let mut line = format!(
        "[{:5}] {} {} {:.1}% ({} / {})",
        t.process.pid,
        t.process.name,
        t.sample.target.display(),
        t.percent(),
        format_bytes(t.sample.offset),
        format_bytes(t.sample.size),
    );
    if let Some(rate) = t.bytes_per_sec {
        line.push(' ');
        line.push_str(&format_rate(rate));
    }
    line
}

#[derive(Serialize)]
struct TransferRecord<'a> {
    pid: u32,
    name: &'a str,
    fd: u32,
    path: String,
    size: u64,
    offset: u64,
    percent: f64,
    bytes_per_sec: Option<f64>,
}

/// All transfers as a pretty-printed JSON array.
pub fn to_json(transfers: &[Transfer]) -> Result<String> {
    let records: Vec<TransferRecord> = transfers
        .iter()
        .map(|t| TransferRecord {
            pid: t.process.pid,
            name: &t.process.name,
            fd: t.sample.fd,
            path: t.sample.target.display().to_string(),
            size: t.sample.size,
            offset: t.sample.offset,
            percent: t.percent(),
            bytes_per_sec: t.bytes_per_sec,
        })
        .collect();
    serde_json::to_string_pretty(&records).context("serializing transfers")
}

/// Format bytes with decimal units (kB = 1000 B).
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 7] = ["B", "kB", "MB", "GB", "TB", "PB", "EB"];

    if bytes < 10 {
        return format!("{bytes} B");
    }
    let mut scaled = bytes as f64;
    let mut unit = 0;
    while scaled >= 1000.0 && unit < UNITS.len() - 1 {
        scaled /= 1000.0;
        unit += 1;
    }
    let rounded = (scaled * 10.0 + 0.5).floor() / 10.0;
    if rounded < 10.0 {
        format!("{rounded:.1} {}", UNITS[unit])
    } else {
        format!("{rounded:.0} {}", UNITS[unit])
    }
}

/// Format a throughput figure, keeping the sign of a shrinking offset.
pub fn format_rate(bytes_per_sec: f64) -> String {
    let sign = if bytes_per_sec < 0.0 { "-" } else { "" };
    format!("{sign}{}/s", format_bytes(bytes_per_sec.abs() as u64))
}
