//! Wind speeds from AERMOD SFC (surface meteorology) files.

use anyhow::{Context, Result};
use serde::Serialize;
use std::io::BufRead;
use tracing::{debug, warn};

use crate::input::{decode_line, open_text};
use crate::timestamp::format_hourly;

pub const MIN_FIELDS: usize = 16;
pub const WIND_SPEED_FIELD: usize = 15;
/// Speeds above this (m/s) are treated as missing.
pub const MAX_VALID_WIND_SPEED: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindObservation {
    /// `20YY-MM-DD HH:00:00`; hour may be `24`.
    pub timestamp: String,
    /// m/s; `None` when missing, non-positive or out of range.
    pub speed: Option<f64>,
}

fn parse_speed(field: &str) -> Option<f64> {
    field
        .parse::<f64>()
        .ok()
        .filter(|s| *s > 0.0 && *s <= MAX_VALID_WIND_SPEED)
}

/// Parses one SFC line. Header lines (leading space or `*`), blank lines and
/// records with fewer than 16 fields yield `None`.
pub fn parse_line(line: &str) -> Option<WindObservation> {
    if line.starts_with(' ') || line.starts_with('*') || line.trim().is_empty() {
        return None;
    }
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < MIN_FIELDS {
        return None;
    }

    Some(WindObservation {
        timestamp: format_hourly(parts[0], parts[1], parts[2], parts[4]),
        speed: parse_speed(parts[WIND_SPEED_FIELD]),
    })
}

/// Parses every observation in an SFC stream, in file order.
pub fn parse_sfc<R: BufRead>(reader: R) -> Result<Vec<WindObservation>> {
    let mut observations = Vec::new();
    let mut skipped = 0usize;

    for (i, raw) in reader.split(b'\n').enumerate() {
        let raw = raw.with_context(|| format!("reading SFC line {}", i + 1))?;
        let Ok(line) = decode_line(&raw) else {
            warn!(line_number = i + 1, "Skipping SFC line that is not valid UTF-8");
            skipped += 1;
            continue;
        };
        match parse_line(line) {
            Some(obs) => observations.push(obs),
            None => skipped += 1,
        }
    }

    let missing = observations.iter().filter(|o| o.speed.is_none()).count();
    debug!(observations = observations.len(), skipped, missing, "SFC parsed");
    Ok(observations)
}

#[tracing::instrument]
pub fn read_sfc(path: &str) -> Result<Vec<WindObservation>> {
    parse_sfc(open_text(path)?).with_context(|| format!("parsing {path}"))
}
