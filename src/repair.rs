//! Rewrites short `DISCCART` receptor lines into the five-field form
//! `X Y ZELEV ZHILL ZFLAG`.
//!
//! Token counts include the keyword. Only the 3- and 4-token forms are
//! rewritten; every other line is passed through byte for byte.

use anyhow::{Context, Result};
use std::borrow::Cow;
use tracing::info;

use crate::input::read_text;

pub const KEYWORD: &str = "DISCCART";
pub const DEFAULT_ZELEV: &str = "100.0";
pub const DEFAULT_ZHILL: &str = "100.0";
pub const DEFAULT_ZFLAG: &str = "0.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RepairMode {
    /// Backfill both `DISCCART X Y` and `DISCCART X Y ZELEV`.
    #[default]
    Full,
    /// Only backfill lines missing every elevation field (`DISCCART X Y`).
    ElevationOnly,
}

/// Repairs a single line, without its line terminator.
pub fn repair_line(line: &str, mode: RepairMode) -> Cow<'_, str> {
    if !line.trim_start().starts_with(KEYWORD) {
        return Cow::Borrowed(line);
    }

    let parts: Vec<&str> = line.split_whitespace().collect();
    match (parts.len(), mode) {
        (4, RepairMode::Full) => Cow::Owned(format!(
            "   {KEYWORD}   {}   {}   {}   {DEFAULT_ZHILL}   {DEFAULT_ZFLAG}",
            parts[1], parts[2], parts[3]
        )),
        (3, _) => Cow::Owned(format!(
            "   {KEYWORD}   {}   {}   {DEFAULT_ZELEV}   {DEFAULT_ZHILL}   {DEFAULT_ZFLAG}",
            parts[1], parts[2]
        )),
        _ => Cow::Borrowed(line),
    }
}

/// Result of repairing a whole file's text.
#[derive(Debug, PartialEq)]
pub struct RepairOutcome {
    pub text: String,
    pub lines: usize,
    pub repaired: usize,
}

/// Repairs every line of `text`, keeping original line terminators on
/// untouched lines. Rewritten lines end with `\n`.
pub fn repair_text(text: &str, mode: RepairMode) -> RepairOutcome {
    let mut out = String::with_capacity(text.len());
    let mut lines = 0;
    let mut repaired = 0;

    for raw in text.split_inclusive('\n') {
        lines += 1;
        let body = raw.trim_end_matches(['\n', '\r']);
        match repair_line(body, mode) {
            Cow::Owned(fixed) => {
                out.push_str(&fixed);
                out.push('\n');
                repaired += 1;
            }
            Cow::Borrowed(_) => out.push_str(raw),
        }
    }

    RepairOutcome {
        text: out,
        lines,
        repaired,
    }
}

/// Repairs the AERMOD input file at `input` and writes the result to `output`.
#[tracing::instrument]
pub fn repair_file(input: &str, output: &str, mode: RepairMode) -> Result<usize> {
    let text = read_text(input)?;
    let outcome = repair_text(&text, mode);
    std::fs::write(output, &outcome.text).with_context(|| format!("writing {output}"))?;

    info!(
        lines = outcome.lines,
        repaired = outcome.repaired,
        output,
        "DISCCART lines repaired"
    );
    Ok(outcome.repaired)
}
