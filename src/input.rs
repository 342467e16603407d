//! Opens model input/output text files, gunzipping `.gz` files on the fly.

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::str::Utf8Error;
use tracing::debug;

/// Opens `path` for line-oriented reading.
///
/// # Errors
///
/// Returns an error if the file does not exist or cannot be opened.
pub fn open_text(path: &str) -> Result<Box<dyn BufRead>> {
    let file = File::open(path).with_context(|| format!("opening {path}"))?;
    let gzipped = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("gz"));
    debug!(path, gzipped, "Opened input file");

    let reader: Box<dyn Read> = if gzipped {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };
    Ok(Box::new(BufReader::new(reader)))
}

/// Reads the whole file at `path` into a string.
pub fn read_text(path: &str) -> Result<String> {
    let mut text = String::new();
    open_text(path)?
        .read_to_string(&mut text)
        .with_context(|| format!("reading {path}"))?;
    Ok(text)
}

/// Decodes one raw line from `BufRead::split(b'\n')`, dropping a trailing
/// `\r` the way `BufRead::lines` does.
pub fn decode_line(raw: &[u8]) -> Result<&str, Utf8Error> {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    std::str::from_utf8(raw)
}
