//! Line parser for AERMOD PST (post-processed time-series) files.
//!
//! Records are whitespace-separated. Only a handful of positions matter:
//!
//! | Index | Field                         |
//! |-------|-------------------------------|
//! | 0     | receptor x (m)                |
//! | 1     | receptor y (m)                |
//! | 2     | concentration (µg/m³)         |
//! | 5 / 6 | elevation, see [`ElevationColumn`] |
//! | 10    | packed `YYMMDDHH` date code   |

use anyhow::{Context, Result};
use std::io::BufRead;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{AnalysisConfig, ElevationColumn};
use crate::frames::{Sample, TimeFrames};
use crate::input::{decode_line, open_text};
use crate::timestamp::{TimestampError, decode_date_code};

pub const COMMENT_MARKER: char = '*';
pub const DATE_FIELD: usize = 10;

/// Why a data line was skipped.
#[derive(Debug, Error, PartialEq)]
pub enum LineError {
    #[error("expected at least {required} fields, found {found}")]
    TooFewFields { found: usize, required: usize },
    #[error("field {index} ({name}) is not a number: {value:?}")]
    InvalidNumber {
        index: usize,
        name: &'static str,
        value: String,
    },
    #[error(transparent)]
    DateCode(#[from] TimestampError),
    #[error("line is not valid UTF-8 after byte {valid_up_to}")]
    Encoding { valid_up_to: usize },
}

/// A skipped line, kept for reporting.
#[derive(Debug, PartialEq)]
pub struct ParseDiagnostic {
    /// 1-based.
    pub line_number: usize,
    pub line: String,
    pub error: LineError,
}

#[derive(Debug, Default, PartialEq)]
pub struct ParseReport {
    pub lines_read: usize,
    pub samples: usize,
    /// Comment and blank lines.
    pub skipped: usize,
    pub diagnostics: Vec<ParseDiagnostic>,
    /// Parsing stopped early because of the frame limit.
    pub truncated: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ParseOptions {
    pub elevation_column: ElevationColumn,
    pub max_frames: Option<usize>,
}

impl From<&AnalysisConfig> for ParseOptions {
    fn from(config: &AnalysisConfig) -> Self {
        ParseOptions {
            elevation_column: config.elevation_column,
            max_frames: config.max_frames,
        }
    }
}

#[derive(Debug)]
pub struct PstFile {
    pub frames: TimeFrames,
    pub report: ParseReport,
}

/// True for lines that carry no record: comments and whitespace-only lines.
pub fn is_skippable(line: &str) -> bool {
    line.starts_with(COMMENT_MARKER) || line.trim().is_empty()
}

fn parse_number(parts: &[&str], index: usize, name: &'static str) -> Result<f64, LineError> {
    parts[index]
        .parse::<f64>()
        .map_err(|_| LineError::InvalidNumber {
            index,
            name,
            value: parts[index].to_string(),
        })
}

/// Parses one data line into a [`Sample`].
pub fn parse_line(line: &str, elevation_column: ElevationColumn) -> Result<Sample, LineError> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let required = DATE_FIELD.max(elevation_column.index().unwrap_or(0)) + 1;
    if parts.len() < required {
        return Err(LineError::TooFewFields {
            found: parts.len(),
            required,
        });
    }

    let x = parse_number(&parts, 0, "x")?;
    let y = parse_number(&parts, 1, "y")?;
    let concentration = parse_number(&parts, 2, "concentration")?;
    let elevation = match elevation_column.index() {
        Some(i) => Some(parse_number(&parts, i, "elevation")?),
        None => None,
    };
    let timestamp = decode_date_code(parts[DATE_FIELD])?;

    Ok(Sample {
        x,
        y,
        elevation,
        concentration,
        timestamp,
    })
}

/// Parses a whole PST stream.
///
/// Malformed data lines are skipped, logged, and recorded in the report.
///
/// # Errors
///
/// Returns an error only if the underlying reader fails.
pub fn parse_pst<R: BufRead>(reader: R, options: ParseOptions) -> Result<PstFile> {
    let mut frames = TimeFrames::new();
    let mut report = ParseReport::default();

    for (i, raw) in reader.split(b'\n').enumerate() {
        let raw = raw.with_context(|| format!("reading PST line {}", i + 1))?;
        report.lines_read += 1;

        let line = match decode_line(&raw) {
            Ok(line) => line,
            Err(e) => {
                let error = LineError::Encoding {
                    valid_up_to: e.valid_up_to(),
                };
                warn!(line_number = i + 1, error = %error, "Skipping malformed PST line");
                report.diagnostics.push(ParseDiagnostic {
                    line_number: i + 1,
                    line: String::from_utf8_lossy(&raw).trim().to_string(),
                    error,
                });
                continue;
            }
        };

        if is_skippable(line) {
            report.skipped += 1;
            continue;
        }

        match parse_line(line, options.elevation_column) {
            Ok(sample) => {
                if let Some(limit) = options.max_frames {
                    if !frames.contains(&sample.timestamp) && frames.len() >= limit {
                        debug!(limit, line_number = i + 1, "Frame limit reached");
                        report.truncated = true;
                        break;
                    }
                }
                frames.push(sample);
                report.samples += 1;
            }
            Err(error) => {
                warn!(line_number = i + 1, error = %error, "Skipping malformed PST line");
                report.diagnostics.push(ParseDiagnostic {
                    line_number: i + 1,
                    line: line.trim().to_string(),
                    error,
                });
            }
        }
    }

    debug!(
        lines = report.lines_read,
        samples = report.samples,
        frames = frames.len(),
        malformed = report.diagnostics.len(),
        "PST parsed"
    );

    Ok(PstFile { frames, report })
}

/// Opens and parses the PST file at `path`.
#[tracing::instrument(skip(options))]
pub fn read_pst(path: &str, options: ParseOptions) -> Result<PstFile> {
    parse_pst(open_text(path)?, options).with_context(|| format!("parsing {path}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINE: &str =
        "  -8800.00  -8800.00     1.23456  100.00    0.00   84.85   25.77  1-HR  ALL  0  22080701";

    #[test]
    fn test_parse_line_without_elevation() {
        let s = parse_line(LINE, ElevationColumn::None).unwrap();
        assert_eq!(s.x, -8800.0);
        assert_eq!(s.y, -8800.0);
        assert_eq!(s.concentration, 1.23456);
        assert_eq!(s.elevation, None);
        assert_eq!(s.timestamp, "2022-08-07 01:00:00");
    }

    #[test]
    fn test_parse_line_elevation_columns_differ() {
        let s5 = parse_line(LINE, ElevationColumn::Column5).unwrap();
        let s6 = parse_line(LINE, ElevationColumn::Column6).unwrap();
        assert_eq!(s5.elevation, Some(84.85));
        assert_eq!(s6.elevation, Some(25.77));
    }

    #[test]
    fn test_parse_line_too_few_fields() {
        let err = parse_line("1.0 2.0 3.0", ElevationColumn::None).unwrap_err();
        assert_eq!(
            err,
            LineError::TooFewFields {
                found: 3,
                required: 11
            }
        );
    }

    #[test]
    fn test_parse_line_non_numeric() {
        let line = "1.0 abc 3.0 0 0 0 0 1-HR ALL 0 22080701";
        match parse_line(line, ElevationColumn::None).unwrap_err() {
            LineError::InvalidNumber { index, name, value } => {
                assert_eq!(index, 1);
                assert_eq!(name, "y");
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_line_bad_date_code() {
        let line = "1.0 2.0 3.0 0 0 0 0 1-HR ALL 0 2208X701";
        assert!(matches!(
            parse_line(line, ElevationColumn::None),
            Err(LineError::DateCode(_))
        ));
    }

    #[test]
    fn test_is_skippable() {
        assert!(is_skippable("* AERMOD ( 22112):"));
        assert!(is_skippable("   \t "));
        assert!(is_skippable(""));
        assert!(!is_skippable(LINE));
    }

    #[test]
    fn test_parse_pst_counts_samples_and_diagnostics() {
        let text = "\
* header line
*         X             Y      AVERAGE CONC
1.0 2.0 3.0 0 0 0 0 1-HR ALL 0 22080701

2.0 2.0 4.0 0 0 0 0 1-HR ALL 0 22080701
bad line
3.0 2.0 x 0 0 0 0 1-HR ALL 0 22080702
4.0 2.0 5.0 0 0 0 0 1-HR ALL 0 22080702
";
        let pst = parse_pst(text.as_bytes(), ParseOptions::default()).unwrap();
        assert_eq!(pst.report.lines_read, 8);
        assert_eq!(pst.report.samples, 3);
        assert_eq!(pst.report.diagnostics.len(), 2);
        assert_eq!(pst.report.skipped, 3);
        assert_eq!(pst.report.diagnostics[0].line_number, 6);
        assert_eq!(pst.frames.len(), 2);
        assert_eq!(pst.frames.sample_count(), 3);
        assert!(!pst.report.truncated);
    }

    #[test]
    fn test_parse_pst_frame_limit() {
        let text = "\
1.0 2.0 3.0 0 0 0 0 1-HR ALL 0 22080701
1.0 2.0 3.0 0 0 0 0 1-HR ALL 0 22080702
2.0 2.0 3.0 0 0 0 0 1-HR ALL 0 22080701
1.0 2.0 3.0 0 0 0 0 1-HR ALL 0 22080703
";
        let options = ParseOptions {
            max_frames: Some(2),
            ..Default::default()
        };
        let pst = parse_pst(text.as_bytes(), options).unwrap();
        assert_eq!(pst.frames.len(), 2);
        assert_eq!(pst.report.samples, 3);
        assert!(pst.report.truncated);
    }

    #[test]
    fn test_parse_pst_skips_invalid_utf8_line() {
        let mut bytes = b"1.0 2.0 3.0 0 0 0 0 1-HR ALL 0 22080701\n".to_vec();
        bytes.extend_from_slice(b"2.0 2.0 \xff\xfe 0 0 0 0 1-HR ALL 0 22080701\n");
        bytes.extend_from_slice(b"3.0 2.0 4.0 0 0 0 0 1-HR ALL 0 22080702\r\n");

        let pst = parse_pst(bytes.as_slice(), ParseOptions::default()).unwrap();
        assert_eq!(pst.report.lines_read, 3);
        assert_eq!(pst.report.samples, 2);
        assert_eq!(pst.report.diagnostics.len(), 1);
        assert_eq!(pst.report.diagnostics[0].line_number, 2);
        assert_eq!(
            pst.report.diagnostics[0].error,
            LineError::Encoding { valid_up_to: 8 }
        );
        assert_eq!(pst.frames.len(), 2);
    }

    #[test]
    fn test_read_pst_missing_file() {
        assert!(read_pst("/nonexistent/run.PST", ParseOptions::default()).is_err());
    }
}
