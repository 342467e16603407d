//! Output formatting and persistence for computed series.
//!
//! Tabular series go to CSV, nested results to pretty-printed JSON.

use anyhow::{Context, Result};
use csv::WriterBuilder;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use tracing::{debug, error, info};

use crate::frames::TimeFrames;
use crate::grid::ConcentrationGrid;

/// Writes `rows` as a CSV file with a header row, replacing any existing file.
pub fn write_csv<T: Serialize>(path: &str, rows: &[T]) -> Result<()> {
    let mut writer = WriterBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("creating {path}"))?;

    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    debug!(path, rows = rows.len(), "CSV written");
    Ok(())
}

/// Writes `value` as pretty-printed JSON.
pub fn write_json<T: Serialize>(path: &str, value: &T) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {path}"))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writeln!(writer)?;
    writer.flush()?;

    debug!(path, "JSON written");
    Ok(())
}

/// Logs `value` as pretty-printed JSON.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Writes a grid as a CSV matrix: a header of x coordinates, then one row
/// per y coordinate (ascending), led by that y.
pub fn write_grid<W: Write>(writer: W, grid: &ConcentrationGrid) -> Result<()> {
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(writer);

    let mut header = vec!["y\\x".to_string()];
    header.extend(grid.x.iter().map(|x| x.to_string()));
    writer.write_record(&header)?;

    for (y, row) in grid.y.iter().zip(grid.rows()) {
        let mut record = vec![y.to_string()];
        record.extend(row.iter().map(|v| v.to_string()));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_grid_file(path: &str, grid: &ConcentrationGrid) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {path}"))?;
    write_grid(BufWriter::new(file), grid)
}

/// `frame_YYYYMMDDHH.csv`, built from the timestamp's own digits so that
/// hour `24` and the next day's `00` land in different files. Falls back to
/// the frame index when the timestamp has too few digits.
pub fn grid_file_name(timestamp: &str, index: usize) -> String {
    let digits: String = timestamp
        .chars()
        .filter(char::is_ascii_digit)
        .take(10)
        .collect();
    if digits.len() == 10 {
        format!("frame_{digits}.csv")
    } else {
        format!("frame_{index:05}.csv")
    }
}

#[derive(Debug, Default, PartialEq)]
pub struct GridExport {
    pub written: usize,
    /// Frames that did not form a lattice.
    pub failed: usize,
}

/// Writes one CSV matrix per frame into `output_dir`, creating it if needed.
/// Frames that do not reshape are logged and counted, not fatal.
pub fn write_grid_frames(frames: &TimeFrames, size: usize, output_dir: &str) -> Result<GridExport> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("creating directory {output_dir}"))?;

    let mut export = GridExport::default();
    for (i, frame) in frames.iter().enumerate() {
        let grid = match ConcentrationGrid::from_samples(&frame.samples, size) {
            Ok(grid) => grid,
            Err(e) => {
                error!(timestamp = %frame.timestamp, error = %e, "Frame does not form a lattice");
                export.failed += 1;
                continue;
            }
        };

        let path = format!("{output_dir}/{}", grid_file_name(&frame.timestamp, i));
        write_grid_file(&path, &grid)?;
        export.written += 1;
    }
    Ok(export)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::types::TimeSeriesPoint;
    use crate::frames::sample;
    use std::env;
    use std::fs;

    fn temp_path(name: &str) -> String {
        format!("{}/{}", env::temp_dir().display(), name)
    }

    fn point(center_average: Option<f64>) -> TimeSeriesPoint {
        TimeSeriesPoint {
            timestamp: "2022-08-07 01:00:00".to_string(),
            samples: 3,
            center_average,
            total_mass_kg: 0.5,
            wind_speed: None,
        }
    }

    #[test]
    fn test_write_csv_header_and_missing_values() {
        let path = temp_path("aermod_tools_test_series.csv");
        let _ = fs::remove_file(&path);

        write_csv(&path, &[point(Some(1.5)), point(None)]).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(
            lines[0],
            "timestamp,samples,center_average,total_mass_kg,wind_speed"
        );
        assert_eq!(lines[1], "2022-08-07 01:00:00,3,1.5,0.5,");
        assert_eq!(lines[2], "2022-08-07 01:00:00,3,,0.5,");
        assert_eq!(lines.len(), 3);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_json_null_for_missing() {
        let path = temp_path("aermod_tools_test_point.json");
        write_json(&path, &point(None)).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert!(value["center_average"].is_null());
        assert_eq!(value["total_mass_kg"], 0.5);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_print_json_does_not_panic() {
        print_json(&point(Some(1.0))).unwrap();
    }

    #[test]
    fn test_write_grid_matrix() {
        let grid = ConcentrationGrid {
            x: vec![-100.0, 100.0],
            y: vec![-100.0, 100.0],
            values: vec![1.0, 2.0, 3.0, 4.5],
        };
        let mut buf = Vec::new();
        write_grid(&mut buf, &grid).unwrap();

        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "y\\x,-100,100\n-100,1,2\n100,3,4.5\n"
        );
    }

    #[test]
    fn test_grid_file_name_keeps_hour_24_distinct() {
        let late = grid_file_name("2022-08-07 24:00:00", 0);
        let midnight = grid_file_name("2022-08-08 00:00:00", 1);
        assert_eq!(late, "frame_2022080724.csv");
        assert_eq!(midnight, "frame_2022080800.csv");
        assert_ne!(late, midnight);
        assert_eq!(grid_file_name("bogus", 7), "frame_00007.csv");
    }

    #[test]
    fn test_write_grid_frames_one_file_per_frame() {
        let dir = temp_path("aermod_tools_test_grid_frames");
        let _ = fs::remove_dir_all(&dir);

        let mut frames = TimeFrames::new();
        for ts in ["2022-08-07 24:00:00", "2022-08-08 00:00:00"] {
            for (x, y) in [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0)] {
                frames.push(sample(x, y, None, 1.0, ts));
            }
        }
        frames.push(sample(0.0, 0.0, None, 1.0, "2022-08-08 01:00:00"));

        let export = write_grid_frames(&frames, 2, &dir).unwrap();
        assert_eq!(export, GridExport { written: 2, failed: 1 });
        assert_eq!(fs::read_dir(&dir).unwrap().count(), 2);
        assert!(fs::metadata(format!("{dir}/frame_2022080724.csv")).is_ok());
        assert!(fs::metadata(format!("{dir}/frame_2022080800.csv")).is_ok());

        fs::remove_dir_all(&dir).unwrap();
    }
}
