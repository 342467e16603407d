use serde::Serialize;

use crate::analyzers::utility::{mean, percentile};
use crate::frames::TimeFrames;

/// Distribution of every concentration in a file, used to pick plot scales.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConcentrationStats {
    pub count: usize,
    pub frames: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub p95: f64,
    pub p99: f64,
    pub p99_9: f64,
}

impl ConcentrationStats {
    /// Returns `None` when `frames` holds no samples.
    pub fn from_frames(frames: &TimeFrames) -> Option<Self> {
        let mut all: Vec<f64> = frames
            .iter()
            .flat_map(|f| f.samples.iter().map(|s| s.concentration))
            .collect();
        all.sort_by(f64::total_cmp);

        Some(ConcentrationStats {
            count: all.len(),
            frames: frames.len(),
            min: *all.first()?,
            max: *all.last()?,
            mean: mean(&all)?,
            p95: percentile(&all, 95.0)?,
            p99: percentile(&all, 99.0)?,
            p99_9: percentile(&all, 99.9)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::sample;

    #[test]
    fn test_from_frames_empty() {
        assert_eq!(ConcentrationStats::from_frames(&TimeFrames::new()), None);
    }

    #[test]
    fn test_from_frames_spans_all_timestamps() {
        let mut frames = TimeFrames::new();
        for i in 0..=100 {
            let ts = if i % 2 == 0 {
                "2022-08-07 01:00:00"
            } else {
                "2022-08-07 02:00:00"
            };
            frames.push(sample(i as f64, 0.0, None, i as f64, ts));
        }

        let stats = ConcentrationStats::from_frames(&frames).unwrap();
        assert_eq!(stats.count, 101);
        assert_eq!(stats.frames, 2);
        assert_eq!(stats.min, 0.0);
        assert_eq!(stats.max, 100.0);
        assert_eq!(stats.mean, 50.0);
        assert!((stats.p95 - 95.0).abs() < 1e-9);
        assert!((stats.p99 - 99.0).abs() < 1e-9);
        assert!((stats.p99_9 - 99.9).abs() < 1e-9);
    }
}
