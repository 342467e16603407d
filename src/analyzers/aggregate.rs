use std::collections::HashMap;

use chrono::NaiveDateTime;
use tracing::debug;

use crate::analyzers::UG_TO_KG;
use crate::analyzers::types::TimeSeriesPoint;
use crate::analyzers::utility::mean;
use crate::config::AnalysisConfig;
use crate::frames::{Sample, TimeFrames};
use crate::sfc::WindObservation;
use crate::timestamp::normalize;

/// Mean concentration over receptors with `|x| <= radius` and `|y| <= radius`.
///
/// Returns `None` when no receptor falls inside the region, which is not the
/// same thing as a zero concentration.
pub fn center_average(samples: &[Sample], radius: f64) -> Option<f64> {
    let inside: Vec<f64> = samples
        .iter()
        .filter(|s| s.x.abs() <= radius && s.y.abs() <= radius)
        .map(|s| s.concentration)
        .collect();
    mean(&inside)
}

/// Total mass in the domain (kg): every receptor's concentration times the
/// cell area `grid_spacing²`.
pub fn total_mass_kg(samples: &[Sample], grid_spacing: f64) -> f64 {
    let cell_area = grid_spacing * grid_spacing;
    samples
        .iter()
        .map(|s| s.concentration * cell_area)
        .sum::<f64>()
        * UG_TO_KG
}

/// Computes one [`TimeSeriesPoint`] per timestamp, in first-seen order.
pub fn timeseries(frames: &TimeFrames, config: &AnalysisConfig) -> Vec<TimeSeriesPoint> {
    let points: Vec<TimeSeriesPoint> = frames
        .iter()
        .map(|frame| TimeSeriesPoint {
            timestamp: frame.timestamp.clone(),
            samples: frame.samples.len(),
            center_average: center_average(&frame.samples, config.center_radius_m),
            total_mass_kg: total_mass_kg(&frame.samples, config.grid_spacing_m),
            wind_speed: None,
        })
        .collect();

    debug!(
        points = points.len(),
        radius = config.center_radius_m,
        spacing = config.grid_spacing_m,
        "Time series computed"
    );
    points
}

/// Fills `wind_speed` on each point from the observation with the same
/// normalized timestamp. Later observations win on duplicate timestamps.
pub fn align_wind(points: &mut [TimeSeriesPoint], winds: &[WindObservation]) {
    let by_time: HashMap<NaiveDateTime, Option<f64>> = winds
        .iter()
        .filter_map(|w| normalize(&w.timestamp).ok().map(|t| (t, w.speed)))
        .collect();

    let mut matched = 0usize;
    for point in points.iter_mut() {
        point.wind_speed = normalize(&point.timestamp)
            .ok()
            .and_then(|t| by_time.get(&t).copied().flatten());
        if point.wind_speed.is_some() {
            matched += 1;
        }
    }

    debug!(points = points.len(), matched, "Wind speeds aligned");
}
