use tracing::{debug, warn};

use crate::analyzers::UG_TO_KG;
use crate::analyzers::types::{LayerMass, LayerMassPoint};
use crate::config::{AnalysisConfig, Layer};
use crate::frames::{Sample, TimeFrames};

/// The sample representing `layer`: elevation exactly equal to the layer
/// center, closest to the origin by `|x| + |y|`. Ties go to the earliest
/// sample in file order.
pub fn layer_center_sample<'a>(samples: &'a [Sample], layer: &Layer) -> Option<&'a Sample> {
    samples
        .iter()
        .filter(|s| layer.contains(s.elevation))
        .fold(None, |best: Option<&Sample>, s| match best {
            Some(b) if b.manhattan_from_origin() <= s.manhattan_from_origin() => Some(b),
            _ => Some(s),
        })
}

/// Layer mass (kg) from the center concentration, scaled to every cell of the
/// layer.
pub fn layer_mass_kg(
    center_concentration: f64,
    cell_area_m2: f64,
    thickness_m: f64,
    cell_count: usize,
) -> f64 {
    center_concentration * cell_area_m2 * thickness_m * cell_count as f64 * UG_TO_KG
}

/// Mass per configured layer for a single frame.
///
/// The total is `None` if any layer has no matching sample.
pub fn frame_layer_masses(
    timestamp: &str,
    samples: &[Sample],
    config: &AnalysisConfig,
) -> LayerMassPoint {
    let cell_area = config.cell_area_m2();

    let layers: Vec<LayerMass> = config
        .layers
        .iter()
        .map(|layer| {
            let center_concentration =
                layer_center_sample(samples, layer).map(|s| s.concentration);
            LayerMass {
                layer: layer.name.clone(),
                center_m: layer.center_m,
                center_concentration,
                mass_kg: center_concentration.map(|c| {
                    layer_mass_kg(c, cell_area, layer.thickness_m, config.layer_cell_count)
                }),
            }
        })
        .collect();

    let missing_layers = layers.iter().filter(|l| l.mass_kg.is_none()).count();
    let total_mass_kg = layers
        .iter()
        .map(|l| l.mass_kg)
        .sum::<Option<f64>>();

    if missing_layers > 0 {
        warn!(timestamp, missing_layers, "Layer center receptor missing");
    }

    LayerMassPoint {
        timestamp: timestamp.to_string(),
        layers,
        total_mass_kg,
        missing_layers,
    }
}

/// Computes layer masses for every frame, in first-seen order.
pub fn layer_masses(frames: &TimeFrames, config: &AnalysisConfig) -> Vec<LayerMassPoint> {
    let points: Vec<LayerMassPoint> = frames
        .iter()
        .map(|f| frame_layer_masses(&f.timestamp, &f.samples, config))
        .collect();

    let incomplete = points.iter().filter(|p| p.total_mass_kg.is_none()).count();
    debug!(points = points.len(), incomplete, "Layer masses computed");
    points
}
