//! Result types produced by the aggregation pipeline.
//!
//! Missing data is `None` throughout and serializes as an empty CSV cell or
//! JSON `null`.

use serde::Serialize;

/// One row of the center-average / total-mass series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeriesPoint {
    pub timestamp: String,
    pub samples: usize,
    /// µg/m³ over the center region; `None` when no receptor falls inside it.
    pub center_average: Option<f64>,
    pub total_mass_kg: f64,
    /// m/s from the aligned SFC record.
    pub wind_speed: Option<f64>,
}

/// Mass held by one layer at one timestamp.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerMass {
    pub layer: String,
    pub center_m: f64,
    /// Concentration at the receptor nearest the origin.
    pub center_concentration: Option<f64>,
    pub mass_kg: Option<f64>,
}

/// All layer masses for one timestamp.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerMassPoint {
    pub timestamp: String,
    pub layers: Vec<LayerMass>,
    /// `None` as soon as any layer is missing.
    pub total_mass_kg: Option<f64>,
    pub missing_layers: usize,
}
