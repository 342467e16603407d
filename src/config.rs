//! Analysis settings shared by every command.
//!
//! Stored as a plain JSON object on disk; every field is optional and falls
//! back to the values used for the 4-layer, 200 m CaCO3 runs (the same grid
//! [`ReceptorGrid::default`](crate::receptors::ReceptorGrid) generates). For
//! the single-layer 100 m runs set `grid_spacing_m` to 100 and
//! `elevation_column` to `none`:
//! ```json
//! {
//!   "grid_spacing_m": 200.0,
//!   "center_radius_m": 150.0,
//!   "elevation_column": "column5",
//!   "layer_cell_count": 7921,
//!   "grid_size": 89
//! }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Which whitespace-separated PST column holds the receptor elevation.
///
/// Both layouts exist in practice, so the choice is always explicit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ElevationColumn {
    /// The file has no usable elevation; samples carry `None`.
    #[default]
    None,
    /// Elevation is read from field index 5.
    Column5,
    /// Elevation is read from field index 6.
    Column6,
}

impl ElevationColumn {
    pub fn index(self) -> Option<usize> {
        match self {
            ElevationColumn::None => None,
            ElevationColumn::Column5 => Some(5),
            ElevationColumn::Column6 => Some(6),
        }
    }
}

/// A vertical band of the receptor grid, used for mass aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub name: String,
    /// Nominal center elevation (m). Samples match on exact equality.
    pub center_m: f64,
    pub thickness_m: f64,
}

impl Layer {
    pub fn new(name: &str, center_m: f64, thickness_m: f64) -> Self {
        Layer {
            name: name.to_string(),
            center_m,
            thickness_m,
        }
    }

    pub fn contains(&self, elevation: Option<f64>) -> bool {
        elevation == Some(self.center_m)
    }
}

/// The canonical 4-layer set (center / thickness in meters).
pub fn canonical_layers() -> Vec<Layer> {
    vec![
        Layer::new("layer0", 25.77, 51.53),
        Layer::new("layer1", 84.85, 66.64),
        Layer::new("layer2", 160.78, 85.23),
        Layer::new("layer3", 257.64, 108.49),
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Receptor spacing (m); cell area is its square. Never inferred from data.
    pub grid_spacing_m: f64,
    /// Half-width (m) of the square center region around the origin.
    pub center_radius_m: f64,
    pub elevation_column: ElevationColumn,
    pub layers: Vec<Layer>,
    /// Receptors per layer used to scale the center concentration to a layer mass.
    pub layer_cell_count: usize,
    /// Side length of the regular lattice a frame reshapes into.
    pub grid_size: usize,
    /// Stop parsing after this many distinct timestamps.
    pub max_frames: Option<usize>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            grid_spacing_m: 200.0,
            center_radius_m: 150.0,
            elevation_column: ElevationColumn::Column5,
            layers: canonical_layers(),
            layer_cell_count: 89 * 89,
            grid_size: 89,
            max_frames: None,
        }
    }
}

impl AnalysisConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {path}"))?;
        let config: AnalysisConfig =
            serde_json::from_str(&content).with_context(|| format!("parsing config file {path}"))?;
        Ok(config)
    }

    /// Loads `path` when given, otherwise the defaults.
    pub fn load_or_default(path: Option<&str>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    pub fn cell_area_m2(&self) -> f64 {
        self.grid_spacing_m * self.grid_spacing_m
    }

    pub fn layer_by_name(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::receptors::ReceptorGrid;
    use std::env;
    use std::fs;

    #[test]
    fn test_defaults() {
        let config = AnalysisConfig::default();
        assert_eq!(config.grid_spacing_m, 200.0);
        assert_eq!(config.center_radius_m, 150.0);
        assert_eq!(config.elevation_column, ElevationColumn::Column5);
        assert_eq!(config.layer_cell_count, 7921);
        assert_eq!(config.layers.len(), 4);
        assert_eq!(config.cell_area_m2(), 40_000.0);
    }

    #[test]
    fn test_defaults_match_default_receptor_grid() {
        let config = AnalysisConfig::default();
        let receptors = ReceptorGrid::default();
        assert_eq!(config.grid_spacing_m, receptors.spacing);
        assert_eq!(config.grid_size, receptors.n_points);
        assert_eq!(config.layer_cell_count, receptors.n_points * receptors.n_points);
        let centers: Vec<f64> = config.layers.iter().map(|l| l.center_m).collect();
        assert_eq!(centers, receptors.layer_heights);
    }

    #[test]
    fn test_default_config_reads_layer_elevations() {
        let line = "0.0 0.0 1.5 0.0 0.0 84.85 25.77 1-HR ALL 0 22080701";
        let sample = crate::parser::parse_line(line, AnalysisConfig::default().elevation_column)
            .unwrap();
        let config = AnalysisConfig::default();
        assert!(config.layer_by_name("layer1").unwrap().contains(sample.elevation));
    }

    #[test]
    fn test_elevation_column_index() {
        assert_eq!(ElevationColumn::None.index(), None);
        assert_eq!(ElevationColumn::Column5.index(), Some(5));
        assert_eq!(ElevationColumn::Column6.index(), Some(6));
    }

    #[test]
    fn test_layer_contains_is_exact() {
        let layer = Layer::new("layer1", 84.85, 66.64);
        assert!(layer.contains(Some(84.85)));
        assert!(!layer.contains(Some(84.850001)));
        assert!(!layer.contains(None));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: AnalysisConfig =
            serde_json::from_str(r#"{"grid_spacing_m": 200.0, "elevation_column": "column6"}"#)
                .unwrap();
        assert_eq!(config.grid_spacing_m, 200.0);
        assert_eq!(config.elevation_column, ElevationColumn::Column6);
        assert_eq!(config.center_radius_m, 150.0);
        assert_eq!(config.layers, canonical_layers());
    }

    #[test]
    fn test_load_from_file() {
        let path = format!("{}/aermod_tools_test_config.json", env::temp_dir().display());
        fs::write(&path, r#"{"center_radius_m": 1000.0, "max_frames": 24}"#).unwrap();

        let config = AnalysisConfig::load(&path).unwrap();
        assert_eq!(config.center_radius_m, 1000.0);
        assert_eq!(config.max_frames, Some(24));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_missing_file_fails() {
        assert!(AnalysisConfig::load("/nonexistent/aermod_tools.json").is_err());
    }

    #[test]
    fn test_layer_by_name() {
        let config = AnalysisConfig::default();
        assert_eq!(config.layer_by_name("layer2").unwrap().center_m, 160.78);
        assert!(config.layer_by_name("layer9").is_none());
    }
}
