//! Generates the AERMOD receptor pathway (`RE`) block for a multi-layer
//! discrete Cartesian lattice.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use tracing::info;

#[derive(Debug, Clone, PartialEq)]
pub struct ReceptorGrid {
    /// One lattice copy per height (m).
    pub layer_heights: Vec<f64>,
    /// Receptors per side.
    pub n_points: usize,
    pub spacing: f64,
    pub x0: f64,
    pub y0: f64,
}

impl Default for ReceptorGrid {
    fn default() -> Self {
        ReceptorGrid {
            layer_heights: vec![25.77, 84.85, 160.78, 257.64],
            n_points: 89,
            spacing: 200.0,
            x0: -8800.0,
            y0: -8800.0,
        }
    }
}

impl ReceptorGrid {
    pub fn receptor_count(&self) -> usize {
        self.n_points * self.n_points * self.layer_heights.len()
    }

    /// Receptor coordinates in output order: layer, then x, then y.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64, f64)> + '_ {
        self.layer_heights.iter().flat_map(move |&z| {
            (0..self.n_points).flat_map(move |i| {
                let x = self.x0 + i as f64 * self.spacing;
                (0..self.n_points).map(move |j| (x, self.y0 + j as f64 * self.spacing, z))
            })
        })
    }

    fn layer_summary(&self) -> String {
        self.layer_heights
            .iter()
            .enumerate()
            .map(|(i, z)| format!("{i}: {z}m"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

pub fn disccart_line(x: f64, y: f64, z: f64) -> String {
    format!("   DISCCART {x:8.2} {y:8.2} {z:7.2} 0.0 0.0")
}

/// Writes the complete `RE STARTING` .. `RE FINISHED` block.
pub fn write_receptors<W: Write>(mut w: W, grid: &ReceptorGrid) -> Result<()> {
    writeln!(w, "RE STARTING")?;
    writeln!(w, "   ELEVUNIT  METERS")?;
    writeln!(w)?;
    writeln!(
        w,
        "** {}-layer 3D grid: {n}x{n} receptors per layer, {}m spacing, at heights **",
        grid.layer_heights.len(),
        grid.spacing,
        n = grid.n_points
    )?;
    writeln!(w, "** Layer {} **", grid.layer_summary())?;
    writeln!(w)?;

    for (x, y, z) in grid.points() {
        writeln!(w, "{}", disccart_line(x, y, z))?;
    }

    writeln!(w)?;
    writeln!(w, "RE FINISHED")?;
    w.flush()?;
    Ok(())
}

/// Writes the receptor block to `path`, replacing any existing file.
#[tracing::instrument(skip(grid))]
pub fn write_receptor_file(path: &str, grid: &ReceptorGrid) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {path}"))?;
    write_receptors(BufWriter::new(file), grid).with_context(|| format!("writing {path}"))?;
    info!(
        receptors = grid.receptor_count(),
        layers = grid.layer_heights.len(),
        "Receptor grid written"
    );
    Ok(())
}
