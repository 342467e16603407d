//! CLI entry point for the AERMOD tools.
//!
//! Provides subcommands for reducing PST concentration files to time series,
//! layer masses, lattice frames and statistics, and for producing or
//! repairing receptor definitions in AERMOD input files.

use aermod_tools::analyzers::aggregate::{align_wind, timeseries};
use aermod_tools::analyzers::layers::layer_masses;
use aermod_tools::config::{AnalysisConfig, ElevationColumn};
use aermod_tools::frames::TimeFrames;
use aermod_tools::output::{print_json, write_csv, write_grid_frames, write_json};
use aermod_tools::parser::{ParseOptions, PstFile, read_pst};
use aermod_tools::receptors::{ReceptorGrid, write_receptor_file};
use aermod_tools::repair::{RepairMode, repair_file};
use aermod_tools::sfc::read_sfc;
use aermod_tools::stats::ConcentrationStats;
use aermod_tools::timestamp::sort_chronologically;
use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use std::ffi::OsStr;
use std::path::Path;
use tracing::{error, info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "aermod_tools")]
#[command(about = "Post-processing utilities for AERMOD runs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every PST command.
#[derive(Args)]
struct AnalysisArgs {
    /// JSON file with analysis settings
    #[arg(long)]
    config: Option<String>,

    /// PST column holding the receptor elevation (default column5)
    #[arg(long, value_enum)]
    elevation_column: Option<ElevationColumn>,

    /// Receptor spacing in meters (default 200; use 100 for the 100 m runs)
    #[arg(long)]
    grid_spacing: Option<f64>,
}

impl AnalysisArgs {
    fn load(&self) -> Result<AnalysisConfig> {
        let mut config = AnalysisConfig::load_or_default(self.config.as_deref())?;
        if let Some(column) = self.elevation_column {
            config.elevation_column = column;
        }
        if let Some(spacing) = self.grid_spacing {
            config.grid_spacing_m = spacing;
        }
        Ok(config)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Center-region average, total mass and wind speed per timestamp
    Timeseries {
        /// PST file path
        #[arg(short, long, default_value = "runs/CACO3_4LAYER_1HR.PST")]
        input: String,

        /// SFC file to align wind speeds from
        #[arg(long)]
        sfc: Option<String>,

        /// CSV file to write the series to
        #[arg(short, long, default_value = "aerosol_timeseries.csv")]
        output: String,

        /// Half-width of the center region in meters
        #[arg(long)]
        center_radius: Option<f64>,

        /// Only use the first N timestamps
        #[arg(long)]
        max_frames: Option<usize>,

        /// Restrict to one configured layer
        #[arg(long)]
        layer: Option<String>,

        /// Sort the series by calendar time instead of file order
        #[arg(long, default_value_t = false)]
        chronological: bool,

        #[command(flatten)]
        analysis: AnalysisArgs,
    },
    /// Per-layer and total mass per timestamp
    Layers {
        /// PST file path
        #[arg(short, long, default_value = "runs/CACO3_4LAYER_1HR.PST")]
        input: String,

        /// JSON file to write the layer masses to
        #[arg(short, long, default_value = "layer_masses.json")]
        output: String,

        /// Receptors per layer
        #[arg(long)]
        cell_count: Option<usize>,

        #[command(flatten)]
        analysis: AnalysisArgs,
    },
    /// Reshape every frame into a lattice and write one CSV matrix per frame
    Grid {
        /// PST file path
        #[arg(short, long, default_value = "runs/CACO3_4LAYER_1HR.PST")]
        input: String,

        /// Directory for the per-frame CSV files
        #[arg(short = 'd', long, default_value = "grid_frames")]
        output_dir: String,

        /// Restrict to one configured layer; multi-layer runs only form a
        /// lattice one layer at a time
        #[arg(long)]
        layer: Option<String>,

        /// Receptors per lattice side
        #[arg(long)]
        size: Option<usize>,

        #[command(flatten)]
        analysis: AnalysisArgs,
    },
    /// Concentration distribution over the whole file
    Stats {
        /// PST file path
        #[arg(short, long, default_value = "runs/CACO3_4LAYER_1HR.PST")]
        input: String,

        /// Restrict to one configured layer
        #[arg(long)]
        layer: Option<String>,

        #[command(flatten)]
        analysis: AnalysisArgs,
    },
    /// Generate the multi-layer DISCCART receptor block
    Receptors {
        /// Output file for the RE block
        #[arg(short, long, default_value = "receptors_4layer_grid.inp")]
        output: String,

        /// Receptors per side
        #[arg(long, default_value_t = 89)]
        n_points: usize,

        /// Receptor spacing in meters
        #[arg(long, default_value_t = 200.0)]
        spacing: f64,

        #[arg(long, default_value_t = -8800.0, allow_hyphen_values = true)]
        x0: f64,

        #[arg(long, default_value_t = -8800.0, allow_hyphen_values = true)]
        y0: f64,

        /// Layer heights in meters, comma separated
        #[arg(long, value_delimiter = ',', default_values_t = [25.77, 84.85, 160.78, 257.64])]
        heights: Vec<f64>,
    },
    /// Backfill missing elevation fields on DISCCART lines
    Repair {
        /// AERMOD input file
        #[arg(short, long, default_value = "caco3_test_100m_fixed.inp")]
        input: String,

        /// Repaired output file
        #[arg(short, long, default_value = "caco3_test_100m_complete.inp")]
        output: String,

        /// Only repair lines missing every elevation field
        #[arg(long, default_value_t = false)]
        elevation_only: bool,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/aermod_tools.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("aermod_tools.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Timeseries {
            input,
            sfc,
            output,
            center_radius,
            max_frames,
            layer,
            chronological,
            analysis,
        } => {
            let mut config = analysis.load()?;
            if let Some(radius) = center_radius {
                config.center_radius_m = radius;
            }
            if max_frames.is_some() {
                config.max_frames = max_frames;
            }

            let frames = load_frames(&input, &config, layer.as_deref())?;
            let mut points = timeseries(&frames, &config);

            if let Some(sfc_path) = sfc {
                let winds = read_sfc(&sfc_path)?;
                align_wind(&mut points, &winds);
            }
            if chronological {
                sort_chronologically(&mut points, |p| p.timestamp.as_str());
            }

            let no_data = points.iter().filter(|p| p.center_average.is_none()).count();
            write_csv(&output, &points)?;
            info!(points = points.len(), no_data, output = %output, "Time series written");
        }
        Commands::Layers {
            input,
            output,
            cell_count,
            analysis,
        } => {
            let mut config = analysis.load()?;
            if let Some(count) = cell_count {
                config.layer_cell_count = count;
            }
            if config.elevation_column == ElevationColumn::None {
                bail!("layer aggregation needs an elevation column (--elevation-column)");
            }

            let frames = load_frames(&input, &config, None)?;
            let points = layer_masses(&frames, &config);
            let incomplete = points.iter().filter(|p| p.total_mass_kg.is_none()).count();

            write_json(&output, &points)?;
            info!(points = points.len(), incomplete, output = %output, "Layer masses written");
        }
        Commands::Grid {
            input,
            output_dir,
            layer,
            size,
            analysis,
        } => {
            let mut config = analysis.load()?;
            if let Some(size) = size {
                config.grid_size = size;
            }

            let frames = load_frames(&input, &config, layer.as_deref())?;
            export_grids(&frames, config.grid_size, &output_dir)?;
        }
        Commands::Stats {
            input,
            layer,
            analysis,
        } => {
            let config = analysis.load()?;
            let frames = load_frames(&input, &config, layer.as_deref())?;

            match ConcentrationStats::from_frames(&frames) {
                Some(stats) => print_json(&stats)?,
                None => warn!(input = %input, "No concentration samples found"),
            }
        }
        Commands::Receptors {
            output,
            n_points,
            spacing,
            x0,
            y0,
            heights,
        } => {
            let grid = ReceptorGrid {
                layer_heights: heights,
                n_points,
                spacing,
                x0,
                y0,
            };
            write_receptor_file(&output, &grid)?;
        }
        Commands::Repair {
            input,
            output,
            elevation_only,
        } => {
            let mode = if elevation_only {
                RepairMode::ElevationOnly
            } else {
                RepairMode::Full
            };
            repair_file(&input, &output, mode)?;
        }
    }

    Ok(())
}

/// Parses `input` and, when `layer` is given, keeps only that layer's samples.
fn load_frames(input: &str, config: &AnalysisConfig, layer: Option<&str>) -> Result<TimeFrames> {
    let PstFile { frames, report } = read_pst(input, ParseOptions::from(config))?;

    info!(
        input,
        frames = frames.len(),
        samples = report.samples,
        malformed = report.diagnostics.len(),
        truncated = report.truncated,
        "PST loaded"
    );

    let Some(name) = layer else {
        return Ok(frames);
    };
    if config.elevation_column == ElevationColumn::None {
        bail!("layer filtering needs an elevation column (--elevation-column)");
    }
    let layer = config
        .layer_by_name(name)
        .with_context(|| format!("unknown layer {name:?}"))?;

    let filtered = frames.filter_layer(layer);
    info!(
        layer = %layer.name,
        center_m = layer.center_m,
        samples = filtered.sample_count(),
        "Filtered to layer"
    );
    Ok(filtered)
}

/// Writes one CSV matrix per frame into `output_dir`. Frames that do not form
/// a complete lattice are logged and skipped.
#[tracing::instrument(skip(frames))]
fn export_grids(frames: &TimeFrames, size: usize, output_dir: &str) -> Result<()> {
    let export = write_grid_frames(frames, size, output_dir)?;
    if export.failed > 0 {
        warn!(written = export.written, failed = export.failed, "Some frames were skipped");
    } else {
        info!(written = export.written, "Grid frames written");
    }
    Ok(())
}
