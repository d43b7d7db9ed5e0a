//! geodiv CLI - geodiversity indices over an analytical grid

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use geodiv_algorithms::engine::PlanarEngine;
use geodiv_algorithms::landscape::ReliefParams;
use geodiv_algorithms::statistics::{NullPolicy, Scaling};
use geodiv_algorithms::tools::{run, Landscape, LandscapeKind, Metric, RunConfig};
use geodiv_core::io::{read_geotiff, read_layer, write_layer};
use geodiv_core::{Layer, Raster};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "geodiv")]
#[command(author, version, about = "Geodiversity indices over an analytical grid", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Grid input and output options shared by every metric
#[derive(Args)]
struct GridArgs {
    /// Analytical grid (GeoJSON polygons)
    grid: PathBuf,
    /// Integer field holding the zone ids
    #[arg(short, long)]
    id_field: String,
    /// Output GeoJSON; the grid file is overwritten when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Null handling: zero-fill or preserve-null
    #[arg(short, long, default_value = "zero-fill")]
    null_policy: String,
    /// Output column prefix instead of the derived one
    #[arg(short, long)]
    prefix: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show information about a raster file
    Info {
        /// Input raster file
        input: PathBuf,
    },
    /// Polygon category count (ANc)
    Anc {
        /// Landscape polygons (GeoJSON)
        landscape: PathBuf,
        /// Category field of the landscape
        #[arg(short, long)]
        category: String,
        #[command(flatten)]
        grid: GridArgs,
    },
    /// Polygon element count (ANe)
    Ane {
        /// Landscape polygons (GeoJSON)
        landscape: PathBuf,
        /// Category field; only used for the output prefix
        #[arg(short, long)]
        category: Option<String>,
        #[command(flatten)]
        grid: GridArgs,
    },
    /// Area-weighted Shannon diversity (SHDI)
    Shdi {
        /// Landscape polygons (GeoJSON)
        landscape: PathBuf,
        /// Category field of the landscape
        #[arg(short, long)]
        category: String,
        #[command(flatten)]
        grid: GridArgs,
    },
    /// Total line length (Tl)
    Tl {
        /// Landscape lines (GeoJSON)
        landscape: PathBuf,
        #[command(flatten)]
        grid: GridArgs,
    },
    /// Point category count by nearest zone (PNc)
    Pnc {
        /// Landscape points (GeoJSON)
        landscape: PathBuf,
        /// Category field of the landscape
        #[arg(short, long)]
        category: String,
        #[command(flatten)]
        grid: GridArgs,
    },
    /// Point element count (PNe)
    Pne {
        /// Landscape points (GeoJSON)
        landscape: PathBuf,
        #[command(flatten)]
        grid: GridArgs,
    },
    /// Unit entropy of point categories (H)
    H {
        /// Landscape points (GeoJSON)
        landscape: PathBuf,
        /// Category field of the landscape
        #[arg(short, long)]
        category: String,
        #[command(flatten)]
        grid: GridArgs,
    },
    /// Standard deviation of raster cells (RSD)
    Rsd {
        /// Input raster (GeoTIFF)
        raster: PathBuf,
        #[command(flatten)]
        grid: GridArgs,
    },
    /// Circular standard deviation of an angular raster in degrees (RSDc)
    Rsdc {
        /// Input raster (GeoTIFF), e.g. aspect
        raster: PathBuf,
        #[command(flatten)]
        grid: GridArgs,
    },
    /// Steinhaus vertical relief (RM)
    Rm {
        /// Input DEM (GeoTIFF)
        dem: PathBuf,
        #[command(flatten)]
        grid: GridArgs,
        /// Axis tolerance as a fraction of the cell size
        #[arg(long, default_value = "0.5")]
        tolerance: f64,
        /// Profile sampling step in cells
        #[arg(long, default_value = "1.0")]
        step: f64,
    },
}

/// Where the landscape of a metric comes from
enum Source {
    Vector(PathBuf),
    Raster(PathBuf),
}

/// One metric invocation assembled from the subcommand
struct Job {
    metric: Metric,
    source: Source,
    category: Option<String>,
    grid: GridArgs,
    relief: ReliefParams,
}

impl Job {
    fn vector(metric: Metric, landscape: PathBuf, category: Option<String>, grid: GridArgs) -> Self {
        Self {
            metric,
            source: Source::Vector(landscape),
            category,
            grid,
            relief: ReliefParams::default(),
        }
    }

    fn raster(metric: Metric, raster: PathBuf, grid: GridArgs) -> Self {
        Self {
            metric,
            source: Source::Raster(raster),
            category: None,
            grid,
            relief: ReliefParams::default(),
        }
    }
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set default subscriber")
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn read_raster(path: &Path) -> Result<Raster<f64>> {
    let pb = spinner("Reading raster...");
    let raster = read_geotiff(path).with_context(|| format!("Failed to read raster {}", path.display()))?;
    pb.finish_and_clear();
    info!("Raster: {} x {}", raster.cols(), raster.rows());
    Ok(raster)
}

fn read_vector(path: &Path) -> Result<Layer> {
    let pb = spinner("Reading layer...");
    let layer = read_layer(path).with_context(|| format!("Failed to read layer {}", path.display()))?;
    pb.finish_and_clear();
    info!("Layer '{}': {} features", layer.name(), layer.len());
    Ok(layer)
}

fn layer_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "landscape".to_string())
}

fn landscape_for(kind: LandscapeKind, layer: &Layer) -> Result<Landscape<'_>> {
    Ok(match kind {
        LandscapeKind::Polygons => Landscape::Polygons(layer),
        LandscapeKind::Lines => Landscape::Lines(layer),
        LandscapeKind::Points => Landscape::Points(layer),
        LandscapeKind::Raster => anyhow::bail!("Expected a vector landscape"),
    })
}

fn describe(scaling: Scaling) -> String {
    match scaling {
        Scaling::Degenerate => "no usable scale, all standardized to 0".to_string(),
        Scaling::MinMax { min, max } => format!("min {:.6}, max {:.6}", min, max),
    }
}

fn execute(job: Job) -> Result<()> {
    let Job {
        metric,
        source,
        category,
        grid: args,
        relief,
    } = job;

    let null_policy: NullPolicy = args
        .null_policy
        .parse()
        .context("Invalid --null-policy")?;
    let mut config = RunConfig::new(args.id_field.clone()).with_null_policy(null_policy);
    config.category_field = category;
    config.prefix = args.prefix.clone();
    config.relief = relief;

    let mut grid = read_vector(&args.grid)?;
    let start = Instant::now();

    let vector;
    let raster;
    let raster_name;
    let landscape = match &source {
        Source::Vector(path) => {
            vector = read_vector(path)?;
            landscape_for(metric.landscape_kind(), &vector)?
        }
        Source::Raster(path) => {
            raster = read_raster(path)?;
            raster_name = layer_name(path);
            Landscape::Raster {
                name: &raster_name,
                raster: &raster,
            }
        }
    };

    let pb = spinner(&format!("Computing {}...", metric));
    let report = run(&PlanarEngine, metric, landscape, &mut grid, &config)
        .with_context(|| format!("{} failed", metric))?;
    pb.finish_and_clear();
    let elapsed = start.elapsed();

    let output = args.output.as_ref().unwrap_or(&args.grid);
    let pb = spinner("Writing grid...");
    write_layer(&grid, output).context("Failed to write output grid")?;
    pb.finish_and_clear();

    println!("{} saved to: {}", metric, output.display());
    println!(
        "  Columns: {} ({}), {} ({})",
        report.schema.raw_name, report.schema.raw_alias, report.schema.std_name, report.schema.std_alias
    );
    println!("  Zones: {}", report.aggregates.len());
    println!("  Scaling: {}", describe(report.scaling));
    println!("  Processing time: {:.2?}", elapsed);
    Ok(())
}

fn info_raster(input: &Path) -> Result<()> {
    let raster = read_raster(input)?;
    let (rows, cols) = raster.shape();
    let extent = raster.extent();
    let valid = raster.data().iter().filter(|v| !raster.is_nodata(**v)).count();

    println!("File: {}", input.display());
    println!("Dimensions: {} x {} ({} cells)", cols, rows, raster.len());
    println!("Cell size: {} x {}", raster.cell_width(), raster.cell_height());
    println!(
        "Extent: ({:.6}, {:.6}) - ({:.6}, {:.6})",
        extent.min_x, extent.min_y, extent.max_x, extent.max_y
    );
    if let Some(nodata) = raster.nodata() {
        println!("NoData: {}", nodata);
    }
    if !raster.is_empty() {
        println!(
            "Valid cells: {} ({:.1}%)",
            valid,
            100.0 * valid as f64 / raster.len() as f64
        );
    }
    Ok(())
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    let job = match cli.command {
        Commands::Info { input } => return info_raster(&input),

        // ── Polygons ─────────────────────────────────────────────────
        Commands::Anc { landscape, category, grid } => {
            Job::vector(Metric::PolygonCategoryCount, landscape, Some(category), grid)
        }
        Commands::Ane { landscape, category, grid } => {
            Job::vector(Metric::PolygonElementCount, landscape, category, grid)
        }
        Commands::Shdi { landscape, category, grid } => {
            Job::vector(Metric::ShannonDiversity, landscape, Some(category), grid)
        }

        // ── Lines and points ─────────────────────────────────────────
        Commands::Tl { landscape, grid } => Job::vector(Metric::TotalLength, landscape, None, grid),
        Commands::Pnc { landscape, category, grid } => {
            Job::vector(Metric::PointCategoryCount, landscape, Some(category), grid)
        }
        Commands::Pne { landscape, grid } => Job::vector(Metric::PointElementCount, landscape, None, grid),
        Commands::H { landscape, category, grid } => {
            Job::vector(Metric::UnitEntropy, landscape, Some(category), grid)
        }

        // ── Rasters ──────────────────────────────────────────────────
        Commands::Rsd { raster, grid } => Job::raster(Metric::RasterStdDev, raster, grid),
        Commands::Rsdc { raster, grid } => Job::raster(Metric::CircularStdDev, raster, grid),
        Commands::Rm {
            dem,
            grid,
            tolerance,
            step,
        } => {
            if tolerance <= 0.0 || step <= 0.0 {
                anyhow::bail!("--tolerance and --step must be positive");
            }
            let mut job = Job::raster(Metric::VerticalRelief, dem, grid);
            job.relief = ReliefParams {
                tolerance_factor: tolerance,
                step_factor: step,
            };
            job
        }
    };

    execute(job)
}
