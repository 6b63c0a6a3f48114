//! Basmati CLI - basin hierarchy analysis on HydroSHEDS data

mod config;
mod download;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, error, info, Level};
use tracing_subscriber::FmtSubscriber;

use basmati_algorithms::hierarchy::{
    ancestors, area_select, find_downstream, find_next_level_larger, find_next_level_smaller,
    find_terminus, find_upstream, BasinView,
};
use basmati_algorithms::statistics::{coarse_grain, zonal_statistics};
use basmati_algorithms::vector::{mask_to_basin, rasterize_basins};
use basmati_core::basin::BasinTable;
use basmati_core::io::{load_hydrobasins, load_hydrosheds_dem, write_geotiff};
use basmati_core::pfaf::{try_is_downstream, PfafCode};
use basmati_core::raster::Raster;

use config::{find_project_root, init_project, ProjectConfig};
use download::{Downloader, Product};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "basmati")]
#[command(author, version, about = "Basin hierarchy analysis on HydroSHEDS data", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print basin lists as JSON
    #[arg(long, global = true)]
    json: bool,

    /// HydroSHEDS data directory (overrides basmati.toml)
    #[arg(long, global = true)]
    hydrosheds_dir: Option<PathBuf>,

    /// Region code, e.g. "as" (overrides basmati.toml)
    #[arg(short, long, global = true)]
    region: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Make the current directory a basmati project
    Init,
    /// Download HydroSHEDS data into the HydroSHEDS directory
    Download {
        /// What to fetch
        #[arg(required = true, value_enum)]
        products: Vec<Product>,
        /// Regions to fetch (default: [download] regions in basmati.toml)
        #[arg(long = "regions", value_delimiter = ',')]
        regions: Vec<String>,
    },
    /// Basin counts and area statistics per level
    Info {
        /// Levels to load (default: levels in basmati.toml)
        #[arg(short, long, value_delimiter = ',')]
        levels: Vec<u8>,
    },
    /// Basins downstream of a basin, to the coast
    Downstream {
        /// Pfafstetter code of the start basin
        code: PfafCode,
    },
    /// Basins draining into a basin
    Upstream {
        /// Pfafstetter code of the start basin
        code: PfafCode,
    },
    /// The basin one level coarser containing a basin
    Larger {
        /// Pfafstetter code of the start basin
        code: PfafCode,
        /// List every containing basin up to level 1
        #[arg(long)]
        all: bool,
    },
    /// The basins one level finer inside a basin
    Smaller {
        /// Pfafstetter code of the start basin
        code: PfafCode,
    },
    /// Non-nested basins with sub-basin area in [min, max] km²
    AreaSelect {
        #[arg(long)]
        min: f64,
        #[arg(long)]
        max: f64,
        /// Levels to load (default: levels in basmati.toml)
        #[arg(short, long, value_delimiter = ',')]
        levels: Vec<u8>,
    },
    /// Decide from two Pfafstetter codes whether B is downstream of A
    Compare {
        a: String,
        b: String,
    },
    /// Furthest basin from its outlet at a level, with its flow path
    Furthest {
        #[arg(short, long, default_value = "4")]
        level: u8,
    },
    /// Show information about the region's DEM
    DemInfo,
    /// Rasterize all basins of a level onto the DEM grid
    Rasterize {
        #[arg(short, long)]
        level: u8,
        /// Output GeoTIFF (cell = 1-based basin index, 0 = none)
        output: PathBuf,
        /// Print per-basin elevation statistics
        #[arg(long)]
        stats: bool,
    },
    /// DEM cells of one basin, other cells set to no-data
    Mask {
        /// Pfafstetter code of the basin
        code: PfafCode,
        /// Output GeoTIFF
        output: PathBuf,
        /// Average blocks of ROWS x COLS cells
        #[arg(long, num_args = 2, value_names = ["ROWS", "COLS"])]
        coarse_grain: Option<Vec<usize>>,
    },
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Logging disabled: {}", e);
    }
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Settings from the enclosing project, with command-line overrides.
fn project_config(cli: &Cli) -> Result<ProjectConfig> {
    let cwd = std::env::current_dir()?;
    let mut config = match find_project_root(&cwd) {
        Some(root) => {
            debug!("project root: {}", root.display());
            ProjectConfig::load(&root)?
        }
        None if cli.hydrosheds_dir.is_some() => ProjectConfig::default(),
        None => bail!("Not in a basmati project (run `basmati init`) and no --hydrosheds-dir given"),
    };
    if let Some(dir) = &cli.hydrosheds_dir {
        config.hydrosheds_dir = dir.clone();
    }
    if let Some(region) = &cli.region {
        config.region = region.clone();
    }
    Ok(config)
}

fn load_basins(config: &ProjectConfig, levels: &[u8]) -> Result<BasinTable> {
    let pb = spinner("Loading basins...");
    let table = load_hydrobasins(&config.hydrosheds_dir, &config.region, levels.iter().copied())
        .context("Failed to load HydroBASINS")?;
    pb.finish_and_clear();
    info!("Loaded {} basins from levels {:?}", table.len(), levels);
    Ok(table)
}

fn load_dem(config: &ProjectConfig) -> Result<Raster<f64>> {
    let pb = spinner("Reading DEM...");
    let dem = load_hydrosheds_dem(&config.hydrosheds_dir, &config.region, &config.dem_resolution)
        .context("Failed to read DEM")?;
    pb.finish_and_clear();
    info!("DEM: {} x {}", dem.cols(), dem.rows());
    Ok(dem)
}

fn code_level(code: &PfafCode) -> Result<u8> {
    u8::try_from(code.len()).context("Pfafstetter code too long")
}

/// The code's level and the next finer one
fn finer_levels(code: &PfafCode) -> Result<Vec<u8>> {
    let level = code_level(code)?;
    let Some(finer) = level.checked_add(1) else {
        bail!("No level finer than {}", level);
    };
    Ok(vec![level, finer])
}

fn level_or_config(levels: Vec<u8>, config: &ProjectConfig) -> Vec<u8> {
    if levels.is_empty() {
        config.levels.clone()
    } else {
        levels
    }
}

fn print_basins(view: &BasinView<'_>, json: bool) -> Result<()> {
    if json {
        let records: Vec<_> = view.iter().collect();
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }
    println!(
        "{:>14} {:>12} {:>5} {:>12} {:>12} {:>10}",
        "PFAF_ID", "HYBAS_ID", "LEVEL", "NEXT_DOWN", "SUB_AREA", "DIST_MAIN"
    );
    for rec in view.iter() {
        println!(
            "{:>14} {:>12} {:>5} {:>12} {:>12.1} {:>10.1}",
            rec.pfaf(),
            rec.hybas_id,
            rec.level,
            rec.next_down_id,
            rec.sub_area,
            rec.dist_main
        );
    }
    println!("{} basins, total area {:.1} km²", view.len(), view.total_area());
    Ok(())
}

fn write_result<T: basmati_core::RasterElement>(raster: &Raster<T>, path: &PathBuf) -> Result<()> {
    let pb = spinner("Writing output...");
    write_geotiff(raster, path).context("Failed to write output")?;
    pb.finish_and_clear();
    Ok(())
}

fn done(name: &str, path: &PathBuf, elapsed: std::time::Duration) {
    println!("{} saved to: {}", name, path.display());
    println!("  Processing time: {:.2?}", elapsed);
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match &cli.command {
        // ── Project ──────────────────────────────────────────────────
        Commands::Init => {
            let cwd = std::env::current_dir()?;
            let config_path = init_project(&cwd)?;
            println!("Initialized basmati project in {}", cwd.display());
            println!("  Edit {} to point at your HydroSHEDS data", config_path.display());
        }

        Commands::Download { products, regions } => {
            let config = project_config(&cli)?;
            let regions = if regions.is_empty() {
                config.download.regions.clone()
            } else {
                regions.clone()
            };
            let downloader = Downloader::new(
                &config.hydrosheds_dir,
                config.download.clone(),
                &config.dem_resolution,
            )?;
            let mut failures = 0;
            for region in &regions {
                for &product in products {
                    match downloader.download(product, region) {
                        Ok(path) => println!("Downloaded {}", path.display()),
                        Err(e) => {
                            error!("{:?} for {}: {:#}", product, region, e);
                            failures += 1;
                        }
                    }
                }
            }
            if failures > 0 {
                bail!("{} download(s) failed", failures);
            }
        }

        // ── Queries ──────────────────────────────────────────────────
        Commands::Info { levels } => {
            let config = project_config(&cli)?;
            let table = load_basins(&config, &level_or_config(levels.clone(), &config))?;
            println!("Region: {}", config.region);
            if let Some(crs) = table.crs() {
                println!("CRS: {}", crs);
            }
            println!(
                "{:>5} {:>8} {:>12} {:>12} {:>12}",
                "LEVEL", "BASINS", "MIN_AREA", "MEAN_AREA", "MAX_AREA"
            );
            for level in table.levels() {
                let rows = table.level_rows(level);
                let areas: Vec<f64> = rows.iter().map(|&r| table.records()[r].sub_area).collect();
                let min = areas.iter().copied().fold(f64::INFINITY, f64::min);
                let max = areas.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                let mean = areas.iter().sum::<f64>() / areas.len().max(1) as f64;
                println!(
                    "{:>5} {:>8} {:>12.1} {:>12.1} {:>12.1}",
                    level,
                    rows.len(),
                    min,
                    mean,
                    max
                );
            }
        }

        Commands::Downstream { code } => {
            let config = project_config(&cli)?;
            let table = load_basins(&config, &[code_level(code)?])?;
            print_basins(&find_downstream(&table, code)?, cli.json)?;
        }

        Commands::Upstream { code } => {
            let config = project_config(&cli)?;
            let table = load_basins(&config, &[code_level(code)?])?;
            print_basins(&find_upstream(&table, code)?, cli.json)?;
        }

        Commands::Larger { code, all } => {
            let config = project_config(&cli)?;
            let level = code_level(code)?;
            let first = if *all { 1 } else { level.saturating_sub(1).max(1) };
            let levels: Vec<u8> = (first..=level).collect();
            let table = load_basins(&config, &levels)?;
            let view = if *all {
                ancestors(&table, code)?
            } else {
                find_next_level_larger(&table, code)?
            };
            if view.is_empty() && !cli.json {
                println!("{} is at the coarsest level", code);
            } else {
                print_basins(&view, cli.json)?;
            }
        }

        Commands::Smaller { code } => {
            let config = project_config(&cli)?;
            let table = load_basins(&config, &finer_levels(code)?)?;
            print_basins(&find_next_level_smaller(&table, code)?, cli.json)?;
        }

        Commands::AreaSelect { min, max, levels } => {
            let config = project_config(&cli)?;
            let table = load_basins(&config, &level_or_config(levels.clone(), &config))?;
            let start = Instant::now();
            let view = area_select(&table, *min, *max)?;
            debug!("area_select took {:.2?}", start.elapsed());
            print_basins(&view, cli.json)?;
        }

        Commands::Compare { a, b } => {
            let downstream = try_is_downstream(a.as_str(), b.as_str())?;
            if cli.json {
                println!("{}", serde_json::json!({ "a": a, "b": b, "downstream": downstream }));
            } else if downstream {
                println!("{} is downstream of {}", b, a);
            } else {
                println!("{} is not downstream of {}", b, a);
            }
        }

        Commands::Furthest { level } => {
            let config = project_config(&cli)?;
            let table = load_basins(&config, &[*level])?;
            let Some(row) = table.row_with_max(Some(*level), |r| r.dist_main) else {
                bail!("No basins at level {}", level);
            };
            let furthest = table.records()[row].pfaf().clone();
            let chain = find_downstream(&table, &furthest)?;
            let terminus = table.records()[find_terminus(&table, &furthest)?].pfaf().clone();
            let upstream = find_upstream(&table, &terminus)?;

            if cli.json {
                print_basins(&chain, true)?;
            } else {
                println!("Furthest basin at level {}: {}", level, furthest);
                println!("\nFlow path to the coast:");
                print_basins(&chain, false)?;
                println!("\nBasins draining to {}: {}", terminus, upstream.len());
                println!("  Total area: {:.1} km²", upstream.total_area());
            }
        }

        // ── Rasters ──────────────────────────────────────────────────
        Commands::DemInfo => {
            let config = project_config(&cli)?;
            let dem = load_dem(&config)?;
            let (rows, cols) = dem.shape();
            let bounds = dem.bounds();
            let stats = dem.statistics();

            println!("Region: {} ({})", config.region, config.dem_resolution);
            println!("Dimensions: {} x {} ({} cells)", cols, rows, dem.len());
            println!("Cell size: {}", dem.transform().cell_size());
            println!(
                "Bounds: ({:.6}, {:.6}) - ({:.6}, {:.6})",
                bounds.left, bounds.bottom, bounds.right, bounds.top
            );
            if let Some(crs) = dem.crs() {
                println!("CRS: {}", crs);
            }
            if let Some(nodata) = dem.nodata() {
                println!("NoData: {}", nodata);
            }
            println!("\nStatistics:");
            if let Some(min) = stats.min {
                println!("  Min: {:.1}", min);
            }
            if let Some(max) = stats.max {
                println!("  Max: {:.1}", max);
            }
            if let Some(mean) = stats.mean {
                println!("  Mean: {:.1}", mean);
            }
            println!(
                "  Valid cells: {} ({:.1}%)",
                stats.valid_count,
                100.0 * stats.valid_count as f64 / dem.len().max(1) as f64
            );
        }

        Commands::Rasterize {
            level,
            output,
            stats,
        } => {
            let config = project_config(&cli)?;
            let dem = load_dem(&config)?;
            let table = load_basins(&config, &[*level])?;
            let view = BasinView::new(&table, table.level_rows(*level).to_vec());

            let start = Instant::now();
            let labels = rasterize_basins(&view, dem.shape(), dem.transform())
                .context("Failed to rasterize basins")?;
            let elapsed = start.elapsed();
            write_result(&labels, output)?;
            done("Basin raster", output, elapsed);

            if *stats {
                let zones = zonal_statistics(&dem, &labels)?;
                let records: Vec<_> = view.iter().collect();
                println!(
                    "\n{:>14} {:>8} {:>10} {:>10} {:>10}",
                    "PFAF_ID", "CELLS", "MIN", "MEAN", "MAX"
                );
                for (label, z) in &zones {
                    let code = usize::try_from(*label - 1)
                        .ok()
                        .and_then(|i| records.get(i))
                        .map_or("?", |r| r.pfaf_str());
                    println!(
                        "{:>14} {:>8} {:>10.1} {:>10.1} {:>10.1}",
                        code, z.count, z.min, z.mean, z.max
                    );
                }
            }
        }

        Commands::Mask {
            code,
            output,
            coarse_grain: grain,
        } => {
            let config = project_config(&cli)?;
            let dem = load_dem(&config)?;
            let table = load_basins(&config, &[code_level(code)?])?;
            let view = BasinView::new(&table, vec![table.find_pfaf(code)?]);

            let start = Instant::now();
            let labels = rasterize_basins(&view, dem.shape(), dem.transform())?;
            let mut masked = mask_to_basin(&dem, &labels, 1)?;
            if let Some(grain) = grain {
                masked = coarse_grain(&masked, (grain[0], grain[1]))
                    .context("Failed to coarse-grain")?;
            }
            let elapsed = start.elapsed();
            write_result(&masked, output)?;
            done(&format!("Basin {} DEM", code), output, elapsed);
        }
    }

    Ok(())
}
