//! Benthic CLI - seafloor terrain classification

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use benthic_algorithms::classification::{
    run, ClassSummary, ClassificationJob, ClassifyParams, RuleTable, CLASS_NODATA, UNCLASSIFIED,
};
use benthic_algorithms::statistics::standardize_bpi;
use benthic_core::io::{read_geotiff, write_geotiff, GeoTiffOptions};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "benthic")]
#[command(author, version, about = "Seafloor terrain classification", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show information about a raster file
    Info {
        /// Input raster file
        input: PathBuf,
    },
    /// Validate a rule table and print its rules
    Rules {
        /// Rule table CSV
        table: PathBuf,
        /// Layer names in evaluation order, comma separated
        #[arg(short, long, value_delimiter = ',', required = true)]
        layers: Vec<String>,
        /// Code for cells that match no rule
        #[arg(long, default_value_t = UNCLASSIFIED)]
        unclassified: i32,
    },
    /// Classify layer rasters with a rule table
    Classify {
        /// Layer as NAME=PATH, repeated in table order
        #[arg(short, long = "layer", value_parser = parse_layer, required = true)]
        layers: Vec<(String, PathBuf)>,
        /// Rule table CSV
        #[arg(short, long)]
        rules: PathBuf,
        /// Output classified raster
        #[arg(short, long)]
        output: PathBuf,
        /// Write a Value,Zone,Count class key CSV
        #[arg(short, long)]
        key: Option<PathBuf>,
        /// Code for cells that match no rule
        #[arg(long, default_value_t = UNCLASSIFIED)]
        unclassified: i32,
        /// Code for cells with nodata in any layer
        #[arg(long, default_value_t = CLASS_NODATA, allow_hyphen_values = true)]
        nodata: i32,
    },
    /// Standardize a BPI raster (z-score x 100, rounded)
    Standardize {
        /// Input BPI raster
        input: PathBuf,
        /// Output file
        output: PathBuf,
    },
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn read_raster(path: &PathBuf) -> Result<benthic_core::Raster<f64>> {
    let pb = spinner("Reading raster...");
    let raster: benthic_core::Raster<f64> =
        read_geotiff(path, None).context("Failed to read raster")?;
    pb.finish_and_clear();
    Ok(raster)
}

fn write_result(raster: &benthic_core::Raster<f64>, path: &PathBuf) -> Result<()> {
    let pb = spinner("Writing output...");
    write_geotiff(raster, path, Some(GeoTiffOptions::default()))
        .context("Failed to write output")?;
    pb.finish_and_clear();
    Ok(())
}

fn done(name: &str, path: &PathBuf, elapsed: std::time::Duration) {
    println!("{} saved to: {}", name, path.display());
    println!("  Processing time: {:.2?}", elapsed);
}

fn parse_layer(s: &str) -> Result<(String, PathBuf)> {
    let Some((name, path)) = s.split_once('=') else {
        bail!("expected NAME=PATH, got '{}'", s);
    };
    let name = name.trim();
    if name.is_empty() || path.trim().is_empty() {
        bail!("expected NAME=PATH, got '{}'", s);
    }
    Ok((name.to_string(), PathBuf::from(path.trim())))
}

fn print_rules(table: &RuleTable) {
    println!("Layers: {}", table.layers().join(", "));
    println!("Unclassified: {}", table.unclassified());
    for (i, rule) in table.rules().iter().enumerate() {
        println!("{:>3}. [{}] {}", i + 1, rule.code, rule.name);
        for (layer, range) in table.layers().iter().zip(&rule.ranges) {
            if !range.is_unbounded() {
                println!("       {} in {}", layer, range);
            }
        }
    }
}

fn print_summary(summary: &ClassSummary) {
    let total = summary.total().max(1) as f64;
    println!("\nClasses:");
    for class in &summary.classes {
        println!(
            "  {:>6}  {:<28} {:>10} ({:.1}%)",
            class.code,
            class.zone,
            class.cells,
            100.0 * class.cells as f64 / total
        );
    }
    println!(
        "  {:>6}  {:<28} {:>10} ({:.1}%)",
        summary.unclassified_code,
        "Unclassified",
        summary.unclassified,
        100.0 * summary.unclassified as f64 / total
    );
    println!("  Nodata cells: {}", summary.nodata);
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        // ── Info ─────────────────────────────────────────────────────
        Commands::Info { input } => {
            let raster = read_raster(&input)?;
            let (rows, cols) = raster.shape();
            let bounds = raster.bounds();
            let stats = raster.statistics();

            println!("File: {}", input.display());
            println!("Dimensions: {} x {} ({} cells)", cols, rows, raster.len());
            println!("Cell size: {}", raster.cell_size());
            println!(
                "Bounds: ({:.6}, {:.6}) - ({:.6}, {:.6})",
                bounds.0, bounds.1, bounds.2, bounds.3
            );
            if let Some(nodata) = raster.nodata() {
                println!("NoData: {}", nodata);
            }
            println!("\nStatistics:");
            if let Some(min) = stats.min {
                println!("  Min: {:.4}", min);
            }
            if let Some(max) = stats.max {
                println!("  Max: {:.4}", max);
            }
            if let Some(mean) = stats.mean {
                println!("  Mean: {:.4}", mean);
            }
            if let Some(std_dev) = stats.std_dev {
                println!("  Std dev: {:.4}", std_dev);
            }
            println!(
                "  Valid cells: {} ({:.1}%)",
                stats.valid_count,
                100.0 * stats.valid_count as f64 / raster.len().max(1) as f64
            );
        }

        // ── Rules ────────────────────────────────────────────────────
        Commands::Rules {
            table,
            layers,
            unclassified,
        } => {
            let rules = RuleTable::from_csv_path(&table, &layers, unclassified)
                .with_context(|| format!("Invalid rule table {}", table.display()))?;
            println!("Rule table: {} ({} rules)", table.display(), rules.len());
            print_rules(&rules);
        }

        // ── Classify ─────────────────────────────────────────────────
        Commands::Classify {
            layers,
            rules,
            output,
            key,
            unclassified,
            nodata,
        } => {
            let job = ClassificationJob {
                layers,
                rules,
                output,
                key,
                unclassified,
                params: ClassifyParams { nodata },
            };
            info!("Classifying {} layers", job.layers.len());

            let pb = spinner("Classifying...");
            let start = Instant::now();
            let result = run(&job);
            pb.finish_and_clear();
            let summary = result.context("Classification failed")?;
            let elapsed = start.elapsed();

            for class in summary.empty_classes() {
                warn!("Class {} ({}) matched no cells", class.code, class.zone);
            }
            if summary.classified() == 0 {
                warn!("No cell matched any rule");
            }

            done("Classification", &job.output, elapsed);
            if let Some(key) = &job.key {
                println!("  Class key: {}", key.display());
            }
            print_summary(&summary);
        }

        // ── Standardize ──────────────────────────────────────────────
        Commands::Standardize { input, output } => {
            let raster = read_raster(&input)?;
            let start = Instant::now();
            let result = standardize_bpi(&raster).context("Failed to standardize BPI")?;
            let elapsed = start.elapsed();
            write_result(&result, &output)?;
            done("Standardized BPI", &output, elapsed);
        }
    }

    Ok(())
}
