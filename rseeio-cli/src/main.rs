//! RSEEIO command-line runner
//!
//! Loads an extracted EXIOBASE dataset, computes production and consumption
//! footprints and scope 1/2/3 emissions, and prints a report.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p rseeio-cli -- --config eeio.toml --region DE
//! cargo run -p rseeio-cli -- --data-dir IOT_2019_pxp --json > report.json
//! ```

use clap::Parser;
use rseeio_core::config::PipelineConfig;
use rseeio_core::pipeline::{Pipeline, PipelineReport};
use rseeio_core::scope::Scope;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::filter::LevelFilter;

/// Environmentally extended input-output footprints from EXIOBASE tables
#[derive(Parser, Debug)]
#[command(name = "rseeio")]
#[command(about = "Compute EEIO footprints and scope emissions from EXIOBASE tables")]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Extracted EXIOBASE directory (overrides the configuration)
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Region code to report in detail (overrides the configuration)
    #[arg(short, long)]
    region: Option<String>,

    /// Print the full report as JSON instead of text
    #[arg(long)]
    json: bool,

    /// Log level: off, trace, debug, info, warn, error
    #[arg(long, default_value = "info")]
    log_level: LevelFilter,
}

fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(&args) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => {
            info!(path = %path.display(), "Loading configuration");
            PipelineConfig::from_file(path)?
        }
        None => PipelineConfig::default(),
    };
    if let Some(data_dir) = &args.data_dir {
        config.data_dir = data_dir.clone();
    }
    if let Some(region) = &args.region {
        config.region = region.clone();
    }

    let report = Pipeline::new(config)?.run_from_disk()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &PipelineReport) {
    let fp = &report.footprints;
    let unit = &fp.unit;

    println!("World output: {:.2}", report.world_output);
    println!("Impact: {}", fp.impact);
    println!();
    println!(
        "Global production:  {:>14.3} {unit}",
        fp.global_production()
    );
    println!(
        "Global consumption: {:>14.3} {unit}",
        fp.global_consumption()
    );
    println!(
        "Reconciliation ratio: {:.9} ({})",
        report.reconciliation_ratio,
        if report.reconciled {
            "reconciled"
        } else {
            "NOT reconciled"
        }
    );
    println!();

    println!(
        "{:<8} {:>14} {:>14} {:>14}",
        "Region", "Production", "Consumption", "Net imports"
    );
    for region in fp.iter() {
        println!(
            "{:<8} {:>14.3} {:>14.3} {:>14.3}",
            region.region,
            region.production,
            region.consumption,
            region.net_imports()
        );
    }
    println!();

    let region = &report.region;
    println!(
        "{}: production {:.3} {unit}, consumption {:.3} {unit} (net {})",
        region.region,
        region.production,
        region.consumption,
        if region.is_net_importer() {
            "importer"
        } else {
            "exporter"
        }
    );

    for scope in Scope::ALL {
        let key = scope.to_string();
        if let Some(sectors) = report.top_sectors.get(&key) {
            println!();
            println!("{} top sectors in {} ({})", key, region.region, report.scopes.unit);
            for s in sectors {
                println!("  {:>12.4}  {}", s.get(scope), s.sector);
            }
        }
    }

    if let Some((_, direct)) = report
        .household_direct
        .iter()
        .find(|(code, _)| *code == region.region)
    {
        println!();
        println!(
            "Direct final-demand emissions in {}: {:.4} {}",
            region.region, direct, report.scopes.unit
        );
    }
}
