// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Facetize CLI

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use facetize::cli::{with_quiet_panics, ProgressClient, Reporter};
use facetize::config::ConversionConfig;
use facetize::convert::{run_walk, Converter};
use facetize::db::{MemoryDatabase, ObjectDatabase, Selector};
use facetize::geometry::analyze;
use facetize::io::{ExportSink, MeshCollector, StlSink};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "facetize")]
#[command(version, about = "Evaluate CSG assemblies into triangulated boundary meshes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert top-level objects of a scene to triangles
    Convert(ConvertArgs),

    /// List the top-level objects of a scene
    List {
        /// Scene file (TOML or JSON)
        scene: PathBuf,
    },
}

#[derive(Args)]
struct ConvertArgs {
    /// Scene file (TOML or JSON)
    scene: PathBuf,

    /// Binary STL output file
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Only these top-level names (comma separated)
    #[arg(long, value_delimiter = ',')]
    names: Vec<String>,

    /// Only top-level names with this prefix
    #[arg(long, conflicts_with = "names")]
    prefix: Option<String>,

    /// Fusing distance
    #[arg(long)]
    distance: Option<f64>,

    /// Relative chord tolerance for leaf tessellation
    #[arg(long)]
    relative: Option<f64>,

    /// Normal tolerance in radians for leaf tessellation
    #[arg(long)]
    normal: Option<f64>,

    /// Merge coplanar triangle pairs into quads
    #[arg(long)]
    recombine_quads: bool,

    /// Evaluate regions one after another
    #[arg(long)]
    sequential: bool,

    /// Also resolve sibling operands concurrently
    #[arg(long)]
    parallel_subtrees: bool,

    /// Worker threads
    #[arg(long)]
    threads: Option<usize>,

    /// Configuration file (defaults to ./facetize.toml when present)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print geometry statistics for each converted region
    #[arg(long)]
    stats: bool,
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match &cli.command {
        Commands::Convert(args) => convert_command(args),
        Commands::List { scene } => list_command(scene),
    };

    if let Err(e) = result {
        Reporter::report_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

fn build_config(args: &ConvertArgs) -> Result<ConversionConfig> {
    let mut config = ConversionConfig::load(args.config.as_deref())?;

    if let Some(distance) = args.distance {
        config.distance = distance;
    }
    if let Some(relative) = args.relative {
        config.relative_tolerance = relative;
    }
    if let Some(normal) = args.normal {
        config.normal_tolerance = normal;
    }
    if args.recombine_quads {
        config.recombine_quads = true;
    }
    if args.sequential {
        config.parallel = false;
    }
    if args.parallel_subtrees {
        config.parallel_subtrees = true;
    }
    if args.threads.is_some() {
        config.threads = args.threads;
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn convert_command(args: &ConvertArgs) -> Result<()> {
    let config = build_config(args)?;
    let tolerance = config.tolerance()?;

    let db = MemoryDatabase::load(&args.scene, config.tessellation_tolerance())?;
    let selector = if !args.names.is_empty() {
        Selector::Names(args.names.clone())
    } else if let Some(prefix) = &args.prefix {
        Selector::Prefix(prefix.clone())
    } else {
        Selector::All
    };
    let names = db.directory_names(&selector);
    if names.is_empty() {
        Reporter::report_info("No top-level objects selected");
        return Ok(());
    }

    let collector = MeshCollector::new();
    let start = Instant::now();
    let run = {
        let converter = Converter::new(&db, &collector, tolerance)
            .with_recombine_quads(config.recombine_quads);
        let client = ProgressClient::new(&converter, names.len());
        let run = with_quiet_panics(|| run_walk(&db, &client, &names, &config))?;
        client.finish();
        run
    };
    let duration = start.elapsed();

    for (path, outcome) in &run.outcomes {
        Reporter::report_region(path, outcome);
    }

    let regions = collector.into_regions();
    if args.stats {
        for region in &regions {
            analyze(region).print(&region.path);
        }
    }

    if let Some(output) = &args.output {
        let sink = StlSink::new(output);
        for region in regions {
            sink.accept(region);
        }
        sink.finish()?;
        Reporter::report_info(&format!("Wrote {}", output.display()));
    }

    Reporter::report_summary(&run.summary, duration);
    Ok(())
}

fn list_command(scene: &Path) -> Result<()> {
    let db = MemoryDatabase::load(scene, Default::default())?;
    for name in db.directory_names(&Selector::All) {
        let kind = if db.assembly(&name).is_some() {
            "assembly"
        } else {
            "solid"
        };
        println!("{} {}", name.cyan(), kind.bright_black());
    }
    Ok(())
}
