//! casegen CLI
//!
//! Command-line tool for generating simulation case directories from a
//! reference case, a CSV of parameters and a JSON mapping.

use casegen_core::{
    parse_selection, read_rows, select_rows, BatchReport, BuildOptions, CaseBuilder, MappingSpec,
};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "casegen")]
#[command(about = "Generate simulation cases from a reference case and a CSV", long_about = None)]
#[command(version)]
struct Cli {
    /// CSV with case_name and parameters
    #[arg(long)]
    csv: PathBuf,

    /// Path to reference case directory
    #[arg(long = "ref")]
    reference: PathBuf,

    /// Output directory for generated cases
    #[arg(long)]
    out: PathBuf,

    /// JSON mapping file
    #[arg(long)]
    map: PathBuf,

    /// Analyze and print changes, do not write files
    #[arg(long)]
    dry_run: bool,

    /// Overwrite existing case directories
    #[arg(long)]
    overwrite: bool,

    /// Comma separated list of case_name to build
    #[arg(long, default_value = "")]
    only: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Write a JSON report of every case to this path
    #[arg(long)]
    report: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// `RUST_LOG` overrides the default filter
fn init_logging(verbose: bool) {
    let default = if verbose {
        "casegen=debug,casegen_core=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> casegen_core::Result<()> {
    let mapping = MappingSpec::load(&cli.map)?;
    tracing::debug!(
        "Loaded mapping with {} file(s), {} update(s)",
        mapping.files.len(),
        mapping.update_count()
    );

    let rows = read_rows(&cli.csv)?;
    tracing::debug!(
        "Loaded {} row(s) with {} column(s) from {}",
        rows.row_count(),
        rows.column_count(),
        rows.source_path.display()
    );

    let selected = select_rows(&rows, &parse_selection(&cli.only))?;

    let options = BuildOptions {
        overwrite: cli.overwrite,
        dry_run: cli.dry_run,
    };
    let builder = CaseBuilder::new(&cli.reference, &cli.out, &mapping, options)?;
    let report = builder.run(&selected)?;

    print_outcomes(&report);

    if let Some(path) = &cli.report {
        report.save(path)?;
        println!("Report written to {}", path.display());
    }

    report.ensure_success()?;

    println!();
    if report.dry_run {
        println!("Dry run: {} case(s) validated, nothing written.", report.total());
    } else {
        println!("All cases processed successfully.");
    }

    Ok(())
}

fn print_outcomes(report: &BatchReport) {
    for summary in report.built() {
        if !report.dry_run {
            println!("Built {}", summary.destination.display());
            continue;
        }

        println!(
            "[DRY-RUN] {} -> {}",
            summary.case_name,
            summary.destination.display()
        );
        for file in &summary.files {
            let marker = if file.changed { "" } else { ", unchanged" };
            println!("  {} ({} update(s){})", file.path, file.updates_applied, marker);
        }
    }

    for (case_name, reason) in report.failures() {
        eprintln!("[ERROR] {}: {}", case_name, reason);
    }
}
