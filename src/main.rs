use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use std::path::PathBuf;
use std::process::ExitCode;

use histdup::core::resolution::ReportOnly;
use histdup::io::{FsDeleter, TerminalOperator, ZipArchiver};
use histdup::{
    CorpusScanner, ResolutionController, ScanConfig, ScanReport, ScanStatus, SimilarityMetric,
    logging,
};

#[derive(Parser, Debug)]
#[command(
    name = "histdup",
    version,
    about = "Find near-duplicate images by intensity histogram and resolve them one pair at a time"
)]
struct Cli {
    /// Directory to scan
    #[arg(value_name = "FOLDER_PATH")]
    folder_path: PathBuf,

    /// Similarity metric deciding what counts as a duplicate
    #[arg(long, value_enum)]
    metric: Option<SimilarityMetric>,

    /// Duplicate threshold for the chosen metric (default depends on metric)
    #[arg(long)]
    threshold: Option<f64>,

    /// JSON config file; flags override its values
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Ask for confirmation before deleting or archiving
    #[arg(long)]
    confirm: bool,

    /// Directory to write archives into (default: next to the original)
    #[arg(long, value_name = "DIR")]
    archive_dir: Option<PathBuf>,

    /// Only list duplicate pairs; never prompt or touch files
    #[arg(long)]
    dry_run: bool,

    /// Print the scan report as JSON
    #[arg(long)]
    json: bool,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    verbose: u8,

    /// Only log errors and hide progress bars
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            // --help / --version are not failures
            return if err.use_stderr() {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    logging::init(cli.verbose, cli.quiet);

    // Best-effort tool: anything past argument parsing is reported, not fatal.
    if let Err(err) = run(cli) {
        eprintln!("❌ {:#}", err);
    }
    ExitCode::SUCCESS
}

fn run(cli: Cli) -> Result<()> {
    let config = build_config(&cli)?;
    let path = cli.folder_path;

    if !cli.json {
        println!("▶ Scanning for duplicates in: {}", path.display());
        println!(
            "▶ Metric: {} (threshold {})",
            config.metric,
            config.threshold()
        );
    }

    let scanner = CorpusScanner::new(config.clone()).with_progress(!cli.quiet && !cli.json);
    let scanned = if cli.dry_run {
        scanner.scan(&path, &mut ReportOnly)
    } else {
        // stdout is reserved for the report under --json
        let mut controller = ResolutionController::new(
            TerminalOperator::new().with_stderr(cli.json),
            FsDeleter,
            ZipArchiver::new(config.archive_dir.clone()),
        )
        .with_confirmation(config.confirm);
        scanner.scan(&path, &mut controller)
    };
    let report = scanned.with_context(|| format!("Failed to scan {}", path.display()))?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report, cli.dry_run);
    }
    Ok(())
}

fn build_config(cli: &Cli) -> Result<ScanConfig> {
    let mut config = match &cli.config {
        Some(file) => ScanConfig::load(file)
            .with_context(|| format!("Failed to load config {}", file.display()))?,
        None => ScanConfig::default(),
    };

    if let Some(metric) = cli.metric {
        if metric != config.metric {
            // A file threshold belongs to the file's metric.
            config.threshold = None;
        }
        config.metric = metric;
    }
    if cli.threshold.is_some() {
        config.threshold = cli.threshold;
    }
    if cli.confirm {
        config.confirm = true;
    }
    if cli.archive_dir.is_some() {
        config.archive_dir = cli.archive_dir.clone();
    }

    config.validate().context("Invalid settings")?;
    Ok(config)
}

fn print_summary(report: &ScanReport, dry_run: bool) {
    for failure in &report.failures {
        eprintln!("⚠️  Skipped {}: {}", failure.path.display(), failure.error);
    }

    match report.status {
        ScanStatus::NoImages => {
            println!("No images found in the directory.");
            return;
        }
        ScanStatus::InsufficientImages => {
            println!(
                "Not enough images to compare ({} decoded).",
                report.images_decoded
            );
            return;
        }
        ScanStatus::Completed => {}
    }

    if dry_run {
        if report.duplicates.is_empty() {
            println!("No duplicates found.");
        } else {
            println!("Found {} duplicate pair(s):", report.duplicates.len());
            for (i, pair) in report.duplicates.iter().enumerate() {
                println!(
                    " Pair {}: {} ↔ {} ({} = {:.4})",
                    i + 1,
                    pair.result.first,
                    pair.result.second,
                    pair.result.metric,
                    pair.result.score
                );
            }
            println!("\n⚠️  Dry-run only; no files were changed.");
        }
    }

    println!("\n✅ Duplicate image search completed.");
    println!("   Total images: {}", report.images_decoded);
    println!("   Comparisons:  {}", report.comparisons);
    println!("   Duplicates:   {}", report.duplicates.len());
    if report.pairs_skipped_removed > 0 {
        println!(
            "   Pairs skipped (file already removed): {}",
            report.pairs_skipped_removed
        );
    }
}
