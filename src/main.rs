// src/main.rs
mod utils;
mod report;
mod extractors;
mod storage;

use std::path::{Path, PathBuf};
use clap::Parser;
use utils::AppError;
use extractors::patterns;
use extractors::balance_sheet::BalanceSheetExtractor;
use report::ExtractionResult;
use storage::StorageManager;

/// Patterns highlighted in `--debug` annotated HTML.
const DEBUG_PATTERNS: &[(&str, &str)] = &[
    (patterns::DATE_PATTERN, "date"),
    (r"(?i)technische\s+anlagen", "tech"),
    (r"(?i)(?:\bii\.?\s*|\b2\.\s*)?sachanlagen", "sach"),
];

/// Command Line Interface for the Jahresabschluss balance-sheet extractor
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Raw report HTML file, or a report store directory (<base>/<company>/<report>/)
    #[arg(short, long)]
    input: PathBuf,

    /// Company name to put in the result (defaults to report metadata, then folder name)
    #[arg(short, long)]
    company_name: Option<String>,

    /// Directory for extraction results (defaults to next to each report)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Debug mode - save annotated HTML files for debugging
    #[arg(short, long)]
    debug: bool,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), AppError> {
    // 1. Parse CLI Arguments
    let args = Args::parse();

    // 2. Setup Logging (reads RUST_LOG env var)
    utils::logging::setup_logging(args.verbose);
    tracing::info!("Starting processing for args: {:?}", args);

    let extractor = BalanceSheetExtractor::new();

    if args.input.is_file() {
        process_file(&args, &extractor)
    } else if args.input.is_dir() {
        process_store(&args, &extractor)
    } else {
        Err(AppError::Config(format!(
            "Input {} is neither a file nor a directory",
            args.input.display()
        )))
    }
}

/// Extracts from a single HTML file and prints the result.
fn process_file(args: &Args, extractor: &BalanceSheetExtractor) -> Result<(), AppError> {
    let bytes = std::fs::read(&args.input)?;
    let html = String::from_utf8_lossy(&bytes);
    tracing::info!("Read {} ({} bytes)", args.input.display(), bytes.len());

    let stem = args
        .input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "report".to_string());

    if args.debug {
        let debug_dir = match &args.output_dir {
            Some(dir) => dir.clone(),
            None => args.input.parent().map(Path::to_path_buf).unwrap_or_default(),
        };
        write_debug_html(&html, &debug_dir, &stem);
    }

    let result = extractor.extract(&html, args.company_name.as_deref());
    print_result(&result)?;

    if let Some(output_dir) = &args.output_dir {
        std::fs::create_dir_all(output_dir)?;
        let storage = StorageManager::new(output_dir)?;
        storage.save_extraction(output_dir, &stem, &result)?;
    }

    Ok(())
}

/// Extracts the latest Jahresabschluss of every company in a report store.
fn process_store(args: &Args, extractor: &BalanceSheetExtractor) -> Result<(), AppError> {
    let storage = StorageManager::new(&args.input)?;
    let companies = storage.company_folders()?;
    let total = companies.len();
    tracing::info!("Found {} company folder(s) in {}", total, args.input.display());

    let mut success_count = 0;
    let mut skipped_count = 0;
    let mut failure_count = 0;

    for (index, company_dir) in companies.iter().enumerate() {
        let folder_name = company_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        tracing::info!("Processing company {}/{}: {}", index + 1, total, folder_name);

        if !storage.company_folder_exists(&folder_name) {
            tracing::warn!("Company folder {} is empty, skipping", folder_name);
            skipped_count += 1;
            continue;
        }

        let report = match storage.find_latest_report(company_dir) {
            Ok(Some(report)) => report,
            Ok(None) => {
                tracing::warn!("No suitable HTML found locally for {}", folder_name);
                skipped_count += 1;
                continue;
            }
            Err(e) => {
                tracing::error!("Failed to load report for {}: {}", folder_name, e);
                failure_count += 1;
                continue;
            }
        };

        if let Some(metadata) = &report.metadata {
            tracing::debug!("Report metadata: '{}' dated {}", metadata.name, metadata.date);
        }

        let company_name = args
            .company_name
            .clone()
            .or_else(|| report.metadata.as_ref().map(|m| m.company_name.clone()))
            .unwrap_or_else(|| folder_name.clone());

        let target_dir = match &args.output_dir {
            Some(dir) => dir.join(&folder_name),
            None => report.folder.clone(),
        };

        if args.debug {
            write_debug_html(&report.html, &target_dir, &report.name);
        }

        let result = extractor.extract(&report.html, Some(&company_name));
        if result.is_empty() {
            tracing::warn!("No figures found in {} for {}", report.name, company_name);
        }
        print_result(&result)?;

        match storage.save_extraction(&target_dir, &report.name, &result) {
            Ok(path) => {
                tracing::info!("Saved result for {} to {}", company_name, path.display());
                success_count += 1;
            }
            Err(e) => {
                tracing::error!("Failed to save result for {}: {}", company_name, e);
                failure_count += 1;
            }
        }
    }

    tracing::info!(
        "Processing finished. Success: {}, Skipped: {}, Failures: {}",
        success_count, skipped_count, failure_count
    );

    if success_count == 0 && failure_count > 0 {
        return Err(AppError::Processing(format!(
            "Failed to extract any report from {} company folder(s)",
            failure_count
        )));
    }

    Ok(())
}

fn print_result(result: &ExtractionResult) -> Result<(), AppError> {
    let json = serde_json::to_string_pretty(result)
        .map_err(|e| AppError::Processing(format!("Failed to serialize result: {}", e)))?;
    println!("{}", json);
    Ok(())
}

/// Best effort: a failed debug write is logged, never fatal.
fn write_debug_html(html: &str, dir: &Path, name: &str) {
    if let Err(e) = std::fs::create_dir_all(dir) {
        tracing::warn!("Failed to create debug directory {}: {}", dir.display(), e);
        return;
    }
    let path = dir.join(format!("{}_annotated.html", name));
    if let Err(e) = utils::html_debug::create_debug_html(html, &path, DEBUG_PATTERNS) {
        tracing::warn!("Failed to create debug HTML: {}", e);
    }
}
