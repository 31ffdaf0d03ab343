use anyhow::{Context, Result};
use bible_db::{BuildOptions, Config};
use bible_db::stats::print_report;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "bible-db")]
#[command(version)]
#[command(about = "Convert a directory of per-book scripture JSON files into a searchable SQLite database")]
struct Args {
    /// Directory containing the per-book JSON files (sorted by file name)
    input_dir: PathBuf,

    /// Directory the database and its compressed copy are written to
    output_dir: PathBuf,

    /// Optional TOML file with translation, output and cleanup settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Translation code stored with the verse text (default: KJV)
    #[arg(long)]
    translation_code: Option<String>,

    /// Translation display name
    #[arg(long)]
    translation_name: Option<String>,

    /// Language tag of the translation
    #[arg(long)]
    language: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logger
    env_logger::Builder::from_env(
        env_logger::Env::default()
            .filter_or("RUST_LOG", "info")
    ).init();

    let args = Args::parse();

    if !args.input_dir.is_dir() {
        log::error!("Input directory does not exist: {}", args.input_dir.display());
        std::process::exit(1);
    }

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(code) = args.translation_code {
        config.translation.code = code;
    }
    if let Some(name) = args.translation_name {
        config.translation.name = name;
    }
    if let Some(language) = args.language {
        config.translation.language = language;
    }
    config.validate()?;

    log::info!("Starting bible-db v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Input directory: {}", args.input_dir.display());
    log::info!("Output directory: {}", args.output_dir.display());
    log::info!("Translation: {} ({}, {})", config.translation.code, config.translation.name, config.translation.language);

    let options = BuildOptions {
        input_dir: args.input_dir,
        output_dir: args.output_dir,
        config,
    };

    let report = match bible_db::run(&options).await {
        Ok(report) => report,
        Err(e) => {
            log::error!("✗ Conversion failed: {}", e);
            return Err(e).context("conversion failed");
        }
    };

    log::info!("=== Conversion Complete ===");
    log::info!("Books: {}", report.totals.books);
    log::info!("Verses: {}", report.totals.verses);
    log::info!("Search rows: {}", report.search_rows);
    log::info!("Files skipped: {}", report.totals.files_skipped);
    log::info!("Entries skipped: {}", report.totals.entries_skipped);
    log::info!("Store: {}", report.store_path.display());
    log::info!(
        "Archive: {} (sha256 {})",
        report.compression.archive_path.display(),
        report.compression.source_sha256
    );
    log::info!("Time: {:?}", report.elapsed);

    if report.totals.files_skipped > 0 || report.totals.entries_skipped > 0 {
        log::warn!("Some input was skipped. Check the warnings above for details.");
    }

    print_report(&report.stats);

    Ok(())
}
