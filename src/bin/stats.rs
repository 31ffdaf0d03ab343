use anyhow::{Context, Result};
use bible_db::artifact::{sha256_file, verify_archive};
use bible_db::db::{schema, Db};
use bible_db::ingest::{discover_source_files, total_input_size};
use bible_db::stats::{collect_stats, print_report};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "stats")]
#[command(about = "Report row counts and artifact sizes for a finished bible database")]
struct Args {
    /// Path to the finished database
    db_path: PathBuf,

    /// Source directory the database was built from (for input size ratios)
    #[arg(short, long)]
    input_dir: Option<PathBuf>,

    /// Compressed copy of the database (checked against the store, used for compression ratios)
    #[arg(short, long)]
    archive: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let db = Db::read_only(&args.db_path);
    db.with_connection(|conn| schema::verify_schema(conn))
        .await
        .with_context(|| format!("{} is not a bible database", db.path().display()))?;

    if let Some(archive) = &args.archive {
        let store_sha256 = sha256_file(db.path())?;
        verify_archive(archive, &store_sha256)
            .with_context(|| format!("{} does not match {}", archive.display(), db.path().display()))?;
    }

    let input_size = match &args.input_dir {
        Some(dir) => total_input_size(&discover_source_files(dir)?),
        None => 0,
    };

    let stats = collect_stats(db.path(), input_size, args.archive.as_deref()).await?;
    print_report(&stats);

    if args.input_dir.is_none() {
        println!("(pass --input-dir to include input size ratios)");
    }

    Ok(())
}
