use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use crate::artifact::{compress_file, verify_archive, CleanupManager, CompressionReport};
use crate::config::Config;
use crate::db::{optimize::optimize, schema, Db};
use crate::error::Result;
use crate::ingest::{
    build_search_index, discover_source_files, ingest_files, insert_translation, total_input_size,
    IngestTotals, SourceFile,
};
use crate::stats::{collect_stats, PipelineStats};

/// Inputs of one conversion run
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub config: Config,
}

/// Everything a successful run produced
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub totals: IngestTotals,
    pub search_rows: usize,
    pub store_path: PathBuf,
    pub compression: CompressionReport,
    pub stats: PipelineStats,
    pub elapsed: Duration,
}

/// Convert a directory of book files into a store plus its compressed copy
///
/// Stale transient files are removed before the run, and again after it
/// whether it succeeded or not. The final store only appears once it is
/// fully loaded and optimized; the archive only once the store is in place.
pub async fn run(options: &BuildOptions) -> Result<BuildReport> {
    let start = Instant::now();
    let config = &options.config;

    let files = discover_source_files(&options.input_dir)?;
    if files.is_empty() {
        log::warn!(
            "No source files found in {}; the store will be empty",
            options.input_dir.display()
        );
    }

    std::fs::create_dir_all(&options.output_dir)?;
    let temp_path = config.temp_db_path(&options.output_dir);
    let cleanup = CleanupManager::for_store(&temp_path, &config.cleanup);

    cleanup.run().await?;

    let result = build(options, files, &temp_path, start).await;

    match cleanup.run().await {
        Ok(_) => result,
        Err(cleanup_err) => match result {
            Ok(_) => Err(cleanup_err),
            Err(e) => {
                log::error!("Cleanup after failed run also failed: {}", cleanup_err);
                Err(e)
            }
        },
    }
}

async fn build(
    options: &BuildOptions,
    files: Vec<SourceFile>,
    temp_path: &Path,
    start: Instant,
) -> Result<BuildReport> {
    let config = &options.config;
    let input_size = total_input_size(&files);

    // Ingestion: one connection, closed before anything else opens the store
    log::info!("Loading {} source file(s) into {}", files.len(), temp_path.display());
    let translation = config.translation.clone();
    let (totals, search_rows) = Db::new(temp_path)
        .with_connection(move |conn| {
            schema::create_schema(conn)?;
            let translation_id = insert_translation(conn, &translation)?;
            let totals = ingest_files(conn, &files, translation_id)?;
            let search_rows = build_search_index(conn, translation_id)?;
            Ok((totals, search_rows))
        })
        .await?;

    log::info!(
        "Ingestion complete: {} books, {} verses ({} files loaded, {} skipped, {} entries skipped)",
        totals.books,
        totals.verses,
        totals.files_loaded,
        totals.files_skipped,
        totals.entries_skipped
    );

    Db::maintenance(temp_path)
        .with_connection(|conn| optimize(conn))
        .await?;

    let store_path = config.final_db_path(&options.output_dir);
    std::fs::rename(temp_path, &store_path)?;
    log::info!("Store written to {}", store_path.display());

    let archive_path = config.archive_path(&options.output_dir);
    let compression = compress_file(&store_path, &archive_path, config.output.compression_level)?;
    verify_archive(&archive_path, &compression.source_sha256)?;

    let stats = collect_stats(&store_path, input_size, Some(&archive_path)).await?;

    Ok(BuildReport {
        totals,
        search_rows,
        store_path,
        compression,
        stats,
        elapsed: start.elapsed(),
    })
}
