use rusqlite::Connection;
use std::time::Instant;
use crate::db::schema::SEARCH_TABLE;
use crate::error::Result;

/// Compact the store and refresh planner statistics
///
/// Expects a connection that nothing else shares: the ingestion connection
/// must be closed first. Steps run in order and the first failure aborts:
/// 1. fold any write-ahead log back into the main file (`journal_mode = DELETE`)
/// 2. merge the full-text index segments
/// 3. `VACUUM`
/// 4. `ANALYZE`
/// 5. `PRAGMA optimize`
pub fn optimize(conn: &Connection) -> Result<()> {
    let start = Instant::now();

    let journal_mode: String = conn.query_row("PRAGMA journal_mode = DELETE", [], |row| row.get(0))?;
    log::debug!("Journal mode: {}", journal_mode);

    conn.execute(
        &format!("INSERT INTO {table}({table}) VALUES ('optimize')", table = SEARCH_TABLE),
        [],
    )?;

    log::info!("Compacting store (VACUUM)");
    conn.execute_batch("VACUUM;")?;

    log::info!("Refreshing planner statistics (ANALYZE)");
    conn.execute_batch("ANALYZE;")?;
    conn.execute_batch("PRAGMA optimize;")?;

    log::info!("Optimization complete in {:?}", start.elapsed());
    Ok(())
}
