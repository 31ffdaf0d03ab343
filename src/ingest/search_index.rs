use rusqlite::{params, Connection};
use std::time::Instant;
use crate::error::Result;

/// Populate `VerseSearch` for one translation from the canonical tables
///
/// Rows already indexed for the translation are dropped first, then one
/// `INSERT ... SELECT` derives a row per verse text, with the reference
/// formatted as `<Book> <Chapter>:<Verse>`.
pub fn build_search_index(conn: &Connection, translation_id: i64) -> Result<usize> {
    let start = Instant::now();
    clear_search_index(conn, translation_id)?;

    let inserted = conn.execute(
        r#"
        INSERT INTO VerseSearch (reference, text, translation)
        SELECT
            b.Name || ' ' || v.Chapter || ':' || v.Verse,
            t.Text,
            tr.Code
        FROM VerseText t
        JOIN Verses v ON v.Id = t.VerseId
        JOIN Books b ON b.Id = v.BookId
        JOIN Translations tr ON tr.Id = t.TranslationId
        WHERE t.TranslationId = ?1
        ORDER BY b.OrderNum, v.Chapter, v.Verse
        "#,
        params![translation_id],
    )?;

    log::info!(
        "Search index built: {} rows for translation {} in {:?}",
        inserted,
        translation_id,
        start.elapsed()
    );
    Ok(inserted)
}

fn clear_search_index(conn: &Connection, translation_id: i64) -> Result<usize> {
    let removed = conn.execute(
        "DELETE FROM VerseSearch WHERE translation = (SELECT Code FROM Translations WHERE Id = ?1)",
        params![translation_id],
    )?;
    if removed > 0 {
        log::debug!("Removed {} stale search rows for translation {}", removed, translation_id);
    }
    Ok(removed)
}
