use std::collections::HashSet;
use rusqlite::{params, Connection, Transaction};
use crate::config::TranslationConfig;
use crate::error::Result;
use super::source::{DecodedFile, SourceBook};
use super::testament::Testament;

/// Running totals threaded through the per-file loads
///
/// Each call to [`load_books`] takes the totals by value and returns the
/// updated ones, so the driver folds them across files in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestTotals {
    pub books: usize,
    pub verses: usize,
    /// Order number the next inserted book receives
    pub next_order: i64,
    pub files_loaded: usize,
    pub files_skipped: usize,
    pub entries_skipped: usize,
}

impl Default for IngestTotals {
    fn default() -> Self {
        Self {
            books: 0,
            verses: 0,
            next_order: 1,
            files_loaded: 0,
            files_skipped: 0,
            entries_skipped: 0,
        }
    }
}

impl IngestTotals {
    /// Totals after a file was skipped as undecodable
    pub fn skip_file(self) -> Self {
        Self {
            files_skipped: self.files_skipped + 1,
            ..self
        }
    }
}

/// Rows written for a single file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileLoad {
    pub books: usize,
    pub verses: usize,
    pub entries_skipped: usize,
}

/// Insert the translation row and return its id
pub fn insert_translation(conn: &Connection, translation: &TranslationConfig) -> Result<i64> {
    conn.execute(
        "INSERT INTO Translations (Code, Name, Language) VALUES (?1, ?2, ?3)",
        params![translation.code, translation.name, translation.language],
    )?;
    let id = conn.last_insert_rowid();
    log::info!("Translation {} ({}) registered with id {}", translation.code, translation.name, id);
    Ok(id)
}

/// Insert every book of one source file in a single transaction
///
/// Book order numbers continue from `totals.next_order`. Entries without a
/// chapter list, and repeats of a chapter/verse pair already seen in the same
/// book, are skipped with a warning. Entries dropped while decoding count as
/// skipped too. Any storage error rolls back the whole file and is returned
/// to the caller.
pub fn load_books(
    conn: &mut Connection,
    source: &str,
    decoded: &DecodedFile,
    translation_id: i64,
    totals: IngestTotals,
) -> Result<IngestTotals> {
    let tx = conn.transaction()?;

    match insert_books(&tx, source, &decoded.books, translation_id, totals.next_order) {
        Ok(load) => {
            tx.commit()?;
            Ok(IngestTotals {
                books: totals.books + load.books,
                verses: totals.verses + load.verses,
                next_order: totals.next_order + load.books as i64,
                files_loaded: totals.files_loaded + 1,
                files_skipped: totals.files_skipped,
                entries_skipped: totals.entries_skipped
                    + decoded.malformed_entries
                    + load.entries_skipped,
            })
        }
        Err(e) => {
            log::error!("Rolling back {}: {}", source, e);
            if let Err(rollback_err) = tx.rollback() {
                log::error!("Rollback of {} failed: {}", source, rollback_err);
            }
            Err(e)
        }
    }
}

fn insert_books(
    tx: &Transaction<'_>,
    source: &str,
    books: &[SourceBook],
    translation_id: i64,
    first_order: i64,
) -> Result<FileLoad> {
    let mut book_stmt = tx.prepare_cached(
        "INSERT INTO Books (Name, Testament, OrderNum, ChapterCount) VALUES (?1, ?2, ?3, ?4)",
    )?;
    let mut verse_stmt = tx.prepare_cached(
        "INSERT INTO Verses (BookId, Chapter, Verse) VALUES (?1, ?2, ?3)",
    )?;
    let mut text_stmt = tx.prepare_cached(
        "INSERT INTO VerseText (VerseId, TranslationId, Text) VALUES (?1, ?2, ?3)",
    )?;

    let mut load = FileLoad::default();

    for (idx, book) in books.iter().enumerate() {
        let Some(chapters) = book.chapters.as_ref() else {
            log::warn!("{}: book entry {} ({:?}) has no chapter list, skipping", source, idx, book.name);
            load.entries_skipped += 1;
            continue;
        };

        let name = book.name.trim();
        let testament = Testament::classify(name);
        let order = first_order + load.books as i64;

        book_stmt.execute(params![name, testament.as_str(), order, chapters.len() as i64])?;
        let book_id = tx.last_insert_rowid();

        let mut seen = HashSet::new();
        let mut book_verses = 0;
        for chapter in book.populated_chapters() {
            for verse in &chapter.verses {
                if !seen.insert((chapter.number, verse.number)) {
                    log::warn!(
                        "{}: {} {}:{} appears more than once, keeping the first",
                        source,
                        name,
                        chapter.number,
                        verse.number
                    );
                    load.entries_skipped += 1;
                    continue;
                }
                verse_stmt.execute(params![book_id, chapter.number, verse.number])?;
                let verse_id = tx.last_insert_rowid();
                text_stmt.execute(params![verse_id, translation_id, verse.text.trim()])?;
                book_verses += 1;
            }
        }

        log::debug!(
            "{}: {} #{} ({}, {} chapters, {} verses)",
            source,
            name,
            order,
            testament,
            chapters.len(),
            book_verses
        );
        load.books += 1;
        load.verses += book_verses;
    }

    Ok(load)
}
