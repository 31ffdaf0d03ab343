pub mod walker;
pub mod source;
pub mod testament;
pub mod db_writer;
pub mod search_index;

pub use walker::{SourceFile, discover_source_files, total_input_size};
pub use source::{DecodedFile, SourceBook, SourceChapter, SourceVerse, decode_books, read_source_file};
pub use testament::Testament;
pub use db_writer::{FileLoad, IngestTotals, insert_translation, load_books};
pub use search_index::build_search_index;

use rusqlite::Connection;
use crate::error::{Result, BibleDbError};

/// Load every source file in order, one transaction per file
///
/// Undecodable files are logged and skipped; only a failure to read a file or
/// a storage error is fatal. The first such error stops
/// the loop and is returned; files before it stay committed, the failing
/// file leaves nothing behind.
pub fn ingest_files(
    conn: &mut Connection,
    files: &[SourceFile],
    translation_id: i64,
) -> Result<IngestTotals> {
    let total = files.len();
    let mut totals = IngestTotals::default();

    for (idx, file) in files.iter().enumerate() {
        log::info!("[{}/{}] Processing: {}", idx + 1, total, file.file_name);

        let decoded = match read_source_file(file) {
            Ok(decoded) => decoded,
            Err(BibleDbError::Decode(reason)) => {
                log::warn!("Skipping {}: {}", file.file_name, reason);
                totals = totals.skip_file();
                continue;
            }
            Err(e) => return Err(e),
        };

        let before = totals;
        totals = load_books(conn, &file.file_name, &decoded, translation_id, totals)?;
        log::info!(
            "✓ {} ({} books, {} verses)",
            file.file_name,
            totals.books - before.books,
            totals.verses - before.verses
        );
    }

    Ok(totals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TranslationConfig;
    use crate::db::schema;
    use std::fs;
    use tempfile::TempDir;

    fn setup(dir: &TempDir, files: &[(&str, &str)]) -> (Connection, Vec<SourceFile>, i64) {
        for (name, content) in files {
            fs::write(dir.path().join(name), content).unwrap();
        }
        let mut conn = Connection::open_in_memory().unwrap();
        schema::create_schema(&mut conn).unwrap();
        let translation_id = insert_translation(&conn, &TranslationConfig::default()).unwrap();
        let sources = discover_source_files(dir.path()).unwrap();
        (conn, sources, translation_id)
    }

    #[test]
    fn test_ingest_files_in_sorted_order() {
        let dir = TempDir::new().unwrap();
        let (mut conn, files, translation_id) = setup(
            &dir,
            &[
                ("02_second.json", r#"[{"BookName":"Leviticus","lstChapters":[{"ChapterNumber":1,"Verses":[{"VerseNumber":1,"ChapterVerse":"c"}]}]}]"#),
                ("01_first.json", r#"[
                    {"BookName":"Genesis","lstChapters":[{"ChapterNumber":1,"Verses":[{"VerseNumber":1,"ChapterVerse":"a"}]}]},
                    {"BookName":"Exodus","lstChapters":[{"ChapterNumber":1,"Verses":[{"VerseNumber":1,"ChapterVerse":"b"}]}]}
                ]"#),
            ],
        );

        let totals = ingest_files(&mut conn, &files, translation_id).unwrap();
        assert_eq!(totals.books, 3);
        assert_eq!(totals.verses, 3);
        assert_eq!(totals.files_loaded, 2);

        let order: i64 = conn
            .query_row("SELECT OrderNum FROM Books WHERE Name = 'Leviticus'", [], |row| row.get(0))
            .unwrap();
        assert_eq!(order, 3);
    }

    #[test]
    fn test_empty_file_is_skipped_not_fatal() {
        let dir = TempDir::new().unwrap();
        let (mut conn, files, translation_id) = setup(
            &dir,
            &[
                ("01_Genesis.json", r#"[{"BookName":"Genesis","lstChapters":[{"ChapterNumber":1,"Verses":[{"VerseNumber":1,"ChapterVerse":"a"}]}]}]"#),
                ("02_empty.json", "[]"),
                ("03_broken.json", "{oops"),
                ("04_Matthew.json", r#"[{"BookName":"Matthew","lstChapters":[{"ChapterNumber":1,"Verses":[{"VerseNumber":1,"ChapterVerse":"b"}]}]}]"#),
            ],
        );

        let totals = ingest_files(&mut conn, &files, translation_id).unwrap();
        assert_eq!(totals.books, 2);
        assert_eq!(totals.verses, 2);
        assert_eq!(totals.files_loaded, 2);
        assert_eq!(totals.files_skipped, 2);

        let order: i64 = conn
            .query_row("SELECT OrderNum FROM Books WHERE Name = 'Matthew'", [], |row| row.get(0))
            .unwrap();
        assert_eq!(order, 2);
    }

    #[test]
    fn test_invalid_utf8_file_is_skipped_not_fatal() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("01_bad.json"), b"[\xff\xfe]").unwrap();
        let (mut conn, files, translation_id) = setup(
            &dir,
            &[("02_Exodus.json", r#"[{"BookName":"Exodus","lstChapters":[{"ChapterNumber":1,"Verses":[{"VerseNumber":1,"ChapterVerse":"b"}]}]}]"#)],
        );

        let totals = ingest_files(&mut conn, &files, translation_id).unwrap();
        assert_eq!(totals.files_skipped, 1);
        assert_eq!(totals.files_loaded, 1);
        assert_eq!(totals.books, 1);
    }

    #[test]
    fn test_byte_order_mark_file_loads() {
        let dir = TempDir::new().unwrap();
        let mut content = b"\xEF\xBB\xBF".to_vec();
        content.extend_from_slice(
            br#"[{"BookName":"Genesis","lstChapters":[{"ChapterNumber":1,"Verses":[{"VerseNumber":1,"ChapterVerse":"a"}]}]}]"#,
        );
        fs::write(dir.path().join("01_Genesis.json"), content).unwrap();
        let (mut conn, files, translation_id) = setup(&dir, &[]);

        let totals = ingest_files(&mut conn, &files, translation_id).unwrap();
        assert_eq!(totals.books, 1);
        assert_eq!(totals.files_skipped, 0);
    }

    #[test]
    fn test_malformed_book_keeps_file_siblings() {
        let dir = TempDir::new().unwrap();
        let (mut conn, files, translation_id) = setup(
            &dir,
            &[(
                "01_Law.json",
                r#"[
                    {"BookName":"Genesis","lstChapters":[{"ChapterNumber":1,"Verses":[{"VerseNumber":1,"ChapterVerse":"a"}]}]},
                    {"BookName":"Exodus","lstChapters":[{"Verses":[{"VerseNumber":1,"ChapterVerse":"b"}]}]}
                ]"#,
            )],
        );

        let totals = ingest_files(&mut conn, &files, translation_id).unwrap();
        assert_eq!(totals.books, 1);
        assert_eq!(totals.files_skipped, 0);
        assert_eq!(totals.entries_skipped, 1);
    }

    #[test]
    fn test_storage_failure_halts_run() {
        let dir = TempDir::new().unwrap();
        let (mut conn, files, translation_id) = setup(
            &dir,
            &[
                ("01_Genesis.json", r#"[{"BookName":"Genesis","lstChapters":[{"ChapterNumber":1,"Verses":[{"VerseNumber":1,"ChapterVerse":"a"}]}]}]"#),
                ("02_Exodus.json", r#"[{"BookName":"Exodus","lstChapters":[{"ChapterNumber":1,"Verses":[{"VerseNumber":1,"ChapterVerse":"b"}]}]}]"#),
                ("03_Leviticus.json", r#"[{"BookName":"Leviticus","lstChapters":[{"ChapterNumber":1,"Verses":[{"VerseNumber":1,"ChapterVerse":"c"}]}]}]"#),
            ],
        );
        conn.execute_batch(
            "CREATE TRIGGER reject_exodus BEFORE INSERT ON Books WHEN NEW.Name = 'Exodus' \
             BEGIN SELECT RAISE(ABORT, 'simulated storage failure'); END;",
        )
        .unwrap();

        let result = ingest_files(&mut conn, &files, translation_id);
        assert!(matches!(result, Err(BibleDbError::Database(_))));

        let names: Vec<String> = conn
            .prepare("SELECT Name FROM Books ORDER BY OrderNum")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<_, _>>()
            .unwrap();
        assert_eq!(names, vec!["Genesis".to_string()]);
    }
}
