use rusqlite::Connection;
use crate::error::{Result, BibleDbError};

/// Tables created by [`create_schema`], in creation order
pub const TABLES: &[&str] = &["Books", "Verses", "Translations", "VerseText"];

/// Secondary indexes created by [`create_schema`]
pub const INDEXES: &[&str] = &[
    "idx_verses_book_chapter_verse",
    "idx_versetext_translation_verse",
    "idx_books_order",
];

/// Full-text table holding the derived search rows
pub const SEARCH_TABLE: &str = "VerseSearch";

/// Plain CREATE statements: running them against a store that already has
/// these objects fails with "already exists".
const SCHEMA_SQL: &str = r#"
CREATE TABLE Books (
    Id INTEGER PRIMARY KEY AUTOINCREMENT,
    Name TEXT NOT NULL,
    Testament TEXT NOT NULL CHECK (Testament IN ('OT', 'NT')),
    OrderNum INTEGER NOT NULL,
    ChapterCount INTEGER NOT NULL
);

CREATE TABLE Verses (
    Id INTEGER PRIMARY KEY AUTOINCREMENT,
    BookId INTEGER NOT NULL REFERENCES Books(Id),
    Chapter INTEGER NOT NULL,
    Verse INTEGER NOT NULL
);

CREATE TABLE Translations (
    Id INTEGER PRIMARY KEY AUTOINCREMENT,
    Code TEXT NOT NULL UNIQUE,
    Name TEXT NOT NULL,
    Language TEXT NOT NULL
);

CREATE TABLE VerseText (
    VerseId INTEGER NOT NULL REFERENCES Verses(Id),
    TranslationId INTEGER NOT NULL REFERENCES Translations(Id),
    Text TEXT NOT NULL,
    PRIMARY KEY (VerseId, TranslationId)
) WITHOUT ROWID;

CREATE UNIQUE INDEX idx_verses_book_chapter_verse ON Verses(BookId, Chapter, Verse);
CREATE INDEX idx_versetext_translation_verse ON VerseText(TranslationId, VerseId);
CREATE INDEX idx_books_order ON Books(OrderNum);

CREATE VIRTUAL TABLE VerseSearch USING fts5(
    reference UNINDEXED,
    text,
    translation UNINDEXED
);
"#;

/// Create all tables, indexes and the full-text table on an empty store
///
/// Runs in a single transaction; on failure nothing is left behind.
pub fn create_schema(conn: &mut Connection) -> Result<()> {
    let tx = conn.transaction()?;
    tx.execute_batch(SCHEMA_SQL)?;
    tx.commit()?;

    log::debug!(
        "Created {} tables, {} indexes and {}",
        TABLES.len(),
        INDEXES.len(),
        SEARCH_TABLE
    );
    Ok(())
}

fn object_names(conn: &Connection, kind: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM sqlite_master WHERE type = ?1 ORDER BY name")?;
    let names = stmt
        .query_map([kind], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
    Ok(names)
}

/// Verify that every object [`create_schema`] creates is present
pub fn verify_schema(conn: &Connection) -> Result<()> {
    let tables = object_names(conn, "table")?;
    let mut missing: Vec<&str> = TABLES
        .iter()
        .chain(std::iter::once(&SEARCH_TABLE))
        .filter(|name| !tables.iter().any(|t| t == *name))
        .copied()
        .collect();

    let indexes = object_names(conn, "index")?;
    missing.extend(
        INDEXES
            .iter()
            .filter(|name| !indexes.iter().any(|i| i == *name))
            .copied(),
    );

    if !missing.is_empty() {
        for name in &missing {
            log::error!("Missing schema object: {}", name);
        }
        return Err(BibleDbError::Schema(format!(
            "store is missing schema objects: {}",
            missing.join(", ")
        )));
    }

    log::debug!("✓ Schema verified");
    Ok(())
}
