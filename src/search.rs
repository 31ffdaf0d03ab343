use rusqlite::params;
use crate::db::Db;
use crate::error::{Result, BibleDbError};

/// A verse matched by full-text search
#[derive(Debug, Clone, PartialEq)]
pub struct VerseHit {
    pub reference: String,
    pub text: String,
    pub translation: String,
    /// Raw bm25 score; lower is a better match
    pub score: f64,
    /// 1-indexed position in the result list
    pub rank: usize,
}

/// Turn free text into an FTS5 query that cannot raise a syntax error
///
/// FTS5 operator characters are dropped, each remaining term is quoted (so
/// words like `AND`/`NOT` are matched literally) and terms are joined with
/// `OR` for recall; bm25 ranking puts verses matching more terms first.
pub fn sanitize_fts5_query(query: &str) -> String {
    let cleaned: String = query
        .chars()
        .filter(|c| !matches!(c, '?' | '*' | '(' | ')' | '{' | '}' | '-' | '\'' | '"' | ':' | '^' | '+'))
        .collect();

    cleaned
        .split_whitespace()
        .map(|term| format!("\"{}\"", term))
        .collect::<Vec<_>>()
        .join(" OR ")
}

/// Search verse text, best matches first
///
/// `translation` restricts hits to one translation code. Empty queries
/// return no hits.
pub async fn search_verses(
    db: &Db,
    query: &str,
    translation: Option<&str>,
    limit: usize,
) -> Result<Vec<VerseHit>> {
    let start = std::time::Instant::now();

    let sanitized = sanitize_fts5_query(query);
    if sanitized.is_empty() {
        return Ok(Vec::new());
    }
    if limit == 0 {
        return Err(BibleDbError::InvalidInput("limit must be greater than 0".to_string()));
    }

    let translation = translation.map(|s| s.to_string());

    let mut hits = db.with_connection(move |conn| {
        let mut stmt = conn.prepare(
            r#"
            SELECT reference, text, translation, bm25(VerseSearch) AS score
            FROM VerseSearch
            WHERE VerseSearch MATCH ?1
                AND (?2 IS NULL OR translation = ?2)
            ORDER BY score
            LIMIT ?3
            "#,
        )?;

        let mut rows = stmt.query(params![sanitized, translation, limit as i64])?;
        let mut hits = Vec::new();
        while let Some(row) = rows.next()? {
            hits.push(VerseHit {
                reference: row.get(0)?,
                text: row.get(1)?,
                translation: row.get(2)?,
                score: row.get(3)?,
                rank: 0,
            });
        }

        Ok::<Vec<VerseHit>, BibleDbError>(hits)
    }).await?;

    for (idx, hit) in hits.iter_mut().enumerate() {
        hit.rank = idx + 1;
    }

    log::debug!("Verse search took {:?}, returned {} hits", start.elapsed(), hits.len());
    Ok(hits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema;
    use tempfile::TempDir;

    async fn setup_test_db() -> (Db, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db = Db::new(temp_dir.path().join("bible.db"));
        db.with_connection(|conn| {
            schema::create_schema(conn)?;
            conn.execute_batch(
                "INSERT INTO VerseSearch (reference, text, translation) VALUES
                    ('Genesis 1:1', 'In the beginning God created the heaven and the earth.', 'KJV'),
                    ('John 1:1', 'In the beginning was the Word, and the Word was with God.', 'KJV'),
                    ('John 3:16', 'For God so loved the world', 'KJV'),
                    ('John 3:16', 'Porque de tal manera amó Dios al mundo', 'RVR');",
            )?;
            Ok(())
        })
        .await
        .unwrap();
        (db, temp_dir)
    }

    #[test]
    fn test_sanitize_fts5_query() {
        assert_eq!(sanitize_fts5_query("loved world"), r#""loved" OR "world""#);
        assert_eq!(sanitize_fts5_query("God's (word)*"), r#""Gods" OR "word""#);
        assert_eq!(sanitize_fts5_query("light AND darkness"), r#""light" OR "AND" OR "darkness""#);
        assert_eq!(sanitize_fts5_query("  "), "");
        assert_eq!(sanitize_fts5_query("-- ?"), "");
    }

    #[tokio::test]
    async fn test_search_verses_ranked() {
        let (db, _temp_dir) = setup_test_db().await;

        let hits = search_verses(&db, "beginning Word", None, 10).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].reference, "John 1:1");
        assert_eq!(hits[0].rank, 1);
        assert_eq!(hits[1].reference, "Genesis 1:1");
        assert_eq!(hits[1].rank, 2);
        assert!(hits[0].score <= hits[1].score);
    }

    #[tokio::test]
    async fn test_search_verses_translation_filter() {
        let (db, _temp_dir) = setup_test_db().await;

        let hits = search_verses(&db, "mundo world", Some("RVR"), 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].translation, "RVR");
    }

    #[tokio::test]
    async fn test_search_verses_empty_query_and_limit() {
        let (db, _temp_dir) = setup_test_db().await;

        assert!(search_verses(&db, "", None, 10).await.unwrap().is_empty());

        let hits = search_verses(&db, "God", None, 1).await.unwrap();
        assert_eq!(hits.len(), 1);

        assert!(search_verses(&db, "God", None, 0).await.is_err());
    }
}
