use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};
use crate::error::{Result, BibleDbError};
use super::walker::SourceFile;

/// One book entry of a source file
#[derive(Debug, Clone, Deserialize)]
pub struct SourceBook {
    #[serde(rename = "bookname", default, deserialize_with = "null_as_empty")]
    pub name: String,
    /// `None` when the entry has no chapter list at all
    #[serde(rename = "lstchapters", default)]
    pub chapters: Option<Vec<SourceChapter>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceChapter {
    #[serde(rename = "chapternumber")]
    pub number: i64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub verses: Vec<SourceVerse>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceVerse {
    #[serde(rename = "versenumber")]
    pub number: i64,
    /// Missing or null text becomes an empty string
    #[serde(rename = "chapterverse", default, deserialize_with = "null_as_empty")]
    pub text: String,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Lowercase every object key so field matching ignores case
fn lowercase_keys(value: JsonValue) -> JsonValue {
    match value {
        JsonValue::Object(map) => JsonValue::Object(
            map.into_iter()
                .map(|(k, v)| (k.to_lowercase(), lowercase_keys(v)))
                .collect::<Map<String, JsonValue>>(),
        ),
        JsonValue::Array(items) => JsonValue::Array(items.into_iter().map(lowercase_keys).collect()),
        other => other,
    }
}

/// Books decoded from one source file
#[derive(Debug, Clone, Default)]
pub struct DecodedFile {
    pub books: Vec<SourceBook>,
    /// Entries that could not be read as a book and were dropped
    pub malformed_entries: usize,
}

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Decode the contents of one source file into book entries
///
/// A leading byte-order mark is ignored. Invalid UTF-8, invalid JSON, a
/// `null` document, an empty array or a document that is not an array is a
/// [`BibleDbError::Decode`]; callers treat it as a skipped file. Entries that
/// fail to decode on their own are dropped with a warning and counted, so
/// their siblings still load.
pub fn decode_books(content: impl AsRef<[u8]>, path: &str) -> Result<DecodedFile> {
    let bytes = content.as_ref();
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

    let raw: JsonValue = serde_json::from_slice(bytes)
        .map_err(|e| BibleDbError::Decode(format!("JSON parse error in {}: {}", path, e)))?;

    let entries: Option<Vec<JsonValue>> = serde_json::from_value(lowercase_keys(raw))
        .map_err(|e| BibleDbError::Decode(format!("unexpected shape in {}: {}", path, e)))?;

    let entries = match entries {
        None => return Err(BibleDbError::Decode(format!("{} decoded to null", path))),
        Some(entries) if entries.is_empty() => {
            return Err(BibleDbError::Decode(format!("{} contains no books", path)))
        }
        Some(entries) => entries,
    };

    let mut decoded = DecodedFile::default();
    for (idx, entry) in entries.into_iter().enumerate() {
        match serde_json::from_value::<SourceBook>(entry) {
            Ok(book) => decoded.books.push(book),
            Err(e) => {
                log::warn!("{}: book entry {} is malformed, skipping: {}", path, idx, e);
                decoded.malformed_entries += 1;
            }
        }
    }
    Ok(decoded)
}

/// Read and decode a discovered source file
///
/// Only failures to read the file are [`BibleDbError::Io`].
pub fn read_source_file(file: &SourceFile) -> Result<DecodedFile> {
    let content = std::fs::read(&file.path)?;
    decode_books(&content, &file.file_name)
}

impl SourceBook {
    /// Chapters that contain at least one verse
    pub fn populated_chapters(&self) -> impl Iterator<Item = &SourceChapter> {
        self.chapters
            .iter()
            .flatten()
            .filter(|chapter| !chapter.verses.is_empty())
    }

    pub fn verse_count(&self) -> usize {
        self.populated_chapters().map(|c| c.verses.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GENESIS: &str = r#"[{"BookName":"Genesis","lstChapters":[{"ChapterNumber":1,"Verses":[{"VerseNumber":1,"ChapterVerse":"In the beginning..."}]}]}]"#;

    #[test]
    fn test_decode_books_basic() {
        let books = decode_books(GENESIS, "01_Genesis.json").unwrap().books;
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].name, "Genesis");

        let chapters = books[0].chapters.as_ref().unwrap();
        assert_eq!(chapters[0].number, 1);
        assert_eq!(chapters[0].verses[0].number, 1);
        assert_eq!(chapters[0].verses[0].text, "In the beginning...");
    }

    #[test]
    fn test_decode_books_case_insensitive_fields() {
        let content = r#"[{"bookname":"Exodus","LSTCHAPTERS":[{"chapterNumber":2,"verses":[{"versenumber":3,"chapterverse":"text"}]}]}]"#;
        let books = decode_books(content, "02_Exodus.json").unwrap().books;
        assert_eq!(books[0].name, "Exodus");
        let chapter = &books[0].chapters.as_ref().unwrap()[0];
        assert_eq!(chapter.number, 2);
        assert_eq!(chapter.verses[0].number, 3);
        assert_eq!(chapter.verses[0].text, "text");
    }

    #[test]
    fn test_missing_verse_text_is_empty() {
        let content = r#"[{"BookName":"Jude","lstChapters":[{"ChapterNumber":1,"Verses":[{"VerseNumber":1},{"VerseNumber":2,"ChapterVerse":null}]}]}]"#;
        let books = decode_books(content, "65_Jude.json").unwrap().books;
        let verses = &books[0].chapters.as_ref().unwrap()[0].verses;
        assert_eq!(verses[0].text, "");
        assert_eq!(verses[1].text, "");
    }

    #[test]
    fn test_missing_chapter_list_is_none() {
        let content = r#"[{"BookName":"Obadiah"},{"BookName":"Jonah","lstChapters":null}]"#;
        let books = decode_books(content, "31_Obadiah.json").unwrap().books;
        assert_eq!(books.len(), 2);
        assert!(books[0].chapters.is_none());
        assert!(books[1].chapters.is_none());
    }

    #[test]
    fn test_empty_and_null_documents_rejected() {
        assert!(matches!(decode_books("[]", "empty.json"), Err(BibleDbError::Decode(_))));
        assert!(matches!(decode_books("null", "null.json"), Err(BibleDbError::Decode(_))));
        assert!(matches!(decode_books("{not json", "bad.json"), Err(BibleDbError::Decode(_))));
        assert!(matches!(
            decode_books(r#"{"BookName":"Genesis"}"#, "object.json"),
            Err(BibleDbError::Decode(_))
        ));
    }

    #[test]
    fn test_populated_chapters_skip_empty() {
        let content = r#"[{"BookName":"Psalms","lstChapters":[
            {"ChapterNumber":1,"Verses":[]},
            {"ChapterNumber":2,"Verses":[{"VerseNumber":1,"ChapterVerse":"a"},{"VerseNumber":2,"ChapterVerse":"b"}]},
            {"ChapterNumber":3}
        ]}]"#;
        let books = decode_books(content, "19_Psalms.json").unwrap().books;
        let numbers: Vec<i64> = books[0].populated_chapters().map(|c| c.number).collect();
        assert_eq!(numbers, vec![2]);
        assert_eq!(books[0].verse_count(), 2);
    }

    #[test]
    fn test_byte_order_mark_is_ignored() {
        let mut content = UTF8_BOM.to_vec();
        content.extend_from_slice(GENESIS.as_bytes());
        let decoded = decode_books(&content, "01_Genesis.json").unwrap();
        assert_eq!(decoded.books.len(), 1);
        assert_eq!(decoded.books[0].name, "Genesis");
    }

    #[test]
    fn test_invalid_utf8_is_decode_error() {
        let result = decode_books(b"[\xff\xfe]", "01_bad.json");
        assert!(matches!(result, Err(BibleDbError::Decode(_))));
    }

    #[test]
    fn test_malformed_entry_keeps_siblings() {
        let content = r#"[
            {"BookName":"Genesis","lstChapters":[{"ChapterNumber":1,"Verses":[{"VerseNumber":1,"ChapterVerse":"a"}]}]},
            {"BookName":"Exodus","lstChapters":[{"Verses":[{"VerseNumber":1,"ChapterVerse":"b"}]}]},
            {"BookName":"Leviticus","lstChapters":[{"ChapterNumber":1,"Verses":[{"ChapterVerse":"c"}]}]},
            42
        ]"#;
        let decoded = decode_books(content, "01_Law.json").unwrap();
        assert_eq!(decoded.malformed_entries, 3);
        assert_eq!(decoded.books.len(), 1);
        assert_eq!(decoded.books[0].name, "Genesis");
    }

    #[test]
    fn test_read_source_file_skips_bom() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("01_Genesis.json");
        let mut content = UTF8_BOM.to_vec();
        content.extend_from_slice(GENESIS.as_bytes());
        std::fs::write(&path, content).unwrap();

        let file = SourceFile {
            file_name: "01_Genesis.json".to_string(),
            path: path.clone(),
            size: std::fs::metadata(&path).unwrap().len(),
        };
        assert_eq!(read_source_file(&file).unwrap().books.len(), 1);
    }
}
