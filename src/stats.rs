use rusqlite::Connection;
use std::path::Path;
use crate::artifact::reduction_percent;
use crate::db::Db;
use crate::error::Result;

/// Row counts of a finished store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCounts {
    pub books: i64,
    pub old_testament_books: i64,
    pub new_testament_books: i64,
    pub verses: i64,
    pub translations: i64,
    pub search_rows: i64,
}

/// Row counts plus artifact sizes for the run report
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineStats {
    pub counts: StoreCounts,
    pub input_size: u64,
    pub store_size: u64,
    pub compressed_size: Option<u64>,
}

impl PipelineStats {
    pub fn input_to_store_percent(&self) -> f64 {
        reduction_percent(self.input_size, self.store_size)
    }

    pub fn input_to_compressed_percent(&self) -> Option<f64> {
        self.compressed_size
            .map(|compressed| reduction_percent(self.input_size, compressed))
    }

    pub fn store_to_compressed_percent(&self) -> Option<f64> {
        self.compressed_size
            .map(|compressed| reduction_percent(self.store_size, compressed))
    }
}

/// Count rows in every canonical table and the search table
pub fn count_rows(conn: &Connection) -> Result<StoreCounts> {
    let count = |sql: &str| conn.query_row(sql, [], |row| row.get::<_, i64>(0));

    Ok(StoreCounts {
        books: count("SELECT COUNT(*) FROM Books")?,
        old_testament_books: count("SELECT COUNT(*) FROM Books WHERE Testament = 'OT'")?,
        new_testament_books: count("SELECT COUNT(*) FROM Books WHERE Testament = 'NT'")?,
        verses: count("SELECT COUNT(*) FROM Verses")?,
        translations: count("SELECT COUNT(*) FROM Translations")?,
        search_rows: count("SELECT COUNT(*) FROM VerseSearch")?,
    })
}

/// Gather stats for a finished store on its own read-only connection
pub async fn collect_stats(store: &Path, input_size: u64, archive: Option<&Path>) -> Result<PipelineStats> {
    let counts = Db::read_only(store).with_connection(|conn| count_rows(conn)).await?;
    let store_size = std::fs::metadata(store)?.len();
    let compressed_size = match archive {
        Some(path) => Some(std::fs::metadata(path)?.len()),
        None => None,
    };

    Ok(PipelineStats {
        counts,
        input_size,
        store_size,
        compressed_size,
    })
}

fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.2} {}", value, UNITS[unit])
    }
}

fn format_percent(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.1}%", v))
        .unwrap_or_else(|| "n/a".to_string())
}

/// Print the human-readable report to stdout
pub fn print_report(stats: &PipelineStats) {
    let counts = &stats.counts;

    println!("\n=== Bible Database Statistics ===\n");
    println!("{:-<50}", "");
    println!("{:<30} {:>18}", "Books", counts.books);
    println!("{:<30} {:>18}", "  Old Testament", counts.old_testament_books);
    println!("{:<30} {:>18}", "  New Testament", counts.new_testament_books);
    println!("{:<30} {:>18}", "Verses", counts.verses);
    println!("{:<30} {:>18}", "Translations", counts.translations);
    println!("{:<30} {:>18}", "Search index rows", counts.search_rows);
    println!("{:-<50}", "");
    println!("{:<30} {:>18}", "Input size", format_bytes(stats.input_size));
    println!("{:<30} {:>18}", "Store size", format_bytes(stats.store_size));
    println!(
        "{:<30} {:>18}",
        "Compressed size",
        stats
            .compressed_size
            .map(format_bytes)
            .unwrap_or_else(|| "n/a".to_string())
    );
    println!("{:-<50}", "");
    println!("{:<30} {:>18}", "Input -> store", format_percent(Some(stats.input_to_store_percent())));
    println!("{:<30} {:>18}", "Input -> compressed", format_percent(stats.input_to_compressed_percent()));
    println!("{:<30} {:>18}", "Store -> compressed", format_percent(stats.store_to_compressed_percent()));
    println!("{:-<50}", "");
    println!();
}
