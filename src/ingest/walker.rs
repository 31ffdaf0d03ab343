use walkdir::WalkDir;
use std::path::{Path, PathBuf};
use crate::error::{Result, BibleDbError};

/// Extension of source files, compared case-insensitively
pub const SOURCE_EXTENSION: &str = "json";

/// A discovered per-book source file
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub file_name: String,
    pub path: PathBuf,
    pub size: u64,
}

fn is_hidden(file_name: &str) -> bool {
    file_name.starts_with('.')
}

/// Discover the source files directly inside `dir`.
///
/// Only `.json` files are returned; hidden files and sub-directories are
/// skipped. Files come back sorted by file name, and that order decides the
/// book order numbers, so inputs are expected to carry a numeric prefix
/// (`01_Genesis.json`, `02_Exodus.json`, ...).
pub fn discover_source_files(dir: &Path) -> Result<Vec<SourceFile>> {
    if !dir.is_dir() {
        return Err(BibleDbError::InvalidInput(format!(
            "input directory does not exist: {}",
            dir.display()
        )));
    }

    let mut files = Vec::new();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| {
            BibleDbError::Io(e.into_io_error().unwrap_or_else(|| {
                std::io::Error::new(std::io::ErrorKind::Other, "directory walk failed")
            }))
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        let file_name = entry.file_name().to_string_lossy().to_string();
        if is_hidden(&file_name) {
            continue;
        }

        let extension = entry
            .path()
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_lowercase();
        if extension != SOURCE_EXTENSION {
            continue;
        }

        let metadata = entry.metadata().map_err(|e| {
            BibleDbError::Io(e.into_io_error().unwrap_or_else(|| {
                std::io::Error::new(std::io::ErrorKind::Other, "failed to read file metadata")
            }))
        })?;

        files.push(SourceFile {
            file_name,
            path: entry.path().to_path_buf(),
            size: metadata.len(),
        });
    }

    // WalkDir sorts by OsStr; re-sort on the decoded name so ordering is the
    // same on every platform.
    files.sort_by(|a, b| a.file_name.cmp(&b.file_name));

    log::info!("Discovered {} source files in {}", files.len(), dir.display());
    Ok(files)
}

/// Total size in bytes of the given source files
pub fn total_input_size(files: &[SourceFile]) -> u64 {
    files.iter().map(|f| f.size).sum()
}
