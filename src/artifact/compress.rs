use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use crate::error::{Result, BibleDbError};

const BUFFER_SIZE: usize = 64 * 1024;

/// Outcome of compressing a finished store
#[derive(Debug, Clone, PartialEq)]
pub struct CompressionReport {
    pub archive_path: PathBuf,
    pub original_size: u64,
    pub compressed_size: u64,
    /// SHA-256 of the uncompressed store, hex encoded
    pub source_sha256: String,
}

impl CompressionReport {
    /// Size reduction as a percentage of the original size
    pub fn reduction_percent(&self) -> f64 {
        reduction_percent(self.original_size, self.compressed_size)
    }
}

/// Percentage by which `after` is smaller than `before` (0 when `before` is 0)
pub fn reduction_percent(before: u64, after: u64) -> f64 {
    if before == 0 {
        return 0.0;
    }
    (1.0 - after as f64 / before as f64) * 100.0
}

/// Feed everything `reader` yields to both the hasher and `sink`
fn pump<R: Read, W: Write>(reader: &mut R, sink: &mut W, hasher: &mut Sha256) -> Result<u64> {
    let mut buf = vec![0u8; BUFFER_SIZE];
    let mut total = 0u64;
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        sink.write_all(&buf[..n])?;
        total += n as u64;
    }
    Ok(total)
}

/// Gzip `source` into `dest`, replacing any previous artifact
///
/// The source is only read. `level` is the gzip level (9 = best ratio).
pub fn compress_file(source: &Path, dest: &Path, level: u32) -> Result<CompressionReport> {
    log::info!("Compressing {} -> {}", source.display(), dest.display());

    let mut reader = BufReader::with_capacity(BUFFER_SIZE, File::open(source)?);
    let writer = BufWriter::with_capacity(BUFFER_SIZE, File::create(dest)?);
    let mut encoder = GzEncoder::new(writer, Compression::new(level));
    let mut hasher = Sha256::new();

    let original_size = pump(&mut reader, &mut encoder, &mut hasher)?;

    let mut writer = encoder.finish()?;
    writer.flush()?;
    let file = writer.into_inner().map_err(|e| BibleDbError::Io(e.into_error()))?;
    file.sync_all()?;
    drop(file);

    let compressed_size = std::fs::metadata(dest)?.len();
    let report = CompressionReport {
        archive_path: dest.to_path_buf(),
        original_size,
        compressed_size,
        source_sha256: format!("{:x}", hasher.finalize()),
    };

    log::info!(
        "Compressed {} bytes to {} bytes ({:.1}% smaller)",
        report.original_size,
        report.compressed_size,
        report.reduction_percent()
    );
    Ok(report)
}

/// Compute the SHA-256 of a file without loading it whole
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut reader = BufReader::with_capacity(BUFFER_SIZE, File::open(path)?);
    let mut hasher = Sha256::new();
    pump(&mut reader, &mut std::io::sink(), &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}

/// Decompress `archive` and check it reproduces the store with `expected_sha256`
///
/// Returns the decompressed size.
pub fn verify_archive(archive: &Path, expected_sha256: &str) -> Result<u64> {
    let reader = BufReader::with_capacity(BUFFER_SIZE, File::open(archive)?);
    let mut decoder = GzDecoder::new(reader);
    let mut hasher = Sha256::new();

    let size = pump(&mut decoder, &mut std::io::sink(), &mut hasher)?;
    let actual = format!("{:x}", hasher.finalize());

    if actual != expected_sha256 {
        return Err(BibleDbError::Integrity(format!(
            "{} decompresses to sha256 {} but the store is {}",
            archive.display(),
            actual,
            expected_sha256
        )));
    }

    log::info!("✓ Archive integrity verified ({} bytes, sha256 {})", size, actual);
    Ok(size)
}
