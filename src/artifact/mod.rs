pub mod cleanup;
pub mod compress;

pub use cleanup::{CleanupManager, backoff_delay, sidecar_path};
pub use compress::{CompressionReport, compress_file, reduction_percent, sha256_file, verify_archive};
