pub mod config;
pub mod error;
pub mod db;
pub mod ingest;
pub mod artifact;
pub mod stats;
pub mod search;
pub mod pipeline;

pub use config::Config;
pub use error::{BibleDbError, Result};
pub use pipeline::{BuildOptions, BuildReport, run};
