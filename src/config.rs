use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
///
/// Every section has defaults, so a run without a config file behaves exactly
/// like one with an empty file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub translation: TranslationConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub cleanup: CleanupConfig,
}

/// Translation the ingested verse text is stored under
#[derive(Debug, Clone, Deserialize)]
pub struct TranslationConfig {
    #[serde(default = "default_translation_code")]
    pub code: String,
    #[serde(default = "default_translation_name")]
    pub name: String,
    #[serde(default = "default_language")]
    pub language: String,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            code: default_translation_code(),
            name: default_translation_name(),
            language: default_language(),
        }
    }
}

/// Artifact naming and compression
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_db_file_name")]
    pub db_file_name: String,
    #[serde(default = "default_temp_suffix")]
    pub temp_suffix: String,
    #[serde(default = "default_archive_suffix")]
    pub archive_suffix: String,
    /// gzip level, 0-9; 9 is maximum ratio
    #[serde(default = "default_compression_level")]
    pub compression_level: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            db_file_name: default_db_file_name(),
            temp_suffix: default_temp_suffix(),
            archive_suffix: default_archive_suffix(),
            compression_level: default_compression_level(),
        }
    }
}

/// Retry policy for removing transient files
#[derive(Debug, Clone, Deserialize)]
pub struct CleanupConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

impl CleanupConfig {
    /// Delay before the second removal attempt; later attempts double it
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }
}

fn default_translation_code() -> String {
    "KJV".to_string()
}

fn default_translation_name() -> String {
    "King James Version".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

fn default_db_file_name() -> String {
    "bible.db".to_string()
}

fn default_temp_suffix() -> String {
    ".tmp".to_string()
}

fn default_archive_suffix() -> String {
    ".gz".to_string()
}

fn default_compression_level() -> u32 {
    9
}

fn default_max_attempts() -> u32 {
    5
}

fn default_base_delay_ms() -> u64 {
    100
}

impl Config {
    /// Load configuration
    ///
    /// With no path the built-in defaults are used; nothing is read from the
    /// environment or the working directory.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                let config_str = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file: {}", path.display()))?;
                toml::from_str::<Config>(&config_str)
                    .with_context(|| format!("Failed to parse {}", path.display()))?
            }
            None => Config::default(),
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.translation.code.trim().is_empty() {
            anyhow::bail!("translation.code must not be empty");
        }

        if self.output.db_file_name.trim().is_empty() {
            anyhow::bail!("output.db_file_name must not be empty");
        }

        for (field, value) in [
            ("output.db_file_name", &self.output.db_file_name),
            ("output.temp_suffix", &self.output.temp_suffix),
            ("output.archive_suffix", &self.output.archive_suffix),
        ] {
            if value.contains('/') || value.contains('\\') {
                anyhow::bail!("{} must not contain path separators: {}", field, value);
            }
        }

        // The working store and the archive must never alias the final store
        if self.output.temp_suffix.is_empty() || self.output.archive_suffix.is_empty() {
            anyhow::bail!("output.temp_suffix and output.archive_suffix must not be empty");
        }

        if self.output.compression_level > 9 {
            anyhow::bail!("output.compression_level must be between 0 and 9");
        }

        if self.cleanup.max_attempts == 0 {
            anyhow::bail!("cleanup.max_attempts must be greater than 0");
        }

        Ok(())
    }

    /// Working store path inside `output_dir`
    pub fn temp_db_path(&self, output_dir: &Path) -> PathBuf {
        output_dir.join(format!("{}{}", self.output.db_file_name, self.output.temp_suffix))
    }

    /// Final store path inside `output_dir`
    pub fn final_db_path(&self, output_dir: &Path) -> PathBuf {
        output_dir.join(&self.output.db_file_name)
    }

    /// Compressed artifact path inside `output_dir`
    pub fn archive_path(&self, output_dir: &Path) -> PathBuf {
        output_dir.join(format!("{}{}", self.output.db_file_name, self.output.archive_suffix))
    }
}
