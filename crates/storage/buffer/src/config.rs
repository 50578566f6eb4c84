use serde::Deserialize;
use std::path::PathBuf;
use std::{num::NonZeroUsize, path::Path};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO Error")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Parse Error")]
    ParseToml {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Invalid TOML error")]
    Invalid { message: String },
}

/// Buffer pool configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BufferConfig {
    /// Directory holding the segment files
    pub data_dir: PathBuf,
    /// Size in bytes of every page in the pool
    pub page_size: NonZeroUsize,
    /// Maximum number of pages resident in memory at the same time
    pub buffer_pages: NonZeroUsize,
}

const DEFAULT_PAGE_SIZE: usize = 4096;
const DEFAULT_BUFFER_PAGES: usize = 64;

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            page_size: NonZeroUsize::new(DEFAULT_PAGE_SIZE).unwrap(),
            buffer_pages: NonZeroUsize::new(DEFAULT_BUFFER_PAGES).unwrap(),
        }
    }
}

impl BufferConfig {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref().to_path_buf();
        let text = std::fs::read_to_string(&path).map_err(|e| ConfigError::Io {
            path: path.clone(),
            source: e,
        })?;

        let cfg: BufferConfig = toml::from_str(&text).map_err(|e| ConfigError::ParseToml {
            path: path.clone(),
            source: e,
        })?;

        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        // page_size and buffer_pages are NonZeroUsize, so "0" can't happen.
        if !self.page_size.get().is_power_of_two() {
            return Err(ConfigError::Invalid {
                message: format!("page_size must be a power of two, got {}", self.page_size),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, text: &str) -> PathBuf {
        let path = dir.path().join("buffer.toml");
        std::fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn parses_a_full_config_file() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            "data_dir = \"/var/lib/pages\"\npage_size = 1024\nbuffer_pages = 10\n",
        );

        let cfg = BufferConfig::load_from_file(path).unwrap();

        assert_eq!(cfg.data_dir, PathBuf::from("/var/lib/pages"));
        assert_eq!(cfg.page_size.get(), 1024);
        assert_eq!(cfg.buffer_pages.get(), 10);
    }

    #[test]
    fn rejects_non_power_of_two_page_size() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            "data_dir = \".\"\npage_size = 1000\nbuffer_pages = 10\n",
        );

        let err = BufferConfig::load_from_file(path).unwrap_err();

        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn zero_page_count_is_a_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "data_dir = \".\"\npage_size = 1024\nbuffer_pages = 0\n");

        let err = BufferConfig::load_from_file(path).unwrap_err();

        assert!(matches!(err, ConfigError::ParseToml { .. }));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = TempDir::new().unwrap();

        let err = BufferConfig::load_from_file(dir.path().join("nope.toml")).unwrap_err();

        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn default_is_valid() {
        let cfg = BufferConfig::default();
        assert!(cfg.validate().is_ok());
    }
}
