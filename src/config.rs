//! Engine options and optional configuration file support.
//!
//! [`EngineOptions`] carries the engine-specific knobs used when a handle is opened:
//! compression levels for the writers and the buffer size of the read side. With
//! the `config` feature the options can also be loaded from a TOML file.

use crate::error::{CompFileError, Result};
#[cfg(feature = "config")]
use std::path::{Path, PathBuf};

/// Engine-specific options applied when opening a handle
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(serde::Deserialize))]
#[cfg_attr(feature = "config", serde(default, deny_unknown_fields))]
pub struct EngineOptions {
    /// gzip compression level (0-9)
    pub gzip_level: u32,
    /// bzip2 block size / compression level (1-9)
    pub bzip2_level: u32,
    /// xz preset (0-9)
    pub xz_preset: u32,
    /// zstd compression level (1-22)
    pub zstd_level: i32,
    /// Size of the read/write buffers in bytes
    pub buffer_size: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            gzip_level: 9,
            bzip2_level: 9,
            xz_preset: 6,
            zstd_level: 3,
            buffer_size: 8 * 1024,
        }
    }
}

impl EngineOptions {
    /// Check every option against the range its engine accepts
    pub fn validate(&self) -> Result<()> {
        if self.gzip_level > 9 {
            return Err(CompFileError::config(format!(
                "gzip_level must be 0-9, got {}",
                self.gzip_level
            )));
        }
        if !(1..=9).contains(&self.bzip2_level) {
            return Err(CompFileError::config(format!(
                "bzip2_level must be 1-9, got {}",
                self.bzip2_level
            )));
        }
        if self.xz_preset > 9 {
            return Err(CompFileError::config(format!(
                "xz_preset must be 0-9, got {}",
                self.xz_preset
            )));
        }
        if !(1..=22).contains(&self.zstd_level) {
            return Err(CompFileError::config(format!(
                "zstd_level must be 1-22, got {}",
                self.zstd_level
            )));
        }
        if self.buffer_size == 0 {
            return Err(CompFileError::config("buffer_size must be positive"));
        }
        Ok(())
    }

    /// Set the level of whichever engine the name refers to
    ///
    /// Unknown engine names are ignored; the plain engine has no level.
    pub fn with_level(mut self, engine: &str, level: u32) -> Self {
        match engine {
            "gzip" => self.gzip_level = level,
            "bzip2" => self.bzip2_level = level,
            "lzma" => self.xz_preset = level,
            "zstd" => self.zstd_level = level.min(i32::MAX as u32) as i32,
            _ => {}
        }
        self
    }
}

#[cfg(feature = "config")]
impl EngineOptions {
    /// Parse options from a TOML document; missing keys keep their defaults
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let options: Self = toml::from_str(source)
            .map_err(|e| CompFileError::config(format!("invalid TOML: {}", e)))?;
        options.validate()?;
        Ok(options)
    }

    /// Read and parse a TOML configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path).map_err(|e| {
            CompFileError::config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&source)
    }

    /// `<config dir>/compfile/config.toml`, if the platform has a config directory
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("compfile").join("config.toml"))
    }

    /// Load the default configuration file, or defaults when it does not exist
    pub fn load_default() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.is_file() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }
}
