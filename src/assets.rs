//! Asset loading with embedded fallbacks
//!
//! Reference palettes and the default config are compiled into the binary.
//!
//! - If an env var is NOT set: use embedded assets only (no filesystem access)
//! - If an env var IS set: use the filesystem first, embedded as fallback

use rust_embed::RustEmbed;
use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Embedded reference palettes (`<name>.csv`)
#[derive(RustEmbed)]
#[folder = "palettes/"]
#[include = "*.csv"]
struct EmbeddedPalettes;

/// Embedded default config
#[derive(RustEmbed)]
#[folder = "."]
#[include = "config.yaml"]
struct EmbeddedConfig;

/// Asset loader with optional filesystem override
#[derive(Debug, Clone, Default)]
pub struct AssetLoader {
    /// External config file path (from CONFIG_FILE env var)
    config_file: Option<PathBuf>,
    /// External palettes directory (from PALETTES_DIR env var)
    palettes_dir: Option<PathBuf>,
}

impl AssetLoader {
    /// Create a new asset loader
    ///
    /// Paths should be `Some` only if the corresponding env var was set.
    pub fn new(config_file: Option<PathBuf>, palettes_dir: Option<PathBuf>) -> Self {
        Self {
            config_file,
            palettes_dir,
        }
    }

    /// Build a loader from `CONFIG_FILE` and `PALETTES_DIR`.
    pub fn from_env() -> Self {
        Self::new(
            std::env::var("CONFIG_FILE").ok().map(PathBuf::from),
            std::env::var("PALETTES_DIR").ok().map(PathBuf::from),
        )
    }

    pub fn config_file(&self) -> Option<&Path> {
        self.config_file.as_deref()
    }

    pub fn palettes_dir(&self) -> Option<&Path> {
        self.palettes_dir.as_deref()
    }

    /// Read the config file
    ///
    /// If an external path is configured and exists, uses that.
    /// Otherwise falls back to embedded config.
    pub fn read_config(&self) -> io::Result<Cow<'static, [u8]>> {
        if let Some(ref path) = self.config_file {
            if path.exists() {
                tracing::trace!(path = %path.display(), "Loading config from filesystem");
                return Ok(Cow::Owned(fs::read(path)?));
            }
        }

        EmbeddedConfig::get("config.yaml")
            .map(|f| {
                tracing::trace!("Loading config from embedded assets");
                f.data
            })
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::NotFound, "Embedded config.yaml not found")
            })
    }

    /// Read config as a UTF-8 string
    pub fn read_config_string(&self) -> io::Result<String> {
        to_string(self.read_config()?)
    }

    /// Read a reference palette by name (without the `.csv` suffix)
    ///
    /// Returns `Ok(None)` when neither the palettes directory nor the
    /// embedded set has it. Names containing path separators are rejected.
    pub fn read_palette(&self, name: &str) -> io::Result<Option<String>> {
        if !is_valid_palette_name(name) {
            return Ok(None);
        }
        let file_name = format!("{name}.csv");

        if let Some(ref dir) = self.palettes_dir {
            let full_path = dir.join(&file_name);
            if full_path.exists() {
                tracing::trace!(path = %full_path.display(), "Loading palette from filesystem");
                return fs::read_to_string(&full_path).map(Some);
            }
        }

        match EmbeddedPalettes::get(&file_name) {
            Some(f) => {
                tracing::trace!(palette = %name, "Loading palette from embedded assets");
                to_string(f.data).map(Some)
            }
            None => Ok(None),
        }
    }

    /// All available palette names (merged view of embedded + external), sorted
    pub fn list_palettes(&self) -> Vec<String> {
        let mut names: BTreeSet<String> = Self::list_embedded().into_iter().collect();

        if let Some(ref dir) = self.palettes_dir {
            if let Ok(entries) = fs::read_dir(dir) {
                for entry in entries.flatten() {
                    if let Some(name) = entry.file_name().to_str() {
                        if let Some(stem) = name.strip_suffix(".csv") {
                            if is_valid_palette_name(stem) {
                                names.insert(stem.to_string());
                            }
                        }
                    }
                }
            }
        }

        names.into_iter().collect()
    }

    /// Names of the palettes compiled into the binary
    pub fn list_embedded() -> Vec<String> {
        let mut names: Vec<String> = EmbeddedPalettes::iter()
            .filter_map(|f| f.strip_suffix(".csv").map(str::to_string))
            .collect();
        names.sort();
        names
    }
}

fn is_valid_palette_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn to_string(bytes: Cow<'static, [u8]>) -> io::Result<String> {
    String::from_utf8(bytes.into_owned()).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}
