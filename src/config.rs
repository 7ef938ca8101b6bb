/// Viewer configuration
///
/// Stored as JSON in the user's config directory:
/// - Linux: ~/.config/photo-gallery/config.json
/// - macOS: ~/Library/Application Support/photo-gallery/config.json
/// - Windows: %APPDATA%\photo-gallery\config.json
///
/// Every field has a default, so a partial file (or none at all) is fine.
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding `source`
pub const SOURCE_ENV: &str = "PHOTO_GALLERY_SOURCE";

/// Network conditions the grid is tuned for
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum NetworkClass {
    #[default]
    Standard,
    /// Slow or metered link: smaller batches, earlier prefetch
    Constrained,
}

/// A value that differs per network class
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct PerNetwork<T> {
    pub standard: T,
    pub constrained: T,
}

impl<T: Copy> PerNetwork<T> {
    pub fn pick(&self, class: NetworkClass) -> T {
        match class {
            NetworkClass::Standard => self.standard,
            NetworkClass::Constrained => self.constrained,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ViewerConfig {
    /// Root of the read-only store: a directory or an http(s) base URL
    pub source: String,
    /// Catalog document, relative to `source`
    pub catalog_path: String,
    /// Optional enrichment document, relative to `source`
    pub secrets_path: String,

    // ========== Grid ==========
    pub network: NetworkClass,
    /// Tile (column) width in logical pixels
    pub column_width: f32,
    /// Spacing between columns and rows
    pub gutter: f32,
    /// Tiles appended per batch
    pub batch_size: PerNetwork<usize>,
    /// Distance beyond the visible area at which a placeholder starts loading
    pub tile_margin: PerNetwork<f32>,
    /// Distance at which the last rendered tile triggers the next batch
    pub trailing_margin: f32,

    // ========== Loading ==========
    pub max_attempts: u32,
    pub backoff_base_ms: u64,
    pub backoff_cap_ms: u64,

    // ========== Lightbox / export ==========
    pub debounce_ms: u64,
    pub export_concurrency: usize,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            source: "public/images".to_string(),
            catalog_path: "galleries.json".to_string(),
            secrets_path: "secrets.json".to_string(),
            network: NetworkClass::Standard,
            column_width: 280.0,
            gutter: 12.0,
            batch_size: PerNetwork {
                standard: 30,
                constrained: 12,
            },
            tile_margin: PerNetwork {
                standard: 200.0,
                constrained: 600.0,
            },
            trailing_margin: 800.0,
            max_attempts: 3,
            backoff_base_ms: 1000,
            backoff_cap_ms: 5000,
            debounce_ms: 120,
            export_concurrency: 4,
        }
    }
}

impl ViewerConfig {
    /// Load the config file, falling back to defaults, then apply the
    /// environment override.
    pub fn load() -> Self {
        let mut config = match Self::config_path() {
            Some(path) => Self::from_file(&path),
            None => Self::default(),
        };

        if let Ok(source) = std::env::var(SOURCE_ENV) {
            if !source.trim().is_empty() {
                config.source = source;
            }
        }

        config
    }

    /// Read a config file. Missing files give defaults; malformed files are
    /// reported and ignored.
    pub fn from_file(path: &Path) -> Self {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(_) => {
                log::debug!("No config at {}, using defaults", path.display());
                return Self::default();
            }
        };

        match serde_json::from_str(&text) {
            Ok(config) => {
                log::info!("⚙️  Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                log::warn!("Ignoring malformed config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    fn config_path() -> Option<PathBuf> {
        let mut path = dirs::config_dir().or_else(dirs::home_dir)?;
        path.push("photo-gallery");
        path.push("config.json");
        Some(path)
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size.pick(self.network).max(1)
    }

    pub fn tile_margin(&self) -> f32 {
        self.tile_margin.pick(self.network)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}
