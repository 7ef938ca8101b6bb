/// Photo gallery viewer
///
/// Browses photo collections published on a read-only store (a web server
/// or a local directory):
/// - Catalog, secrets and viewing session (state)
/// - Progressive masonry grid with retrying image loads (grid)
/// - "Download All" zip export (export)
/// - Store backends (store)
/// - Manifest, catalog and secrets authoring for the admin tool (authoring)

pub mod authoring;
pub mod config;
pub mod error;
pub mod export;
pub mod grid;
pub mod logger;
pub mod state;
pub mod store;

pub use config::ViewerConfig;
pub use error::{GalleryError, GalleryResult, StoreError};
