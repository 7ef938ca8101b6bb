/// Read-only data store
///
/// The gallery never writes to its source. Everything it needs (catalog,
/// secrets, manifests, photos) is fetched by relative path:
/// - `galleries.json` - catalog of collections
/// - `secrets.json` - optional access codes and download links
/// - `<collection>/manifest.json` - photo list fallback
/// - `<collection>/<filename>` - photo assets
use async_trait::async_trait;
use std::sync::Arc;

use crate::error::StoreError;

pub mod dir;
pub mod http;
#[cfg(test)]
pub mod memory;

pub use dir::DirStore;
pub use http::HttpStore;

#[async_trait]
pub trait PhotoStore: Send + Sync {
    /// Fetch the bytes stored at a relative path
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, StoreError>;

    /// Human readable location of a relative path (URL or file path)
    fn resolve(&self, path: &str) -> String;
}

pub type SharedStore = Arc<dyn PhotoStore>;

/// Open the store named by a config `source`
pub fn open(source: &str) -> Result<SharedStore, StoreError> {
    if source.starts_with("http://") || source.starts_with("https://") {
        Ok(Arc::new(HttpStore::new(source)?))
    } else {
        Ok(Arc::new(DirStore::new(source)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_picks_backend() {
        let http = open("https://example.org/gallery/").unwrap();
        assert_eq!(
            http.resolve("A/x.jpg"),
            "https://example.org/gallery/A/x.jpg"
        );

        let dir = open("public/images").unwrap();
        assert!(dir.resolve("A/x.jpg").ends_with("x.jpg"));
    }
}
