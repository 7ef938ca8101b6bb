use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::PhotoStore;
use crate::error::StoreError;

/// Store backed by a local directory (e.g. `public/images`)
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn path_for(&self, path: &str) -> PathBuf {
        path.split('/')
            .filter(|segment| !segment.is_empty())
            .fold(self.root.clone(), |acc, segment| acc.join(segment))
    }
}

#[async_trait]
impl PhotoStore for DirStore {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, StoreError> {
        let full = self.path_for(path);

        tokio::fs::read(&full).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => StoreError::NotFound(full.display().to_string()),
            _ => StoreError::Io {
                path: full.display().to_string(),
                reason: e.to_string(),
            },
        })
    }

    fn resolve(&self, path: &str) -> String {
        self.path_for(path).display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fetch_and_missing() {
        let root = std::env::temp_dir().join(format!("photo-gallery-dirstore-{}", std::process::id()));
        std::fs::create_dir_all(root.join("A")).unwrap();
        std::fs::write(root.join("A").join("x.jpg"), b"jpeg").unwrap();

        let store = DirStore::new(&root);
        assert_eq!(store.fetch("A/x.jpg").await.unwrap(), b"jpeg".to_vec());
        assert!(matches!(
            store.fetch("A/missing.jpg").await,
            Err(StoreError::NotFound(_))
        ));

        std::fs::remove_dir_all(&root).unwrap();
    }
}
