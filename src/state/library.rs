use super::data::{CatalogDocument, Collection, SecretsDocument};
use crate::error::{GalleryError, GalleryResult};
use crate::store::PhotoStore;

/// The Library holds the collections of the catalog.
/// It is loaded once per session from the read-only store and never mutated.
#[derive(Debug, Clone, Default)]
pub struct Library {
    collections: Vec<Collection>,
}

impl Library {
    pub fn new(collections: Vec<Collection>) -> Self {
        Self { collections }
    }

    /// Load the catalog and enrich it with the optional secrets document.
    pub async fn load(
        store: &dyn PhotoStore,
        catalog_path: &str,
        secrets_path: &str,
    ) -> GalleryResult<Self> {
        let collections = load_catalog(store, catalog_path, secrets_path).await?;
        Ok(Self::new(collections))
    }

    /// All collections in catalog order
    pub fn collections(&self) -> &[Collection] {
        &self.collections
    }

    /// Look up a collection by name
    pub fn get(&self, name: &str) -> Option<&Collection> {
        self.collections.iter().find(|c| c.name == name)
    }

    pub fn len(&self) -> usize {
        self.collections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }
}

/// Fetch `galleries.json` and merge `secrets.json` into it.
///
/// A missing or unreadable secrets document is not an error: collections
/// without a code simply stay open.
pub async fn load_catalog(
    store: &dyn PhotoStore,
    catalog_path: &str,
    secrets_path: &str,
) -> GalleryResult<Vec<Collection>> {
    let bytes = store
        .fetch(catalog_path)
        .await
        .map_err(|e| GalleryError::CatalogUnavailable(e.to_string()))?;

    let document: CatalogDocument = serde_json::from_slice(&bytes).map_err(|e| {
        GalleryError::CatalogUnavailable(format!("{}: {}", store.resolve(catalog_path), e))
    })?;

    let mut collections: Vec<Collection> =
        document.galleries.into_iter().map(Collection::from).collect();

    match load_secrets(store, secrets_path).await {
        Some(secrets) => merge_secrets(&mut collections, &secrets),
        None => log::warn!(
            "No usable secrets at {}, collections without a code are open",
            store.resolve(secrets_path)
        ),
    }

    log::info!("📁 Catalog loaded: {} collections", collections.len());
    Ok(collections)
}

async fn load_secrets(store: &dyn PhotoStore, secrets_path: &str) -> Option<SecretsDocument> {
    let bytes = match store.fetch(secrets_path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            log::debug!("Secrets fetch failed: {}", e);
            return None;
        }
    };

    match serde_json::from_slice(&bytes) {
        Ok(secrets) => Some(secrets),
        Err(e) => {
            log::warn!("Ignoring malformed secrets document: {}", e);
            None
        }
    }
}

/// Fill in missing access codes and download links by collection name.
/// Values already present in the catalog win.
pub fn merge_secrets(collections: &mut [Collection], secrets: &SecretsDocument) {
    for collection in collections.iter_mut() {
        let Some(secret) = secrets.get(&collection.name) else {
            continue;
        };

        if collection.access_code.is_none() {
            collection.access_code = secret.password.clone().filter(|p| !p.is_empty());
        }
        if collection.download_link.is_none() {
            collection.download_link = secret.download_link.clone().filter(|l| !l.is_empty());
        }
    }
}

/// Ordered filenames of a collection: the inline list when present,
/// otherwise `<name>/manifest.json`.
pub async fn load_collection_photos(
    store: &dyn PhotoStore,
    collection: &Collection,
) -> GalleryResult<Vec<String>> {
    if let Some(photos) = &collection.photos {
        return Ok(photos.clone());
    }

    let manifest_path = collection.manifest_path();
    let unavailable = |reason: String| GalleryError::ManifestUnavailable {
        collection: collection.name.clone(),
        reason,
    };

    let bytes = store
        .fetch(&manifest_path)
        .await
        .map_err(|e| unavailable(e.to_string()))?;

    let photos: Vec<String> =
        serde_json::from_slice(&bytes).map_err(|e| unavailable(e.to_string()))?;

    log::info!(
        "📄 Manifest for {}: {} photos",
        collection.name,
        photos.len()
    );
    Ok(photos)
}
