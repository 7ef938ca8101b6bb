/// Shared data structures for the application state
///
/// These structs represent the data model that flows between
/// the store layer and the UI layer.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// `galleries.json`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct CatalogDocument {
    #[serde(default)]
    pub galleries: Vec<CatalogEntry>,
}

/// One entry of `galleries.json`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub cover_photo: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photos: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_link: Option<String>,
}

/// One entry of `secrets.json`, keyed by collection name
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SecretEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_link: Option<String>,
}

/// `secrets.json`
pub type SecretsDocument = BTreeMap<String, SecretEntry>;

/// A named, access-gated set of photos. Immutable once the catalog is loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection {
    /// Identifier, also the folder name in the store
    pub name: String,
    pub title: String,
    pub cover_photo: String,
    pub description: Option<String>,
    /// `None` means open access
    pub access_code: Option<String>,
    pub download_link: Option<String>,
    /// Inline photo list; `None` defers to `<name>/manifest.json`
    pub photos: Option<Vec<String>>,
}

impl Collection {
    /// Store path of a file inside this collection
    pub fn path_of(&self, filename: &str) -> String {
        format!("{}/{}", self.name, filename)
    }

    pub fn manifest_path(&self) -> String {
        self.path_of("manifest.json")
    }

    /// Display title, falling back to the name with dashes as spaces
    pub fn display_title(&self) -> String {
        if self.title.trim().is_empty() {
            self.name.replace('-', " ")
        } else {
            self.title.clone()
        }
    }

    pub fn is_open(&self) -> bool {
        self.access_code.is_none()
    }
}

impl From<CatalogEntry> for Collection {
    fn from(entry: CatalogEntry) -> Self {
        Self {
            name: entry.name,
            title: entry.title,
            cover_photo: entry.cover_photo,
            description: entry.description,
            // An empty password in the catalog is the same as none
            access_code: entry.password.filter(|p| !p.is_empty()),
            download_link: entry.download_link.filter(|l| !l.is_empty()),
            photos: entry.photos,
        }
    }
}

/// A photo inside a collection. Derived from the collection and filename.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PhotoRef {
    pub collection_name: String,
    pub filename: String,
    /// Store-relative location, `collection/filename`
    pub uri: String,
}

impl PhotoRef {
    pub fn new(collection: &Collection, filename: &str) -> Self {
        Self {
            collection_name: collection.name.clone(),
            filename: filename.to_string(),
            uri: collection.path_of(filename),
        }
    }
}

/// Build the ordered photo references for a collection
pub fn photo_refs(collection: &Collection, filenames: &[String]) -> Vec<PhotoRef> {
    filenames
        .iter()
        .map(|filename| PhotoRef::new(collection, filename))
        .collect()
}
