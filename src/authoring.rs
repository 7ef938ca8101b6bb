/// Catalog authoring for a local store directory
///
/// Produces the static files the viewer reads:
/// - `<collection>/manifest.json` for every collection folder
/// - `galleries.json` built from the folders that have a manifest
/// - `secrets.json` entries with access codes and download links
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use url::Url;
use walkdir::WalkDir;

use crate::state::data::{CatalogDocument, CatalogEntry, SecretEntry, SecretsDocument};

/// Image extensions listed in manifests
pub const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "webp"];

#[derive(Debug, Error)]
pub enum AuthoringError {
    #[error("i/o error at {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("malformed json in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid download link: {0}")]
    InvalidLink(String),
    #[error("{0} already has a secret entry (use --force to overwrite)")]
    SecretExists(String),
}

pub type AuthoringResult<T> = Result<T, AuthoringError>;

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> AuthoringError + '_ {
    move |source| AuthoringError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> AuthoringResult<T> {
    let text = fs::read_to_string(path).map_err(io_err(path))?;
    serde_json::from_str(&text).map_err(|source| AuthoringError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> AuthoringResult<()> {
    let text = serde_json::to_string_pretty(value).map_err(|source| AuthoringError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, text).map_err(io_err(path))
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Collection folders directly under `root`, sorted by name
pub fn collection_dirs(root: &Path) -> AuthoringResult<Vec<PathBuf>> {
    let mut dirs: Vec<PathBuf> = WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir())
        .map(|e| e.into_path())
        .collect();
    dirs.sort();
    Ok(dirs)
}

/// Sorted image filenames directly inside `dir`
pub fn list_images(dir: &Path) -> Vec<String> {
    let mut images: Vec<String> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && is_image(e.path()))
        .map(|e| e.file_name().to_string_lossy().to_string())
        .collect();
    images.sort();
    images
}

/// Write `manifest.json` into every collection folder under `root`.
/// Returns `(folder, image count)` per folder.
pub fn write_manifests(root: &Path) -> AuthoringResult<Vec<(String, usize)>> {
    let mut written = Vec::new();

    for dir in collection_dirs(root)? {
        let images = list_images(&dir);
        write_json(&dir.join("manifest.json"), &images)?;

        let name = dir.file_name().unwrap_or_default().to_string_lossy().to_string();
        log::info!("📄 Wrote manifest for {} ({} images)", name, images.len());
        written.push((name, images.len()));
    }

    Ok(written)
}

/// "winter-wonderland" -> "Winter Wonderland"
pub fn default_title(folder: &str) -> String {
    folder
        .replace('-', " ")
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Rebuild `galleries.json` under `root` from folders that have a manifest.
/// Titles and covers of existing entries are kept.
pub fn write_catalog(root: &Path) -> AuthoringResult<CatalogDocument> {
    let catalog_path = root.join("galleries.json");
    let existing: CatalogDocument = if catalog_path.exists() {
        read_json(&catalog_path)?
    } else {
        CatalogDocument::default()
    };

    let mut galleries = Vec::new();
    for dir in collection_dirs(root)? {
        let manifest_path = dir.join("manifest.json");
        if !manifest_path.exists() {
            continue;
        }
        let images: Vec<String> = read_json(&manifest_path)?;
        let folder = dir.file_name().unwrap_or_default().to_string_lossy().to_string();
        let previous = existing.galleries.iter().find(|g| g.name == folder);

        let title = previous
            .map(|g| g.title.clone())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| default_title(&folder));
        let cover_photo = previous
            .map(|g| g.cover_photo.clone())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| images.first().cloned().unwrap_or_default());

        galleries.push(CatalogEntry {
            description: Some(format!("{} collection", folder.replace('-', " "))),
            name: folder,
            title,
            cover_photo,
            photos: None,
            password: None,
            download_link: None,
        });
    }

    let document = CatalogDocument { galleries };
    write_json(&catalog_path, &document)?;
    log::info!(
        "🗂️  Wrote {} with {} collections",
        catalog_path.display(),
        document.galleries.len()
    );
    Ok(document)
}

/// Accept absolute http(s) and ftp(s) links with a host
pub fn is_valid_link(link: &str) -> bool {
    match Url::parse(link) {
        Ok(url) => {
            matches!(url.scheme(), "http" | "https" | "ftp" | "ftps") && url.host().is_some()
        }
        Err(_) => false,
    }
}

/// Add or replace the secrets entry of a collection
pub fn set_secret(
    secrets_path: &Path,
    collection: &str,
    password: &str,
    download_link: &str,
    force: bool,
) -> AuthoringResult<()> {
    if !is_valid_link(download_link) {
        return Err(AuthoringError::InvalidLink(download_link.to_string()));
    }

    let mut secrets: SecretsDocument = if secrets_path.exists() {
        read_json(secrets_path)?
    } else {
        SecretsDocument::new()
    };

    if secrets.contains_key(collection) && !force {
        return Err(AuthoringError::SecretExists(collection.to_string()));
    }

    secrets.insert(
        collection.to_string(),
        SecretEntry {
            password: Some(password.to_string()),
            download_link: Some(download_link.to_string()),
        },
    );

    write_json(secrets_path, &secrets)?;
    log::info!("🔑 Stored secret for {} in {}", collection, secrets_path.display());
    Ok(())
}
