/// Error types shared by the catalog loader, image pipeline and exporter
///
/// Every variant is `Clone` so results can travel inside UI messages.
/// Wrong passcodes are not errors: the access gate answers with `false`.
use thiserror::Error;

/// Failures of the read-only data store
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    #[error("resource not found: {0}")]
    NotFound(String),
    #[error("{uri} answered with HTTP {status}")]
    Http { uri: String, status: u16 },
    #[error("transport error for {uri}: {reason}")]
    Transport { uri: String, reason: String },
    #[error("i/o error for {path}: {reason}")]
    Io { path: String, reason: String },
}

/// Top level error for gallery operations
#[derive(Debug, Clone, Error, PartialEq)]
pub enum GalleryError {
    /// The catalog document could not be fetched or parsed
    #[error("catalog unavailable: {0}")]
    CatalogUnavailable(String),

    /// Neither the inline photo list nor the manifest fallback produced a list
    #[error("manifest unavailable for {collection}: {reason}")]
    ManifestUnavailable { collection: String, reason: String },

    /// A tile fetch failed. `terminal` is set once the retry budget is spent.
    #[error("image load failed for {uri} (attempt {attempt}, terminal: {terminal})")]
    ImageLoadFailed {
        uri: String,
        attempt: u32,
        terminal: bool,
    },

    /// A member fetch failed during "Download All"
    #[error("export aborted, could not fetch {0}")]
    ExportFetchFailed(String),

    /// The archive writer failed while finalizing
    #[error("archive error: {0}")]
    Archive(String),

    #[error("no collection named {0}")]
    UnknownCollection(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type GalleryResult<T> = Result<T, GalleryError>;
