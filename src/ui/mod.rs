/// Viewer screens
///
/// - Collection list and passcode prompt (catalog.rs)
/// - Masonry gallery with its toolbar (gallery.rs)
/// - Full-size photo viewer (lightbox.rs)

pub mod catalog;
pub mod gallery;
pub mod lightbox;
