/// State management module
///
/// This module handles all application state, including:
/// - Catalog data structures (data.rs)
/// - Catalog loading and secrets enrichment (library.rs)
/// - Passcode gate (access.rs)
/// - The viewing session of an open gallery (session.rs)
/// - Lightbox navigation (lightbox.rs)

pub mod access;
pub mod data;
pub mod library;
pub mod lightbox;
pub mod session;
