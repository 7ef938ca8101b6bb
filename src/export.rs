/// "Download All": fetch every photo of a collection and bundle them into one
/// zip archive.
///
/// Failure policy is fail-fast: the first member that cannot be fetched aborts
/// the export, in-flight fetches are dropped, progress is reset to 0 and no
/// archive is produced.
///
/// Progress runs over `photos + 1` steps: one per completed fetch (counted in
/// completion order, so it never moves backwards) and one for writing the
/// archive, which is reported per entry.
use futures::stream::{self, StreamExt};
use std::io::{Cursor, Write};
use std::sync::Arc;
use zip::write::SimpleFileOptions;

use crate::error::{GalleryError, GalleryResult};
use crate::store::PhotoStore;

/// A finished archive, ready to be saved
#[derive(Debug, Clone, PartialEq)]
pub struct Archive {
    /// Suggested file name, `<collection>.zip`
    pub file_name: String,
    pub bytes: Arc<Vec<u8>>,
    pub entries: usize,
}

/// Updates sent to the UI while an export runs
#[derive(Debug, Clone)]
pub enum ExportEvent {
    /// Fraction in `[0, 1]`
    Progress(f32),
    Finished(GalleryResult<Archive>),
}

/// Archive entry name for a store path: its last segment
pub fn entry_name(uri: &str) -> &str {
    uri.rsplit('/').next().unwrap_or(uri)
}

/// Fetch `uris` (at most `concurrency` at a time) and write them into
/// `<collection>.zip`, keyed by filename in collection order.
pub async fn export_all<F>(
    store: &dyn PhotoStore,
    collection: &str,
    uris: &[String],
    concurrency: usize,
    mut progress: F,
) -> GalleryResult<Archive>
where
    F: FnMut(f32),
{
    let total = uris.len();
    let steps = total as f32 + 1.0;
    log::info!("📦 Exporting {} photos from {}", total, collection);
    progress(0.0);

    let mut members: Vec<Option<Vec<u8>>> = vec![None; total];
    let mut completed = 0usize;

    {
        let mut fetches = stream::iter(0..total)
            .map(|i| {
                let uri = &uris[i];
                async move { (i, store.fetch(uri).await) }
            })
            .buffer_unordered(concurrency.max(1));

        while let Some((i, result)) = fetches.next().await {
            match result {
                Ok(bytes) => {
                    members[i] = Some(bytes);
                    completed += 1;
                    // Counts answers, not positions, so a slow first photo cannot hold it back
                    progress(completed as f32 / steps);
                }
                Err(e) => {
                    log::error!("❌ Export of {} aborted: {}", collection, e);
                    progress(0.0);
                    return Err(GalleryError::ExportFetchFailed(uris[i].clone()));
                }
            }
        }
    }

    let entries: Vec<(&str, Vec<u8>)> = uris
        .iter()
        .zip(members)
        .filter_map(|(uri, bytes)| bytes.map(|b| (entry_name(uri), b)))
        .collect();

    // The last step is spread over the entries written
    let bytes = match write_archive(&entries, |written| {
        progress((total as f32 + written as f32 / total.max(1) as f32) / steps)
    }) {
        Ok(bytes) => bytes,
        Err(e) => {
            log::error!("❌ Export of {} aborted: {}", collection, e);
            progress(0.0);
            return Err(e);
        }
    };

    progress(1.0);
    log::info!("✅ Export of {} ready ({} KB)", collection, bytes.len() / 1024);

    Ok(Archive {
        file_name: format!("{}.zip", collection),
        bytes: Arc::new(bytes),
        entries: entries.len(),
    })
}

/// Write entries into an in-memory zip, calling `on_entry` with the number
/// of entries written so far.
fn write_archive<F>(entries: &[(&str, Vec<u8>)], mut on_entry: F) -> GalleryResult<Vec<u8>>
where
    F: FnMut(usize),
{
    let archive_err = |e: &dyn std::fmt::Display| GalleryError::Archive(e.to_string());

    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    // Photos are already compressed
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);

    for (written, (name, bytes)) in entries.iter().enumerate() {
        writer
            .start_file(name.to_string(), options)
            .map_err(|e| archive_err(&e))?;
        writer.write_all(bytes).map_err(|e| archive_err(&e))?;
        on_entry(written + 1);
    }

    let cursor = writer.finish().map_err(|e| archive_err(&e))?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use std::time::Duration;

    fn uris(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| format!("A/{}", n)).collect()
    }

    #[tokio::test]
    async fn test_export_bundles_every_photo() {
        let store = MemoryStore::new()
            .with_file("A/x.jpg", b"xx".to_vec())
            .with_file("A/y.jpg", b"yyy".to_vec())
            .with_file("A/z.jpg", b"z".to_vec());
        let mut seen = Vec::new();

        let archive = export_all(&store, "A", &uris(&["x.jpg", "y.jpg", "z.jpg"]), 2, |p| {
            seen.push(p)
        })
        .await
        .unwrap();

        assert_eq!(archive.file_name, "A.zip");
        assert_eq!(archive.entries, 3);
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(seen.last(), Some(&1.0));

        let mut zip = zip::ZipArchive::new(Cursor::new(archive.bytes.to_vec())).unwrap();
        assert_eq!(zip.len(), 3);
        assert_eq!(zip.by_index(0).unwrap().name(), "x.jpg");
        assert_eq!(zip.by_name("y.jpg").unwrap().size(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_out_of_order_answers_keep_progress_monotonic() {
        let store = MemoryStore::new()
            .with_file("A/x.jpg", b"xx".to_vec())
            .with_delay("A/x.jpg", Duration::from_millis(500))
            .with_file("A/y.jpg", b"yyy".to_vec())
            .with_file("A/z.jpg", b"z".to_vec());
        let mut seen = Vec::new();

        let archive = export_all(&store, "A", &uris(&["x.jpg", "y.jpg", "z.jpg"]), 3, |p| {
            seen.push(p)
        })
        .await
        .unwrap();

        // The first photo answers last
        assert_eq!(store.completed(), vec!["A/y.jpg", "A/z.jpg", "A/x.jpg"]);
        assert!(seen.windows(2).all(|w| w[0] <= w[1]), "{:?}", seen);
        assert!(seen.contains(&0.75), "{:?}", seen);
        // Writing the archive moves past the fetch steps before reaching 1.0
        assert!(seen.iter().any(|p| *p > 0.75 && *p < 1.0), "{:?}", seen);
        assert_eq!(seen.last(), Some(&1.0));

        // Entries keep collection order
        let mut zip = zip::ZipArchive::new(Cursor::new(archive.bytes.to_vec())).unwrap();
        let names: Vec<String> = (0..zip.len())
            .map(|i| zip.by_index(i).unwrap().name().to_string())
            .collect();
        assert_eq!(names, vec!["x.jpg", "y.jpg", "z.jpg"]);
    }

    #[tokio::test]
    async fn test_failed_fetch_aborts_and_resets_progress() {
        let store = MemoryStore::new()
            .with_file("A/x.jpg", b"xx".to_vec())
            .with_broken("A/y.jpg")
            .with_file("A/z.jpg", b"z".to_vec());
        let mut seen = Vec::new();

        let result = export_all(&store, "A", &uris(&["x.jpg", "y.jpg", "z.jpg"]), 1, |p| {
            seen.push(p)
        })
        .await;

        assert_eq!(
            result,
            Err(GalleryError::ExportFetchFailed("A/y.jpg".to_string()))
        );
        assert_eq!(seen.last(), Some(&0.0));
        // Sequential export stops at the failure
        assert_eq!(store.fetch_count("A/z.jpg"), 0);
    }

    #[tokio::test]
    async fn test_empty_collection_gives_empty_archive() {
        let store = MemoryStore::new();
        let archive = export_all(&store, "Empty", &[], 4, |_| {}).await.unwrap();
        assert_eq!(archive.entries, 0);
    }

    #[test]
    fn test_entry_name() {
        assert_eq!(entry_name("A/B/photo.jpg"), "photo.jpg");
        assert_eq!(entry_name("photo.jpg"), "photo.jpg");
    }
}
