/// Lightbox navigation over the viewing session
///
/// Index changes apply to the session immediately, but the shown photo (image,
/// counter and filename together) and the neighbour prefetch only change once
/// navigation has been quiet for the debounce window. Every
/// navigation bumps a generation counter; a pending swap whose generation is
/// no longer current is dropped.
use std::collections::HashMap;
use std::time::Duration;

use super::data::PhotoRef;
use super::session::ViewingSession;
use crate::grid::LoadedImage;

/// Ticket for a coalesced navigation, flushed after the debounce window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingSwap {
    pub generation: u64,
}

/// What to show and what to fetch ahead
#[derive(Debug, Clone, PartialEq)]
pub struct Swap {
    pub generation: u64,
    pub index: usize,
    pub photo: PhotoRef,
    /// Wraparound neighbours, without duplicates or the current photo
    pub prefetch: Vec<PhotoRef>,
}

#[derive(Debug)]
pub struct Lightbox {
    open: bool,
    generation: u64,
    debounce: Duration,
    /// Session index and photo on screen, as of the last swap
    shown: Option<(usize, PhotoRef)>,
    /// Decoded images for the current photo and its neighbours
    cache: HashMap<String, LoadedImage>,
}

impl Lightbox {
    pub fn new(debounce: Duration) -> Self {
        Self {
            open: false,
            generation: 0,
            debounce,
            shown: None,
            cache: HashMap::new(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Photo on screen with its session index. Lags behind the session
    /// cursor until a pending swap settles.
    pub fn shown(&self) -> Option<(usize, &PhotoRef)> {
        self.shown.as_ref().map(|(index, photo)| (*index, photo))
    }

    /// Is a result started for `generation` still wanted?
    pub fn is_current(&self, generation: u64) -> bool {
        self.open && generation == self.generation
    }

    /// Open on `index` (wrapped into range). Shows immediately.
    pub fn open(&mut self, session: &mut ViewingSession, index: usize) -> Option<Swap> {
        session.set_index(index)?;
        self.open = true;
        self.generation += 1;
        self.swap(session)
    }

    pub fn next(&mut self, session: &mut ViewingSession) -> Option<PendingSwap> {
        self.navigate(session, 1)
    }

    pub fn previous(&mut self, session: &mut ViewingSession) -> Option<PendingSwap> {
        self.navigate(session, -1)
    }

    fn navigate(&mut self, session: &mut ViewingSession, delta: isize) -> Option<PendingSwap> {
        if !self.open {
            return None;
        }
        let index = session.offset(delta)?;
        session.set_index(index);
        self.generation += 1;
        Some(PendingSwap {
            generation: self.generation,
        })
    }

    /// Wait out the debounce window for a pending swap
    pub fn debounced(
        &self,
        pending: PendingSwap,
    ) -> impl std::future::Future<Output = PendingSwap> + Send + 'static {
        let window = self.debounce;
        async move {
            tokio::time::sleep(window).await;
            pending
        }
    }

    /// Flush a pending swap. Only the latest navigation produces a swap.
    pub fn settle(&mut self, session: &ViewingSession, pending: PendingSwap) -> Option<Swap> {
        if !self.is_current(pending.generation) {
            return None;
        }
        self.swap(session)
    }

    pub fn close(&mut self) {
        self.open = false;
        self.generation += 1;
        self.shown = None;
        self.cache.clear();
    }

    fn swap(&mut self, session: &ViewingSession) -> Option<Swap> {
        let index = session.current_index();
        let photo = session.current()?.clone();

        let mut prefetch: Vec<PhotoRef> = Vec::with_capacity(2);
        for delta in [-1, 1] {
            let Some(neighbour) = session.offset(delta) else {
                continue;
            };
            if neighbour == index {
                continue;
            }
            if let Some(p) = session.photo(neighbour) {
                if !prefetch.contains(p) {
                    prefetch.push(p.clone());
                }
            }
        }

        // Drop decoded images that are no longer adjacent
        self.cache.retain(|uri, _| {
            *uri == photo.uri || prefetch.iter().any(|p| p.uri == *uri)
        });

        log::debug!("Lightbox -> {} ({} prefetches)", photo.uri, prefetch.len());
        self.shown = Some((index, photo.clone()));
        Some(Swap {
            generation: self.generation,
            index,
            photo,
            prefetch,
        })
    }

    /// Keep a fetched image for display or later navigation
    pub fn store(&mut self, image: LoadedImage) {
        if self.open {
            self.cache.insert(image.uri.clone(), image);
        }
    }

    pub fn cached(&self, uri: &str) -> Option<&LoadedImage> {
        self.cache.get(uri)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::data::{CatalogEntry, Collection};
    use std::sync::Arc;

    fn session(len: usize) -> ViewingSession {
        let names: Vec<String> = (0..len).map(|i| format!("{}.jpg", i)).collect();
        let collection = Collection::from(CatalogEntry {
            name: "A".to_string(),
            title: "A".to_string(),
            cover_photo: String::new(),
            description: None,
            photos: Some(names.clone()),
            password: None,
            download_link: None,
        });
        ViewingSession::start(collection, &names)
    }

    fn lightbox() -> Lightbox {
        Lightbox::new(Duration::from_millis(120))
    }

    #[test]
    fn test_next_then_previous_returns_home() {
        for len in 1..=8 {
            for start in 0..len {
                let mut session = session(len);
                let mut lightbox = lightbox();
                lightbox.open(&mut session, start).unwrap();

                let pending = lightbox.next(&mut session).unwrap();
                lightbox.settle(&session, pending).unwrap();
                let pending = lightbox.previous(&mut session).unwrap();
                let swap = lightbox.settle(&session, pending).unwrap();

                assert_eq!(swap.index, start, "len {} start {}", len, start);
            }
        }
    }

    #[test]
    fn test_previous_from_zero_stays_in_range() {
        for len in 1..=5 {
            let mut session = session(len);
            let mut lightbox = lightbox();
            lightbox.open(&mut session, 0);

            for _ in 0..(3 * len + 1) {
                lightbox.previous(&mut session);
                assert!(session.current_index() < len);
            }
        }
    }

    #[test]
    fn test_rapid_navigation_is_coalesced() {
        let mut session = session(10);
        let mut lightbox = lightbox();
        lightbox.open(&mut session, 0);

        let pendings: Vec<PendingSwap> = (0..5)
            .map(|_| lightbox.next(&mut session).unwrap())
            .collect();

        let swaps: Vec<Swap> = pendings
            .into_iter()
            .filter_map(|p| lightbox.settle(&session, p))
            .collect();

        assert_eq!(swaps.len(), 1);
        assert_eq!(swaps[0].index, 5);
        let neighbours: Vec<&str> = swaps[0].prefetch.iter().map(|p| p.uri.as_str()).collect();
        assert_eq!(neighbours, vec!["A/4.jpg", "A/6.jpg"]);
    }

    #[test]
    fn test_shown_photo_changes_only_when_settled() {
        let mut session = session(5);
        let mut lightbox = lightbox();
        lightbox.open(&mut session, 1);
        assert_eq!(lightbox.shown().map(|(i, p)| (i, p.uri.as_str())), Some((1, "A/1.jpg")));

        let first = lightbox.next(&mut session).unwrap();
        let second = lightbox.next(&mut session).unwrap();
        assert_eq!(session.current_index(), 3);
        // Counter, filename and image all still describe the old photo
        assert_eq!(lightbox.shown().map(|(i, p)| (i, p.uri.as_str())), Some((1, "A/1.jpg")));

        assert!(lightbox.settle(&session, first).is_none());
        assert_eq!(lightbox.shown().map(|(i, _)| i), Some(1));

        lightbox.settle(&session, second).unwrap();
        assert_eq!(lightbox.shown().map(|(i, p)| (i, p.uri.as_str())), Some((3, "A/3.jpg")));

        lightbox.close();
        assert!(lightbox.shown().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_waits_for_the_window() {
        let mut session = session(3);
        let mut lightbox = lightbox();
        lightbox.open(&mut session, 0);

        let start = tokio::time::Instant::now();
        let pending = lightbox.next(&mut session).unwrap();
        let flushed = lightbox.debounced(pending).await;

        assert!(start.elapsed() >= Duration::from_millis(120));
        assert!(lightbox.settle(&session, flushed).is_some());
    }

    #[test]
    fn test_neighbours_without_duplicates() {
        let mut single = session(1);
        let swap = lightbox().open(&mut single, 0).unwrap();
        assert!(swap.prefetch.is_empty());

        let mut pair = session(2);
        let swap = lightbox().open(&mut pair, 0).unwrap();
        assert_eq!(swap.prefetch.len(), 1);
        assert_eq!(swap.prefetch[0].uri, "A/1.jpg");

        let mut five = session(5);
        let swap = lightbox().open(&mut five, 0).unwrap();
        let uris: Vec<&str> = swap.prefetch.iter().map(|p| p.uri.as_str()).collect();
        assert_eq!(uris, vec!["A/4.jpg", "A/1.jpg"]);
    }

    #[test]
    fn test_close_drops_pending_swaps_and_cache() {
        let mut session = session(4);
        let mut lightbox = lightbox();
        lightbox.open(&mut session, 1);
        lightbox.store(LoadedImage {
            uri: "A/1.jpg".to_string(),
            bytes: Arc::new(vec![1, 2, 3]),
            width: 1,
            height: 1,
        });
        assert!(lightbox.cached("A/1.jpg").is_some());

        let pending = lightbox.next(&mut session).unwrap();
        lightbox.close();

        assert!(lightbox.settle(&session, pending).is_none());
        assert!(lightbox.cached("A/1.jpg").is_none());
        assert!(lightbox.next(&mut session).is_none());
    }

    #[test]
    fn test_empty_session_cannot_open() {
        let mut empty = ViewingSession::default();
        let mut lightbox = lightbox();
        assert!(lightbox.open(&mut empty, 0).is_none());
        assert!(!lightbox.is_open());
    }
}
