/// The viewing session: the one piece of mutable state of an open gallery.
///
/// Owned by the gallery controller; there is at most one per open view and it
/// is dropped when the view is left.
use super::data::{photo_refs, Collection, PhotoRef};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ViewingSession {
    active: Option<Collection>,
    photos: Vec<PhotoRef>,
    current_index: usize,
}

impl ViewingSession {
    /// Start a session over a collection's ordered filenames
    pub fn start(collection: Collection, filenames: &[String]) -> Self {
        let photos = photo_refs(&collection, filenames);
        Self {
            active: Some(collection),
            photos,
            current_index: 0,
        }
    }

    /// End the session
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn collection(&self) -> Option<&Collection> {
        self.active.as_ref()
    }

    pub fn photos(&self) -> &[PhotoRef] {
        &self.photos
    }

    /// Store-relative URIs in collection order
    pub fn ordered_photo_uris(&self) -> Vec<String> {
        self.photos.iter().map(|p| p.uri.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.photos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current(&self) -> Option<&PhotoRef> {
        self.photos.get(self.current_index)
    }

    pub fn photo(&self, index: usize) -> Option<&PhotoRef> {
        self.photos.get(index)
    }

    /// Move to `index` wrapped into range. Returns the new index, or `None`
    /// when there are no photos.
    pub fn set_index(&mut self, index: usize) -> Option<usize> {
        let len = self.photos.len();
        if len == 0 {
            return None;
        }
        self.current_index = index % len;
        Some(self.current_index)
    }

    /// Index `delta` steps away from the current one, with wraparound
    pub fn offset(&self, delta: isize) -> Option<usize> {
        let len = self.photos.len() as isize;
        if len == 0 {
            return None;
        }
        Some((self.current_index as isize + delta).rem_euclid(len) as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::data::CatalogEntry;
    use pretty_assertions::assert_eq;

    fn collection(name: &str, photos: &[&str]) -> Collection {
        Collection::from(CatalogEntry {
            name: name.to_string(),
            title: name.to_string(),
            cover_photo: photos.first().map(|p| p.to_string()).unwrap_or_default(),
            description: None,
            photos: Some(photos.iter().map(|p| p.to_string()).collect()),
            password: None,
            download_link: None,
        })
    }

    #[test]
    fn test_ordered_uris() {
        let session = ViewingSession::start(
            collection("A", &["x.jpg", "y.jpg"]),
            &["x.jpg".to_string(), "y.jpg".to_string()],
        );
        assert_eq!(session.ordered_photo_uris(), vec!["A/x.jpg", "A/y.jpg"]);
        assert_eq!(session.current_index(), 0);
    }

    #[test]
    fn test_offset_wraps_both_ways() {
        let names: Vec<String> = (0..4).map(|i| format!("{}.jpg", i)).collect();
        let mut session = ViewingSession::start(collection("A", &[]), &names);

        assert_eq!(session.offset(-1), Some(3));
        assert_eq!(session.offset(4), Some(0));
        session.set_index(9);
        assert_eq!(session.current_index(), 1);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut session =
            ViewingSession::start(collection("A", &["x.jpg"]), &["x.jpg".to_string()]);
        session.reset();
        assert!(!session.is_active());
        assert!(session.is_empty());
        assert_eq!(session.offset(1), None);
    }
}
