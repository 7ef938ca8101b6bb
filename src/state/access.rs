/// Passcode gate for collections
///
/// Known property: this is a UX gate, not a security boundary. Codes come
/// from plain JSON files that anyone with access to the store can read, and
/// the comparison is a plain string equality.
use super::data::Collection;
use super::library::Library;

/// Message shown when the supplied code does not match
pub const ACCESS_DENIED: &str = "Incorrect passcode. Please try again.";

/// Check a supplied code against a collection.
/// Collections without a stored code are open.
pub fn verify(collection: &Collection, supplied: &str) -> bool {
    match &collection.access_code {
        None => true,
        Some(code) => code == supplied,
    }
}

impl Library {
    /// Check a supplied code by collection name. Unknown names never unlock.
    pub fn verify(&self, name: &str, supplied: &str) -> bool {
        self.get(name)
            .map(|collection| verify(collection, supplied))
            .unwrap_or(false)
    }
}

/// State of the passcode prompt for one collection
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Gate {
    /// Collection the prompt was opened for
    pub collection: String,
    /// Current text of the input
    pub input: String,
    /// Error line shown under the input
    pub error: Option<String>,
}

impl Gate {
    pub fn new(collection: &str) -> Self {
        Self {
            collection: collection.to_string(),
            ..Self::default()
        }
    }

    /// Try the current input. On failure the gate stays locked and shows
    /// [`ACCESS_DENIED`].
    pub fn submit(&mut self, library: &Library) -> bool {
        if library.verify(&self.collection, &self.input) {
            self.error = None;
            log::info!("🔓 Unlocked {}", self.collection);
            true
        } else {
            self.error = Some(ACCESS_DENIED.to_string());
            log::info!("Wrong passcode for {}", self.collection);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::data::CatalogEntry;

    fn library() -> Library {
        let entries = vec![
            CatalogEntry {
                name: "A".to_string(),
                title: "A".to_string(),
                cover_photo: "x.jpg".to_string(),
                description: None,
                photos: Some(vec!["x.jpg".to_string(), "y.jpg".to_string()]),
                password: Some("42".to_string()),
                download_link: None,
            },
            CatalogEntry {
                name: "Open".to_string(),
                title: "Open".to_string(),
                cover_photo: String::new(),
                description: None,
                photos: None,
                password: None,
                download_link: None,
            },
        ];
        Library::new(entries.into_iter().map(Collection::from).collect())
    }

    #[test]
    fn test_wrong_then_right_code() {
        let library = library();
        let mut gate = Gate::new("A");

        gate.input = "41".to_string();
        assert!(!library.verify("A", "41"));
        assert!(!gate.submit(&library));
        assert_eq!(gate.error.as_deref(), Some(ACCESS_DENIED));

        gate.input = "42".to_string();
        assert!(gate.submit(&library));
        assert!(gate.error.is_none());
    }

    #[test]
    fn test_no_code_is_open_access() {
        let library = library();
        assert!(library.verify("Open", ""));
        assert!(library.verify("Open", "anything at all"));
    }

    #[test]
    fn test_unknown_collection_stays_locked() {
        assert!(!library().verify("Nope", "42"));
    }
}
