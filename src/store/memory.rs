/// In-memory store used by tests
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use super::PhotoStore;
use crate::error::StoreError;

#[derive(Default)]
pub struct MemoryStore {
    files: HashMap<String, Vec<u8>>,
    /// path -> number of fetches that fail before one succeeds
    flaky: Mutex<HashMap<String, u32>>,
    broken: HashSet<String>,
    /// path -> time a fetch takes before answering
    delays: HashMap<String, Duration>,
    log: Mutex<Vec<String>>,
    /// Successful fetches in the order they answered
    completed: Mutex<Vec<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: &str, bytes: impl Into<Vec<u8>>) -> Self {
        self.files.insert(path.to_string(), bytes.into());
        self
    }

    pub fn with_json(self, path: &str, json: &str) -> Self {
        self.with_file(path, json.as_bytes().to_vec())
    }

    /// Every fetch of `path` fails
    pub fn with_broken(mut self, path: &str) -> Self {
        self.broken.insert(path.to_string());
        self
    }

    /// The first `failures` fetches of `path` fail
    pub fn with_flaky(self, path: &str, failures: u32) -> Self {
        self.flaky.lock().unwrap().insert(path.to_string(), failures);
        self
    }

    /// Fetches of `path` answer only after `delay`
    pub fn with_delay(mut self, path: &str, delay: Duration) -> Self {
        self.delays.insert(path.to_string(), delay);
        self
    }

    pub fn completed(&self) -> Vec<String> {
        self.completed.lock().unwrap().clone()
    }

    pub fn fetch_count(&self, path: &str) -> usize {
        self.log.lock().unwrap().iter().filter(|p| *p == path).count()
    }
}

#[async_trait]
impl PhotoStore for MemoryStore {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, StoreError> {
        self.log.lock().unwrap().push(path.to_string());

        if let Some(delay) = self.delays.get(path) {
            tokio::time::sleep(*delay).await;
        }

        if self.broken.contains(path) {
            return Err(StoreError::Http {
                uri: path.to_string(),
                status: 500,
            });
        }

        {
            let mut flaky = self.flaky.lock().unwrap();
            if let Some(remaining) = flaky.get_mut(path) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(StoreError::Transport {
                        uri: path.to_string(),
                        reason: "connection reset".to_string(),
                    });
                }
            }
        }

        let bytes = self
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(path.to_string()))?;
        self.completed.lock().unwrap().push(path.to_string());
        Ok(bytes)
    }

    fn resolve(&self, path: &str) -> String {
        format!("memory://{}", path)
    }
}

/// Encode a tiny PNG of the given size
pub fn png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::new(width, height);
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}
