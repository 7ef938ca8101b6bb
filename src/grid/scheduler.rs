/// Image loading scheduler
///
/// Runs single fetch attempts and backoff waits for the grid controller, and
/// full retry loops for detached loads (lightbox, prefetch). It never touches
/// tile state itself: every result goes back to the owning controller, which
/// drops results from an older generation.
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::tile::{Tile, TileEvent, TileId, TileState};
use crate::config::ViewerConfig;
use crate::error::{GalleryError, GalleryResult};
use crate::state::data::PhotoRef;
use crate::store::SharedStore;

/// Bounded retry with exponential backoff
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base: Duration,
    pub cap: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base: Duration::from_millis(1000),
            cap: Duration::from_millis(5000),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &ViewerConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base: Duration::from_millis(config.backoff_base_ms),
            cap: Duration::from_millis(config.backoff_cap_ms),
        }
    }

    /// Delay before retrying after failed attempt `attempt`:
    /// `min(base * 2^attempt, cap)`
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base.saturating_mul(factor).min(self.cap)
    }
}

/// A fetched, decodable image
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedImage {
    pub uri: String,
    pub bytes: Arc<Vec<u8>>,
    pub width: u32,
    pub height: u32,
}

/// Request to run one fetch attempt for a tile
#[derive(Debug, Clone, PartialEq)]
pub struct LoadTicket {
    pub generation: u64,
    pub tile: TileId,
    pub uri: String,
    pub attempt: u32,
}

/// Request to wait out a backoff before the next attempt
#[derive(Debug, Clone, PartialEq)]
pub struct RetryTicket {
    pub generation: u64,
    pub tile: TileId,
    /// The attempt that failed
    pub attempt: u32,
    pub delay: Duration,
}

/// Outcome of one attempt, routed back to the grid controller
#[derive(Debug, Clone)]
pub struct AttemptReport {
    pub generation: u64,
    pub tile: TileId,
    pub attempt: u32,
    pub result: GalleryResult<LoadedImage>,
}

pub struct Scheduler {
    store: SharedStore,
    policy: RetryPolicy,
    cancel_token: CancellationToken,
}

impl Scheduler {
    pub fn new(store: SharedStore, policy: RetryPolicy) -> Self {
        Self {
            store,
            policy,
            cancel_token: CancellationToken::new(),
        }
    }

    /// Cancel everything in flight and start a new token for the next view.
    /// Cancelled work completes silently without producing a report.
    pub fn cancel_all(&mut self) {
        self.cancel_token.cancel();
        self.cancel_token = CancellationToken::new();
    }

    /// Run one fetch attempt. Resolves to `None` when cancelled.
    pub fn attempt(
        &self,
        ticket: LoadTicket,
    ) -> impl std::future::Future<Output = Option<AttemptReport>> + Send + 'static {
        let store = self.store.clone();
        let cancel_token = self.cancel_token.child_token();

        async move {
            log::debug!(
                "[Scheduler] Attempt {} for {} (gen={})",
                ticket.attempt,
                ticket.uri,
                ticket.generation
            );

            let result = tokio::select! {
                _ = cancel_token.cancelled() => {
                    log::debug!("[Scheduler] Cancelled: {}", ticket.uri);
                    return None;
                }
                result = fetch_image(&store, &ticket.uri) => result,
            };

            if cancel_token.is_cancelled() {
                log::debug!("[Scheduler] Discarding cancelled result: {}", ticket.uri);
                return None;
            }

            let result = result.map_err(|reason| {
                log::debug!("[Scheduler] {} failed: {}", ticket.uri, reason);
                GalleryError::ImageLoadFailed {
                    uri: ticket.uri.clone(),
                    attempt: ticket.attempt,
                    terminal: false,
                }
            });

            Some(AttemptReport {
                generation: ticket.generation,
                tile: ticket.tile,
                attempt: ticket.attempt,
                result,
            })
        }
    }

    /// Sleep for a retry ticket's backoff. Resolves to `None` when cancelled.
    pub fn wait(
        &self,
        ticket: RetryTicket,
    ) -> impl std::future::Future<Output = Option<RetryTicket>> + Send + 'static {
        let cancel_token = self.cancel_token.child_token();

        async move {
            tokio::select! {
                _ = cancel_token.cancelled() => None,
                _ = tokio::time::sleep(ticket.delay) => Some(ticket),
            }
        }
    }

    /// Load a photo with the full retry policy, independent of any grid.
    pub fn load(
        &self,
        photo: PhotoRef,
    ) -> impl std::future::Future<Output = GalleryResult<LoadedImage>> + Send + 'static {
        let store = self.store.clone();
        let policy = self.policy;

        async move { load_with_policy(&store, policy, photo).await }
    }
}

/// Drive a detached tile through the lifecycle until it settles
async fn load_with_policy(
    store: &SharedStore,
    policy: RetryPolicy,
    photo: PhotoRef,
) -> GalleryResult<LoadedImage> {
    let uri = photo.uri.clone();
    let mut tile = Tile::new(0, photo);
    tile.apply(TileEvent::Observe);
    tile.apply(TileEvent::Dispatch);

    loop {
        let TileState::Loading { attempt } = tile.state else {
            break;
        };

        match fetch_image(store, &uri).await {
            Ok(image) => return Ok(image),
            Err(reason) => {
                log::debug!("[Scheduler] {} attempt {} failed: {}", uri, attempt, reason);
                tile.apply(TileEvent::FetchFailed {
                    max_attempts: policy.max_attempts,
                });
            }
        }

        if let TileState::Failed {
            attempt,
            terminal: false,
        } = tile.state
        {
            tokio::time::sleep(policy.backoff(attempt)).await;
            tile.apply(TileEvent::Retry);
        }
    }

    let attempt = match tile.state {
        TileState::Failed { attempt, .. } => attempt,
        _ => policy.max_attempts,
    };
    log::warn!("Giving up on {} after {} attempts", uri, attempt);

    Err(GalleryError::ImageLoadFailed {
        uri,
        attempt,
        terminal: true,
    })
}

/// Fetch bytes and read the image header for its intrinsic size.
/// Bytes that do not decode count as a failed load.
async fn fetch_image(store: &SharedStore, uri: &str) -> Result<LoadedImage, String> {
    let bytes = Arc::new(store.fetch(uri).await.map_err(|e| e.to_string())?);

    // Header parsing is cheap, but some formats scan; keep it off the async workers
    let header = bytes.clone();
    let (width, height) = tokio::task::spawn_blocking(move || image_dimensions(&header))
        .await
        .map_err(|e| format!("Task join error: {}", e))??;

    Ok(LoadedImage {
        uri: uri.to_string(),
        bytes,
        width,
        height,
    })
}

fn image_dimensions(bytes: &[u8]) -> Result<(u32, u32), String> {
    image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| e.to_string())?
        .into_dimensions()
        .map_err(|e| format!("Not a decodable image: {}", e))
}
