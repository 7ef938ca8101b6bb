/// Tile lifecycle
///
/// ```text
/// Placeholder -> Observed -> Loading(1) -> Loaded
///                            Loading(n) -> Failed(n) -> Loading(n + 1)
///                            Loading(max) -> Failed(terminal)
/// ```
use crate::state::data::PhotoRef;

/// Position of the tile in collection order
pub type TileId = usize;

/// Height/width ratio used while the real size is unknown
pub const PLACEHOLDER_RATIO: f32 = 0.75;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileState {
    /// Skeleton shown, no network activity
    Placeholder,
    /// Registered with the viewport observer
    Observed,
    /// Fetch in flight; `attempt` is 1-based
    Loading { attempt: u32 },
    /// Image available, skeleton removed
    Loaded,
    /// A fetch failed. Non-terminal failures wait for a scheduled retry.
    Failed { attempt: u32, terminal: bool },
}

impl TileState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TileState::Loaded | TileState::Failed { terminal: true, .. }
        )
    }
}

/// Events driving [`TileState`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TileEvent {
    Observe,
    Dispatch,
    Succeeded { width: u32, height: u32 },
    FetchFailed { max_attempts: u32 },
    Retry,
}

/// UI unit for one photo of the grid. Owned by the grid controller.
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    pub id: TileId,
    pub photo: PhotoRef,
    pub state: TileState,
    /// Intrinsic pixel size once loaded
    pub natural_size: Option<(u32, u32)>,
}

impl Tile {
    pub fn new(id: TileId, photo: PhotoRef) -> Self {
        Self {
            id,
            photo,
            state: TileState::Placeholder,
            natural_size: None,
        }
    }

    /// Apply an event. Returns `false` (and leaves the tile untouched) when
    /// the event is not valid in the current state.
    pub fn apply(&mut self, event: TileEvent) -> bool {
        let next = match (self.state, event) {
            (TileState::Placeholder, TileEvent::Observe) => TileState::Observed,
            (TileState::Observed, TileEvent::Dispatch) => TileState::Loading { attempt: 1 },
            (TileState::Loading { .. }, TileEvent::Succeeded { width, height }) => {
                self.natural_size = Some((width, height));
                TileState::Loaded
            }
            (TileState::Loading { attempt }, TileEvent::FetchFailed { max_attempts }) => {
                TileState::Failed {
                    attempt,
                    terminal: attempt >= max_attempts,
                }
            }
            (
                TileState::Failed {
                    attempt,
                    terminal: false,
                },
                TileEvent::Retry,
            ) => TileState::Loading {
                attempt: attempt + 1,
            },
            (state, event) => {
                log::debug!("Tile {} ignores {:?} in {:?}", self.id, event, state);
                return false;
            }
        };

        log::debug!("Tile {}: {:?} -> {:?}", self.id, self.state, next);
        self.state = next;
        true
    }

    /// Height of the tile box at the given column width
    pub fn height(&self, column_width: f32) -> f32 {
        match (self.state, self.natural_size) {
            (TileState::Loaded, Some((w, h))) if w > 0 => column_width * h as f32 / w as f32,
            _ => column_width * PLACEHOLDER_RATIO,
        }
    }

    /// Skeleton visible (not loaded, not given up)
    pub fn shows_skeleton(&self) -> bool {
        !self.state.is_terminal()
    }

    /// Failed for good, shown as a degraded tile
    pub fn is_degraded(&self) -> bool {
        matches!(self.state, TileState::Failed { terminal: true, .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tile() -> Tile {
        Tile::new(
            0,
            PhotoRef {
                collection_name: "A".to_string(),
                filename: "x.jpg".to_string(),
                uri: "A/x.jpg".to_string(),
            },
        )
    }

    #[test]
    fn test_happy_path() {
        let mut tile = tile();
        assert!(tile.apply(TileEvent::Observe));
        assert!(tile.apply(TileEvent::Dispatch));
        assert_eq!(tile.state, TileState::Loading { attempt: 1 });
        assert!(tile.apply(TileEvent::Succeeded {
            width: 400,
            height: 600
        }));
        assert_eq!(tile.state, TileState::Loaded);
        assert_eq!(tile.height(200.0), 300.0);
        assert!(!tile.shows_skeleton());
    }

    #[test]
    fn test_retry_until_terminal() {
        let mut tile = tile();
        tile.apply(TileEvent::Observe);
        tile.apply(TileEvent::Dispatch);

        for attempt in 1..3 {
            tile.apply(TileEvent::FetchFailed { max_attempts: 3 });
            assert_eq!(
                tile.state,
                TileState::Failed {
                    attempt,
                    terminal: false
                }
            );
            assert!(tile.apply(TileEvent::Retry));
        }

        tile.apply(TileEvent::FetchFailed { max_attempts: 3 });
        assert!(tile.is_degraded());
        // No retries after giving up
        assert!(!tile.apply(TileEvent::Retry));
        assert_eq!(tile.height(100.0), 75.0);
    }

    #[test]
    fn test_dispatch_requires_observation() {
        let mut tile = tile();
        assert!(!tile.apply(TileEvent::Dispatch));
        assert_eq!(tile.state, TileState::Placeholder);
    }
}
