/// Progressive photo grid
///
/// This module handles:
/// - Tile lifecycle (tile.rs)
/// - Fetching with retry and backoff (scheduler.rs)
/// - Viewport proximity checks (observer.rs)
/// - Masonry packing (layout.rs)
/// - Batch-wise rendering of large collections (renderer.rs)
/// - Wiring all of the above for one open view (controller.rs)

pub mod controller;
pub mod layout;
pub mod observer;
pub mod renderer;
pub mod scheduler;
pub mod tile;

pub use controller::{GridController, GridSettings};
pub use observer::Viewport;
pub use scheduler::{AttemptReport, LoadTicket, LoadedImage, RetryPolicy, RetryTicket, Scheduler};
pub use tile::{Tile, TileId, TileState};
