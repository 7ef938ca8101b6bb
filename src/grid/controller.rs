/// Grid controller
///
/// Owns the tiles of one open collection view and serializes every tile
/// transition: the observer reports tiles entering the margin, the controller
/// unregisters and dispatches them as load tickets, and attempt reports come
/// back here to be applied (or dropped when they belong to an older view).
use super::layout::{pack, ItemSize, MasonryConfig, MasonryLayout};
use super::observer::{Viewport, ViewportObserver};
use super::renderer::{BatchCursor, IncrementalRenderer};
use super::scheduler::{AttemptReport, LoadTicket, RetryPolicy, RetryTicket};
use super::tile::{Tile, TileEvent, TileId, TileState};
use crate::config::ViewerConfig;
use crate::state::data::PhotoRef;

/// Per-view tuning, fixed when the view opens
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSettings {
    pub column_width: f32,
    pub gutter: f32,
    pub batch_size: usize,
    pub tile_margin: f32,
    pub trailing_margin: f32,
    pub policy: RetryPolicy,
}

impl GridSettings {
    pub fn from_config(config: &ViewerConfig) -> Self {
        Self {
            // Guard against sizes that would collapse the column count
            column_width: config.column_width.max(1.0),
            gutter: config.gutter.max(0.0),
            batch_size: config.batch_size(),
            tile_margin: config.tile_margin(),
            trailing_margin: config.trailing_margin,
            policy: RetryPolicy::from_config(config),
        }
    }
}

pub struct GridController {
    generation: u64,
    photos: Vec<PhotoRef>,
    tiles: Vec<Tile>,
    settings: GridSettings,
    renderer: IncrementalRenderer,
    /// Placeholders waiting to come near the viewport
    observer: ViewportObserver<TileId>,
    /// Watches the last rendered tile for the next batch
    sentinel: ViewportObserver<TileId>,
    masonry: MasonryConfig,
    layout: MasonryLayout,
    viewport: Viewport,
}

impl GridController {
    pub fn new(
        generation: u64,
        photos: Vec<PhotoRef>,
        settings: GridSettings,
        container_width: f32,
    ) -> Self {
        log::info!(
            "🖼️  Grid view #{}: {} photos, batches of {}",
            generation,
            photos.len(),
            settings.batch_size
        );

        Self {
            generation,
            renderer: IncrementalRenderer::new(photos.len(), settings.batch_size),
            photos,
            tiles: Vec::new(),
            observer: ViewportObserver::new(settings.tile_margin),
            sentinel: ViewportObserver::new(settings.trailing_margin),
            masonry: MasonryConfig::for_width(container_width, settings.column_width, settings.gutter),
            layout: MasonryLayout::default(),
            viewport: Viewport::default(),
            settings,
        }
    }

    /// Render the first batch and dispatch what is near the top of the grid.
    /// A new view always starts scrolled to the top.
    pub fn open(&mut self, height: f32) -> Vec<LoadTicket> {
        self.render_next_batch();
        self.set_viewport(Viewport::new(0.0, height))
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn tile(&self, id: TileId) -> Option<&Tile> {
        self.tiles.get(id)
    }

    pub fn layout(&self) -> &MasonryLayout {
        &self.layout
    }

    pub fn masonry(&self) -> MasonryConfig {
        self.masonry
    }

    pub fn cursor(&self) -> BatchCursor {
        self.renderer.cursor()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn is_watching(&self, id: TileId) -> bool {
        self.observer.is_watching(id)
    }

    /// New scroll position. Appends batches while the last tile is within the
    /// trailing margin, then dispatches placeholders near the viewport.
    pub fn set_viewport(&mut self, viewport: Viewport) -> Vec<LoadTicket> {
        self.viewport = viewport;

        loop {
            let layout = &self.layout;
            let triggered = self.sentinel.scan(viewport, |id| layout.span(id));
            if triggered.is_empty() || !self.render_next_batch() {
                break;
            }
        }

        self.dispatch_near_viewport()
    }

    /// Container width changed: recompute the column count and repack
    pub fn resize(&mut self, container_width: f32) -> Vec<LoadTicket> {
        let masonry = MasonryConfig::for_width(
            container_width,
            self.settings.column_width,
            self.settings.gutter,
        );
        if masonry != self.masonry {
            self.masonry = masonry;
            self.repack();
        }
        self.set_viewport(self.viewport)
    }

    /// Append the next batch of placeholders. Returns `false` once the whole
    /// collection is rendered.
    pub fn render_next_batch(&mut self) -> bool {
        let Some(batch) = self.renderer.next_batch() else {
            return false;
        };

        for id in batch {
            let Some(photo) = self.photos.get(id) else {
                continue;
            };
            let mut tile = Tile::new(id, photo.clone());
            if self.observer.observe(id) {
                tile.apply(TileEvent::Observe);
            }
            self.tiles.push(tile);
        }

        self.repack();

        // The previous last tile is no longer the last. Re-arm on the new one
        // until the whole collection is rendered.
        self.sentinel.disconnect();
        if !self.renderer.is_complete() {
            if let Some(last) = self.renderer.last_rendered() {
                self.sentinel.observe(last);
            }
        }

        true
    }

    /// Recompute the masonry arrangement from the current tile heights
    pub fn repack(&mut self) {
        let items: Vec<ItemSize> = self
            .tiles
            .iter()
            .map(|tile| ItemSize {
                index: tile.id,
                height: tile.height(self.masonry.column_width),
            })
            .collect();
        self.layout = pack(&self.masonry, &items);
    }

    fn dispatch_near_viewport(&mut self) -> Vec<LoadTicket> {
        let layout = &self.layout;
        let entered = self.observer.scan(self.viewport, |id| layout.span(id));

        let mut tickets = Vec::with_capacity(entered.len());
        for id in entered {
            let Some(tile) = self.tiles.get_mut(id) else {
                continue;
            };
            if tile.apply(TileEvent::Dispatch) {
                tickets.push(LoadTicket {
                    generation: self.generation,
                    tile: id,
                    uri: tile.photo.uri.clone(),
                    attempt: 1,
                });
            }
        }
        tickets
    }

    /// Apply the outcome of an attempt. Returns a retry ticket when the tile
    /// failed and still has attempts left.
    pub fn apply(&mut self, report: &AttemptReport) -> Option<RetryTicket> {
        // Started by a view that has since been closed or replaced
        if report.generation != self.generation {
            log::debug!("Dropping report for view #{}", report.generation);
            return None;
        }

        let tile = self.tiles.get_mut(report.tile)?;
        // Only the attempt the tile is waiting on may move it
        if tile.state != (TileState::Loading { attempt: report.attempt }) {
            log::debug!("Dropping stale report for tile {}", report.tile);
            return None;
        }

        match &report.result {
            Ok(image) => {
                tile.apply(TileEvent::Succeeded {
                    width: image.width,
                    height: image.height,
                });
                // The natural size replaces the skeleton height
                self.repack();
                None
            }
            Err(e) => {
                tile.apply(TileEvent::FetchFailed {
                    max_attempts: self.settings.policy.max_attempts,
                });
                match tile.state {
                    TileState::Failed {
                        attempt,
                        terminal: false,
                    } => Some(RetryTicket {
                        generation: self.generation,
                        tile: report.tile,
                        attempt,
                        delay: self.settings.policy.backoff(attempt),
                    }),
                    _ => {
                        log::warn!("⚠️  {} ({})", e, tile.photo.uri);
                        None
                    }
                }
            }
        }
    }

    /// A backoff elapsed: re-enter loading
    pub fn retry(&mut self, ticket: &RetryTicket) -> Option<LoadTicket> {
        if ticket.generation != self.generation {
            return None;
        }

        let tile = self.tiles.get_mut(ticket.tile)?;
        if !tile.apply(TileEvent::Retry) {
            return None;
        }

        let TileState::Loading { attempt } = tile.state else {
            return None;
        };
        Some(LoadTicket {
            generation: self.generation,
            tile: ticket.tile,
            uri: tile.photo.uri.clone(),
            attempt,
        })
    }

    /// Tear the view down. Later reports for this generation find no tiles.
    pub fn close(&mut self) {
        self.observer.reset();
        self.sentinel.reset();
        self.tiles.clear();
        self.layout = MasonryLayout::default();
        log::info!("Closed grid view #{}", self.generation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GalleryError;
    use crate::grid::scheduler::LoadedImage;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use std::time::Duration;

    fn photos(count: usize) -> Vec<PhotoRef> {
        (0..count)
            .map(|i| PhotoRef {
                collection_name: "A".to_string(),
                filename: format!("{}.jpg", i),
                uri: format!("A/{}.jpg", i),
            })
            .collect()
    }

    fn settings() -> GridSettings {
        GridSettings {
            column_width: 100.0,
            gutter: 10.0,
            batch_size: 20,
            tile_margin: 0.0,
            trailing_margin: 100.0,
            policy: RetryPolicy::default(),
        }
    }

    /// 3 columns of 100px; placeholders are 75px tall, so rows are 85px apart
    fn grid(count: usize) -> GridController {
        GridController::new(1, photos(count), settings(), 330.0)
    }

    fn report(ticket: &LoadTicket, ok: bool) -> AttemptReport {
        let result = if ok {
            Ok(LoadedImage {
                uri: ticket.uri.clone(),
                bytes: Arc::new(Vec::new()),
                width: 100,
                height: 200,
            })
        } else {
            Err(GalleryError::ImageLoadFailed {
                uri: ticket.uri.clone(),
                attempt: ticket.attempt,
                terminal: false,
            })
        };
        AttemptReport {
            generation: ticket.generation,
            tile: ticket.tile,
            attempt: ticket.attempt,
            result,
        }
    }

    #[test]
    fn test_open_dispatches_visible_tiles_only() {
        let mut grid = grid(120);
        let tickets = grid.open(200.0);

        // Rows at 0, 85 and 170 are visible
        let ids: Vec<TileId> = tickets.iter().map(|t| t.tile).collect();
        assert_eq!(ids, (0..9).collect::<Vec<_>>());
        assert_eq!(grid.tiles().len(), 20);
        assert!(!grid.is_watching(0));
        assert!(grid.is_watching(9));
        assert_eq!(grid.tile(0).unwrap().state, TileState::Loading { attempt: 1 });
        assert_eq!(grid.tile(9).unwrap().state, TileState::Observed);
    }

    #[test]
    fn test_rescan_never_redispatches() {
        let mut grid = grid(120);
        let first = grid.open(200.0);
        let again = grid.set_viewport(Viewport::new(0.0, 200.0));
        assert!(again.is_empty());

        let scrolled = grid.set_viewport(Viewport::new(100.0, 200.0));
        for ticket in &scrolled {
            assert!(first.iter().all(|t| t.tile != ticket.tile));
        }
        assert!(!scrolled.is_empty());
    }

    #[test]
    fn test_scrolling_to_the_end_appends_all_batches() {
        let mut grid = grid(120);
        grid.open(200.0);
        assert_eq!(grid.cursor().rendered_count, 20);

        let mut previous = 20;
        let mut batches = 1;
        while grid.cursor().rendered_count < 120 {
            let bottom = grid.layout().content_height;
            grid.set_viewport(Viewport::new(bottom - 200.0, 200.0));
            let rendered = grid.cursor().rendered_count;
            assert!(rendered > previous);
            assert!(rendered <= 120);
            batches += (rendered - previous) / 20;
            previous = rendered;
        }

        assert_eq!(batches, 6);
        assert_eq!(grid.tiles().len(), 120);
        // Further scrolling is a no-op for the renderer
        let bottom = grid.layout().content_height;
        grid.set_viewport(Viewport::new(bottom, 200.0));
        assert_eq!(grid.cursor().rendered_count, 120);
    }

    #[test]
    fn test_failures_back_off_then_give_up() {
        let mut grid = grid(3);
        let mut ticket = grid.open(200.0).remove(0);
        let mut delays = Vec::new();

        loop {
            match grid.apply(&report(&ticket, false)) {
                Some(retry) => {
                    delays.push(retry.delay);
                    assert!(matches!(
                        grid.tile(0).unwrap().state,
                        TileState::Failed { terminal: false, .. }
                    ));
                    ticket = grid.retry(&retry).unwrap();
                }
                None => break,
            }
        }

        assert_eq!(
            delays,
            vec![Duration::from_millis(2000), Duration::from_millis(4000)]
        );
        assert_eq!(ticket.attempt, 3);
        assert!(grid.tile(0).unwrap().is_degraded());
    }

    #[test]
    fn test_load_repacks_with_natural_size() {
        let mut grid = grid(3);
        let tickets = grid.open(200.0);
        assert_eq!(grid.layout().content_height, 75.0);

        grid.apply(&report(&tickets[1], true));
        assert_eq!(grid.tile(1).unwrap().state, TileState::Loaded);
        assert_eq!(grid.layout().content_height, 200.0);

        let packed = grid.layout().clone();
        grid.repack();
        assert_eq!(grid.layout(), &packed);
    }

    #[test]
    fn test_zero_sized_columns_from_config_still_render() {
        let config = ViewerConfig {
            column_width: 0.0,
            gutter: -4.0,
            ..ViewerConfig::default()
        };
        let settings = GridSettings::from_config(&config);
        assert_eq!(settings.column_width, 1.0);
        assert_eq!(settings.gutter, 0.0);

        let mut grid = GridController::new(1, photos(40), settings, 1248.0);
        grid.open(800.0);

        // One pixel columns: every tile sits in the first row
        assert_eq!(grid.masonry().num_columns, 1248);
        assert_eq!(grid.tiles().len(), 40);
    }

    #[test]
    fn test_new_view_starts_at_the_top() {
        let mut old = grid(120);
        old.open(200.0);
        old.set_viewport(Viewport::new(2000.0, 200.0));
        assert_eq!(old.viewport().top, 2000.0);
        old.close();

        let mut fresh = GridController::new(2, photos(120), settings(), 330.0);
        let tickets = fresh.open(200.0);

        assert_eq!(fresh.viewport(), Viewport::new(0.0, 200.0));
        let ids: Vec<TileId> = tickets.iter().map(|t| t.tile).collect();
        assert_eq!(ids, (0..9).collect::<Vec<_>>());
        assert_eq!(fresh.cursor().rendered_count, 20);
    }

    #[test]
    fn test_reports_from_closed_view_are_dropped() {
        let mut old = grid(3);
        let ticket = old.open(200.0).remove(0);
        old.close();
        assert!(old.apply(&report(&ticket, true)).is_none());

        let mut fresh = GridController::new(2, photos(3), settings(), 330.0);
        fresh.open(200.0);
        assert!(fresh.apply(&report(&ticket, true)).is_none());
        assert_eq!(fresh.tile(0).unwrap().state, TileState::Loading { attempt: 1 });
    }
}
