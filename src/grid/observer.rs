/// Viewport observer
///
/// Geometry-based replacement for intersection observation. Keys are watched
/// until their box comes within `margin` of the visible area; they are then
/// reported once and unregistered. A key that was reported is never watched
/// again, so re-scanning after new tiles are appended cannot re-notify it.
use std::collections::{BTreeSet, HashSet};
use std::hash::Hash;

/// Visible part of the scrollable content
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    /// Scroll offset from the top of the content
    pub top: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(top: f32, height: f32) -> Self {
        Self { top, height }
    }

    /// Does `[top, bottom)` come within `margin` of the visible area?
    pub fn is_near(&self, span: Span, margin: f32) -> bool {
        let near_top = self.top - margin;
        let near_bottom = self.top + self.height + margin;
        span.bottom >= near_top && span.top <= near_bottom
    }
}

/// Vertical extent of an item
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Span {
    pub top: f32,
    pub bottom: f32,
}

pub struct ViewportObserver<K> {
    margin: f32,
    watched: BTreeSet<K>,
    dispatched: HashSet<K>,
}

impl<K: Copy + Ord + Hash> ViewportObserver<K> {
    pub fn new(margin: f32) -> Self {
        Self {
            margin,
            watched: BTreeSet::new(),
            dispatched: HashSet::new(),
        }
    }

    /// Start watching `key`. Returns `false` if it is already watched or was
    /// already reported.
    pub fn observe(&mut self, key: K) -> bool {
        if self.dispatched.contains(&key) {
            return false;
        }
        self.watched.insert(key)
    }

    /// Stop watching everything (the reported set is kept)
    pub fn disconnect(&mut self) {
        self.watched.clear();
    }

    /// Forget everything, used when the view is torn down
    pub fn reset(&mut self) {
        self.watched.clear();
        self.dispatched.clear();
    }

    pub fn is_watching(&self, key: K) -> bool {
        self.watched.contains(&key)
    }

    pub fn watched_count(&self) -> usize {
        self.watched.len()
    }

    /// Report every watched key whose span is near the viewport, in key
    /// order, unregistering each before it is returned.
    pub fn scan<F>(&mut self, viewport: Viewport, span_of: F) -> Vec<K>
    where
        F: Fn(K) -> Option<Span>,
    {
        let entered: Vec<K> = self
            .watched
            .iter()
            .copied()
            .filter(|key| {
                span_of(*key)
                    .map(|span| viewport.is_near(span, self.margin))
                    .unwrap_or(false)
            })
            .collect();

        for key in &entered {
            self.watched.remove(key);
            self.dispatched.insert(*key);
        }

        entered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(top: f32) -> Option<Span> {
        Some(Span {
            top,
            bottom: top + 100.0,
        })
    }

    #[test]
    fn test_reports_within_margin_once() {
        let mut observer = ViewportObserver::new(50.0);
        for key in 0..5usize {
            observer.observe(key);
        }

        // Tiles at 0, 200, 400, ... ; viewport 0..300, margin 50 reaches 350
        let viewport = Viewport::new(0.0, 300.0);
        let entered = observer.scan(viewport, |k| span(k as f32 * 200.0));
        assert_eq!(entered, vec![0, 1]);

        // Same viewport again: nothing new
        assert!(observer.scan(viewport, |k| span(k as f32 * 200.0)).is_empty());
        assert_eq!(observer.watched_count(), 3);
    }

    #[test]
    fn test_reobserve_after_dispatch_is_ignored() {
        let mut observer = ViewportObserver::new(0.0);
        observer.observe(1usize);
        observer.scan(Viewport::new(0.0, 500.0), |k| span(k as f32 * 10.0));

        assert!(!observer.observe(1));
        assert!(observer.observe(2));
    }

    #[test]
    fn test_margin_reaches_below_the_fold() {
        let viewport = Viewport::new(1000.0, 600.0);
        let below = Span {
            top: 1700.0,
            bottom: 1900.0,
        };
        assert!(!viewport.is_near(below, 50.0));
        assert!(viewport.is_near(below, 200.0));
    }
}
