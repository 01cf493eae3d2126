//! VirtualList - Recycled Row Bindings over a Scroll Window
//!
//! Only the rows inside the viewport (plus overscan) have a binding. Slot
//! `k` always shows index `window.start + k`, so scrolling re-targets the
//! existing bindings rather than creating new ones.

use std::ops::Range;
use tokio::sync::watch;

use super::row_binding::{RowBinding, RowDisplay, RowProps, RowRequest, RowUpdate};
use super::row_cache::{PageSource, RowCache};
use super::viewport::Viewport;

/// A binding's request tagged with its slot
#[derive(Debug)]
pub struct SlotRequest {
    pub slot: usize,
    pub request: RowRequest,
}

impl SlotRequest {
    pub async fn resolve(self) -> SlotUpdate {
        SlotUpdate {
            slot: self.slot,
            update: self.request.resolve().await,
        }
    }
}

/// A resolved request on its way back to its slot
#[derive(Debug)]
pub struct SlotUpdate {
    pub slot: usize,
    pub update: RowUpdate,
}

/// Virtualized list of ladder rows
pub struct VirtualList<S> {
    cache: RowCache<S>,
    viewport: Viewport,
    generation: watch::Receiver<u64>,
    row_count: usize,
    scroll_offset: u64,
    is_scrolling: bool,
    highlight_rank: Option<u64>,
    window: Range<usize>,
    slots: Vec<RowBinding<S>>,
}

impl<S: PageSource> VirtualList<S> {
    pub fn new(cache: RowCache<S>, viewport: Viewport, row_count: usize) -> Self {
        let generation = cache.subscribe();
        Self {
            cache,
            viewport,
            generation,
            row_count,
            scroll_offset: 0,
            is_scrolling: false,
            highlight_rank: None,
            window: 0..0,
            slots: Vec::new(),
        }
    }

    /// Highlight set before the first layout
    pub fn with_highlight(mut self, rank: Option<u64>) -> Self {
        self.highlight_rank = rank;
        self
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn scroll_offset(&self) -> u64 {
        self.scroll_offset
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Indices that currently have a binding
    pub fn window(&self) -> Range<usize> {
        self.window.clone()
    }

    /// Indices actually on screen
    pub fn visible(&self) -> Range<usize> {
        self.viewport.visible(self.scroll_offset, self.row_count)
    }

    /// Move the scroll position
    pub fn scroll_to(&mut self, offset: u64, is_scrolling: bool) -> Vec<SlotRequest> {
        self.scroll_offset = offset.min(self.viewport.max_offset(self.row_count));
        self.is_scrolling = is_scrolling;
        self.layout()
    }

    /// Centre a row and stop scrolling
    pub fn scroll_to_index(&mut self, index: usize) -> Vec<SlotRequest> {
        let offset = self.viewport.offset_centering(index, self.row_count);
        self.scroll_to(offset, false)
    }

    pub fn set_scrolling(&mut self, is_scrolling: bool) -> Vec<SlotRequest> {
        self.is_scrolling = is_scrolling;
        self.layout()
    }

    pub fn set_row_count(&mut self, row_count: usize) -> Vec<SlotRequest> {
        self.row_count = row_count;
        self.scroll_offset = self
            .scroll_offset
            .min(self.viewport.max_offset(row_count));
        self.layout()
    }

    pub fn set_highlight(&mut self, rank: Option<u64>) -> Vec<SlotRequest> {
        self.highlight_rank = rank;
        self.layout()
    }

    /// Re-sync with the cache, picking up any invalidation since last layout
    pub fn refresh(&mut self) -> Vec<SlotRequest> {
        self.layout()
    }

    /// Route a resolved request back to its slot
    pub fn apply(&mut self, update: SlotUpdate) -> bool {
        match self.slots.get_mut(update.slot) {
            Some(binding) => binding.apply(update.update),
            None => false,
        }
    }

    /// Render models for the on-screen rows
    pub fn rows(&self) -> Vec<RowDisplay> {
        let visible = self.visible();
        self.slots
            .iter()
            .map(RowBinding::display)
            .filter(|row| visible.contains(&row.index))
            .collect()
    }

    /// Render models for every bound row, overscan included
    pub fn bound_rows(&self) -> Vec<RowDisplay> {
        self.slots.iter().map(RowBinding::display).collect()
    }

    fn layout(&mut self) -> Vec<SlotRequest> {
        let window = self.viewport.range(self.scroll_offset, self.row_count);
        let generation = *self.generation.borrow_and_update();
        let wanted = window.len();

        for binding in self.slots.iter_mut().skip(wanted) {
            binding.unmount();
        }
        self.slots.truncate(wanted);

        let mut requests = Vec::new();
        for slot in 0..wanted {
            let props = RowProps {
                index: window.start + slot,
                is_scrolling: self.is_scrolling,
                highlight_rank: self.highlight_rank,
                invalidation_count: generation,
            };

            let request = match self.slots.get_mut(slot) {
                Some(binding) => binding.update(props),
                None => {
                    let (binding, request) = RowBinding::mount(self.cache.clone(), props);
                    self.slots.push(binding);
                    request
                }
            };
            if let Some(request) = request {
                requests.push(SlotRequest { slot, request });
            }
        }

        self.window = window;
        requests
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LadderId;
    use crate::services::LadderPlayers;
    use crate::state::row_binding::RowPhase;
    use crate::state::testing::FakeLadderApi;
    use std::sync::Arc;

    type List = VirtualList<LadderPlayers<FakeLadderApi>>;

    fn list(api: &Arc<FakeLadderApi>, rows: usize) -> List {
        let cache = RowCache::new(LadderPlayers::new(Arc::clone(api), LadderId(1)), 20);
        VirtualList::new(cache, Viewport::with_rows(30, 10, 5), rows)
    }

    async fn settle(list: &mut List, requests: Vec<SlotRequest>) {
        let updates = futures::future::join_all(requests.into_iter().map(SlotRequest::resolve)).await;
        for update in updates {
            list.apply(update);
        }
    }

    #[tokio::test]
    async fn test_initial_layout_fetches_first_page() {
        let api = Arc::new(FakeLadderApi::new(100));
        let mut list = list(&api, 100);

        let requests = list.refresh();
        assert_eq!(list.window(), 0..15);
        assert_eq!(requests.len(), 15);
        assert_eq!(api.page_calls(), vec![1]);

        settle(&mut list, requests).await;
        let rows = list.rows();
        assert_eq!(rows.len(), 10);
        assert!(rows.iter().all(|r| r.phase == RowPhase::Loaded));
        assert_eq!(rows[0].username.as_deref(), Some("player0.v0"));
    }

    #[tokio::test]
    async fn test_fast_scroll_does_not_fetch() {
        let api = Arc::new(FakeLadderApi::new(1000));
        let mut list = list(&api, 1000);
        let requests = list.refresh();
        settle(&mut list, requests).await;

        let requests = list.scroll_to(9000, true);
        assert!(requests.is_empty());
        assert_eq!(api.page_calls(), vec![1]);
        assert!(list.rows().iter().all(|r| r.username.is_none()));

        let requests = list.set_scrolling(false);
        assert!(!requests.is_empty());
        settle(&mut list, requests).await;
        let rows = list.rows();
        assert_eq!(rows[0].index, 300);
        assert_eq!(rows[0].username.as_deref(), Some("player300.v0"));
    }

    #[tokio::test]
    async fn test_invalidation_resyncs_slots() {
        let api = Arc::new(FakeLadderApi::new(100));
        let mut list = list(&api, 100);
        let requests = list.refresh();
        settle(&mut list, requests).await;

        list.cache.invalidate();
        let requests = list.refresh();
        assert_eq!(requests.len(), 15);
        assert!(list.rows().iter().all(|r| r.phase == RowPhase::Loading));
        settle(&mut list, requests).await;
        assert_eq!(api.page_calls(), vec![1, 1]);
    }

    #[tokio::test]
    async fn test_scroll_to_index_and_highlight() {
        let api = Arc::new(FakeLadderApi::new(100));
        let mut list = list(&api, 100);

        let requests = list.scroll_to_index(50);
        settle(&mut list, requests).await;
        assert!(list.visible().contains(&50));
        assert!(list.set_highlight(Some(51)).is_empty());

        let highlighted: Vec<usize> = list
            .rows()
            .iter()
            .filter(|r| r.highlighted)
            .map(|r| r.index)
            .collect();
        assert_eq!(highlighted, vec![50]);
    }

    #[tokio::test]
    async fn test_shrinking_row_count_drops_slots() {
        let api = Arc::new(FakeLadderApi::new(100));
        let mut list = list(&api, 100);
        let stale = list.refresh();

        let requests = list.set_row_count(3);
        assert!(requests.is_empty());
        assert_eq!(list.window(), 0..3);

        for request in stale {
            let update = request.resolve().await;
            let slot = update.slot;
            assert_eq!(list.apply(update), slot < 3);
        }
        assert_eq!(list.bound_rows().len(), 3);
    }
}
