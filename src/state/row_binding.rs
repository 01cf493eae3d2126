//! RowBinding - One Display Slot of the Virtualized Ladder
//!
//! A binding shows the row at its current index. The same binding is
//! re-targeted at other indices as the list scrolls, so every request it
//! issues carries a ticket; a resolved request is committed only while its
//! ticket is still the binding's latest one.
//!
//! ## Phases
//!
//! ```text
//!            sync (fetch pending)          apply (row)
//! Unloaded ───────────────────────► Loading ───────────► Loaded
//!    ▲                                 │                   │
//!    └──── apply (error / no row) ─────┘                   │
//!                                      ▲                   │
//!                                      └── index or generation changes
//! ```

use std::sync::Arc;
use tracing::debug;

use super::row_cache::{Load, PageSource, RowCache, RowFuture};
use crate::domain::LadderRow;
use crate::error::SharedError;

/// Loading phase of a binding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowPhase {
    Unloaded,
    Loading,
    Loaded,
}

/// Inputs the list hands to a binding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowProps {
    /// Row index the slot currently shows
    pub index: usize,
    /// Whether the list is being dragged/scrolled
    pub is_scrolling: bool,
    /// Rank to highlight (the viewer's, or an autocompleted player's)
    pub highlight_rank: Option<u64>,
    /// Cache generation the list last saw
    pub invalidation_count: u64,
}

impl RowProps {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            is_scrolling: false,
            highlight_rank: None,
            invalidation_count: 0,
        }
    }
}

/// A row lookup issued by a binding
pub struct RowRequest {
    ticket: u64,
    index: usize,
    future: RowFuture,
}

impl RowRequest {
    pub fn ticket(&self) -> u64 {
        self.ticket
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Wait for the row; the result goes back through [`RowBinding::apply`]
    pub async fn resolve(self) -> RowUpdate {
        RowUpdate {
            ticket: self.ticket,
            index: self.index,
            result: self.future.await,
        }
    }
}

impl std::fmt::Debug for RowRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowRequest")
            .field("ticket", &self.ticket)
            .field("index", &self.index)
            .finish()
    }
}

/// A resolved row lookup
#[derive(Debug)]
pub struct RowUpdate {
    pub ticket: u64,
    pub index: usize,
    pub result: Result<Option<Arc<LadderRow>>, SharedError>,
}

/// What a slot renders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowDisplay {
    pub index: usize,
    /// The row's rank, or `index + 1` while the row is not loaded
    pub rank: u64,
    pub username: Option<String>,
    pub outgoing: usize,
    pub incoming: usize,
    pub highlighted: bool,
    pub challengeable: bool,
    pub phase: RowPhase,
}

/// State of one display slot
pub struct RowBinding<S> {
    cache: RowCache<S>,
    props: RowProps,
    ticket: u64,
    phase: RowPhase,
    row: Option<Arc<LadderRow>>,
    mounted: bool,
}

impl<S: PageSource> RowBinding<S> {
    /// Create a binding and run its first sync
    pub fn mount(cache: RowCache<S>, props: RowProps) -> (Self, Option<RowRequest>) {
        let mut binding = Self {
            cache,
            props,
            ticket: 0,
            phase: RowPhase::Unloaded,
            row: None,
            mounted: true,
        };
        let request = binding.sync();
        (binding, request)
    }

    pub fn props(&self) -> &RowProps {
        &self.props
    }

    pub fn phase(&self) -> RowPhase {
        self.phase
    }

    pub fn row(&self) -> Option<&Arc<LadderRow>> {
        self.row.as_ref()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Whether moving to `next` changes what this slot renders
    pub fn should_render(&self, next: &RowProps) -> bool {
        next.index != self.props.index
            || next.is_scrolling != self.props.is_scrolling
            || next.highlight_rank != self.props.highlight_rank
            || next.invalidation_count != self.props.invalidation_count
    }

    /// Take new props; returns a request when the slot must look its row up
    pub fn update(&mut self, next: RowProps) -> Option<RowRequest> {
        let prev = std::mem::replace(&mut self.props, next);

        let retargeted = prev.index != next.index
            || prev.invalidation_count != next.invalidation_count;
        if retargeted {
            self.row = None;
            self.phase = RowPhase::Loading;
        }

        if retargeted || prev.is_scrolling != next.is_scrolling {
            self.sync()
        } else {
            None
        }
    }

    /// Look the current row up; cache-only while scrolling
    fn sync(&mut self) -> Option<RowRequest> {
        if !self.mounted {
            return None;
        }

        self.ticket += 1;
        let index = self.props.index;

        if self.props.is_scrolling {
            match self.cache.peek(index) {
                Some(row) => self.commit(row),
                None if self.row.is_none() => self.phase = RowPhase::Unloaded,
                None => {}
            }
            return None;
        }

        match self.cache.fetch(index) {
            Load::Ready(row) => {
                self.commit(row);
                None
            }
            Load::Pending(future) => {
                self.phase = RowPhase::Loading;
                Some(RowRequest {
                    ticket: self.ticket,
                    index,
                    future,
                })
            }
            Load::Missing => {
                self.phase = RowPhase::Unloaded;
                None
            }
        }
    }

    /// Commit a resolved lookup if it still belongs to this slot
    pub fn apply(&mut self, update: RowUpdate) -> bool {
        if !self.mounted || update.ticket != self.ticket || update.index != self.props.index {
            debug!(
                "Dropping row {} (ticket {}, slot now at {} ticket {})",
                update.index, update.ticket, self.props.index, self.ticket
            );
            return false;
        }

        match update.result {
            Ok(Some(row)) => self.commit(row),
            Ok(None) => {
                self.row = None;
                self.phase = RowPhase::Unloaded;
            }
            Err(err) => {
                debug!("Row {} not loaded: {}", update.index, err);
                self.row = None;
                self.phase = RowPhase::Unloaded;
            }
        }
        true
    }

    /// Stop committing results; later `apply` calls are ignored
    pub fn unmount(&mut self) {
        self.mounted = false;
        self.ticket += 1;
    }

    fn commit(&mut self, row: Arc<LadderRow>) {
        self.row = Some(row);
        self.phase = RowPhase::Loaded;
    }

    /// Render model for the slot
    pub fn display(&self) -> RowDisplay {
        let index = self.props.index;
        match &self.row {
            Some(row) => RowDisplay {
                index,
                rank: row.rank,
                username: Some(row.player.username.clone()),
                outgoing: row.outgoing_challenges.len(),
                incoming: row.incoming_challenges.len(),
                highlighted: self.props.highlight_rank == Some(row.rank),
                challengeable: !row.is_not_challengeable(),
                phase: self.phase,
            },
            None => RowDisplay {
                index,
                rank: index as u64 + 1,
                username: None,
                outgoing: 0,
                incoming: 0,
                highlighted: false,
                challengeable: true,
                phase: self.phase,
            },
        }
    }
}
