//! State - Ladder View State
//!
//! The row cache and everything layered on it, from the single display
//! slot up to the whole ladder view.
//!
//! ```text
//! LadderView ──owns──► RowCache ◄──handle── RowBinding (per slot)
//!      │                                         ▲
//!      └──builds──► VirtualList ──recycles───────┘
//! ```

pub mod ladder_view;
pub mod row_binding;
pub mod row_cache;
pub mod viewport;
pub mod virtual_list;

#[cfg(test)]
pub(crate) mod testing;

pub use ladder_view::{LadderCache, LadderView};
pub use row_binding::{RowBinding, RowDisplay, RowPhase, RowProps, RowRequest, RowUpdate};
pub use row_cache::{Load, PageSource, RowCache, RowFuture};
pub use viewport::Viewport;
pub use virtual_list::{SlotRequest, SlotUpdate, VirtualList};
