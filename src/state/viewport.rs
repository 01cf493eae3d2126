//! Viewport - Fixed-Height Row Window Math

use std::ops::Range;

use crate::constants::{DEFAULT_OVERSCAN, DEFAULT_ROW_HEIGHT, DEFAULT_VIEWPORT_ROWS};

/// Geometry of a fixed-row-height list viewport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    /// Row height in pixels
    pub row_height: u32,
    /// Viewport height in pixels
    pub height: u32,
    /// Rows bound beyond each edge
    pub overscan: usize,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            row_height: DEFAULT_ROW_HEIGHT,
            height: DEFAULT_ROW_HEIGHT * DEFAULT_VIEWPORT_ROWS as u32,
            overscan: DEFAULT_OVERSCAN,
        }
    }
}

impl Viewport {
    pub fn new(row_height: u32, height: u32, overscan: usize) -> Self {
        Self {
            row_height: row_height.max(1),
            height,
            overscan,
        }
    }

    /// A viewport exactly `rows` rows tall, capped at `u32::MAX` pixels
    pub fn with_rows(row_height: u32, rows: usize, overscan: usize) -> Self {
        let rows = u32::try_from(rows).unwrap_or(u32::MAX);
        Self::new(row_height, row_height.max(1).saturating_mul(rows), overscan)
    }

    /// Total scrollable height
    pub fn content_height(&self, row_count: usize) -> u64 {
        (row_count as u64).saturating_mul(self.row_height as u64)
    }

    /// Largest meaningful scroll offset
    pub fn max_offset(&self, row_count: usize) -> u64 {
        self.content_height(row_count)
            .saturating_sub(self.height as u64)
    }

    /// Rows intersecting the viewport, without overscan
    pub fn visible(&self, scroll_offset: u64, row_count: usize) -> Range<usize> {
        if row_count == 0 {
            return 0..0;
        }
        let row_height = self.row_height as u64;
        let offset = scroll_offset.min(self.max_offset(row_count));
        let first = (offset / row_height) as usize;
        let last = offset.saturating_add(self.height as u64).div_ceil(row_height) as usize;
        first.min(row_count)..last.min(row_count)
    }

    /// Rows to keep bound: the visible rows plus overscan on both sides
    pub fn range(&self, scroll_offset: u64, row_count: usize) -> Range<usize> {
        let visible = self.visible(scroll_offset, row_count);
        let start = visible.start.saturating_sub(self.overscan);
        let end = visible.end.saturating_add(self.overscan).min(row_count);
        start..end
    }

    /// Scroll offset that centers `index` in the viewport
    pub fn offset_centering(&self, index: usize, row_count: usize) -> u64 {
        let row_height = self.row_height as u64;
        let center = (index as u64)
            .saturating_mul(row_height)
            .saturating_add(row_height / 2);
        center
            .saturating_sub(self.height as u64 / 2)
            .min(self.max_offset(row_count))
    }
}
