//! Mapping between flow space and paged space
//!
//! Flow space is the single continuous content column. Paged space stacks
//! one content-sized rectangle per page with a fixed gap between them.

use crate::Rect;
use std::ops::RangeInclusive;

/// Coordinate mapping for one pagination unit and inter-page gap
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpaceMapping {
    /// Content height of one page (the pagination unit)
    pub page_height: f32,
    /// Gap between stacked pages in paged space
    pub page_gap: f32,
}

impl SpaceMapping {
    pub fn new(page_height: f32, page_gap: f32) -> Self {
        Self {
            page_height,
            page_gap: page_gap.max(0.0),
        }
    }

    /// Distance between the tops of consecutive pages in paged space
    pub fn page_stride(&self) -> f32 {
        self.page_height + self.page_gap
    }

    /// Page index containing a flow offset
    pub fn page_index_for_flow_offset(&self, y: f32, total_pages: usize) -> usize {
        let last = total_pages.saturating_sub(1);
        if y.is_nan() || y <= 0.0 {
            return 0;
        }
        ((y / self.page_height).floor() as usize).min(last)
    }

    /// Top of a page in paged space
    pub fn paged_offset_for_page(&self, page_index: usize) -> f32 {
        page_index as f32 * self.page_stride()
    }

    /// Paged-space position of a flow offset
    pub fn flow_to_paged(&self, y: f32, total_pages: usize) -> f32 {
        let page_index = self.page_index_for_flow_offset(y, total_pages);
        let within_page = y.max(0.0) - page_index as f32 * self.page_height;
        self.paged_offset_for_page(page_index) + within_page
    }

    /// Pages whose paged-space rectangles intersect the viewport
    pub fn page_range_in_viewport(
        &self,
        viewport: &Rect,
        total_pages: usize,
    ) -> Option<RangeInclusive<usize>> {
        if total_pages == 0 || viewport.height < 0.0 {
            return None;
        }

        let stride = self.page_stride();
        let top = viewport.y.max(0.0);
        let bottom = viewport.y + viewport.height;
        if bottom < 0.0 {
            return None;
        }

        let first = (top / stride).floor() as usize;
        if first >= total_pages {
            return None;
        }
        // Viewport top may sit in the gap below `first`
        let first = if top > self.paged_offset_for_page(first) + self.page_height {
            first + 1
        } else {
            first
        };
        let last = ((bottom / stride).floor() as usize).min(total_pages - 1);

        if first > last {
            None
        } else {
            Some(first..=last)
        }
    }
}
