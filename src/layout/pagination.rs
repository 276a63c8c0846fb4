//! Height-based pagination of the content flow

use serde::Serialize;

/// Boundary in flow space where `page_number` ends and the next page begins
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageBreak {
    /// Page ending at this break (1-based)
    pub page_number: usize,
    /// Offset from the top of the content flow
    pub height_from_top: f32,
}

/// Result of paginating one content-height measurement
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationState {
    pub page_breaks: Vec<PageBreak>,
    pub total_pages: usize,
    /// Measured height after coercion
    pub content_height: f32,
    /// Number of recomputations that produced this state
    pub generation: u64,
}

impl Default for PaginationState {
    fn default() -> Self {
        Self {
            page_breaks: Vec::new(),
            total_pages: 1,
            content_height: 0.0,
            generation: 0,
        }
    }
}

impl PaginationState {
    /// Break ending the given page, if any
    pub fn break_after(&self, page_number: usize) -> Option<&PageBreak> {
        self.page_breaks
            .iter()
            .find(|b| b.page_number == page_number)
    }
}

/// Coerce a raw measurement into a usable height
pub fn sanitize_height(height: f32) -> f32 {
    if height.is_finite() && height > 0.0 {
        height
    } else {
        0.0
    }
}

/// Upper bound on the page count of one pagination.
///
/// Heights beyond `MAX_PAGES` pages are clamped, which keeps the break list
/// bounded for any finite measurement.
pub const MAX_PAGES: usize = 100_000;

/// Split a content flow of `content_height` into pages of `page_height`.
///
/// Breaks are emitted strictly below the measured height, so content that
/// exactly fills its last page gets no trailing break. A non-positive or
/// non-finite `page_height` has no pages to split into and yields the
/// single-page state.
pub fn paginate(content_height: f32, page_height: f32) -> PaginationState {
    if !(page_height.is_finite() && page_height > 0.0) {
        log::warn!("refusing to paginate with unit {page_height}");
        return PaginationState::default();
    }

    let height = sanitize_height(content_height).min(MAX_PAGES as f32 * page_height);
    let total_pages = ((height / page_height).ceil() as usize).clamp(1, MAX_PAGES);

    let mut page_breaks = Vec::with_capacity(total_pages - 1);
    for page_number in 1..total_pages {
        let offset = page_number as f32 * page_height;
        if offset >= height {
            break;
        }
        page_breaks.push(PageBreak {
            page_number,
            height_from_top: offset,
        });
    }

    PaginationState {
        page_breaks,
        total_pages,
        content_height: height,
        generation: 0,
    }
}
