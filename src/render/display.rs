//! Chrome layer: render-ready page decoration

use crate::layout::SpaceMapping;
use crate::{Point, Rect};
use serde::Serialize;
use smallvec::SmallVec;

/// A decoration drawn on one page, positioned in paged space
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ChromeItem {
    /// Page background behind the content area
    PageBackground { rect: Rect },
    /// Header text, `position` is the horizontal centre of its top edge
    Header { position: Point, text: String },
    /// Footer text, `position` is the horizontal centre of its bottom edge
    Footer { position: Point, text: String },
}

/// Page-break indicator in flow space
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakMarker {
    /// Flow-space y of the marker line
    pub y: f32,
    /// Page ending at this marker
    pub page_number: usize,
}

/// Decoration for a single page
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChromePage {
    pub page_index: usize,
    pub bounds: Rect,
    pub items: SmallVec<[ChromeItem; 3]>,
}

impl ChromePage {
    pub fn header(&self) -> Option<&str> {
        self.items.iter().find_map(|item| match item {
            ChromeItem::Header { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn footer(&self) -> Option<&str> {
        self.items.iter().find_map(|item| match item {
            ChromeItem::Footer { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn background(&self) -> Option<Rect> {
        self.items.iter().find_map(|item| match item {
            ChromeItem::PageBackground { rect } => Some(*rect),
            _ => None,
        })
    }
}

/// Complete decoration layer for the current pagination
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChromeLayer {
    /// Pagination generation this layer was built from
    pub generation: u64,
    pub pages: Vec<ChromePage>,
    pub break_markers: Vec<BreakMarker>,
}

impl ChromeLayer {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Total paged-space height, gaps between pages included
    pub fn paged_height(&self) -> f32 {
        self.pages
            .last()
            .map(|p| p.bounds.y + p.bounds.height)
            .unwrap_or(0.0)
    }

    /// Keep only what falls inside the viewport.
    ///
    /// The host scrolls flow and paged space together, so the same rectangle
    /// culls pages (paged space, through `mapping`) and markers (flow space).
    pub fn visible(&self, viewport: Rect, mapping: &SpaceMapping) -> ChromeLayer {
        let pages = mapping
            .page_range_in_viewport(&viewport, self.pages.len())
            .map(|range| self.pages[range].to_vec())
            .unwrap_or_default();

        let bottom = viewport.y + viewport.height;
        ChromeLayer {
            generation: self.generation,
            pages,
            break_markers: self
                .break_markers
                .iter()
                .filter(|m| m.y >= viewport.y && m.y <= bottom)
                .copied()
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    fn page(index: usize, y: f32) -> ChromePage {
        let bounds = Rect::new(0.0, y, 624.0, 864.0);
        ChromePage {
            page_index: index,
            bounds,
            items: smallvec![
                ChromeItem::PageBackground { rect: bounds },
                ChromeItem::Footer {
                    position: Point { x: 312.0, y: y + 840.0 },
                    text: format!("Page {}", index + 1),
                },
            ],
        }
    }

    #[test]
    fn test_page_accessors() {
        let p = page(1, 888.0);
        assert_eq!(p.header(), None);
        assert_eq!(p.footer(), Some("Page 2"));
        assert_eq!(p.background(), Some(Rect::new(0.0, 888.0, 624.0, 864.0)));
    }

    #[test]
    fn test_visible_culls_pages_and_markers() {
        let layer = ChromeLayer {
            generation: 3,
            pages: vec![page(0, 0.0), page(1, 888.0), page(2, 1776.0)],
            break_markers: vec![
                BreakMarker { y: 960.0, page_number: 1 },
                BreakMarker { y: 1824.0, page_number: 2 },
            ],
        };

        let mapping = SpaceMapping::new(864.0, 24.0);
        let visible = layer.visible(Rect::new(0.0, 900.0, 816.0, 500.0), &mapping);
        assert_eq!(visible.generation, 3);
        assert_eq!(visible.pages.len(), 1);
        assert_eq!(visible.pages[0].page_index, 1);
        assert_eq!(visible.break_markers, vec![BreakMarker { y: 960.0, page_number: 1 }]);

        assert_eq!(layer.paged_height(), 1776.0 + 864.0);
    }
}
