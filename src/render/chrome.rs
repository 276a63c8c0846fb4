//! Per-page chrome: backgrounds, header, footer and break markers

use crate::layout::{PageGeometry, PaginationState, SpaceMapping};
use crate::render::{BreakMarker, ChromeItem, ChromeLayer, ChromePage};
use crate::{Point, Rect};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Placeholder replaced by the 1-based page number in footer templates
pub const PAGE_PLACEHOLDER: &str = "{page}";

/// Header and footer text, owned by the document settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HeaderFooterConfig {
    pub header_text: String,
    pub footer_template: String,
    pub show_page_numbers: bool,
}

impl Default for HeaderFooterConfig {
    fn default() -> Self {
        Self {
            header_text: String::new(),
            footer_template: String::new(),
            show_page_numbers: true,
        }
    }
}

/// Visual spacing of the paged representation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChromeSettings {
    /// Gap between stacked pages
    pub page_gap_px: f32,
    /// Distance from the page top to the header
    pub header_offset_px: f32,
    /// Distance from the page bottom to the footer
    pub footer_offset_px: f32,
}

impl Default for ChromeSettings {
    fn default() -> Self {
        Self {
            page_gap_px: 24.0,
            header_offset_px: 16.0,
            footer_offset_px: 16.0,
        }
    }
}

/// Footer text for a 0-based page index.
///
/// A non-empty template wins over automatic numbering; a template without
/// the placeholder is rendered verbatim.
pub fn footer_text(config: &HeaderFooterConfig, page_index: usize) -> Option<String> {
    if !config.footer_template.is_empty() {
        let number = (page_index + 1).to_string();
        Some(config.footer_template.replace(PAGE_PLACEHOLDER, &number))
    } else if config.show_page_numbers {
        Some(format!("Page {}", page_index + 1))
    } else {
        None
    }
}

/// Builds the chrome layer for a pagination state
#[derive(Debug, Clone, Copy)]
pub struct PageChromeRenderer {
    geometry: PageGeometry,
    settings: ChromeSettings,
}

impl PageChromeRenderer {
    pub fn new(geometry: PageGeometry, settings: ChromeSettings) -> Self {
        Self { geometry, settings }
    }

    pub fn settings(&self) -> &ChromeSettings {
        &self.settings
    }

    pub fn mapping(&self) -> SpaceMapping {
        SpaceMapping::new(self.geometry.content_height_px, self.settings.page_gap_px)
    }

    pub fn render(&self, state: &PaginationState, config: &HeaderFooterConfig) -> ChromeLayer {
        ChromeLayer {
            generation: state.generation,
            pages: (0..state.total_pages)
                .map(|page_index| self.render_page(page_index, config))
                .collect(),
            break_markers: self.break_markers(state).collect(),
        }
    }

    /// Render only the pages and markers inside a viewport
    pub fn render_visible(
        &self,
        state: &PaginationState,
        config: &HeaderFooterConfig,
        viewport: Rect,
    ) -> ChromeLayer {
        let pages = self
            .mapping()
            .page_range_in_viewport(&viewport, state.total_pages)
            .map(|range| range.map(|i| self.render_page(i, config)).collect())
            .unwrap_or_default();

        let bottom = viewport.y + viewport.height;
        ChromeLayer {
            generation: state.generation,
            pages,
            break_markers: self
                .break_markers(state)
                .filter(|m| m.y >= viewport.y && m.y <= bottom)
                .collect(),
        }
    }

    fn render_page(&self, page_index: usize, config: &HeaderFooterConfig) -> ChromePage {
        let width = self.geometry.content_width_px;
        let height = self.geometry.content_height_px;
        let center_x = width / 2.0;

        let top = self.mapping().paged_offset_for_page(page_index);
        let bounds = Rect::new(0.0, top, width, height);

        let mut items: SmallVec<[ChromeItem; 3]> = SmallVec::new();
        items.push(ChromeItem::PageBackground { rect: bounds });

        if !config.header_text.is_empty() {
            items.push(ChromeItem::Header {
                position: Point {
                    x: center_x,
                    y: top + self.settings.header_offset_px,
                },
                text: config.header_text.clone(),
            });
        }

        if let Some(text) = footer_text(config, page_index) {
            items.push(ChromeItem::Footer {
                position: Point {
                    x: center_x,
                    y: top + height - self.settings.footer_offset_px,
                },
                text,
            });
        }

        ChromePage {
            page_index,
            bounds,
            items,
        }
    }

    /// Break markers in flow space, below the top margin
    fn break_markers<'a>(
        &self,
        state: &'a PaginationState,
    ) -> impl Iterator<Item = BreakMarker> + 'a {
        let margin = self.geometry.margin_px;
        state.page_breaks.iter().map(move |b| BreakMarker {
            y: b.height_from_top + margin,
            page_number: b.page_number,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::paginate;

    const P: f32 = 864.0;

    fn renderer() -> PageChromeRenderer {
        PageChromeRenderer::new(PageGeometry::default(), ChromeSettings::default())
    }

    fn config(header: &str, footer: &str, numbers: bool) -> HeaderFooterConfig {
        HeaderFooterConfig {
            header_text: header.to_string(),
            footer_template: footer.to_string(),
            show_page_numbers: numbers,
        }
    }

    #[test]
    fn test_footer_template_substitution() {
        let cfg = config("", "Page {page} of N", true);
        assert_eq!(footer_text(&cfg, 2), Some("Page 3 of N".to_string()));
    }

    #[test]
    fn test_footer_fallbacks() {
        assert_eq!(footer_text(&config("", "", true), 0), Some("Page 1".to_string()));
        assert_eq!(footer_text(&config("", "", false), 0), None);
    }

    #[test]
    fn test_footer_template_without_placeholder_is_literal() {
        let cfg = config("", "Confidential", true);
        assert_eq!(footer_text(&cfg, 4), Some("Confidential".to_string()));
    }

    #[test]
    fn test_footer_template_repeated_placeholder() {
        let cfg = config("", "{page}/{page}", false);
        assert_eq!(footer_text(&cfg, 9), Some("10/10".to_string()));
    }

    #[test]
    fn test_render_pages_in_paged_space() {
        let state = paginate(2.0 * P + 10.0, P);
        let layer = renderer().render(&state, &config("Report", "", true));

        assert_eq!(layer.page_count(), 3);
        for (i, page) in layer.pages.iter().enumerate() {
            assert_eq!(page.page_index, i);
            assert_eq!(
                page.background(),
                Some(Rect::new(0.0, i as f32 * (P + 24.0), 624.0, P))
            );
            assert_eq!(page.header(), Some("Report"));
            assert_eq!(page.footer(), Some(format!("Page {}", i + 1).as_str()));
        }

        match &layer.pages[1].items[1] {
            ChromeItem::Header { position, .. } => {
                assert_eq!(*position, Point { x: 312.0, y: P + 24.0 + 16.0 });
            }
            other => panic!("expected header, got {other:?}"),
        }
    }

    #[test]
    fn test_no_header_or_footer_items_when_disabled() {
        let state = paginate(10.0, P);
        let layer = renderer().render(&state, &config("", "", false));

        assert_eq!(layer.pages[0].items.len(), 1);
        assert_eq!(layer.pages[0].header(), None);
        assert_eq!(layer.pages[0].footer(), None);
    }

    #[test]
    fn test_break_markers_in_flow_space() {
        let state = paginate(3.0 * P, P);
        let layer = renderer().render(&state, &HeaderFooterConfig::default());

        assert_eq!(
            layer.break_markers,
            vec![
                BreakMarker { y: P + 96.0, page_number: 1 },
                BreakMarker { y: 2.0 * P + 96.0, page_number: 2 },
            ]
        );
    }

    #[test]
    fn test_render_visible_matches_culled_full_render() {
        let renderer = renderer();
        let state = paginate(10.0 * P, P);
        let config = config("Report", "", true);
        let full = renderer.render(&state, &config);

        for y in [0.0, 870.0, 3000.0, 8500.0, 20_000.0] {
            let viewport = Rect::new(0.0, y, 624.0, 1200.0);
            let visible = renderer.render_visible(&state, &config, viewport);
            assert_eq!(visible, full.visible(viewport, &renderer.mapping()), "viewport at {y}");
        }

        let visible = renderer.render_visible(&state, &config, Rect::new(0.0, 3000.0, 624.0, 1200.0));
        let indices: Vec<usize> = visible.pages.iter().map(|p| p.page_index).collect();
        assert_eq!(indices, vec![3, 4]); // stride 888: pages 3 and 4 cover 2664..4416
    }

    #[test]
    fn test_render_carries_generation() {
        let mut state = paginate(10.0, P);
        state.generation = 7;
        assert_eq!(renderer().render(&state, &HeaderFooterConfig::default()).generation, 7);
    }
}
