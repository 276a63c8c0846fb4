//! page-flow: pagination and export engine for continuous-flow documents
//!
//! This crate presents a single continuous content flow as fixed-size pages:
//! - Height-based pagination with debounced recomputation
//! - Per-page chrome (backgrounds, header, footer, page numbers)
//! - Diff-based chrome updates (only changed pages and markers are emitted)
//! - Export of one full-height capture into a multi-page PDF

pub mod config;
pub mod error;
pub mod export;
pub mod layout;
pub mod render;
pub mod schedule;
pub mod wasm;

// Re-export WASM types for direct use
pub use wasm::WasmPaginator;

// Re-export primary types
pub use config::PaginatorConfig;
pub use error::{CaptureError, ConfigError, ExportError};
pub use export::{
    DocumentWriter, ExportJob, ExportPipeline, ExportSettings, ExportTicket, ExportedDocument,
    PdfWriter, Rasterizer,
};
pub use layout::{
    paginate, ChangeSource, ContentHeightProvider, PageBreak, PageGeometry, PageSetup,
    PaginationEngine, PaginationState, PaginationUpdate, SpaceMapping,
};
pub use render::{
    BreakMarker, ChromeDiff, ChromeItem, ChromeLayer, ChromePage, ChromePatch, ChromeSettings,
    HeaderFooterConfig, PageChromeRenderer,
};
pub use schedule::{Clock, Debouncer, SystemClock, VirtualClock};

use serde::Serialize;

/// Layout coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

/// Layout rectangle
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }
}

/// The paginated view combining engine, chrome and export
pub struct Paginator<C: Clock = SystemClock> {
    config: PaginatorConfig,
    engine: PaginationEngine<C>,
    chrome: PageChromeRenderer,
    header_footer: HeaderFooterConfig,
    diff_engine: render::ChromeDiffEngine,
    export: ExportPipeline,
}

impl Paginator<SystemClock> {
    /// Create a paginator on the host clock
    pub fn new(config: PaginatorConfig) -> Result<Self, ConfigError> {
        Self::with_clock(config, SystemClock::new())
    }
}

impl<C: Clock> Paginator<C> {
    /// Create a paginator driven by the given clock.
    ///
    /// The configuration is validated first; settings without a positive
    /// content area are rejected.
    pub fn with_clock(config: PaginatorConfig, clock: C) -> Result<Self, ConfigError> {
        config.validate()?;
        let geometry = config.geometry();
        Ok(Self {
            engine: PaginationEngine::new(geometry, config.debounce(), clock)?,
            chrome: PageChromeRenderer::new(geometry, config.chrome),
            header_footer: HeaderFooterConfig::default(),
            diff_engine: render::ChromeDiffEngine::new(),
            export: ExportPipeline::new(geometry, config.export.clone()),
            config,
        })
    }

    pub fn config(&self) -> &PaginatorConfig {
        &self.config
    }

    pub fn geometry(&self) -> &PageGeometry {
        self.engine.geometry()
    }

    pub fn engine(&self) -> &PaginationEngine<C> {
        &self.engine
    }

    /// Current pagination result
    pub fn pagination(&self) -> &PaginationState {
        self.engine.state()
    }

    /// Get total page count
    pub fn page_count(&self) -> usize {
        self.engine.page_count()
    }

    pub fn mapping(&self) -> SpaceMapping {
        self.chrome.mapping()
    }

    /// Paged-space position of a flow offset under the current pagination
    pub fn flow_to_paged(&self, y: f32) -> f32 {
        self.mapping().flow_to_paged(y, self.page_count())
    }

    /// Forward a "height may have changed" notification
    pub fn notify(&mut self, source: ChangeSource) -> bool {
        self.engine.notify(source)
    }

    /// Run a due recomputation and return the chrome patches it causes
    pub fn poll<P>(&mut self, provider: &P) -> Option<ChromeDiff>
    where
        P: ContentHeightProvider + ?Sized,
    {
        self.engine.poll(provider)?;
        Some(self.refresh_chrome())
    }

    /// Recompute immediately (initial layout, explicit refresh)
    pub fn recalculate_now<P>(&mut self, provider: &P) -> Option<ChromeDiff>
    where
        P: ContentHeightProvider + ?Sized,
    {
        self.engine.recalculate_now(provider)?;
        Some(self.refresh_chrome())
    }

    pub fn header_footer(&self) -> &HeaderFooterConfig {
        &self.header_footer
    }

    /// Replace header/footer settings and re-render the chrome
    pub fn set_header_footer(&mut self, config: HeaderFooterConfig) -> ChromeDiff {
        self.header_footer = config;
        self.refresh_chrome()
    }

    /// Chrome layer for the current pagination
    pub fn chrome_layer(&self) -> ChromeLayer {
        self.chrome.render(self.engine.state(), &self.header_footer)
    }

    /// Chrome within a viewport
    pub fn visible_chrome(&self, viewport: Rect) -> ChromeLayer {
        self.chrome
            .render_visible(self.engine.state(), &self.header_footer, viewport)
    }

    /// Export pipeline for hosts that capture asynchronously
    pub fn export(&mut self) -> &mut ExportPipeline {
        &mut self.export
    }

    /// Capture and export synchronously
    pub fn export_with<R: Rasterizer + ?Sized>(
        &mut self,
        rasterizer: &mut R,
    ) -> error::Result<ExportedDocument> {
        self.export.run(rasterizer, None)
    }

    /// Stop reacting to notifications and cancel pending work
    pub fn teardown(&mut self) {
        self.engine.teardown();
    }

    fn refresh_chrome(&mut self) -> ChromeDiff {
        let layer = self.chrome.render(self.engine.state(), &self.header_footer);
        self.diff_engine.update(layer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::time::Duration;

    const P: f32 = 864.0;

    fn paginator() -> (Paginator<VirtualClock>, VirtualClock) {
        let clock = VirtualClock::new();
        (
            Paginator::with_clock(PaginatorConfig::default(), clock.clone()).unwrap(),
            clock,
        )
    }

    #[test]
    fn test_create_paginator() {
        let (paginator, _) = paginator();
        assert_eq!(paginator.page_count(), 1);
        assert_eq!(paginator.chrome_layer().page_count(), 1);
    }

    #[test]
    fn test_typing_burst_produces_one_chrome_update() {
        let (mut paginator, clock) = paginator();
        let height = Cell::new(0.0);
        paginator.recalculate_now(&height);

        for step in 1..=10 {
            height.set(step as f32 * 200.0);
            paginator.notify(ChangeSource::Content);
            clock.advance(Duration::from_millis(30));
            assert!(paginator.poll(&height).is_none());
        }

        clock.advance(Duration::from_millis(150));
        let diff = paginator.poll(&height).expect("chrome update");
        assert_eq!(paginator.page_count(), 3); // 2000px of content
        assert_eq!(diff.generation, 2);
        assert!(diff.has_patches());
    }

    #[test]
    fn test_header_footer_change_rerenders() {
        let (mut paginator, _) = paginator();
        paginator.recalculate_now(&(1.5 * P));

        let diff = paginator.set_header_footer(HeaderFooterConfig {
            header_text: "Draft".to_string(),
            footer_template: "Page {page} of 2".to_string(),
            show_page_numbers: false,
        });
        assert_eq!(diff.patch_count(), 4); // header + footer on each page

        let layer = paginator.chrome_layer();
        assert_eq!(layer.pages[1].footer(), Some("Page 2 of 2"));
    }

    #[test]
    fn test_constructor_rejects_margins_that_consume_the_page() {
        let config = PaginatorConfig {
            page: PageSetup {
                margin_in: 6.0,
                ..PageSetup::default()
            },
            ..PaginatorConfig::default()
        };
        let result = Paginator::with_clock(config, VirtualClock::new());
        assert!(matches!(result, Err(ConfigError::NonPositiveContent { .. })));
    }

    #[test]
    fn test_visible_chrome_follows_page_mapping() {
        let (mut paginator, _) = paginator();
        paginator.recalculate_now(&(6.0 * P));

        // Viewport starting inside the gap after page 1
        let layer = paginator.visible_chrome(Rect::new(0.0, 2.0 * P + 30.0, 624.0, 900.0));
        let indices: Vec<usize> = layer.pages.iter().map(|p| p.page_index).collect();
        assert_eq!(indices, vec![2]);
        assert_eq!(layer.pages[0].bounds.y, 2.0 * (P + 24.0));
    }

    #[test]
    fn test_flow_to_paged_uses_current_page_count() {
        let (mut paginator, _) = paginator();
        paginator.recalculate_now(&(2.5 * P));
        assert_eq!(paginator.flow_to_paged(P + 5.0), P + 24.0 + 5.0);
        // Offsets past the last page stay on it
        assert_eq!(paginator.flow_to_paged(4.0 * P), 2.0 * (P + 24.0) + 2.0 * P);
    }

    #[test]
    fn test_teardown_stops_updates() {
        let (mut paginator, clock) = paginator();
        paginator.notify(ChangeSource::Resize);
        paginator.teardown();
        clock.advance(Duration::from_secs(1));
        assert!(paginator.poll(&(5.0 * P)).is_none());
        assert!(!paginator.notify(ChangeSource::Content));
    }
}
