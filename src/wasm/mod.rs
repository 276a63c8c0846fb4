//! WASM bindings for the paginator

pub mod flat_buffer;

use crate::export::{image_from_rgba, ExportTicket};
use crate::{
    ChangeSource, ChromeDiff, ContentHeightProvider, HeaderFooterConfig, Paginator,
    PaginatorConfig, Rect,
};
use flat_buffer::ChromeBuffer;
use wasm_bindgen::prelude::*;

/// Initialize panic hook for better error messages
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Height provider backed by a JS measuring callback
struct JsHeightProvider<'a> {
    measure: &'a js_sys::Function,
}

impl ContentHeightProvider for JsHeightProvider<'_> {
    fn content_height(&self) -> Option<f32> {
        let value = self.measure.call0(&JsValue::NULL).ok()?;
        value.as_f64().map(|h| h as f32)
    }
}

/// WASM-exposed paginator wrapper
#[wasm_bindgen]
pub struct WasmPaginator {
    paginator: Paginator,
    measure: js_sys::Function,
    buffer: ChromeBuffer,
    // Patches not yet taken by the host, oldest first
    pending_diff: ChromeDiff,
    export_ticket: Option<ExportTicket>,
}

impl WasmPaginator {
    fn build(config: PaginatorConfig, measure: js_sys::Function) -> Result<Self, JsError> {
        let mut paginator = Paginator::new(config)?;
        // Initial layout on mount
        let initial = paginator.recalculate_now(&JsHeightProvider { measure: &measure });

        Ok(Self {
            paginator,
            measure,
            buffer: ChromeBuffer::new(),
            pending_diff: initial.unwrap_or_default(),
            export_ticket: None,
        })
    }

    fn queue(&mut self, diff: ChromeDiff) -> bool {
        let changed = diff.has_patches();
        self.pending_diff.merge(diff);
        changed
    }
}

#[wasm_bindgen]
impl WasmPaginator {
    /// Create a paginator with default settings (US Letter, 1" margins, 96 DPI).
    /// `measure` returns the current content height in pixels.
    #[wasm_bindgen(constructor)]
    pub fn new(measure: js_sys::Function) -> Result<WasmPaginator, JsError> {
        Self::build(PaginatorConfig::default(), measure)
    }

    /// Create a paginator from a JSON configuration
    #[wasm_bindgen(js_name = withConfig)]
    pub fn with_config(config_json: &str, measure: js_sys::Function) -> Result<WasmPaginator, JsError> {
        let config = PaginatorConfig::from_json(config_json)?;
        Self::build(config, measure)
    }

    /// Editing surface reported a content change
    #[wasm_bindgen(js_name = notifyContentChanged)]
    pub fn notify_content_changed(&mut self) -> bool {
        self.paginator.notify(ChangeSource::Content)
    }

    /// Rendering surface reported a size change
    #[wasm_bindgen(js_name = notifyResized)]
    pub fn notify_resized(&mut self) -> bool {
        self.paginator.notify(ChangeSource::Resize)
    }

    /// Run a due recomputation; true when the chrome changed
    pub fn poll(&mut self) -> bool {
        let provider = JsHeightProvider {
            measure: &self.measure,
        };
        match self.paginator.poll(&provider) {
            Some(diff) => self.queue(diff),
            None => false,
        }
    }

    /// Milliseconds until the pending recomputation is due
    #[wasm_bindgen(js_name = timeUntilDue)]
    pub fn time_until_due(&self) -> Option<f64> {
        self.paginator
            .engine()
            .time_until_due()
            .map(|d| d.as_secs_f64() * 1000.0)
    }

    /// Recompute immediately
    #[wasm_bindgen(js_name = recalculateNow)]
    pub fn recalculate_now(&mut self) {
        let provider = JsHeightProvider {
            measure: &self.measure,
        };
        if let Some(diff) = self.paginator.recalculate_now(&provider) {
            self.queue(diff);
        }
    }

    /// Get page count
    #[wasm_bindgen(js_name = getPageCount)]
    pub fn get_page_count(&self) -> usize {
        self.paginator.page_count()
    }

    /// Current page breaks and count (JSON)
    #[wasm_bindgen(js_name = getPaginationJson)]
    pub fn get_pagination_json(&self) -> String {
        serde_json::to_string(self.paginator.pagination()).unwrap_or_default()
    }

    /// Page geometry in pixels (JSON)
    #[wasm_bindgen(js_name = getGeometryJson)]
    pub fn get_geometry_json(&self) -> String {
        serde_json::to_string(self.paginator.geometry()).unwrap_or_default()
    }

    /// Replace header/footer settings from JSON
    #[wasm_bindgen(js_name = setHeaderFooterJson)]
    pub fn set_header_footer_json(&mut self, json: &str) -> Result<(), JsError> {
        let config: HeaderFooterConfig = serde_json::from_str(json)?;
        let diff = self.paginator.set_header_footer(config);
        self.queue(diff);
        Ok(())
    }

    /// Chrome patches accumulated since the last call (JSON), then cleared
    #[wasm_bindgen(js_name = takeChromeDiffJson)]
    pub fn take_chrome_diff_json(&mut self) -> String {
        let generation = self.pending_diff.generation;
        let diff = std::mem::replace(&mut self.pending_diff, ChromeDiff::new(generation));
        serde_json::to_string(&diff).unwrap_or_default()
    }

    /// Paged-space position of a flow offset (caret and scroll sync)
    #[wasm_bindgen(js_name = flowToPaged)]
    pub fn flow_to_paged(&self, y: f32) -> f32 {
        self.paginator.flow_to_paged(y)
    }

    /// Serialize the chrome visible in a viewport into the flat buffer
    #[wasm_bindgen(js_name = renderChrome)]
    pub fn render_chrome(&mut self, viewport_y: f32, viewport_height: f32) {
        let width = self.paginator.geometry().content_width_px;
        let viewport = Rect::new(0.0, viewport_y, width, viewport_height);
        let layer = self.paginator.visible_chrome(viewport);
        self.buffer.fill(&layer);
    }

    #[wasm_bindgen(js_name = chromeU32Ptr)]
    pub fn chrome_u32_ptr(&self) -> u32 {
        self.buffer.u32_ptr()
    }

    #[wasm_bindgen(js_name = chromeU32Len)]
    pub fn chrome_u32_len(&self) -> u32 {
        self.buffer.u32_len()
    }

    #[wasm_bindgen(js_name = chromeF32Ptr)]
    pub fn chrome_f32_ptr(&self) -> u32 {
        self.buffer.f32_ptr()
    }

    #[wasm_bindgen(js_name = chromeF32Len)]
    pub fn chrome_f32_len(&self) -> u32 {
        self.buffer.f32_len()
    }

    #[wasm_bindgen(js_name = chromeTextPtr)]
    pub fn chrome_text_ptr(&self) -> u32 {
        self.buffer.text_ptr()
    }

    #[wasm_bindgen(js_name = chromeTextLen)]
    pub fn chrome_text_len(&self) -> u32 {
        self.buffer.text_len()
    }

    /// Start an export; returns the scale factor the host should capture at
    #[wasm_bindgen(js_name = beginExport)]
    pub fn begin_export(&mut self, scale_factor: Option<f32>) -> Result<f32, JsError> {
        let ticket = self.paginator.export().begin(scale_factor)?;
        self.export_ticket = Some(ticket);
        Ok(ticket.scale_factor)
    }

    /// Finish the export with captured RGBA pixels; returns the PDF bytes
    #[wasm_bindgen(js_name = finishExport)]
    pub fn finish_export(&mut self, width: u32, height: u32, pixels: Vec<u8>) -> Result<Vec<u8>, JsError> {
        let ticket = self
            .export_ticket
            .take()
            .ok_or_else(|| JsError::new("no export in progress"))?;

        let image = match image_from_rgba(width, height, pixels) {
            Ok(image) => image,
            Err(err) => {
                let err = self.paginator.export().fail(ticket, err.to_string());
                return Err(err.into());
            }
        };

        let document = self.paginator.export().finish(ticket, image)?;
        Ok(document.bytes)
    }

    /// Abort the export after a capture failure
    #[wasm_bindgen(js_name = failExport)]
    pub fn fail_export(&mut self, reason: &str) -> String {
        match self.export_ticket.take() {
            Some(ticket) => self.paginator.export().fail(ticket, reason).to_string(),
            None => "no export in progress".to_string(),
        }
    }

    #[wasm_bindgen(js_name = isExporting)]
    pub fn is_exporting(&self) -> bool {
        self.export_ticket.is_some()
    }

    /// Cancel pending recomputation before the content surface goes away
    pub fn teardown(&mut self) {
        self.paginator.teardown();
    }
}
