//! Flat buffer protocol for zero-copy chrome transfer
//!
//! Binary format for a chrome layer:
//!
//! ## u32 Buffer Layout:
//! ```text
//! Header (offset table for random access):
//! [0]     MAGIC (0x50474348 = "PGCH" for validation)
//! [1]     SCHEMA_VERSION (protocol version, currently 1)
//! [2]     generation_lo (pagination generation)
//! [3]     generation_hi
//! [4]     page_count
//! [5]     break_count
//! [6]     text_buffer_len
//! [7]     u32_break_offset (index in u32_data where break records start, 0 if none)
//! [8]     f32_break_offset (index in f32_data where break geometry starts, 0 if none)
//! [9..]   page data...
//!
//! Per-page:
//!   [page_index, flags,
//!    header_offset, header_len, header_utf16_offset, header_utf16_len,
//!    footer_offset, footer_len, footer_utf16_offset, footer_utf16_len]
//!     flags: bit0=has_header, bit1=has_footer
//!     text ranges are only meaningful when the matching flag is set
//!
//! At u32_break_offset (if break_count > 0):
//!   Per-break: [page_number]
//! ```
//!
//! ## f32 Buffer Layout:
//! ```text
//! Per-page: [x, y, width, height, header_x, header_y, footer_x, footer_y]
//! At f32_break_offset (for each break): [y]
//! ```

use crate::render::{BreakMarker, ChromeItem, ChromeLayer, ChromePage};

/// Magic number for format validation: "PGCH" (PaGe CHrome)
pub const MAGIC: u32 = 0x50474348;

/// Schema version for protocol compatibility checking
pub const SCHEMA_VERSION: u32 = 1;

/// Header size in u32 elements
pub const HEADER_SIZE: usize = 9;

/// Flags bitmask
pub const FLAG_HAS_HEADER: u32 = 0b0001;
pub const FLAG_HAS_FOOTER: u32 = 0b0010;

/// Number of u32 values per page
pub const U32_PER_PAGE: usize = 10;

/// Number of f32 values per page
pub const F32_PER_PAGE: usize = 8;

/// Number of u32 values per break marker
pub const U32_PER_BREAK: usize = 1;

/// Number of f32 values per break marker
pub const F32_PER_BREAK: usize = 1;

/// Location of a string inside the text buffer
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct TextRange {
    offset: u32,
    len: u32,
    utf16_offset: u32,
    utf16_len: u32,
}

/// Render buffer for zero-copy WASM transfer of the chrome layer
pub struct ChromeBuffer {
    /// Integer data (indices, counts, offsets, flags)
    pub u32_data: Vec<u32>,
    /// Float data (positions, dimensions)
    pub f32_data: Vec<f32>,
    /// UTF-8 text buffer
    pub text_data: Vec<u8>,

    // Break markers are written in finalize() so their offsets follow all pages
    pending_breaks: Vec<BreakMarker>,

    // Cumulative UTF-16 offset for JS substring access after one decode
    utf16_text_offset: usize,
}

impl Default for ChromeBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl ChromeBuffer {
    pub fn new() -> Self {
        Self {
            u32_data: Vec::with_capacity(256),
            f32_data: Vec::with_capacity(256),
            text_data: Vec::with_capacity(1024),
            pending_breaks: Vec::new(),
            utf16_text_offset: 0,
        }
    }

    pub fn clear(&mut self) {
        self.u32_data.clear();
        self.f32_data.clear();
        self.text_data.clear();
        self.pending_breaks.clear();
        self.utf16_text_offset = 0;
    }

    /// Pre-allocate buffers so pointers handed to JS stay valid while writing.
    ///
    /// Reuses existing allocations when they are large enough.
    pub fn prepare(&mut self, u32_needed: usize, f32_needed: usize, text_needed: usize) {
        let u32_target = u32_needed + 32;
        let f32_target = f32_needed + 32;
        let text_target = text_needed + 256;

        if self.u32_data.capacity() < u32_target {
            self.u32_data = Vec::with_capacity(u32_target);
        } else {
            self.u32_data.clear();
        }

        if self.f32_data.capacity() < f32_target {
            self.f32_data = Vec::with_capacity(f32_target);
        } else {
            self.f32_data.clear();
        }

        if self.text_data.capacity() < text_target {
            self.text_data = Vec::with_capacity(text_target);
        } else {
            self.text_data.clear();
        }

        self.pending_breaks.clear();
        self.utf16_text_offset = 0;
    }

    /// Write header with offset table placeholders
    pub fn write_header(&mut self, generation: u64, page_count: u32) {
        self.u32_data.push(MAGIC); // [0] magic number
        self.u32_data.push(SCHEMA_VERSION); // [1] schema version
        self.u32_data.push((generation & 0xFFFFFFFF) as u32); // [2] generation_lo
        self.u32_data.push((generation >> 32) as u32); // [3] generation_hi
        self.u32_data.push(page_count); // [4] page_count
        self.u32_data.push(0); // [5] break_count (placeholder)
        self.u32_data.push(0); // [6] text_buffer_len (placeholder)
        self.u32_data.push(0); // [7] u32_break_offset (placeholder)
        self.u32_data.push(0); // [8] f32_break_offset (placeholder)
    }

    /// Write one page record
    pub fn write_page(&mut self, page: &ChromePage) {
        let mut flags = 0;
        let mut header = (TextRange::default(), 0.0, 0.0);
        let mut footer = (TextRange::default(), 0.0, 0.0);

        for item in &page.items {
            match item {
                ChromeItem::Header { position, text } => {
                    flags |= FLAG_HAS_HEADER;
                    header = (self.push_text(text), position.x, position.y);
                }
                ChromeItem::Footer { position, text } => {
                    flags |= FLAG_HAS_FOOTER;
                    footer = (self.push_text(text), position.x, position.y);
                }
                ChromeItem::PageBackground { .. } => {}
            }
        }

        self.u32_data.push(page.page_index as u32);
        self.u32_data.push(flags);
        for range in [header.0, footer.0] {
            self.u32_data.push(range.offset);
            self.u32_data.push(range.len);
            self.u32_data.push(range.utf16_offset);
            self.u32_data.push(range.utf16_len);
        }

        let bounds = page.background().unwrap_or(page.bounds);
        self.f32_data.push(bounds.x);
        self.f32_data.push(bounds.y);
        self.f32_data.push(bounds.width);
        self.f32_data.push(bounds.height);
        self.f32_data.push(header.1);
        self.f32_data.push(header.2);
        self.f32_data.push(footer.1);
        self.f32_data.push(footer.2);
    }

    /// Queue a break marker (written to buffers in finalize())
    pub fn write_break(&mut self, marker: BreakMarker) {
        self.pending_breaks.push(marker);
    }

    /// Finalize buffer: write pending breaks and synchronize header
    pub fn finalize(&mut self) {
        if self.u32_data.len() < HEADER_SIZE {
            return;
        }

        if self.pending_breaks.is_empty() {
            self.u32_data[5] = 0;
            self.u32_data[7] = 0;
            self.u32_data[8] = 0;
        } else {
            self.u32_data[7] = self.u32_data.len() as u32;
            self.u32_data[8] = self.f32_data.len() as u32;

            for marker in &self.pending_breaks {
                self.u32_data.push(marker.page_number as u32);
                self.f32_data.push(marker.y);
            }
            self.u32_data[5] = self.pending_breaks.len() as u32;
        }

        self.u32_data[6] = self.text_data.len() as u32;

        #[cfg(debug_assertions)]
        self.validate_text_offsets();
    }

    /// Serialize a whole chrome layer
    pub fn fill(&mut self, layer: &ChromeLayer) {
        let text_needed: usize = layer
            .pages
            .iter()
            .map(|p| p.header().map_or(0, str::len) + p.footer().map_or(0, str::len))
            .sum();
        self.prepare(
            HEADER_SIZE + layer.pages.len() * U32_PER_PAGE + layer.break_markers.len() * U32_PER_BREAK,
            layer.pages.len() * F32_PER_PAGE + layer.break_markers.len() * F32_PER_BREAK,
            text_needed,
        );

        self.write_header(layer.generation, layer.pages.len() as u32);
        for page in &layer.pages {
            self.write_page(page);
        }
        for marker in &layer.break_markers {
            self.write_break(*marker);
        }
        self.finalize();
    }

    fn push_text(&mut self, text: &str) -> TextRange {
        let offset = self.text_data.len() as u32;
        self.text_data.extend_from_slice(text.as_bytes());

        let utf16_len = text.chars().map(char::len_utf16).sum::<usize>();
        let range = TextRange {
            offset,
            len: text.len() as u32,
            utf16_offset: self.utf16_text_offset as u32,
            utf16_len: utf16_len as u32,
        };
        self.utf16_text_offset += utf16_len;
        range
    }

    /// Validate that all text ranges are within bounds (debug builds only)
    #[cfg(debug_assertions)]
    fn validate_text_offsets(&self) {
        let page_count = self.u32_data[4] as usize;
        let text_len = self.text_data.len();

        for page_idx in 0..page_count {
            let base = HEADER_SIZE + page_idx * U32_PER_PAGE;
            if base + U32_PER_PAGE > self.u32_data.len() {
                break;
            }
            let flags = self.u32_data[base + 1];
            for (flag, at) in [(FLAG_HAS_HEADER, base + 2), (FLAG_HAS_FOOTER, base + 6)] {
                if flags & flag == 0 {
                    continue;
                }
                let offset = self.u32_data[at] as usize;
                let len = self.u32_data[at + 1] as usize;
                debug_assert!(
                    offset + len <= text_len,
                    "Invalid text range for page {}: offset {} + length {} > text buffer size {}",
                    page_idx,
                    offset,
                    len,
                    text_len
                );
            }
        }
    }

    // Accessors for WASM
    // u32 rather than usize: wasm32 linear memory uses u32 offsets

    pub fn u32_ptr(&self) -> u32 {
        self.u32_data.as_ptr() as u32
    }

    pub fn u32_len(&self) -> u32 {
        self.u32_data.len() as u32
    }

    pub fn f32_ptr(&self) -> u32 {
        self.f32_data.as_ptr() as u32
    }

    pub fn f32_len(&self) -> u32 {
        self.f32_data.len() as u32
    }

    pub fn text_ptr(&self) -> u32 {
        self.text_data.as_ptr() as u32
    }

    pub fn text_len(&self) -> u32 {
        self.text_data.len() as u32
    }
}
