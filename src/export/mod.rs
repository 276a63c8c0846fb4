//! One-shot export: capture, slice into pages, assemble a document
//!
//! Export runs as a single flight. [`ExportPipeline::begin`] hands out a
//! ticket while the host captures pixels (possibly asynchronously), and
//! [`ExportPipeline::finish`] or [`ExportPipeline::fail`] ends the flight.
//! The output document is produced only after every page raster exists.

mod pdf;
mod slicer;

pub use pdf::{DocumentWriter, PageSizePt, PdfWriter};
pub use slicer::{export_page_count, scaled_page_size, slice_pages};

use crate::error::{CaptureError, ExportError, Result};
use crate::layout::PageGeometry;
use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Produces a raster of the whole content surface
pub trait Rasterizer {
    /// Capture the content at `scale_factor` output pixels per display pixel
    fn capture(&mut self, scale_factor: f32) -> std::result::Result<RgbaImage, CaptureError>;
}

/// Export defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExportSettings {
    pub scale_factor: f32,
    /// Fill colour for padding and transparent pixels
    pub background: [u8; 3],
    /// Document title written to the PDF Info dictionary
    pub title: Option<String>,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            scale_factor: 2.0,
            background: [255, 255, 255],
            title: None,
        }
    }
}

impl ExportSettings {
    pub fn background_rgba(&self) -> Rgba<u8> {
        let [r, g, b] = self.background;
        Rgba([r, g, b, 255])
    }
}

/// Build an image from a tightly packed RGBA buffer
pub fn image_from_rgba(
    width: u32,
    height: u32,
    data: Vec<u8>,
) -> std::result::Result<RgbaImage, CaptureError> {
    let len = data.len();
    RgbaImage::from_raw(width, height, data).ok_or(CaptureError::BufferSize { width, height, len })
}

/// A single export request over one captured image
#[derive(Debug)]
pub struct ExportJob<'a> {
    pub source_image: &'a RgbaImage,
    pub geometry: &'a PageGeometry,
    pub scale_factor: f32,
    pub background: Rgba<u8>,
}

impl ExportJob<'_> {
    /// Physical page size: the content area, in points
    pub fn page_size(&self) -> PageSizePt {
        PageSizePt {
            width: self.geometry.px_to_pt(self.geometry.content_width_px),
            height: self.geometry.px_to_pt(self.geometry.content_height_px),
        }
    }

    /// Slice all pages, then hand them to the writer in one call
    pub fn run<W: DocumentWriter + ?Sized>(&self, writer: &W) -> Result<ExportedDocument> {
        validate_scale(self.scale_factor)?;

        let pages = slice_pages(
            self.source_image,
            self.geometry,
            self.scale_factor,
            self.background,
        );
        let page_size = self.page_size();
        let bytes = writer.write(&pages, page_size)?;

        Ok(ExportedDocument {
            bytes,
            page_count: pages.len(),
            page_size,
        })
    }
}

/// Finished export output
#[derive(Debug, Clone)]
pub struct ExportedDocument {
    pub bytes: Vec<u8>,
    pub page_count: usize,
    pub page_size: PageSizePt,
}

impl ExportedDocument {
    /// Write the finished document to disk
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, &self.bytes)?;
        Ok(())
    }
}

/// Handle for the export currently in flight
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportTicket {
    pub id: u64,
    pub scale_factor: f32,
}

/// Export entry point guarding against overlapping exports
pub struct ExportPipeline<W: DocumentWriter = PdfWriter> {
    geometry: PageGeometry,
    settings: ExportSettings,
    writer: W,
    in_flight: Option<ExportTicket>,
    next_id: u64,
}

impl ExportPipeline<PdfWriter> {
    pub fn new(geometry: PageGeometry, settings: ExportSettings) -> Self {
        let writer = PdfWriter {
            background: settings.background_rgba(),
            title: settings.title.clone(),
        };
        Self::with_writer(geometry, settings, writer)
    }
}

impl<W: DocumentWriter> ExportPipeline<W> {
    pub fn with_writer(geometry: PageGeometry, settings: ExportSettings, writer: W) -> Self {
        Self {
            geometry,
            settings,
            writer,
            in_flight: None,
            next_id: 1,
        }
    }

    pub fn settings(&self) -> &ExportSettings {
        &self.settings
    }

    pub fn writer_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Start an export; rejected while another one is in flight
    pub fn begin(&mut self, scale_factor: Option<f32>) -> Result<ExportTicket> {
        if self.in_flight.is_some() {
            log::warn!("rejecting export request: another export is in flight");
            return Err(ExportError::Busy);
        }

        let scale_factor = scale_factor.unwrap_or(self.settings.scale_factor);
        validate_scale(scale_factor)?;

        let ticket = ExportTicket {
            id: self.next_id,
            scale_factor,
        };
        self.next_id += 1;
        self.in_flight = Some(ticket);
        log::debug!("export #{} started at scale {scale_factor}", ticket.id);
        Ok(ticket)
    }

    /// Complete the flight with the captured image
    pub fn finish(&mut self, ticket: ExportTicket, image: RgbaImage) -> Result<ExportedDocument> {
        self.land(ticket)?;

        let job = ExportJob {
            source_image: &image,
            geometry: &self.geometry,
            scale_factor: ticket.scale_factor,
            background: self.settings.background_rgba(),
        };
        let document = job.run(&self.writer)?;
        log::info!(
            "export #{} produced {} pages ({} bytes)",
            ticket.id,
            document.page_count,
            document.bytes.len()
        );
        Ok(document)
    }

    /// Complete the flight with a capture failure
    pub fn fail(&mut self, ticket: ExportTicket, reason: impl Into<String>) -> ExportError {
        if let Err(err) = self.land(ticket) {
            return err;
        }
        let reason = reason.into();
        log::warn!("export #{} failed during capture: {reason}", ticket.id);
        ExportError::Capture(CaptureError::Failed { reason })
    }

    /// Capture and export in one synchronous call
    pub fn run<R: Rasterizer + ?Sized>(
        &mut self,
        rasterizer: &mut R,
        scale_factor: Option<f32>,
    ) -> Result<ExportedDocument> {
        let ticket = self.begin(scale_factor)?;
        match rasterizer.capture(ticket.scale_factor) {
            Ok(image) => self.finish(ticket, image),
            Err(err) => {
                self.in_flight = None;
                log::warn!("export #{} failed during capture: {err}", ticket.id);
                Err(err.into())
            }
        }
    }

    fn land(&mut self, ticket: ExportTicket) -> Result<()> {
        match self.in_flight {
            Some(current) if current.id == ticket.id => {
                self.in_flight = None;
                Ok(())
            }
            _ => Err(ExportError::StaleTicket(ticket.id)),
        }
    }
}

fn validate_scale(scale_factor: f32) -> Result<()> {
    if scale_factor.is_finite() && scale_factor > 0.0 {
        Ok(())
    } else {
        Err(ExportError::InvalidScale(scale_factor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::PageSetup;
    use std::cell::Cell;

    /// 20x40 px content area
    fn small_geometry() -> PageGeometry {
        PageGeometry::new(&PageSetup {
            page_width_in: 1.0,
            page_height_in: 1.5,
            margin_in: 0.25,
            dpi: 40.0,
        })
    }

    struct FixedRasterizer {
        height_px: f32,
    }

    impl Rasterizer for FixedRasterizer {
        fn capture(&mut self, scale_factor: f32) -> std::result::Result<RgbaImage, CaptureError> {
            let height = (self.height_px * scale_factor).round() as u32;
            let width = (20.0 * scale_factor).round() as u32;
            Ok(RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255])))
        }
    }

    struct BrokenRasterizer;

    impl Rasterizer for BrokenRasterizer {
        fn capture(&mut self, _scale_factor: f32) -> std::result::Result<RgbaImage, CaptureError> {
            Err(CaptureError::Failed {
                reason: "surface detached".to_string(),
            })
        }
    }

    /// Records how many times it was asked to write
    #[derive(Default)]
    struct CountingWriter {
        writes: Cell<usize>,
        pages: Cell<usize>,
    }

    impl DocumentWriter for CountingWriter {
        fn write(&self, pages: &[RgbaImage], _page_size: PageSizePt) -> Result<Vec<u8>> {
            self.writes.set(self.writes.get() + 1);
            self.pages.set(pages.len());
            Ok(vec![0; pages.len()])
        }
    }

    #[test]
    fn test_run_exports_all_pages() {
        let mut pipeline = ExportPipeline::new(small_geometry(), ExportSettings::default());
        let mut rasterizer = FixedRasterizer { height_px: 100.0 }; // 2.5 pages

        let document = pipeline.run(&mut rasterizer, None).expect("export");
        assert_eq!(document.page_count, 3);
        assert_eq!(document.page_size, PageSizePt { width: 36.0, height: 72.0 });
        assert!(document.bytes.starts_with(b"%PDF"));
        assert!(!pipeline.is_busy());
    }

    #[test]
    fn test_capture_failure_writes_nothing() {
        let mut pipeline = ExportPipeline::with_writer(
            small_geometry(),
            ExportSettings::default(),
            CountingWriter::default(),
        );

        let err = pipeline.run(&mut BrokenRasterizer, None).unwrap_err();
        assert!(matches!(err, ExportError::Capture(CaptureError::Failed { .. })));
        assert_eq!(pipeline.writer_mut().writes.get(), 0);
        assert!(!pipeline.is_busy());
    }

    #[test]
    fn test_second_export_while_in_flight_is_rejected() {
        let mut pipeline = ExportPipeline::new(small_geometry(), ExportSettings::default());
        let ticket = pipeline.begin(None).expect("first export");

        assert!(matches!(pipeline.begin(None), Err(ExportError::Busy)));

        let image = RgbaImage::from_pixel(40, 80, Rgba([0, 0, 0, 255]));
        let document = pipeline.finish(ticket, image).expect("finish");
        assert_eq!(document.page_count, 1);

        assert!(pipeline.begin(Some(1.0)).is_ok());
    }

    #[test]
    fn test_fail_ends_flight() {
        let mut pipeline = ExportPipeline::new(small_geometry(), ExportSettings::default());
        let ticket = pipeline.begin(None).unwrap();

        let err = pipeline.fail(ticket, "canvas tainted");
        assert_eq!(err.to_string(), "export failed: content capture failed: canvas tainted");
        assert!(!pipeline.is_busy());
    }

    #[test]
    fn test_stale_ticket_is_rejected() {
        let mut pipeline = ExportPipeline::new(small_geometry(), ExportSettings::default());
        let first = pipeline.begin(None).unwrap();
        pipeline.fail(first, "cancelled by host");

        let second = pipeline.begin(None).unwrap();
        let image = RgbaImage::new(40, 80);
        assert!(matches!(
            pipeline.finish(first, image),
            Err(ExportError::StaleTicket(1))
        ));
        assert!(pipeline.is_busy());
        assert!(pipeline.finish(second, RgbaImage::new(40, 80)).is_ok());
    }

    #[test]
    fn test_invalid_scale_is_rejected_without_starting() {
        let mut pipeline = ExportPipeline::new(small_geometry(), ExportSettings::default());
        assert!(matches!(
            pipeline.begin(Some(0.0)),
            Err(ExportError::InvalidScale(_))
        ));
        assert!(!pipeline.is_busy());
    }

    #[test]
    fn test_writer_receives_every_page_at_once() {
        let mut pipeline = ExportPipeline::with_writer(
            small_geometry(),
            ExportSettings::default(),
            CountingWriter::default(),
        );
        let mut rasterizer = FixedRasterizer { height_px: 160.0 }; // 4 pages
        pipeline.run(&mut rasterizer, Some(1.0)).unwrap();

        assert_eq!(pipeline.writer_mut().writes.get(), 1);
        assert_eq!(pipeline.writer_mut().pages.get(), 4);
    }

    #[test]
    fn test_image_from_rgba_checks_length() {
        assert!(image_from_rgba(2, 2, vec![0; 16]).is_ok());
        assert_eq!(
            image_from_rgba(2, 2, vec![0; 15]).unwrap_err(),
            CaptureError::BufferSize { width: 2, height: 2, len: 15 }
        );
    }

    #[test]
    fn test_title_from_settings_reaches_pdf() {
        let settings = ExportSettings {
            title: Some("Minutes".to_string()),
            ..ExportSettings::default()
        };
        let mut pipeline = ExportPipeline::new(small_geometry(), settings);
        let document = pipeline
            .run(&mut FixedRasterizer { height_px: 40.0 }, Some(1.0))
            .unwrap();

        let pdf = lopdf::Document::load_mem(&document.bytes).unwrap();
        let info = pdf
            .trailer
            .get(b"Info")
            .and_then(lopdf::Object::as_reference)
            .and_then(|id| pdf.get_dictionary(id))
            .unwrap();
        assert_eq!(info.get(b"Title").unwrap().as_str().unwrap(), b"Minutes");
    }

    #[test]
    fn test_save_writes_bytes() {
        let document = ExportedDocument {
            bytes: b"%PDF-1.5 test".to_vec(),
            page_count: 1,
            page_size: PageSizePt { width: 1.0, height: 1.0 },
        };
        let path = std::env::temp_dir().join(format!("page-flow-{}.pdf", std::process::id()));
        document.save(&path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), document.bytes);
        let _ = std::fs::remove_file(path);
    }
}
