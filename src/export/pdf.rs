//! Multi-page PDF assembly from page rasters

use crate::error::Result;
use image::{Rgba, RgbaImage};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

/// Physical page size in PDF points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSizePt {
    pub width: f32,
    pub height: f32,
}

/// Writes an ordered sequence of page images as one document
pub trait DocumentWriter {
    /// Produce the complete document; one page per image, each `page_size`
    fn write(&self, pages: &[RgbaImage], page_size: PageSizePt) -> Result<Vec<u8>>;
}

/// PDF writer placing each raster as a full-page image
#[derive(Debug, Clone)]
pub struct PdfWriter {
    /// Colour transparent pixels are composited onto
    pub background: Rgba<u8>,
    pub title: Option<String>,
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self {
            background: Rgba([255, 255, 255, 255]),
            title: None,
        }
    }
}

impl PdfWriter {
    pub fn new(background: Rgba<u8>) -> Self {
        Self {
            background,
            ..Self::default()
        }
    }

    fn image_stream(&self, page: &RgbaImage) -> Stream {
        Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => page.width() as i64,
                "Height" => page.height() as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
            },
            composite_rgb(page, self.background),
        )
    }
}

impl DocumentWriter for PdfWriter {
    fn write(&self, pages: &[RgbaImage], page_size: PageSizePt) -> Result<Vec<u8>> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
        for page in pages {
            let image_id = doc.add_object(self.image_stream(page));

            // Stretch the unit image square over the whole MediaBox
            let content = Content {
                operations: vec![
                    Operation::new("q", vec![]),
                    Operation::new(
                        "cm",
                        vec![
                            page_size.width.into(),
                            0.into(),
                            0.into(),
                            page_size.height.into(),
                            0.into(),
                            0.into(),
                        ],
                    ),
                    Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
                    Operation::new("Q", vec![]),
                ],
            };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

            let media_box: Vec<Object> = vec![
                0.into(),
                0.into(),
                page_size.width.into(),
                page_size.height.into(),
            ];
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => media_box,
                "Contents" => content_id,
                "Resources" => dictionary! {
                    "XObject" => dictionary! {
                        "Im0" => image_id,
                    },
                },
            });
            kids.push(page_id.into());
        }

        let page_count = kids.len() as i64;
        doc.set_object(
            pages_id,
            dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => page_count,
            },
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        if let Some(title) = &self.title {
            let info_id = doc.add_object(dictionary! {
                "Title" => Object::string_literal(title.as_str()),
                "Producer" => Object::string_literal("page-flow"),
            });
            doc.trailer.set("Info", info_id);
        }

        doc.compress();

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer)?;
        Ok(buffer)
    }
}

/// Flatten RGBA onto an opaque background as packed RGB
fn composite_rgb(page: &RgbaImage, background: Rgba<u8>) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(page.width() as usize * page.height() as usize * 3);
    for pixel in page.pixels() {
        let [r, g, b, a] = pixel.0;
        let alpha = a as u32;
        for (channel, bg) in [r, g, b].into_iter().zip(background.0) {
            let blended = (channel as u32 * alpha + bg as u32 * (255 - alpha) + 127) / 255;
            rgb.push(blended as u8);
        }
    }
    rgb
}
