//! page-flow CLI (for testing purposes only)
//! The main interface is through WASM bindings.
//!
//! Usage: page-flow [--config settings.json] [--export out.pdf] HEIGHT...
//!
//! Paginates each content height (display pixels) in turn and prints the
//! resulting page breaks as JSON. With `--export`, a synthetic capture of
//! the last height is sliced into pages and written as a PDF.

use image::{Rgba, RgbaImage};
use log::info;
use page_flow::{CaptureError, Paginator, PaginatorConfig, Rasterizer};
use simplelog::{Config, LevelFilter, WriteLogger};
use std::error::Error;
use std::fs::{self, File};

/// Alternating stripes, one per display line, so page seams are visible
struct StripedCapture {
    width: f32,
    height: f32,
}

impl Rasterizer for StripedCapture {
    fn capture(&mut self, scale_factor: f32) -> Result<RgbaImage, CaptureError> {
        let width = (self.width * scale_factor).round() as u32;
        let height = (self.height * scale_factor).round() as u32;
        let line = (20.0 * scale_factor).max(1.0) as u32;

        Ok(RgbaImage::from_fn(width, height, |_, y| {
            if (y / line) % 2 == 0 {
                Rgba([250, 250, 250, 255])
            } else {
                Rgba([220, 226, 236, 255])
            }
        }))
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    WriteLogger::init(
        LevelFilter::Debug,
        Config::default(),
        File::create("page-flow.log")?,
    )?;

    let mut config = PaginatorConfig::default();
    let mut export_path = None;
    let mut heights = Vec::new();

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let path = args.next().ok_or("--config needs a path")?;
                config = PaginatorConfig::from_json(&fs::read_to_string(path)?)?;
            }
            "--export" => {
                export_path = Some(args.next().ok_or("--export needs a path")?);
            }
            height => heights.push(height.parse::<f32>()?),
        }
    }

    if heights.is_empty() {
        eprintln!("usage: page-flow [--config settings.json] [--export out.pdf] HEIGHT...");
        return Ok(());
    }

    info!("Starting page-flow with {}", config.to_json());
    let mut paginator = Paginator::new(config)?;

    for &height in &heights {
        paginator.recalculate_now(&height);
        println!("{}", serde_json::to_string(paginator.pagination())?);
    }

    if let Some(path) = export_path {
        let mut capture = StripedCapture {
            width: paginator.geometry().content_width_px,
            height: heights.last().copied().unwrap_or_default(),
        };
        let document = paginator.export_with(&mut capture)?;
        document.save(&path)?;
        println!(
            "wrote {} page(s) to {path} ({} bytes)",
            document.page_count,
            document.bytes.len()
        );
    }

    paginator.teardown();
    Ok(())
}
