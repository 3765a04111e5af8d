//! SVG rasterization and PNG encoding.

use crate::error::{ExportError, ExportResult};
use crate::options::PageLayout;
use std::sync::{Arc, OnceLock};
use tiny_skia::Pixmap;

const METERS_PER_INCH: f64 = 0.0254;

/// System fonts, loaded once per process.
fn font_database() -> Arc<fontdb::Database> {
    static FONTS: OnceLock<Arc<fontdb::Database>> = OnceLock::new();
    FONTS
        .get_or_init(|| {
            let mut db = fontdb::Database::new();
            db.load_system_fonts();
            log::debug!("Loaded {} font faces", db.len());
            Arc::new(db)
        })
        .clone()
}

/// Straight (non-premultiplied) RGBA pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct RgbaImage {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Render the SVG document at the layout's pixel size.
pub fn rasterize(svg: &str, layout: &PageLayout) -> ExportResult<RgbaImage> {
    let mut opt = usvg::Options::default();
    opt.fontdb = font_database();

    let tree = usvg::Tree::from_data(svg.as_bytes(), &opt)
        .map_err(|e| ExportError::Render(format!("Failed to parse SVG: {e}")))?;

    let mut pixmap = Pixmap::new(layout.pixel_width, layout.pixel_height).ok_or_else(|| {
        ExportError::Render(format!(
            "Failed to allocate {}x{} pixmap",
            layout.pixel_width, layout.pixel_height
        ))
    })?;
    if layout.has_marks() {
        pixmap.fill(tiny_skia::Color::WHITE);
    }

    let scale = layout.scale as f32;
    resvg::render(&tree, tiny_skia::Transform::from_scale(scale, scale), &mut pixmap.as_mut());

    let mut data = Vec::with_capacity(pixmap.data().len());
    for px in pixmap.pixels() {
        let c = px.demultiply();
        data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    Ok(RgbaImage {
        data,
        width: layout.pixel_width,
        height: layout.pixel_height,
    })
}

/// Encode RGBA pixels as PNG with the physical resolution recorded.
pub fn encode_png(image: &RgbaImage, dpi: f64, quality: Option<u8>) -> ExportResult<Vec<u8>> {
    let mut png_data = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut png_data, image.width, image.height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_compression(compression_for(quality));

        let ppm = (dpi / METERS_PER_INCH).round() as u32;
        encoder.set_pixel_dims(Some(png::PixelDimensions {
            xppu: ppm,
            yppu: ppm,
            unit: png::Unit::Meter,
        }));

        let mut writer = encoder
            .write_header()
            .map_err(|e| ExportError::Render(format!("Failed to write PNG header: {e}")))?;
        writer
            .write_image_data(&image.data)
            .map_err(|e| ExportError::Render(format!("Failed to write PNG data: {e}")))?;
    }
    Ok(png_data)
}

/// PNG is lossless, so quality only trades encode time for size.
fn compression_for(quality: Option<u8>) -> png::Compression {
    match quality {
        Some(q) if q < 50 => png::Compression::Fast,
        Some(q) if q >= 90 => png::Compression::Best,
        _ => png::Compression::Default,
    }
}
