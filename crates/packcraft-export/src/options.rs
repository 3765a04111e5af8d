//! Export request options and page layout.

use crate::error::{ExportError, ExportResult};
use kurbo::Rect;
use serde::{Deserialize, Serialize};

/// Resolution of canvas units.
pub const REFERENCE_DPI: f64 = 72.0;
/// Highest accepted output resolution.
pub const MAX_DPI: f64 = 2400.0;
/// Largest output dimension in pixels, per side.
pub const MAX_PIXEL_SIZE: u32 = 16384;
/// Width of the slug area that holds printer marks, in canvas units.
pub const MARK_SLUG: f64 = 18.0;

/// Target artifact format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExportFormat {
    /// PNG bytes.
    Raster,
    /// SVG text.
    Vector,
    /// Single-page PDF bytes.
    PrintReady,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Raster => "raster",
            ExportFormat::Vector => "vector",
            ExportFormat::PrintReady => "print-ready",
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Intended output colour space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorSpace {
    #[default]
    #[serde(rename = "RGB", alias = "rgb")]
    Rgb,
    #[serde(rename = "CMYK", alias = "cmyk")]
    Cmyk,
}

impl ColorSpace {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColorSpace::Rgb => "RGB",
            ColorSpace::Cmyk => "CMYK",
        }
    }
}

fn default_dpi() -> f64 {
    REFERENCE_DPI
}

/// An export request as received from the editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    pub format: ExportFormat,
    #[serde(default = "default_dpi")]
    pub dpi: f64,
    /// Margin added outward around the canvas, in canvas units.
    #[serde(default)]
    pub bleed: f64,
    #[serde(default)]
    pub marks: bool,
    #[serde(default)]
    pub color_space: ColorSpace,
    /// Encoder effort for raster output, 1..=100.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<u8>,
}

impl ExportRequest {
    pub fn new(format: ExportFormat) -> Self {
        Self {
            format,
            dpi: REFERENCE_DPI,
            bleed: 0.0,
            marks: false,
            color_space: ColorSpace::Rgb,
            quality: None,
        }
    }

    pub fn with_dpi(mut self, dpi: f64) -> Self {
        self.dpi = dpi;
        self
    }

    pub fn with_bleed(mut self, bleed: f64) -> Self {
        self.bleed = bleed;
        self
    }

    pub fn with_marks(mut self, marks: bool) -> Self {
        self.marks = marks;
        self
    }

    pub fn with_color_space(mut self, color_space: ColorSpace) -> Self {
        self.color_space = color_space;
        self
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = Some(quality);
        self
    }

    pub fn from_json(json: &str) -> ExportResult<Self> {
        serde_json::from_str(json).map_err(|e| ExportError::Unsupported(format!("malformed export request: {e}")))
    }

    /// Resolution multiplier relative to canvas units.
    pub fn scale(&self) -> f64 {
        self.dpi / REFERENCE_DPI
    }

    /// Reject option combinations the pipeline cannot produce.
    pub fn validate(&self) -> ExportResult<()> {
        if !self.dpi.is_finite() || self.dpi <= 0.0 || self.dpi > MAX_DPI {
            return Err(ExportError::Unsupported(format!(
                "dpi {} outside (0, {MAX_DPI}]",
                self.dpi
            )));
        }
        if !self.bleed.is_finite() || self.bleed < 0.0 {
            return Err(ExportError::Unsupported(format!("invalid bleed {}", self.bleed)));
        }
        match self.quality {
            Some(_) if self.format != ExportFormat::Raster => Err(ExportError::Unsupported(format!(
                "quality is not applicable to {} output",
                self.format
            ))),
            Some(q) if !(1..=100).contains(&q) => {
                Err(ExportError::Unsupported(format!("quality {q} outside 1..=100")))
            }
            _ => Ok(()),
        }
    }

    /// Compute the page geometry for a canvas of the given size.
    pub fn layout(&self, canvas_width: f64, canvas_height: f64) -> ExportResult<PageLayout> {
        self.validate()?;
        let trim = Rect::new(0.0, 0.0, canvas_width, canvas_height);
        let bleed_box = trim.inflate(self.bleed, self.bleed);
        let slug = if self.marks { MARK_SLUG } else { 0.0 };
        let media = bleed_box.inflate(slug, slug);

        let scale = self.scale();
        let pixel_width = (media.width() * scale).ceil();
        let pixel_height = (media.height() * scale).ceil();
        let limit = MAX_PIXEL_SIZE as f64;
        if pixel_width > limit || pixel_height > limit {
            return Err(ExportError::Unsupported(format!(
                "output {pixel_width}x{pixel_height} px exceeds {MAX_PIXEL_SIZE} px per side"
            )));
        }

        Ok(PageLayout {
            trim,
            bleed_box,
            media,
            scale,
            pixel_width: (pixel_width as u32).max(1),
            pixel_height: (pixel_height as u32).max(1),
        })
    }
}

/// Page boxes in canvas units, plus the pixel size at the requested DPI.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageLayout {
    /// The canvas itself.
    pub trim: Rect,
    /// Trim extended by the bleed.
    pub bleed_box: Rect,
    /// Bleed extended by the mark slug.
    pub media: Rect,
    pub scale: f64,
    pub pixel_width: u32,
    pub pixel_height: u32,
}

impl PageLayout {
    pub fn has_marks(&self) -> bool {
        self.media != self.bleed_box
    }

    pub fn bleed(&self) -> f64 {
        self.trim.x0 - self.bleed_box.x0
    }
}
