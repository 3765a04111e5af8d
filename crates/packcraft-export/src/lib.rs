//! Packcraft Export Library
//!
//! Turns a scene graph into a deliverable artifact: SVG text, PNG bytes, or
//! a print-ready PDF with bleed and printer marks. Every export is a pure
//! function of its inputs; [`ExportJobs`] lets a session abandon superseded
//! runs between stages.

pub mod color;
mod error;
mod jobs;
mod options;
mod pdf;
mod raster;
mod svg;

pub use error::{ExportError, ExportResult};
pub use jobs::{ExportJobs, ExportTicket};
pub use options::{ColorSpace, ExportFormat, ExportRequest, MAX_DPI, MAX_PIXEL_SIZE, PageLayout, REFERENCE_DPI};
pub use raster::RgbaImage;
pub use svg::{render_dieline_svg, render_svg};

use packcraft_core::{DielineNet, SceneGraph};

/// The product of an export.
#[derive(Debug, Clone, PartialEq)]
pub enum Artifact {
    Vector(String),
    Raster { png: Vec<u8>, width: u32, height: u32 },
    PrintReady { pdf: Vec<u8>, width: u32, height: u32 },
}

impl Artifact {
    pub fn format(&self) -> ExportFormat {
        match self {
            Artifact::Vector(_) => ExportFormat::Vector,
            Artifact::Raster { .. } => ExportFormat::Raster,
            Artifact::PrintReady { .. } => ExportFormat::PrintReady,
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            Artifact::Vector(_) => "image/svg+xml",
            Artifact::Raster { .. } => "image/png",
            Artifact::PrintReady { .. } => "application/pdf",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Artifact::Vector(_) => "svg",
            Artifact::Raster { .. } => "png",
            Artifact::PrintReady { .. } => "pdf",
        }
    }

    /// Text content of a vector artifact.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Artifact::Vector(svg) => Some(svg),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Artifact::Vector(svg) => svg.as_bytes(),
            Artifact::Raster { png, .. } => png,
            Artifact::PrintReady { pdf, .. } => pdf,
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Artifact::Vector(svg) => svg.into_bytes(),
            Artifact::Raster { png, .. } => png,
            Artifact::PrintReady { pdf, .. } => pdf,
        }
    }

    /// Pixel size for raster and print-ready artifacts.
    pub fn pixel_size(&self) -> Option<(u32, u32)> {
        match self {
            Artifact::Vector(_) => None,
            Artifact::Raster { width, height, .. } | Artifact::PrintReady { width, height, .. } => {
                Some((*width, *height))
            }
        }
    }
}

/// Export a scene graph, optionally with a dieline guide layer on top.
pub fn export(graph: &SceneGraph, request: &ExportRequest, dieline: Option<&DielineNet>) -> ExportResult<Artifact> {
    export_with_ticket(graph, request, dieline, &ExportTicket::detached())
}

/// Export, aborting with [`ExportError::Superseded`] between stages once
/// `ticket` is no longer current.
pub fn export_with_ticket(
    graph: &SceneGraph,
    request: &ExportRequest,
    dieline: Option<&DielineNet>,
    ticket: &ExportTicket,
) -> ExportResult<Artifact> {
    ticket.check()?;
    let layout = request.layout(graph.width(), graph.height())?;
    log::info!(
        "Exporting {} elements as {} at {} dpi ({}x{} px, {})",
        graph.len(),
        request.format,
        request.dpi,
        layout.pixel_width,
        layout.pixel_height,
        request.color_space.as_str()
    );

    let svg = render_svg(graph, request, &layout, dieline)?;
    ticket.check()?;

    let artifact = match request.format {
        ExportFormat::Vector => Artifact::Vector(svg),
        ExportFormat::Raster => {
            let mut image = raster::rasterize(&svg, &layout)?;
            ticket.check()?;
            if request.color_space == ColorSpace::Cmyk {
                color::soft_proof(&mut image.data);
            }
            let png = raster::encode_png(&image, request.dpi, request.quality)?;
            Artifact::Raster {
                png,
                width: image.width,
                height: image.height,
            }
        }
        ExportFormat::PrintReady => {
            let image = raster::rasterize(&svg, &layout)?;
            ticket.check()?;
            let samples = match request.color_space {
                ColorSpace::Rgb => color::rgba_to_rgb_samples(&image.data),
                ColorSpace::Cmyk => color::rgba_to_cmyk_samples(&image.data),
            };
            let page = pdf::PageImage {
                samples: &samples,
                width: image.width,
                height: image.height,
                color_space: request.color_space,
            };
            Artifact::PrintReady {
                pdf: pdf::write_pdf(&page, &layout),
                width: image.width,
                height: image.height,
            }
        }
    };
    ticket.check()?;

    log::info!("Export finished: {} bytes of {}", artifact.as_bytes().len(), artifact.mime());
    Ok(artifact)
}
