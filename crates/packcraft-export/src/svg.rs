//! Scene graph to SVG serialization.
//!
//! The document is laid out in canvas units with the viewBox covering the
//! full media box, so the same text serves as the vector artifact and as
//! input to the rasterizer.

use crate::error::{ExportError, ExportResult};
use crate::options::{ExportRequest, PageLayout};
use kurbo::{Point, Rect};
use packcraft_core::element::TextAlign;
use packcraft_core::{DielineNet, Element, ElementStyle, ImagePayload, Payload, Rgba, SceneGraph, TextPayload};
use std::fmt::Write as _;

/// Line height as a multiple of the font size.
const LINE_HEIGHT: f64 = 1.2;
/// Gap between the bleed edge and the start of a crop mark.
const MARK_OFFSET: f64 = 3.0;
const MARK_STROKE: f64 = 0.25;
const REGISTRATION_RADIUS: f64 = 4.0;

/// Serialize the scene for the given request and page layout.
///
/// Fails on the first corrupt element; nothing is returned in that case.
pub fn render_svg(
    graph: &SceneGraph,
    request: &ExportRequest,
    layout: &PageLayout,
    dieline: Option<&DielineNet>,
) -> ExportResult<String> {
    let media = layout.media;
    let mut out = String::new();

    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{}" height="{}" viewBox="{} {} {} {}">"#,
        num(media.width()),
        num(media.height()),
        num(media.x0),
        num(media.y0),
        num(media.width()),
        num(media.height())
    );
    let _ = writeln!(
        out,
        r#"  <metadata><export xmlns="urn:packcraft:export" color-space="{}" dpi="{}" bleed="{}"/></metadata>"#,
        request.color_space.as_str(),
        num(request.dpi),
        num(layout.bleed())
    );

    let background = graph.background();
    if background.a > 0 {
        let _ = writeln!(
            out,
            r#"  <rect class="background" x="{}" y="{}" width="{}" height="{}"{}/>"#,
            num(layout.bleed_box.x0),
            num(layout.bleed_box.y0),
            num(layout.bleed_box.width()),
            num(layout.bleed_box.height()),
            paint("fill", Some(background))
        );
    }

    for element in graph.elements() {
        write_element(&mut out, element)?;
    }

    if let Some(net) = dieline {
        out.push_str(&fit_dieline(net, graph).to_svg_group());
        out.push('\n');
    }

    if layout.has_marks() {
        write_marks(&mut out, layout);
    }

    out.push_str("</svg>\n");
    Ok(out)
}

/// Scale the net (bleed included) to fit the canvas, centered on it.
pub(crate) fn fit_dieline(net: &DielineNet, graph: &SceneGraph) -> DielineNet {
    net.fit_to_area(graph.canvas_rect())
}

/// Standalone SVG of a dieline net, framed by its bled bounds.
///
/// The net keeps its own units here; nothing constrains its size.
pub fn render_dieline_svg(net: &DielineNet) -> String {
    let frame = net.bled_bounds();
    let mut out = String::new();
    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="{} {} {} {}">"#,
        num(frame.width()),
        num(frame.height()),
        num(frame.x0),
        num(frame.y0),
        num(frame.width()),
        num(frame.height())
    );
    out.push_str(&net.to_svg_group());
    out.push_str("\n</svg>\n");
    out
}

fn write_element(out: &mut String, element: &Element) -> ExportResult<()> {
    let t = &element.transform;
    t.validate()
        .map_err(|e| ExportError::Serialization(format!("element {}: {e}", element.id())))?;

    let c = t.to_affine().as_coeffs();
    let _ = write!(
        out,
        r#"  <g id="el-{}" transform="matrix({} {} {} {} {} {})""#,
        element.id().simple(),
        coef(c[0]),
        coef(c[1]),
        coef(c[2]),
        coef(c[3]),
        coef(c[4]),
        coef(c[5])
    );
    if element.style.opacity < 1.0 {
        let _ = write!(out, r#" opacity="{}""#, num(element.style.opacity));
    }
    out.push_str(">\n");

    match &element.payload {
        Payload::Shape(shape) => {
            let path = shape
                .to_path(t.width, t.height)
                .map_err(|e| ExportError::Serialization(format!("element {}: {e}", element.id())))?;
            let _ = writeln!(
                out,
                r#"    <path d="{}"{}/>"#,
                path.to_svg(),
                shape_paint(&element.style)
            );
        }
        Payload::Text(text) => write_text(out, text, &element.style, t.width),
        Payload::Image(image) => {
            check_image(image)
                .map_err(|e| ExportError::Serialization(format!("element {}: {e}", element.id())))?;
            let _ = writeln!(
                out,
                r#"    <image width="{}" height="{}" preserveAspectRatio="none" xlink:href="{}"/>"#,
                num(t.width),
                num(t.height),
                escape_xml(&image.src)
            );
        }
    }

    out.push_str("  </g>\n");
    Ok(())
}

fn shape_paint(style: &ElementStyle) -> String {
    let mut attrs = paint("fill", style.fill);
    if style.stroke.is_some() && style.stroke_width > 0.0 {
        attrs.push_str(&paint("stroke", style.stroke));
        let _ = write!(attrs, r#" stroke-width="{}""#, num(style.stroke_width));
    }
    attrs
}

fn write_text(out: &mut String, text: &TextPayload, style: &ElementStyle, width: f64) {
    let (anchor, x) = match text.align {
        TextAlign::Left => ("start", 0.0),
        TextAlign::Center => ("middle", width / 2.0),
        TextAlign::Right => ("end", width),
    };
    let _ = writeln!(
        out,
        r#"    <text font-family="{}" font-size="{}" font-weight="{}" text-anchor="{anchor}"{}>"#,
        escape_xml(&text.font_family),
        num(text.font_size),
        text.font_weight,
        paint("fill", style.fill.or(Some(Rgba::black())))
    );
    for (i, line) in text.content.lines().enumerate() {
        let baseline = text.font_size * (1.0 + LINE_HEIGHT * i as f64);
        let _ = writeln!(
            out,
            r#"      <tspan x="{}" y="{}">{}</tspan>"#,
            num(x),
            num(baseline),
            escape_xml(line)
        );
    }
    out.push_str("    </text>\n");
}

/// Inline images must decode; external references are passed through.
fn check_image(image: &ImagePayload) -> Result<(), String> {
    let Some((mime, bytes)) = image.decode_inline().map_err(|e| e.to_string())? else {
        log::debug!("Leaving external image reference {} unembedded", image.src);
        return Ok(());
    };
    if mime == "image/svg+xml" {
        return std::str::from_utf8(&bytes)
            .map(|_| ())
            .map_err(|e| format!("corrupt svg image: {e}"));
    }
    ::image::load_from_memory(&bytes)
        .map(|_| ())
        .map_err(|e| format!("undecodable {mime} image: {e}"))
}

fn write_marks(out: &mut String, layout: &PageLayout) {
    let trim = layout.trim;
    let bleed = layout.bleed_box;
    let media = layout.media;

    out.push_str(&format!(
        r##"  <g class="marks" fill="none" stroke="#000000" stroke-width="{}">"##,
        num(MARK_STROKE)
    ));
    out.push('\n');

    // Crop marks extend the trim edges into the slug at each corner.
    for (corner, sx, sy) in [
        (Point::new(trim.x0, trim.y0), -1.0, -1.0),
        (Point::new(trim.x1, trim.y0), 1.0, -1.0),
        (Point::new(trim.x0, trim.y1), -1.0, 1.0),
        (Point::new(trim.x1, trim.y1), 1.0, 1.0),
    ] {
        let near_x = if sx < 0.0 { bleed.x0 - MARK_OFFSET } else { bleed.x1 + MARK_OFFSET };
        let far_x = if sx < 0.0 { media.x0 + MARK_OFFSET } else { media.x1 - MARK_OFFSET };
        let near_y = if sy < 0.0 { bleed.y0 - MARK_OFFSET } else { bleed.y1 + MARK_OFFSET };
        let far_y = if sy < 0.0 { media.y0 + MARK_OFFSET } else { media.y1 - MARK_OFFSET };
        write_line(out, "crop", Point::new(near_x, corner.y), Point::new(far_x, corner.y));
        write_line(out, "crop", Point::new(corner.x, near_y), Point::new(corner.x, far_y));
    }

    let center = trim.center();
    for target in [
        Point::new(center.x, (media.y0 + bleed.y0) / 2.0),
        Point::new(center.x, (media.y1 + bleed.y1) / 2.0),
        Point::new((media.x0 + bleed.x0) / 2.0, center.y),
        Point::new((media.x1 + bleed.x1) / 2.0, center.y),
    ] {
        write_registration(out, target);
    }

    out.push_str("  </g>\n");
}

fn write_line(out: &mut String, class: &str, a: Point, b: Point) {
    let _ = writeln!(
        out,
        r#"    <line class="{class}" x1="{}" y1="{}" x2="{}" y2="{}"/>"#,
        num(a.x),
        num(a.y),
        num(b.x),
        num(b.y)
    );
}

fn write_registration(out: &mut String, at: Point) {
    let r = REGISTRATION_RADIUS;
    let _ = writeln!(
        out,
        r#"    <circle class="registration" cx="{}" cy="{}" r="{}"/>"#,
        num(at.x),
        num(at.y),
        num(r)
    );
    let arm = Rect::from_center_size(at, (r * 3.0, r * 3.0));
    write_line(out, "registration", Point::new(arm.x0, at.y), Point::new(arm.x1, at.y));
    write_line(out, "registration", Point::new(at.x, arm.y0), Point::new(at.x, arm.y1));
}

fn paint(attr: &str, color: Option<Rgba>) -> String {
    match color {
        Some(c) if c.a > 0 => {
            let mut s = format!(r#" {attr}="{}""#, c.to_hex_rgb());
            if !c.is_opaque() {
                let _ = write!(s, r#" {attr}-opacity="{}""#, num(c.alpha()));
            }
            s
        }
        _ => format!(r#" {attr}="none""#),
    }
}

/// Format a number with at most three decimals and no trailing zeros.
pub(crate) fn num(v: f64) -> String {
    let s = format!("{v:.3}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" { "0".to_string() } else { s.to_string() }
}

/// Shortest round-trip form for transform coefficients.
fn coef(v: f64) -> String {
    if v.abs() < 1e-12 { "0".to_string() } else { v.to_string() }
}

pub(crate) fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}
