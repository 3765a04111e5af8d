//! Dieline generator: flat cut/fold nets for packaging shapes.
//!
//! Nets are produced in the same units as the input dimensions with the
//! top-left of the un-bled outline at the origin. Use [`DielineNet::fit_to_area`]
//! to place a net inside an output area.

use crate::error::DielineError;
use crate::geometry;
use kurbo::{Affine, BezPath, Point, Rect};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt::Write as _;
use std::str::FromStr;

/// Packaging shape family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum ShapeFamily {
    Box,
    Cylinder,
    Bag,
}

impl ShapeFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShapeFamily::Box => "box",
            ShapeFamily::Cylinder => "cylinder",
            ShapeFamily::Bag => "bag",
        }
    }

    /// Whether the net depends on the depth dimension.
    pub fn uses_depth(&self) -> bool {
        !matches!(self, ShapeFamily::Cylinder)
    }
}

impl FromStr for ShapeFamily {
    type Err = DielineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "box" => Ok(ShapeFamily::Box),
            "cylinder" => Ok(ShapeFamily::Cylinder),
            "bag" => Ok(ShapeFamily::Bag),
            _ => Err(DielineError::UnsupportedShape(s.to_string())),
        }
    }
}

impl TryFrom<String> for ShapeFamily {
    type Error = DielineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl std::fmt::Display for ShapeFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_true() -> bool {
    true
}

/// Physical parameters of a packaging shape.
///
/// For cylinders `width` is the diameter and `depth` is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DielineSpec {
    pub shape: ShapeFamily,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub depth: f64,
    #[serde(default)]
    pub bleed: f64,
    #[serde(default)]
    pub safe_zone: f64,
    #[serde(default = "default_true")]
    pub fold_lines: bool,
    #[serde(default = "default_true")]
    pub cut_lines: bool,
}

impl DielineSpec {
    pub fn new(shape: ShapeFamily, width: f64, height: f64, depth: f64) -> Self {
        Self {
            shape,
            width,
            height,
            depth,
            bleed: 0.0,
            safe_zone: 0.0,
            fold_lines: true,
            cut_lines: true,
        }
    }

    pub fn with_bleed(mut self, bleed: f64) -> Self {
        self.bleed = bleed;
        self
    }

    pub fn with_safe_zone(mut self, safe_zone: f64) -> Self {
        self.safe_zone = safe_zone;
        self
    }

    pub fn validate(&self) -> Result<(), DielineError> {
        let mut positive = vec![("width", self.width), ("height", self.height)];
        if self.shape.uses_depth() {
            positive.push(("depth", self.depth));
        }
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(DielineError::InvalidDimension { name, value });
            }
        }
        for (name, value) in [("bleed", self.bleed), ("safeZone", self.safe_zone)] {
            if !value.is_finite() || value < 0.0 {
                return Err(DielineError::InvalidDimension { name, value });
            }
        }
        Ok(())
    }
}

/// Role of a dieline segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    Cut,
    Fold,
}

/// A labelled straight segment of the net.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DielineLine {
    pub kind: LineKind,
    pub start: Point,
    pub end: Point,
    pub label: String,
}

impl DielineLine {
    fn new(kind: LineKind, start: Point, end: Point, label: impl Into<String>) -> Self {
        Self {
            kind,
            start,
            end,
            label: label.into(),
        }
    }

    pub fn length(&self) -> f64 {
        (self.end - self.start).hypot()
    }
}

/// A printable face of the net.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Panel {
    pub label: String,
    pub rect: Rect,
}

impl Panel {
    fn new(label: &str, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            label: label.to_string(),
            rect: Rect::new(x, y, x + width, y + height),
        }
    }
}

/// Generated net: cut outline, bleed outline, panels, guides and tagged lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DielineNet {
    pub shape: ShapeFamily,
    /// Closed cut outline without bleed; the closing edge is implicit.
    pub outline: Vec<Point>,
    /// `outline` offset outward by the bleed.
    pub bleed_outline: Vec<Point>,
    pub panels: Vec<Panel>,
    /// Panel rectangles inset by the safe zone. Panels narrower than twice the
    /// safe zone have no entry.
    pub safe_zones: Vec<Rect>,
    pub lines: Vec<DielineLine>,
    /// Bounds of the un-bled outline.
    pub bounds: Rect,
    pub bleed: f64,
    pub safe_zone: f64,
    /// Scale applied by [`DielineNet::fit_to_area`]; 1 for a freshly generated net.
    #[serde(default = "unit_scale")]
    pub scale: f64,
}

fn unit_scale() -> f64 {
    1.0
}

/// Generate the net for a packaging shape.
pub fn generate(spec: &DielineSpec) -> Result<DielineNet, DielineError> {
    spec.validate()?;

    let (outline, panels, folds) = match spec.shape {
        ShapeFamily::Box => box_net(spec.width, spec.height, spec.depth),
        ShapeFamily::Cylinder => cylinder_net(spec.width, spec.height),
        ShapeFamily::Bag => bag_net(spec.width, spec.height, spec.depth),
    };

    let mut lines = Vec::new();
    if spec.cut_lines {
        lines.extend(outline_edges(&outline));
    }
    if spec.fold_lines {
        lines.extend(folds);
    }

    let bounds = geometry::polygon_bounds(&outline).unwrap_or(Rect::ZERO);
    let bleed_outline = geometry::offset_polygon(&outline, spec.bleed);
    let safe_zones = inset_panels(&panels, spec.safe_zone);

    log::debug!(
        "Generated {} dieline: {:.2}x{:.2}, {} panels, {} lines",
        spec.shape,
        bounds.width(),
        bounds.height(),
        panels.len(),
        lines.len()
    );

    Ok(DielineNet {
        shape: spec.shape,
        outline,
        bleed_outline,
        panels,
        safe_zones,
        lines,
        bounds,
        bleed: spec.bleed,
        safe_zone: spec.safe_zone,
        scale: 1.0,
    })
}

type NetParts = (Vec<Point>, Vec<Panel>, Vec<DielineLine>);

/// Cruciform net: a central face with a depth-sized flap on every side.
fn box_net(w: f64, h: f64, d: f64) -> NetParts {
    let outline = vec![
        Point::new(d, 0.0),
        Point::new(d + w, 0.0),
        Point::new(d + w, d),
        Point::new(w + 2.0 * d, d),
        Point::new(w + 2.0 * d, d + h),
        Point::new(d + w, d + h),
        Point::new(d + w, h + 2.0 * d),
        Point::new(d, h + 2.0 * d),
        Point::new(d, d + h),
        Point::new(0.0, d + h),
        Point::new(0.0, d),
        Point::new(d, d),
    ];

    let panels = vec![
        Panel::new("front", d, d, w, h),
        Panel::new("top", d, 0.0, w, d),
        Panel::new("bottom", d, d + h, w, d),
        Panel::new("left", 0.0, d, d, h),
        Panel::new("right", d + w, d, d, h),
    ];

    let (tl, tr) = (Point::new(d, d), Point::new(d + w, d));
    let (br, bl) = (Point::new(d + w, d + h), Point::new(d, d + h));
    let folds = vec![
        DielineLine::new(LineKind::Fold, tl, tr, "top"),
        DielineLine::new(LineKind::Fold, tr, br, "right"),
        DielineLine::new(LineKind::Fold, br, bl, "bottom"),
        DielineLine::new(LineKind::Fold, bl, tl, "left"),
    ];

    (outline, panels, folds)
}

/// Unrolled lateral surface of a cylinder.
fn cylinder_net(diameter: f64, h: f64) -> NetParts {
    let circumference = PI * diameter;
    let outline = rect_outline(circumference, h);
    let panels = vec![Panel::new("body", 0.0, 0.0, circumference, h)];
    let folds = vec![
        DielineLine::new(LineKind::Fold, Point::new(0.0, 0.0), Point::new(circumference, 0.0), "top seam"),
        DielineLine::new(LineKind::Fold, Point::new(0.0, h), Point::new(circumference, h), "bottom seam"),
    ];
    (outline, panels, folds)
}

/// Main panel with a gusseted base flap below it.
fn bag_net(w: f64, h: f64, d: f64) -> NetParts {
    let outline = rect_outline(w, h + d);
    let panels = vec![
        Panel::new("front", 0.0, 0.0, w, h),
        Panel::new("gusset", 0.0, h, w, d),
    ];
    let crease = h + d / 2.0;
    let folds = vec![
        DielineLine::new(LineKind::Fold, Point::new(0.0, h), Point::new(w, h), "base"),
        DielineLine::new(LineKind::Fold, Point::new(0.0, crease), Point::new(w, crease), "gusset crease"),
    ];
    (outline, panels, folds)
}

fn rect_outline(w: f64, h: f64) -> Vec<Point> {
    vec![
        Point::new(0.0, 0.0),
        Point::new(w, 0.0),
        Point::new(w, h),
        Point::new(0.0, h),
    ]
}

fn outline_edges(outline: &[Point]) -> Vec<DielineLine> {
    let n = outline.len();
    (0..n)
        .map(|i| DielineLine::new(LineKind::Cut, outline[i], outline[(i + 1) % n], format!("edge {i}")))
        .collect()
}

fn inset_panels(panels: &[Panel], inset: f64) -> Vec<Rect> {
    panels
        .iter()
        .filter(|p| p.rect.width() > 2.0 * inset && p.rect.height() > 2.0 * inset)
        .map(|p| p.rect.inset(-inset))
        .collect()
}

fn polygon_to_path(points: &[Point]) -> BezPath {
    let mut path = BezPath::new();
    if let Some((first, rest)) = points.split_first() {
        path.move_to(*first);
        for p in rest {
            path.line_to(*p);
        }
        path.close_path();
    }
    path
}

impl DielineNet {
    /// Scale uniformly to fit `area` (bleed included) and center the result.
    pub fn fit_to_area(&self, area: Rect) -> DielineNet {
        let extent = self.bled_bounds();
        let fit = geometry::fit_within(extent.size(), area) * Affine::translate(-extent.origin().to_vec2());
        let scale = fit.as_coeffs()[0];

        let map_points = |points: &[Point]| points.iter().map(|p| fit * *p).collect::<Vec<_>>();
        DielineNet {
            shape: self.shape,
            outline: map_points(&self.outline),
            bleed_outline: map_points(&self.bleed_outline),
            panels: self
                .panels
                .iter()
                .map(|p| Panel {
                    label: p.label.clone(),
                    rect: fit.transform_rect_bbox(p.rect),
                })
                .collect(),
            safe_zones: self.safe_zones.iter().map(|r| fit.transform_rect_bbox(*r)).collect(),
            lines: self
                .lines
                .iter()
                .map(|l| DielineLine::new(l.kind, fit * l.start, fit * l.end, l.label.clone()))
                .collect(),
            bounds: fit.transform_rect_bbox(self.bounds),
            bleed: self.bleed * scale,
            safe_zone: self.safe_zone * scale,
            scale: self.scale * scale,
        }
    }

    /// Bounds including the bleed.
    pub fn bled_bounds(&self) -> Rect {
        geometry::polygon_bounds(&self.bleed_outline).unwrap_or(self.bounds)
    }

    pub fn lines_of(&self, kind: LineKind) -> impl Iterator<Item = &DielineLine> {
        self.lines.iter().filter(move |l| l.kind == kind)
    }

    /// Total cutting length, e.g. for die-making cost estimates.
    pub fn cut_length(&self) -> f64 {
        self.lines_of(LineKind::Cut).map(DielineLine::length).sum()
    }

    pub fn fold_length(&self) -> f64 {
        self.lines_of(LineKind::Fold).map(DielineLine::length).sum()
    }

    /// SVG path data for the cut outline.
    pub fn to_svg_path(&self) -> String {
        polygon_to_path(&self.outline).to_svg()
    }

    /// SVG group for compositing the net as a guide layer.
    pub fn to_svg_group(&self) -> String {
        let stroke = 0.5 / self.scale.max(f64::EPSILON).sqrt();
        let mut svg = String::from("<g class=\"dieline\" fill=\"none\">\n");

        if self.bleed > 0.0 {
            let _ = writeln!(
                svg,
                "  <path class=\"bleed\" d=\"{}\" stroke=\"#00a651\" stroke-width=\"{stroke:.3}\" stroke-dasharray=\"2 2\"/>",
                polygon_to_path(&self.bleed_outline).to_svg()
            );
        }
        for zone in &self.safe_zones {
            let _ = writeln!(
                svg,
                "  <rect class=\"safe\" x=\"{:.3}\" y=\"{:.3}\" width=\"{:.3}\" height=\"{:.3}\" stroke=\"#00aeef\" stroke-width=\"{stroke:.3}\" stroke-dasharray=\"1 2\"/>",
                zone.x0,
                zone.y0,
                zone.width(),
                zone.height()
            );
        }
        if self.lines_of(LineKind::Cut).next().is_some() {
            let _ = writeln!(
                svg,
                "  <path class=\"cut\" d=\"{}\" stroke=\"#ec008c\" stroke-width=\"{stroke:.3}\"/>",
                self.to_svg_path()
            );
        }
        for line in self.lines_of(LineKind::Fold) {
            let _ = writeln!(
                svg,
                "  <line class=\"fold\" x1=\"{:.3}\" y1=\"{:.3}\" x2=\"{:.3}\" y2=\"{:.3}\" stroke=\"#2e3192\" stroke-width=\"{stroke:.3}\" stroke-dasharray=\"4 2\"/>",
                line.start.x, line.start.y, line.end.x, line.end.y
            );
        }
        svg.push_str("</g>");
        svg
    }
}
