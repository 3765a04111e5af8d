//! Design elements: transform, style and kind-specific payload.

use crate::error::SceneError;
use crate::geometry;
use kurbo::{Affine, BezPath, Point, Rect, Shape as KurboShape};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

/// Unique identifier for elements.
pub type ElementId = Uuid;

/// RGBA8 colour, serialized as `#rrggbb` / `#rrggbbaa`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub const fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }

    pub const fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }

    /// Parse `#rgb`, `#rrggbb`, `#rrggbbaa` or `transparent`.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("transparent") {
            return Some(Self::transparent());
        }
        let hex = s.strip_prefix('#')?;
        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(hex.get(range)?, 16).ok();
        match hex.len() {
            3 => Some(Self::new(
                channel(0..1)? * 17,
                channel(1..2)? * 17,
                channel(2..3)? * 17,
                255,
            )),
            6 => Some(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?, 255)),
            8 => Some(Self::new(
                channel(0..2)?,
                channel(2..4)?,
                channel(4..6)?,
                channel(6..8)?,
            )),
            _ => None,
        }
    }

    /// Hex form without alpha, for SVG paint attributes.
    pub fn to_hex_rgb(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Alpha as a 0..=1 opacity.
    pub fn alpha(&self) -> f64 {
        self.a as f64 / 255.0
    }

    pub fn is_opaque(&self) -> bool {
        self.a == 255
    }
}

impl std::fmt::Display for Rgba {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_opaque() {
            write!(f, "{}", self.to_hex_rgb())
        } else {
            write!(f, "#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl Serialize for Rgba {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Rgba {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Rgba::parse(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid colour: {s}")))
    }
}

/// Kind tag of an element, mirrored by its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Text,
    Image,
    Shape,
}

/// Geometric placement of an element.
///
/// `x`/`y` is the top-left corner of the unrotated frame; rotation (degrees) and
/// scale apply about the frame center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transform {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub rotation: f64,
    #[serde(default = "unit_scale")]
    pub scale_x: f64,
    #[serde(default = "unit_scale")]
    pub scale_y: f64,
}

fn unit_scale() -> f64 {
    1.0
}

impl Transform {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }

    /// Reject negative sizes, zero scale and non-finite numbers.
    pub fn validate(&self) -> Result<(), SceneError> {
        let fields = [
            ("x", self.x),
            ("y", self.y),
            ("width", self.width),
            ("height", self.height),
            ("rotation", self.rotation),
            ("scaleX", self.scale_x),
            ("scaleY", self.scale_y),
        ];
        if let Some((name, _)) = fields.iter().find(|(_, v)| !v.is_finite()) {
            return Err(SceneError::InvalidElement(format!("{name} must be finite")));
        }
        if self.width < 0.0 || self.height < 0.0 {
            return Err(SceneError::InvalidElement(format!(
                "negative size {}x{}",
                self.width, self.height
            )));
        }
        if self.scale_x == 0.0 || self.scale_y == 0.0 {
            return Err(SceneError::InvalidElement("scale must be non-zero".to_string()));
        }
        Ok(())
    }

    /// Unrotated frame, scaled about its center.
    pub fn frame(&self) -> Rect {
        let base = Rect::new(self.x, self.y, self.x + self.width, self.y + self.height);
        let center = base.center();
        let half_w = self.width * self.scale_x.abs() / 2.0;
        let half_h = self.height * self.scale_y.abs() / 2.0;
        Rect::new(center.x - half_w, center.y - half_h, center.x + half_w, center.y + half_h)
    }

    /// Axis-aligned bounds including rotation and scale.
    pub fn bounds(&self) -> Rect {
        geometry::rotated_bounds(self.frame(), self.rotation)
    }

    /// Map from element-local units (0..width, 0..height) to canvas space.
    pub fn to_affine(&self) -> Affine {
        let center = Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0);
        Affine::translate(center.to_vec2())
            * Affine::rotate(self.rotation.to_radians())
            * Affine::scale_non_uniform(self.scale_x, self.scale_y)
            * Affine::translate((-self.width / 2.0, -self.height / 2.0))
    }

    pub fn center(&self) -> Point {
        self.frame().center()
    }
}

/// Horizontal alignment of text within its frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

fn default_font_family() -> String {
    "Noto Sans".to_string()
}

fn default_font_size() -> f64 {
    TextPayload::DEFAULT_FONT_SIZE
}

fn default_font_weight() -> u16 {
    400
}

/// Text content and font.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextPayload {
    pub content: String,
    #[serde(default = "default_font_family")]
    pub font_family: String,
    #[serde(default = "default_font_size")]
    pub font_size: f64,
    #[serde(default = "default_font_weight")]
    pub font_weight: u16,
    #[serde(default)]
    pub align: TextAlign,
}

impl TextPayload {
    pub const DEFAULT_FONT_SIZE: f64 = 24.0;

    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            font_family: default_font_family(),
            font_size: Self::DEFAULT_FONT_SIZE,
            font_weight: default_font_weight(),
            align: TextAlign::default(),
        }
    }
}

/// Image reference: a public URL from the upload service or a `data:` URI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagePayload {
    pub src: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub natural_width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub natural_height: Option<u32>,
}

impl ImagePayload {
    pub fn new(src: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            natural_width: None,
            natural_height: None,
        }
    }

    /// Build an inline image from raw bytes.
    pub fn from_bytes(mime: &str, data: &[u8]) -> Self {
        use base64::{Engine, engine::general_purpose::STANDARD};
        Self::new(format!("data:{mime};base64,{}", STANDARD.encode(data)))
    }

    pub fn is_inline(&self) -> bool {
        self.src.starts_with("data:")
    }

    /// Decode an inline `data:` URI into (mime, bytes).
    ///
    /// Returns `Ok(None)` for external references.
    pub fn decode_inline(&self) -> Result<Option<(String, Vec<u8>)>, SceneError> {
        use base64::{Engine, engine::general_purpose::STANDARD};

        let Some(rest) = self.src.strip_prefix("data:") else {
            return Ok(None);
        };
        let (header, body) = rest
            .split_once(',')
            .ok_or_else(|| SceneError::Serialization("data URI without payload".to_string()))?;
        let mime = header.strip_suffix(";base64").ok_or_else(|| {
            SceneError::Serialization(format!("unsupported data URI encoding: {header}"))
        })?;
        let bytes = STANDARD
            .decode(body.trim())
            .map_err(|e| SceneError::Serialization(format!("corrupt image data: {e}")))?;
        Ok(Some((mime.to_string(), bytes)))
    }
}

/// Vector geometry of a shape element, in element-local units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ShapeGeometry {
    Rectangle {
        #[serde(default, rename = "cornerRadius")]
        corner_radius: f64,
    },
    Ellipse,
    Polygon {
        points: Vec<Point>,
    },
    Path {
        d: String,
    },
}

/// Shape path payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapePayload {
    pub geometry: ShapeGeometry,
}

impl ShapePayload {
    pub fn rectangle() -> Self {
        Self {
            geometry: ShapeGeometry::Rectangle { corner_radius: 0.0 },
        }
    }

    pub fn ellipse() -> Self {
        Self {
            geometry: ShapeGeometry::Ellipse,
        }
    }

    pub fn polygon(points: Vec<Point>) -> Self {
        Self {
            geometry: ShapeGeometry::Polygon { points },
        }
    }

    /// Build the local-space path for a frame of the given size.
    pub fn to_path(&self, width: f64, height: f64) -> Result<BezPath, SceneError> {
        let frame = Rect::new(0.0, 0.0, width, height);
        match &self.geometry {
            ShapeGeometry::Rectangle { corner_radius } if *corner_radius > 0.0 => {
                let radius = corner_radius.min(width / 2.0).min(height / 2.0);
                Ok(kurbo::RoundedRect::from_rect(frame, radius).to_path(0.1))
            }
            ShapeGeometry::Rectangle { .. } => Ok(frame.to_path(0.1)),
            ShapeGeometry::Ellipse => Ok(kurbo::Ellipse::from_rect(frame).to_path(0.1)),
            ShapeGeometry::Polygon { points } => {
                if points.len() < 3 {
                    return Err(SceneError::Serialization(format!(
                        "polygon needs at least 3 points, got {}",
                        points.len()
                    )));
                }
                if points.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
                    return Err(SceneError::Serialization("polygon point is not finite".to_string()));
                }
                let mut path = BezPath::new();
                path.move_to(points[0]);
                for p in &points[1..] {
                    path.line_to(*p);
                }
                path.close_path();
                Ok(path)
            }
            ShapeGeometry::Path { d } => BezPath::from_svg(d)
                .map_err(|e| SceneError::Serialization(format!("invalid path data: {e}"))),
        }
    }
}

/// Kind-specific element content.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Text(TextPayload),
    Image(ImagePayload),
    Shape(ShapePayload),
}

impl Payload {
    pub fn kind(&self) -> ElementKind {
        match self {
            Payload::Text(_) => ElementKind::Text,
            Payload::Image(_) => ElementKind::Image,
            Payload::Shape(_) => ElementKind::Shape,
        }
    }

    fn validate(&self) -> Result<(), SceneError> {
        match self {
            Payload::Text(text) => {
                if !text.font_size.is_finite() || text.font_size <= 0.0 {
                    return Err(SceneError::InvalidElement(format!(
                        "font size must be positive, got {}",
                        text.font_size
                    )));
                }
            }
            Payload::Image(image) => {
                if image.src.trim().is_empty() {
                    return Err(SceneError::InvalidElement("image without source".to_string()));
                }
            }
            Payload::Shape(_) => {}
        }
        Ok(())
    }
}

fn default_opacity() -> f64 {
    1.0
}

/// Paint properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<Rgba>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<Rgba>,
    #[serde(default)]
    pub stroke_width: f64,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
}

impl Default for ElementStyle {
    fn default() -> Self {
        Self {
            fill: Some(Rgba::black()),
            stroke: None,
            stroke_width: 0.0,
            opacity: 1.0,
        }
    }
}

impl ElementStyle {
    fn validate(&self) -> Result<(), SceneError> {
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(SceneError::InvalidElement(format!(
                "opacity {} outside 0..=1",
                self.opacity
            )));
        }
        if !self.stroke_width.is_finite() || self.stroke_width < 0.0 {
            return Err(SceneError::InvalidElement(format!(
                "invalid stroke width {}",
                self.stroke_width
            )));
        }
        Ok(())
    }
}

/// Everything needed to create an element; the scene graph assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementSpec {
    pub transform: Transform,
    pub payload: Payload,
    pub style: ElementStyle,
    pub locked: bool,
    pub selectable: bool,
}

impl ElementSpec {
    pub fn new(transform: Transform, payload: Payload) -> Self {
        Self {
            transform,
            payload,
            style: ElementStyle::default(),
            locked: false,
            selectable: true,
        }
    }

    pub fn text(transform: Transform, content: impl Into<String>) -> Self {
        Self::new(transform, Payload::Text(TextPayload::new(content)))
    }

    pub fn image(transform: Transform, src: impl Into<String>) -> Self {
        Self::new(transform, Payload::Image(ImagePayload::new(src)))
    }

    pub fn shape(transform: Transform, shape: ShapePayload) -> Self {
        Self::new(transform, Payload::Shape(shape))
    }

    pub fn with_style(mut self, style: ElementStyle) -> Self {
        self.style = style;
        self
    }
}

/// Partial update merged into an existing element. `None` leaves a field alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementPatch {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub rotation: Option<f64>,
    pub scale_x: Option<f64>,
    pub scale_y: Option<f64>,
    pub payload: Option<Payload>,
    pub style: Option<ElementStyle>,
    pub locked: Option<bool>,
    pub selectable: Option<bool>,
}

impl ElementPatch {
    pub fn position(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    pub fn size(width: f64, height: f64) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            ..Self::default()
        }
    }

    pub fn rotation(degrees: f64) -> Self {
        Self {
            rotation: Some(degrees),
            ..Self::default()
        }
    }

    pub fn style(style: ElementStyle) -> Self {
        Self {
            style: Some(style),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Only position fields are set.
    pub fn is_move(&self) -> bool {
        (self.x.is_some() || self.y.is_some())
            && *self
                == Self {
                    x: self.x,
                    y: self.y,
                    ..Self::default()
                }
    }

    /// Only rotation is set.
    pub fn is_rotate(&self) -> bool {
        self.rotation.is_some() && *self == Self::rotation(self.rotation.unwrap_or_default())
    }

    /// Only width/height/scale fields are set.
    pub fn is_resize(&self) -> bool {
        let resize_only = Self {
            width: self.width,
            height: self.height,
            scale_x: self.scale_x,
            scale_y: self.scale_y,
            ..Self::default()
        };
        !self.is_empty() && *self == resize_only
    }

    /// Only the `locked` and `selectable` flags are set.
    pub fn is_flags_only(&self) -> bool {
        let flags = Self {
            locked: self.locked,
            selectable: self.selectable,
            ..Self::default()
        };
        !self.is_empty() && *self == flags
    }

    fn apply_to(&self, transform: &mut Transform) {
        let fields = [
            (self.x, &mut transform.x),
            (self.y, &mut transform.y),
            (self.width, &mut transform.width),
            (self.height, &mut transform.height),
            (self.rotation, &mut transform.rotation),
            (self.scale_x, &mut transform.scale_x),
            (self.scale_y, &mut transform.scale_y),
        ];
        for (value, slot) in fields {
            if let Some(v) = value {
                *slot = v;
            }
        }
    }
}

/// One placed design object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ElementRecord", into = "ElementRecord")]
pub struct Element {
    pub(crate) id: ElementId,
    pub transform: Transform,
    pub payload: Payload,
    pub style: ElementStyle,
    pub locked: bool,
    pub selectable: bool,
}

impl Element {
    /// Validate a spec and give it a fresh id.
    pub(crate) fn from_spec(spec: ElementSpec) -> Result<Self, SceneError> {
        let element = Self {
            id: Uuid::new_v4(),
            transform: spec.transform,
            payload: spec.payload,
            style: spec.style,
            locked: spec.locked,
            selectable: spec.selectable,
        };
        element.validate()?;
        Ok(element)
    }

    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn kind(&self) -> ElementKind {
        self.payload.kind()
    }

    pub fn bounds(&self) -> Rect {
        self.transform.bounds()
    }

    pub fn validate(&self) -> Result<(), SceneError> {
        self.transform.validate()?;
        self.payload.validate()?;
        self.style.validate()
    }

    /// Point hit test against the rotated frame.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let local = self.transform.to_affine().inverse() * point;
        // Tolerance is in canvas units; convert back through the scale.
        let tol_x = tolerance / self.transform.scale_x.abs().max(f64::EPSILON);
        let tol_y = tolerance / self.transform.scale_y.abs().max(f64::EPSILON);
        Rect::new(0.0, 0.0, self.transform.width, self.transform.height)
            .inflate(tol_x, tol_y)
            .contains(local)
    }

    /// Return a copy with the patch merged in, validated. `self` is untouched.
    pub fn patched(&self, patch: &ElementPatch) -> Result<Self, SceneError> {
        let mut next = self.clone();
        patch.apply_to(&mut next.transform);
        if let Some(payload) = &patch.payload {
            if payload.kind() != self.kind() {
                return Err(SceneError::InvalidElement(format!(
                    "cannot change {:?} element into {:?}",
                    self.kind(),
                    payload.kind()
                )));
            }
            next.payload = payload.clone();
        }
        if let Some(style) = &patch.style {
            next.style = style.clone();
        }
        if let Some(locked) = patch.locked {
            next.locked = locked;
        }
        if let Some(selectable) = patch.selectable {
            next.selectable = selectable;
        }
        next.validate()?;
        Ok(next)
    }

    pub(crate) fn regenerate_id(&mut self) {
        self.id = Uuid::new_v4();
    }
}

/// Wire form of an element (`{ id, kind, x, y, width, height, rotation, scaleX, scaleY, payload }`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ElementRecord {
    id: ElementId,
    kind: ElementKind,
    #[serde(flatten)]
    transform: Transform,
    payload: serde_json::Value,
    #[serde(default)]
    style: ElementStyle,
    #[serde(default)]
    locked: bool,
    #[serde(default = "default_selectable")]
    selectable: bool,
}

fn default_selectable() -> bool {
    true
}

impl TryFrom<ElementRecord> for Element {
    type Error = SceneError;

    fn try_from(record: ElementRecord) -> Result<Self, Self::Error> {
        let bad_payload =
            |e: serde_json::Error| SceneError::Serialization(format!("element {}: {e}", record.id));
        let payload = match record.kind {
            ElementKind::Text => Payload::Text(serde_json::from_value(record.payload.clone()).map_err(bad_payload)?),
            ElementKind::Image => {
                Payload::Image(serde_json::from_value(record.payload.clone()).map_err(bad_payload)?)
            }
            ElementKind::Shape => {
                Payload::Shape(serde_json::from_value(record.payload.clone()).map_err(bad_payload)?)
            }
        };
        let element = Element {
            id: record.id,
            transform: record.transform,
            payload,
            style: record.style,
            locked: record.locked,
            selectable: record.selectable,
        };
        element
            .validate()
            .map_err(|e| SceneError::Serialization(format!("element {}: {e}", record.id)))?;
        Ok(element)
    }
}

impl From<Element> for ElementRecord {
    fn from(element: Element) -> Self {
        let kind = element.kind();
        let payload = match &element.payload {
            Payload::Text(p) => serde_json::to_value(p),
            Payload::Image(p) => serde_json::to_value(p),
            Payload::Shape(p) => serde_json::to_value(p),
        }
        // Payload structs only hold strings, numbers and arrays of them.
        .unwrap_or(serde_json::Value::Null);
        Self {
            id: element.id,
            kind,
            transform: element.transform,
            payload,
            style: element.style,
            locked: element.locked,
            selectable: element.selectable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_parse_and_display() {
        assert_eq!(Rgba::parse("#fff"), Some(Rgba::white()));
        assert_eq!(Rgba::parse("#ff000080"), Some(Rgba::new(255, 0, 0, 128)));
        assert_eq!(Rgba::parse("transparent"), Some(Rgba::transparent()));
        assert_eq!(Rgba::parse("red"), None);
        assert_eq!(Rgba::new(255, 0, 0, 128).to_string(), "#ff000080");
        assert_eq!(Rgba::black().to_string(), "#000000");
    }

    #[test]
    fn test_negative_size_rejected() {
        let spec = ElementSpec::shape(Transform::new(0.0, 0.0, -1.0, 10.0), ShapePayload::rectangle());
        assert!(matches!(Element::from_spec(spec), Err(SceneError::InvalidElement(_))));
    }

    #[test]
    fn test_bounds_with_scale_and_rotation() {
        let mut t = Transform::new(0.0, 0.0, 100.0, 50.0);
        t.scale_x = 2.0;
        let frame = t.frame();
        assert!((frame.width() - 200.0).abs() < 1e-9);
        assert!((frame.center().x - 50.0).abs() < 1e-9);

        t.rotation = 90.0;
        let bounds = t.bounds();
        assert!((bounds.width() - 50.0).abs() < 1e-6);
        assert!((bounds.height() - 200.0).abs() < 1e-6);
    }

    #[test]
    fn test_affine_maps_local_corners() {
        let t = Transform::new(10.0, 20.0, 100.0, 50.0);
        let a = t.to_affine();
        let p = a * Point::new(0.0, 0.0);
        assert!((p.x - 10.0).abs() < 1e-9 && (p.y - 20.0).abs() < 1e-9);
        let q = a * Point::new(100.0, 50.0);
        assert!((q.x - 110.0).abs() < 1e-9 && (q.y - 70.0).abs() < 1e-9);
    }

    #[test]
    fn test_hit_test_rotated() {
        let mut t = Transform::new(0.0, 0.0, 100.0, 10.0);
        t.rotation = 90.0;
        let element = Element::from_spec(ElementSpec::shape(t, ShapePayload::rectangle())).unwrap();
        // Rotated bar is vertical through the center (50, 5).
        assert!(element.hit_test(Point::new(50.0, 40.0), 0.0));
        assert!(!element.hit_test(Point::new(90.0, 5.0), 0.0));
    }

    #[test]
    fn test_patch_classification() {
        assert!(ElementPatch::position(1.0, 2.0).is_move());
        assert!(!ElementPatch::position(1.0, 2.0).is_rotate());
        assert!(ElementPatch::rotation(45.0).is_rotate());
        assert!(ElementPatch::size(10.0, 10.0).is_resize());
        assert!(!ElementPatch::default().is_resize());

        let unlock = ElementPatch {
            locked: Some(false),
            ..ElementPatch::default()
        };
        assert!(unlock.is_flags_only());
        assert!(!ElementPatch::default().is_flags_only());
        let unlock_and_move = ElementPatch {
            locked: Some(false),
            ..ElementPatch::position(1.0, 1.0)
        };
        assert!(!unlock_and_move.is_flags_only());
    }

    #[test]
    fn test_patch_rejects_kind_change() {
        let element =
            Element::from_spec(ElementSpec::text(Transform::new(0.0, 0.0, 10.0, 10.0), "hi")).unwrap();
        let patch = ElementPatch {
            payload: Some(Payload::Shape(ShapePayload::ellipse())),
            ..ElementPatch::default()
        };
        assert!(element.patched(&patch).is_err());
    }

    #[test]
    fn test_element_wire_format() {
        let element = Element::from_spec(ElementSpec::text(Transform::new(5.0, 6.0, 70.0, 20.0), "Hello")).unwrap();
        let value = serde_json::to_value(&element).unwrap();
        assert_eq!(value["kind"], "text");
        assert_eq!(value["x"], 5.0);
        assert_eq!(value["scaleX"], 1.0);
        assert_eq!(value["payload"]["content"], "Hello");

        let back: Element = serde_json::from_value(value).unwrap();
        assert_eq!(back, element);
    }

    #[test]
    fn test_payload_kind_mismatch_is_serialization_error() {
        let json = serde_json::json!({
            "id": Uuid::new_v4(),
            "kind": "image",
            "x": 0.0, "y": 0.0, "width": 1.0, "height": 1.0,
            "payload": { "geometry": { "type": "ellipse" } }
        });
        let err = serde_json::from_value::<Element>(json).unwrap_err();
        assert!(err.to_string().contains("src"));
    }

    #[test]
    fn test_inline_image_decode() {
        let image = ImagePayload::from_bytes("image/png", &[1, 2, 3]);
        let (mime, bytes) = image.decode_inline().unwrap().unwrap();
        assert_eq!(mime, "image/png");
        assert_eq!(bytes, vec![1, 2, 3]);

        let corrupt = ImagePayload::new("data:image/png;base64,@@@");
        assert!(matches!(corrupt.decode_inline(), Err(SceneError::Serialization(_))));
        assert!(ImagePayload::new("https://cdn.example/a.png").decode_inline().unwrap().is_none());
    }

    #[test]
    fn test_shape_paths() {
        assert!(ShapePayload::polygon(vec![Point::ZERO, Point::new(1.0, 0.0)]).to_path(1.0, 1.0).is_err());
        let path = ShapePayload {
            geometry: ShapeGeometry::Path { d: "M0 0 L10 0 L10 10 Z".to_string() },
        };
        assert!(path.to_path(10.0, 10.0).is_ok());
        let bad = ShapePayload {
            geometry: ShapeGeometry::Path { d: "M0 0 Q".to_string() },
        };
        assert!(bad.to_path(10.0, 10.0).is_err());
    }
}
