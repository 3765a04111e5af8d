//! Snapping and alignment for elements being manipulated.

use crate::element::ElementId;
use crate::geometry::{self, EPSILON};
use crate::scene::SceneGraph;
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Default snap distance in canvas units.
pub const DEFAULT_SNAP_TOLERANCE: f64 = 10.0;

/// Default grid cell size.
pub const DEFAULT_GRID_SIZE: f64 = 20.0;

/// Angle snap increment in degrees.
pub const ANGLE_SNAP_INCREMENT: f64 = 15.0;

/// What a moving element snaps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapMode {
    /// No snapping.
    None,
    /// Snap the top-left corner to grid intersections.
    Grid,
    /// Snap edges and centers to other elements.
    #[default]
    Elements,
    /// Elements first, grid as a fallback per axis.
    All,
}

impl SnapMode {
    /// Cycle to the next snap mode.
    pub fn next(self) -> Self {
        match self {
            SnapMode::None => SnapMode::Grid,
            SnapMode::Grid => SnapMode::Elements,
            SnapMode::Elements => SnapMode::All,
            SnapMode::All => SnapMode::None,
        }
    }

    pub fn snaps_to_grid(self) -> bool {
        matches!(self, SnapMode::Grid | SnapMode::All)
    }

    pub fn snaps_to_elements(self) -> bool {
        matches!(self, SnapMode::Elements | SnapMode::All)
    }

    pub fn is_enabled(self) -> bool {
        self != SnapMode::None
    }
}

/// Axis a snap acts on. A horizontal snap moves along x and draws a vertical guide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
}

/// Which part of a rectangle lines up on an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Anchor {
    Start,
    Center,
    End,
}

fn anchors(rect: Rect, axis: Axis) -> [(Anchor, f64); 3] {
    match axis {
        Axis::X => [
            (Anchor::Start, rect.x0),
            (Anchor::Center, rect.center().x),
            (Anchor::End, rect.x1),
        ],
        Axis::Y => [
            (Anchor::Start, rect.y0),
            (Anchor::Center, rect.center().y),
            (Anchor::End, rect.y1),
        ],
    }
}

/// Guide line produced by a snap, for visual feedback.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapGuide {
    pub axis: Axis,
    /// Coordinate of the guide on `axis`.
    pub position: f64,
    pub moving: Anchor,
    /// `None` when snapped to the grid.
    pub target: Option<Anchor>,
}

/// Result of snapping a moving rectangle.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SnapOutcome {
    /// Correction to add to the proposed position.
    pub offset: Vec2,
    pub snapped_x: bool,
    pub snapped_y: bool,
    pub guides: Vec<SnapGuide>,
}

impl SnapOutcome {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_snapped(&self) -> bool {
        self.snapped_x || self.snapped_y
    }

    pub fn apply(&self, rect: Rect) -> Rect {
        rect + self.offset
    }
}

#[derive(Debug, Clone, Copy)]
struct AxisSnap {
    delta: f64,
    guide: SnapGuide,
}

/// Computes snap corrections against other elements, the canvas and the grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Aligner {
    pub tolerance: f64,
    pub mode: SnapMode,
    pub grid_size: f64,
    /// Canvas rectangle whose edges and center act as extra targets.
    pub canvas: Option<Rect>,
}

impl Default for Aligner {
    fn default() -> Self {
        Self::new(DEFAULT_SNAP_TOLERANCE)
    }
}

impl Aligner {
    pub fn new(tolerance: f64) -> Self {
        Self {
            tolerance,
            mode: SnapMode::default(),
            grid_size: DEFAULT_GRID_SIZE,
            canvas: None,
        }
    }

    pub fn with_mode(mut self, mode: SnapMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_grid(mut self, grid_size: f64) -> Self {
        self.grid_size = grid_size;
        self
    }

    pub fn with_canvas_guides(mut self, canvas: Option<Rect>) -> Self {
        self.canvas = canvas;
        self
    }

    /// Snap `moving` to the nearest target anchors, independently per axis.
    ///
    /// Only pairs strictly closer than the tolerance qualify; the smallest
    /// distance wins, earlier targets win ties.
    pub fn snap_rect(&self, moving: Rect, targets: &[Rect]) -> SnapOutcome {
        if !self.mode.is_enabled() {
            return SnapOutcome::none();
        }

        let mut outcome = SnapOutcome::none();
        for axis in [Axis::X, Axis::Y] {
            let mut best = None;
            if self.mode.snaps_to_elements() {
                best = self.closest_anchor(moving, targets.iter().chain(self.canvas.iter()), axis);
            }
            if best.is_none() && self.mode.snaps_to_grid() {
                best = self.grid_anchor(moving, axis);
            }
            let Some(snap) = best else { continue };

            match axis {
                Axis::X => {
                    outcome.offset.x = snap.delta;
                    outcome.snapped_x = true;
                }
                Axis::Y => {
                    outcome.offset.y = snap.delta;
                    outcome.snapped_y = true;
                }
            }
            outcome.guides.push(snap.guide);
        }
        outcome
    }

    /// Snap a proposed frame for `id` against every other element in the graph.
    pub fn snap_in_scene(&self, graph: &SceneGraph, id: ElementId, proposed: Rect) -> SnapOutcome {
        let targets: Vec<Rect> = graph
            .elements()
            .filter(|e| e.id() != id)
            .map(|e| e.bounds())
            .collect();
        self.snap_rect(proposed, &targets)
    }

    fn closest_anchor<'a>(
        &self,
        moving: Rect,
        targets: impl Iterator<Item = &'a Rect>,
        axis: Axis,
    ) -> Option<AxisSnap> {
        let mut best: Option<AxisSnap> = None;
        for target in targets {
            for (moving_anchor, from) in anchors(moving, axis) {
                for (target_anchor, to) in anchors(*target, axis) {
                    let delta = to - from;
                    if !geometry::within_tolerance(from, to, self.tolerance) {
                        continue;
                    }
                    if best.is_some_and(|b| b.delta.abs() <= delta.abs()) {
                        continue;
                    }
                    best = Some(AxisSnap {
                        delta,
                        guide: SnapGuide {
                            axis,
                            position: to,
                            moving: moving_anchor,
                            target: Some(target_anchor),
                        },
                    });
                }
            }
        }
        best
    }

    fn grid_anchor(&self, moving: Rect, axis: Axis) -> Option<AxisSnap> {
        if self.grid_size <= EPSILON {
            return None;
        }
        let from = match axis {
            Axis::X => moving.x0,
            Axis::Y => moving.y0,
        };
        let to = (from / self.grid_size).round() * self.grid_size;
        if !geometry::within_tolerance(from, to, self.tolerance) {
            return None;
        }
        Some(AxisSnap {
            delta: to - from,
            guide: SnapGuide {
                axis,
                position: to,
                moving: Anchor::Start,
                target: None,
            },
        })
    }
}

/// Snap a point to the nearest grid intersection.
pub fn snap_to_grid(point: Point, grid_size: f64) -> Point {
    if grid_size <= EPSILON {
        return point;
    }
    Point::new(
        (point.x / grid_size).round() * grid_size,
        (point.y / grid_size).round() * grid_size,
    )
}

/// Snap an angle to the nearest increment.
/// Returns the snapped angle in degrees (0-360).
pub fn snap_angle(angle_degrees: f64, increment: f64) -> f64 {
    if increment <= EPSILON {
        return angle_degrees;
    }
    let snapped = (angle_degrees / increment).round() * increment;
    snapped.rem_euclid(360.0)
}

/// Alignment of several elements relative to a reference rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    Center,
    Right,
    Top,
    Middle,
    Bottom,
}

/// Offsets that align each rect to `reference`, or to the union of all rects.
pub fn align_rects(rects: &[Rect], alignment: Alignment, reference: Option<Rect>) -> Vec<Vec2> {
    let Some(reference) = reference.or_else(|| geometry::union_all(rects.iter().copied())) else {
        return Vec::new();
    };
    rects
        .iter()
        .map(|r| match alignment {
            Alignment::Left => Vec2::new(reference.x0 - r.x0, 0.0),
            Alignment::Center => Vec2::new(reference.center().x - r.center().x, 0.0),
            Alignment::Right => Vec2::new(reference.x1 - r.x1, 0.0),
            Alignment::Top => Vec2::new(0.0, reference.y0 - r.y0),
            Alignment::Middle => Vec2::new(0.0, reference.center().y - r.center().y),
            Alignment::Bottom => Vec2::new(0.0, reference.y1 - r.y1),
        })
        .collect()
}
