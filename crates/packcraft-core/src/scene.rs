//! Scene graph: the ordered arena of design elements plus canvas properties.

use crate::element::{Element, ElementId, ElementPatch, ElementSpec, Rgba, Transform};
use crate::error::{SceneError, SceneResult};
use crate::geometry;
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Default logical canvas size.
pub const DEFAULT_CANVAS_SIZE: (f64, f64) = (1000.0, 1000.0);

/// The in-memory model of a design.
///
/// Elements live in an id-keyed arena; `order` holds the paint order (back to
/// front). Both always contain exactly the same ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SceneRecord", into = "SceneRecord")]
pub struct SceneGraph {
    width: f64,
    height: f64,
    background: Rgba,
    elements: HashMap<ElementId, Element>,
    order: Vec<ElementId>,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new(DEFAULT_CANVAS_SIZE.0, DEFAULT_CANVAS_SIZE.1)
    }
}

impl SceneGraph {
    /// Create an empty graph with a white background.
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width: width.max(0.0),
            height: height.max(0.0),
            background: Rgba::white(),
            elements: HashMap::new(),
            order: Vec::new(),
        }
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn background(&self) -> Rgba {
        self.background
    }

    /// Logical canvas bounds, origin at (0, 0).
    pub fn canvas_rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }

    /// Change canvas-level properties.
    pub fn set_canvas(&mut self, width: f64, height: f64, background: Rgba) -> SceneResult<()> {
        if !(width.is_finite() && height.is_finite()) || width <= 0.0 || height <= 0.0 {
            return Err(SceneError::InvalidElement(format!(
                "canvas size must be positive, got {width}x{height}"
            )));
        }
        self.width = width;
        self.height = height;
        self.background = background;
        Ok(())
    }

    /// Add an element on top of the stack.
    pub fn add(&mut self, spec: ElementSpec) -> SceneResult<&Element> {
        let element = Element::from_spec(spec)?;
        let id = element.id();
        self.order.push(id);
        Ok(self.elements.entry(id).or_insert(element))
    }

    /// Remove an element. Missing ids are ignored so deletion stays idempotent.
    pub fn remove(&mut self, id: ElementId) -> Option<Element> {
        let removed = self.elements.remove(&id)?;
        self.order.retain(|&other| other != id);
        Some(removed)
    }

    /// Merge `patch` into an element.
    ///
    /// Locked elements only accept patches that touch nothing but the
    /// `locked` and `selectable` flags; unlocking and editing are two steps.
    pub fn update(&mut self, id: ElementId, patch: &ElementPatch) -> SceneResult<()> {
        let current = self.elements.get(&id).ok_or(SceneError::NotFound(id))?;
        if current.locked && !patch.is_flags_only() {
            return Err(SceneError::InvalidElement(format!("element {id} is locked")));
        }
        let next = current.patched(patch)?;
        self.elements.insert(id, next);
        Ok(())
    }

    /// Overwrite the transform of an element (used for live previews).
    pub fn set_transform(&mut self, id: ElementId, transform: Transform) -> SceneResult<()> {
        let element = self.elements.get_mut(&id).ok_or(SceneError::NotFound(id))?;
        if element.locked {
            return Err(SceneError::InvalidElement(format!("element {id} is locked")));
        }
        transform.validate()?;
        element.transform = transform;
        Ok(())
    }

    /// Move an element to `to_index` in paint order (clamped to the top).
    ///
    /// Returns whether the order changed.
    pub fn reorder(&mut self, id: ElementId, to_index: usize) -> SceneResult<bool> {
        let from = self.index_of(id).ok_or(SceneError::NotFound(id))?;
        let to = to_index.min(self.order.len() - 1);
        if from == to {
            return Ok(false);
        }
        let moved = self.order.remove(from);
        self.order.insert(to, moved);
        Ok(true)
    }

    /// Bring an element to the front (topmost).
    pub fn bring_to_front(&mut self, id: ElementId) -> SceneResult<bool> {
        let top = self.order.len().saturating_sub(1);
        self.reorder(id, top)
    }

    /// Send an element to the back (bottommost).
    pub fn send_to_back(&mut self, id: ElementId) -> SceneResult<bool> {
        self.reorder(id, 0)
    }

    /// Move an element one layer towards the front.
    pub fn bring_forward(&mut self, id: ElementId) -> SceneResult<bool> {
        let pos = self.index_of(id).ok_or(SceneError::NotFound(id))?;
        self.reorder(id, pos + 1)
    }

    /// Move an element one layer towards the back.
    pub fn send_backward(&mut self, id: ElementId) -> SceneResult<bool> {
        let pos = self.index_of(id).ok_or(SceneError::NotFound(id))?;
        self.reorder(id, pos.saturating_sub(1))
    }

    /// Copy an element, offset it and stack the copy directly above the source.
    pub fn duplicate(&mut self, id: ElementId, offset: Vec2) -> SceneResult<ElementId> {
        let pos = self.index_of(id).ok_or(SceneError::NotFound(id))?;
        let mut copy = self.elements.get(&id).ok_or(SceneError::NotFound(id))?.clone();
        copy.regenerate_id();
        copy.transform.x += offset.x;
        copy.transform.y += offset.y;
        copy.validate()?;

        let copy_id = copy.id();
        self.elements.insert(copy_id, copy);
        self.order.insert(pos + 1, copy_id);
        Ok(copy_id)
    }

    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(&id)
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.elements.contains_key(&id)
    }

    /// Position of an element in paint order.
    pub fn index_of(&self, id: ElementId) -> Option<usize> {
        self.order.iter().position(|&other| other == id)
    }

    /// Ids in paint order (back to front).
    pub fn ids_in_order(&self) -> &[ElementId] {
        &self.order
    }

    /// Elements in paint order (back to front).
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.order.iter().filter_map(|id| self.elements.get(id))
    }

    /// Lazily evaluated, restartable filter over the elements in paint order.
    pub fn query<P>(&self, predicate: P) -> Query<'_, P>
    where
        P: Fn(&Element) -> bool,
    {
        Query {
            graph: self,
            predicate,
        }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Union of all element bounds.
    pub fn content_bounds(&self) -> Option<Rect> {
        geometry::union_all(self.elements().map(Element::bounds))
    }

    /// Elements under a point, front to back.
    pub fn elements_at_point(&self, point: Point, tolerance: f64) -> Vec<ElementId> {
        self.order
            .iter()
            .rev()
            .filter(|id| {
                self.elements
                    .get(*id)
                    .is_some_and(|e| e.selectable && e.hit_test(point, tolerance))
            })
            .copied()
            .collect()
    }

    /// Elements whose bounds overlap `rect`, in paint order.
    pub fn elements_in_rect(&self, rect: Rect) -> Vec<ElementId> {
        self.query(|e| e.selectable && rect.intersect(e.bounds()).area() > 0.0)
            .iter()
            .map(Element::id)
            .collect()
    }

    /// Serialize to the JSON document format.
    pub fn to_json(&self) -> SceneResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and validate a JSON document.
    pub fn from_json(json: &str) -> SceneResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Result of [`SceneGraph::query`]. Each call to [`Query::iter`] starts over.
pub struct Query<'a, P> {
    graph: &'a SceneGraph,
    predicate: P,
}

impl<'a, P> Query<'a, P>
where
    P: Fn(&Element) -> bool,
{
    pub fn iter(&self) -> impl Iterator<Item = &'a Element> + '_ {
        self.graph.elements().filter(move |e| (self.predicate)(e))
    }

    pub fn first(&self) -> Option<&'a Element> {
        self.iter().next()
    }

    pub fn count(&self) -> usize {
        self.iter().count()
    }
}

/// Wire form: `{ width, height, background, elements: [...] }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SceneRecord {
    width: f64,
    height: f64,
    #[serde(default = "Rgba::white")]
    background: Rgba,
    #[serde(default)]
    elements: Vec<Element>,
}

impl TryFrom<SceneRecord> for SceneGraph {
    type Error = SceneError;

    fn try_from(record: SceneRecord) -> Result<Self, Self::Error> {
        let mut graph = SceneGraph::new(0.0, 0.0);
        graph
            .set_canvas(record.width, record.height, record.background)
            .map_err(|e| SceneError::Serialization(e.to_string()))?;

        let mut seen = HashSet::with_capacity(record.elements.len());
        for element in record.elements {
            let id = element.id();
            if !seen.insert(id) {
                return Err(SceneError::Serialization(format!("duplicate element id {id}")));
            }
            graph.order.push(id);
            graph.elements.insert(id, element);
        }
        Ok(graph)
    }
}

impl From<SceneGraph> for SceneRecord {
    fn from(mut graph: SceneGraph) -> Self {
        let elements = graph
            .order
            .iter()
            .filter_map(|id| graph.elements.remove(id))
            .collect();
        Self {
            width: graph.width,
            height: graph.height,
            background: graph.background,
            elements,
        }
    }
}
