//! Editor session: the owned scene, its history and the manipulation state.
//!
//! All edits go through [`EditorSession`]. Discrete edits are committed to
//! history immediately. Continuous manipulation (drag, rotate, resize) goes
//! through the `preview*` calls, which update the live scene only, and lands in
//! history once [`EditorSession::commit`] is called.

use crate::align::{self, Aligner, Alignment, SnapOutcome};
use crate::config::EditorConfig;
use crate::element::{ElementId, ElementKind, ElementPatch, ElementSpec, Rgba, Transform};
use crate::error::{SceneError, SceneResult};
use crate::history::{ActionKind, HistoryManager};
use crate::scene::SceneGraph;
use kurbo::Vec2;
use std::time::{Duration, Instant};

/// Offset applied to duplicated elements.
pub const DUPLICATE_OFFSET: Vec2 = Vec2::new(10.0, 10.0);

/// Coalesces high-frequency preview updates to at most one frame per interval.
#[derive(Debug, Clone)]
pub struct FrameThrottle {
    interval: Duration,
    last_frame: Option<Instant>,
}

impl FrameThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_frame: None,
        }
    }

    /// Whether a frame should be drawn at `now`. Records the frame if so.
    pub fn should_emit(&mut self, now: Instant) -> bool {
        let due = self
            .last_frame
            .is_none_or(|last| now.saturating_duration_since(last) >= self.interval);
        if due {
            self.last_frame = Some(now);
        }
        due
    }

    /// Forget the last frame so the next update is drawn immediately.
    pub fn reset(&mut self) {
        self.last_frame = None;
    }
}

/// Transient manipulation not yet in history.
#[derive(Debug, Clone, Copy)]
struct PendingPreview {
    id: ElementId,
    original: Transform,
}

/// An explicitly owned editing session over one design.
#[derive(Debug, Clone)]
pub struct EditorSession {
    graph: SceneGraph,
    history: HistoryManager,
    aligner: Aligner,
    config: EditorConfig,
    pending: Option<PendingPreview>,
    throttle: FrameThrottle,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl EditorSession {
    pub fn new(config: EditorConfig) -> Self {
        Self::with_graph(SceneGraph::default(), config)
    }

    /// Open a session on an existing design. The design becomes the undo floor.
    pub fn with_graph(graph: SceneGraph, config: EditorConfig) -> Self {
        let history = HistoryManager::new(&graph, config.history_limit);
        let aligner = config.aligner().with_canvas_guides(Some(graph.canvas_rect()));
        Self {
            throttle: FrameThrottle::new(config.frame_interval()),
            graph,
            history,
            aligner,
            config,
            pending: None,
        }
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn aligner(&self) -> &Aligner {
        &self.aligner
    }

    pub fn set_snap_mode(&mut self, mode: align::SnapMode) {
        self.aligner.mode = mode;
    }

    pub fn is_previewing(&self) -> bool {
        self.pending.is_some()
    }

    fn record(&mut self, kind: ActionKind, description: impl Into<String>) {
        self.history.commit(&self.graph, kind, description);
    }

    /// Land any in-flight manipulation before a discrete edit.
    fn settle_preview(&mut self) {
        if self.pending.is_some() {
            self.commit();
        }
    }

    /// Run a discrete edit. A pending preview is committed only once the edit
    /// has succeeded; a failed edit leaves the preview in flight.
    fn apply<T>(&mut self, op: impl FnOnce(&mut SceneGraph) -> SceneResult<T>) -> SceneResult<T> {
        if self.pending.is_none() {
            return op(&mut self.graph);
        }
        let mut next = self.graph.clone();
        let value = op(&mut next)?;
        self.settle_preview();
        self.graph = next;
        Ok(value)
    }

    pub fn add_element(&mut self, spec: ElementSpec) -> SceneResult<ElementId> {
        let (id, kind) = self.apply(|graph| graph.add(spec).map(|e| (e.id(), e.kind())))?;
        let (action, label) = match kind {
            ElementKind::Text => (ActionKind::AddText, "text"),
            ElementKind::Image => (ActionKind::AddImage, "image"),
            ElementKind::Shape => (ActionKind::AddShape, "shape"),
        };
        self.record(action, format!("Add {label}"));
        Ok(id)
    }

    /// Delete an element. Returns false (and records nothing) if it was absent.
    pub fn remove_element(&mut self, id: ElementId) -> bool {
        if !self.graph.contains(id) {
            return false;
        }
        self.settle_preview();
        let Some(removed) = self.graph.remove(id) else {
            return false;
        };
        self.record(ActionKind::Delete, format!("Delete {:?}", removed.kind()).to_lowercase());
        true
    }

    /// Merge a partial change into an element and commit it.
    ///
    /// The history action is inferred from the fields the patch touches.
    pub fn update_element(&mut self, id: ElementId, patch: &ElementPatch) -> SceneResult<()> {
        if patch.is_empty() {
            return if self.graph.contains(id) {
                Ok(())
            } else {
                Err(SceneError::NotFound(id))
            };
        }
        self.apply(|graph| graph.update(id, patch))?;

        let (kind, description) = if patch.is_move() {
            (ActionKind::Move, "Move element")
        } else if patch.is_rotate() {
            (ActionKind::Rotate, "Rotate element")
        } else if patch.is_resize() {
            (ActionKind::Scale, "Resize element")
        } else {
            (ActionKind::Style, "Edit element")
        };
        self.record(kind, description);
        Ok(())
    }

    /// Move an element to a paint-order index. Unchanged order records nothing.
    pub fn reorder(&mut self, id: ElementId, to_index: usize) -> SceneResult<bool> {
        let changed = self.apply(|graph| graph.reorder(id, to_index))?;
        if changed {
            self.record(ActionKind::Reorder, format!("Move to layer {to_index}"));
        }
        Ok(changed)
    }

    pub fn bring_to_front(&mut self, id: ElementId) -> SceneResult<bool> {
        let changed = self.apply(|graph| graph.bring_to_front(id))?;
        if changed {
            self.record(ActionKind::Reorder, "Bring to front");
        }
        Ok(changed)
    }

    pub fn send_to_back(&mut self, id: ElementId) -> SceneResult<bool> {
        let changed = self.apply(|graph| graph.send_to_back(id))?;
        if changed {
            self.record(ActionKind::Reorder, "Send to back");
        }
        Ok(changed)
    }

    pub fn duplicate(&mut self, id: ElementId) -> SceneResult<ElementId> {
        let copy = self.apply(|graph| graph.duplicate(id, DUPLICATE_OFFSET))?;
        self.record(ActionKind::Duplicate, "Duplicate element");
        Ok(copy)
    }

    /// Align elements to their common bounds, or to the canvas.
    ///
    /// All-or-nothing: a locked or missing element aborts the whole alignment.
    pub fn align(&mut self, ids: &[ElementId], alignment: Alignment, to_canvas: bool) -> SceneResult<()> {
        let mut rects = Vec::with_capacity(ids.len());
        for &id in ids {
            let element = self.graph.get(id).ok_or(SceneError::NotFound(id))?;
            rects.push(element.bounds());
        }
        let reference = to_canvas.then(|| self.graph.canvas_rect());
        let offsets = align::align_rects(&rects, alignment, reference);

        let mut next = self.graph.clone();
        for (&id, offset) in ids.iter().zip(offsets) {
            if offset == Vec2::ZERO {
                continue;
            }
            let current = next.get(id).ok_or(SceneError::NotFound(id))?.transform;
            next.update(id, &ElementPatch::position(current.x + offset.x, current.y + offset.y))?;
        }
        if next == self.graph {
            return Ok(());
        }
        self.settle_preview();
        self.graph = next;
        self.record(ActionKind::Align, format!("Align {alignment:?}").to_lowercase());
        Ok(())
    }

    pub fn set_canvas(&mut self, width: f64, height: f64, background: Rgba) -> SceneResult<()> {
        self.apply(|graph| graph.set_canvas(width, height, background))?;
        self.aligner.canvas = Some(self.graph.canvas_rect());
        self.record(ActionKind::Style, "Change canvas");
        Ok(())
    }

    /// Show a transient transform without touching history.
    ///
    /// Returns whether a redraw frame is due under the frame throttle; the live
    /// state is updated either way.
    pub fn preview(&mut self, id: ElementId, transform: Transform) -> SceneResult<bool> {
        let current = self.graph.get(id).ok_or(SceneError::NotFound(id))?.transform;
        if self.pending.is_some_and(|p| p.id != id) {
            // Switching targets lands the previous manipulation first.
            self.apply(|graph| graph.set_transform(id, transform))?;
        } else {
            self.graph.set_transform(id, transform)?;
        }
        if self.pending.is_none() {
            self.pending = Some(PendingPreview { id, original: current });
        }
        Ok(self.throttle.should_emit(Instant::now()))
    }

    /// Preview moving an element's top-left to (`x`, `y`) with snapping applied.
    pub fn preview_move(&mut self, id: ElementId, x: f64, y: f64) -> SceneResult<SnapOutcome> {
        let mut transform = self.graph.get(id).ok_or(SceneError::NotFound(id))?.transform;
        transform.x = x;
        transform.y = y;

        let outcome = self.aligner.snap_in_scene(&self.graph, id, transform.bounds());
        transform.x += outcome.offset.x;
        transform.y += outcome.offset.y;
        self.preview(id, transform)?;
        Ok(outcome)
    }

    /// Preview a rotation, optionally snapped to the configured increment.
    /// Returns the applied angle.
    pub fn preview_rotate(&mut self, id: ElementId, degrees: f64, snap: bool) -> SceneResult<f64> {
        let mut transform = self.graph.get(id).ok_or(SceneError::NotFound(id))?.transform;
        transform.rotation = if snap {
            align::snap_angle(degrees, self.config.angle_snap_increment)
        } else {
            degrees
        };
        self.preview(id, transform)?;
        Ok(transform.rotation)
    }

    /// Commit the pending manipulation. Returns false if nothing changed.
    pub fn commit(&mut self) -> bool {
        let Some(pending) = self.pending.take() else {
            return false;
        };
        self.throttle.reset();
        let Some(element) = self.graph.get(pending.id) else {
            return false;
        };
        let (before, after) = (pending.original, element.transform);
        if before == after {
            return false;
        }

        let (kind, description) = if before.rotation != after.rotation {
            (ActionKind::Rotate, "Rotate element")
        } else if (before.width, before.height, before.scale_x, before.scale_y)
            != (after.width, after.height, after.scale_x, after.scale_y)
        {
            (ActionKind::Scale, "Resize element")
        } else {
            (ActionKind::Move, "Move element")
        };
        self.record(kind, description);
        true
    }

    /// Abandon the pending manipulation and restore the element.
    pub fn cancel_preview(&mut self) -> bool {
        let Some(pending) = self.pending.take() else {
            return false;
        };
        self.throttle.reset();
        if let Err(e) = self.graph.set_transform(pending.id, pending.original) {
            log::warn!("Could not restore element {} after preview: {e}", pending.id);
        }
        true
    }

    pub fn undo(&mut self) -> bool {
        self.cancel_preview();
        match self.history.undo() {
            Some(entry) => {
                self.graph = entry.state.clone();
                self.aligner.canvas = Some(self.graph.canvas_rect());
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        self.cancel_preview();
        match self.history.redo() {
            Some(entry) => {
                self.graph = entry.state.clone();
                self.aligner.canvas = Some(self.graph.canvas_rect());
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Replace the design with a JSON document and start a fresh history.
    pub fn load_json(&mut self, json: &str) -> SceneResult<()> {
        let graph = SceneGraph::from_json(json)?;
        self.pending = None;
        self.throttle.reset();
        self.history.reset(&graph);
        self.aligner.canvas = Some(graph.canvas_rect());
        self.graph = graph;
        log::info!("Loaded design with {} elements", self.graph.len());
        Ok(())
    }

    /// Serialize the committed design; a pending preview is excluded.
    pub fn to_json(&self) -> SceneResult<String> {
        match self.pending {
            Some(_) => self.history.current().state.to_json(),
            None => self.graph.to_json(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{ElementStyle, ShapePayload};

    fn rect(x: f64, y: f64, w: f64, h: f64) -> ElementSpec {
        ElementSpec::shape(Transform::new(x, y, w, h), ShapePayload::rectangle())
    }

    #[test]
    fn test_add_commits_with_kind() {
        let mut session = EditorSession::default();
        session.add_element(rect(0.0, 0.0, 10.0, 10.0)).unwrap();
        session
            .add_element(ElementSpec::text(Transform::new(0.0, 0.0, 50.0, 20.0), "Hi"))
            .unwrap();

        let kinds: Vec<_> = session.history().entries().iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![ActionKind::Load, ActionKind::AddShape, ActionKind::AddText]);
    }

    #[test]
    fn test_failed_operation_leaves_state_untouched() {
        let mut session = EditorSession::default();
        let id = session.add_element(rect(0.0, 0.0, 10.0, 10.0)).unwrap();
        let graph = session.graph().clone();
        let history_len = session.history().len();

        assert!(session.add_element(rect(0.0, 0.0, -1.0, 10.0)).is_err());
        assert!(session.update_element(id, &ElementPatch::size(-1.0, 1.0)).is_err());
        let missing = ElementId::new_v4();
        assert_eq!(
            session.update_element(missing, &ElementPatch::position(0.0, 0.0)),
            Err(SceneError::NotFound(missing))
        );

        assert_eq!(session.graph(), &graph);
        assert_eq!(session.history().len(), history_len);
    }

    #[test]
    fn test_failed_operation_keeps_pending_preview() {
        let mut session = EditorSession::default();
        let id = session.add_element(rect(0.0, 0.0, 10.0, 10.0)).unwrap();
        let mut spec = rect(200.0, 200.0, 10.0, 10.0);
        spec.locked = true;
        let locked = session.add_element(spec).unwrap();
        let history_len = session.history().len();

        session.preview(id, Transform::new(40.0, 0.0, 10.0, 10.0)).unwrap();
        let live = session.graph().clone();
        let missing = ElementId::new_v4();

        assert!(session.add_element(rect(0.0, 0.0, -1.0, 10.0)).is_err());
        assert!(session.update_element(missing, &ElementPatch::position(0.0, 0.0)).is_err());
        assert!(session.update_element(id, &ElementPatch::size(-1.0, 1.0)).is_err());
        assert!(session.reorder(missing, 0).is_err());
        assert!(session.bring_to_front(missing).is_err());
        assert!(session.send_to_back(missing).is_err());
        assert!(session.duplicate(missing).is_err());
        assert!(session.align(&[id, missing], Alignment::Left, false).is_err());
        assert!(session.set_canvas(-5.0, 10.0, Rgba::white()).is_err());
        assert!(!session.remove_element(missing));
        assert!(session.preview(missing, Transform::new(1.0, 1.0, 1.0, 1.0)).is_err());
        assert!(session.preview(locked, Transform::new(1.0, 1.0, 10.0, 10.0)).is_err());

        assert!(session.is_previewing());
        assert_eq!(session.graph(), &live);
        assert_eq!(session.history().len(), history_len);

        // The preview is still cancellable after the failures.
        assert!(session.cancel_preview());
        assert_eq!(session.graph().get(id).unwrap().transform.x, 0.0);
    }

    #[test]
    fn test_successful_edit_commits_pending_preview() {
        let mut session = EditorSession::default();
        let id = session.add_element(rect(0.0, 0.0, 10.0, 10.0)).unwrap();
        let len = session.history().len();

        session.preview(id, Transform::new(40.0, 0.0, 10.0, 10.0)).unwrap();
        session.add_element(rect(100.0, 100.0, 10.0, 10.0)).unwrap();

        assert!(!session.is_previewing());
        let kinds: Vec<_> = session.history().entries()[len..].iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![ActionKind::Move, ActionKind::AddShape]);
    }

    #[test]
    fn test_remove_idempotent() {
        let mut session = EditorSession::default();
        let id = session.add_element(rect(0.0, 0.0, 10.0, 10.0)).unwrap();
        assert!(session.remove_element(id));
        let len = session.history().len();
        assert!(!session.remove_element(id));
        assert_eq!(session.history().len(), len);
    }

    #[test]
    fn test_update_infers_action_kind() {
        let mut session = EditorSession::default();
        let id = session.add_element(rect(0.0, 0.0, 10.0, 10.0)).unwrap();

        session.update_element(id, &ElementPatch::position(5.0, 5.0)).unwrap();
        session.update_element(id, &ElementPatch::rotation(30.0)).unwrap();
        session.update_element(id, &ElementPatch::size(20.0, 20.0)).unwrap();
        session
            .update_element(id, &ElementPatch::style(ElementStyle::default()))
            .unwrap();

        let kinds: Vec<_> = session.history().entries()[2..].iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![ActionKind::Move, ActionKind::Rotate, ActionKind::Scale, ActionKind::Style]
        );
    }

    #[test]
    fn test_preview_does_not_touch_history_until_commit() {
        let mut session = EditorSession::default();
        let id = session.add_element(rect(0.0, 0.0, 10.0, 10.0)).unwrap();
        let len = session.history().len();

        for step in 1..=20 {
            let t = Transform::new(step as f64 * 7.0, 0.0, 10.0, 10.0);
            session.preview(id, t).unwrap();
        }
        assert_eq!(session.history().len(), len);
        assert!(session.is_previewing());
        assert_eq!(session.graph().get(id).unwrap().transform.x, 140.0);

        assert!(session.commit());
        assert_eq!(session.history().len(), len + 1);
        assert_eq!(session.history().current().kind, ActionKind::Move);
        assert!(!session.commit());

        assert!(session.undo());
        assert_eq!(session.graph().get(id).unwrap().transform.x, 0.0);
    }

    #[test]
    fn test_cancel_preview_restores() {
        let mut session = EditorSession::default();
        let id = session.add_element(rect(0.0, 0.0, 10.0, 10.0)).unwrap();
        let before = session.graph().clone();

        session.preview_rotate(id, 33.0, false).unwrap();
        assert!(session.cancel_preview());
        assert_eq!(session.graph(), &before);
        assert!(!session.commit());
    }

    #[test]
    fn test_undo_cancels_pending_preview() {
        let mut session = EditorSession::default();
        let id = session.add_element(rect(0.0, 0.0, 10.0, 10.0)).unwrap();
        session.update_element(id, &ElementPatch::position(50.0, 0.0)).unwrap();

        session.preview(id, Transform::new(300.0, 300.0, 10.0, 10.0)).unwrap();
        assert!(session.undo());
        assert!(!session.is_previewing());
        assert_eq!(session.graph().get(id).unwrap().transform.x, 0.0);
        assert!(session.redo());
        assert_eq!(session.graph().get(id).unwrap().transform.x, 50.0);
    }

    #[test]
    fn test_preview_move_snaps_left_edge() {
        let mut session = EditorSession::default();
        session.add_element(rect(100.0, 0.0, 50.0, 50.0)).unwrap();
        let moving = session.add_element(rect(300.0, 400.0, 50.0, 50.0)).unwrap();
        session.set_snap_mode(align::SnapMode::Elements);

        let outcome = session.preview_move(moving, 104.0, 407.0).unwrap();
        assert!(outcome.snapped_x);
        assert_eq!(session.graph().get(moving).unwrap().transform.x, 100.0);
        assert!(session.commit());
        assert_eq!(session.history().current().kind, ActionKind::Move);
    }

    #[test]
    fn test_preview_move_keeps_free_position_by_default() {
        let mut session = EditorSession::default();
        session.add_element(rect(0.0, 0.0, 50.0, 50.0)).unwrap();
        let moving = session.add_element(rect(600.0, 600.0, 50.0, 50.0)).unwrap();

        let outcome = session.preview_move(moving, 333.0, 417.0).unwrap();
        assert!(!outcome.is_snapped());
        let t = session.graph().get(moving).unwrap().transform;
        assert_eq!((t.x, t.y), (333.0, 417.0));
    }

    #[test]
    fn test_preview_rotate_snaps_angle() {
        let mut session = EditorSession::default();
        let id = session.add_element(rect(0.0, 0.0, 10.0, 10.0)).unwrap();
        assert_eq!(session.preview_rotate(id, 44.0, true).unwrap(), 45.0);
        session.commit();
        assert_eq!(session.history().current().kind, ActionKind::Rotate);
    }

    #[test]
    fn test_locked_rejects_preview() {
        let mut session = EditorSession::default();
        let mut spec = rect(0.0, 0.0, 10.0, 10.0);
        spec.locked = true;
        let id = session.add_element(spec).unwrap();
        assert!(session.preview(id, Transform::new(5.0, 5.0, 10.0, 10.0)).is_err());
        assert!(!session.is_previewing());
        // Deletion still works.
        assert!(session.remove_element(id));
    }

    #[test]
    fn test_align_to_common_left() {
        let mut session = EditorSession::default();
        let a = session.add_element(rect(10.0, 0.0, 10.0, 10.0)).unwrap();
        let b = session.add_element(rect(40.0, 20.0, 10.0, 10.0)).unwrap();
        session.align(&[a, b], Alignment::Left, false).unwrap();

        assert_eq!(session.graph().get(b).unwrap().transform.x, 10.0);
        assert_eq!(session.history().current().kind, ActionKind::Align);

        let len = session.history().len();
        session.align(&[a, b], Alignment::Left, false).unwrap();
        assert_eq!(session.history().len(), len);
    }

    #[test]
    fn test_align_is_atomic() {
        let mut session = EditorSession::default();
        let a = session.add_element(rect(10.0, 0.0, 10.0, 10.0)).unwrap();
        let mut locked = rect(40.0, 20.0, 10.0, 10.0);
        locked.locked = true;
        let b = session.add_element(locked).unwrap();
        let c = session.add_element(rect(70.0, 20.0, 10.0, 10.0)).unwrap();
        let before = session.graph().clone();

        assert!(session.align(&[a, c, b], Alignment::Right, false).is_err());
        assert_eq!(session.graph(), &before);
    }

    #[test]
    fn test_duplicate_and_reorder() {
        let mut session = EditorSession::default();
        let a = session.add_element(rect(0.0, 0.0, 10.0, 10.0)).unwrap();
        let copy = session.duplicate(a).unwrap();
        assert_eq!(session.graph().get(copy).unwrap().transform.x, 10.0);
        assert!(session.send_to_back(copy).unwrap());
        assert_eq!(session.graph().ids_in_order(), &[copy, a]);
        assert!(!session.send_to_back(copy).unwrap());
        assert_eq!(session.history().current().kind, ActionKind::Reorder);
    }

    #[test]
    fn test_load_json_resets_history() {
        let mut source = EditorSession::default();
        source.add_element(rect(0.0, 0.0, 10.0, 10.0)).unwrap();
        let json = source.to_json().unwrap();

        let mut session = EditorSession::default();
        session.add_element(rect(5.0, 5.0, 5.0, 5.0)).unwrap();
        session.load_json(&json).unwrap();
        assert_eq!(session.history().len(), 1);
        assert!(!session.can_undo());
        assert_eq!(session.graph(), source.graph());

        assert!(session.load_json("{").is_err());
        assert_eq!(session.graph(), source.graph());
    }

    #[test]
    fn test_to_json_excludes_pending_preview() {
        let mut session = EditorSession::default();
        let id = session.add_element(rect(0.0, 0.0, 10.0, 10.0)).unwrap();
        let committed = session.to_json().unwrap();
        session.preview(id, Transform::new(90.0, 90.0, 10.0, 10.0)).unwrap();
        assert_eq!(session.to_json().unwrap(), committed);
    }

    #[test]
    fn test_frame_throttle() {
        let mut throttle = FrameThrottle::new(Duration::from_millis(16));
        let start = Instant::now();
        assert!(throttle.should_emit(start));
        assert!(!throttle.should_emit(start + Duration::from_millis(5)));
        assert!(!throttle.should_emit(start + Duration::from_millis(15)));
        assert!(throttle.should_emit(start + Duration::from_millis(16)));
        throttle.reset();
        assert!(throttle.should_emit(start + Duration::from_millis(17)));
    }
}
