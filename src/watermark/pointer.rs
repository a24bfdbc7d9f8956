//! Drag-to-position handling.
//!
//! A two-state machine (`Idle`, `Dragging`) that turns pointer events into
//! anchor updates. Coordinates are normalized against the canvas element's
//! on-screen rectangle, which may be scaled relative to the surface.

use super::state::Anchor;

/// Kind of pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEventKind {
    Down,
    Move,
    Up,
    Leave,
}

/// A pointer event in client (screen) coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerEventKind,
    pub client_x: f32,
    pub client_y: f32,
}

impl PointerEvent {
    pub fn new(kind: PointerEventKind, client_x: f32, client_y: f32) -> Self {
        Self {
            kind,
            client_x,
            client_y,
        }
    }

    pub fn down(x: f32, y: f32) -> Self {
        Self::new(PointerEventKind::Down, x, y)
    }

    pub fn moved(x: f32, y: f32) -> Self {
        Self::new(PointerEventKind::Move, x, y)
    }

    pub fn up(x: f32, y: f32) -> Self {
        Self::new(PointerEventKind::Up, x, y)
    }

    pub fn leave(x: f32, y: f32) -> Self {
        Self::new(PointerEventKind::Leave, x, y)
    }
}

/// On-screen bounding box of the canvas element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl ElementRect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Normalize a client position to this rectangle, clamped to `[0, 1]`.
    ///
    /// Returns `None` for a rectangle with no area.
    pub fn normalize(&self, client_x: f32, client_y: f32) -> Option<Anchor> {
        if !(self.width > 0.0 && self.height > 0.0) {
            return None;
        }
        Some(Anchor::new(
            (client_x - self.left) / self.width,
            (client_y - self.top) / self.height,
        ))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging,
}

/// Interprets pointer events into anchor commits.
#[derive(Debug, Default)]
pub struct PointerController {
    state: DragState,
}

impl PointerController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        self.state == DragState::Dragging
    }

    /// Feed one event. Returns the anchor to commit, if any.
    ///
    /// The state transition happens even when the rectangle is degenerate
    /// and no anchor can be computed.
    pub fn handle(&mut self, event: PointerEvent, rect: &ElementRect) -> Option<Anchor> {
        match (self.state, event.kind) {
            (DragState::Idle, PointerEventKind::Down) => {
                self.state = DragState::Dragging;
                rect.normalize(event.client_x, event.client_y)
            }
            (DragState::Dragging, PointerEventKind::Move) => {
                rect.normalize(event.client_x, event.client_y)
            }
            (DragState::Dragging, PointerEventKind::Down) => {
                rect.normalize(event.client_x, event.client_y)
            }
            (DragState::Dragging, PointerEventKind::Up | PointerEventKind::Leave) => {
                self.state = DragState::Idle;
                None
            }
            (DragState::Idle, _) => None,
        }
    }
}
