//! Rotation state machine.
//!
//! The motion axis is one [`InteractionMode`]; the selected country is kept
//! beside it because it only decides whether the globe may spin on its own.
//! Precedence when the pointer is released or leaves a country:
//! hovering pauses, otherwise a selection holds the globe still
//! ([`InteractionMode::Idle`]), otherwise it auto-rotates.

use crate::models::RotationState;

/// Where a drag started.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragAnchor {
    pub pointer: (f64, f64),
    pub rotation: RotationState,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InteractionMode {
    AutoRotating,
    Dragging(DragAnchor),
    HoverPaused,
    /// Still because a country is selected.
    Idle,
}

/// What a click did to the selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionChange {
    Selected(String),
    Cleared(String),
}

#[derive(Debug, Clone)]
pub struct InteractionController {
    mode: InteractionMode,
    hovered: Option<String>,
    selected: Option<String>,
    sensitivity: f64,
    step: f64,
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::new(0.3, 0.03)
    }
}

impl InteractionController {
    /// `sensitivity` in degrees per pixel of drag, `step` in degrees per tick.
    pub fn new(sensitivity: f64, step: f64) -> Self {
        Self {
            mode: InteractionMode::AutoRotating,
            hovered: None,
            selected: None,
            sensitivity,
            step,
        }
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.mode, InteractionMode::Dragging(_))
    }

    pub fn hovered(&self) -> Option<&str> {
        self.hovered.as_deref()
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Auto-rotation is enabled while nothing is selected.
    pub fn auto_rotate_enabled(&self) -> bool {
        self.selected.is_none()
    }

    fn rest_mode(&self) -> InteractionMode {
        if self.hovered.is_some() {
            InteractionMode::HoverPaused
        } else if self.selected.is_some() {
            InteractionMode::Idle
        } else {
            InteractionMode::AutoRotating
        }
    }

    pub fn pointer_down(&mut self, x: f64, y: f64, rotation: RotationState) {
        self.mode = InteractionMode::Dragging(DragAnchor {
            pointer: (x, y),
            rotation,
        });
    }

    /// New rotation for a pointer at `(x, y)`, or `None` when not dragging.
    /// Always computed from the drag anchor, never accumulated.
    pub fn pointer_move(&self, x: f64, y: f64) -> Option<RotationState> {
        let InteractionMode::Dragging(anchor) = self.mode else {
            return None;
        };
        let dx = x - anchor.pointer.0;
        let dy = y - anchor.pointer.1;
        Some(RotationState {
            lambda: anchor.rotation.lambda + dx * self.sensitivity,
            phi: anchor.rotation.phi - dy * self.sensitivity,
            gamma: anchor.rotation.gamma,
        })
    }

    pub fn pointer_up(&mut self) {
        if self.is_dragging() {
            self.mode = self.rest_mode();
        }
    }

    /// Pointer entered `name`. Returns `true` if the hovered country changed.
    pub fn hover_enter(&mut self, name: &str) -> bool {
        let changed = self.hovered.as_deref() != Some(name);
        self.hovered = Some(name.to_string());
        if !self.is_dragging() {
            self.mode = InteractionMode::HoverPaused;
        }
        changed
    }

    /// Pointer left the hovered country. Returns `true` if something was hovered.
    pub fn hover_leave(&mut self) -> bool {
        let had = self.hovered.take().is_some();
        if !self.is_dragging() {
            self.mode = self.rest_mode();
        }
        had
    }

    /// Toggle selection of `name`.
    pub fn click(&mut self, name: &str) -> SelectionChange {
        let change = if self.selected.as_deref() == Some(name) {
            self.selected = None;
            SelectionChange::Cleared(name.to_string())
        } else {
            self.selected = Some(name.to_string());
            SelectionChange::Selected(name.to_string())
        };
        if !self.is_dragging() {
            self.mode = self.rest_mode();
        }
        change
    }

    /// One animation tick: the rotated state when the globe is free to spin.
    pub fn tick(&self, rotation: RotationState) -> Option<RotationState> {
        (self.mode == InteractionMode::AutoRotating).then_some(RotationState {
            lambda: rotation.lambda - self.step,
            ..rotation
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_auto_rotating() {
        let ic = InteractionController::default();
        assert_eq!(ic.mode(), InteractionMode::AutoRotating);
        assert!(ic.auto_rotate_enabled());
        assert!(ic.tick(RotationState::default()).is_some());
    }

    #[test]
    fn move_without_drag_is_ignored() {
        let ic = InteractionController::default();
        assert_eq!(ic.pointer_move(10.0, 10.0), None);
    }
}
