//! Input model: modifier keys, wheel deltas, and the gesture state machine.
//!
//! `Gesture` is the active interaction being tracked between pointer-down
//! and pointer-up, carrying the context needed to compute incremental
//! deltas. Transitions are mutually exclusive: a node drag cannot start
//! while panning, and wheel input is ignored while a pointer gesture is
//! in progress. `Scrolling` is the one wheel-driven state; it clears
//! itself after a quiescence delay measured against host timestamps.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::camera::Point;
use crate::consts::SCROLL_QUIESCENCE_MS;
use crate::node::NodeId;

/// Keyboard modifier keys held during an event.
#[derive(Debug, Clone, Copy, Default)]
pub struct Modifiers {
    /// Shift key is held.
    pub shift: bool,
    /// Ctrl key is held.
    pub ctrl: bool,
    /// Alt / Option key is held.
    pub alt: bool,
    /// Meta / Command key is held.
    pub meta: bool,
}

impl Modifiers {
    /// Whether this wheel event should zoom rather than pan.
    #[must_use]
    pub fn is_pinch(self) -> bool {
        self.ctrl || self.meta
    }
}

/// Wheel / trackpad scroll delta.
#[derive(Debug, Clone, Copy)]
pub struct WheelDelta {
    /// Horizontal scroll amount in pixels.
    pub dx: f64,
    /// Vertical scroll amount in pixels (positive = down).
    pub dy: f64,
}

/// The active gesture, if any.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    /// No gesture in progress; waiting for the next pointer-down.
    Idle,
    /// Dragging the canvas while pan mode is active.
    Panning {
        /// Screen position of the previous pointer event, used to compute
        /// the pan delta.
        last_screen: Point,
    },
    /// Moving a node across the canvas.
    DraggingNode {
        /// Id of the node being dragged.
        id: NodeId,
        /// Screen position of the pointer at drag start.
        start_screen: Point,
        /// Node position at drag start; deltas apply against this origin.
        origin: Point,
    },
    /// Wheel scrolling is in progress; clears after a quiescence delay.
    Scrolling {
        /// Host timestamp (ms) of the most recent wheel event.
        last_wheel_ms: f64,
    },
}

impl Default for Gesture {
    fn default() -> Self {
        Self::Idle
    }
}

impl Gesture {
    /// Whether a pointer gesture (pan or drag) is in progress. Wheel
    /// input is ignored while one is.
    #[must_use]
    pub fn pointer_active(self) -> bool {
        matches!(self, Self::Panning { .. } | Self::DraggingNode { .. })
    }

    #[must_use]
    pub fn is_dragging(self) -> bool {
        matches!(self, Self::DraggingNode { .. })
    }

    #[must_use]
    pub fn is_panning(self) -> bool {
        matches!(self, Self::Panning { .. })
    }

    #[must_use]
    pub fn is_scrolling(self) -> bool {
        matches!(self, Self::Scrolling { .. })
    }

    /// Clear `Scrolling` once the quiescence delay has elapsed. Returns
    /// true when the gesture changed.
    pub fn settle_scroll(&mut self, now_ms: f64) -> bool {
        if let Self::Scrolling { last_wheel_ms } = *self
            && now_ms - last_wheel_ms >= SCROLL_QUIESCENCE_MS
        {
            *self = Self::Idle;
            return true;
        }
        false
    }
}
