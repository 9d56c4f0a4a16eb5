//! Pointer interaction state
//!
//! Pressing on a note starts a drag-selection whose mode sticks until the
//! pointer is released, so sweeping across the field selects, deselects or
//! deletes everything it passes over. Pressing on an obstacle starts a
//! potential resize instead.

/// Pixels the pointer must travel before an obstacle press becomes a resize
pub const RESIZE_THRESHOLD_PX: f32 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Middle,
    Secondary,
}

/// What a drag-selection does to entities it passes over
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    Select,
    Deselect,
    Delete,
}

impl SelectionMode {
    /// Mode started by pressing `button` on an entity. Middle clicks don't
    /// start a drag.
    pub fn for_press(button: PointerButton, currently_selected: bool) -> Option<SelectionMode> {
        match button {
            PointerButton::Primary if currently_selected => Some(SelectionMode::Deselect),
            PointerButton::Primary => Some(SelectionMode::Select),
            PointerButton::Secondary => Some(SelectionMode::Delete),
            PointerButton::Middle => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interaction {
    #[default]
    Idle,
    Selecting(SelectionMode),
}

impl Interaction {
    pub fn mode(&self) -> Option<SelectionMode> {
        match self {
            Interaction::Idle => None,
            Interaction::Selecting(mode) => Some(*mode),
        }
    }

    pub fn is_selecting(&self) -> bool {
        matches!(self, Interaction::Selecting(_))
    }
}

/// A primary press on an obstacle, tracked until release
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeDrag {
    pub id: String,
    origin_x: f32,
    start_duration: f64,
    last_duration: f64,
}

impl ResizeDrag {
    pub fn new(id: &str, origin_x: f32, start_duration: f64) -> Self {
        Self {
            id: id.to_string(),
            origin_x,
            start_duration,
            last_duration: start_duration,
        }
    }

    /// Pointer moved to `x`. Returns the new duration when it changed.
    ///
    /// Every full threshold of horizontal travel is one snap step, counted from
    /// the press position so the result doesn't drift with repeated moves.
    pub fn update(&mut self, x: f32, snap_to: f64) -> Option<f64> {
        let delta = x - self.origin_x;
        if delta.abs() <= RESIZE_THRESHOLD_PX {
            return None;
        }
        let steps = (delta / RESIZE_THRESHOLD_PX).floor() as f64;
        let duration = (self.start_duration + snap_to * steps).max(0.0);
        if duration == self.last_duration {
            return None;
        }
        self.last_duration = duration;
        Some(duration)
    }

    /// Released close enough to the press to count as a click
    pub fn is_click(&self, x: f32) -> bool {
        (x - self.origin_x).abs() <= RESIZE_THRESHOLD_PX
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_modes() {
        assert_eq!(SelectionMode::for_press(PointerButton::Primary, false), Some(SelectionMode::Select));
        assert_eq!(SelectionMode::for_press(PointerButton::Primary, true), Some(SelectionMode::Deselect));
        assert_eq!(SelectionMode::for_press(PointerButton::Secondary, true), Some(SelectionMode::Delete));
        assert_eq!(SelectionMode::for_press(PointerButton::Middle, false), None);
    }

    #[test]
    fn test_resize_steps() {
        let mut drag = ResizeDrag::new("w", 100.0, 2.0);
        assert_eq!(drag.update(120.0, 0.5), None);
        assert_eq!(drag.update(161.0, 0.5), Some(3.0));
        // Same step again reports nothing
        assert_eq!(drag.update(165.0, 0.5), None);
        assert_eq!(drag.update(40.0, 0.5), Some(1.0));
    }

    #[test]
    fn test_resize_clamps_at_zero() {
        let mut drag = ResizeDrag::new("w", 500.0, 1.0);
        assert_eq!(drag.update(100.0, 1.0), Some(0.0));
    }

    #[test]
    fn test_click_within_threshold() {
        let drag = ResizeDrag::new("w", 10.0, 1.0);
        assert!(drag.is_click(35.0));
        assert!(!drag.is_click(41.0));
    }
}
