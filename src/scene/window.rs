//! Visibility window and note density
//!
//! The window reaches `render_depth` scene units ahead of the cursor and a
//! fifth of that behind it, so notes just played linger briefly. It depends
//! on the cursor, so it is rebuilt on every query.

use crate::timeline::{Note, Obstacle, Timeline};

/// Share of the far limit kept visible behind the cursor
const TRAILING_FRACTION: f64 = 0.2;
/// Density is measured over a segment slightly longer than the window
const DENSITY_SEGMENT_SCALE: f64 = 1.2;

/// Beat range around the cursor that is in view
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibilityWindow {
    pub cursor_beats: f64,
    /// Beats visible ahead of the cursor
    pub far_limit: f64,
    /// Beats visible behind the cursor
    pub close_limit: f64,
}

impl VisibilityWindow {
    pub fn new(cursor_beats: f64, beat_depth: f64, render_depth: f64) -> Self {
        let far_limit = render_depth / beat_depth;
        Self {
            cursor_beats,
            far_limit,
            close_limit: far_limit * TRAILING_FRACTION,
        }
    }

    /// Strictly inside the window
    pub fn contains(&self, time: f64) -> bool {
        time > self.cursor_beats - self.close_limit && time < self.cursor_beats + self.far_limit
    }

    /// Whether a `[start, end]` beat span reaches into the window
    pub fn overlaps(&self, start: f64, end: f64) -> bool {
        end > self.cursor_beats - self.close_limit && start < self.cursor_beats + self.far_limit
    }
}

/// Notes currently in view, in timeline order
pub fn visible_notes(timeline: &Timeline, cursor_beats: f64, beat_depth: f64, render_depth: f64) -> Vec<Note> {
    let window = VisibilityWindow::new(cursor_beats, beat_depth, render_depth);
    timeline
        .notes()
        .iter()
        .filter(|note| window.contains(note.time))
        .cloned()
        .collect()
}

/// Obstacles whose span reaches into the view
pub fn visible_obstacles(timeline: &Timeline, cursor_beats: f64, beat_depth: f64, render_depth: f64) -> Vec<Obstacle> {
    let window = VisibilityWindow::new(cursor_beats, beat_depth, render_depth);
    timeline
        .obstacles()
        .iter()
        .filter(|obstacle| window.overlaps(obstacle.beat_start, obstacle.beat_end()))
        .cloned()
        .collect()
}

/// Notes per second over the visible segment
pub fn note_density(visible_count: usize, beat_depth: f64, render_depth: f64, bpm: f64) -> f64 {
    if visible_count == 0 {
        return 0.0;
    }
    let segment_beats = (render_depth / beat_depth) * DENSITY_SEGMENT_SCALE;
    let notes_per_beat = visible_count as f64 / segment_beats;
    notes_per_beat * bpm / 60.0
}
