//! Playback cursor and zoom

/// Where the editor is looking on the timeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Navigation {
    /// Playback position in beats
    pub cursor_beats: f64,
    /// Scene units per beat
    pub beat_depth: f64,
    pub bpm: f64,
    /// Beat grid for scrolling and resizing
    pub snap_to: f64,
}

impl Navigation {
    pub fn new(beat_depth: f64, bpm: f64, snap_to: f64) -> Self {
        Self {
            cursor_beats: 0.0,
            beat_depth,
            bpm,
            snap_to,
        }
    }

    /// Move the cursor by whole snap steps, never before beat 0
    pub fn scroll(&mut self, steps: i32) {
        self.cursor_beats = (self.cursor_beats + self.snap_to * steps as f64).max(0.0);
    }

    /// Advance by elapsed playback time
    pub fn advance_seconds(&mut self, seconds: f64) {
        self.cursor_beats += seconds * self.bpm / 60.0;
    }

    pub fn seek(&mut self, beats: f64) {
        self.cursor_beats = beats.max(0.0);
    }

    /// Zoom the field in or out, keeping beat depth in a usable range
    pub fn zoom(&mut self, factor: f64) {
        self.beat_depth = (self.beat_depth * factor).clamp(1.0, 40.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scroll_stops_at_zero() {
        let mut nav = Navigation::new(9.0, 120.0, 0.5);
        nav.scroll(3);
        assert_eq!(nav.cursor_beats, 1.5);
        nav.scroll(-10);
        assert_eq!(nav.cursor_beats, 0.0);
    }

    #[test]
    fn test_advance_uses_tempo() {
        let mut nav = Navigation::new(9.0, 120.0, 0.5);
        nav.advance_seconds(1.5);
        assert_eq!(nav.cursor_beats, 3.0);
    }
}
