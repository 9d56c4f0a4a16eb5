//! Cut, copy and paste of timeline selections
//!
//! Copied entities keep their absolute beats. Pasting shifts the whole batch so
//! its first element lands on the paste beat.

use serde::{Deserialize, Serialize};

use super::entity::{Entity, Note, Obstacle, Timeline};
use super::store;
use crate::error::EditorError;

/// Which editing view a command came from. Only the notes view owns notes
/// and obstacles; the others have nothing to cut or paste here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    #[default]
    Notes,
    Events,
}

/// Copied entities plus the view they were copied from
#[derive(Debug, Clone, PartialEq)]
pub struct Clipboard {
    view: View,
    items: Vec<Entity>,
}

impl Clipboard {
    pub fn new(view: View, items: Vec<Entity>) -> Self {
        Self { view, items }
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn items(&self) -> &[Entity] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Beat the paste is anchored on. This is the *first* item's beat, not the
    /// minimum: the selection is gathered notes-then-obstacles, so an obstacle
    /// starting before the first note still shifts relative to that note.
    pub fn anchor_beat(&self) -> Option<f64> {
        self.items.first().map(Entity::time)
    }

    /// Serialize as a bare array in the saved-clipboard shape
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.items)
    }

    /// Read a saved-clipboard array. Notes and obstacles are told apart by the
    /// presence of `_cutDirection`.
    pub fn from_json(view: View, json: &str) -> Result<Self, serde_json::Error> {
        let items: Vec<Entity> = serde_json::from_str(json)?;
        Ok(Self::new(view, items))
    }
}

/// Copy the current selection
pub fn copy(timeline: &Timeline, view: View) -> Clipboard {
    if view != View::Notes {
        return Clipboard::new(view, Vec::new());
    }
    Clipboard::new(view, store::selected_entities(timeline))
}

/// Copy the current selection and remove it from the timeline
pub fn cut(timeline: &Timeline, view: View) -> (Timeline, Clipboard) {
    let clipboard = copy(timeline, view);
    if view != View::Notes {
        return (timeline.clone(), clipboard);
    }
    (store::delete_selected(timeline), clipboard)
}

/// Paste `clipboard` so that its first item lands on `at_beat`.
///
/// Everything already on the timeline is deselected and the pasted entities
/// come in selected. A pasted note replaces whatever occupied its slot, and a
/// pasted obstacle whose id is taken (pasting a copy) gets a new id.
pub fn paste(timeline: &Timeline, clipboard: &Clipboard, view: View, at_beat: f64) -> Result<Timeline, EditorError> {
    let anchor = match clipboard.anchor_beat() {
        Some(anchor) if view == View::Notes && clipboard.view() == view => anchor,
        _ => return Err(EditorError::ClipboardEmptyOrWrongContext),
    };
    let delta = at_beat - anchor;

    let mut pasted_notes = Vec::new();
    let mut pasted_obstacles = Vec::new();
    for item in clipboard.items() {
        match item {
            Entity::Note(note) => pasted_notes.push(Note {
                time: note.time + delta,
                selected: true,
                ..note.clone()
            }),
            Entity::Obstacle(obstacle) => pasted_obstacles.push(Obstacle {
                beat_start: obstacle.beat_start + delta,
                selected: true,
                tentative: false,
                ..obstacle.clone()
            }),
        }
    }

    let existing_notes = timeline.notes().iter().map(|note| Note {
        selected: false,
        ..note.clone()
    });
    let notes = store::overlay_notes(existing_notes, pasted_notes);

    store::dedupe_obstacle_ids(timeline.obstacles(), &mut pasted_obstacles);
    let mut obstacles: Vec<Obstacle> = timeline
        .obstacles()
        .iter()
        .map(|obstacle| Obstacle {
            selected: false,
            ..obstacle.clone()
        })
        .collect();
    obstacles.extend(pasted_obstacles);

    Ok(Timeline::from_parts(notes, obstacles))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::{CutDirection, NoteKey, NoteType, ObstacleType};

    fn note(time: f64, lane: u8) -> Note {
        Note::new(time, lane, 0, NoteType::RedBlock, CutDirection::Down)
    }

    fn selected(mut note: Note) -> Note {
        note.selected = true;
        note
    }

    #[test]
    fn test_copy_paste_shifts_by_first_item() {
        let mut wall = Obstacle::new(0, ObstacleType::Wall, 1, 5.0, 2.0);
        wall.selected = true;
        let timeline = Timeline::from_parts(
            vec![selected(note(4.0, 0)), selected(note(6.0, 1)), note(20.0, 3)],
            vec![wall],
        );

        let clipboard = copy(&timeline, View::Notes);
        assert_eq!(clipboard.len(), 3);
        assert_eq!(clipboard.anchor_beat(), Some(4.0));

        let pasted = paste(&timeline, &clipboard, View::Notes, 10.0).unwrap();
        assert_eq!(pasted.notes().len(), 5);
        assert_eq!(pasted.obstacles().len(), 2);

        // Pre-existing entities are all deselected
        assert!(pasted.notes()[..3].iter().all(|n| !n.selected));
        assert!(!pasted.obstacles()[0].selected);

        // Pasted ones are shifted by +6 and selected
        let times: Vec<f64> = pasted.notes()[3..].iter().map(|n| n.time).collect();
        assert_eq!(times, vec![10.0, 12.0]);
        assert!(pasted.notes()[3..].iter().all(|n| n.selected));
        assert_eq!(pasted.obstacles()[1].beat_start, 11.0);
        assert!(pasted.obstacles()[1].selected);
        assert_ne!(pasted.obstacles()[1].id, pasted.obstacles()[0].id);
    }

    #[test]
    fn test_anchor_uses_first_item_not_minimum() {
        let clipboard = Clipboard::new(
            View::Notes,
            vec![Entity::Note(note(8.0, 0)), Entity::Note(note(2.0, 1))],
        );
        let pasted = paste(&Timeline::new(), &clipboard, View::Notes, 10.0).unwrap();
        let times: Vec<f64> = pasted.notes().iter().map(|n| n.time).collect();
        assert_eq!(times, vec![10.0, 4.0]);
    }

    #[test]
    fn test_cut_removes_selection() {
        let timeline = Timeline::from_parts(vec![selected(note(1.0, 0)), note(2.0, 0)], Vec::new());
        let (remaining, clipboard) = cut(&timeline, View::Notes);
        assert_eq!(remaining.notes().len(), 1);
        assert_eq!(clipboard.len(), 1);

        // Paste after cut keeps the obstacle-free payload intact
        let restored = paste(&remaining, &clipboard, View::Notes, 1.0).unwrap();
        assert_eq!(restored.notes().len(), 2);
    }

    #[test]
    fn test_cut_in_other_view_is_noop() {
        let timeline = Timeline::from_parts(vec![selected(note(1.0, 0))], Vec::new());
        let (remaining, clipboard) = cut(&timeline, View::Events);
        assert_eq!(remaining, timeline);
        assert!(clipboard.is_empty());
    }

    #[test]
    fn test_paste_rejects_empty_or_wrong_view() {
        let empty = Clipboard::new(View::Notes, Vec::new());
        assert_eq!(
            paste(&Timeline::new(), &empty, View::Notes, 0.0),
            Err(EditorError::ClipboardEmptyOrWrongContext)
        );
        let full = Clipboard::new(View::Notes, vec![Entity::Note(note(0.0, 0))]);
        assert_eq!(
            paste(&Timeline::new(), &full, View::Events, 0.0),
            Err(EditorError::ClipboardEmptyOrWrongContext)
        );
    }

    #[test]
    fn test_paste_replaces_occupied_slot() {
        let timeline = Timeline::from_parts(vec![note(4.0, 0)], Vec::new());
        let mut incoming = note(0.0, 0);
        incoming.note_type = NoteType::BlueBlock;
        let clipboard = Clipboard::new(View::Notes, vec![Entity::Note(incoming)]);
        let pasted = paste(&timeline, &clipboard, View::Notes, 4.0).unwrap();
        assert_eq!(pasted.notes().len(), 1);
        assert_eq!(pasted.notes()[0].note_type, NoteType::BlueBlock);
        assert!(store::find_note(&pasted, &NoteKey::new(4.0, 0, 0)).is_some());
    }

    #[test]
    fn test_json_roundtrip_keeps_structural_shape() {
        let wall = Obstacle::new(2, ObstacleType::Wall, 1, 3.0, 1.0);
        let clipboard = Clipboard::new(View::Notes, vec![Entity::Obstacle(wall), Entity::Note(note(1.0, 0))]);
        let json = clipboard.to_json().unwrap();
        assert!(!json.contains("\"Note\""));
        assert_eq!(json.matches("_cutDirection").count(), 1);

        let back = Clipboard::from_json(View::Notes, &json).unwrap();
        assert_eq!(back, clipboard);
        assert_eq!(back.anchor_beat(), Some(3.0));
    }
}
