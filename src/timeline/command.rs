//! Discrete timeline commands
//!
//! Every change to the timeline goes through a `Command`. The command's kind
//! decides whether it becomes an undo step and whether consecutive runs of it
//! fold into one step.

use super::clipboard::{self, Clipboard, View};
use super::entity::{CutDirection, MirrorAxis, Note, NoteKey, NoteType, Obstacle, Timeline};
use super::store;
use crate::error::EditorError;

/// Tag identifying a command type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    ClearEntities,
    FinishLoadingSong,
    PlaceNote,
    PlaceNoteByDrag,
    DeleteNote,
    BulkDeleteNote,
    DeleteSelected,
    CutSelection,
    PasteSelection,
    ToggleNoteColor,
    SelectNote,
    DeselectNote,
    SelectAll,
    DeselectAll,
    CreateObstacle,
    ResizeObstacle,
    DeleteObstacle,
    BulkDeleteObstacle,
    SelectObstacle,
    DeselectObstacle,
    MirrorSelection,
}

impl CommandKind {
    /// Commands that produce an undo step. Selection changes and clearing
    /// only replace the present snapshot.
    pub fn records_history(self) -> bool {
        matches!(
            self,
            CommandKind::FinishLoadingSong
                | CommandKind::PlaceNote
                | CommandKind::PlaceNoteByDrag
                | CommandKind::DeleteNote
                | CommandKind::BulkDeleteNote
                | CommandKind::DeleteSelected
                | CommandKind::CutSelection
                | CommandKind::PasteSelection
                | CommandKind::CreateObstacle
                | CommandKind::ResizeObstacle
                | CommandKind::DeleteObstacle
                | CommandKind::BulkDeleteObstacle
                | CommandKind::MirrorSelection
                | CommandKind::ToggleNoteColor
        )
    }

    /// Consecutive commands of this kind share one undo step, so deleting a
    /// row of notes by dragging is undone in one go.
    pub fn coalesces(self) -> bool {
        matches!(self, CommandKind::BulkDeleteNote | CommandKind::BulkDeleteObstacle)
    }

    /// Whether a run started by `self` can absorb a following `next`. A
    /// delete sweep keeps one step across notes and obstacles alike.
    pub fn coalesces_with(self, next: CommandKind) -> bool {
        self.coalesces() && next.coalesces()
    }
}

/// A single timeline mutation
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Empty the timeline (new song, start of a load, unload)
    ClearEntities,
    /// Replace the timeline with loaded map data as one undo step
    FinishLoadingSong { notes: Vec<Note>, obstacles: Vec<Obstacle> },
    PlaceNote { key: NoteKey, note_type: NoteType, direction: CutDirection },
    PlaceNoteByDrag { key: NoteKey, note_type: NoteType, direction: CutDirection },
    DeleteNote(NoteKey),
    /// Delete issued while drag-deleting across the field
    BulkDeleteNote(NoteKey),
    DeleteSelected,
    CutSelection { view: View },
    PasteSelection { view: View, at_beat: f64, clipboard: Clipboard },
    ToggleNoteColor(NoteKey),
    SelectNote(NoteKey),
    DeselectNote(NoteKey),
    SelectAll { view: View },
    DeselectAll { view: View },
    CreateObstacle(Obstacle),
    ResizeObstacle { id: String, beat_duration: f64 },
    DeleteObstacle(String),
    /// Obstacle delete issued while drag-deleting across the field
    BulkDeleteObstacle(String),
    SelectObstacle(String),
    DeselectObstacle(String),
    MirrorSelection(MirrorAxis),
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::ClearEntities => CommandKind::ClearEntities,
            Command::FinishLoadingSong { .. } => CommandKind::FinishLoadingSong,
            Command::PlaceNote { .. } => CommandKind::PlaceNote,
            Command::PlaceNoteByDrag { .. } => CommandKind::PlaceNoteByDrag,
            Command::DeleteNote(_) => CommandKind::DeleteNote,
            Command::BulkDeleteNote(_) => CommandKind::BulkDeleteNote,
            Command::DeleteSelected => CommandKind::DeleteSelected,
            Command::CutSelection { .. } => CommandKind::CutSelection,
            Command::PasteSelection { .. } => CommandKind::PasteSelection,
            Command::ToggleNoteColor(_) => CommandKind::ToggleNoteColor,
            Command::SelectNote(_) => CommandKind::SelectNote,
            Command::DeselectNote(_) => CommandKind::DeselectNote,
            Command::SelectAll { .. } => CommandKind::SelectAll,
            Command::DeselectAll { .. } => CommandKind::DeselectAll,
            Command::CreateObstacle(_) => CommandKind::CreateObstacle,
            Command::ResizeObstacle { .. } => CommandKind::ResizeObstacle,
            Command::DeleteObstacle(_) => CommandKind::DeleteObstacle,
            Command::BulkDeleteObstacle(_) => CommandKind::BulkDeleteObstacle,
            Command::SelectObstacle(_) => CommandKind::SelectObstacle,
            Command::DeselectObstacle(_) => CommandKind::DeselectObstacle,
            Command::MirrorSelection(_) => CommandKind::MirrorSelection,
        }
    }

    /// Run the command against `timeline`, producing the next snapshot
    pub fn apply(&self, timeline: &Timeline) -> Result<Timeline, EditorError> {
        match self {
            Command::ClearEntities => Ok(store::clear()),
            Command::FinishLoadingSong { notes, obstacles } => Ok(store::load(notes.clone(), obstacles.clone())),
            Command::PlaceNote { key, note_type, direction } => {
                store::place_note(timeline, *key, *note_type, *direction)
            }
            Command::PlaceNoteByDrag { key, note_type, direction } => {
                store::place_note_by_drag(timeline, *key, *note_type, *direction)
            }
            Command::DeleteNote(key) | Command::BulkDeleteNote(key) => store::delete_note_at(timeline, key),
            Command::DeleteSelected => Ok(store::delete_selected(timeline)),
            Command::CutSelection { view } => Ok(clipboard::cut(timeline, *view).0),
            Command::PasteSelection { view, at_beat, clipboard } => {
                clipboard::paste(timeline, clipboard, *view, *at_beat)
            }
            Command::ToggleNoteColor(key) => store::toggle_note_color(timeline, key),
            Command::SelectNote(key) => store::set_note_selection(timeline, key, true),
            Command::DeselectNote(key) => store::set_note_selection(timeline, key, false),
            Command::SelectAll { view } => match view {
                View::Notes => Ok(store::select_all(timeline)),
                _ => Ok(timeline.clone()),
            },
            Command::DeselectAll { view } => match view {
                View::Notes => Ok(store::deselect_all(timeline)),
                _ => Ok(timeline.clone()),
            },
            Command::CreateObstacle(obstacle) => Ok(store::create_obstacle(
                timeline,
                Obstacle {
                    tentative: false,
                    ..obstacle.clone()
                },
            )),
            Command::ResizeObstacle { id, beat_duration } => store::resize_obstacle(timeline, id, *beat_duration),
            Command::DeleteObstacle(id) | Command::BulkDeleteObstacle(id) => store::delete_obstacle(timeline, id),
            Command::SelectObstacle(id) => store::set_obstacle_selection(timeline, id, true),
            Command::DeselectObstacle(id) => store::set_obstacle_selection(timeline, id, false),
            Command::MirrorSelection(axis) => Ok(store::mirror_selection(timeline, *axis)),
        }
    }
}
