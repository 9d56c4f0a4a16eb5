//! Pure timeline operations
//!
//! Every operation takes a snapshot and returns a new one; nothing is mutated
//! in place. Operations that can hit a stale or illegal target return an
//! `EditorError` and leave it to the caller to decide how loud to be about it
//! (the command layer logs and keeps the old snapshot).

use std::collections::{HashMap, HashSet};

use super::entity::{
    CutDirection, Entity, MirrorAxis, Note, NoteKey, NoteType, Obstacle, Timeline, LANE_COUNT, LAYER_COUNT,
};
use crate::error::EditorError;

fn missing_note(key: &NoteKey) -> EditorError {
    EditorError::MissingEntity(format!("note at beat {} lane {} layer {}", key.time, key.lane, key.layer))
}

fn missing_obstacle(id: &str) -> EditorError {
    EditorError::MissingEntity(format!("obstacle {}", id))
}

fn check_grid(key: &NoteKey) -> Result<(), EditorError> {
    if key.in_grid() {
        Ok(())
    } else {
        Err(EditorError::OutOfGrid { lane: key.lane, layer: key.layer })
    }
}

/// Index of the note occupying `key`, if any
pub fn find_note_index(timeline: &Timeline, key: &NoteKey) -> Option<usize> {
    timeline.notes().iter().position(|note| note.is_at(key))
}

pub fn find_note<'a>(timeline: &'a Timeline, key: &NoteKey) -> Option<&'a Note> {
    timeline.notes().iter().find(|note| note.is_at(key))
}

pub fn find_obstacle<'a>(timeline: &'a Timeline, id: &str) -> Option<&'a Obstacle> {
    timeline.obstacles().iter().find(|obstacle| obstacle.id == id)
}

/// Rebuild the note list with the note at `index` passed through `edit`
fn edit_note_at(timeline: &Timeline, index: usize, edit: impl FnOnce(&mut Note)) -> Timeline {
    let mut notes = timeline.notes().to_vec();
    edit(&mut notes[index]);
    timeline.with_notes(notes)
}

fn edit_obstacle(timeline: &Timeline, id: &str, edit: impl FnOnce(&mut Obstacle)) -> Result<Timeline, EditorError> {
    let index = timeline
        .obstacles()
        .iter()
        .position(|obstacle| obstacle.id == id)
        .ok_or_else(|| missing_obstacle(id))?;
    let mut obstacles = timeline.obstacles().to_vec();
    edit(&mut obstacles[index]);
    Ok(timeline.with_obstacles(obstacles))
}

/// Add `incoming` after `base`, dropping any base note whose slot an incoming
/// note claims. Among incoming notes the later one wins a shared slot.
pub(crate) fn overlay_notes(base: impl IntoIterator<Item = Note>, incoming: Vec<Note>) -> Vec<Note> {
    let mut last_index = HashMap::new();
    for (idx, note) in incoming.iter().enumerate() {
        last_index.insert(note.key().slot(), idx);
    }
    let mut merged: Vec<Note> = base
        .into_iter()
        .filter(|note| !last_index.contains_key(&note.key().slot()))
        .collect();
    merged.extend(
        incoming
            .into_iter()
            .enumerate()
            .filter(|(idx, note)| last_index.get(&note.key().slot()) == Some(idx))
            .map(|(_, note)| note),
    );
    merged
}

/// Give every obstacle in `incoming` an id not used by `existing` or by an
/// earlier incoming obstacle.
pub(crate) fn dedupe_obstacle_ids<'a>(
    existing: impl IntoIterator<Item = &'a Obstacle>,
    incoming: &mut [Obstacle],
) -> usize {
    let mut taken: HashSet<String> = existing.into_iter().map(|o| o.id.clone()).collect();
    let mut renamed = 0;
    for obstacle in incoming.iter_mut() {
        while taken.contains(&obstacle.id) {
            obstacle.id = Obstacle::generate_id();
            renamed += 1;
        }
        taken.insert(obstacle.id.clone());
    }
    renamed
}

/// Place a note. Fails if the slot is taken or outside the grid.
pub fn place_note(
    timeline: &Timeline,
    key: NoteKey,
    note_type: NoteType,
    direction: CutDirection,
) -> Result<Timeline, EditorError> {
    check_grid(&key)?;
    if find_note_index(timeline, &key).is_some() {
        return Err(EditorError::DuplicateNotePlacement {
            time: key.time,
            lane: key.lane,
            layer: key.layer,
        });
    }
    let mut notes = timeline.notes().to_vec();
    notes.push(Note::new(key.time, key.lane, key.layer, note_type, direction));
    Ok(timeline.with_notes(notes))
}

/// Place a note while dragging. The direction follows the mouse and changes
/// every frame, so an occupant is replaced in place instead of rejected.
pub fn place_note_by_drag(
    timeline: &Timeline,
    key: NoteKey,
    note_type: NoteType,
    direction: CutDirection,
) -> Result<Timeline, EditorError> {
    check_grid(&key)?;
    let note = Note::new(key.time, key.lane, key.layer, note_type, direction);
    match find_note_index(timeline, &key) {
        Some(index) => Ok(edit_note_at(timeline, index, |slot| *slot = note)),
        None => {
            let mut notes = timeline.notes().to_vec();
            notes.push(note);
            Ok(timeline.with_notes(notes))
        }
    }
}

pub fn delete_note_at(timeline: &Timeline, key: &NoteKey) -> Result<Timeline, EditorError> {
    let index = find_note_index(timeline, key).ok_or_else(|| missing_note(key))?;
    let mut notes = timeline.notes().to_vec();
    notes.remove(index);
    Ok(timeline.with_notes(notes))
}

/// Remove every selected note and obstacle
pub fn delete_selected(timeline: &Timeline) -> Timeline {
    if num_selected(timeline) == 0 {
        return timeline.clone();
    }
    let notes = timeline.notes().iter().filter(|n| !n.selected).cloned().collect();
    let obstacles = timeline.obstacles().iter().filter(|o| !o.selected).cloned().collect();
    Timeline::from_parts(notes, obstacles)
}

/// Swap red and blue. Mines are left alone (and the snapshot is returned as is).
pub fn toggle_note_color(timeline: &Timeline, key: &NoteKey) -> Result<Timeline, EditorError> {
    let index = find_note_index(timeline, key).ok_or_else(|| missing_note(key))?;
    if !timeline.notes()[index].note_type.is_block() {
        return Ok(timeline.clone());
    }
    Ok(edit_note_at(timeline, index, |note| note.note_type = note.note_type.toggled()))
}

pub fn set_note_selection(timeline: &Timeline, key: &NoteKey, selected: bool) -> Result<Timeline, EditorError> {
    let index = find_note_index(timeline, key).ok_or_else(|| missing_note(key))?;
    Ok(edit_note_at(timeline, index, |note| note.selected = selected))
}

fn set_all_selected(timeline: &Timeline, selected: bool) -> Timeline {
    let notes = timeline
        .notes()
        .iter()
        .map(|note| Note { selected, ..note.clone() })
        .collect();
    let obstacles = timeline
        .obstacles()
        .iter()
        .map(|obstacle| Obstacle { selected, ..obstacle.clone() })
        .collect();
    Timeline::from_parts(notes, obstacles)
}

pub fn select_all(timeline: &Timeline) -> Timeline {
    set_all_selected(timeline, true)
}

pub fn deselect_all(timeline: &Timeline) -> Timeline {
    set_all_selected(timeline, false)
}

/// Append an obstacle. A clashing id is replaced with a fresh one.
pub fn create_obstacle(timeline: &Timeline, obstacle: Obstacle) -> Timeline {
    let mut incoming = [Obstacle {
        colspan: obstacle.colspan.max(1),
        beat_duration: obstacle.beat_duration.max(0.0),
        ..obstacle
    }];
    if dedupe_obstacle_ids(timeline.obstacles(), &mut incoming) > 0 {
        log::warn!("Obstacle id already in use, assigned {}", incoming[0].id);
    }
    let mut obstacles = timeline.obstacles().to_vec();
    obstacles.extend(incoming);
    timeline.with_obstacles(obstacles)
}

/// Set an obstacle's duration, clamped to zero
pub fn resize_obstacle(timeline: &Timeline, id: &str, new_duration: f64) -> Result<Timeline, EditorError> {
    edit_obstacle(timeline, id, |obstacle| obstacle.beat_duration = new_duration.max(0.0))
}

pub fn delete_obstacle(timeline: &Timeline, id: &str) -> Result<Timeline, EditorError> {
    if find_obstacle(timeline, id).is_none() {
        return Err(missing_obstacle(id));
    }
    let obstacles = timeline.obstacles().iter().filter(|o| o.id != id).cloned().collect();
    Ok(timeline.with_obstacles(obstacles))
}

pub fn set_obstacle_selection(timeline: &Timeline, id: &str, selected: bool) -> Result<Timeline, EditorError> {
    edit_obstacle(timeline, id, |obstacle| obstacle.selected = selected)
}

/// Beat range covered by the current selection
fn selection_time_bounds(timeline: &Timeline) -> Option<(f64, f64)> {
    let note_spans = timeline.notes().iter().filter(|n| n.selected).map(|n| (n.time, n.time));
    let obstacle_spans = timeline
        .obstacles()
        .iter()
        .filter(|o| o.selected)
        .map(|o| (o.beat_start, o.beat_end()));
    note_spans
        .chain(obstacle_spans)
        .reduce(|(lo, hi), (start, end)| (lo.min(start), hi.max(end)))
}

fn mirror_note(note: &Note, axis: MirrorAxis, bounds: (f64, f64)) -> Note {
    let mut mirrored = Note {
        cut_direction: note.cut_direction.mirrored(axis),
        ..note.clone()
    };
    match axis {
        MirrorAxis::Horizontal => mirrored.lane = (LANE_COUNT - 1).saturating_sub(note.lane),
        MirrorAxis::Vertical => mirrored.layer = (LAYER_COUNT - 1).saturating_sub(note.layer),
        MirrorAxis::Time => mirrored.time = bounds.0 + bounds.1 - note.time,
    }
    mirrored
}

fn mirror_obstacle(obstacle: &Obstacle, axis: MirrorAxis, bounds: (f64, f64)) -> Obstacle {
    let mut mirrored = obstacle.clone();
    match axis {
        MirrorAxis::Horizontal => {
            mirrored.lane = LANE_COUNT.saturating_sub(obstacle.lane.saturating_add(obstacle.colspan));
        }
        // Obstacles hang from the top of the grid; there is nothing to flip
        MirrorAxis::Vertical => {}
        MirrorAxis::Time => mirrored.beat_start = bounds.0 + bounds.1 - obstacle.beat_end(),
    }
    mirrored
}

/// Reflect every selected entity across `axis`.
///
/// Lanes and layers flip across the middle of the grid; time flips across the
/// middle of the selected beat range. A mirrored note that lands on an
/// unselected note replaces it.
pub fn mirror_selection(timeline: &Timeline, axis: MirrorAxis) -> Timeline {
    let Some(bounds) = selection_time_bounds(timeline) else {
        return timeline.clone();
    };

    let mut next = timeline.clone();

    if timeline.notes().iter().any(|n| n.selected) {
        let claimed: HashSet<_> = timeline
            .notes()
            .iter()
            .filter(|n| n.selected)
            .map(|n| mirror_note(n, axis, bounds).key().slot())
            .collect();
        let notes = timeline
            .notes()
            .iter()
            .filter_map(|note| {
                if note.selected {
                    Some(mirror_note(note, axis, bounds))
                } else if claimed.contains(&note.key().slot()) {
                    None
                } else {
                    Some(note.clone())
                }
            })
            .collect();
        next = next.with_notes(notes);
    }

    if timeline.obstacles().iter().any(|o| o.selected) {
        let obstacles = timeline
            .obstacles()
            .iter()
            .map(|o| if o.selected { mirror_obstacle(o, axis, bounds) } else { o.clone() })
            .collect();
        next = next.with_obstacles(obstacles);
    }

    next
}

/// Empty snapshot (new song, unload)
pub fn clear() -> Timeline {
    Timeline::new()
}

/// Build a snapshot from loaded map data. Duplicate slots collapse to the last
/// note seen; duplicate obstacle ids are renamed.
pub fn load(notes: Vec<Note>, obstacles: Vec<Obstacle>) -> Timeline {
    let total = notes.len();
    let notes = overlay_notes(Vec::new(), notes);
    if notes.len() != total {
        log::warn!("Dropped {} notes sharing a slot with a later note", total - notes.len());
    }
    let mut obstacles = obstacles;
    let renamed = dedupe_obstacle_ids(std::iter::empty(), &mut obstacles);
    if renamed > 0 {
        log::warn!("Renamed {} obstacles with duplicate ids", renamed);
    }
    Timeline::from_parts(notes, obstacles)
}

/// Selected notes followed by selected obstacles, in timeline order
pub fn selected_entities(timeline: &Timeline) -> Vec<Entity> {
    let notes = timeline.notes().iter().filter(|n| n.selected).cloned().map(Entity::Note);
    let obstacles = timeline
        .obstacles()
        .iter()
        .filter(|o| o.selected)
        .cloned()
        .map(Entity::Obstacle);
    notes.chain(obstacles).collect()
}

/// Red and blue blocks
pub fn num_blocks(timeline: &Timeline) -> usize {
    timeline.notes().iter().filter(|n| n.note_type.is_block()).count()
}

pub fn num_mines(timeline: &Timeline) -> usize {
    timeline.notes().iter().filter(|n| n.note_type == NoteType::Mine).count()
}

pub fn num_obstacles(timeline: &Timeline) -> usize {
    timeline.obstacles().len()
}

/// Selected notes plus selected obstacles
pub fn num_selected(timeline: &Timeline) -> usize {
    timeline.notes().iter().filter(|n| n.selected).count()
        + timeline.obstacles().iter().filter(|o| o.selected).count()
}
