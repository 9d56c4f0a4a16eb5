//! Timeline entities: notes, obstacles and the immutable snapshot holding them
//!
//! Field names on the wire follow the map format the game reads
//! (`_time`, `_lineIndex`, ...), so project files and clipboard payloads stay
//! interchangeable with existing maps.

use std::sync::Arc;

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::EditorError;

/// Horizontal placement columns
pub const LANE_COUNT: u8 = 4;
/// Vertical placement rows
pub const LAYER_COUNT: u8 = 3;

/// Length of generated obstacle ids
const OBSTACLE_ID_LEN: usize = 12;

fn is_false(value: &bool) -> bool {
    !*value
}

/// What kind of note sits in a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum NoteType {
    RedBlock,
    BlueBlock,
    Mine,
}

impl NoteType {
    /// Numeric code used in map files (mines are 3, 2 is unused)
    pub fn code(self) -> i64 {
        match self {
            NoteType::RedBlock => 0,
            NoteType::BlueBlock => 1,
            NoteType::Mine => 3,
        }
    }

    /// Red and blue blocks are blocks; mines are not
    pub fn is_block(self) -> bool {
        !matches!(self, NoteType::Mine)
    }

    /// Swap red and blue. Mines stay mines.
    pub fn toggled(self) -> NoteType {
        match self {
            NoteType::RedBlock => NoteType::BlueBlock,
            NoteType::BlueBlock => NoteType::RedBlock,
            NoteType::Mine => NoteType::Mine,
        }
    }
}

impl TryFrom<i64> for NoteType {
    type Error = EditorError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(NoteType::RedBlock),
            1 => Ok(NoteType::BlueBlock),
            3 => Ok(NoteType::Mine),
            other => Err(EditorError::InvalidNoteType(other)),
        }
    }
}

impl From<NoteType> for i64 {
    fn from(note_type: NoteType) -> i64 {
        note_type.code()
    }
}

/// Axis a selection can be mirrored across
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MirrorAxis {
    /// Flip lanes left to right
    Horizontal,
    /// Flip layers top to bottom
    Vertical,
    /// Reverse the selection in time
    Time,
}

/// Cut direction of a note.
///
/// The numbering is the one maps use, laid out on the grid as:
///
/// ```text
///   4  0  5
///   2  8  3
///   6  1  7
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum CutDirection {
    Up,
    Down,
    Left,
    Right,
    UpLeft,
    UpRight,
    DownLeft,
    DownRight,
    Center,
}

impl CutDirection {
    pub const ALL: [CutDirection; 9] = [
        CutDirection::Up,
        CutDirection::Down,
        CutDirection::Left,
        CutDirection::Right,
        CutDirection::UpLeft,
        CutDirection::UpRight,
        CutDirection::DownLeft,
        CutDirection::DownRight,
        CutDirection::Center,
    ];

    pub fn code(self) -> i64 {
        match self {
            CutDirection::Up => 0,
            CutDirection::Down => 1,
            CutDirection::Left => 2,
            CutDirection::Right => 3,
            CutDirection::UpLeft => 4,
            CutDirection::UpRight => 5,
            CutDirection::DownLeft => 6,
            CutDirection::DownRight => 7,
            CutDirection::Center => 8,
        }
    }

    /// Direction after mirroring the note across `axis`.
    /// Time mirroring leaves the arrow alone.
    pub fn mirrored(self, axis: MirrorAxis) -> CutDirection {
        use CutDirection::*;
        match axis {
            MirrorAxis::Horizontal => match self {
                Left => Right,
                Right => Left,
                UpLeft => UpRight,
                UpRight => UpLeft,
                DownLeft => DownRight,
                DownRight => DownLeft,
                other => other,
            },
            MirrorAxis::Vertical => match self {
                Up => Down,
                Down => Up,
                UpLeft => DownLeft,
                DownLeft => UpLeft,
                UpRight => DownRight,
                DownRight => UpRight,
                other => other,
            },
            MirrorAxis::Time => self,
        }
    }
}

impl TryFrom<i64> for CutDirection {
    type Error = EditorError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        usize::try_from(code)
            .ok()
            .and_then(|idx| CutDirection::ALL.get(idx).copied())
            .ok_or(EditorError::InvalidDirection(code))
    }
}

impl From<CutDirection> for i64 {
    fn from(direction: CutDirection) -> i64 {
        direction.code()
    }
}

/// Position of a note on the timeline grid. Two notes with the same key
/// cannot coexist.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteKey {
    pub time: f64,
    pub lane: u8,
    pub layer: u8,
}

impl NoteKey {
    pub fn new(time: f64, lane: u8, layer: u8) -> Self {
        Self { time, lane, layer }
    }

    /// Hashable form of the key. `-0.0` and `0.0` land in the same slot.
    pub fn slot(&self) -> (u64, u8, u8) {
        ((self.time + 0.0).to_bits(), self.lane, self.layer)
    }

    pub fn in_grid(&self) -> bool {
        self.lane < LANE_COUNT && self.layer < LAYER_COUNT
    }
}

/// A block or mine placed on the grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// Beat the note sits on
    #[serde(rename = "_time")]
    pub time: f64,
    /// Column, 0 = leftmost
    #[serde(rename = "_lineIndex")]
    pub lane: u8,
    /// Row, 0 = bottom
    #[serde(rename = "_lineLayer")]
    pub layer: u8,
    #[serde(rename = "_type")]
    pub note_type: NoteType,
    #[serde(rename = "_cutDirection")]
    pub cut_direction: CutDirection,
    #[serde(default, skip_serializing_if = "is_false")]
    pub selected: bool,
}

impl Note {
    pub fn new(time: f64, lane: u8, layer: u8, note_type: NoteType, cut_direction: CutDirection) -> Self {
        Self {
            time,
            lane,
            layer,
            note_type,
            cut_direction,
            selected: false,
        }
    }

    pub fn key(&self) -> NoteKey {
        NoteKey::new(self.time, self.lane, self.layer)
    }

    /// Exact slot match. Times are compared exactly, as placement snaps them.
    pub fn is_at(&self, key: &NoteKey) -> bool {
        self.time == key.time && self.lane == key.lane && self.layer == key.layer
    }
}

/// Obstacle shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObstacleType {
    /// Full-height wall, reaches the floor
    Wall,
    /// Hangs from the top, player ducks under it
    Ceiling,
}

/// A wall or ceiling spanning one or more lanes over a beat range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: String,
    /// Leftmost lane covered
    pub lane: u8,
    #[serde(rename = "type")]
    pub obstacle_type: ObstacleType,
    /// Number of lanes covered, at least 1
    pub colspan: u8,
    #[serde(rename = "beatStart")]
    pub beat_start: f64,
    #[serde(rename = "beatDuration")]
    pub beat_duration: f64,
    #[serde(default, skip_serializing_if = "is_false")]
    pub selected: bool,
    /// Still being sized by the user, not part of the map yet
    #[serde(default, skip_serializing_if = "is_false")]
    pub tentative: bool,
}

impl Obstacle {
    /// Create an obstacle with a fresh id. Span is forced to at least one lane
    /// and duration to be non-negative.
    pub fn new(lane: u8, obstacle_type: ObstacleType, colspan: u8, beat_start: f64, beat_duration: f64) -> Self {
        Self {
            id: Self::generate_id(),
            lane,
            obstacle_type,
            colspan: colspan.max(1),
            beat_start,
            beat_duration: beat_duration.max(0.0),
            selected: false,
            tentative: false,
        }
    }

    /// Random alphanumeric id
    pub fn generate_id() -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(OBSTACLE_ID_LEN)
            .map(char::from)
            .collect()
    }

    pub fn beat_end(&self) -> f64 {
        self.beat_start + self.beat_duration
    }
}

/// Either kind of timeline entity.
///
/// Serialized without a tag: a payload element is a note exactly when it has
/// a `_cutDirection` field, which is how saved clipboards tell them apart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Entity {
    Note(Note),
    Obstacle(Obstacle),
}

impl Entity {
    /// Absolute start beat
    pub fn time(&self) -> f64 {
        match self {
            Entity::Note(note) => note.time,
            Entity::Obstacle(obstacle) => obstacle.beat_start,
        }
    }

    pub fn is_note(&self) -> bool {
        matches!(self, Entity::Note(_))
    }

    pub fn as_note(&self) -> Option<&Note> {
        match self {
            Entity::Note(note) => Some(note),
            Entity::Obstacle(_) => None,
        }
    }

    pub fn as_obstacle(&self) -> Option<&Obstacle> {
        match self {
            Entity::Obstacle(obstacle) => Some(obstacle),
            Entity::Note(_) => None,
        }
    }
}

/// Immutable snapshot of everything placed on the timeline.
///
/// Cloning is cheap: both halves are reference counted, and a command that
/// only touches notes hands the obstacle slice on untouched (and vice versa).
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    notes: Arc<[Note]>,
    obstacles: Arc<[Obstacle]>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::from_parts(Vec::new(), Vec::new())
    }

    pub fn from_parts(notes: Vec<Note>, obstacles: Vec<Obstacle>) -> Self {
        Self {
            notes: notes.into(),
            obstacles: obstacles.into(),
        }
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    /// New snapshot with replaced notes, sharing this one's obstacles
    pub fn with_notes(&self, notes: Vec<Note>) -> Self {
        Self {
            notes: notes.into(),
            obstacles: Arc::clone(&self.obstacles),
        }
    }

    /// New snapshot with replaced obstacles, sharing this one's notes
    pub fn with_obstacles(&self, obstacles: Vec<Obstacle>) -> Self {
        Self {
            notes: Arc::clone(&self.notes),
            obstacles: obstacles.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty() && self.obstacles.is_empty()
    }

    /// True when both snapshots point at the same note storage
    pub fn shares_notes_with(&self, other: &Timeline) -> bool {
        Arc::ptr_eq(&self.notes, &other.notes)
    }

    /// True when both snapshots point at the same obstacle storage
    pub fn shares_obstacles_with(&self, other: &Timeline) -> bool {
        Arc::ptr_eq(&self.obstacles, &other.obstacles)
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_codes_roundtrip() {
        for (idx, dir) in CutDirection::ALL.iter().enumerate() {
            assert_eq!(dir.code(), idx as i64);
            assert_eq!(CutDirection::try_from(idx as i64), Ok(*dir));
        }
        assert_eq!(CutDirection::try_from(9), Err(EditorError::InvalidDirection(9)));
        assert_eq!(CutDirection::try_from(-1), Err(EditorError::InvalidDirection(-1)));
    }

    #[test]
    fn test_direction_mirror_is_involution() {
        for axis in [MirrorAxis::Horizontal, MirrorAxis::Vertical, MirrorAxis::Time] {
            for dir in CutDirection::ALL {
                assert_eq!(dir.mirrored(axis).mirrored(axis), dir);
            }
        }
        assert_eq!(CutDirection::UpLeft.mirrored(MirrorAxis::Horizontal), CutDirection::UpRight);
        assert_eq!(CutDirection::UpLeft.mirrored(MirrorAxis::Vertical), CutDirection::DownLeft);
        assert_eq!(CutDirection::Center.mirrored(MirrorAxis::Vertical), CutDirection::Center);
    }

    #[test]
    fn test_note_type_codes() {
        assert_eq!(NoteType::try_from(3), Ok(NoteType::Mine));
        assert_eq!(NoteType::try_from(2), Err(EditorError::InvalidNoteType(2)));
        assert_eq!(NoteType::RedBlock.toggled(), NoteType::BlueBlock);
        assert_eq!(NoteType::Mine.toggled(), NoteType::Mine);
    }

    #[test]
    fn test_note_wire_shape() {
        let note = Note::new(4.0, 1, 2, NoteType::Mine, CutDirection::Center);
        let json = serde_json::to_value(&note).unwrap();
        assert_eq!(json["_time"], 4.0);
        assert_eq!(json["_lineIndex"], 1);
        assert_eq!(json["_lineLayer"], 2);
        assert_eq!(json["_type"], 3);
        assert_eq!(json["_cutDirection"], 8);
        assert!(json.get("selected").is_none());
    }

    #[test]
    fn test_obstacle_new_clamps() {
        let obstacle = Obstacle::new(0, ObstacleType::Wall, 0, 2.0, -1.0);
        assert_eq!(obstacle.colspan, 1);
        assert_eq!(obstacle.beat_duration, 0.0);
        assert_eq!(obstacle.id.len(), 12);
        assert_ne!(obstacle.id, Obstacle::generate_id());
    }

    #[test]
    fn test_entity_untagged_discrimination() {
        let raw = r#"[
            {"_time": 2.0, "_lineIndex": 0, "_lineLayer": 0, "_type": 0, "_cutDirection": 1},
            {"id": "w1", "lane": 1, "type": "ceiling", "colspan": 2, "beatStart": 3.0, "beatDuration": 1.0}
        ]"#;
        let items: Vec<Entity> = serde_json::from_str(raw).unwrap();
        assert!(items[0].is_note());
        assert_eq!(items[1].as_obstacle().map(|o| o.obstacle_type), Some(ObstacleType::Ceiling));
        assert_eq!(items[1].time(), 3.0);
    }

    #[test]
    fn test_note_key_slot_normalizes_negative_zero() {
        assert_eq!(NoteKey::new(-0.0, 1, 1).slot(), NoteKey::new(0.0, 1, 1).slot());
        assert!(!NoteKey::new(0.0, 4, 0).in_grid());
    }

    #[test]
    fn test_timeline_sharing() {
        let base = Timeline::from_parts(
            vec![Note::new(0.0, 0, 0, NoteType::RedBlock, CutDirection::Down)],
            vec![Obstacle::new(0, ObstacleType::Wall, 1, 0.0, 1.0)],
        );
        let next = base.with_notes(Vec::new());
        assert!(next.shares_obstacles_with(&base));
        assert!(!next.shares_notes_with(&base));
        assert!(next.notes().is_empty());
    }
}
