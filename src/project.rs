//! Project files
//!
//! A project is the song metadata plus the placed notes and obstacles, stored
//! as RON. Files are written brotli-compressed; reading accepts either
//! compressed or plain RON, detected from the first byte.

use std::borrow::Cow;
use std::fs;
use std::io::Cursor;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::timeline::{Note, Obstacle, Timeline, LANE_COUNT, LAYER_COUNT};

/// Validation limits to keep hostile or corrupt files from exhausting memory
pub mod limits {
    /// Maximum notes in one project
    pub const MAX_NOTES: usize = 100_000;
    /// Maximum obstacles in one project
    pub const MAX_OBSTACLES: usize = 20_000;
    /// Largest beat value accepted anywhere
    pub const MAX_BEAT: f64 = 1_000_000.0;
    /// Maximum obstacle id length
    pub const MAX_ID_LEN: usize = 64;
    /// Maximum song name length
    pub const MAX_NAME_LEN: usize = 256;
    /// Maximum tempo
    pub const MAX_BPM: f64 = 10_000.0;
}

/// Error type for project loading and saving
#[derive(Debug)]
pub enum ProjectError {
    Io(std::io::Error),
    Parse(ron::error::SpannedError),
    Serialize(ron::Error),
    Compression(String),
    Validation(String),
}

impl From<std::io::Error> for ProjectError {
    fn from(e: std::io::Error) -> Self {
        ProjectError::Io(e)
    }
}

impl From<ron::error::SpannedError> for ProjectError {
    fn from(e: ron::error::SpannedError) -> Self {
        ProjectError::Parse(e)
    }
}

impl From<ron::Error> for ProjectError {
    fn from(e: ron::Error) -> Self {
        ProjectError::Serialize(e)
    }
}

impl std::fmt::Display for ProjectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProjectError::Io(e) => write!(f, "IO error: {}", e),
            ProjectError::Parse(e) => write!(f, "Parse error: {}", e),
            ProjectError::Serialize(e) => write!(f, "Serialize error: {}", e),
            ProjectError::Compression(e) => write!(f, "Compression error: {}", e),
            ProjectError::Validation(e) => write!(f, "Validation error: {}", e),
        }
    }
}

impl std::error::Error for ProjectError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProjectError::Io(e) => Some(e),
            ProjectError::Parse(e) => Some(e),
            ProjectError::Serialize(e) => Some(e),
            _ => None,
        }
    }
}

/// Song the map is built for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongMeta {
    pub name: String,
    /// Tempo in beats per minute
    pub bpm: f64,
    /// Seconds of audio before beat 0
    #[serde(default)]
    pub offset: f64,
}

impl SongMeta {
    pub fn new(name: &str, bpm: f64) -> Self {
        Self {
            name: name.to_string(),
            bpm,
            offset: 0.0,
        }
    }
}

/// Everything saved for one map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeatmapProject {
    pub song: SongMeta,
    #[serde(default)]
    pub notes: Vec<Note>,
    #[serde(default)]
    pub obstacles: Vec<Obstacle>,
}

impl BeatmapProject {
    pub fn new(song: SongMeta) -> Self {
        Self {
            song,
            notes: Vec::new(),
            obstacles: Vec::new(),
        }
    }

    /// Capture a timeline snapshot. Selection and tentative obstacles are
    /// editor state and are not saved.
    pub fn from_timeline(song: SongMeta, timeline: &Timeline) -> Self {
        let notes = timeline
            .notes()
            .iter()
            .map(|note| Note {
                selected: false,
                ..note.clone()
            })
            .collect();
        let obstacles = timeline
            .obstacles()
            .iter()
            .filter(|obstacle| !obstacle.tentative)
            .map(|obstacle| Obstacle {
                selected: false,
                ..obstacle.clone()
            })
            .collect();
        Self { song, notes, obstacles }
    }
}

fn is_valid_beat(beat: f64) -> bool {
    beat.is_finite() && beat.abs() <= limits::MAX_BEAT
}

fn validate_note(note: &Note, idx: usize) -> Result<(), String> {
    if !is_valid_beat(note.time) {
        return Err(format!("note {}: invalid time {}", idx, note.time));
    }
    if note.lane >= LANE_COUNT || note.layer >= LAYER_COUNT {
        return Err(format!(
            "note {}: lane/layer ({}, {}) outside the grid",
            idx, note.lane, note.layer
        ));
    }
    Ok(())
}

fn validate_obstacle(obstacle: &Obstacle, idx: usize) -> Result<(), String> {
    if obstacle.id.is_empty() || obstacle.id.len() > limits::MAX_ID_LEN {
        return Err(format!("obstacle {}: id length {} out of range", idx, obstacle.id.len()));
    }
    if !is_valid_beat(obstacle.beat_start) {
        return Err(format!("obstacle {}: invalid start {}", idx, obstacle.beat_start));
    }
    if !is_valid_beat(obstacle.beat_duration) || obstacle.beat_duration < 0.0 {
        return Err(format!("obstacle {}: invalid duration {}", idx, obstacle.beat_duration));
    }
    if obstacle.colspan == 0 || obstacle.lane as u16 + obstacle.colspan as u16 > LANE_COUNT as u16 {
        return Err(format!(
            "obstacle {}: lane {} with span {} does not fit the grid",
            idx, obstacle.lane, obstacle.colspan
        ));
    }
    Ok(())
}

/// Validate a project to reject malformed files
pub fn validate_project(project: &BeatmapProject) -> Result<(), ProjectError> {
    let song = &project.song;
    if song.name.len() > limits::MAX_NAME_LEN {
        return Err(ProjectError::Validation(format!(
            "song name too long ({} > {})",
            song.name.len(),
            limits::MAX_NAME_LEN
        )));
    }
    if !song.bpm.is_finite() || song.bpm <= 0.0 || song.bpm > limits::MAX_BPM {
        return Err(ProjectError::Validation(format!("invalid bpm {}", song.bpm)));
    }
    if !song.offset.is_finite() {
        return Err(ProjectError::Validation(format!("invalid offset {}", song.offset)));
    }

    if project.notes.len() > limits::MAX_NOTES {
        return Err(ProjectError::Validation(format!(
            "too many notes ({} > {})",
            project.notes.len(),
            limits::MAX_NOTES
        )));
    }
    if project.obstacles.len() > limits::MAX_OBSTACLES {
        return Err(ProjectError::Validation(format!(
            "too many obstacles ({} > {})",
            project.obstacles.len(),
            limits::MAX_OBSTACLES
        )));
    }

    for (i, note) in project.notes.iter().enumerate() {
        validate_note(note, i).map_err(ProjectError::Validation)?;
    }
    for (i, obstacle) in project.obstacles.iter().enumerate() {
        validate_obstacle(obstacle, i).map_err(ProjectError::Validation)?;
    }

    Ok(())
}

/// How a project file's bytes are stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Encoding {
    Ron,
    Brotli,
}

impl Encoding {
    /// RON text opens with `(` or whitespace. Anything else is taken as brotli.
    fn sniff(bytes: &[u8]) -> Encoding {
        match bytes.first() {
            Some(b'(') => Encoding::Ron,
            Some(b) if b.is_ascii_whitespace() => Encoding::Ron,
            _ => Encoding::Brotli,
        }
    }
}

fn inflate(bytes: &[u8]) -> Result<Vec<u8>, ProjectError> {
    let mut inflated = Vec::new();
    brotli::BrotliDecompress(&mut Cursor::new(bytes), &mut inflated)
        .map_err(|e| ProjectError::Compression(format!("brotli decompression failed: {}", e)))?;
    Ok(inflated)
}

/// Decode project bytes, compressed or not
pub fn load_project_from_bytes(bytes: &[u8]) -> Result<BeatmapProject, ProjectError> {
    let raw: Cow<'_, [u8]> = match Encoding::sniff(bytes) {
        Encoding::Ron => Cow::Borrowed(bytes),
        Encoding::Brotli => Cow::Owned(inflate(bytes)?),
    };
    let text = std::str::from_utf8(&raw)
        .map_err(|e| ProjectError::Validation(format!("project is not UTF-8 text: {}", e)))?;
    load_project_from_str(text)
}

/// Parse and validate a plain RON project
pub fn load_project_from_str(s: &str) -> Result<BeatmapProject, ProjectError> {
    let project: BeatmapProject = ron::from_str(s)?;
    validate_project(&project)?;
    Ok(project)
}

/// Load a project file (compressed or plain RON)
pub fn load_project<P: AsRef<Path>>(path: P) -> Result<BeatmapProject, ProjectError> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;
    let project = load_project_from_bytes(&bytes).map_err(|e| {
        log::warn!("Failed to load project {}: {}", path.display(), e);
        e
    })?;
    log::info!(
        "Loaded project {} ({} notes, {} obstacles)",
        path.display(),
        project.notes.len(),
        project.obstacles.len()
    );
    Ok(project)
}

/// Serialize a project as pretty RON text
pub fn project_to_ron(project: &BeatmapProject) -> Result<String, ProjectError> {
    let config = ron::ser::PrettyConfig::new().depth_limit(3).indentor("  ".to_string());
    Ok(ron::ser::to_string_pretty(project, config)?)
}

/// Save a project as brotli-compressed RON
pub fn save_project<P: AsRef<Path>>(project: &BeatmapProject, path: P) -> Result<(), ProjectError> {
    let path = path.as_ref();
    let ron_string = project_to_ron(project)?;

    // Quality 6, window 22: quick saves, still small files
    let mut compressed = Vec::new();
    brotli::BrotliCompress(
        &mut Cursor::new(ron_string.as_bytes()),
        &mut compressed,
        &brotli::enc::BrotliEncoderParams {
            quality: 6,
            lgwin: 22,
            ..Default::default()
        },
    )
    .map_err(|e| ProjectError::Compression(format!("brotli compression failed: {}", e)))?;

    fs::write(path, compressed)?;
    log::info!("Saved project {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::{CutDirection, NoteType, ObstacleType};

    fn sample() -> BeatmapProject {
        let mut project = BeatmapProject::new(SongMeta::new("Test Song", 128.0));
        project.notes.push(Note::new(1.0, 0, 0, NoteType::RedBlock, CutDirection::Down));
        project.notes.push(Note::new(1.5, 3, 2, NoteType::Mine, CutDirection::Center));
        project.obstacles.push(Obstacle::new(1, ObstacleType::Ceiling, 2, 4.0, 2.0));
        project
    }

    #[test]
    fn test_save_load_compressed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.ron");
        let project = sample();

        save_project(&project, &path).unwrap();
        let bytes = fs::read(&path).unwrap();
        assert_ne!(bytes.first(), Some(&b'('));

        let loaded = load_project(&path).unwrap();
        assert_eq!(loaded, project);
    }

    #[test]
    fn test_load_plain_ron() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.ron");
        let project = sample();
        fs::write(&path, project_to_ron(&project).unwrap()).unwrap();

        let loaded = load_project(&path).unwrap();
        assert_eq!(loaded.notes.len(), 2);
        assert_eq!(loaded.obstacles[0].obstacle_type, ObstacleType::Ceiling);
    }

    #[test]
    fn test_rejects_out_of_grid_note() {
        let mut project = sample();
        project.notes.push(Note::new(2.0, 4, 0, NoteType::BlueBlock, CutDirection::Up));
        assert!(matches!(validate_project(&project), Err(ProjectError::Validation(_))));
    }

    #[test]
    fn test_rejects_bad_numbers() {
        let mut project = sample();
        project.notes[0].time = f64::NAN;
        assert!(validate_project(&project).is_err());

        let mut project = sample();
        project.song.bpm = 0.0;
        assert!(validate_project(&project).is_err());

        let mut project = sample();
        project.obstacles[0].lane = 3;
        assert!(validate_project(&project).is_err());
    }

    #[test]
    fn test_garbage_is_compression_error() {
        let result = load_project_from_bytes(&[0xff, 0x00, 0x13, 0x37]);
        assert!(matches!(result, Err(ProjectError::Compression(_)) | Err(ProjectError::Validation(_))));
    }

    #[test]
    fn test_sniffs_encoding_from_first_byte() {
        assert_eq!(Encoding::sniff(b"(song: ())"), Encoding::Ron);
        assert_eq!(Encoding::sniff(b"\n  (song: ())"), Encoding::Ron);
        assert_eq!(Encoding::sniff(&[0x1b, 0x02]), Encoding::Brotli);
        assert_eq!(Encoding::sniff(&[]), Encoding::Brotli);
    }

    #[test]
    fn test_leading_whitespace_ron_loads() {
        let project = sample();
        let text = format!("\n{}", project_to_ron(&project).unwrap());
        let loaded = load_project_from_bytes(text.as_bytes()).unwrap();
        assert_eq!(loaded, project);
    }

    #[test]
    fn test_compressed_binary_is_rejected() {
        let mut compressed = Vec::new();
        brotli::BrotliCompress(
            &mut Cursor::new([0xffu8, 0xfe, 0xfd]),
            &mut compressed,
            &brotli::enc::BrotliEncoderParams::default(),
        )
        .unwrap();
        let result = load_project_from_bytes(&compressed);
        assert!(matches!(result, Err(ProjectError::Validation(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_project(dir.path().join("nope.ron"));
        assert!(matches!(result, Err(ProjectError::Io(_))));
    }

    #[test]
    fn test_from_timeline_strips_editor_state() {
        let mut note = Note::new(0.0, 0, 0, NoteType::RedBlock, CutDirection::Down);
        note.selected = true;
        let mut pending = Obstacle::new(0, ObstacleType::Wall, 1, 0.0, 1.0);
        pending.tentative = true;
        let timeline = Timeline::from_parts(vec![note], vec![pending]);

        let project = BeatmapProject::from_timeline(SongMeta::new("x", 100.0), &timeline);
        assert!(!project.notes[0].selected);
        assert!(project.obstacles.is_empty());
    }
}
