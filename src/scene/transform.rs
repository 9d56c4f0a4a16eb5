//! Beat-time to scene-space transform
//!
//! Lanes spread along x around a centred origin, layers along y, and beat-time
//! runs away from the viewer along -z. The whole field is shifted by
//! `scene_z_for_cursor` so it scrolls towards the camera as the cursor moves.
//! Everything here is a pure function of its inputs; the renderer calls it
//! every frame.

use super::codec::{anchor_to_center_offset, box_extent_for_obstacle, direction_rotation, BoxExtent, SceneMetrics};
use super::math::Vec3;
use crate::timeline::{Note, NoteKey, NoteType, Obstacle, ObstacleType};

/// Local position of a note (before the cursor scroll)
pub fn project_note(note: &Note, beat_depth: f64, metrics: &SceneMetrics) -> Vec3 {
    let w = metrics.lane_width;
    Vec3::new(
        note.lane as f32 * w - w * 1.5,
        note.layer as f32 * w - w,
        (note.time * beat_depth * -1.0) as f32,
    )
}

/// Local centre and size of an obstacle box (before the cursor scroll)
pub fn project_obstacle(obstacle: &Obstacle, beat_depth: f64, metrics: &SceneMetrics) -> (Vec3, BoxExtent) {
    let w = metrics.lane_width;
    let top_left_front = Vec3::new(
        obstacle.lane as f32 * w - w * 2.0,
        w * 1.75,
        (obstacle.beat_start * beat_depth * -1.0) as f32,
    );
    let extent = box_extent_for_obstacle(
        obstacle.colspan,
        obstacle.obstacle_type,
        obstacle.beat_duration,
        beat_depth,
        metrics,
    );
    (anchor_to_center_offset(top_left_front, extent, metrics), extent)
}

/// Depth offset applied to the whole field for the current cursor
pub fn scene_z_for_cursor(cursor_beats: f64, beat_depth: f64, metrics: &SceneMetrics) -> f32 {
    (cursor_beats * beat_depth) as f32 - metrics.song_offset
}

/// Depth at which the cursor's beat sits after scrolling. Anything nearer
/// to the viewer than this has already been played.
pub fn strike_line_z(metrics: &SceneMetrics) -> f32 {
    -metrics.song_offset * 2.0
}

/// Everything the renderer needs to draw one note
#[derive(Debug, Clone, PartialEq)]
pub struct NoteSprite {
    pub key: NoteKey,
    /// World-space centre
    pub position: Vec3,
    /// Roll about the depth axis
    pub rotation: f32,
    pub note_type: NoteType,
    pub selected: bool,
    /// Past the strike line
    pub transparent: bool,
}

/// Everything the renderer needs to draw one obstacle
#[derive(Debug, Clone, PartialEq)]
pub struct ObstacleBox {
    pub id: String,
    /// World-space centre
    pub position: Vec3,
    pub extent: BoxExtent,
    pub obstacle_type: ObstacleType,
    pub selected: bool,
    /// Still being sized, drawn fainter
    pub transparent: bool,
}

/// Place a note in world space for the current cursor.
///
/// Entities sit one song offset behind the scrolled field origin, which puts
/// the cursor's beat exactly on the strike line.
pub fn note_sprite(note: &Note, cursor_beats: f64, beat_depth: f64, metrics: &SceneMetrics) -> NoteSprite {
    let scroll = scene_z_for_cursor(cursor_beats, beat_depth, metrics) - metrics.song_offset;
    let position = project_note(note, beat_depth, metrics).offset_z(scroll);
    NoteSprite {
        key: note.key(),
        position,
        rotation: direction_rotation(note.cut_direction),
        note_type: note.note_type,
        selected: note.selected,
        transparent: position.z > strike_line_z(metrics),
    }
}

/// Place an obstacle box in world space for the current cursor
pub fn obstacle_box(obstacle: &Obstacle, cursor_beats: f64, beat_depth: f64, metrics: &SceneMetrics) -> ObstacleBox {
    let scroll = scene_z_for_cursor(cursor_beats, beat_depth, metrics) - metrics.song_offset;
    let (centre, extent) = project_obstacle(obstacle, beat_depth, metrics);
    ObstacleBox {
        id: obstacle.id.clone(),
        position: centre.offset_z(scroll),
        extent,
        obstacle_type: obstacle.obstacle_type,
        selected: obstacle.selected,
        transparent: obstacle.tentative,
    }
}
