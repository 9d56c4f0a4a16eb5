//! blockmap preview: a thin 3D front end over the editor session
//!
//! Draws the scrolling note field with macroquad and turns mouse and keyboard
//! input into session calls. Everything interesting happens in the library.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use macroquad::prelude::*;

use blockmap::editor::{EditorSession, PointerButton, Tool};
use blockmap::project::{load_project, save_project, BeatmapProject, SongMeta};
use blockmap::scene::{self, NoteSprite, ObstacleBox};
use blockmap::timeline::{CutDirection, MirrorAxis, Note, NoteKey, NoteType, LANE_COUNT, LAYER_COUNT};
use blockmap::{EditorConfig, VERSION};

/// Screen distance (pixels) within which the pointer hovers an entity
const PICK_RADIUS_PX: f32 = 28.0;
/// Drag distance on a grid cell before placement follows the pointer
const DRAG_PLACE_PX: f32 = 12.0;
const STATUS_SECS: f64 = 2.5;

#[derive(Parser, Debug)]
#[command(name = "blockmap", version, about = "Timeline editor for block-slicing rhythm game maps")]
struct Cli {
    /// Project file to open (created on first save if missing)
    project: Option<PathBuf>,

    /// Config file (defaults to the platform config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Scene units per beat
    #[arg(long)]
    beat_depth: Option<f64>,

    /// Tempo for a new project
    #[arg(long, default_value_t = 120.0)]
    bpm: f64,
}

/// What the pointer is over
#[derive(Debug, Clone, PartialEq)]
enum Hover {
    Note(NoteKey),
    Obstacle(String),
    Cell(u8, u8),
}

/// A press that started on the placement grid
#[derive(Debug, Clone, Copy)]
struct GridPress {
    lane: u8,
    layer: u8,
    origin: Vec2,
    dragged: bool,
}

struct App {
    session: EditorSession,
    path: PathBuf,
    camera: Camera3D,
    hover: Option<Hover>,
    grid_press: Option<GridPress>,
    playing: bool,
    status: Option<(String, f64)>,
}

impl App {
    fn set_status(&mut self, message: &str) {
        log::info!("{}", message);
        self.status = Some((message.to_string(), get_time() + STATUS_SECS));
    }

    fn status(&self) -> Option<&str> {
        match &self.status {
            Some((msg, expiry)) if get_time() < *expiry => Some(msg.as_str()),
            _ => None,
        }
    }

    fn save(&mut self) {
        let Some(project) = self.session.to_project() else {
            return;
        };
        match save_project(&project, &self.path) {
            Ok(()) => {
                self.session.mark_saved();
                let msg = format!("Saved {}", self.path.display());
                self.set_status(&msg);
            }
            Err(e) => {
                log::error!("Save failed: {}", e);
                self.set_status(&format!("Save failed: {}", e));
            }
        }
    }
}

fn window_conf() -> Conf {
    Conf {
        window_title: format!("blockmap v{}", VERSION),
        window_width: 1280,
        window_height: 800,
        window_resizable: true,
        high_dpi: true,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    #[cfg(not(target_arch = "wasm32"))]
    crashlog::setup!(crashlog::cargo_metadata!().capitalized(), false);

    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .try_init();

    if let Err(e) = run(Cli::parse()).await {
        log::error!("{:#}", e);
    }
}

fn load_config(cli: &Cli) -> EditorConfig {
    let mut config = match &cli.config {
        Some(path) => EditorConfig::load_or_default(path),
        None => EditorConfig::load(),
    };
    if let Some(depth) = cli.beat_depth.filter(|d| d.is_finite() && *d > 0.0) {
        config.beat_depth = depth;
    }
    config
}

fn open_or_create(path: &Path, bpm: f64) -> anyhow::Result<BeatmapProject> {
    if path.exists() {
        return load_project(path).with_context(|| format!("opening {}", path.display()));
    }
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Untitled");
    log::info!("{} does not exist yet, starting a new map", path.display());
    Ok(BeatmapProject::new(SongMeta::new(name, bpm)))
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli);
    let path = cli.project.clone().unwrap_or_else(|| PathBuf::from("untitled.ron"));
    let project = open_or_create(&path, cli.bpm)?;

    let mut app = App {
        session: EditorSession::with_project(config, project),
        path,
        camera: Camera3D {
            position: vec3(0.0, 1.2, 0.0),
            target: vec3(0.0, 0.0, -30.0),
            up: vec3(0.0, 1.0, 0.0),
            ..Default::default()
        },
        hover: None,
        grid_press: None,
        playing: false,
        status: None,
    };

    loop {
        // Deferred work from last frame runs before this frame's input
        app.session.tick();

        handle_keys(&mut app);
        if app.playing {
            let dt = get_frame_time() as f64;
            app.session.navigation_mut().advance_seconds(dt);
        }
        handle_pointer(&mut app);

        clear_background(Color::from_rgba(18, 18, 24, 255));
        set_camera(&app.camera);
        draw_placement_grid(&app);
        for sprite in app.session.note_sprites() {
            draw_note(&sprite);
        }
        for obstacle in app.session.obstacle_boxes() {
            draw_obstacle(&obstacle);
        }
        set_default_camera();
        draw_hud(&app);

        next_frame().await;
    }
}

// ----------------------------------------------------------------------
// Input
// ----------------------------------------------------------------------

fn ctrl_down() -> bool {
    is_key_down(KeyCode::LeftControl)
        || is_key_down(KeyCode::RightControl)
        || is_key_down(KeyCode::LeftSuper)
        || is_key_down(KeyCode::RightSuper)
}

fn handle_keys(app: &mut App) {
    let ctrl = ctrl_down();
    let shift = is_key_down(KeyCode::LeftShift) || is_key_down(KeyCode::RightShift);
    let session = &mut app.session;

    if ctrl {
        if is_key_pressed(KeyCode::Z) {
            if shift {
                session.redo();
            } else {
                session.undo();
            }
        }
        if is_key_pressed(KeyCode::Y) {
            session.redo();
        }
        if is_key_pressed(KeyCode::C) {
            session.copy();
        }
        if is_key_pressed(KeyCode::X) {
            session.cut();
        }
        if is_key_pressed(KeyCode::V) {
            session.paste();
        }
        if is_key_pressed(KeyCode::A) {
            session.select_all();
        }
        if is_key_pressed(KeyCode::S) {
            app.save();
        }
        return;
    }

    if is_key_pressed(KeyCode::Delete) || is_key_pressed(KeyCode::Backspace) {
        session.delete_selected();
    }
    if is_key_pressed(KeyCode::Escape) {
        session.cancel_obstacle();
        session.deselect_all();
    }
    if is_key_pressed(KeyCode::H) {
        session.mirror_selection(MirrorAxis::Horizontal);
    }
    if is_key_pressed(KeyCode::V) {
        session.mirror_selection(MirrorAxis::Vertical);
    }
    if is_key_pressed(KeyCode::T) {
        session.mirror_selection(MirrorAxis::Time);
    }

    let tools = [
        (KeyCode::Key1, Tool::RedBlock),
        (KeyCode::Key2, Tool::BlueBlock),
        (KeyCode::Key3, Tool::Mine),
        (KeyCode::Key4, Tool::Wall),
        (KeyCode::Key5, Tool::Ceiling),
    ];
    for (key, tool) in tools {
        if is_key_pressed(key) {
            session.set_tool(tool);
        }
    }

    if is_key_pressed(KeyCode::Q) || is_key_pressed(KeyCode::E) {
        let all = CutDirection::ALL;
        let idx = all.iter().position(|d| *d == session.direction()).unwrap_or(0);
        let next = if is_key_pressed(KeyCode::E) {
            (idx + 1) % all.len()
        } else {
            (idx + all.len() - 1) % all.len()
        };
        session.set_direction(all[next]);
    }

    if is_key_pressed(KeyCode::Space) {
        app.playing = !app.playing;
    }
    let nav = app.session.navigation_mut();
    if is_key_pressed(KeyCode::Up) {
        nav.scroll(1);
    }
    if is_key_pressed(KeyCode::Down) {
        nav.scroll(-1);
    }
    if is_key_pressed(KeyCode::Equal) {
        nav.zoom(1.25);
    }
    if is_key_pressed(KeyCode::Minus) {
        nav.zoom(0.8);
    }
    let (_, wheel) = mouse_wheel();
    if wheel > 0.0 {
        nav.scroll(1);
    } else if wheel < 0.0 {
        nav.scroll(-1);
    }
}

/// Project a world point through the camera into screen pixels
fn world_to_screen(camera: &Camera3D, point: scene::Vec3) -> Option<Vec2> {
    let clip = camera.matrix() * vec4(point.x, point.y, point.z, 1.0);
    if clip.w <= 0.0 {
        return None;
    }
    let ndc = clip.truncate() / clip.w;
    Some(vec2(
        (ndc.x + 1.0) * 0.5 * screen_width(),
        (1.0 - ndc.y) * 0.5 * screen_height(),
    ))
}

/// Grid cells at the strike line, as notes at the cursor beat
fn cell_positions(session: &EditorSession) -> Vec<(u8, u8, scene::Vec3)> {
    let nav = session.navigation();
    let metrics = &session.config().scene;
    let mut cells = Vec::new();
    for lane in 0..LANE_COUNT {
        for layer in 0..LAYER_COUNT {
            let probe = Note::new(nav.cursor_beats, lane, layer, NoteType::RedBlock, CutDirection::Center);
            let sprite = scene::note_sprite(&probe, nav.cursor_beats, nav.beat_depth, metrics);
            cells.push((lane, layer, sprite.position));
        }
    }
    cells
}

/// Nearest entity (or grid cell) under the pointer. Entities win over cells.
fn pick(app: &App, mouse: Vec2) -> Option<Hover> {
    let nearest = |candidates: Vec<(Hover, scene::Vec3)>| {
        candidates
            .into_iter()
            .filter_map(|(hover, pos)| {
                let screen = world_to_screen(&app.camera, pos)?;
                let dist = screen.distance(mouse);
                (dist <= PICK_RADIUS_PX).then_some((hover, dist))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(hover, _)| hover)
    };

    let notes = app
        .session
        .note_sprites()
        .into_iter()
        .map(|s| (Hover::Note(s.key), s.position))
        .collect();
    if let Some(hit) = nearest(notes) {
        return Some(hit);
    }

    let obstacles = app
        .session
        .obstacle_boxes()
        .into_iter()
        .filter(|b| !b.transparent)
        .map(|b| (Hover::Obstacle(b.id), b.position))
        .collect();
    if let Some(hit) = nearest(obstacles) {
        return Some(hit);
    }

    let cells = cell_positions(&app.session)
        .into_iter()
        .map(|(lane, layer, pos)| (Hover::Cell(lane, layer), pos))
        .collect();
    nearest(cells)
}

fn pressed_button() -> Option<PointerButton> {
    if is_mouse_button_pressed(MouseButton::Left) {
        Some(PointerButton::Primary)
    } else if is_mouse_button_pressed(MouseButton::Right) {
        Some(PointerButton::Secondary)
    } else if is_mouse_button_pressed(MouseButton::Middle) {
        Some(PointerButton::Middle)
    } else {
        None
    }
}

/// Cut direction for a drag from `from` to `to` (screen y grows downwards)
fn direction_from_drag(from: Vec2, to: Vec2) -> CutDirection {
    let d = to - from;
    let angle = (-d.y).atan2(d.x).to_degrees();
    let sector = ((angle + 360.0 + 22.5) % 360.0 / 45.0) as u32;
    match sector {
        0 => CutDirection::Right,
        1 => CutDirection::UpRight,
        2 => CutDirection::Up,
        3 => CutDirection::UpLeft,
        4 => CutDirection::Left,
        5 => CutDirection::DownLeft,
        6 => CutDirection::Down,
        _ => CutDirection::DownRight,
    }
}

fn handle_pointer(app: &mut App) {
    let (mx, my) = mouse_position();
    let mouse = vec2(mx, my);
    let hover = pick(app, mouse);

    // Entering a new target
    if hover != app.hover {
        match &hover {
            Some(Hover::Note(key)) => app.session.pointer_over_note(*key),
            Some(Hover::Obstacle(id)) => app.session.pointer_over_obstacle(id),
            Some(Hover::Cell(lane, _)) => app.session.extend_obstacle(*lane),
            None => {}
        }
        app.hover = hover.clone();
    }

    app.session.pointer_move(mx);

    if let Some(button) = pressed_button() {
        match &hover {
            Some(Hover::Note(key)) => app.session.pointer_down_note(*key, button),
            Some(Hover::Obstacle(id)) => app.session.pointer_down_obstacle(id, button, mx),
            Some(Hover::Cell(lane, layer)) if button == PointerButton::Primary => {
                if app.session.tool().obstacle_type().is_some() {
                    app.session.click_placement_grid(*lane, *layer);
                } else {
                    app.grid_press = Some(GridPress {
                        lane: *lane,
                        layer: *layer,
                        origin: mouse,
                        dragged: false,
                    });
                }
            }
            _ => {}
        }
    }

    if let Some(press) = app.grid_press.as_mut() {
        if is_mouse_button_down(MouseButton::Left) && press.origin.distance(mouse) > DRAG_PLACE_PX {
            press.dragged = true;
            let direction = direction_from_drag(press.origin, mouse);
            let (lane, layer) = (press.lane, press.layer);
            app.session.drag_placement(lane, layer, direction);
        }
    }

    let released = is_mouse_button_released(MouseButton::Left)
        || is_mouse_button_released(MouseButton::Right)
        || is_mouse_button_released(MouseButton::Middle);
    if released {
        app.session.pointer_up(mx);
        if app.session.tentative_obstacle().is_some() {
            app.session.commit_obstacle();
        }
        if let Some(press) = app.grid_press.take() {
            if !press.dragged && hover == Some(Hover::Cell(press.lane, press.layer)) {
                app.session.click_placement_grid(press.lane, press.layer);
            }
        }
    }
}

// ----------------------------------------------------------------------
// Drawing
// ----------------------------------------------------------------------

fn note_color(note_type: NoteType) -> Color {
    match note_type {
        NoteType::RedBlock => Color::from_rgba(230, 60, 70, 255),
        NoteType::BlueBlock => Color::from_rgba(60, 130, 240, 255),
        NoteType::Mine => Color::from_rgba(104, 116, 133, 255),
    }
}

fn draw_note(sprite: &NoteSprite) {
    let centre: Vec3 = sprite.position.into();
    let mut color = note_color(sprite.note_type);
    if sprite.transparent {
        color.a = 0.25;
    }
    let size = if sprite.note_type == NoteType::Mine { 0.6 } else { 0.8 };
    draw_cube(centre, vec3(size, size, size), None, color);
    if sprite.selected {
        draw_cube_wires(centre, vec3(size + 0.1, size + 0.1, size + 0.1), YELLOW);
    }

    if sprite.note_type.is_block() {
        // Blocks are modelled pointing down; rotate that vector by the roll
        let dir = vec3(sprite.rotation.sin(), -sprite.rotation.cos(), 0.0);
        let front = centre + vec3(0.0, 0.0, size * 0.5 + 0.01);
        draw_line_3d(front, front + dir * (size * 0.4), WHITE);
    }
}

fn draw_obstacle(obstacle: &ObstacleBox) {
    let centre: Vec3 = obstacle.position.into();
    let size = vec3(obstacle.extent.width, obstacle.extent.height, obstacle.extent.depth);
    let alpha = if obstacle.transparent { 0.15 } else { 0.4 };
    draw_cube(centre, size, None, Color::new(1.0, 0.0, 0.0, alpha));
    let wire = if obstacle.selected { YELLOW } else { Color::new(1.0, 0.3, 0.3, 0.8) };
    draw_cube_wires(centre, size, wire);
}

fn draw_placement_grid(app: &App) {
    let w = app.session.config().scene.lane_width;
    for (lane, layer, pos) in cell_positions(&app.session) {
        let hovered = app.hover == Some(Hover::Cell(lane, layer));
        let color = if hovered { Color::new(1.0, 1.0, 1.0, 0.6) } else { Color::new(1.0, 1.0, 1.0, 0.15) };
        draw_cube_wires(pos.into(), vec3(w * 0.95, w * 0.95, 0.02), color);
    }
}

fn draw_hud(app: &App) {
    let session = &app.session;
    let nav = session.navigation();
    let song = session.song().map(|s| s.name.as_str()).unwrap_or("-");
    let lines = [
        format!("{}{}", song, if session.is_dirty() { " *" } else { "" }),
        format!("beat {:.2}  bpm {:.0}  depth {:.1}", nav.cursor_beats, nav.bpm, nav.beat_depth),
        format!(
            "blocks {}  mines {}  obstacles {}  selected {}",
            session.num_blocks(),
            session.num_mines(),
            session.num_obstacles(),
            session.num_selected()
        ),
        format!("density {:.2} notes/s", session.note_density()),
        format!("tool {:?}  direction {:?}", session.tool(), session.direction()),
        format!(
            "undo {}  redo {}",
            session.history().undo_depth(),
            session.history().redo_depth()
        ),
    ];
    for (i, line) in lines.iter().enumerate() {
        draw_text(line, 12.0, 24.0 + i as f32 * 20.0, 20.0, LIGHTGRAY);
    }
    if let Some(status) = app.status() {
        draw_text(status, 12.0, screen_height() - 16.0, 20.0, WHITE);
    }
}
