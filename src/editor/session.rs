//! Editor session
//!
//! One `EditorSession` per open project. It owns the undo history (whose
//! present snapshot is the current timeline), the clipboard, the pointer
//! interaction state and the deferred-task queue. All mutation goes through
//! `dispatch`, so every command sees the snapshot the previous one committed.

use crate::config::EditorConfig;
use crate::error::EditorError;
use crate::project::{BeatmapProject, SongMeta};
use crate::scene::{self, NoteSprite, ObstacleBox};
use crate::timeline::{
    clipboard, store, Clipboard, Command, CommandKind, CutDirection, Entity, History, MirrorAxis, Note,
    NoteKey, NoteType, Obstacle, ObstacleType, Timeline, View,
};

use super::deferred::{DeferredQueue, DeferredTask};
use super::interaction::{Interaction, PointerButton, ResizeDrag, SelectionMode};
use super::navigation::Navigation;

/// Length given to a freshly drawn obstacle, before any resize
pub const DEFAULT_OBSTACLE_BEATS: f64 = 4.0;

/// What a placement-grid click puts down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tool {
    #[default]
    RedBlock,
    BlueBlock,
    Mine,
    Wall,
    Ceiling,
}

impl Tool {
    pub fn note_type(self) -> Option<NoteType> {
        match self {
            Tool::RedBlock => Some(NoteType::RedBlock),
            Tool::BlueBlock => Some(NoteType::BlueBlock),
            Tool::Mine => Some(NoteType::Mine),
            Tool::Wall | Tool::Ceiling => None,
        }
    }

    pub fn obstacle_type(self) -> Option<ObstacleType> {
        match self {
            Tool::Wall => Some(ObstacleType::Wall),
            Tool::Ceiling => Some(ObstacleType::Ceiling),
            _ => None,
        }
    }
}

/// Obstacle being drawn on the placement grid
#[derive(Debug, Clone, PartialEq)]
struct TentativeObstacle {
    obstacle: Obstacle,
    /// Lane the drag started on
    anchor_lane: u8,
}

pub struct EditorSession {
    config: EditorConfig,
    history: History,
    clipboard: Option<Clipboard>,
    interaction: Interaction,
    deferred: DeferredQueue<DeferredTask>,
    resize: Option<ResizeDrag>,
    tentative: Option<TentativeObstacle>,
    navigation: Navigation,
    song: Option<SongMeta>,
    view: View,
    tool: Tool,
    direction: CutDirection,
    /// Unsaved recorded changes
    dirty: bool,
}

impl EditorSession {
    pub fn new(config: EditorConfig) -> Self {
        let navigation = Navigation::new(config.beat_depth, config.default_bpm, config.snap_to);
        let history = History::new(Timeline::new(), config.history_limit);
        Self {
            config,
            history,
            clipboard: None,
            interaction: Interaction::Idle,
            deferred: DeferredQueue::new(),
            resize: None,
            tentative: None,
            navigation,
            song: None,
            view: View::Notes,
            tool: Tool::default(),
            direction: CutDirection::Down,
            dirty: false,
        }
    }

    /// Session with a project already loaded
    pub fn with_project(config: EditorConfig, project: BeatmapProject) -> Self {
        let mut session = Self::new(config);
        session.open_project(project);
        session
    }

    // ------------------------------------------------------------------
    // Command dispatch
    // ------------------------------------------------------------------

    /// Apply a command to the current snapshot. Returns whether it applied.
    ///
    /// Allow-listed commands become undo steps when they changed something;
    /// everything else just replaces the present snapshot. A rejected command
    /// leaves the timeline untouched.
    pub fn dispatch(&mut self, command: Command) -> bool {
        let kind = command.kind();
        let present = self.history.present();
        match command.apply(present) {
            Ok(next) => {
                // Some operations rebuild the same contents into fresh slices
                let unchanged = (next.shares_notes_with(present) && next.shares_obstacles_with(present))
                    || next == *present;
                if kind.records_history() && !unchanged {
                    self.history.record(next, kind, kind.coalesces());
                    self.dirty = true;
                } else if !unchanged {
                    self.history.replace_present(next);
                }
                true
            }
            Err(err) => {
                report_rejection(kind, &err);
                false
            }
        }
    }

    pub fn undo(&mut self) -> bool {
        let done = self.history.undo();
        if done {
            self.dirty = true;
        }
        done
    }

    pub fn redo(&mut self) -> bool {
        let done = self.history.redo();
        if done {
            self.dirty = true;
        }
        done
    }

    /// Run tasks deferred from the previous frame. Call once per frame before
    /// handling that frame's input.
    pub fn tick(&mut self) {
        for task in self.deferred.take() {
            match task {
                DeferredTask::FinishSelecting => {
                    self.interaction = Interaction::Idle;
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Song lifecycle
    // ------------------------------------------------------------------

    /// Start an empty map for `song`
    pub fn new_song(&mut self, song: SongMeta) {
        self.open_project(BeatmapProject::new(song));
    }

    /// Replace everything with a loaded project. Undo can step back to the
    /// empty timeline but never into a previously open project.
    pub fn open_project(&mut self, project: BeatmapProject) {
        self.reset_transient_state();
        self.history.reset(store::clear());
        self.navigation = Navigation::new(self.navigation.beat_depth, project.song.bpm, self.config.snap_to);
        self.dispatch(Command::FinishLoadingSong {
            notes: project.notes,
            obstacles: project.obstacles,
        });
        log::info!(
            "Opened \"{}\" ({} notes, {} obstacles)",
            project.song.name,
            self.timeline().notes().len(),
            self.timeline().obstacles().len()
        );
        self.song = Some(project.song);
        self.dirty = false;
    }

    /// Close the song and empty the timeline
    pub fn unload(&mut self) {
        self.reset_transient_state();
        self.history.reset(store::clear());
        self.song = None;
        self.dirty = false;
    }

    fn reset_transient_state(&mut self) {
        self.interaction = Interaction::Idle;
        self.deferred.clear();
        self.resize = None;
        self.tentative = None;
    }

    /// Current map as a saveable project
    pub fn to_project(&self) -> Option<BeatmapProject> {
        let song = self.song.clone()?;
        Some(BeatmapProject::from_timeline(song, self.timeline()))
    }

    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }

    // ------------------------------------------------------------------
    // Selection, clipboard and bulk edits
    // ------------------------------------------------------------------

    pub fn select_all(&mut self) {
        self.dispatch(Command::SelectAll { view: self.view });
    }

    pub fn deselect_all(&mut self) {
        self.dispatch(Command::DeselectAll { view: self.view });
    }

    pub fn delete_selected(&mut self) {
        self.dispatch(Command::DeleteSelected);
    }

    pub fn mirror_selection(&mut self, axis: MirrorAxis) {
        self.dispatch(Command::MirrorSelection(axis));
    }

    /// Copy the selection. Outside the notes view there is nothing to copy.
    pub fn copy(&mut self) {
        if self.view != View::Notes {
            return;
        }
        self.clipboard = Some(clipboard::copy(self.timeline(), self.view));
    }

    pub fn cut(&mut self) {
        if self.view != View::Notes {
            return;
        }
        let copied = clipboard::copy(self.timeline(), self.view);
        self.dispatch(Command::CutSelection { view: self.view });
        self.clipboard = Some(copied);
    }

    /// Paste at the cursor
    pub fn paste(&mut self) {
        let Some(clipboard) = self.clipboard.clone() else {
            return;
        };
        self.dispatch(Command::PasteSelection {
            view: self.view,
            at_beat: self.navigation.cursor_beats,
            clipboard,
        });
    }

    /// Export the clipboard in the legacy JSON shape
    pub fn clipboard_json(&self) -> Option<String> {
        let clipboard = self.clipboard.as_ref()?;
        match clipboard.to_json() {
            Ok(json) => Some(json),
            Err(e) => {
                log::warn!("Could not serialize clipboard: {}", e);
                None
            }
        }
    }

    /// Replace the clipboard with a legacy JSON payload
    pub fn import_clipboard_json(&mut self, json: &str) -> Result<(), serde_json::Error> {
        self.clipboard = Some(Clipboard::from_json(self.view, json)?);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Pointer events
    // ------------------------------------------------------------------

    /// Button pressed over a note. Starts a drag-selection and acts on the
    /// note itself: primary toggles selection, secondary deletes, middle
    /// swaps colour.
    pub fn pointer_down_note(&mut self, key: NoteKey, button: PointerButton) {
        let Some(note) = store::find_note(self.timeline(), &key) else {
            log::debug!("Pointer down on a note that is gone ({:?})", key);
            return;
        };
        let selected = note.selected;

        if let Some(mode) = SelectionMode::for_press(button, selected) {
            self.interaction = Interaction::Selecting(mode);
        }

        let command = match button {
            PointerButton::Primary if selected => Command::DeselectNote(key),
            PointerButton::Primary => Command::SelectNote(key),
            PointerButton::Secondary => Command::DeleteNote(key),
            PointerButton::Middle => Command::ToggleNoteColor(key),
        };
        self.dispatch(command);
    }

    /// Pointer entered a note. Applies the drag-selection mode, if any.
    pub fn pointer_over_note(&mut self, key: NoteKey) {
        let Some(mode) = self.interaction.mode() else {
            return;
        };
        let command = match mode {
            SelectionMode::Select => Command::SelectNote(key),
            SelectionMode::Deselect => Command::DeselectNote(key),
            SelectionMode::Delete => Command::BulkDeleteNote(key),
        };
        self.dispatch(command);
    }

    /// Button pressed over an obstacle. Secondary deletes it; primary may
    /// turn into a click or a resize depending on how far the pointer moves.
    pub fn pointer_down_obstacle(&mut self, id: &str, button: PointerButton, x: f32) {
        let Some(obstacle) = store::find_obstacle(self.timeline(), id) else {
            log::debug!("Pointer down on an obstacle that is gone ({})", id);
            return;
        };
        match button {
            PointerButton::Secondary => {
                self.dispatch(Command::DeleteObstacle(id.to_string()));
            }
            PointerButton::Primary => {
                self.resize = Some(ResizeDrag::new(id, x, obstacle.beat_duration));
            }
            PointerButton::Middle => {}
        }
    }

    /// Pointer entered an obstacle during a drag-selection
    pub fn pointer_over_obstacle(&mut self, id: &str) {
        let Some(mode) = self.interaction.mode() else {
            return;
        };
        let id = id.to_string();
        let command = match mode {
            SelectionMode::Select => Command::SelectObstacle(id),
            SelectionMode::Deselect => Command::DeselectObstacle(id),
            SelectionMode::Delete => Command::BulkDeleteObstacle(id),
        };
        self.dispatch(command);
    }

    /// Pointer moved horizontally to screen `x`
    pub fn pointer_move(&mut self, x: f32) {
        let snap_to = self.navigation.snap_to;
        let Some(drag) = self.resize.as_mut() else {
            return;
        };
        if let Some(beat_duration) = drag.update(x, snap_to) {
            let id = drag.id.clone();
            self.dispatch(Command::ResizeObstacle { id, beat_duration });
        }
    }

    /// Button released at screen `x`. A drag-selection ends on the next tick,
    /// so handlers for this same release (a grid click under the pointer)
    /// still see it running.
    pub fn pointer_up(&mut self, x: f32) {
        if let Some(drag) = self.resize.take() {
            if drag.is_click(x) {
                let selected = store::find_obstacle(self.timeline(), &drag.id).map(|o| o.selected);
                match selected {
                    Some(true) => self.dispatch(Command::DeselectObstacle(drag.id)),
                    Some(false) => self.dispatch(Command::SelectObstacle(drag.id)),
                    None => false,
                };
            }
        }
        if self.interaction.is_selecting() {
            self.deferred.send(DeferredTask::FinishSelecting);
        }
    }

    // ------------------------------------------------------------------
    // Placement grid
    // ------------------------------------------------------------------

    /// Click on a placement-grid cell at the cursor beat. Ignored while a
    /// drag-selection is still winding down.
    pub fn click_placement_grid(&mut self, lane: u8, layer: u8) -> bool {
        if self.interaction.is_selecting() {
            log::trace!("Grid click ignored while selecting");
            return false;
        }
        let key = NoteKey::new(self.navigation.cursor_beats, lane, layer);
        if let Some(note_type) = self.tool.note_type() {
            return self.dispatch(Command::PlaceNote {
                key,
                note_type,
                direction: self.direction,
            });
        }
        if let Some(obstacle_type) = self.tool.obstacle_type() {
            self.begin_obstacle(lane, obstacle_type);
            return true;
        }
        false
    }

    /// Drag-placement over a cell: the direction follows the pointer, so the
    /// note is replaced every frame instead of rejected.
    pub fn drag_placement(&mut self, lane: u8, layer: u8, direction: CutDirection) -> bool {
        if self.interaction.is_selecting() {
            return false;
        }
        let Some(note_type) = self.tool.note_type() else {
            return false;
        };
        self.direction = direction;
        self.dispatch(Command::PlaceNoteByDrag {
            key: NoteKey::new(self.navigation.cursor_beats, lane, layer),
            note_type,
            direction,
        })
    }

    fn begin_obstacle(&mut self, lane: u8, obstacle_type: ObstacleType) {
        let mut obstacle = Obstacle::new(
            lane,
            obstacle_type,
            1,
            self.navigation.cursor_beats,
            DEFAULT_OBSTACLE_BEATS,
        );
        obstacle.tentative = true;
        self.tentative = Some(TentativeObstacle {
            obstacle,
            anchor_lane: lane,
        });
    }

    /// Stretch the obstacle being drawn so it spans from its starting lane
    /// to `lane`
    pub fn extend_obstacle(&mut self, lane: u8) {
        let Some(tentative) = self.tentative.as_mut() else {
            return;
        };
        let lane = lane.min(crate::timeline::LANE_COUNT - 1);
        let anchor = tentative.anchor_lane;
        tentative.obstacle.lane = anchor.min(lane);
        tentative.obstacle.colspan = anchor.abs_diff(lane) + 1;
    }

    /// Add the obstacle being drawn to the map
    pub fn commit_obstacle(&mut self) -> bool {
        let Some(tentative) = self.tentative.take() else {
            return false;
        };
        self.dispatch(Command::CreateObstacle(tentative.obstacle))
    }

    pub fn cancel_obstacle(&mut self) {
        self.tentative = None;
    }

    // ------------------------------------------------------------------
    // Editor settings
    // ------------------------------------------------------------------

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn set_tool(&mut self, tool: Tool) {
        self.tool = tool;
        self.tentative = None;
    }

    pub fn direction(&self) -> CutDirection {
        self.direction
    }

    pub fn set_direction(&mut self, direction: CutDirection) {
        self.direction = direction;
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn set_view(&mut self, view: View) {
        self.view = view;
    }

    pub fn navigation(&self) -> &Navigation {
        &self.navigation
    }

    pub fn navigation_mut(&mut self) -> &mut Navigation {
        &mut self.navigation
    }

    // ------------------------------------------------------------------
    // Read API
    // ------------------------------------------------------------------

    /// Current snapshot
    pub fn timeline(&self) -> &Timeline {
        self.history.present()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn song(&self) -> Option<&SongMeta> {
        self.song.as_ref()
    }

    pub fn clipboard(&self) -> Option<&Clipboard> {
        self.clipboard.as_ref()
    }

    pub fn interaction(&self) -> Interaction {
        self.interaction
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Obstacle currently being drawn, not yet in the map
    pub fn tentative_obstacle(&self) -> Option<&Obstacle> {
        self.tentative.as_ref().map(|t| &t.obstacle)
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        self.timeline().obstacles()
    }

    pub fn selected_entities(&self) -> Vec<Entity> {
        store::selected_entities(self.timeline())
    }

    pub fn visible_notes(&self) -> Vec<Note> {
        let nav = &self.navigation;
        scene::visible_notes(
            self.timeline(),
            nav.cursor_beats,
            nav.beat_depth,
            self.config.scene.render_depth,
        )
    }

    pub fn visible_obstacles(&self) -> Vec<Obstacle> {
        let nav = &self.navigation;
        scene::visible_obstacles(
            self.timeline(),
            nav.cursor_beats,
            nav.beat_depth,
            self.config.scene.render_depth,
        )
    }

    /// Visible notes per second at the song's tempo
    pub fn note_density(&self) -> f64 {
        let nav = &self.navigation;
        scene::note_density(
            self.visible_notes().len(),
            nav.beat_depth,
            self.config.scene.render_depth,
            nav.bpm,
        )
    }

    pub fn num_blocks(&self) -> usize {
        store::num_blocks(self.timeline())
    }

    pub fn num_mines(&self) -> usize {
        store::num_mines(self.timeline())
    }

    pub fn num_obstacles(&self) -> usize {
        store::num_obstacles(self.timeline())
    }

    pub fn num_selected(&self) -> usize {
        store::num_selected(self.timeline())
    }

    /// Render records for every visible note
    pub fn note_sprites(&self) -> Vec<NoteSprite> {
        let nav = &self.navigation;
        self.visible_notes()
            .iter()
            .map(|note| scene::note_sprite(note, nav.cursor_beats, nav.beat_depth, &self.config.scene))
            .collect()
    }

    /// Render records for visible obstacles plus the one being drawn
    pub fn obstacle_boxes(&self) -> Vec<ObstacleBox> {
        let nav = &self.navigation;
        self.visible_obstacles()
            .iter()
            .chain(self.tentative_obstacle())
            .map(|obstacle| scene::obstacle_box(obstacle, nav.cursor_beats, nav.beat_depth, &self.config.scene))
            .collect()
    }
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

/// Log a rejected command at a level matching how unexpected it is
fn report_rejection(kind: CommandKind, err: &EditorError) {
    match err {
        EditorError::DuplicateNotePlacement { .. } | EditorError::OutOfGrid { .. } => {
            log::warn!("{:?} rejected: {}", kind, err);
        }
        EditorError::MissingEntity(_) => {
            log::debug!("{:?} ignored: {}", kind, err);
        }
        EditorError::ClipboardEmptyOrWrongContext => {
            log::trace!("{:?} ignored: {}", kind, err);
        }
        EditorError::InvalidDirection(_) | EditorError::InvalidNoteType(_) => {
            log::error!("{:?} failed: {}", kind, err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> EditorSession {
        let mut session = EditorSession::default();
        session.new_song(SongMeta::new("Test", 120.0));
        session
    }

    fn key(time: f64, lane: u8, layer: u8) -> NoteKey {
        NoteKey::new(time, lane, layer)
    }

    fn place(session: &mut EditorSession, time: f64, lane: u8, layer: u8) -> bool {
        session.dispatch(Command::PlaceNote {
            key: key(time, lane, layer),
            note_type: NoteType::RedBlock,
            direction: CutDirection::Down,
        })
    }

    #[test]
    fn test_place_select_delete_undo() {
        let mut session = session();
        assert!(place(&mut session, 0.0, 0, 0));
        assert!(place(&mut session, 0.0, 1, 0));
        let before = session.timeline().notes().to_vec();

        session.dispatch(Command::SelectNote(key(0.0, 0, 0)));
        session.dispatch(Command::SelectNote(key(0.0, 1, 0)));
        session.delete_selected();
        assert!(session.timeline().notes().is_empty());

        assert!(session.undo());
        let restored = session.timeline().notes();
        assert_eq!(restored.len(), 2);
        for (a, b) in restored.iter().zip(&before) {
            assert_eq!((a.time, a.lane, a.layer, a.note_type, a.cut_direction), (b.time, b.lane, b.layer, b.note_type, b.cut_direction));
        }
        assert!(restored.iter().all(|n| n.selected));
    }

    #[test]
    fn test_duplicate_placement_keeps_history() {
        let mut session = session();
        place(&mut session, 1.0, 2, 1);
        let depth = session.history().undo_depth();
        assert!(!place(&mut session, 1.0, 2, 1));
        assert_eq!(session.timeline().notes().len(), 1);
        assert_eq!(session.history().undo_depth(), depth);
    }

    #[test]
    fn test_selection_is_not_an_undo_step() {
        let mut session = session();
        place(&mut session, 1.0, 0, 0);
        let depth = session.history().undo_depth();
        session.dispatch(Command::SelectNote(key(1.0, 0, 0)));
        session.select_all();
        assert_eq!(session.history().undo_depth(), depth);
        assert_eq!(session.num_selected(), 1);
    }

    #[test]
    fn test_drag_place_replaces() {
        let mut session = session();
        session.drag_placement(1, 1, CutDirection::Up);
        session.drag_placement(1, 1, CutDirection::UpLeft);
        let notes = session.timeline().notes();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].cut_direction, CutDirection::UpLeft);
    }

    #[test]
    fn test_drag_select_finishes_next_tick() {
        let mut session = session();
        place(&mut session, 0.0, 0, 0);
        place(&mut session, 0.0, 1, 0);

        session.pointer_down_note(key(0.0, 0, 0), PointerButton::Primary);
        assert_eq!(session.interaction(), Interaction::Selecting(SelectionMode::Select));
        session.pointer_over_note(key(0.0, 1, 0));
        assert_eq!(session.num_selected(), 2);

        // Release over the grid: the same frame's click is swallowed
        session.pointer_up(0.0);
        assert!(!session.click_placement_grid(3, 0));
        assert_eq!(session.timeline().notes().len(), 2);

        session.tick();
        assert_eq!(session.interaction(), Interaction::Idle);
        assert!(session.click_placement_grid(3, 0));
        assert_eq!(session.timeline().notes().len(), 3);
    }

    #[test]
    fn test_sweep_delete_is_two_undo_steps() {
        let mut session = session();
        for lane in 0..4 {
            place(&mut session, 2.0, lane, 0);
        }
        session.pointer_down_note(key(2.0, 0, 0), PointerButton::Secondary);
        session.pointer_over_note(key(2.0, 1, 0));
        session.pointer_over_note(key(2.0, 2, 0));
        session.pointer_over_note(key(2.0, 3, 0));
        session.pointer_up(0.0);
        session.tick();
        assert!(session.timeline().notes().is_empty());

        // The sweep folds into one step after the initial click
        session.undo();
        assert_eq!(session.timeline().notes().len(), 3);
        session.undo();
        assert_eq!(session.timeline().notes().len(), 4);
    }

    #[test]
    fn test_sweep_across_obstacle_is_one_step() {
        let mut session = session();
        for lane in 0..3 {
            place(&mut session, 2.0, lane, 0);
        }
        session.dispatch(Command::CreateObstacle(Obstacle::new(3, ObstacleType::Wall, 1, 2.0, 1.0)));
        let id = session.obstacles()[0].id.clone();

        session.pointer_down_note(key(2.0, 0, 0), PointerButton::Secondary);
        session.pointer_over_note(key(2.0, 1, 0));
        session.pointer_over_obstacle(&id);
        session.pointer_over_note(key(2.0, 2, 0));
        session.pointer_up(0.0);
        session.tick();
        assert!(session.timeline().is_empty());

        session.undo();
        assert_eq!(session.timeline().notes().len(), 2);
        assert_eq!(session.num_obstacles(), 1);
        session.undo();
        assert_eq!(session.timeline().notes().len(), 3);
    }

    #[test]
    fn test_noop_edits_add_no_undo_steps() {
        let mut session = session();
        place(&mut session, 1.0, 0, 0);
        let depth = session.history().undo_depth();
        session.delete_selected();
        assert_eq!(session.history().undo_depth(), depth);

        session.dispatch(Command::CreateObstacle(Obstacle::new(0, ObstacleType::Wall, 1, 0.0, 2.0)));
        let id = session.obstacles()[0].id.clone();
        session.dispatch(Command::SelectObstacle(id));
        let depth = session.history().undo_depth();
        let before = session.timeline().clone();
        session.mirror_selection(MirrorAxis::Vertical);
        assert_eq!(session.history().undo_depth(), depth);
        assert_eq!(*session.timeline(), before);

        // Undo goes straight back past the obstacle
        assert!(session.undo());
        assert_eq!(session.num_obstacles(), 0);
    }

    #[test]
    fn test_middle_click_toggles_colour_without_selecting() {
        let mut session = session();
        place(&mut session, 0.0, 0, 0);
        session.pointer_down_note(key(0.0, 0, 0), PointerButton::Middle);
        assert_eq!(session.interaction(), Interaction::Idle);
        assert_eq!(session.timeline().notes()[0].note_type, NoteType::BlueBlock);
    }

    #[test]
    fn test_copy_paste_at_cursor() {
        let mut session = session();
        place(&mut session, 4.0, 0, 0);
        place(&mut session, 5.0, 1, 0);
        session.select_all();
        session.copy();

        session.navigation_mut().seek(10.0);
        session.paste();
        let times: Vec<f64> = session.timeline().notes().iter().filter(|n| n.selected).map(|n| n.time).collect();
        assert_eq!(times, vec![10.0, 11.0]);
        assert_eq!(session.num_selected(), 2);
    }

    #[test]
    fn test_cut_then_undo() {
        let mut session = session();
        place(&mut session, 1.0, 0, 0);
        session.select_all();
        session.cut();
        assert!(session.timeline().notes().is_empty());
        assert_eq!(session.clipboard().map(Clipboard::len), Some(1));
        session.undo();
        assert_eq!(session.timeline().notes().len(), 1);
    }

    #[test]
    fn test_clipboard_ignored_outside_notes_view() {
        let mut session = session();
        place(&mut session, 1.0, 0, 0);
        session.select_all();
        session.copy();
        session.set_view(View::Events);
        session.paste();
        session.cut();
        assert_eq!(session.timeline().notes().len(), 1);
    }

    #[test]
    fn test_clipboard_json_moves_between_sessions() {
        let mut source = session();
        place(&mut source, 4.0, 0, 0);
        place(&mut source, 5.0, 1, 2);
        source.select_all();
        source.copy();
        let json = source.clipboard_json().unwrap();

        let mut target = session();
        target.import_clipboard_json(&json).unwrap();
        assert_eq!(target.clipboard().map(Clipboard::len), Some(2));
        target.navigation_mut().seek(10.0);
        target.paste();
        let pasted: Vec<(f64, u8, u8)> = target.timeline().notes().iter().map(|n| (n.time, n.lane, n.layer)).collect();
        assert_eq!(pasted, vec![(10.0, 0, 0), (11.0, 1, 2)]);

        assert!(target.import_clipboard_json("not json").is_err());
        assert_eq!(target.clipboard().map(Clipboard::len), Some(2));
    }

    #[test]
    fn test_unload_clears_song_and_history() {
        let mut session = session();
        place(&mut session, 1.0, 0, 0);
        session.set_tool(Tool::Wall);
        session.click_placement_grid(1, 0);
        assert!(session.is_dirty());

        session.unload();
        assert!(session.timeline().is_empty());
        assert!(session.tentative_obstacle().is_none());
        assert!(!session.can_undo());
        assert!(session.song().is_none());
        assert!(!session.is_dirty());
        assert!(session.to_project().is_none());
    }

    #[test]
    fn test_open_project_and_undo_to_empty() {
        let mut project = BeatmapProject::new(SongMeta::new("Loaded", 140.0));
        project.notes.push(Note::new(1.0, 0, 0, NoteType::Mine, CutDirection::Center));
        let mut session = EditorSession::with_project(EditorConfig::default(), project);
        assert_eq!(session.num_mines(), 1);
        assert_eq!(session.navigation().bpm, 140.0);
        assert!(!session.is_dirty());

        assert!(session.undo());
        assert!(session.timeline().is_empty());
        assert!(!session.undo());
    }

    #[test]
    fn test_obstacle_draw_and_commit() {
        let mut session = session();
        session.set_tool(Tool::Wall);
        session.navigation_mut().seek(2.0);
        assert!(session.click_placement_grid(2, 0));
        session.extend_obstacle(0);
        assert_eq!(session.num_obstacles(), 0);
        assert!(session.obstacle_boxes().iter().any(|b| b.transparent));

        assert!(session.commit_obstacle());
        let obstacle = &session.obstacles()[0];
        assert_eq!((obstacle.lane, obstacle.colspan), (0, 3));
        assert_eq!(obstacle.beat_start, 2.0);
        assert!(!obstacle.tentative);
    }

    #[test]
    fn test_obstacle_click_and_resize() {
        let mut session = session();
        session.dispatch(Command::CreateObstacle(Obstacle::new(0, ObstacleType::Wall, 1, 0.0, 2.0)));
        let id = session.obstacles()[0].id.clone();

        session.pointer_down_obstacle(&id, PointerButton::Primary, 100.0);
        session.pointer_up(110.0);
        assert!(session.obstacles()[0].selected);

        session.pointer_down_obstacle(&id, PointerButton::Primary, 100.0);
        session.pointer_move(165.0);
        session.pointer_up(165.0);
        assert_eq!(session.obstacles()[0].beat_duration, 3.0);
        assert!(session.obstacles()[0].selected);

        session.pointer_down_obstacle(&id, PointerButton::Secondary, 0.0);
        assert_eq!(session.num_obstacles(), 0);
    }

    #[test]
    fn test_stale_ids_are_ignored() {
        let mut session = session();
        assert!(!session.dispatch(Command::DeleteObstacle("gone".to_string())));
        session.pointer_down_note(key(9.0, 0, 0), PointerButton::Primary);
        assert_eq!(session.interaction(), Interaction::Idle);
    }

    #[test]
    fn test_density_and_visibility() {
        let mut session = session();
        place(&mut session, 1.0, 0, 0);
        place(&mut session, 500.0, 0, 0);
        assert_eq!(session.visible_notes().len(), 1);
        assert!(session.note_density() > 0.0);
        assert_eq!(session.note_sprites().len(), 1);
    }

    #[test]
    fn test_to_project_strips_selection() {
        let mut session = session();
        place(&mut session, 1.0, 0, 0);
        session.select_all();
        let project = session.to_project().unwrap();
        assert_eq!(project.notes.len(), 1);
        assert!(!project.notes[0].selected);
    }
}
