//! Board session controller: wires the engine, history, autosave scheduler
//! and persistence client together for one board editing session.
//!
//! DESIGN
//! ======
//! [`BoardSession`] is the synchronous core, shared behind a mutex. The
//! background tasks (autosave tick, zoom poll) lock it briefly, collect
//! work, and perform network I/O with the lock released — the lock is never
//! held across an await. [`BoardController`] is the host-facing handle: it
//! owns the task handles and forwards commands to the session.
//!
//! ERROR HANDLING
//! ==============
//! Network failures are logged and surface only as a stalled save status.
//! Once the engine is released (unmount), every session operation degrades
//! to a silent no-op.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::api::{BoardApi, BoardPatch, BoardRecord};
use crate::autosave::{AutosaveScheduler, SaveKind};
use crate::camera::Point;
use crate::consts::{
    AUTOSAVE_TICK_MS, CONTENT_SAVE_WINDOW_MS, DEFAULT_BRUSH_WIDTH, DEFAULT_STROKE_COLOR,
    HISTORY_CAPACITY, SAVED_STATUS_RESET_MS, SETTLE_DELAY_MS, THUMBNAIL_SAVE_WINDOW_MS,
    ZOOM_POLL_MS,
};
use crate::engine::{Action, Engine};
use crate::history::History;
use crate::input::{Tool, WheelDelta};
use crate::scene::{ObjectId, PartialDrawable};
use crate::surface::RenderSurface;

/// Save lifecycle shown by the UI shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SaveStatus {
    #[default]
    Idle,
    Saving,
    /// Shown briefly after a successful save, then reverts to idle.
    Saved,
}

/// Session tuning knobs, loadable from environment variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Inactivity window before a content-only autosave.
    pub content_window: Duration,
    /// Inactivity window before a content-plus-thumbnail autosave.
    pub thumbnail_window: Duration,
    /// Background autosave task tick interval.
    pub autosave_tick: Duration,
    /// Zoom poll interval.
    pub zoom_poll_interval: Duration,
    /// Delay between scene load and settings re-apply.
    pub settle_delay: Duration,
    /// How long the "saved" status is shown before reverting to idle.
    pub saved_status_reset: Duration,
    /// Maximum undo/redo snapshots.
    pub history_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            content_window: Duration::from_millis(CONTENT_SAVE_WINDOW_MS),
            thumbnail_window: Duration::from_millis(THUMBNAIL_SAVE_WINDOW_MS),
            autosave_tick: Duration::from_millis(AUTOSAVE_TICK_MS),
            zoom_poll_interval: Duration::from_millis(ZOOM_POLL_MS),
            settle_delay: Duration::from_millis(SETTLE_DELAY_MS),
            saved_status_reset: Duration::from_millis(SAVED_STATUS_RESET_MS),
            history_capacity: HISTORY_CAPACITY,
        }
    }
}

impl SessionConfig {
    /// Load tuning knobs from environment variables, falling back to the
    /// defaults for missing or unparsable values.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            content_window: Duration::from_millis(env_parse(
                "AUTOSAVE_CONTENT_MS",
                CONTENT_SAVE_WINDOW_MS,
            )),
            thumbnail_window: Duration::from_millis(env_parse(
                "AUTOSAVE_THUMBNAIL_MS",
                THUMBNAIL_SAVE_WINDOW_MS,
            )),
            autosave_tick: Duration::from_millis(env_parse("AUTOSAVE_TICK_MS", AUTOSAVE_TICK_MS)),
            zoom_poll_interval: Duration::from_millis(env_parse("ZOOM_POLL_MS", ZOOM_POLL_MS)),
            settle_delay: Duration::from_millis(env_parse("SETTLE_DELAY_MS", SETTLE_DELAY_MS)),
            saved_status_reset: Duration::from_millis(env_parse(
                "SAVED_STATUS_RESET_MS",
                SAVED_STATUS_RESET_MS,
            )),
            history_capacity: env_parse("HISTORY_CAPACITY", HISTORY_CAPACITY),
        }
    }
}

fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    match std::env::var(key) {
        Ok(raw) => raw.parse().unwrap_or(default),
        Err(_) => default,
    }
}

/// Synchronous session core for one board.
pub struct BoardSession {
    engine: Option<Engine>,
    history: History,
    scheduler: AutosaveScheduler,
    save_status: SaveStatus,
    saved_at: Option<Instant>,
    config: SessionConfig,
}

impl BoardSession {
    #[must_use]
    pub fn new(config: SessionConfig, surface: Box<dyn RenderSurface>) -> Self {
        let mut engine = Engine::new(surface);
        // Sessions open ready to draw.
        engine.set_tool(Tool::Brush);
        Self {
            engine: Some(engine),
            history: History::new(config.history_capacity),
            scheduler: AutosaveScheduler::new(config.content_window, config.thumbnail_window),
            save_status: SaveStatus::default(),
            saved_at: None,
            config,
        }
    }

    // --- Mount / unmount ---

    /// Load a fetched board record: scene, last-saved cache, initial history
    /// snapshot. A malformed scene document is logged and the session starts
    /// from an empty scene.
    pub fn load_record(&mut self, record: &BoardRecord) {
        let Some(engine) = self.engine.as_mut() else {
            return;
        };
        if record.canvas_data.is_empty() {
            debug!(board = %record.id, "board has no canvas data; starting empty");
        } else if let Err(e) = engine.load_json(&record.canvas_data) {
            warn!(board = %record.id, error = %e, "malformed canvas data; starting empty");
        }
        match engine.to_json() {
            Ok(json) => {
                self.scheduler.seed_last_saved(json.clone());
                self.history.record(json);
            }
            Err(e) => warn!(error = %e, "loaded scene failed to serialize"),
        }
    }

    /// Re-bind the active tool's handlers and recompute object interactivity
    /// (run after a scene load, once the surface has settled).
    pub fn reapply_settings(&mut self) {
        let Some(engine) = self.engine.as_mut() else {
            return;
        };
        let tool = engine.tool();
        engine.set_tool(tool);
    }

    /// Cancel pending autosave work and release the engine (and with it the
    /// rendering surface). All subsequent operations become silent no-ops.
    pub fn release(&mut self) {
        self.scheduler.cancel();
        self.engine = None;
    }

    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.engine.is_some()
    }

    // --- Tool and settings commands ---

    pub fn set_tool(&mut self, tool: Tool) {
        if let Some(engine) = self.engine.as_mut() {
            engine.set_tool(tool);
        }
    }

    #[must_use]
    pub fn tool(&self) -> Tool {
        self.engine.as_ref().map_or(Tool::default(), Engine::tool)
    }

    pub fn set_stroke_color(&mut self, color: String) {
        if let Some(engine) = self.engine.as_mut() {
            engine.set_stroke_color(color);
        }
    }

    #[must_use]
    pub fn stroke_color(&self) -> String {
        self.engine
            .as_ref()
            .map_or_else(|| DEFAULT_STROKE_COLOR.to_owned(), |e| e.settings().stroke_color.clone())
    }

    pub fn set_brush_width(&mut self, width: f64) {
        if let Some(engine) = self.engine.as_mut() {
            engine.set_brush_width(width);
        }
    }

    #[must_use]
    pub fn brush_width(&self) -> f64 {
        self.engine.as_ref().map_or(DEFAULT_BRUSH_WIDTH, |e| e.settings().brush_width)
    }

    // --- Viewport commands ---

    pub fn zoom_in(&mut self) {
        if let Some(engine) = self.engine.as_mut() {
            engine.zoom_in();
        }
    }

    pub fn zoom_out(&mut self) {
        if let Some(engine) = self.engine.as_mut() {
            engine.zoom_out();
        }
    }

    pub fn reset_zoom(&mut self) {
        if let Some(engine) = self.engine.as_mut() {
            engine.reset_zoom();
        }
    }

    #[must_use]
    pub fn zoom(&self) -> f64 {
        self.engine.as_ref().map_or(1.0, Engine::zoom)
    }

    pub fn wheel(&mut self, screen: Point, delta: WheelDelta) {
        if let Some(engine) = self.engine.as_mut() {
            engine.wheel(screen, delta);
        }
    }

    // --- Pointer input ---

    pub fn pointer_down(&mut self, screen: Point) {
        let Some(engine) = self.engine.as_mut() else {
            return;
        };
        let actions = engine.pointer_down(screen);
        self.apply_actions(&actions);
    }

    pub fn pointer_move(&mut self, screen: Point) {
        let Some(engine) = self.engine.as_mut() else {
            return;
        };
        let actions = engine.pointer_move(screen);
        self.apply_actions(&actions);
    }

    /// Returns the tool the gesture asked to switch to, to be applied on the
    /// next scheduling tick (see [`BoardController::pointer_up`]).
    pub fn pointer_up(&mut self, screen: Point) -> Option<Tool> {
        let Some(engine) = self.engine.as_mut() else {
            return None;
        };
        let actions = engine.pointer_up(screen);
        self.apply_actions(&actions)
    }

    /// Apply a sparse object update reported by the surface's native
    /// select-mode manipulation.
    pub fn update_object(&mut self, id: &ObjectId, fields: &PartialDrawable) {
        let Some(engine) = self.engine.as_mut() else {
            return;
        };
        let actions = engine.apply_update(id, fields);
        self.apply_actions(&actions);
    }

    /// Set the selection from the surface's native manipulation.
    pub fn set_selection(&mut self, id: Option<ObjectId>) {
        if let Some(engine) = self.engine.as_mut() {
            engine.set_selection(id);
        }
    }

    fn apply_actions(&mut self, actions: &[Action]) -> Option<Tool> {
        let mut switch = None;
        let mut mutated = false;
        for action in actions {
            match action {
                Action::SwitchTool(tool) => switch = Some(*tool),
                action if action.is_mutation() => mutated = true,
                _ => {}
            }
        }
        if mutated {
            self.record_change();
        }
        switch
    }

    /// One completed gesture → one history entry and one autosave trigger.
    fn record_change(&mut self) {
        let Some(engine) = self.engine.as_ref() else {
            return;
        };
        match engine.to_json() {
            Ok(json) => {
                self.history.record(json);
                self.scheduler.note_change(Instant::now());
            }
            Err(e) => warn!(error = %e, "scene serialization failed; change not recorded"),
        }
    }

    // --- Scene commands ---

    pub fn clear_canvas(&mut self) {
        let Some(engine) = self.engine.as_mut() else {
            return;
        };
        let actions = engine.clear();
        self.apply_actions(&actions);
    }

    pub fn undo(&mut self) {
        if self.engine.is_none() {
            return;
        }
        let Some(snapshot) = self.history.undo() else {
            return;
        };
        self.restore_snapshot(&snapshot);
    }

    pub fn redo(&mut self) {
        if self.engine.is_none() {
            return;
        }
        let Some(snapshot) = self.history.redo() else {
            return;
        };
        self.restore_snapshot(&snapshot);
    }

    fn restore_snapshot(&mut self, snapshot: &str) {
        let Some(engine) = self.engine.as_mut() else {
            return;
        };
        self.history.set_replaying(true);
        if let Err(e) = engine.load_json(snapshot) {
            warn!(error = %e, "history snapshot failed to load");
        }
        self.history.set_replaying(false);
        // Restoring a snapshot changes the persisted content.
        self.scheduler.note_change(Instant::now());
    }

    // --- Queries ---

    #[must_use]
    pub fn gesture_active(&self) -> bool {
        self.engine.as_ref().is_some_and(Engine::gesture_active)
    }

    #[must_use]
    pub fn serialize_scene(&self) -> Option<String> {
        let engine = self.engine.as_ref()?;
        match engine.to_json() {
            Ok(json) => Some(json),
            Err(e) => {
                warn!(error = %e, "scene serialization failed");
                None
            }
        }
    }

    pub fn thumbnail(&mut self) -> Option<String> {
        self.engine.as_mut().and_then(Engine::thumbnail)
    }

    #[must_use]
    pub fn save_status(&self) -> SaveStatus {
        self.save_status
    }

    /// Whether unsaved changes exist (cleared only by a successful
    /// thumbnail-carrying save).
    #[must_use]
    pub fn has_unsaved_changes(&self) -> bool {
        self.scheduler.unsaved_changes()
    }

    /// Revert a lingering "saved" status to idle once its display window has
    /// elapsed.
    fn tick_saved_status(&mut self, now: Instant) {
        if self.save_status == SaveStatus::Saved {
            let elapsed = self.saved_at.is_some_and(|at| now >= at + self.config.saved_status_reset);
            if elapsed {
                self.save_status = SaveStatus::Idle;
            }
        }
    }
}

/// Lock the session, recovering from a poisoned mutex — the session state is
/// plain data and stays usable after a panicked holder.
fn lock(session: &Mutex<BoardSession>) -> MutexGuard<'_, BoardSession> {
    match session.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Work collected under the lock for one save attempt.
struct SaveJob {
    kind: SaveKind,
    json: String,
    thumbnail: Option<String>,
}

/// Collect due autosave work. Returns `None` when nothing should be sent
/// this tick (not due, gesture in progress, save in flight, or content
/// unchanged).
fn prepare_autosave(session: &mut BoardSession, now: Instant) -> Option<SaveJob> {
    session.tick_saved_status(now);
    let gesture_active = session.gesture_active();
    let kind = session.scheduler.poll(now, gesture_active)?;
    let json = session.serialize_scene()?;
    if kind == SaveKind::Content && session.scheduler.is_unchanged(&json) {
        debug!("content unchanged; skipping autosave");
        return None;
    }
    let thumbnail = if kind == SaveKind::WithThumbnail { session.thumbnail() } else { None };
    // A skipped thumbnail downgrades to a content-only save; the
    // changed-since-thumbnail flag stays set so a later cycle retries.
    let kind = if kind == SaveKind::WithThumbnail && thumbnail.is_none() {
        SaveKind::Content
    } else {
        kind
    };
    session.scheduler.begin();
    session.save_status = SaveStatus::Saving;
    Some(SaveJob { kind, json, thumbnail })
}

/// Send one prepared save and record the outcome. The session lock is only
/// taken after the network call resolves.
async fn run_save(
    session: &Arc<Mutex<BoardSession>>,
    api: &BoardApi,
    board_id: &str,
    job: SaveJob,
) {
    let patch = BoardPatch {
        canvas_data: Some(job.json.clone()),
        thumbnail: job.thumbnail.clone(),
        ..BoardPatch::default()
    };
    let result = api.update_board(board_id, &patch).await;
    let mut guard = lock(session);
    match result {
        Ok(_) => {
            guard.scheduler.complete(job.kind, job.json);
            guard.save_status = SaveStatus::Saved;
            guard.saved_at = Some(Instant::now());
            debug!(board = %board_id, kind = ?job.kind, "board saved");
        }
        Err(e) => {
            warn!(board = %board_id, error = %e, "board save failed");
            guard.scheduler.fail();
            guard.save_status = SaveStatus::Idle;
        }
    }
}

/// Explicit user save: bypasses the debounce windows but respects the
/// in-flight guard and the unchanged-content skip.
pub async fn save_board_now(session: &Arc<Mutex<BoardSession>>, api: &BoardApi, board_id: &str) {
    let job = {
        let mut guard = lock(session);
        if !guard.is_mounted() || guard.scheduler.in_flight() {
            None
        } else {
            match guard.serialize_scene() {
                Some(json) if !guard.scheduler.is_unchanged(&json) => {
                    guard.scheduler.begin();
                    guard.save_status = SaveStatus::Saving;
                    Some(SaveJob { kind: SaveKind::Content, json, thumbnail: None })
                }
                _ => None,
            }
        }
    };
    if let Some(job) = job {
        run_save(session, api, board_id, job).await;
    }
}

/// Spawn the background autosave loop: tick, collect due work under the
/// lock, perform the network call with the lock released. The task exits
/// once the session is released.
pub fn spawn_autosave_task(
    session: Arc<Mutex<BoardSession>>,
    api: BoardApi,
    board_id: String,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let tick = { lock(&session).config.autosave_tick };
        info!(board = %board_id, "autosave task started");
        loop {
            tokio::time::sleep(tick).await;
            let job = {
                let mut guard = lock(&session);
                if !guard.is_mounted() {
                    break;
                }
                prepare_autosave(&mut guard, Instant::now())
            };
            if let Some(job) = job {
                run_save(&session, &api, &board_id, job).await;
            }
        }
        info!(board = %board_id, "autosave task stopped");
    })
}

/// Spawn the zoom poll loop: publishes the current zoom through a watch
/// channel at a fixed interval, since wheel-driven zoom changes do not flow
/// through controller state. The task exits once the session is released.
pub fn spawn_zoom_poll_task(
    session: Arc<Mutex<BoardSession>>,
    tx: watch::Sender<f64>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let interval = { lock(&session).config.zoom_poll_interval };
        loop {
            tokio::time::sleep(interval).await;
            let zoom = {
                let guard = lock(&session);
                if !guard.is_mounted() {
                    break;
                }
                guard.zoom()
            };
            tx.send_if_modified(|current| {
                if (*current - zoom).abs() > f64::EPSILON {
                    *current = zoom;
                    true
                } else {
                    false
                }
            });
        }
    })
}

/// Host-facing handle for one board editing session.
///
/// Must be created and used on a tokio runtime: construction spawns the
/// autosave and zoom-poll tasks, and pointer-up may spawn a deferred tool
/// switch.
pub struct BoardController {
    session: Arc<Mutex<BoardSession>>,
    api: BoardApi,
    board_id: String,
    autosave_task: Option<JoinHandle<()>>,
    zoom_poll_task: Option<JoinHandle<()>>,
    zoom_rx: watch::Receiver<f64>,
}

impl BoardController {
    /// Create a controller over a fresh session and start the background
    /// tasks. No network traffic happens here; see [`Self::mount`].
    #[must_use]
    pub fn attach(
        config: SessionConfig,
        api: BoardApi,
        board_id: String,
        surface: Box<dyn RenderSurface>,
    ) -> Self {
        let session = Arc::new(Mutex::new(BoardSession::new(config, surface)));
        let (zoom_tx, zoom_rx) = watch::channel(1.0);
        let autosave_task =
            Some(spawn_autosave_task(session.clone(), api.clone(), board_id.clone()));
        let zoom_poll_task = Some(spawn_zoom_poll_task(session.clone(), zoom_tx));
        Self { session, api, board_id, autosave_task, zoom_poll_task, zoom_rx }
    }

    /// Create the controller and fetch + load the board. A failed fetch is
    /// logged and leaves the session editing an empty scene; the next
    /// successful save will overwrite the server copy.
    pub async fn mount(
        config: SessionConfig,
        api: BoardApi,
        board_id: String,
        surface: Box<dyn RenderSurface>,
    ) -> Self {
        let controller = Self::attach(config, api, board_id, surface);
        match controller.api.fetch_board(&controller.board_id).await {
            Ok(record) => controller.load_record(&record).await,
            Err(e) => warn!(board = %controller.board_id, error = %e, "board fetch failed"),
        }
        controller
    }

    /// Load a fetched record and run the post-load settle + settings pass.
    pub async fn load_record(&self, record: &BoardRecord) {
        let settle = {
            let mut guard = lock(&self.session);
            guard.load_record(record);
            guard.config.settle_delay
        };
        // The surface gets one settle tick to finish applying the loaded
        // scene before handlers re-bind; see DESIGN.md on this race.
        tokio::time::sleep(settle).await;
        lock(&self.session).reapply_settings();
        info!(board = %self.board_id, "board mounted");
    }

    // --- Commands and queries (lock and delegate) ---

    pub fn set_tool(&self, tool: Tool) {
        lock(&self.session).set_tool(tool);
    }

    #[must_use]
    pub fn tool(&self) -> Tool {
        lock(&self.session).tool()
    }

    pub fn set_stroke_color(&self, color: String) {
        lock(&self.session).set_stroke_color(color);
    }

    #[must_use]
    pub fn stroke_color(&self) -> String {
        lock(&self.session).stroke_color()
    }

    pub fn set_brush_width(&self, width: f64) {
        lock(&self.session).set_brush_width(width);
    }

    #[must_use]
    pub fn brush_width(&self) -> f64 {
        lock(&self.session).brush_width()
    }

    pub fn clear_canvas(&self) {
        lock(&self.session).clear_canvas();
    }

    pub fn undo(&self) {
        lock(&self.session).undo();
    }

    pub fn redo(&self) {
        lock(&self.session).redo();
    }

    pub fn zoom_in(&self) {
        lock(&self.session).zoom_in();
    }

    pub fn zoom_out(&self) {
        lock(&self.session).zoom_out();
    }

    pub fn reset_zoom(&self) {
        lock(&self.session).reset_zoom();
    }

    /// Last polled zoom value.
    #[must_use]
    pub fn zoom(&self) -> f64 {
        *self.zoom_rx.borrow()
    }

    /// Subscribe to polled zoom updates.
    #[must_use]
    pub fn zoom_watch(&self) -> watch::Receiver<f64> {
        self.zoom_rx.clone()
    }

    #[must_use]
    pub fn save_status(&self) -> SaveStatus {
        lock(&self.session).save_status()
    }

    pub fn pointer_down(&self, screen: Point) {
        lock(&self.session).pointer_down(screen);
    }

    pub fn pointer_move(&self, screen: Point) {
        lock(&self.session).pointer_move(screen);
    }

    /// Forward a pointer release. A tool switch requested by the gesture
    /// (shape finalize) is applied on the next scheduling tick, after the
    /// surface has finished its own pointer-up bookkeeping.
    pub fn pointer_up(&self, screen: Point) {
        let switch = lock(&self.session).pointer_up(screen);
        if let Some(tool) = switch {
            let session = self.session.clone();
            tokio::spawn(async move {
                tokio::task::yield_now().await;
                lock(&session).set_tool(tool);
            });
        }
    }

    pub fn wheel(&self, screen: Point, delta: WheelDelta) {
        lock(&self.session).wheel(screen, delta);
    }

    /// Explicit user save.
    pub async fn save_board(&self) {
        save_board_now(&self.session, &self.api, &self.board_id).await;
    }

    /// Serialized scene document, for host-driven export. `None` once
    /// unmounted.
    #[must_use]
    pub fn scene_json(&self) -> Option<String> {
        lock(&self.session).serialize_scene()
    }

    /// Thumbnail data URL at the fixed target box, or `None` while a gesture
    /// is active or after unmount.
    #[must_use]
    pub fn thumbnail(&self) -> Option<String> {
        lock(&self.session).thumbnail()
    }

    /// Shared handle to the session core, for hosts that integrate the
    /// surface's native manipulation callbacks directly.
    #[must_use]
    pub fn session(&self) -> Arc<Mutex<BoardSession>> {
        self.session.clone()
    }

    /// Abort the background tasks and release the engine. Idempotent; also
    /// runs on drop.
    pub fn unmount(&mut self) {
        if let Some(task) = self.autosave_task.take() {
            task.abort();
        }
        if let Some(task) = self.zoom_poll_task.take() {
            task.abort();
        }
        lock(&self.session).release();
    }
}

impl Drop for BoardController {
    fn drop(&mut self) {
        self.unmount();
    }
}
