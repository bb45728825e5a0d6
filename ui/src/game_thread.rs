//! # Game Thread
//!
//! The game and its engine live on a dedicated thread paced by the engine's
//! vertical refresh. The UI thread talks to it through lock-free SPSC ring
//! buffers.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────┐              ┌─────────────────────────────┐
//! │      Game Thread        │              │        UI Thread            │
//! │                         │              │                             │
//! │  ┌─────────────────┐    │   Commands   │    ┌─────────────────────┐  │
//! │  │      Game       │    │ ◄─────────── │    │     GameHandle      │  │
//! │  │  (owned here)   │    │   (SPSC)     │    │                     │  │
//! │  └────────┬────────┘    │              │    │  - send commands    │  │
//! │           │             │   Events     │    │  - poll events      │  │
//! │           ▼             │ ───────────► │    │  - read state       │  │
//! │  loop {                 │   (SPSC)     │    └─────────────────────┘  │
//! │    process commands     │              │                             │
//! │    if running:          │              │                             │
//! │      game.tick(touch)   │              │                             │
//! │      send frames        │              │                             │
//! │  }                      │              │                             │
//! └─────────────────────────┘              └─────────────────────────────┘
//! ```
//!
//! Commands are applied between two ticks, so a tick never sees half of an
//! input change.

use std::thread::{self, JoinHandle};
use std::time::Duration;

use engine::Rgb;
use engine::geometry::Point;
use engine::render::{OBJ_PALETTE_SLOTS, SCREEN_COUNT, SCREEN_HEIGHT, SCREEN_WIDTH};
use game::achievements::Achievement;
use game::{Game, Mode, Snapshot};

/// Channel buffer sizes
const COMMAND_BUFFER_SIZE: usize = 64;
const EVENT_BUFFER_SIZE: usize = 16;

/// Frames between two state updates while running.
const STATE_INTERVAL: u64 = 15;

/// Colors shown per palette row.
pub const PALETTE_ROW: usize = 16;

/// Commands sent from the UI thread to the game thread.
#[derive(Debug, Clone)]
pub enum GameCommand {
    /// The touch screen is pressed at a screen position.
    Touch { x: i32, y: i32 },
    /// The touch screen is released.
    Release,
    /// Stop ticking, the screens keep their last frame.
    Pause,
    Resume,
    SetGrayscale(bool),
    SetMode(Mode),
    /// Start over in the current mode.
    Restart,
    /// Request a full state snapshot.
    RequestState,
    /// Shutdown the game thread.
    Shutdown,
}

/// Events sent from the game thread to the UI thread.
#[derive(Debug, Clone)]
pub enum GameEvent {
    /// Both screens after a tick.
    Frame(Box<Frames>),
    State(Box<GameState>),
    /// A milestone was reached during the last tick.
    Achievement(Achievement),
    /// A command or tick failed, the game keeps running.
    Error(String),
}

/// One palette as seen by the UI, limited to its first colors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaletteRow {
    pub label: String,
    pub colors: Vec<Rgb>,
}

#[derive(Debug, Clone, Default)]
pub struct GameState {
    pub snapshot: Snapshot,
    pub is_running: bool,
    pub background_palettes: Vec<PaletteRow>,
    pub sprite_palettes: Vec<PaletteRow>,
}

/// One screen as RGB triples, row by row.
pub type FrameBuffer = [u8; SCREEN_WIDTH * SCREEN_HEIGHT * 3];

/// Both screens, the touch screen (screen 0) first.
pub type Frames = [FrameBuffer; SCREEN_COUNT];

/// The game thread that owns and runs the game.
struct GameThread {
    game: Game,
    cmd_rx: rtrb::Consumer<GameCommand>,
    event_tx: rtrb::Producer<GameEvent>,

    // State
    running: bool,
    touch: Option<Point<i32>>,
}

impl GameThread {
    const fn new(
        game: Game,
        cmd_rx: rtrb::Consumer<GameCommand>,
        event_tx: rtrb::Producer<GameEvent>,
    ) -> Self {
        Self {
            game,
            cmd_rx,
            event_tx,
            running: true,
            touch: None,
        }
    }

    fn run(mut self) {
        loop {
            if self.process_commands() {
                return; // shutdown
            }

            if self.running {
                self.tick();
            } else {
                // sleep briefly to avoid busy-waiting
                thread::sleep(Duration::from_millis(1));
            }
        }
    }

    /// Process all pending commands. Returns true if should shutdown.
    fn process_commands(&mut self) -> bool {
        while let Ok(cmd) = self.cmd_rx.pop() {
            match cmd {
                GameCommand::Touch { x, y } => {
                    self.touch = Some(Point::new(x, y));
                }
                GameCommand::Release => {
                    self.touch = None;
                }
                GameCommand::Pause => {
                    self.running = false;
                    self.send_state();
                }
                GameCommand::Resume => {
                    self.running = true;
                    self.send_state();
                }
                GameCommand::SetGrayscale(grayscale) => {
                    self.game.set_grayscale(grayscale);
                    self.send_state();
                }
                GameCommand::SetMode(mode) => {
                    if let Err(err) = self.game.set_mode(mode) {
                        self.send_error(&err);
                    }
                    self.send_state();
                }
                GameCommand::Restart => {
                    if let Err(err) = self.game.restart() {
                        self.send_error(&err);
                    }
                    self.send_state();
                }
                GameCommand::RequestState => {
                    self.send_state();
                }
                GameCommand::Shutdown => {
                    return true;
                }
            }
        }
        false
    }

    /// Runs one game frame, blocking until the next refresh.
    fn tick(&mut self) {
        match self.game.tick(self.touch) {
            Ok(Some(achievement)) => {
                self.send_event(GameEvent::Achievement(achievement));
                self.send_state();
            }
            Ok(None) => {}
            Err(err) => self.send_error(&err),
        }

        self.send_frame();
        if self.game.engine().frame_count() % STATE_INTERVAL == 0 {
            self.send_state();
        }
    }

    fn send_state(&mut self) {
        let state = state_of(&self.game, self.running);
        self.send_event(GameEvent::State(Box::new(state)));
    }

    fn send_error(&mut self, err: &dyn std::error::Error) {
        tracing::warn!("{err}");
        self.send_event(GameEvent::Error(err.to_string()));
    }

    /// Send both composed screens to the UI.
    fn send_frame(&mut self) {
        #[allow(clippy::large_stack_arrays)] // Boxed immediately
        let mut frames = Box::new([[0u8; SCREEN_WIDTH * SCREEN_HEIGHT * 3]; SCREEN_COUNT]);

        let display = self.game.engine().display();
        for (screen, frame) in frames.iter_mut().enumerate() {
            for (pixel, color) in frame.chunks_exact_mut(3).zip(display.framebuffer(screen)) {
                let rgb = Rgb::from(*color);
                pixel.copy_from_slice(&[rgb.red, rgb.green, rgb.blue]);
            }
        }

        self.send_event(GameEvent::Frame(frames));
    }

    /// Send an event to the UI (non-blocking, drops if full).
    fn send_event(&mut self, event: GameEvent) {
        let _ = self.event_tx.push(event);
    }
}

fn palette_row(label: String, colors: impl IntoIterator<Item = engine::Color>) -> PaletteRow {
    PaletteRow {
        label,
        colors: colors.into_iter().take(PALETTE_ROW).map(Rgb::from).collect(),
    }
}

/// Snapshot of the game plus the palettes currently uploaded.
fn state_of(game: &Game, is_running: bool) -> GameState {
    let engine = game.engine();
    let mut background_palettes = Vec::new();
    let mut sprite_palettes = Vec::new();

    for screen in 0..SCREEN_COUNT {
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let id = screen as i32;
        for layer in 0..4 {
            if !engine.backgrounds.is_active(id, layer) {
                continue;
            }
            let palette = if engine.backgrounds.uses_grayscale(id, layer) {
                engine.backgrounds.grayscale_palette(id, layer)
            } else {
                engine.backgrounds.palette(id, layer)
            };
            background_palettes.push(palette_row(
                format!("screen {screen} bg {layer}"),
                palette.colors().iter().copied(),
            ));
        }

        let oam = engine.sprites.oam(screen);
        for slot in 0..OBJ_PALETTE_SLOTS {
            let Some(palette) = oam.palette(slot) else {
                continue;
            };
            let colors = palette.colors();
            if colors.iter().take(PALETTE_ROW).all(|color| color.0 == 0) {
                continue;
            }
            sprite_palettes.push(palette_row(
                format!("screen {screen} obj {slot}"),
                colors.iter().copied(),
            ));
        }
    }

    GameState {
        snapshot: game.snapshot(),
        is_running,
        background_palettes,
        sprite_palettes,
    }
}

/// Handle for the UI thread to communicate with the game thread.
pub struct GameHandle {
    cmd_tx: rtrb::Producer<GameCommand>,
    event_rx: rtrb::Consumer<GameEvent>,
    thread_handle: Option<JoinHandle<()>>,

    /// Latest state snapshot from the game.
    pub state: GameState,
    /// Latest frames from the game.
    pub frames: Option<Box<Frames>>,
    /// Achievements unlocked while the window was open, newest last.
    pub unlocked: Vec<Achievement>,
    /// Last error reported by the game thread.
    pub last_error: Option<String>,
}

impl GameHandle {
    /// Send a command to the game thread.
    pub fn send(&mut self, cmd: GameCommand) {
        let _ = self.cmd_tx.push(cmd);
    }

    /// Poll for events and update cached state.
    pub fn poll(&mut self) {
        while let Ok(event) = self.event_rx.pop() {
            match event {
                GameEvent::Frame(frames) => {
                    self.frames = Some(frames);
                }
                GameEvent::State(state) => {
                    self.state = *state;
                }
                GameEvent::Achievement(achievement) => {
                    self.unlocked.push(achievement);
                }
                GameEvent::Error(err) => {
                    self.last_error = Some(err);
                }
            }
        }
    }
}

impl Drop for GameHandle {
    fn drop(&mut self) {
        let _ = self.cmd_tx.push(GameCommand::Shutdown);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

/// Spawn the game thread and return a handle for communication.
///
/// # Arguments
/// * `game` - The game to run (ownership transferred to the thread)
pub fn spawn(game: Game) -> GameHandle {
    // Create command channel (UI → game)
    let (cmd_tx, cmd_rx) = rtrb::RingBuffer::new(COMMAND_BUFFER_SIZE);

    // Create event channel (game → UI)
    let (event_tx, event_rx) = rtrb::RingBuffer::new(EVENT_BUFFER_SIZE);

    // Get initial state before moving the game
    let initial_state = state_of(&game, true);

    let thread_handle = thread::spawn(move || {
        let game_thread = GameThread::new(game, cmd_rx, event_tx);
        game_thread.run();
    });

    GameHandle {
        cmd_tx,
        event_rx,
        thread_handle: Some(thread_handle),
        state: initial_state,
        frames: None,
        unlocked: Vec::new(),
        last_error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::{DateTime, FixedClock, FixedRate};
    use game::Config;
    use pretty_assertions::assert_eq;
    use std::time::Instant;

    fn game(root: &std::path::Path) -> Game {
        let config = Config {
            data_dir: root.to_path_buf(),
            seed: Some(1),
            ..Config::default()
        };
        Game::with_parts(
            &config,
            Box::new(FixedClock(DateTime::default())),
            // paced so the event ring is drained faster than it fills
            Box::new(FixedRate::new(200)),
        )
        .unwrap()
    }

    /// Polls until `done` holds or a few seconds passed.
    fn wait_for(handle: &mut GameHandle, done: impl Fn(&GameHandle) -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            handle.poll();
            if done(handle) {
                return true;
            }
            thread::sleep(Duration::from_millis(1));
        }
        false
    }

    #[test]
    fn initial_state_lists_palettes() {
        let root = tempfile::tempdir().unwrap();
        let state = state_of(&game(root.path()), true);

        assert_eq!(state.snapshot.phase, "menu");
        assert!(state.background_palettes.is_empty());
        // five buttons on the touch screen, the health bar on the other
        assert_eq!(state.sprite_palettes.len(), 6);
        assert_eq!(state.sprite_palettes[0].label, "screen 0 obj 0");
        assert_eq!(state.sprite_palettes[0].colors.len(), PALETTE_ROW);
    }

    #[test]
    fn frames_arrive_while_running() {
        let root = tempfile::tempdir().unwrap();
        let mut handle = spawn(game(root.path()));

        assert!(wait_for(&mut handle, |h| h.frames.is_some()));
        let frames = handle.frames.as_ref().unwrap();
        // the middle of the rock button is not the backdrop
        let offset = (64 * SCREEN_WIDTH + 64) * 3;
        let corner = &frames[0][0..3];
        assert_ne!(&frames[0][offset..offset + 3], corner);
    }

    #[test]
    fn commands_reach_the_game() {
        let root = tempfile::tempdir().unwrap();
        let mut handle = spawn(game(root.path()));

        handle.send(GameCommand::SetGrayscale(true));
        handle.send(GameCommand::Pause);
        assert!(wait_for(&mut handle, |h| {
            h.state.snapshot.grayscale && !h.state.is_running
        }));

        handle.send(GameCommand::SetMode(Mode::Multi));
        handle.send(GameCommand::Resume);
        assert!(wait_for(&mut handle, |h| {
            h.state.snapshot.mode == Mode::Multi && h.state.is_running
        }));
    }
}
