//! # Match flow
//!
//! ```text
//!   ┌──────────► Menu ── choices made ──► Approach ── hands meet ──► Spin
//!   │             ▲                                                   │
//!   │             └──────────── round scored, damage < 4 ─────────────┘
//!   │                                                                 │
//!   └── touch, release ── GameOver ◄──────── damage reached 4 ────────┘
//! ```
//!
//! Every phase advances by one step per [`Session::tick`], the engine is
//! pumped by the caller in between.
//!
//! Sprite slots:
//!
//! | Screen | Index | Use                                  |
//! |--------|-------|--------------------------------------|
//! | 0      | 0..5  | player 1 buttons                     |
//! | 0      | 5..10 | player 2 buttons (copies of 0..5)    |
//! | 1      | 0, 1  | hands of player 1 and the opponent   |
//! | 1      | 4, 5  | health bars of player 1 and 2        |

use engine::geometry::Point;
use engine::{Engine, Result};
use rand::rngs::StdRng;
use serde::Serialize;

use crate::assets::{self, Backdrop, SpriteSheet};
use crate::config::Mode;
use crate::rules::{Choice, Outcome, outcome};

const BUTTONS: i32 = 5;
const TOP: i32 = 1;
const BOTTOM: i32 = 0;
const BACKGROUND_LAYER: i32 = 1;

const HAND_LEFT: i32 = 0;
const HAND_RIGHT: i32 = 1;
const HEALTH_LEFT: i32 = 4;
const HEALTH_RIGHT: i32 = 5;

const HAND_SIZE: i32 = 64;
const HAND_Y: i32 = 96;
const HAND_START_LEFT: i32 = -HAND_SIZE;
const HAND_START_RIGHT: i32 = 256;
const APPROACH_SPEED: i32 = 4;
const SPIN_SPEED: i32 = 4;
const SCREEN_BOTTOM: i32 = 192;

/// Damage a player can take, one more ends the game.
pub const MAX_DAMAGE: u32 = 3;

const SINGLE_LAYOUT: [(i32, i32); 5] = [(32, 32), (96, 32), (160, 32), (64, 96), (128, 96)];
const MULTI_LAYOUT: [(i32, i32); 5] = [(0, 0), (0, 64), (0, 128), (64, 32), (64, 96)];
const MULTI_MIRROR_LAYOUT: [(i32, i32); 5] = [(192, 0), (192, 64), (192, 128), (128, 32), (128, 96)];

/// One decided round, from the first player's point of view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Round {
    pub player: Choice,
    pub opponent: Choice,
    pub outcome: Outcome,
}

impl Round {
    pub const fn new(player: Choice, opponent: Choice) -> Self {
        Self {
            player,
            opponent,
            outcome: outcome(player, opponent),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Score {
    pub wins: u32,
    pub ties: u32,
    /// Rounds lost by the first player.
    pub damage: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for the buttons to be touched. In multi player mode both
    /// players pick before the round starts.
    Menu {
        first: Option<Choice>,
        second: Option<Choice>,
    },
    /// Both hands slide towards each other.
    Approach { round: Round, x1: i32, x2: i32 },
    /// The loser spins away, both hands on a tie.
    Spin {
        round: Round,
        x1: i32,
        x2: i32,
        y: i32,
        rotation: i32,
    },
    /// Waits for a touch and its release before starting over.
    GameOver { pressed: bool },
}

impl Phase {
    const MENU: Self = Self::Menu {
        first: None,
        second: None,
    };

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Menu { .. } => "menu",
            Self::Approach { .. } => "approach",
            Self::Spin { .. } => "spin",
            Self::GameOver { .. } => "game over",
        }
    }
}

pub struct Session {
    mode: Mode,
    phase: Phase,
    score: Score,
    rng: StdRng,
    grayscale: bool,
    touching: bool,
}

impl Session {
    pub const fn new(mode: Mode, rng: StdRng) -> Self {
        Self {
            mode,
            phase: Phase::MENU,
            score: Score {
                wins: 0,
                ties: 0,
                damage: 0,
            },
            rng,
            grayscale: false,
            touching: false,
        }
    }

    pub const fn mode(&self) -> Mode {
        self.mode
    }

    pub const fn phase(&self) -> Phase {
        self.phase
    }

    pub const fn score(&self) -> Score {
        self.score
    }

    pub const fn grayscale(&self) -> bool {
        self.grayscale
    }

    /// Clears both screens and lays out the buttons and health bars of the
    /// current mode. The score starts over.
    pub fn start(&mut self, engine: &mut Engine) -> Result<()> {
        clear(engine);
        engine.set_backdrop(BOTTOM, assets::backdrop_color());
        engine.set_backdrop(TOP, assets::backdrop_color());

        let health = assets::health_bar();
        match self.mode {
            Mode::Single => {
                for (index, (x, y)) in (0..BUTTONS).zip(SINGLE_LAYOUT) {
                    load_button(engine, index, x, y)?;
                }
                load_sprite(engine, TOP, HEALTH_LEFT, 4, &health, 0, 0)?;
            }
            Mode::Multi => {
                for (index, (x, y)) in (0..BUTTONS).zip(MULTI_LAYOUT) {
                    load_button(engine, index, x, y)?;
                }
                load_sprite(engine, TOP, HEALTH_LEFT, 4, &health, 0, 0)?;

                for (slot, (x, y)) in (5..10).zip(MULTI_MIRROR_LAYOUT) {
                    engine
                        .sprites
                        .copy(BOTTOM, slot, to_slot(slot), BOTTOM, slot - BUTTONS)?;
                    engine.sprites.set_xy(BOTTOM, slot, x, y);
                }
                load_sprite(engine, TOP, HEALTH_RIGHT, 5, &health, 256 - HAND_SIZE, 0)?;
            }
        }

        self.score = Score::default();
        self.phase = Phase::MENU;
        self.apply_grayscale(engine);
        tracing::info!("new game in {:?} mode", self.mode);
        Ok(())
    }

    /// Switches between single and multi player and starts over.
    pub fn set_mode(&mut self, engine: &mut Engine, mode: Mode) -> Result<()> {
        self.mode = mode;
        self.start(engine)
    }

    /// Shows every active sprite and background with gray palettes, also
    /// the ones created later.
    pub fn set_grayscale(&mut self, engine: &mut Engine, grayscale: bool) {
        self.grayscale = grayscale;
        self.apply_grayscale(engine);
    }

    fn apply_grayscale(&self, engine: &mut Engine) {
        for screen in [BOTTOM, TOP] {
            for index in 0..128 {
                if engine.sprites.is_active(screen, index) {
                    engine.sprites.set_use_grayscale(screen, index, self.grayscale);
                }
            }
            for layer in 0..4 {
                if engine.backgrounds.is_active(screen, layer) {
                    engine.backgrounds.set_use_grayscale(screen, layer, self.grayscale);
                }
            }
        }
    }

    /// Starts a round between two known choices, skipping the menu.
    pub fn play(&mut self, engine: &mut Engine, player: Choice, opponent: Choice) -> Result<()> {
        let round = Round::new(player, opponent);
        load_sprite(
            engine,
            TOP,
            HAND_LEFT,
            0,
            &assets::hand(player),
            HAND_START_LEFT,
            HAND_Y,
        )?;
        load_sprite(
            engine,
            TOP,
            HAND_RIGHT,
            1,
            &assets::hand(opponent),
            HAND_START_RIGHT,
            HAND_Y,
        )?;
        self.apply_grayscale(engine);

        tracing::debug!("round: {player} against {opponent}");
        self.phase = Phase::Approach {
            round,
            x1: HAND_START_LEFT,
            x2: HAND_START_RIGHT,
        };
        Ok(())
    }

    /// Advances the current phase by one step. `touch` is the position on
    /// the bottom screen while it is pressed.
    ///
    /// Returns the round that was scored during this tick.
    pub fn tick(&mut self, engine: &mut Engine, touch: Option<Point<i32>>) -> Result<Option<Round>> {
        let pressed = touch.filter(|_| !self.touching);
        self.touching = touch.is_some();

        match self.phase {
            Phase::Menu { first, second } => {
                if let Some(point) = pressed {
                    self.menu(engine, point, first, second)?;
                }
                Ok(None)
            }
            Phase::Approach { round, x1, x2 } => {
                let (x1, x2) = (x1 + APPROACH_SPEED, x2 - APPROACH_SPEED);
                engine.sprites.set_xy(TOP, HAND_LEFT, x1, HAND_Y);
                engine.sprites.set_xy(TOP, HAND_RIGHT, x2, HAND_Y);

                self.phase = if x1 + HAND_SIZE == x2 {
                    Phase::Spin {
                        round,
                        x1,
                        x2,
                        y: HAND_Y,
                        rotation: 0,
                    }
                } else {
                    Phase::Approach { round, x1, x2 }
                };
                Ok(None)
            }
            Phase::Spin {
                round,
                x1,
                x2,
                y,
                rotation,
            } => {
                if let Some(next) = spin(engine, round, x1, x2, y, rotation) {
                    self.phase = next;
                    return Ok(None);
                }
                self.finish(engine, round);
                Ok(Some(round))
            }
            Phase::GameOver { pressed: held } => {
                if touch.is_some() {
                    self.phase = Phase::GameOver { pressed: true };
                } else if held {
                    self.start(engine)?;
                }
                Ok(None)
            }
        }
    }

    fn menu(
        &mut self,
        engine: &mut Engine,
        point: Point<i32>,
        first: Option<Choice>,
        second: Option<Choice>,
    ) -> Result<()> {
        let buttons = match self.mode {
            Mode::Single => 0..BUTTONS,
            Mode::Multi => 0..BUTTONS * 2,
        };
        let Some(index) = buttons
            .clone()
            .find(|index| engine.sprites.is_touching_point(BOTTOM, *index, point.x, point.y))
        else {
            return Ok(());
        };
        let choice = choice_of(index);

        match self.mode {
            Mode::Single => {
                highlight(engine, buttons, index);
                let opponent = Choice::random(&mut self.rng);
                self.play(engine, choice, opponent)
            }
            Mode::Multi => {
                let (first, second) = if index < BUTTONS {
                    (Some(choice), second)
                } else {
                    (first, Some(choice))
                };
                // each player keeps one highlighted button on their side
                let side = if index < BUTTONS {
                    0..BUTTONS
                } else {
                    BUTTONS..BUTTONS * 2
                };
                highlight(engine, side, index);

                match (first, second) {
                    (Some(player), Some(opponent)) => self.play(engine, player, opponent),
                    _ => {
                        self.phase = Phase::Menu { first, second };
                        Ok(())
                    }
                }
            }
        }
    }

    /// Scores `round` and either returns to the menu or ends the game.
    fn finish(&mut self, engine: &mut Engine, round: Round) {
        engine.sprites.delete(TOP, HAND_LEFT);
        engine.sprites.delete(TOP, HAND_RIGHT);

        match round.outcome {
            Outcome::Win => self.score.wins += 1,
            Outcome::Tie => self.score.ties += 1,
            Outcome::Loss => self.score.damage += 1,
        }
        tracing::info!(
            "{} against {}: {:?} ({:?})",
            round.player,
            round.opponent,
            round.outcome,
            self.score
        );

        if self.score.damage <= MAX_DAMAGE {
            engine.sprites.set_frame(TOP, HEALTH_LEFT, to_slot(self.score.damage));
        }
        if self.mode == Mode::Multi && self.score.wins <= MAX_DAMAGE {
            engine.sprites.set_frame(TOP, HEALTH_RIGHT, to_slot(self.score.wins));
        }
        for index in 0..BUTTONS * 2 {
            engine.sprites.set_frame(BOTTOM, index, 0);
        }

        let knocked_out = self.score.damage > MAX_DAMAGE
            || (self.mode == Mode::Multi && self.score.wins > MAX_DAMAGE);
        if knocked_out {
            self.game_over(engine);
        } else {
            self.phase = Phase::MENU;
        }
    }

    fn game_over(&mut self, engine: &mut Engine) {
        for index in 0..BUTTONS * 2 {
            engine.sprites.delete(BOTTOM, index);
        }
        engine.sprites.delete(TOP, HEALTH_LEFT);
        engine.sprites.delete(TOP, HEALTH_RIGHT);

        let top = assets::game_over_top();
        let bottom = assets::game_over_bottom();
        for (screen, art) in [(TOP, &top), (BOTTOM, &bottom)] {
            engine.backgrounds.delete(screen, BACKGROUND_LAYER);
            if let Err(err) = load_background(engine, screen, art) {
                tracing::warn!("game over screen {screen}: {err}");
            }
        }
        self.apply_grayscale(engine);

        tracing::info!("game over after {:?}", self.score);
        self.phase = Phase::GameOver { pressed: false };
    }
}

/// One step of the spin animation, `None` once the spinning hands left the
/// screen.
fn spin(engine: &mut Engine, round: Round, x1: i32, x2: i32, y: i32, rotation: i32) -> Option<Phase> {
    let moving = match round.outcome {
        Outcome::Win => x2 < HAND_START_RIGHT,
        Outcome::Loss => x1 > HAND_START_LEFT,
        Outcome::Tie => x1 > HAND_START_LEFT && x2 < HAND_START_RIGHT,
    };
    if !moving || y >= SCREEN_BOTTOM {
        return None;
    }

    let rotation = if rotation >= 360 { 0 } else { rotation };
    let y = y + 1;
    let (x1, x2, rotation) = match round.outcome {
        Outcome::Win => {
            let rotation = rotation - SPIN_SPEED;
            engine.sprites.set_xy(TOP, HAND_RIGHT, x2 + 1, y);
            engine.sprites.set_angle(TOP, HAND_RIGHT, 0, rotation);
            (x1, x2 + 1, rotation)
        }
        Outcome::Loss => {
            let rotation = rotation + SPIN_SPEED;
            engine.sprites.set_xy(TOP, HAND_LEFT, x1 - 1, y);
            engine.sprites.set_angle(TOP, HAND_LEFT, 0, rotation);
            (x1 - 1, x2, rotation)
        }
        Outcome::Tie => {
            let rotation = rotation + SPIN_SPEED;
            engine.sprites.set_xy(TOP, HAND_LEFT, x1 - 1, y);
            engine.sprites.set_xy(TOP, HAND_RIGHT, x2 + 1, y);
            engine.sprites.set_angle(TOP, HAND_LEFT, 0, rotation);
            engine.sprites.set_angle(TOP, HAND_RIGHT, 1, -rotation);
            (x1 - 1, x2 + 1, rotation)
        }
    };

    Some(Phase::Spin {
        round,
        x1,
        x2,
        y,
        rotation,
    })
}

/// Removes everything a game puts on the screens.
fn clear(engine: &mut Engine) {
    for index in 0..BUTTONS * 2 {
        engine.sprites.delete(BOTTOM, index);
    }
    for index in [HAND_LEFT, HAND_RIGHT, HEALTH_LEFT, HEALTH_RIGHT] {
        engine.sprites.delete(TOP, index);
    }
    engine.backgrounds.delete(BOTTOM, BACKGROUND_LAYER);
    engine.backgrounds.delete(TOP, BACKGROUND_LAYER);
}

/// Lights button `lit` and turns off the other buttons in `buttons`.
fn highlight(engine: &mut Engine, buttons: std::ops::Range<i32>, lit: i32) {
    for index in buttons {
        engine
            .sprites
            .set_frame(BOTTOM, index, usize::from(index == lit));
    }
}

fn choice_of(button: i32) -> Choice {
    usize::try_from(button.rem_euclid(BUTTONS))
        .ok()
        .and_then(Choice::from_index)
        .unwrap_or(Choice::Rock)
}

/// Palette slots and frames from counters, negative values map to 0.
fn to_slot<T: TryInto<usize>>(value: T) -> usize {
    value.try_into().unwrap_or(0)
}

fn load_button(engine: &mut Engine, index: i32, x: i32, y: i32) -> Result<()> {
    let sheet = assets::hand(choice_of(index));
    load_sprite(engine, BOTTOM, index, to_slot(index), &sheet, x, y)
}

fn load_sprite(
    engine: &mut Engine,
    screen: i32,
    index: i32,
    palette_slot: usize,
    sheet: &SpriteSheet,
    x: i32,
    y: i32,
) -> Result<()> {
    engine.sprites.create(
        screen,
        index,
        palette_slot,
        &sheet.pixels,
        &sheet.palette,
        sheet.width,
        sheet.height,
    )?;
    engine.sprites.set_xy(screen, index, x, y);
    Ok(())
}

fn load_background(engine: &mut Engine, screen: i32, art: &Backdrop) -> Result<()> {
    engine
        .backgrounds
        .create(screen, BACKGROUND_LAYER, art.width, art.height);
    engine.backgrounds.set_palette(screen, BACKGROUND_LAYER, &art.palette);
    engine.backgrounds.set_tiles(screen, BACKGROUND_LAYER, &art.tiles)?;
    engine.backgrounds.set_map(screen, BACKGROUND_LAYER, &art.map)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::{DateTime, FixedClock, Immediate};
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;

    fn engine() -> Engine {
        Engine::new(
            Box::new(FixedClock(DateTime::default())),
            Box::new(Immediate),
        )
    }

    fn session(mode: Mode, engine: &mut Engine) -> Session {
        let mut session = Session::new(mode, StdRng::seed_from_u64(7));
        session.start(engine).unwrap();
        session
    }

    /// Ticks without touching until the menu or game over is reached and
    /// returns the scored round.
    fn run_round(session: &mut Session, engine: &mut Engine) -> Round {
        let mut scored = None;
        for _ in 0..1000 {
            if let Some(round) = session.tick(engine, None).unwrap() {
                scored = Some(round);
            }
            if matches!(session.phase(), Phase::Menu { .. } | Phase::GameOver { .. }) {
                break;
            }
        }
        scored.unwrap()
    }

    fn position(engine: &Engine, screen: i32, index: i32) -> (i32, i32) {
        let rect = engine.sprites.bounding_box(screen, index);
        (rect.position.x, rect.position.y)
    }

    #[test]
    fn single_player_layout() {
        let mut engine = engine();
        let _session = session(Mode::Single, &mut engine);

        let layout: Vec<_> = (0..5).map(|i| position(&engine, 0, i)).collect();
        assert_eq!(layout, SINGLE_LAYOUT.to_vec());
        assert!(engine.sprites.is_active(1, HEALTH_LEFT));
        assert!(!engine.sprites.is_active(1, HEALTH_RIGHT));
        assert!(!engine.sprites.is_active(0, 5));
        assert_eq!(engine.display().backdrop(0), assets::backdrop_color());
    }

    #[test]
    fn multi_player_buttons_are_copies() {
        let mut engine = engine();
        let _session = session(Mode::Multi, &mut engine);

        for index in 5..10 {
            assert!(engine.sprites.is_copy(0, index));
        }
        assert_eq!(position(&engine, 0, 5), (192, 0));
        assert_eq!(position(&engine, 0, 9), (128, 96));
        assert_eq!(engine.sprites.pixels(0, 8), engine.sprites.pixels(0, 3));
        assert_eq!(position(&engine, 1, HEALTH_RIGHT), (192, 0));
    }

    #[test]
    fn touching_a_button_starts_a_round() {
        let mut engine = engine();
        let mut session = session(Mode::Single, &mut engine);

        // between the buttons nothing happens
        session.tick(&mut engine, Some(Point::new(10, 10))).unwrap();
        assert_eq!(session.phase(), Phase::MENU);
        session.tick(&mut engine, None).unwrap();

        // paper
        session.tick(&mut engine, Some(Point::new(120, 40))).unwrap();
        let Phase::Approach { round, x1, x2 } = session.phase() else {
            panic!("expected approach, got {:?}", session.phase());
        };
        assert_eq!(round.player, Choice::Paper);
        assert_eq!((x1, x2), (-64, 256));
        assert_eq!(engine.sprites.frame(0, 1), 1);
        assert_eq!(engine.sprites.frame(0, 0), 0);
        assert_eq!(position(&engine, 1, HAND_LEFT), (-64, 96));
        let paper = assets::hand(Choice::Paper);
        assert_eq!(engine.sprites.pixels(1, HAND_LEFT), Some(paper.pixels.as_slice()));
    }

    #[test]
    fn held_touch_does_not_repeat() {
        let mut engine = engine();
        let mut session = session(Mode::Single, &mut engine);

        session.play(&mut engine, Choice::Rock, Choice::Rock).unwrap();
        let held = Some(Point::new(40, 40));
        for _ in 0..1000 {
            session.tick(&mut engine, held).unwrap();
            if session.phase() == Phase::MENU {
                break;
            }
        }
        assert_eq!(session.phase(), Phase::MENU);

        // the finger never left the screen
        session.tick(&mut engine, held).unwrap();
        assert_eq!(session.phase(), Phase::MENU);
        session.tick(&mut engine, None).unwrap();
        session.tick(&mut engine, held).unwrap();
        assert!(matches!(session.phase(), Phase::Approach { .. }));
    }

    #[test]
    fn hands_meet_after_approach() {
        let mut engine = engine();
        let mut session = session(Mode::Single, &mut engine);
        session.play(&mut engine, Choice::Rock, Choice::Scissors).unwrap();

        for _ in 0..31 {
            session.tick(&mut engine, None).unwrap();
            assert!(matches!(session.phase(), Phase::Approach { .. }));
        }
        session.tick(&mut engine, None).unwrap();
        assert!(matches!(
            session.phase(),
            Phase::Spin {
                x1: 64,
                x2: 128,
                y: 96,
                ..
            }
        ));
        assert_eq!(position(&engine, 1, HAND_LEFT), (64, 96));
        assert_eq!(position(&engine, 1, HAND_RIGHT), (128, 96));
    }

    #[test]
    fn the_loser_spins_away() {
        let mut engine = engine();
        let mut session = session(Mode::Single, &mut engine);
        session.play(&mut engine, Choice::Rock, Choice::Scissors).unwrap();
        for _ in 0..34 {
            session.tick(&mut engine, None).unwrap();
        }

        // the opponent lost: right hand moves and rotates clockwise
        assert_eq!(position(&engine, 1, HAND_LEFT), (64, 96));
        assert_eq!(position(&engine, 1, HAND_RIGHT), (130, 98));
        assert_eq!(engine.sprites.angle(1, HAND_RIGHT).map(|r| r.degrees), Some(-8));
        assert_eq!(engine.sprites.angle(1, HAND_LEFT), None);

        let round = run_round(&mut session, &mut engine);
        assert_eq!(round.outcome, Outcome::Win);
        assert_eq!(session.score(), Score { wins: 1, ties: 0, damage: 0 });
        assert!(!engine.sprites.is_active(1, HAND_LEFT));
        assert!(!engine.sprites.is_active(1, HAND_RIGHT));
    }

    #[test]
    fn ties_spin_both_hands() {
        let mut engine = engine();
        let mut session = session(Mode::Single, &mut engine);
        session.play(&mut engine, Choice::Spock, Choice::Spock).unwrap();
        for _ in 0..33 {
            session.tick(&mut engine, None).unwrap();
        }

        let left = engine.sprites.angle(1, HAND_LEFT).unwrap();
        let right = engine.sprites.angle(1, HAND_RIGHT).unwrap();
        assert_eq!((left.rotation_index, left.degrees), (0, 4));
        assert_eq!((right.rotation_index, right.degrees), (1, -4));

        run_round(&mut session, &mut engine);
        assert_eq!(session.score().ties, 1);
    }

    #[test]
    fn health_bar_follows_damage() {
        let mut engine = engine();
        let mut session = session(Mode::Single, &mut engine);

        for damage in 1..=3 {
            session.play(&mut engine, Choice::Rock, Choice::Paper).unwrap();
            run_round(&mut session, &mut engine);
            assert_eq!(engine.sprites.frame(1, HEALTH_LEFT), damage);
        }
        assert_eq!(session.phase(), Phase::MENU);
    }

    #[test]
    fn fourth_loss_ends_the_game() {
        let mut engine = engine();
        let mut session = session(Mode::Single, &mut engine);

        for _ in 0..4 {
            session.play(&mut engine, Choice::Lizard, Choice::Rock).unwrap();
            run_round(&mut session, &mut engine);
        }
        assert_eq!(session.phase(), Phase::GameOver { pressed: false });
        assert!(!engine.sprites.is_active(0, 0));
        assert!(!engine.sprites.is_active(1, HEALTH_LEFT));
        assert!(engine.backgrounds.is_active(1, 1));
        assert!(engine.backgrounds.is_active(0, 1));

        // touch and release to play again
        session.tick(&mut engine, Some(Point::new(5, 5))).unwrap();
        session.tick(&mut engine, Some(Point::new(5, 5))).unwrap();
        assert_eq!(session.phase(), Phase::GameOver { pressed: true });
        session.tick(&mut engine, None).unwrap();

        assert_eq!(session.phase(), Phase::MENU);
        assert_eq!(session.score(), Score::default());
        assert!(engine.sprites.is_active(0, 0));
        assert!(!engine.backgrounds.is_active(1, 1));
        assert_eq!(engine.sprites.frame(1, HEALTH_LEFT), 0);
    }

    #[test]
    fn multi_player_waits_for_both() {
        let mut engine = engine();
        let mut session = session(Mode::Multi, &mut engine);

        // player 2 picks lizard
        session.tick(&mut engine, Some(Point::new(150, 50))).unwrap();
        session.tick(&mut engine, None).unwrap();
        assert_eq!(
            session.phase(),
            Phase::Menu {
                first: None,
                second: Some(Choice::Lizard)
            }
        );
        assert_eq!(engine.sprites.frame(0, 8), 1);

        // player 1 picks scissors
        session.tick(&mut engine, Some(Point::new(20, 150))).unwrap();
        let Phase::Approach { round, .. } = session.phase() else {
            panic!("expected approach, got {:?}", session.phase());
        };
        assert_eq!(round, Round::new(Choice::Scissors, Choice::Lizard));
        assert_eq!(engine.sprites.frame(0, 8), 1);
        assert_eq!(engine.sprites.frame(0, 2), 1);

        run_round(&mut session, &mut engine);
        assert_eq!(session.score().wins, 1);
        assert_eq!(engine.sprites.frame(1, HEALTH_RIGHT), 1);
        assert_eq!(engine.sprites.frame(0, 8), 0);
    }

    #[test]
    fn grayscale_reaches_new_sprites() {
        let mut engine = engine();
        let mut session = session(Mode::Single, &mut engine);

        session.set_grayscale(&mut engine, true);
        assert!(engine.sprites.uses_grayscale(0, 3));

        session.play(&mut engine, Choice::Rock, Choice::Paper).unwrap();
        assert!(engine.sprites.uses_grayscale(1, HAND_LEFT));

        session.set_grayscale(&mut engine, false);
        assert!(!engine.sprites.uses_grayscale(1, HAND_RIGHT));
    }

    #[test]
    fn switching_mode_starts_over() {
        let mut engine = engine();
        let mut session = session(Mode::Single, &mut engine);
        session.play(&mut engine, Choice::Rock, Choice::Paper).unwrap();
        run_round(&mut session, &mut engine);

        session.set_mode(&mut engine, Mode::Multi).unwrap();
        assert_eq!(session.score(), Score::default());
        assert_eq!(position(&engine, 0, 0), (0, 0));
        assert!(engine.sprites.is_copy(0, 7));
    }
}
