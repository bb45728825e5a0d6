use std::fmt;
use std::io;

use engine::geometry::Point;
use engine::{Clock, Engine, EngineError, FixedRate, SystemClock, VBlank};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;

use crate::achievements::{Achievement, AchievementLog, AchievementTracker};
use crate::config::{Config, Mode};
use crate::profile::Profile;
use crate::session::{Score, Session};

#[derive(Debug)]
pub enum GameError {
    Io(io::Error),
    Engine(EngineError),
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "save data: {err}"),
            Self::Engine(err) => write!(f, "engine: {err}"),
        }
    }
}

impl std::error::Error for GameError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Engine(err) => Some(err),
        }
    }
}

impl From<io::Error> for GameError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<EngineError> for GameError {
    fn from(err: EngineError) -> Self {
        Self::Engine(err)
    }
}

/// What a frontend shows next to the screens.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub phase: &'static str,
    pub mode: Mode,
    pub score: Score,
    pub grayscale: bool,
    pub player: String,
    pub is_birthday: bool,
    /// Clock reading of the last frame, asctime style.
    pub time: String,
    pub frame: u64,
    pub unlocked: Vec<Achievement>,
}

/// The engine and everything the game keeps between frames.
pub struct Game {
    engine: Engine,
    session: Session,
    profile: Profile,
    achievements: AchievementTracker,
}

impl Game {
    /// Loads the profile named in `config` and lays out the first match,
    /// paced by `frames_per_second` against the system clock.
    pub fn new(config: &Config) -> Result<Self, GameError> {
        Self::with_parts(
            config,
            Box::new(SystemClock),
            Box::new(FixedRate::new(config.frames_per_second)),
        )
    }

    pub fn with_parts(
        config: &Config,
        clock: Box<dyn Clock + Send>,
        vblank: Box<dyn VBlank + Send>,
    ) -> Result<Self, GameError> {
        let profile = Profile::load(&config.data_dir, &config.profile, config)?;
        let achievements = AchievementTracker::new(AchievementLog::new(profile.achievements_path()));
        let rng = config
            .seed
            .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);

        let mut engine = Engine::new(clock, vblank);
        let mut session = Session::new(config.mode, rng);
        session.start(&mut engine)?;
        session.set_grayscale(&mut engine, config.grayscale);

        tracing::info!("playing as {}", profile.user().name);
        Ok(Self {
            engine,
            session,
            profile,
            achievements,
        })
    }

    /// Runs one frame: game logic, then the engine pump. Returns the
    /// achievement unlocked by a round scored in this frame.
    pub fn tick(&mut self, touch: Option<Point<i32>>) -> Result<Option<Achievement>, GameError> {
        let round = self.session.tick(&mut self.engine, touch)?;
        self.engine.update_all(&mut self.profile);

        let Some(round) = round else {
            return Ok(None);
        };
        match self.achievements.record(round.outcome, &self.engine.now()) {
            Ok(unlocked) => Ok(unlocked),
            Err(err) => {
                tracing::warn!("could not update achievements: {err}");
                Ok(None)
            }
        }
    }

    pub fn set_grayscale(&mut self, grayscale: bool) {
        self.session.set_grayscale(&mut self.engine, grayscale);
    }

    pub fn set_mode(&mut self, mode: Mode) -> Result<(), GameError> {
        Ok(self.session.set_mode(&mut self.engine, mode)?)
    }

    /// Starts over in the current mode.
    pub fn restart(&mut self) -> Result<(), GameError> {
        Ok(self.session.start(&mut self.engine)?)
    }

    pub fn snapshot(&self) -> Snapshot {
        let unlocked = self.achievements.log().all().unwrap_or_else(|err| {
            tracing::warn!("could not read achievements: {err}");
            Vec::new()
        });
        Snapshot {
            phase: self.session.phase().name(),
            mode: self.session.mode(),
            score: self.session.score(),
            grayscale: self.session.grayscale(),
            player: self.profile.user().name.clone(),
            is_birthday: self.profile.user().is_birthday_today,
            time: self.engine.now().to_string(),
            frame: self.engine.frame_count(),
            unlocked,
        }
    }

    pub const fn engine(&self) -> &Engine {
        &self.engine
    }

    pub const fn session(&self) -> &Session {
        &self.session
    }

    pub const fn profile(&self) -> &Profile {
        &self.profile
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Choice;
    use engine::{DateTime, FixedClock, Immediate};
    use pretty_assertions::assert_eq;

    fn config(root: &std::path::Path) -> Config {
        Config {
            data_dir: root.to_path_buf(),
            profile: String::from("tester"),
            seed: Some(3),
            ..Config::default()
        }
    }

    fn game(config: &Config, now: DateTime) -> Game {
        Game::with_parts(config, Box::new(FixedClock(now)), Box::new(Immediate)).unwrap()
    }

    fn play_round(game: &mut Game, player: Choice, opponent: Choice) -> Option<Achievement> {
        game.session.play(&mut game.engine, player, opponent).unwrap();
        let mut unlocked = None;
        for _ in 0..1000 {
            if let Some(achievement) = game.tick(None).unwrap() {
                unlocked = Some(achievement);
            }
            if game.snapshot().phase == "menu" {
                break;
            }
        }
        unlocked
    }

    #[test]
    fn first_tick_composes_the_menu() {
        let root = tempfile::tempdir().unwrap();
        let mut game = game(&config(root.path()), DateTime::default());

        game.tick(None).unwrap();
        let snapshot = game.snapshot();
        assert_eq!(snapshot.phase, "menu");
        assert_eq!(snapshot.frame, 1);
        assert_eq!(snapshot.player, "tester");
        // the rock button is drawn on the touch screen
        let rock = game.engine().display().pixel(0, 64, 64);
        assert_ne!(rock, game.engine().display().backdrop(0));
    }

    #[test]
    fn birthday_flag_tracks_the_clock() {
        let root = tempfile::tempdir().unwrap();
        let now = DateTime {
            year: 2030,
            month: 1,
            day: 1,
            ..DateTime::default()
        };
        let mut game = game(&config(root.path()), now);
        assert!(!game.snapshot().is_birthday);

        game.tick(None).unwrap();
        assert!(game.snapshot().is_birthday);
        assert_eq!(game.snapshot().time, "Sun Jan  1 00:00:00 2030");
    }

    #[test]
    fn first_win_unlocks_an_achievement() {
        let root = tempfile::tempdir().unwrap();
        let mut game = game(&config(root.path()), DateTime::default());

        assert_eq!(play_round(&mut game, Choice::Rock, Choice::Paper), None);
        let unlocked = play_round(&mut game, Choice::Paper, Choice::Rock).unwrap();
        assert_eq!(unlocked.title, "First Victory");

        let snapshot = game.snapshot();
        assert_eq!(snapshot.score.wins, 1);
        assert_eq!(snapshot.score.damage, 1);
        assert_eq!(snapshot.unlocked, vec![unlocked]);
        assert!(game.profile().achievements_path().exists());
    }

    #[test]
    fn grayscale_from_config() {
        let root = tempfile::tempdir().unwrap();
        let config = Config {
            grayscale: true,
            mode: Mode::Multi,
            ..config(root.path())
        };
        let mut game = game(&config, DateTime::default());
        assert!(game.snapshot().grayscale);
        assert_eq!(game.snapshot().mode, Mode::Multi);

        game.set_grayscale(false);
        game.set_mode(Mode::Single).unwrap();
        assert!(!game.snapshot().grayscale);
        assert_eq!(game.session().mode(), Mode::Single);
    }
}
