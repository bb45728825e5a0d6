//! Achievement log: records appended to `<profile>.ach`.
//!
//! | Offset | Size | Field             |
//! |--------|------|-------------------|
//! | 0      | 4    | points (i32 LE)   |
//! | 4      | 8    | game id           |
//! | 12     | 64   | title             |
//! | 76     | 12   | unlock date       |

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use engine::DateTime;
use serde::Serialize;

use crate::record::{Date, RecordError, check_len, read_i32, read_text, write_text};
use crate::rules::Outcome;

pub const GAME_ID: &str = "RPSLS";

const GAME_ID_LEN: usize = 8;
const TITLE_LEN: usize = 64;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Achievement {
    pub points: i32,
    pub game_id: String,
    pub title: String,
    pub unlocked: Date,
}

impl Achievement {
    pub const LEN: usize = 4 + GAME_ID_LEN + TITLE_LEN + Date::LEN;

    pub fn from_bytes(data: &[u8]) -> Result<Self, RecordError> {
        check_len(data, Self::LEN)?;
        Ok(Self {
            points: read_i32(data, 0)?,
            game_id: read_text(&data[4..12], "game id")?,
            title: read_text(&data[12..76], "title")?,
            unlocked: Date::read(&data[76..88])?,
        })
    }

    pub fn to_bytes(&self) -> [u8; Self::LEN] {
        let mut out = [0; Self::LEN];
        out[0..4].copy_from_slice(&self.points.to_le_bytes());
        write_text(&mut out[4..12], &self.game_id);
        write_text(&mut out[12..76], &self.title);
        self.unlocked.write(&mut out[76..88]);
        out
    }
}

#[allow(clippy::cast_possible_wrap)]
const fn date_of(now: &DateTime) -> Date {
    Date::new(now.day as i32, now.month as i32, now.year)
}

pub struct AchievementLog {
    path: PathBuf,
}

impl AchievementLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends an achievement unlocked at `now`.
    pub fn add(&self, points: i32, title: &str, now: &DateTime) -> io::Result<Achievement> {
        let achievement = Achievement {
            points,
            game_id: GAME_ID.to_owned(),
            title: title.to_owned(),
            unlocked: date_of(now),
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(&achievement.to_bytes())?;
        tracing::info!("achievement unlocked: {title} ({points} points)");
        Ok(achievement)
    }

    /// Achievement number `index` in unlock order, `None` past the end or
    /// when nothing was unlocked yet.
    pub fn get(&self, index: usize) -> io::Result<Option<Achievement>> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err),
        };
        let start = index * Achievement::LEN;
        match data.get(start..start + Achievement::LEN) {
            Some(record) => Ok(Some(Achievement::from_bytes(record)?)),
            None => Ok(None),
        }
    }

    pub fn all(&self) -> io::Result<Vec<Achievement>> {
        let mut achievements = Vec::new();
        while let Some(achievement) = self.get(achievements.len())? {
            achievements.push(achievement);
        }
        Ok(achievements)
    }
}

/// An achievement the game hands out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Milestone {
    pub wins: u32,
    pub points: i32,
    pub title: &'static str,
}

pub const MILESTONES: [Milestone; 2] = [
    Milestone {
        wins: 1,
        points: 10,
        title: "First Victory",
    },
    Milestone {
        wins: 5,
        points: 25,
        title: "High Five",
    },
];

/// Counts wins over the lifetime of the process and unlocks milestones.
pub struct AchievementTracker {
    log: AchievementLog,
    wins: u32,
}

impl AchievementTracker {
    pub const fn new(log: AchievementLog) -> Self {
        Self { log, wins: 0 }
    }

    pub const fn wins(&self) -> u32 {
        self.wins
    }

    pub const fn log(&self) -> &AchievementLog {
        &self.log
    }

    /// Feeds a finished round. Returns the milestone reached, if any, and
    /// skips milestones the log already holds.
    pub fn record(&mut self, outcome: Outcome, now: &DateTime) -> io::Result<Option<Achievement>> {
        if outcome != Outcome::Win {
            return Ok(None);
        }
        self.wins += 1;

        let Some(milestone) = MILESTONES.iter().find(|m| m.wins == self.wins) else {
            return Ok(None);
        };
        let unlocked = self.log.all()?;
        if unlocked.iter().any(|a| a.title == milestone.title) {
            return Ok(None);
        }
        self.log.add(milestone.points, milestone.title, now).map(Some)
    }
}
