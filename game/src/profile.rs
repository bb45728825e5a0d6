//! User profile stored as a fixed-size record.
//!
//! | Offset | Size | Field                 |
//! |--------|------|-----------------------|
//! | 0      | 1    | birthday today flag   |
//! | 1      | 10   | name                  |
//! | 11     | 26   | message               |
//! | 37     | 12   | birthday (d, m, y)    |

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use engine::{DateTime, FrameHook};

use crate::config::Config;
use crate::record::{Date, RecordError, check_len, read_text, write_text};

/// Directory under the data root holding this game's files.
pub const GAME_TITLE: &str = "RPSLS";

const NAME_LEN: usize = 10;
const MESSAGE_LEN: usize = 26;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UserData {
    pub is_birthday_today: bool,
    pub name: String,
    pub message: String,
    pub birthday: Date,
}

impl UserData {
    pub const LEN: usize = 1 + NAME_LEN + MESSAGE_LEN + Date::LEN;

    pub fn from_bytes(data: &[u8]) -> Result<Self, RecordError> {
        check_len(data, Self::LEN)?;
        Ok(Self {
            is_birthday_today: data[0] != 0,
            name: read_text(&data[1..11], "name")?,
            message: read_text(&data[11..37], "message")?,
            birthday: Date::read(&data[37..49])?,
        })
    }

    pub fn to_bytes(&self) -> [u8; Self::LEN] {
        let mut out = [0; Self::LEN];
        out[0] = u8::from(self.is_birthday_today);
        write_text(&mut out[1..11], &self.name);
        write_text(&mut out[11..37], &self.message);
        self.birthday.write(&mut out[37..49]);
        out
    }

    /// Birthdays match on month and day, the year is ignored.
    #[allow(clippy::cast_possible_wrap)]
    pub const fn is_birthday(&self, now: &DateTime) -> bool {
        self.birthday.month == now.month as i32 && self.birthday.day == now.day as i32
    }
}

/// `<root>/data/RPSLS`
pub fn data_dir(root: &Path) -> PathBuf {
    root.join("data").join(GAME_TITLE)
}

/// The profile in use, bound to its file.
pub struct Profile {
    path: PathBuf,
    user: UserData,
}

impl Profile {
    /// Reads `<root>/data/RPSLS/<name>.usr`. A missing profile is created
    /// from `config` and saved right away.
    pub fn load(root: &Path, name: &str, config: &Config) -> io::Result<Self> {
        let dir = data_dir(root);
        fs::create_dir_all(&dir)?;
        let path = dir.join(format!("{name}.usr"));

        match fs::read(&path) {
            Ok(data) => {
                let user = UserData::from_bytes(&data)?;
                tracing::debug!("loaded profile {}", path.display());
                Ok(Self { path, user })
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                let profile = Self {
                    path,
                    user: UserData {
                        is_birthday_today: false,
                        name: name.to_owned(),
                        message: config.message.clone(),
                        birthday: config.birthday,
                    },
                };
                profile.save()?;
                tracing::info!("created profile {}", profile.path.display());
                Ok(profile)
            }
            Err(err) => Err(err),
        }
    }

    pub fn save(&self) -> io::Result<()> {
        fs::write(&self.path, self.user.to_bytes())
    }

    /// Removes the profile file.
    pub fn delete(self) -> io::Result<()> {
        fs::remove_file(&self.path)
    }

    pub const fn user(&self) -> &UserData {
        &self.user
    }

    pub const fn user_mut(&mut self) -> &mut UserData {
        &mut self.user
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File the achievements of this profile are appended to.
    pub fn achievements_path(&self) -> PathBuf {
        self.path.with_extension("ach")
    }
}

impl FrameHook for Profile {
    fn on_time(&mut self, now: &DateTime) {
        self.user.is_birthday_today = self.user.is_birthday(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn today(day: u32, month: u32) -> DateTime {
        DateTime {
            year: 2024,
            month,
            day,
            ..DateTime::default()
        }
    }

    #[test]
    fn record_layout() {
        let user = UserData {
            is_birthday_today: true,
            name: String::from("Gerald"),
            message: String::from("hello"),
            birthday: Date::new(3, 7, 1991),
        };
        let bytes = user.to_bytes();

        assert_eq!(bytes.len(), 49);
        assert_eq!(bytes[0], 1);
        assert_eq!(&bytes[1..7], b"Gerald");
        assert_eq!(&bytes[11..16], b"hello");
        assert_eq!(&bytes[37..41], &3_i32.to_le_bytes());
        assert_eq!(UserData::from_bytes(&bytes).unwrap(), user);
    }

    #[test]
    fn truncated_record_is_rejected() {
        let err = UserData::from_bytes(&[0; 20]).unwrap_err();
        assert_eq!(
            err,
            RecordError::Truncated {
                expected: 49,
                actual: 20
            }
        );
    }

    #[test]
    fn birthday_matches_month_and_day() {
        let user = UserData {
            birthday: Date::new(3, 7, 1991),
            ..UserData::default()
        };
        assert!(user.is_birthday(&today(3, 7)));
        assert!(!user.is_birthday(&today(7, 3)));
        assert!(!user.is_birthday(&today(4, 7)));
    }

    #[test]
    fn missing_profile_is_created_from_config() {
        let root = tempfile::tempdir().unwrap();
        let config = Config {
            message: String::from("hi there"),
            birthday: Date::new(9, 9, 1999),
            ..Config::default()
        };

        let profile = Profile::load(root.path(), "tester", &config).unwrap();
        assert_eq!(profile.user().name, "tester");
        assert_eq!(profile.user().message, "hi there");
        assert!(root.path().join("data/RPSLS/tester.usr").exists());
        assert!(profile.achievements_path().ends_with("data/RPSLS/tester.ach"));
    }

    #[test]
    fn save_load_and_delete() {
        let root = tempfile::tempdir().unwrap();
        let config = Config::default();

        let mut profile = Profile::load(root.path(), "p1", &config).unwrap();
        profile.user_mut().message = String::from("changed");
        profile.save().unwrap();

        let reloaded = Profile::load(root.path(), "p1", &config).unwrap();
        assert_eq!(reloaded.user().message, "changed");

        let path = reloaded.path().to_path_buf();
        reloaded.delete().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn hook_refreshes_birthday_flag() {
        let root = tempfile::tempdir().unwrap();
        let config = Config {
            birthday: Date::new(25, 12, 1980),
            ..Config::default()
        };
        let mut profile = Profile::load(root.path(), "p", &config).unwrap();

        profile.on_time(&today(25, 12));
        assert!(profile.user().is_birthday_today);
        profile.on_time(&today(26, 12));
        assert!(!profile.user().is_birthday_today);
    }
}
