use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::record::Date;

/// File looked up in the working directory when no config is given.
pub const DEFAULT_CONFIG_FILE: &str = "rpsls.json";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// One player against the computer.
    #[default]
    Single,
    /// Two players sharing the touch screen.
    Multi,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root of the save data, profiles live in `<data_dir>/data/RPSLS`.
    pub data_dir: PathBuf,
    /// Profile file name and default user name.
    pub profile: String,
    /// Message stored in a newly created profile.
    pub message: String,
    /// Birthday stored in a newly created profile.
    pub birthday: Date,
    pub mode: Mode,
    pub frames_per_second: u32,
    /// Window pixels per screen pixel.
    pub scale: f32,
    /// Start with gray palettes.
    pub grayscale: bool,
    /// Seed for the computer's choices, random when unset.
    pub seed: Option<u64>,
    /// Also write logs to this file.
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            profile: String::from("Player"),
            message: String::from("Live long and prosper"),
            birthday: Date::new(1, 1, 2000),
            mode: Mode::Single,
            frames_per_second: 60,
            scale: 2.0,
            grayscale: false,
            seed: None,
            log_file: None,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> io::Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Loads `path` when given. Without a path the default file is used if
    /// it exists, otherwise the defaults.
    pub fn load_or_default(path: Option<&Path>) -> io::Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::load(Path::new(DEFAULT_CONFIG_FILE))
            }
            None => Ok(Self::default()),
        }
    }

    pub fn save(&self, path: &Path) -> io::Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_fields_take_defaults() {
        let config: Config =
            serde_json::from_str(r#"{ "profile": "Gerald", "mode": "multi" }"#).unwrap();
        assert_eq!(config.profile, "Gerald");
        assert_eq!(config.mode, Mode::Multi);
        assert_eq!(config.frames_per_second, 60);
        assert_eq!(config.log_file, None);
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let config = Config {
            grayscale: true,
            seed: Some(42),
            birthday: Date::new(24, 12, 1990),
            ..Config::default()
        };

        config.save(&path).unwrap();
        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        let err = Config::load(&path).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert!(Config::load_or_default(Some(&dir.path().join("missing.json"))).is_err());
    }
}
