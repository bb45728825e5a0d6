#[allow(clippy::missing_errors_doc)]
pub mod achievements;

#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_sign_loss)]
pub mod assets;

#[allow(clippy::missing_errors_doc)]
pub mod config;

#[allow(clippy::missing_errors_doc)]
pub mod profile;

#[allow(clippy::missing_errors_doc)]
pub mod record;

pub mod rules;

#[allow(clippy::missing_errors_doc)]
pub mod runner;

#[allow(clippy::missing_errors_doc)]
pub mod session;

pub use config::{Config, Mode};
pub use rules::{Choice, Outcome};
pub use runner::{Game, GameError, Snapshot};
