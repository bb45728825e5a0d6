#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_sign_loss)]
#[allow(clippy::cast_possible_wrap)]
pub mod background;

#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_sign_loss)]
mod bitwise;

pub mod clamp;

#[allow(clippy::cast_possible_truncation)]
pub mod clock;

pub mod error;
pub mod frame;
pub mod geometry;

#[allow(clippy::large_stack_frames)]
pub mod render;

#[allow(clippy::missing_panics_doc)]
#[allow(clippy::missing_errors_doc)]
pub mod sprite;

pub use background::{BackgroundId, BackgroundManager};
pub use clock::{Clock, DateTime, FixedClock, SystemClock};
pub use error::{EngineError, Result};
pub use frame::{Engine, FixedRate, FrameHook, Immediate, VBlank};
pub use render::color::{Color, Palette, Rgb};
pub use sprite::{Rotation, SpriteId, SpriteManager};
