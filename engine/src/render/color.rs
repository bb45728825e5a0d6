//! # Colors and palettes
//!
//! The display works with 15-bit colors, the same format stored in every
//! palette entry:
//!
//! ```text
//!  15 14       10 9        5 4        0
//! ┌──┬───────────┬──────────┬──────────┐
//! │ x│   blue    │  green   │   red    │
//! └──┴───────────┴──────────┴──────────┘
//! ```
//!
//! Callers outside the engine talk in 8-bit channels ([`Rgb`]). Going from
//! 8 to 5 bits drops the low three bits; going back uses
//! [`expand_channel`], which is stable under truncation, so
//! `Color::from(Rgb::from(c)) == c` for every packed color.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::bitwise::Bits;

/// Number of entries in a full palette.
pub const PALETTE_SIZE: usize = 256;

/// A packed 15-bit color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color(pub u16);

impl Color {
    /// Packs three 5-bit channels. Wider values are masked to 5 bits.
    pub fn from_rgb5(red: u8, green: u8, blue: u8) -> Self {
        Self(
            0_u16
                .with_bits(0..=4, u16::from(red))
                .with_bits(5..=9, u16::from(green))
                .with_bits(10..=14, u16::from(blue)),
        )
    }

    #[allow(clippy::cast_possible_truncation)]
    pub fn red(self) -> u8 {
        self.0.get_bits(0..=4) as u8
    }

    #[allow(clippy::cast_possible_truncation)]
    pub fn green(self) -> u8 {
        self.0.get_bits(5..=9) as u8
    }

    #[allow(clippy::cast_possible_truncation)]
    pub fn blue(self) -> u8 {
        self.0.get_bits(10..=14) as u8
    }

    /// Luminance preserving gray version of this color.
    ///
    /// `Y = 0.3R + 0.59G + 0.11B` over the expanded channels, evaluated in
    /// integer hundredths so that gray inputs map to themselves exactly.
    #[allow(clippy::cast_possible_truncation)]
    pub fn to_gray(self) -> Self {
        let rgb = Rgb::from(self);
        let luma = (30 * u32::from(rgb.red) + 59 * u32::from(rgb.green) + 11 * u32::from(rgb.blue))
            / 100;
        let gray = (luma >> 3) as u8;
        Self::from_rgb5(gray, gray, gray)
    }
}

impl Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{},{})", self.red(), self.green(), self.blue())
    }
}

impl From<u16> for Color {
    fn from(value: u16) -> Self {
        Self(value.get_bits(0..=14))
    }
}

impl From<Color> for u16 {
    fn from(color: Color) -> Self {
        color.0
    }
}

impl From<Rgb> for Color {
    fn from(rgb: Rgb) -> Self {
        Self::from_rgb5(rgb.red >> 3, rgb.green >> 3, rgb.blue >> 3)
    }
}

/// A color with 8-bit channels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Rgb {
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }
}

impl From<Color> for Rgb {
    fn from(color: Color) -> Self {
        Self {
            red: expand_channel(color.red()),
            green: expand_channel(color.green()),
            blue: expand_channel(color.blue()),
        }
    }
}

/// Maps a 5-bit channel to 8 bits so that `expand_channel(c) >> 3 == c`.
///
/// `((c + (c & 1)) << 3) - (c & 1)`: even values land on `c * 8`, odd values
/// on `c * 8 + 7`, and 31 reaches 255.
#[allow(clippy::cast_possible_truncation)]
pub fn expand_channel(channel: u8) -> u8 {
    let c = u16::from(channel & 0x1F);
    let odd = c & 1;
    (((c + odd) << 3) - odd) as u8
}

/// A full 256 entry palette.
#[derive(Clone, PartialEq, Eq)]
pub struct Palette(Box<[Color; PALETTE_SIZE]>);

impl Default for Palette {
    fn default() -> Self {
        Self(Box::new([Color::default(); PALETTE_SIZE]))
    }
}

impl std::fmt::Debug for Palette {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}

impl Palette {
    /// Builds a palette from packed words. Missing entries stay black,
    /// extra ones are ignored.
    pub fn from_words(words: &[u16]) -> Self {
        let mut palette = Self::default();
        for (entry, word) in palette.0.iter_mut().zip(words) {
            *entry = Color::from(*word);
        }
        palette
    }

    /// Builds a palette from its little endian byte image (512 bytes).
    pub fn from_le_bytes(bytes: &[u8]) -> Self {
        let mut palette = Self::default();
        for (entry, pair) in palette.0.iter_mut().zip(bytes.chunks_exact(2)) {
            *entry = Color::from(u16::from_le_bytes([pair[0], pair[1]]));
        }
        palette
    }

    pub fn get(&self, index: usize) -> Color {
        self.0.get(index).copied().unwrap_or_default()
    }

    /// Writes `color` at `index`; indices past the end are ignored.
    pub fn set(&mut self, index: usize, color: Color) {
        if let Some(entry) = self.0.get_mut(index) {
            *entry = color;
        }
    }

    pub fn colors(&self) -> &[Color; PALETTE_SIZE] {
        &self.0
    }

    /// Gray version of every entry. Pure and idempotent.
    pub fn to_grayscale(&self) -> Self {
        let mut gray = Self::default();
        for (out, color) in gray.0.iter_mut().zip(self.0.iter()) {
            *out = color.to_gray();
        }
        gray
    }
}

pub mod colors {
    use super::Color;

    pub const BLACK: Color = Color(0);
    pub const WHITE: Color = Color(0x7FFF);
    pub const RED: Color = Color(0x001F);
    pub const GREEN: Color = Color(0x03E0);
    pub const BLUE: Color = Color(0x7C00);
}
