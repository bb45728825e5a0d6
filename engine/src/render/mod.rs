//! # Commit surface
//!
//! Software model of the two display engines the managers draw into. Each
//! screen is a 256x192 raster built from four tiled background layers and
//! up to 128 sprites:
//!
//! ```text
//!   BackgroundManager ──► [BgLayer; 4] ─┐
//!                                       ├──► Display::compose ──► framebuffer
//!   SpriteManager ──────► Oam ──────────┘        (per screen)
//! ```
//!
//! # Layer priority
//!
//! Every background layer and every sprite carries a priority (0-3, lower is
//! closer to the viewer). For each pixel the compositor collects the opaque
//! candidates and keeps the one with the lowest priority:
//!
//! - sprites win ties against backgrounds,
//! - among sprites, a higher OAM index is drawn above a lower one,
//! - when nothing is opaque the screen's backdrop color shows through.
//!
//! Palette index 0 is transparent everywhere.

use crate::render::bg_layer::BgLayer;
use crate::render::color::Color;
use crate::render::oam::Oam;

pub mod affine;
pub mod bg_layer;
pub mod color;
pub mod oam;

/// Width of each screen in pixels.
pub const SCREEN_WIDTH: usize = 256;

/// Height of each screen in pixels.
pub const SCREEN_HEIGHT: usize = 192;

/// Number of physical screens.
pub const SCREEN_COUNT: usize = 2;

/// Background layers per screen.
pub const LAYER_COUNT: usize = 4;

/// Sprite slots per screen.
pub const SPRITE_COUNT: usize = 128;

/// Rotation/scaling matrices per screen.
pub const AFFINE_COUNT: usize = 32;

/// Extended sprite palettes per screen.
pub const OBJ_PALETTE_SLOTS: usize = 16;

/// Bytes in one 8x8 tile at 8 bits per pixel.
pub const TILE_BYTES: usize = 64;

/// A pixel produced by a layer, before priority resolution.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PixelInfo {
    pub color: Color,
    pub priority: u8,
}

/// Anything that can produce a pixel for the compositor.
pub trait Layer {
    /// Returns the pixel at screen coordinates `(x, y)` or `None` when the
    /// layer is transparent there.
    fn render(&self, x: usize, y: usize) -> Option<PixelInfo>;
}

/// Framebuffers of both screens.
pub struct Display {
    framebuffers: [Vec<Color>; SCREEN_COUNT],
    backdrops: [Color; SCREEN_COUNT],
    sprite_buffer: Vec<Option<PixelInfo>>,
}

impl Default for Display {
    fn default() -> Self {
        Self {
            framebuffers: [
                vec![Color::default(); SCREEN_WIDTH * SCREEN_HEIGHT],
                vec![Color::default(); SCREEN_WIDTH * SCREEN_HEIGHT],
            ],
            backdrops: [Color::default(); SCREEN_COUNT],
            sprite_buffer: vec![None; SCREEN_WIDTH * SCREEN_HEIGHT],
        }
    }
}

impl Display {
    pub fn set_backdrop(&mut self, screen: usize, color: Color) {
        self.backdrops[screen.min(SCREEN_COUNT - 1)] = color;
    }

    pub fn backdrop(&self, screen: usize) -> Color {
        self.backdrops[screen.min(SCREEN_COUNT - 1)]
    }

    /// Rows of the last composed image of `screen`.
    pub fn framebuffer(&self, screen: usize) -> &[Color] {
        &self.framebuffers[screen.min(SCREEN_COUNT - 1)]
    }

    pub fn pixel(&self, screen: usize, x: usize, y: usize) -> Color {
        self.framebuffer(screen)
            .get(y * SCREEN_WIDTH + x)
            .copied()
            .unwrap_or_default()
    }

    /// Builds the image of `screen` from its committed background and sprite
    /// state.
    pub fn compose(&mut self, screen: usize, layers: &[BgLayer], oam: &Oam) {
        let screen = screen.min(SCREEN_COUNT - 1);
        oam.render_sprites(&mut self.sprite_buffer);

        let backdrop = self.backdrops[screen];
        let enabled: Vec<&dyn Layer> = layers
            .iter()
            .filter(|layer| layer.is_visible())
            .map(|layer| layer as &dyn Layer)
            .collect();

        for y in 0..SCREEN_HEIGHT {
            for x in 0..SCREEN_WIDTH {
                let sprite = self.sprite_buffer[y * SCREEN_WIDTH + x];

                // The sprite candidate goes first so it wins priority ties.
                let winner = sprite
                    .into_iter()
                    .chain(enabled.iter().filter_map(|layer| layer.render(x, y)))
                    .min_by_key(|pixel| pixel.priority);

                self.framebuffers[screen][y * SCREEN_WIDTH + x] =
                    winner.map_or(backdrop, |info| info.color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::color::{Palette, colors};
    use crate::render::oam::{ObjEntry, ObjMode};
    use pretty_assertions::assert_eq;

    fn solid_tile_layer(priority: u8, color: Color) -> BgLayer {
        let mut layer = BgLayer::default();
        layer.upload_tiles(&[1; TILE_BYTES]).unwrap();
        layer.upload_palette(&Palette::from_words(&[0, color.0]));
        layer.set_priority(priority);
        layer.set_visible(true);
        layer
    }

    fn solid_sprite(oam: &mut Oam, index: usize, priority: u8, color: Color) {
        let block = oam.vram_mut().allocate(TILE_BYTES).unwrap();
        oam.vram_mut().write(block, &[1; TILE_BYTES]);
        oam.upload_palette(index % OBJ_PALETTE_SLOTS, &Palette::from_words(&[0, color.0]));
        oam.set_entry(
            index,
            ObjEntry {
                x: 0,
                y: 0,
                width: 8,
                height: 8,
                mode: ObjMode::Normal,
                priority,
                palette_slot: index % OBJ_PALETTE_SLOTS,
                gfx: Some(block),
                ..ObjEntry::default()
            },
        );
        oam.flush();
    }

    #[test]
    fn backdrop_when_nothing_is_visible() {
        let mut display = Display::default();
        display.set_backdrop(1, colors::BLUE);
        display.compose(1, &[], &Oam::default());

        assert_eq!(display.pixel(1, 0, 0), colors::BLUE);
        assert_eq!(display.pixel(1, 255, 191), colors::BLUE);
    }

    #[test]
    fn lower_priority_layer_wins() {
        let mut display = Display::default();
        let layers = [
            solid_tile_layer(2, colors::RED),
            solid_tile_layer(1, colors::GREEN),
        ];
        display.compose(0, &layers, &Oam::default());

        assert_eq!(display.pixel(0, 3, 3), colors::GREEN);
    }

    #[test]
    fn sprite_wins_priority_tie() {
        let mut display = Display::default();
        let layers = [solid_tile_layer(1, colors::RED)];
        let mut oam = Oam::default();
        solid_sprite(&mut oam, 0, 1, colors::WHITE);
        display.compose(0, &layers, &oam);

        assert_eq!(display.pixel(0, 4, 4), colors::WHITE);
        // Outside the 8x8 sprite the background shows.
        assert_eq!(display.pixel(0, 12, 4), colors::RED);
    }

    #[test]
    fn higher_sprite_index_is_on_top() {
        let mut display = Display::default();
        let mut oam = Oam::default();
        solid_sprite(&mut oam, 3, 0, colors::RED);
        solid_sprite(&mut oam, 7, 0, colors::GREEN);
        display.compose(0, &[], &oam);

        assert_eq!(display.pixel(0, 0, 0), colors::GREEN);
    }
}
