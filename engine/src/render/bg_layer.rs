//! # Tiled background layer
//!
//! A layer shows a 512x512 pixel window of map entries, arranged as four
//! 256x256 screen blocks of 32x32 tiles each:
//!
//! ```text
//!  ┌────────┬────────┐
//!  │  SB 0  │  SB 1  │   each block: 1024 entries, row major
//!  ├────────┼────────┤
//!  │  SB 2  │  SB 3  │   page: 4096 entries
//!  └────────┴────────┘
//! ```
//!
//! The background manager stages the part of a larger map that is currently
//! in view into this page and scrolls inside it.
//!
//! # Map entry format
//!
//! | Bits   | Description                          |
//! |--------|--------------------------------------|
//! | 0-9    | Tile number (0-1023)                 |
//! | 10     | Horizontal flip                      |
//! | 11     | Vertical flip                        |
//! | 12-15  | Palette number (unused at 8bpp)      |
//!
//! Tiles are 8x8 pixels, one byte per pixel, 64 bytes each. A pixel value
//! indexes the layer palette; 0 is transparent.

use crate::bitwise::Bits;
use crate::error::{EngineError, Result};
use crate::geometry::Point;
use crate::render::color::Palette;
use crate::render::{Layer, PixelInfo, TILE_BYTES};

/// Entries in a staged map page.
pub const MAP_PAGE_ENTRIES: usize = 4096;

/// Entries in one 256x256 screen block.
pub const BLOCK_ENTRIES: usize = 1024;

/// Tile memory available to a single layer.
pub const TILE_VRAM_SIZE: usize = 64 * 1024;

const PAGE_SIZE: i32 = 512;

pub struct BgLayer {
    visible: bool,
    priority: u8,
    scroll: Point<i32>,
    map: Box<[u16; MAP_PAGE_ENTRIES]>,
    tiles: Vec<u8>,
    palette: Palette,
}

impl Default for BgLayer {
    fn default() -> Self {
        Self {
            visible: false,
            priority: 0,
            scroll: Point::default(),
            map: Box::new([0; MAP_PAGE_ENTRIES]),
            tiles: Vec::new(),
            palette: Palette::default(),
        }
    }
}

impl BgLayer {
    pub const fn is_visible(&self) -> bool {
        self.visible
    }

    pub const fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub const fn priority(&self) -> u8 {
        self.priority
    }

    pub const fn set_priority(&mut self, priority: u8) {
        self.priority = priority & 0b11;
    }

    pub const fn scroll(&self) -> Point<i32> {
        self.scroll
    }

    pub const fn set_scroll(&mut self, scroll: Point<i32>) {
        self.scroll = scroll;
    }

    pub fn map_page(&self) -> &[u16; MAP_PAGE_ENTRIES] {
        &self.map
    }

    /// Copies `entries` into the page starting at `offset`, zero filling
    /// whatever `entries` doesn't cover up to `len`.
    pub fn stage_map(&mut self, offset: usize, len: usize, entries: &[u16]) {
        let Some(dest) = self.map.get_mut(offset..(offset + len).min(MAP_PAGE_ENTRIES)) else {
            return;
        };
        let copied = entries.len().min(dest.len());
        dest[..copied].copy_from_slice(&entries[..copied]);
        dest[copied..].fill(0);
    }

    pub fn tiles(&self) -> &[u8] {
        &self.tiles
    }

    /// Replaces the tile memory of this layer.
    pub fn upload_tiles(&mut self, tiles: &[u8]) -> Result<()> {
        if tiles.len() > TILE_VRAM_SIZE {
            return Err(EngineError::exhausted(
                "background tile vram",
                tiles.len(),
                TILE_VRAM_SIZE,
            ));
        }
        let staged = crate::error::try_copy("background tile vram", tiles)?;
        self.tiles = staged;
        Ok(())
    }

    pub const fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn upload_palette(&mut self, palette: &Palette) {
        self.palette.clone_from(palette);
    }

    /// Hides the layer and forgets its contents.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl Layer for BgLayer {
    #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
    fn render(&self, x: usize, y: usize) -> Option<PixelInfo> {
        if !self.visible {
            return None;
        }

        // Scrolling wraps around the 512x512 page.
        let page_x = (x as i32 + self.scroll.x).rem_euclid(PAGE_SIZE) as usize;
        let page_y = (y as i32 + self.scroll.y).rem_euclid(PAGE_SIZE) as usize;

        let block = page_x / 256 + (page_y / 256) * 2;
        let tile_x = (page_x % 256) / 8;
        let tile_y = (page_y % 256) / 8;
        let entry = self.map[block * BLOCK_ENTRIES + tile_y * 32 + tile_x];

        let tile_number = usize::from(entry.get_bits(0..=9));
        let mut pixel_x = page_x % 8;
        let mut pixel_y = page_y % 8;
        if entry.is_bit_on(10) {
            pixel_x = 7 - pixel_x;
        }
        if entry.is_bit_on(11) {
            pixel_y = 7 - pixel_y;
        }

        let index = *self
            .tiles
            .get(tile_number * TILE_BYTES + pixel_y * 8 + pixel_x)?;
        if index == 0 {
            return None;
        }

        Some(PixelInfo {
            color: self.palette.get(usize::from(index)),
            priority: self.priority,
        })
    }
}
