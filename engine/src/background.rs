//! # Background manager
//!
//! Owns the 2 screens x 4 layers of tiled backgrounds. A background can be
//! much larger than the screen; its map is stored as a sequence of 256x256
//! pixel blocks (1024 entries each), row major over the background:
//!
//! ```text
//!  width = 768, height = 512
//!  ┌─────┬─────┬─────┐
//!  │ B0  │ B1  │ B2  │    block (bx, by) starts at entry
//!  ├─────┼─────┼─────┤    (bx + by * (width >> 8)) << 10
//!  │ B3  │ B4  │ B5  │
//!  └─────┴─────┴─────┘
//! ```
//!
//! Only the 2x2 blocks around the scroll position live in the layer's map
//! page. Moving into a different block re-stages the page; scrolling inside
//! the same block only changes the fine scroll, which is committed on the
//! next [`BackgroundManager::update`].
//!
//! Each slot can also carry a collision map (map, tiles, palette) that is
//! never drawn and only answers tile/pixel queries.

use crate::bitwise::Bits;
use crate::clamp::{clamp_layer, normalize_screen};
use crate::error::{Result, try_copy};
use crate::geometry::{Point, Size};
use crate::render::bg_layer::{BLOCK_ENTRIES, BgLayer};
use crate::render::color::{Color, Palette, Rgb};
use crate::render::{LAYER_COUNT, SCREEN_COUNT, SCREEN_HEIGHT, SCREEN_WIDTH, TILE_BYTES};

const BLOCK_SHIFT: i32 = 8;

/// Half of a staged page: two horizontally adjacent blocks.
const HALF_PAGE: usize = BLOCK_ENTRIES * 2;

/// Handle to a background slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BackgroundId {
    pub screen: usize,
    pub layer: usize,
}

struct CollisionMap {
    size: Size,
    map: Vec<u16>,
    tiles: Vec<u8>,
    palette: Palette,
}

#[derive(Default)]
struct Background {
    active: bool,
    size: Size,
    /// Requested position after parallax, before clamping.
    position: Point<i32>,
    /// Clamped scroll position.
    scroll: Point<i32>,
    block: Point<i32>,
    pending_scroll: Point<i32>,
    parallax: Point<i32>,
    tiles: Vec<u8>,
    map: Vec<u16>,
    palette: Palette,
    grayscale_palette: Palette,
    use_grayscale: bool,
    collision: Option<CollisionMap>,
    page_stagings: u64,
}

pub struct BackgroundManager {
    slots: [[Background; LAYER_COUNT]; SCREEN_COUNT],
    layers: [[BgLayer; LAYER_COUNT]; SCREEN_COUNT],
}

impl Default for BackgroundManager {
    fn default() -> Self {
        Self {
            slots: std::array::from_fn(|_| std::array::from_fn(|_| Background::default())),
            layers: std::array::from_fn(|_| std::array::from_fn(|_| BgLayer::default())),
        }
    }
}

/// Applies a parallax exponent: negative shifts right, positive shifts left.
#[allow(clippy::cast_sign_loss)]
fn apply_parallax(value: i32, exponent: i32) -> i32 {
    let shift = exponent.unsigned_abs().min(31);
    match exponent.signum() {
        -1 => value >> shift,
        1 => value.wrapping_shl(shift),
        _ => value,
    }
}

/// Clamps one axis of a scroll position and splits it into the 256 pixel
/// block and the fine offset inside it.
fn clamp_axis(value: i32, size: i32, view: i32) -> (i32, i32, i32) {
    let max = (size - view).max(0);
    let clamped = value.clamp(0, max);
    let block = clamped >> BLOCK_SHIFT;
    (clamped, block, clamped - (block << BLOCK_SHIFT))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
const fn view_size() -> (i32, i32) {
    (SCREEN_WIDTH as i32, SCREEN_HEIGHT as i32)
}

/// First map entry of block `(bx, by)` in a background `width` pixels wide.
#[allow(clippy::cast_sign_loss)]
fn block_offset(bx: i32, by: i32, width: i32) -> usize {
    (((bx + by * (width >> BLOCK_SHIFT)) << 10).max(0)) as usize
}

impl BackgroundManager {
    fn slot(&self, screen: i32, layer: i32) -> &Background {
        &self.slots[normalize_screen(screen)][clamp_layer(layer)]
    }

    fn parts_mut(&mut self, screen: i32, layer: i32) -> (&mut Background, &mut BgLayer) {
        let (screen, layer) = (normalize_screen(screen), clamp_layer(layer));
        (
            &mut self.slots[screen][layer],
            &mut self.layers[screen][layer],
        )
    }

    /// Activates a background and shows its layer with priority equal to the
    /// layer number. Creating an active background changes nothing.
    #[allow(clippy::cast_possible_truncation)]
    pub fn create(&mut self, screen: i32, layer: i32, width: i32, height: i32) -> BackgroundId {
        let id = BackgroundId {
            screen: normalize_screen(screen),
            layer: clamp_layer(layer),
        };
        let (slot, hardware) = self.parts_mut(screen, layer);
        if slot.active {
            return id;
        }

        *slot = Background {
            active: true,
            size: Size::new(width, height),
            ..Background::default()
        };
        slot.grayscale_palette = slot.palette.to_grayscale();

        hardware.reset();
        hardware.set_priority(id.layer as u8);
        hardware.set_visible(true);

        tracing::debug!(
            "background {}/{} created ({width}x{height})",
            id.screen,
            id.layer
        );
        id
    }

    /// Releases every buffer of the slot, the collision map included, and
    /// hides its layer.
    pub fn delete(&mut self, screen: i32, layer: i32) {
        let (slot, hardware) = self.parts_mut(screen, layer);
        if !slot.active {
            return;
        }
        *slot = Background::default();
        hardware.reset();
        tracing::debug!("background {screen}/{layer} deleted");
    }

    pub fn is_active(&self, screen: i32, layer: i32) -> bool {
        self.slot(screen, layer).active
    }

    /// Replaces the tile set. On failure the previous tiles stay in place.
    pub fn set_tiles(&mut self, screen: i32, layer: i32, tiles: &[u8]) -> Result<()> {
        let (slot, hardware) = self.parts_mut(screen, layer);
        let staged = try_copy("background tiles", tiles)?;
        hardware.upload_tiles(&staged).inspect_err(|err| {
            tracing::warn!("background {screen}/{layer}: {err}");
        })?;
        slot.tiles = staged;
        Ok(())
    }

    /// Replaces the map and stages the page of the current block.
    pub fn set_map(&mut self, screen: i32, layer: i32, map: &[u16]) -> Result<()> {
        let (slot, hardware) = self.parts_mut(screen, layer);
        slot.map = try_copy("background map", map)?;
        stage_page(slot, hardware);
        Ok(())
    }

    /// Replaces the palette, derives its gray version and pushes the one the
    /// grayscale flag selects.
    pub fn set_palette(&mut self, screen: i32, layer: i32, palette: &[u16]) {
        let (slot, hardware) = self.parts_mut(screen, layer);
        slot.palette = Palette::from_words(palette);
        refresh_palette(slot, hardware);
    }

    /// Changes a single palette entry. Channels are 8-bit.
    pub fn set_palette_color(&mut self, screen: i32, layer: i32, index: usize, color: Rgb) {
        let (slot, hardware) = self.parts_mut(screen, layer);
        slot.palette.set(index, Color::from(color));
        refresh_palette(slot, hardware);
    }

    pub fn set_use_grayscale(&mut self, screen: i32, layer: i32, use_grayscale: bool) {
        let (slot, hardware) = self.parts_mut(screen, layer);
        slot.use_grayscale = use_grayscale;
        refresh_palette(slot, hardware);
    }

    pub fn uses_grayscale(&self, screen: i32, layer: i32) -> bool {
        self.slot(screen, layer).use_grayscale
    }

    pub fn palette(&self, screen: i32, layer: i32) -> &Palette {
        &self.slot(screen, layer).palette
    }

    pub fn grayscale_palette(&self, screen: i32, layer: i32) -> &Palette {
        &self.slot(screen, layer).grayscale_palette
    }

    pub fn tiles(&self, screen: i32, layer: i32) -> &[u8] {
        &self.slot(screen, layer).tiles
    }

    pub fn map(&self, screen: i32, layer: i32) -> &[u16] {
        &self.slot(screen, layer).map
    }

    /// Scrolls the background.
    ///
    /// The parallax exponents are applied first, then the position is clamped
    /// so the 256x192 view stays inside the background. The map page is
    /// re-staged only when the clamped position falls in a different block.
    pub fn set_position(&mut self, screen: i32, layer: i32, x: i32, y: i32) {
        let (slot, hardware) = self.parts_mut(screen, layer);

        let x = apply_parallax(x, slot.parallax.x);
        let y = apply_parallax(y, slot.parallax.y);
        slot.position = Point::new(x, y);

        let (view_width, view_height) = view_size();
        let (clamped_x, block_x, fine_x) = clamp_axis(x, slot.size.width, view_width);
        let (clamped_y, block_y, fine_y) = clamp_axis(y, slot.size.height, view_height);
        slot.scroll = Point::new(clamped_x, clamped_y);

        let block = Point::new(block_x, block_y);
        if block != slot.block {
            slot.block = block;
            stage_page(slot, hardware);
        }

        slot.pending_scroll = Point::new(fine_x, fine_y);
    }

    /// Position as requested, after parallax.
    pub fn position(&self, screen: i32, layer: i32) -> Point<i32> {
        self.slot(screen, layer).position
    }

    /// Effective scroll position after clamping.
    pub fn scroll(&self, screen: i32, layer: i32) -> Point<i32> {
        self.slot(screen, layer).scroll
    }

    /// Block currently staged in the layer's map page.
    pub fn block(&self, screen: i32, layer: i32) -> Point<i32> {
        self.slot(screen, layer).block
    }

    /// How many times the map page of this slot was staged.
    pub fn page_stagings(&self, screen: i32, layer: i32) -> u64 {
        self.slot(screen, layer).page_stagings
    }

    pub fn set_parallax_speeds(&mut self, screen: i32, layer: i32, x: i32, y: i32) {
        let (slot, _) = self.parts_mut(screen, layer);
        slot.parallax = Point::new(x, y);
    }

    pub fn parallax_speed_x(&self, screen: i32, layer: i32) -> i32 {
        self.slot(screen, layer).parallax.x
    }

    pub fn parallax_speed_y(&self, screen: i32, layer: i32) -> i32 {
        self.slot(screen, layer).parallax.y
    }

    pub fn size(&self, screen: i32, layer: i32) -> Size {
        self.slot(screen, layer).size
    }

    /// Installs the query-only collision map of a slot.
    pub fn set_collision_map(
        &mut self,
        screen: i32,
        layer: i32,
        size: Size,
        map: &[u16],
        tiles: &[u8],
        palette: &[u16],
    ) -> Result<()> {
        let collision = CollisionMap {
            size,
            map: try_copy("collision map", map)?,
            tiles: try_copy("collision tiles", tiles)?,
            palette: Palette::from_words(palette),
        };
        let (slot, _) = self.parts_mut(screen, layer);
        slot.collision = Some(collision);
        Ok(())
    }

    pub fn delete_collision_map(&mut self, screen: i32, layer: i32) {
        let (slot, _) = self.parts_mut(screen, layer);
        slot.collision = None;
    }

    pub fn has_collision_map(&self, screen: i32, layer: i32) -> bool {
        self.slot(screen, layer).collision.is_some()
    }

    /// Tile number under pixel `(x, y)` of the collision map, 0 when the
    /// point is outside it or there is no collision map.
    pub fn tile_index(&self, screen: i32, layer: i32, x: i32, y: i32) -> u16 {
        self.slot(screen, layer)
            .collision
            .as_ref()
            .map_or(0, |collision| collision.tile_index(x, y))
    }

    /// Palette index of pixel `(x, y)` of the collision map.
    pub fn palette_index(&self, screen: i32, layer: i32, x: i32, y: i32) -> u8 {
        self.slot(screen, layer)
            .collision
            .as_ref()
            .map_or(0, |collision| collision.palette_index(x, y))
    }

    /// Color of pixel `(x, y)` of the collision map.
    pub fn pixel_color(&self, screen: i32, layer: i32, x: i32, y: i32) -> Color {
        self.slot(screen, layer)
            .collision
            .as_ref()
            .map_or_else(Color::default, |collision| collision.pixel_color(x, y))
    }

    /// Commits pending scroll values to the layers. Called once per tick.
    pub fn update(&mut self) {
        for (slots, layers) in self.slots.iter().zip(self.layers.iter_mut()) {
            for (slot, hardware) in slots.iter().zip(layers.iter_mut()) {
                if slot.active {
                    hardware.set_scroll(slot.pending_scroll);
                }
            }
        }
    }

    /// Layer hardware of `screen`, for the compositor.
    pub fn layers(&self, screen: usize) -> &[BgLayer; LAYER_COUNT] {
        &self.layers[screen.min(SCREEN_COUNT - 1)]
    }
}

fn refresh_palette(slot: &mut Background, hardware: &mut BgLayer) {
    slot.grayscale_palette = slot.palette.to_grayscale();
    if slot.use_grayscale {
        hardware.upload_palette(&slot.grayscale_palette);
    } else {
        hardware.upload_palette(&slot.palette);
    }
}

/// Copies the 2x2 blocks starting at the slot's current block into the
/// layer's map page: the top pair first, then the pair one block row below.
fn stage_page(slot: &mut Background, hardware: &mut BgLayer) {
    let width = slot.size.width;
    let top = block_offset(slot.block.x, slot.block.y, width);
    let bottom = top + block_offset(0, 1, width);

    hardware.stage_map(0, HALF_PAGE, map_slice(&slot.map, top));
    hardware.stage_map(HALF_PAGE, HALF_PAGE, map_slice(&slot.map, bottom));
    slot.page_stagings += 1;

    tracing::trace!(
        "staged block ({}, {}) from entries {top} and {bottom}",
        slot.block.x,
        slot.block.y
    );
}

fn map_slice(map: &[u16], start: usize) -> &[u16] {
    let end = (start + HALF_PAGE).min(map.len());
    map.get(start..end).unwrap_or_default()
}

impl CollisionMap {
    #[allow(clippy::cast_sign_loss)]
    fn tile_index(&self, x: i32, y: i32) -> u16 {
        if x < 0 || y < 0 || x >= self.size.width || y >= self.size.height {
            return 0;
        }

        let (block_x, block_y) = (x >> BLOCK_SHIFT, y >> BLOCK_SHIFT);
        let (inner_x, inner_y) = (x - (block_x << BLOCK_SHIFT), y - (block_y << BLOCK_SHIFT));
        let entry = block_offset(block_x, block_y, self.size.width)
            + ((inner_x >> 3) + (inner_y >> 3) * 32) as usize;

        self.map
            .get(entry)
            .map_or(0, |entry| entry.get_bits(0..=9))
    }

    #[allow(clippy::cast_sign_loss)]
    fn palette_index(&self, x: i32, y: i32) -> u8 {
        if x < 0 || y < 0 || x >= self.size.width || y >= self.size.height {
            return 0;
        }
        let tile = usize::from(self.tile_index(x, y));
        let pixel = (x % 8 + (y % 8) * 8) as usize;
        self.tiles.get(tile * TILE_BYTES + pixel).copied().unwrap_or(0)
    }

    fn pixel_color(&self, x: i32, y: i32) -> Color {
        if x < 0 || y < 0 || x >= self.size.width || y >= self.size.height {
            return Color::default();
        }
        self.palette.get(usize::from(self.palette_index(x, y)))
    }
}
