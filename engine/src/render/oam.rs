// Nomenclature follows https://www.coranac.com/tonc/text/regobj.htm#sec-oam

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::render::affine::Affine;
use crate::render::color::Palette;
use crate::render::{
    AFFINE_COUNT, OBJ_PALETTE_SLOTS, PixelInfo, SCREEN_HEIGHT, SCREEN_WIDTH, SPRITE_COUNT,
    TILE_BYTES,
};

/// Sprite graphics memory per screen.
pub const OBJ_VRAM_SIZE: usize = 128 * 1024;

/// Allocation granularity of sprite graphics memory.
pub const OBJ_VRAM_UNIT: usize = 256;

#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjMode {
    Normal,
    Affine,
    #[default]
    Disabled,
    AffineDouble,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransformationKind {
    RotationScaling {
        affine_index: usize,
    },
    Flip {
        horizontal_flip: bool,
        vertical_flip: bool,
    },
}

impl Default for TransformationKind {
    fn default() -> Self {
        Self::Flip {
            horizontal_flip: false,
            vertical_flip: false,
        }
    }
}

/// A region of sprite graphics memory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VramBlock {
    pub offset: usize,
    pub len: usize,
}

/// One sprite attribute entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjEntry {
    /// Screen position of the top-left corner of the displayed area.
    pub x: i32,
    pub y: i32,
    /// Size of the graphics in pixels, one of the hardware size classes.
    pub width: usize,
    pub height: usize,
    pub mode: ObjMode,
    pub transformation: TransformationKind,
    pub priority: u8,
    pub palette_slot: usize,
    pub hidden: bool,
    pub gfx: Option<VramBlock>,
}

impl Default for ObjEntry {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            width: 8,
            height: 8,
            mode: ObjMode::Disabled,
            transformation: TransformationKind::default(),
            // Lowest priority
            priority: 3,
            palette_slot: 0,
            hidden: true,
            gfx: None,
        }
    }
}

impl ObjEntry {
    /// Size of the area the sprite covers on screen. Double size affine
    /// sprites cover twice their graphics size.
    pub const fn screen_size(&self) -> (usize, usize) {
        match self.mode {
            ObjMode::AffineDouble => (self.width * 2, self.height * 2),
            _ => (self.width, self.height),
        }
    }
}

/// First fit allocator over sprite graphics memory.
pub struct ObjVram {
    memory: Vec<u8>,
    used: Vec<bool>,
}

impl Default for ObjVram {
    fn default() -> Self {
        Self {
            memory: vec![0; OBJ_VRAM_SIZE],
            used: vec![false; OBJ_VRAM_SIZE / OBJ_VRAM_UNIT],
        }
    }
}

impl ObjVram {
    /// Reserves `len` bytes rounded up to whole units.
    pub fn allocate(&mut self, len: usize) -> Result<VramBlock> {
        let units = len.div_ceil(OBJ_VRAM_UNIT).max(1);

        let mut run = 0;
        for idx in 0..self.used.len() {
            if self.used[idx] {
                run = 0;
                continue;
            }
            run += 1;
            if run == units {
                let first = idx + 1 - units;
                self.used[first..=idx].fill(true);
                return Ok(VramBlock {
                    offset: first * OBJ_VRAM_UNIT,
                    len: units * OBJ_VRAM_UNIT,
                });
            }
        }

        Err(EngineError::exhausted(
            "sprite vram",
            units * OBJ_VRAM_UNIT,
            self.free_bytes(),
        ))
    }

    pub fn free(&mut self, block: VramBlock) {
        let first = block.offset / OBJ_VRAM_UNIT;
        let last = (first + block.len / OBJ_VRAM_UNIT).min(self.used.len());
        if let Some(units) = self.used.get_mut(first..last) {
            units.fill(false);
        }
    }

    pub fn free_bytes(&self) -> usize {
        self.used.iter().filter(|used| !**used).count() * OBJ_VRAM_UNIT
    }

    /// Writes `data` at the start of `block`, truncated to the block size.
    pub fn write(&mut self, block: VramBlock, data: &[u8]) {
        let len = data.len().min(block.len);
        if let Some(dest) = self.memory.get_mut(block.offset..block.offset + len) {
            dest.copy_from_slice(&data[..len]);
        }
    }

    pub fn read(&self, block: VramBlock) -> &[u8] {
        self.memory
            .get(block.offset..block.offset + block.len)
            .unwrap_or_default()
    }
}

/// Sprite attribute memory of one screen.
///
/// Writes land in a shadow copy; [`Oam::flush`] publishes them, the same
/// way a frame's attributes only become visible after the refresh.
/// Palettes and graphics memory are written directly.
pub struct Oam {
    shadow: [ObjEntry; SPRITE_COUNT],
    visible: [ObjEntry; SPRITE_COUNT],
    shadow_affine: [Affine; AFFINE_COUNT],
    visible_affine: [Affine; AFFINE_COUNT],
    palettes: Vec<Palette>,
    vram: ObjVram,
}

impl Default for Oam {
    fn default() -> Self {
        Self {
            shadow: [ObjEntry::default(); SPRITE_COUNT],
            visible: [ObjEntry::default(); SPRITE_COUNT],
            shadow_affine: [Affine::IDENTITY; AFFINE_COUNT],
            visible_affine: [Affine::IDENTITY; AFFINE_COUNT],
            palettes: vec![Palette::default(); OBJ_PALETTE_SLOTS],
            vram: ObjVram::default(),
        }
    }
}

impl Oam {
    pub fn set_entry(&mut self, index: usize, entry: ObjEntry) {
        if let Some(slot) = self.shadow.get_mut(index) {
            *slot = entry;
        }
    }

    /// Disables the entry at `index`.
    pub fn clear_entry(&mut self, index: usize) {
        self.set_entry(index, ObjEntry::default());
    }

    pub fn entry(&self, index: usize) -> Option<&ObjEntry> {
        self.shadow.get(index)
    }

    /// Entry as it was at the last flush.
    pub fn visible_entry(&self, index: usize) -> Option<&ObjEntry> {
        self.visible.get(index)
    }

    pub fn set_affine(&mut self, index: usize, matrix: Affine) {
        if let Some(slot) = self.shadow_affine.get_mut(index) {
            *slot = matrix;
        }
    }

    pub fn affine(&self, index: usize) -> Affine {
        self.shadow_affine.get(index).copied().unwrap_or_default()
    }

    pub fn upload_palette(&mut self, slot: usize, palette: &Palette) {
        if let Some(dest) = self.palettes.get_mut(slot) {
            dest.clone_from(palette);
        }
    }

    pub fn palette(&self, slot: usize) -> Option<&Palette> {
        self.palettes.get(slot)
    }

    pub const fn vram(&self) -> &ObjVram {
        &self.vram
    }

    pub const fn vram_mut(&mut self) -> &mut ObjVram {
        &mut self.vram
    }

    /// Publishes the shadow attributes.
    pub fn flush(&mut self) {
        self.visible = self.shadow;
        self.visible_affine = self.shadow_affine;
    }

    /// Renders every published sprite into `buffer` (one entry per screen
    /// pixel). Entries are drawn in index order and a later one replaces an
    /// earlier one unless the earlier has a strictly lower priority value.
    pub fn render_sprites(&self, buffer: &mut [Option<PixelInfo>]) {
        buffer.fill(None);

        for obj in &self.visible {
            if obj.hidden || matches!(obj.mode, ObjMode::Disabled) {
                continue;
            }
            let Some(block) = obj.gfx else {
                continue;
            };
            let Some(palette) = self.palettes.get(obj.palette_slot) else {
                continue;
            };
            let gfx = self.vram.read(block);
            let (screen_width, screen_height) = obj.screen_size();
            let mapping = self.mapping(obj);

            for sy in 0..screen_height {
                let y = obj.y + to_i32(sy);
                if y < 0 || y >= to_i32(SCREEN_HEIGHT) {
                    continue;
                }
                for sx in 0..screen_width {
                    let x = obj.x + to_i32(sx);
                    if x < 0 || x >= to_i32(SCREEN_WIDTH) {
                        continue;
                    }

                    let Some((tx, ty)) = texture_point(
                        mapping,
                        (obj.width, obj.height),
                        (screen_width, screen_height),
                        to_i32(sx),
                        to_i32(sy),
                    ) else {
                        continue;
                    };
                    let index = texel(gfx, obj.width, tx, ty);
                    if index == 0 {
                        continue;
                    }

                    #[allow(clippy::cast_sign_loss)]
                    let slot = &mut buffer[y as usize * SCREEN_WIDTH + x as usize];
                    if slot.is_some_and(|existing| existing.priority < obj.priority) {
                        continue;
                    }
                    *slot = Some(PixelInfo {
                        color: palette.get(usize::from(index)),
                        priority: obj.priority,
                    });
                }
            }
        }
    }

    fn mapping(&self, obj: &ObjEntry) -> TextureMapping {
        match obj.transformation {
            TransformationKind::RotationScaling { affine_index } => TextureMapping::Affine(
                self.visible_affine
                    .get(affine_index)
                    .copied()
                    .unwrap_or_default(),
            ),
            TransformationKind::Flip {
                horizontal_flip,
                vertical_flip,
            } => TextureMapping::Flip {
                horizontal: horizontal_flip,
                vertical: vertical_flip,
            },
        }
    }
}

/// How the displayed area of a sprite maps onto its graphics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextureMapping {
    Flip { horizontal: bool, vertical: bool },
    /// The matrix maps deltas from the center of the displayed area to
    /// deltas from the center of the graphics.
    Affine(Affine),
}

/// Maps pixel `(sx, sy)` of a displayed area of `area` pixels to a point of
/// graphics `size` pixels large. `None` when it falls outside either.
#[allow(clippy::cast_sign_loss)]
pub fn texture_point(
    mapping: TextureMapping,
    size: (usize, usize),
    area: (usize, usize),
    sx: i32,
    sy: i32,
) -> Option<(usize, usize)> {
    let (width, height) = (to_i32(size.0), to_i32(size.1));
    let (area_width, area_height) = (to_i32(area.0), to_i32(area.1));
    if !(0..area_width).contains(&sx) || !(0..area_height).contains(&sy) {
        return None;
    }

    let (tx, ty) = match mapping {
        TextureMapping::Affine(matrix) => {
            let (tx, ty) = matrix.apply(sx - area_width / 2, sy - area_height / 2);
            (tx + width / 2, ty + height / 2)
        }
        TextureMapping::Flip {
            horizontal,
            vertical,
        } => (
            if horizontal { width - 1 - sx } else { sx },
            if vertical { height - 1 - sy } else { sy },
        ),
    };

    ((0..width).contains(&tx) && (0..height).contains(&ty)).then(|| (tx as usize, ty as usize))
}

/// Palette index of pixel `(x, y)` in 8bpp graphics laid out as consecutive
/// 8x8 tiles, `width / 8` tiles per row rounded up. Missing data reads as
/// transparent.
pub fn texel(gfx: &[u8], width: usize, x: usize, y: usize) -> u8 {
    let tiles_per_row = width.div_ceil(8).max(1);
    let tile = (y / 8) * tiles_per_row + x / 8;
    gfx.get(tile * TILE_BYTES + (y % 8) * 8 + x % 8)
        .copied()
        .unwrap_or(0)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
const fn to_i32(value: usize) -> i32 {
    value as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::color::{Color, colors};
    use pretty_assertions::assert_eq;

    fn arrow_sprite(oam: &mut Oam) -> VramBlock {
        // 8x8 sprite, only the top-left pixel is opaque.
        let mut gfx = [0_u8; TILE_BYTES];
        gfx[0] = 1;
        let block = oam.vram_mut().allocate(TILE_BYTES).unwrap();
        oam.vram_mut().write(block, &gfx);
        oam.upload_palette(0, &Palette::from_words(&[0, colors::RED.0]));
        block
    }

    fn opaque_at(buffer: &[Option<PixelInfo>], x: usize, y: usize) -> Option<Color> {
        buffer[y * SCREEN_WIDTH + x].map(|p| p.color)
    }

    #[test]
    fn allocator_is_first_fit() {
        let mut vram = ObjVram::default();
        let a = vram.allocate(64 * 64).unwrap();
        let b = vram.allocate(100).unwrap();
        assert_eq!(a, VramBlock { offset: 0, len: 4096 });
        assert_eq!(b, VramBlock { offset: 4096, len: 256 });

        vram.free(a);
        let c = vram.allocate(512).unwrap();
        assert_eq!(c.offset, 0);
    }

    #[test]
    fn allocator_reports_exhaustion() {
        let mut vram = ObjVram::default();
        let _all = vram.allocate(OBJ_VRAM_SIZE).unwrap();
        let err = vram.allocate(1).unwrap_err();
        assert_eq!(
            err,
            EngineError::ResourceExhausted {
                what: "sprite vram",
                requested: 256,
                available: 0
            }
        );
    }

    #[test]
    fn writes_are_shadowed_until_flush() {
        let mut oam = Oam::default();
        let entry = ObjEntry {
            mode: ObjMode::Normal,
            hidden: false,
            ..ObjEntry::default()
        };
        oam.set_entry(5, entry);

        assert_eq!(oam.entry(5), Some(&entry));
        assert_eq!(oam.visible_entry(5), Some(&ObjEntry::default()));
        oam.flush();
        assert_eq!(oam.visible_entry(5), Some(&entry));
    }

    #[test]
    fn flips_mirror_the_graphics() {
        let mut oam = Oam::default();
        let block = arrow_sprite(&mut oam);
        oam.set_entry(
            0,
            ObjEntry {
                x: 10,
                y: 20,
                mode: ObjMode::Normal,
                hidden: false,
                gfx: Some(block),
                transformation: TransformationKind::Flip {
                    horizontal_flip: true,
                    vertical_flip: true,
                },
                ..ObjEntry::default()
            },
        );
        oam.flush();

        let mut buffer = vec![None; SCREEN_WIDTH * SCREEN_HEIGHT];
        oam.render_sprites(&mut buffer);
        assert_eq!(opaque_at(&buffer, 10, 20), None);
        assert_eq!(opaque_at(&buffer, 17, 27), Some(colors::RED));
    }

    #[test]
    fn double_size_affine_is_centered() {
        let mut oam = Oam::default();
        let block = arrow_sprite(&mut oam);
        oam.set_affine(0, Affine::IDENTITY);
        oam.set_entry(
            0,
            ObjEntry {
                x: 100,
                y: 100,
                mode: ObjMode::AffineDouble,
                hidden: false,
                gfx: Some(block),
                transformation: TransformationKind::RotationScaling { affine_index: 0 },
                ..ObjEntry::default()
            },
        );
        oam.flush();

        let mut buffer = vec![None; SCREEN_WIDTH * SCREEN_HEIGHT];
        oam.render_sprites(&mut buffer);
        // 16x16 area, the 8x8 graphics sit in its middle.
        assert_eq!(opaque_at(&buffer, 104, 104), Some(colors::RED));
        assert_eq!(
            buffer.iter().filter(|pixel| pixel.is_some()).count(),
            1
        );
    }

    #[test]
    fn offscreen_parts_are_clipped() {
        let mut oam = Oam::default();
        let block = arrow_sprite(&mut oam);
        oam.set_entry(
            0,
            ObjEntry {
                x: -4,
                y: 0,
                mode: ObjMode::Normal,
                hidden: false,
                gfx: Some(block),
                ..ObjEntry::default()
            },
        );
        oam.flush();

        let mut buffer = vec![None; SCREEN_WIDTH * SCREEN_HEIGHT];
        oam.render_sprites(&mut buffer);
        assert!(buffer.iter().all(Option::is_none));
    }

    #[test]
    fn texel_walks_tiles_row_major() {
        let mut gfx = vec![0_u8; TILE_BYTES * 4];
        // 16x16 sprite: tile 3 is the bottom-right one
        gfx[3 * TILE_BYTES + 9] = 5;
        assert_eq!(texel(&gfx, 16, 9, 9), 5);
        assert_eq!(texel(&gfx, 16, 1, 1), 0);
        assert_eq!(texel(&gfx, 16, 40, 40), 0);
    }

    #[test]
    fn partial_tile_columns_count_as_whole_tiles() {
        let mut gfx = vec![0_u8; TILE_BYTES * 4];
        // 12 pixels wide: 2 tiles per row, the second one half used
        gfx[TILE_BYTES + 3] = 6;
        gfx[2 * TILE_BYTES] = 7;
        assert_eq!(texel(&gfx, 12, 11, 0), 6);
        assert_eq!(texel(&gfx, 12, 0, 8), 7);
    }
}
