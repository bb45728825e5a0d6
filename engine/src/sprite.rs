//! # Sprite manager
//!
//! Owns 2 screens x 128 sprite slots. Every public entry point first runs its
//! screen and index through [`normalize_screen`] and [`clamp_sprite_index`],
//! so out of range values address the nearest slot.
//!
//! ## Rectangles
//!
//! Each sprite carries three rectangles that are set independently:
//!
//! | Rectangle | Meaning                                                   |
//! |-----------|-----------------------------------------------------------|
//! | bounding  | hardware size class (8/16/32/64/128 per axis) + position  |
//! | source    | real size of the artwork, defines the frame stride        |
//! | collision | hit region, starts as the source size                     |
//!
//! ## Ownership
//!
//! A sprite created from data owns its pixels and palette. A copy only
//! refers to the slot that owns them:
//!
//! ```text
//!  slot (0, 0)  Owned(pixels) ◄────┐
//!  slot (0, 5)  Aliased(0, 0, gen) ┘   copies of copies point at the owner
//! ```
//!
//! The reference carries the owner's generation. When the owner is deleted
//! or re-created the reference no longer resolves and the copy draws nothing.
//! Deleting a copy never touches the owner.
//!
//! ## Frames
//!
//! Pixels are 8bpp, laid out as consecutive 8x8 tiles, `width / 8` tiles per
//! row rounded up. Frame `n` starts at byte `n * width * height` of the pixel buffer.
//! Drawing copies the current frame into the sprite's video memory, with
//! tile rows re-laid out from the source width to the bounding width.

use crate::clamp::{clamp_sprite_index, normalize_screen};
use crate::error::{Result, try_copy};
use crate::geometry::{Point, Rect, Side, Size, collision_side};
use crate::render::affine::Affine;
use crate::render::color::{Palette, Rgb};
use crate::render::oam::{
    ObjEntry, ObjMode, Oam, TextureMapping, TransformationKind, VramBlock, texel, texture_point,
};
use crate::render::{AFFINE_COUNT, OBJ_PALETTE_SLOTS, SCREEN_COUNT, SPRITE_COUNT, TILE_BYTES};

/// Hardware sprite sizes per axis.
const SIZE_CLASSES: [i32; 5] = [8, 16, 32, 64, 128];

/// Smallest size class holding `value` pixels. Values above 128 clamp to 128.
pub fn size_class(value: i32) -> i32 {
    SIZE_CLASSES
        .into_iter()
        .find(|class| *class >= value)
        .unwrap_or(128)
}

/// Handle to a sprite slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SpriteId {
    pub screen: usize,
    pub index: usize,
}

impl SpriteId {
    pub const fn new(screen: i32, index: i32) -> Self {
        Self {
            screen: normalize_screen(screen),
            index: clamp_sprite_index(index),
        }
    }
}

/// Rotation applied when drawing: the matrix slot it occupies and the angle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rotation {
    pub rotation_index: usize,
    pub degrees: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct SlotRef {
    screen: usize,
    index: usize,
    generation: u64,
}

enum Ownership<T> {
    Owned(T),
    Aliased(SlotRef),
}

#[derive(Default)]
struct Sprite {
    active: bool,
    is_copy: bool,
    generation: u64,
    palette_slot: usize,
    bounding: Rect,
    source: Rect,
    collision: Rect,
    frame: usize,
    layer: u8,
    rotation: Option<Rotation>,
    hflip: bool,
    vflip: bool,
    visible: bool,
    use_grayscale: bool,
    pixels: Option<Ownership<Vec<u8>>>,
    palette: Option<Ownership<Palette>>,
    grayscale_palette: Palette,
    gfx: Option<VramBlock>,
    scratch: Vec<u8>,
}

type Slots = [Vec<Sprite>; SCREEN_COUNT];

pub struct SpriteManager {
    slots: Slots,
    oams: [Oam; SCREEN_COUNT],
    next_generation: u64,
}

impl Default for SpriteManager {
    fn default() -> Self {
        Self {
            slots: std::array::from_fn(|_| {
                std::iter::repeat_with(Sprite::default)
                    .take(SPRITE_COUNT)
                    .collect()
            }),
            oams: std::array::from_fn(|_| Oam::default()),
            next_generation: 0,
        }
    }
}

fn resolve_pixels<'a>(slots: &'a Slots, sprite: &'a Sprite) -> Option<&'a [u8]> {
    match sprite.pixels.as_ref()? {
        Ownership::Owned(pixels) => Some(pixels),
        Ownership::Aliased(owner) => match owner_of(slots, *owner)?.pixels.as_ref()? {
            Ownership::Owned(pixels) => Some(pixels),
            Ownership::Aliased(_) => None,
        },
    }
}

fn resolve_palette<'a>(slots: &'a Slots, sprite: &'a Sprite) -> Option<&'a Palette> {
    match sprite.palette.as_ref()? {
        Ownership::Owned(palette) => Some(palette),
        Ownership::Aliased(owner) => match owner_of(slots, *owner)?.palette.as_ref()? {
            Ownership::Owned(palette) => Some(palette),
            Ownership::Aliased(_) => None,
        },
    }
}

fn owner_of(slots: &Slots, owner: SlotRef) -> Option<&Sprite> {
    slots[owner.screen]
        .get(owner.index)
        .filter(|sprite| sprite.active && sprite.generation == owner.generation)
}

#[allow(clippy::cast_sign_loss)]
const fn to_usize(value: i32) -> usize {
    if value < 0 { 0 } else { value as usize }
}

impl SpriteManager {
    fn sprite(&self, id: SpriteId) -> &Sprite {
        &self.slots[id.screen][id.index]
    }

    fn sprite_mut(&mut self, id: SpriteId) -> &mut Sprite {
        &mut self.slots[id.screen][id.index]
    }

    fn bump_generation(&mut self) -> u64 {
        self.next_generation += 1;
        self.next_generation
    }

    /// Loads a sprite from 8bpp tiled `pixels` and a palette.
    ///
    /// Nothing happens when the slot is already active. If video memory for
    /// the bounding size can't be reserved the slot stays inactive.
    #[allow(clippy::too_many_arguments)]
    pub fn create(
        &mut self,
        screen: i32,
        index: i32,
        palette_slot: usize,
        pixels: &[u8],
        palette: &[u16],
        width: i32,
        height: i32,
    ) -> Result<SpriteId> {
        let id = SpriteId::new(screen, index);
        if self.sprite(id).active {
            return Ok(id);
        }

        let bounding = Size::new(size_class(width), size_class(height));
        let owned_pixels = try_copy("sprite pixels", pixels)?;
        let gfx = self.oams[id.screen]
            .vram_mut()
            .allocate(bounding.area().unwrap_or_default())
            .inspect_err(|err| {
                tracing::warn!("sprite {}/{}: {err}", id.screen, id.index);
            })?;

        let generation = self.bump_generation();
        let palette = Palette::from_words(palette);
        *self.sprite_mut(id) = Sprite {
            active: true,
            generation,
            palette_slot: palette_slot.min(OBJ_PALETTE_SLOTS - 1),
            bounding: Rect {
                position: Point::default(),
                size: bounding,
            },
            source: Rect::new(0, 0, width, height),
            collision: Rect::new(0, 0, width, height),
            visible: true,
            grayscale_palette: palette.to_grayscale(),
            pixels: Some(Ownership::Owned(owned_pixels)),
            palette: Some(Ownership::Owned(palette)),
            gfx: Some(gfx),
            ..Sprite::default()
        };
        self.upload_palette(id);

        tracing::debug!(
            "sprite {}/{} created: {width}x{height} in {}x{}",
            id.screen,
            id.index,
            bounding.width,
            bounding.height
        );
        Ok(id)
    }

    /// Makes slot `(screen, index)` show the artwork of `(src_screen,
    /// src_index)` without copying it.
    ///
    /// Nothing happens when the destination is active or the source isn't.
    pub fn copy(
        &mut self,
        screen: i32,
        index: i32,
        palette_slot: usize,
        src_screen: i32,
        src_index: i32,
    ) -> Result<SpriteId> {
        let id = SpriteId::new(screen, index);
        let src = SpriteId::new(src_screen, src_index);
        if self.sprite(id).active {
            return Ok(id);
        }

        let source = self.sprite(src);
        if !source.active {
            tracing::debug!(
                "sprite {}/{}: copy source {}/{} is inactive",
                id.screen,
                id.index,
                src.screen,
                src.index
            );
            return Ok(id);
        }

        let direct = SlotRef {
            screen: src.screen,
            index: src.index,
            generation: source.generation,
        };
        let pixels_owner = match &source.pixels {
            Some(Ownership::Aliased(owner)) => *owner,
            _ => direct,
        };
        let palette_owner = match &source.palette {
            Some(Ownership::Aliased(owner)) => *owner,
            _ => direct,
        };
        let grayscale_palette = resolve_palette(&self.slots, source)
            .map(Palette::to_grayscale)
            .unwrap_or_default();
        let (bounding, source_box, collision) =
            (source.bounding.size, source.source.size, source.collision.size);

        let gfx = self.oams[id.screen]
            .vram_mut()
            .allocate(bounding.area().unwrap_or_default())?;

        let generation = self.bump_generation();
        *self.sprite_mut(id) = Sprite {
            active: true,
            is_copy: true,
            generation,
            palette_slot: palette_slot.min(OBJ_PALETTE_SLOTS - 1),
            bounding: Rect {
                position: Point::default(),
                size: bounding,
            },
            source: Rect {
                position: Point::default(),
                size: source_box,
            },
            collision: Rect {
                position: Point::default(),
                size: collision,
            },
            visible: true,
            grayscale_palette,
            pixels: Some(Ownership::Aliased(pixels_owner)),
            palette: Some(Ownership::Aliased(palette_owner)),
            gfx: Some(gfx),
            ..Sprite::default()
        };
        self.upload_palette(id);

        tracing::debug!(
            "sprite {}/{} copies {}/{}",
            id.screen,
            id.index,
            pixels_owner.screen,
            pixels_owner.index
        );
        Ok(id)
    }

    /// Deactivates a sprite. Owned buffers are dropped, aliases are only
    /// forgotten. Its video memory is released and its attribute entry
    /// cleared.
    pub fn delete(&mut self, screen: i32, index: i32) {
        let id = SpriteId::new(screen, index);
        let sprite = self.sprite_mut(id);
        if !sprite.active {
            return;
        }

        let gfx = sprite.gfx.take();
        *sprite = Sprite::default();
        if let Some(block) = gfx {
            self.oams[id.screen].vram_mut().free(block);
        }
        self.oams[id.screen].clear_entry(id.index);
        tracing::debug!("sprite {}/{} deleted", id.screen, id.index);
    }

    /// Drops the palette of an active sprite, leaving the rest in place.
    pub fn delete_palette(&mut self, screen: i32, index: i32) {
        let sprite = self.sprite_mut(SpriteId::new(screen, index));
        if sprite.active {
            sprite.palette = None;
        }
    }

    /// Replaces the pixels of a sprite that owns them. Copies of it see the
    /// new artwork on their next draw.
    pub fn set_pixels(&mut self, screen: i32, index: i32, pixels: &[u8]) -> Result<()> {
        let id = SpriteId::new(screen, index);
        let sprite = self.sprite_mut(id);
        if !sprite.active {
            return Ok(());
        }
        match &mut sprite.pixels {
            Some(Ownership::Owned(owned)) => {
                *owned = try_copy("sprite pixels", pixels)?;
            }
            _ => tracing::debug!(
                "sprite {}/{} doesn't own its pixels, ignoring new data",
                id.screen,
                id.index
            ),
        }
        Ok(())
    }

    pub fn is_active(&self, screen: i32, index: i32) -> bool {
        self.sprite(SpriteId::new(screen, index)).active
    }

    pub fn is_copy(&self, screen: i32, index: i32) -> bool {
        self.sprite(SpriteId::new(screen, index)).is_copy
    }

    /// Pixels the sprite draws from, following aliases.
    pub fn pixels(&self, screen: i32, index: i32) -> Option<&[u8]> {
        resolve_pixels(&self.slots, self.sprite(SpriteId::new(screen, index)))
    }

    /// Palette the sprite draws with, following aliases.
    pub fn palette(&self, screen: i32, index: i32) -> Option<&Palette> {
        resolve_palette(&self.slots, self.sprite(SpriteId::new(screen, index)))
    }

    pub fn bounding_box(&self, screen: i32, index: i32) -> Rect {
        self.sprite(SpriteId::new(screen, index)).bounding
    }

    pub fn source_box(&self, screen: i32, index: i32) -> Rect {
        self.sprite(SpriteId::new(screen, index)).source
    }

    pub fn collision_box(&self, screen: i32, index: i32) -> Rect {
        self.sprite(SpriteId::new(screen, index)).collision
    }

    pub fn set_source_box(&mut self, screen: i32, index: i32, rect: Rect) {
        self.sprite_mut(SpriteId::new(screen, index)).source = rect;
    }

    pub fn set_collision_box(&mut self, screen: i32, index: i32, rect: Rect) {
        self.sprite_mut(SpriteId::new(screen, index)).collision = rect;
    }

    /// Collision box in screen space: its position is an offset from the
    /// sprite position.
    pub fn hitbox(&self, screen: i32, index: i32) -> Rect {
        self.hitbox_of(SpriteId::new(screen, index))
    }

    fn hitbox_of(&self, id: SpriteId) -> Rect {
        let sprite = self.sprite(id);
        Rect {
            position: sprite.bounding.position + sprite.collision.position,
            size: sprite.collision.size,
        }
    }

    pub fn set_x(&mut self, screen: i32, index: i32, x: i32) {
        self.sprite_mut(SpriteId::new(screen, index))
            .bounding
            .position
            .x = x;
    }

    pub fn set_y(&mut self, screen: i32, index: i32, y: i32) {
        self.sprite_mut(SpriteId::new(screen, index))
            .bounding
            .position
            .y = y;
    }

    pub fn set_xy(&mut self, screen: i32, index: i32, x: i32, y: i32) {
        self.set_x(screen, index, x);
        self.set_y(screen, index, y);
    }

    /// Sets the drawing priority (0-3, lower is in front).
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn set_layer(&mut self, screen: i32, index: i32, layer: i32) {
        self.sprite_mut(SpriteId::new(screen, index)).layer = layer.clamp(0, 3) as u8;
    }

    pub fn layer(&self, screen: i32, index: i32) -> u8 {
        self.sprite(SpriteId::new(screen, index)).layer
    }

    pub fn set_frame(&mut self, screen: i32, index: i32, frame: usize) {
        self.sprite_mut(SpriteId::new(screen, index)).frame = frame;
    }

    pub fn frame(&self, screen: i32, index: i32) -> usize {
        self.sprite(SpriteId::new(screen, index)).frame
    }

    /// Rotates the sprite around its center using rotation matrix
    /// `rotation_index`. Sprites rotated at the same time need distinct
    /// matrices.
    pub fn set_angle(&mut self, screen: i32, index: i32, rotation_index: usize, degrees: i32) {
        self.sprite_mut(SpriteId::new(screen, index)).rotation = Some(Rotation {
            rotation_index: rotation_index.min(AFFINE_COUNT - 1),
            degrees,
        });
    }

    pub fn clear_angle(&mut self, screen: i32, index: i32) {
        self.sprite_mut(SpriteId::new(screen, index)).rotation = None;
    }

    pub fn angle(&self, screen: i32, index: i32) -> Option<Rotation> {
        self.sprite(SpriteId::new(screen, index)).rotation
    }

    pub fn set_hflip(&mut self, screen: i32, index: i32, flip: bool) {
        self.sprite_mut(SpriteId::new(screen, index)).hflip = flip;
    }

    pub fn hflip(&self, screen: i32, index: i32) -> bool {
        self.sprite(SpriteId::new(screen, index)).hflip
    }

    pub fn set_vflip(&mut self, screen: i32, index: i32, flip: bool) {
        self.sprite_mut(SpriteId::new(screen, index)).vflip = flip;
    }

    pub fn vflip(&self, screen: i32, index: i32) -> bool {
        self.sprite(SpriteId::new(screen, index)).vflip
    }

    pub fn set_visible(&mut self, screen: i32, index: i32, visible: bool) {
        self.sprite_mut(SpriteId::new(screen, index)).visible = visible;
    }

    pub fn is_visible(&self, screen: i32, index: i32) -> bool {
        self.sprite(SpriteId::new(screen, index)).visible
    }

    /// Re-derives the gray palette from the current palette, stores the flag
    /// and uploads the selected palette.
    pub fn set_use_grayscale(&mut self, screen: i32, index: i32, use_grayscale: bool) {
        let id = SpriteId::new(screen, index);
        let grayscale = resolve_palette(&self.slots, self.sprite(id)).map(Palette::to_grayscale);

        let sprite = self.sprite_mut(id);
        if let Some(grayscale) = grayscale {
            sprite.grayscale_palette = grayscale;
        }
        sprite.use_grayscale = use_grayscale;

        if sprite.active {
            self.upload_palette(id);
        }
    }

    pub fn uses_grayscale(&self, screen: i32, index: i32) -> bool {
        self.sprite(SpriteId::new(screen, index)).use_grayscale
    }

    fn upload_palette(&mut self, id: SpriteId) {
        let sprite = &self.slots[id.screen][id.index];
        let palette = if sprite.use_grayscale {
            Some(&sprite.grayscale_palette)
        } else {
            resolve_palette(&self.slots, sprite)
        };
        if let Some(palette) = palette {
            self.oams[id.screen].upload_palette(sprite.palette_slot, palette);
        }
    }

    /// Strict containment of `(x, y)` in the bounding box of an active
    /// sprite. Points on the edges don't touch.
    pub fn is_touching_point(&self, screen: i32, index: i32, x: i32, y: i32) -> bool {
        let sprite = self.sprite(SpriteId::new(screen, index));
        sprite.active && sprite.bounding.contains_strict(x, y)
    }

    /// Coarse circle test: samples `(x, y)`, `(x + r, y)`, `(x, y + r)` and
    /// `(x + r, y + r)` against the bounding box and reports a hit when any
    /// of them is strictly inside.
    pub fn is_touching_circle(&self, screen: i32, index: i32, x: i32, y: i32, radius: i32) -> bool {
        let sprite = self.sprite(SpriteId::new(screen, index));
        let (far_x, far_y) = (x.saturating_add(radius), y.saturating_add(radius));
        let corners = [(x, y), (far_x, y), (x, far_y), (far_x, far_y)];
        sprite.active
            && corners
                .into_iter()
                .any(|(cx, cy)| sprite.bounding.contains_strict(cx, cy))
    }

    /// Overlap of the bounding boxes of two active sprites.
    pub fn intersection(&self, a: SpriteId, b: SpriteId) -> Option<Rect> {
        let (first, second) = (self.sprite(a), self.sprite(b));
        if !first.active || !second.active {
            return None;
        }
        first.bounding.intersection(&second.bounding)
    }

    /// Hitbox overlap test between two active sprites. Each hitbox is the
    /// collision box offset by the sprite position.
    pub fn overlaps(&self, a: SpriteId, b: SpriteId) -> bool {
        self.sprite(a).active
            && self.sprite(b).active
            && self.hitbox_of(a).intersection(&self.hitbox_of(b)).is_some()
    }

    /// Pixel perfect overlap: the first point, row by row, inside both
    /// bounding boxes where both sprites have an opaque pixel.
    pub fn pixel_collision(&self, a: SpriteId, b: SpriteId) -> Option<Point<i32>> {
        let overlap = self.intersection(a, b)?;
        let (first, second) = (self.sprite(a), self.sprite(b));

        for y in overlap.top()..overlap.bottom() {
            for x in overlap.left()..overlap.right() {
                if self.is_opaque(first, x, y) && self.is_opaque(second, x, y) {
                    return Some(Point::new(x, y));
                }
            }
        }
        None
    }

    /// Side of sprite `a` that sprite `b` hits, judged on bounding boxes.
    pub fn collision_side(&self, a: SpriteId, b: SpriteId) -> Side {
        let (first, second) = (self.sprite(a), self.sprite(b));
        if !first.active || !second.active {
            return Side::NoCollision;
        }
        collision_side(&first.bounding, &second.bounding)
    }

    /// Whether the sprite draws a non transparent pixel at screen point
    /// `(x, y)`. Follows the same mapping as the compositor, so flips mirror
    /// across the bounding box and rotations turn around its center.
    fn is_opaque(&self, sprite: &Sprite, x: i32, y: i32) -> bool {
        if !sprite.active {
            return false;
        }
        let size = sprite.bounding.size;
        let graphics = (to_usize(size.width), to_usize(size.height));
        let (mapping, area) = match sprite.rotation {
            Some(rotation) => (
                TextureMapping::Affine(Affine::rotation(rotation.degrees)),
                (graphics.0 * 2, graphics.1 * 2),
            ),
            None => (
                TextureMapping::Flip {
                    horizontal: sprite.hflip,
                    vertical: sprite.vflip,
                },
                graphics,
            ),
        };

        let local = Point::new(x, y) - display_origin(sprite);
        texture_point(mapping, graphics, area, local.x, local.y)
            .and_then(|(tx, ty)| frame_texel(&self.slots, sprite, tx, ty))
            .is_some_and(|index| index != 0)
    }

    /// Palette index at `(x, y)` of the current frame in source space,
    /// rotated back around the source center when the sprite is rotated.
    fn palette_index(&self, sprite: &Sprite, x: i32, y: i32) -> Option<u8> {
        let size = sprite.source.size;
        if !sprite.active || x < 0 || y < 0 || x >= size.width || y >= size.height {
            return None;
        }

        let (x, y) = match sprite.rotation {
            Some(rotation) => {
                let (center_x, center_y) = (size.width / 2, size.height / 2);
                let (tx, ty) = Affine::rotation(rotation.degrees).apply(x - center_x, y - center_y);
                (tx + center_x, ty + center_y)
            }
            None => (x, y),
        };
        if x < 0 || y < 0 || x >= size.width || y >= size.height {
            return None;
        }
        frame_texel(&self.slots, sprite, to_usize(x), to_usize(y))
    }

    /// Color of source pixel `(x, y)` of the current frame, transparent
    /// pixels included. `None` outside the source box or without data.
    pub fn pixel(&self, screen: i32, index: i32, x: i32, y: i32) -> Option<Rgb> {
        let sprite = self.sprite(SpriteId::new(screen, index));
        let index = self.palette_index(sprite, x, y)?;
        let palette = resolve_palette(&self.slots, sprite)?;
        Some(Rgb::from(palette.get(usize::from(index))))
    }

    /// Commits an active sprite to its screen: current frame into video
    /// memory, attributes into the shadow attribute table.
    ///
    /// Rotated sprites are drawn double size and shifted by half their
    /// bounding box so they turn around their center.
    pub fn draw(&mut self, screen: i32, index: i32) {
        let id = SpriteId::new(screen, index);
        let sprite = &self.slots[id.screen][id.index];
        let (true, Some(gfx)) = (sprite.active, sprite.gfx) else {
            return;
        };
        let mut scratch = std::mem::take(&mut self.slots[id.screen][id.index].scratch);
        let sprite = &self.slots[id.screen][id.index];

        let bounding = sprite.bounding;
        let origin = display_origin(sprite);
        let frame = current_frame(&self.slots, sprite).unwrap_or_default();
        relayout_frame(frame, sprite.source.size, bounding.size, &mut scratch);

        let oam = &mut self.oams[id.screen];
        oam.vram_mut().write(gfx, &scratch);

        let (mode, transformation, x, y) = match sprite.rotation {
            Some(rotation) => {
                oam.set_affine(rotation.rotation_index, Affine::rotation(rotation.degrees));
                (
                    ObjMode::AffineDouble,
                    TransformationKind::RotationScaling {
                        affine_index: rotation.rotation_index,
                    },
                    origin.x,
                    origin.y,
                )
            }
            None => (
                ObjMode::Normal,
                TransformationKind::Flip {
                    horizontal_flip: sprite.hflip,
                    vertical_flip: sprite.vflip,
                },
                origin.x,
                origin.y,
            ),
        };

        oam.set_entry(
            id.index,
            ObjEntry {
                x,
                y,
                width: to_usize(bounding.size.width),
                height: to_usize(bounding.size.height),
                mode,
                transformation,
                priority: sprite.layer,
                palette_slot: sprite.palette_slot,
                hidden: !sprite.visible,
                gfx: Some(gfx),
            },
        );
        self.slots[id.screen][id.index].scratch = scratch;
    }

    /// Draws every active sprite, screen by screen, in increasing index
    /// order.
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub fn update(&mut self) {
        for screen in 0..SCREEN_COUNT {
            for index in 0..SPRITE_COUNT {
                if self.slots[screen][index].active {
                    self.draw(screen as i32, index as i32);
                }
            }
        }
    }

    /// Publishes the attributes drawn since the last flush of `screen`.
    pub fn flush(&mut self, screen: usize) {
        self.oams[screen.min(SCREEN_COUNT - 1)].flush();
    }

    pub fn oam(&self, screen: usize) -> &Oam {
        &self.oams[screen.min(SCREEN_COUNT - 1)]
    }

    /// Bytes written to video memory by the last draw of the sprite.
    pub fn frame_snapshot(&self, screen: i32, index: i32) -> &[u8] {
        &self.sprite(SpriteId::new(screen, index)).scratch
    }
}

/// Top-left corner of the area a sprite covers on screen. Rotated sprites
/// are drawn double size, shifted by half their bounding box so they turn
/// around its center.
fn display_origin(sprite: &Sprite) -> Point<i32> {
    let bounding = sprite.bounding;
    match sprite.rotation {
        Some(_) => bounding.position - Point::new(bounding.size.width / 2, bounding.size.height / 2),
        None => bounding.position,
    }
}

/// Bytes of the current frame. The last frame may be cut short, a frame
/// past the end of the data or a stride that overflows yields `None`.
fn current_frame<'a>(slots: &'a Slots, sprite: &'a Sprite) -> Option<&'a [u8]> {
    let pixels = resolve_pixels(slots, sprite)?;
    let frame_len = sprite.source.size.area()?;
    let start = sprite.frame.checked_mul(frame_len)?;
    if start >= pixels.len() {
        return None;
    }
    let end = start.checked_add(frame_len)?.min(pixels.len());
    pixels.get(start..end)
}

/// Palette index the drawn graphics hold at `(x, y)` in bounding space:
/// the current frame's texel while inside its whole tiles, 0 past them.
fn frame_texel(slots: &Slots, sprite: &Sprite, x: usize, y: usize) -> Option<u8> {
    let source = sprite.source.size;
    let (width, height) = (to_usize(source.width), to_usize(source.height));
    if x >= width.div_ceil(8) * 8 || y >= height.div_ceil(8) * 8 {
        return Some(0);
    }
    let frame = current_frame(slots, sprite)?;
    Some(texel(frame, width, x, y))
}

/// Copies a frame laid out `source.width / 8` tiles per row (rounded up)
/// into `out`, laid out `bounding.width / 8` tiles per row. Uncovered tiles
/// are zero.
fn relayout_frame(frame: &[u8], source: Size, bounding: Size, out: &mut Vec<u8>) {
    out.clear();
    out.resize(bounding.area().unwrap_or_default(), 0);

    let source_columns = to_usize(source.width).div_ceil(8);
    let source_rows = to_usize(source.height).div_ceil(8);
    let target_columns = to_usize(bounding.width) / 8;
    let target_rows = to_usize(bounding.height) / 8;

    for row in 0..source_rows.min(target_rows) {
        for column in 0..source_columns.min(target_columns) {
            let from = (row * source_columns + column) * TILE_BYTES;
            let to = (row * target_columns + column) * TILE_BYTES;
            let Some(tile) = frame.get(from..from + TILE_BYTES) else {
                let available = frame.get(from..).unwrap_or_default();
                out[to..to + available.len()].copy_from_slice(available);
                continue;
            };
            out[to..to + TILE_BYTES].copy_from_slice(tile);
        }
    }
}
