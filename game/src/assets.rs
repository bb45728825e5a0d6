//! Procedurally drawn artwork.
//!
//! Sprites are 8bpp sheets in the layout the sprite manager expects: 8x8
//! tiles, one frame after the other. Backgrounds come as tiles, a map of
//! 256x256 blocks and a palette.

use engine::Color;
use engine::render::TILE_BYTES;

use crate::rules::Choice;

/// Edge of the hand and health bar sprites.
pub const SPRITE_SIZE: i32 = 64;

/// Frames of the health bar, one per damage point.
pub const HEALTH_FRAMES: usize = 4;

/// Sprite artwork, all frames of one size.
pub struct SpriteSheet {
    pub pixels: Vec<u8>,
    pub palette: Vec<u16>,
    pub width: i32,
    pub height: i32,
}

/// Background artwork for a 256x192 screen.
pub struct Backdrop {
    pub tiles: Vec<u8>,
    pub map: Vec<u16>,
    pub palette: Vec<u16>,
    pub width: i32,
    pub height: i32,
}

/// Writes pixels of a tiled sprite sheet.
struct Canvas {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl Canvas {
    fn new(width: usize, height: usize, frames: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width * height * frames],
        }
    }

    fn put(&mut self, frame: usize, x: usize, y: usize, index: u8) {
        let tile = (y / 8) * (self.width / 8) + x / 8;
        let offset = frame * self.width * self.height + tile * TILE_BYTES + (y % 8) * 8 + x % 8;
        if let Some(pixel) = self.pixels.get_mut(offset) {
            *pixel = index;
        }
    }

    /// Fills every pixel of `frame` for which `paint` returns an index.
    fn paint(&mut self, frame: usize, paint: impl Fn(i32, i32) -> Option<u8>) {
        for y in 0..self.height {
            for x in 0..self.width {
                #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
                if let Some(index) = paint(x as i32, y as i32) {
                    self.put(frame, x, y, index);
                }
            }
        }
    }
}

const fn rgb15(red: u8, green: u8, blue: u8) -> u16 {
    (red as u16 & 0x1F) | ((green as u16 & 0x1F) << 5) | ((blue as u16 & 0x1F) << 10)
}

const OUTLINE: u8 = 2;
const HIGHLIGHT: u8 = 3;

/// Whether `(x, y)`, relative to the sprite center, belongs to the hand
/// shape of `choice`.
fn hand_shape(choice: Choice, x: i32, y: i32) -> bool {
    match choice {
        // a round fist
        Choice::Rock => x * x + y * y <= 22 * 22,
        // a flat sheet
        Choice::Paper => x.abs() <= 18 && y.abs() <= 24,
        // two crossed blades with a ring
        Choice::Scissors => {
            let blade = (x - y).abs() <= 4 || (x + y).abs() <= 4;
            (blade && y <= 8 && x.abs() <= 22) || (x.abs() - 10).pow(2) + (y - 16).pow(2) <= 36
        }
        // a head and tongue
        Choice::Lizard => {
            let head = y >= -20 && y <= 20 && x.abs() <= (y + 20) / 2;
            head || (x.abs() <= 2 && y > 20 && y <= 28)
        }
        // split fingers
        Choice::Spock => {
            let palm = x.abs() <= 16 && y >= 0 && y <= 24;
            let fingers = y < 0 && y >= -26 && ((x + 11).abs() <= 5 || (x - 11).abs() <= 5);
            palm || fingers
        }
    }
}

const fn hand_color(choice: Choice) -> u16 {
    match choice {
        Choice::Rock => rgb15(16, 16, 16),
        Choice::Paper => rgb15(30, 30, 26),
        Choice::Scissors => rgb15(28, 8, 8),
        Choice::Lizard => rgb15(8, 26, 8),
        Choice::Spock => rgb15(8, 16, 30),
    }
}

/// The button and hand artwork of `choice`. Frame 0 is the idle button,
/// frame 1 the highlighted one.
pub fn hand(choice: Choice) -> SpriteSheet {
    let size = SPRITE_SIZE as usize;
    let mut canvas = Canvas::new(size, size, 2);
    let center = SPRITE_SIZE / 2;

    for frame in 0..2 {
        canvas.paint(frame, |x, y| {
            let (dx, dy) = (x - center, y - center);
            if hand_shape(choice, dx, dy) {
                let edge = [(1, 0), (-1, 0), (0, 1), (0, -1)]
                    .iter()
                    .any(|(ox, oy)| !hand_shape(choice, dx + ox, dy + oy));
                return Some(if edge { OUTLINE } else { 1 });
            }
            let border = x < 2 || y < 2 || x >= SPRITE_SIZE - 2 || y >= SPRITE_SIZE - 2;
            (frame == 1 && border).then_some(HIGHLIGHT)
        });
    }

    SpriteSheet {
        pixels: canvas.pixels,
        palette: vec![0, hand_color(choice), rgb15(2, 2, 4), rgb15(31, 28, 0)],
        width: SPRITE_SIZE,
        height: SPRITE_SIZE,
    }
}

/// Health bar with one frame per damage point: frame `n` shows `4 - n`
/// green segments and `n` red ones.
pub fn health_bar() -> SpriteSheet {
    let size = SPRITE_SIZE as usize;
    let mut canvas = Canvas::new(size, size, HEALTH_FRAMES);

    for damage in 0..HEALTH_FRAMES {
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let healthy = (HEALTH_FRAMES - damage) as i32;
        canvas.paint(damage, |x, y| {
            if !(2..14).contains(&y) || !(2..62).contains(&x) {
                return None;
            }
            if y == 2 || y == 13 || x == 2 || x == 61 {
                return Some(OUTLINE);
            }
            let segment = (x - 3) / 15;
            if (x - 3) % 15 == 14 {
                return Some(OUTLINE);
            }
            Some(if segment < healthy { 1 } else { HIGHLIGHT })
        });
    }

    SpriteSheet {
        pixels: canvas.pixels,
        palette: vec![0, rgb15(4, 26, 4), rgb15(31, 31, 31), rgb15(26, 4, 4)],
        width: SPRITE_SIZE,
        height: SPRITE_SIZE,
    }
}

fn solid_tile(index: u8) -> [u8; TILE_BYTES] {
    [index; TILE_BYTES]
}

fn checker_tile(a: u8, b: u8) -> [u8; TILE_BYTES] {
    std::array::from_fn(|i| if (i / 8 + i % 8) % 2 == 0 { a } else { b })
}

/// A 256x192 background whose map is filled by `tile_at(column, row)`.
fn backdrop(tiles: &[[u8; TILE_BYTES]], palette: Vec<u16>, tile_at: impl Fn(usize, usize) -> u16) -> Backdrop {
    let mut map = vec![0_u16; 32 * 32];
    for row in 0..24 {
        for column in 0..32 {
            map[row * 32 + column] = tile_at(column, row);
        }
    }

    Backdrop {
        tiles: tiles.concat(),
        map,
        palette,
        width: 256,
        height: 192,
    }
}

/// Top screen after the last life is lost: dark red stripes with a cross.
pub fn game_over_top() -> Backdrop {
    let tiles = [solid_tile(0), solid_tile(1), solid_tile(2), solid_tile(3)];
    let palette = vec![0, rgb15(10, 0, 0), rgb15(16, 2, 2), rgb15(31, 31, 31)];

    backdrop(&tiles, palette, |column, row| {
        let (dx, dy) = (column.abs_diff(16), row.abs_diff(12));
        if dx == dy && dx <= 6 {
            3
        } else if row % 4 < 2 {
            1
        } else {
            2
        }
    })
}

/// Bottom screen after the last life is lost: a checkerboard with a band
/// to touch.
pub fn game_over_bottom() -> Backdrop {
    let tiles = [solid_tile(0), checker_tile(1, 2), solid_tile(3)];
    let palette = vec![0, rgb15(4, 4, 8), rgb15(8, 8, 14), rgb15(31, 24, 0)];

    backdrop(&tiles, palette, |_, row| if (10..14).contains(&row) { 2 } else { 1 })
}

/// Backdrop color behind both screens during a match.
pub fn backdrop_color() -> Color {
    Color::from_rgb5(1, 5, 9)
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::render::oam::texel;
    use pretty_assertions::assert_eq;

    #[test]
    fn hands_have_two_frames() {
        for choice in Choice::ALL {
            let sheet = hand(choice);
            assert_eq!(sheet.pixels.len(), 64 * 64 * 2);
            // the center of every hand is filled
            assert!(texel(&sheet.pixels, 64, 32, 32) != 0, "{choice}");
            // the highlight border only exists in frame 1
            assert_eq!(texel(&sheet.pixels, 64, 0, 0), 0);
            assert_eq!(texel(&sheet.pixels[64 * 64..], 64, 0, 0), HIGHLIGHT);
        }
    }

    #[test]
    fn hands_differ() {
        let sheets: Vec<_> = Choice::ALL.iter().map(|c| hand(*c).pixels).collect();
        for (i, a) in sheets.iter().enumerate() {
            for b in &sheets[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn health_bar_drains_per_frame() {
        let sheet = health_bar();
        let frame_len = 64 * 64;
        let green = |frame: usize| {
            let pixels = &sheet.pixels[frame * frame_len..(frame + 1) * frame_len];
            (0..64).filter(|x| texel(pixels, 64, *x, 8) == 1).count()
        };

        assert_eq!(sheet.pixels.len(), frame_len * HEALTH_FRAMES);
        assert!(green(0) > green(1));
        assert!(green(1) > green(2));
        assert!(green(2) > green(3));
        assert!(green(3) > 0);
    }

    #[test]
    fn game_over_maps_use_known_tiles() {
        for art in [game_over_top(), game_over_bottom()] {
            let tile_count = art.tiles.len() / TILE_BYTES;
            assert!(art.map.iter().all(|entry| usize::from(*entry) < tile_count));
            assert_eq!(art.map.len(), 1024);
            // the 8 rows below the screen stay empty
            assert!(art.map[24 * 32..].iter().all(|entry| *entry == 0));
        }
    }

    #[test]
    fn backdrop_color_channels() {
        let color = backdrop_color();
        assert_eq!((color.red(), color.green(), color.blue()), (1, 5, 9));
    }
}
