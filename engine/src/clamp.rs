//! Input normalization shared by every manager entry point.
//!
//! Screens, layers and sprite indices coming from callers are never
//! rejected. They are coerced into range so that a stray value addresses the
//! nearest valid slot instead of failing.

use crate::render::{LAYER_COUNT, SPRITE_COUNT};

/// `screen <= 0` addresses screen 0, anything else screen 1.
pub const fn normalize_screen(screen: i32) -> usize {
    if screen <= 0 { 0 } else { 1 }
}

#[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
pub const fn clamp_layer(layer: i32) -> usize {
    if layer <= 0 {
        0
    } else if layer >= LAYER_COUNT as i32 {
        LAYER_COUNT - 1
    } else {
        layer as usize
    }
}

#[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
pub const fn clamp_sprite_index(index: i32) -> usize {
    if index <= 0 {
        0
    } else if index >= SPRITE_COUNT as i32 {
        SPRITE_COUNT - 1
    } else {
        index as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn screens() {
        assert_eq!(normalize_screen(-3), 0);
        assert_eq!(normalize_screen(0), 0);
        assert_eq!(normalize_screen(1), 1);
        assert_eq!(normalize_screen(7), 1);
    }

    #[test]
    fn layers() {
        assert_eq!(clamp_layer(-1), 0);
        assert_eq!(clamp_layer(2), 2);
        assert_eq!(clamp_layer(4), 3);
    }

    #[test]
    fn sprite_indices() {
        assert_eq!(clamp_sprite_index(-10), 0);
        assert_eq!(clamp_sprite_index(64), 64);
        assert_eq!(clamp_sprite_index(128), 127);
        assert_eq!(clamp_sprite_index(i32::MAX), 127);
    }
}
