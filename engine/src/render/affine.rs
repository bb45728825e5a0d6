//! Fixed point trigonometry and the rotation/scaling matrices used by
//! affine sprites.
//!
//! Angles are expressed in binary units: a full turn is [`ANGLE_STEPS`].
//! `sin_lerp`/`cos_lerp` return 4.12 fixed point values; matrices are 8.8.

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

/// A full turn in binary angle units.
pub const ANGLE_STEPS: i32 = 1 << 15;

const TABLE_BITS: u32 = 9;
const TABLE_LEN: usize = 1 << TABLE_BITS;
const LERP_SHIFT: u32 = 15 - TABLE_BITS;
const LERP_MASK: i32 = (1 << LERP_SHIFT) - 1;

/// Sine over a full turn in 4.12, with one extra entry so interpolation can
/// always read `idx + 1`.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
static SIN_TABLE: LazyLock<[i32; TABLE_LEN + 1]> = LazyLock::new(|| {
    let mut table = [0; TABLE_LEN + 1];
    for (i, entry) in table.iter_mut().enumerate() {
        let radians = (i as f64) * std::f64::consts::TAU / TABLE_LEN as f64;
        *entry = (radians.sin() * 4096.0).round() as i32;
    }
    table
});

/// Converts degrees to binary angle units. Any `i32` is accepted, whole
/// turns are dropped first.
pub const fn degrees_to_angle(degrees: i32) -> i32 {
    degrees.rem_euclid(360) * ANGLE_STEPS / 360
}

/// Sine of a binary angle, 4.12 fixed point, linearly interpolated.
#[allow(clippy::cast_sign_loss)]
pub fn sin_lerp(angle: i32) -> i32 {
    let angle = angle & (ANGLE_STEPS - 1);
    let idx = (angle >> LERP_SHIFT) as usize;
    let frac = angle & LERP_MASK;

    let low = SIN_TABLE[idx];
    let high = SIN_TABLE[idx + 1];
    low + (((high - low) * frac) >> LERP_SHIFT)
}

/// Cosine of a binary angle, 4.12 fixed point.
pub fn cos_lerp(angle: i32) -> i32 {
    sin_lerp(angle + ANGLE_STEPS / 4)
}

/// A 2x2 matrix in 8.8 fixed point mapping screen space deltas (relative to
/// the sprite center) to texture space deltas.
///
/// ```text
/// ┌    ┐   ┌        ┐ ┌    ┐
/// │ tx │   │ pa  pb │ │ dx │
/// │ ty │ = │ pc  pd │ │ dy │
/// └    ┘   └        ┘ └    ┘
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Affine {
    pub pa: i32,
    pub pb: i32,
    pub pc: i32,
    pub pd: i32,
}

impl Default for Affine {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Affine {
    pub const IDENTITY: Self = Self {
        pa: 1 << 8,
        pb: 0,
        pc: 0,
        pd: 1 << 8,
    };

    /// Rotation by `degrees` with unit scale.
    pub fn rotation(degrees: i32) -> Self {
        Self::rotate_scale(degrees, 1 << 8, 1 << 8)
    }

    /// Rotation by `degrees` with 8.8 scale factors.
    pub fn rotate_scale(degrees: i32, scale_x: i32, scale_y: i32) -> Self {
        let angle = degrees_to_angle(degrees);
        let sin = sin_lerp(angle);
        let cos = cos_lerp(angle);

        Self {
            pa: (cos * scale_x) >> 12,
            pb: (-sin * scale_x) >> 12,
            pc: (sin * scale_y) >> 12,
            pd: (cos * scale_y) >> 12,
        }
    }

    /// Applies the matrix to a delta, rounding toward negative infinity.
    pub const fn apply(&self, dx: i32, dy: i32) -> (i32, i32) {
        (
            (self.pa * dx + self.pb * dy) >> 8,
            (self.pc * dx + self.pd * dy) >> 8,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn cardinal_angles() {
        assert_eq!(sin_lerp(0), 0);
        assert_eq!(sin_lerp(degrees_to_angle(90)), 4096);
        assert_eq!(sin_lerp(degrees_to_angle(180)), 0);
        assert_eq!(sin_lerp(degrees_to_angle(270)), -4096);
        assert_eq!(cos_lerp(0), 4096);
        assert_eq!(cos_lerp(degrees_to_angle(180)), -4096);
    }

    #[test]
    fn negative_angles_wrap() {
        assert_eq!(sin_lerp(degrees_to_angle(-90)), -4096);
        assert_eq!(cos_lerp(degrees_to_angle(-360)), 4096);
    }

    #[test]
    fn huge_angles_reduce_to_a_turn() {
        assert_eq!(degrees_to_angle(100_000), degrees_to_angle(100_000 % 360));
        assert_eq!(degrees_to_angle(i32::MAX), degrees_to_angle(i32::MAX % 360));
        assert_eq!(degrees_to_angle(i32::MIN), degrees_to_angle(i32::MIN.rem_euclid(360)));
        assert_eq!(Affine::rotation(360 * 1000 + 90), Affine::rotation(90));
    }

    #[test]
    fn interpolation_stays_close() {
        for degrees in 0..360 {
            let exact = (f64::from(degrees).to_radians().sin() * 4096.0).round();
            let approx = f64::from(sin_lerp(degrees_to_angle(degrees)));
            assert!((exact - approx).abs() <= 8.0, "{degrees}: {exact} vs {approx}");
        }
    }

    #[test]
    fn identity_and_quarter_turn() {
        assert_eq!(Affine::rotation(0), Affine::IDENTITY);
        assert_eq!(Affine::IDENTITY.apply(5, -3), (5, -3));

        let quarter = Affine::rotation(90);
        assert_eq!(
            quarter,
            Affine {
                pa: 0,
                pb: -256,
                pc: 256,
                pd: 0
            }
        );
        assert_eq!(quarter.apply(10, 0), (0, 10));
        assert_eq!(quarter.apply(0, 10), (-10, 0));
    }
}
