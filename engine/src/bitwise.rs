use std::ops::RangeInclusive;

/// Helpers to read and write bit fields of packed hardware words
/// (colors, map entries, OAM attributes).
///
/// Bit indices go from lsb to msb (right to left).
pub trait Bits: Copy {
    const WIDTH: u8;

    /// Returns the field start and a right-aligned mask of the field width.
    fn field_mask(bits_range: &RangeInclusive<u8>) -> (u8, Self);

    fn is_bit_on(self, bit_idx: u8) -> bool;

    fn set_bit(&mut self, bit_idx: u8, value: bool);

    /// Extracts the field covered by `bits_range`, moved down to bit 0.
    fn get_bits(self, bits_range: RangeInclusive<u8>) -> Self;

    /// Overwrites the field covered by `bits_range` with the low bits of `value`.
    /// Bits of `value` that don't fit in the field are discarded.
    fn set_bits(&mut self, bits_range: RangeInclusive<u8>, value: Self);

    fn is_bit_off(self, bit_idx: u8) -> bool {
        !self.is_bit_on(bit_idx)
    }

    fn with_bits(mut self, bits_range: RangeInclusive<u8>, value: Self) -> Self {
        self.set_bits(bits_range, value);
        self
    }
}

macro_rules! impl_bits {
    ($($t:ty),*) => {
        $(
            impl Bits for $t {
                #[allow(clippy::cast_possible_truncation)]
                const WIDTH: u8 = <$t>::BITS as u8;

                fn is_bit_on(self, bit_idx: u8) -> bool {
                    debug_assert!(bit_idx < Self::WIDTH);
                    (self >> bit_idx) & 1 == 1
                }

                fn set_bit(&mut self, bit_idx: u8, value: bool) {
                    debug_assert!(bit_idx < Self::WIDTH);
                    let mask = 1 << bit_idx;
                    if value {
                        *self |= mask;
                    } else {
                        *self &= !mask;
                    }
                }

                fn get_bits(self, bits_range: RangeInclusive<u8>) -> Self {
                    let (start, mask) = Self::field_mask(&bits_range);
                    (self >> start) & mask
                }

                fn set_bits(&mut self, bits_range: RangeInclusive<u8>, value: Self) {
                    let (start, mask) = Self::field_mask(&bits_range);
                    *self = (*self & !(mask << start)) | ((value & mask) << start);
                }

                fn field_mask(bits_range: &RangeInclusive<u8>) -> (u8, Self) {
                    let (start, end) = (*bits_range.start(), *bits_range.end());
                    debug_assert!(start <= end && end < Self::WIDTH);

                    let length = u32::from(end - start) + 1;
                    let mask = if length >= <$t>::BITS {
                        <$t>::MAX
                    } else {
                        (1 << length) - 1
                    };
                    (start, mask)
                }
            }
        )*
    };
}

impl_bits!(u8, u16, u32);
