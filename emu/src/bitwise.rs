use std::fmt::Debug;
use std::mem::size_of;
use std::ops::RangeInclusive;

/// Bit helpers for the 8/16-bit registers of the LC86K,
/// the index (`bit_idx`) goes from lsb to msb (right to left).
pub trait Bits
where
    Self: Copy + Into<u32> + TryFrom<u32>,
    <Self as TryFrom<u32>>::Error: Debug,
{
    const BITS: u8 = (size_of::<Self>() * 8) as u8;

    fn from_wide(value: u32) -> Self {
        // The mask keeps the conversion infallible.
        let mask = (1_u32 << Self::BITS) - 1;
        <Self as TryFrom<u32>>::try_from(value & mask).unwrap_or_else(|_| unreachable!())
    }

    fn get_bit(self, bit_idx: u8) -> bool {
        debug_assert!(bit_idx < Self::BITS);
        (self.into() >> bit_idx) & 1 == 1
    }

    fn set_bit(&mut self, bit_idx: u8, value: bool) {
        debug_assert!(bit_idx < Self::BITS);
        let wide: u32 = (*self).into();
        let mask = 1 << bit_idx;
        *self = Self::from_wide(if value { wide | mask } else { wide & !mask });
    }

    /// Switches from 1 to 0, or conversely from 0 to 1.
    fn toggle_bit(&mut self, bit_idx: u8) {
        debug_assert!(bit_idx < Self::BITS);
        let wide: u32 = (*self).into();
        *self = Self::from_wide(wide ^ (1 << bit_idx));
    }

    fn get_bits(self, bits_range: RangeInclusive<u8>) -> Self {
        let start = *bits_range.start();
        let length = u32::from(*bits_range.end() - start + 1);
        debug_assert!(*bits_range.end() < Self::BITS);

        let mask = (1_u32 << length) - 1;
        Self::from_wide((self.into() >> start) & mask)
    }
}

impl Bits for u8 {}
impl Bits for u16 {}
