//! Bit-field packing and wide-key bit helpers

use crate::types::{BitOff, Slot};

#[inline(always)]
pub const fn field_mask(bits: u32) -> u32 {
    (1u32 << bits) - 1
}

#[inline]
pub fn get_field(word: u32, shift: u32, bits: u32) -> u32 {
    (word >> shift) & field_mask(bits)
}

#[inline]
pub fn set_field(word: u32, shift: u32, bits: u32, value: u32) -> u32 {
    debug_assert!(value <= field_mask(bits), "value {value} overflows {bits}-bit field");
    (word & !(field_mask(bits) << shift)) | ((value & field_mask(bits)) << shift)
}

/// Map an IPv4 address into the high 32 bits of a 128-bit key.
#[inline]
pub fn v4_key(addr: u32) -> u128 {
    (addr as u128) << 96
}

/// Bit `index` of a 128-bit key, counting from the most significant bit.
#[inline]
pub fn get_bit(key: u128, index: BitOff) -> Slot {
    debug_assert!(index <= 127);
    ((key >> (127 - index)) & 1) as Slot
}

#[inline]
pub fn mask(prefix_len: BitOff) -> u128 {
    if prefix_len == 0 {
        0
    } else if prefix_len >= 128 {
        !0u128
    } else {
        !(!0u128 >> prefix_len)
    }
}

// Canonicalise a key: zero host bits beyond `plen`.
#[inline(always)]
pub fn canonical(key: u128, plen: BitOff) -> u128 {
    key & mask(plen)
}

/// Bits `[from, limit)` of a 128-bit key.
#[inline]
pub fn range_mask(from: BitOff, limit: BitOff) -> u128 {
    if from >= limit {
        0
    } else {
        mask(limit) & !mask(from)
    }
}

/// First bit in `[from, limit)` at which the two keys differ, if any.
pub fn first_difference(key1: u128, key2: u128, from: BitOff, limit: BitOff) -> Option<BitOff> {
    let diff = (key1 ^ key2) & range_mask(from, limit);
    if diff == 0 {
        return None;
    }
    Some(diff.leading_zeros() as BitOff)
}
