//! Caller-supplied bit comparison operations.
//!
//! The trie never looks at key bytes itself. Everything it knows about a
//! key comes through a [`KeyOps`] implementation registered when the tree is
//! built; the implementor's own fields play the part of the opaque context.

use crate::constants::SLOT_ROOT;
use crate::types::{BitOff, Slot};

/// Outcome of comparing two keys over a bit range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeMatch {
    /// Every bit in the range agrees.
    Equal,
    /// First disagreeing bit, and the target's value there as a branch slot.
    Differ { bitoff: BitOff, slot: Slot },
}

impl RangeMatch {
    #[inline]
    pub fn is_equal(self) -> bool {
        matches!(self, RangeMatch::Equal)
    }
}

/// Key comparison strategy.
///
/// All methods must be pure and deterministic and must never read past the
/// key's declared length; the tree trusts their answers and does no bounds
/// checking of its own.
pub trait KeyOps {
    /// Key stored in tree items.
    type Key: ?Sized;
    /// Key used to search the tree.
    type Probe: ?Sized;

    /// Bounded length, in bits, of a full key.
    fn key_bits(&self) -> BitOff;

    /// Compare `target` against `other` over bits `[from, limit)`.
    ///
    /// A missing `other` stands for an all-zero key, which is how trailing
    /// mask bits are validated.
    fn match_range(
        &self,
        target: &Self::Key,
        other: Option<&Self::Key>,
        from: BitOff,
        limit: BitOff,
    ) -> RangeMatch;

    /// Branch slot selected by `target` at a branch testing `bitlen` bits
    /// at `bitoff`. A zero `bitlen` always selects [`SLOT_ROOT`].
    fn test_bit(&self, target: &Self::Key, bitoff: BitOff, bitlen: u8) -> Slot;

    /// Whether `probe` agrees with `node_key` on `[bitoff, bitoff + bitlen)`.
    fn match_key(&self, probe: &Self::Probe, node_key: &Self::Key, bitoff: BitOff, bitlen: BitOff) -> bool;

    /// Like [`KeyOps::test_bit`] for a search key.
    fn test_key_bit(&self, probe: &Self::Probe, bitoff: BitOff, bitlen: u8) -> Slot;
}

/// `test_bit` helper for implementors: one-way branches always go to the root slot.
#[inline]
pub fn one_way_or(bitlen: u8, f: impl FnOnce() -> Slot) -> Slot {
    if bitlen == 0 {
        SLOT_ROOT
    } else {
        f()
    }
}
