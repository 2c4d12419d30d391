//! Constants and layout of the packed node words

use crate::types::{BitOff, Slot};

// Two-way branch slots, indexed by the tested bit.
pub const SLOT_LEFT: Slot = 0;
pub const SLOT_RIGHT: Slot = 1;

// One-way (mask) branch slots: the dominated subtree and the mask's own leaf.
pub const SLOT_ROOT: Slot = 0;
pub const SLOT_OTHER: Slot = 1;

/// Largest key length, in bits, a tree accepts.
pub const MAX_KEY_BITS: BitOff = 0x7fff;

/// Item indices must leave room for the tag bit and the null sentinel.
pub const MAX_ITEMS: usize = 0x7fff_ffff;

// ---- node word: positions, mask and link state ----
pub const LEAF_POSITION_SHIFT: u32 = 0;
pub const LEAF_POSITION_BITS: u32 = 1;
pub const BRANCH_POSITION_SHIFT: u32 = 1;
pub const BRANCH_POSITION_BITS: u32 = 1;
pub const LINKED_FLAG: u32 = 0x0000_0004;
pub const MASK_BITLEN_SHIFT: u32 = 16;
pub const MASK_BITLEN_BITS: u32 = 15;
pub const MASK_FLAG: u32 = 0x8000_0000;

// ---- branch word: where and how wide the branch tests ----
pub const BRANCH_BITOFF_SHIFT: u32 = 0;
pub const BRANCH_BITOFF_BITS: u32 = 15;
pub const BRANCH_BITLEN_SHIFT: u32 = 16;
pub const BRANCH_BITLEN_BITS: u32 = 8;

// ---- metric names ----
pub const METRIC_INSERTS: &str = "ptree_inserts_total";
pub const METRIC_INSERT_REJECTS: &str = "ptree_insert_rejects_total";
pub const METRIC_REMOVES: &str = "ptree_removes_total";
pub const METRIC_LOOKUPS: &str = "ptree_lookups_total";
pub const METRIC_LOOKUP_HITS: &str = "ptree_lookup_hits_total";
