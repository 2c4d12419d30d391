//! Data structures for the PATRICIA trie

use crate::constants::*;
use crate::helpers::{get_field, set_field};
use crate::ops::KeyOps;
use std::fmt;

/// Index of a caller-owned record inside the slice handed to the tree.
pub type ItemId = usize;
/// Bit offset into a key.
pub type BitOff = u16;
/// Length, in bits, of a mask entry.
pub type BitLen = u16;
/// Child slot of a branch.
pub type Slot = usize;

/// Which of a node's two identities a reference denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identity {
    Leaf,
    Branch,
}

/// Tagged reference to one identity of an item's node.
///
/// The low bit is the tag (0 = leaf, 1 = branch), the remaining bits the
/// item index. `NodeRef::NULL` marks an empty slot.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct NodeRef(u32);

impl NodeRef {
    pub const NULL: Self = NodeRef(u32::MAX);
    const TAG_MASK: u32 = 0x1;
    const TAG_BRANCH: u32 = 0x1;

    #[inline]
    pub fn leaf(id: ItemId) -> Self {
        debug_assert!(id < MAX_ITEMS);
        NodeRef((id as u32) << 1)
    }

    #[inline]
    pub fn branch(id: ItemId) -> Self {
        debug_assert!(id < MAX_ITEMS);
        NodeRef(((id as u32) << 1) | Self::TAG_BRANCH)
    }

    #[inline]
    pub fn is_null(self) -> bool {
        self == Self::NULL
    }

    #[inline]
    pub fn is_leaf(self) -> bool {
        !self.is_null() && self.0 & Self::TAG_MASK == 0
    }

    #[inline]
    pub fn is_branch(self) -> bool {
        !self.is_null() && self.0 & Self::TAG_MASK == Self::TAG_BRANCH
    }

    /// The item this reference points into, tag stripped.
    #[inline]
    pub fn index(self) -> ItemId {
        (self.0 >> 1) as ItemId
    }

    #[inline]
    pub fn identity(self) -> Option<Identity> {
        if self.is_null() {
            None
        } else if self.0 & Self::TAG_MASK == Self::TAG_BRANCH {
            Some(Identity::Branch)
        } else {
            Some(Identity::Leaf)
        }
    }
}

impl Default for NodeRef {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Debug for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.identity() {
            None => f.write_str("NULL"),
            Some(Identity::Leaf) => write!(f, "L({})", self.index()),
            Some(Identity::Branch) => write!(f, "B({})", self.index()),
        }
    }
}

/// Trie node embedded in every caller record.
///
/// The same storage serves as the item's leaf and as one branch of the
/// trie; `slots`, the branch word and the branch position only mean
/// something while the branch identity is in use.
#[derive(Clone, PartialEq, Eq)]
pub struct Node {
    slots: [NodeRef; 2],
    nodedata: u32,   // positions | linked | mask length | mask flag
    branchdata: u32, // bit offset | bit length
}

impl Node {
    pub const fn new() -> Self {
        Self {
            slots: [NodeRef::NULL; 2],
            nodedata: 0,
            branchdata: 0,
        }
    }

    /// True while the owning item is a member of some tree.
    #[inline]
    pub fn is_linked(&self) -> bool {
        self.nodedata & LINKED_FLAG != 0
    }

    #[inline]
    pub fn is_mask(&self) -> bool {
        self.nodedata & MASK_FLAG != 0
    }

    #[inline]
    pub fn mask_len(&self) -> BitLen {
        get_field(self.nodedata, MASK_BITLEN_SHIFT, MASK_BITLEN_BITS) as BitLen
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::new();
    }

    pub(crate) fn set_linked(&mut self) {
        self.nodedata |= LINKED_FLAG;
    }

    pub(crate) fn set_mask(&mut self, len: BitLen) {
        self.nodedata = set_field(self.nodedata, MASK_BITLEN_SHIFT, MASK_BITLEN_BITS, len as u32);
        self.nodedata |= MASK_FLAG;
    }

    #[inline]
    pub(crate) fn slot(&self, slot: Slot) -> NodeRef {
        self.slots[slot]
    }

    #[inline]
    pub(crate) fn set_slot(&mut self, slot: Slot, r: NodeRef) {
        self.slots[slot] = r;
    }

    #[inline]
    pub(crate) fn leaf_position(&self) -> Slot {
        get_field(self.nodedata, LEAF_POSITION_SHIFT, LEAF_POSITION_BITS) as Slot
    }

    #[inline]
    pub(crate) fn set_leaf_position(&mut self, slot: Slot) {
        self.nodedata = set_field(self.nodedata, LEAF_POSITION_SHIFT, LEAF_POSITION_BITS, slot as u32);
    }

    #[inline]
    pub(crate) fn branch_position(&self) -> Slot {
        get_field(self.nodedata, BRANCH_POSITION_SHIFT, BRANCH_POSITION_BITS) as Slot
    }

    #[inline]
    pub(crate) fn set_branch_position(&mut self, slot: Slot) {
        self.nodedata = set_field(self.nodedata, BRANCH_POSITION_SHIFT, BRANCH_POSITION_BITS, slot as u32);
    }

    /// Bit offset the branch tests; for a one-way branch, the mask length.
    #[inline]
    pub(crate) fn bitoff(&self) -> BitOff {
        get_field(self.branchdata, BRANCH_BITOFF_SHIFT, BRANCH_BITOFF_BITS) as BitOff
    }

    /// 0 for a one-way (mask) branch, 1 for a two-way branch.
    #[inline]
    pub(crate) fn bitlen(&self) -> u8 {
        get_field(self.branchdata, BRANCH_BITLEN_SHIFT, BRANCH_BITLEN_BITS) as u8
    }

    #[inline]
    pub(crate) fn set_branch(&mut self, bitoff: BitOff, bitlen: u8) {
        let w = set_field(0, BRANCH_BITOFF_SHIFT, BRANCH_BITOFF_BITS, bitoff as u32);
        self.branchdata = set_field(w, BRANCH_BITLEN_SHIFT, BRANCH_BITLEN_BITS, bitlen as u32);
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("Node");
        d.field("linked", &self.is_linked());
        if self.is_mask() {
            d.field("mask_len", &self.mask_len());
        }
        d.field("leaf_pos", &self.leaf_position())
            .field("branch_pos", &self.branch_position())
            .field("bitoff", &self.bitoff())
            .field("bitlen", &self.bitlen())
            .field("slots", &self.slots)
            .finish()
    }
}

/// A caller-owned record that embeds a [`Node`] and a key.
pub trait Entry {
    type Key: ?Sized;

    fn node(&self) -> &Node;
    fn node_mut(&mut self) -> &mut Node;
    fn key(&self) -> &Self::Key;
}

/// Ready-made record pairing a key with a payload.
#[derive(Debug, Clone, Default)]
pub struct Record<K, V = ()> {
    node: Node,
    pub key: K,
    pub value: V,
}

impl<K, V> Record<K, V> {
    pub fn new(key: K, value: V) -> Self {
        Self {
            node: Node::new(),
            key,
            value,
        }
    }
}

impl<K, V> Entry for Record<K, V> {
    type Key = K;

    fn node(&self) -> &Node {
        &self.node
    }
    fn node_mut(&mut self) -> &mut Node {
        &mut self.node
    }
    fn key(&self) -> &K {
        &self.key
    }
}

/// Iteration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// A place holding a reference: the tree root or a branch slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Link {
    Root,
    Child(ItemId, Slot),
}

impl Link {
    /// Position value recorded on whatever is installed here.
    #[inline]
    pub(crate) fn slot(self) -> Slot {
        match self {
            Link::Root => SLOT_ROOT,
            Link::Child(_, slot) => slot,
        }
    }
}

/// Where an item's identities sit, found by descending with its own key.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Trail {
    /// Link holding the item's leaf reference.
    pub leaf: Option<Link>,
    /// Link holding the branch whose slot holds the leaf.
    pub parent: Option<Link>,
    /// Link holding the item's own branch reference.
    pub branch: Option<Link>,
}

/// PatriciaTree handle. Items live in a caller slice passed to each call.
pub struct PatriciaTree<O: KeyOps> {
    pub(crate) root: NodeRef,
    pub(crate) oddman: Option<ItemId>,
    pub(crate) len: usize,
    pub(crate) ops: O,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_round_trip() {
        let l = NodeRef::leaf(7);
        let b = NodeRef::branch(7);
        assert!(l.is_leaf() && !l.is_branch());
        assert!(b.is_branch() && !b.is_leaf());
        assert_eq!(l.index(), b.index());
        assert_ne!(l, b);
        assert_eq!(NodeRef::NULL.identity(), None);
        assert!(!NodeRef::NULL.is_leaf() && !NodeRef::NULL.is_branch());
        assert_eq!(format!("{:?} {:?}", l, b), "L(7) B(7)");
        let top = NodeRef::branch(MAX_ITEMS - 1);
        assert!(!top.is_null());
        assert_eq!(top.index(), MAX_ITEMS - 1);
    }

    #[test]
    fn node_words_keep_fields_apart() {
        let mut n = Node::new();
        assert!(!n.is_linked() && !n.is_mask());
        n.set_mask(24);
        n.set_linked();
        n.set_leaf_position(SLOT_RIGHT);
        n.set_branch_position(SLOT_LEFT);
        n.set_branch(24, 0);
        assert!(n.is_mask() && n.is_linked());
        assert_eq!(n.mask_len(), 24);
        assert_eq!((n.leaf_position(), n.branch_position()), (1, 0));
        assert_eq!((n.bitoff(), n.bitlen()), (24, 0));
        n.set_branch(MAX_KEY_BITS, 1);
        assert_eq!((n.bitoff(), n.bitlen()), (MAX_KEY_BITS, 1));
        assert_eq!(n.mask_len(), 24);
        n.reset();
        assert_eq!(n, Node::new());
    }
}
