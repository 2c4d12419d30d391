//! Consistency checker.
//!
//! O(n · depth); meant for test harnesses and the `paranoid` build.

use crate::constants::*;
use crate::ops::KeyOps;
use crate::types::{BitOff, Entry, Identity, ItemId, Link, NodeRef, PatriciaTree};
use log::error;

/// What a parent branch demands of the reference in one of its slots.
#[derive(Clone, Copy)]
struct Bounds {
    /// Item hosting the parent branch, if any.
    host: Option<ItemId>,
    /// The key must agree with the host's on `[0, agree_to)`.
    agree_to: BitOff,
    /// Slot the key must select at the parent's two-way test, if any.
    tested: Option<(BitOff, usize)>,
    /// Smallest bit offset a two-way branch here may test.
    min_bitoff: BitOff,
    /// Mask lengths here must exceed this.
    mask_above: Option<BitOff>,
}

impl Bounds {
    const ROOT: Bounds = Bounds {
        host: None,
        agree_to: 0,
        tested: None,
        min_bitoff: 0,
        mask_above: None,
    };

    fn two_way(host: ItemId, bitoff: BitOff, slot: usize) -> Self {
        Bounds {
            host: Some(host),
            agree_to: bitoff,
            tested: Some((bitoff, slot)),
            min_bitoff: bitoff + 1,
            mask_above: Some(bitoff),
        }
    }

    fn one_way(host: ItemId, mask_len: BitOff) -> Self {
        Bounds {
            host: Some(host),
            agree_to: mask_len,
            tested: None,
            min_bitoff: mask_len,
            mask_above: Some(mask_len),
        }
    }
}

#[derive(Default)]
struct Tally {
    leaves: usize,
    branches: usize,
    oddman_seen: bool,
}

impl<O: KeyOps> PatriciaTree<O> {
    /// Verify every structural invariant. Logs the first violation found.
    pub fn check<E>(&self, items: &[E]) -> bool
    where
        E: Entry<Key = O::Key>,
    {
        match self.check_tree(items) {
            Ok(()) => true,
            Err(msg) => {
                error!("[CHECK] {}", msg);
                false
            }
        }
    }

    fn check_tree<E>(&self, items: &[E]) -> Result<(), String>
    where
        E: Entry<Key = O::Key>,
    {
        if self.root.is_null() {
            if self.len != 0 || self.oddman.is_some() {
                return Err(format!("empty root but len={} oddman={:?}", self.len, self.oddman));
            }
            return Ok(());
        }
        let oddman = self.oddman.ok_or("non-empty tree without an oddman")?;
        if oddman >= items.len() {
            return Err(format!("oddman {} out of range", oddman));
        }

        let mut tally = Tally::default();
        self.check_ref(items, Link::Root, Bounds::ROOT, 0, &mut tally)?;

        if !tally.oddman_seen {
            return Err(format!("oddman {} not reachable", oddman));
        }
        if tally.leaves != self.len {
            return Err(format!("{} leaves reachable, len is {}", tally.leaves, self.len));
        }
        if tally.branches + 1 != self.len {
            return Err(format!("{} branches for {} items", tally.branches, self.len));
        }
        Ok(())
    }

    fn check_ref<E>(&self, items: &[E], link: Link, bounds: Bounds, depth: usize, tally: &mut Tally) -> Result<(), String>
    where
        E: Entry<Key = O::Key>,
    {
        if depth > self.walk_limit() {
            return Err("walk too deep, tree is cyclic".into());
        }
        let r = self.get_link(items, link);
        let identity = r.identity().ok_or_else(|| format!("null reference at {:?}", link))?;
        let id = r.index();
        let item = items.get(id).ok_or_else(|| format!("{:?} out of range", r))?;
        let node = item.node();
        if !node.is_linked() {
            return Err(format!("{:?} points at an unlinked item", r));
        }
        if let Link::Child(host, _) = link {
            if r == NodeRef::branch(host) {
                return Err(format!("branch of item {} points to itself", host));
            }
        }

        let position = match identity {
            Identity::Leaf => node.leaf_position(),
            Identity::Branch => node.branch_position(),
        };
        if position != link.slot() {
            return Err(format!("{:?} records position {} but sits in slot {}", r, position, link.slot()));
        }

        if let Some(host) = bounds.host {
            if !self.compare(item.key(), Some(items[host].key()), 0, bounds.agree_to).is_equal() {
                return Err(format!("{:?} does not share item {}'s first {} bits", r, host, bounds.agree_to));
            }
        }
        if let Some((bitoff, slot)) = bounds.tested {
            if self.ops.test_bit(item.key(), bitoff, 1) != slot {
                return Err(format!("{:?} on the wrong side of the branch @{}", r, bitoff));
            }
        }
        let is_mask_role = node.is_mask() && (identity == Identity::Leaf || node.bitlen() == 0);
        if let Some(above) = bounds.mask_above {
            if is_mask_role && node.mask_len() <= above {
                return Err(format!("mask {:?} /{} sits below bit {}", r, node.mask_len(), above));
            }
        }

        match identity {
            Identity::Leaf => {
                tally.leaves += 1;
                let trail = self.locate(items, id);
                if trail.leaf != Some(link) {
                    return Err(format!("{:?} not found by descending with its own key", r));
                }
                if self.oddman == Some(id) {
                    tally.oddman_seen = true;
                    if trail.branch.is_some() {
                        return Err(format!("oddman {} has a branch in use", id));
                    }
                } else if trail.branch.is_none() {
                    return Err(format!("item {}'s branch is not above its leaf", id));
                }
                Ok(())
            }
            Identity::Branch => {
                tally.branches += 1;
                let bitoff = node.bitoff();
                match node.bitlen() {
                    0 => {
                        if !node.is_mask() || node.mask_len() != bitoff {
                            return Err(format!("one-way branch of item {} is not its mask", id));
                        }
                        if node.slot(SLOT_OTHER) != NodeRef::leaf(id) {
                            return Err(format!("mask branch of item {} lost its own leaf", id));
                        }
                        if node.slot(SLOT_ROOT) == NodeRef::leaf(id) {
                            return Err(format!("mask branch of item {} dominates its own leaf", id));
                        }
                        tally.leaves += 1;
                        if self.oddman == Some(id) {
                            return Err(format!("oddman {} hosts a mask branch", id));
                        }
                        self.check_ref(items, Link::Child(id, SLOT_ROOT), Bounds::one_way(id, bitoff), depth + 1, tally)
                    }
                    1 => {
                        if bitoff < bounds.min_bitoff || bitoff >= self.ops.key_bits() {
                            return Err(format!("branch {:?} @{} out of order", r, bitoff));
                        }
                        for slot in [SLOT_LEFT, SLOT_RIGHT] {
                            self.check_ref(items, Link::Child(id, slot), Bounds::two_way(id, bitoff, slot), depth + 1, tally)?;
                        }
                        Ok(())
                    }
                    n => Err(format!("branch {:?} has bitlen {}", r, n)),
                }
            }
        }
    }
}
