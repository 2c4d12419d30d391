//! Mask entries switch between two roles.
//!
//! A mask starts out [`MaskRole::Terminal`]: a plain leaf. When a longer key
//! lands inside its prefix it is promoted to [`MaskRole::Interior`] and its
//! branch identity becomes a one-way branch at the mask length, with the
//! dominated subtree in [`SLOT_ROOT`] and its own leaf in [`SLOT_OTHER`].
//! When that subtree shrinks to nothing the mask is demoted back to a leaf.
//!
//! A promoted mask needs its branch identity back. If another branch was
//! using it, that branch is handed to the newcomer's identity first.

use crate::constants::{SLOT_OTHER, SLOT_ROOT};
use crate::errors::Error;
use crate::ops::KeyOps;
use crate::types::{BitLen, Entry, ItemId, Link, NodeRef, PatriciaTree};
use log::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskRole {
    /// Held as a leaf.
    Terminal,
    /// Acting as a one-way branch over longer entries.
    Interior,
}

impl<O: KeyOps> PatriciaTree<O> {
    /// Mask length of a linked mask entry, `None` for full keys and
    /// unlinked items.
    pub fn is_mask_entry<E: Entry>(&self, items: &[E], id: ItemId) -> Option<BitLen> {
        let node = items.get(id)?.node();
        (node.is_linked() && node.is_mask()).then(|| node.mask_len())
    }

    /// Current role of a linked mask entry.
    pub fn mask_role<E>(&self, items: &[E], id: ItemId) -> Option<MaskRole>
    where
        E: Entry<Key = O::Key>,
    {
        self.is_mask_entry(items, id)?;
        let trail = self.locate(items, id);
        trail.leaf?;
        match trail.branch {
            Some(_) if items[id].node().bitlen() == 0 => Some(MaskRole::Interior),
            _ => Some(MaskRole::Terminal),
        }
    }

    /// Terminal -> Interior: the mask at `leaf_link` takes `child` beneath it.
    pub(crate) fn promote_mask<E>(
        &mut self,
        items: &mut [E],
        mask: ItemId,
        mut leaf_link: Link,
        child: ItemId,
    ) -> Result<(), Error>
    where
        E: Entry<Key = O::Key>,
    {
        let mask_len = items[mask].node().mask_len();
        if self.oddman == Some(mask) {
            // the mask's branch identity was idle; the newcomer's stays idle instead
            self.oddman = Some(child);
        } else {
            let branch_link = self.locate(items, mask).branch.ok_or(Error::NotLinked)?;
            self.move_branch(items, mask, child, branch_link);
            // the leaf may have hung directly off the branch that just moved
            if let Link::Child(host, slot) = leaf_link {
                if host == mask {
                    leaf_link = Link::Child(child, slot);
                }
            }
        }
        trace!("[MASK] promote item {} /{} over item {}", mask, mask_len, child);
        items[mask].node_mut().set_branch(mask_len, 0);
        self.set_link(items, Link::Child(mask, SLOT_ROOT), NodeRef::leaf(child));
        self.set_link(items, Link::Child(mask, SLOT_OTHER), NodeRef::leaf(mask));
        self.set_link(items, leaf_link, NodeRef::branch(mask));
        Ok(())
    }

    /// Interior -> Terminal: the mask's one-way branch at `branch_link` has
    /// lost its subtree and collapses to the mask's leaf. The branch identity
    /// is left free for the caller to reassign.
    pub(crate) fn demote_mask<E: Entry>(&mut self, items: &mut [E], mask: ItemId, branch_link: Link) {
        debug_assert_eq!(items[mask].node().bitlen(), 0);
        trace!("[MASK] demote item {}", mask);
        self.set_link(items, branch_link, NodeRef::leaf(mask));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Ipv4Ops, Record};

    fn records(keys: &[u32]) -> Vec<Record<u32>> {
        keys.iter().map(|&k| Record::new(k, ())).collect()
    }

    #[test]
    fn oddman_mask_promotes_without_relocation() {
        let mut items = records(&[0x0A00_0000, 0x0A01_0203]);
        let mut tree = PatriciaTree::new(Ipv4Ops).unwrap();
        tree.insert_mask(&mut items, 0, 8).unwrap();
        assert_eq!(tree.mask_role(&items, 0), Some(MaskRole::Terminal));
        assert_eq!(tree.oddman(), Some(0));

        tree.insert(&mut items, 1).unwrap();
        assert_eq!(tree.mask_role(&items, 0), Some(MaskRole::Interior));
        assert_eq!(tree.oddman(), Some(1));
        assert_eq!(tree.root(), NodeRef::branch(0));
    }

    #[test]
    fn busy_mask_hands_its_branch_to_the_newcomer() {
        // 10.0.0.0 full, 10.128.0.0/9 mask, then a key inside the mask
        let mut items = records(&[0x0A00_0000, 0x0A80_0000, 0x0A80_0001]);
        let mut tree = PatriciaTree::new(Ipv4Ops).unwrap();
        tree.insert(&mut items, 0).unwrap();
        tree.insert_mask(&mut items, 1, 9).unwrap();
        // the mask hosts the split at bit 8
        assert_eq!(tree.root(), NodeRef::branch(1));
        assert_eq!(tree.mask_role(&items, 1), Some(MaskRole::Terminal));

        tree.insert(&mut items, 2).unwrap();
        assert_eq!(tree.mask_role(&items, 1), Some(MaskRole::Interior));
        // the split moved to the newcomer, the mask now sits beneath it
        assert_eq!(tree.root(), NodeRef::branch(2));
        assert_eq!(tree.oddman(), Some(0));
        assert_eq!(items[2].node().slot(SLOT_ROOT), NodeRef::leaf(0));
        assert_eq!(items[2].node().slot(1), NodeRef::branch(1));
        assert_eq!(items[1].node().slot(SLOT_ROOT), NodeRef::leaf(2));
        assert_eq!(items[1].node().slot(SLOT_OTHER), NodeRef::leaf(1));
    }

    #[test]
    fn removing_the_last_dominated_key_demotes() {
        let mut items = records(&[0x0A00_0000, 0x0A80_0000, 0x0A80_0001]);
        let mut tree = PatriciaTree::new(Ipv4Ops).unwrap();
        tree.insert(&mut items, 0).unwrap();
        tree.insert_mask(&mut items, 1, 9).unwrap();
        tree.insert(&mut items, 2).unwrap();

        tree.remove(&mut items, 2).unwrap();
        assert_eq!(tree.mask_role(&items, 1), Some(MaskRole::Terminal));
        assert_eq!(tree.root(), NodeRef::branch(1));
        assert_eq!(items[1].node().bitlen(), 1);
        assert_eq!(tree.mask_role(&items, 2), None);
        let len: Option<BitLen> = tree.is_mask_entry(&items, 1);
        assert_eq!(len, Some(9));
        assert_eq!(tree.is_mask_entry(&items, 0), None);
    }
}
