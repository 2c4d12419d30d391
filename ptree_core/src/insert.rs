//! Insertion of full keys and mask entries.

use crate::constants::*;
use crate::errors::Error;
use crate::ops::{KeyOps, RangeMatch};
use crate::types::{BitLen, BitOff, Entry, ItemId, Link, NodeRef, PatriciaTree, Slot};
use log::{debug, trace};
use metrics::counter;

/// Where a descent for a new item came to rest.
enum Placement {
    /// Split at the first disagreeing bit with whatever sits at the link.
    Branch { link: Link, bitoff: BitOff, slot: Slot },
    /// The new mask dominates whatever sits at the link.
    MaskAbove { link: Link },
    /// The terminal mask at the link gets the new item beneath it.
    Promote { link: Link, mask: ItemId },
}

impl<O: KeyOps> PatriciaTree<O> {
    /// Insert a full-length key.
    pub fn insert<E>(&mut self, items: &mut [E], id: ItemId) -> Result<(), Error>
    where
        E: Entry<Key = O::Key>,
    {
        Self::check_id(items, id)?;
        if items[id].node().is_linked() {
            return Err(self.reject(Error::AlreadyLinked));
        }
        items[id].node_mut().reset();
        debug!("[INSERT] item={} len={}", id, self.len);
        self.insert_common(items, id)
    }

    /// Insert a prefix entry covering the first `mask_len` bits of the key.
    pub fn insert_mask<E>(&mut self, items: &mut [E], id: ItemId, mask_len: BitLen) -> Result<(), Error>
    where
        E: Entry<Key = O::Key>,
    {
        Self::check_id(items, id)?;
        if items[id].node().is_linked() {
            return Err(self.reject(Error::AlreadyLinked));
        }
        let key_bits = self.ops.key_bits();
        if mask_len > key_bits {
            return Err(self.reject(Error::InvalidMask));
        }
        if !self.compare(items[id].key(), None, mask_len, key_bits).is_equal() {
            debug!("[INSERT] item={} has bits set past /{}", id, mask_len);
            return Err(self.reject(Error::InvalidMask));
        }
        let node = items[id].node_mut();
        node.reset();
        node.set_mask(mask_len);
        debug!("[INSERT] mask item={} /{} len={}", id, mask_len, self.len);
        let res = self.insert_common(items, id);
        if res.is_err() {
            items[id].node_mut().reset();
        }
        res
    }

    fn reject(&self, e: Error) -> Error {
        counter!(METRIC_INSERT_REJECTS).increment(1);
        debug!("[INSERT] rejected: {}", e);
        e
    }

    /// `match_range` with an empty range short-circuited.
    #[inline]
    pub(crate) fn compare(&self, target: &O::Key, other: Option<&O::Key>, from: BitOff, limit: BitOff) -> RangeMatch {
        if from >= limit {
            return RangeMatch::Equal;
        }
        self.ops.match_range(target, other, from, limit)
    }

    fn insert_common<E>(&mut self, items: &mut [E], id: ItemId) -> Result<(), Error>
    where
        E: Entry<Key = O::Key>,
    {
        if self.root.is_null() {
            trace!("[INSERT] empty tree, item {} becomes root and oddman", id);
            self.set_link(items, Link::Root, NodeRef::leaf(id));
            self.oddman = Some(id);
            self.finish_insert(items, id);
            return Ok(());
        }

        let placement = self.descend(items, id).map_err(|e| self.reject(e))?;
        match placement {
            Placement::Branch { link, bitoff, slot } => self.insert_branch(items, id, link, bitoff, slot),
            Placement::MaskAbove { link } => self.insert_mask_above(items, id, link),
            Placement::Promote { link, mask } => self.promote_mask(items, mask, link, id)?,
        }
        self.finish_insert(items, id);
        Ok(())
    }

    /// Walk down from the root until the new item's place is known.
    /// Nothing is modified.
    fn descend<E>(&self, items: &[E], id: ItemId) -> Result<Placement, Error>
    where
        E: Entry<Key = O::Key>,
    {
        let target = &items[id];
        let tkey = target.key();
        let target_mask = target.node().is_mask().then(|| target.node().mask_len());
        let key_bits = self.ops.key_bits();
        let mut link = Link::Root;
        // bits [0, bitoff) are known to agree with everything below `link`
        let mut bitoff: BitOff = 0;

        for _ in 0..self.walk_limit() {
            let r = self.get_link(items, link);
            let host = r.index();
            if r.is_null() || host >= items.len() {
                break;
            }
            let hkey = items[host].key();

            if r.is_leaf() {
                let host_mask = items[host].node().is_mask().then(|| items[host].node().mask_len());
                let limit = target_mask.unwrap_or(key_bits).min(host_mask.unwrap_or(key_bits));
                if let RangeMatch::Differ { bitoff, slot } = self.compare(tkey, Some(hkey), bitoff, limit) {
                    return Ok(Placement::Branch { link, bitoff, slot });
                }
                return match (target_mask, host_mask) {
                    (None, None) => Err(Error::DuplicateKey),
                    (Some(_), None) => Ok(Placement::MaskAbove { link }),
                    (None, Some(_)) => Ok(Placement::Promote { link, mask: host }),
                    (Some(t), Some(h)) if t == h => Err(Error::DuplicateMask),
                    (Some(t), Some(h)) if t < h => Ok(Placement::MaskAbove { link }),
                    (Some(_), Some(_)) => Ok(Placement::Promote { link, mask: host }),
                };
            }

            let node = items[host].node();
            let (b, l) = (node.bitoff(), node.bitlen());
            debug_assert!(b >= bitoff, "bit offsets must not decrease");

            if let Some(m) = target_mask.filter(|&m| m <= b) {
                // the mask ends at or before this branch tests anything
                return match self.compare(tkey, Some(hkey), bitoff, m) {
                    RangeMatch::Differ { bitoff, slot } => Ok(Placement::Branch { link, bitoff, slot }),
                    RangeMatch::Equal if l == 0 && b == m => Err(Error::DuplicateMask),
                    RangeMatch::Equal => Ok(Placement::MaskAbove { link }),
                };
            }

            if let RangeMatch::Differ { bitoff, slot } = self.compare(tkey, Some(hkey), bitoff, b) {
                return Ok(Placement::Branch { link, bitoff, slot });
            }

            let slot = if l == 0 {
                SLOT_ROOT
            } else {
                self.ops.test_bit(tkey, b, l)
            };
            bitoff = b + l as BitOff;
            link = Link::Child(host, slot);
        }
        // dangling or cyclic links: the tree was corrupted by misuse
        Err(Error::NotLinked)
    }

    /// New two-way branch at `bitoff`, hosted by the new item.
    fn insert_branch<E: Entry>(&mut self, items: &mut [E], id: ItemId, link: Link, bitoff: BitOff, slot: Slot) {
        let existing = self.get_link(items, link);
        trace!("[INSERT] branch @{} for item {} over {:?}", bitoff, id, existing);
        items[id].node_mut().set_branch(bitoff, 1);
        self.set_link(items, Link::Child(id, slot), NodeRef::leaf(id));
        self.set_link(items, Link::Child(id, slot ^ 1), existing);
        self.set_link(items, link, NodeRef::branch(id));
    }

    /// New one-way branch for the mask being inserted, above whatever is at `link`.
    fn insert_mask_above<E: Entry>(&mut self, items: &mut [E], id: ItemId, link: Link) {
        let existing = self.get_link(items, link);
        let mask_len = items[id].node().mask_len();
        trace!("[INSERT] mask item {} /{} above {:?}", id, mask_len, existing);
        items[id].node_mut().set_branch(mask_len, 0);
        self.set_link(items, Link::Child(id, SLOT_ROOT), existing);
        self.set_link(items, Link::Child(id, SLOT_OTHER), NodeRef::leaf(id));
        self.set_link(items, link, NodeRef::branch(id));
    }

    fn finish_insert<E>(&mut self, items: &mut [E], id: ItemId)
    where
        E: Entry<Key = O::Key>,
    {
        items[id].node_mut().set_linked();
        self.len += 1;
        counter!(METRIC_INSERTS).increment(1);
        debug!("[INSERT] item={} done, len={} oddman={:?}", id, self.len, self.oddman);
        self.paranoid_check(items);
    }
}
