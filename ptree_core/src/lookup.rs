//! Longest-prefix lookup and ordered iteration.

use crate::constants::*;
use crate::ops::KeyOps;
use crate::types::{BitOff, Direction, Entry, Identity, ItemId, NodeRef, PatriciaTree};
use log::trace;
use metrics::counter;

/// What follows the item an iteration step started from.
enum Successor {
    Item(ItemId),
    Subtree(NodeRef),
}

impl<O: KeyOps> PatriciaTree<O> {
    /// Exact or longest-prefix match for `key`.
    pub fn find<E>(&self, items: &[E], key: &O::Probe) -> Option<ItemId>
    where
        E: Entry<Key = O::Key>,
    {
        self.find_filtered(items, key, |_, _| true)
    }

    /// Exact match against full keys only; masks are ignored.
    pub fn find_exact<E>(&self, items: &[E], key: &O::Probe) -> Option<ItemId>
    where
        E: Entry<Key = O::Key>,
    {
        self.find_filtered(items, key, |_, is_mask| !is_mask)
    }

    /// Exact or longest-prefix match for `key` among the entries `filter`
    /// accepts.
    ///
    /// `filter` sees each candidate together with whether it is a mask
    /// entry. A full key that matches exactly wins over any mask; otherwise
    /// the longest accepted matching mask wins.
    pub fn find_filtered<E, F>(&self, items: &[E], key: &O::Probe, mut filter: F) -> Option<ItemId>
    where
        E: Entry<Key = O::Key>,
        F: FnMut(&E, bool) -> bool,
    {
        counter!(METRIC_LOOKUPS).increment(1);
        let key_bits = self.ops.key_bits();
        let mut best = None;
        // bits [0, matched) are verified against the last mask passed
        let mut matched: BitOff = 0;
        let mut r = self.root;

        for _ in 0..self.walk_limit() {
            let Some(identity) = r.identity() else { break };
            let id = r.index();
            let item = items.get(id)?;
            let node = item.node();

            if identity == Identity::Branch {
                if node.bitlen() == 0 {
                    let mask_len = node.bitoff();
                    if !self.ops.match_key(key, item.key(), matched, mask_len - matched) {
                        break;
                    }
                    matched = mask_len;
                    if filter(item, true) {
                        best = Some(id);
                    }
                    r = node.slot(SLOT_ROOT);
                } else {
                    r = node.slot(self.ops.test_key_bit(key, node.bitoff(), node.bitlen()));
                }
                continue;
            }

            let is_mask = node.is_mask();
            let len = if is_mask { node.mask_len() } else { key_bits };
            debug_assert!(len >= matched);
            if self.ops.match_key(key, item.key(), matched, len - matched) && filter(item, is_mask) {
                best = Some(id);
            }
            break;
        }

        if best.is_some() {
            counter!(METRIC_LOOKUP_HITS).increment(1);
        }
        trace!("[LOOKUP] -> {:?}", best);
        best
    }

    /// The item after `from` in key order, or the first item when `from` is
    /// `None`. Masks sort before the longer keys they cover.
    ///
    /// Each call walks down from the root; no state is kept between calls.
    /// An unlinked `from` yields `None`.
    pub fn iterate<E>(&self, items: &[E], from: Option<ItemId>, dir: Direction) -> Option<ItemId>
    where
        E: Entry<Key = O::Key>,
    {
        let Some(from) = from else {
            return self.edge(items, self.root, dir);
        };
        let key = items.get(from)?.key();
        let mut next = None;
        let mut r = self.root;

        for _ in 0..self.walk_limit() {
            match r.identity()? {
                Identity::Leaf if r.index() == from => {
                    return match next? {
                        Successor::Item(id) => Some(id),
                        Successor::Subtree(sub) => self.edge(items, sub, dir),
                    };
                }
                Identity::Leaf => return None,
                Identity::Branch => {
                    let host = r.index();
                    let node = items.get(host)?.node();
                    if node.bitlen() == 0 {
                        if host == from {
                            // a mask comes just before the keys it covers
                            if dir == Direction::Ascending {
                                next = Some(Successor::Subtree(node.slot(SLOT_ROOT)));
                            }
                            r = node.slot(SLOT_OTHER);
                        } else {
                            if dir == Direction::Descending {
                                next = Some(Successor::Item(host));
                            }
                            r = node.slot(SLOT_ROOT);
                        }
                    } else {
                        let slot = self.ops.test_bit(key, node.bitoff(), node.bitlen());
                        match (dir, slot) {
                            (Direction::Ascending, SLOT_LEFT) => {
                                next = Some(Successor::Subtree(node.slot(SLOT_RIGHT)))
                            }
                            (Direction::Descending, SLOT_RIGHT) => {
                                next = Some(Successor::Subtree(node.slot(SLOT_LEFT)))
                            }
                            _ => {}
                        }
                        r = node.slot(slot);
                    }
                }
            }
        }
        None
    }

    /// First (ascending) or last (descending) item under `r`.
    fn edge<E: Entry>(&self, items: &[E], mut r: NodeRef, dir: Direction) -> Option<ItemId> {
        for _ in 0..self.walk_limit() {
            match r.identity()? {
                Identity::Leaf => return Some(r.index()),
                Identity::Branch => {
                    let host = r.index();
                    let node = items.get(host)?.node();
                    r = match (node.bitlen(), dir) {
                        (0, Direction::Ascending) => return Some(host),
                        (0, Direction::Descending) => node.slot(SLOT_ROOT),
                        (_, Direction::Ascending) => node.slot(SLOT_LEFT),
                        (_, Direction::Descending) => node.slot(SLOT_RIGHT),
                    };
                }
            }
        }
        None
    }

    /// Walk every item in order.
    pub fn iter<'a, E>(&'a self, items: &'a [E], dir: Direction) -> Iter<'a, O, E>
    where
        E: Entry<Key = O::Key>,
    {
        Iter {
            tree: self,
            items,
            dir,
            last: None,
            done: false,
        }
    }
}

/// Borrowing iterator over item ids, built on [`PatriciaTree::iterate`].
pub struct Iter<'a, O: KeyOps, E> {
    tree: &'a PatriciaTree<O>,
    items: &'a [E],
    dir: Direction,
    last: Option<ItemId>,
    done: bool,
}

impl<'a, O, E> Iterator for Iter<'a, O, E>
where
    O: KeyOps,
    E: Entry<Key = O::Key>,
{
    type Item = ItemId;

    fn next(&mut self) -> Option<ItemId> {
        if self.done {
            return None;
        }
        let next = self.tree.iterate(self.items, self.last, self.dir);
        match next {
            Some(id) => self.last = Some(id),
            None => self.done = true,
        }
        next
    }
}
