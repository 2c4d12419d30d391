//! Removal of items.

use crate::constants::METRIC_REMOVES;
use crate::errors::Error;
use crate::ops::KeyOps;
use crate::types::{Entry, ItemId, Link, NodeRef, PatriciaTree};
use log::{debug, trace};
use metrics::counter;

impl<O: KeyOps> PatriciaTree<O> {
    /// Remove a previously inserted item.
    ///
    /// The item's node is reset afterwards, so the record may be inserted
    /// again. Items that are not members are refused without touching the
    /// tree.
    pub fn remove<E>(&mut self, items: &mut [E], id: ItemId) -> Result<(), Error>
    where
        E: Entry<Key = O::Key>,
    {
        Self::check_id(items, id)?;
        if !items[id].node().is_linked() {
            return Err(Error::NotLinked);
        }
        debug!("[REMOVE] item={} len={}", id, self.len);

        let trail = self.locate(items, id);
        let leaf_link = trail.leaf.ok_or(Error::NotLinked)?;

        match (leaf_link, trail.parent) {
            (Link::Root, _) => {
                trace!("[REMOVE] last item, tree is now empty");
                self.root = NodeRef::NULL;
                self.oddman = None;
            }
            (Link::Child(parent, slot), Some(parent_link)) => {
                self.unlink_leaf(items, id, parent, slot, parent_link, trail.branch);
            }
            (Link::Child(..), None) => return Err(Error::NotLinked),
        }

        items[id].node_mut().reset();
        self.len -= 1;
        counter!(METRIC_REMOVES).increment(1);
        debug!("[REMOVE] item={} done, len={} oddman={:?}", id, self.len, self.oddman);
        self.paranoid_check(items);
        Ok(())
    }

    /// Take `id`'s leaf out of `parent`'s branch (installed at `parent_link`),
    /// then give whatever branch duty `id` had to the freed parent branch.
    fn unlink_leaf<E: Entry>(
        &mut self,
        items: &mut [E],
        id: ItemId,
        parent: ItemId,
        slot: usize,
        parent_link: Link,
        branch_link: Option<Link>,
    ) {
        let parent_is_mask = items[parent].node().bitlen() == 0;
        let sibling = items[parent].node().slot(slot ^ 1);

        if parent == id {
            // The leaf hangs off its own branch: both identities leave together.
            trace!("[REMOVE] item {} splices {:?} into its place", id, sibling);
            self.set_link(items, parent_link, sibling);
            return;
        }

        // The parent's branch is freed here. `parent_link` may be a slot of
        // `id`'s own branch, so this has to happen before that branch is
        // copied below.
        if parent_is_mask {
            debug_assert_eq!(sibling, NodeRef::leaf(parent));
            self.demote_mask(items, parent, parent_link);
        } else {
            trace!("[REMOVE] branch of item {} collapses to {:?}", parent, sibling);
            self.set_link(items, parent_link, sibling);
        }

        match branch_link {
            None => {
                debug_assert_eq!(self.oddman, Some(id));
                trace!("[REMOVE] item {} was the oddman, item {} takes over", id, parent);
                self.oddman = Some(parent);
            }
            Some(branch_link) => self.move_branch(items, id, parent, branch_link),
        }
    }
}
