//! Zero-allocation PATRICIA trie with CIDR-style mask entries.
//!
//! Every item embeds a [`Node`] that serves two roles at once: the item's
//! leaf, and one branch somewhere above that leaf. A tree of `n` items needs
//! only `n - 1` branches, so exactly one item (the *oddman*) has its branch
//! role idle. Mask entries are leaves until a longer key lands under them,
//! at which point their branch role becomes a one-way branch that dominates
//! the longer keys (see [`mask`]).
//!
//! The tree is unsynchronised; callers serialise access. Items stay in a
//! caller-owned slice and are named by their index in it.

pub mod constants;
pub mod errors;
pub mod helpers;
pub mod keys;
pub mod mask;
pub mod ops;
pub mod telemetry;
pub mod types;

#[cfg(feature = "check")]
mod check;
mod insert;
mod lookup;
mod remove;

pub use errors::{Error, ErrorCode};
pub use keys::{BitStringOps, Ipv4Ops, Ipv6Ops};
pub use lookup::Iter;
pub use mask::MaskRole;
pub use ops::{KeyOps, RangeMatch};
pub use types::{BitLen, BitOff, Direction, Entry, Identity, ItemId, Node, NodeRef, PatriciaTree, Record, Slot};

use constants::*;
use log::trace;
use once_cell::sync::OnceCell;
use types::{Link, Trail};

impl<O: KeyOps> PatriciaTree<O> {
    // ---- logging bootstraper -------------------------------------------------
    fn ensure_logging() {
        static INIT: OnceCell<()> = OnceCell::new();
        INIT.get_or_init(|| {
            let _ = env_logger::builder()
                .format_timestamp(None)
                .is_test(std::env::var("RUST_TEST_THREADS").is_ok())
                .try_init();
        });
    }

    /// Create an empty tree driven by `ops`.
    pub fn new(ops: O) -> Result<Self, Error> {
        Self::ensure_logging();
        telemetry::init();
        if ops.key_bits() > MAX_KEY_BITS {
            return Err(Error::KeyTooLong);
        }
        Ok(Self {
            root: NodeRef::NULL,
            oddman: None,
            len: 0,
            ops,
        })
    }

    /// Number of items in the tree.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Reference installed at the top of the tree.
    pub fn root(&self) -> NodeRef {
        self.root
    }

    /// The item whose branch identity is currently unused.
    pub fn oddman(&self) -> Option<ItemId> {
        self.oddman
    }

    pub fn ops(&self) -> &O {
        &self.ops
    }

    /// Upper bound on the length of any root-to-leaf walk.
    #[inline]
    pub(crate) fn walk_limit(&self) -> usize {
        2 * self.len + 2
    }

    #[inline]
    pub(crate) fn get_link<E: Entry>(&self, items: &[E], link: Link) -> NodeRef {
        match link {
            Link::Root => self.root,
            Link::Child(host, slot) => items[host].node().slot(slot),
        }
    }

    /// Install `r` at `link` and record the new position on its node.
    pub(crate) fn set_link<E: Entry>(&mut self, items: &mut [E], link: Link, r: NodeRef) {
        match link {
            Link::Root => self.root = r,
            Link::Child(host, slot) => items[host].node_mut().set_slot(slot, r),
        }
        match r.identity() {
            Some(Identity::Leaf) => items[r.index()].node_mut().set_leaf_position(link.slot()),
            Some(Identity::Branch) => items[r.index()].node_mut().set_branch_position(link.slot()),
            None => {}
        }
    }

    /// Descend with `id`'s own key and note where its identities sit.
    ///
    /// An item's branch, when used, is always an ancestor of its leaf, so a
    /// single descent finds both.
    pub(crate) fn locate<E>(&self, items: &[E], id: ItemId) -> Trail
    where
        E: Entry<Key = O::Key>,
    {
        let key = items[id].key();
        let mut trail = Trail::default();
        let mut link = Link::Root;
        for _ in 0..self.walk_limit() {
            let r = self.get_link(items, link);
            match r.identity() {
                None => break,
                Some(Identity::Leaf) => {
                    if r.index() == id {
                        trail.leaf = Some(link);
                    }
                    break;
                }
                Some(Identity::Branch) => {
                    let host = r.index();
                    if host >= items.len() {
                        break;
                    }
                    let node = items[host].node();
                    let slot = if node.bitlen() == 0 {
                        // a mask's own leaf hangs off the other side of its branch
                        if host == id {
                            SLOT_OTHER
                        } else {
                            SLOT_ROOT
                        }
                    } else {
                        self.ops.test_bit(key, node.bitoff(), node.bitlen())
                    };
                    if host == id {
                        trail.branch = Some(link);
                    }
                    trail.parent = Some(link);
                    link = Link::Child(host, slot);
                }
            }
        }
        trail
    }

    /// Hand the two-way branch hosted by `src` over to `dst`'s branch identity.
    ///
    /// `src_link` is where `src`'s branch is installed. Leaves do not move.
    pub(crate) fn move_branch<E: Entry>(&mut self, items: &mut [E], src: ItemId, dst: ItemId, src_link: Link) {
        let (bitoff, bitlen, left, right) = {
            let n = items[src].node();
            (n.bitoff(), n.bitlen(), n.slot(SLOT_LEFT), n.slot(SLOT_RIGHT))
        };
        debug_assert_eq!(bitlen, 1, "only two-way branches are relocated");
        debug_assert_ne!(left, NodeRef::branch(dst));
        debug_assert_ne!(right, NodeRef::branch(dst));
        trace!("[MOVE] branch @{} from item {} to item {}", bitoff, src, dst);
        let n = items[dst].node_mut();
        n.set_branch(bitoff, bitlen);
        n.set_slot(SLOT_LEFT, left);
        n.set_slot(SLOT_RIGHT, right);
        self.set_link(items, src_link, NodeRef::branch(dst));
    }

    pub(crate) fn check_id<E: Entry>(items: &[E], id: ItemId) -> Result<(), Error> {
        if id >= items.len() || id >= MAX_ITEMS {
            return Err(Error::InvalidItem);
        }
        Ok(())
    }

    #[cfg(feature = "paranoid")]
    pub(crate) fn paranoid_check<E>(&self, items: &[E])
    where
        E: Entry<Key = O::Key>,
    {
        assert!(self.check(items), "ptree consistency check failed");
    }

    #[cfg(not(feature = "paranoid"))]
    #[inline(always)]
    pub(crate) fn paranoid_check<E>(&self, _items: &[E])
    where
        E: Entry<Key = O::Key>,
    {
    }
}
