//! Stock key operations: IPv4/IPv6 addresses and fixed-width byte strings.

use crate::helpers::{canonical, first_difference, get_bit, range_mask, v4_key};
use crate::ops::{one_way_or, KeyOps, RangeMatch};
use crate::types::{BitLen, BitOff, Slot};
use ipnet::{Ipv4Net, Ipv6Net};

#[inline]
fn wide_match(target: u128, other: u128, from: BitOff, limit: BitOff) -> RangeMatch {
    match first_difference(target, other, from, limit) {
        None => RangeMatch::Equal,
        Some(bitoff) => RangeMatch::Differ {
            bitoff,
            slot: get_bit(target, bitoff),
        },
    }
}

#[inline]
fn wide_agrees(probe: u128, node_key: u128, bitoff: BitOff, bitlen: BitOff) -> bool {
    (probe ^ node_key) & range_mask(bitoff, bitoff.saturating_add(bitlen)) == 0
}

/// IPv4 addresses as host-order `u32` keys, most significant bit first.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ipv4Ops;

impl Ipv4Ops {
    /// Key and mask length for a CIDR block, host bits cleared.
    pub fn prefix(net: &Ipv4Net) -> (u32, BitLen) {
        let plen = net.prefix_len() as BitLen;
        let key = canonical(v4_key(u32::from(net.addr())), plen);
        ((key >> 96) as u32, plen)
    }
}

impl KeyOps for Ipv4Ops {
    type Key = u32;
    type Probe = u32;

    fn key_bits(&self) -> BitOff {
        32
    }

    fn match_range(&self, target: &u32, other: Option<&u32>, from: BitOff, limit: BitOff) -> RangeMatch {
        let other = other.map_or(0, |o| v4_key(*o));
        wide_match(v4_key(*target), other, from, limit.min(32))
    }

    fn test_bit(&self, target: &u32, bitoff: BitOff, bitlen: u8) -> Slot {
        one_way_or(bitlen, || get_bit(v4_key(*target), bitoff))
    }

    fn match_key(&self, probe: &u32, node_key: &u32, bitoff: BitOff, bitlen: BitOff) -> bool {
        wide_agrees(v4_key(*probe), v4_key(*node_key), bitoff, bitlen)
    }

    fn test_key_bit(&self, probe: &u32, bitoff: BitOff, bitlen: u8) -> Slot {
        self.test_bit(probe, bitoff, bitlen)
    }
}

/// IPv6 addresses as `u128` keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ipv6Ops;

impl Ipv6Ops {
    pub fn prefix(net: &Ipv6Net) -> (u128, BitLen) {
        let plen = net.prefix_len() as BitLen;
        (canonical(u128::from(net.addr()), plen), plen)
    }
}

impl KeyOps for Ipv6Ops {
    type Key = u128;
    type Probe = u128;

    fn key_bits(&self) -> BitOff {
        128
    }

    fn match_range(&self, target: &u128, other: Option<&u128>, from: BitOff, limit: BitOff) -> RangeMatch {
        wide_match(*target, other.copied().unwrap_or(0), from, limit.min(128))
    }

    fn test_bit(&self, target: &u128, bitoff: BitOff, bitlen: u8) -> Slot {
        one_way_or(bitlen, || get_bit(*target, bitoff))
    }

    fn match_key(&self, probe: &u128, node_key: &u128, bitoff: BitOff, bitlen: BitOff) -> bool {
        wide_agrees(*probe, *node_key, bitoff, bitlen)
    }

    fn test_key_bit(&self, probe: &u128, bitoff: BitOff, bitlen: u8) -> Slot {
        self.test_bit(probe, bitoff, bitlen)
    }
}

/// Fixed-width byte strings of `N` bytes, bit 0 being the top bit of byte 0.
///
/// Probes may be any byte slice; bytes missing from a short probe read as zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct BitStringOps<const N: usize>;

#[inline]
fn byte_at(key: &[u8], index: usize) -> u8 {
    key.get(index).copied().unwrap_or(0)
}

#[inline]
fn bit_at(key: &[u8], bitoff: BitOff) -> Slot {
    let byte = byte_at(key, bitoff as usize / 8);
    ((byte >> (7 - bitoff % 8)) & 1) as Slot
}

fn bytes_match(target: &[u8], other: Option<&[u8]>, from: BitOff, limit: BitOff) -> RangeMatch {
    let (from, limit) = (from as u32, limit as u32);
    let mut bit = from;
    while bit < limit {
        let index = (bit / 8) as usize;
        let start = bit % 8;
        let end = (limit - index as u32 * 8).min(8);
        let window = (0xffu8 >> start) & (0xffu8 << (8 - end));
        let diff = (byte_at(target, index) ^ other.map_or(0, |o| byte_at(o, index))) & window;
        if diff != 0 {
            let bitoff = (index as u32 * 8 + diff.leading_zeros()) as BitOff;
            return RangeMatch::Differ {
                bitoff,
                slot: bit_at(target, bitoff),
            };
        }
        bit = (index as u32 + 1) * 8;
    }
    RangeMatch::Equal
}

impl<const N: usize> KeyOps for BitStringOps<N> {
    type Key = [u8; N];
    type Probe = [u8];

    fn key_bits(&self) -> BitOff {
        (N * 8).min(u16::MAX as usize) as BitOff
    }

    fn match_range(&self, target: &[u8; N], other: Option<&[u8; N]>, from: BitOff, limit: BitOff) -> RangeMatch {
        bytes_match(target, other.map(|o| &o[..]), from, limit.min(self.key_bits()))
    }

    fn test_bit(&self, target: &[u8; N], bitoff: BitOff, bitlen: u8) -> Slot {
        one_way_or(bitlen, || bit_at(target, bitoff))
    }

    fn match_key(&self, probe: &[u8], node_key: &[u8; N], bitoff: BitOff, bitlen: BitOff) -> bool {
        let limit = bitoff.saturating_add(bitlen).min(self.key_bits());
        bytes_match(probe, Some(&node_key[..]), bitoff, limit).is_equal()
    }

    fn test_key_bit(&self, probe: &[u8], bitoff: BitOff, bitlen: u8) -> Slot {
        one_way_or(bitlen, || bit_at(probe, bitoff))
    }
}
