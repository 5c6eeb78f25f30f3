//! Membership filter answers "was this string added before?" using a fixed
//! bit array and `k` seeded hash probes per item:
//! - `add` sets the `k` probed bits.
//! - `contains` reports `true` only when all `k` probed bits are set.
//!
//! Bits are never cleared, so an added item is always reported as present
//! (no false negatives). Items that were never added may still be reported
//! as present when their probes land on bits set by other items; the rate of
//! such false positives is governed by the number of bits, the number of
//! probes and the number of items added.
//!
//! # Data storage format
//!
//! Bits are packed into `u64` words, bit `i` lives in word `i / 64` at offset `i % 64`.
//! The last word may be partially used when `num_bits` is not a multiple of 64.
//!
//! # Hashing
//!
//! Probe `i` hashes the item bytes with `wyhash` seeded with `i` and reduces the
//! result modulo `num_bits`, so indices only depend on the item and the filter shape.

use std::f64::consts::LN_2;
use std::fmt::{Debug, Formatter};
use std::mem::{size_of, size_of_val};

use tracing::debug;
use wyhash::wyhash;

use crate::error::{Error, Result};

/// Upper bound for the number of probes picked by `with_false_positive_rate`
const MAX_SIZED_HASHES: u32 = 32;
/// Upper bound for the number of bits picked by `with_false_positive_rate` (128 GiB)
const MAX_SIZED_BITS: u64 = 1 << 40;

#[derive(Clone, PartialEq, Eq)]
pub struct MembershipFilter {
    /// Packed bit array
    bits: Vec<u64>,
    /// Number of addressable bits
    num_bits: usize,
    /// Number of hash probes per item
    num_hashes: u32,
    /// Number of `add` calls
    count: u64,
}

impl MembershipFilter {
    /// Creates a filter with `num_bits` bits (all unset) and `num_hashes` probes per item.
    pub fn new(num_bits: usize, num_hashes: u32) -> Result<Self> {
        if num_bits == 0 {
            return Err(Error::invalid("num_bits", "must be positive"));
        }
        if num_hashes == 0 {
            return Err(Error::invalid("num_hashes", "must be positive"));
        }

        debug!(num_bits, num_hashes, "created membership filter");

        Ok(Self {
            bits: vec![0u64; num_bits.div_ceil(64)],
            num_bits,
            num_hashes,
            count: 0,
        })
    }

    /// Creates a filter sized to hold `expected_items` items at the given false positive rate.
    ///
    /// Uses `m = -n * ln(p) / ln(2)^2` bits and `k = (m / n) * ln(2)` probes, with `k`
    /// clamped to `[1, 32]`. Fails when `m` exceeds 2^40 bits.
    pub fn with_false_positive_rate(
        expected_items: usize,
        false_positive_rate: f64,
    ) -> Result<Self> {
        if expected_items == 0 {
            return Err(Error::invalid("expected_items", "must be positive"));
        }
        if !(false_positive_rate > 0.0 && false_positive_rate < 1.0) {
            return Err(Error::invalid(
                "false_positive_rate",
                format!("{false_positive_rate} is not in (0, 1)"),
            ));
        }

        let n = expected_items as f64;
        let required_bits = (-n * false_positive_rate.ln() / (LN_2 * LN_2)).ceil();
        if required_bits > MAX_SIZED_BITS as f64 {
            return Err(Error::invalid(
                "expected_items",
                format!(
                    "{expected_items} items at rate {false_positive_rate} need {required_bits:e} bits, \
                     more than {MAX_SIZED_BITS}"
                ),
            ));
        }
        let num_bits = required_bits as usize;
        let num_hashes = ((num_bits as f64 / n) * LN_2).round() as u32;

        Self::new(num_bits.max(1), num_hashes.clamp(1, MAX_SIZED_HASHES))
    }

    /// Returns bit indices probed for `item`, one per hash function.
    ///
    /// The same item always yields the same indices for a given filter shape.
    pub fn hash_indices<'a>(&self, item: &'a str) -> impl Iterator<Item = usize> + 'a {
        let num_bits = self.num_bits as u64;
        (0..self.num_hashes)
            .map(move |seed| (wyhash(item.as_bytes(), u64::from(seed)) % num_bits) as usize)
    }

    /// Add `item` to the filter
    #[inline]
    pub fn add(&mut self, item: &str) {
        self.count += 1;
        for idx in self.hash_indices(item) {
            self.bits[idx / 64] |= 1u64 << (idx % 64);
        }
    }

    /// Check whether `item` might have been added.
    ///
    /// `false` is definite, `true` may be a false positive.
    #[inline]
    pub fn contains(&self, item: &str) -> bool {
        self.hash_indices(item).all(|idx| self.bit(idx))
    }

    #[inline]
    fn bit(&self, idx: usize) -> bool {
        self.bits[idx / 64] & (1u64 << (idx % 64)) != 0
    }

    /// Number of bits in the filter
    pub fn num_bits(&self) -> usize {
        self.num_bits
    }

    /// Number of hash probes per item
    pub fn num_hashes(&self) -> u32 {
        self.num_hashes
    }

    /// Number of `add` calls, including repeated items
    pub fn len(&self) -> u64 {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Number of bits set to 1
    pub fn bits_set(&self) -> usize {
        self.bits.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Estimate the current false positive rate from the fill ratio of the bit array
    pub fn estimated_false_positive_rate(&self) -> f64 {
        let fill_ratio = self.bits_set() as f64 / self.num_bits as f64;
        fill_ratio.powf(f64::from(self.num_hashes))
    }

    /// Return memory size of `MembershipFilter`
    pub fn size_of(&self) -> usize {
        size_of::<Self>() + size_of_val(self.bits.as_slice())
    }
}

impl Debug for MembershipFilter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{{ bits: {}, hashes: {}, bits_set: {}, size: {} }}",
            self.num_bits,
            self.num_hashes,
            self.bits_set(),
            self.size_of()
        )
    }
}
