//! Cardinality estimator allows to estimate number of distinct elements
//! in the stream or dataset and is configured with a target relative error:
//! - `relative_error`: desired standard error in (0, 1) range, which defines
//!   number of HyperLogLog registers `M = 2^P` such that `1.04 / sqrt(M) <= relative_error`.
//! - `P`: derived precision in [4..18] range, the number of hash bits used
//!   for register indices.
//!
//! # Data-structure design rationale
//!
//! ## Bounded memory
//! Every register is a single byte, so memory usage is fixed at construction:
//!   relative_error = 0.05:  M = 512     (512 bytes of registers)
//!   relative_error = 0.01:  M = 16384   (16 KiB of registers)
//!   relative_error = 0.005: M = 65536   (64 KiB of registers)
//!
//! ## Low latency
//! - Number of zero registers and registers' harmonic sum are
//!   updated dynamically as more data being inserted,
//!   allowing to have constant time `estimate` operations.
//!
//! ## Accuracy
//! - Raw HyperLogLog estimate `alpha(M) * M^2 / sum(2^-register)`.
//! - Small range (raw estimate <= 2.5 * M with zero registers left) uses linear counting.
//! - Large range (raw estimate > 2^32 / 30) is corrected for 32-bit hashes only,
//!   64-bit hashes do not saturate in practice.
//!
//! Original HyperLogLog paper:
//! https://algo.inria.fr/flajolet/Publications/FlFuGaMe07.pdf
//!
//! # Hash layout
//! - bits `0..P`       - register index
//! - bits `P..width`   - remainder, register rank is the number of its leading zeros plus one

use std::fmt::{Debug, Formatter};
use std::hash::{BuildHasher, BuildHasherDefault, Hash, Hasher};
use std::mem::{size_of, size_of_val};

use tracing::debug;
use wyhash::WyHash;

use crate::error::{Error, Result};

/// Smallest supported precision (16 registers)
pub const MIN_PRECISION: u32 = 4;
/// Largest supported precision (262144 registers)
pub const MAX_PRECISION: u32 = 18;

/// `2^32` - the range of 32-bit hashes
const TWO_POW_32: f64 = 4_294_967_296.0;
/// Raw estimate above which 32-bit hashes need large range correction
const LARGE_RANGE_THRESHOLD: f64 = TWO_POW_32 / 30.0;

/// Number of hash bits consumed per inserted item
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HashWidth {
    /// Low 32 bits of the item hash, enables large range correction
    Bits32,
    #[default]
    Bits64,
}

impl HashWidth {
    #[inline]
    fn bits(self) -> u32 {
        match self {
            HashWidth::Bits32 => 32,
            HashWidth::Bits64 => 64,
        }
    }
}

pub struct CardinalityEstimator<H: Hasher + Default = WyHash> {
    /// Configured target error
    relative_error: f64,
    /// Number of hash bits used for register indices
    precision: u32,
    width: HashWidth,
    /// Register ranks, `2^precision` of them
    registers: Vec<u8>,
    /// Number of registers still set to 0
    zeros: u32,
    /// Harmonic sum `sum(2^-register)`
    sum: f64,
    /// Zero-sized build hasher
    build_hasher: BuildHasherDefault<H>,
}

impl CardinalityEstimator<WyHash> {
    /// Creates new `CardinalityEstimator` hashing items with `WyHash` into 64 bits
    pub fn new(relative_error: f64) -> Result<Self> {
        Self::with_hash_width(relative_error, HashWidth::Bits64)
    }
}

impl<H: Hasher + Default> CardinalityEstimator<H> {
    /// Creates new `CardinalityEstimator` using `width` bits of every item hash
    pub fn with_hash_width(relative_error: f64, width: HashWidth) -> Result<Self> {
        let precision = precision_for(relative_error)?;
        let m = 1usize << precision;

        debug!(
            relative_error,
            registers = m,
            hash_width = width.bits(),
            "created cardinality estimator"
        );

        Ok(Self {
            relative_error,
            precision,
            width,
            registers: vec![0u8; m],
            zeros: m as u32,
            sum: m as f64,
            build_hasher: BuildHasherDefault::default(),
        })
    }

    /// Insert a hashable item into `CardinalityEstimator`
    #[inline]
    pub fn insert<T: Hash + ?Sized>(&mut self, item: &T) {
        let mut hasher = self.build_hasher.build_hasher();
        item.hash(&mut hasher);
        let hash = hasher.finish();
        self.insert_hash(hash);
    }

    /// Insert hash into `CardinalityEstimator`
    #[inline]
    pub fn insert_hash(&mut self, hash: u64) {
        let (idx, rank) = self.decode_hash(hash);
        self.update_register(idx, rank);
    }

    /// Return register index and rank from hash
    #[inline]
    fn decode_hash(&self, hash: u64) -> (usize, u8) {
        let p = self.precision;
        let idx = (hash & ((1 << p) - 1)) as usize;
        let rank = match self.width {
            HashWidth::Bits32 => ((hash as u32) >> p).leading_zeros() - p + 1,
            HashWidth::Bits64 => (hash >> p).leading_zeros() - p + 1,
        };
        (idx, rank as u8)
    }

    /// Raise register `idx` to `new_rank` keeping zero count and harmonic sum in sync
    #[inline]
    fn update_register(&mut self, idx: usize, new_rank: u8) {
        let old_rank = self.registers[idx];
        if new_rank > old_rank {
            self.registers[idx] = new_rank;
            self.zeros -= u32::from(old_rank == 0);
            self.sum -= inverse_pow2(old_rank);
            self.sum += inverse_pow2(new_rank);
        }
    }

    /// Return cardinality estimate
    #[inline]
    pub fn estimate(&self) -> f64 {
        let m = self.registers.len() as f64;
        let raw = alpha(self.registers.len()) * m * m / self.sum;

        if raw <= 2.5 * m && self.zeros > 0 {
            // linear counting
            return m * (m / f64::from(self.zeros)).ln();
        }

        if self.width == HashWidth::Bits32 && raw > LARGE_RANGE_THRESHOLD && raw < TWO_POW_32 {
            return -TWO_POW_32 * (-raw / TWO_POW_32).ln_1p();
        }

        raw
    }

    /// Configured target error
    pub fn relative_error(&self) -> f64 {
        self.relative_error
    }

    /// Expected standard error for the derived number of registers
    pub fn standard_error(&self) -> f64 {
        1.04 / (self.registers.len() as f64).sqrt()
    }

    /// Number of hash bits used for register indices
    pub fn precision(&self) -> u32 {
        self.precision
    }

    /// Number of HyperLogLog registers
    pub fn register_count(&self) -> usize {
        self.registers.len()
    }

    pub fn hash_width(&self) -> HashWidth {
        self.width
    }

    /// Register ranks in index order
    pub fn registers(&self) -> &[u8] {
        &self.registers
    }

    /// Return memory size of `CardinalityEstimator`
    pub fn size_of(&self) -> usize {
        size_of::<Self>() + size_of_val(self.registers.as_slice())
    }
}

impl<H: Hasher + Default> Clone for CardinalityEstimator<H> {
    fn clone(&self) -> Self {
        Self {
            relative_error: self.relative_error,
            precision: self.precision,
            width: self.width,
            registers: self.registers.clone(),
            zeros: self.zeros,
            sum: self.sum,
            build_hasher: BuildHasherDefault::default(),
        }
    }
}

impl<H: Hasher + Default> PartialEq for CardinalityEstimator<H> {
    /// Compare cardinality estimators
    fn eq(&self, rhs: &Self) -> bool {
        self.precision == rhs.precision && self.width == rhs.width && self.registers == rhs.registers
    }
}

impl<H: Hasher + Default> Debug for CardinalityEstimator<H> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{{ precision: {}, estimate: {}, size: {} }}",
            self.precision,
            (self.estimate() + 0.5) as usize,
            self.size_of()
        )
    }
}

/// Derive precision from target relative error: smallest `P` with `1.04 / sqrt(2^P) <= relative_error`
fn precision_for(relative_error: f64) -> Result<u32> {
    if !(relative_error > 0.0 && relative_error < 1.0) {
        return Err(Error::invalid(
            "relative_error",
            format!("{relative_error} is not in (0, 1)"),
        ));
    }

    // tolerate rounding noise so that exact powers of two are not pushed to the next precision
    let required = (1.04 / relative_error).powi(2) * (1.0 - 1e-12);
    let precision = required.log2().ceil().max(f64::from(MIN_PRECISION)) as u32;
    if precision > MAX_PRECISION {
        return Err(Error::invalid(
            "relative_error",
            format!(
                "{relative_error} needs more than 2^{MAX_PRECISION} registers, minimum supported is {:.5}",
                1.04 / f64::from(1u32 << MAX_PRECISION).sqrt()
            ),
        ));
    }
    Ok(precision)
}

/// `2^-rank`
#[inline]
fn inverse_pow2(rank: u8) -> f64 {
    (-f64::from(rank)).exp2()
}

/// Parameter for bias correction
#[inline]
fn alpha(m: usize) -> f64 {
    match m {
        16 => 0.673,
        32 => 0.697,
        64 => 0.709,
        _ => 0.7213 / (1.0 + 1.079 / (m as f64)),
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(0.5 => 4)]
    #[test_case(0.26 => 4)]
    #[test_case(0.1 => 7)]
    #[test_case(0.065 => 8)]
    #[test_case(0.05 => 9)]
    #[test_case(0.0325 => 10)]
    #[test_case(0.01625 => 12)]
    #[test_case(0.01 => 14)]
    #[test_case(0.0025 => 18)]
    fn test_precision(relative_error: f64) -> u32 {
        let e = CardinalityEstimator::new(relative_error).unwrap();
        assert_eq!(e.register_count(), 1 << e.precision());
        assert!(e.standard_error() <= relative_error);
        e.precision()
    }

    #[test_case(0.0)]
    #[test_case(1.0)]
    #[test_case(-0.5)]
    #[test_case(f64::NAN)]
    #[test_case(0.001)]
    fn test_invalid_relative_error(relative_error: f64) {
        assert!(matches!(
            CardinalityEstimator::new(relative_error),
            Err(Error::InvalidParameter {
                name: "relative_error",
                ..
            })
        ));
    }

    #[test_case(HashWidth::Bits32)]
    #[test_case(HashWidth::Bits64)]
    fn test_empty_estimate(width: HashWidth) {
        let e = CardinalityEstimator::<WyHash>::with_hash_width(0.01, width).unwrap();
        assert_eq!(e.estimate(), 0.0);
        assert_eq!(e.estimate(), e.estimate());
    }

    // precision 4: low 4 bits select the register, rank counts leading zeros of the remaining 60 bits
    #[test_case(0x0000_0000_0000_0000 => (0, 61))]
    #[test_case(0x8000_0000_0000_0003 => (3, 1))]
    #[test_case(0x4000_0000_0000_000f => (15, 2))]
    #[test_case(0x0000_0000_0000_0010 => (0, 60))]
    #[test_case(0x0000_0000_0000_0025 => (5, 59))]
    fn test_decode_hash_64(hash: u64) -> (usize, u8) {
        let e = CardinalityEstimator::new(0.5).unwrap();
        e.decode_hash(hash)
    }

    // precision 4: rank counts leading zeros of the remaining 28 bits of the low 32-bit word
    #[test_case(0xffff_ffff_0000_0000 => (0, 29))]
    #[test_case(0x0000_0000_8000_0001 => (1, 1))]
    #[test_case(0x0000_0000_0000_0010 => (0, 28))]
    fn test_decode_hash_32(hash: u64) -> (usize, u8) {
        let e = CardinalityEstimator::<WyHash>::with_hash_width(0.5, HashWidth::Bits32).unwrap();
        e.decode_hash(hash)
    }

    #[test]
    fn test_registers_monotonic() {
        let mut e = CardinalityEstimator::new(0.5).unwrap();
        e.insert_hash(0x0000_0000_0000_0010);
        assert_eq!(e.registers()[0], 60);
        // lower rank for the same register is ignored
        e.insert_hash(0x8000_0000_0000_0000);
        assert_eq!(e.registers()[0], 60);
        assert_eq!(e.zeros, 15);
        e.insert_hash(0x0000_0000_0000_0000);
        assert_eq!(e.registers()[0], 61);
        assert_eq!(e.zeros, 15);
    }

    #[test]
    fn test_harmonic_sum_in_sync() {
        let mut e = CardinalityEstimator::new(0.05).unwrap();
        for i in 0..10_000 {
            e.insert(&i);
        }
        let sum: f64 = e.registers().iter().map(|&r| inverse_pow2(r)).sum();
        let zeros = e.registers().iter().filter(|&&r| r == 0).count() as u32;
        assert!((sum - e.sum).abs() < 1e-9);
        assert_eq!(zeros, e.zeros);
    }

    #[test]
    fn test_insert() {
        // Create a new CardinalityEstimator.
        let mut e = CardinalityEstimator::new(0.01).unwrap();

        // Ensure initial estimate is 0.
        assert_eq!(e.estimate(), 0.0);

        // Insert a test item and validate estimate.
        e.insert("test item 1");
        assert_eq!(e.estimate().round(), 1.0);

        // Re-insert the same item, estimate should remain the same.
        let before = e.estimate();
        e.insert("test item 1");
        assert_eq!(e.estimate(), before);

        // Insert a new distinct item, estimate should increase.
        e.insert("test item 2");
        assert_eq!(e.estimate().round(), 2.0);
    }

    #[test]
    fn test_large_range_correction() {
        let mut e = CardinalityEstimator::<WyHash>::with_hash_width(0.5, HashWidth::Bits32).unwrap();
        // rank 25 in every register: remainder has 24 leading zeros out of 28 bits
        for idx in 0..16u64 {
            e.insert_hash((1 << 7) | idx);
        }
        assert!(e.registers().iter().all(|&r| r == 25));

        let raw = alpha(16) * 256.0 / (16.0 * inverse_pow2(25));
        assert!(raw > LARGE_RANGE_THRESHOLD);
        let expected = -TWO_POW_32 * (1.0 - raw / TWO_POW_32).ln();
        assert!((e.estimate() - expected).abs() / expected < 1e-9);
        assert!(e.estimate() > raw);

        // 64-bit hashes keep the raw estimate
        let mut e = CardinalityEstimator::new(0.5).unwrap();
        for idx in 0..16u64 {
            e.insert_hash((1 << 39) | idx);
        }
        assert!(e.registers().iter().all(|&r| r == 25));
        assert!((e.estimate() - raw).abs() / raw < 1e-9);
    }

    #[test]
    fn test_saturated_32bit_estimate_is_finite() {
        let mut e = CardinalityEstimator::<WyHash>::with_hash_width(0.5, HashWidth::Bits32).unwrap();
        for idx in 0..16u64 {
            e.insert_hash(idx);
        }
        assert!(e.registers().iter().all(|&r| r == 29));
        assert!(e.estimate().is_finite());
        assert!(e.estimate() > TWO_POW_32);
    }

    #[test_case(0, 0.0)]
    #[test_case(10, 0.0)]
    #[test_case(100, 0.05)]
    #[test_case(1_000, 0.05)]
    #[test_case(10_000, 0.05)]
    #[test_case(100_000, 0.05)]
    fn test_accuracy_p14(n: usize, tolerance: f64) {
        let mut e = CardinalityEstimator::new(0.01).unwrap();
        for i in 0..n {
            e.insert(&i);
        }
        let estimate = e.estimate();
        assert!(estimate >= 0.0);
        if n == 0 {
            assert_eq!(estimate, 0.0);
        } else if tolerance == 0.0 {
            assert_eq!(estimate.round() as usize, n);
        } else {
            let relative_error = (estimate - n as f64).abs() / n as f64;
            assert!(relative_error < tolerance, "n = {n}, estimate = {estimate}");
        }
    }

    #[test_case(0 => "{ precision: 14, estimate: 0, size: 16440 }")]
    #[test_case(1 => "{ precision: 14, estimate: 1, size: 16440 }")]
    #[test_case(2 => "{ precision: 14, estimate: 2, size: 16440 }")]
    fn test_debug(n: usize) -> String {
        let mut e = CardinalityEstimator::new(0.01).unwrap();
        for i in 0..n {
            e.insert(&i);
        }
        format!("{:?}", e)
    }

    #[test]
    fn test_clone_eq() {
        let mut e = CardinalityEstimator::new(0.05).unwrap();
        e.insert("a");
        let mut c = e.clone();
        assert_eq!(e, c);
        assert_eq!(e.estimate(), c.estimate());
        c.insert("b");
        c.insert("c");
        assert_ne!(e, c);
    }
}
