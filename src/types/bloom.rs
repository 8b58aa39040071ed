//! Bloom filter: probabilistic membership with a bounded false-positive
//! rate.
//!
//! Bit positions come from double hashing: two independently seeded
//! hashes `h1`, `h2` give the `i`-th position as `h1 + i * h2 (mod m)`.

use std::hash::BuildHasher;

use ahash::RandomState;
use parking_lot::RwLock;

use super::{AccessClock, Collection};
use crate::error::{Error, Result};

pub const DEFAULT_ERROR_RATE: f64 = 0.01;
pub const DEFAULT_CAPACITY: u64 = 1024;
/// Largest bit array a filter may allocate (512 MiB).
pub const MAX_BITS: u64 = 1 << 32;

/// Creation parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BloomOpts {
    /// Target false-positive rate, in `(0, 1)`.
    pub error_rate: f64,
    /// Number of items the filter is sized for.
    pub capacity: u64,
}

impl Default for BloomOpts {
    fn default() -> Self {
        Self {
            error_rate: DEFAULT_ERROR_RATE,
            capacity: DEFAULT_CAPACITY,
        }
    }
}

impl BloomOpts {
    pub fn new(error_rate: f64, capacity: u64) -> Result<Self> {
        if !(error_rate > 0.0 && error_rate < 1.0) {
            return Err(Error::InvalidErrorRate);
        }
        if capacity == 0 {
            return Err(Error::InvalidCapacity);
        }
        let opts = Self {
            error_rate,
            capacity,
        };
        if opts.optimal_bits() > MAX_BITS as f64 {
            return Err(Error::InvalidCapacity);
        }
        Ok(opts)
    }

    /// `-n * ln(p) / ln(2)^2`, before rounding.
    fn optimal_bits(&self) -> f64 {
        let ln2 = std::f64::consts::LN_2;
        -(self.capacity as f64) * self.error_rate.ln() / (ln2 * ln2)
    }

    /// Bit-array size `m = ceil(optimal_bits)`, within `[64, MAX_BITS]`.
    fn bit_count(&self) -> u64 {
        (self.optimal_bits().ceil() as u64).clamp(64, MAX_BITS)
    }

    /// Hash count `k = round(m / n * ln(2))`.
    fn hash_count(&self, bits: u64) -> u32 {
        let k = (bits as f64 / self.capacity as f64) * std::f64::consts::LN_2;
        (k.round() as u32).max(1)
    }
}

#[derive(Debug)]
struct Bits {
    words: Vec<u64>,
    items: u64,
}

#[derive(Debug)]
pub struct BloomFilter {
    opts: BloomOpts,
    bit_count: u64,
    hash_count: u32,
    bits: RwLock<Bits>,
    first: RandomState,
    second: RandomState,
    clock: AccessClock,
}

impl BloomFilter {
    pub fn new(opts: BloomOpts) -> Self {
        let bit_count = opts.bit_count();
        let hash_count = opts.hash_count(bit_count);
        let words = bit_count.div_ceil(64) as usize;
        Self {
            opts,
            bit_count,
            hash_count,
            bits: RwLock::new(Bits {
                words: vec![0; words],
                items: 0,
            }),
            first: RandomState::with_seeds(0x51_7c_c1_b7, 0x27_22_0a_95, 0x6a_09_e6_67, 0xbb_67_ae_85),
            second: RandomState::with_seeds(0x3c_6e_f3_72, 0xa5_4f_f5_3a, 0x51_0e_52_7f, 0x9b_05_68_8c),
            clock: AccessClock::default(),
        }
    }

    fn positions(&self, item: &str) -> impl Iterator<Item = u64> + '_ {
        let h1 = self.first.hash_one(item);
        let h2 = self.second.hash_one(item) | 1;
        (0..self.hash_count as u64).map(move |i| h1.wrapping_add(i.wrapping_mul(h2)) % self.bit_count)
    }

    /// Adds an item. Returns `true` if it was definitely not present
    /// before.
    pub fn add(&self, item: &str) -> bool {
        let mut bits = self.bits.write();
        let mut fresh = false;
        for pos in self.positions(item) {
            let (word, mask) = ((pos / 64) as usize, 1u64 << (pos % 64));
            if bits.words[word] & mask == 0 {
                bits.words[word] |= mask;
                fresh = true;
            }
        }
        if fresh {
            bits.items += 1;
        }
        fresh
    }

    /// `false` means definitely absent; `true` means probably present.
    pub fn exists(&self, item: &str) -> bool {
        let bits = self.bits.read();
        self.positions(item)
            .all(|pos| bits.words[(pos / 64) as usize] & (1u64 << (pos % 64)) != 0)
    }

    pub fn opts(&self) -> BloomOpts {
        self.opts
    }

    /// Items added so far (counting only adds that set a new bit).
    pub fn items(&self) -> u64 {
        self.bits.read().items
    }

    /// Human-readable summary for `BF.INFO`.
    pub fn info(&self, name: &str) -> String {
        format!(
            "name: {}, error rate: {}, capacity: {}, total bits reserved: {}, \
             bits per element: {:.2}, hash functions: {}, number of filled bits: {}",
            name,
            self.opts.error_rate,
            self.opts.capacity,
            self.bit_count,
            self.bit_count as f64 / self.opts.capacity as f64,
            self.hash_count,
            self.filled_bits(),
        )
    }

    fn filled_bits(&self) -> u64 {
        self.bits
            .read()
            .words
            .iter()
            .map(|w| w.count_ones() as u64)
            .sum()
    }
}

impl Collection for BloomFilter {
    fn clock(&self) -> &AccessClock {
        &self.clock
    }

    fn len(&self) -> usize {
        self.items() as usize
    }

    /// A filter is never dropped for being empty; it only goes away on
    /// DEL or expiry.
    fn is_empty(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_options() {
        assert_eq!(BloomOpts::new(0.0, 10), Err(Error::InvalidErrorRate));
        assert_eq!(BloomOpts::new(1.0, 10), Err(Error::InvalidErrorRate));
        assert_eq!(BloomOpts::new(0.01, 0), Err(Error::InvalidCapacity));
        assert!(BloomOpts::new(0.5, 1).is_ok());
    }

    #[test]
    fn oversized_filters_are_refused() {
        assert_eq!(
            BloomOpts::new(0.01, i64::MAX as u64),
            Err(Error::InvalidCapacity)
        );
        assert_eq!(BloomOpts::new(1e-300, 100_000_000), Err(Error::InvalidCapacity));
        // 0.01 costs ~9.6 bits per item
        assert!(BloomOpts::new(0.01, 400_000_000).is_ok());
        assert_eq!(BloomOpts::new(0.01, 500_000_000), Err(Error::InvalidCapacity));

        let forced = BloomOpts {
            error_rate: 0.01,
            capacity: u64::MAX,
        };
        assert_eq!(forced.bit_count(), MAX_BITS);
    }

    #[test]
    fn added_items_always_exist() {
        let bloom = BloomFilter::new(BloomOpts::default());
        for i in 0..500 {
            bloom.add(&format!("item:{i}"));
        }
        for i in 0..500 {
            assert!(bloom.exists(&format!("item:{i}")));
        }
    }

    #[test]
    fn second_add_reports_not_fresh() {
        let bloom = BloomFilter::new(BloomOpts::default());
        assert!(bloom.add("x"));
        assert!(!bloom.add("x"));
        assert_eq!(bloom.items(), 1);
    }

    #[test]
    fn false_positive_rate_near_target() {
        let opts = BloomOpts::new(0.01, 1000).unwrap();
        let bloom = BloomFilter::new(opts);
        for i in 0..1000 {
            bloom.add(&format!("present:{i}"));
        }
        let false_positives = (0..10_000)
            .filter(|i| bloom.exists(&format!("absent:{i}")))
            .count();
        // 1% target; allow generous slack
        assert!(false_positives < 500, "got {false_positives}");
    }

    #[test]
    fn sizing_follows_formula() {
        let opts = BloomOpts::new(0.01, 1000).unwrap();
        let bloom = BloomFilter::new(opts);
        assert_eq!(bloom.bit_count, 9586);
        assert_eq!(bloom.hash_count, 7);
        assert!(bloom.info("bf").contains("hash functions: 7"));
    }
}
