//! Collection types held by the store.
//!
//! Every collection guards its own state with a lock and carries an
//! [`AccessClock`], so handles can be shared between worker threads and
//! the store can report idle time without knowing the collection's shape.

pub mod bloom;
pub mod hash;
pub mod list;
pub mod member;
pub mod set;
pub mod sorted_set;

use std::sync::atomic::{AtomicU64, Ordering};

use crate::time;

pub use bloom::{BloomFilter, BloomOpts};
pub use hash::Hash;
pub use list::List;
pub use member::Member;
pub use set::Set;
pub use sorted_set::{AddResult, Element, Limit, ScoreRange, SortedSet, ZAddFlags};

/// Last-accessed timestamp shared by all collection kinds.
#[derive(Debug)]
pub struct AccessClock {
    last_accessed_ms: AtomicU64,
}

impl Default for AccessClock {
    fn default() -> Self {
        Self {
            last_accessed_ms: AtomicU64::new(time::now_ms()),
        }
    }
}

impl AccessClock {
    #[inline]
    pub fn touch(&self) {
        self.last_accessed_ms.store(time::now_ms(), Ordering::Relaxed);
    }

    #[inline]
    pub fn last_accessed_ms(&self) -> u64 {
        self.last_accessed_ms.load(Ordering::Relaxed)
    }
}

/// Capability every stored collection provides.
pub trait Collection: Send + Sync {
    /// Clock recording when the collection was last read or written
    /// through the store.
    fn clock(&self) -> &AccessClock;

    /// Number of elements. An empty collection is removed from the
    /// keyspace by the command that emptied it.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn touch(&self) {
        self.clock().touch();
    }

    fn last_accessed_ms(&self) -> u64 {
        self.clock().last_accessed_ms()
    }
}

/// Resolves a possibly-negative inclusive index range against `len`.
///
/// Negative indices count from the end. `stop` is clamped to the last
/// element. Returns `None` when nothing falls inside the range.
pub fn normalize_range(start: i64, stop: i64, len: usize) -> Option<(usize, usize)> {
    let len = len as i64;
    let mut start = if start < 0 { start + len } else { start };
    let mut stop = if stop < 0 { stop + len } else { stop };
    if start < 0 {
        start = 0;
    }
    if stop >= len {
        stop = len - 1;
    }
    if start > stop || start >= len {
        return None;
    }
    Some((start as usize, stop as usize))
}

/// Formats a score with the shortest decimal that round-trips.
pub fn format_score(score: f64) -> String {
    if score == f64::INFINITY {
        "inf".to_string()
    } else if score == f64::NEG_INFINITY {
        "-inf".to_string()
    } else {
        format!("{score}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_handles_negative_indices() {
        assert_eq!(normalize_range(0, -1, 3), Some((0, 2)));
        assert_eq!(normalize_range(-2, -1, 3), Some((1, 2)));
        assert_eq!(normalize_range(-100, 100, 3), Some((0, 2)));
    }

    #[test]
    fn normalize_rejects_degenerate_ranges() {
        assert_eq!(normalize_range(2, 1, 3), None);
        assert_eq!(normalize_range(3, 5, 3), None);
        assert_eq!(normalize_range(0, -1, 0), None);
        assert_eq!(normalize_range(0, -4, 3), None);
    }

    #[test]
    fn scores_use_shortest_representation() {
        assert_eq!(format_score(1.0), "1");
        assert_eq!(format_score(2.5), "2.5");
        assert_eq!(format_score(0.1 + 0.2), "0.30000000000000004");
        assert_eq!(format_score(f64::INFINITY), "inf");
        assert_eq!(format_score(f64::NEG_INFINITY), "-inf");
    }

    #[test]
    fn clock_moves_forward_on_touch() {
        let clock = AccessClock::default();
        let first = clock.last_accessed_ms();
        std::thread::sleep(std::time::Duration::from_millis(5));
        clock.touch();
        assert!(clock.last_accessed_ms() > first);
    }
}
