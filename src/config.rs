//! Engine Configuration

use crate::storage::EvictionPolicy;

/// Engine configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Number of store shards (0 = auto-detect)
    pub shard_amount: usize,

    /// TTL cleaner interval in seconds (0 = lazy expiry only)
    pub ttl_cleaner_interval: u64,

    /// Maximum number of keys before eviction kicks in (0 = unlimited)
    pub max_keys: usize,

    /// Which keys to drop once `max_keys` is reached
    pub eviction_policy: EvictionPolicy,

    /// Number of keys sampled per eviction round
    pub eviction_samples: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            shard_amount: 0,
            ttl_cleaner_interval: 10,
            max_keys: 0,
            eviction_policy: EvictionPolicy::None,
            eviction_samples: 5,
        }
    }
}

impl Config {
    /// Set the shard count
    pub fn with_shard_amount(mut self, shards: usize) -> Self {
        self.shard_amount = shards;
        self
    }

    /// Set TTL cleaner interval
    pub fn with_ttl_interval(mut self, interval: u64) -> Self {
        self.ttl_cleaner_interval = interval;
        self
    }

    pub fn with_max_keys(mut self, keys: usize) -> Self {
        self.max_keys = keys;
        self
    }

    pub fn with_eviction_policy(mut self, policy: EvictionPolicy) -> Self {
        self.eviction_policy = policy;
        self
    }

    /// Shard count to hand to the store, rounded up to a power of two
    /// as the sharded map requires.
    pub fn effective_shards(&self) -> usize {
        let shards = if self.shard_amount == 0 {
            num_cpus::get() * 4
        } else {
            self.shard_amount
        };
        shards.max(2).next_power_of_two()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shard_count_is_power_of_two() {
        assert_eq!(Config::default().with_shard_amount(6).effective_shards(), 8);
        assert_eq!(Config::default().with_shard_amount(1).effective_shards(), 2);
        assert!(Config::default().effective_shards().is_power_of_two());
    }

    #[test]
    fn builder_sets_fields() {
        let config = Config::default()
            .with_ttl_interval(0)
            .with_max_keys(100)
            .with_eviction_policy(EvictionPolicy::Lru);
        assert_eq!(config.ttl_cleaner_interval, 0);
        assert_eq!(config.max_keys, 100);
        assert_eq!(config.eviction_policy, EvictionPolicy::Lru);
    }
}
