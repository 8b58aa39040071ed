//! Eviction Module
//!
//! Key-count limit with idle-time (LRU) or random eviction.

use crate::config::Config;

/// Eviction policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvictionPolicy {
    /// No eviction (default)
    #[default]
    None,
    /// Evict the least recently accessed key of a random sample
    Lru,
    /// Random eviction
    Random,
}

impl std::str::FromStr for EvictionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" | "noeviction" => Ok(EvictionPolicy::None),
            "lru" | "allkeys-lru" => Ok(EvictionPolicy::Lru),
            "random" | "allkeys-random" => Ok(EvictionPolicy::Random),
            other => Err(format!("unknown eviction policy '{other}'")),
        }
    }
}

/// Decides when to evict and which sampled key goes.
#[derive(Debug, Clone)]
pub struct Evictor {
    policy: EvictionPolicy,
    max_keys: usize,
    samples: usize,
}

impl Default for Evictor {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl Evictor {
    pub fn from_config(config: &Config) -> Self {
        Self {
            policy: config.eviction_policy,
            max_keys: config.max_keys,
            samples: config.eviction_samples.max(1),
        }
    }

    /// Number of keys to sample per eviction round
    pub fn samples(&self) -> usize {
        self.samples
    }

    /// Check if inserting one more key requires eviction
    pub fn needs_eviction(&self, key_count: usize) -> bool {
        self.policy != EvictionPolicy::None && self.max_keys > 0 && key_count >= self.max_keys
    }

    /// Pick a victim among sampled `(key, last_accessed_ms)` pairs
    pub fn pick_victim(&self, candidates: Vec<(String, u64)>) -> Option<String> {
        match self.policy {
            EvictionPolicy::None => None,
            EvictionPolicy::Lru => candidates
                .into_iter()
                .min_by_key(|(_, last_access)| *last_access)
                .map(|(key, _)| key),
            EvictionPolicy::Random => candidates.into_iter().next().map(|(key, _)| key),
        }
    }
}
