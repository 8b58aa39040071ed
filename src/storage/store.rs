//! Concurrent Keyspace Store
//!
//! Sharded map from key to collection handle, plus a second sharded map
//! from key to absolute expiry deadline (ms since epoch).
//!
//! Expiry is lazy: an expired key is removed by whichever call touches it
//! first. [`TtlCleaner`](super::TtlCleaner) can sweep in the background
//! as well.
//!
//! Lock order is always `entries` shard, then `expires` shard. Writers
//! update the deadline while still holding the entry's shard lock, so a
//! reader never pairs a new value with a stale deadline.

use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::mapref::one::RefMut;
use dashmap::DashMap;
use rand::seq::IteratorRandom;
use tracing::{debug, warn};

use super::eviction::Evictor;
use super::value::Value;
use crate::config::Config;
use crate::time;

/// Thread-safe keyspace with per-key TTL.
#[derive(Debug, Clone)]
pub struct Store {
    entries: Arc<DashMap<String, Value>>,
    expires: Arc<DashMap<String, u64>>,
    evictor: Evictor,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::with_config(&Config::default())
    }

    /// Create with shard count and eviction settings from `config`
    pub fn with_config(config: &Config) -> Self {
        let shards = config.effective_shards();
        Self {
            entries: Arc::new(DashMap::with_shard_amount(shards)),
            expires: Arc::new(DashMap::with_shard_amount(shards)),
            evictor: Evictor::from_config(config),
        }
    }

    /// Install `value` under `key`, replacing whatever was there.
    ///
    /// `exp_duration_ms > 0` sets a deadline `now + exp_duration_ms`;
    /// anything else clears a previous deadline.
    pub fn put(&self, key: impl Into<String>, value: Value, exp_duration_ms: i64) {
        let key = key.into();
        if !self.entries.contains_key(&key) {
            self.make_room();
        }

        value.touch();
        let deadline = time::deadline_after(exp_duration_ms);
        let guard = self.entries.entry(key.clone()).insert(value);
        match deadline {
            Some(at) => {
                self.expires.insert(key, at);
            }
            None => {
                self.expires.remove(&key);
            }
        }
        drop(guard);
    }

    /// Live value under `key`. Refreshes its last-access time.
    pub fn get(&self, key: &str) -> Option<Value> {
        {
            let entry = self.entries.get(key)?;
            if !self.is_expired(key) {
                entry.touch();
                return Some(entry.value().clone());
            }
        }
        self.purge_if_expired(key);
        None
    }

    /// Run `apply` on the live value under `key` while holding the key's
    /// shard lock. Returns `None` without calling `apply` when the key is
    /// absent or expired.
    ///
    /// A collection left empty by `apply` is removed from the keyspace.
    pub fn update<R, F>(&self, key: &str, apply: F) -> Option<R>
    where
        F: FnOnce(&Value) -> R,
    {
        let guard = match self.entries.entry(key.to_string()) {
            Entry::Occupied(occupied) if self.is_expired(key) => {
                self.expires.remove(key);
                occupied.remove();
                debug!(key, "Expired key removed on access");
                return None;
            }
            Entry::Occupied(occupied) => occupied.into_ref(),
            Entry::Vacant(_) => return None,
        };
        Some(self.apply_locked(key, guard, apply))
    }

    /// Like [`update`](Self::update), but installs `create()` without a
    /// TTL when the key is absent or expired, so `apply` always runs.
    pub fn update_or_insert<R, C, F>(&self, key: &str, create: C, apply: F) -> R
    where
        C: FnOnce() -> Value,
        F: FnOnce(&Value) -> R,
    {
        if !self.entries.contains_key(key) {
            self.make_room();
        }
        let guard = match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                if self.is_expired(key) {
                    self.expires.remove(key);
                    occupied.insert(create());
                }
                occupied.into_ref()
            }
            Entry::Vacant(vacant) => vacant.insert(create()),
        };
        self.apply_locked(key, guard, apply)
    }

    /// `apply` runs under the shard lock. The empty check is repeated
    /// under that lock before removal, so a later write keeps the key.
    fn apply_locked<R, F>(&self, key: &str, guard: RefMut<'_, String, Value>, apply: F) -> R
    where
        F: FnOnce(&Value) -> R,
    {
        let value = guard.value().clone();
        value.touch();
        let result = apply(&value);
        let emptied = value.collection().is_empty();
        drop(guard);
        if emptied {
            self.remove_if_empty(key, &value);
        }
        result
    }

    /// Drop `key` when it still maps to `value` and that collection has
    /// no elements left. Returns whether the key was removed.
    pub fn remove_if_empty(&self, key: &str, value: &Value) -> bool {
        self.entries
            .remove_if(key, |k, current| {
                if current.ptr_eq(value) && current.collection().is_empty() {
                    self.expires.remove(k);
                    true
                } else {
                    false
                }
            })
            .is_some()
    }

    /// Remove `key` and its deadline. Returns whether a live key existed.
    pub fn delete(&self, key: &str) -> bool {
        let mut live = false;
        self.entries.remove_if(key, |k, _| {
            live = !self.is_expired(k);
            self.expires.remove(k);
            true
        });
        live
    }

    /// Absolute deadline of `key`, or `None` if absent or without TTL.
    pub fn get_expiry(&self, key: &str) -> Option<u64> {
        {
            let _entry = self.entries.get(key)?;
            if !self.is_expired(key) {
                return self.expires.get(key).map(|at| *at);
            }
        }
        self.purge_if_expired(key);
        None
    }

    /// Set or replace the deadline of an existing key. Does nothing when
    /// the key is absent. A non-positive duration clears the deadline.
    /// Returns whether the key existed.
    pub fn set_expiry(&self, key: &str, exp_duration_ms: i64) -> bool {
        self.purge_if_expired(key);
        let Some(_entry) = self.entries.get_mut(key) else {
            return false;
        };
        match time::deadline_after(exp_duration_ms) {
            Some(at) => {
                self.expires.insert(key.to_string(), at);
            }
            None => {
                self.expires.remove(key);
            }
        }
        true
    }

    /// Drop the deadline of `key`. Returns whether one was removed.
    pub fn persist(&self, key: &str) -> bool {
        self.purge_if_expired(key);
        let Some(_entry) = self.entries.get_mut(key) else {
            return false;
        };
        self.expires.remove(key).is_some()
    }

    /// Check if key exists and is not expired. Does not count as access.
    pub fn exists(&self, key: &str) -> bool {
        {
            let Some(_entry) = self.entries.get(key) else {
                return false;
            };
            if !self.is_expired(key) {
                return true;
            }
        }
        self.purge_if_expired(key);
        false
    }

    /// Last-access time of `key` without refreshing it.
    pub fn last_accessed(&self, key: &str) -> Option<u64> {
        let entry = self.entries.get(key)?;
        (!self.is_expired(key)).then(|| entry.last_accessed_ms())
    }

    /// Get the number of keys (including expired not yet purged)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if store is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Live keys, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .entries
            .iter()
            .filter(|r| !self.is_expired(r.key()))
            .map(|r| r.key().clone())
            .collect();
        keys.sort();
        keys
    }

    /// Remove expired keys, returns count of removed keys
    pub fn cleanup_expired(&self) -> usize {
        let now = time::now_ms();
        let mut removed = 0;
        self.entries.retain(|key, _| {
            let deadline = self.expires.get(key).map(|at| *at);
            match deadline {
                Some(at) if now >= at => {
                    self.expires.remove(key);
                    removed += 1;
                    false
                }
                _ => true,
            }
        });
        removed
    }

    /// Remove keys that have not been accessed for `max_idle`.
    pub fn evict_idle(&self, max_idle: Duration) -> usize {
        let cutoff = time::now_ms().saturating_sub(max_idle.as_millis() as u64);
        let mut evicted = 0;
        self.entries.retain(|key, value| {
            if value.last_accessed_ms() < cutoff {
                self.expires.remove(key);
                evicted += 1;
                false
            } else {
                true
            }
        });
        if evicted > 0 {
            warn!(evicted, ?max_idle, "Evicted idle keys");
        }
        evicted
    }

    fn is_expired(&self, key: &str) -> bool {
        self.expires
            .get(key)
            .map(|at| time::now_ms() >= *at)
            .unwrap_or(false)
    }

    /// Removes `key` if its deadline has passed. Re-checks under the
    /// shard lock so a concurrent `put` is never undone.
    fn purge_if_expired(&self, key: &str) -> bool {
        let removed = self
            .entries
            .remove_if(key, |k, _| {
                if self.is_expired(k) {
                    self.expires.remove(k);
                    true
                } else {
                    false
                }
            })
            .is_some();
        if removed {
            debug!(key, "Expired key removed on access");
        }
        removed
    }

    /// Evict keys until one more fits under the configured limit.
    fn make_room(&self) {
        if !self.evictor.needs_eviction(self.entries.len()) {
            return;
        }
        self.cleanup_expired();
        while self.evictor.needs_eviction(self.entries.len()) {
            let sample = self.sample(self.evictor.samples());
            let Some(victim) = self.evictor.pick_victim(sample) else {
                break;
            };
            if self.delete(&victim) {
                warn!(key = %victim, "Evicted key to stay under max keys");
            }
        }
    }

    fn sample(&self, count: usize) -> Vec<(String, u64)> {
        let mut rng = rand::thread_rng();
        self.entries
            .iter()
            .map(|r| (r.key().clone(), r.value().last_accessed_ms()))
            .choose_multiple(&mut rng, count)
    }
}
