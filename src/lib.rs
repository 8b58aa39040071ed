//! KEEL - In-Memory Typed Key-Value Engine
//!
//! A keyspace of typed collections (hashes, lists, sets, skip-list sorted
//! sets and bloom filters) with per-key TTL, lazy and background expiry,
//! and Redis-style command evaluation.

pub mod command;
pub mod config;
pub mod error;
pub mod metrics;
pub mod storage;
pub mod time;
pub mod types;

pub use command::{Engine, Reply};
pub use config::Config;
pub use error::{Error, Result};
pub use metrics::{CommandStats, Metrics};
pub use storage::{EvictionPolicy, Kind, Store, TtlCleaner, Value};
pub use types::{BloomFilter, BloomOpts, Hash, List, Member, Set, SortedSet};
