//! Storage Engine
//!
//! Concurrent keyspace of typed collections with per-key TTL and
//! optional key-count eviction.

mod eviction;
mod store;
mod ttl;
mod value;

pub use eviction::{EvictionPolicy, Evictor};
pub use store::Store;
pub use ttl::TtlCleaner;
pub use value::{Kind, Value};
