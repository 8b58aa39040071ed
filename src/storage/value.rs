//! Type-erased collection handles.

use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::types::{BloomFilter, Collection, Hash, List, Set, SortedSet};

/// Kind of collection stored under a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Hash,
    List,
    Set,
    SortedSet,
    Bloom,
}

impl Kind {
    /// Name reported by the TYPE command.
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Hash => "hash",
            Kind::List => "list",
            Kind::Set => "set",
            Kind::SortedSet => "zset",
            Kind::Bloom => "MBbloom--",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored collection. Cloning clones the handle, not the data.
#[derive(Debug, Clone)]
pub enum Value {
    Hash(Arc<Hash>),
    List(Arc<List>),
    Set(Arc<Set>),
    SortedSet(Arc<SortedSet>),
    Bloom(Arc<BloomFilter>),
}

impl Value {
    pub fn kind(&self) -> Kind {
        match self {
            Value::Hash(_) => Kind::Hash,
            Value::List(_) => Kind::List,
            Value::Set(_) => Kind::Set,
            Value::SortedSet(_) => Kind::SortedSet,
            Value::Bloom(_) => Kind::Bloom,
        }
    }

    /// The shared collection capability behind the handle.
    pub fn collection(&self) -> &dyn Collection {
        match self {
            Value::Hash(h) => h.as_ref(),
            Value::List(l) => l.as_ref(),
            Value::Set(s) => s.as_ref(),
            Value::SortedSet(z) => z.as_ref(),
            Value::Bloom(b) => b.as_ref(),
        }
    }

    pub fn touch(&self) {
        self.collection().touch();
    }

    pub fn last_accessed_ms(&self) -> u64 {
        self.collection().last_accessed_ms()
    }

    /// Same underlying collection?
    pub fn ptr_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Hash(a), Value::Hash(b)) => Arc::ptr_eq(a, b),
            (Value::List(a), Value::List(b)) => Arc::ptr_eq(a, b),
            (Value::Set(a), Value::Set(b)) => Arc::ptr_eq(a, b),
            (Value::SortedSet(a), Value::SortedSet(b)) => Arc::ptr_eq(a, b),
            (Value::Bloom(a), Value::Bloom(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub fn into_hash(self) -> Result<Arc<Hash>> {
        match self {
            Value::Hash(h) => Ok(h),
            _ => Err(Error::WrongType),
        }
    }

    pub fn into_list(self) -> Result<Arc<List>> {
        match self {
            Value::List(l) => Ok(l),
            _ => Err(Error::WrongType),
        }
    }

    pub fn into_set(self) -> Result<Arc<Set>> {
        match self {
            Value::Set(s) => Ok(s),
            _ => Err(Error::WrongType),
        }
    }

    pub fn into_sorted_set(self) -> Result<Arc<SortedSet>> {
        match self {
            Value::SortedSet(z) => Ok(z),
            _ => Err(Error::WrongType),
        }
    }

    pub fn into_bloom(self) -> Result<Arc<BloomFilter>> {
        match self {
            Value::Bloom(b) => Ok(b),
            _ => Err(Error::WrongType),
        }
    }
}

impl From<Hash> for Value {
    fn from(h: Hash) -> Self {
        Value::Hash(Arc::new(h))
    }
}

impl From<List> for Value {
    fn from(l: List) -> Self {
        Value::List(Arc::new(l))
    }
}

impl From<Set> for Value {
    fn from(s: Set) -> Self {
        Value::Set(Arc::new(s))
    }
}

impl From<SortedSet> for Value {
    fn from(z: SortedSet) -> Self {
        Value::SortedSet(Arc::new(z))
    }
}

impl From<BloomFilter> for Value {
    fn from(b: BloomFilter) -> Self {
        Value::Bloom(Arc::new(b))
    }
}
