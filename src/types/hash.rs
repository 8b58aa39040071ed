//! Hash: field → value map.

use hashbrown::HashMap;
use parking_lot::RwLock;

use super::{AccessClock, Collection, Member};
use crate::error::{Error, Result};

/// A map of fields to values behind its own lock.
#[derive(Debug, Default)]
pub struct Hash {
    fields: RwLock<HashMap<Member, Member>>,
    clock: AccessClock,
}

impl Hash {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a field. Returns `true` if the field is new.
    pub fn set(&self, field: Member, value: Member) -> bool {
        self.fields.write().insert(field, value).is_none()
    }

    pub fn get(&self, field: &Member) -> Option<Member> {
        self.fields.read().get(field).cloned()
    }

    /// Removes fields, returning how many existed.
    pub fn remove(&self, fields: &[Member]) -> usize {
        let mut map = self.fields.write();
        fields.iter().filter(|f| map.remove(*f).is_some()).count()
    }

    pub fn contains(&self, field: &Member) -> bool {
        self.fields.read().contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.fields.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Field names, sorted for stable output.
    pub fn keys(&self) -> Vec<Member> {
        let mut keys: Vec<_> = self.fields.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Values, ordered by their field names.
    pub fn values(&self) -> Vec<Member> {
        self.entries().into_iter().map(|(_, v)| v).collect()
    }

    /// `(field, value)` pairs ordered by field.
    pub fn entries(&self) -> Vec<(Member, Member)> {
        let mut pairs: Vec<_> = self
            .fields
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        pairs
    }

    /// Adds `delta` to an integer field, creating it at 0.
    pub fn incr_by(&self, field: Member, delta: i64) -> Result<i64> {
        let mut map = self.fields.write();
        let current = match map.get(&field) {
            Some(value) => value.as_i64().ok_or(Error::NotAnInteger)?,
            None => 0,
        };
        let next = current.checked_add(delta).ok_or(Error::Overflow)?;
        map.insert(field, Member::Int(next));
        Ok(next)
    }

    /// Adds `delta` to a float field, creating it at 0.
    pub fn incr_by_float(&self, field: Member, delta: f64) -> Result<f64> {
        let mut map = self.fields.write();
        let current = match map.get(&field) {
            Some(value) => value.as_f64().ok_or(Error::NotAFloat)?,
            None => 0.0,
        };
        let next = current + delta;
        if !next.is_finite() {
            return Err(Error::NotAFloat);
        }
        map.insert(field, Member::parse(&super::format_score(next)));
        Ok(next)
    }
}

impl Collection for Hash {
    fn clock(&self) -> &AccessClock {
        &self.clock
    }

    fn len(&self) -> usize {
        Hash::len(self)
    }
}
