//! List: double-ended sequence of members.

use std::collections::VecDeque;

use parking_lot::RwLock;

use super::{normalize_range, AccessClock, Collection, Member};
use crate::error::{Error, Result};

/// An ordered list. `VecDeque` gives O(1) push/pop at both ends.
#[derive(Debug, Default)]
pub struct List {
    items: RwLock<VecDeque<Member>>,
    clock: AccessClock,
}

impl List {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes each value onto the head in turn, so the last value ends up
    /// first. Returns the new length.
    pub fn push_front(&self, values: Vec<Member>) -> usize {
        let mut items = self.items.write();
        for value in values {
            items.push_front(value);
        }
        items.len()
    }

    /// Appends values to the tail. Returns the new length.
    pub fn push_back(&self, values: Vec<Member>) -> usize {
        let mut items = self.items.write();
        items.extend(values);
        items.len()
    }

    pub fn pop_front(&self) -> Option<Member> {
        self.items.write().pop_front()
    }

    pub fn pop_back(&self) -> Option<Member> {
        self.items.write().pop_back()
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Elements at `start..=stop`; negative indices count from the tail.
    pub fn range(&self, start: i64, stop: i64) -> Vec<Member> {
        let items = self.items.read();
        match normalize_range(start, stop, items.len()) {
            Some((s, e)) => items.range(s..=e).cloned().collect(),
            None => Vec::new(),
        }
    }

    pub fn index(&self, index: i64) -> Option<Member> {
        let items = self.items.read();
        let pos = resolve_index(index, items.len())?;
        items.get(pos).cloned()
    }

    pub fn set(&self, index: i64, value: Member) -> Result<()> {
        let mut items = self.items.write();
        let pos = resolve_index(index, items.len()).ok_or(Error::IndexOutOfRange)?;
        items[pos] = value;
        Ok(())
    }

    /// Keeps only `start..=stop`. An empty range clears the list.
    pub fn trim(&self, start: i64, stop: i64) {
        let mut items = self.items.write();
        match normalize_range(start, stop, items.len()) {
            Some((s, e)) => {
                items.truncate(e + 1);
                items.drain(..s);
            }
            None => items.clear(),
        }
    }

    /// Removes occurrences of `value`: the first `count` from the head
    /// when positive, the last `|count|` from the tail when negative,
    /// all of them when zero. Returns how many were removed.
    pub fn remove(&self, count: i64, value: &Member) -> usize {
        let mut items = self.items.write();
        let limit = if count == 0 {
            usize::MAX
        } else {
            count.unsigned_abs() as usize
        };
        let mut removed = 0;
        if count >= 0 {
            let mut i = 0;
            while i < items.len() && removed < limit {
                if &items[i] == value {
                    items.remove(i);
                    removed += 1;
                } else {
                    i += 1;
                }
            }
        } else {
            let mut i = items.len();
            while i > 0 && removed < limit {
                i -= 1;
                if &items[i] == value {
                    items.remove(i);
                    removed += 1;
                }
            }
        }
        removed
    }
}

fn resolve_index(index: i64, len: usize) -> Option<usize> {
    let pos = if index < 0 { index + len as i64 } else { index };
    (0..len as i64).contains(&pos).then_some(pos as usize)
}

impl Collection for List {
    fn clock(&self) -> &AccessClock {
        &self.clock
    }

    fn len(&self) -> usize {
        List::len(self)
    }
}
