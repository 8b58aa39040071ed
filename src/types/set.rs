//! Set: unordered unique members.

use hashbrown::HashSet;
use parking_lot::RwLock;

use super::{AccessClock, Collection, Member};

#[derive(Debug, Default)]
pub struct Set {
    members: RwLock<HashSet<Member>>,
    clock: AccessClock,
}

impl Set {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds members, returning how many were not already present.
    pub fn add(&self, members: Vec<Member>) -> usize {
        let mut set = self.members.write();
        members
            .into_iter()
            .map(|m| set.insert(m))
            .filter(|added| *added)
            .count()
    }

    /// Removes members, returning how many were present.
    pub fn remove(&self, members: &[Member]) -> usize {
        let mut set = self.members.write();
        members.iter().filter(|m| set.remove(*m)).count()
    }

    pub fn contains(&self, member: &Member) -> bool {
        self.members.read().contains(member)
    }

    /// All members, sorted for stable output.
    pub fn members(&self) -> Vec<Member> {
        let mut out: Vec<_> = self.members.read().iter().cloned().collect();
        out.sort();
        out
    }

    pub fn len(&self) -> usize {
        self.members.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Collection for Set {
    fn clock(&self) -> &AccessClock {
        &self.clock
    }

    fn len(&self) -> usize {
        Set::len(self)
    }
}
