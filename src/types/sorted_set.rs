//! Sorted set: a skip list ordered by `(score, member)` plus a
//! member → node index.
//!
//! Nodes live in an arena and link to each other by slot index, so no
//! node reference ever escapes the set. Freed slots go on a free list and
//! are reused by later inserts. Slot 0 is the header sentinel: it has no
//! member, a score of `-inf`, and participates in every level.
//!
//! Every forward link records its *span*, the number of level-0 steps it
//! skips. Summing spans while descending gives a member's rank in
//! O(log n) expected time, and lets index ranges seek straight to their
//! first element.
//!
//! Ties in score are broken by member order, so ranks and ranges are
//! always well defined.

use std::cmp::Ordering;
use std::hash::Hash as StdHash;

use hashbrown::HashMap;
use parking_lot::RwLock;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{normalize_range, AccessClock, Collection, Member};
use crate::error::{Error, Result};

/// Highest level a node can reach.
const MAX_LEVEL: usize = 32;

/// Chance that a node promoted to level `n` is also promoted to `n + 1`.
const PROBABILITY: f64 = 0.25;

/// Arena slot of the header sentinel.
const HEADER: usize = 0;

/// Flags that control ZADD behavior.
#[derive(Debug, Clone, Default)]
pub struct ZAddFlags {
    /// Only add new members, don't update existing scores.
    pub nx: bool,
    /// Only update existing members, don't add new ones.
    pub xx: bool,
    /// Only update when new score > current score.
    pub gt: bool,
    /// Only update when new score < current score.
    pub lt: bool,
}

/// Outcome of adding a single member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddResult {
    /// A new member was inserted.
    pub added: bool,
    /// An existing member moved to a different score.
    pub updated: bool,
}

impl AddResult {
    /// Member was neither added nor updated.
    pub const UNCHANGED: Self = Self {
        added: false,
        updated: false,
    };
}

/// Score interval used by range and count queries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreRange {
    pub min: f64,
    pub max: f64,
    pub min_inclusive: bool,
    pub max_inclusive: bool,
}

impl ScoreRange {
    /// Closed interval `[min, max]`.
    pub fn inclusive(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            min_inclusive: true,
            max_inclusive: true,
        }
    }

    /// Every possible score.
    pub fn all() -> Self {
        Self::inclusive(f64::NEG_INFINITY, f64::INFINITY)
    }

    #[inline]
    fn above_min(&self, score: f64) -> bool {
        if self.min_inclusive {
            score >= self.min
        } else {
            score > self.min
        }
    }

    #[inline]
    fn below_max(&self, score: f64) -> bool {
        if self.max_inclusive {
            score <= self.max
        } else {
            score < self.max
        }
    }

    /// True when no score can satisfy both bounds.
    pub fn is_empty(&self) -> bool {
        self.min > self.max
            || (self.min == self.max && !(self.min_inclusive && self.max_inclusive))
    }
}

/// Pagination for score range queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limit {
    /// Matches to skip before collecting.
    pub offset: usize,
    /// Maximum matches to return; `None` is unbounded.
    pub count: Option<usize>,
}

/// One item of a range reply. With scores requested, each member is
/// followed by its score.
#[derive(Debug, Clone, PartialEq)]
pub enum Element<M> {
    Member(M),
    Score(f64),
}

#[derive(Debug, Clone, Copy, Default)]
struct Link {
    forward: Option<usize>,
    /// Level-0 steps covered by `forward`. On a link to nothing it holds
    /// the number of nodes after this one.
    span: usize,
}

#[derive(Debug)]
struct Node<M> {
    /// `None` for the header and for slots on the free list.
    member: Option<M>,
    score: f64,
    backward: Option<usize>,
    links: Vec<Link>,
}

#[derive(Debug)]
struct SkipList<M> {
    nodes: Vec<Node<M>>,
    free: Vec<usize>,
    index: HashMap<M, usize>,
    tail: Option<usize>,
    level: usize,
    length: usize,
    rng: StdRng,
}

/// `-0.0` becomes `0.0`; the two must tie and fall back to member order.
#[inline]
fn canonical(score: f64) -> f64 {
    score + 0.0
}

impl<M: Ord + StdHash + Clone> SkipList<M> {
    fn new(rng: StdRng) -> Self {
        let header = Node {
            member: None,
            score: f64::NEG_INFINITY,
            backward: None,
            links: vec![Link::default(); MAX_LEVEL],
        };
        Self {
            nodes: vec![header],
            free: Vec::new(),
            index: HashMap::new(),
            tail: None,
            level: 1,
            length: 0,
            rng,
        }
    }

    fn random_level(&mut self) -> usize {
        let mut level = 1;
        while level < MAX_LEVEL && self.rng.gen::<f64>() < PROBABILITY {
            level += 1;
        }
        level
    }

    #[inline]
    fn member(&self, id: usize) -> &M {
        self.nodes[id]
            .member
            .as_ref()
            .expect("linked slot always holds a member")
    }

    /// Orders the node in slot `id` against the key `(score, member)`.
    /// Stored scores are [`canonical`], so `total_cmp` matches `==`.
    #[inline]
    fn cmp_node(&self, id: usize, score: f64, member: &M) -> Ordering {
        self.nodes[id]
            .score
            .total_cmp(&score)
            .then_with(|| self.member(id).cmp(member))
    }

    /// For every active level, the last node strictly before
    /// `(score, member)` and that node's 0-based position (header = 0).
    fn predecessors(&self, score: f64, member: &M) -> ([usize; MAX_LEVEL], [usize; MAX_LEVEL]) {
        let mut update = [HEADER; MAX_LEVEL];
        let mut rank = [0usize; MAX_LEVEL];
        let mut x = HEADER;
        for i in (0..self.level).rev() {
            rank[i] = if i + 1 == self.level { 0 } else { rank[i + 1] };
            while let Some(next) = self.nodes[x].links[i].forward {
                if self.cmp_node(next, score, member) == Ordering::Less {
                    rank[i] += self.nodes[x].links[i].span;
                    x = next;
                } else {
                    break;
                }
            }
            update[i] = x;
        }
        (update, rank)
    }

    fn alloc(&mut self, member: M, score: f64, level: usize) -> usize {
        let node = Node {
            member: Some(member),
            score,
            backward: None,
            links: vec![Link::default(); level],
        };
        match self.free.pop() {
            Some(id) => {
                self.nodes[id] = node;
                id
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    fn insert(&mut self, score: f64, member: M) {
        let (mut update, mut rank) = self.predecessors(score, &member);

        let level = self.random_level();
        if level > self.level {
            for i in self.level..level {
                rank[i] = 0;
                update[i] = HEADER;
                self.nodes[HEADER].links[i] = Link {
                    forward: None,
                    span: self.length,
                };
            }
            self.level = level;
        }

        let id = self.alloc(member.clone(), score, level);
        for i in 0..level {
            let prev = self.nodes[update[i]].links[i];
            let hops = rank[0] - rank[i];
            self.nodes[id].links[i] = Link {
                forward: prev.forward,
                span: prev.span - hops,
            };
            self.nodes[update[i]].links[i] = Link {
                forward: Some(id),
                span: hops + 1,
            };
        }
        for i in level..self.level {
            self.nodes[update[i]].links[i].span += 1;
        }

        self.nodes[id].backward = (update[0] != HEADER).then_some(update[0]);
        match self.nodes[id].links[0].forward {
            Some(next) => self.nodes[next].backward = Some(id),
            None => self.tail = Some(id),
        }

        self.index.insert(member, id);
        self.length += 1;
    }

    /// Unlinks the node in slot `id` from every level and frees the slot.
    fn delete(&mut self, id: usize) -> (M, f64) {
        let (update, _) = {
            let node = &self.nodes[id];
            self.predecessors(node.score, self.member(id))
        };

        for i in 0..self.level {
            let prev = update[i];
            if self.nodes[prev].links[i].forward == Some(id) {
                let removed = self.nodes[id].links[i];
                let link = &mut self.nodes[prev].links[i];
                link.span = link.span + removed.span - 1;
                link.forward = removed.forward;
            } else {
                self.nodes[prev].links[i].span -= 1;
            }
        }

        let backward = self.nodes[id].backward;
        match self.nodes[id].links[0].forward {
            Some(next) => self.nodes[next].backward = backward,
            None => self.tail = backward,
        }

        while self.level > 1 && self.nodes[HEADER].links[self.level - 1].forward.is_none() {
            self.level -= 1;
        }

        let node = &mut self.nodes[id];
        let member = node
            .member
            .take()
            .expect("linked slot always holds a member");
        let score = node.score;
        node.links.clear();
        node.backward = None;
        self.free.push(id);

        self.index.remove(&member);
        self.length -= 1;
        (member, score)
    }

    /// 1-based rank of `(score, member)`, or `None` if no such node.
    fn rank_of(&self, score: f64, member: &M) -> Option<usize> {
        let mut traversed = 0;
        let mut x = HEADER;
        for i in (0..self.level).rev() {
            while let Some(next) = self.nodes[x].links[i].forward {
                if self.cmp_node(next, score, member) != Ordering::Greater {
                    traversed += self.nodes[x].links[i].span;
                    x = next;
                } else {
                    break;
                }
            }
            if x != HEADER && self.member(x) == member {
                return Some(traversed);
            }
        }
        None
    }

    fn rank_of_node(&self, id: usize) -> Option<usize> {
        self.rank_of(self.nodes[id].score, self.member(id))
    }

    /// Node at 1-based `rank`.
    fn node_at(&self, rank: usize) -> Option<usize> {
        let mut traversed = 0;
        let mut x = HEADER;
        for i in (0..self.level).rev() {
            while let Some(next) = self.nodes[x].links[i].forward {
                let span = self.nodes[x].links[i].span;
                if traversed + span <= rank {
                    traversed += span;
                    x = next;
                } else {
                    break;
                }
            }
            if traversed == rank {
                return (x != HEADER).then_some(x);
            }
        }
        None
    }

    /// First node whose score lies inside `range`.
    fn first_in_range(&self, range: &ScoreRange) -> Option<usize> {
        if range.is_empty() {
            return None;
        }
        let mut x = HEADER;
        for i in (0..self.level).rev() {
            while let Some(next) = self.nodes[x].links[i].forward {
                if range.above_min(self.nodes[next].score) {
                    break;
                }
                x = next;
            }
        }
        let candidate = self.nodes[x].links[0].forward?;
        range
            .below_max(self.nodes[candidate].score)
            .then_some(candidate)
    }

    /// Last node whose score lies inside `range`.
    fn last_in_range(&self, range: &ScoreRange) -> Option<usize> {
        if range.is_empty() {
            return None;
        }
        let mut x = HEADER;
        for i in (0..self.level).rev() {
            while let Some(next) = self.nodes[x].links[i].forward {
                if !range.below_max(self.nodes[next].score) {
                    break;
                }
                x = next;
            }
        }
        (x != HEADER && range.above_min(self.nodes[x].score)).then_some(x)
    }

    fn push_element(&self, out: &mut Vec<Element<M>>, id: usize, with_scores: bool) {
        out.push(Element::Member(self.member(id).clone()));
        if with_scores {
            out.push(Element::Score(self.nodes[id].score));
        }
    }

    fn upsert(&mut self, member: M, score: f64, flags: &ZAddFlags) -> AddResult {
        let score = canonical(score);
        match self.index.get(&member).copied() {
            Some(id) => {
                let old = self.nodes[id].score;
                if flags.nx
                    || (flags.gt && score <= old)
                    || (flags.lt && score >= old)
                    || score == old
                {
                    return AddResult::UNCHANGED;
                }
                // the node must move, so re-insert rather than edit in place
                let (member, _) = self.delete(id);
                self.insert(score, member);
                AddResult {
                    added: false,
                    updated: true,
                }
            }
            None => {
                if flags.xx {
                    return AddResult::UNCHANGED;
                }
                self.insert(score, member);
                AddResult {
                    added: true,
                    updated: false,
                }
            }
        }
    }
}

/// A sorted set of unique members, each with an `f64` score.
///
/// All state sits behind a single reader/writer lock: mutations take it
/// exclusively, queries share it. Query results are copies.
#[derive(Debug)]
pub struct SortedSet<M = Member> {
    inner: RwLock<SkipList<M>>,
    clock: AccessClock,
}

impl<M: Ord + StdHash + Clone> Default for SortedSet<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Ord + StdHash + Clone> SortedSet<M> {
    /// Creates an empty set with a level generator seeded from OS entropy.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Creates an empty set with a deterministic level generator.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            inner: RwLock::new(SkipList::new(rng)),
            clock: AccessClock::default(),
        }
    }

    /// Adds members or moves them to new scores. Returns how many members
    /// did not exist before; score changes are not counted.
    pub fn add<I>(&self, member_scores: I) -> usize
    where
        I: IntoIterator<Item = (M, f64)>,
    {
        let flags = ZAddFlags::default();
        let mut list = self.inner.write();
        member_scores
            .into_iter()
            .map(|(member, score)| list.upsert(member, score, &flags))
            .filter(|result| result.added)
            .count()
    }

    /// Adds or updates one member under ZADD flag semantics.
    pub fn add_with_flags(&self, member: M, score: f64, flags: &ZAddFlags) -> AddResult {
        self.inner.write().upsert(member, score, flags)
    }

    /// Removes the given members. Absent members are skipped.
    pub fn remove<'a, I>(&self, members: I) -> usize
    where
        I: IntoIterator<Item = &'a M>,
        M: 'a,
    {
        let mut list = self.inner.write();
        let mut removed = 0;
        for member in members {
            if let Some(id) = list.index.get(member).copied() {
                list.delete(id);
                removed += 1;
            }
        }
        removed
    }

    pub fn score(&self, member: &M) -> Option<f64> {
        let list = self.inner.read();
        list.index.get(member).map(|&id| list.nodes[id].score)
    }

    /// 0-based position in ascending `(score, member)` order.
    pub fn rank(&self, member: &M) -> Option<usize> {
        let list = self.inner.read();
        let id = *list.index.get(member)?;
        let rank = list.rank_of_node(id);
        debug_assert!(rank.is_some(), "indexed member missing from skip list");
        rank.map(|r| r - 1)
    }

    /// 0-based position in descending order.
    pub fn rev_rank(&self, member: &M) -> Option<usize> {
        let list = self.inner.read();
        let id = *list.index.get(member)?;
        list.rank_of_node(id).map(|r| list.length - r)
    }

    pub fn len(&self) -> usize {
        self.inner.read().length
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Members at positions `start..=stop` in ascending order. Negative
    /// indices count from the end.
    pub fn range_by_index(&self, start: i64, stop: i64, with_scores: bool) -> Vec<Element<M>> {
        let list = self.inner.read();
        let Some((start, stop)) = normalize_range(start, stop, list.length) else {
            return Vec::new();
        };
        let mut out = Vec::with_capacity((stop - start + 1) * (1 + with_scores as usize));
        let mut cursor = list.node_at(start + 1);
        for _ in start..=stop {
            let Some(id) = cursor else { break };
            list.push_element(&mut out, id, with_scores);
            cursor = list.nodes[id].links[0].forward;
        }
        out
    }

    /// Like [`range_by_index`](Self::range_by_index) with positions
    /// counted from the highest score.
    pub fn rev_range_by_index(&self, start: i64, stop: i64, with_scores: bool) -> Vec<Element<M>> {
        let list = self.inner.read();
        let Some((start, stop)) = normalize_range(start, stop, list.length) else {
            return Vec::new();
        };
        let mut out = Vec::with_capacity((stop - start + 1) * (1 + with_scores as usize));
        let mut cursor = list.node_at(list.length - start);
        for _ in start..=stop {
            let Some(id) = cursor else { break };
            list.push_element(&mut out, id, with_scores);
            cursor = list.nodes[id].backward;
        }
        out
    }

    /// Members whose score lies in `range`, ascending.
    pub fn range_by_score(
        &self,
        range: &ScoreRange,
        with_scores: bool,
        limit: Option<Limit>,
    ) -> Vec<Element<M>> {
        let list = self.inner.read();
        let limit = limit.unwrap_or(Limit {
            offset: 0,
            count: None,
        });
        let mut cursor = list.first_in_range(range);
        if limit.offset > 0 {
            cursor = cursor
                .and_then(|id| list.rank_of_node(id))
                .and_then(|rank| list.node_at(rank + limit.offset));
        }

        let mut out = Vec::new();
        let mut remaining = limit.count;
        while let Some(id) = cursor {
            if remaining == Some(0) || !range.below_max(list.nodes[id].score) {
                break;
            }
            list.push_element(&mut out, id, with_scores);
            remaining = remaining.map(|n| n - 1);
            cursor = list.nodes[id].links[0].forward;
        }
        out
    }

    /// Members whose score lies in `range`, descending.
    pub fn rev_range_by_score(
        &self,
        range: &ScoreRange,
        with_scores: bool,
        limit: Option<Limit>,
    ) -> Vec<Element<M>> {
        let list = self.inner.read();
        let limit = limit.unwrap_or(Limit {
            offset: 0,
            count: None,
        });
        let mut cursor = list.last_in_range(range);
        if limit.offset > 0 {
            cursor = cursor
                .and_then(|id| list.rank_of_node(id))
                .and_then(|rank| rank.checked_sub(limit.offset))
                .and_then(|rank| list.node_at(rank));
        }

        let mut out = Vec::new();
        let mut remaining = limit.count;
        while let Some(id) = cursor {
            if remaining == Some(0) || !range.above_min(list.nodes[id].score) {
                break;
            }
            list.push_element(&mut out, id, with_scores);
            remaining = remaining.map(|n| n - 1);
            cursor = list.nodes[id].backward;
        }
        out
    }

    /// Number of members whose score lies in `range`.
    pub fn count(&self, range: &ScoreRange) -> usize {
        let list = self.inner.read();
        let (Some(first), Some(last)) = (list.first_in_range(range), list.last_in_range(range))
        else {
            return 0;
        };
        match (list.rank_of_node(first), list.rank_of_node(last)) {
            (Some(lo), Some(hi)) if hi >= lo => hi - lo + 1,
            _ => 0,
        }
    }

    /// Adds `delta` to the member's score, treating a missing member as 0.
    pub fn incr_by(&self, member: M, delta: f64) -> Result<f64> {
        self.incr_with_flags(member, delta, &ZAddFlags::default())
            .map(|score| score.unwrap_or(delta))
    }

    /// ZADD INCR: returns the new score, or `None` when a flag blocked
    /// the update.
    pub fn incr_with_flags(&self, member: M, delta: f64, flags: &ZAddFlags) -> Result<Option<f64>> {
        let mut list = self.inner.write();
        let current = list.index.get(&member).map(|&id| list.nodes[id].score);
        let score = canonical(current.unwrap_or(0.0) + delta);
        if score.is_nan() {
            return Err(Error::ScoreIsNan);
        }
        let result = list.upsert(member, score, flags);
        if result.added || result.updated {
            Ok(Some(score))
        } else if current == Some(score) && !(flags.nx || flags.gt || flags.lt) {
            // adding zero still reports the unchanged score
            Ok(Some(score))
        } else {
            Ok(None)
        }
    }

    /// Snapshot of all `(member, score)` pairs in ascending order.
    pub fn to_vec(&self) -> Vec<(M, f64)> {
        let list = self.inner.read();
        let mut out = Vec::with_capacity(list.length);
        let mut cursor = list.nodes[HEADER].links[0].forward;
        while let Some(id) = cursor {
            out.push((list.member(id).clone(), list.nodes[id].score));
            cursor = list.nodes[id].links[0].forward;
        }
        out
    }
}

impl<M: Ord + StdHash + Clone + Send + Sync> Collection for SortedSet<M> {
    fn clock(&self) -> &AccessClock {
        &self.clock
    }

    fn len(&self) -> usize {
        SortedSet::len(self)
    }
}
