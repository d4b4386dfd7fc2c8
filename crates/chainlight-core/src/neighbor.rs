//! The symmetric proximity relation between agents.
//!
//! The core never tests proximity itself; the host's broad phase reports
//! pairs entering and leaving range and this set mirrors those reports.

use crate::id::AgentId;
use slotmap::SecondaryMap;
use std::collections::BTreeSet;

/// Symmetric, irreflexive neighbor relation keyed by [`AgentId`].
///
/// Each agent's neighbors are kept in a `BTreeSet`, so iteration is in
/// ascending id order and therefore deterministic.
#[derive(Debug, Clone, Default)]
pub struct NeighborSet {
    links: SecondaryMap<AgentId, BTreeSet<AgentId>>,
}

impl NeighborSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `a` and `b` are in range. Returns `true` if the pair was
    /// not already linked. Self-pairs are ignored.
    pub fn link(&mut self, a: AgentId, b: AgentId) -> bool {
        if a == b {
            return false;
        }
        let inserted = self.entry(a).insert(b);
        self.entry(b).insert(a);
        inserted
    }

    /// Record that `a` and `b` left range. Returns `true` if they were linked.
    pub fn unlink(&mut self, a: AgentId, b: AgentId) -> bool {
        let removed = self.links.get_mut(a).is_some_and(|set| set.remove(&b));
        if let Some(set) = self.links.get_mut(b) {
            set.remove(&a);
        }
        removed
    }

    pub fn contains(&self, a: AgentId, b: AgentId) -> bool {
        self.links.get(a).is_some_and(|set| set.contains(&b))
    }

    /// Neighbors of `agent` in ascending id order.
    pub fn neighbors(&self, agent: AgentId) -> impl Iterator<Item = AgentId> + '_ {
        self.links.get(agent).into_iter().flat_map(|set| set.iter().copied())
    }

    pub fn degree(&self, agent: AgentId) -> usize {
        self.links.get(agent).map_or(0, BTreeSet::len)
    }

    /// Total number of undirected links.
    pub fn link_count(&self) -> usize {
        self.links.values().map(BTreeSet::len).sum::<usize>() / 2
    }

    fn entry(&mut self, agent: AgentId) -> &mut BTreeSet<AgentId> {
        if !self.links.contains_key(agent) {
            self.links.insert(agent, BTreeSet::new());
        }
        &mut self.links[agent]
    }
}
