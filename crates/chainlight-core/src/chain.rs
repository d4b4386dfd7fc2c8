//! Greedy chain propagation.
//!
//! Starting from a clicked agent, the chain repeatedly jumps to the nearest
//! idle neighbor of the current agent, marking each one `BeingLit`, until no
//! idle neighbor remains. The whole pass runs synchronously; the visible
//! reveal is sequenced later by the lighting timers.

use crate::agent::Agent;
use crate::error::SimError;
use crate::fixed::Fixed64;
use crate::id::AgentId;
use crate::neighbor::NeighborSet;
use slotmap::SlotMap;
use std::collections::BTreeSet;

// ---------------------------------------------------------------------------
// Path
// ---------------------------------------------------------------------------

/// One link of a chain: `from` lit `to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hop {
    pub from: AgentId,
    pub to: AgentId,
}

/// Ordered record of a chain from its clicked origin to its terminal agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropagationPath {
    origin: AgentId,
    hops: Vec<Hop>,
}

impl PropagationPath {
    pub fn new(origin: AgentId) -> Self {
        Self {
            origin,
            hops: Vec::new(),
        }
    }

    pub fn origin(&self) -> AgentId {
        self.origin
    }

    pub fn hops(&self) -> &[Hop] {
        &self.hops
    }

    /// Number of hops, which equals the number of agents made `BeingLit`.
    pub fn len(&self) -> usize {
        self.hops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hops.is_empty()
    }

    /// Every visited agent in visitation order, origin first.
    pub fn nodes(&self) -> impl Iterator<Item = AgentId> + '_ {
        std::iter::once(self.origin).chain(self.hops.iter().map(|h| h.to))
    }

    /// Every visited agent that had a successor, in visitation order.
    pub fn links(&self) -> impl Iterator<Item = AgentId> + '_ {
        self.hops.iter().map(|h| h.from)
    }

    /// The last agent of the chain (the origin for an empty chain).
    pub fn terminal(&self) -> AgentId {
        self.hops.last().map_or(self.origin, |h| h.to)
    }

    pub fn contains(&self, agent: AgentId) -> bool {
        self.nodes().any(|n| n == agent)
    }

    fn push(&mut self, hop: Hop) {
        self.hops.push(hop);
    }
}

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// State threaded through one propagation pass.
#[derive(Debug, Clone)]
pub struct ChainContext {
    path: PropagationPath,
    visited: BTreeSet<AgentId>,
}

impl ChainContext {
    pub fn new(origin: AgentId) -> Self {
        Self {
            path: PropagationPath::new(origin),
            visited: BTreeSet::from([origin]),
        }
    }

    pub fn path(&self) -> &PropagationPath {
        &self.path
    }

    pub fn has_visited(&self, agent: AgentId) -> bool {
        self.visited.contains(&agent)
    }

    fn record(&mut self, hop: Hop) {
        self.visited.insert(hop.to);
        self.path.push(hop);
    }

    pub fn into_path(self) -> PropagationPath {
        self.path
    }
}

// ---------------------------------------------------------------------------
// Propagation
// ---------------------------------------------------------------------------

/// The idle, unvisited neighbor of `current` closest to it. Ties go to the
/// lowest id because neighbors are scanned in ascending order and only a
/// strictly smaller distance replaces the best so far.
pub fn nearest_idle_neighbor(
    agents: &SlotMap<AgentId, Agent>,
    neighbors: &NeighborSet,
    current: AgentId,
    ctx: &ChainContext,
) -> Option<AgentId> {
    let here = agents.get(current)?.position;
    let mut best: Option<(AgentId, f64)> = None;
    for candidate in neighbors.neighbors(current) {
        if ctx.has_visited(candidate) {
            continue;
        }
        let Some(agent) = agents.get(candidate) else {
            continue;
        };
        if !agent.is_idle() {
            continue;
        }
        let distance = agent.position.distance(here);
        if best.is_none_or(|(_, d)| distance < d) {
            best = Some((candidate, distance));
        }
    }
    best.map(|(id, _)| id)
}

/// Run the greedy pass from `origin`, marking each selected agent
/// `BeingLit` with `light_duration` on its timer.
///
/// The origin itself is not touched; callers decide how it is lit.
pub fn propagate(
    agents: &mut SlotMap<AgentId, Agent>,
    neighbors: &NeighborSet,
    origin: AgentId,
    light_duration: Fixed64,
) -> Result<PropagationPath, SimError> {
    if !agents.contains_key(origin) {
        return Err(SimError::UnknownAgent(origin));
    }
    let mut ctx = ChainContext::new(origin);
    let mut current = origin;

    while let Some(next) = nearest_idle_neighbor(agents, neighbors, current, &ctx) {
        agents[next].begin_lighting(next, current, light_duration)?;
        agents[current].passed_on = true;
        ctx.record(Hop {
            from: current,
            to: next,
        });
        current = next;
    }

    Ok(ctx.into_path())
}
