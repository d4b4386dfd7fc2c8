//! Per-tick forces: region containment and neighbor repulsion.
//!
//! Everything here is a pure function of positions, the neighbor relation,
//! and the tunables. The world hands the resulting force vectors to its
//! [`Integrator`](crate::integrator::Integrator).

use crate::agent::Agent;
use crate::config::Region;
use crate::id::AgentId;
use crate::math::Vec2;
use crate::neighbor::NeighborSet;
use slotmap::{SecondaryMap, SlotMap};

/// Penetration-proportional force pushing `position` back into `region`.
///
/// Each axis is handled independently and the force is zero inside the
/// region and on its edge. Magnitude is not clamped.
pub fn boundary_force(position: Vec2, region: &Region, k: f64) -> Vec2 {
    Vec2::new(
        axis_force(position.x, region.min.x, region.max.x, k),
        axis_force(position.y, region.min.y, region.max.y, k),
    )
}

fn axis_force(p: f64, min: f64, max: f64, k: f64) -> f64 {
    if p < min {
        k * (min - p)
    } else if p > max {
        k * (max - p)
    } else {
        0.0
    }
}

/// Inverse-square repulsion felt at `position` from a neighbor at `other`:
/// `k * normalize(position - other) / |position - other|^2`.
///
/// Coincident points have no separating direction and produce no force.
pub fn repulsion_force(position: Vec2, other: Vec2, k: f64) -> Vec2 {
    let diff = position - other;
    let dist_sq = diff.length_squared();
    match diff.try_normalize() {
        Some(dir) if dist_sq > 0.0 => dir * (k / dist_sq),
        _ => Vec2::ZERO,
    }
}

/// Sum of boundary and neighbor forces for every agent, all computed from
/// the same snapshot of positions.
pub fn compute_forces(
    agents: &SlotMap<AgentId, Agent>,
    neighbors: &NeighborSet,
    region: &Region,
    boundary_k: f64,
    repulsion_k: f64,
) -> SecondaryMap<AgentId, Vec2> {
    let mut forces = SecondaryMap::with_capacity(agents.len());
    for (id, agent) in agents {
        let mut force = boundary_force(agent.position, region, boundary_k);
        for other in neighbors.neighbors(id) {
            if let Some(neighbor) = agents.get(other) {
                force += repulsion_force(agent.position, neighbor.position, repulsion_k);
            }
        }
        forces.insert(id, force);
    }
    forces
}
