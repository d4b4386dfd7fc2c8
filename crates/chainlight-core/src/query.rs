//! Read-only query API for inspecting world state.
//!
//! Snapshots are owned copies, suitable for handing to rendering or UI code
//! without borrowing the world.

use crate::agent::LightState;
use crate::fixed::Fixed64;
use crate::id::AgentId;
use crate::math::Vec2;

/// An aggregated, read-only view of a single agent.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentSnapshot {
    pub id: AgentId,
    pub position: Vec2,
    pub velocity: Vec2,
    pub state: LightState,
    pub source: Option<AgentId>,
    pub feedback_target: Option<AgentId>,
    /// Reveal progress as a 0..1 fraction: 0 while idle or waiting on the
    /// source, 1 once lit.
    pub light_progress: Fixed64,
    /// Remaining feedback window; zero when not playing feedback.
    pub feedback_timer: Fixed64,
    /// Neighbors currently in range, ascending by id.
    pub neighbors: Vec<AgentId>,
}

impl AgentSnapshot {
    /// Whether this agent is drawn highlighted.
    pub fn is_highlighted(&self) -> bool {
        self.state == LightState::Lit
    }
}
