//! Integration of force vectors into velocity and position.
//!
//! The force model only produces forces. Hosts with their own physics engine
//! implement [`Integrator`] to forward those forces; headless hosts use the
//! bundled [`EulerIntegrator`].

use crate::agent::Agent;
use crate::id::AgentId;
use crate::math::Vec2;

/// Consumes one force per agent per tick.
pub trait Integrator: std::fmt::Debug {
    /// Apply `force` to `agent` over a timestep of `dt` seconds.
    fn integrate(&mut self, id: AgentId, agent: &mut Agent, force: Vec2, dt: f64);
}

/// Semi-implicit Euler with uniform mass and linear drag.
#[derive(Debug, Clone, PartialEq)]
pub struct EulerIntegrator {
    pub mass: f64,
    /// Fraction of velocity removed per second. Zero disables drag.
    pub linear_drag: f64,
}

impl Default for EulerIntegrator {
    fn default() -> Self {
        Self {
            mass: 1.0,
            linear_drag: 0.0,
        }
    }
}

impl Integrator for EulerIntegrator {
    fn integrate(&mut self, _id: AgentId, agent: &mut Agent, force: Vec2, dt: f64) {
        let acceleration = force / self.mass;
        agent.velocity += acceleration * dt;
        if self.linear_drag > 0.0 {
            agent.velocity = agent.velocity * (1.0 - self.linear_drag * dt).max(0.0);
        }
        agent.position += agent.velocity * dt;
    }
}
