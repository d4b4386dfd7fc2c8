//! Agents: kinematic state, the lighting state machine, and per-agent timers.
//!
//! The lighting state only ever moves forward:
//!
//! ```text
//! Idle ──begin_lighting──▶ BeingLit ──timer elapsed──▶ Lit
//!   └──────────────── clicked (chain origin) ──────────▶ Lit
//! ```

use crate::error::SimError;
use crate::fixed::Fixed64;
use crate::id::AgentId;
use crate::math::Vec2;
use serde::{Deserialize, Serialize};

/// Lighting state of an agent. Ordered so that `a < b` means `a` comes
/// earlier in the lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LightState {
    Idle,
    BeingLit,
    Lit,
}

impl LightState {
    pub(crate) fn tag(self) -> u32 {
        self as u32
    }
}

/// A simulated point agent.
#[derive(Debug, Clone)]
pub struct Agent {
    pub position: Vec2,
    pub velocity: Vec2,
    pub(crate) state: LightState,
    pub(crate) source: Option<AgentId>,
    pub(crate) feedback_target: Option<AgentId>,
    pub(crate) light_timer: Fixed64,
    pub(crate) feedback_timer: Fixed64,
    pub(crate) passed_on: bool,
}

impl Agent {
    pub fn new(position: Vec2, velocity: Vec2) -> Self {
        Self {
            position,
            velocity,
            state: LightState::Idle,
            source: None,
            feedback_target: None,
            light_timer: Fixed64::ZERO,
            feedback_timer: Fixed64::ZERO,
            passed_on: false,
        }
    }

    pub fn state(&self) -> LightState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == LightState::Idle
    }

    pub fn is_being_lit(&self) -> bool {
        self.state == LightState::BeingLit
    }

    pub fn is_lit(&self) -> bool {
        self.state == LightState::Lit
    }

    /// The agent that lit this one, if any.
    pub fn source(&self) -> Option<AgentId> {
        self.source
    }

    /// The agent currently receiving feedback from this one.
    pub fn feedback_target(&self) -> Option<AgentId> {
        self.feedback_target
    }

    pub fn light_timer(&self) -> Fixed64 {
        self.light_timer
    }

    pub fn feedback_timer(&self) -> Fixed64 {
        self.feedback_timer
    }

    /// Whether a chain link was made from this agent to a successor.
    pub fn passed_on(&self) -> bool {
        self.passed_on
    }

    /// Start this agent's reveal: Idle → BeingLit, remembering `source`.
    ///
    /// Fails with [`SimError::InvalidState`] unless the agent is idle.
    pub fn begin_lighting(
        &mut self,
        me: AgentId,
        source: AgentId,
        duration: Fixed64,
    ) -> Result<(), SimError> {
        if self.state != LightState::Idle {
            log::error!(
                "agent {me:?} asked to start lighting from {source:?} while {:?}",
                self.state
            );
            return Err(SimError::InvalidState {
                agent: me,
                state: self.state,
            });
        }
        self.state = LightState::BeingLit;
        self.source = Some(source);
        self.light_timer = duration;
        Ok(())
    }

    /// Mark the clicked chain origin as lit. Only idle agents qualify.
    pub(crate) fn light_as_origin(&mut self, me: AgentId) -> Result<(), SimError> {
        if self.state != LightState::Idle {
            log::error!("agent {me:?} clicked as chain origin while {:?}", self.state);
            return Err(SimError::InvalidState {
                agent: me,
                state: self.state,
            });
        }
        self.state = LightState::Lit;
        Ok(())
    }

    /// Count the reveal timer down by `dt`. Returns `true` on the step that
    /// completes the reveal, which also moves the agent to `Lit`.
    pub(crate) fn tick_light(&mut self, dt: Fixed64) -> bool {
        if self.state != LightState::BeingLit {
            return false;
        }
        self.light_timer -= dt;
        if self.light_timer <= Fixed64::ZERO {
            self.light_timer = Fixed64::ZERO;
            self.state = LightState::Lit;
            return true;
        }
        false
    }

    pub(crate) fn start_feedback(&mut self, target: AgentId, duration: Fixed64) {
        self.feedback_target = Some(target);
        self.feedback_timer = duration;
    }

    pub(crate) fn finish_feedback(&mut self) {
        self.feedback_target = None;
        self.feedback_timer = Fixed64::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::f64_to_fixed64;
    use slotmap::SlotMap;

    fn ids() -> (AgentId, AgentId) {
        let mut map: SlotMap<AgentId, ()> = SlotMap::with_key();
        (map.insert(()), map.insert(()))
    }

    #[test]
    fn new_agent_is_idle() {
        let agent = Agent::new(Vec2::ZERO, Vec2::ZERO);
        assert_eq!(agent.state(), LightState::Idle);
        assert!(agent.source().is_none());
        assert_eq!(agent.light_timer(), Fixed64::ZERO);
    }

    #[test]
    fn begin_lighting_sets_source_and_timer() {
        let (a, b) = ids();
        let mut agent = Agent::new(Vec2::ZERO, Vec2::ZERO);
        agent.begin_lighting(b, a, f64_to_fixed64(0.2)).unwrap();
        assert!(agent.is_being_lit());
        assert_eq!(agent.source(), Some(a));
        assert_eq!(agent.light_timer(), f64_to_fixed64(0.2));
    }

    #[test]
    fn begin_lighting_twice_is_invalid() {
        let (a, b) = ids();
        let mut agent = Agent::new(Vec2::ZERO, Vec2::ZERO);
        agent.begin_lighting(b, a, f64_to_fixed64(0.2)).unwrap();
        let err = agent.begin_lighting(b, a, f64_to_fixed64(0.2)).unwrap_err();
        assert_eq!(
            err,
            SimError::InvalidState {
                agent: b,
                state: LightState::BeingLit
            }
        );
    }

    #[test]
    fn begin_lighting_on_lit_is_invalid() {
        let (a, b) = ids();
        let mut agent = Agent::new(Vec2::ZERO, Vec2::ZERO);
        agent.light_as_origin(b).unwrap();
        assert!(matches!(
            agent.begin_lighting(b, a, f64_to_fixed64(0.2)),
            Err(SimError::InvalidState {
                state: LightState::Lit,
                ..
            })
        ));
    }

    #[test]
    fn tick_light_completes_and_clamps() {
        let (a, b) = ids();
        let mut agent = Agent::new(Vec2::ZERO, Vec2::ZERO);
        agent.begin_lighting(b, a, f64_to_fixed64(0.05)).unwrap();
        let dt = f64_to_fixed64(0.02);
        assert!(!agent.tick_light(dt));
        assert!(!agent.tick_light(dt));
        assert!(agent.tick_light(dt));
        assert!(agent.is_lit());
        assert_eq!(agent.light_timer(), Fixed64::ZERO);
        // Lit is terminal.
        assert!(!agent.tick_light(dt));
        assert!(agent.is_lit());
    }

    #[test]
    fn states_are_ordered_by_lifecycle() {
        assert!(LightState::Idle < LightState::BeingLit);
        assert!(LightState::BeingLit < LightState::Lit);
    }
}
