//! The world: owns every agent and runs the fixed-step pipeline.
//!
//! # Architecture
//!
//! The `World` owns:
//! - the agents, keyed by [`AgentId`] in a `SlotMap`
//! - the [`NeighborSet`] mirrored from the host's proximity events
//! - the in-flight [`PropagationPath`] (at most one)
//! - the [`FeedbackScheduler`] for completed chains
//! - the host collaborators: an [`EffectSink`] and an [`Integrator`]
//! - a [`SimState`] clock, a seeded [`SimRng`], and an [`EventBus`]
//!
//! # Pipeline
//!
//! Each `step()` runs:
//! 1. **Forces** -- boundary and repulsion forces from one position snapshot,
//!    handed to the integrator
//! 2. **Lighting** -- reveal timers count down once their source is lit
//! 3. **Feedback** -- completed chains play back in reverse
//! 4. **Post-tick** -- deliver buffered events to subscribers
//! 5. **Bookkeeping** -- advance the tick counter, compute the state hash
//!
//! Clicks and proximity events are handled between steps, never during one.

use crate::agent::{Agent, LightState};
use crate::chain::{PropagationPath, propagate};
use crate::config::{ConfigError, Region, SwarmConfig, Tunables};
use crate::effect::{EffectKind, EffectSink};
use crate::error::SimError;
use crate::event::{Event, EventBus, EventFilter, EventKind, PassiveListener, SubscriberPriority};
use crate::feedback::{FeedbackParams, FeedbackScheduler};
use crate::fixed::{Fixed64, Ticks, fixed64_to_f64, fraction};
use crate::force::compute_forces;
use crate::id::AgentId;
use crate::integrator::{EulerIntegrator, Integrator};
use crate::math::Vec2;
use crate::neighbor::NeighborSet;
use crate::query::AgentSnapshot;
use crate::rng::SimRng;
use crate::sim::{AdvanceResult, SimState, StateHash};
use slotmap::{Key, SlotMap};
use std::collections::BTreeSet;

// ---------------------------------------------------------------------------
// Click outcome
// ---------------------------------------------------------------------------

/// Why a click did not start a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The clicked agent is already lit.
    AlreadyLit,
    /// Another chain is still revealing.
    ChainInFlight,
}

/// Result of [`World::on_clicked`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// A chain started; `hops` agents were marked `BeingLit`.
    Started { hops: usize },
    Ignored(IgnoreReason),
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
enum Spawn {
    At { position: Vec2, velocity: Option<Vec2> },
    Scatter(usize),
}

/// Assembles a [`World`] from configuration and host collaborators.
#[derive(Debug)]
pub struct WorldBuilder {
    config: SwarmConfig,
    sink: Option<Box<dyn EffectSink>>,
    integrator: Option<Box<dyn Integrator>>,
    event_capacity: usize,
    spawns: Vec<Spawn>,
}

impl WorldBuilder {
    pub fn new(config: SwarmConfig) -> Self {
        Self {
            config,
            sink: None,
            integrator: None,
            event_capacity: 1024,
            spawns: Vec::new(),
        }
    }

    /// Receiver for lightning and feedback particle emissions. Required.
    pub fn effect_sink(mut self, sink: impl EffectSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Integrator for forces. Defaults to a unit-mass [`EulerIntegrator`].
    pub fn integrator(mut self, integrator: impl Integrator + 'static) -> Self {
        self.integrator = Some(Box::new(integrator));
        self
    }

    /// Ring buffer capacity per event kind.
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Add an agent at `position` with a random initial velocity.
    pub fn agent_at(mut self, position: Vec2) -> Self {
        self.spawns.push(Spawn::At {
            position,
            velocity: None,
        });
        self
    }

    /// Add an agent with an explicit initial velocity.
    pub fn agent_with_velocity(mut self, position: Vec2, velocity: Vec2) -> Self {
        self.spawns.push(Spawn::At {
            position,
            velocity: Some(velocity),
        });
        self
    }

    /// Add `count` agents at random positions inside the region.
    pub fn scatter(mut self, count: usize) -> Self {
        self.spawns.push(Spawn::Scatter(count));
        self
    }

    /// Validate the configuration and create the world. Agents are created
    /// in the order they were added.
    pub fn build(self) -> Result<World, ConfigError> {
        let tunables = self.config.validate()?;
        let sink = self.sink.ok_or(ConfigError::MissingEffectSink)?;
        let integrator = self
            .integrator
            .unwrap_or_else(|| Box::new(EulerIntegrator::default()));

        let mut rng = SimRng::new(tunables.seed);
        let mut agents = SlotMap::with_key();
        let mut order = Vec::new();
        let region = tunables.region;
        for spawn in self.spawns {
            match spawn {
                Spawn::At { position, velocity } => {
                    let velocity = velocity.unwrap_or_else(|| rng.inside_unit_circle());
                    order.push(agents.insert(Agent::new(position, velocity)));
                }
                Spawn::Scatter(count) => {
                    for _ in 0..count {
                        let position = Vec2::new(
                            rng.range_f64(region.min.x, region.max.x),
                            rng.range_f64(region.min.y, region.max.y),
                        );
                        let velocity = rng.inside_unit_circle();
                        order.push(agents.insert(Agent::new(position, velocity)));
                    }
                }
            }
        }

        log::debug!(
            "world built with {} agents in {:?}",
            order.len(),
            region
        );

        let mut world = World {
            tunables,
            agents,
            order,
            neighbors: NeighborSet::new(),
            in_flight: None,
            feedback: FeedbackScheduler::new(),
            sink,
            integrator,
            rng,
            sim_state: SimState::new(),
            event_bus: EventBus::new(self.event_capacity),
            paused: false,
            last_state_hash: 0,
        };
        world.last_state_hash = world.compute_state_hash();
        Ok(world)
    }
}

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

/// A swarm of agents inside a region.
#[derive(Debug)]
pub struct World {
    tunables: Tunables,
    agents: SlotMap<AgentId, Agent>,
    /// Creation order; every per-agent pass iterates in this order.
    order: Vec<AgentId>,
    neighbors: NeighborSet,
    in_flight: Option<PropagationPath>,
    feedback: FeedbackScheduler,
    sink: Box<dyn EffectSink>,
    integrator: Box<dyn Integrator>,
    rng: SimRng,
    pub sim_state: SimState,
    pub event_bus: EventBus,
    paused: bool,
    last_state_hash: u64,
}

impl World {
    pub fn builder(config: SwarmConfig) -> WorldBuilder {
        WorldBuilder::new(config)
    }

    // -----------------------------------------------------------------------
    // Proximity events
    // -----------------------------------------------------------------------

    /// The host's broad phase reports that `a` and `b` came within range.
    /// Returns whether the pair was newly linked.
    pub fn on_enter_range(&mut self, a: AgentId, b: AgentId) -> Result<bool, SimError> {
        self.require(a)?;
        self.require(b)?;
        let linked = self.neighbors.link(a, b);
        if !linked {
            log::debug!("enter-range for {a:?}/{b:?} ignored (self-pair or already linked)");
        }
        Ok(linked)
    }

    /// The host's broad phase reports that `a` and `b` left range.
    /// Returns whether the pair was linked.
    pub fn on_exit_range(&mut self, a: AgentId, b: AgentId) -> Result<bool, SimError> {
        self.require(a)?;
        self.require(b)?;
        let unlinked = self.neighbors.unlink(a, b);
        if !unlinked {
            log::debug!("exit-range for unlinked pair {a:?}/{b:?}");
        }
        Ok(unlinked)
    }

    // -----------------------------------------------------------------------
    // Click
    // -----------------------------------------------------------------------

    /// The host's click dispatcher picked `agent`.
    ///
    /// Starts a chain unless the agent is already lit or another chain is
    /// still revealing; those cases are no-ops reported as
    /// [`ClickOutcome::Ignored`]. The whole greedy pass runs before this
    /// returns.
    pub fn on_clicked(&mut self, agent: AgentId) -> Result<ClickOutcome, SimError> {
        let state = self.require(agent)?.state();
        if state == LightState::Lit {
            log::debug!("click on lit agent {agent:?} ignored");
            return Ok(ClickOutcome::Ignored(IgnoreReason::AlreadyLit));
        }
        if self.is_chain_in_flight() {
            log::debug!("click on {agent:?} ignored: a chain is in flight");
            return Ok(ClickOutcome::Ignored(IgnoreReason::ChainInFlight));
        }

        self.agents[agent].light_as_origin(agent)?;
        let path = propagate(
            &mut self.agents,
            &self.neighbors,
            agent,
            self.tunables.light_duration,
        )?;

        let tick = self.sim_state.tick;
        let hops = path.len();
        log::info!("chain started at {agent:?} with {hops} hops");
        self.event_bus.emit(Event::ChainStarted {
            origin: agent,
            hops,
            tick,
        });
        for hop in path.hops() {
            self.event_bus.emit(Event::AgentBeingLit {
                agent: hop.to,
                source: hop.from,
                tick,
            });
        }

        if path.is_empty() {
            self.event_bus.emit(Event::ChainCompleted {
                origin: agent,
                terminal: agent,
                tick,
            });
        } else {
            self.in_flight = Some(path);
        }
        Ok(ClickOutcome::Started { hops })
    }

    // -----------------------------------------------------------------------
    // Advance
    // -----------------------------------------------------------------------

    /// Accumulate `elapsed` seconds and run as many fixed steps as fit,
    /// carrying the remainder to the next call.
    pub fn advance(&mut self, elapsed: Fixed64) -> AdvanceResult {
        let mut result = AdvanceResult::default();
        if self.paused {
            return result;
        }
        let dt = self.tunables.fixed_dt;
        self.sim_state.accumulator = self
            .sim_state
            .accumulator
            .saturating_add(elapsed.max(Fixed64::ZERO));
        while self.sim_state.accumulator >= dt {
            self.sim_state.accumulator -= dt;
            self.step_internal(&mut result);
        }
        result
    }

    /// Run exactly one fixed step.
    pub fn step(&mut self) -> AdvanceResult {
        let mut result = AdvanceResult::default();
        if !self.paused {
            self.step_internal(&mut result);
        }
        result
    }

    /// Step until no chain is revealing and no feedback is playing, or
    /// until `max_steps` have run. Returns the number of steps run.
    pub fn run_until_settled(&mut self, max_steps: u64) -> u64 {
        let mut steps = 0;
        while steps < max_steps && !self.paused && self.is_busy() {
            self.step();
            steps += 1;
        }
        steps
    }

    fn step_internal(&mut self, result: &mut AdvanceResult) {
        self.phase_forces();
        self.phase_lighting(result);
        self.phase_feedback(result);
        self.event_bus.deliver();
        self.sim_state.tick += 1;
        self.last_state_hash = self.compute_state_hash();
        result.steps_run += 1;
    }

    // -----------------------------------------------------------------------
    // Phase 1: Forces
    // -----------------------------------------------------------------------

    fn phase_forces(&mut self) {
        let forces = compute_forces(
            &self.agents,
            &self.neighbors,
            &self.tunables.region,
            self.tunables.boundary_force_constant,
            self.tunables.repulsion_constant,
        );
        let dt = fixed64_to_f64(self.tunables.fixed_dt);
        for &id in &self.order {
            let force = forces.get(id).copied().unwrap_or(Vec2::ZERO);
            self.integrator.integrate(id, &mut self.agents[id], force, dt);
        }
    }

    // -----------------------------------------------------------------------
    // Phase 2: Lighting
    // -----------------------------------------------------------------------

    fn phase_lighting(&mut self, result: &mut AdvanceResult) {
        let dt = self.tunables.fixed_dt;
        let tick = self.sim_state.tick;
        let emission_chance = self.tunables.lightning_emission_rate.saturating_mul(dt);

        // Gate on the states as they were when the phase began, so an agent
        // never starts counting in the same tick its source finishes.
        let being_lit: BTreeSet<AgentId> = self
            .order
            .iter()
            .copied()
            .filter(|&id| self.agents[id].is_being_lit())
            .collect();

        for &id in &being_lit {
            let Some(source) = self.agents[id].source else {
                continue;
            };
            if being_lit.contains(&source) {
                continue;
            }
            let source_pos = self
                .agents
                .get(source)
                .map_or(self.agents[id].position, |s| s.position);

            let agent = &mut self.agents[id];
            if !agent.tick_light(dt) {
                if self.rng.chance(emission_chance) {
                    let t = fraction(agent.light_timer, self.tunables.light_duration);
                    self.sink
                        .emit(EffectKind::Lightning, agent.position.lerp(source_pos, t), 1);
                }
                continue;
            }

            let position = agent.position;
            let passed_on = agent.passed_on;
            let particles = self.tunables.lightning_particles;
            for i in 0..particles {
                let t = i as f64 / particles as f64;
                self.sink
                    .emit(EffectKind::Lightning, position.lerp(source_pos, t), 1);
            }
            self.event_bus.emit(Event::AgentLit { agent: id, tick });
            result.newly_lit += 1;

            if !passed_on {
                self.complete_chain(id, tick);
            }
        }
    }

    /// The terminal agent `terminal` just finished; start feedback.
    fn complete_chain(&mut self, terminal: AgentId, tick: Ticks) {
        let Some(path) = self.in_flight.take_if(|p| p.terminal() == terminal) else {
            log::warn!("agent {terminal:?} finished without successor but is not a chain terminal");
            return;
        };
        log::info!(
            "chain from {:?} completed at {terminal:?}; feedback over {} hops",
            path.origin(),
            path.len()
        );
        self.event_bus.emit(Event::ChainCompleted {
            origin: path.origin(),
            terminal,
            tick,
        });
        self.feedback.enqueue(path);
    }

    // -----------------------------------------------------------------------
    // Phase 3: Feedback
    // -----------------------------------------------------------------------

    fn phase_feedback(&mut self, result: &mut AdvanceResult) {
        let params = FeedbackParams {
            duration: self.tunables.feedback_duration,
            particles: self.tunables.feedback_particles,
            burst: self.tunables.feedback_burst,
            dt: self.tunables.fixed_dt,
        };
        let before = self.feedback.active_count();
        self.feedback.step(
            &mut self.agents,
            params,
            self.sink.as_mut(),
            &mut self.event_bus,
            self.sim_state.tick,
        );
        result.feedback_completed += before - self.feedback.active_count();
    }

    // -----------------------------------------------------------------------
    // Bookkeeping
    // -----------------------------------------------------------------------

    fn compute_state_hash(&self) -> u64 {
        let mut hash = StateHash::new();
        hash.write_u64(self.sim_state.tick);
        hash.write_u64(self.rng.state());
        for &id in &self.order {
            let agent = &self.agents[id];
            hash.write_u64(id.data().as_ffi());
            hash.write_f64(agent.position.x);
            hash.write_f64(agent.position.y);
            hash.write_f64(agent.velocity.x);
            hash.write_f64(agent.velocity.y);
            hash.write_u32(agent.state.tag());
            hash.write_fixed64(agent.light_timer);
            hash.write_fixed64(agent.feedback_timer);
            hash.write_u64(agent.source.map_or(0, |s| s.data().as_ffi()));
            hash.write_u64(agent.feedback_target.map_or(0, |s| s.data().as_ffi()));
        }
        hash.finish()
    }

    /// Hash of the state after the most recent step (or after build).
    pub fn state_hash(&self) -> u64 {
        self.last_state_hash
    }

    // -----------------------------------------------------------------------
    // Pause / Resume
    // -----------------------------------------------------------------------

    /// While paused, `advance()` and `step()` are no-ops. Clicks and
    /// proximity events are still accepted.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    // -----------------------------------------------------------------------
    // Events
    // -----------------------------------------------------------------------

    /// Register a passive listener for an event kind.
    pub fn on_event(&mut self, kind: EventKind, listener: PassiveListener) {
        self.event_bus.on_passive(kind, listener);
    }

    /// Register a listener that runs at `priority` relative to the other
    /// listeners of `kind` and only sees events accepted by `filter`.
    pub fn on_event_filtered(
        &mut self,
        kind: EventKind,
        priority: SubscriberPriority,
        filter: Option<EventFilter>,
        listener: PassiveListener,
    ) {
        self.event_bus
            .on_passive_filtered(kind, priority, filter, listener);
    }

    pub fn suppress_event(&mut self, kind: EventKind) {
        self.event_bus.suppress(kind);
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    fn require(&self, id: AgentId) -> Result<&Agent, SimError> {
        self.agents.get(id).ok_or(SimError::UnknownAgent(id))
    }

    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(id)
    }

    /// Agent ids in creation order.
    pub fn agent_ids(&self) -> &[AgentId] {
        &self.order
    }

    pub fn agent_count(&self) -> usize {
        self.order.len()
    }

    /// Agents in creation order.
    pub fn agents(&self) -> impl Iterator<Item = (AgentId, &Agent)> + '_ {
        self.order.iter().map(|&id| (id, &self.agents[id]))
    }

    pub fn count_in_state(&self, state: LightState) -> usize {
        self.agents.values().filter(|a| a.state == state).count()
    }

    /// Neighbors of `id` in ascending id order.
    pub fn neighbors(&self, id: AgentId) -> impl Iterator<Item = AgentId> + '_ {
        self.neighbors.neighbors(id)
    }

    pub fn neighbor_set(&self) -> &NeighborSet {
        &self.neighbors
    }

    /// Whether any agent is currently `BeingLit`.
    pub fn is_chain_in_flight(&self) -> bool {
        self.agents.values().any(Agent::is_being_lit)
    }

    /// The chain currently revealing, if any.
    pub fn in_flight_path(&self) -> Option<&PropagationPath> {
        self.in_flight.as_ref()
    }

    pub fn is_feedback_playing(&self) -> bool {
        self.feedback.is_playing()
    }

    pub fn feedback_scheduler(&self) -> &FeedbackScheduler {
        &self.feedback
    }

    /// A chain is revealing or feedback is still playing.
    pub fn is_busy(&self) -> bool {
        self.is_chain_in_flight() || self.is_feedback_playing()
    }

    pub fn tunables(&self) -> &Tunables {
        &self.tunables
    }

    pub fn region(&self) -> &Region {
        &self.tunables.region
    }

    pub fn tick(&self) -> Ticks {
        self.sim_state.tick
    }

    pub fn snapshot(&self, id: AgentId) -> Option<AgentSnapshot> {
        let agent = self.agents.get(id)?;
        let light_progress = match agent.state {
            LightState::Idle => Fixed64::ZERO,
            LightState::BeingLit => {
                Fixed64::from_num(1) - agent.light_timer / self.tunables.light_duration
            }
            LightState::Lit => Fixed64::from_num(1),
        };
        Some(AgentSnapshot {
            id,
            position: agent.position,
            velocity: agent.velocity,
            state: agent.state,
            source: agent.source,
            feedback_target: agent.feedback_target,
            light_progress,
            feedback_timer: agent.feedback_timer,
            neighbors: self.neighbors.neighbors(id).collect(),
        })
    }

    /// Snapshots of every agent in creation order.
    pub fn snapshot_all(&self) -> Vec<AgentSnapshot> {
        self.order
            .iter()
            .filter_map(|&id| self.snapshot(id))
            .collect()
    }
}
