//! Chainlight Core -- a swarm of drifting agents that light each other up
//! in greedy nearest-neighbor chains.
//!
//! Agents wander inside a rectangular region, pushed back in by a boundary
//! spring and apart by inverse-square repulsion from whichever agents the
//! host reports as in range. Clicking an agent lights it and starts a chain:
//! from the clicked agent, each step hops to the nearest idle neighbor of the
//! current agent. The chain reveals one agent at a time, and once the last
//! agent lights up, feedback travels back along the chain to the origin.
//!
//! # Five-Phase Tick Pipeline
//!
//! Each call to [`world::World::step`] advances the simulation by one fixed
//! step:
//!
//! 1. **Forces** -- Boundary and repulsion forces feed the integrator.
//! 2. **Lighting** -- Reveal timers count down once their source is lit.
//! 3. **Feedback** -- Completed chains play back toward their origin.
//! 4. **Post-tick** -- Deliver buffered events.
//! 5. **Bookkeeping** -- Increment the tick counter and compute the state hash.
//!
//! # Host Collaborators
//!
//! The host owns rendering, input, and broad-phase proximity. It tells the
//! world about proximity changes through [`world::World::on_enter_range`] and
//! [`world::World::on_exit_range`], dispatches clicks to
//! [`world::World::on_clicked`], and receives particle emissions through an
//! [`effect::EffectSink`].
//!
//! ```rust,ignore
//! let mut world = World::builder(SwarmConfig::with_region(region))
//!     .effect_sink(EffectLog::new())
//!     .scatter(100)
//!     .build()?;
//! world.on_enter_range(a, b)?;
//! world.on_clicked(a)?;
//! world.advance(frame_time);
//! ```
//!
//! # Key Types
//!
//! - [`world::World`] -- Owns the agents and runs the pipeline.
//! - [`agent::Agent`] -- Per-agent motion and lighting state.
//! - [`chain::PropagationPath`] -- Ordered record of one chain's hops.
//! - [`feedback::FeedbackScheduler`] -- Reverse playback of completed chains.
//! - [`config::SwarmConfig`] -- Serde-loadable tunables.
//! - [`event::EventBus`] -- Subscription-based event bus with buffered delivery.
//! - [`fixed::Fixed64`] -- Q32.32 fixed-point type for deterministic timers.

pub mod agent;
pub mod chain;
pub mod config;
pub mod effect;
pub mod error;
pub mod event;
pub mod feedback;
pub mod fixed;
pub mod force;
pub mod id;
pub mod integrator;
pub mod math;
pub mod neighbor;
pub mod query;
pub mod rng;
pub mod sim;
pub mod world;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
