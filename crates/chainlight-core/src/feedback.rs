//! Reverse playback of completed chains.
//!
//! Once a chain's terminal agent is lit, its [`PropagationPath`] is handed
//! to the [`FeedbackScheduler`]. Hops are replayed last-first: for hop
//! `from → to`, agent `to` plays feedback toward `from` for one full
//! feedback window before the previous hop starts. The clicked origin is
//! therefore the last agent to receive feedback.

use crate::agent::Agent;
use crate::chain::{Hop, PropagationPath};
use crate::effect::{EffectKind, EffectSink};
use crate::event::{Event, EventBus};
use crate::fixed::{Fixed64, Ticks, fraction};
use crate::id::AgentId;
use slotmap::SlotMap;

/// Per-tick parameters for feedback playback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeedbackParams {
    pub duration: Fixed64,
    /// Sub-steps per tick.
    pub particles: u32,
    /// Particles per emission.
    pub burst: u32,
    pub dt: Fixed64,
}

/// Playback of one chain.
#[derive(Debug, Clone)]
struct Playback {
    path: PropagationPath,
    /// Hops not yet started; the next one to play is `path.hops()[remaining - 1]`.
    remaining: usize,
    active: Option<Hop>,
}

impl Playback {
    fn new(path: PropagationPath) -> Self {
        let remaining = path.len();
        Self {
            path,
            remaining,
            active: None,
        }
    }

    fn next_hop(&mut self) -> Option<Hop> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        Some(self.path.hops()[self.remaining])
    }
}

/// Drives feedback playback for every completed chain.
#[derive(Debug, Clone, Default)]
pub struct FeedbackScheduler {
    playbacks: Vec<Playback>,
}

impl FeedbackScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a completed chain for reverse playback.
    pub fn enqueue(&mut self, path: PropagationPath) {
        self.playbacks.push(Playback::new(path));
    }

    pub fn is_playing(&self) -> bool {
        !self.playbacks.is_empty()
    }

    /// Number of chains still playing back.
    pub fn active_count(&self) -> usize {
        self.playbacks.len()
    }

    /// The hop each playback is currently on.
    pub fn active_hops(&self) -> impl Iterator<Item = Hop> + '_ {
        self.playbacks.iter().filter_map(|p| p.active)
    }

    /// Advance every playback by one tick.
    pub fn step(
        &mut self,
        agents: &mut SlotMap<AgentId, Agent>,
        params: FeedbackParams,
        sink: &mut dyn EffectSink,
        events: &mut EventBus,
        tick: Ticks,
    ) {
        self.playbacks.retain_mut(|playback| {
            let done = advance(playback, agents, params, sink, events, tick);
            if done {
                log::info!(
                    "feedback complete for chain from {:?} ({} hops)",
                    playback.path.origin(),
                    playback.path.len()
                );
                events.emit(Event::FeedbackCompleted {
                    origin: playback.path.origin(),
                    tick,
                });
            }
            !done
        });
    }
}

/// Play one tick of `playback`. Returns `true` when the whole path is done.
fn advance(
    playback: &mut Playback,
    agents: &mut SlotMap<AgentId, Agent>,
    params: FeedbackParams,
    sink: &mut dyn EffectSink,
    events: &mut EventBus,
    tick: Ticks,
) -> bool {
    let hop = match playback.active {
        Some(hop) => hop,
        None => {
            let Some(hop) = playback.next_hop() else {
                return true;
            };
            if let Some(agent) = agents.get_mut(hop.to) {
                agent.start_feedback(hop.from, params.duration);
            }
            events.emit(Event::FeedbackStarted {
                agent: hop.to,
                target: hop.from,
                tick,
            });
            playback.active = Some(hop);
            hop
        }
    };

    let Some(target_pos) = agents.get(hop.from).map(|a| a.position) else {
        playback.active = None;
        return playback.remaining == 0;
    };
    let Some(agent) = agents.get_mut(hop.to) else {
        playback.active = None;
        return playback.remaining == 0;
    };

    // Validated configs never round this to zero; the floor keeps hand-built
    // params from stalling the timer.
    let sub_dt =
        (params.dt / Fixed64::saturating_from_num(params.particles)).max(Fixed64::DELTA);
    for _ in 0..params.particles {
        agent.feedback_timer -= sub_dt;
        if agent.feedback_timer <= Fixed64::ZERO {
            agent.feedback_timer = Fixed64::ZERO;
            break;
        }
        let t = fraction(agent.feedback_timer, params.duration);
        sink.emit(
            EffectKind::Feedback,
            target_pos.lerp(agent.position, t),
            params.burst,
        );
    }

    if agent.feedback_timer > Fixed64::ZERO {
        return false;
    }

    agent.finish_feedback();
    events.emit(Event::FeedbackDelivered {
        agent: hop.to,
        target: hop.from,
        tick,
    });
    playback.active = None;
    playback.remaining == 0
}
