//! Simulation clock state and the determinism hash.

use crate::fixed::{Fixed64, Ticks};

// ---------------------------------------------------------------------------
// Simulation state
// ---------------------------------------------------------------------------

/// Mutable clock state tracked by the world.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SimState {
    /// Incremented by 1 for each simulation step.
    pub tick: Ticks,

    /// Elapsed time not yet consumed by a fixed step (see `World::advance`).
    pub accumulator: Fixed64,
}

impl SimState {
    pub fn new() -> Self {
        Self {
            tick: 0,
            accumulator: Fixed64::ZERO,
        }
    }
}

impl Default for SimState {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Advance result
// ---------------------------------------------------------------------------

/// Result of a `World::advance()` or `World::step()` call.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AdvanceResult {
    /// Number of simulation steps actually executed.
    pub steps_run: u64,
    /// Agents that became lit during those steps.
    pub newly_lit: usize,
    /// Chains whose feedback playback finished during those steps.
    pub feedback_completed: usize,
}

// ---------------------------------------------------------------------------
// State hash
// ---------------------------------------------------------------------------

/// FNV-1a digest of world state, compared across runs to catch replay
/// divergence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateHash(pub u64);

impl StateHash {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;

    pub fn new() -> Self {
        Self(Self::FNV_OFFSET)
    }

    pub fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= b as u64;
            self.0 = self.0.wrapping_mul(Self::FNV_PRIME);
        }
    }

    pub fn write_u64(&mut self, v: u64) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_u32(&mut self, v: u32) {
        self.write(&v.to_le_bytes());
    }

    /// Hashes the exact bit pattern, so `-0.0` and `0.0` differ.
    pub fn write_f64(&mut self, v: f64) {
        self.write_u64(v.to_bits());
    }

    pub fn write_fixed64(&mut self, v: Fixed64) {
        self.write(&v.to_bits().to_le_bytes());
    }

    pub fn finish(self) -> u64 {
        self.0
    }
}

impl Default for StateHash {
    fn default() -> Self {
        Self::new()
    }
}
