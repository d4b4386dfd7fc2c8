//! Seeded randomness for the swarm. Scatter positions and the per-tick
//! lightning emission rolls share one SplitMix64 stream.

use crate::fixed::Fixed64;
use crate::math::Vec2;

/// One SplitMix64 stream per world.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SimRng {
    state: u64,
}

impl SimRng {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform `f64` in `[0, 1)` built from the top 53 bits.
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Uniform `f64` in `[lo, hi)`.
    pub fn range_f64(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    /// Uniform point inside the unit disk (rejection sampling).
    pub fn inside_unit_circle(&mut self) -> Vec2 {
        loop {
            let p = Vec2::new(self.range_f64(-1.0, 1.0), self.range_f64(-1.0, 1.0));
            if p.length_squared() <= 1.0 {
                return p;
            }
        }
    }

    /// Bernoulli roll. Probabilities outside `[0, 1]` clamp, so an
    /// emission rate above one per tick fires every tick.
    pub fn chance(&mut self, probability: Fixed64) -> bool {
        if probability <= Fixed64::ZERO {
            return false;
        }
        if probability >= Fixed64::from_num(1) {
            return true;
        }
        // For p in (0,1) the raw Q32.32 bits are the fraction scaled to
        // [0, 2^32); compare against a uniform u32.
        let r = self.next_u64();
        let upper = (r >> 32) as u32;
        let raw = probability.to_bits() as u64;
        (upper as u64) < raw
    }

    /// Raw state, folded into the world's state hash.
    pub fn state(&self) -> u64 {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Emission roll for one tick: rate per second times the timestep.
    fn per_tick(rate: f64, dt: f64) -> Fixed64 {
        Fixed64::from_num(rate) * Fixed64::from_num(dt)
    }

    #[test]
    fn same_seed_scatters_the_same_swarm() {
        let scatter = |seed| {
            let mut rng = SimRng::new(seed);
            (0..20)
                .map(|_| (rng.range_f64(-12.0, 12.0), rng.inside_unit_circle()))
                .collect::<Vec<_>>()
        };
        assert_eq!(scatter(2024), scatter(2024));
        assert_ne!(scatter(2024), scatter(2025));
    }

    #[test]
    fn range_stays_in_half_open_interval() {
        let mut rng = SimRng::new(7);
        for _ in 0..1000 {
            let x = rng.range_f64(-5.5, 5.5);
            assert!((-5.5..5.5).contains(&x), "x = {x}");
        }
        assert_eq!(rng.range_f64(3.0, 3.0), 3.0);
    }

    #[test]
    fn initial_velocities_have_at_most_unit_speed() {
        let mut rng = SimRng::new(3);
        let mut fastest = 0.0f64;
        for _ in 0..1000 {
            fastest = fastest.max(rng.inside_unit_circle().length());
        }
        assert!(fastest <= 1.0);
        assert!(fastest > 0.9, "samples should reach the rim, got {fastest}");
    }

    #[test]
    fn saturated_emission_rate_always_fires() {
        // 100 per second at 50 Hz rounds up to a certain roll.
        let mut rng = SimRng::new(999);
        let p = per_tick(100.0, 0.02);
        assert!(p >= Fixed64::from_num(1));
        assert!((0..100).all(|_| rng.chance(p)));
        assert!((0..100).all(|_| !rng.chance(Fixed64::ZERO)));
        assert!(!rng.chance(Fixed64::from_num(-0.5)));
    }

    #[test]
    fn sparse_emission_rate_fires_proportionally() {
        let mut rng = SimRng::new(12345);
        let p = per_tick(5.0, 0.02);
        let hits = (0..10_000).filter(|_| rng.chance(p)).count();
        assert!((800..=1200).contains(&hits), "expected ~1000, got {hits}");
    }

    #[test]
    fn resumes_from_saved_state() {
        let mut rng = SimRng::new(42);
        rng.range_f64(0.0, 1.0);
        let saved = ron::to_string(&rng).unwrap();
        let mut resumed: SimRng = ron::from_str(&saved).unwrap();
        assert_eq!(resumed.state(), rng.state());
        assert_eq!(resumed.inside_unit_circle(), rng.inside_unit_circle());
    }
}
