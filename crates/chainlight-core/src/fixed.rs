use fixed::types::I32F32;

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits.
///
/// Used for every quantity of simulated time (durations, timers, `dt`) so
/// timer countdowns are bit-identical across platforms.
pub type Fixed64 = I32F32;

/// Ticks are the atomic unit of simulation time.
pub type Ticks = u64;

/// Convert an f64 to Fixed64. Use only for initialization, never in sim loop.
#[inline]
pub fn f64_to_fixed64(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

/// Convert Fixed64 to f64. Use for interpolation and display.
#[inline]
pub fn fixed64_to_f64(v: Fixed64) -> f64 {
    v.to_num::<f64>()
}

/// Ratio `num / den` as f64, or 0 when `den` is zero.
#[inline]
pub fn fraction(num: Fixed64, den: Fixed64) -> f64 {
    if den == Fixed64::ZERO {
        return 0.0;
    }
    fixed64_to_f64(num) / fixed64_to_f64(den)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed64_basic_arithmetic() {
        let a = f64_to_fixed64(1.5);
        let b = f64_to_fixed64(2.0);
        assert_eq!(fixed64_to_f64(a + b), 3.5);
    }

    #[test]
    fn repeated_decrement_is_exact() {
        // 0.2 s drained by 0.02 s steps must hit zero on the tenth step,
        // within one ulp of the Q32.32 representation.
        let step = f64_to_fixed64(0.02);
        let mut timer = f64_to_fixed64(0.2);
        let mut steps = 0;
        while timer > Fixed64::ZERO {
            timer -= step;
            steps += 1;
        }
        assert!((10..=11).contains(&steps), "took {steps} steps");
    }

    #[test]
    fn fraction_handles_zero_denominator() {
        assert_eq!(fraction(f64_to_fixed64(1.0), Fixed64::ZERO), 0.0);
        assert_eq!(fraction(f64_to_fixed64(1.0), f64_to_fixed64(4.0)), 0.25);
    }

    #[test]
    fn fixed64_determinism() {
        let a = f64_to_fixed64(1.0 / 3.0);
        let b = f64_to_fixed64(1.0 / 3.0);
        assert_eq!(a * f64_to_fixed64(3.0), b * f64_to_fixed64(3.0));
    }
}
