//! Superadditive functions used to round and strengthen cuts.
//!
//! Every function f here satisfies, over its documented domain:
//!
//! - f(0) == 0,
//! - f(a) + f(b) <= f(a + b) (superadditivity),
//! - f is nondecreasing.
//!
//! Those three properties make termwise application sound: from
//! `sum(c_i * X_i) <= rhs` with `X_i >= 0` integer we may derive
//! `sum(f(c_i) * X_i) <= f(rhs)`.

use crate::arith;

/// Common interface of the function families, so the generators can apply
/// whichever one they selected without caring which it is.
pub trait SuperadditiveFn {
    fn apply(&self, v: i64) -> i64;
}

/// The MIR-style rounding function parametrized by a divisor, a
/// multiplicative factor `t` and a scaling budget.
///
/// With scaling 1 this is `v -> floor(t * v / divisor)`. Larger scaling
/// budgets subdivide each divisor-wide interval into up to `max_scaling`
/// steps, which preserves more of the fractional structure and produces
/// stronger cuts at the price of larger coefficients.
///
/// Inputs to [`SuperadditiveFn::apply`] must have magnitude at most the
/// `max_magnitude` that was passed to [`factor_t`] when choosing `t`,
/// otherwise the internal products saturate.
#[derive(Debug, Clone, Copy)]
pub struct RoundingFunction {
    divisor: i64,
    t: i64,
    max_scaling: i64,
    /// t * rhs_remainder, always in [0, divisor).
    remainder: i64,
    /// divisor - remainder, always in [1, divisor].
    size: i64,
}

impl RoundingFunction {
    /// `rhs_remainder` is the rhs value modulo `divisor`, in `[0, divisor)`.
    /// `t` must keep `t * rhs_remainder < divisor`, which [`factor_t`]
    /// guarantees.
    pub fn new(rhs_remainder: i64, divisor: i64, t: i64, max_scaling: i64) -> Self {
        assert!(divisor > 0);
        assert!(t >= 1);
        assert!(max_scaling >= 1);
        assert!((0..divisor).contains(&rhs_remainder));
        let remainder = rhs_remainder
            .checked_mul(t)
            .filter(|&r| r < divisor)
            .unwrap_or_else(|| panic!("factor {t} too large for remainder {rhs_remainder}"));
        let max_scaling = max_scaling.min(i64::MAX / divisor);
        RoundingFunction {
            divisor,
            t,
            max_scaling,
            remainder,
            size: divisor - remainder,
        }
    }

    pub fn divisor(&self) -> i64 {
        self.divisor
    }

    /// Value of one full divisor step, used to compare candidate functions
    /// on a common scale.
    pub fn divisor_value(&self) -> i64 {
        self.apply(self.divisor)
    }
}

impl SuperadditiveFn for RoundingFunction {
    fn apply(&self, v: i64) -> i64 {
        let tv = self.t.saturating_mul(v);
        let ratio = arith::floor_ratio(tv, self.divisor);
        if self.max_scaling == 1 || self.size == 1 {
            return ratio;
        }
        let remainder_v = arith::positive_remainder(tv, self.divisor);
        if self.size <= self.max_scaling {
            // Exact MIR form: each unit of remainder past the rhs remainder
            // is worth one step.
            return self
                .size
                .saturating_mul(ratio)
                .saturating_add((remainder_v - self.remainder).max(0));
        }
        if self.max_scaling * self.remainder < self.divisor {
            // Small remainder: subdivide the period into max_scaling even
            // buckets.
            return self
                .max_scaling
                .saturating_mul(ratio)
                .saturating_add(arith::floor_ratio(remainder_v * self.max_scaling, self.divisor));
        }
        // General case: spread max_scaling - 1 steps over the size-wide
        // interval above the rhs remainder.
        let diff = remainder_v - self.remainder;
        let step = if diff > 0 {
            arith::ceil_ratio(diff * (self.max_scaling - 1), self.size)
        } else {
            0
        };
        self.max_scaling.saturating_mul(ratio).saturating_add(step)
    }
}

/// Largest factor `t` such that `t * rhs_remainder` stays in the lower half
/// of `[0, divisor)` and `t * v` cannot overflow for `|v| <= max_magnitude`.
///
/// Scaling by `t` before rounding moves the rhs remainder close to
/// `divisor / 2`, where the rounding function cuts deepest.
pub fn factor_t(rhs_remainder: i64, divisor: i64, max_magnitude: i64) -> i64 {
    debug_assert!(divisor > 0);
    debug_assert!((0..divisor).contains(&rhs_remainder));
    let max_t = i64::MAX / max_magnitude.max(1);
    if rhs_remainder == 0 {
        return max_t;
    }
    if rhs_remainder >= arith::ceil_ratio(divisor, 2) {
        return 1;
    }
    max_t.min(arith::ceil_ratio(divisor, 2 * rhs_remainder))
}

/// Plateau-shaped strengthening function for cover cuts.
///
/// Parametrized by the cover excess `positive_rhs` (how far the cover
/// overshoots the rhs) and the smallest cover coefficient magnitude. Zero
/// for nonnegative arguments, clamped to `-positive_rhs` below, with two
/// plateaus that keep the function superadditive.
#[derive(Debug, Clone, Copy)]
pub struct StrengtheningFunction {
    positive_rhs: i64,
    min_magnitude: i64,
    second_threshold: i64,
    one_step: bool,
}

impl StrengtheningFunction {
    pub fn new(positive_rhs: i64, min_magnitude: i64) -> Self {
        assert!(positive_rhs > 0);
        assert!(min_magnitude > 0);
        let one_step = min_magnitude >= arith::ceil_ratio(positive_rhs, 2);
        StrengtheningFunction {
            positive_rhs,
            min_magnitude,
            second_threshold: positive_rhs - min_magnitude,
            one_step,
        }
    }
}

impl SuperadditiveFn for StrengtheningFunction {
    fn apply(&self, v: i64) -> i64 {
        if v >= 0 {
            return 0;
        }
        if self.one_step {
            // Any single cover coefficient already covers more than half of
            // positive_rhs, so two steps always suffice.
            return if v >= -self.positive_rhs { -1 } else { -2 };
        }
        if v >= -self.min_magnitude {
            return -self.min_magnitude;
        }
        if v <= -self.positive_rhs {
            return -self.positive_rhs;
        }
        if v <= -self.second_threshold {
            return -self.second_threshold;
        }
        v
    }
}

/// Strengthening function for covers whose coefficients extend far below
/// `-positive_rhs`, where the plateau shape would not be superadditive.
///
/// With a large scaling budget this is the identity clamped to
/// `[-positive_rhs, 0]`; otherwise it floors by `ceil(positive_rhs /
/// scaling)` so outputs stay within the scaling budget.
#[derive(Debug, Clone, Copy)]
pub struct MirStrengtheningFunction {
    positive_rhs: i64,
    divisor: Option<i64>,
}

impl MirStrengtheningFunction {
    pub fn new(positive_rhs: i64, scaling: i64) -> Self {
        assert!(positive_rhs > 0);
        assert!(scaling > 0);
        let divisor = if scaling >= positive_rhs {
            None
        } else {
            Some(arith::ceil_ratio(positive_rhs, scaling))
        };
        MirStrengtheningFunction {
            positive_rhs,
            divisor,
        }
    }
}

impl SuperadditiveFn for MirStrengtheningFunction {
    fn apply(&self, v: i64) -> i64 {
        if v >= 0 {
            return 0;
        }
        match self.divisor {
            None => v.max(-self.positive_rhs),
            Some(divisor) => arith::floor_ratio(v, divisor),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check_superadditive<F: SuperadditiveFn>(f: &F, range: std::ops::RangeInclusive<i64>) {
        assert_eq!(f.apply(0), 0);
        let lo = *range.start();
        let hi = *range.end();
        for a in lo..=hi {
            if a < hi {
                assert!(f.apply(a) <= f.apply(a + 1), "not nondecreasing at {a}");
            }
            for b in a..=hi {
                if a + b < lo || a + b > hi {
                    continue;
                }
                assert!(
                    f.apply(a) + f.apply(b) <= f.apply(a + b),
                    "superadditivity fails at ({a}, {b})"
                );
            }
        }
    }

    #[test]
    fn test_rounding_function_plain_floor() {
        // max_scaling 1 degenerates to floor(v / divisor).
        let f = RoundingFunction::new(3, 6, 1, 1);
        for v in -20..=20 {
            assert_eq!(f.apply(v), v.div_euclid(6));
        }
        // size == 1 does the same, whatever the scaling budget.
        let g = RoundingFunction::new(9, 10, 1, 50);
        assert_eq!(g.apply(-91), -10);
        assert_eq!(g.apply(-6), -1);
        assert_eq!(g.apply(-4), -1);
        assert_eq!(g.apply(10), 1);
    }

    #[test]
    fn test_rounding_function_general_case() {
        // divisor 6, remainder 3, scaling 2: two steps per period.
        let f = RoundingFunction::new(3, 6, 1, 2);
        assert_eq!(f.apply(6), 2);
        assert_eq!(f.apply(4), 1);
        assert_eq!(f.apply(9), 2);
        assert_eq!(f.apply(-6), -2);
        assert_eq!(f.divisor_value(), 2);
        check_superadditive(&f, -40..=40);
    }

    #[test]
    fn test_rounding_function_exact_mir_case() {
        // size (2) <= max_scaling (4) selects the exact MIR form.
        let f = RoundingFunction::new(5, 7, 1, 4);
        check_superadditive(&f, -40..=40);
        assert_eq!(f.apply(7), 2 * 1);
        assert_eq!(f.apply(6), 1);
        assert_eq!(f.apply(5), 0);
    }

    #[test]
    fn test_rounding_function_small_remainder_case() {
        // max_scaling * remainder < divisor selects even buckets.
        let f = RoundingFunction::new(1, 10, 1, 3);
        check_superadditive(&f, -50..=50);
        assert_eq!(f.apply(10), 3);
    }

    #[test]
    fn test_rounding_function_with_factor() {
        let t = factor_t(2, 10, 100);
        assert_eq!(t, 3);
        let f = RoundingFunction::new(2, 10, t, 4);
        check_superadditive(&f, -60..=60);
    }

    #[test]
    fn test_factor_t_bounds() {
        // Remainder already in the upper half: no scaling.
        assert_eq!(factor_t(5, 10, 100), 1);
        assert_eq!(factor_t(7, 10, 100), 1);
        // Exact division: only the overflow cap limits t.
        assert_eq!(factor_t(0, 10, i64::MAX), 1);
        assert!(factor_t(0, 10, 100) > 1_000_000);
        // The scaled remainder always stays below the divisor.
        for divisor in 1..60 {
            for rem in 0..divisor {
                for max_magnitude in [1, 10, 1000, i64::MAX] {
                    let t = factor_t(rem, divisor, max_magnitude);
                    assert!(t >= 1);
                    assert!(rem.checked_mul(t).is_some_and(|r| r < divisor));
                }
            }
        }
    }

    #[test]
    fn test_strengthening_function_plateaus() {
        // positive_rhs 10, min magnitude 3: thresholds at -3 and -7.
        let f = StrengtheningFunction::new(10, 3);
        assert_eq!(f.apply(5), 0);
        assert_eq!(f.apply(-1), -3);
        assert_eq!(f.apply(-3), -3);
        assert_eq!(f.apply(-5), -5);
        assert_eq!(f.apply(-7), -7);
        assert_eq!(f.apply(-9), -7);
        assert_eq!(f.apply(-10), -10);
        assert_eq!(f.apply(-100), -10);
        check_superadditive(&f, -60..=60);
    }

    #[test]
    fn test_strengthening_function_one_step() {
        let f = StrengtheningFunction::new(10, 6);
        assert_eq!(f.apply(-1), -1);
        assert_eq!(f.apply(-10), -1);
        assert_eq!(f.apply(-11), -2);
        check_superadditive(&f, -60..=60);
    }

    #[test]
    fn test_mir_strengthening_function() {
        let capped = MirStrengtheningFunction::new(10, 20);
        assert_eq!(capped.apply(-3), -3);
        assert_eq!(capped.apply(-25), -10);
        check_superadditive(&capped, -80..=80);

        let floored = MirStrengtheningFunction::new(10, 3);
        // divisor = ceil(10 / 3) = 4.
        assert_eq!(floored.apply(-1), -1);
        assert_eq!(floored.apply(-4), -1);
        assert_eq!(floored.apply(-5), -2);
        check_superadditive(&floored, -80..=80);
    }
}
