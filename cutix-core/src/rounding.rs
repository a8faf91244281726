//! Integer rounding cut generation.
//!
//! From a base row `sum(c_i * X_i) <= rhs` over nonnegative integer terms,
//! picks a divisor d among the coefficient magnitudes and applies a
//! superadditive rounding function built from d (see
//! [`crate::functions::RoundingFunction`]), yielding the valid cut
//! `sum(f(c_i) * X_i) <= f(rhs)`. With the right divisor this removes the
//! current fractional LP point, generalizing Chvatal-Gomory and MIR cuts.

use log::debug;

use crate::arith;
use crate::cut::CutData;
use crate::functions::{factor_t, RoundingFunction, SuperadditiveFn};
use crate::implied::ImpliedBoundsProcessor;
use crate::limit::LimitCheck;

/// Integer rounding cut settings.
#[derive(Debug, Clone)]
pub struct RoundingOptions {
    /// Budget for the rounding function's output scale. Higher values keep
    /// more fractional structure but produce larger cut coefficients.
    pub max_scaling: i64,

    /// Substitute integer terms by implied Booleans before rounding.
    pub use_implied_bounds: bool,

    /// Prefer decompositions whose literal appears positively.
    pub prefer_positive_booleans: bool,

    /// Only coefficients above `max_magnitude / min_divisor_ratio` are
    /// tried as divisors.
    pub min_divisor_ratio: i64,

    /// Candidate divisors tried per cut.
    pub max_divisor_candidates: usize,

    /// Normalized violation below which the cut is abandoned.
    pub min_scaled_violation: f64,
}

impl Default for RoundingOptions {
    fn default() -> Self {
        Self {
            max_scaling: 600,
            use_implied_bounds: true,
            prefer_positive_booleans: true,
            min_divisor_ratio: 1000,
            max_divisor_candidates: 50,
            min_scaled_violation: 1e-3,
        }
    }
}

impl RoundingOptions {
    pub fn with_max_scaling(mut self, max_scaling: i64) -> Self {
        self.max_scaling = max_scaling;
        self
    }

    pub fn without_implied_bounds(mut self) -> Self {
        self.use_implied_bounds = false;
        self
    }
}

/// Statistics for integer rounding cut generation.
#[derive(Debug, Default, Clone)]
pub struct RoundingStats {
    /// Cuts successfully built.
    pub cuts_generated: u64,

    /// Terms rewritten as Boolean + slack before rounding.
    pub initial_expansions: u64,

    /// Terms complemented because it improved the rounded violation.
    pub complement_switches: u64,

    /// Coefficients nudged to the next multiple of the divisor.
    pub coefficient_adjustments: u64,

    /// Times a dominating rounding function replaced the heuristic choice.
    pub function_switches: u64,

    /// Terms complemented after the rounding function was settled.
    pub final_complements: u64,

    /// Aborts because a rhs or bound left the 64-bit range.
    pub aborted_overflow: u64,

    /// Aborts because no divisor produced enough violation.
    pub aborted_weak: u64,
}

/// Integer rounding cut generator.
///
/// The helper is reusable: each call to [`compute_cut`] replaces the
/// internal working cut, which [`cut`] then exposes for emission.
///
/// [`compute_cut`]: IntegerRoundingCutHelper::compute_cut
/// [`cut`]: IntegerRoundingCutHelper::cut
pub struct IntegerRoundingCutHelper {
    settings: RoundingOptions,

    /// Working cut; holds the result after a successful compute_cut.
    cut: CutData,

    /// Candidate divisors, largest first.
    divisors: Vec<i64>,

    /// suffix_weight[k] = sum of coeff * lp over relevant terms k.., used
    /// to prune hopeless divisors early.
    suffix_weight: Vec<f64>,

    /// suffix_lp[k] = sum of lp over relevant terms k..
    suffix_lp: Vec<f64>,

    stats: RoundingStats,
}

impl IntegerRoundingCutHelper {
    pub fn new(settings: RoundingOptions) -> Self {
        Self {
            settings,
            cut: CutData::default(),
            divisors: Vec::new(),
            suffix_weight: Vec::new(),
            suffix_lp: Vec::new(),
            stats: RoundingStats::default(),
        }
    }

    /// The cut produced by the last successful [`compute_cut`] call.
    ///
    /// [`compute_cut`]: IntegerRoundingCutHelper::compute_cut
    pub fn cut(&self) -> &CutData {
        &self.cut
    }

    /// Get generation statistics.
    pub fn stats(&self) -> &RoundingStats {
        &self.stats
    }

    /// Reset statistics.
    pub fn reset_stats(&mut self) {
        self.stats = RoundingStats::default();
    }

    /// Tries to build a violated rounding cut from `base`.
    ///
    /// Returns false when no divisor yields enough violation or when a
    /// value leaves the 64-bit safe range; the working cut is unspecified
    /// in that case. On success the result is available through [`cut`]
    /// and is valid whenever the base row and the implied bounds are.
    ///
    /// [`cut`]: IntegerRoundingCutHelper::cut
    pub fn compute_cut(
        &mut self,
        base: &CutData,
        mut ib: Option<&mut ImpliedBoundsProcessor<'_>>,
        limit: &mut dyn LimitCheck,
    ) -> bool {
        self.cut.clone_from(base);
        self.cut.complement_for_positive_coefficients();

        if self.settings.use_implied_bounds {
            if let Some(processor) = ib.as_deref_mut() {
                processor.cache_data_for_cut(&mut self.cut);
                let expanded = processor
                    .try_expand_booleans(&mut self.cut, self.settings.prefer_positive_booleans);
                self.stats.initial_expansions += u64::from(expanded);
            }
        }

        self.cut.sort_relevant_entries();
        if self.cut.num_relevant_entries == 0 || self.cut.max_magnitude == 0 {
            self.stats.aborted_weak += 1;
            return false;
        }
        let Some(mut rhs64) = self.cut.rhs_as_i64() else {
            self.stats.aborted_overflow += 1;
            return false;
        };

        // Candidate divisors: distinct magnitudes of the relevant
        // coefficients, ignoring ones much smaller than the largest.
        let divisor_floor = (self.cut.max_magnitude / self.settings.min_divisor_ratio).max(1);
        self.divisors.clear();
        for term in &self.cut.terms[..self.cut.num_relevant_entries] {
            let magnitude = term.coeff.checked_abs().unwrap_or(i64::MAX);
            if magnitude >= divisor_floor {
                self.divisors.push(magnitude);
            }
        }
        self.divisors.sort_unstable_by(|a, b| b.cmp(a));
        self.divisors.dedup();
        self.divisors.truncate(self.settings.max_divisor_candidates);

        let magnitude_cap = self.magnitude_cap(rhs64);
        self.rebuild_suffixes();

        let mut best_score = 0.0;
        let mut best_divisor = None;
        for i in 0..self.divisors.len() {
            if limit.limit_reached() {
                break;
            }
            let divisor = self.divisors[i];
            let score = evaluate_divisor(
                &self.cut,
                rhs64,
                divisor,
                self.settings.max_scaling,
                magnitude_cap,
                &self.suffix_weight,
                &self.suffix_lp,
                best_score,
            );
            if score > best_score {
                best_score = score;
                best_divisor = Some(divisor);
            }
        }
        let Some(mut divisor) = best_divisor else {
            self.stats.aborted_weak += 1;
            return false;
        };
        if best_score <= self.settings.min_scaled_violation {
            self.stats.aborted_weak += 1;
            return false;
        }

        // Smaller exact divisors of the winner sometimes round deeper.
        for k in 2..=9 {
            if divisor % k != 0 {
                continue;
            }
            let candidate = divisor / k;
            let score = evaluate_divisor(
                &self.cut,
                rhs64,
                candidate,
                self.settings.max_scaling,
                magnitude_cap,
                &self.suffix_weight,
                &self.suffix_lp,
                best_score,
            );
            if score > best_score {
                best_score = score;
                divisor = candidate;
            }
        }

        // Terms whose coefficient is misaligned with the divisor may round
        // better from the other bound.
        for i in 0..self.cut.num_relevant_entries {
            if limit.limit_reached() {
                break;
            }
            if self.cut.terms[i].coeff % divisor == 0 {
                continue;
            }
            self.cut.terms[i].complement(&mut self.cut.rhs);
            let mut accepted = false;
            if let Some(new_rhs) = self.cut.rhs_as_i64() {
                self.rebuild_suffixes();
                let score = evaluate_divisor(
                    &self.cut,
                    new_rhs,
                    divisor,
                    self.settings.max_scaling,
                    magnitude_cap,
                    &self.suffix_weight,
                    &self.suffix_lp,
                    f64::NEG_INFINITY,
                );
                if score > best_score + 1e-9 {
                    best_score = score;
                    rhs64 = new_rhs;
                    accepted = true;
                }
            }
            if accepted {
                self.stats.complement_switches += 1;
            } else {
                self.cut.terms[i].complement(&mut self.cut.rhs);
                self.rebuild_suffixes();
            }
        }

        rhs64 = self.adjust_coefficients(rhs64, divisor, magnitude_cap, &mut best_score);

        // Final function, rebuilt from the rhs as it now stands.
        let rhs_remainder = arith::positive_remainder(rhs64, divisor);
        let magnitude_cap = self.magnitude_cap(rhs64);
        let t = factor_t(rhs_remainder, divisor, magnitude_cap);
        let mut f = RoundingFunction::new(rhs_remainder, divisor, t, self.settings.max_scaling);
        if let Some(better) = self.find_dominating_function(&f, rhs_remainder, divisor, t, rhs64) {
            f = better;
            self.stats.function_switches += 1;
        }

        // The settled function can rank complements differently from the
        // scoring passes; retry each term once more under it. Switches that
        // grow the rhs magnitude past the cap `t` was sized for are not
        // eligible.
        let baseline = rhs64.unsigned_abs();
        let mut best_violation = violation_under(&self.cut, &f, rhs64);
        for i in 0..self.cut.terms.len() {
            if limit.limit_reached() {
                break;
            }
            self.cut.terms[i].complement(&mut self.cut.rhs);
            let mut accepted = false;
            if let Some(new_rhs) = self.cut.rhs_as_i64() {
                if new_rhs.unsigned_abs() <= baseline {
                    let score = violation_under(&self.cut, &f, new_rhs);
                    if score > best_violation + 1e-9 {
                        best_violation = score;
                        accepted = true;
                    }
                }
            }
            if accepted {
                self.stats.final_complements += 1;
            } else {
                self.cut.terms[i].complement(&mut self.cut.rhs);
            }
        }

        if self.settings.use_implied_bounds {
            if let Some(processor) = ib.as_deref_mut() {
                processor.expand_where_profitable(&mut self.cut, &f);
            }
        }

        if !self.cut.apply_with_potential_bump(&f) {
            self.stats.aborted_overflow += 1;
            return false;
        }
        if self.cut.violation() <= 0.0 {
            self.stats.aborted_weak += 1;
            return false;
        }
        self.stats.cuts_generated += 1;
        debug!(
            "rounding cut: divisor {}, {} terms, violation {:.3e}",
            divisor,
            self.cut.terms.len(),
            self.cut.violation()
        );
        true
    }

    /// Largest magnitude the rounding function can see: every coefficient,
    /// the rhs, and the bump arguments `rhs - coeff`.
    fn magnitude_cap(&self, rhs64: i64) -> i64 {
        let max_coeff = self
            .cut
            .terms
            .iter()
            .map(|t| t.coeff.checked_abs().unwrap_or(i64::MAX))
            .fold(0, i64::max);
        rhs64.checked_abs().unwrap_or(i64::MAX).saturating_add(max_coeff)
    }

    fn rebuild_suffixes(&mut self) {
        let relevant = &self.cut.terms[..self.cut.num_relevant_entries];
        self.suffix_weight.clear();
        self.suffix_lp.clear();
        self.suffix_weight.resize(relevant.len() + 1, 0.0);
        self.suffix_lp.resize(relevant.len() + 1, 0.0);
        for i in (0..relevant.len()).rev() {
            self.suffix_weight[i] =
                self.suffix_weight[i + 1] + relevant[i].coeff as f64 * relevant[i].lp_value;
            self.suffix_lp[i] = self.suffix_lp[i + 1] + relevant[i].lp_value;
        }
    }

    /// Nudges coefficients sitting one below a multiple of the divisor up
    /// (adding the term's range to the rhs) and one above a multiple down,
    /// keeping each change only when the normalized violation improves.
    /// Both directions add a valid inequality, so the cut stays valid.
    fn adjust_coefficients(
        &mut self,
        mut rhs64: i64,
        divisor: i64,
        magnitude_cap: i64,
        best_score: &mut f64,
    ) -> i64 {
        for i in 0..self.cut.terms.len() {
            let coeff = self.cut.terms[i].coeff;
            let remainder = coeff.rem_euclid(divisor);
            let (new_coeff, rhs_shift) = if remainder == divisor - 1 {
                // coeff + 1 is a multiple; compensates with X_i <= bound.
                match coeff.checked_add(1) {
                    Some(c) => (c, self.cut.terms[i].bound_diff as i128),
                    None => continue,
                }
            } else if remainder == 1 && coeff != 1 {
                // coeff - 1 is a multiple; -X_i <= 0 costs nothing.
                (coeff - 1, 0)
            } else {
                continue;
            };
            let old_rhs = self.cut.rhs;
            let Some(new_rhs_i128) = self.cut.rhs.checked_add(rhs_shift) else {
                continue;
            };
            self.cut.rhs = new_rhs_i128;
            self.cut.terms[i].coeff = new_coeff;
            let mut accepted = false;
            if let Some(new_rhs) = self.cut.rhs_as_i64() {
                self.rebuild_suffixes();
                let score = evaluate_divisor(
                    &self.cut,
                    new_rhs,
                    divisor,
                    self.settings.max_scaling,
                    magnitude_cap.max(new_coeff.checked_abs().unwrap_or(i64::MAX)),
                    &self.suffix_weight,
                    &self.suffix_lp,
                    f64::NEG_INFINITY,
                );
                if score > *best_score + 1e-9 {
                    *best_score = score;
                    rhs64 = new_rhs;
                    accepted = true;
                }
            }
            if accepted {
                self.stats.coefficient_adjustments += 1;
            } else {
                self.cut.rhs = old_rhs;
                self.cut.terms[i].coeff = coeff;
                self.rebuild_suffixes();
            }
        }
        rhs64
    }

    /// Searches a small family of alternative (t, scaling) parameters for a
    /// function that never under-values the remainders realized by the
    /// coefficients and strictly improves at least one, without losing on
    /// the rhs remainder. Such a function dominates termwise.
    fn find_dominating_function(
        &self,
        f: &RoundingFunction,
        rhs_remainder: i64,
        divisor: i64,
        t: i64,
        rhs64: i64,
    ) -> Option<RoundingFunction> {
        let mut remainders: Vec<i64> = self.cut.terms[..self.cut.num_relevant_entries]
            .iter()
            .map(|term| term.coeff.rem_euclid(divisor))
            .filter(|&r| r != 0)
            .collect();
        remainders.sort_unstable();
        remainders.dedup();
        remainders.truncate(16);
        if remainders.is_empty() {
            return None;
        }

        let f_d = f.divisor_value();
        let f_rhs_rem = f.apply(arith::positive_remainder(rhs64, divisor));
        let mut candidate_ts = vec![1];
        if t != 1 {
            candidate_ts.push(t);
        }
        let mut best: Option<(RoundingFunction, i128)> = None;
        for &t2 in &candidate_ts {
            let mut scaling = 2;
            while scaling <= self.settings.max_scaling {
                let g = RoundingFunction::new(rhs_remainder, divisor, t2, scaling);
                let g_d = g.divisor_value();
                if dominates(&g, g_d, f, f_d, f_rhs_rem, &remainders, rhs64, divisor) {
                    let gain: i128 = remainders
                        .iter()
                        .map(|&r| {
                            i128::from(g.apply(r)) * i128::from(f_d)
                                - i128::from(f.apply(r)) * i128::from(g_d)
                        })
                        .sum();
                    if best.as_ref().map_or(true, |(_, old)| gain > *old) {
                        best = Some((g, gain));
                    }
                }
                scaling *= 4;
            }
        }
        best.map(|(g, _)| g)
    }
}

/// Normalized violation the divisor would achieve, or -inf once it provably
/// cannot beat `best_score`. Normalizing by f(divisor) makes the score the
/// violation the cut would have if rescaled to unit divisor steps.
#[allow(clippy::too_many_arguments)]
fn evaluate_divisor(
    cut: &CutData,
    rhs64: i64,
    divisor: i64,
    max_scaling: i64,
    magnitude_cap: i64,
    suffix_weight: &[f64],
    suffix_lp: &[f64],
    best_score: f64,
) -> f64 {
    let rhs_remainder = arith::positive_remainder(rhs64, divisor);
    let t = factor_t(rhs_remainder, divisor, magnitude_cap);
    let f = RoundingFunction::new(rhs_remainder, divisor, t, max_scaling);
    let f_divisor = f.divisor_value() as f64;
    let f_rhs = f.apply(rhs64) as f64;
    // f(c) <= alpha * c + f(divisor) for every c, giving an optimistic
    // bound on what the remaining terms can contribute.
    let alpha = f_divisor / divisor as f64;

    let mut activity = 0.0;
    for (i, term) in cut.terms[..cut.num_relevant_entries].iter().enumerate() {
        activity += f.apply(term.coeff) as f64 * term.lp_value;
        let optimistic = activity + alpha * suffix_weight[i + 1] + f_divisor * suffix_lp[i + 1];
        if (optimistic - f_rhs) / f_divisor <= best_score {
            return f64::NEG_INFINITY;
        }
    }
    (activity - f_rhs) / f_divisor
}

/// True when `g` termwise dominates `f` on the realized remainders after
/// normalizing both to unit divisor steps.
#[allow(clippy::too_many_arguments)]
fn dominates(
    g: &RoundingFunction,
    g_d: i64,
    f: &RoundingFunction,
    f_d: i64,
    f_rhs_rem: i64,
    remainders: &[i64],
    rhs64: i64,
    divisor: i64,
) -> bool {
    let g_rhs_rem = g.apply(arith::positive_remainder(rhs64, divisor));
    // The rhs side must not get worse: g(r_rhs)/g_d <= f(r_rhs)/f_d.
    if i128::from(g_rhs_rem) * i128::from(f_d) > i128::from(f_rhs_rem) * i128::from(g_d) {
        return false;
    }
    let mut strict = false;
    for &r in remainders {
        let lhs = i128::from(g.apply(r)) * i128::from(f_d);
        let rhs = i128::from(f.apply(r)) * i128::from(g_d);
        if lhs < rhs {
            return false;
        }
        if lhs > rhs {
            strict = true;
        }
    }
    strict
}

/// LP violation the cut would have after mapping every coefficient and the
/// rhs through `f`.
fn violation_under<F: SuperadditiveFn>(cut: &CutData, f: &F, rhs64: i64) -> f64 {
    let activity: f64 = cut
        .terms
        .iter()
        .map(|t| f.apply(t.coeff) as f64 * t.lp_value)
        .sum();
    activity - f.apply(rhs64) as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::BoundTable;
    use crate::limit::NoLimit;

    fn make_cut(
        rhs: i64,
        terms: &[(usize, i64)],
        lp_values: &[f64],
        bounds: &BoundTable,
    ) -> CutData {
        let vars: Vec<usize> = terms.iter().map(|&(v, _)| v).collect();
        let coeffs: Vec<i64> = terms.iter().map(|&(_, c)| c).collect();
        let mut cut = CutData::default();
        assert!(cut.fill_from_parallel_vectors(rhs, &vars, &coeffs, lp_values, bounds));
        cut
    }

    #[test]
    fn test_rounds_fractional_vertex() {
        // 6 x0 + 4 x1 <= 9 with x0, x1 in [0, 2]; the LP sits at the
        // fractional vertex (1.5, 0).
        let bounds = BoundTable::uniform(2, 0, 2);
        let lp = [1.5, 0.0];
        let base = make_cut(9, &[(0, 6), (1, 4)], &lp, &bounds);

        let mut helper =
            IntegerRoundingCutHelper::new(RoundingOptions::default().with_max_scaling(2));
        assert!(helper.compute_cut(&base, None, &mut NoLimit));

        // Divisor 6 with scaling 2 gives 2 x0 + x1 <= 2, cutting off the
        // vertex (violation 1 there) while keeping every integer point.
        let row = helper.cut().to_linear_constraint().unwrap();
        assert_eq!(row.vars, vec![0, 1]);
        assert_eq!(row.coeffs, vec![2, 1]);
        assert_eq!(row.ub, 2);
        for x0 in 0..=2i64 {
            for x1 in 0..=2i64 {
                if 6 * x0 + 4 * x1 <= 9 {
                    assert!(2 * x0 + x1 <= 2, "({x0}, {x1}) wrongly cut");
                }
            }
        }
        assert_eq!(helper.stats().cuts_generated, 1);
    }

    #[test]
    fn test_rounds_fractional_vertex_wide_domains() {
        // Same row and vertex over [0, 10] domains: the output must not
        // change, and in particular no term may flip to the far bound in
        // the last complementation pass (that would blow up the rhs).
        let bounds = BoundTable::uniform(2, 0, 10);
        let lp = [1.5, 0.0];
        let base = make_cut(9, &[(0, 6), (1, 4)], &lp, &bounds);

        let mut helper =
            IntegerRoundingCutHelper::new(RoundingOptions::default().with_max_scaling(2));
        assert!(helper.compute_cut(&base, None, &mut NoLimit));

        let row = helper.cut().to_linear_constraint().unwrap();
        assert_eq!(row.vars, vec![0, 1]);
        assert_eq!(row.coeffs, vec![2, 1]);
        assert_eq!(row.ub, 2);
        assert_eq!(helper.stats().final_complements, 0);
        for x0 in 0..=10i64 {
            for x1 in 0..=10i64 {
                if 6 * x0 + 4 * x1 <= 9 {
                    assert!(2 * x0 + x1 <= 2, "({x0}, {x1}) wrongly cut");
                }
            }
        }
    }

    #[test]
    fn test_gives_up_at_integral_point() {
        let bounds = BoundTable::uniform(2, 0, 2);
        // LP point is integral: nothing to separate.
        let lp = [1.0, 0.0];
        let base = make_cut(9, &[(0, 6), (1, 4)], &lp, &bounds);
        let mut helper = IntegerRoundingCutHelper::new(RoundingOptions::default());
        assert!(!helper.compute_cut(&base, None, &mut NoLimit));
        assert_eq!(helper.stats().cuts_generated, 0);
    }

    #[test]
    fn test_gives_up_when_rhs_exceeds_i64() {
        let bounds = BoundTable::uniform(1, 0, 2);
        let lp = [1.5];
        let mut base = make_cut(9, &[(0, 6)], &lp, &bounds);
        base.rhs = i128::from(i64::MAX) + 1;
        let mut helper = IntegerRoundingCutHelper::new(RoundingOptions::default());
        assert!(!helper.compute_cut(&base, None, &mut NoLimit));
        assert_eq!(helper.stats().aborted_overflow, 1);
    }

    #[test]
    fn test_limit_stops_divisor_search() {
        let bounds = BoundTable::uniform(2, 0, 2);
        let lp = [1.5, 0.5];
        let base = make_cut(9, &[(0, 6), (1, 4)], &lp, &bounds);
        let mut helper = IntegerRoundingCutHelper::new(RoundingOptions::default());
        let mut always = || true;
        // With the limit already hit no divisor is evaluated.
        assert!(!helper.compute_cut(&base, None, &mut always));
    }

    #[test]
    fn test_produces_valid_cuts_on_knapsacks() {
        // A few fixed knapsack rows with fractional LP points; every
        // produced cut must keep every feasible integer point.
        let cases: &[(&[i64], i64, &[f64])] = &[
            (&[3, 5, 7], 11, &[0.8, 0.9, 0.4]),
            (&[2, 3], 4, &[0.9, 0.7]),
            (&[4, 4, 6], 13, &[0.6, 0.9, 0.8]),
            (&[9, 12, 5, 2], 23, &[0.9, 0.6, 0.3, 0.9]),
        ];
        for &(coeffs, rhs, lp) in cases {
            let n = coeffs.len();
            let bounds = BoundTable::uniform(n, 0, 3);
            let terms: Vec<(usize, i64)> =
                coeffs.iter().copied().enumerate().collect();
            // Each LP point satisfies its base row but sits at fractional
            // coordinates.
            assert!(
                coeffs
                    .iter()
                    .zip(lp)
                    .map(|(&c, &v)| c as f64 * v)
                    .sum::<f64>()
                    <= rhs as f64
            );
            let base = make_cut(rhs, &terms, lp, &bounds);
            let mut helper = IntegerRoundingCutHelper::new(RoundingOptions::default());
            if !helper.compute_cut(&base, None, &mut NoLimit) {
                continue;
            }
            let cut = helper.cut();
            // Enumerate the integer box and check validity.
            let mut assignment = vec![0i64; n];
            loop {
                let activity: i64 = coeffs
                    .iter()
                    .zip(&assignment)
                    .map(|(c, x)| c * x)
                    .sum();
                if activity <= rhs {
                    assert!(
                        cut.holds_for(&assignment),
                        "cut {:?} cuts feasible {:?} of {:?} <= {}",
                        cut,
                        assignment,
                        coeffs,
                        rhs
                    );
                }
                let mut pos = 0;
                loop {
                    if pos == n {
                        break;
                    }
                    assignment[pos] += 1;
                    if assignment[pos] <= 3 {
                        break;
                    }
                    assignment[pos] = 0;
                    pos += 1;
                }
                if pos == n {
                    break;
                }
            }
        }
    }
}
