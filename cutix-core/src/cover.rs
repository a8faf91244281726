//! Knapsack cover cut generation.
//!
//! A cover is a subset of terms of `sum(c_i * X_i) <= rhs` whose maximum
//! combined contribution exceeds the rhs, so its members cannot all sit at
//! their upper bound simultaneously. Complementing the cover terms turns
//! that fact into a valid inequality, which a superadditive function then
//! strengthens. Three variants live here, from cheapest to tightest:
//! plain knapsack covers, single-node-flow covers, and Letchford-Souli
//! lifted covers for all-Boolean rows.

use log::debug;

use crate::arith;
use crate::cut::CutData;
use crate::functions::{
    factor_t, MirStrengtheningFunction, RoundingFunction, StrengtheningFunction, SuperadditiveFn,
};
use crate::implied::ImpliedBoundsProcessor;

/// Terms with an LP value at least this close to their upper bound are
/// unconditionally part of the Boolean cover candidates.
const AT_UPPER_BOUND_THRESHOLD: f64 = 0.9999;

/// Cover cut settings.
#[derive(Debug, Clone)]
pub struct CoverOptions {
    /// Scaling budget handed to the strengthening functions.
    pub max_scaling: i64,

    /// Substitute integer terms by implied Booleans before selecting the
    /// cover, and lift profitable Booleans back in afterwards.
    pub use_implied_bounds: bool,

    /// Prefer decompositions whose literal appears positively.
    pub prefer_positive_booleans: bool,
}

impl Default for CoverOptions {
    fn default() -> Self {
        Self {
            max_scaling: 600,
            use_implied_bounds: true,
            prefer_positive_booleans: true,
        }
    }
}

impl CoverOptions {
    pub fn with_max_scaling(mut self, max_scaling: i64) -> Self {
        self.max_scaling = max_scaling;
        self
    }

    pub fn without_implied_bounds(mut self) -> Self {
        self.use_implied_bounds = false;
        self
    }
}

/// Statistics for cover cut generation.
#[derive(Debug, Default, Clone)]
pub struct CoverStats {
    /// Cuts produced by the plain knapsack variant.
    pub simple_cuts: u64,

    /// Cuts produced by the single-node-flow variant.
    pub flow_cuts: u64,

    /// Cuts produced by Letchford-Souli lifting.
    pub lifted_cuts: u64,

    /// Attempts where no subset of terms exceeded the rhs.
    pub aborted_no_cover: u64,

    /// Attempts abandoned because a value left the 64-bit range.
    pub aborted_overflow: u64,

    /// Attempts whose finished cut was not violated.
    pub aborted_weak: u64,
}

/// Knapsack cover cut generator.
///
/// Reusable like the rounding helper: each `try_*` call rebuilds the
/// internal working cut, exposed through [`cut`] on success.
///
/// [`cut`]: CoverCutHelper::cut
pub struct CoverCutHelper {
    settings: CoverOptions,
    cut: CutData,
    stats: CoverStats,
}

impl CoverCutHelper {
    pub fn new(settings: CoverOptions) -> Self {
        Self {
            settings,
            cut: CutData::default(),
            stats: CoverStats::default(),
        }
    }

    /// The cut produced by the last successful `try_*` call.
    pub fn cut(&self) -> &CutData {
        &self.cut
    }

    /// Get generation statistics.
    pub fn stats(&self) -> &CoverStats {
        &self.stats
    }

    /// Reset statistics.
    pub fn reset_stats(&mut self) {
        self.stats = CoverStats::default();
    }

    /// Plain knapsack cover cut.
    ///
    /// Selects the cover greedily by decreasing `lp_value * coeff` (for
    /// all-Boolean rows, by a cheaper bucket pass), trims it down to a
    /// minimal cover, complements it and rounds with the MIR function built
    /// from the largest cover coefficient.
    pub fn try_simple_knapsack(
        &mut self,
        base: &CutData,
        mut ib: Option<&mut ImpliedBoundsProcessor<'_>>,
    ) -> bool {
        if !self.prepare(base, ib.as_deref_mut()) {
            return false;
        }
        let candidates = if self.cut.all_booleans() {
            self.boolean_candidate_order()
        } else {
            self.sorted_candidate_order(false)
        };
        let Some(cover_size) = self.select_cover(candidates) else {
            self.stats.aborted_no_cover += 1;
            return false;
        };

        // Largest cover coefficient, before complementation flips signs.
        let mut divisor = 0;
        for term in &self.cut.terms[..cover_size] {
            divisor = divisor.max(term.coeff);
        }
        self.complement_cover(cover_size);
        let Some(rhs64) = self.negative_rhs() else {
            return false;
        };

        let rhs_remainder = arith::positive_remainder(rhs64, divisor);
        let magnitude_cap = self.magnitude_cap(rhs64);
        let t = factor_t(rhs_remainder, divisor, magnitude_cap);
        let f = RoundingFunction::new(rhs_remainder, divisor, t, self.settings.max_scaling);
        if !self.finish(&f, ib) {
            return false;
        }
        self.stats.simple_cuts += 1;
        debug!(
            "cover cut: size {}, divisor {}, violation {:.3e}",
            cover_size,
            divisor,
            self.cut.violation()
        );
        true
    }

    /// Single-node-flow cover cut.
    ///
    /// The cover is chosen by the knapsack ratio `lp_value / coeff`, which
    /// favors terms filling the rhs efficiently. The cover and then the
    /// remaining terms are all complemented, so every coefficient is
    /// negative and the plateau function keyed on the cover excess
    /// strengthens the non-cover terms instead of erasing them. The
    /// resulting cuts dominate plain covers when slack-like terms carry
    /// large coefficients at small LP values.
    pub fn try_single_node_flow(
        &mut self,
        base: &CutData,
        mut ib: Option<&mut ImpliedBoundsProcessor<'_>>,
    ) -> bool {
        if !self.prepare(base, ib.as_deref_mut()) {
            return false;
        }
        let candidates = self.sorted_candidate_order(true);
        let Some(cover_size) = self.select_cover(candidates) else {
            self.stats.aborted_no_cover += 1;
            return false;
        };

        let mut min_magnitude = i64::MAX;
        for term in &self.cut.terms[..cover_size] {
            min_magnitude = min_magnitude.min(term.coeff);
        }
        self.complement_cover(cover_size);
        let Some(rhs64) = self.negative_rhs() else {
            return false;
        };
        let Some(positive_rhs) = rhs64.checked_neg() else {
            self.stats.aborted_overflow += 1;
            return false;
        };
        // The strengthening functions are zero on positive arguments, so
        // the non-cover terms must be complemented as well to survive the
        // application. The excess above stays keyed on the cover alone.
        for i in cover_size..self.cut.terms.len() {
            self.cut.terms[i].complement(&mut self.cut.rhs);
        }

        // Within the scaling budget the plateau function applies directly;
        // past it, fall back to the floored variant to keep coefficients
        // small.
        let done = if positive_rhs <= self.settings.max_scaling {
            let f = StrengtheningFunction::new(positive_rhs, min_magnitude.min(positive_rhs));
            self.finish(&f, ib)
        } else {
            let f = MirStrengtheningFunction::new(positive_rhs, self.settings.max_scaling);
            self.finish(&f, ib)
        };
        if !done {
            return false;
        }
        self.stats.flow_cuts += 1;
        debug!(
            "flow cover cut: size {}, excess {}, violation {:.3e}",
            cover_size,
            positive_rhs,
            self.cut.violation()
        );
        true
    }

    /// Letchford-Souli lifted cover cut, for all-Boolean rows.
    ///
    /// Derives per-position weight thresholds from a minimal cover and maps
    /// every coefficient to the number of thresholds it reaches, giving the
    /// sequential-lifting cut `sum(level_i * x_i) <= cover_size - 1`. No
    /// complementation is involved; the thresholds argue validity directly.
    pub fn try_with_letchford_souli_lifting(&mut self, base: &CutData) -> bool {
        if !self.prepare(base, None) {
            return false;
        }
        if !self.cut.all_booleans() || self.cut.rhs < 0 {
            return false;
        }
        let candidates = self.boolean_candidate_order();
        let Some(cover_size) = self.select_cover(candidates) else {
            self.stats.aborted_no_cover += 1;
            return false;
        };
        let Some(rhs64) = self.cut.rhs_as_i64() else {
            self.stats.aborted_overflow += 1;
            return false;
        };

        let Some(thresholds) = self.lifting_thresholds(cover_size, rhs64) else {
            self.stats.aborted_overflow += 1;
            return false;
        };

        // Every coefficient becomes the number of thresholds it reaches;
        // cover members always keep at least the plain cover coefficient.
        for (i, term) in self.cut.terms.iter_mut().enumerate() {
            let level = thresholds.partition_point(|&t| t <= term.coeff) as i64;
            term.coeff = if i < cover_size { level.max(1) } else { level };
        }
        self.cut.terms.retain(|t| t.coeff != 0);
        self.cut.rhs = cover_size as i128 - 1;
        self.cut.num_relevant_entries = 0;

        if self.cut.violation() <= 0.0 {
            self.stats.aborted_weak += 1;
            return false;
        }
        self.stats.lifted_cuts += 1;
        debug!(
            "lifted cover cut: size {}, violation {:.3e}",
            cover_size,
            self.cut.violation()
        );
        true
    }

    /// Copies the base cut, normalizes signs and optionally expands integer
    /// terms through implied bounds, then refreshes the relevant prefix.
    fn prepare(&mut self, base: &CutData, ib: Option<&mut ImpliedBoundsProcessor<'_>>) -> bool {
        self.cut.clone_from(base);
        self.cut.complement_for_positive_coefficients();
        if self.settings.use_implied_bounds {
            if let Some(processor) = ib {
                processor.cache_data_for_cut(&mut self.cut);
                processor.try_expand_booleans(&mut self.cut, self.settings.prefer_positive_booleans);
            }
        }
        self.cut.sort_relevant_entries();
        self.cut.num_relevant_entries > 0
    }

    /// Orders Boolean cover candidates without sorting the whole term list:
    /// terms at their upper bound first, then fractional terms by
    /// decreasing LP value, then at most one inactive term with the largest
    /// coefficient as a cover filler.
    fn boolean_candidate_order(&mut self) -> usize {
        let relevant = self.cut.num_relevant_entries;
        let mut part1 = 0;
        for i in 0..relevant {
            if self.cut.terms[i].lp_value >= AT_UPPER_BOUND_THRESHOLD {
                self.cut.terms.swap(part1, i);
                part1 += 1;
            }
        }
        self.cut.terms[part1..relevant].sort_by(|a, b| b.lp_value.total_cmp(&a.lp_value));

        let mut filler: Option<usize> = None;
        for i in relevant..self.cut.terms.len() {
            if !self.cut.terms[i].is_boolean() {
                continue;
            }
            if filler.map_or(true, |j| self.cut.terms[i].coeff > self.cut.terms[j].coeff) {
                filler = Some(i);
            }
        }
        match filler {
            Some(i) => {
                self.cut.terms.swap(relevant, i);
                relevant + 1
            }
            None => relevant,
        }
    }

    /// Orders cover candidates by decreasing score: `lp / coeff` for the
    /// flow variant, `lp * coeff` otherwise.
    fn sorted_candidate_order(&mut self, by_ratio: bool) -> usize {
        let relevant = self.cut.num_relevant_entries;
        if by_ratio {
            self.cut.terms[..relevant].sort_by(|a, b| {
                let score_a = a.lp_value / a.coeff as f64;
                let score_b = b.lp_value / b.coeff as f64;
                score_b.total_cmp(&score_a)
            });
        } else {
            self.cut.terms[..relevant].sort_by(|a, b| {
                let score_a = a.lp_value * a.coeff as f64;
                let score_b = b.lp_value * b.coeff as f64;
                score_b.total_cmp(&score_a)
            });
        }
        relevant
    }

    /// Shortest candidate prefix whose maximum activity exceeds the rhs,
    /// trimmed to a minimal cover by dropping the largest coefficients the
    /// excess allows.
    fn select_cover(&mut self, candidates: usize) -> Option<usize> {
        let mut max_activity: i128 = 0;
        let mut cover_size = None;
        for i in 0..candidates {
            let term = &self.cut.terms[i];
            max_activity += term.coeff as i128 * term.bound_diff as i128;
            if max_activity > self.cut.rhs {
                cover_size = Some(i + 1);
                break;
            }
        }
        let cover_size = cover_size?;

        let mut order: Vec<usize> = (0..cover_size).collect();
        order.sort_by_key(|&i| std::cmp::Reverse(self.cut.terms[i].coeff));
        let mut keep = vec![true; cover_size];
        for &i in &order {
            let term = &self.cut.terms[i];
            let contribution = term.coeff as i128 * term.bound_diff as i128;
            if max_activity - contribution > self.cut.rhs {
                keep[i] = false;
                max_activity -= contribution;
            }
        }
        let mut write = 0;
        for read in 0..cover_size {
            if keep[read] {
                self.cut.terms.swap(write, read);
                write += 1;
            }
        }
        // A negative rhs makes the empty set a cover; nothing to cut there.
        if write == 0 {
            return None;
        }
        Some(write)
    }

    fn complement_cover(&mut self, cover_size: usize) {
        for i in 0..cover_size {
            self.cut.terms[i].complement(&mut self.cut.rhs);
        }
    }

    /// The complemented rhs as an i64, required to be negative: a
    /// nonnegative value here means the selected terms were not a cover.
    fn negative_rhs(&mut self) -> Option<i64> {
        match self.cut.rhs_as_i64() {
            None => {
                self.stats.aborted_overflow += 1;
                None
            }
            Some(rhs) if rhs >= 0 => {
                self.stats.aborted_no_cover += 1;
                None
            }
            Some(rhs) => Some(rhs),
        }
    }

    /// Largest magnitude the chosen function can see: every coefficient,
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

    /// Applies the chosen function with the Boolean bump, after giving the
    /// implied-bound processor a chance to lift literals back in.
    fn finish<F: SuperadditiveFn>(
        &mut self,
        f: &F,
        ib: Option<&mut ImpliedBoundsProcessor<'_>>,
    ) -> bool {
        if self.settings.use_implied_bounds {
            if let Some(processor) = ib {
                processor.expand_where_profitable(&mut self.cut, f);
            }
        }
        if !self.cut.apply_with_potential_bump(f) {
            self.stats.aborted_overflow += 1;
            return false;
        }
        if self.cut.violation() <= 0.0 {
            self.stats.aborted_weak += 1;
            return false;
        }
        true
    }

    /// Letchford-Souli threshold sequence for a minimal cover.
    ///
    /// Walking the cover weights in increasing order finds the largest
    /// remainder `p` the smallest weights leave available, together with
    /// the number `q` of cover slots it spreads over; positions below `q`
    /// then step by `p/q` (rounded up past an extra unit), and later
    /// positions extend by the weights themselves in decreasing order.
    /// The sequence is nondecreasing.
    fn lifting_thresholds(&self, cover_size: usize, rhs64: i64) -> Option<Vec<i64>> {
        let mut ascending: Vec<i64> = self.cut.terms[..cover_size]
            .iter()
            .map(|t| t.coeff)
            .collect();
        ascending.sort_unstable();

        let mut remainder = rhs64;
        let mut slots = 0;
        let mut prefix_sum: i64 = 0;
        for (i, &weight) in ascending.iter().enumerate() {
            let q = (cover_size - i) as i64;
            let reach = prefix_sum.checked_add(weight.checked_mul(q)?)?;
            if reach > rhs64 {
                remainder = rhs64 - prefix_sum;
                slots = q;
                break;
            }
            prefix_sum = prefix_sum.checked_add(weight)?;
        }
        if slots == 0 {
            // The candidate prefix was not a cover after all.
            return None;
        }

        let mut thresholds: Vec<i64> = Vec::with_capacity(cover_size);
        for i in 0..cover_size {
            if (i as i64) < slots {
                let scaled = i128::from(remainder) * (i as i128 + 1) + 1;
                let value = arith::ceil_ratio_i128(scaled, slots);
                thresholds.push(i64::try_from(value).ok()?);
            } else {
                // Extend one cover weight at a time, largest remaining
                // first: ascending[cover_size - 1 - i] walks them downward.
                let weight = ascending[cover_size - 1 - i];
                let previous = thresholds[i - 1];
                thresholds.push(previous.checked_add(weight)?);
            }
        }
        Some(thresholds)
    }
}
