//! Integer linear constraints in emitted form.
//!
//! `LinearConstraint` is the shape rows take in the constraint pool and the
//! shape finished cuts are handed back in: `lb <= sum(coeff_i * var_i) <= ub`
//! over sorted, distinct variables with nonzero coefficients. The working
//! representation used while a cut is being derived lives in [`crate::cut`].

use std::fmt;

use crate::arith;
use crate::bounds::LevelZeroBounds;
use crate::error::{CutError, CutResult};

/// Index of a model variable.
pub type VarId = usize;

/// Sentinel for an absent lower bound.
pub const NO_LOWER_BOUND: i64 = i64::MIN;
/// Sentinel for an absent upper bound.
pub const NO_UPPER_BOUND: i64 = i64::MAX;

/// Any row whose min/max activity stays inside this range can be merged,
/// folded and strengthened without risking 64-bit overflow.
pub const ACTIVITY_LIMIT: i128 = (i64::MAX / 2) as i128;

/// One two-sided row, `lb <= sum coeffs[i] * vars[i] <= ub`.
///
/// Either bound may be absent (see [`NO_LOWER_BOUND`] / [`NO_UPPER_BOUND`]).
/// Canonical form additionally requires: variables strictly increasing, no
/// zero coefficients, first coefficient positive, and coefficient gcd 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinearConstraint {
    pub lb: i64,
    pub ub: i64,
    pub vars: Vec<VarId>,
    pub coeffs: Vec<i64>,
}

impl LinearConstraint {
    pub fn new(lb: i64, ub: i64, vars: Vec<VarId>, coeffs: Vec<i64>) -> Self {
        debug_assert_eq!(vars.len(), coeffs.len());
        LinearConstraint {
            lb,
            ub,
            vars,
            coeffs,
        }
    }

    /// A row with only an upper bound, the usual shape for cuts.
    pub fn upper_bounded(ub: i64, vars: Vec<VarId>, coeffs: Vec<i64>) -> Self {
        Self::new(NO_LOWER_BOUND, ub, vars, coeffs)
    }

    pub fn num_terms(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn has_lower_bound(&self) -> bool {
        self.lb != NO_LOWER_BOUND
    }

    pub fn has_upper_bound(&self) -> bool {
        self.ub != NO_UPPER_BOUND
    }

    /// True when both rows constrain the same linear form, whatever their
    /// bounds are. This is the equality the pool deduplicates on.
    pub fn same_terms(&self, other: &LinearConstraint) -> bool {
        self.vars == other.vars && self.coeffs == other.coeffs
    }

    pub fn l2_norm(&self) -> f64 {
        self.coeffs
            .iter()
            .map(|&c| (c as f64) * (c as f64))
            .sum::<f64>()
            .sqrt()
    }

    pub fn lp_activity(&self, lp_values: &[f64]) -> f64 {
        self.vars
            .iter()
            .zip(&self.coeffs)
            .map(|(&v, &c)| c as f64 * lp_values[v])
            .sum()
    }

    /// Amount by which the LP point violates the row; negative means slack
    /// on both sides.
    pub fn violation(&self, lp_values: &[f64]) -> f64 {
        let activity = self.lp_activity(lp_values);
        let mut violation = f64::NEG_INFINITY;
        if self.has_lower_bound() {
            violation = violation.max(self.lb as f64 - activity);
        }
        if self.has_upper_bound() {
            violation = violation.max(activity - self.ub as f64);
        }
        if violation == f64::NEG_INFINITY {
            0.0
        } else {
            violation
        }
    }

    /// Violation normalized by the coefficient l2 norm, i.e. the euclidean
    /// distance from the LP point to the cut hyperplane.
    pub fn efficacy(&self, lp_values: &[f64]) -> f64 {
        let norm = self.l2_norm();
        if norm <= f64::MIN_POSITIVE {
            return 0.0;
        }
        self.violation(lp_values) / norm
    }

    /// Smallest and largest value the linear form can take under the given
    /// level-zero bounds.
    pub fn activity_range(&self, bounds: &dyn LevelZeroBounds) -> (i128, i128) {
        let mut min_activity: i128 = 0;
        let mut max_activity: i128 = 0;
        for (&var, &coeff) in self.vars.iter().zip(&self.coeffs) {
            let c = coeff as i128;
            let lb = bounds.lower_bound(var) as i128;
            let ub = bounds.upper_bound(var) as i128;
            if coeff > 0 {
                min_activity += c * lb;
                max_activity += c * ub;
            } else {
                min_activity += c * ub;
                max_activity += c * lb;
            }
        }
        (min_activity, max_activity)
    }

    /// Checks the row can never overflow 64-bit activity computations.
    pub fn fits_in_activity_bounds(&self, bounds: &dyn LevelZeroBounds) -> bool {
        let (min_activity, max_activity) = self.activity_range(bounds);
        min_activity >= -ACTIVITY_LIMIT && max_activity <= ACTIVITY_LIMIT
    }

    /// Rewrites the row into canonical form: variables sorted and merged,
    /// zero coefficients dropped, first coefficient positive, coefficient
    /// gcd divided out (with bounds rounded toward feasibility, which is
    /// exact for integer variables).
    ///
    /// Returns false when a merge or negation overflows; the row contents
    /// are unspecified in that case and the caller should drop it.
    pub fn canonicalize(&mut self) -> bool {
        let n = self.vars.len();
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by_key(|&i| self.vars[i]);

        let mut vars = Vec::with_capacity(n);
        let mut coeffs: Vec<i64> = Vec::with_capacity(n);
        for &i in &order {
            let var = self.vars[i];
            let coeff = self.coeffs[i];
            match vars.last() {
                Some(&last) if last == var => {
                    let merged = match coeffs.last_mut() {
                        Some(c) => match c.checked_add(coeff) {
                            Some(m) => {
                                *c = m;
                                m
                            }
                            None => return false,
                        },
                        None => return false,
                    };
                    if merged == 0 {
                        vars.pop();
                        coeffs.pop();
                    }
                }
                _ => {
                    if coeff != 0 {
                        vars.push(var);
                        coeffs.push(coeff);
                    }
                }
            }
        }
        self.vars = vars;
        self.coeffs = coeffs;

        if let Some(&first) = self.coeffs.first() {
            if first < 0 && !self.negate_in_place() {
                return false;
            }
        }

        let g = self
            .coeffs
            .iter()
            .fold(0u64, |g, &c| arith::gcd(g, c.unsigned_abs()));
        if g > 1 {
            let g = g as i64;
            for c in &mut self.coeffs {
                *c /= g;
            }
            if self.has_lower_bound() {
                self.lb = arith::ceil_ratio(self.lb, g);
            }
            if self.has_upper_bound() {
                self.ub = arith::floor_ratio(self.ub, g);
            }
        }
        true
    }

    /// Negates all terms and swaps the bounds. Fails on i64::MIN negation.
    fn negate_in_place(&mut self) -> bool {
        for c in &mut self.coeffs {
            match c.checked_neg() {
                Some(n) => *c = n,
                None => return false,
            }
        }
        let new_ub = if self.has_lower_bound() {
            match self.lb.checked_neg() {
                Some(n) => n,
                None => return false,
            }
        } else {
            NO_UPPER_BOUND
        };
        let new_lb = if self.has_upper_bound() {
            match self.ub.checked_neg() {
                Some(n) => n,
                None => return false,
            }
        } else {
            NO_LOWER_BOUND
        };
        self.lb = new_lb;
        self.ub = new_ub;
        true
    }

    /// Structural validation for rows coming from outside the crate.
    pub fn validate(&self) -> CutResult<()> {
        if self.vars.len() != self.coeffs.len() {
            return Err(CutError::InvalidConstraint(
                "variable and coefficient lengths differ".to_string(),
            ));
        }
        if self.vars.windows(2).any(|w| w[0] >= w[1]) {
            return Err(CutError::InvalidConstraint(
                "variables not strictly increasing".to_string(),
            ));
        }
        if self.coeffs.iter().any(|&c| c == 0) {
            return Err(CutError::InvalidConstraint(
                "zero coefficient".to_string(),
            ));
        }
        if self.has_lower_bound() && self.has_upper_bound() && self.lb > self.ub {
            return Err(CutError::InvalidConstraint(format!(
                "empty bound interval [{}, {}]",
                self.lb, self.ub
            )));
        }
        Ok(())
    }
}

impl fmt::Display for LinearConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.has_lower_bound() {
            write!(f, "{} <= ", self.lb)?;
        }
        if self.vars.is_empty() {
            write!(f, "0")?;
        }
        for (i, (&var, &coeff)) in self.vars.iter().zip(&self.coeffs).enumerate() {
            if i == 0 {
                if coeff < 0 {
                    write!(f, "-")?;
                }
            } else if coeff < 0 {
                write!(f, " - ")?;
            } else {
                write!(f, " + ")?;
            }
            let magnitude = coeff.unsigned_abs();
            if magnitude == 1 {
                write!(f, "x{var}")?;
            } else {
                write!(f, "{magnitude}*x{var}")?;
            }
        }
        if self.has_upper_bound() {
            write!(f, " <= {}", self.ub)?;
        }
        Ok(())
    }
}

/// Accumulates terms (with possible repeats) and a constant offset, then
/// produces a [`LinearConstraint`] with the offset folded into the bounds.
///
/// Term accumulation is 128-bit, so intermediate sums cannot overflow; the
/// final narrowing to 64 bits is where `Overflow` is reported. A bound that
/// narrows past the representable range in the loose direction is dropped
/// instead, which only weakens the row.
#[derive(Debug, Default)]
pub struct LinearConstraintBuilder {
    terms: Vec<(VarId, i128)>,
    offset: i128,
}

impl LinearConstraintBuilder {
    pub fn clear(&mut self) {
        self.terms.clear();
        self.offset = 0;
    }

    pub fn add_term(&mut self, var: VarId, coeff: i64) {
        if coeff != 0 {
            self.terms.push((var, coeff as i128));
        }
    }

    pub fn add_constant(&mut self, value: i64) {
        self.offset += value as i128;
    }

    pub fn add_scaled_constant(&mut self, value: i64, scale: i64) {
        self.offset += value as i128 * scale as i128;
    }

    pub fn build(&self, lb: Option<i128>, ub: Option<i128>) -> CutResult<LinearConstraint> {
        let mut sorted = self.terms.clone();
        sorted.sort_by_key(|&(var, _)| var);

        let mut vars: Vec<VarId> = Vec::with_capacity(sorted.len());
        let mut coeffs: Vec<i64> = Vec::with_capacity(sorted.len());
        let mut i = 0;
        while i < sorted.len() {
            let var = sorted[i].0;
            let mut sum: i128 = 0;
            while i < sorted.len() && sorted[i].0 == var {
                sum += sorted[i].1;
                i += 1;
            }
            if sum != 0 {
                let coeff = i64::try_from(sum).map_err(|_| CutError::Overflow)?;
                vars.push(var);
                coeffs.push(coeff);
            }
        }

        let lb = match lb {
            None => NO_LOWER_BOUND,
            Some(raw) => {
                let shifted = raw - self.offset;
                if shifted > i128::from(i64::MAX) {
                    return Err(CutError::Overflow);
                }
                // A lower bound below the representable range constrains
                // nothing; drop it rather than fail.
                i64::try_from(shifted).unwrap_or(NO_LOWER_BOUND)
            }
        };
        let ub = match ub {
            None => NO_UPPER_BOUND,
            Some(raw) => {
                let shifted = raw - self.offset;
                if shifted < i128::from(i64::MIN) {
                    return Err(CutError::Overflow);
                }
                i64::try_from(shifted).unwrap_or(NO_UPPER_BOUND)
            }
        };

        Ok(LinearConstraint::new(lb, ub, vars, coeffs))
    }

    pub fn build_upper_bounded(&self, ub: i128) -> CutResult<LinearConstraint> {
        self.build(None, Some(ub))
    }
}
