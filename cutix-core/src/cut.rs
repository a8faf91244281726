//! Working representation of a cut while it is being derived.
//!
//! The generators all operate on [`CutData`], a sum of terms
//! `coeff * expr <= rhs` where every `expr` has been shifted to take values
//! in `[0, bound_diff]`. Keeping terms nonnegative is what makes the
//! superadditive machinery in [`crate::functions`] applicable, and keeping
//! the rhs in 128 bits means bound substitutions never overflow silently.

use std::collections::HashMap;

use crate::arith;
use crate::bounds::LevelZeroBounds;
use crate::constraint::{LinearConstraint, LinearConstraintBuilder, VarId};
use crate::error::CutResult;
use crate::functions::SuperadditiveFn;

/// LP values below this threshold do not meaningfully contribute to
/// violation and are skipped by the candidate searches.
pub const RELEVANT_LP_THRESHOLD: f64 = 1e-2;

/// Affine expression over at most two variables with unit coefficients,
/// `coeffs[0] * vars[0] + coeffs[1] * vars[1] + offset`.
///
/// A zero coefficient marks an unused slot. This covers every shape a term
/// takes during derivation: a shifted variable (`x - lb`), its complement
/// (`ub - x`), a Boolean literal or its negation, and the slack of an
/// implied-bound substitution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TermExpr {
    pub vars: [VarId; 2],
    pub coeffs: [i64; 2],
    pub offset: i64,
}

impl TermExpr {
    /// The variable itself.
    pub fn from_var(var: VarId) -> Self {
        TermExpr {
            vars: [var, 0],
            coeffs: [1, 0],
            offset: 0,
        }
    }

    /// A positive Boolean literal.
    pub fn literal(var: VarId) -> Self {
        Self::from_var(var)
    }

    /// The negation `1 - var` of a Boolean variable.
    pub fn negated_literal(var: VarId) -> Self {
        TermExpr {
            vars: [var, 0],
            coeffs: [-1, 0],
            offset: 1,
        }
    }

    pub fn lp_value(&self, lp_values: &[f64]) -> f64 {
        let mut value = self.offset as f64;
        for slot in 0..2 {
            if self.coeffs[slot] != 0 {
                value += self.coeffs[slot] as f64 * lp_values[self.vars[slot]];
            }
        }
        value
    }

    /// Exact value under an integer assignment, for validity checking.
    pub fn value_at(&self, assignment: &[i64]) -> i128 {
        let mut value = self.offset as i128;
        for slot in 0..2 {
            if self.coeffs[slot] != 0 {
                value += self.coeffs[slot] as i128 * assignment[self.vars[slot]] as i128;
            }
        }
        value
    }

    /// `Some((var, positive, offset))` when the expression uses exactly one
    /// variable with a unit coefficient.
    pub fn as_simple_var(&self) -> Option<(VarId, bool, i64)> {
        match (self.coeffs[0], self.coeffs[1]) {
            (c, 0) if c == 1 || c == -1 => Some((self.vars[0], c == 1, self.offset)),
            (0, c) if c == 1 || c == -1 => Some((self.vars[1], c == 1, self.offset)),
            _ => None,
        }
    }
}

/// One normalized term `coeff * expr`, with `expr` in `[0, bound_diff]`.
#[derive(Debug, Clone, Copy)]
pub struct CutTerm {
    pub coeff: i64,
    pub expr: TermExpr,
    /// Width of the expression's range; 1 marks a Boolean.
    pub bound_diff: i64,
    pub lp_value: f64,
    /// Index into the implied-bound cache, maintained by
    /// [`crate::implied::ImpliedBoundsProcessor`].
    pub cached_implied_lb: Option<usize>,
    pub cached_implied_ub: Option<usize>,
}

impl CutTerm {
    pub fn is_boolean(&self) -> bool {
        self.bound_diff == 1
    }

    pub fn has_relevant_lp_value(&self) -> bool {
        self.lp_value > RELEVANT_LP_THRESHOLD
    }

    pub fn lp_dist_to_max_value(&self) -> f64 {
        self.bound_diff as f64 - self.lp_value
    }

    /// Replaces `expr` by `bound_diff - expr`, negating the coefficient and
    /// shifting the rhs accordingly. Applying it twice restores the term.
    pub fn complement(&mut self, rhs: &mut i128) {
        *rhs -= self.coeff as i128 * self.bound_diff as i128;
        self.coeff = -self.coeff;
        self.lp_value = self.bound_diff as f64 - self.lp_value;
        self.expr.coeffs[0] = -self.expr.coeffs[0];
        self.expr.coeffs[1] = -self.expr.coeffs[1];
        self.expr.offset = self.bound_diff - self.expr.offset;
        std::mem::swap(&mut self.cached_implied_lb, &mut self.cached_implied_ub);
    }
}

/// A cut in derivation form: `sum(coeff_i * expr_i) <= rhs` with every
/// expression ranging over `[0, bound_diff_i]`.
#[derive(Debug, Clone, Default)]
pub struct CutData {
    pub rhs: i128,
    pub terms: Vec<CutTerm>,
    /// Terms `[0, num_relevant_entries)` have relevant LP values and are
    /// sorted by decreasing LP value after [`CutData::sort_relevant_entries`].
    pub num_relevant_entries: usize,
    /// Largest coefficient magnitude, maintained by `sort_relevant_entries`.
    pub max_magnitude: i64,
}

impl CutData {
    pub fn clear(&mut self) {
        self.rhs = 0;
        self.terms.clear();
        self.num_relevant_entries = 0;
        self.max_magnitude = 0;
    }

    /// Adds `coeff * var` to the cut, shifted to whichever of the two
    /// bounds is closer to the LP value. Fixed variables fold into the rhs.
    ///
    /// Returns false when the variable's domain width or a required
    /// negation does not fit in 64 bits; the cut is unusable in that case.
    pub fn append_term(
        &mut self,
        var: VarId,
        coeff: i64,
        lp_value: f64,
        lb: i64,
        ub: i64,
    ) -> bool {
        assert!(lb <= ub, "empty domain for variable {var}");
        if coeff == 0 {
            return true;
        }
        let Some(width) = ub.checked_sub(lb) else {
            return false;
        };
        if width == 0 {
            return self.shift_rhs(coeff, lb);
        }
        let dist_lb = lp_value - lb as f64;
        let dist_ub = ub as f64 - lp_value;
        if dist_lb <= dist_ub {
            // expr = var - lb.
            let Some(offset) = lb.checked_neg() else {
                return false;
            };
            if !self.shift_rhs(coeff, lb) {
                return false;
            }
            self.terms.push(CutTerm {
                coeff,
                expr: TermExpr {
                    vars: [var, 0],
                    coeffs: [1, 0],
                    offset,
                },
                bound_diff: width,
                lp_value: dist_lb.clamp(0.0, width as f64),
                cached_implied_lb: None,
                cached_implied_ub: None,
            });
        } else {
            // expr = ub - var.
            let Some(negated) = coeff.checked_neg() else {
                return false;
            };
            if !self.shift_rhs(coeff, ub) {
                return false;
            }
            self.terms.push(CutTerm {
                coeff: negated,
                expr: TermExpr {
                    vars: [var, 0],
                    coeffs: [-1, 0],
                    offset: ub,
                },
                bound_diff: width,
                lp_value: dist_ub.clamp(0.0, width as f64),
                cached_implied_lb: None,
                cached_implied_ub: None,
            });
        }
        true
    }

    /// rhs -= coeff * value without silent wraparound.
    fn shift_rhs(&mut self, coeff: i64, value: i64) -> bool {
        match self.rhs.checked_sub(coeff as i128 * value as i128) {
            Some(rhs) => {
                self.rhs = rhs;
                true
            }
            None => false,
        }
    }

    /// Rebuilds the cut from `sum(coeffs[i] * vars[i]) <= rhs_ub`.
    pub fn fill_from_parallel_vectors(
        &mut self,
        rhs_ub: i64,
        vars: &[VarId],
        coeffs: &[i64],
        lp_values: &[f64],
        bounds: &dyn LevelZeroBounds,
    ) -> bool {
        debug_assert_eq!(vars.len(), coeffs.len());
        self.clear();
        self.rhs = rhs_ub as i128;
        for (&var, &coeff) in vars.iter().zip(coeffs) {
            if !self.append_term(
                var,
                coeff,
                lp_values[var],
                bounds.lower_bound(var),
                bounds.upper_bound(var),
            ) {
                return false;
            }
        }
        true
    }

    /// Rebuilds the cut from the upper-bound side of a row, or from the
    /// negated lower-bound side when the row has no upper bound.
    pub fn fill_from_linear_constraint(
        &mut self,
        ct: &LinearConstraint,
        lp_values: &[f64],
        bounds: &dyn LevelZeroBounds,
    ) -> bool {
        if ct.has_upper_bound() {
            return self.fill_from_parallel_vectors(ct.ub, &ct.vars, &ct.coeffs, lp_values, bounds);
        }
        if !ct.has_lower_bound() {
            return false;
        }
        let Some(rhs) = ct.lb.checked_neg() else {
            return false;
        };
        let mut negated = Vec::with_capacity(ct.coeffs.len());
        for &c in &ct.coeffs {
            match c.checked_neg() {
                Some(n) => negated.push(n),
                None => return false,
            }
        }
        self.fill_from_parallel_vectors(rhs, &ct.vars, &negated, lp_values, bounds)
    }

    /// Complements terms so that every coefficient is nonnegative.
    pub fn complement_for_positive_coefficients(&mut self) {
        let rhs = &mut self.rhs;
        for term in &mut self.terms {
            if term.coeff < 0 {
                term.complement(rhs);
            }
        }
    }

    /// Complements terms whose LP value sits in the upper half of their
    /// range, which tends to lower the rhs and strengthen rounding.
    pub fn complement_for_smaller_lp_values(&mut self) {
        let rhs = &mut self.rhs;
        for term in &mut self.terms {
            if 2.0 * term.lp_value > term.bound_diff as f64 {
                term.complement(rhs);
            }
        }
    }

    pub fn all_booleans(&self) -> bool {
        self.terms.iter().all(|t| t.is_boolean())
    }

    pub fn rhs_as_i64(&self) -> Option<i64> {
        i64::try_from(self.rhs).ok()
    }

    pub fn lp_activity(&self) -> f64 {
        self.terms
            .iter()
            .map(|t| t.coeff as f64 * t.lp_value)
            .sum()
    }

    pub fn violation(&self) -> f64 {
        self.lp_activity() - self.rhs as f64
    }

    pub fn l2_norm(&self) -> f64 {
        self.terms
            .iter()
            .map(|t| (t.coeff as f64) * (t.coeff as f64))
            .sum::<f64>()
            .sqrt()
    }

    pub fn efficacy(&self) -> f64 {
        let norm = self.l2_norm();
        if norm <= f64::MIN_POSITIVE {
            return 0.0;
        }
        self.violation() / norm
    }

    /// Moves terms with relevant LP values to the front, sorted by
    /// decreasing LP value, and refreshes `max_magnitude` over all terms.
    pub fn sort_relevant_entries(&mut self) {
        self.num_relevant_entries = 0;
        self.max_magnitude = 0;
        for i in 0..self.terms.len() {
            let magnitude = self.terms[i].coeff.checked_abs().unwrap_or(i64::MAX);
            self.max_magnitude = self.max_magnitude.max(magnitude);
            if self.terms[i].has_relevant_lp_value() {
                self.terms.swap(self.num_relevant_entries, i);
                self.num_relevant_entries += 1;
            }
        }
        self.terms[..self.num_relevant_entries]
            .sort_by(|a, b| b.lp_value.total_cmp(&a.lp_value));
    }

    /// Applies a superadditive function to every coefficient and the rhs.
    ///
    /// At most one Boolean term instead receives the lifted coefficient
    /// `f(rhs) - f(rhs - coeff)`, which superadditivity guarantees is at
    /// least `f(coeff)`; the term chosen is the one where the lift gains
    /// the most violation. Returns false when the rhs does not fit in 64
    /// bits, leaving the cut untouched.
    pub fn apply_with_potential_bump<F: SuperadditiveFn>(&mut self, f: &F) -> bool {
        let Some(rhs) = self.rhs_as_i64() else {
            return false;
        };
        let f_rhs = f.apply(rhs);

        let mut best: Option<(usize, i64)> = None;
        let mut best_gain = 0.0;
        for (i, term) in self.terms.iter().enumerate() {
            if !term.is_boolean() {
                continue;
            }
            let Some(shifted) = rhs.checked_sub(term.coeff) else {
                continue;
            };
            // Near the factor cap both function values approach the 64-bit
            // range, so the lift itself needs a checked difference.
            let Some(lifted) = f_rhs.checked_sub(f.apply(shifted)) else {
                continue;
            };
            let gain = (i128::from(lifted) - i128::from(f.apply(term.coeff))) as f64 * term.lp_value;
            if gain > best_gain {
                best_gain = gain;
                best = Some((i, lifted));
            }
        }

        for (i, term) in self.terms.iter_mut().enumerate() {
            term.coeff = match best {
                Some((j, lifted)) if j == i => lifted,
                _ => f.apply(term.coeff),
            };
        }
        self.rhs = f_rhs as i128;
        self.terms.retain(|t| t.coeff != 0);
        self.num_relevant_entries = 0;
        true
    }

    /// Expands the shifted expressions back onto model variables and emits
    /// the cut as an upper-bounded row.
    pub fn to_linear_constraint(&self) -> CutResult<LinearConstraint> {
        let mut builder = LinearConstraintBuilder::default();
        for term in &self.terms {
            if !add_scaled_expr(&mut builder, &term.expr, term.coeff) {
                return Err(crate::error::CutError::Overflow);
            }
        }
        builder.build_upper_bounded(self.rhs)
    }

    /// Exact feasibility of the cut under an integer assignment.
    pub fn holds_for(&self, assignment: &[i64]) -> bool {
        let activity: i128 = self
            .terms
            .iter()
            .map(|t| t.coeff as i128 * t.expr.value_at(assignment))
            .sum();
        activity <= self.rhs
    }

    /// Positive remainder of the 64-bit rhs modulo `divisor`.
    pub fn rhs_remainder(&self, divisor: i64) -> i64 {
        arith::positive_remainder_i128(self.rhs, divisor)
    }

    /// Merges terms sharing the same expression and range by summing their
    /// coefficients; implied-bound expansion can introduce one literal
    /// several times. Pairs whose merge would overflow stay separate.
    pub fn merge_identical_exprs(&mut self) -> u32 {
        let mut first_at: HashMap<(TermExpr, i64), usize> = HashMap::new();
        let mut merged = 0;
        for i in 0..self.terms.len() {
            let key = (self.terms[i].expr, self.terms[i].bound_diff);
            match first_at.get(&key) {
                Some(&j) => {
                    let coeff = self.terms[i].coeff;
                    if let Some(sum) = self.terms[j].coeff.checked_add(coeff) {
                        self.terms[j].coeff = sum;
                        self.terms[i].coeff = 0;
                        merged += 1;
                    }
                }
                None => {
                    first_at.insert(key, i);
                }
            }
        }
        if merged > 0 {
            self.terms.retain(|t| t.coeff != 0);
            self.num_relevant_entries = 0;
        }
        merged
    }
}

/// Adds `coeff * expr` to a row builder. False on a negation overflow.
pub(crate) fn add_scaled_expr(
    builder: &mut LinearConstraintBuilder,
    expr: &TermExpr,
    coeff: i64,
) -> bool {
    for slot in 0..2 {
        if expr.coeffs[slot] != 0 {
            // Unit expression coefficients: the product is +-coeff.
            let signed = if expr.coeffs[slot] > 0 {
                coeff
            } else {
                match coeff.checked_neg() {
                    Some(n) => n,
                    None => return false,
                }
            };
            builder.add_term(expr.vars[slot], signed);
        }
    }
    builder.add_scaled_constant(expr.offset, coeff);
    true
}
