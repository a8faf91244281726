//! Implied-bound substitution: rewriting integer terms over Booleans.
//!
//! An implied bound is a fact of the form "when literal B holds, x >= b"
//! (or "x <= b" on the other side). For a normalized term `T in [0, d]`
//! such a fact gives `T >= gain * B` with `0 < gain <= d`, and the exact
//! decomposition `T = gain * B + S` with slack `S >= 0`. Replacing a wide
//! integer term by a Boolean plus a slack makes the rounding and cover
//! machinery much more effective, since Booleans take the strongest
//! coefficients.
//!
//! Slacks get synthetic variable ids past the model range; the processor
//! remembers how each one expands and substitutes them back at emission.

use crate::constraint::{LinearConstraint, LinearConstraintBuilder, VarId};
use crate::cut::{add_scaled_expr, CutData, CutTerm, TermExpr};
use crate::error::{CutError, CutResult};
use crate::functions::SuperadditiveFn;

/// One implied-bound fact about a model variable. For the lower-bound side
/// the meaning is: when the literal (`bool_var` or its negation, per
/// `is_positive`) is true, `var >= bound`. On the upper-bound side, `var <=
/// bound`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImpliedBound {
    pub bool_var: VarId,
    pub is_positive: bool,
    pub bound: i64,
}

/// Best implied bounds the surrounding solver knows about. Entries must be
/// valid at level zero; anything weaker than the level-zero bound should be
/// reported as `None`.
pub trait ImpliedBoundSource {
    fn best_implied_lower_bound(&self, var: VarId) -> Option<ImpliedBound>;
    fn best_implied_upper_bound(&self, var: VarId) -> Option<ImpliedBound>;
}

/// A source with no implied bounds at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoImpliedBounds;

impl ImpliedBoundSource for NoImpliedBounds {
    fn best_implied_lower_bound(&self, _var: VarId) -> Option<ImpliedBound> {
        None
    }

    fn best_implied_upper_bound(&self, _var: VarId) -> Option<ImpliedBound> {
        None
    }
}

/// An implied bound translated to a term's frame: `T >= gain * literal`.
#[derive(Debug, Clone, Copy)]
struct CachedImpliedBound {
    literal: TermExpr,
    literal_lp: f64,
    gain: i64,
}

/// Expansion recipe for one synthetic slack: `slack = base - gain * literal`.
#[derive(Debug, Clone, Copy)]
struct SlackOrigin {
    base: TermExpr,
    literal: TermExpr,
    gain: i64,
}

#[derive(Debug, Default, Clone)]
pub struct ImpliedBoundStats {
    pub cached: u64,
    pub expansions: u64,
    pub lifted: u64,
    pub merged_literals: u64,
    pub overflow_skips: u64,
}

/// Caches implied-bound facts for the terms of one cut and performs the
/// Boolean decompositions. One processor serves one LP solution; rebuild it
/// when the LP point changes.
pub struct ImpliedBoundsProcessor<'a> {
    source: &'a dyn ImpliedBoundSource,
    lp_values: &'a [f64],
    cache: Vec<CachedImpliedBound>,
    /// First synthetic variable id; must be larger than every model var.
    first_slack: VarId,
    slack_origins: Vec<SlackOrigin>,
    stats: ImpliedBoundStats,
}

impl<'a> ImpliedBoundsProcessor<'a> {
    pub fn new(
        source: &'a dyn ImpliedBoundSource,
        lp_values: &'a [f64],
        first_slack: VarId,
    ) -> Self {
        debug_assert!(first_slack >= lp_values.len());
        ImpliedBoundsProcessor {
            source,
            lp_values,
            cache: Vec::new(),
            first_slack,
            slack_origins: Vec::new(),
            stats: ImpliedBoundStats::default(),
        }
    }

    pub fn stats(&self) -> &ImpliedBoundStats {
        &self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = ImpliedBoundStats::default();
    }

    /// Looks up implied bounds for every single-variable term of the cut
    /// and records them in the per-term cache slots. The `cached_implied_ub`
    /// slot holds the fact that becomes usable after complementing the term.
    pub fn cache_data_for_cut(&mut self, cut: &mut CutData) {
        for term in &mut cut.terms {
            if term.is_boolean() {
                continue;
            }
            let Some((var, positive, offset)) = term.expr.as_simple_var() else {
                continue;
            };
            if var >= self.first_slack {
                continue;
            }
            term.cached_implied_lb = self.cache_side(var, positive, offset, term.bound_diff);
            let Some(comp_offset) = term.bound_diff.checked_sub(offset) else {
                continue;
            };
            term.cached_implied_ub =
                self.cache_side(var, !positive, comp_offset, term.bound_diff);
        }
    }

    /// Caches `T >= gain * literal` for the orientation given by
    /// `positive` / `offset`: `T = var + offset` or `T = offset - var`.
    fn cache_side(
        &mut self,
        var: VarId,
        positive: bool,
        offset: i64,
        bound_diff: i64,
    ) -> Option<usize> {
        let (entry, gain) = if positive {
            let entry = self.source.best_implied_lower_bound(var)?;
            (entry, entry.bound.checked_add(offset)?)
        } else {
            let entry = self.source.best_implied_upper_bound(var)?;
            (entry, offset.checked_sub(entry.bound)?)
        };
        if gain <= 0 || gain > bound_diff {
            return None;
        }
        let (literal, raw_lp) = if entry.is_positive {
            (
                TermExpr::literal(entry.bool_var),
                self.lp_values[entry.bool_var],
            )
        } else {
            (
                TermExpr::negated_literal(entry.bool_var),
                1.0 - self.lp_values[entry.bool_var],
            )
        };
        self.cache.push(CachedImpliedBound {
            literal,
            literal_lp: raw_lp.clamp(0.0, 1.0),
            gain,
        });
        self.stats.cached += 1;
        Some(self.cache.len() - 1)
    }

    /// Decomposes every non-Boolean term that has a cached fact into
    /// `gain * literal + slack`. With `prefer_positive` set, a fact whose
    /// literal is positive wins over one that requires a negated literal.
    /// Returns the number of terms decomposed.
    pub fn try_expand_booleans(&mut self, cut: &mut CutData, prefer_positive: bool) -> u32 {
        let mut expanded = 0;
        for i in 0..cut.terms.len() {
            let term = cut.terms[i];
            if term.is_boolean() {
                continue;
            }
            let direct = term.cached_implied_lb.map(|idx| self.cache[idx]);
            let complemented = term.cached_implied_ub.map(|idx| self.cache[idx]);
            let use_complement = match (&direct, &complemented) {
                (None, None) => continue,
                (Some(_), None) => false,
                (None, Some(_)) => true,
                (Some(d), Some(c)) => {
                    let d_positive = d.literal.coeffs[0] > 0;
                    let c_positive = c.literal.coeffs[0] > 0;
                    if prefer_positive && d_positive != c_positive {
                        c_positive
                    } else {
                        c.gain as f64 * c.literal_lp > d.gain as f64 * d.literal_lp
                    }
                }
            };
            if use_complement {
                cut.terms[i].complement(&mut cut.rhs);
            }
            let term = cut.terms[i];
            let cached = match term.cached_implied_lb {
                Some(idx) => self.cache[idx],
                None => {
                    // Undo the complement; the other side had no fact.
                    if use_complement {
                        cut.terms[i].complement(&mut cut.rhs);
                    }
                    continue;
                }
            };
            match self.decompose(&term, &cached) {
                Some((boolean, slack, origin)) => {
                    self.slack_origins.push(origin);
                    cut.terms[i] = boolean;
                    cut.terms.push(slack);
                    expanded += 1;
                }
                None => {
                    self.stats.overflow_skips += 1;
                    if use_complement {
                        cut.terms[i].complement(&mut cut.rhs);
                    }
                }
            }
        }
        if expanded > 0 {
            self.stats.expansions += u64::from(expanded);
            self.stats.merged_literals += u64::from(cut.merge_identical_exprs());
        }
        expanded
    }

    /// Boolean-decomposes terms only where doing so increases the violation
    /// of the cut once `f` is applied. Called right before the final
    /// function application, when `f` is already chosen.
    pub fn expand_where_profitable<F: SuperadditiveFn>(
        &mut self,
        cut: &mut CutData,
        f: &F,
    ) -> u32 {
        let mut expanded = 0;
        for i in 0..cut.terms.len() {
            let term = cut.terms[i];
            if term.is_boolean() {
                continue;
            }
            let Some(cached) = term.cached_implied_lb.map(|idx| self.cache[idx]) else {
                continue;
            };
            let Some((boolean, slack, origin)) = self.decompose(&term, &cached) else {
                self.stats.overflow_skips += 1;
                continue;
            };
            let before = f.apply(term.coeff) as f64 * term.lp_value;
            let after = f.apply(boolean.coeff) as f64 * boolean.lp_value
                + f.apply(slack.coeff) as f64 * slack.lp_value;
            if after > before + 1e-9 {
                self.slack_origins.push(origin);
                cut.terms[i] = boolean;
                cut.terms.push(slack);
                expanded += 1;
            }
        }
        if expanded > 0 {
            self.stats.lifted += u64::from(expanded);
            self.stats.merged_literals += u64::from(cut.merge_identical_exprs());
        }
        expanded
    }

    /// `T = gain * literal + slack`. None when the Boolean coefficient
    /// overflows. The returned origin must be pushed onto `slack_origins`
    /// if and only if the decomposition is kept.
    fn decompose(
        &self,
        term: &CutTerm,
        cached: &CachedImpliedBound,
    ) -> Option<(CutTerm, CutTerm, SlackOrigin)> {
        let boolean_coeff = term.coeff.checked_mul(cached.gain)?;
        let slack_var = self.first_slack + self.slack_origins.len();
        let origin = SlackOrigin {
            base: term.expr,
            literal: cached.literal,
            gain: cached.gain,
        };
        let boolean = CutTerm {
            coeff: boolean_coeff,
            expr: cached.literal,
            bound_diff: 1,
            lp_value: cached.literal_lp,
            cached_implied_lb: None,
            cached_implied_ub: None,
        };
        let slack_lp = (term.lp_value - cached.gain as f64 * cached.literal_lp)
            .clamp(0.0, term.bound_diff as f64);
        let slack = CutTerm {
            coeff: term.coeff,
            expr: TermExpr::from_var(slack_var),
            // The slack stays within the original range; using it keeps
            // later complements valid.
            bound_diff: term.bound_diff,
            lp_value: slack_lp,
            cached_implied_lb: None,
            cached_implied_ub: None,
        };
        Some((boolean, slack, origin))
    }

    /// Emits a cut that may mention synthetic slacks, substituting each one
    /// by `base - gain * literal`.
    pub fn cut_to_constraint(&self, cut: &CutData) -> CutResult<LinearConstraint> {
        let mut builder = LinearConstraintBuilder::default();
        for term in &cut.terms {
            match term.expr.as_simple_var() {
                Some((var, positive, offset)) if var >= self.first_slack => {
                    let origin = self
                        .slack_origins
                        .get(var - self.first_slack)
                        .ok_or(CutError::Overflow)?;
                    // A complemented slack enters as `offset - S`; the sign
                    // rides on the substituted coefficient and the offset
                    // lands in the constant.
                    let slack_coeff = if positive {
                        term.coeff
                    } else {
                        term.coeff.checked_neg().ok_or(CutError::Overflow)?
                    };
                    if !add_scaled_expr(&mut builder, &origin.base, slack_coeff) {
                        return Err(CutError::Overflow);
                    }
                    let literal_coeff = slack_coeff
                        .checked_mul(origin.gain)
                        .and_then(i64::checked_neg)
                        .ok_or(CutError::Overflow)?;
                    if !add_scaled_expr(&mut builder, &origin.literal, literal_coeff) {
                        return Err(CutError::Overflow);
                    }
                    builder.add_scaled_constant(offset, term.coeff);
                }
                _ => {
                    if !add_scaled_expr(&mut builder, &term.expr, term.coeff) {
                        return Err(CutError::Overflow);
                    }
                }
            }
        }
        builder.build_upper_bounded(cut.rhs)
    }
}
