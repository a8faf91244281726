//! Boolean RLT cuts: multiplying a row by a literal.
//!
//! For an all-Boolean row `sum(c_i * x_i) <= u` and a literal `b`, the
//! bilinear inequality `sum(c_i * x_i * b) <= u * b` also holds. Each
//! product `x_i * b` is then replaced by a linear bound valid for every
//! 0/1 assignment: an exact product variable when the surrounding solver
//! knows one, the McCormick bound `x + b - 1`, one of the two factors, or
//! zero, whichever keeps the linearized row tightest at the LP point. The
//! factor maximizing the resulting efficacy wins.

use log::debug;

use crate::constraint::VarId;
use crate::cut::{CutData, CutTerm, TermExpr, RELEVANT_LP_THRESHOLD};

/// A Boolean literal: a variable or its negation.
pub type Literal = (VarId, bool);

/// Source of exact literal products, typically fed by ternary clauses of
/// the surrounding model.
pub trait ProductSource {
    /// The 0/1 variable equal to `a * b`, when one exists.
    fn product(&self, a: Literal, b: Literal) -> Option<VarId>;
}

/// A source that knows no products; only McCormick bounds apply.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProducts;

impl ProductSource for NoProducts {
    fn product(&self, _a: Literal, _b: Literal) -> Option<VarId> {
        None
    }
}

/// RLT cut settings.
#[derive(Debug, Clone)]
pub struct RltOptions {
    /// Factors with an LP value below this are not worth multiplying by.
    pub min_factor_lp: f64,

    /// Factors tried per base row.
    pub max_factors: usize,
}

impl Default for RltOptions {
    fn default() -> Self {
        Self {
            min_factor_lp: RELEVANT_LP_THRESHOLD,
            max_factors: 32,
        }
    }
}

/// Statistics for RLT cut generation.
#[derive(Debug, Default, Clone)]
pub struct RltStats {
    /// Cuts successfully built.
    pub cuts_generated: u64,

    /// Factors evaluated across all calls.
    pub factors_tried: u64,

    /// Product terms linearized through an exact product variable.
    pub exact_products_used: u64,

    /// Calls rejected because the row was not a plain literal sum.
    pub aborted_unsupported: u64,

    /// Calls where no factor produced a violated cut.
    pub aborted_weak: u64,
}

/// RLT cut generator over Boolean rows.
pub struct BoolRltCutHelper {
    settings: RltOptions,
    cut: CutData,
    scratch: CutData,
    /// Base row with every term on the smaller-LP side of its range.
    normalized: CutData,
    stats: RltStats,
}

impl BoolRltCutHelper {
    pub fn new(settings: RltOptions) -> Self {
        Self {
            settings,
            cut: CutData::default(),
            scratch: CutData::default(),
            normalized: CutData::default(),
            stats: RltStats::default(),
        }
    }

    /// The cut produced by the last successful [`try_multiply`] call.
    ///
    /// [`try_multiply`]: BoolRltCutHelper::try_multiply
    pub fn cut(&self) -> &CutData {
        &self.cut
    }

    /// Get generation statistics.
    pub fn stats(&self) -> &RltStats {
        &self.stats
    }

    /// Reset statistics.
    pub fn reset_stats(&mut self) {
        self.stats = RltStats::default();
    }

    /// Multiplies `base` by each candidate factor in turn and keeps the
    /// most efficacious violated linearization, if any. Terms whose LP
    /// value sits in the upper half of their range are complemented first,
    /// so each product is bounded from the side nearest the LP point.
    pub fn try_multiply(
        &mut self,
        base: &CutData,
        factors: &[Literal],
        source: &dyn ProductSource,
        lp_values: &[f64],
    ) -> bool {
        self.normalized.clone_from(base);
        self.normalized.complement_for_smaller_lp_values();

        // Every term must be a literal with a known variable; rows that
        // went through implied-bound substitution are not multiplied.
        let mut literals = Vec::with_capacity(self.normalized.terms.len());
        for term in &self.normalized.terms {
            match term_literal(term) {
                Some(lit) => literals.push(lit),
                None => {
                    self.stats.aborted_unsupported += 1;
                    return false;
                }
            }
        }
        let Some(rhs64) = self.normalized.rhs_as_i64() else {
            self.stats.aborted_unsupported += 1;
            return false;
        };

        let mut best_efficacy = 0.0;
        let mut found = false;
        for &factor in factors.iter().take(self.settings.max_factors) {
            let factor_lp = literal_lp(factor, lp_values);
            if factor_lp < self.settings.min_factor_lp {
                continue;
            }
            self.stats.factors_tried += 1;
            let Some(exact_used) = linearize(
                &mut self.scratch,
                &self.normalized,
                &literals,
                rhs64,
                factor,
                factor_lp,
                source,
                lp_values,
            ) else {
                continue;
            };
            self.stats.exact_products_used += u64::from(exact_used);
            let efficacy = self.scratch.efficacy();
            if self.scratch.violation() > 0.0 && efficacy > best_efficacy {
                best_efficacy = efficacy;
                std::mem::swap(&mut self.cut, &mut self.scratch);
                found = true;
            }
        }

        if !found {
            self.stats.aborted_weak += 1;
            return false;
        }
        self.stats.cuts_generated += 1;
        debug!(
            "rlt cut: {} terms, efficacy {:.3e}",
            self.cut.terms.len(),
            best_efficacy
        );
        true
    }

}

/// Builds `sum(c_i * bound(x_i * b)) - u * b <= sum(constants)` into
/// `scratch`, returning how many product terms used an exact product
/// variable. None when a coefficient operation would overflow.
#[allow(clippy::too_many_arguments)]
fn linearize(
    scratch: &mut CutData,
    base: &CutData,
    literals: &[Literal],
    rhs64: i64,
    factor: Literal,
    factor_lp: f64,
    source: &dyn ProductSource,
    lp_values: &[f64],
) -> Option<u32> {
    scratch.clear();
    let mut exact_used = 0;
    for (term, &lit) in base.terms.iter().zip(literals) {
        let coeff = term.coeff;
        // A term sharing the factor's variable multiplies exactly.
        if lit.0 == factor.0 {
            if lit.1 == factor.1 {
                push_literal(scratch, coeff, lit, lp_values);
            }
            // The opposite literal times the factor is zero.
            continue;
        }
        let product = source.product(lit, factor);
        let lit_lp = literal_lp(lit, lp_values);
        let mccormick_lp = lit_lp + factor_lp - 1.0;
        if coeff > 0 {
            // Need a lower bound on the product: zero, McCormick, or
            // the exact product, whichever sits highest at the LP.
            let exact = product.filter(|&p| lp_values[p] >= mccormick_lp.max(0.0));
            if let Some(p) = exact {
                push_term(scratch, coeff, TermExpr::from_var(p), lp_values[p]);
                exact_used += 1;
            } else if mccormick_lp > 0.0 {
                // x + b - 1: the constant moves to the rhs.
                push_literal(scratch, coeff, lit, lp_values);
                push_literal(scratch, coeff, factor, lp_values);
                scratch.rhs += coeff as i128;
            }
        } else {
            // Need an upper bound: the exact product, or the smaller
            // of the two factors at the LP.
            let exact = product.filter(|&p| lp_values[p] <= lit_lp.min(factor_lp));
            if let Some(p) = exact {
                push_term(scratch, coeff, TermExpr::from_var(p), lp_values[p]);
                exact_used += 1;
            } else if lit_lp <= factor_lp {
                push_literal(scratch, coeff, lit, lp_values);
            } else {
                push_literal(scratch, coeff, factor, lp_values);
            }
        }
    }

    // The multiplied rhs `u * b` joins the left side as `-u * b`.
    let negated_rhs = rhs64.checked_neg()?;
    if negated_rhs != 0 {
        push_literal(scratch, negated_rhs, factor, lp_values);
    }
    scratch.merge_identical_exprs();
    Some(exact_used)
}

/// `Some((var, positive))` when the term is a plain literal.
fn term_literal(term: &CutTerm) -> Option<Literal> {
    if !term.is_boolean() {
        return None;
    }
    match term.expr.as_simple_var() {
        Some((var, true, 0)) => Some((var, true)),
        Some((var, false, 1)) => Some((var, false)),
        _ => None,
    }
}

fn literal_lp(lit: Literal, lp_values: &[f64]) -> f64 {
    if lit.1 {
        lp_values[lit.0]
    } else {
        1.0 - lp_values[lit.0]
    }
}

fn push_literal(cut: &mut CutData, coeff: i64, lit: Literal, lp_values: &[f64]) {
    let expr = if lit.1 {
        TermExpr::literal(lit.0)
    } else {
        TermExpr::negated_literal(lit.0)
    };
    push_term(cut, coeff, expr, literal_lp(lit, lp_values));
}

fn push_term(cut: &mut CutData, coeff: i64, expr: TermExpr, lp_value: f64) {
    cut.terms.push(CutTerm {
        coeff,
        expr,
        bound_diff: 1,
        lp_value: lp_value.clamp(0.0, 1.0),
        cached_implied_lb: None,
        cached_implied_ub: None,
    });
}
