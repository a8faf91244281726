//! Property-based soundness tests for the cut generators.
//!
//! Uses proptest to verify, over randomized knapsack rows:
//! - Every emitted rounding cut holds at every integer point of the
//!   variable box that satisfies the base row
//! - The same for simple cover, single-node-flow and Letchford-Souli cuts
//! - RLT linearizations hold wherever the product variables are consistent
//! - The emitted `LinearConstraint` agrees with the derivation form on
//!   every integer point

use cutix_core::rlt::Literal;
use cutix_core::{
    BoolRltCutHelper, BoundTable, CoverCutHelper, CoverOptions, CutData, IntegerRoundingCutHelper,
    LinearConstraint, NoLimit, ProductSource, RltOptions, RoundingOptions, VarId,
};
use proptest::prelude::*;

// ============================================================================
// Generators for base rows
// ============================================================================

/// A knapsack row `sum(coeffs[i] * x_i) <= rhs` with `x_i in [0, ubs[i]]`
/// and an LP point inside the feasible box.
#[derive(Debug, Clone)]
struct Knapsack {
    coeffs: Vec<i64>,
    ubs: Vec<i64>,
    rhs: i64,
    lp: Vec<f64>,
}

impl Knapsack {
    fn fill(&self, cut: &mut CutData) {
        let bounds = BoundTable::from_bounds(vec![0; self.ubs.len()], self.ubs.clone());
        let vars: Vec<VarId> = (0..self.coeffs.len()).collect();
        assert!(cut.fill_from_parallel_vectors(self.rhs, &vars, &self.coeffs, &self.lp, &bounds));
    }
}

fn knapsack_from_parts(
    coeffs: Vec<i64>,
    ubs: Vec<i64>,
    fracs: Vec<f64>,
    tightness: f64,
) -> Knapsack {
    let max_activity: i64 = coeffs.iter().zip(&ubs).map(|(c, u)| c * u).sum();
    let rhs = ((max_activity as f64 * tightness).floor() as i64).max(1);
    let mut lp: Vec<f64> = fracs.iter().zip(&ubs).map(|(f, &u)| f * u as f64).collect();
    let activity: f64 = coeffs.iter().zip(&lp).map(|(&c, &x)| c as f64 * x).sum();
    if activity > rhs as f64 {
        let scale = rhs as f64 / activity;
        for x in &mut lp {
            *x *= scale;
        }
    }
    Knapsack {
        coeffs,
        ubs,
        rhs,
        lp,
    }
}

/// Knapsack over small general-integer variables.
fn knapsack_strategy() -> impl Strategy<Value = Knapsack> {
    (2usize..=4)
        .prop_flat_map(|n| {
            (
                prop::collection::vec(1i64..=12, n),
                prop::collection::vec(1i64..=3, n),
                prop::collection::vec(0.0f64..1.0, n),
                0.3f64..0.95,
            )
        })
        .prop_map(|(coeffs, ubs, fracs, tightness)| {
            knapsack_from_parts(coeffs, ubs, fracs, tightness)
        })
}

/// Knapsack over Boolean variables only.
fn boolean_row_strategy() -> impl Strategy<Value = Knapsack> {
    (2usize..=5)
        .prop_flat_map(|n| {
            (
                prop::collection::vec(1i64..=12, n),
                prop::collection::vec(0.0f64..1.0, n),
                0.3f64..0.95,
            )
        })
        .prop_map(|(coeffs, fracs, tightness)| {
            let n = coeffs.len();
            knapsack_from_parts(coeffs, vec![1; n], fracs, tightness)
        })
}

// ============================================================================
// Integer-point enumeration
// ============================================================================

/// Advances `point` through the box `[0, ubs]` like an odometer; false
/// once every point has been visited.
fn next_point(point: &mut [i64], ubs: &[i64]) -> bool {
    for i in 0..point.len() {
        point[i] += 1;
        if point[i] <= ubs[i] {
            return true;
        }
        point[i] = 0;
    }
    false
}

/// First integer point satisfying the base row but violating the cut.
fn unsound_witness(cut: &CutData, base: &Knapsack) -> Option<Vec<i64>> {
    let mut point = vec![0i64; base.ubs.len()];
    loop {
        let activity: i64 = base.coeffs.iter().zip(&point).map(|(&c, &x)| c * x).sum();
        if activity <= base.rhs && !cut.holds_for(&point) {
            return Some(point);
        }
        if !next_point(&mut point, &base.ubs) {
            return None;
        }
    }
}

fn row_holds(row: &LinearConstraint, point: &[i64]) -> bool {
    let activity: i128 = row
        .vars
        .iter()
        .zip(&row.coeffs)
        .map(|(&v, &c)| c as i128 * point[v] as i128)
        .sum();
    activity <= row.ub as i128 && (!row.has_lower_bound() || activity >= row.lb as i128)
}

// ============================================================================
// Generator soundness
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: rounding cuts never cut off a feasible integer point.
    #[test]
    fn rounding_cuts_are_sound(base in knapsack_strategy()) {
        let mut data = CutData::default();
        base.fill(&mut data);
        let mut helper = IntegerRoundingCutHelper::new(RoundingOptions::default());
        if helper.compute_cut(&data, None, &mut NoLimit) {
            let witness = unsound_witness(helper.cut(), &base);
            prop_assert!(witness.is_none(), "cut violated at {:?}", witness);
        }
    }

    /// Property: the emitted row is the derivation form, point for point.
    #[test]
    fn rounding_cut_matches_emitted_row(base in knapsack_strategy()) {
        let mut data = CutData::default();
        base.fill(&mut data);
        let mut helper = IntegerRoundingCutHelper::new(RoundingOptions::default());
        if helper.compute_cut(&data, None, &mut NoLimit) {
            let row = helper.cut().to_linear_constraint().unwrap();
            let mut point = vec![0i64; base.ubs.len()];
            loop {
                prop_assert_eq!(
                    helper.cut().holds_for(&point),
                    row_holds(&row, &point),
                    "disagree at {:?}",
                    point
                );
                if !next_point(&mut point, &base.ubs) {
                    break;
                }
            }
        }
    }

    /// Property: simple cover cuts never cut off a feasible integer point.
    #[test]
    fn simple_cover_cuts_are_sound(base in knapsack_strategy()) {
        let mut data = CutData::default();
        base.fill(&mut data);
        let mut helper = CoverCutHelper::new(CoverOptions::default());
        if helper.try_simple_knapsack(&data, None) {
            let witness = unsound_witness(helper.cut(), &base);
            prop_assert!(witness.is_none(), "cut violated at {:?}", witness);
        }
    }

    /// Property: flow cover cuts never cut off a feasible integer point.
    #[test]
    fn flow_cover_cuts_are_sound(base in knapsack_strategy()) {
        let mut data = CutData::default();
        base.fill(&mut data);
        let mut helper = CoverCutHelper::new(CoverOptions::default());
        if helper.try_single_node_flow(&data, None) {
            let witness = unsound_witness(helper.cut(), &base);
            prop_assert!(witness.is_none(), "cut violated at {:?}", witness);
            // With the whole row complemented, the strengthening function
            // keeps every term; only the bumped one can drop to zero.
            prop_assert!(helper.cut().terms.len() + 1 >= base.coeffs.len());
        }
    }

    /// Property: lifted cover cuts never cut off a feasible Boolean point.
    #[test]
    fn lifted_cover_cuts_are_sound(base in boolean_row_strategy()) {
        let mut data = CutData::default();
        base.fill(&mut data);
        let mut helper = CoverCutHelper::new(CoverOptions::default());
        if helper.try_with_letchford_souli_lifting(&data) {
            let witness = unsound_witness(helper.cut(), &base);
            prop_assert!(witness.is_none(), "cut violated at {:?}", witness);
        }
    }
}

// ============================================================================
// RLT soundness
// ============================================================================

/// Product table pairing each base variable with the single factor.
struct FactorProducts {
    factor: VarId,
    num_base: usize,
}

impl ProductSource for FactorProducts {
    fn product(&self, a: Literal, b: Literal) -> Option<VarId> {
        let (x, y) = if a.0 == self.factor { (b, a) } else { (a, b) };
        if y == (self.factor, true) && x.1 && x.0 < self.num_base {
            Some(self.factor + 1 + x.0)
        } else {
            None
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: RLT cuts hold wherever every product variable equals the
    /// product of its literals and the base row is satisfied.
    #[test]
    fn rlt_cuts_are_sound(
        coeffs in prop::collection::vec(1i64..=8, 2..=3),
        lp in prop::collection::vec(0.0f64..1.0, 7),
        tightness in 0.3f64..0.95,
    ) {
        let n = coeffs.len();
        let max_activity: i64 = coeffs.iter().sum();
        let rhs = ((max_activity as f64 * tightness).floor() as i64).max(1);

        // Variables: 0..n base, n the factor, n+1.. the products.
        let bounds = BoundTable::uniform(2 * n + 1, 0, 1);
        let vars: Vec<VarId> = (0..n).collect();
        let mut data = CutData::default();
        prop_assert!(data.fill_from_parallel_vectors(rhs, &vars, &coeffs, &lp, &bounds));

        let products = FactorProducts { factor: n, num_base: n };
        let mut helper = BoolRltCutHelper::new(RltOptions::default());
        if helper.try_multiply(&data, &[(n, true)], &products, &lp) {
            for mask in 0u32..1 << (n + 1) {
                let mut point = vec![0i64; 2 * n + 1];
                for i in 0..=n {
                    point[i] = ((mask >> i) & 1) as i64;
                }
                for i in 0..n {
                    point[n + 1 + i] = point[i] * point[n];
                }
                let activity: i64 = coeffs.iter().zip(&point).map(|(&c, &x)| c * x).sum();
                if activity <= rhs {
                    prop_assert!(helper.cut().holds_for(&point), "violated at {:?}", point);
                }
            }
        }
    }
}
