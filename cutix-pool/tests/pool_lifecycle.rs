//! End-to-end pool behavior: cuts produced by the generation helpers flow
//! through storage, LP selection, eviction and symmetry folding.
//!
//! Verified properties:
//!
//! - a generated cut that enters the pool stays sound on every integer
//!   point of the base row
//! - adding the same row twice never grows the pool
//! - one simplification pass reaches a fixed point

use cutix_core::constraint::NO_LOWER_BOUND;
use cutix_core::{
    BoundTable, CutData, IntegerRoundingCutHelper, LinearConstraint, NoLimit, RoundingOptions,
};
use cutix_pool::symmetry::Orbit;
use cutix_pool::{
    LinearConstraintManager, LinearConstraintSymmetrizer, ManagerSettings, RowStatus,
    SymmetryOrbits,
};
use proptest::prelude::*;

// =========================================================================
// Generation to LP round trip
// =========================================================================

#[test]
fn test_rounding_cut_flows_through_pool_and_eviction() {
    // 6 x0 + 4 x1 <= 9 on [0,2]^2 at the fractional point (1.5, 0).
    let bounds = BoundTable::from_bounds(vec![0, 0], vec![2, 2]);
    let lp = [1.5, 0.0];
    let mut base = CutData::default();
    assert!(base.fill_from_parallel_vectors(9, &[0, 1], &[6, 4], &lp, &bounds));

    let mut helper = IntegerRoundingCutHelper::new(RoundingOptions::default().with_max_scaling(2));
    assert!(helper.compute_cut(&base, None, &mut NoLimit));
    let row = helper.cut().to_linear_constraint().unwrap();

    // The cut must hold wherever the base row does.
    for x0 in 0..=2_i64 {
        for x1 in 0..=2_i64 {
            if 6 * x0 + 4 * x1 <= 9 {
                let point = [x0, x1];
                let activity: i64 = row
                    .vars
                    .iter()
                    .zip(&row.coeffs)
                    .map(|(&var, &coeff)| coeff * point[var])
                    .sum();
                assert!(activity <= row.ub);
            }
        }
    }

    let settings = ManagerSettings::default().with_max_consecutive_basic(1);
    let mut manager = LinearConstraintManager::new(2, settings);
    assert!(manager.add_cut(row, "rounding", &lp, &bounds));
    assert_eq!(manager.stats().cuts_by_source.get("rounding"), Some(&1));

    // The violated cut moves into the LP on the next rescoring pass.
    assert!(manager.change_lp(&lp, &[], &bounds, &mut NoLimit));
    assert_eq!(manager.lp_rows().len(), 1);

    // Once the point is integral the row idles in the basis and leaves.
    let satisfied = [0.0, 0.0];
    let basic = [RowStatus::Basic];
    assert!(!manager.change_lp(&satisfied, &basic, &bounds, &mut NoLimit));
    assert!(manager.change_lp(&satisfied, &basic, &bounds, &mut NoLimit));
    assert!(manager.lp_rows().is_empty());
    assert_eq!(manager.stats().evicted_rows, 1);
}

// =========================================================================
// Symmetry folding on the way into the pool
// =========================================================================

#[test]
fn test_fold_applies_before_storage_and_deduplicates() {
    // x0 and x1 are interchangeable; x3 is their sum.
    let orbits = SymmetryOrbits::new(vec![Orbit {
        members: vec![0, 1],
        sum_var: 3,
    }])
    .unwrap();
    let mut manager = LinearConstraintManager::new(4, ManagerSettings::default())
        .with_symmetrizer(LinearConstraintSymmetrizer::new(orbits));

    // 2 x0 + x1 + 3 x2 <= 10 averages to coefficient 3/2 on the orbit,
    // which rounds down to 2 s + 6 x2 <= 20 at scale 2.
    let row = LinearConstraint::new(NO_LOWER_BOUND, 10, vec![0, 1, 2], vec![2, 1, 3]);
    let (index, added) = manager.add(row).unwrap();
    assert!(added);
    let stored = manager.constraint(index);
    assert_eq!(stored.vars, vec![2, 3]);
    assert_eq!(stored.coeffs, vec![6, 2]);
    assert_eq!(stored.ub, 20);

    // Swapping the orbit coefficients folds to the same row.
    let swapped = LinearConstraint::new(NO_LOWER_BOUND, 10, vec![0, 1, 2], vec![1, 2, 3]);
    assert_eq!(manager.add(swapped), Some((index, false)));
    assert_eq!(manager.num_constraints(), 1);
    assert_eq!(manager.stats().merged, 1);
    assert_eq!(manager.symmetrizer().unwrap().stats().folded, 2);
}

// =========================================================================
// Pool properties
// =========================================================================

fn row_strategy() -> impl Strategy<Value = LinearConstraint> {
    (
        proptest::collection::vec((0usize..6, -9i64..=9), 1..5),
        -20i64..=20,
    )
        .prop_map(|(terms, ub)| {
            let vars = terms.iter().map(|&(v, _)| v).collect();
            let coeffs = terms.iter().map(|&(_, c)| c).collect();
            LinearConstraint::new(NO_LOWER_BOUND, ub, vars, coeffs)
        })
}

fn table_strategy() -> impl Strategy<Value = BoundTable> {
    proptest::collection::vec((-5i64..=5, 0i64..=6), 6).prop_map(|spans| {
        let lbs: Vec<i64> = spans.iter().map(|&(lb, _)| lb).collect();
        let ubs: Vec<i64> = spans.iter().map(|&(lb, width)| lb + width).collect();
        BoundTable::from_bounds(lbs, ubs)
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn adding_a_row_twice_stores_it_once(row in row_strategy()) {
        let mut manager = LinearConstraintManager::new(6, ManagerSettings::default());
        let first = manager.add(row.clone());
        let second = manager.add(row);
        match first {
            Some((index, true)) => {
                prop_assert_eq!(second, Some((index, false)));
                prop_assert_eq!(manager.num_constraints(), 1);
                prop_assert_eq!(manager.stats().merged, 1);
            }
            Some((_, false)) => prop_assert!(false, "first insert cannot merge"),
            None => {
                // The row canonicalized away entirely.
                prop_assert_eq!(second, None);
                prop_assert_eq!(manager.num_constraints(), 0);
            }
        }
    }

    #[test]
    fn simplification_reaches_a_fixed_point_in_one_pass(
        row in row_strategy(),
        bounds in table_strategy(),
    ) {
        let mut manager = LinearConstraintManager::new(6, ManagerSettings::default());
        if let Some((index, _)) = manager.add(row) {
            manager.simplify_constraint(index, &bounds);
            prop_assert!(!manager.simplify_constraint(index, &bounds));
        }
    }
}
