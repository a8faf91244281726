//! Folding constraints through variable symmetry orbits.
//!
//! When the model is invariant under a permutation group, every image of a
//! valid row under the group is also valid, and so is their average. For a
//! variable orbit with sum variable `s = sum(members)`, averaging turns any
//! row touching the orbit into one representative row over `s`. The whole
//! row is scaled by the lcm of the orbit sizes so averaged coefficients
//! stay integral; a coefficient sum the orbit size does not divide is
//! rounded toward the weak side, which is only possible for rows with a
//! single finite bound.

use std::collections::HashMap;

use log::warn;
use thiserror::Error;

use cutix_core::arith;
use cutix_core::constraint::{NO_LOWER_BOUND, NO_UPPER_BOUND};
use cutix_core::{LinearConstraint, VarId};

/// Rejected orbit layouts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrbitError {
    #[error("orbit needs at least two members")]
    OrbitTooSmall,

    #[error("variable {0} appears in more than one orbit role")]
    OverlappingOrbits(VarId),

    #[error("lcm of orbit sizes overflows")]
    ScaleOverflow,
}

/// One variable orbit and the variable holding the sum of its members.
#[derive(Debug, Clone)]
pub struct Orbit {
    pub members: Vec<VarId>,
    pub sum_var: VarId,
}

/// A partition of (part of) the variables into orbits, read-only once
/// built. Orbit members are assumed nonnegative, which is what makes the
/// rounded folds below one-directional weakenings.
#[derive(Debug, Clone)]
pub struct SymmetryOrbits {
    orbits: Vec<Orbit>,
    orbit_of: HashMap<VarId, usize>,
    /// lcm of all orbit sizes; every folded row is scaled by this.
    scale: i64,
}

impl SymmetryOrbits {
    pub fn new(orbits: Vec<Orbit>) -> Result<Self, OrbitError> {
        let mut orbit_of = HashMap::new();
        let mut scale: u64 = 1;
        for (index, orbit) in orbits.iter().enumerate() {
            if orbit.members.len() < 2 {
                return Err(OrbitError::OrbitTooSmall);
            }
            for &member in &orbit.members {
                if orbit_of.insert(member, index).is_some() {
                    return Err(OrbitError::OverlappingOrbits(member));
                }
            }
            scale = arith::checked_lcm(scale, orbit.members.len() as u64)
                .ok_or(OrbitError::ScaleOverflow)?;
        }
        // Sum variables must stay plain variables.
        for orbit in &orbits {
            if orbit_of.contains_key(&orbit.sum_var) {
                return Err(OrbitError::OverlappingOrbits(orbit.sum_var));
            }
        }
        let scale = i64::try_from(scale).map_err(|_| OrbitError::ScaleOverflow)?;
        Ok(SymmetryOrbits {
            orbits,
            orbit_of,
            scale,
        })
    }

    pub fn num_orbits(&self) -> usize {
        self.orbits.len()
    }

    /// The common scaling factor applied to every folded row.
    pub fn scale(&self) -> i64 {
        self.scale
    }

    fn orbit_of(&self, var: VarId) -> Option<usize> {
        self.orbit_of.get(&var).copied()
    }
}

/// Statistics for constraint folding.
#[derive(Debug, Default, Clone)]
pub struct SymmetrizerStats {
    /// Rows rewritten onto orbit sum variables.
    pub folded: u64,

    /// Rows returned unchanged because they touch no orbit.
    pub untouched: u64,

    /// Rows dropped because a scaled coefficient or bound left 64 bits.
    pub dropped_overflow: u64,

    /// Two-sided rows dropped because an orbit coefficient sum was not
    /// divisible by the orbit size, so neither rounding direction is safe.
    pub dropped_two_sided: u64,
}

/// Rewrites rows onto orbit sum variables so that a permutation-symmetric
/// family of constraints collapses into one representative.
pub struct LinearConstraintSymmetrizer {
    orbits: SymmetryOrbits,
    stats: SymmetrizerStats,
}

impl LinearConstraintSymmetrizer {
    pub fn new(orbits: SymmetryOrbits) -> Self {
        Self {
            orbits,
            stats: SymmetrizerStats::default(),
        }
    }

    pub fn orbits(&self) -> &SymmetryOrbits {
        &self.orbits
    }

    /// Get folding statistics.
    pub fn stats(&self) -> &SymmetrizerStats {
        &self.stats
    }

    /// Folds `ct` in place. Returns false when the row had to be dropped
    /// (scaling overflow, or a non-divisible orbit sum on a two-sided
    /// row); the row is left untouched in that case and the caller must
    /// not use it.
    pub fn fold(&mut self, ct: &mut LinearConstraint) -> bool {
        let scale = self.orbits.scale;

        // Split terms into orbit contributions and fixed points.
        let mut orbit_sums: Vec<(usize, i128)> = Vec::new();
        let mut folded: Vec<(VarId, i128)> = Vec::new();
        for (&var, &coeff) in ct.vars.iter().zip(&ct.coeffs) {
            match self.orbits.orbit_of(var) {
                Some(orbit) => match orbit_sums.iter_mut().find(|(o, _)| *o == orbit) {
                    Some((_, sum)) => *sum += coeff as i128,
                    None => orbit_sums.push((orbit, coeff as i128)),
                },
                None => folded.push((var, coeff as i128 * scale as i128)),
            }
        }
        if orbit_sums.is_empty() {
            self.stats.untouched += 1;
            return true;
        }

        let two_sided = ct.has_lower_bound() && ct.has_upper_bound();
        for &(orbit, sum) in &orbit_sums {
            let size = self.orbits.orbits[orbit].members.len() as i64;
            let coeff = if sum.rem_euclid(size as i128) == 0 {
                (sum / size as i128) * scale as i128
            } else if two_sided {
                self.stats.dropped_two_sided += 1;
                warn!("symmetry fold dropped two-sided row: {ct}");
                return false;
            } else if ct.has_upper_bound() {
                // Shrinking a coefficient of the nonnegative sum variable
                // weakens an upper-bounded row, never invalidates it.
                arith::floor_ratio_i128(sum, size) * scale as i128
            } else {
                arith::ceil_ratio_i128(sum, size) * scale as i128
            };
            if coeff != 0 {
                folded.push((self.orbits.orbits[orbit].sum_var, coeff));
            }
        }

        // The row may already mention a sum variable; merge after sorting.
        folded.sort_by_key(|&(var, _)| var);
        let mut vars: Vec<VarId> = Vec::with_capacity(folded.len());
        let mut coeffs: Vec<i64> = Vec::with_capacity(folded.len());
        let mut i = 0;
        while i < folded.len() {
            let var = folded[i].0;
            let mut sum: i128 = 0;
            while i < folded.len() && folded[i].0 == var {
                sum += folded[i].1;
                i += 1;
            }
            if sum != 0 {
                let Ok(coeff) = i64::try_from(sum) else {
                    self.stats.dropped_overflow += 1;
                    warn!("symmetry fold dropped row on coefficient overflow: {ct}");
                    return false;
                };
                vars.push(var);
                coeffs.push(coeff);
            }
        }

        let Some((lb, ub)) = scale_bounds(ct, scale) else {
            self.stats.dropped_overflow += 1;
            warn!("symmetry fold dropped row on bound overflow: {ct}");
            return false;
        };

        ct.vars = vars;
        ct.coeffs = coeffs;
        ct.lb = lb;
        ct.ub = ub;
        reduce_content(ct, scale);
        self.stats.folded += 1;
        true
    }
}

/// Multiplies finite bounds by the orbit scale, keeping absent bounds
/// absent. None when a product leaves the 64-bit range.
fn scale_bounds(ct: &LinearConstraint, scale: i64) -> Option<(i64, i64)> {
    let lb = if ct.has_lower_bound() {
        i64::try_from(ct.lb as i128 * scale as i128).ok()?
    } else {
        NO_LOWER_BOUND
    };
    let ub = if ct.has_upper_bound() {
        i64::try_from(ct.ub as i128 * scale as i128).ok()?
    } else {
        NO_UPPER_BOUND
    };
    Some((lb, ub))
}

/// Divides out the coefficient content, except for the part carried by the
/// deliberate orbit scaling, so folds of identical symmetric rows stay
/// byte-identical across calls.
fn reduce_content(ct: &mut LinearConstraint, scale: i64) {
    let content = ct
        .coeffs
        .iter()
        .fold(0u64, |g, &c| arith::gcd(g, c.unsigned_abs()));
    if content <= 1 {
        return;
    }
    let divisor = (content / arith::gcd(content, scale as u64)) as i64;
    if divisor <= 1 {
        return;
    }
    for c in &mut ct.coeffs {
        *c /= divisor;
    }
    if ct.has_lower_bound() {
        ct.lb = arith::ceil_ratio(ct.lb, divisor);
    }
    if ct.has_upper_bound() {
        ct.ub = arith::floor_ratio(ct.ub, divisor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_row(lb: i64, ub: i64, terms: &[(VarId, i64)]) -> LinearConstraint {
        let vars = terms.iter().map(|&(v, _)| v).collect();
        let coeffs = terms.iter().map(|&(_, c)| c).collect();
        LinearConstraint::new(lb, ub, vars, coeffs)
    }

    fn pair_orbit() -> LinearConstraintSymmetrizer {
        let orbits = SymmetryOrbits::new(vec![Orbit {
            members: vec![0, 1],
            sum_var: 3,
        }])
        .unwrap();
        LinearConstraintSymmetrizer::new(orbits)
    }

    #[test]
    fn test_fold_rounds_down_on_upper_bounded_row() {
        // Orbit {x0, x1} with sum s = x3: 2 x0 + x1 + 3 x2 <= 10 averages
        // to (3/2) s + 3 x2 <= 10, scaled by 2 and floored to 2s + 6x2 <= 20.
        let mut row = make_row(NO_LOWER_BOUND, 10, &[(0, 2), (1, 1), (2, 3)]);
        let mut symmetrizer = pair_orbit();
        assert!(symmetrizer.fold(&mut row));
        assert_eq!(row.vars, vec![2, 3]);
        assert_eq!(row.coeffs, vec![6, 2]);
        assert_eq!(row.ub, 20);
        assert!(!row.has_lower_bound());
        assert_eq!(symmetrizer.stats().folded, 1);
    }

    #[test]
    fn test_fold_exact_when_divisible() {
        let mut row = make_row(NO_LOWER_BOUND, 7, &[(0, 1), (1, 1)]);
        let mut symmetrizer = pair_orbit();
        assert!(symmetrizer.fold(&mut row));
        assert_eq!(row.vars, vec![3]);
        assert_eq!(row.coeffs, vec![2]);
        assert_eq!(row.ub, 14);
    }

    #[test]
    fn test_fold_rounds_up_on_lower_bounded_row() {
        // 2 x0 + x1 >= 5 averages to (3/2) s >= 5; growing the coefficient
        // of a nonnegative variable keeps a lower-bounded row valid.
        let mut row = make_row(5, NO_UPPER_BOUND, &[(0, 2), (1, 1)]);
        let mut symmetrizer = pair_orbit();
        assert!(symmetrizer.fold(&mut row));
        // 4s >= 10, with the content beyond the orbit scale divided out.
        assert_eq!(row.vars, vec![3]);
        assert_eq!(row.coeffs, vec![2]);
        assert_eq!(row.lb, 5);
        assert!(!row.has_upper_bound());
    }

    #[test]
    fn test_fold_drops_two_sided_when_not_divisible() {
        let mut row = make_row(0, 10, &[(0, 2), (1, 1)]);
        let original = row.clone();
        let mut symmetrizer = pair_orbit();
        assert!(!symmetrizer.fold(&mut row));
        assert_eq!(row, original);
        assert_eq!(symmetrizer.stats().dropped_two_sided, 1);
    }

    #[test]
    fn test_fold_drops_on_overflow() {
        let mut row = make_row(NO_LOWER_BOUND, 10, &[(0, 1), (1, 1), (2, i64::MAX)]);
        let mut symmetrizer = pair_orbit();
        assert!(!symmetrizer.fold(&mut row));
        assert_eq!(symmetrizer.stats().dropped_overflow, 1);
    }

    #[test]
    fn test_rows_without_orbit_variables_pass_through() {
        let mut row = make_row(NO_LOWER_BOUND, 4, &[(2, 5)]);
        let original = row.clone();
        let mut symmetrizer = pair_orbit();
        assert!(symmetrizer.fold(&mut row));
        assert_eq!(row, original);
        assert_eq!(symmetrizer.stats().untouched, 1);
    }

    #[test]
    fn test_fold_merges_explicit_sum_variable() {
        // A row already naming the sum variable merges with the folded
        // orbit contribution: x0 + x1 + x3 <= 4 with s = x3 averages to
        // 2s <= 4, scaled to 4s <= 8 and reduced back to 2s <= 4.
        let mut row = make_row(NO_LOWER_BOUND, 4, &[(0, 1), (1, 1), (3, 1)]);
        let mut symmetrizer = pair_orbit();
        assert!(symmetrizer.fold(&mut row));
        assert_eq!(row.vars, vec![3]);
        assert_eq!(row.coeffs, vec![2]);
        assert_eq!(row.ub, 4);
    }

    #[test]
    fn test_fold_can_cancel_every_term() {
        let mut row = make_row(NO_LOWER_BOUND, 9, &[(0, 1), (1, -1)]);
        let mut symmetrizer = pair_orbit();
        assert!(symmetrizer.fold(&mut row));
        assert!(row.is_empty());
        assert_eq!(row.ub, 18);
    }

    #[test]
    fn test_orbit_validation() {
        assert_eq!(
            SymmetryOrbits::new(vec![Orbit {
                members: vec![0],
                sum_var: 1,
            }])
            .unwrap_err(),
            OrbitError::OrbitTooSmall
        );
        assert_eq!(
            SymmetryOrbits::new(vec![
                Orbit {
                    members: vec![0, 1],
                    sum_var: 4,
                },
                Orbit {
                    members: vec![1, 2],
                    sum_var: 5,
                },
            ])
            .unwrap_err(),
            OrbitError::OverlappingOrbits(1)
        );
        assert_eq!(
            SymmetryOrbits::new(vec![Orbit {
                members: vec![0, 1],
                sum_var: 1,
            }])
            .unwrap_err(),
            OrbitError::OverlappingOrbits(1)
        );
    }

    #[test]
    fn test_scale_is_lcm_of_orbit_sizes() {
        let orbits = SymmetryOrbits::new(vec![
            Orbit {
                members: vec![0, 1],
                sum_var: 6,
            },
            Orbit {
                members: vec![2, 3, 4],
                sum_var: 7,
            },
        ])
        .unwrap();
        assert_eq!(orbits.scale(), 6);
        assert_eq!(orbits.num_orbits(), 2);
    }
}
