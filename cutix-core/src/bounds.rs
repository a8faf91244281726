//! Level-zero (search root) variable bounds.

use crate::constraint::VarId;

/// Read access to the bounds every cut must remain valid under.
///
/// Bounds may only tighten over the lifetime of a solve, and `revision`
/// must increase whenever any bound changes, so consumers can cache work
/// keyed on the revision number.
pub trait LevelZeroBounds {
    fn lower_bound(&self, var: VarId) -> i64;
    fn upper_bound(&self, var: VarId) -> i64;

    /// Monotonically increasing counter, bumped on every tightening.
    fn revision(&self) -> u64;

    fn is_fixed(&self, var: VarId) -> bool {
        self.lower_bound(var) == self.upper_bound(var)
    }
}

/// Dense bound storage, the usual implementation outside of solver
/// integrations that already track bounds elsewhere.
#[derive(Debug, Clone)]
pub struct BoundTable {
    lower: Vec<i64>,
    upper: Vec<i64>,
    revision: u64,
}

impl BoundTable {
    /// All variables get the same initial domain.
    pub fn uniform(num_vars: usize, lb: i64, ub: i64) -> Self {
        assert!(lb <= ub, "empty initial domain");
        BoundTable {
            lower: vec![lb; num_vars],
            upper: vec![ub; num_vars],
            revision: 0,
        }
    }

    pub fn from_bounds(lower: Vec<i64>, upper: Vec<i64>) -> Self {
        assert_eq!(lower.len(), upper.len());
        debug_assert!(lower.iter().zip(&upper).all(|(l, u)| l <= u));
        BoundTable {
            lower,
            upper,
            revision: 0,
        }
    }

    pub fn num_vars(&self) -> usize {
        self.lower.len()
    }

    /// Tightens the domain of `var`. Loosening is a caller bug.
    pub fn set_bounds(&mut self, var: VarId, lb: i64, ub: i64) {
        assert!(lb <= ub, "empty domain for variable {var}");
        if lb != self.lower[var] || ub != self.upper[var] {
            self.lower[var] = lb;
            self.upper[var] = ub;
            self.revision += 1;
        }
    }

    pub fn fix(&mut self, var: VarId, value: i64) {
        self.set_bounds(var, value, value);
    }
}

impl LevelZeroBounds for BoundTable {
    fn lower_bound(&self, var: VarId) -> i64 {
        self.lower[var]
    }

    fn upper_bound(&self, var: VarId) -> i64 {
        self.upper[var]
    }

    fn revision(&self) -> u64 {
        self.revision
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_revision_bumps_on_change_only() {
        let mut bounds = BoundTable::uniform(3, 0, 10);
        assert_eq!(bounds.revision(), 0);
        bounds.set_bounds(1, 0, 5);
        assert_eq!(bounds.revision(), 1);
        bounds.set_bounds(1, 0, 5);
        assert_eq!(bounds.revision(), 1);
        bounds.fix(2, 4);
        assert_eq!(bounds.revision(), 2);
        assert!(bounds.is_fixed(2));
        assert!(!bounds.is_fixed(0));
    }
}
