//! Cutix-core: cutting plane generation for mixed integer programming
//!
//! This library derives valid linear inequalities (cuts) that separate a
//! fractional LP relaxation point from the integer hull. It provides:
//!
//! - **Integer rounding (MIR) cuts**: divisor search plus a family of
//!   superadditive rounding functions
//! - **Knapsack cover cuts**: simple covers, single-node-flow
//!   strengthening, and Letchford-Souli sequential lifting
//! - **Boolean RLT cuts**: multiplying a row by a literal and linearizing
//!   the products
//! - **Implied-bound strengthening**: substituting `b => x <= value`
//!   facts into any of the above
//!
//! # Derivation model
//!
//! Every generator works on [`cut::CutData`], a row rewritten as
//! `sum(coeff * expr) <= rhs` where each `expr` has been shifted into
//! `[0, bound_diff]`. Nonnegative expressions are what make termwise
//! application of a superadditive function sound, and the 128-bit rhs
//! absorbs the bound shifts without overflow. Generators give up (return
//! `false`) rather than emit a weak or unsound cut; every abort is
//! counted in per-generator statistics.
//!
//! # Example
//!
//! ```ignore
//! use cutix_core::{BoundTable, CutData, IntegerRoundingCutHelper, RoundingOptions};
//! use cutix_core::limit::NoLimit;
//!
//! // 6 x0 + 4 x1 <= 9 with x0, x1 in [0, 2], LP point (1.5, 0).
//! let bounds = BoundTable::uniform(2, 0, 2);
//! let mut base = CutData::default();
//! base.fill_from_parallel_vectors(9, &[0, 1], &[6, 4], &[1.5, 0.0], &bounds);
//!
//! let mut helper = IntegerRoundingCutHelper::new(RoundingOptions::default());
//! if helper.compute_cut(&base, None, &mut NoLimit) {
//!     let cut = helper.cut().to_linear_constraint()?;
//!     println!("separated: {cut}");
//! }
//! ```
//!
//! # References
//!
//! - Marchand & Wolsey, "Aggregation and mixed integer rounding to
//!   generate cuts for mixed integer programs"
//! - Letchford & Souli, "On lifted cover inequalities: a new lifting
//!   procedure with unusual properties"
//! - CP-SAT and SCIP: production separators this design borrows from

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod arith;
pub mod error;
pub mod limit;
pub mod bounds;
pub mod constraint;
pub mod cut;
pub mod functions;
pub mod implied;
pub mod rounding;
pub mod cover;
pub mod rlt;

// Re-export main types
pub use bounds::{BoundTable, LevelZeroBounds};
pub use constraint::{LinearConstraint, LinearConstraintBuilder, VarId};
pub use cover::{CoverCutHelper, CoverOptions, CoverStats};
pub use cut::{CutData, CutTerm, TermExpr};
pub use error::{CutError, CutResult};
pub use functions::{
    MirStrengtheningFunction, RoundingFunction, StrengtheningFunction, SuperadditiveFn,
};
pub use implied::{ImpliedBound, ImpliedBoundSource, ImpliedBoundsProcessor, NoImpliedBounds};
pub use limit::{LimitCheck, NoLimit};
pub use rlt::{BoolRltCutHelper, NoProducts, ProductSource, RltOptions, RltStats};
pub use rounding::{IntegerRoundingCutHelper, RoundingOptions, RoundingStats};
