//! Cutix-pool: constraint pool management for LP-based integer search.
//!
//! Every row the LP relaxation sees flows through the pool in this
//! crate:
//!
//! - **Deduplicated storage**: rows are canonicalized and hashed on the
//!   way in; a row matching a stored one term-for-term tightens the
//!   stored bounds instead of growing the pool.
//! - **LP row selection**: each rescoring pass moves the most violated,
//!   mutually non-parallel rows into the LP and evicts rows that sat
//!   basic for too many consecutive solves.
//! - **Inprocessing**: when level-zero bounds advance, fixed variables
//!   are substituted away, trivially satisfied rows are cleared and
//!   oversized coefficients are clipped to the row slack.
//! - **Symmetry folding**: rows over interchangeable variables can be
//!   aggregated onto orbit sum variables before storage.
//!
//! # Example
//!
//! ```ignore
//! use cutix_core::NoLimit;
//! use cutix_pool::{LinearConstraintManager, ManagerSettings};
//!
//! let mut manager = LinearConstraintManager::new(num_vars, ManagerSettings::default());
//! manager.add(model_row);
//!
//! // After each LP solve, feed back the fractional point and basis.
//! manager.change_lp(&lp_values, &statuses, &bounds, &mut NoLimit);
//! for &index in manager.lp_rows() {
//!     lp.load_row(manager.constraint(index));
//! }
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod manager;
pub mod symmetry;

// Re-export main types.
pub use crate::manager::{
    ConstraintIndex, ConstraintInfo, LinearConstraintManager, ManagerSettings, ManagerStats,
    RowStatus,
};
pub use crate::symmetry::{
    LinearConstraintSymmetrizer, Orbit, OrbitError, SymmetryOrbits, SymmetrizerStats,
};
