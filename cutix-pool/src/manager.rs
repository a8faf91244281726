//! The constraint pool behind the LP relaxation.
//!
//! Rows enter through [`LinearConstraintManager::add`] (model constraints)
//! or [`LinearConstraintManager::add_cut`] (generated cuts), get
//! deduplicated against everything already stored, and then move in and
//! out of the live LP as [`LinearConstraintManager::change_lp`] rescores
//! them against each new fractional solution. Rows that stay basic for too
//! long leave the LP; deletable rows nobody uses are eventually destroyed
//! by compaction.

use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, HashMap};
use std::hash::{Hash, Hasher};

use log::{debug, info};
use sprs::CsVec;

use cutix_core::constraint::{NO_LOWER_BOUND, NO_UPPER_BOUND};
use cutix_core::{LevelZeroBounds, LimitCheck, LinearConstraint, VarId};

use crate::symmetry::LinearConstraintSymmetrizer;

/// Cuts with a lower violation-over-norm ratio than this do not pay for
/// the LP rows they would occupy.
const MIN_CUT_EFFICACY: f64 = 1e-4;

/// LP violations below this are noise, not candidates.
const MIN_VIOLATION: f64 = 1e-6;

/// Stable handle to a pooled row. Handles stay valid across every
/// operation except [`LinearConstraintManager::permanently_remove_some_constraints`],
/// which remaps the handles it returns through [`LinearConstraintManager::lp_rows`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConstraintIndex(pub usize);

/// Basis status of one live LP row, reported by the LP solver after each
/// solve, in the order of [`LinearConstraintManager::lp_rows`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowStatus {
    /// The row was basic, i.e. slack and not binding.
    Basic,
    /// The row was at one of its bounds.
    NonBasic,
}

/// Pool tuning knobs.
#[derive(Debug, Clone)]
pub struct ManagerSettings {
    /// Most rows moved into the LP per `change_lp` call.
    pub max_new_rows_per_change: usize,

    /// Candidates whose `1 - |cos|` against the last accepted row drops
    /// below this are skipped for the rest of the pass.
    pub min_orthogonality: f64,

    /// Consecutive basic solves after which a live row leaves the LP.
    pub max_consecutive_basic: u32,

    /// Per-cycle decay of the activity increment; smaller means recent
    /// binding rows dominate the eviction order faster.
    pub active_count_decay: f64,

    /// Rescale ceiling for activity bookkeeping.
    pub max_active_count: f64,

    /// Deletable rows outside the LP tolerated before compaction runs.
    pub max_inactive_rows: usize,

    /// Deletable rows outside the LP kept by a compaction pass.
    pub cleanup_target: usize,
}

impl Default for ManagerSettings {
    fn default() -> Self {
        Self {
            max_new_rows_per_change: 100,
            min_orthogonality: 0.05,
            max_consecutive_basic: 100,
            active_count_decay: 0.8,
            max_active_count: 1e25,
            max_inactive_rows: 1000,
            cleanup_target: 750,
        }
    }
}

impl ManagerSettings {
    pub fn with_max_new_rows_per_change(mut self, limit: usize) -> Self {
        self.max_new_rows_per_change = limit;
        self
    }

    pub fn with_max_consecutive_basic(mut self, solves: u32) -> Self {
        self.max_consecutive_basic = solves;
        self
    }

    pub fn with_cleanup(mut self, max_inactive_rows: usize, cleanup_target: usize) -> Self {
        debug_assert!(cleanup_target <= max_inactive_rows);
        self.max_inactive_rows = max_inactive_rows;
        self.cleanup_target = cleanup_target;
        self
    }
}

/// Statistics over the life of the pool.
#[derive(Debug, Default, Clone)]
pub struct ManagerStats {
    /// Rows stored as new entries.
    pub added: u64,

    /// Rows merged into an existing entry by bound tightening.
    pub merged: u64,

    /// Rows dropped because canonicalization overflowed.
    pub rejected_overflow: u64,

    /// Rows dropped by the symmetrizer.
    pub fold_drops: u64,

    /// Cuts accepted as new rows.
    pub cuts_added: u64,

    /// Cuts rejected below the efficacy floor.
    pub cuts_rejected_weak: u64,

    /// Cuts rejected by the activity overflow check.
    pub cuts_rejected_overflow: u64,

    /// Rows rewritten by `simplify_constraint`.
    pub simplified_rows: u64,

    /// Coefficients clipped by strengthening.
    pub strengthened_coefficients: u64,

    /// Rows dropped from the live LP for staying basic.
    pub evicted_rows: u64,

    /// Rows destroyed by compaction.
    pub removed_rows: u64,

    /// Accepted cuts keyed by generator name.
    pub cuts_by_source: BTreeMap<String, u64>,
}

/// One pooled row plus its bookkeeping.
#[derive(Debug, Clone)]
pub struct ConstraintInfo {
    pub constraint: LinearConstraint,
    pub l2_norm: f64,
    pub hash: u64,
    pub is_in_lp: bool,
    /// Cuts are deletable; model constraints are permanent.
    pub is_deletable: bool,
    /// Decayed count of LP solves where the row was binding.
    pub active_count: f64,
    /// Consecutive LP solves where the row was basic.
    pub inactive_count: u32,
    sparse: CsVec<f64>,
    objective_parallelism: f64,
    objective_revision: u64,
}

/// The pool itself: storage arena, signature index, and the live LP row
/// list, all addressed through [`ConstraintIndex`] handles.
pub struct LinearConstraintManager {
    settings: ManagerSettings,
    num_vars: usize,
    infos: Vec<ConstraintInfo>,
    by_hash: HashMap<u64, ConstraintIndex>,
    lp_rows: Vec<ConstraintIndex>,
    objective: Vec<f64>,
    objective_l2: f64,
    objective_revision: u64,
    activity_increment: f64,
    last_bound_revision: Option<u64>,
    symmetrizer: Option<LinearConstraintSymmetrizer>,
    stats: ManagerStats,
}

impl LinearConstraintManager {
    pub fn new(num_vars: usize, settings: ManagerSettings) -> Self {
        Self {
            settings,
            num_vars,
            infos: Vec::new(),
            by_hash: HashMap::new(),
            lp_rows: Vec::new(),
            objective: vec![0.0; num_vars],
            objective_l2: 0.0,
            objective_revision: 1,
            activity_increment: 1.0,
            last_bound_revision: None,
            symmetrizer: None,
            stats: ManagerStats::default(),
        }
    }

    /// Folds every subsequently added row through the given symmetrizer.
    pub fn with_symmetrizer(mut self, symmetrizer: LinearConstraintSymmetrizer) -> Self {
        self.symmetrizer = Some(symmetrizer);
        self
    }

    pub fn num_constraints(&self) -> usize {
        self.infos.len()
    }

    /// Handles of the rows currently in the LP, in insertion order.
    pub fn lp_rows(&self) -> &[ConstraintIndex] {
        &self.lp_rows
    }

    pub fn constraint(&self, index: ConstraintIndex) -> &LinearConstraint {
        &self.infos[index.0].constraint
    }

    pub fn info(&self, index: ConstraintIndex) -> &ConstraintInfo {
        &self.infos[index.0]
    }

    /// Get pool statistics.
    pub fn stats(&self) -> &ManagerStats {
        &self.stats
    }

    /// Logs a one-line pool summary.
    pub fn log_summary(&self) {
        info!(
            "pool: {} rows ({} in LP), {} cuts accepted, {} merged, {} evicted, {} removed",
            self.infos.len(),
            self.lp_rows.len(),
            self.stats.cuts_added,
            self.stats.merged,
            self.stats.evicted_rows,
            self.stats.removed_rows
        );
    }

    pub fn symmetrizer(&self) -> Option<&LinearConstraintSymmetrizer> {
        self.symmetrizer.as_ref()
    }

    /// Updates one objective coefficient; parallelism caches refresh
    /// lazily on the next scoring pass.
    pub fn set_objective_coefficient(&mut self, var: VarId, coeff: f64) {
        assert!(var < self.num_vars, "objective variable out of range");
        self.objective[var] = coeff;
        self.objective_l2 = self.objective.iter().map(|c| c * c).sum::<f64>().sqrt();
        self.objective_revision += 1;
    }

    /// Canonicalizes, folds and stores a row, deduplicating against every
    /// row already pooled. Returns the handle and whether a new entry was
    /// created (false means the row merged into an existing one), or None
    /// when the row was dropped or is trivially empty.
    pub fn add(&mut self, mut ct: LinearConstraint) -> Option<(ConstraintIndex, bool)> {
        if !ct.canonicalize() {
            self.stats.rejected_overflow += 1;
            return None;
        }
        if let Some(symmetrizer) = &mut self.symmetrizer {
            if !symmetrizer.fold(&mut ct) {
                self.stats.fold_drops += 1;
                return None;
            }
        }
        if ct.is_empty() {
            return None;
        }
        if let Some(&last) = ct.vars.last() {
            assert!(last < self.num_vars, "constraint variable out of range");
        }

        let hash = structural_hash(&ct);
        if let Some(&existing) = self.by_hash.get(&hash) {
            let stored = &mut self.infos[existing.0].constraint;
            if stored.same_terms(&ct) {
                stored.lb = stored.lb.max(ct.lb);
                stored.ub = stored.ub.min(ct.ub);
                self.stats.merged += 1;
                return Some((existing, false));
            }
            // True hash collision: store the new row; the signature slot
            // keeps pointing at the first owner.
        }

        let index = ConstraintIndex(self.infos.len());
        let sparse = build_sparse(self.num_vars, &ct);
        self.infos.push(ConstraintInfo {
            l2_norm: ct.l2_norm(),
            hash,
            is_in_lp: false,
            is_deletable: false,
            active_count: 0.0,
            inactive_count: 0,
            sparse,
            objective_parallelism: 0.0,
            objective_revision: 0,
            constraint: ct,
        });
        self.by_hash.entry(hash).or_insert(index);
        self.stats.added += 1;
        Some((index, true))
    }

    /// As [`add`], for generated cuts: enforces the efficacy floor and the
    /// activity overflow check first, and marks new rows deletable.
    /// Returns whether a new row entered the pool.
    ///
    /// [`add`]: LinearConstraintManager::add
    pub fn add_cut(
        &mut self,
        ct: LinearConstraint,
        source: &str,
        lp_values: &[f64],
        bounds: &dyn LevelZeroBounds,
    ) -> bool {
        if !ct.fits_in_activity_bounds(bounds) {
            self.stats.cuts_rejected_overflow += 1;
            return false;
        }
        let efficacy = ct.efficacy(lp_values);
        if efficacy < MIN_CUT_EFFICACY {
            self.stats.cuts_rejected_weak += 1;
            return false;
        }
        match self.add(ct) {
            Some((index, true)) => {
                self.infos[index.0].is_deletable = true;
                self.stats.cuts_added += 1;
                *self
                    .stats
                    .cuts_by_source
                    .entry(source.to_string())
                    .or_default() += 1;
                debug!(
                    "cut from {source}: efficacy {efficacy:.3e}, {}",
                    self.infos[index.0].constraint
                );
                true
            }
            // A duplicate still tightened the stored bounds; the pool did
            // not grow though, so the round gets no credit for it.
            Some((_, false)) => false,
            None => false,
        }
    }

    /// Rewrites one row under the current level-zero bounds: substitutes
    /// fixed variables, clears rows that became trivially true, and clips
    /// oversized coefficients. Returns whether the row changed; on any
    /// overflow the row is left exactly as it was.
    pub fn simplify_constraint(
        &mut self,
        index: ConstraintIndex,
        bounds: &dyn LevelZeroBounds,
    ) -> bool {
        if self.infos[index.0].constraint.is_empty() {
            return false;
        }
        let mut ct = self.infos[index.0].constraint.clone();
        let mut changed = false;

        if ct.vars.iter().any(|&var| bounds.is_fixed(var)) {
            if !substitute_fixed_variables(&mut ct, bounds) {
                return false;
            }
            if ct.is_empty() && (ct.lb > 0 || ct.ub < 0) {
                // Every variable was fixed and the bounds are unsatisfiable.
                // Keep the row so the LP keeps reporting the conflict.
                return false;
            }
            changed = true;
        }

        if !ct.is_empty() {
            let (min_activity, max_activity) = ct.activity_range(bounds);
            let lb_slack = !ct.has_lower_bound() || min_activity >= ct.lb as i128;
            let ub_slack = !ct.has_upper_bound() || max_activity <= ct.ub as i128;
            if lb_slack && ub_slack {
                ct.vars.clear();
                ct.coeffs.clear();
                ct.lb = NO_LOWER_BOUND;
                ct.ub = NO_UPPER_BOUND;
                changed = true;
            }
        }

        if !ct.is_empty() && ct.has_upper_bound() != ct.has_lower_bound() {
            match strengthen_coefficients(&mut ct, bounds) {
                Some(0) => {}
                Some(clipped) => {
                    self.stats.strengthened_coefficients += clipped;
                    changed = true;
                }
                None => return false,
            }
        }

        if !changed {
            return false;
        }
        if !ct.is_empty() && !ct.canonicalize() {
            return false;
        }
        self.stats.simplified_rows += 1;
        self.commit_row(index.0, ct);
        true
    }

    /// One LP rebuild step. `statuses` reports the basis state of each
    /// handle in [`lp_rows`] from the previous solve, in order. Evicts
    /// long-basic rows, re-simplifies after bound advances, then moves the
    /// best-scoring violated rows into the LP, suppressing near-parallel
    /// picks. Returns whether the LP row set changed.
    ///
    /// [`lp_rows`]: LinearConstraintManager::lp_rows
    pub fn change_lp(
        &mut self,
        lp_values: &[f64],
        statuses: &[RowStatus],
        bounds: &dyn LevelZeroBounds,
        limit: &mut dyn LimitCheck,
    ) -> bool {
        assert_eq!(
            statuses.len(),
            self.lp_rows.len(),
            "one basis status per live LP row"
        );
        let mut changed = false;

        // Basis bookkeeping against the row list the caller saw.
        let mut retained = Vec::with_capacity(self.lp_rows.len());
        for (position, &index) in self.lp_rows.iter().enumerate() {
            let info = &mut self.infos[index.0];
            match statuses[position] {
                RowStatus::Basic => {
                    info.inactive_count += 1;
                    if info.inactive_count > self.settings.max_consecutive_basic {
                        info.is_in_lp = false;
                        info.inactive_count = 0;
                        self.stats.evicted_rows += 1;
                        changed = true;
                        continue;
                    }
                }
                RowStatus::NonBasic => {
                    info.inactive_count = 0;
                    info.active_count += self.activity_increment;
                }
            }
            retained.push(index);
        }
        self.lp_rows = retained;

        if self.last_bound_revision != Some(bounds.revision()) {
            self.last_bound_revision = Some(bounds.revision());
            for raw in 0..self.infos.len() {
                self.simplify_constraint(ConstraintIndex(raw), bounds);
            }
        }

        // Score everything outside the LP against the fractional point.
        let mut candidates: Vec<Candidate> = Vec::new();
        for raw in 0..self.infos.len() {
            if self.infos[raw].is_in_lp || self.infos[raw].constraint.is_empty() {
                continue;
            }
            let violation = self.infos[raw].constraint.violation(lp_values);
            let norm = self.infos[raw].l2_norm;
            if violation <= MIN_VIOLATION || norm <= f64::MIN_POSITIVE {
                continue;
            }
            let score = violation / norm + self.objective_parallelism(raw);
            candidates.push(Candidate {
                index: raw,
                score,
                orthogonality: 1.0,
            });
        }

        let mut moved_in = 0;
        while moved_in < self.settings.max_new_rows_per_change && !candidates.is_empty() {
            if limit.limit_reached() {
                break;
            }
            let mut best = 0;
            let mut best_key = f64::NEG_INFINITY;
            for (i, candidate) in candidates.iter().enumerate() {
                let key = candidate.score + candidate.orthogonality;
                if key > best_key {
                    best_key = key;
                    best = i;
                }
            }
            let chosen = candidates.swap_remove(best);
            {
                let info = &mut self.infos[chosen.index];
                info.is_in_lp = true;
                info.inactive_count = 0;
            }
            self.lp_rows.push(ConstraintIndex(chosen.index));
            moved_in += 1;
            changed = true;
            candidates.retain_mut(|candidate| {
                candidate.orthogonality = self.orthogonality(candidate.index, chosen.index);
                candidate.orthogonality >= self.settings.min_orthogonality
            });
        }

        // Recent binding counts outweigh old ones.
        self.activity_increment /= self.settings.active_count_decay;
        if self.activity_increment > self.settings.max_active_count {
            for info in &mut self.infos {
                info.active_count /= self.settings.max_active_count;
            }
            self.activity_increment /= self.settings.max_active_count;
        }

        if self.deletable_outside_lp() > self.settings.max_inactive_rows {
            self.permanently_remove_some_constraints();
        }

        debug!(
            "lp change: {} rows live, {} moved in, {} evicted so far",
            self.lp_rows.len(),
            moved_in,
            self.stats.evicted_rows
        );
        changed
    }

    /// Destroys the lowest-activity deletable rows outside the LP until
    /// only `cleanup_target` remain, compacting the arena and remapping
    /// the live handles. The one operation that invalidates old handles.
    pub fn permanently_remove_some_constraints(&mut self) {
        let mut removable: Vec<(f64, usize)> = self
            .infos
            .iter()
            .enumerate()
            .filter(|(_, info)| info.is_deletable && !info.is_in_lp)
            .map(|(raw, info)| (info.active_count, raw))
            .collect();
        if removable.len() <= self.settings.cleanup_target {
            return;
        }
        let num_remove = removable.len() - self.settings.cleanup_target;
        removable.sort_by(|a, b| a.0.total_cmp(&b.0));
        let mut remove = vec![false; self.infos.len()];
        for &(_, raw) in &removable[..num_remove] {
            remove[raw] = true;
        }

        // Prefix-sum remap; removed slots never appear in lp_rows.
        let old_len = self.infos.len();
        let mut remap = vec![0usize; old_len];
        let mut next = 0;
        for (raw, slot) in remap.iter_mut().enumerate() {
            *slot = next;
            if !remove[raw] {
                next += 1;
            }
        }

        let mut kept = Vec::with_capacity(old_len - num_remove);
        for (raw, info) in std::mem::take(&mut self.infos).into_iter().enumerate() {
            if !remove[raw] {
                kept.push(info);
            }
        }
        self.infos = kept;
        self.by_hash.clear();
        for (raw, info) in self.infos.iter().enumerate() {
            if !info.constraint.is_empty() {
                self.by_hash.entry(info.hash).or_insert(ConstraintIndex(raw));
            }
        }
        for index in &mut self.lp_rows {
            index.0 = remap[index.0];
        }
        self.stats.removed_rows += num_remove as u64;
        debug!(
            "compacted pool: removed {num_remove} rows, {} remain",
            self.infos.len()
        );
    }

    fn deletable_outside_lp(&self) -> usize {
        self.infos
            .iter()
            .filter(|info| info.is_deletable && !info.is_in_lp)
            .count()
    }

    /// `|cos|` with the objective, cached per objective revision.
    fn objective_parallelism(&mut self, raw: usize) -> f64 {
        let info = &mut self.infos[raw];
        if info.objective_revision != self.objective_revision {
            info.objective_revision = self.objective_revision;
            info.objective_parallelism =
                if self.objective_l2 <= f64::MIN_POSITIVE || info.l2_norm <= f64::MIN_POSITIVE {
                    0.0
                } else {
                    let dot: f64 = info
                        .constraint
                        .vars
                        .iter()
                        .zip(&info.constraint.coeffs)
                        .map(|(&var, &coeff)| coeff as f64 * self.objective[var])
                        .sum();
                    (dot / (info.l2_norm * self.objective_l2)).abs()
                };
        }
        info.objective_parallelism
    }

    /// `1 - |cos|` between two pooled rows.
    fn orthogonality(&self, a: usize, b: usize) -> f64 {
        let (left, right) = (&self.infos[a], &self.infos[b]);
        if left.l2_norm <= f64::MIN_POSITIVE || right.l2_norm <= f64::MIN_POSITIVE {
            return 1.0;
        }
        let cos = left.sparse.dot(&right.sparse) / (left.l2_norm * right.l2_norm);
        1.0 - cos.abs()
    }

    /// Installs a rewritten row at `raw`, keeping the signature index
    /// consistent. A rewrite that now duplicates another row merges into
    /// it and clears this one.
    fn commit_row(&mut self, raw: usize, ct: LinearConstraint) {
        let old_hash = self.infos[raw].hash;
        if self.by_hash.get(&old_hash) == Some(&ConstraintIndex(raw)) {
            self.by_hash.remove(&old_hash);
        }
        if ct.is_empty() {
            self.clear_row(raw);
            return;
        }
        let hash = structural_hash(&ct);
        if let Some(&existing) = self.by_hash.get(&hash) {
            if existing.0 != raw && self.infos[existing.0].constraint.same_terms(&ct) {
                let stored = &mut self.infos[existing.0].constraint;
                stored.lb = stored.lb.max(ct.lb);
                stored.ub = stored.ub.min(ct.ub);
                self.stats.merged += 1;
                self.clear_row(raw);
                return;
            }
        }
        let sparse = build_sparse(self.num_vars, &ct);
        let info = &mut self.infos[raw];
        info.l2_norm = ct.l2_norm();
        info.hash = hash;
        info.sparse = sparse;
        info.objective_revision = 0;
        info.constraint = ct;
        self.by_hash.entry(hash).or_insert(ConstraintIndex(raw));
    }

    /// Empties a row in place; compaction destroys it later.
    fn clear_row(&mut self, raw: usize) {
        let was_in_lp = {
            let info = &mut self.infos[raw];
            info.constraint = LinearConstraint::new(NO_LOWER_BOUND, NO_UPPER_BOUND, vec![], vec![]);
            info.l2_norm = 0.0;
            info.sparse = CsVec::new(self.num_vars, vec![], vec![]);
            info.is_deletable = true;
            std::mem::replace(&mut info.is_in_lp, false)
        };
        if was_in_lp {
            self.lp_rows.retain(|index| index.0 != raw);
        }
    }
}

struct Candidate {
    index: usize,
    score: f64,
    orthogonality: f64,
}

fn structural_hash(ct: &LinearConstraint) -> u64 {
    let mut hasher = DefaultHasher::new();
    ct.vars.hash(&mut hasher);
    ct.coeffs.hash(&mut hasher);
    hasher.finish()
}

fn build_sparse(num_vars: usize, ct: &LinearConstraint) -> CsVec<f64> {
    CsVec::new(
        num_vars,
        ct.vars.clone(),
        ct.coeffs.iter().map(|&c| c as f64).collect(),
    )
}

/// Folds variables fixed at level zero into the bounds. False when a
/// shifted bound leaves the representable range in the tight direction.
fn substitute_fixed_variables(ct: &mut LinearConstraint, bounds: &dyn LevelZeroBounds) -> bool {
    let mut shift: i128 = 0;
    let mut vars = Vec::with_capacity(ct.vars.len());
    let mut coeffs = Vec::with_capacity(ct.coeffs.len());
    for (&var, &coeff) in ct.vars.iter().zip(&ct.coeffs) {
        if bounds.is_fixed(var) {
            shift += coeff as i128 * bounds.lower_bound(var) as i128;
        } else {
            vars.push(var);
            coeffs.push(coeff);
        }
    }
    let lb = if ct.has_lower_bound() {
        let shifted = ct.lb as i128 - shift;
        if shifted > i64::MAX as i128 {
            return false;
        }
        // Below the representable range the bound constrains nothing.
        i64::try_from(shifted).unwrap_or(NO_LOWER_BOUND)
    } else {
        NO_LOWER_BOUND
    };
    let ub = if ct.has_upper_bound() {
        let shifted = ct.ub as i128 - shift;
        if shifted < i64::MIN as i128 {
            return false;
        }
        i64::try_from(shifted).unwrap_or(NO_UPPER_BOUND)
    } else {
        NO_UPPER_BOUND
    };
    ct.vars = vars;
    ct.coeffs = coeffs;
    ct.lb = lb;
    ct.ub = ub;
    true
}

/// Clips coefficients that overshoot the row's slack on its single finite
/// bound. A coefficient larger than `slack + 1` moves the variable past
/// infeasibility in one step already, so clipping to `slack + 1` (with
/// the bound compensated at the variable's resting end) preserves the
/// integer feasible set exactly. Returns the number of clipped terms, or
/// None on bound-compensation overflow.
fn strengthen_coefficients(ct: &mut LinearConstraint, bounds: &dyn LevelZeroBounds) -> Option<u64> {
    let (min_activity, max_activity) = ct.activity_range(bounds);
    let mut clipped = 0;
    if ct.has_upper_bound() {
        let slack = ct.ub as i128 - min_activity;
        if slack < 0 {
            return Some(0);
        }
        let step = slack + 1;
        let mut ub = ct.ub as i128;
        for (&var, coeff) in ct.vars.iter().zip(&mut ct.coeffs) {
            let c = *coeff as i128;
            if c > step {
                ub -= (c - step) * bounds.lower_bound(var) as i128;
                *coeff = step as i64;
                clipped += 1;
            } else if c < -step {
                ub -= (c + step) * bounds.upper_bound(var) as i128;
                *coeff = -(step as i64);
                clipped += 1;
            }
        }
        if clipped > 0 {
            ct.ub = i64::try_from(ub).ok()?;
        }
    } else {
        let slack = max_activity - ct.lb as i128;
        if slack < 0 {
            return Some(0);
        }
        let step = slack + 1;
        let mut lb = ct.lb as i128;
        for (&var, coeff) in ct.vars.iter().zip(&mut ct.coeffs) {
            let c = *coeff as i128;
            if c > step {
                lb -= (c - step) * bounds.upper_bound(var) as i128;
                *coeff = step as i64;
                clipped += 1;
            } else if c < -step {
                lb -= (c + step) * bounds.lower_bound(var) as i128;
                *coeff = -(step as i64);
                clipped += 1;
            }
        }
        if clipped > 0 {
            ct.lb = i64::try_from(lb).ok()?;
        }
    }
    Some(clipped)
}
