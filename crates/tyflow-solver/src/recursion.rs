//! Cycle and runaway detection for recursive type walks.
//!
//! The relation checker keys a `RecursionGuard` on the pair being related,
//! the evaluator on the type being evaluated. A key seen again while it is
//! still open is a cycle; the caller decides what a cycle means (assume
//! related, keep the unevaluated type).

use rustc_hash::FxHashSet;
use std::hash::Hash;
use tyflow_common::limits;

/// Limits for the two guarded walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecursionProfile {
    /// Structural relation of possibly recursive types.
    SubtypeCheck,
    /// Evaluation of conditional, mapped, keyof and indexed-access types.
    TypeEvaluation,
}

impl RecursionProfile {
    pub const fn max_depth(self) -> u32 {
        match self {
            Self::SubtypeCheck => limits::MAX_SUBTYPE_DEPTH,
            Self::TypeEvaluation => 50,
        }
    }

    /// Total `enter` calls allowed before the walk is abandoned.
    pub const fn max_iterations(self) -> u32 {
        100_000
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecursionResult {
    Entered,
    Cycle,
    DepthExceeded,
    IterationExceeded,
}

/// Open keys plus depth and iteration counters. Every `Entered` must be
/// paired with a `leave` of the same key.
pub struct RecursionGuard<K: Hash + Eq + Copy> {
    open: FxHashSet<K>,
    depth: u32,
    iterations: u32,
    profile: RecursionProfile,
}

impl<K: Hash + Eq + Copy> RecursionGuard<K> {
    pub fn with_profile(profile: RecursionProfile) -> Self {
        RecursionGuard {
            open: FxHashSet::default(),
            depth: 0,
            iterations: 0,
            profile,
        }
    }

    pub fn enter(&mut self, key: K) -> RecursionResult {
        self.iterations = self.iterations.saturating_add(1);
        if self.iterations > self.profile.max_iterations() {
            return RecursionResult::IterationExceeded;
        }
        if self.depth >= self.profile.max_depth() {
            return RecursionResult::DepthExceeded;
        }
        if !self.open.insert(key) {
            return RecursionResult::Cycle;
        }
        self.depth += 1;
        RecursionResult::Entered
    }

    pub fn leave(&mut self, key: K) {
        let removed = self.open.remove(&key);
        debug_assert!(removed, "leave without a matching enter");
        self.depth = self.depth.saturating_sub(1);
    }

    /// Whether some key is still open.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.depth > 0
    }

    /// Forget the iteration count once the outermost walk finishes.
    pub fn reset(&mut self) {
        self.open.clear();
        self.depth = 0;
        self.iterations = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reentering_an_open_key_is_a_cycle() {
        let mut guard: RecursionGuard<u32> = RecursionGuard::with_profile(RecursionProfile::TypeEvaluation);
        assert_eq!(guard.enter(1), RecursionResult::Entered);
        assert_eq!(guard.enter(1), RecursionResult::Cycle);
        assert_eq!(guard.enter(2), RecursionResult::Entered);
        guard.leave(2);
        guard.leave(1);
        assert!(!guard.is_active());
        assert_eq!(guard.enter(1), RecursionResult::Entered);
        guard.leave(1);
    }

    #[test]
    fn test_depth_limit_follows_profile() {
        let profile = RecursionProfile::TypeEvaluation;
        let mut guard: RecursionGuard<u32> = RecursionGuard::with_profile(profile);
        for key in 0..profile.max_depth() {
            assert_eq!(guard.enter(key), RecursionResult::Entered);
        }
        assert_eq!(guard.enter(u32::MAX), RecursionResult::DepthExceeded);
        guard.reset();
        assert!(!guard.is_active());
    }

    #[test]
    fn test_iteration_budget_is_cumulative() {
        let profile = RecursionProfile::SubtypeCheck;
        let mut guard: RecursionGuard<u32> = RecursionGuard::with_profile(profile);
        for _ in 0..profile.max_iterations() {
            assert_eq!(guard.enter(7), RecursionResult::Entered);
            guard.leave(7);
        }
        assert_eq!(guard.enter(7), RecursionResult::IterationExceeded);
        guard.reset();
        assert_eq!(guard.enter(7), RecursionResult::Entered);
        guard.leave(7);
    }
}
