//! Recursion guards for walks that are not protected by the node cache.
//!
//! Node compilation is cycle safe on its own: the in-progress marker stops
//! any re-entry. Two walks run outside the cache and need their own guard:
//!
//! 1. **Class field search** follows `extends` chains by name. A visited set
//!    stops `---@class A: B` / `---@class B: A` cycles, and a depth limit stops
//!    absurdly deep hierarchies.
//! 2. **Generic instantiation** nests once per generic call in an argument
//!    (`id(id(id(x)))`); a depth counter bounds it.
//!
//! # Profiles
//!
//! [`RecursionProfile`] names the limits so call sites say what they guard:
//!
//! ```ignore
//! let mut guard = RecursionGuard::with_profile(RecursionProfile::ClassHierarchy);
//! ```
//!
//! # Safety
//!
//! - **Debug leak detection**: in debug builds, dropping a guard with active
//!   entries panics, catching a forgotten `leave()`.
//! - **Debug double-leave detection**: leaving a key that is not being visited
//!   panics in debug builds.
//! - **Overflow protection**: iteration counting saturates.

use lsz_common::limits::{MAX_CLASS_DEPTH, MAX_GENERIC_DEPTH, MAX_GUARD_ITERATIONS};
use rustc_hash::FxHashSet;
use std::hash::Hash;

// ---------------------------------------------------------------------------
// RecursionProfile
// ---------------------------------------------------------------------------

/// Named recursion limit presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecursionProfile {
    /// `extends` chain walked by class field search.
    ///
    /// depth = `MAX_CLASS_DEPTH`, iterations = `MAX_GUARD_ITERATIONS`
    ClassHierarchy,

    /// Generic call-site instantiations nested inside one another.
    ///
    /// depth = `MAX_GENERIC_DEPTH`, iterations = `MAX_GUARD_ITERATIONS`
    GenericInstantiation,

    /// Explicit limits, e.g. from `InferOptions::max_class_depth`.
    Custom { max_depth: u32, max_iterations: u32 },
}

impl RecursionProfile {
    pub const fn max_depth(self) -> u32 {
        match self {
            Self::ClassHierarchy => MAX_CLASS_DEPTH,
            Self::GenericInstantiation => MAX_GENERIC_DEPTH,
            Self::Custom { max_depth, .. } => max_depth,
        }
    }

    pub const fn max_iterations(self) -> u32 {
        match self {
            Self::ClassHierarchy | Self::GenericInstantiation => MAX_GUARD_ITERATIONS,
            Self::Custom { max_iterations, .. } => max_iterations,
        }
    }
}

// ---------------------------------------------------------------------------
// RecursionResult
// ---------------------------------------------------------------------------

/// Result of attempting to enter a guarded step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecursionResult {
    Entered,
    /// The key is already being visited.
    Cycle,
    DepthExceeded,
    IterationExceeded,
}

impl RecursionResult {
    #[inline]
    pub fn is_entered(self) -> bool {
        matches!(self, Self::Entered)
    }
}

// ---------------------------------------------------------------------------
// RecursionGuard
// ---------------------------------------------------------------------------

/// Visited set plus depth and iteration limits.
///
/// ```ignore
/// match guard.enter(name) {
///     RecursionResult::Entered => {
///         search_class(name, guard);
///         guard.leave(name);
///     }
///     RecursionResult::Cycle => {}
///     RecursionResult::DepthExceeded | RecursionResult::IterationExceeded => {}
/// }
/// ```
pub struct RecursionGuard<K: Hash + Eq + Copy> {
    visiting: FxHashSet<K>,
    depth: u32,
    iterations: u32,
    max_depth: u32,
    max_iterations: u32,
}

impl<K: Hash + Eq + Copy> RecursionGuard<K> {
    pub fn new(max_depth: u32, max_iterations: u32) -> Self {
        Self {
            visiting: FxHashSet::default(),
            depth: 0,
            iterations: 0,
            max_depth,
            max_iterations,
        }
    }

    pub fn with_profile(profile: RecursionProfile) -> Self {
        Self::new(profile.max_depth(), profile.max_iterations())
    }

    /// Try to enter the step for `key`. On [`RecursionResult::Entered`] the
    /// caller must call [`leave`](Self::leave) with the same key.
    pub fn enter(&mut self, key: K) -> RecursionResult {
        self.iterations = self.iterations.saturating_add(1);

        if self.iterations > self.max_iterations {
            return RecursionResult::IterationExceeded;
        }
        if self.depth >= self.max_depth {
            return RecursionResult::DepthExceeded;
        }
        if !self.visiting.insert(key) {
            return RecursionResult::Cycle;
        }
        self.depth += 1;
        RecursionResult::Entered
    }

    pub fn leave(&mut self, key: K) {
        let was_present = self.visiting.remove(&key);

        debug_assert!(
            was_present,
            "RecursionGuard::leave() called with a key that is not in the visiting set"
        );

        self.depth = self.depth.saturating_sub(1);
    }
}

#[cfg(debug_assertions)]
impl<K: Hash + Eq + Copy> Drop for RecursionGuard<K> {
    fn drop(&mut self) {
        if !std::thread::panicking() && !self.visiting.is_empty() {
            panic!(
                "RecursionGuard dropped with {} active entries still in the visiting set",
                self.visiting.len(),
            );
        }
    }
}

// ---------------------------------------------------------------------------
// DepthCounter
// ---------------------------------------------------------------------------

/// Depth-only guard, for steps that may legitimately revisit the same key.
pub struct DepthCounter {
    depth: u32,
    max_depth: u32,
}

impl DepthCounter {
    pub fn new(max_depth: u32) -> Self {
        Self {
            depth: 0,
            max_depth,
        }
    }

    pub fn with_profile(profile: RecursionProfile) -> Self {
        Self::new(profile.max_depth())
    }

    /// Returns `false` (without incrementing) when the limit is reached; do
    /// not call `leave()` in that case.
    #[inline]
    pub fn enter(&mut self) -> bool {
        if self.depth >= self.max_depth {
            return false;
        }
        self.depth += 1;
        true
    }

    #[inline]
    pub fn leave(&mut self) {
        debug_assert!(self.depth > 0, "DepthCounter::leave() called at depth 0");
        self.depth = self.depth.saturating_sub(1);
    }

    pub fn reset(&mut self) {
        self.depth = 0;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
