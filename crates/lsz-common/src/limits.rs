//! Centralized limits and thresholds for the inference engine.
//!
//! Cycle safety of node resolution does not depend on any of these: the
//! in-progress marker written before recursing is what guarantees
//! termination. These limits only bound resource usage on pathological but
//! acyclic inputs.
//!
//! # Categories
//!
//! - **Stack growth**: red zone and segment size for `stacker::maybe_grow`
//! - **Recursion depths**: class hierarchy walks
//! - **Iteration bounds**: total enter attempts per guarded walk

// =============================================================================
// Stack Growth
// =============================================================================

/// Remaining stack below which node compilation switches to a fresh segment.
///
/// Long acyclic chains (`local a1 = a0; local a2 = a1; ...`) recurse once per
/// link. Rather than capping the chain length we grow the stack.
pub const STACK_RED_ZONE: usize = 64 * 1024;

/// Size of each additional stack segment allocated by `stacker`.
pub const STACK_SEGMENT_SIZE: usize = 1024 * 1024;

// =============================================================================
// Recursion Depth Limits
// =============================================================================

/// Default maximum depth of an `extends` chain walked by class field search.
///
/// The visited-name guard already stops cyclic chains; this catches absurdly
/// deep (generated) hierarchies. Overridable through
/// `InferOptions::max_class_depth`.
pub const MAX_CLASS_DEPTH: u32 = 64;

/// Maximum number of generic instantiations nested inside one another.
///
/// ```lua
/// ---@generic T
/// ---@param x T
/// ---@return T
/// local function id(x) return x end
/// local v = id(id(id(id(1))))
/// ```
pub const MAX_GENERIC_DEPTH: u32 = 32;

// =============================================================================
// Iteration Bounds
// =============================================================================

/// Total enter attempts allowed for a single guarded walk.
pub const MAX_GUARD_ITERATIONS: u32 = 100_000;
