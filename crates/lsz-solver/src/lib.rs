//! Type-node inference for Lua with `---@` annotations.
//!
//! For every declaration, reference, field access, call or annotation the
//! solver computes a type node: the set of types and values that can flow
//! through it. Resolution is:
//!
//! - **Memoized**: each slot runs its rules once per session
//! - **Cycle safe**: an in-progress marker is written before recursing, so a
//!   back-edge observes the partial node instead of diverging
//! - **Total**: absence of information is an empty node, never an error
//!
//! Start with [`Resolver::compile_node`].
mod calls;
mod fields;
mod generics;
mod resolver;
mod rules;

pub mod caches;
pub mod recursion;
pub mod types;

pub use caches::{EachNode, NodeCache, Slot, SlotKey, SlotState};
pub use generics::{GenericArena, GenericManager, GenericNode};
pub use resolver::{Resolver, ResolverStats};
pub use types::{GenericId, TypeNode, UnionArena, UnionId};
