//! Type-node inference for Lua programs annotated with `---@` doc comments.
//!
//! The work is split across the workspace crates, re-exported here:
//!
//! - [`common`]: interning, limits and [`InferOptions`]
//! - [`binder`]: the declaration graph and [`ProgramBuilder`]
//! - [`solver`]: the [`Resolver`] and its node cache
//!
//! ```
//! let mut b = lsz::ProgramBuilder::new();
//! let one = b.integer(1);
//! let x = b.local("x", Some(one));
//! let program = b.finish();
//!
//! let mut resolver = lsz::Resolver::new(&program);
//! assert!(resolver.compile_node(x).is_some());
//! ```

pub use lsz_binder as binder;
pub use lsz_common as common;
pub use lsz_solver as solver;

pub mod config;
pub mod tracing_config;

pub use lsz_binder::{DeclId, DeclKind, Program, ProgramBuilder};
pub use lsz_common::InferOptions;
pub use lsz_solver::{Resolver, ResolverStats, SlotKey, TypeNode};
