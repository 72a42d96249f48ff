//! Declaration binder for lsz.
//!
//! The binder turns parsed Lua (with `---@` annotations) into the declaration
//! graph the solver resolves:
//!
//! - [`DeclArena`]: every declaration, addressed by [`DeclId`]
//! - [`GlobalRegistry`]: named globals and their declaration sites
//! - [`IdentityProvider`]: flow-merged field identities
//! - [`ProgramBuilder`]: one call per construct, producing a [`Program`]

mod arena;
mod builder;
mod decl;
mod globals;
mod identity;

pub use arena::DeclArena;
pub use builder::{BUILTIN_TYPES, Program, ProgramBuilder};
pub use decl::{Decl, DeclId, DeclKind, DocLiteral, LocalRole};
pub use globals::{GlobalCategory, GlobalEntity, GlobalId, GlobalRegistry};
pub use identity::{IdentityProvider, IdentityTable};
