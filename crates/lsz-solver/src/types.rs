//! Type nodes and the union algebra.
//!
//! A [`TypeNode`] is a small `Copy` handle. Unions are stored out of line in a
//! [`UnionArena`] so that a union handed out mid-resolution stays a live view:
//! later merges into the slot that owns it are visible to every holder.
//!
//! An empty node is `Option<TypeNode>::None`; there is no "empty union".

use crate::caches::SlotKey;
use lsz_binder::{DeclId, GlobalId};
use rustc_hash::FxHashSet;

/// Handle of a union in the [`UnionArena`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnionId(pub u32);

/// Handle of a call-site generic substitution.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GenericId(pub u32);

/// The resolved type/value information for a declaration.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeNode {
    /// A declaration that is a complete type description by itself:
    /// literals, table and function literals, documented type shapes, and the
    /// binding a local introduces.
    Leaf(DeclId),
    /// A global variable or documented type.
    Global(GlobalId),
    /// A type scoped to one call-site binding of a function's generics.
    Generic(GenericId),
    /// "Could be any of these." Never a direct member of another union.
    Union(UnionId),
}

impl TypeNode {
    #[inline]
    pub const fn is_union(self) -> bool {
        matches!(self, Self::Union(_))
    }

    #[inline]
    pub const fn as_leaf(self) -> Option<DeclId> {
        match self {
            Self::Leaf(decl) => Some(decl),
            _ => None,
        }
    }

    #[inline]
    pub const fn as_global(self) -> Option<GlobalId> {
        match self {
            Self::Global(global) => Some(global),
            _ => None,
        }
    }
}

#[derive(Default)]
struct UnionData {
    /// First-merge order.
    members: Vec<TypeNode>,
    seen: FxHashSet<TypeNode>,
    /// Slot allowed to grow this union in place. Other slots holding the
    /// same union copy it before adding to it.
    owner: Option<SlotKey>,
}

/// Storage for every union created during a resolution session.
///
/// Member order is first-merge order; members are deduplicated and never
/// unions themselves.
#[derive(Default)]
pub struct UnionArena {
    unions: Vec<UnionData>,
}

impl UnionData {
    fn push(&mut self, node: TypeNode) -> bool {
        if !self.seen.insert(node) {
            return false;
        }
        self.members.push(node);
        true
    }
}

impl UnionArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn alloc(&mut self, owner: Option<SlotKey>) -> UnionId {
        let id = UnionId(self.unions.len() as u32);
        self.unions.push(UnionData {
            owner,
            ..UnionData::default()
        });
        id
    }

    /// Build a new union from two nodes, flattening either side.
    pub fn union_of(&mut self, a: TypeNode, b: TypeNode, owner: Option<SlotKey>) -> UnionId {
        let id = self.alloc(owner);
        self.insert(id, a);
        self.insert(id, b);
        id
    }

    /// Current members of `id`, in first-merge order.
    pub fn members(&self, id: UnionId) -> &[TypeNode] {
        match self.unions.get(id.0 as usize) {
            Some(data) => &data.members,
            None => &[],
        }
    }

    pub fn contains(&self, id: UnionId, node: TypeNode) -> bool {
        match node {
            TypeNode::Union(other) => self
                .members(other)
                .iter()
                .all(|member| self.contains(id, *member)),
            _ => self
                .unions
                .get(id.0 as usize)
                .is_some_and(|data| data.seen.contains(&node)),
        }
    }

    pub(crate) fn owner(&self, id: UnionId) -> Option<SlotKey> {
        self.unions.get(id.0 as usize).and_then(|data| data.owner)
    }

    /// Add `node` to `id`, flattening nested unions. Returns whether any
    /// member was added.
    pub fn insert(&mut self, id: UnionId, node: TypeNode) -> bool {
        match node {
            TypeNode::Union(other) if other == id => false,
            TypeNode::Union(other) => {
                let incoming = self.members(other).to_vec();
                let Some(data) = self.unions.get_mut(id.0 as usize) else {
                    return false;
                };
                let mut added = false;
                for member in incoming {
                    added |= data.push(member);
                }
                added
            }
            _ => self
                .unions
                .get_mut(id.0 as usize)
                .is_some_and(|data| data.push(node)),
        }
    }

    pub fn len(&self) -> usize {
        self.unions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.unions.is_empty()
    }

    pub fn clear(&mut self) {
        self.unions.clear();
    }
}

#[cfg(test)]
#[path = "../tests/types_tests.rs"]
mod tests;
