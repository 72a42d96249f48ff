//! Memoized, cycle-aware node cache.
//!
//! Each slot is keyed by a [`SlotKey`] and moves through
//! `Unvisited -> InProgress -> Resolved`. A missing entry is `Unvisited`.
//! `InProgress` is written before any rule runs, so a cyclic re-entry reads
//! the (possibly still empty) partial node instead of recursing. A slot that
//! resolved to nothing is `Resolved` with `node: None`, which is distinct
//! from never having been attempted.

use crate::types::{GenericId, TypeNode, UnionArena};
use lsz_binder::DeclId;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tracing::debug;

/// What a cache slot is attached to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SlotKey {
    Decl(DeclId),
    /// Lazily created return slot of a function literal. `index` is 1-based.
    Return { func: DeclId, index: u32 },
    /// Instantiation of a call-site generic substitution.
    Generic(GenericId),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SlotState {
    InProgress,
    Resolved,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Slot {
    pub state: SlotState,
    pub node: Option<TypeNode>,
}

#[derive(Default)]
pub struct NodeCache {
    slots: FxHashMap<SlotKey, Slot>,
    unions: UnionArena,
}

impl NodeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slot(&self, key: SlotKey) -> Option<Slot> {
        self.slots.get(&key).copied()
    }

    pub fn state(&self, key: SlotKey) -> Option<SlotState> {
        self.slots.get(&key).map(|slot| slot.state)
    }

    pub fn node(&self, key: SlotKey) -> Option<TypeNode> {
        self.slots.get(&key).and_then(|slot| slot.node)
    }

    pub fn unions(&self) -> &UnionArena {
        &self.unions
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Write the empty in-progress marker for `key`.
    pub(crate) fn begin(&mut self, key: SlotKey) {
        self.slots.insert(
            key,
            Slot {
                state: SlotState::InProgress,
                node: None,
            },
        );
    }

    /// Mark `key` resolved and return its accumulated node.
    pub(crate) fn finish(&mut self, key: SlotKey) -> Option<TypeNode> {
        let slot = self.slots.entry(key).or_insert(Slot {
            state: SlotState::Resolved,
            node: None,
        });
        slot.state = SlotState::Resolved;
        slot.node
    }

    /// Merge `node` into the slot for `key`.
    ///
    /// - empty `node`: no-op
    /// - empty or missing slot: store `node` as is (unions are shared)
    /// - identical node, or a union that already has every member: no-op
    /// - union owned by this slot: grow it in place
    /// - anything else: replace with a new union of old and new, owned by
    ///   this slot
    pub fn set_node(&mut self, key: SlotKey, node: Option<TypeNode>) {
        let Some(node) = node else {
            return;
        };
        let slot = self.slots.entry(key).or_insert(Slot {
            state: SlotState::Resolved,
            node: None,
        });
        match slot.node {
            None => slot.node = Some(node),
            Some(current) if current == node => {}
            Some(TypeNode::Union(current)) if self.unions.contains(current, node) => {}
            Some(TypeNode::Union(current)) if self.unions.owner(current) == Some(key) => {
                self.unions.insert(current, node);
            }
            Some(current) => {
                let merged = self.unions.union_of(current, node, Some(key));
                slot.node = Some(TypeNode::Union(merged));
            }
        }
    }

    /// Restartable cursor over the members of `node`.
    pub fn each_node(&self, node: Option<TypeNode>) -> EachNode {
        EachNode::new(node)
    }

    /// Snapshot of the members of `node`.
    pub fn members(&self, node: Option<TypeNode>) -> SmallVec<[TypeNode; 4]> {
        match node {
            None => SmallVec::new(),
            Some(TypeNode::Union(id)) => self.unions.members(id).iter().copied().collect(),
            Some(single) => smallvec::smallvec![single],
        }
    }

    /// Drop every slot and union.
    pub fn clear(&mut self) {
        debug!(
            slots = self.slots.len(),
            unions = self.unions.len(),
            "NodeCache::clear"
        );
        self.slots.clear();
        self.unions.clear();
    }
}

/// Cursor over a node's members.
///
/// The cursor holds no borrow: each [`next`](Self::next) re-reads the union's
/// live member list, so members merged while iterating are still visited.
#[derive(Copy, Clone, Debug)]
pub struct EachNode {
    node: Option<TypeNode>,
    index: usize,
}

impl EachNode {
    pub const fn new(node: Option<TypeNode>) -> Self {
        Self { node, index: 0 }
    }

    pub fn next(&mut self, unions: &UnionArena) -> Option<TypeNode> {
        let member = match self.node? {
            TypeNode::Union(id) => unions.members(id).get(self.index).copied(),
            single if self.index == 0 => Some(single),
            _ => None,
        };
        if member.is_some() {
            self.index += 1;
        }
        member
    }

    pub fn restart(&mut self) {
        self.index = 0;
    }
}

#[cfg(test)]
#[path = "../../tests/node_cache_tests.rs"]
mod tests;
