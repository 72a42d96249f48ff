//! Local-identity groups.
//!
//! Two field accesses share an identity when they name the same key on the
//! same local (`t.x = 1` in one branch, `print(t.x)` in another). The solver
//! only sees the [`IdentityProvider`] trait; [`IdentityTable`] is the
//! implementation the binder fills while building a program.

use crate::decl::DeclId;
use lsz_common::Atom;
use rustc_hash::FxHashMap;

/// Supplies flow-merged identity groups to the solver.
///
/// Results are treated as unordered contribution sets.
pub trait IdentityProvider {
    /// Every declaration sharing `decl`'s field identity, `decl` included.
    /// Empty when `decl` has no tracked identity.
    fn group(&self, decl: DeclId) -> &[DeclId];

    /// Assignments to `owner.key`, where `owner` is a local (or parameter).
    fn field_sources(&self, owner: DeclId, key: Atom) -> &[DeclId];
}

#[derive(Default)]
struct Group {
    members: Vec<DeclId>,
    sources: Vec<DeclId>,
}

#[derive(Default)]
pub struct IdentityTable {
    groups: Vec<Group>,
    by_key: FxHashMap<(DeclId, Atom), usize>,
    group_of: FxHashMap<DeclId, usize>,
}

impl IdentityTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn group_index(&mut self, owner: DeclId, key: Atom) -> usize {
        let next = self.groups.len();
        let index = *self.by_key.entry((owner, key)).or_insert(next);
        if index == next {
            self.groups.push(Group::default());
        }
        index
    }

    /// Add `decl` to the identity `owner.key`. Assignments also become
    /// field sources of the owner.
    pub fn record(&mut self, owner: DeclId, key: Atom, decl: DeclId, is_assignment: bool) {
        let index = self.group_index(owner, key);
        let group = &mut self.groups[index];
        if !group.members.contains(&decl) {
            group.members.push(decl);
        }
        if is_assignment && !group.sources.contains(&decl) {
            group.sources.push(decl);
        }
        self.group_of.insert(decl, index);
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }
}

impl IdentityProvider for IdentityTable {
    fn group(&self, decl: DeclId) -> &[DeclId] {
        match self.group_of.get(&decl) {
            Some(&index) => &self.groups[index].members,
            None => &[],
        }
    }

    fn field_sources(&self, owner: DeclId, key: Atom) -> &[DeclId] {
        match self.by_key.get(&(owner, key)) {
            Some(&index) => &self.groups[index].sources,
            None => &[],
        }
    }
}

#[cfg(test)]
#[path = "../tests/identity_tests.rs"]
mod tests;
