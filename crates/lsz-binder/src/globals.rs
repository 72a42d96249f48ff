//! Global entity registry.
//!
//! A global entity is a named declaration outside lexical scope: a global
//! variable (`Foo = {}`), a keyed member of one (`Foo.bar = 1`), or a
//! documented type (`---@class Foo`). Each entity records every declaration
//! site, so the solver can merge contributions from all of them.

use crate::decl::DeclId;
use indexmap::IndexMap;
use lsz_common::Atom;
use rustc_hash::FxHashMap;
use tracing::trace;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GlobalId(pub u32);

/// Namespace a global lives in. `Foo` the variable and `Foo` the class are
/// different entities.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum GlobalCategory {
    Variable,
    Type,
}

#[derive(Clone, Debug)]
pub struct GlobalEntity {
    pub category: GlobalCategory,
    pub name: Atom,
    /// Declaration and assignment sites, in registration order.
    pub sites: Vec<DeclId>,
    /// Keyed sub-globals (`Foo.bar`). Only variables have fields.
    pub fields: IndexMap<Atom, GlobalId>,
    pub parent: Option<GlobalId>,
}

#[derive(Default)]
pub struct GlobalRegistry {
    entities: Vec<GlobalEntity>,
    roots: FxHashMap<(GlobalCategory, Atom), GlobalId>,
}

impl GlobalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a top-level global by category and name.
    pub fn get(&self, category: GlobalCategory, name: Atom) -> Option<GlobalId> {
        self.roots.get(&(category, name)).copied()
    }

    /// Look up the keyed sub-global `parent.key`.
    pub fn get_field(&self, parent: GlobalId, key: Atom) -> Option<GlobalId> {
        self.entity(parent)?.fields.get(&key).copied()
    }

    pub fn entity(&self, id: GlobalId) -> Option<&GlobalEntity> {
        self.entities.get(id.0 as usize)
    }

    pub fn category(&self, id: GlobalId) -> Option<GlobalCategory> {
        self.entity(id).map(|e| e.category)
    }

    pub fn sites(&self, id: GlobalId) -> &[DeclId] {
        match self.entity(id) {
            Some(entity) => &entity.sites,
            None => &[],
        }
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    fn alloc(&mut self, category: GlobalCategory, name: Atom, parent: Option<GlobalId>) -> GlobalId {
        let id = GlobalId(self.entities.len() as u32);
        trace!(global = id.0, ?category, name = name.0, parent = ?parent.map(|p| p.0), "GlobalRegistry::alloc");
        self.entities.push(GlobalEntity {
            category,
            name,
            sites: Vec::new(),
            fields: IndexMap::new(),
            parent,
        });
        id
    }

    /// Get or create a top-level global.
    pub fn ensure(&mut self, category: GlobalCategory, name: Atom) -> GlobalId {
        if let Some(id) = self.get(category, name) {
            return id;
        }
        let id = self.alloc(category, name, None);
        self.roots.insert((category, name), id);
        id
    }

    /// Get or create the keyed sub-global `parent.key`.
    ///
    /// Sub-globals are always variables, whatever the parent's category.
    pub fn ensure_field(&mut self, parent: GlobalId, key: Atom) -> GlobalId {
        if let Some(id) = self.get_field(parent, key) {
            return id;
        }
        let id = self.alloc(GlobalCategory::Variable, key, Some(parent));
        if let Some(entity) = self.entities.get_mut(parent.0 as usize) {
            entity.fields.insert(key, id);
        }
        id
    }

    /// Record a declaration or assignment site.
    pub fn add_site(&mut self, id: GlobalId, site: DeclId) {
        if let Some(entity) = self.entities.get_mut(id.0 as usize) {
            if !entity.sites.contains(&site) {
                entity.sites.push(site);
            }
        }
    }
}

#[cfg(test)]
#[path = "../tests/globals_tests.rs"]
mod tests;
