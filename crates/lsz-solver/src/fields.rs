//! Field and class member search.
//!
//! `search_by_key` answers "which declarations define `key` on this node",
//! dispatching on what the node is:
//!
//! | Node | Search |
//! |------|--------|
//! | table literal, documented table shape | fields with that key |
//! | local | assignment sources of `local.key` (identity provider) |
//! | global variable | sites of the keyed sub-global |
//! | documented class | [`class_field_search`](Resolver::class_field_search) |
//! | generic substitution | its instantiated members |
//!
//! Search returns declarations, not nodes; callers compile what they need.

use crate::caches::EachNode;
use crate::recursion::{RecursionGuard, RecursionProfile};
use crate::resolver::Resolver;
use crate::types::TypeNode;
use lsz_binder::{DeclId, DeclKind, GlobalCategory, GlobalId};
use lsz_common::Atom;
use smallvec::SmallVec;
use tracing::trace;

pub(crate) type Sources = SmallVec<[DeclId; 4]>;

fn push_unique(out: &mut Sources, decl: DeclId) {
    if !out.contains(&decl) {
        out.push(decl);
    }
}

impl Resolver<'_> {
    /// Guard for one search: the visited set holds classes on the current
    /// `extends` path.
    fn class_guard(&self) -> RecursionGuard<GlobalId> {
        RecursionGuard::with_profile(RecursionProfile::Custom {
            max_depth: self.options.max_class_depth,
            max_iterations: RecursionProfile::ClassHierarchy.max_iterations(),
        })
    }

    /// Declarations defining `key` on `node`.
    pub fn search_by_key(&mut self, node: TypeNode, key: Atom) -> SmallVec<[DeclId; 4]> {
        let mut guard = self.class_guard();
        let mut out = Sources::new();
        self.search_into(node, key, &mut guard, &mut out);
        out
    }

    /// Resolve `base` and search each of its members for `key`.
    pub fn resolve_member(&mut self, base: DeclId, key: Atom) -> SmallVec<[DeclId; 4]> {
        let node = self.compile_node(base);
        let mut guard = self.class_guard();
        let mut out = Sources::new();
        let mut cursor = EachNode::new(node);
        while let Some(member) = cursor.next(self.cache.unions()) {
            self.search_into(member, key, &mut guard, &mut out);
        }
        out
    }

    /// Fields named `key` declared on documented class `class` or, for each
    /// declaration site that declares nothing itself, on its supertypes.
    pub fn class_field_search(&mut self, class: GlobalId, key: Atom) -> SmallVec<[DeclId; 4]> {
        let mut guard = self.class_guard();
        let mut out = Sources::new();
        self.class_search_into(class, key, &mut guard, &mut out);
        out
    }

    fn search_into(
        &mut self,
        node: TypeNode,
        key: Atom,
        guard: &mut RecursionGuard<GlobalId>,
        out: &mut Sources,
    ) {
        let arena = self.arena;
        match node {
            TypeNode::Leaf(decl) => match arena.kind(decl) {
                Some(DeclKind::Table { fields } | DeclKind::DocTypeTable { fields }) => {
                    for &field in fields {
                        if arena.key_name(field) == Some(key) {
                            push_unique(out, field);
                        }
                    }
                }
                Some(DeclKind::Local { .. }) => {
                    for &source in self.identities.field_sources(decl, key) {
                        push_unique(out, source);
                    }
                }
                _ => {}
            },
            TypeNode::Global(global) => match self.globals.category(global) {
                Some(GlobalCategory::Variable) => {
                    if let Some(field) = self.globals.get_field(global, key) {
                        for &site in self.globals.sites(field) {
                            push_unique(out, site);
                        }
                    }
                }
                Some(GlobalCategory::Type) => self.class_search_into(global, key, guard, out),
                None => {}
            },
            TypeNode::Generic(generic) => {
                let resolved = self.resolve_generic(generic);
                let mut cursor = EachNode::new(resolved);
                while let Some(member) = cursor.next(self.cache.unions()) {
                    self.search_into(member, key, guard, out);
                }
            }
            TypeNode::Union(_) => {
                let mut cursor = EachNode::new(Some(node));
                while let Some(member) = cursor.next(self.cache.unions()) {
                    self.search_into(member, key, guard, out);
                }
            }
        }
    }

    fn class_search_into(
        &mut self,
        class: GlobalId,
        key: Atom,
        guard: &mut RecursionGuard<GlobalId>,
        out: &mut Sources,
    ) {
        let entered = guard.enter(class);
        if !entered.is_entered() {
            trace!(class = class.0, ?entered, "class field search stopped");
            return;
        }

        let arena = self.arena;
        let globals = self.globals;
        for &site in globals.sites(class) {
            let Some(DeclKind::DocClass {
                extends,
                fields,
                sources,
                ..
            }) = arena.kind(site)
            else {
                continue;
            };

            let mut found = Sources::new();
            for &field in fields {
                if arena.key_name(field) == Some(key) {
                    push_unique(&mut found, field);
                }
            }
            for &source in sources {
                self.search_into(TypeNode::Leaf(source), key, guard, &mut found);
                if let Some(global) = arena.global(source) {
                    self.search_into(TypeNode::Global(global), key, guard, &mut found);
                }
            }
            if !found.is_empty() {
                for decl in found {
                    push_unique(out, decl);
                }
                continue;
            }

            for &parent in extends {
                let Some(DeclKind::DocTypeName { name }) = arena.kind(parent) else {
                    continue;
                };
                if let Some(parent_class) = globals.get(GlobalCategory::Type, *name) {
                    self.class_search_into(parent_class, key, guard, out);
                }
            }
        }

        guard.leave(class);
    }
}

#[cfg(test)]
#[path = "../tests/fields_tests.rs"]
mod tests;
