//! Declaration arena and structural helpers.
//!
//! The arena is append-only while a program is being bound and read-only
//! afterwards. The solver never owns or mutates declarations; it keys its
//! cache by [`DeclId`].

use crate::decl::{Decl, DeclId, DeclKind, LocalRole};
use crate::globals::GlobalId;
use lsz_common::{Atom, Interner};
use smallvec::SmallVec;

#[derive(Default)]
pub struct DeclArena {
    decls: Vec<Decl>,
}

impl DeclArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn alloc(&mut self, kind: DeclKind) -> DeclId {
        let id = DeclId(self.decls.len() as u32);
        self.decls.push(Decl::new(kind));
        id
    }

    pub(crate) fn get_mut(&mut self, id: DeclId) -> Option<&mut Decl> {
        self.decls.get_mut(id.index())
    }

    pub fn get(&self, id: DeclId) -> Option<&Decl> {
        self.decls.get(id.index())
    }

    pub fn kind(&self, id: DeclId) -> Option<&DeclKind> {
        self.get(id).map(|d| &d.kind)
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    pub fn parent(&self, id: DeclId) -> Option<DeclId> {
        self.get(id).and_then(|d| d.parent)
    }

    /// Annotations bound to `id`.
    pub fn docs(&self, id: DeclId) -> &[DeclId] {
        match self.get(id) {
            Some(decl) => &decl.docs,
            None => &[],
        }
    }

    pub fn global(&self, id: DeclId) -> Option<GlobalId> {
        self.get(id).and_then(|d| d.global)
    }

    // =========================================================================
    // Structural helpers
    // =========================================================================

    /// Key name of a field-like node: accesses, table fields, name tokens and
    /// documented fields. Index accesses only have a key when it is a literal
    /// string.
    pub fn key_name(&self, id: DeclId) -> Option<Atom> {
        match self.kind(id)? {
            DeclKind::GetField { key, .. }
            | DeclKind::SetField { key, .. }
            | DeclKind::GetMethod { key, .. }
            | DeclKind::SetMethod { key, .. }
            | DeclKind::TableField { key, .. }
            | DeclKind::FieldName { key }
            | DeclKind::MethodName { key }
            | DeclKind::DocTableField { key, .. } => Some(*key),
            DeclKind::GetIndex { key, .. } | DeclKind::SetIndex { key, .. } => *key,
            DeclKind::DocField { name, .. } => Some(*name),
            _ => None,
        }
    }

    /// Base object of a member access.
    pub fn base_of(&self, id: DeclId) -> Option<DeclId> {
        match self.kind(id)? {
            DeclKind::GetField { base, .. }
            | DeclKind::SetField { base, .. }
            | DeclKind::GetMethod { base, .. }
            | DeclKind::SetMethod { base, .. }
            | DeclKind::GetIndex { base, .. }
            | DeclKind::SetIndex { base, .. } => Some(*base),
            _ => None,
        }
    }

    /// Value expression assigned by a binding or assignment.
    pub fn value_of(&self, id: DeclId) -> Option<DeclId> {
        match self.kind(id)? {
            DeclKind::Local { value, .. }
            | DeclKind::SetLocal { value, .. }
            | DeclKind::SetGlobal { value, .. }
            | DeclKind::SetField { value, .. }
            | DeclKind::SetMethod { value, .. }
            | DeclKind::SetIndex { value, .. }
            | DeclKind::TableField { value, .. } => *value,
            _ => None,
        }
    }

    pub fn is_literal(&self, id: DeclId) -> bool {
        self.kind(id).is_some_and(DeclKind::is_literal)
    }

    pub fn is_assign_target(&self, id: DeclId) -> bool {
        self.kind(id).is_some_and(DeclKind::is_assign_target)
    }

    /// Explicit parameter or implicit method receiver.
    pub fn is_param(&self, id: DeclId) -> bool {
        matches!(
            self.kind(id),
            Some(DeclKind::Local {
                role: LocalRole::Param | LocalRole::ImplicitSelf,
                ..
            })
        )
    }

    pub fn children(&self, id: DeclId) -> SmallVec<[DeclId; 4]> {
        self.kind(id).map(DeclKind::children).unwrap_or_default()
    }

    /// Visit `root` and every declaration below it, depth first.
    ///
    /// The visitor returns `false` to stop the walk early; `walk` then returns
    /// `false` as well.
    pub fn walk(&self, root: DeclId, visit: &mut impl FnMut(DeclId, &DeclKind) -> bool) -> bool {
        let Some(kind) = self.kind(root) else {
            return true;
        };
        if !visit(root, kind) {
            return false;
        }
        for child in kind.children() {
            if !self.walk(child, visit) {
                return false;
            }
        }
        true
    }

    /// Whether any node under `root` satisfies `pred`.
    pub fn any_in_subtree(&self, root: DeclId, mut pred: impl FnMut(&DeclKind) -> bool) -> bool {
        !self.walk(root, &mut |_, kind| !pred(kind))
    }

    /// Nearest function literal strictly enclosing `id`.
    pub fn enclosing_function(&self, id: DeclId) -> Option<DeclId> {
        let mut cur = self.parent(id);
        while let Some(p) = cur {
            if matches!(self.kind(p), Some(DeclKind::Function { .. })) {
                return Some(p);
            }
            cur = self.parent(p);
        }
        None
    }

    /// Debug label such as `local x` or `getfield .k`.
    pub fn describe(&self, id: DeclId, interner: &Interner) -> String {
        let Some(kind) = self.kind(id) else {
            return format!("<invalid {}>", id.0);
        };
        match kind {
            DeclKind::Local { name, .. }
            | DeclKind::GetGlobal { name }
            | DeclKind::SetGlobal { name, .. }
            | DeclKind::DocClass { name, .. }
            | DeclKind::DocTypeName { name }
            | DeclKind::DocGenericName { name } => {
                format!("{} {}", kind.name(), interner.resolve(*name))
            }
            _ => match self.key_name(id) {
                Some(key) => format!("{} .{}", kind.name(), interner.resolve(key)),
                None => kind.name().to_string(),
            },
        }
    }
}

#[cfg(test)]
#[path = "../tests/arena_tests.rs"]
mod tests;
