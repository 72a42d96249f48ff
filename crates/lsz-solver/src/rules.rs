//! Per-kind resolution rules.
//!
//! [`Resolver::run_decl_rule`] dispatches on the closed [`DeclKind`] set; the
//! match is exhaustive, so a new kind does not compile until it has a rule.
//! Each rule only merges into its own slot.

use crate::caches::SlotKey;
use crate::resolver::Resolver;
use crate::types::TypeNode;
use lsz_binder::{DeclId, DeclKind, GlobalCategory, LocalRole};
use lsz_common::Atom;
use tracing::trace;

impl<'p> Resolver<'p> {
    pub(crate) fn run_decl_rule(&mut self, key: SlotKey, decl: DeclId) {
        let arena = self.arena;
        let Some(kind) = arena.kind(decl) else {
            return;
        };
        match kind {
            DeclKind::Nil
            | DeclKind::Boolean(_)
            | DeclKind::Integer(_)
            | DeclKind::Number(_)
            | DeclKind::String(_)
            | DeclKind::Table { .. }
            | DeclKind::DocTypeLiteral(_)
            | DeclKind::DocTypeTable { .. }
            | DeclKind::DocTypeFunction { .. }
            | DeclKind::DocTypeArray { .. }
            | DeclKind::DocGenericName { .. } => self.merge(key, Some(TypeNode::Leaf(decl))),

            DeclKind::Function { .. } => {
                self.merge(key, Some(TypeNode::Leaf(decl)));
                for &doc in arena.docs(decl) {
                    if matches!(arena.kind(doc), Some(DeclKind::DocOverload { .. })) {
                        self.merge_decl(key, doc);
                    }
                }
            }

            DeclKind::Local {
                name,
                role,
                value,
                refs,
            } => self.compile_local(key, decl, *name, *role, *value, refs),
            DeclKind::GetLocal { local } => self.merge_decl(key, *local),
            DeclKind::SetLocal { value, .. } | DeclKind::TableField { value, .. } => {
                if let Some(value) = value {
                    self.merge_decl(key, *value);
                }
            }

            // Global resolution already merged the entity and its sites.
            DeclKind::GetGlobal { .. } | DeclKind::SetGlobal { .. } | DeclKind::DocClass { .. } => {}

            DeclKind::SetField { .. } | DeclKind::SetMethod { .. } | DeclKind::SetIndex { .. } => {
                self.merge_by_identity(key, decl);
            }
            DeclKind::GetField { base, key: field } | DeclKind::GetMethod { base, key: field } => {
                self.merge_by_identity(key, decl);
                self.merge_member_sources(key, *base, *field);
            }
            DeclKind::GetIndex { base, key: field } => {
                self.merge_by_identity(key, decl);
                if let Some(field) = field {
                    self.merge_member_sources(key, *base, *field);
                }
            }
            DeclKind::FieldName { .. } | DeclKind::MethodName { .. } => {
                if let Some(parent) = arena.parent(decl) {
                    self.merge_decl(key, parent);
                }
            }

            DeclKind::Call { callee, args } => self.call_return(key, *callee, 1, decl, args),
            DeclKind::Select { call, index } => {
                if let Some(DeclKind::Call { callee, args }) = arena.kind(*call) {
                    self.call_return(key, *callee, *index, *call, args);
                }
            }
            DeclKind::Varargs => self.compile_varargs(key, decl),
            DeclKind::Paren { expr } => self.merge_decl(key, *expr),

            DeclKind::DocTypeTag { ty }
            | DeclKind::DocField { ty, .. }
            | DeclKind::DocParam { ty, .. }
            | DeclKind::DocVararg { ty }
            | DeclKind::DocTableField { ty, .. } => self.merge_decl(key, *ty),
            DeclKind::DocOverload { sig } => self.merge_decl(key, *sig),
            DeclKind::DocType { alternatives } => {
                for &alternative in alternatives {
                    self.merge_decl(key, alternative);
                }
            }
            DeclKind::DocTypeName { name } => {
                if let Some(global) = self.globals.get(GlobalCategory::Type, *name) {
                    self.merge(key, Some(TypeNode::Global(global)));
                }
            }

            // Statements and annotations consumed by their owners.
            DeclKind::Return { .. } | DeclKind::DocReturn { .. } | DeclKind::DocGeneric { .. } => {}
        }
    }

    fn compile_local(
        &mut self,
        key: SlotKey,
        decl: DeclId,
        name: Atom,
        role: LocalRole,
        value: Option<DeclId>,
        refs: &[DeclId],
    ) {
        let arena = self.arena;
        self.merge(key, Some(TypeNode::Leaf(decl)));

        let has_doc = self.bind_docs(key, decl);
        if !has_doc {
            for &reference in refs {
                if let Some(DeclKind::SetLocal {
                    value: Some(assigned),
                    ..
                }) = arena.kind(reference)
                {
                    self.merge_decl(key, *assigned);
                }
            }
            if let Some(receiver) = self.receiver_object(decl, name, role) {
                self.merge_decl(key, receiver);
            }
        }

        if let Some(value) = value {
            if self.accepts_value(has_doc, value) {
                self.merge_decl(key, value);
            }
        }
    }

    /// Object a method receiver stands for: `obj` in `function obj:m()`, and
    /// with `self_parameter_linking` also in `obj.m = function(self) end`.
    fn receiver_object(&self, decl: DeclId, name: Atom, role: LocalRole) -> Option<DeclId> {
        let linked = match role {
            LocalRole::ImplicitSelf => true,
            LocalRole::Param => self.options.self_parameter_linking && Some(name) == self.self_name,
            LocalRole::Plain => false,
        };
        if !linked {
            return None;
        }

        let arena = self.arena;
        let func = arena.parent(decl)?;
        let Some(DeclKind::Function { params, .. }) = arena.kind(func) else {
            return None;
        };
        if params.first() != Some(&decl) {
            return None;
        }
        match arena.kind(arena.parent(func)?)? {
            DeclKind::SetField { base, .. } | DeclKind::SetMethod { base, .. } => Some(*base),
            _ => None,
        }
    }

    /// `...` inside a function: its `@vararg`, or its `@param ...`.
    fn compile_varargs(&mut self, key: SlotKey, decl: DeclId) {
        let arena = self.arena;
        let Some(func) = arena.enclosing_function(decl) else {
            trace!(decl = decl.0, "varargs outside a function");
            return;
        };
        for &doc in arena.docs(func) {
            let applies = match arena.kind(doc) {
                Some(DeclKind::DocVararg { .. }) => true,
                Some(DeclKind::DocParam { name, .. }) => Some(*name) == self.vararg_name,
                _ => false,
            };
            if applies {
                self.merge_decl(key, doc);
            }
        }
    }

    /// Every source of `base.field` found by field search.
    fn merge_member_sources(&mut self, key: SlotKey, base: DeclId, field: Atom) {
        for source in self.resolve_member(base, field) {
            self.merge_decl(key, source);
        }
    }
}

#[cfg(test)]
#[path = "../tests/rules_tests.rs"]
mod tests;
