//! Program construction.
//!
//! `ProgramBuilder` is the binder's front door: the parser (or a test) calls
//! one method per construct, and the builder wires parent links, records
//! global declaration sites, binds annotations, and fills the identity table
//! as it goes. `finish` hands back an immutable [`Program`].

use crate::arena::DeclArena;
use crate::decl::{DeclId, DeclKind, DocLiteral, LocalRole};
use crate::globals::{GlobalCategory, GlobalId, GlobalRegistry};
use crate::identity::IdentityTable;
use lsz_common::{Atom, Interner};
use tracing::debug;

/// Type names every program can refer to without declaring them.
pub const BUILTIN_TYPES: &[&str] = &[
    "nil", "any", "boolean", "string", "number", "integer", "table", "function", "thread",
    "userdata",
];

/// A fully bound program: the input to the solver.
pub struct Program {
    pub interner: Interner,
    pub arena: DeclArena,
    pub globals: GlobalRegistry,
    pub identities: IdentityTable,
}

impl Program {
    /// Convenience for debugging output and tests.
    pub fn describe(&self, id: DeclId) -> String {
        self.arena.describe(id, &self.interner)
    }
}

#[derive(Default)]
pub struct ProgramBuilder {
    interner: Interner,
    arena: DeclArena,
    globals: GlobalRegistry,
    identities: IdentityTable,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A builder with `---@class` declarations for [`BUILTIN_TYPES`].
    pub fn with_builtin_types() -> Self {
        let mut builder = Self::new();
        for name in BUILTIN_TYPES {
            builder.doc_class(name, &[]);
        }
        builder
    }

    pub fn finish(self) -> Program {
        debug!(
            decls = self.arena.len(),
            globals = self.globals.len(),
            identity_groups = self.identities.group_count(),
            "ProgramBuilder::finish"
        );
        Program {
            interner: self.interner,
            arena: self.arena,
            globals: self.globals,
            identities: self.identities,
        }
    }

    pub fn atom(&mut self, s: &str) -> Atom {
        self.interner.intern(s)
    }

    pub fn arena(&self) -> &DeclArena {
        &self.arena
    }

    /// Set `child`'s parent, for constructs the builder cannot infer (e.g. a
    /// local declared inside a function body).
    pub fn attach(&mut self, child: DeclId, parent: DeclId) {
        if let Some(decl) = self.arena.get_mut(child) {
            decl.parent = Some(parent);
        }
    }

    fn alloc(&mut self, kind: DeclKind) -> DeclId {
        let children = kind.children();
        let id = self.arena.alloc(kind);
        for child in children {
            self.attach(child, id);
        }
        id
    }

    fn link_global(&mut self, id: DeclId, global: GlobalId) {
        if let Some(decl) = self.arena.get_mut(id) {
            decl.global = Some(global);
        }
    }

    /// Local (or parameter) a base expression stands for.
    fn owner_of(&self, base: DeclId) -> Option<DeclId> {
        match self.arena.kind(base)? {
            DeclKind::Local { .. } => Some(base),
            DeclKind::GetLocal { local } => Some(*local),
            DeclKind::Paren { expr } => self.owner_of(*expr),
            _ => None,
        }
    }

    /// Global entity a base expression stands for.
    fn global_of(&self, base: DeclId) -> Option<GlobalId> {
        match self.arena.kind(base)? {
            DeclKind::Paren { expr } => self.global_of(*expr),
            _ => self.arena.global(base),
        }
    }

    /// Record identity and global linkage for a member access.
    fn link_member(&mut self, access: DeclId, base: DeclId, key: Option<Atom>, is_set: bool) {
        let Some(key) = key else {
            return;
        };
        if let Some(owner) = self.owner_of(base) {
            self.identities.record(owner, key, access, is_set);
        }
        if let Some(parent) = self.global_of(base) {
            let field = self.globals.ensure_field(parent, key);
            self.link_global(access, field);
            if is_set {
                self.globals.add_site(field, access);
            }
        }
    }

    /// Table-constructor fields of `value` become sources of `owner.key`.
    fn record_table_fields(&mut self, owner: DeclId, value: Option<DeclId>) {
        let Some(DeclKind::Table { fields }) = value.and_then(|v| self.arena.kind(v)) else {
            return;
        };
        for field in fields.clone() {
            if let Some(key) = self.arena.key_name(field) {
                self.identities.record(owner, key, field, true);
            }
        }
    }

    /// Table-constructor fields of a global's initializer become sub-global
    /// sites.
    fn register_table_fields(&mut self, global: GlobalId, value: Option<DeclId>) {
        let Some(DeclKind::Table { fields }) = value.and_then(|v| self.arena.kind(v)) else {
            return;
        };
        for field in fields.clone() {
            if let Some(key) = self.arena.key_name(field) {
                let sub = self.globals.ensure_field(global, key);
                self.globals.add_site(sub, field);
                self.link_global(field, sub);
            }
        }
    }

    // =========================================================================
    // Literals
    // =========================================================================

    pub fn nil(&mut self) -> DeclId {
        self.alloc(DeclKind::Nil)
    }

    pub fn boolean(&mut self, value: bool) -> DeclId {
        self.alloc(DeclKind::Boolean(value))
    }

    pub fn integer(&mut self, value: i64) -> DeclId {
        self.alloc(DeclKind::Integer(value))
    }

    pub fn number(&mut self, value: f64) -> DeclId {
        self.alloc(DeclKind::Number(value))
    }

    pub fn string(&mut self, value: &str) -> DeclId {
        let atom = self.atom(value);
        self.alloc(DeclKind::String(atom))
    }

    /// `{ k1 = v1, k2 = v2 }`
    pub fn table(&mut self, fields: &[(&str, DeclId)]) -> DeclId {
        let fields = fields
            .iter()
            .map(|&(key, value)| {
                let key = self.atom(key);
                self.alloc(DeclKind::TableField {
                    key,
                    value: Some(value),
                })
            })
            .collect();
        self.alloc(DeclKind::Table { fields })
    }

    fn function_with(&mut self, params: &[&str], is_method: bool) -> DeclId {
        let mut locals = Vec::with_capacity(params.len() + usize::from(is_method));
        if is_method {
            let name = self.atom("self");
            locals.push(self.arena.alloc(DeclKind::Local {
                name,
                role: LocalRole::ImplicitSelf,
                value: None,
                refs: Vec::new(),
            }));
        }
        for param in params {
            let name = self.atom(param);
            locals.push(self.arena.alloc(DeclKind::Local {
                name,
                role: LocalRole::Param,
                value: None,
                refs: Vec::new(),
            }));
        }
        self.alloc(DeclKind::Function {
            params: locals,
            returns: Vec::new(),
            is_method,
        })
    }

    /// `function(a, b) ... end`
    pub fn function(&mut self, params: &[&str]) -> DeclId {
        self.function_with(params, false)
    }

    /// Body of `function obj:name(a, b)`; the implicit `self` comes first.
    pub fn method(&mut self, params: &[&str]) -> DeclId {
        self.function_with(params, true)
    }

    pub fn params(&self, func: DeclId) -> Vec<DeclId> {
        match self.arena.kind(func) {
            Some(DeclKind::Function { params, .. }) => params.clone(),
            _ => Vec::new(),
        }
    }

    /// Parameter of `func` named `name`.
    pub fn param(&mut self, func: DeclId, name: &str) -> Option<DeclId> {
        let atom = self.atom(name);
        self.params(func).into_iter().find(|&p| {
            matches!(self.arena.kind(p), Some(DeclKind::Local { name, .. }) if *name == atom)
        })
    }

    /// `return e1, e2, ...` inside `func`.
    pub fn ret(&mut self, func: DeclId, exprs: &[DeclId]) -> DeclId {
        let ret = self.alloc(DeclKind::Return {
            exprs: exprs.to_vec(),
        });
        self.attach(ret, func);
        if let Some(DeclKind::Function { returns, .. }) =
            self.arena.get_mut(func).map(|d| &mut d.kind)
        {
            returns.push(ret);
        }
        ret
    }

    // =========================================================================
    // Bindings
    // =========================================================================

    pub fn local(&mut self, name: &str, value: Option<DeclId>) -> DeclId {
        let name = self.atom(name);
        let local = self.alloc(DeclKind::Local {
            name,
            role: LocalRole::Plain,
            value,
            refs: Vec::new(),
        });
        self.record_table_fields(local, value);
        local
    }

    fn push_ref(&mut self, local: DeclId, use_site: DeclId) {
        if let Some(DeclKind::Local { refs, .. }) = self.arena.get_mut(local).map(|d| &mut d.kind)
        {
            refs.push(use_site);
        }
    }

    pub fn get_local(&mut self, local: DeclId) -> DeclId {
        let id = self.arena.alloc(DeclKind::GetLocal { local });
        self.push_ref(local, id);
        id
    }

    pub fn set_local(&mut self, local: DeclId, value: DeclId) -> DeclId {
        let id = self.arena.alloc(DeclKind::SetLocal {
            local,
            value: Some(value),
        });
        self.attach(value, id);
        self.push_ref(local, id);
        self.record_table_fields(local, Some(value));
        id
    }

    pub fn get_global(&mut self, name: &str) -> DeclId {
        let atom = self.atom(name);
        let id = self.alloc(DeclKind::GetGlobal { name: atom });
        let global = self.globals.ensure(GlobalCategory::Variable, atom);
        self.link_global(id, global);
        id
    }

    pub fn set_global(&mut self, name: &str, value: DeclId) -> DeclId {
        let atom = self.atom(name);
        let id = self.alloc(DeclKind::SetGlobal {
            name: atom,
            value: Some(value),
        });
        let global = self.globals.ensure(GlobalCategory::Variable, atom);
        self.globals.add_site(global, id);
        self.link_global(id, global);
        self.register_table_fields(global, Some(value));
        id
    }

    // =========================================================================
    // Member access
    // =========================================================================

    pub fn get_field(&mut self, base: DeclId, key: &str) -> DeclId {
        let atom = self.atom(key);
        let id = self.alloc(DeclKind::GetField { base, key: atom });
        self.link_member(id, base, Some(atom), false);
        id
    }

    pub fn set_field(&mut self, base: DeclId, key: &str, value: DeclId) -> DeclId {
        let atom = self.atom(key);
        let id = self.alloc(DeclKind::SetField {
            base,
            key: atom,
            value: Some(value),
        });
        self.link_member(id, base, Some(atom), true);
        id
    }

    pub fn get_method(&mut self, base: DeclId, key: &str) -> DeclId {
        let atom = self.atom(key);
        let id = self.alloc(DeclKind::GetMethod { base, key: atom });
        self.link_member(id, base, Some(atom), false);
        id
    }

    /// `function base:key(...)`; `func` should come from [`Self::method`].
    pub fn set_method(&mut self, base: DeclId, key: &str, func: DeclId) -> DeclId {
        let atom = self.atom(key);
        let id = self.alloc(DeclKind::SetMethod {
            base,
            key: atom,
            value: Some(func),
        });
        self.link_member(id, base, Some(atom), true);
        id
    }

    pub fn get_index(&mut self, base: DeclId, key: Option<&str>) -> DeclId {
        let atom = key.map(|k| self.atom(k));
        let id = self.alloc(DeclKind::GetIndex { base, key: atom });
        self.link_member(id, base, atom, false);
        id
    }

    pub fn set_index(&mut self, base: DeclId, key: Option<&str>, value: DeclId) -> DeclId {
        let atom = key.map(|k| self.atom(k));
        let id = self.alloc(DeclKind::SetIndex {
            base,
            key: atom,
            value: Some(value),
        });
        self.link_member(id, base, atom, true);
        id
    }

    /// Name token of a field or method access.
    pub fn name_token(&mut self, access: DeclId) -> Option<DeclId> {
        let key = self.arena.key_name(access)?;
        let kind = match self.arena.kind(access)? {
            DeclKind::GetMethod { .. } | DeclKind::SetMethod { .. } => DeclKind::MethodName { key },
            _ => DeclKind::FieldName { key },
        };
        let id = self.arena.alloc(kind);
        self.attach(id, access);
        Some(id)
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    pub fn call(&mut self, callee: DeclId, args: &[DeclId]) -> DeclId {
        self.alloc(DeclKind::Call {
            callee,
            args: args.to_vec(),
        })
    }

    /// The `index`-th (1-based) result of `call`.
    pub fn select(&mut self, call: DeclId, index: u32) -> DeclId {
        let id = self.arena.alloc(DeclKind::Select { call, index });
        if self.arena.parent(call).is_none() {
            self.attach(call, id);
        }
        id
    }

    pub fn varargs(&mut self) -> DeclId {
        self.alloc(DeclKind::Varargs)
    }

    pub fn paren(&mut self, expr: DeclId) -> DeclId {
        self.alloc(DeclKind::Paren { expr })
    }

    // =========================================================================
    // Annotations
    // =========================================================================

    /// Bind annotation `doc` to `target`.
    pub fn bind(&mut self, doc: DeclId, target: DeclId) {
        if let Some(decl) = self.arena.get_mut(target) {
            if !decl.docs.contains(&doc) {
                decl.docs.push(doc);
            }
        }
        if let Some(DeclKind::DocClass { sources, .. }) =
            self.arena.get_mut(doc).map(|d| &mut d.kind)
        {
            if !sources.contains(&target) {
                sources.push(target);
            }
        }
    }

    /// Bind `doc` to a function and each of its parameters; annotation
    /// matching decides which of them it applies to.
    fn bind_to_function(&mut self, doc: DeclId, func: DeclId) {
        self.bind(doc, func);
        for param in self.params(func) {
            self.bind(doc, param);
        }
    }

    /// `---@type ty` above `target`.
    pub fn doc_type(&mut self, target: DeclId, ty: DeclId) -> DeclId {
        let doc = self.alloc(DeclKind::DocTypeTag { ty });
        self.bind(doc, target);
        doc
    }

    /// `---@class name: extends...`. Bind it with [`Self::bind`].
    pub fn doc_class(&mut self, name: &str, extends: &[&str]) -> DeclId {
        let atom = self.atom(name);
        let extends = extends.iter().map(|e| self.ty_name(e)).collect();
        let doc = self.alloc(DeclKind::DocClass {
            name: atom,
            extends,
            fields: Vec::new(),
            sources: Vec::new(),
        });
        let global = self.globals.ensure(GlobalCategory::Type, atom);
        self.globals.add_site(global, doc);
        self.link_global(doc, global);
        doc
    }

    /// `---@field name ty` under `class`.
    pub fn doc_field(&mut self, class: DeclId, name: &str, ty: DeclId) -> DeclId {
        let atom = self.atom(name);
        let field = self.alloc(DeclKind::DocField { name: atom, ty });
        self.attach(field, class);
        if let Some(DeclKind::DocClass { fields, .. }) =
            self.arena.get_mut(class).map(|d| &mut d.kind)
        {
            fields.push(field);
        }
        field
    }

    /// `---@param name ty` above `func`.
    pub fn doc_param(&mut self, func: DeclId, name: &str, ty: DeclId) -> DeclId {
        let atom = self.atom(name);
        let doc = self.alloc(DeclKind::DocParam { name: atom, ty });
        self.bind_to_function(doc, func);
        doc
    }

    /// `---@return ty` for the `index`-th (1-based) result of `func`.
    pub fn doc_return(&mut self, func: DeclId, index: u32, ty: DeclId) -> DeclId {
        let doc = self.alloc(DeclKind::DocReturn { index, ty });
        self.bind(doc, func);
        doc
    }

    pub fn doc_vararg(&mut self, func: DeclId, ty: DeclId) -> DeclId {
        let doc = self.alloc(DeclKind::DocVararg { ty });
        self.bind(doc, func);
        doc
    }

    /// `---@overload sig` above `func`; `sig` is usually a `ty_function`.
    pub fn doc_overload(&mut self, func: DeclId, sig: DeclId) -> DeclId {
        let doc = self.alloc(DeclKind::DocOverload { sig });
        self.bind(doc, func);
        doc
    }

    pub fn doc_generic(&mut self, func: DeclId, params: &[&str]) -> DeclId {
        let params = params.iter().map(|p| self.atom(p)).collect();
        let doc = self.alloc(DeclKind::DocGeneric { params });
        self.bind(doc, func);
        doc
    }

    // =========================================================================
    // Type expressions
    // =========================================================================

    pub fn ty_name(&mut self, name: &str) -> DeclId {
        let name = self.atom(name);
        self.alloc(DeclKind::DocTypeName { name })
    }

    pub fn ty_generic(&mut self, name: &str) -> DeclId {
        let name = self.atom(name);
        self.alloc(DeclKind::DocGenericName { name })
    }

    pub fn ty_union(&mut self, alternatives: &[DeclId]) -> DeclId {
        self.alloc(DeclKind::DocType {
            alternatives: alternatives.to_vec(),
        })
    }

    pub fn ty_literal(&mut self, literal: DocLiteral) -> DeclId {
        self.alloc(DeclKind::DocTypeLiteral(literal))
    }

    pub fn ty_string_literal(&mut self, value: &str) -> DeclId {
        let atom = self.atom(value);
        self.ty_literal(DocLiteral::String(atom))
    }

    /// `{ k1: t1, k2: t2 }`
    pub fn ty_table(&mut self, fields: &[(&str, DeclId)]) -> DeclId {
        let fields = fields
            .iter()
            .map(|&(key, ty)| {
                let key = self.atom(key);
                self.alloc(DeclKind::DocTableField { key, ty })
            })
            .collect();
        self.alloc(DeclKind::DocTypeTable { fields })
    }

    pub fn ty_function(&mut self, params: &[DeclId], returns: &[DeclId]) -> DeclId {
        self.alloc(DeclKind::DocTypeFunction {
            params: params.to_vec(),
            returns: returns.to_vec(),
        })
    }

    pub fn ty_array(&mut self, element: DeclId) -> DeclId {
        self.alloc(DeclKind::DocTypeArray { element })
    }
}

#[cfg(test)]
#[path = "../tests/builder_tests.rs"]
mod tests;
