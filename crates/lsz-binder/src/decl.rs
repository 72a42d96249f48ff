//! Declaration graph node types.
//!
//! A `Decl` is any construct the engine can attach a type node to: value
//! expressions, bindings, field accesses, calls, and documentation annotation
//! nodes. Nodes live in a [`DeclArena`](crate::DeclArena) and are addressed by
//! stable [`DeclId`] handles, so cyclic references between declarations are
//! plain integers rather than owning pointers.

use crate::globals::GlobalId;
use lsz_common::Atom;
use smallvec::SmallVec;

/// Stable handle of a declaration in its arena.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeclId(pub u32);

impl DeclId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// How a `Local` came into scope.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum LocalRole {
    /// `local x = ...`
    Plain,
    /// Explicit function parameter, including `...`.
    Param,
    /// Receiver introduced by `function obj:method()`.
    ImplicitSelf,
}

/// Literal in a documented type (`---@type "on" | "off"`).
#[derive(Clone, Debug, PartialEq)]
pub enum DocLiteral {
    String(Atom),
    Integer(i64),
    Boolean(bool),
}

/// Closed set of declaration kinds.
///
/// Fields reference other declarations by [`DeclId`]. Annotation nodes are
/// prefixed `Doc`; type-expression nodes are `DocType*`.
#[derive(Clone, Debug, PartialEq)]
pub enum DeclKind {
    // ----- literals -----
    Nil,
    Boolean(bool),
    Integer(i64),
    Number(f64),
    String(Atom),
    /// Table constructor; `fields` are `TableField`s.
    Table {
        fields: Vec<DeclId>,
    },
    /// Function literal. `params` are `Local`s; `returns` are `Return`s.
    Function {
        params: Vec<DeclId>,
        returns: Vec<DeclId>,
        is_method: bool,
    },

    // ----- statements and bindings -----
    Return {
        exprs: Vec<DeclId>,
    },
    Local {
        name: Atom,
        role: LocalRole,
        value: Option<DeclId>,
        /// `GetLocal` and `SetLocal` uses, in source order.
        refs: Vec<DeclId>,
    },
    GetLocal {
        local: DeclId,
    },
    SetLocal {
        local: DeclId,
        value: Option<DeclId>,
    },
    GetGlobal {
        name: Atom,
    },
    SetGlobal {
        name: Atom,
        value: Option<DeclId>,
    },

    // ----- member access -----
    GetField {
        base: DeclId,
        key: Atom,
    },
    SetField {
        base: DeclId,
        key: Atom,
        value: Option<DeclId>,
    },
    GetMethod {
        base: DeclId,
        key: Atom,
    },
    SetMethod {
        base: DeclId,
        key: Atom,
        value: Option<DeclId>,
    },
    /// `t[k]`; `key` is known only for literal string keys.
    GetIndex {
        base: DeclId,
        key: Option<Atom>,
    },
    SetIndex {
        base: DeclId,
        key: Option<Atom>,
        value: Option<DeclId>,
    },
    TableField {
        key: Atom,
        value: Option<DeclId>,
    },
    /// Name token of a field access; its node is its parent's.
    FieldName {
        key: Atom,
    },
    MethodName {
        key: Atom,
    },

    // ----- calls and expressions -----
    Call {
        callee: DeclId,
        args: Vec<DeclId>,
    },
    /// The `index`-th (1-based) result of `call`.
    Select {
        call: DeclId,
        index: u32,
    },
    Varargs,
    Paren {
        expr: DeclId,
    },

    // ----- annotations -----
    /// `---@type T`
    DocTypeTag {
        ty: DeclId,
    },
    /// `---@class Name: Base1, Base2`
    DocClass {
        name: Atom,
        /// `DocTypeName` nodes naming the supertypes.
        extends: Vec<DeclId>,
        /// `DocField` nodes.
        fields: Vec<DeclId>,
        /// Bindings the annotation was attached to.
        sources: Vec<DeclId>,
    },
    /// `---@field name T`
    DocField {
        name: Atom,
        ty: DeclId,
    },
    /// `---@param name T`
    DocParam {
        name: Atom,
        ty: DeclId,
    },
    /// `---@return T` for the `index`-th (1-based) result.
    DocReturn {
        index: u32,
        ty: DeclId,
    },
    /// `---@vararg T`
    DocVararg {
        ty: DeclId,
    },
    /// `---@overload fun(...)`
    DocOverload {
        sig: DeclId,
    },
    /// `---@generic T, U`
    DocGeneric {
        params: Vec<Atom>,
    },

    // ----- type expressions -----
    /// `A | B | C`
    DocType {
        alternatives: Vec<DeclId>,
    },
    DocTypeName {
        name: Atom,
    },
    /// Use of a declared generic parameter.
    DocGenericName {
        name: Atom,
    },
    DocTypeLiteral(DocLiteral),
    /// `{ key: T, ... }`; `fields` are `DocTableField`s.
    DocTypeTable {
        fields: Vec<DeclId>,
    },
    DocTableField {
        key: Atom,
        ty: DeclId,
    },
    /// `fun(params): returns`
    DocTypeFunction {
        params: Vec<DeclId>,
        returns: Vec<DeclId>,
    },
    /// `T[]`
    DocTypeArray {
        element: DeclId,
    },
}

impl DeclKind {
    /// Short lowercase name, used in trace output.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Nil => "nil",
            Self::Boolean(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Table { .. } => "table",
            Self::Function { .. } => "function",
            Self::Return { .. } => "return",
            Self::Local { .. } => "local",
            Self::GetLocal { .. } => "getlocal",
            Self::SetLocal { .. } => "setlocal",
            Self::GetGlobal { .. } => "getglobal",
            Self::SetGlobal { .. } => "setglobal",
            Self::GetField { .. } => "getfield",
            Self::SetField { .. } => "setfield",
            Self::GetMethod { .. } => "getmethod",
            Self::SetMethod { .. } => "setmethod",
            Self::GetIndex { .. } => "getindex",
            Self::SetIndex { .. } => "setindex",
            Self::TableField { .. } => "tablefield",
            Self::FieldName { .. } => "field",
            Self::MethodName { .. } => "method",
            Self::Call { .. } => "call",
            Self::Select { .. } => "select",
            Self::Varargs => "varargs",
            Self::Paren { .. } => "paren",
            Self::DocTypeTag { .. } => "doc.type",
            Self::DocClass { .. } => "doc.class",
            Self::DocField { .. } => "doc.field",
            Self::DocParam { .. } => "doc.param",
            Self::DocReturn { .. } => "doc.return",
            Self::DocVararg { .. } => "doc.vararg",
            Self::DocOverload { .. } => "doc.overload",
            Self::DocGeneric { .. } => "doc.generic",
            Self::DocType { .. } => "doc.type.union",
            Self::DocTypeName { .. } => "doc.type.name",
            Self::DocGenericName { .. } => "doc.generic.name",
            Self::DocTypeLiteral(_) => "doc.type.literal",
            Self::DocTypeTable { .. } => "doc.type.table",
            Self::DocTableField { .. } => "doc.type.field",
            Self::DocTypeFunction { .. } => "doc.type.function",
            Self::DocTypeArray { .. } => "doc.type.array",
        }
    }

    /// Value literals: these always narrow, even under an annotation.
    pub const fn is_literal(&self) -> bool {
        matches!(
            self,
            Self::Nil
                | Self::Boolean(_)
                | Self::Integer(_)
                | Self::Number(_)
                | Self::String(_)
                | Self::Table { .. }
                | Self::Function { .. }
        )
    }

    /// Bindings and assignments (`guide.isSet` in most Lua tooling).
    pub const fn is_assign_target(&self) -> bool {
        matches!(
            self,
            Self::Local { .. }
                | Self::SetLocal { .. }
                | Self::SetGlobal { .. }
                | Self::SetField { .. }
                | Self::SetMethod { .. }
                | Self::SetIndex { .. }
                | Self::TableField { .. }
        )
    }

    /// Child declarations in structural order.
    pub fn children(&self) -> SmallVec<[DeclId; 4]> {
        let mut out = SmallVec::new();
        match self {
            Self::Nil
            | Self::Boolean(_)
            | Self::Integer(_)
            | Self::Number(_)
            | Self::String(_)
            | Self::GetLocal { .. }
            | Self::GetGlobal { .. }
            | Self::FieldName { .. }
            | Self::MethodName { .. }
            | Self::Varargs
            | Self::DocGeneric { .. }
            | Self::DocTypeName { .. }
            | Self::DocGenericName { .. }
            | Self::DocTypeLiteral(_) => {}
            Self::Table { fields } => out.extend(fields.iter().copied()),
            Self::Function {
                params, returns, ..
            } => {
                out.extend(params.iter().copied());
                out.extend(returns.iter().copied());
            }
            Self::Return { exprs } => out.extend(exprs.iter().copied()),
            Self::Local { value, .. }
            | Self::SetLocal { value, .. }
            | Self::SetGlobal { value, .. }
            | Self::TableField { value, .. } => out.extend(*value),
            Self::GetField { base, .. }
            | Self::GetMethod { base, .. }
            | Self::GetIndex { base, .. } => out.push(*base),
            Self::SetField { base, value, .. }
            | Self::SetMethod { base, value, .. }
            | Self::SetIndex { base, value, .. } => {
                out.push(*base);
                out.extend(*value);
            }
            Self::Call { callee, args } => {
                out.push(*callee);
                out.extend(args.iter().copied());
            }
            Self::Select { call, .. } => out.push(*call),
            Self::Paren { expr } => out.push(*expr),
            Self::DocTypeTag { ty }
            | Self::DocField { ty, .. }
            | Self::DocParam { ty, .. }
            | Self::DocReturn { ty, .. }
            | Self::DocVararg { ty }
            | Self::DocTableField { ty, .. } => out.push(*ty),
            Self::DocClass {
                extends, fields, ..
            } => {
                out.extend(extends.iter().copied());
                out.extend(fields.iter().copied());
            }
            Self::DocOverload { sig } => out.push(*sig),
            Self::DocType { alternatives } => out.extend(alternatives.iter().copied()),
            Self::DocTypeTable { fields } => out.extend(fields.iter().copied()),
            Self::DocTypeFunction { params, returns } => {
                out.extend(params.iter().copied());
                out.extend(returns.iter().copied());
            }
            Self::DocTypeArray { element } => out.push(*element),
        }
        out
    }
}

/// One declaration plus the links the binder attaches to it.
#[derive(Clone, Debug)]
pub struct Decl {
    pub kind: DeclKind,
    pub parent: Option<DeclId>,
    /// Annotations bound to this declaration, in source order.
    pub docs: Vec<DeclId>,
    /// Global entity this declaration references, if any.
    pub global: Option<GlobalId>,
}

impl Decl {
    pub const fn new(kind: DeclKind) -> Self {
        Self {
            kind,
            parent: None,
            docs: Vec::new(),
            global: None,
        }
    }
}
