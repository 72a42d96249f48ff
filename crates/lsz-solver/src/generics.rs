//! Generic signature resolution.
//!
//! ```lua
//! ---@generic T
//! ---@param x T
//! ---@return T
//! local function id(x) return x end
//! local a = id(1)      -- integer
//! local b = id("s")    -- string
//! ```
//!
//! A function's [`GenericManager`] is built lazily from its `@generic`
//! annotations (and cached as "none" when it has none). A `@return` type
//! that mentions a registered parameter resolves to a template
//! [`GenericNode`]; every call site rebinds the template to itself, and the
//! bound node is instantiated by inferring each parameter from the call's
//! arguments.

use crate::caches::SlotKey;
use crate::resolver::Resolver;
use crate::types::{GenericId, TypeNode};
use lsz_binder::{DeclArena, DeclId, DeclKind};
use lsz_common::Atom;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tracing::{debug, trace};

/// Generic parameters declared by one function.
#[derive(Clone, Debug)]
pub struct GenericManager {
    func: DeclId,
    /// Declaration order, no duplicates.
    params: SmallVec<[Atom; 2]>,
}

impl GenericManager {
    pub fn new(func: DeclId) -> Self {
        Self {
            func,
            params: SmallVec::new(),
        }
    }

    pub fn register(&mut self, name: Atom) {
        if !self.params.contains(&name) {
            self.params.push(name);
        }
    }

    pub fn is_registered(&self, name: Atom) -> bool {
        self.params.contains(&name)
    }

    pub fn params(&self) -> &[Atom] {
        &self.params
    }

    pub fn func(&self) -> DeclId {
        self.func
    }

    /// Registered parameter named by a type-expression node, if any.
    fn param_use(&self, kind: &DeclKind) -> Option<Atom> {
        match kind {
            DeclKind::DocGenericName { name } | DeclKind::DocTypeName { name }
                if self.is_registered(*name) =>
            {
                Some(*name)
            }
            _ => None,
        }
    }

    /// Whether `ty` mentions a registered parameter anywhere below it.
    pub fn references(&self, arena: &DeclArena, ty: DeclId) -> bool {
        arena.any_in_subtree(ty, |kind| self.param_use(kind).is_some())
    }

    /// Parameters `ty` names directly or as a union alternative.
    fn direct_uses(&self, arena: &DeclArena, ty: DeclId) -> SmallVec<[Atom; 2]> {
        let Some(kind) = arena.kind(ty) else {
            return SmallVec::new();
        };
        if let DeclKind::DocType { alternatives } = kind {
            return alternatives
                .iter()
                .filter_map(|&alt| arena.kind(alt).and_then(|k| self.param_use(k)))
                .collect();
        }
        self.param_use(kind).into_iter().collect()
    }

    /// Bind `proto` to a fresh, not yet call-bound substitution context.
    pub fn bind(&self, proto: DeclId) -> GenericNode {
        GenericNode {
            func: self.func,
            proto,
            call: None,
        }
    }
}

/// A type expression of a generic function, scoped to one call.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct GenericNode {
    pub func: DeclId,
    /// Type expression to instantiate.
    pub proto: DeclId,
    /// Call site supplying the arguments. `None` for the template stored in
    /// the function's return slot.
    pub call: Option<DeclId>,
}

#[derive(Default)]
pub struct GenericArena {
    nodes: Vec<GenericNode>,
}

impl GenericArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, node: GenericNode) -> GenericId {
        let id = GenericId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub fn get(&self, id: GenericId) -> Option<GenericNode> {
        self.nodes.get(id.0 as usize).copied()
    }

    pub fn is_template(&self, id: GenericId) -> bool {
        self.get(id).is_some_and(|node| node.call.is_none())
    }

    /// Copy template `id` bound to `call`. `None` if `id` is not a template.
    pub fn rebind(&mut self, id: GenericId, call: DeclId) -> Option<GenericId> {
        let node = self.get(id).filter(|node| node.call.is_none())?;
        Some(self.alloc(GenericNode {
            call: Some(call),
            ..node
        }))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }
}

type Substitutions = FxHashMap<Atom, SmallVec<[TypeNode; 4]>>;

impl Resolver<'_> {
    /// The generic manager of `func`, built on first use.
    pub fn function_generics(&mut self, func: DeclId) -> Option<&GenericManager> {
        if !self.managers.contains_key(&func) {
            let manager = self.build_manager(func);
            self.managers.insert(func, manager);
        }
        self.managers.get(&func).and_then(Option::as_ref)
    }

    fn build_manager(&self, func: DeclId) -> Option<GenericManager> {
        let arena = self.arena;
        let mut manager = GenericManager::new(func);
        for &doc in arena.docs(func) {
            if let Some(DeclKind::DocGeneric { params }) = arena.kind(doc) {
                for &name in params {
                    manager.register(name);
                }
            }
        }
        trace!(func = func.0, params = manager.params.len(), "GenericManager::build");
        (!manager.params.is_empty()).then_some(manager)
    }

    pub fn generic(&self, id: GenericId) -> Option<GenericNode> {
        self.generics.get(id)
    }

    /// Instantiated node of a generic substitution.
    pub fn resolve_generic(&mut self, id: GenericId) -> Option<TypeNode> {
        self.compile_slot(SlotKey::Generic(id))
    }

    pub(crate) fn run_generic_rule(&mut self, key: SlotKey, id: GenericId) {
        let Some(node) = self.generics.get(id) else {
            return;
        };
        if !self.generic_depth.enter() {
            debug!(generic = id.0, "generic instantiation depth exceeded");
            return;
        }
        let substitutions = match node.call {
            Some(call) => self.infer_substitutions(node.func, call),
            None => Substitutions::default(),
        };
        self.instantiate(key, node.func, node.proto, &substitutions);
        self.generic_depth.leave();
    }

    /// Infer each generic parameter from the arguments whose `@param` type
    /// names it.
    fn infer_substitutions(&mut self, func: DeclId, call: DeclId) -> Substitutions {
        let arena = self.arena;
        let mut substitutions = Substitutions::default();
        let Some(DeclKind::Function { params, .. }) = arena.kind(func) else {
            return substitutions;
        };

        for &doc in arena.docs(func) {
            let Some(DeclKind::DocParam { name, ty }) = arena.kind(doc) else {
                continue;
            };
            let uses = match self.function_generics(func) {
                Some(manager) => manager.direct_uses(arena, *ty),
                None => return substitutions,
            };
            if uses.is_empty() {
                continue;
            }
            let position = params.iter().position(|&param| {
                matches!(arena.kind(param), Some(DeclKind::Local { name: n, .. }) if n == name)
            });
            let Some(arg) = position.and_then(|p| self.call_argument(call, p)) else {
                continue;
            };

            let arg_node = self.compile_node(arg);
            let members = self.members(arg_node);
            for name in uses {
                let entry = substitutions.entry(name).or_default();
                for &member in &members {
                    if !entry.contains(&member) {
                        entry.push(member);
                    }
                }
            }
        }
        substitutions
    }

    /// Argument passed for parameter `position` of the called function.
    /// A colon call passes the receiver as parameter 0.
    fn call_argument(&self, call: DeclId, position: usize) -> Option<DeclId> {
        let arena = self.arena;
        let Some(DeclKind::Call { callee, args }) = arena.kind(call) else {
            return None;
        };
        if matches!(arena.kind(*callee), Some(DeclKind::GetMethod { .. })) {
            return match position {
                0 => arena.base_of(*callee),
                p => args.get(p - 1).copied(),
            };
        }
        args.get(position).copied()
    }

    fn instantiate(&mut self, key: SlotKey, func: DeclId, ty: DeclId, substitutions: &Substitutions) {
        let arena = self.arena;
        let param = match arena.kind(ty) {
            Some(kind) => self.function_generics(func).and_then(|m| m.param_use(kind)),
            None => return,
        };
        if let Some(param) = param {
            if let Some(members) = substitutions.get(&param) {
                for &member in members {
                    self.merge(key, Some(member));
                }
            }
            return;
        }
        match arena.kind(ty) {
            Some(DeclKind::DocType { alternatives }) => {
                for &alternative in alternatives {
                    self.instantiate(key, func, alternative, substitutions);
                }
            }
            _ => self.merge_decl(key, ty),
        }
    }
}

#[cfg(test)]
#[path = "../tests/generics_tests.rs"]
mod tests;
