//! Call and return resolution.

use crate::caches::{EachNode, SlotKey};
use crate::resolver::Resolver;
use crate::types::TypeNode;
use lsz_binder::{DeclId, DeclKind};
use tracing::{debug, trace};

impl Resolver<'_> {
    /// Merge the `index`-th (1-based) result of calling `callee` into
    /// `target`.
    ///
    /// The configured delegation constructor (`setmetatable` by default)
    /// yields its first argument plus everything reachable through the
    /// delegation field (`__index`) of its second. Any other callee yields
    /// the return slot of its first function-like member.
    pub(crate) fn call_return(
        &mut self,
        target: SlotKey,
        callee: DeclId,
        index: u32,
        call: DeclId,
        args: &[DeclId],
    ) {
        if self.is_delegation_constructor(callee) {
            if index == 1 {
                self.delegate(target, args);
            }
            return;
        }

        let arena = self.arena;
        let callee_node = self.compile_node(callee);
        let mut cursor = EachNode::new(callee_node);
        while let Some(member) = cursor.next(self.cache.unions()) {
            let TypeNode::Leaf(func) = member else {
                continue;
            };
            match arena.kind(func) {
                Some(DeclKind::Function { .. }) => {
                    let returned = self.compile_return(func, index);
                    self.merge_returned(target, returned, call);
                    return;
                }
                Some(DeclKind::DocTypeFunction { returns, .. }) => {
                    let declared = index
                        .checked_sub(1)
                        .and_then(|i| returns.get(i as usize).copied());
                    if let Some(declared) = declared {
                        self.merge_decl(target, declared);
                    }
                    return;
                }
                _ => {}
            }
        }
        trace!(callee = callee.0, index, "call has no function-like callee");
    }

    fn is_delegation_constructor(&self, callee: DeclId) -> bool {
        match self.arena.kind(callee) {
            Some(DeclKind::GetGlobal { name }) => Some(*name) == self.delegation_constructor,
            _ => false,
        }
    }

    /// `setmetatable(obj, { __index = proto })`
    fn delegate(&mut self, target: SlotKey, args: &[DeclId]) {
        if let Some(&object) = args.first() {
            self.merge_decl(target, object);
        }
        let (Some(&meta), Some(field)) = (args.get(1), self.delegation_field) else {
            return;
        };
        let meta_node = self.compile_node(meta);
        let mut cursor = EachNode::new(meta_node);
        while let Some(member) = cursor.next(self.cache.unions()) {
            for source in self.search_by_key(member, field) {
                self.merge_decl(target, source);
            }
        }
    }

    /// Merge a function's return node for one call. Unbound generic
    /// substitutions are rebound to `call`, so call sites never share them.
    fn merge_returned(&mut self, target: SlotKey, returned: Option<TypeNode>, call: DeclId) {
        let has_template = self.members(returned).iter().any(|member| match member {
            TypeNode::Generic(generic) => self.generics.is_template(*generic),
            _ => false,
        });
        if !has_template {
            self.merge(target, returned);
            return;
        }

        let mut cursor = EachNode::new(returned);
        while let Some(member) = cursor.next(self.cache.unions()) {
            match member {
                TypeNode::Generic(template) => match self.generics.rebind(template, call) {
                    Some(bound) => {
                        debug!(template = template.0, bound = bound.0, call = call.0, "generic call site");
                        self.merge(target, Some(TypeNode::Generic(bound)));
                    }
                    None => self.merge(target, Some(member)),
                },
                other => self.merge(target, Some(other)),
            }
        }
    }

    /// Return slot of `func` at `index`: declared `@return` types when
    /// present, otherwise the selected expression of every `return`.
    pub(crate) fn run_return_rule(&mut self, key: SlotKey, func: DeclId, index: u32) {
        let arena = self.arena;
        let mut has_doc = false;
        for &doc in arena.docs(func) {
            let Some(DeclKind::DocReturn { index: declared, ty }) = arena.kind(doc) else {
                continue;
            };
            if *declared != index {
                continue;
            }
            has_doc = true;
            let template = match self.function_generics(func) {
                Some(manager) if manager.references(arena, *ty) => Some(manager.bind(*ty)),
                _ => None,
            };
            match template {
                Some(template) => {
                    let generic = self.generics.alloc(template);
                    self.merge(key, Some(TypeNode::Generic(generic)));
                }
                None => self.merge_decl(key, *ty),
            }
        }
        if has_doc {
            return;
        }

        let Some(DeclKind::Function { returns, .. }) = arena.kind(func) else {
            return;
        };
        for &ret in returns {
            if let Some(DeclKind::Return { exprs }) = arena.kind(ret) {
                self.select_expr(key, exprs, index);
            }
        }
    }

    /// Merge the `index`-th (1-based) value of a multi-value expression list.
    ///
    /// Past the end of the list, only a trailing call or `...` can still
    /// produce values; the index is shifted onto it. A call resolves through
    /// [`call_return`](Self::call_return). Expanding a trailing `...` is not
    /// resolved.
    pub(crate) fn select_expr(&mut self, target: SlotKey, exprs: &[DeclId], index: u32) {
        let arena = self.arena;
        let Some(position) = index.checked_sub(1).map(|i| i as usize) else {
            return;
        };

        if let Some(&expr) = exprs.get(position) {
            match arena.kind(expr) {
                Some(DeclKind::Call { callee, args }) => self.call_return(target, *callee, 1, expr, args),
                _ => self.merge_decl(target, expr),
            }
            return;
        }

        let Some((last_position, &last)) = exprs.iter().enumerate().last() else {
            return;
        };
        let shifted = index - last_position as u32;
        match arena.kind(last) {
            Some(DeclKind::Call { callee, args }) => self.call_return(target, *callee, shifted, last, args),
            Some(DeclKind::Varargs) => {
                trace!(expr = last.0, index = shifted, "vararg expansion not resolved");
            }
            _ => {}
        }
    }
}

#[cfg(test)]
#[path = "../tests/calls_tests.rs"]
mod tests;
