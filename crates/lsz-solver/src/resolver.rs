//! Resolution session.
//!
//! A [`Resolver`] borrows a bound program and owns everything the engine
//! computes about it: the node cache, generic managers and call-site
//! substitutions, and statistics. There is no process-wide state; a fresh
//! resolver is a fresh session, and [`Resolver::clear_cache`] is the only
//! invalidation primitive.
//!
//! [`Resolver::compile_node`] is the single entry point. Every rule reaches
//! other declarations through it (or through the slot-keyed variant for
//! function returns and generic instantiations).

use crate::caches::{EachNode, NodeCache, SlotKey, SlotState, compile_trace};
use crate::generics::{GenericArena, GenericManager};
use crate::recursion::{DepthCounter, RecursionProfile};
use crate::types::TypeNode;
use lsz_binder::{
    DeclArena, DeclId, DeclKind, GlobalCategory, GlobalRegistry, IdentityProvider, Program,
};
use lsz_common::limits::{STACK_RED_ZONE, STACK_SEGMENT_SIZE};
use lsz_common::{Atom, InferOptions, Interner};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tracing::{debug, trace};

/// Counters for one resolution session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResolverStats {
    /// Slots whose rules ran. Each slot runs at most once per session.
    pub rule_runs: u64,
    /// Lookups answered by a resolved slot.
    pub cache_hits: u64,
    /// Lookups that landed on an in-progress slot: cycle back-edges.
    pub cycle_hits: u64,
}

pub struct Resolver<'p> {
    pub(crate) arena: &'p DeclArena,
    pub(crate) globals: &'p GlobalRegistry,
    pub(crate) identities: &'p dyn IdentityProvider,
    pub(crate) options: InferOptions,
    pub(crate) cache: NodeCache,
    pub(crate) generics: GenericArena,
    pub(crate) managers: FxHashMap<DeclId, Option<GenericManager>>,
    pub(crate) generic_depth: DepthCounter,
    /// `options.delegation_constructor`, if the program ever mentions it.
    pub(crate) delegation_constructor: Option<Atom>,
    pub(crate) delegation_field: Option<Atom>,
    pub(crate) self_name: Option<Atom>,
    pub(crate) vararg_name: Option<Atom>,
    stats: ResolverStats,
}

impl<'p> Resolver<'p> {
    pub fn new(program: &'p Program) -> Self {
        Self::with_options(program, InferOptions::default())
    }

    pub fn with_options(program: &'p Program, options: InferOptions) -> Self {
        Self::from_parts(
            &program.arena,
            &program.interner,
            &program.globals,
            &program.identities,
            options,
        )
    }

    /// Build a resolver over collaborators that do not come from a
    /// [`Program`], e.g. a custom identity provider.
    pub fn from_parts(
        arena: &'p DeclArena,
        interner: &Interner,
        globals: &'p GlobalRegistry,
        identities: &'p dyn IdentityProvider,
        options: InferOptions,
    ) -> Self {
        let delegation_constructor = interner.lookup(&options.delegation_constructor);
        let delegation_field = interner.lookup(&options.delegation_field);
        Self {
            arena,
            globals,
            identities,
            cache: NodeCache::new(),
            generics: GenericArena::new(),
            managers: FxHashMap::default(),
            generic_depth: DepthCounter::with_profile(RecursionProfile::GenericInstantiation),
            delegation_constructor,
            delegation_field,
            self_name: interner.lookup("self"),
            vararg_name: interner.lookup("..."),
            options,
            stats: ResolverStats::default(),
        }
    }

    pub fn options(&self) -> &InferOptions {
        &self.options
    }

    pub fn stats(&self) -> ResolverStats {
        self.stats
    }

    pub fn cache(&self) -> &NodeCache {
        &self.cache
    }

    // =========================================================================
    // Entry points
    // =========================================================================

    /// Resolve `decl` to its type node. `None` is the empty node.
    pub fn compile_node(&mut self, decl: DeclId) -> Option<TypeNode> {
        self.compile_slot(SlotKey::Decl(decl))
    }

    /// Resolve the `index`-th (1-based) return slot of function `func`.
    pub fn compile_return(&mut self, func: DeclId, index: u32) -> Option<TypeNode> {
        self.compile_slot(SlotKey::Return { func, index })
    }

    pub(crate) fn compile_slot(&mut self, key: SlotKey) -> Option<TypeNode> {
        if let Some(slot) = self.cache.slot(key) {
            match slot.state {
                SlotState::Resolved => self.stats.cache_hits += 1,
                SlotState::InProgress => self.stats.cycle_hits += 1,
            }
            if compile_trace::enabled() {
                let query_id = compile_trace::next_query_id();
                compile_trace::compile_start(query_id, key, self.slot_kind_name(key));
                let members = self.cache.members(slot.node).len();
                compile_trace::compile_end(query_id, key, members, true);
            }
            return slot.node;
        }

        let query_id = compile_trace::enabled().then(compile_trace::next_query_id);
        if let Some(query_id) = query_id {
            compile_trace::compile_start(query_id, key, self.slot_kind_name(key));
        }

        self.cache.begin(key);
        self.stats.rule_runs += 1;
        stacker::maybe_grow(STACK_RED_ZONE, STACK_SEGMENT_SIZE, || self.run_rules(key));
        let node = self.cache.finish(key);

        trace!(?key, ?node, "Resolver::compile_slot");
        if let Some(query_id) = query_id {
            let members = self.cache.members(node).len();
            compile_trace::compile_end(query_id, key, members, false);
        }
        node
    }

    fn run_rules(&mut self, key: SlotKey) {
        match key {
            SlotKey::Decl(decl) => {
                self.resolve_global(key, decl);
                self.run_decl_rule(key, decl);
            }
            SlotKey::Return { func, index } => self.run_return_rule(key, func, index),
            SlotKey::Generic(generic) => self.run_generic_rule(key, generic),
        }
    }

    fn slot_kind_name(&self, key: SlotKey) -> &'static str {
        match key {
            SlotKey::Decl(decl) => self.arena.kind(decl).map_or("<invalid>", DeclKind::name),
            SlotKey::Return { .. } => "function.return",
            SlotKey::Generic(_) => "generic",
        }
    }

    // =========================================================================
    // Node cache surface
    // =========================================================================

    /// Merge `node` into the slot for `key`. See [`NodeCache::set_node`].
    pub fn set_node(&mut self, key: SlotKey, node: Option<TypeNode>) {
        self.cache.set_node(key, node);
    }

    /// Restartable cursor over the members of `node`; advance it with
    /// [`Resolver::next_member`].
    pub fn each_node(&self, node: Option<TypeNode>) -> EachNode {
        self.cache.each_node(node)
    }

    pub fn next_member(&self, cursor: &mut EachNode) -> Option<TypeNode> {
        cursor.next(self.cache.unions())
    }

    pub fn members(&self, node: Option<TypeNode>) -> SmallVec<[TypeNode; 4]> {
        self.cache.members(node)
    }

    /// Reset the whole session: every slot, union, generic manager and
    /// call-site substitution, and the statistics.
    pub fn clear_cache(&mut self) {
        debug!(
            slots = self.cache.len(),
            generics = self.generics.len(),
            managers = self.managers.len(),
            "Resolver::clear_cache"
        );
        self.cache.clear();
        self.generics.clear();
        self.managers.clear();
        self.generic_depth.reset();
        self.stats = ResolverStats::default();
    }

    #[inline]
    pub(crate) fn merge(&mut self, target: SlotKey, node: Option<TypeNode>) {
        self.cache.set_node(target, node);
    }

    /// Merge the node of `decl` into `target`.
    #[inline]
    pub(crate) fn merge_decl(&mut self, target: SlotKey, decl: DeclId) {
        let node = self.compile_node(decl);
        self.cache.set_node(target, node);
    }

    /// Whether an assigned value contributes next to (or instead of) an
    /// annotation.
    pub(crate) fn accepts_value(&self, has_doc: bool, value: DeclId) -> bool {
        !has_doc || (self.options.literal_narrowing && self.arena.is_literal(value))
    }

    // =========================================================================
    // Global resolution
    // =========================================================================

    /// Runs before the kind rule of every declaration.
    fn resolve_global(&mut self, key: SlotKey, decl: DeclId) {
        let Some(global) = self.arena.global(decl) else {
            return;
        };
        self.merge(key, Some(TypeNode::Global(global)));

        let globals = self.globals;
        if globals.category(global) != Some(GlobalCategory::Variable) {
            return;
        }
        let sites = globals.sites(global);
        let mut has_doc = false;
        for &site in sites {
            has_doc |= self.bind_docs(key, site);
        }
        for &site in sites {
            let Some(value) = self.arena.value_of(site) else {
                continue;
            };
            if self.accepts_value(has_doc, value) {
                self.merge_decl(key, value);
            }
        }
    }

    // =========================================================================
    // Documentation binding & identity merge
    // =========================================================================

    /// Merge every annotation bound to `decl` that applies to it into
    /// `target`. Returns whether any applied.
    ///
    /// - `@type` applies to any non-parameter declaration
    /// - `@class` applies to a plain local, or to a global assignment target
    /// - `@param` applies to the parameter it names
    pub(crate) fn bind_docs(&mut self, target: SlotKey, decl: DeclId) -> bool {
        let arena = self.arena;
        let is_param = arena.is_param(decl);
        let local_name = match arena.kind(decl) {
            Some(DeclKind::Local { name, .. }) => Some(*name),
            _ => None,
        };
        let mut matched = false;
        for &doc in arena.docs(decl) {
            let applies = match arena.kind(doc) {
                Some(DeclKind::DocTypeTag { .. }) => !is_param,
                Some(DeclKind::DocClass { .. }) => {
                    (local_name.is_some() && !is_param)
                        || (arena.global(decl).is_some() && arena.is_assign_target(decl))
                }
                Some(DeclKind::DocParam { name, .. }) => is_param && local_name == Some(*name),
                _ => false,
            };
            if applies {
                matched = true;
                self.merge_decl(target, doc);
            }
        }
        matched
    }

    /// Merge everything known about the field identity of `decl`:
    /// annotations on any member first, then assigned values when no
    /// annotation matched or the value is a literal.
    pub(crate) fn merge_by_identity(&mut self, target: SlotKey, decl: DeclId) {
        let identities = self.identities;
        let group = identities.group(decl);
        let group = if group.is_empty() {
            std::slice::from_ref(&decl)
        } else {
            group
        };

        let mut has_doc = false;
        for &member in group {
            has_doc |= self.bind_docs(target, member);
        }
        for &member in group {
            let Some(value) = self.arena.value_of(member) else {
                continue;
            };
            if self.accepts_value(has_doc, value) {
                self.merge_decl(target, value);
            }
        }
    }
}

#[cfg(test)]
#[path = "../tests/resolver_tests.rs"]
mod tests;
