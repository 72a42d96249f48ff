use super::*;
use lsz_binder::ProgramBuilder;

#[test]
fn test_compile_node_is_memoized() {
    let mut b = ProgramBuilder::new();
    let one = b.integer(1);
    let local = b.local("a", Some(one));
    let program = b.finish();
    let mut resolver = Resolver::new(&program);

    let first = resolver.compile_node(local);
    let runs = resolver.stats().rule_runs;
    assert_eq!(runs, 2);

    let second = resolver.compile_node(local);
    assert_eq!(first, second);
    assert_eq!(resolver.stats().rule_runs, runs);
    assert_eq!(resolver.stats().cache_hits, 1);
    assert_eq!(
        resolver.members(first).as_slice(),
        &[TypeNode::Leaf(local), TypeNode::Leaf(one)]
    );
}

#[test]
fn test_self_recursive_return_terminates_empty() {
    // local f = function() return f() end
    let mut b = ProgramBuilder::new();
    let func = b.function(&[]);
    let f = b.local("f", Some(func));
    let callee = b.get_local(f);
    let call = b.call(callee, &[]);
    b.ret(func, &[call]);
    let program = b.finish();
    let mut resolver = Resolver::new(&program);

    assert_eq!(resolver.compile_return(func, 1), None);
    assert_eq!(resolver.stats().cycle_hits, 1);
    assert_eq!(
        resolver.cache().state(SlotKey::Return { func, index: 1 }),
        Some(SlotState::Resolved)
    );
    assert_eq!(resolver.compile_node(call), None);
}

#[test]
fn test_resolved_empty_is_distinct_from_unvisited() {
    let mut b = ProgramBuilder::new();
    let func = b.function(&[]);
    let ret = b.ret(func, &[]);
    let untouched = b.nil();
    let program = b.finish();
    let mut resolver = Resolver::new(&program);

    assert_eq!(resolver.compile_node(ret), None);
    assert_eq!(
        resolver.cache().state(SlotKey::Decl(ret)),
        Some(SlotState::Resolved)
    );
    assert_eq!(resolver.cache().state(SlotKey::Decl(untouched)), None);

    let runs = resolver.stats().rule_runs;
    assert_eq!(resolver.compile_node(ret), None);
    assert_eq!(resolver.stats().rule_runs, runs);
}

#[test]
fn test_later_merges_are_supersets() {
    let mut b = ProgramBuilder::new();
    let one = b.integer(1);
    let two = b.integer(2);
    let three = b.integer(3);
    let local = b.local("x", None);
    let program = b.finish();
    let mut resolver = Resolver::new(&program);
    let key = SlotKey::Decl(local);

    resolver.set_node(key, Some(TypeNode::Leaf(one)));
    let first = resolver.members(resolver.cache().node(key));
    resolver.set_node(key, Some(TypeNode::Leaf(two)));
    let early = resolver.cache().node(key);
    let second = resolver.members(early);
    resolver.set_node(key, Some(TypeNode::Leaf(three)));
    let last = resolver.members(resolver.cache().node(key));

    assert!(first.iter().all(|m| second.contains(m)));
    assert!(second.iter().all(|m| last.contains(m)));
    assert!(last.len() > second.len() && second.len() > first.len());
    // The union handed out before the last merge sees it.
    assert_eq!(resolver.members(early), last);
}

#[test]
fn test_each_node_cursor() {
    let mut b = ProgramBuilder::new();
    let one = b.integer(1);
    let local = b.local("a", Some(one));
    let program = b.finish();
    let mut resolver = Resolver::new(&program);

    let node = resolver.compile_node(local);
    let mut cursor = resolver.each_node(node);
    let mut seen = Vec::new();
    while let Some(member) = resolver.next_member(&mut cursor) {
        seen.push(member);
    }
    assert_eq!(seen, vec![TypeNode::Leaf(local), TypeNode::Leaf(one)]);
}

#[test]
fn test_clear_cache_resets_session() {
    let mut b = ProgramBuilder::new();
    let one = b.integer(1);
    let local = b.local("a", Some(one));
    let program = b.finish();
    let mut resolver = Resolver::new(&program);

    resolver.compile_node(local);
    resolver.clear_cache();
    assert!(resolver.cache().is_empty());
    assert_eq!(resolver.stats(), ResolverStats::default());

    resolver.compile_node(local);
    assert_eq!(resolver.stats().rule_runs, 2);
}

#[test]
fn test_global_resolution_merges_every_site() {
    let mut b = ProgramBuilder::new();
    let one = b.integer(1);
    b.set_global("G", one);
    let text = b.string("x");
    b.set_global("G", text);
    let get = b.get_global("G");
    let program = b.finish();
    let global = program.arena.global(get).expect("linked");
    let mut resolver = Resolver::new(&program);

    let node = resolver.compile_node(get);
    assert_eq!(
        resolver.members(node).as_slice(),
        &[
            TypeNode::Global(global),
            TypeNode::Leaf(one),
            TypeNode::Leaf(text)
        ]
    );
}

#[test]
fn test_global_annotation_wins_over_inferred_value() {
    let mut b = ProgramBuilder::with_builtin_types();
    let make = b.get_global("make");
    let call = b.call(make, &[]);
    let set = b.set_global("G", call);
    let ty = b.ty_name("string");
    b.doc_type(set, ty);
    let get = b.get_global("G");
    let program = b.finish();
    let global = program.arena.global(get).expect("linked");
    let string = program.interner.lookup("string").expect("interned");
    let string = program
        .globals
        .get(GlobalCategory::Type, string)
        .expect("builtin");
    let mut resolver = Resolver::new(&program);

    let node = resolver.compile_node(get);
    assert_eq!(
        resolver.members(node).as_slice(),
        &[TypeNode::Global(global), TypeNode::Global(string)]
    );
}

struct NoIdentities;

impl IdentityProvider for NoIdentities {
    fn group(&self, _decl: DeclId) -> &[DeclId] {
        &[]
    }

    fn field_sources(&self, _owner: DeclId, _key: Atom) -> &[DeclId] {
        &[]
    }
}

#[test]
fn test_custom_identity_provider() {
    let mut b = ProgramBuilder::new();
    let one = b.integer(1);
    let table = b.table(&[("k", one)]);
    let local = b.local("t", Some(table));
    let base = b.get_local(local);
    let get = b.get_field(base, "k");
    let program = b.finish();

    let mut resolver = Resolver::from_parts(
        &program.arena,
        &program.interner,
        &program.globals,
        &NoIdentities,
        InferOptions::default(),
    );
    // Still found through the table literal itself.
    assert_eq!(resolver.compile_node(get), Some(TypeNode::Leaf(one)));
}
