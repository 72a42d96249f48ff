//! End-to-end inference scenarios, driven through the public API only.

use lsz_binder::{GlobalCategory, Program, ProgramBuilder};
use lsz_common::InferOptions;
use lsz_solver::{Resolver, SlotKey, TypeNode};

fn init_logs() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn type_named(program: &Program, name: &str) -> TypeNode {
    let atom = program.interner.lookup(name).expect("interned");
    let global = program
        .globals
        .get(GlobalCategory::Type, atom)
        .expect("type registered");
    TypeNode::Global(global)
}

#[test]
fn repeated_compiles_hit_the_cache() {
    init_logs();
    let mut b = ProgramBuilder::new();
    let one = b.integer(1);
    let x = b.local("x", Some(one));
    let use_x = b.get_local(x);
    let program = b.finish();
    let mut resolver = Resolver::new(&program);

    let first = resolver.compile_node(use_x);
    let runs = resolver.stats().rule_runs;
    let second = resolver.compile_node(use_x);

    assert_eq!(first, second);
    assert_eq!(resolver.stats().rule_runs, runs);
    assert!(resolver.stats().cache_hits >= 1);
}

#[test]
fn self_recursive_return_terminates_empty() {
    // local f = function() return f() end
    init_logs();
    let mut b = ProgramBuilder::new();
    let func = b.function(&[]);
    let f = b.local("f", Some(func));
    let callee = b.get_local(f);
    let call = b.call(callee, &[]);
    b.ret(func, &[call]);
    let program = b.finish();
    let mut resolver = Resolver::new(&program);

    assert_eq!(resolver.compile_return(func, 1), None);
    assert_eq!(resolver.compile_node(call), None);
    assert!(resolver.stats().cycle_hits >= 1);
}

#[test]
fn merges_extend_one_flat_union() {
    let mut b = ProgramBuilder::new();
    let one = b.integer(1);
    let two = b.integer(2);
    let three = b.integer(3);
    let x = b.local("x", None);
    let program = b.finish();
    let mut resolver = Resolver::new(&program);
    let key = SlotKey::Decl(x);

    resolver.set_node(key, Some(TypeNode::Leaf(one)));
    resolver.set_node(key, Some(TypeNode::Leaf(two)));
    let snapshot = resolver.members(resolver.cache().node(key));
    resolver.set_node(key, Some(TypeNode::Leaf(three)));
    let after = resolver.members(resolver.cache().node(key));

    assert_eq!(snapshot.as_slice(), &[TypeNode::Leaf(one), TypeNode::Leaf(two)]);
    assert!(snapshot.iter().all(|member| after.contains(member)));
    assert_eq!(after.len(), 3);
    assert!(
        after
            .iter()
            .all(|member| !matches!(member, TypeNode::Union(_)))
    );
}

#[test]
fn inherited_field_and_local_override() {
    // ---@class A
    // ---@field x integer
    // ---@class B: A
    // local b1
    // ---@class B: A
    // ---@field x string
    // local b2
    init_logs();
    let mut b = ProgramBuilder::with_builtin_types();
    let class_a = b.doc_class("A", &[]);
    let integer = b.ty_name("integer");
    b.doc_field(class_a, "x", integer);

    let plain_b = b.doc_class("B", &["A"]);
    let b1 = b.local("b1", None);
    b.bind(plain_b, b1);

    let own_b = b.doc_class("B", &["A"]);
    let string = b.ty_name("string");
    let own_x = b.doc_field(own_b, "x", string);
    let b2 = b.local("b2", None);
    b.bind(own_b, b2);

    let instance_ty = b.ty_name("B");
    let obj = b.local("obj", None);
    b.doc_type(obj, instance_ty);
    let use_obj = b.get_local(obj);
    let get = b.get_field(use_obj, "x");
    let program = b.finish();
    let mut resolver = Resolver::new(&program);

    let node = resolver.compile_node(get);
    let members = resolver.members(node);
    assert_eq!(
        members.as_slice(),
        &[type_named(&program, "integer"), type_named(&program, "string")]
    );

    let x = program.interner.lookup("x").expect("interned");
    let class_b = program
        .globals
        .get(GlobalCategory::Type, program.interner.lookup("B").expect("interned"))
        .expect("class B");
    let sources = resolver.class_field_search(class_b, x);
    assert_eq!(sources.len(), 2);
    assert!(sources.contains(&own_x));
}

#[test]
fn delegation_reaches_prototype_fields() {
    // ---@class Base
    // ---@field k string
    // local Base = {}
    // local t = setmetatable({}, { __index = Base })
    // print(t.k)
    init_logs();
    let mut b = ProgramBuilder::with_builtin_types();
    let class = b.doc_class("Base", &[]);
    let string = b.ty_name("string");
    b.doc_field(class, "k", string);
    let base_table = b.table(&[]);
    let base = b.local("Base", Some(base_table));
    b.bind(class, base);

    let empty = b.table(&[]);
    let base_ref = b.get_local(base);
    let meta = b.table(&[("__index", base_ref)]);
    let ctor = b.get_global("setmetatable");
    let call = b.call(ctor, &[empty, meta]);
    let t = b.local("t", Some(call));
    let use_t = b.get_local(t);
    let get = b.get_field(use_t, "k");
    let program = b.finish();
    let mut resolver = Resolver::new(&program);

    assert_eq!(
        resolver.compile_node(get),
        Some(type_named(&program, "string"))
    );
}

#[test]
fn annotation_versus_literal_narrowing() {
    // ---@type string
    // local a = g()      -- g returns 1
    // ---@type string
    // local b = true
    init_logs();
    let mut b = ProgramBuilder::with_builtin_types();
    let one = b.integer(1);
    let g = b.function(&[]);
    b.ret(g, &[one]);
    let g_local = b.local("g", Some(g));
    let callee = b.get_local(g_local);
    let call = b.call(callee, &[]);

    let string_a = b.ty_name("string");
    let a = b.local("a", Some(call));
    b.doc_type(a, string_a);

    let yes = b.boolean(true);
    let string_b = b.ty_name("string");
    let flag = b.local("b", Some(yes));
    b.doc_type(flag, string_b);
    let program = b.finish();
    let string = type_named(&program, "string");

    let mut resolver = Resolver::new(&program);
    let a_members = resolver.compile_node(a);
    assert_eq!(
        resolver.members(a_members).as_slice(),
        &[TypeNode::Leaf(a), string]
    );
    let b_members = resolver.compile_node(flag);
    assert_eq!(
        resolver.members(b_members).as_slice(),
        &[TypeNode::Leaf(flag), string, TypeNode::Leaf(yes)]
    );

    let options = InferOptions {
        literal_narrowing: false,
        ..InferOptions::default()
    };
    let mut strict = Resolver::with_options(&program, options);
    let b_members = strict.compile_node(flag);
    assert_eq!(
        strict.members(b_members).as_slice(),
        &[TypeNode::Leaf(flag), string]
    );
}

#[test]
fn generic_call_sites_are_independent() {
    // ---@generic T
    // ---@param x T
    // ---@return T
    // local function id(x) return x end
    // local a, b = id(1), id("s")
    init_logs();
    let mut b = ProgramBuilder::new();
    let func = b.function(&["x"]);
    let x = b.param(func, "x").expect("param");
    let use_x = b.get_local(x);
    b.ret(func, &[use_x]);
    b.doc_generic(func, &["T"]);
    let param_ty = b.ty_generic("T");
    b.doc_param(func, "x", param_ty);
    let ret_ty = b.ty_generic("T");
    b.doc_return(func, 1, ret_ty);
    let id = b.local("id", Some(func));

    let one = b.integer(1);
    let text = b.string("s");
    let callee_a = b.get_local(id);
    let call_a = b.call(callee_a, &[one]);
    let callee_b = b.get_local(id);
    let call_b = b.call(callee_b, &[text]);
    let program = b.finish();
    let mut resolver = Resolver::new(&program);

    let (Some(TypeNode::Generic(a)), Some(TypeNode::Generic(s))) =
        (resolver.compile_node(call_a), resolver.compile_node(call_b))
    else {
        panic!("generic calls resolve to substitution nodes");
    };
    assert_ne!(a, s);
    assert_eq!(resolver.resolve_generic(a), Some(TypeNode::Leaf(one)));
    assert_eq!(resolver.resolve_generic(s), Some(TypeNode::Leaf(text)));
}

#[test]
fn clear_cache_starts_a_fresh_session() {
    let mut b = ProgramBuilder::new();
    let one = b.integer(1);
    let x = b.local("x", Some(one));
    let program = b.finish();
    let mut resolver = Resolver::new(&program);

    let before = resolver.compile_node(x);
    resolver.clear_cache();
    assert!(resolver.cache().is_empty());
    assert_eq!(resolver.stats().rule_runs, 0);
    assert_eq!(resolver.compile_node(x), before);
}

#[test]
fn deep_expression_chains_do_not_overflow() {
    let mut b = ProgramBuilder::new();
    let one = b.integer(1);
    let mut expr = one;
    for _ in 0..10_000 {
        expr = b.paren(expr);
    }
    let program = b.finish();
    let mut resolver = Resolver::new(&program);

    assert_eq!(resolver.compile_node(expr), Some(TypeNode::Leaf(one)));
    assert_eq!(resolver.stats().rule_runs, 10_001);
}
