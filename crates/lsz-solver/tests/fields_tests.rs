use super::*;
use lsz_binder::{Program, ProgramBuilder};

fn atom(program: &Program, name: &str) -> Atom {
    program.interner.lookup(name).expect("interned")
}

fn type_global(program: &Program, name: &str) -> TypeNode {
    let global = program
        .globals
        .get(GlobalCategory::Type, atom(program, name))
        .expect("registered");
    TypeNode::Global(global)
}

/// `---@class name: extends...` bound to `local name = {}`.
fn class(b: &mut ProgramBuilder, name: &str, extends: &[&str]) -> DeclId {
    let doc = b.doc_class(name, extends);
    let table = b.table(&[]);
    let local = b.local(name, Some(table));
    b.bind(doc, local);
    doc
}

/// `---@type name` on `local obj`, and a reference to it.
fn instance(b: &mut ProgramBuilder, name: &str) -> DeclId {
    let ty = b.ty_name(name);
    let obj = b.local("obj", None);
    b.doc_type(obj, ty);
    b.get_local(obj)
}

#[test]
fn test_inherited_field_found_through_extends() {
    let mut b = ProgramBuilder::with_builtin_types();
    let a = class(&mut b, "A", &[]);
    let int_ty = b.ty_name("integer");
    let field_x = b.doc_field(a, "x", int_ty);
    class(&mut b, "B", &["A"]);
    let obj = instance(&mut b, "B");
    let get = b.get_field(obj, "x");
    let program = b.finish();
    let mut resolver = Resolver::new(&program);

    let sources = resolver.resolve_member(obj, atom(&program, "x"));
    assert_eq!(sources.as_slice(), &[field_x]);
    assert_eq!(
        resolver.compile_node(get),
        Some(type_global(&program, "integer"))
    );
}

#[test]
fn test_own_field_stops_extends_search() {
    let mut b = ProgramBuilder::with_builtin_types();
    let a = class(&mut b, "A", &[]);
    let int_ty = b.ty_name("integer");
    b.doc_field(a, "x", int_ty);
    let b_class = class(&mut b, "B", &["A"]);
    let str_ty = b.ty_name("string");
    let own_x = b.doc_field(b_class, "x", str_ty);
    let obj = instance(&mut b, "B");
    let get = b.get_field(obj, "x");
    let program = b.finish();
    let mut resolver = Resolver::new(&program);

    let sources = resolver.resolve_member(obj, atom(&program, "x"));
    assert_eq!(sources.as_slice(), &[own_x]);
    assert_eq!(
        resolver.compile_node(get),
        Some(type_global(&program, "string"))
    );
}

#[test]
fn test_each_class_site_searches_independently() {
    let mut b = ProgramBuilder::with_builtin_types();
    let a = class(&mut b, "A", &[]);
    let int_ty = b.ty_name("integer");
    let inherited = b.doc_field(a, "x", int_ty);
    // Two declaration sites of B; only the second declares x.
    class(&mut b, "B", &["A"]);
    let second_site = class(&mut b, "B", &["A"]);
    let str_ty = b.ty_name("string");
    let own_x = b.doc_field(second_site, "x", str_ty);
    let program = b.finish();
    let mut resolver = Resolver::new(&program);

    let b_global = program
        .globals
        .get(GlobalCategory::Type, atom(&program, "B"))
        .expect("registered");
    let sources = resolver.class_field_search(b_global, atom(&program, "x"));
    assert_eq!(sources.as_slice(), &[inherited, own_x]);
}

#[test]
fn test_class_fields_from_bound_source_table() {
    // ---@class Point
    // local Point = { x = 0 }
    let mut b = ProgramBuilder::new();
    let doc = b.doc_class("Point", &[]);
    let zero = b.integer(0);
    let table = b.table(&[("x", zero)]);
    let local = b.local("Point", Some(table));
    b.bind(doc, local);
    let program = b.finish();
    let mut resolver = Resolver::new(&program);

    let point = program.arena.global(doc).expect("linked");
    let sources = resolver.class_field_search(point, atom(&program, "x"));
    assert_eq!(sources.len(), 1);
    assert_eq!(resolver.compile_node(sources[0]), Some(TypeNode::Leaf(zero)));
}

#[test]
fn test_cyclic_extends_terminates() {
    let mut b = ProgramBuilder::new();
    class(&mut b, "A", &["B"]);
    class(&mut b, "B", &["A"]);
    let obj = instance(&mut b, "A");
    let get = b.get_field(obj, "missing");
    let program = b.finish();
    let mut resolver = Resolver::new(&program);

    assert!(
        resolver
            .resolve_member(obj, atom(&program, "missing"))
            .is_empty()
    );
    assert_eq!(resolver.compile_node(get), None);
}

#[test]
fn test_class_depth_limit() {
    let mut b = ProgramBuilder::with_builtin_types();
    let root = class(&mut b, "C0", &[]);
    let int_ty = b.ty_name("integer");
    b.doc_field(root, "x", int_ty);
    class(&mut b, "C1", &["C0"]);
    class(&mut b, "C2", &["C1"]);
    let program = b.finish();
    let leaf_class = program
        .globals
        .get(GlobalCategory::Type, atom(&program, "C2"))
        .expect("registered");

    let mut resolver = Resolver::new(&program);
    assert_eq!(
        resolver
            .class_field_search(leaf_class, atom(&program, "x"))
            .len(),
        1
    );

    let options = lsz_common::InferOptions {
        max_class_depth: 2,
        ..Default::default()
    };
    let mut shallow = Resolver::with_options(&program, options);
    assert!(
        shallow
            .class_field_search(leaf_class, atom(&program, "x"))
            .is_empty()
    );
}

#[test]
fn test_delegation_constructor_follows_index_field() {
    // ---@class Base
    // ---@field k string
    // local Base = {}
    // local t = setmetatable({}, { __index = Base })
    // print(t.k)
    let mut b = ProgramBuilder::with_builtin_types();
    let base_class = class(&mut b, "Base", &[]);
    let str_ty = b.ty_name("string");
    let field_k = b.doc_field(base_class, "k", str_ty);
    let base_local = match b.arena().kind(base_class) {
        Some(DeclKind::DocClass { sources, .. }) => sources[0],
        other => panic!("expected doc.class, got {other:?}"),
    };
    let empty = b.table(&[]);
    let base_ref = b.get_local(base_local);
    let meta = b.table(&[("__index", base_ref)]);
    let ctor = b.get_global("setmetatable");
    let call = b.call(ctor, &[empty, meta]);
    let t = b.local("t", Some(call));
    let t_ref = b.get_local(t);
    let get = b.get_field(t_ref, "k");
    let program = b.finish();
    let mut resolver = Resolver::new(&program);

    let node = resolver.compile_node(t);
    let members = resolver.members(node);
    assert!(members.contains(&TypeNode::Leaf(empty)));
    assert!(members.contains(&type_global(&program, "Base")));

    let sources = resolver.resolve_member(t_ref, atom(&program, "k"));
    assert!(sources.contains(&field_k));
    assert_eq!(
        resolver.compile_node(get),
        Some(type_global(&program, "string"))
    );
}

#[test]
fn test_global_variable_sub_fields() {
    // Config = { k = 1 }
    // print(Config.k)
    let mut b = ProgramBuilder::new();
    let one = b.integer(1);
    let table = b.table(&[("k", one)]);
    b.set_global("Config", table);
    let config = b.get_global("Config");
    let get = b.get_field(config, "k");
    let program = b.finish();
    let sub = program.arena.global(get).expect("linked");
    let mut resolver = Resolver::new(&program);

    let node = resolver.compile_node(get);
    assert_eq!(
        resolver.members(node).as_slice(),
        &[TypeNode::Global(sub), TypeNode::Leaf(one)]
    );
}

#[test]
fn test_search_documented_table_shape() {
    let mut b = ProgramBuilder::with_builtin_types();
    let str_ty = b.ty_name("string");
    let shape = b.ty_table(&[("name", str_ty)]);
    let holder = b.local("h", None);
    b.doc_type(holder, shape);
    let holder_ref = b.get_local(holder);
    let get = b.get_field(holder_ref, "name");
    let program = b.finish();
    let mut resolver = Resolver::new(&program);

    let found = resolver.search_by_key(TypeNode::Leaf(shape), atom(&program, "name"));
    assert_eq!(found.len(), 1);
    assert_eq!(
        resolver.compile_node(get),
        Some(type_global(&program, "string"))
    );
}
