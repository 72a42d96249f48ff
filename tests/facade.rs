//! The facade wires settings files into a resolver.

use lsz::{InferOptions, ProgramBuilder, Resolver, TypeNode};

#[test]
fn settings_file_drives_resolution() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lsz.json");
    std::fs::write(&path, r#"{ "literalNarrowing": "no" }"#).unwrap();
    let options = lsz::config::load_options(&path).unwrap();
    assert_ne!(options, InferOptions::default());

    // ---@type string
    // local flag = true
    let mut b = ProgramBuilder::with_builtin_types();
    let yes = b.boolean(true);
    let string = b.ty_name("string");
    let flag = b.local("flag", Some(yes));
    b.doc_type(flag, string);
    let program = b.finish();

    let mut resolver = Resolver::with_options(&program, options);
    let node = resolver.compile_node(flag);
    let members = resolver.members(node);
    assert_eq!(members.len(), 2);
    assert!(!members.contains(&TypeNode::Leaf(yes)));
}

#[test]
fn init_tracing_without_env_is_a_no_op() {
    // Safe to call any number of times.
    lsz::tracing_config::init_tracing();
    lsz::tracing_config::init_tracing();
}
