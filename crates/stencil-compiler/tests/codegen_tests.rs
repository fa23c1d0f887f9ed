/// Integration tests for code generation

use std::sync::Arc;

use stencil_compiler::{
    generate_in_scope, prepare_tree, CallScope, CompileError, CompileOptions, CompileOutput, Compiler,
    DirectiveRegistry, JavaSrcBackend, JavaSrcOptions, MsgBundle, MsgPart, OverridePolicy, Target,
};

/// Helper to compile a JSON file-set description
fn compile(json: &str, options: CompileOptions) -> Result<Vec<String>, CompileError> {
    let tree = stencil_tree::load_str(json)?;
    let compiler = Compiler::new(options);
    let units = compiler.compile_tree(tree)?;
    Ok(units.into_iter().map(|u| u.code).collect())
}

fn js(json: &str) -> Vec<String> {
    compile(json, CompileOptions::new("inline.json", Target::JsSrc)).expect("compilation failed")
}

const HELLO: &str = r#"{ "files": [ { "path": "hello.stn", "namespace": "app", "templates": [
    { "name": ".hello", "body": [
        { "kind": "text", "text": "Hello " },
        { "kind": "print", "expr": { "data": ["name"] } } ] } ] } ] }"#;

#[test]
fn test_js_template_function() {
    let code = js(HELLO);
    assert_eq!(code.len(), 1);
    let code = &code[0];

    assert!(code.starts_with("// This file was automatically generated from hello.stn."));
    assert!(code.contains("if (typeof app == 'undefined') { var app = {}; }"));
    assert!(code.contains("app.hello = function(opt_data, opt_sb) {"));
    assert!(code.contains("  var output = opt_sb || new stencil.StringBuilder();"));
    assert!(code.contains("  output.append('Hello ');"));
    assert!(code.contains("  output.append(stencil.$$escapeHtml(opt_data.name));"));
    assert!(code.contains("  return opt_sb ? '' : output.toString();"));
}

#[test]
fn test_js_without_namespace_declarations() {
    let options = CompileOptions::new("inline.json", Target::JsSrc).declare_namespaces(false);
    let code = compile(HELLO, options).unwrap();
    assert!(!code[0].contains("typeof app"));
}

#[test]
fn test_cancelling_directive_replaces_default_escape() {
    let json = r#"{ "files": [ { "path": "a.stn", "namespace": "app", "templates": [
        { "name": ".link", "body": [
            { "kind": "print", "expr": { "data": ["url"] },
              "directives": [ { "name": "|escapeUri" } ] },
            { "kind": "print", "expr": { "data": ["raw"] },
              "directives": [ { "name": "|noAutoescape" } ] },
            { "kind": "print", "expr": { "data": ["text"] },
              "directives": [ { "name": "|truncate", "args": [ { "number": 8 } ] } ] } ] } ] } ] }"#;

    let code = &js(json)[0];
    assert!(code.contains("output.append(stencil.$$escapeUri(opt_data.url));"));
    assert!(!code.contains("$$escapeHtml(opt_data.url)"));
    assert!(code.contains("output.append(opt_data.raw);"));
    // Non-cancelling directives run on the escaped value.
    assert!(code.contains(
        "output.append(stencil.$$truncate(stencil.$$escapeHtml(opt_data.text), 8, true));"
    ));
}

#[test]
fn test_autoescape_off_template() {
    let json = r#"{ "files": [ { "path": "a.stn", "namespace": "app", "templates": [
        { "name": ".plain", "autoescape": false, "body": [
            { "kind": "print", "expr": { "data": ["x"] } } ] } ] } ] }"#;
    let code = &js(json)[0];
    assert!(code.contains("output.append(opt_data.x);"));
}

#[test]
fn test_js_if_and_call() {
    let json = r#"{ "files": [ { "path": "a.stn", "namespace": "app", "templates": [
        { "name": ".main", "body": [
            { "kind": "if",
              "branches": [
                { "condition": { "data": ["admin"] }, "body": [ { "kind": "text", "text": "A" } ] },
                { "condition": { "not": { "data": ["guest"] } }, "body": [ { "kind": "text", "text": "U" } ] } ],
              "else_body": [ { "kind": "call", "callee": ".fallback", "data_all": true } ] } ] },
        { "name": ".fallback", "body": [ { "kind": "text", "text": "F" } ] } ] } ] }"#;

    let code = &js(json)[0];
    assert!(code.contains("  if (opt_data.admin) {\n    output.append('A');\n"));
    assert!(code.contains("  } else if (!opt_data.guest) {\n    output.append('U');\n"));
    assert!(code.contains("  } else {\n    app.fallback(opt_data, output);\n  }\n"));
    assert!(code.contains("app.fallback = function(opt_data, opt_sb) {"));
}

#[test]
fn test_one_unit_per_file_in_order() {
    let json = r#"{ "files": [
        { "path": "z.stn", "namespace": "zeta", "templates": [ { "name": ".a" } ] },
        { "path": "a.stn", "namespace": "alpha", "templates": [ { "name": ".a" } ] },
        { "path": "m.stn", "namespace": "mu", "templates": [] } ] }"#;

    let tree = stencil_tree::load_str(json).unwrap();
    let units = Compiler::new(CompileOptions::new("inline.json", Target::JsSrc))
        .compile_tree(tree)
        .unwrap();

    let sources: Vec<&str> = units.iter().map(|u| u.source_path.as_str()).collect();
    assert_eq!(sources, vec!["z.stn", "a.stn", "m.stn"]);
    let names: Vec<&str> = units.iter().map(|u| u.file_name.as_str()).collect();
    assert_eq!(names, vec!["z.js", "a.js", "m.js"]);
    assert!(units[2].code.contains("var mu = {}"));
}

#[test]
fn test_duplicate_template_fails() {
    let json = r#"{ "files": [
        { "path": "a.stn", "namespace": "app", "templates": [ { "name": ".main" } ] },
        { "path": "b.stn", "namespace": "app", "templates": [ { "name": ".main" } ] } ] }"#;

    let err = compile(json, CompileOptions::new("inline.json", Target::JsSrc)).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Found two definitions for template name 'app.main' in two different files a.stn and b.stn."
    );
}

const OVERRIDDEN: &str = r#"{ "files": [
    { "path": "a.stn", "namespace": "app", "templates": [
        { "name": ".main", "body": [ { "kind": "text", "text": "old" } ] },
        { "name": ".other" } ] },
    { "path": "b.stn", "namespace": "app", "templates": [
        { "name": ".main", "override": true, "body": [ { "kind": "text", "text": "new" } ] } ] } ] }"#;

#[test]
fn test_override_keeps_last_by_default() {
    let code = js(OVERRIDDEN);
    assert!(!code[0].contains("app.main = function"));
    assert!(code[0].contains("app.other = function"));
    assert!(code[1].contains("output.append('new');"));
}

#[test]
fn test_override_keep_first() {
    let options = CompileOptions::new("inline.json", Target::JsSrc)
        .override_policy(OverridePolicy::KeepFirst);
    let code = compile(OVERRIDDEN, options).unwrap();
    assert!(code[0].contains("output.append('old');"));
    assert!(!code[1].contains("app.main = function"));
}

#[test]
fn test_java_class_per_file() {
    let options = CompileOptions::new("inline.json", Target::JavaSrc).java_package("com.acme");
    let code = compile(HELLO, options).unwrap();
    let code = &code[0];

    assert!(code.contains("package com.acme;"));
    assert!(code.contains("public final class AppTemplates {"));
    assert!(code.contains("  public static void hello(Map<String, Object> data, StringBuilder sb) {"));
    assert!(code.contains("    sb.append(\"Hello \");"));
    assert!(code.contains(
        "    sb.append(StencilUtils.$$escapeHtml(StencilUtils.$$coerceToString(StencilUtils.$$getData(data, \"name\"))));"
    ));
}

#[test]
fn test_java_rejects_truncate() {
    let json = r#"{ "files": [ { "path": "a.stn", "namespace": "app", "templates": [
        { "name": ".main", "body": [
            { "kind": "print", "expr": { "data": ["x"] },
              "directives": [ { "name": "|truncate", "args": [ { "number": 3 } ] } ] } ] } ] } ] }"#;

    let err = compile(json, CompileOptions::new("inline.json", Target::JavaSrc)).unwrap_err();
    assert!(matches!(
        err,
        CompileError::UnsupportedDirectiveForBackend { ref directive, ref backend, .. }
            if directive == "|truncate" && backend == "Java source"
    ));
}

#[test]
fn test_emission_error_closes_scope() {
    let json = r#"{ "files": [ { "path": "a.stn", "namespace": "app", "templates": [
        { "name": ".main", "body": [
            { "kind": "print", "expr": { "data": ["x"] },
              "directives": [ { "name": "|truncate", "args": [ { "number": 3 } ] } ] } ] } ] } ] }"#;
    let registry = DirectiveRegistry::with_basic_directives();
    let backend = JavaSrcBackend::new(JavaSrcOptions::default());
    let scope = CallScope::new();

    // Front passes without a backend check, so the failure happens during emission.
    let mut tree = stencil_tree::load_str(json).unwrap();
    prepare_tree(&mut tree, &registry, None).unwrap();
    let print_id = tree
        .descendants(tree.root())
        .into_iter()
        .find(|&n| tree.kind(n).label() == "Print")
        .map(|n| tree.id(n).to_string())
        .unwrap();

    let err = generate_in_scope(&backend, &mut tree, None, &scope).unwrap_err();
    assert!(matches!(err, CompileError::UnsupportedDirectiveForBackend { ref node_id, .. } if *node_id == print_id));
    assert!(!scope.is_active());

    // The scope is usable again.
    let mut ok_tree = stencil_tree::load_str(HELLO).unwrap();
    prepare_tree(&mut ok_tree, &registry, None).unwrap();
    assert!(generate_in_scope(&backend, &mut ok_tree, None, &scope).is_ok());
    assert!(!scope.is_active());
}

#[test]
fn test_busy_scope_rejected() {
    let registry = DirectiveRegistry::with_basic_directives();
    let backend = JavaSrcBackend::new(JavaSrcOptions::default());
    let scope = CallScope::new();
    let _frame = scope.enter().unwrap();

    let mut tree = stencil_tree::load_str(HELLO).unwrap();
    prepare_tree(&mut tree, &registry, None).unwrap();
    let err = generate_in_scope(&backend, &mut tree, None, &scope).unwrap_err();
    assert!(matches!(err, CompileError::ScopeReentry));
    assert!(scope.is_active());
}

const GREETING: &str = r#"{ "files": [ { "path": "a.stn", "namespace": "app", "templates": [
    { "name": ".greet", "body": [
        { "kind": "msg", "key": "greeting", "desc": "Greets the user", "body": [
            { "kind": "text", "text": "Hello " },
            { "kind": "print", "expr": { "data": ["name"] } } ] },
        { "kind": "print", "expr": { "bidi": "start_edge" } } ] } ] } ] }"#;

#[test]
fn test_bundle_and_bidi_through_files() {
    let dir = tempfile::tempdir().unwrap();
    let tree_path = dir.path().join("set.json");
    std::fs::write(&tree_path, GREETING).unwrap();

    let bundle = MsgBundle::new("he").with_message(
        "greeting",
        vec![MsgPart::Text("Shalom ".into()), MsgPart::Placeholder("$name".into())],
    );
    let bundle_path = dir.path().join("he.json");
    std::fs::write(&bundle_path, serde_json::to_string(&bundle).unwrap()).unwrap();

    let out_dir = dir.path().join("out");
    let options = CompileOptions::new(&tree_path, Target::JsSrc)
        .bundle(&bundle_path)
        .output_dir(&out_dir);
    let compiler = Compiler::new(options);
    let output = compiler.compile().unwrap();

    let code = &output.units[0].code;
    assert!(code.contains("output.append('Shalom ');"));
    assert!(code.contains("output.append(stencil.$$escapeHtml(opt_data.name));"));
    assert!(!code.contains("Hello"));
    // Hebrew locale derives a right-to-left direction.
    assert!(code.contains("output.append(stencil.$$escapeHtml('right'));"));

    let written = compiler.write_output(&output).unwrap();
    assert_eq!(written, vec![out_dir.join("a.js")]);
    assert_eq!(std::fs::read_to_string(&written[0]).unwrap(), *code);
}

#[test]
fn test_same_stem_in_different_directories() {
    let json = r#"{ "files": [
        { "path": "pages/index.stn", "namespace": "site.pages", "templates": [
            { "name": ".main", "body": [ { "kind": "text", "text": "pages" } ] } ] },
        { "path": "admin/index.stn", "namespace": "site.admin", "templates": [
            { "name": ".main", "body": [ { "kind": "text", "text": "admin" } ] } ] } ] }"#;
    let dir = tempfile::tempdir().unwrap();
    let out_dir = dir.path().join("out");

    let compiler = Compiler::new(CompileOptions::new("inline.json", Target::JsSrc).output_dir(&out_dir));
    let units = compiler.compile_tree(stencil_tree::load_str(json).unwrap()).unwrap();
    let output = CompileOutput {
        source_file: "inline.json".into(),
        units,
    };

    let written = compiler.write_output(&output).unwrap();
    assert_eq!(
        written,
        vec![out_dir.join("pages/index.js"), out_dir.join("admin/index.js")]
    );
    assert!(std::fs::read_to_string(&written[0]).unwrap().contains("'pages'"));
    assert!(std::fs::read_to_string(&written[1]).unwrap().contains("'admin'"));
}

#[test]
fn test_colliding_outputs_are_rejected() {
    let json = r#"{ "files": [
        { "path": "a.stn", "namespace": "app", "templates": [ { "name": ".one" } ] },
        { "path": "b.stn", "namespace": "app", "templates": [ { "name": ".two" } ] } ] }"#;
    let dir = tempfile::tempdir().unwrap();
    let out_dir = dir.path().join("out");

    let compiler = Compiler::new(CompileOptions::new("inline.json", Target::JavaSrc).output_dir(&out_dir));
    let units = compiler.compile_tree(stencil_tree::load_str(json).unwrap()).unwrap();
    assert_eq!(units[0].file_name, units[1].file_name);
    let output = CompileOutput {
        source_file: "inline.json".into(),
        units,
    };

    let err = compiler.write_output(&output).unwrap_err();
    assert!(matches!(
        err,
        CompileError::DuplicateOutput { ref first_source, ref second_source, .. }
            if first_source == "a.stn" && second_source == "b.stn"
    ));
    assert!(!out_dir.exists());
}

#[test]
fn test_java_file_under_package_directory() {
    let json = r#"{ "files": [ { "path": "p.stn", "namespace": "app.user_profile", "templates": [
        { "name": ".card" } ] } ] }"#;
    let tree = stencil_tree::load_str(json).unwrap();
    let units = Compiler::new(CompileOptions::new("inline.json", Target::JavaSrc))
        .compile_tree(tree)
        .unwrap();
    assert_eq!(units[0].file_name, "app/UserProfileTemplates.java");
}

#[test]
fn test_untranslated_message_and_explicit_direction() {
    let options = CompileOptions::new("inline.json", Target::JsSrc).bidi_global_dir(1);
    let code = compile(GREETING, options).unwrap();
    assert!(code[0].contains("output.append('Hello ');"));
    assert!(code[0].contains("output.append(stencil.$$escapeHtml('left'));"));
}

#[test]
fn test_shared_bundle_across_backends() {
    let bundle = Arc::new(MsgBundle::new("fr").with_message(
        "greeting",
        vec![MsgPart::Text("Bonjour ".into()), MsgPart::Placeholder("$name".into())],
    ));
    let registry = DirectiveRegistry::with_basic_directives();

    let mut tree = stencil_tree::load_str(GREETING).unwrap();
    prepare_tree(&mut tree, &registry, None).unwrap();
    let units = stencil_compiler::generate(
        &JavaSrcBackend::new(JavaSrcOptions::default()),
        &mut tree,
        Some(bundle),
    )
    .unwrap();

    assert!(units[0].code.contains("sb.append(\"Bonjour \");"));
    assert!(units[0].code.contains("sb.append(StencilUtils.$$escapeHtml(StencilUtils.$$coerceToString(\"left\")));"));
}
