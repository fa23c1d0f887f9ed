/// Integration tests for rendering

use std::sync::Arc;
use std::thread;

use stencil_compiler::{CallScope, CompileError, MsgBundle, MsgPart, OverridePolicy};
use stencil_eval::{InterpreterOptions, RenderError, Renderer, TemplateData, Value};

fn renderer(json: &str) -> Renderer {
    let tree = stencil_tree::load_str(json).expect("invalid tree");
    Renderer::new(tree, InterpreterOptions::default()).expect("compilation failed")
}

const PAGE: &str = r#"{ "files": [ { "path": "page.stn", "namespace": "site.page", "templates": [
    { "name": ".link", "body": [
        { "kind": "text", "text": "<a href=\"/q?" },
        { "kind": "print", "expr": { "data": ["query"] }, "directives": [ { "name": "|escapeUri" } ] },
        { "kind": "text", "text": "\">" },
        { "kind": "print", "expr": { "data": ["label"] } },
        { "kind": "text", "text": "</a>" } ] },
    { "name": ".raw", "body": [
        { "kind": "print", "expr": { "data": ["html"] }, "directives": [ { "name": "|noAutoescape" } ] } ] },
    { "name": ".short", "body": [
        { "kind": "print", "expr": { "data": ["text"] },
          "directives": [ { "name": "|truncate", "args": [ { "number": 6 } ] } ] } ] },
    { "name": ".plain", "autoescape": false, "body": [
        { "kind": "print", "expr": { "data": ["html"] } } ] } ] } ] }"#;

#[test]
fn test_escape_uri_on_marked_site() {
    let renderer = renderer(PAGE);
    let data = TemplateData::new().with("query", "a b&c").with("label", "<Go>");

    let out = renderer.render("site.page.link", &data, None).unwrap();
    assert_eq!(out, "<a href=\"/q?a%20b%26c\">&lt;Go&gt;</a>");
}

#[test]
fn test_cancel_and_non_cancelling_directives() {
    let renderer = renderer(PAGE).for_namespace("site.page");
    let data = TemplateData::new()
        .with("html", "<b>hi</b>")
        .with("text", "a<b>cdef");

    assert_eq!(renderer.render(".raw", &data, None).unwrap(), "<b>hi</b>");
    assert_eq!(renderer.render(".plain", &data, None).unwrap(), "<b>hi</b>");
    // Truncation runs on the escaped value without splitting `&lt;`.
    assert_eq!(renderer.render(".short", &data, None).unwrap(), "a...");
}

#[test]
fn test_truncate_length_checked_at_render_time() {
    let json = r#"{ "files": [ { "path": "a.stn", "namespace": "app", "templates": [
        { "name": ".main", "body": [
            { "kind": "print", "expr": { "data": ["text"] },
              "directives": [ { "name": "|truncate", "args": [ { "data": ["len"] } ] } ] } ] } ] } ] }"#;
    let renderer = renderer(json);

    let numeric = TemplateData::new().with("text", "abcdefgh").with("len", "5");
    assert_eq!(renderer.render("app.main", &numeric, None).unwrap(), "ab...");

    let bad = TemplateData::new().with("text", "abcdefgh").with("len", "five");
    let err = renderer.render("app.main", &bad, None).unwrap_err();
    assert!(matches!(err, RenderError::Runtime { ref message, .. } if message.contains("|truncate")));
}

#[test]
fn test_namespace_composition() {
    let json = r#"{ "files": [
        { "path": "a.stn", "namespace": "ns1", "templates": [
            { "name": ".foo", "body": [ { "kind": "text", "text": "ns1" } ] } ] },
        { "path": "b.stn", "namespace": "ns2", "templates": [
            { "name": ".foo", "body": [ { "kind": "text", "text": "ns2" } ] } ] } ] }"#;
    let unbound = renderer(json);
    let data = TemplateData::new();

    let bound = unbound.for_namespace("ns1").for_namespace("ns2");
    assert_eq!(bound.render(".foo", &data, None).unwrap(), "ns2");
    assert!(matches!(
        unbound.render(".foo", &data, None),
        Err(RenderError::MissingNamespace(_))
    ));
    assert!(matches!(
        bound.render("ns2.foo", &data, None),
        Err(RenderError::InvalidPartialName(_))
    ));
}

const GREETING: &str = r#"{ "files": [ { "path": "g.stn", "namespace": "app", "templates": [
    { "name": ".greet", "body": [
        { "kind": "msg", "key": "greeting", "desc": "Greets the user", "body": [
            { "kind": "text", "text": "Hello " },
            { "kind": "print", "expr": { "data": ["user", "name"] } },
            { "kind": "text", "text": "!" } ] },
        { "kind": "text", "text": " " },
        { "kind": "print", "expr": { "bidi": "start_edge" } } ] } ] } ] }"#;

#[test]
fn test_messages_resolved_per_render() {
    let renderer = renderer(GREETING).for_namespace("app");
    let data = TemplateData::from_json(r#"{ "user": { "name": "<Ada>" } }"#).unwrap();
    let bundle = Arc::new(MsgBundle::new("ar").with_message(
        "greeting",
        vec![
            MsgPart::Text("Marhaba ".into()),
            MsgPart::Placeholder("$user.name".into()),
        ],
    ));

    assert_eq!(
        renderer.render(".greet", &data, None).unwrap(),
        "Hello &lt;Ada&gt;! left"
    );
    assert_eq!(
        renderer.render(".greet", &data, Some(bundle)).unwrap(),
        "Marhaba &lt;Ada&gt; right"
    );
    // The shared tree was not rewritten by the translated render.
    assert_eq!(
        renderer.render(".greet", &data, None).unwrap(),
        "Hello &lt;Ada&gt;! left"
    );
}

#[test]
fn test_explicit_direction_wins_over_locale() {
    let tree = stencil_tree::load_str(GREETING).unwrap();
    let renderer = Renderer::new(tree, InterpreterOptions::new().bidi_global_dir(1)).unwrap();
    let data = TemplateData::from_json(r#"{ "user": { "name": "Ada" } }"#).unwrap();
    let bundle = Arc::new(MsgBundle::new("he"));

    let out = renderer.render("app.greet", &data, Some(bundle)).unwrap();
    assert!(out.ends_with(" left"));
}

#[test]
fn test_if_and_call() {
    let json = r#"{ "files": [ { "path": "a.stn", "namespace": "app", "templates": [
        { "name": ".main", "body": [
            { "kind": "if",
              "branches": [
                { "condition": { "eq": [ { "data": ["role"] }, { "str": "admin" } ] },
                  "body": [ { "kind": "text", "text": "[admin]" } ] },
                { "condition": { "data": ["guest"] },
                  "body": [ { "kind": "text", "text": "[guest]" } ] } ],
              "else_body": [ { "kind": "text", "text": "[user]" } ] },
            { "kind": "call", "callee": ".name", "data_all": true },
            { "kind": "call", "callee": ".static" } ] },
        { "name": ".name", "body": [ { "kind": "print", "expr": { "data": ["name"] } } ] },
        { "name": ".static", "body": [ { "kind": "text", "text": "." } ] } ] } ] }"#;
    let renderer = renderer(json);

    let admin = TemplateData::new().with("role", "admin").with("name", "Ada");
    assert_eq!(renderer.render("app.main", &admin, None).unwrap(), "[admin]Ada.");

    let guest = TemplateData::new().with("guest", true).with("name", "Bo");
    assert_eq!(renderer.render("app.main", &guest, None).unwrap(), "[guest]Bo.");

    let user = TemplateData::new().with("name", "Cy");
    assert_eq!(renderer.render("app.main", &user, None).unwrap(), "[user]Cy.");
}

#[test]
fn test_null_print_fails() {
    let renderer = renderer(PAGE);
    let err = renderer
        .render("site.page.plain", &TemplateData::new(), None)
        .unwrap_err();
    assert!(matches!(err, RenderError::Runtime { .. }));
}

#[test]
fn test_override_policy_applies() {
    let json = r#"{ "files": [
        { "path": "a.stn", "namespace": "app", "templates": [
            { "name": ".main", "body": [ { "kind": "text", "text": "old" } ] } ] },
        { "path": "b.stn", "namespace": "app", "templates": [
            { "name": ".main", "override": true, "body": [ { "kind": "text", "text": "new" } ] } ] } ] }"#;
    let data = TemplateData::new();

    assert_eq!(renderer(json).render("app.main", &data, None).unwrap(), "new");

    let tree = stencil_tree::load_str(json).unwrap();
    let keep_first = Renderer::new(
        tree,
        InterpreterOptions::new().override_policy(OverridePolicy::KeepFirst),
    )
    .unwrap();
    assert_eq!(keep_first.render("app.main", &data, None).unwrap(), "old");
}

#[test]
fn test_compile_errors_surface() {
    let json = r#"{ "files": [ { "path": "a.stn", "namespace": "app", "templates": [
        { "name": ".main", "body": [
            { "kind": "print", "expr": { "data": ["x"] },
              "directives": [ { "name": "|escapeUri", "args": [ { "number": 1 } ] } ] } ] } ] } ] }"#;
    let tree = stencil_tree::load_str(json).unwrap();
    let err = Renderer::new(tree, InterpreterOptions::default()).unwrap_err();
    assert!(matches!(err, RenderError::Compile(CompileError::Arity { found: 1, .. })));
}

#[test]
fn test_busy_scope_is_released_on_error() {
    let renderer = renderer(PAGE);
    let scope = CallScope::new();

    let err = renderer
        .render_in_scope("site.page.plain", &TemplateData::new(), None, &scope)
        .unwrap_err();
    assert!(matches!(err, RenderError::Runtime { .. }));
    assert!(!scope.is_active());

    let data = TemplateData::new().with("html", "x");
    assert_eq!(
        renderer
            .render_in_scope("site.page.plain", &data, None, &scope)
            .unwrap(),
        "x"
    );
}

#[test]
fn test_concurrent_renders() {
    let renderer = renderer(GREETING).for_namespace("app");
    let bundle = Arc::new(MsgBundle::new("fa").with_message(
        "greeting",
        vec![MsgPart::Text("Salam ".into()), MsgPart::Placeholder("$user.name".into())],
    ));

    thread::scope(|s| {
        for i in 0..8 {
            let renderer = &renderer;
            let bundle = if i % 2 == 0 { Some(Arc::clone(&bundle)) } else { None };
            s.spawn(move || {
                let mut data = TemplateData::new();
                let mut user = std::collections::HashMap::new();
                user.insert("name".to_string(), Value::from(format!("u{}", i)));
                data.insert("user", Value::Object(user));

                let out = renderer.render(".greet", &data, bundle.clone()).unwrap();
                if bundle.is_some() {
                    assert_eq!(out, format!("Salam u{} right", i));
                } else {
                    assert_eq!(out, format!("Hello u{}! left", i));
                }
            });
        }
    });
}

#[test]
fn test_load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("page.json");
    std::fs::write(&path, PAGE).unwrap();

    let tree = stencil_tree::load_file(&path).unwrap();
    let renderer = Renderer::new(tree, InterpreterOptions::default()).unwrap();
    assert!(renderer.for_namespace("site.page").has_template(".link"));
}
