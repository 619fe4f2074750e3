//! Sandboxed evaluation leaves no trace

use std::sync::Arc;

use confwood::expr::{BinaryOp, ScopeSpecifier, SetOp};
use confwood::*;

struct Snapshot {
    globals: Vec<String>,
    locals: String,
    this: String,
    items: usize,
    rules: usize,
}

fn snapshot(ctx: &EvalContext, frame: &ScriptFrame<'_>) -> Snapshot {
    let locals = frame
        .locals
        .as_ref()
        .map(|l| Value::Dictionary(Arc::clone(l)).to_string())
        .unwrap_or_default();
    Snapshot {
        globals: ctx.globals().keys(),
        locals,
        this: frame.this.to_string(),
        items: ctx.registry().len(),
        rules: ctx.apply_rules().len(),
    }
}

fn assert_unchanged(before: &Snapshot, after: &Snapshot) {
    assert_eq!(before.globals, after.globals);
    assert_eq!(before.locals, after.locals);
    assert_eq!(before.this, after.this);
    assert_eq!(before.items, after.items);
    assert_eq!(before.rules, after.rules);
}

fn side_effects() -> Vec<(&'static str, Expr)> {
    let var = |name: &str| Expr::variable(name);
    vec![
        ("assign local", Expr::set(var("x"), Expr::literal(1))),
        ("assign field", Expr::set(Expr::dot(var("host"), "name"), Expr::literal("y"))),
        (
            "compound assign",
            Expr::set_op(var("counter"), SetOp::Add, Expr::literal(1)),
        ),
        (
            "assign global",
            Expr::set(
                Expr::dot(Expr::scope(ScopeSpecifier::Global), "Leak"),
                Expr::literal(1),
            ),
        ),
        ("array add", Expr::method_call(var("list"), "add", vec![Expr::literal(1)])),
        ("log", Expr::call(var("log"), vec![Expr::literal("hi")])),
        ("function", Expr::function("f", vec![], Expr::empty())),
        ("while", Expr::while_loop(Expr::literal(false), Expr::empty())),
        ("object", Expr::object("Host", "sneaky", Expr::empty())),
        ("template", Expr::template("Host", "sneaky", Expr::empty())),
        (
            "apply",
            Expr::apply("Service", "", Expr::literal("s"), None, Expr::empty()),
        ),
        ("import", Expr::import(Expr::literal("generic-host"))),
        ("const", Expr::set_const("Leak", Expr::literal(1))),
        ("using", Expr::using(Expr::variable("Math"))),
        (
            "nested in expression",
            Expr::binary(
                BinaryOp::Add,
                Expr::literal(1),
                Expr::block(vec![Expr::set(var("x"), Expr::literal(2)), Expr::literal(3)]),
            ),
        ),
    ]
}

#[test]
fn test_side_effects_are_rejected_without_trace() {
    let ctx = EvalContext::new();
    let this = Value::dictionary_from([("type", Value::from("Host")), ("name", Value::from("h"))]);
    let mut frame = ScriptFrame::new(&ctx).with_this(this);
    frame.define("counter", Value::from(0)).unwrap();
    frame.define("host", Value::dictionary_from([("name", Value::from("web1"))])).unwrap();
    frame.define("list", Value::array(vec![])).unwrap();
    frame.sandboxed = true;

    for (label, expr) in side_effects() {
        let before = snapshot(&ctx, &frame);
        let err = expr.evaluate(&mut frame).unwrap_err();
        assert!(err.is_sandbox_violation(), "{label}: {err}");
        assert_unchanged(&before, &snapshot(&ctx, &frame));
    }
    assert!(frame.imports().is_empty());
}

#[test]
fn test_pure_expressions_are_allowed() {
    let ctx = EvalContext::new();
    let mut frame = ScriptFrame::new(&ctx);
    frame.define("host", Value::dictionary_from([("name", Value::from("web1"))])).unwrap();
    frame.sandboxed = true;

    let before = snapshot(&ctx, &frame);
    let pure = Expr::block(vec![
        Expr::conditional(
            Expr::binary(BinaryOp::In, Expr::literal("x"), Expr::array(vec![])),
            Expr::literal(1),
            None,
        ),
        Expr::for_each("n", Expr::array(vec![Expr::literal(1)]), Expr::variable("n")),
        Expr::method_call(Expr::dot(Expr::variable("host"), "name"), "upper", vec![]),
    ]);
    assert_eq!(pure.evaluate_value(&mut frame).unwrap(), Value::from("WEB1"));
    assert_eq!(
        Expr::call(Expr::variable("len"), vec![Expr::literal("abc")])
            .evaluate_value(&mut frame)
            .unwrap(),
        Value::from(3)
    );
    assert_unchanged(&before, &snapshot(&ctx, &frame));
}

#[test]
fn test_script_functions_are_blocked() {
    let ctx = EvalContext::new();
    let mut frame = ScriptFrame::new(&ctx);

    // defined outside the sandbox, called inside it
    let setter = Expr::function("setter", vec![], Expr::set(Expr::variable("y"), Expr::literal(1)));
    let func = setter.evaluate_value(&mut frame).unwrap();
    frame.define("setter", func).unwrap();

    frame.sandboxed = true;
    let err = Expr::call(Expr::variable("setter"), vec![])
        .evaluate(&mut frame)
        .unwrap_err();
    assert!(err.is_sandbox_violation());
}

#[test]
fn test_sandbox_violation_is_not_swallowed_by_filters() {
    let ctx = EvalContext::new();
    let rule = ApplyRule::new("Service", "Host", "s", Arc::new(Expr::empty())).with_filter(Some(
        Arc::new(Expr::call(Expr::variable("log"), vec![Expr::literal("x")])),
    ));
    let err = rule
        .evaluate_filter(&ctx, &[("host", Value::dictionary())])
        .unwrap_err();
    assert_eq!(err.to_string(), "Calling function 'log' is not allowed in sandbox mode");
}
