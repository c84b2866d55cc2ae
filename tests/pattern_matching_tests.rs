use setsuna::{evaluate, Value};

fn eval(source: &str) -> Value {
    evaluate(source, "<test>").unwrap_or_else(|e| panic!("evaluation failed: {e}"))
}

fn shows(source: &str) -> String {
    eval(source).to_string()
}

fn eval_err(source: &str) -> String {
    match evaluate(source, "<test>") {
        Ok(value) => panic!("expected failure, got {value}"),
        Err(e) => e.to_string(),
    }
}

#[test]
fn literal_patterns_match_by_value_and_tag() {
    assert_eq!(shows("match 2 { 1 => \"one\", 2 => \"two\", _ => \"many\" }"), "\"two\"");
    assert_eq!(shows("match \"hi\" { \"no\" => 0, \"hi\" => 1 }"), "1");
    assert_eq!(shows("match true { false => 0, true => 1 }"), "1");
    // An int literal pattern does not match a float value.
    assert_eq!(shows("match 1.0 { 1 => \"int\", _ => \"other\" }"), "\"other\"");
}

#[test]
fn variable_patterns_bind_the_scrutinee() {
    assert_eq!(shows("match 41 { x => x + 1 }"), "42");
}

#[test]
fn arm_bindings_do_not_escape_the_arm() {
    let err = eval_err("match 1 { x => x }\nx");
    assert!(err.contains("undefined variable: x"));
}

#[test]
fn wildcard_matches_anything_without_binding() {
    assert_eq!(shows("match [1, 2] { _ => \"anything\" }"), "\"anything\"");
}

#[test]
fn guards_commit_or_discard_arms() {
    let source = "fn classify(n) {\n  match n {\n    x if x < 0 => \"neg\",\n    0 => \"zero\",\n    _ => \"pos\"\n  }\n}\n[classify(-5), classify(0), classify(3)]";
    assert_eq!(shows(source), "[\"neg\", \"zero\", \"pos\"]");
}

#[test]
fn guard_bindings_see_the_pattern_variables() {
    assert_eq!(
        shows("match (3, 4) { (a, b) if a < b => b - a, (a, b) => a - b }"),
        "1"
    );
}

#[test]
fn list_patterns_match_exact_lengths() {
    assert_eq!(shows("match [] { [] => \"empty\", _ => \"no\" }"), "\"empty\"");
    assert_eq!(shows("match [1, 2] { [a, b] => a + b }"), "3");
    assert_eq!(shows("match [1] { [a, b] => 0, _ => 9 }"), "9");
}

#[test]
fn rest_patterns_capture_the_suffix() {
    assert_eq!(shows("match [1, 2, 3, 4] { [h, ...t] => [h, len(t)] }"), "[1, 3]");
    assert_eq!(shows("match [1] { [h, ...t] => t }"), "[]");
    // The fixed prefix must still be present.
    assert_eq!(shows("match [1] { [a, b, ...t] => 0, _ => 9 }"), "9");
}

#[test]
fn tuple_patterns_match_arity() {
    assert_eq!(shows("match (1, 2) { (a, b) => a + b }"), "3");
    assert_eq!(shows("match (1, 2, 3) { (a, b) => 0, _ => 9 }"), "9");
}

#[test]
fn record_patterns_ignore_extra_fields() {
    assert_eq!(shows("match { x: 1, y: 2 } { { x: v } => v }"), "1");
    assert_eq!(
        shows("match { x: 1 } { { x: a, y: b } => a + b, _ => -1 }"),
        "-1"
    );
    assert_eq!(
        shows("match { pos: (3, 4) } { { pos: (x, y) } => x * y }"),
        "12"
    );
}

#[test]
fn constructor_patterns() {
    let source = "type Option { None, Some(Int) }\nfn unwrap_or(o, d) {\n  match o {\n    None => d,\n    Some(x) => x\n  }\n}\n[unwrap_or(Some(42), 0), unwrap_or(None, 7)]";
    assert_eq!(shows(source), "[42, 7]");
}

#[test]
fn bare_nullary_constructors_discriminate_instead_of_binding() {
    // A `None` arm must not swallow `Some(42)`.
    let source = "type Option { None, Some(Int) }\nmatch Some(42) { None => \"none\", Some(x) => \"some\" }";
    assert_eq!(shows(source), "\"some\"");

    let source = "type Option { None, Some(Int) }\nmatch None { None => \"none\", _ => \"other\" }";
    assert_eq!(shows(source), "\"none\"");

    // The constructor arm binds nothing, so later arms still see their
    // own bindings.
    let source = "type Color { Red, Green }\nfn name(c) { match c { Red => \"red\", other => str(other) } }\n[name(Red), name(Green)]";
    assert_eq!(shows(source), "[\"red\", \"Green\"]");

    // A variable that merely holds an ADT value is still a binding
    // pattern: the name is not itself a nullary constructor.
    let source = "type Option { None, Some(Int) }\nlet stored = Some(5)\nmatch None { stored => str(stored) }";
    assert_eq!(shows(source), "\"None\"");
}

#[test]
fn nested_constructor_patterns() {
    let source = "type Tree { Leaf, Node(Tree, Int, Tree) }\nlet t = Node(Node(Leaf, 1, Leaf), 2, Leaf)\nmatch t {\n  Node(Node(_, v, _), _, _) => v,\n  _ => -1\n}";
    assert_eq!(shows(source), "1");
}

#[test]
fn constructor_arity_must_match() {
    // Some(x) against a two-field value falls through to the next arm.
    let source = "type P { MkP(Int, Int), Other(Int) }\nmatch MkP(1, 2) { Other(x) => x, MkP(a, b) => a + b }";
    assert_eq!(shows(source), "3");
}

#[test]
fn arms_try_in_order() {
    assert_eq!(shows("match 1 { _ => \"first\", 1 => \"exact\" }"), "\"first\"");
}

#[test]
fn no_matching_pattern_fails() {
    let err = eval_err("match 3 { 1 => \"one\", 2 => \"two\" }");
    assert!(err.contains("no matching pattern"));

    let err = eval_err("type Option { None, Some(Int) }\nmatch Some(1) { None => 0 }");
    assert!(err.contains("no matching pattern"));
}

#[test]
fn failed_arm_bindings_are_discarded() {
    // The first arm binds `a` before its guard fails; the second arm must
    // not see that binding.
    let source = "match 5 { a if a > 10 => a, b => b * 2 }";
    assert_eq!(shows(source), "10");
}

#[test]
fn match_results_feed_into_expressions() {
    assert_eq!(shows("1 + (match 2 { n => n * 10 })"), "21");
    assert_eq!(shows("let r = match 0 { 0 => \"zero\", _ => \"other\" }\nr"), "\"zero\"");
}
