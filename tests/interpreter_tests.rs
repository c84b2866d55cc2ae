use setsuna::{evaluate, Value};

fn eval(source: &str) -> Value {
    evaluate(source, "<test>").unwrap_or_else(|e| panic!("evaluation failed: {e}"))
}

/// The canonical printed form of the program's result.
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
fn arithmetic_and_precedence() {
    assert_eq!(shows("1 + 2 * 3"), "7");
    assert_eq!(shows("(1 + 2) * 3"), "9");
    assert_eq!(shows("10 - 2 - 3"), "5");
    assert_eq!(shows("7 / 2"), "3");
    assert_eq!(shows("7 % 3"), "1");
    assert_eq!(shows("-3 + 1"), "-2");
}

#[test]
fn float_contagion() {
    assert_eq!(shows("1 + 2.5"), "3.5");
    assert_eq!(shows("7.0 / 2"), "3.5");
    assert_eq!(shows("2.0 * 3"), "6.0");
}

#[test]
fn division_by_zero_fails() {
    assert!(eval_err("1 / 0").contains("division by zero"));
    assert!(eval_err("1 % 0").contains("division by zero"));
}

#[test]
fn string_concatenation() {
    assert_eq!(shows("\"foo\" + \"bar\""), "\"foobar\"");
    assert!(eval_err("\"foo\" + 1").contains("expected a number"));
}

#[test]
fn comparisons_and_equality() {
    assert_eq!(shows("1 < 2"), "true");
    assert_eq!(shows("2 <= 2"), "true");
    assert_eq!(shows("1 > 2"), "false");
    assert_eq!(shows("1 == 1.0"), "false");
    assert_eq!(shows("1 < 1.5"), "true");
    assert_eq!(shows("[1, [2, 3]] == [1, [2, 3]]"), "true");
    assert_eq!(shows("(1, \"a\") != (1, \"b\")"), "true");
}

#[test]
fn logical_operators_require_bools() {
    assert_eq!(shows("true && false"), "false");
    assert_eq!(shows("false || true"), "true");
    assert_eq!(shows("!false"), "true");
    assert!(eval_err("1 && true").contains("expected a boolean"));
}

#[test]
fn short_circuit_skips_the_right_side() {
    let source = "fn boom() { error(\"should not happen\") }\nfalse && boom()";
    assert_eq!(shows(source), "false");

    let source = "fn boom() { error(\"should not happen\") }\ntrue || boom()";
    assert_eq!(shows(source), "true");
}

#[test]
fn let_evaluates_to_the_bound_value() {
    assert_eq!(shows("let x = 41 + 1"), "42");
    assert_eq!(shows("let x = 1\nlet y = x + 1\ny"), "2");
}

#[test]
fn assignment_rebinds_and_returns() {
    assert_eq!(shows("let x = 1\nx = x + 1\nx"), "2");
    assert!(eval_err("y = 1").contains("undefined variable: y"));
}

#[test]
fn const_bindings_reject_assignment_and_redeclaration() {
    let err = eval_err("const k = 1\nk = 2");
    assert!(err.contains("cannot assign to constant"));

    let err = eval_err("const k = 1\nlet k = 2");
    assert!(err.contains("cannot redeclare constant"));

    // The failed assignment must not have changed the binding.
    assert_eq!(shows("const k = 1\nk"), "1");
}

#[test]
fn undefined_variable_reports_location() {
    let err = eval_err("1\nmissing");
    assert!(err.contains("<test>:2:1"));
    assert!(err.contains("undefined variable: missing"));
}

#[test]
fn blocks_scope_and_evaluate_to_the_last_expression() {
    assert_eq!(shows("{ let x = 1\n  x + 1 }"), "2");
    // Shadowing inside a block leaves the outer binding intact.
    assert_eq!(shows("let x = 1\n{ let x = 2\n  x }\nx"), "1");
    assert_eq!(shows("str({})"), "\"()\"");
}

#[test]
fn if_without_else_is_unit() {
    assert_eq!(shows("str(if false { 1 })"), "\"()\"");
    assert_eq!(shows("if true { 1 } else { 2 }"), "1");
    assert_eq!(shows("if false { 1 } else if true { 2 } else { 3 }"), "2");
}

#[test]
fn while_loops() {
    let source = "let i = 0\nlet total = 0\nwhile i < 5 {\n  total = total + i\n  i = i + 1\n}\ntotal";
    assert_eq!(shows(source), "10");
    // A loop whose condition is false from the start is unit.
    assert_eq!(shows("str(while false { 1 })"), "\"()\"");
}

#[test]
fn for_loops_iterate_lists() {
    let source = "let total = 0\nfor x in range(1, 5) { total = total + x }\ntotal";
    assert_eq!(shows(source), "10");
    // The loop's value is the final body value.
    assert_eq!(shows("for x in [1, 2, 3] { x * 2 }"), "6");
    assert!(eval_err("for x in 3 { x }").contains("expected a list"));
}

#[test]
fn closures_capture_their_environment() {
    let source = "fn make_adder(x) { (y) => x + y }\nlet add3 = make_adder(3)\nadd3(10)";
    assert_eq!(shows(source), "13");
}

#[test]
fn captures_observe_later_assignment() {
    // The closure reads the variable at call time, not a snapshot.
    let source = "let x = 1\nfn get() { x }\nx = 10\nget()";
    assert_eq!(shows(source), "10");
}

#[test]
fn recursion_resolves_through_the_name() {
    let source = "fn fact(n) { if n <= 1 { 1 } else { n * fact(n - 1) } }\nfact(5)";
    assert_eq!(shows(source), "120");
}

#[test]
fn call_arity_is_checked() {
    let err = eval_err("fn two(a, b) { a }\ntwo(1)");
    assert!(err.contains("wrong number of arguments: expected 2, got 1"));

    let err = eval_err("len(1, 2)");
    assert!(err.contains("wrong number of arguments"));

    let err = eval_err("let x = 3\nx(1)");
    assert!(err.contains("cannot call non-function"));
}

#[test]
fn lists_and_builtins() {
    assert_eq!(shows("[1, 2, 3]"), "[1, 2, 3]");
    assert_eq!(shows("head([1, 2])"), "1");
    assert_eq!(shows("tail([1, 2, 3])"), "[2, 3]");
    assert_eq!(shows("cons(0, [1, 2])"), "[0, 1, 2]");
    assert_eq!(shows("append([1], 2)"), "[1, 2]");
    assert_eq!(shows("concat([1], [2, 3])"), "[1, 2, 3]");
    assert_eq!(shows("reverse([1, 2, 3])"), "[3, 2, 1]");
    assert_eq!(shows("nth([10, 20], 1)"), "20");
    assert_eq!(shows("len([1, 2, 3])"), "3");
    assert!(eval_err("head([])").contains("empty list"));
    assert!(eval_err("nth([1], 5)").contains("out of bounds"));
}

#[test]
fn tuples_index_by_field() {
    assert_eq!(shows("(1, 2.5, \"s\").2"), "\"s\"");
    assert_eq!(shows("(1, 2).0"), "1");
    assert!(eval_err("(1, 2).9").contains("out of bounds"));
    assert!(eval_err("(1, 2).x").contains("invalid tuple index"));
}

#[test]
fn records_preserve_insertion_order() {
    assert_eq!(shows("{ b: 1, a: 2 }"), "{ b: 1, a: 2 }");
    assert_eq!(shows("let p = { x: 1, y: 2 }\np.x + p.y"), "3");
    assert!(eval_err("{ x: 1 }.z").contains("unknown field: z"));
    // Duplicate fields overwrite in place.
    assert_eq!(shows("{ a: 1, b: 2, a: 3 }"), "{ a: 3, b: 2 }");
}

#[test]
fn maps_keep_insertion_order_and_structural_keys() {
    assert_eq!(shows("%{ \"b\": 1, \"a\": 2 }"), "%{ \"b\": 1, \"a\": 2 }");
    // Overwriting keeps the original position.
    assert_eq!(shows("%{ \"a\": 1, \"b\": 2, \"a\": 9 }"), "%{ \"a\": 9, \"b\": 2 }");
    // Arbitrary keys compare structurally.
    assert_eq!(shows("map_get(%{ (1, 2): \"x\" }, (1, 2))"), "\"x\"");
    assert_eq!(shows("map_has(%{ [1]: true }, [1])"), "true");
    assert_eq!(shows("map_size(map_set(%{}, \"k\", 1))"), "1");
    assert_eq!(shows("map_keys(%{ \"a\": 1, \"b\": 2 })"), "[\"a\", \"b\"]");
    assert_eq!(shows("map_values(%{ \"a\": 1, \"b\": 2 })"), "[1, 2]");
    assert_eq!(shows("map_size(map_remove(%{ \"a\": 1 }, \"a\"))"), "0");
    assert!(eval_err("map_get(%{}, 1)").contains("key not found"));
}

#[test]
fn conversions() {
    assert_eq!(shows("str(42)"), "\"42\"");
    assert_eq!(shows("str(1.5)"), "\"1.5\"");
    assert_eq!(shows("int(3.9)"), "3");
    assert_eq!(shows("int(\"17\")"), "17");
    assert_eq!(shows("float(2)"), "2.0");
    assert!(eval_err("int(\"xyz\")").contains("cannot convert"));
}

#[test]
fn string_builtins() {
    assert_eq!(shows("len(\"hello\")"), "5");
    assert_eq!(shows("uppercase(\"hi\")"), "\"HI\"");
    assert_eq!(shows("substr(\"hello\", 1, 3)"), "\"ell\"");
    assert_eq!(shows("split(\"a,b,c\", \",\")"), "[\"a\", \"b\", \"c\"]");
    assert_eq!(shows("join([1, 2], \"-\")"), "\"1-2\"");
    assert_eq!(shows("trim(\"  x \")"), "\"x\"");
    assert_eq!(shows("contains(\"hello\", \"ell\")"), "true");
    assert_eq!(shows("starts_with(\"hello\", \"he\")"), "true");
    assert_eq!(shows("replace(\"aaa\", \"a\", \"b\")"), "\"baa\"");
    assert_eq!(shows("replace_all(\"aaa\", \"a\", \"b\")"), "\"bbb\"");
    assert_eq!(shows("char_at(\"abc\", 1)"), "\"b\"");
    assert_eq!(shows("index_of(\"hello\", \"llo\")"), "2");
    assert_eq!(shows("index_of(\"hello\", \"x\")"), "-1");
    assert_eq!(shows("chars(\"ab\")"), "[\"a\", \"b\"]");
}

#[test]
fn math_builtins() {
    assert_eq!(shows("abs(-5)"), "5");
    assert_eq!(shows("floor(3.7)"), "3");
    assert_eq!(shows("ceil(3.2)"), "4");
    assert_eq!(shows("round(3.5)"), "4");
    assert_eq!(shows("min(2, 5)"), "2");
    assert_eq!(shows("max(2.5, 1)"), "2.5");
    assert_eq!(shows("sqrt(9.0)"), "3.0");
    assert_eq!(shows("pow(2.0, 10.0)"), "1024.0");
    assert_eq!(shows("sin(0)"), "0.0");
}

#[test]
fn sort_and_compare() {
    assert_eq!(shows("sort([3, 1, 2])"), "[1, 2, 3]");
    assert_eq!(shows("sort([\"b\", \"a\"])"), "[\"a\", \"b\"]");
    assert_eq!(shows("sort([2.5, 1])"), "[1, 2.5]");
    assert_eq!(shows("compare(1, 2)"), "-1");
    assert_eq!(shows("compare(\"b\", \"a\")"), "1");
    assert_eq!(shows("compare(3, 3)"), "0");
    assert!(eval_err("sort([true, false])").contains("sort"));
}

#[test]
fn type_predicates() {
    assert_eq!(shows("is_int(1)"), "true");
    assert_eq!(shows("is_float(1.0)"), "true");
    assert_eq!(shows("is_string(\"s\")"), "true");
    assert_eq!(shows("is_list([])"), "true");
    assert_eq!(shows("is_tuple((1, 2))"), "true");
    assert_eq!(shows("is_record({ a: 1 })"), "true");
    assert_eq!(shows("is_map(%{})"), "true");
    assert_eq!(shows("is_fn(len)"), "true");
    assert_eq!(shows("is_fn((x) => x)"), "true");
    assert_eq!(shows("is_int(\"1\")"), "false");
}

#[test]
fn range_is_half_open() {
    assert_eq!(shows("range(0, 4)"), "[0, 1, 2, 3]");
    assert_eq!(shows("range(3, 3)"), "[]");
}

#[test]
fn error_and_assert() {
    assert!(eval_err("error(\"boom\")").contains("boom"));
    assert_eq!(shows("str(assert(1 == 1, \"fine\"))"), "\"()\"");
    assert!(eval_err("assert(1 == 2, \"bad math\")").contains("assertion failed: bad math"));
}

#[test]
fn adt_constructors_and_printing() {
    let source = "type Color { Red, Green, Blue }\nRed";
    assert_eq!(shows(source), "Red");

    let source = "type Option { None, Some(Int) }\nSome(42)";
    assert_eq!(shows(source), "Some(42)");

    let source = "type Pair { MkPair(Int, Int) }\nMkPair(1, 2) == MkPair(1, 2)";
    assert_eq!(shows(source), "true");

    let err = eval_err("type Option { None, Some(Int) }\nSome(1, 2)");
    assert!(err.contains("wrong number of arguments"));
}

#[test]
fn inline_modules() {
    let source = "module Math {\n  fn double(x) { x * 2 }\n  let twelve = 12\n}\nMath.double(Math.twelve)";
    assert_eq!(shows(source), "24");

    let err = eval_err("module M { let x = 1 }\nM.missing");
    assert!(err.contains("unknown member: missing in module M"));
}

#[test]
fn functions_are_values() {
    assert_eq!(shows("fn id(x) { x }\nstr(id)"), "\"<fn>\"");
    assert_eq!(shows("str(len)"), "\"<builtin:len>\"");
    let source = "fn apply(f, x) { f(x) }\napply((n) => n + 1, 41)";
    assert_eq!(shows(source), "42");
}

#[test]
fn callable_values_are_never_structurally_equal() {
    assert_eq!(shows("((x) => x) == ((x) => x)"), "false");
    assert_eq!(shows("let f = (x) => x\nf == f"), "true");
    assert_eq!(shows("len == len"), "true");
}

mod ast_level {
    //! The surface grammar does not produce interpolated strings,
    //! constructor calls, or module-qualified access; they are part of the
    //! tree model and are evaluated when built directly.

    use setsuna::ast::expression::{Expr, InterpolatedPart};
    use setsuna::error::SourceLocation;
    use setsuna::interpreter::Evaluator;

    fn loc() -> SourceLocation {
        SourceLocation::default()
    }

    #[test]
    fn interpolated_strings_render_parts_in_order() {
        let mut evaluator = Evaluator::with_builtins();
        let globals = evaluator.globals().clone();

        let expr = Expr::InterpolatedStr(
            vec![
                InterpolatedPart::Text("x = ".into()),
                InterpolatedPart::Expr(Expr::Int(42, loc())),
                InterpolatedPart::Text(", s = ".into()),
                // Embedded strings render without quotes.
                InterpolatedPart::Expr(Expr::Str("hi".into(), loc())),
            ],
            loc(),
        );

        let value = evaluator.eval_expr(&expr, &globals).unwrap();
        assert_eq!(value.to_string(), "\"x = 42, s = hi\"");
    }

    #[test]
    fn constructor_call_builds_an_adt_value() {
        let mut evaluator = Evaluator::with_builtins();
        let globals = evaluator.globals().clone();

        let expr = Expr::Constructor {
            type_name: "Option".into(),
            ctor_name: "Some".into(),
            args: vec![Expr::Int(1, loc())],
            location: loc(),
        };

        let value = evaluator.eval_expr(&expr, &globals).unwrap();
        assert_eq!(value.to_string(), "Some(1)");
    }

    #[test]
    fn module_qualified_access_reads_exports() {
        let mut evaluator = Evaluator::with_builtins();
        let globals = evaluator.globals().clone();

        let tokens = setsuna::lexer::tokenize("module M { let answer = 42 }", "<test>").unwrap();
        let program = setsuna::parser::parse(tokens).unwrap();
        evaluator.eval_program(&program).unwrap();

        let expr = Expr::ModuleAccess {
            module: "M".into(),
            member: "answer".into(),
            location: loc(),
        };
        let value = evaluator.eval_expr(&expr, &globals).unwrap();
        assert_eq!(value.to_string(), "42");

        let missing = Expr::ModuleAccess {
            module: "M".into(),
            member: "nope".into(),
            location: loc(),
        };
        assert!(evaluator.eval_expr(&missing, &globals).is_err());
    }
}
