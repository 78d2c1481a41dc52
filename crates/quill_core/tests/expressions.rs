//! End-to-end behaviour of the expression engine through the public API.

use quill_core::parser::scanner::{Scanner, TokenKind};
use quill_core::{
    JsObject, ParserOptions, QuillError, Scope, Value, bind_pattern, parse, parse_with_options,
};

fn eval(src: &str, scope: &Scope) -> Value {
    parse(src).unwrap().evaluate(scope, false).unwrap()
}

fn object(entries: &[(&str, Value)]) -> JsObject {
    entries.iter().cloned().collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Evaluation
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_arithmetic_and_logic() {
    let scope = Scope::new();
    assert_eq!(eval("1 + 1 * 2 / 2", &scope), Value::from(2));
    assert_eq!(eval("false || true && !false", &scope), Value::from(true));
}

#[test]
fn test_optional_this_on_null() {
    let scope = Scope::new();
    scope.set_this(Value::Null);
    assert_eq!(eval("this?.id", &scope), Value::Undefined);
}

#[test]
fn test_arrow_closure_call() {
    let scope = Scope::from(object(&[("b", Value::from(1))]));
    let f = eval("(a)=>a+b", &scope);
    assert_eq!(f.call(&Value::Undefined, &[Value::from(1)]).unwrap(), Value::from(2));
    assert!(!scope.has("a"));
    assert_eq!(scope.get("b"), Value::from(1));
}

#[test]
fn test_tagged_template_receives_cooked_and_raw() {
    let scope = Scope::new();
    scope.define("name", Value::from("World"));
    scope.define(
        "tag",
        Value::native("tag", |_, args| {
            let strings = &args[0];
            let raw = quill_core::interpreter::ops::get_property(strings, "raw")?;
            Ok(Value::array(vec![strings.clone(), raw, args[1].clone()]))
        }),
    );
    let result = eval(r"tag`\tHello ${name}!!!`", &scope);
    let expected = Value::array(vec![
        Value::array(vec![Value::from("\tHello "), Value::from("!!!")]),
        Value::array(vec![Value::from("\\tHello "), Value::from("!!!")]),
        Value::from("World"),
    ]);
    assert_eq!(result, expected);
}

#[test]
fn test_cache_semantics() {
    let scope = Scope::new();
    scope.define("x", Value::from(2));
    let expr = parse("x * 10").unwrap();
    assert_eq!(expr.evaluate(&scope, true).unwrap(), Value::from(20));
    scope.define("x", Value::from(3));
    assert_eq!(expr.evaluate(&scope, true).unwrap(), Value::from(20));
    assert_eq!(expr.evaluate(&scope, false).unwrap(), Value::from(30));
    let copy = expr.clone();
    scope.define("x", Value::from(4));
    assert_eq!(copy.evaluate(&scope, true).unwrap(), Value::from(40));
}

#[test]
fn test_assignment_writes_through_scope_chain() {
    let root = Scope::new();
    root.define("count", Value::from(1));
    let child = root.child();
    eval("count += 1, fresh = 'new'", &child);
    assert_eq!(root.get("count"), Value::from(2));
    assert_eq!(root.get("fresh"), Value::from("new"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Destructuring
// ─────────────────────────────────────────────────────────────────────────────

fn pattern_of(src: &str) -> quill_core::Pat {
    match parse(&format!("{src} = 0")).unwrap() {
        quill_core::Expr::Assign(a) => match a.left {
            quill_core::parser::ast::AssignTarget::Pat(p) => p,
            quill_core::parser::ast::AssignTarget::Expr(_) => panic!("{src} is not a pattern"),
        },
        other => panic!("unexpected {other}"),
    }
}

#[test]
fn test_bind_array_pattern() {
    let scope = Scope::new();
    let bindings = bind_pattern(
        &pattern_of("[a, ...b]"),
        eval("[1, 2, 3]", &scope),
        &scope,
        None,
        false,
    )
    .unwrap();
    let expected = object(&[
        ("a", Value::from(1)),
        ("b", Value::array(vec![Value::from(2), Value::from(3)])),
    ]);
    assert_eq!(bindings, expected);
}

#[test]
fn test_bind_object_pattern_with_default() {
    let scope = Scope::new();
    let pat = match pattern_of("[{ a = 1, b }]") {
        quill_core::Pat::Array(array) => array.elements[0].clone().unwrap(),
        other => panic!("unexpected {other}"),
    };
    let bindings = bind_pattern(&pat, eval("({ b: 2 })", &scope), &scope, None, false).unwrap();
    assert_eq!(bindings, object(&[("a", Value::from(1)), ("b", Value::from(2))]));
}

// ─────────────────────────────────────────────────────────────────────────────
// Syntax
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_unexpected_keyword_position() {
    let err = parse("1 + if").unwrap_err();
    assert!(err.is_syntax_error());
    assert_eq!(err.position().offset, 4);
    assert!(err.message().contains("if"));
}

#[test]
fn test_numeric_literal_forms() {
    for src in ["0b1010", "0o12", "0x0A", "012", "1_0"] {
        let tokens = Scanner::tokenize_all(src).unwrap();
        assert_eq!(tokens.len(), 1, "{src}");
        assert_eq!(tokens[0].kind, TokenKind::NumericLiteral);
        assert_eq!(eval(src, &Scope::new()), Value::from(10), "{src}");
    }
}

#[test]
fn test_strict_mode_rejects_legacy_octal() {
    let strict = ParserOptions { strict: true };
    assert!(parse_with_options("012", &strict).is_err());
    assert!(parse_with_options("'\\012'", &strict).is_err());
    assert!(parse_with_options("let => 1", &strict).is_err());
    assert!(parse_with_options("let => 1", &ParserOptions::default()).is_ok());
}

#[test]
fn test_runtime_error_kinds() {
    let scope = Scope::new();
    let err = parse("missing").unwrap().evaluate(&scope, false).unwrap_err();
    assert!(matches!(err, QuillError::ReferenceError { .. }));
    let err = parse("null.x").unwrap().evaluate(&scope, false).unwrap_err();
    assert!(matches!(err, QuillError::TypeError { .. }));
}

// ─────────────────────────────────────────────────────────────────────────────
// Self-referential and oversized arrays
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_length_assigned_from_the_same_array() {
    let scope = Scope::new();
    eval("a = [1], a.length = a", &scope);
    assert_eq!(eval("a.length", &scope), Value::from(1));
}

#[test]
fn test_cyclic_array_converts_to_string() {
    let scope = Scope::new();
    assert_eq!(eval("a = [], a[0] = a, a + ''", &scope), Value::from(""));
    assert_eq!(eval("b = [1, a], b[1] = b, `${b}`", &scope), Value::from("1,"));
    assert_eq!(eval("b == b", &scope), Value::from(true));
    // Structurally identical cycles compare equal without recursing forever.
    let other = eval("c = [1, 0], c[1] = c, c", &scope);
    assert_eq!(eval("b", &scope), other);
}

#[test]
fn test_huge_index_and_length_fail_without_allocating() {
    let scope = Scope::new();
    for src in ["a = [], a[4294967294] = 1", "a = [], a.length = 4000000000"] {
        let err = parse(src).unwrap().evaluate(&scope, false).unwrap_err();
        assert!(matches!(err, QuillError::RangeError { .. }), "{src}");
    }
    assert_eq!(eval("a[1000000] = 1, a.length", &scope), Value::from(1_000_001));
    assert_eq!(eval("a.length = 0, a.length", &scope), Value::from(0));
}

#[test]
fn test_rest_with_trailing_comma_is_syntax_error() {
    let err = parse("c = [1,2], [...b,] = c, b").unwrap_err();
    assert!(err.is_syntax_error());
    assert_eq!(err.position().offset, 16);
}

// ─────────────────────────────────────────────────────────────────────────────
// Round trip
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_printed_form_evaluates_the_same() {
    let sources = [
        "1 + 2 * 3 - 4 / 2",
        "(1 + 2) * 3",
        "2 ** 3 ** 2",
        "(-2) ** 2",
        "a?.b ?? 'none'",
        "(a || b) ?? c",
        "[1, , ...[2, 3]].length",
        "({ a: 1, 'b c': 2, [k]: 3, ...{ d: 4 } })[k]",
        "`x${a.b}y${1 + 1}z`",
        "((x, { y = 2 } = {}, ...r) => x + y + r.length)(1)",
        "typeof a === 'object' ? 'obj' : 'other'",
        "a.b = 5, a.b",
        "-(-1)",
        "!(1 in [0, 1])",
        "new (f())().v",
    ];
    for src in sources {
        let scope = Scope::new();
        scope.define("a", Value::object(object(&[("b", Value::from(7))])));
        scope.define("b", Value::from(0));
        scope.define("c", Value::from("c"));
        scope.define("k", Value::from("key"));
        scope.define(
            "f",
            Value::native("f", |_, _| {
                Ok(Value::native("F", |this, _| {
                    quill_core::interpreter::ops::set_property(this, "v", Value::from(9))?;
                    Ok(Value::Undefined)
                }))
            }),
        );

        let expr = parse(src).unwrap();
        let printed = expr.to_string();
        let reparsed = parse(&printed).unwrap_or_else(|e| panic!("{src} -> {printed}: {e}"));
        assert_eq!(reparsed.to_string(), printed, "{src}");

        let first = expr.evaluate(&scope, false).unwrap();
        let second = reparsed.evaluate(&scope, false).unwrap();
        assert_eq!(first, second, "{src} -> {printed}");
    }
}
