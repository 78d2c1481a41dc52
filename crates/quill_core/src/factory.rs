//! Validated construction of expression trees.
//!
//! The parser is the usual source of [`Expr`] trees; this module builds them
//! programmatically.  Every constructor takes its operands by reference and
//! deep-clones them, so the caller's nodes stay reusable, and wraps an
//! operand in a [`ParenExpr`] whenever it would otherwise bind differently
//! than the tree says.  The resulting tree is the one [`crate::parse`] would
//! produce for its printed form.
//!
//! Nodes built here carry a default (zero) [`SourceLocation`].
//!
//! # Example
//!
//! ```rust
//! use quill_core::factory;
//! use quill_core::parser::ast::BinaryOp;
//!
//! let a = factory::identifier("a").unwrap();
//! let b = factory::identifier("b").unwrap();
//! let sum = factory::binary(BinaryOp::Add, &a, &b);
//! let product = factory::binary(BinaryOp::Mul, &sum, &factory::number(2.0));
//! assert_eq!(product.to_string(), "(a + b) * 2");
//! ```

use std::rc::Rc;

use crate::error::{QuillError, QuillResult};
use crate::objects::value::number_to_string;
use crate::parser::ast::{
    ArrayExpr, ArrowExpr, AssignExpr, AssignOp, AssignTarget, BinaryExpr, BinaryOp, BoolLit,
    CallExpr, ConditionalExpr, EvalCache, Expr, Ident, LogicalExpr, LogicalOp, MemberExpr,
    MemberProp, NewExpr, NullLit, NumLit, ObjectExpr, ObjectProp, ParenExpr, Pat, Prop, PropKey,
    RegExpLit, SequenceExpr, SourceLocation, SpreadElement, StringLit, TaggedTemplateExpr,
    TemplateElement, TemplateLit, ThisExpr, UnaryExpr, UnaryOp, UpdateExpr, UpdateOp,
};
use crate::parser::parser::{is_optional_chain, is_simple_target, validate_regexp_flags};
use crate::parser::pattern::check_duplicate_params;
use crate::parser::printer::{
    ASSIGN, CALL, CONDITIONAL, EXPONENT, UNARY, binary_precedence, chain_needs_grouping,
    logical_precedence, mixes_nullish, precedence,
};
use crate::parser::scanner::{Position, Scanner, TokenKind};

pub use crate::parser::ast::NodeKind;

fn loc() -> SourceLocation {
    SourceLocation::default()
}

/// Returns `expr` wrapped in parentheses.  The original is left untouched.
pub fn parenthesized(expr: &Expr) -> Expr {
    Expr::Paren(Box::new(ParenExpr {
        loc: loc(),
        expression: expr.clone(),
    }))
}

/// Clones `expr`, parenthesizing it when `needs_parens` holds.
fn operand(expr: &Expr, needs_parens: bool) -> Box<Expr> {
    Box::new(if needs_parens {
        parenthesized(expr)
    } else {
        expr.clone()
    })
}

/// Clones an expression used where an assignment expression is expected
/// (arguments, elements, property values).
fn assignment_operand(expr: &Expr) -> Expr {
    if precedence(expr) < ASSIGN {
        parenthesized(expr)
    } else {
        expr.clone()
    }
}

fn invalid(message: impl Into<String>) -> QuillError {
    QuillError::syntax(message, Position::default())
}

// ─────────────────────────────────────────────────────────────────────────────
// Literals and names
// ─────────────────────────────────────────────────────────────────────────────

/// The `null` literal.
pub fn null() -> Expr {
    Expr::Null(NullLit { loc: loc() })
}

/// A boolean literal.
pub fn boolean(value: bool) -> Expr {
    Expr::Bool(BoolLit { loc: loc(), value })
}

/// A numeric literal.
pub fn number(value: f64) -> Expr {
    Expr::Num(NumLit {
        loc: loc(),
        value,
        raw: number_to_string(value),
    })
}

/// A string literal.
pub fn string(value: impl Into<String>) -> Expr {
    Expr::Str(StringLit {
        loc: loc(),
        value: value.into(),
    })
}

/// `this`.
pub fn this() -> Expr {
    Expr::This(ThisExpr { loc: loc() })
}

/// A regular-expression literal.
///
/// # Errors
///
/// SyntaxError for unknown or repeated flags.
pub fn regexp(pattern: impl Into<String>, flags: impl Into<String>) -> QuillResult<Expr> {
    let pattern = pattern.into();
    let flags = flags.into();
    if pattern.is_empty() || pattern.starts_with('*') {
        return Err(invalid("Invalid regular expression: empty or starts with '*'"));
    }
    validate_regexp_flags(&flags, Position::default())?;
    Ok(Expr::Regexp(RegExpLit {
        loc: loc(),
        pattern,
        flags,
    }))
}

/// Returns `true` when `name` scans as exactly one non-reserved identifier.
fn is_valid_identifier(name: &str) -> bool {
    match Scanner::tokenize_all(name).as_deref() {
        Ok([token]) => token.kind == TokenKind::Identifier && token.raw == name,
        _ => false,
    }
}

/// An identifier reference.
///
/// # Errors
///
/// SyntaxError when `name` is not an identifier or is a reserved word.
pub fn identifier(name: &str) -> QuillResult<Expr> {
    if !is_valid_identifier(name) {
        return Err(invalid(format!("Invalid identifier '{name}'")));
    }
    Ok(Expr::Ident(Ident {
        loc: loc(),
        name: name.to_string(),
    }))
}

/// A template literal from its cooked strings and the interpolated
/// expressions between them.
///
/// # Errors
///
/// SyntaxError unless there is exactly one more string than expression.
pub fn template(quasis: &[&str], expressions: &[Expr]) -> QuillResult<Expr> {
    Ok(Expr::Template(Box::new(template_literal(quasis, expressions)?)))
}

fn template_literal(quasis: &[&str], expressions: &[Expr]) -> QuillResult<TemplateLit> {
    if quasis.len() != expressions.len() + 1 {
        return Err(invalid("Template needs exactly one more string than expressions"));
    }
    let last = quasis.len() - 1;
    Ok(TemplateLit {
        loc: loc(),
        quasis: quasis
            .iter()
            .enumerate()
            .map(|(i, cooked)| TemplateElement {
                loc: loc(),
                raw: escape_template(cooked),
                cooked: (*cooked).to_string(),
                tail: i == last,
            })
            .collect(),
        expressions: expressions.to_vec(),
        cache: EvalCache::default(),
    })
}

/// Raw template text that cooks back to `cooked`.
fn escape_template(cooked: &str) -> String {
    let mut raw = String::with_capacity(cooked.len());
    let mut chars = cooked.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '`' => raw.push_str("\\`"),
            '\\' => raw.push_str("\\\\"),
            '$' if chars.peek() == Some(&'{') => raw.push_str("\\$"),
            '\r' => raw.push_str("\\r"),
            other => raw.push(other),
        }
    }
    raw
}

// ─────────────────────────────────────────────────────────────────────────────
// Operators
// ─────────────────────────────────────────────────────────────────────────────

/// `left op right`.
pub fn binary(op: BinaryOp, left: &Expr, right: &Expr) -> Expr {
    let prec = binary_precedence(op);
    let (left_parens, right_parens) = if op == BinaryOp::Exp {
        // Right-associative, and a unary operand may not precede `**`.
        (precedence(left) <= UNARY, precedence(right) < EXPONENT)
    } else {
        (precedence(left) < prec, precedence(right) <= prec)
    };
    Expr::Binary(Box::new(BinaryExpr {
        loc: loc(),
        op,
        left: operand(left, left_parens),
        right: operand(right, right_parens),
        cache: EvalCache::default(),
    }))
}

/// `left && right`, `left || right` or `left ?? right`.
pub fn logical(op: LogicalOp, left: &Expr, right: &Expr) -> Expr {
    let prec = logical_precedence(op);
    Expr::Logical(Box::new(LogicalExpr {
        loc: loc(),
        op,
        left: operand(left, precedence(left) < prec || mixes_nullish(op, left)),
        right: operand(right, precedence(right) <= prec || mixes_nullish(op, right)),
        cache: EvalCache::default(),
    }))
}

/// A prefix unary expression.
pub fn unary(op: UnaryOp, argument: &Expr) -> Expr {
    Expr::Unary(Box::new(UnaryExpr {
        loc: loc(),
        op,
        argument: operand(argument, precedence(argument) < UNARY),
        cache: EvalCache::default(),
    }))
}

/// `++x`, `x--` and friends.
///
/// # Errors
///
/// SyntaxError when `argument` is not an identifier or member expression.
pub fn update(op: UpdateOp, prefix: bool, argument: &Expr) -> QuillResult<Expr> {
    if !is_simple_target(argument) {
        return Err(invalid(if prefix {
            "Invalid left-hand side expression in prefix operation"
        } else {
            "Invalid left-hand side expression in postfix operation"
        }));
    }
    Ok(Expr::Update(Box::new(UpdateExpr {
        loc: loc(),
        op,
        prefix,
        argument: Box::new(argument.clone()),
    })))
}

/// `test ? consequent : alternate`.
pub fn conditional(test: &Expr, consequent: &Expr, alternate: &Expr) -> Expr {
    Expr::Conditional(Box::new(ConditionalExpr {
        loc: loc(),
        test: operand(test, precedence(test) <= CONDITIONAL),
        consequent: Box::new(assignment_operand(consequent)),
        alternate: Box::new(assignment_operand(alternate)),
        cache: EvalCache::default(),
    }))
}

/// `target op value` with an identifier or member target.
///
/// # Errors
///
/// SyntaxError when `target` is not assignable.
pub fn assign(op: AssignOp, target: &Expr, value: &Expr) -> QuillResult<Expr> {
    if !is_simple_target(target) {
        return Err(invalid("Invalid left-hand side in assignment"));
    }
    Ok(Expr::Assign(Box::new(AssignExpr {
        loc: loc(),
        op,
        left: AssignTarget::Expr(Box::new(target.clone())),
        right: Box::new(assignment_operand(value)),
    })))
}

/// Destructuring assignment `pattern = value`.
pub fn assign_pattern(pattern: &Pat, value: &Expr) -> Expr {
    Expr::Assign(Box::new(AssignExpr {
        loc: loc(),
        op: AssignOp::Assign,
        left: AssignTarget::Pat(pattern.clone()),
        right: Box::new(assignment_operand(value)),
    }))
}

/// `a, b, c`.  A single expression is returned as is.
///
/// # Errors
///
/// SyntaxError for an empty list.
pub fn sequence(expressions: &[Expr]) -> QuillResult<Expr> {
    match expressions {
        [] => Err(invalid("Empty sequence expression")),
        [single] => Ok(single.clone()),
        many => Ok(Expr::Sequence(Box::new(SequenceExpr {
            loc: loc(),
            expressions: many.iter().map(assignment_operand).collect(),
        }))),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Member and call chains
// ─────────────────────────────────────────────────────────────────────────────

fn chain_object(object: &Expr) -> Box<Expr> {
    // `new a()` without a following member would swallow the chain, and a
    // numeric literal would absorb the dot.
    let needs_parens = precedence(object) < CALL || matches!(object, Expr::Num(_));
    operand(object, needs_parens)
}

/// `object.name` (or `object?.name`).
///
/// # Errors
///
/// SyntaxError when `name` is not an identifier name.
pub fn member(object: &Expr, name: &str, optional: bool) -> QuillResult<Expr> {
    let valid = match Scanner::tokenize_all(name).as_deref() {
        Ok([token]) => token.is_identifier_name() && token.raw == name,
        _ => false,
    };
    if !valid {
        return Err(invalid(format!("Invalid property name '{name}'")));
    }
    Ok(Expr::Member(Box::new(MemberExpr {
        loc: loc(),
        object: chain_object(object),
        property: MemberProp::Ident(Ident {
            loc: loc(),
            name: name.to_string(),
        }),
        optional,
        cache: EvalCache::default(),
    })))
}

/// `object[key]` (or `object?.[key]`).
pub fn computed_member(object: &Expr, key: &Expr, optional: bool) -> Expr {
    Expr::Member(Box::new(MemberExpr {
        loc: loc(),
        object: chain_object(object),
        property: MemberProp::Computed(Box::new(key.clone())),
        optional,
        cache: EvalCache::default(),
    }))
}

/// `callee(arguments)` (or `callee?.(arguments)`).
pub fn call(callee: &Expr, arguments: &[Expr], optional: bool) -> Expr {
    Expr::Call(Box::new(CallExpr {
        loc: loc(),
        callee: chain_object(callee),
        arguments: arguments.iter().map(assignment_operand).collect(),
        optional,
        cache: EvalCache::default(),
    }))
}

/// `new callee(arguments)`.
///
/// # Errors
///
/// SyntaxError when `callee` is an optional chain.
pub fn new_expr(callee: &Expr, arguments: &[Expr]) -> QuillResult<Expr> {
    if is_optional_chain(callee) {
        return Err(invalid("Invalid optional chain from new expression"));
    }
    let needs_parens = precedence(callee) < CALL || chain_needs_grouping(callee);
    Ok(Expr::New(Box::new(NewExpr {
        loc: loc(),
        callee: operand(callee, needs_parens),
        arguments: arguments.iter().map(assignment_operand).collect(),
        cache: EvalCache::default(),
    })))
}

/// `` tag`quasis…` ``.
///
/// # Errors
///
/// SyntaxError for mismatched quasis/expressions or an optional-chain tag.
pub fn tagged_template(tag: &Expr, quasis: &[&str], expressions: &[Expr]) -> QuillResult<Expr> {
    if is_optional_chain(tag) {
        return Err(invalid("Invalid tagged template on optional chain"));
    }
    Ok(Expr::TaggedTemplate(Box::new(TaggedTemplateExpr {
        loc: loc(),
        tag: chain_object(tag),
        quasi: template_literal(quasis, expressions)?,
        cache: EvalCache::default(),
    })))
}

// ─────────────────────────────────────────────────────────────────────────────
// Literals with children
// ─────────────────────────────────────────────────────────────────────────────

/// `...argument`, for use inside [`array`] and [`call`].
pub fn spread(argument: &Expr) -> Expr {
    Expr::Spread(Box::new(SpreadElement {
        loc: loc(),
        argument: Box::new(assignment_operand(argument)),
    }))
}

/// An array literal; `None` entries are holes.
pub fn array(elements: &[Option<Expr>]) -> Expr {
    Expr::Array(Box::new(ArrayExpr {
        loc: loc(),
        elements: elements
            .iter()
            .map(|e| e.as_ref().map(assignment_operand))
            .collect(),
    }))
}

/// An object literal with the given `(key, value)` properties, in order.
/// Keys that are identifier names are written bare, others quoted.
pub fn object(properties: &[(&str, Expr)]) -> Expr {
    let properties = properties
        .iter()
        .map(|(key, value)| {
            let key = if is_valid_identifier(key) {
                PropKey::Ident(Ident {
                    loc: loc(),
                    name: (*key).to_string(),
                })
            } else {
                PropKey::Str(StringLit {
                    loc: loc(),
                    value: (*key).to_string(),
                })
            };
            ObjectProp::Prop(Box::new(Prop {
                loc: loc(),
                key,
                value: assignment_operand(value),
                shorthand: false,
            }))
        })
        .collect();
    Expr::Object(Box::new(ObjectExpr {
        loc: loc(),
        properties,
    }))
}

/// `(params) => body`.
///
/// # Errors
///
/// SyntaxError for duplicate parameter names or a rest parameter that is not
/// last.
pub fn arrow(params: &[Pat], body: &Expr) -> QuillResult<Expr> {
    if let Some(i) = params.iter().position(|p| matches!(p, Pat::Rest(_)))
        && i + 1 != params.len()
    {
        return Err(invalid("Rest parameter must be last formal parameter"));
    }
    check_duplicate_params(params)?;
    let body = if matches!(body, Expr::Object(_)) {
        parenthesized(body)
    } else {
        assignment_operand(body)
    };
    Ok(Expr::Arrow(Box::new(ArrowExpr {
        loc: loc(),
        params: params.to_vec().into(),
        body: Rc::new(body),
    })))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::{Scope, Value};
    use crate::parser::parse;

    fn id(name: &str) -> Expr {
        identifier(name).unwrap()
    }

    /// The printed form of `expr` parses back to a tree that prints the same.
    fn assert_reparses(expr: &Expr) {
        let printed = expr.to_string();
        let reparsed = parse(&printed).unwrap();
        assert_eq!(reparsed.to_string(), printed);
    }

    #[test]
    fn test_binary_operands_are_parenthesized_by_precedence() {
        let sum = binary(BinaryOp::Add, &id("a"), &id("b"));
        let product = binary(BinaryOp::Mul, &sum, &id("c"));
        assert_eq!(product.to_string(), "(a + b) * c");
        let diff = binary(BinaryOp::Sub, &id("a"), &sum);
        assert_eq!(diff.to_string(), "a - (a + b)");
        assert_eq!(sum.kind(), NodeKind::BinaryExpression);
        assert_reparses(&product);
    }

    #[test]
    fn test_exponent_operands() {
        let neg = unary(UnaryOp::Minus, &id("a"));
        let pow = binary(BinaryOp::Exp, &neg, &number(2.0));
        assert_eq!(pow.to_string(), "(-a) ** 2");
        let nested = binary(BinaryOp::Exp, &id("a"), &binary(BinaryOp::Exp, &id("b"), &id("c")));
        assert_eq!(nested.to_string(), "a ** b ** c");
        let left = binary(BinaryOp::Exp, &binary(BinaryOp::Exp, &id("a"), &id("b")), &id("c"));
        assert_eq!(left.to_string(), "(a ** b) ** c");
        assert_reparses(&pow);
    }

    #[test]
    fn test_nullish_mixing_is_parenthesized() {
        let or = logical(LogicalOp::Or, &id("a"), &id("b"));
        let coalesce = logical(LogicalOp::NullishCoalesce, &or, &id("c"));
        assert_eq!(coalesce.to_string(), "(a || b) ?? c");
        assert_reparses(&coalesce);
    }

    #[test]
    fn test_operands_are_cloned() {
        let a = id("a");
        let wrapped = parenthesized(&a);
        assert_eq!(wrapped.kind(), NodeKind::ParenthesizedExpression);
        assert_eq!(a.kind(), NodeKind::Identifier);
        assert_eq!(wrapped.to_string(), "(a)");
    }

    #[test]
    fn test_identifier_validation() {
        assert!(identifier("valid_$1").is_ok());
        assert!(identifier("let").is_ok());
        assert!(identifier("if").is_err());
        assert!(identifier("1a").is_err());
        assert!(identifier("a b").is_err());
        assert!(identifier("").is_err());
    }

    #[test]
    fn test_assignment_targets_are_validated() {
        let call_expr = call(&id("f"), &[], false);
        assert_eq!(
            assign(AssignOp::Assign, &call_expr, &number(1.0)).unwrap_err().message(),
            "Invalid left-hand side in assignment"
        );
        let target = member(&id("o"), "x", false).unwrap();
        let expr = assign(AssignOp::AddAssign, &target, &number(1.0)).unwrap();
        assert_eq!(expr.to_string(), "o.x += 1");
        let optional = member(&id("o"), "x", true).unwrap();
        assert!(assign(AssignOp::Assign, &optional, &number(1.0)).is_err());
        assert!(update(UpdateOp::Increment, true, &number(1.0)).is_err());
    }

    #[test]
    fn test_member_and_call_chains() {
        let sum = binary(BinaryOp::Add, &id("a"), &id("b"));
        let m = member(&sum, "length", false).unwrap();
        assert_eq!(m.to_string(), "(a + b).length");
        let c = call(&m, &[sequence(&[id("x"), id("y")]).unwrap()], false);
        assert_eq!(c.to_string(), "(a + b).length((x, y))");
        assert!(member(&id("o"), "not valid", false).is_err());
        assert_eq!(member(&id("o"), "if", false).unwrap().to_string(), "o.if");
        assert_reparses(&c);
    }

    #[test]
    fn test_new_callee_grouping() {
        let inner = call(&id("f"), &[], false);
        let n = new_expr(&inner, &[number(1.0)]).unwrap();
        assert_eq!(n.to_string(), "new (f())(1)");
        let optional = member(&id("a"), "b", true).unwrap();
        assert!(new_expr(&optional, &[]).is_err());
        assert_reparses(&n);
    }

    #[test]
    fn test_arrow_construction() {
        let params = [Pat::Ident(Ident { loc: loc(), name: "a".into() })];
        let body = object(&[("a", id("a")), ("two words", number(2.0))]);
        let f = arrow(&params, &body).unwrap();
        assert_eq!(f.to_string(), "(a) => ({ a: a, \"two words\": 2 })");
        assert_reparses(&f);

        let dup = [params[0].clone(), params[0].clone()];
        assert_eq!(
            arrow(&dup, &id("a")).unwrap_err().message(),
            "Duplicate parameter name not allowed in this context"
        );
    }

    #[test]
    fn test_built_trees_evaluate() {
        let scope = Scope::new();
        scope.define("name", Value::from("World"));
        let greeting = template(&["Hello ", "!"], &[id("name")]).unwrap();
        assert_eq!(greeting.evaluate(&scope, false).unwrap(), Value::from("Hello World!"));

        let cond = conditional(&boolean(false), &null(), &array(&[Some(number(1.0)), None]));
        let v = cond.evaluate(&scope, false).unwrap();
        assert_eq!(v, Value::array(vec![Value::from(1), Value::Undefined]));

        let spread_call = call(
            &member(&string("abc"), "length", false).unwrap(),
            &[],
            false,
        );
        assert_eq!(
            spread_call.evaluate(&scope, false).unwrap_err().message(),
            "\"abc\".length is not a function"
        );
    }

    #[test]
    fn test_template_raw_escapes() {
        let t = template(&["a`b${", "\\"], &[this()]).unwrap();
        assert_eq!(t.to_string(), "`a\\`b\\${${this}\\\\`");
        assert_reparses(&t);
        assert!(template(&["a"], &[this()]).is_err());
    }

    #[test]
    fn test_regexp_validation() {
        assert!(regexp("a+", "gi").is_ok());
        assert!(regexp("a+", "gg").is_err());
        assert!(regexp("", "").is_err());
    }
}
