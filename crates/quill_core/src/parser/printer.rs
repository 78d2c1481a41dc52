//! Source rendering for AST nodes.
//!
//! [`Display`][fmt::Display] on [`Expr`] and [`Pat`] produces canonical,
//! re-parseable source text.  Parentheses are inserted from a precedence
//! table; explicit grouping that was present in the source survives as
//! [`Expr::Paren`] nodes and is printed verbatim.

use std::fmt::{self, Write as _};

use crate::objects::value::number_to_string;
use crate::parser::ast::{
    ArrowExpr, AssignTarget, BinaryOp, Expr, LogicalOp, MemberProp, ObjectPatProp, ObjectProp,
    Pat, PropKey, TemplateLit, UnaryOp,
};

// ─────────────────────────────────────────────────────────────────────────────
// Precedence levels (higher binds tighter)
// ─────────────────────────────────────────────────────────────────────────────

pub(crate) const SEQUENCE: u8 = 1;
pub(crate) const ASSIGN: u8 = 2;
pub(crate) const CONDITIONAL: u8 = 3;
pub(crate) const NULLISH_OR: u8 = 4;
pub(crate) const AND: u8 = 5;
pub(crate) const BIT_OR: u8 = 6;
pub(crate) const BIT_XOR: u8 = 7;
pub(crate) const BIT_AND: u8 = 8;
pub(crate) const EQUALITY: u8 = 9;
pub(crate) const RELATIONAL: u8 = 10;
pub(crate) const SHIFT: u8 = 11;
pub(crate) const ADDITIVE: u8 = 12;
pub(crate) const MULTIPLICATIVE: u8 = 13;
pub(crate) const EXPONENT: u8 = 14;
pub(crate) const UNARY: u8 = 15;
pub(crate) const POSTFIX: u8 = 16;
pub(crate) const CALL: u8 = 18;
pub(crate) const PRIMARY: u8 = 19;

pub(crate) fn binary_precedence(op: BinaryOp) -> u8 {
    match op {
        BinaryOp::BitOr => BIT_OR,
        BinaryOp::BitXor => BIT_XOR,
        BinaryOp::BitAnd => BIT_AND,
        BinaryOp::Eq | BinaryOp::NotEq | BinaryOp::StrictEq | BinaryOp::StrictNotEq => EQUALITY,
        BinaryOp::Lt
        | BinaryOp::LtEq
        | BinaryOp::Gt
        | BinaryOp::GtEq
        | BinaryOp::In
        | BinaryOp::Instanceof => RELATIONAL,
        BinaryOp::Shl | BinaryOp::Shr | BinaryOp::UShr => SHIFT,
        BinaryOp::Add | BinaryOp::Sub => ADDITIVE,
        BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => MULTIPLICATIVE,
        BinaryOp::Exp => EXPONENT,
    }
}

pub(crate) fn logical_precedence(op: LogicalOp) -> u8 {
    match op {
        LogicalOp::And => AND,
        LogicalOp::Or | LogicalOp::NullishCoalesce => NULLISH_OR,
    }
}

pub(crate) fn precedence(expr: &Expr) -> u8 {
    match expr {
        Expr::Sequence(_) => SEQUENCE,
        Expr::Assign(_) | Expr::Arrow(_) | Expr::Spread(_) => ASSIGN,
        Expr::Conditional(_) => CONDITIONAL,
        Expr::Logical(e) => logical_precedence(e.op),
        Expr::Binary(e) => binary_precedence(e.op),
        Expr::Unary(_) => UNARY,
        Expr::Update(e) if e.prefix => UNARY,
        Expr::Update(_) => POSTFIX,
        Expr::Member(_) | Expr::Call(_) | Expr::New(_) | Expr::TaggedTemplate(_) => CALL,
        // A negative literal prints with a leading `-`, so it binds like a
        // unary expression; non-finite values print as divisions.
        Expr::Num(n) if !n.value.is_finite() => MULTIPLICATIVE,
        Expr::Num(n) if n.value.is_sign_negative() => UNARY,
        _ => PRIMARY,
    }
}

/// `true` when `expr` is an unparenthesized `&&`/`||` (for `??`) or `??`
/// (for `&&`/`||`) that would mix the two families.
pub(crate) fn mixes_nullish(parent: LogicalOp, child: &Expr) -> bool {
    match child {
        Expr::Logical(c) => {
            (parent == LogicalOp::NullishCoalesce) != (c.op == LogicalOp::NullishCoalesce)
        }
        _ => false,
    }
}

/// `true` when a member chain contains a call, tagged template or optional
/// link, any of which would change meaning as a `new` callee.
pub(crate) fn chain_needs_grouping(expr: &Expr) -> bool {
    match expr {
        Expr::Call(_) | Expr::TaggedTemplate(_) => true,
        Expr::Member(m) => m.optional || chain_needs_grouping(&m.object),
        _ => false,
    }
}

/// `true` when a member chain contains an optional link.
fn chain_is_optional(expr: &Expr) -> bool {
    match expr {
        Expr::Member(m) => m.optional || chain_is_optional(&m.object),
        Expr::Call(c) => c.optional || chain_is_optional(&c.callee),
        _ => false,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Expression printing
// ─────────────────────────────────────────────────────────────────────────────

fn write_expr(f: &mut fmt::Formatter<'_>, expr: &Expr, min: u8) -> fmt::Result {
    if precedence(expr) < min {
        f.write_char('(')?;
        write_bare(f, expr)?;
        f.write_char(')')
    } else {
        write_bare(f, expr)
    }
}

fn write_grouped(f: &mut fmt::Formatter<'_>, expr: &Expr) -> fmt::Result {
    f.write_char('(')?;
    write_bare(f, expr)?;
    f.write_char(')')
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[Expr]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write_expr(f, item, ASSIGN)?;
    }
    Ok(())
}

fn write_bare(f: &mut fmt::Formatter<'_>, expr: &Expr) -> fmt::Result {
    match expr {
        Expr::Null(_) => f.write_str("null"),
        Expr::Bool(b) => f.write_str(if b.value { "true" } else { "false" }),
        Expr::Num(n) => write_number(f, n.value),
        Expr::Str(s) => write_string_literal(f, &s.value),
        Expr::Regexp(r) => write!(f, "/{}/{}", r.pattern, r.flags),
        Expr::Template(t) => write_template(f, t),
        Expr::Ident(id) => f.write_str(&id.name),
        Expr::This(_) => f.write_str("this"),
        Expr::Paren(p) => {
            f.write_char('(')?;
            write_expr(f, &p.expression, SEQUENCE)?;
            f.write_char(')')
        }
        Expr::Array(a) => {
            f.write_char('[')?;
            for (i, element) in a.elements.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                if let Some(element) = element {
                    write_expr(f, element, ASSIGN)?;
                }
            }
            // A trailing hole needs its own comma to survive re-parsing.
            if matches!(a.elements.last(), Some(None)) {
                f.write_char(',')?;
            }
            f.write_char(']')
        }
        Expr::Object(o) => {
            if o.properties.is_empty() {
                return f.write_str("{}");
            }
            f.write_str("{ ")?;
            for (i, prop) in o.properties.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                match prop {
                    ObjectProp::Spread(s) => {
                        f.write_str("...")?;
                        write_expr(f, &s.argument, ASSIGN)?;
                    }
                    ObjectProp::Prop(p) if p.shorthand => write_expr(f, &p.value, ASSIGN)?,
                    ObjectProp::Prop(p) => {
                        write_prop_key(f, &p.key)?;
                        f.write_str(": ")?;
                        write_expr(f, &p.value, ASSIGN)?;
                    }
                }
            }
            f.write_str(" }")
        }
        Expr::Arrow(a) => write_arrow(f, a),
        Expr::Unary(u) => {
            let mut operand = String::new();
            write!(operand, "{}", Prec(&u.argument, UNARY))?;
            f.write_str(u.op.as_str())?;
            let needs_space = match u.op {
                UnaryOp::Typeof | UnaryOp::Void => true,
                // `- -a`, `+ ++a`
                UnaryOp::Minus => operand.starts_with('-'),
                UnaryOp::Plus => operand.starts_with('+'),
                UnaryOp::Not | UnaryOp::BitNot => false,
            };
            if needs_space {
                f.write_char(' ')?;
            }
            f.write_str(&operand)
        }
        Expr::Update(u) => {
            if u.prefix {
                f.write_str(u.op.as_str())?;
                write_expr(f, &u.argument, UNARY)
            } else {
                write_expr(f, &u.argument, CALL)?;
                f.write_str(u.op.as_str())
            }
        }
        Expr::Binary(b) => {
            let prec = binary_precedence(b.op);
            if b.op == BinaryOp::Exp {
                // `**` is right-associative and its base may not be a unary
                // expression.
                if matches!(*b.left, Expr::Unary(_)) {
                    write_grouped(f, &b.left)?;
                } else {
                    write_expr(f, &b.left, POSTFIX)?;
                }
                write!(f, " {} ", b.op.as_str())?;
                write_expr(f, &b.right, prec)
            } else {
                write_expr(f, &b.left, prec)?;
                write!(f, " {} ", b.op.as_str())?;
                write_expr(f, &b.right, prec + 1)
            }
        }
        Expr::Logical(l) => {
            let prec = logical_precedence(l.op);
            if mixes_nullish(l.op, &l.left) {
                write_grouped(f, &l.left)?;
            } else {
                write_expr(f, &l.left, prec)?;
            }
            write!(f, " {} ", l.op.as_str())?;
            if mixes_nullish(l.op, &l.right) {
                write_grouped(f, &l.right)
            } else {
                write_expr(f, &l.right, prec + 1)
            }
        }
        Expr::Conditional(c) => {
            write_expr(f, &c.test, NULLISH_OR)?;
            f.write_str(" ? ")?;
            write_expr(f, &c.consequent, ASSIGN)?;
            f.write_str(" : ")?;
            write_expr(f, &c.alternate, ASSIGN)
        }
        Expr::Assign(a) => {
            match &a.left {
                AssignTarget::Expr(target) => write_expr(f, target, CALL)?,
                AssignTarget::Pat(pat) => write!(f, "{pat}")?,
            }
            write!(f, " {} ", a.op.as_str())?;
            write_expr(f, &a.right, ASSIGN)
        }
        Expr::Sequence(s) => write_list(f, &s.expressions),
        Expr::Member(m) => {
            let numeric_object = matches!(*m.object, Expr::Num(_));
            if numeric_object && !matches!(m.property, MemberProp::Computed(_)) {
                // `1.x` would scan as a malformed number.
                write_grouped(f, &m.object)?;
            } else {
                write_expr(f, &m.object, CALL)?;
            }
            if m.optional {
                f.write_str("?.")?;
            }
            match &m.property {
                MemberProp::Ident(id) => {
                    if !m.optional {
                        f.write_char('.')?;
                    }
                    f.write_str(&id.name)
                }
                MemberProp::Computed(key) => {
                    f.write_char('[')?;
                    write_expr(f, key, SEQUENCE)?;
                    f.write_char(']')
                }
            }
        }
        Expr::Call(c) => {
            write_expr(f, &c.callee, CALL)?;
            f.write_str(if c.optional { "?.(" } else { "(" })?;
            write_list(f, &c.arguments)?;
            f.write_char(')')
        }
        Expr::New(n) => {
            f.write_str("new ")?;
            if chain_needs_grouping(&n.callee) {
                write_grouped(f, &n.callee)?;
            } else {
                write_expr(f, &n.callee, CALL)?;
            }
            f.write_char('(')?;
            write_list(f, &n.arguments)?;
            f.write_char(')')
        }
        Expr::TaggedTemplate(t) => {
            if chain_is_optional(&t.tag) {
                write_grouped(f, &t.tag)?;
            } else {
                write_expr(f, &t.tag, CALL)?;
            }
            write_template(f, &t.quasi)
        }
        Expr::Spread(s) => {
            f.write_str("...")?;
            write_expr(f, &s.argument, ASSIGN)
        }
    }
}

fn write_arrow(f: &mut fmt::Formatter<'_>, arrow: &ArrowExpr) -> fmt::Result {
    f.write_char('(')?;
    for (i, param) in arrow.params.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{param}")?;
    }
    f.write_str(") => ")?;
    let body = Prec(&arrow.body, ASSIGN).to_string();
    // A body starting with `{` would be read as a block.
    if body.starts_with('{') {
        write!(f, "({body})")
    } else {
        f.write_str(&body)
    }
}

fn write_template(f: &mut fmt::Formatter<'_>, template: &TemplateLit) -> fmt::Result {
    f.write_char('`')?;
    for (i, quasi) in template.quasis.iter().enumerate() {
        f.write_str(&quasi.raw)?;
        if let Some(expr) = template.expressions.get(i) {
            f.write_str("${")?;
            write_expr(f, expr, SEQUENCE)?;
            f.write_char('}')?;
        }
    }
    f.write_char('`')
}

fn write_prop_key(f: &mut fmt::Formatter<'_>, key: &PropKey) -> fmt::Result {
    match key {
        PropKey::Ident(id) => f.write_str(&id.name),
        PropKey::Str(s) => write_string_literal(f, &s.value),
        PropKey::Num(n) => write_number(f, n.value),
        PropKey::Computed(expr) => {
            f.write_char('[')?;
            write_expr(f, expr, ASSIGN)?;
            f.write_char(']')
        }
    }
}

fn write_number(f: &mut fmt::Formatter<'_>, value: f64) -> fmt::Result {
    if value.is_nan() {
        f.write_str("0 / 0")
    } else if value.is_infinite() {
        f.write_str(if value > 0.0 { "1 / 0" } else { "-1 / 0" })
    } else {
        f.write_str(&number_to_string(value))
    }
}

/// Double-quoted string literal with escapes for quotes, backslashes and
/// control characters.
fn write_string_literal(f: &mut fmt::Formatter<'_>, value: &str) -> fmt::Result {
    f.write_char('"')?;
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            '\u{8}' => f.write_str("\\b")?,
            '\u{C}' => f.write_str("\\f")?,
            '\u{B}' => f.write_str("\\v")?,
            // `\0` followed by a digit would read as a legacy octal escape.
            '\0' if !chars.peek().is_some_and(|n| n.is_ascii_digit()) => f.write_str("\\0")?,
            c if (c as u32) < 0x20 => write!(f, "\\x{:02X}", c as u32)?,
            c => f.write_char(c)?,
        }
    }
    f.write_char('"')
}

/// Adapter printing an expression at a minimum precedence.
struct Prec<'a>(&'a Expr, u8);

impl fmt::Display for Prec<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_expr(f, self.0, self.1)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_expr(f, self, SEQUENCE)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Pattern printing
// ─────────────────────────────────────────────────────────────────────────────

impl fmt::Display for Pat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pat::Ident(id) => f.write_str(&id.name),
            Pat::Array(a) => {
                f.write_char('[')?;
                for (i, element) in a.elements.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    if let Some(element) = element {
                        write!(f, "{element}")?;
                    }
                }
                if matches!(a.elements.last(), Some(None)) {
                    f.write_char(',')?;
                }
                f.write_char(']')
            }
            Pat::Object(o) => {
                if o.properties.is_empty() {
                    return f.write_str("{}");
                }
                f.write_str("{ ")?;
                for (i, prop) in o.properties.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    match prop {
                        ObjectPatProp::Rest(r) => write!(f, "...{}", r.argument)?,
                        ObjectPatProp::Prop(p) if p.shorthand => write!(f, "{}", p.value)?,
                        ObjectPatProp::Prop(p) => {
                            write_prop_key(f, &p.key)?;
                            write!(f, ": {}", p.value)?;
                        }
                    }
                }
                f.write_str(" }")
            }
            Pat::Rest(r) => write!(f, "...{}", r.argument),
            Pat::Assign(a) => {
                write!(f, "{} = ", a.left)?;
                write_expr(f, &a.right, ASSIGN)
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
