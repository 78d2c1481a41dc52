//! The tree a Quill expression parses into.
//!
//! A parsed expression is one [`Expr`]; destructuring targets and arrow
//! parameters are [`Pat`]s.  Every node records the source range it came
//! from in `loc`, which runtime errors use for their line and column.
//! [`NodeKind`] names node types the way the printer and `--ast` output
//! show them.
//!
//! Trees are built once and evaluated many times.  The only state that
//! changes afterwards is the per-node [`EvalCache`], and a cloned tree
//! starts with empty caches.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::objects::Value;
use crate::parser::scanner::Span;

// ─────────────────────────────────────────────────────────────────────────────
// Source location
// ─────────────────────────────────────────────────────────────────────────────

/// The `loc` of a node.
pub type SourceLocation = Span;

// ─────────────────────────────────────────────────────────────────────────────
// Evaluation cache
// ─────────────────────────────────────────────────────────────────────────────

/// Memo slot holding the last value a node evaluated to.
///
/// Consulted only when `evaluate` is called with `use_cache = true`.  Cloning
/// a node yields an empty cache, so a copied tree never observes the results
/// of the original.
#[derive(Default)]
pub struct EvalCache(RefCell<Option<Value>>);

impl EvalCache {
    /// The memoized value, if any.
    pub fn get(&self) -> Option<Value> {
        self.0.borrow().clone()
    }

    /// Store `value` as the memoized result.
    pub fn set(&self, value: Value) {
        *self.0.borrow_mut() = Some(value);
    }

    /// Forget the memoized result.
    pub fn clear(&self) {
        self.0.borrow_mut().take();
    }

    /// Returns `true` when a value is memoized.
    pub fn is_filled(&self) -> bool {
        self.0.borrow().is_some()
    }
}

impl Clone for EvalCache {
    fn clone(&self) -> Self {
        EvalCache::default()
    }
}

impl fmt::Debug for EvalCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.is_filled() { "EvalCache(filled)" } else { "EvalCache" })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Node kinds
// ─────────────────────────────────────────────────────────────────────────────

/// The type of a node, as reported by `Expr::kind` and `Pat::kind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// `null`
    NullLiteral,
    /// `true` / `false`
    BooleanLiteral,
    /// `1.5`, `0x1F`, `1_000`, ...
    NumericLiteral,
    /// `'text'` or `"text"`
    StringLiteral,
    /// `/pattern/flags`
    RegExpLiteral,
    /// `` `…${…}…` ``
    TemplateLiteral,
    /// A name looked up in (or bound into) the scope.
    Identifier,
    /// `this`
    ThisExpression,
    /// `[…]`
    ArrayExpression,
    /// `{…}`
    ObjectExpression,
    /// `(params) => body`
    ArrowFunctionExpression,
    /// `op argument`
    UnaryExpression,
    /// `++x`, `x--`
    UpdateExpression,
    /// `left op right`
    BinaryExpression,
    /// `&&`, `||`, `??`
    LogicalExpression,
    /// `test ? a : b`
    ConditionalExpression,
    /// `target op= value`
    AssignmentExpression,
    /// `a, b, c`
    SequenceExpression,
    /// `object.property`, `object[expr]`, `object?.property`
    MemberExpression,
    /// `callee(args)`, `callee?.(args)`
    CallExpression,
    /// `new callee(args)`
    NewExpression,
    /// `` tag`…` ``
    TaggedTemplateExpression,
    /// `...argument`
    SpreadElement,
    /// `(expression)`
    ParenthesizedExpression,
    /// `[a, ...b]` as a pattern.
    ArrayPattern,
    /// `{a, b: c}` as a pattern.
    ObjectPattern,
    /// `target = default` as a pattern.
    AssignmentPattern,
    /// `...target` as a pattern.
    RestElement,
}

impl NodeKind {
    /// Returns `true` for nodes written as a literal, templates included.
    pub fn is_literal(self) -> bool {
        matches!(
            self,
            NodeKind::NullLiteral
                | NodeKind::BooleanLiteral
                | NodeKind::NumericLiteral
                | NodeKind::StringLiteral
                | NodeKind::RegExpLiteral
                | NodeKind::TemplateLiteral
        )
    }

    /// Returns `true` for kinds that only occur as assignment targets or
    /// arrow parameters.
    pub fn is_pattern(self) -> bool {
        matches!(
            self,
            NodeKind::ArrayPattern
                | NodeKind::ObjectPattern
                | NodeKind::AssignmentPattern
                | NodeKind::RestElement
        )
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Names
// ─────────────────────────────────────────────────────────────────────────────

/// A variable name, or the name after `.` in a member access.
#[derive(Debug, Clone)]
pub struct Ident {
    pub loc: SourceLocation,
    /// The name with `\u` escapes resolved.
    pub name: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Literals
// ─────────────────────────────────────────────────────────────────────────────

/// `null`
#[derive(Debug, Clone)]
pub struct NullLit {
    pub loc: SourceLocation,
}

/// `true` or `false`
#[derive(Debug, Clone)]
pub struct BoolLit {
    pub loc: SourceLocation,
    pub value: bool,
}

/// A number in any of the accepted notations.
#[derive(Debug, Clone)]
pub struct NumLit {
    pub loc: SourceLocation,
    pub value: f64,
    /// How the number was written; empty when built through the factory.
    pub raw: String,
}

/// A quoted string.
#[derive(Debug, Clone)]
pub struct StringLit {
    pub loc: SourceLocation,
    /// Contents with escapes applied.
    pub value: String,
}

/// `/pattern/flags`.  Quill does not run regular expressions; the literal
/// evaluates to a value that only exposes `source` and `flags`.
#[derive(Debug, Clone)]
pub struct RegExpLit {
    pub loc: SourceLocation,
    pub pattern: String,
    pub flags: String,
}

/// `` `text ${expr} text` ``.  Text and holes alternate, starting and
/// ending with text, so `quasis` is always one longer than `expressions`.
#[derive(Debug, Clone)]
pub struct TemplateLit {
    pub loc: SourceLocation,
    pub quasis: Vec<TemplateElement>,
    pub expressions: Vec<Expr>,
    /// Memoized result.
    pub cache: EvalCache,
}

/// One text run of a template.  Tags receive both spellings.
#[derive(Debug, Clone)]
pub struct TemplateElement {
    pub loc: SourceLocation,
    /// As written, escapes untouched.
    pub raw: String,
    /// With escapes applied; this is what untagged templates concatenate.
    pub cooked: String,
    /// Set on the run after the last hole.
    pub tail: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// Expressions
// ─────────────────────────────────────────────────────────────────────────────

/// A Quill expression: the whole of a parsed program, or any part of one.
/// Larger variants are boxed so the enum stays small.
#[derive(Debug, Clone)]
pub enum Expr {
    // ── Literals ──────────────────────────────────────────────────────────
    Null(NullLit),
    Bool(BoolLit),
    Num(NumLit),
    Str(StringLit),
    Regexp(RegExpLit),
    Template(Box<TemplateLit>),

    // ── Primary ───────────────────────────────────────────────────────────
    /// Scope lookup; unknown names are a ReferenceError.
    Ident(Ident),
    /// The scope's `this` binding.
    This(ThisExpr),
    Array(Box<ArrayExpr>),
    Object(Box<ObjectExpr>),
    Paren(Box<ParenExpr>),

    // ── Functions ─────────────────────────────────────────────────────────
    /// The only function form Quill has; evaluates to a closure.
    Arrow(Box<ArrowExpr>),

    // ── Operators ─────────────────────────────────────────────────────────
    Unary(Box<UnaryExpr>),
    /// `++x`, `x--` and friends.
    Update(Box<UpdateExpr>),
    Binary(Box<BinaryExpr>),
    /// The short-circuiting operators, kept apart from [`Expr::Binary`]
    /// because they may skip their right operand.
    Logical(Box<LogicalExpr>),
    Conditional(Box<ConditionalExpr>),
    /// Plain, compound and logical assignment, plus destructuring.
    Assign(Box<AssignExpr>),
    /// `a, b, c`: the value of the last operand.
    Sequence(Box<SequenceExpr>),

    // ── Access and calls ──────────────────────────────────────────────────
    /// Property access; optional links short-circuit the rest of the chain.
    Member(Box<MemberExpr>),
    Call(Box<CallExpr>),
    New(Box<NewExpr>),
    TaggedTemplate(Box<TaggedTemplateExpr>),

    // ── Spread ────────────────────────────────────────────────────────────
    /// `...xs`.  Only valid inside array literals, object literals and
    /// argument lists; the parser puts it nowhere else.
    Spread(Box<SpreadElement>),
}

impl Expr {
    /// Where this expression appears in the source.
    pub fn loc(&self) -> SourceLocation {
        match self {
            Expr::Null(e) => e.loc,
            Expr::Bool(e) => e.loc,
            Expr::Num(e) => e.loc,
            Expr::Str(e) => e.loc,
            Expr::Regexp(e) => e.loc,
            Expr::Template(e) => e.loc,
            Expr::Ident(e) => e.loc,
            Expr::This(e) => e.loc,
            Expr::Array(e) => e.loc,
            Expr::Object(e) => e.loc,
            Expr::Paren(e) => e.loc,
            Expr::Arrow(e) => e.loc,
            Expr::Unary(e) => e.loc,
            Expr::Update(e) => e.loc,
            Expr::Binary(e) => e.loc,
            Expr::Logical(e) => e.loc,
            Expr::Conditional(e) => e.loc,
            Expr::Assign(e) => e.loc,
            Expr::Sequence(e) => e.loc,
            Expr::Member(e) => e.loc,
            Expr::Call(e) => e.loc,
            Expr::New(e) => e.loc,
            Expr::TaggedTemplate(e) => e.loc,
            Expr::Spread(e) => e.loc,
        }
    }

    /// The node type, e.g. `BinaryExpression`.
    pub fn kind(&self) -> NodeKind {
        match self {
            Expr::Null(_) => NodeKind::NullLiteral,
            Expr::Bool(_) => NodeKind::BooleanLiteral,
            Expr::Num(_) => NodeKind::NumericLiteral,
            Expr::Str(_) => NodeKind::StringLiteral,
            Expr::Regexp(_) => NodeKind::RegExpLiteral,
            Expr::Template(_) => NodeKind::TemplateLiteral,
            Expr::Ident(_) => NodeKind::Identifier,
            Expr::This(_) => NodeKind::ThisExpression,
            Expr::Array(_) => NodeKind::ArrayExpression,
            Expr::Object(_) => NodeKind::ObjectExpression,
            Expr::Paren(_) => NodeKind::ParenthesizedExpression,
            Expr::Arrow(_) => NodeKind::ArrowFunctionExpression,
            Expr::Unary(_) => NodeKind::UnaryExpression,
            Expr::Update(_) => NodeKind::UpdateExpression,
            Expr::Binary(_) => NodeKind::BinaryExpression,
            Expr::Logical(_) => NodeKind::LogicalExpression,
            Expr::Conditional(_) => NodeKind::ConditionalExpression,
            Expr::Assign(_) => NodeKind::AssignmentExpression,
            Expr::Sequence(_) => NodeKind::SequenceExpression,
            Expr::Member(_) => NodeKind::MemberExpression,
            Expr::Call(_) => NodeKind::CallExpression,
            Expr::New(_) => NodeKind::NewExpression,
            Expr::TaggedTemplate(_) => NodeKind::TaggedTemplateExpression,
            Expr::Spread(_) => NodeKind::SpreadElement,
        }
    }

    /// The memo slot, on the node types whose result is worth caching.
    /// Names, literals and assignments always evaluate afresh.
    pub fn cache(&self) -> Option<&EvalCache> {
        match self {
            Expr::Binary(e) => Some(&e.cache),
            Expr::Logical(e) => Some(&e.cache),
            Expr::Unary(e) => Some(&e.cache),
            Expr::Conditional(e) => Some(&e.cache),
            Expr::Member(e) => Some(&e.cache),
            Expr::Call(e) => Some(&e.cache),
            Expr::New(e) => Some(&e.cache),
            Expr::Template(e) => Some(&e.cache),
            Expr::TaggedTemplate(e) => Some(&e.cache),
            _ => None,
        }
    }

    /// Strip any number of enclosing parentheses.
    pub fn unparenthesized(&self) -> &Expr {
        let mut expr = self;
        while let Expr::Paren(p) = expr {
            expr = &p.expression;
        }
        expr
    }
}

/// The `this` keyword.
#[derive(Debug, Clone)]
pub struct ThisExpr {
    pub loc: SourceLocation,
}

/// `( expression )`: kept in the tree so printing and assignment-target
/// checks can see explicit grouping.
#[derive(Debug, Clone)]
pub struct ParenExpr {
    /// Includes the parentheses.
    pub loc: SourceLocation,
    pub expression: Expr,
}

/// `[1, , ...xs]`
#[derive(Debug, Clone)]
pub struct ArrayExpr {
    pub loc: SourceLocation,
    /// `None` is a hole, which evaluates to `undefined`.
    pub elements: Vec<Option<Expr>>,
}

/// `{ a: 1, b, [k]: v, ...rest }`.  Later keys overwrite earlier ones.
#[derive(Debug, Clone)]
pub struct ObjectExpr {
    pub loc: SourceLocation,
    pub properties: Vec<ObjectProp>,
}

/// One entry of an object literal.
#[derive(Debug, Clone)]
pub enum ObjectProp {
    Prop(Box<Prop>),
    /// Copies the own properties of an object (or the indices of an array).
    Spread(SpreadElement),
}

/// `key: value`, or the shorthand `key`.
#[derive(Debug, Clone)]
pub struct Prop {
    pub loc: SourceLocation,
    pub key: PropKey,
    /// The property value.  For shorthand properties this is the identifier
    /// itself (or `id = default` inside a destructuring cover).
    pub value: Expr,
    /// `true` for `{ key }` / `{ key = default }`.
    pub shorthand: bool,
}

/// How a key is written, in object literals and object patterns alike.
/// Every form ends up as a string key at runtime.
#[derive(Debug, Clone)]
pub enum PropKey {
    /// A bare word; reserved words are allowed here.
    Ident(Ident),
    Str(StringLit),
    /// Keyed by the number's string form, so `{1.0: x}` sets `"1"`.
    Num(NumLit),
    /// `[expr]`, converted with `ToString` at evaluation time.
    Computed(Box<Expr>),
}

impl PropKey {
    /// Returns `true` for `[expr]` keys.
    pub fn is_computed(&self) -> bool {
        matches!(self, PropKey::Computed(_))
    }
}

/// `...argument`
#[derive(Debug, Clone)]
pub struct SpreadElement {
    pub loc: SourceLocation,
    pub argument: Box<Expr>,
}

/// `(params) => body`.  Only expression bodies exist in Quill.
///
/// Each evaluation creates a closure that shares `params` and `body` with
/// this node.  Cloning the node copies them, so a cloned tree has caches of
/// its own.
#[derive(Debug)]
pub struct ArrowExpr {
    pub loc: SourceLocation,
    pub params: Rc<[Pat]>,
    pub body: Rc<Expr>,
}

impl Clone for ArrowExpr {
    fn clone(&self) -> Self {
        Self {
            loc: self.loc,
            params: self.params.iter().cloned().collect::<Vec<_>>().into(),
            body: Rc::new((*self.body).clone()),
        }
    }
}

/// A prefix operator applied to one operand.
#[derive(Debug, Clone)]
pub struct UnaryExpr {
    pub loc: SourceLocation,
    pub op: UnaryOp,
    pub argument: Box<Expr>,
    /// Memoized result.
    pub cache: EvalCache,
}

/// Prefix operators.  `delete` is not among them: Quill reserves the word
/// but has no way to remove a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `-`
    Minus,
    /// `+`
    Plus,
    /// `!`
    Not,
    /// `~`
    BitNot,
    /// `typeof`
    Typeof,
    /// `void`
    Void,
}

impl UnaryOp {
    /// Source text of the operator.
    pub fn as_str(self) -> &'static str {
        match self {
            UnaryOp::Minus => "-",
            UnaryOp::Plus => "+",
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
            UnaryOp::Typeof => "typeof",
            UnaryOp::Void => "void",
        }
    }
}

/// Increment or decrement of a name or property.  Prefix forms yield the
/// new value, postfix forms the old one converted to a number.
#[derive(Debug, Clone)]
pub struct UpdateExpr {
    pub loc: SourceLocation,
    pub op: UpdateOp,
    pub prefix: bool,
    /// An identifier or member expression, possibly parenthesized.
    pub argument: Box<Expr>,
}

/// Which way an update steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOp {
    /// `++`
    Increment,
    /// `--`
    Decrement,
}

impl UpdateOp {
    /// Source text of the operator.
    pub fn as_str(self) -> &'static str {
        match self {
            UpdateOp::Increment => "++",
            UpdateOp::Decrement => "--",
        }
    }
}

/// `left op right` for an operator that always evaluates both sides,
/// left first.
#[derive(Debug, Clone)]
pub struct BinaryExpr {
    pub loc: SourceLocation,
    pub op: BinaryOp,
    pub left: Box<Expr>,
    pub right: Box<Expr>,
    /// Memoized result.
    pub cache: EvalCache,
}

/// Arithmetic, bitwise, comparison, `in` and `instanceof`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `==`
    Eq,
    /// `!=`
    NotEq,
    /// `===`
    StrictEq,
    /// `!==`
    StrictNotEq,
    /// `<`
    Lt,
    /// `<=`
    LtEq,
    /// `>`
    Gt,
    /// `>=`
    GtEq,
    /// `<<`
    Shl,
    /// `>>`
    Shr,
    /// `>>>`
    UShr,
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Rem,
    /// `**`
    Exp,
    /// `|`
    BitOr,
    /// `^`
    BitXor,
    /// `&`
    BitAnd,
    /// `in`
    In,
    /// `instanceof`
    Instanceof,
}

impl BinaryOp {
    /// Source text of the operator.
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::StrictEq => "===",
            BinaryOp::StrictNotEq => "!==",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::UShr => ">>>",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Exp => "**",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::BitAnd => "&",
            BinaryOp::In => "in",
            BinaryOp::Instanceof => "instanceof",
        }
    }
}

/// `left && right`, `left || right` or `left ?? right`.  The result is
/// whichever operand decided it, not a boolean.
#[derive(Debug, Clone)]
pub struct LogicalExpr {
    pub loc: SourceLocation,
    pub op: LogicalOp,
    pub left: Box<Expr>,
    pub right: Box<Expr>,
    /// Memoized result.
    pub cache: EvalCache,
}

/// Short-circuiting operators.  `??` cannot be mixed with the other two
/// without parentheses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    /// `&&`
    And,
    /// `||`
    Or,
    /// `??`
    NullishCoalesce,
}

impl LogicalOp {
    /// Source text of the operator.
    pub fn as_str(self) -> &'static str {
        match self {
            LogicalOp::And => "&&",
            LogicalOp::Or => "||",
            LogicalOp::NullishCoalesce => "??",
        }
    }
}

/// `test ? consequent : alternate`; only the chosen branch is evaluated.
#[derive(Debug, Clone)]
pub struct ConditionalExpr {
    pub loc: SourceLocation,
    pub test: Box<Expr>,
    pub consequent: Box<Expr>,
    pub alternate: Box<Expr>,
    /// Memoized result.
    pub cache: EvalCache,
}

/// `left op right`.  Writes go to the scope (or the object) and the
/// expression yields the assigned value.
#[derive(Debug, Clone)]
pub struct AssignExpr {
    pub loc: SourceLocation,
    pub op: AssignOp,
    pub left: AssignTarget,
    pub right: Box<Expr>,
}

/// What an assignment writes to.
#[derive(Debug, Clone)]
pub enum AssignTarget {
    /// A name or property, possibly parenthesized.
    Expr(Box<Expr>),
    /// `[a, b] = ...` or `({ a } = ...)`; plain `=` only.
    Pat(Pat),
}

impl AssignTarget {
    /// Where the target appears in the source.
    pub fn loc(&self) -> SourceLocation {
        match self {
            AssignTarget::Expr(e) => e.loc(),
            AssignTarget::Pat(p) => p.loc(),
        }
    }
}

/// `=` and its compound forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    /// `=`
    Assign,
    /// `+=`
    AddAssign,
    /// `-=`
    SubAssign,
    /// `*=`
    MulAssign,
    /// `/=`
    DivAssign,
    /// `%=`
    RemAssign,
    /// `**=`
    ExpAssign,
    /// `<<=`
    ShlAssign,
    /// `>>=`
    ShrAssign,
    /// `>>>=`
    UShrAssign,
    /// `|=`
    BitOrAssign,
    /// `^=`
    BitXorAssign,
    /// `&=`
    BitAndAssign,
    /// `&&=`
    LogicalAndAssign,
    /// `||=`
    LogicalOrAssign,
    /// `??=`
    NullishAssign,
}

impl AssignOp {
    /// Source text of the operator.
    pub fn as_str(self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::AddAssign => "+=",
            AssignOp::SubAssign => "-=",
            AssignOp::MulAssign => "*=",
            AssignOp::DivAssign => "/=",
            AssignOp::RemAssign => "%=",
            AssignOp::ExpAssign => "**=",
            AssignOp::ShlAssign => "<<=",
            AssignOp::ShrAssign => ">>=",
            AssignOp::UShrAssign => ">>>=",
            AssignOp::BitOrAssign => "|=",
            AssignOp::BitXorAssign => "^=",
            AssignOp::BitAndAssign => "&=",
            AssignOp::LogicalAndAssign => "&&=",
            AssignOp::LogicalOrAssign => "||=",
            AssignOp::NullishAssign => "??=",
        }
    }

    /// The binary operator a compound assignment applies, if any.
    pub fn binary_op(self) -> Option<BinaryOp> {
        match self {
            AssignOp::AddAssign => Some(BinaryOp::Add),
            AssignOp::SubAssign => Some(BinaryOp::Sub),
            AssignOp::MulAssign => Some(BinaryOp::Mul),
            AssignOp::DivAssign => Some(BinaryOp::Div),
            AssignOp::RemAssign => Some(BinaryOp::Rem),
            AssignOp::ExpAssign => Some(BinaryOp::Exp),
            AssignOp::ShlAssign => Some(BinaryOp::Shl),
            AssignOp::ShrAssign => Some(BinaryOp::Shr),
            AssignOp::UShrAssign => Some(BinaryOp::UShr),
            AssignOp::BitOrAssign => Some(BinaryOp::BitOr),
            AssignOp::BitXorAssign => Some(BinaryOp::BitXor),
            AssignOp::BitAndAssign => Some(BinaryOp::BitAnd),
            AssignOp::Assign
            | AssignOp::LogicalAndAssign
            | AssignOp::LogicalOrAssign
            | AssignOp::NullishAssign => None,
        }
    }
}

/// `a, b, c`
#[derive(Debug, Clone)]
pub struct SequenceExpr {
    pub loc: SourceLocation,
    /// Never fewer than two.
    pub expressions: Vec<Expr>,
}

/// `obj.name`, `obj[key]`, and the same with `?.`.  Reading any property of
/// `null` or `undefined` without `?.` is a TypeError.
#[derive(Debug, Clone)]
pub struct MemberExpr {
    pub loc: SourceLocation,
    pub object: Box<Expr>,
    pub property: MemberProp,
    /// `true` when this link is written with `?.`.
    pub optional: bool,
    /// Memoized result.
    pub cache: EvalCache,
}

/// The key of a member access.
#[derive(Debug, Clone)]
pub enum MemberProp {
    /// `.name`
    Ident(Ident),
    /// `[expr]`
    Computed(Box<Expr>),
}

/// `f(args)` or `f?.(args)`.  A member callee supplies `this`.
#[derive(Debug, Clone)]
pub struct CallExpr {
    pub loc: SourceLocation,
    pub callee: Box<Expr>,
    /// Argument list (may contain [`Expr::Spread`]).
    pub arguments: Vec<Expr>,
    /// `true` when the call is written with `?.(`.
    pub optional: bool,
    /// Memoized result.
    pub cache: EvalCache,
}

/// `new F(args)`: calls `F` with a fresh object as `this`.
#[derive(Debug, Clone)]
pub struct NewExpr {
    pub loc: SourceLocation,
    pub callee: Box<Expr>,
    /// Argument list (empty when the parentheses are omitted).
    pub arguments: Vec<Expr>,
    /// Memoized result.
    pub cache: EvalCache,
}

/// `` tag`text ${x}` ``: calls `tag` with the cooked strings (carrying a
/// `raw` array) followed by the hole values.
#[derive(Debug, Clone)]
pub struct TaggedTemplateExpr {
    pub loc: SourceLocation,
    pub tag: Box<Expr>,
    pub quasi: TemplateLit,
    /// Memoized result.
    pub cache: EvalCache,
}

// ─────────────────────────────────────────────────────────────────────────────
// Patterns
// ─────────────────────────────────────────────────────────────────────────────

/// A destructuring target or arrow parameter.  Every leaf is a name; the
/// binder turns a pattern and a value into name/value pairs.
#[derive(Debug, Clone)]
pub enum Pat {
    Ident(Ident),
    Array(Box<ArrayPat>),
    Object(Box<ObjectPat>),
    /// `...rest`; only ever the last element.
    Rest(Box<RestElement>),
    /// `target = fallback`, used when the value is `undefined`.
    Assign(Box<AssignPat>),
}

impl Pat {
    /// Where this pattern appears in the source.
    pub fn loc(&self) -> SourceLocation {
        match self {
            Pat::Ident(p) => p.loc,
            Pat::Array(p) => p.loc,
            Pat::Object(p) => p.loc,
            Pat::Rest(p) => p.loc,
            Pat::Assign(p) => p.loc,
        }
    }

    /// The node type; a bare name reports `Identifier`.
    pub fn kind(&self) -> NodeKind {
        match self {
            Pat::Ident(_) => NodeKind::Identifier,
            Pat::Array(_) => NodeKind::ArrayPattern,
            Pat::Object(_) => NodeKind::ObjectPattern,
            Pat::Rest(_) => NodeKind::RestElement,
            Pat::Assign(_) => NodeKind::AssignmentPattern,
        }
    }
}

/// `[a, , b, ...rest]`, read from any iterable value.
#[derive(Debug, Clone)]
pub struct ArrayPat {
    pub loc: SourceLocation,
    /// `None` skips a position.
    pub elements: Vec<Option<Pat>>,
}

/// `{ a, b: c, ...rest }`.  The rest gets the keys nothing else named.
#[derive(Debug, Clone)]
pub struct ObjectPat {
    pub loc: SourceLocation,
    pub properties: Vec<ObjectPatProp>,
}

/// One entry of an object pattern.
#[derive(Debug, Clone)]
pub enum ObjectPatProp {
    Prop(AssignmentProp),
    /// Must target a plain name.
    Rest(RestElement),
}

/// `key: target`, or the shorthand `name` / `name = fallback`.
#[derive(Debug, Clone)]
pub struct AssignmentProp {
    pub loc: SourceLocation,
    pub key: PropKey,
    /// The value pattern.  For shorthand properties this is the identifier
    /// (wrapped in [`Pat::Assign`] when a default is present).
    pub value: Pat,
    /// `true` for `{ id }` / `{ id = default }`.
    pub shorthand: bool,
}

/// `...target`: collects the remaining elements, properties or arguments.
#[derive(Debug, Clone)]
pub struct RestElement {
    pub loc: SourceLocation,
    pub argument: Box<Pat>,
}

/// `target = fallback`.  The fallback is evaluated only when needed, and it
/// sees the names bound before it.
#[derive(Debug, Clone)]
pub struct AssignPat {
    pub loc: SourceLocation,
    pub left: Box<Pat>,
    pub right: Box<Expr>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str) -> Expr {
        Expr::Ident(Ident {
            loc: Span::default(),
            name: name.to_string(),
        })
    }

    fn binary(left: Expr, right: Expr) -> Expr {
        Expr::Binary(Box::new(BinaryExpr {
            loc: Span::default(),
            op: BinaryOp::Add,
            left: Box::new(left),
            right: Box::new(right),
            cache: EvalCache::default(),
        }))
    }

    #[test]
    fn test_kind_matches_variant() {
        assert_eq!(ident("a").kind(), NodeKind::Identifier);
        assert_eq!(binary(ident("a"), ident("b")).kind(), NodeKind::BinaryExpression);
        let pat = Pat::Rest(Box::new(RestElement {
            loc: Span::default(),
            argument: Box::new(Pat::Ident(Ident {
                loc: Span::default(),
                name: "r".into(),
            })),
        }));
        assert_eq!(pat.kind(), NodeKind::RestElement);
        assert!(pat.kind().is_pattern());
        assert!(NodeKind::StringLiteral.is_literal());
    }

    #[test]
    fn test_clone_starts_with_empty_cache() {
        let expr = binary(ident("a"), ident("b"));
        expr.cache().unwrap().set(Value::Number(3.0));
        assert!(expr.cache().unwrap().is_filled());

        let copy = expr.clone();
        assert!(!copy.cache().unwrap().is_filled());
        assert_eq!(expr.cache().unwrap().get(), Some(Value::Number(3.0)));
    }

    #[test]
    fn test_non_memoizing_kinds_have_no_cache() {
        assert!(ident("a").cache().is_none());
        let seq = Expr::Sequence(Box::new(SequenceExpr {
            loc: Span::default(),
            expressions: vec![ident("a"), ident("b")],
        }));
        assert!(seq.cache().is_none());
    }

    #[test]
    fn test_arrow_clone_is_deep() {
        let arrow = ArrowExpr {
            loc: Span::default(),
            params: vec![Pat::Ident(Ident {
                loc: Span::default(),
                name: "x".into(),
            })]
            .into(),
            body: Rc::new(binary(ident("x"), ident("y"))),
        };
        arrow.body.cache().unwrap().set(Value::Number(1.0));
        let copy = arrow.clone();
        assert!(!Rc::ptr_eq(&arrow.body, &copy.body));
        assert!(!copy.body.cache().unwrap().is_filled());
        assert_eq!(copy.params.len(), 1);
    }

    #[test]
    fn test_unparenthesized_strips_all_layers() {
        let inner = ident("a");
        let wrapped = Expr::Paren(Box::new(ParenExpr {
            loc: Span::default(),
            expression: Expr::Paren(Box::new(ParenExpr {
                loc: Span::default(),
                expression: inner,
            })),
        }));
        assert_eq!(wrapped.unparenthesized().kind(), NodeKind::Identifier);
    }

    #[test]
    fn test_assign_op_binary_mapping() {
        assert_eq!(AssignOp::ExpAssign.binary_op(), Some(BinaryOp::Exp));
        assert_eq!(AssignOp::NullishAssign.binary_op(), None);
        assert_eq!(AssignOp::UShrAssign.as_str(), ">>>=");
    }
}
