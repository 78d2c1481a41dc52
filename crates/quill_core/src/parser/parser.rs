//! Recursive-descent expression parser.
//!
//! The parser pulls tokens from a [`Scanner`] one at a time, keeping a single
//! token of lookahead.  Binary operators are handled by precedence climbing
//! over a small operand/operator stack; everything else is plain recursive
//! descent.
//!
//! # Cover grammar
//!
//! Destructuring patterns and arrow parameter lists are parsed as ordinary
//! expressions first and reinterpreted by [`pattern::reinterpret`] once the
//! trailing `=` or `=>` is seen.  The only construct that is valid in a
//! pattern but not in an expression is the shorthand initializer
//! `{ a = 1 }`.  Its position is recorded in
//! `first_cover_initialized_name_error`, which is cleared when the enclosing
//! literal turns into a pattern and reported by
//! [`Parser::isolate_cover_grammar`] otherwise.

use smallvec::SmallVec;

use crate::error::{QuillError, QuillResult};
use crate::parser::ParserOptions;
use crate::parser::ast::{
    ArrayExpr, ArrowExpr, AssignExpr, AssignOp, AssignTarget, BinaryExpr, BinaryOp, BoolLit,
    CallExpr, ConditionalExpr, EvalCache, Expr, Ident, LogicalExpr, LogicalOp, MemberExpr,
    MemberProp, NewExpr, NullLit, NumLit, ObjectExpr, ObjectProp, ParenExpr, Prop, PropKey,
    RegExpLit, SequenceExpr, SourceLocation, SpreadElement, StringLit, TaggedTemplateExpr,
    TemplateElement, TemplateLit, ThisExpr, UnaryExpr, UnaryOp, UpdateExpr, UpdateOp,
};
use crate::parser::pattern::{self, PatternContext};
use crate::parser::scanner::{Position, Scanner, Span, Token, TokenKind, TokenValue};

/// Identifiers that are reserved only in strict mode.
const STRICT_RESERVED_WORDS: &[&str] = &[
    "implements",
    "interface",
    "let",
    "package",
    "private",
    "protected",
    "public",
    "static",
    "yield",
];

/// Flag letters accepted on regular-expression literals.
const REGEXP_FLAGS: &str = "dgimsuyv";

/// A binary or logical operator waiting on the precedence-climbing stack.
#[derive(Clone, Copy)]
struct PendingOperator {
    kind: TokenKind,
    precedence: u8,
    pos: Position,
}

/// Binding power of a binary-operator token, or `0` for anything else.
///
/// `**` is absent: it is right-associative and binds tighter than unary
/// operators, so [`Parser::parse_exponent`] handles it.
fn binary_precedence(kind: TokenKind) -> u8 {
    match kind {
        TokenKind::QuestionQuestion | TokenKind::PipePipe => 1,
        TokenKind::AmpersandAmpersand => 2,
        TokenKind::Pipe => 3,
        TokenKind::Caret => 4,
        TokenKind::Ampersand => 5,
        TokenKind::EqualEqual
        | TokenKind::BangEqual
        | TokenKind::EqualEqualEqual
        | TokenKind::BangEqualEqual => 6,
        TokenKind::Less
        | TokenKind::Greater
        | TokenKind::LessEqual
        | TokenKind::GreaterEqual
        | TokenKind::In
        | TokenKind::Instanceof => 7,
        TokenKind::LessLess | TokenKind::GreaterGreater | TokenKind::GreaterGreaterGreater => 8,
        TokenKind::Plus | TokenKind::Minus => 9,
        TokenKind::Star | TokenKind::Slash | TokenKind::Percent => 11,
        _ => 0,
    }
}

fn assign_op(kind: TokenKind) -> Option<AssignOp> {
    Some(match kind {
        TokenKind::Equal => AssignOp::Assign,
        TokenKind::PlusEqual => AssignOp::AddAssign,
        TokenKind::MinusEqual => AssignOp::SubAssign,
        TokenKind::StarEqual => AssignOp::MulAssign,
        TokenKind::SlashEqual => AssignOp::DivAssign,
        TokenKind::PercentEqual => AssignOp::RemAssign,
        TokenKind::StarStarEqual => AssignOp::ExpAssign,
        TokenKind::LessLessEqual => AssignOp::ShlAssign,
        TokenKind::GreaterGreaterEqual => AssignOp::ShrAssign,
        TokenKind::GreaterGreaterGreaterEqual => AssignOp::UShrAssign,
        TokenKind::PipeEqual => AssignOp::BitOrAssign,
        TokenKind::CaretEqual => AssignOp::BitXorAssign,
        TokenKind::AmpersandEqual => AssignOp::BitAndAssign,
        TokenKind::AmpersandAmpersandEqual => AssignOp::LogicalAndAssign,
        TokenKind::PipePipeEqual => AssignOp::LogicalOrAssign,
        TokenKind::QuestionQuestionEqual => AssignOp::NullishAssign,
        _ => return None,
    })
}

fn unary_op(kind: TokenKind) -> Option<UnaryOp> {
    Some(match kind {
        TokenKind::Minus => UnaryOp::Minus,
        TokenKind::Plus => UnaryOp::Plus,
        TokenKind::Bang => UnaryOp::Not,
        TokenKind::Tilde => UnaryOp::BitNot,
        TokenKind::Typeof => UnaryOp::Typeof,
        TokenKind::Void => UnaryOp::Void,
        _ => return None,
    })
}

fn update_op(kind: TokenKind) -> Option<UpdateOp> {
    match kind {
        TokenKind::PlusPlus => Some(UpdateOp::Increment),
        TokenKind::MinusMinus => Some(UpdateOp::Decrement),
        _ => None,
    }
}

/// Builds the node for a reduced binary operator.  Logical operators get
/// their own node type; mixing `??` with `&&`/`||` without parentheses is
/// rejected here.
fn make_binary(op: PendingOperator, left: Expr, right: Expr) -> QuillResult<Expr> {
    let loc = left.loc().to(right.loc());
    let logical = match op.kind {
        TokenKind::AmpersandAmpersand => Some(LogicalOp::And),
        TokenKind::PipePipe => Some(LogicalOp::Or),
        TokenKind::QuestionQuestion => Some(LogicalOp::NullishCoalesce),
        _ => None,
    };
    if let Some(op_kind) = logical {
        let conflicts = |e: &Expr| match e {
            Expr::Logical(l) => {
                (l.op == LogicalOp::NullishCoalesce) != (op_kind == LogicalOp::NullishCoalesce)
            }
            _ => false,
        };
        if conflicts(&left) || conflicts(&right) {
            return Err(QuillError::syntax(
                "Cannot mix ?? with || or && without parentheses",
                op.pos,
            ));
        }
        return Ok(Expr::Logical(Box::new(LogicalExpr {
            loc,
            op: op_kind,
            left: Box::new(left),
            right: Box::new(right),
            cache: EvalCache::default(),
        })));
    }
    let op = match op.kind {
        TokenKind::EqualEqual => BinaryOp::Eq,
        TokenKind::BangEqual => BinaryOp::NotEq,
        TokenKind::EqualEqualEqual => BinaryOp::StrictEq,
        TokenKind::BangEqualEqual => BinaryOp::StrictNotEq,
        TokenKind::Less => BinaryOp::Lt,
        TokenKind::LessEqual => BinaryOp::LtEq,
        TokenKind::Greater => BinaryOp::Gt,
        TokenKind::GreaterEqual => BinaryOp::GtEq,
        TokenKind::LessLess => BinaryOp::Shl,
        TokenKind::GreaterGreater => BinaryOp::Shr,
        TokenKind::GreaterGreaterGreater => BinaryOp::UShr,
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Sub,
        TokenKind::Star => BinaryOp::Mul,
        TokenKind::Slash => BinaryOp::Div,
        TokenKind::Percent => BinaryOp::Rem,
        TokenKind::Pipe => BinaryOp::BitOr,
        TokenKind::Caret => BinaryOp::BitXor,
        TokenKind::Ampersand => BinaryOp::BitAnd,
        TokenKind::In => BinaryOp::In,
        TokenKind::Instanceof => BinaryOp::Instanceof,
        _ => return Err(QuillError::syntax("Unexpected binary operator", op.pos)),
    };
    Ok(Expr::Binary(Box::new(BinaryExpr {
        loc,
        op,
        left: Box::new(left),
        right: Box::new(right),
        cache: EvalCache::default(),
    })))
}

/// Identifiers, non-optional member chains and parenthesized forms of those
/// may be assigned to or updated.
pub(crate) fn is_simple_target(expr: &Expr) -> bool {
    match expr {
        Expr::Ident(_) => true,
        Expr::Member(_) => !is_optional_chain(expr),
        Expr::Paren(p) => is_simple_target(&p.expression),
        _ => false,
    }
}

/// Returns `true` when any link of the member/call chain ending in `expr` is
/// written with `?.`.
pub(crate) fn is_optional_chain(expr: &Expr) -> bool {
    match expr {
        Expr::Member(m) => m.optional || is_optional_chain(&m.object),
        Expr::Call(c) => c.optional || is_optional_chain(&c.callee),
        _ => false,
    }
}

pub(crate) fn validate_regexp_flags(flags: &str, pos: Position) -> QuillResult<()> {
    let mut seen: SmallVec<[char; 8]> = SmallVec::new();
    for c in flags.chars() {
        if !REGEXP_FLAGS.contains(c) || seen.contains(&c) {
            return Err(QuillError::syntax(
                format!("Invalid regular expression flags '{flags}'"),
                pos,
            ));
        }
        seen.push(c);
    }
    if seen.contains(&'u') && seen.contains(&'v') {
        return Err(QuillError::syntax(
            format!("Invalid regular expression flags '{flags}'"),
            pos,
        ));
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Parser
// ─────────────────────────────────────────────────────────────────────────────

/// Expression parser over a single source string.
pub struct Parser<'src> {
    scanner: Scanner<'src>,
    /// The next unconsumed token.
    lookahead: Token,
    /// End of the most recently consumed token.
    prev_end: Position,
    options: ParserOptions,
    /// Offset of the first token of the innermost assignment expression being
    /// parsed.  An arrow function may only start there.
    assignment_start: usize,
    /// Position of the first `{ a = 1 }` initializer not yet claimed by a
    /// pattern.
    first_cover_initialized_name_error: Option<Position>,
    /// `(spread start, comma)` for every array-literal spread followed by a
    /// trailing comma.  Such a spread may not become a rest element.
    spread_trailing_commas: SmallVec<[(Position, Position); 2]>,
}

impl<'src> Parser<'src> {
    /// Creates a parser and scans the first token.
    pub fn new(source: &'src str, options: ParserOptions) -> QuillResult<Self> {
        let mut scanner = Scanner::new(source);
        let lookahead = scanner.next_token()?;
        Ok(Self {
            scanner,
            prev_end: lookahead.span.start,
            lookahead,
            options,
            assignment_start: 0,
            first_cover_initialized_name_error: None,
            spread_trailing_commas: SmallVec::new(),
        })
    }

    /// Parses the whole source as one expression.  Any token left over after
    /// the expression is an error.
    pub fn parse_program(&mut self) -> QuillResult<Expr> {
        let expr = self.parse_expression()?;
        if self.lookahead.kind != TokenKind::Eof {
            return Err(self.unexpected());
        }
        Ok(expr)
    }

    // ── Token helpers ───────────────────────────────────────────────────────

    fn advance(&mut self) -> QuillResult<Token> {
        let next = self.scanner.next_token()?;
        let token = std::mem::replace(&mut self.lookahead, next);
        self.prev_end = token.span.end;
        Ok(token)
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.lookahead.kind == kind
    }

    fn eat(&mut self, kind: TokenKind) -> QuillResult<bool> {
        if self.at(kind) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect(&mut self, kind: TokenKind) -> QuillResult<Token> {
        if self.at(kind) {
            self.advance()
        } else {
            Err(self.unexpected())
        }
    }

    /// The token after the lookahead, scanned on a throwaway copy of the
    /// scanner.
    fn peek_second(&self) -> QuillResult<Token> {
        self.scanner.clone().next_token()
    }

    fn unexpected(&self) -> QuillError {
        unexpected_token(&self.lookahead)
    }

    fn span_from(&self, start: Position) -> SourceLocation {
        Span {
            start,
            end: self.prev_end,
        }
    }

    fn start(&self) -> Position {
        self.lookahead.span.start
    }

    // ── Cover grammar ───────────────────────────────────────────────────────

    /// Runs `parse` in a context where the result must be an expression:
    /// a pending shorthand initializer inside it is an error.
    fn isolate_cover_grammar<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> QuillResult<T>,
    ) -> QuillResult<T> {
        let previous = self.first_cover_initialized_name_error.take();
        let result = parse(self)?;
        if let Some(pos) = self.first_cover_initialized_name_error {
            return Err(QuillError::syntax("Invalid shorthand property initializer", pos));
        }
        self.first_cover_initialized_name_error = previous;
        Ok(result)
    }

    /// Runs `parse` in a context where the result may still become a
    /// pattern: a pending shorthand initializer is passed up.
    fn inherit_cover_grammar<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> QuillResult<T>,
    ) -> QuillResult<T> {
        let previous = self.first_cover_initialized_name_error.take();
        let result = parse(self)?;
        self.first_cover_initialized_name_error =
            previous.or(self.first_cover_initialized_name_error);
        Ok(result)
    }

    // ── Expressions ─────────────────────────────────────────────────────────

    /// *Expression*: one or more assignment expressions separated by `,`.
    fn parse_expression(&mut self) -> QuillResult<Expr> {
        let start = self.start();
        let first = self.isolate_cover_grammar(Self::parse_assignment)?;
        if !self.at(TokenKind::Comma) {
            return Ok(first);
        }
        let mut expressions = vec![first];
        while self.eat(TokenKind::Comma)? {
            expressions.push(self.isolate_cover_grammar(Self::parse_assignment)?);
        }
        Ok(Expr::Sequence(Box::new(SequenceExpr {
            loc: self.span_from(start),
            expressions,
        })))
    }

    /// *AssignmentExpression*, including arrow functions.
    fn parse_assignment(&mut self) -> QuillResult<Expr> {
        let saved = self.assignment_start;
        self.assignment_start = self.lookahead.span.start.offset;
        let result = self.parse_assignment_inner();
        self.assignment_start = saved;
        result
    }

    fn parse_assignment_inner(&mut self) -> QuillResult<Expr> {
        let start = self.start();
        let expr = self.inherit_cover_grammar(Self::parse_conditional)?;
        if matches!(expr, Expr::Arrow(_)) {
            return Ok(expr);
        }
        let Some(op) = assign_op(self.lookahead.kind) else {
            return Ok(expr);
        };

        let left = if op == AssignOp::Assign && matches!(expr, Expr::Array(_) | Expr::Object(_)) {
            let pat = pattern::reinterpret(expr, PatternContext::Assignment)?;
            pattern::check_rest_trailing_commas(&pat, &self.spread_trailing_commas)?;
            self.first_cover_initialized_name_error = None;
            AssignTarget::Pat(pat)
        } else if is_simple_target(&expr) {
            AssignTarget::Expr(Box::new(expr))
        } else {
            return Err(QuillError::syntax(
                "Invalid left-hand side in assignment",
                expr.loc().start,
            ));
        };
        self.advance()?;
        let right = self.isolate_cover_grammar(Self::parse_assignment)?;
        Ok(Expr::Assign(Box::new(AssignExpr {
            loc: self.span_from(start),
            op,
            left,
            right: Box::new(right),
        })))
    }

    /// `test ? consequent : alternate`
    fn parse_conditional(&mut self) -> QuillResult<Expr> {
        let start = self.start();
        let test = self.inherit_cover_grammar(Self::parse_binary)?;
        if !self.at(TokenKind::Question) {
            return Ok(test);
        }
        self.advance()?;
        let consequent = self.isolate_cover_grammar(Self::parse_assignment)?;
        self.expect(TokenKind::Colon)?;
        let alternate = self.isolate_cover_grammar(Self::parse_assignment)?;
        Ok(Expr::Conditional(Box::new(ConditionalExpr {
            loc: self.span_from(start),
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
            cache: EvalCache::default(),
        })))
    }

    /// Binary and logical operators by precedence climbing.
    fn parse_binary(&mut self) -> QuillResult<Expr> {
        let first = self.inherit_cover_grammar(Self::parse_exponent)?;
        let precedence = binary_precedence(self.lookahead.kind);
        if precedence == 0 {
            return Ok(first);
        }

        let mut operands: SmallVec<[Expr; 8]> = SmallVec::new();
        let mut operators: SmallVec<[PendingOperator; 8]> = SmallVec::new();
        operands.push(first);
        loop {
            let precedence = binary_precedence(self.lookahead.kind);
            if precedence == 0 {
                break;
            }
            while let Some(top) = operators.last().copied() {
                if precedence > top.precedence {
                    break;
                }
                operators.pop();
                Self::reduce(&mut operands, top)?;
            }
            operators.push(PendingOperator {
                kind: self.lookahead.kind,
                precedence,
                pos: self.start(),
            });
            self.advance()?;
            operands.push(self.isolate_cover_grammar(Self::parse_exponent)?);
        }
        while let Some(top) = operators.pop() {
            Self::reduce(&mut operands, top)?;
        }
        operands
            .pop()
            .ok_or_else(|| QuillError::syntax("Missing operand", self.prev_end))
    }

    fn reduce(operands: &mut SmallVec<[Expr; 8]>, op: PendingOperator) -> QuillResult<()> {
        match (operands.pop(), operands.pop()) {
            (Some(right), Some(left)) => {
                operands.push(make_binary(op, left, right)?);
                Ok(())
            }
            _ => Err(QuillError::syntax("Missing operand", op.pos)),
        }
    }

    /// `base ** exponent`, right-associative.
    fn parse_exponent(&mut self) -> QuillResult<Expr> {
        let base = self.inherit_cover_grammar(Self::parse_unary)?;
        if !self.at(TokenKind::StarStar) {
            return Ok(base);
        }
        if matches!(base, Expr::Unary(_)) {
            return Err(QuillError::syntax(
                "Unary operator used immediately before exponentiation expression. \
                 Parenthesis must be used to disambiguate operator precedence",
                self.start(),
            ));
        }
        self.advance()?;
        let exponent = self.isolate_cover_grammar(Self::parse_exponent)?;
        Ok(Expr::Binary(Box::new(BinaryExpr {
            loc: base.loc().to(exponent.loc()),
            op: BinaryOp::Exp,
            left: Box::new(base),
            right: Box::new(exponent),
            cache: EvalCache::default(),
        })))
    }

    /// Prefix unary operators and prefix `++`/`--`.
    fn parse_unary(&mut self) -> QuillResult<Expr> {
        let start = self.start();
        if let Some(op) = unary_op(self.lookahead.kind) {
            self.advance()?;
            let argument = self.isolate_cover_grammar(Self::parse_unary)?;
            return Ok(Expr::Unary(Box::new(UnaryExpr {
                loc: self.span_from(start),
                op,
                argument: Box::new(argument),
                cache: EvalCache::default(),
            })));
        }
        if let Some(op) = update_op(self.lookahead.kind) {
            self.advance()?;
            let argument = self.isolate_cover_grammar(Self::parse_unary)?;
            if !is_simple_target(&argument) {
                return Err(QuillError::syntax(
                    "Invalid left-hand side expression in prefix operation",
                    argument.loc().start,
                ));
            }
            return Ok(Expr::Update(Box::new(UpdateExpr {
                loc: self.span_from(start),
                op,
                prefix: true,
                argument: Box::new(argument),
            })));
        }
        self.parse_postfix()
    }

    /// Postfix `++`/`--`, which may not follow a line break.
    fn parse_postfix(&mut self) -> QuillResult<Expr> {
        let start = self.start();
        let expr = self.inherit_cover_grammar(Self::parse_lhs_chain)?;
        let Some(op) = update_op(self.lookahead.kind) else {
            return Ok(expr);
        };
        if self.lookahead.had_line_terminator_before {
            return Ok(expr);
        }
        if !is_simple_target(&expr) {
            return Err(QuillError::syntax(
                "Invalid left-hand side expression in postfix operation",
                expr.loc().start,
            ));
        }
        self.advance()?;
        Ok(Expr::Update(Box::new(UpdateExpr {
            loc: self.span_from(start),
            op,
            prefix: false,
            argument: Box::new(expr),
        })))
    }

    // ── Member / call chains ────────────────────────────────────────────────

    /// A primary or `new` expression followed by any number of `.x`, `[x]`,
    /// `(args)`, tagged templates and `?.` links.
    fn parse_lhs_chain(&mut self) -> QuillResult<Expr> {
        let start = self.start();
        let mut expr = if self.at(TokenKind::New) {
            self.parse_new()?
        } else {
            self.parse_primary()?
        };
        if matches!(expr, Expr::Arrow(_)) {
            return Ok(expr);
        }

        let mut in_optional_chain = false;
        loop {
            match self.lookahead.kind {
                TokenKind::Dot => {
                    self.advance()?;
                    let property = self.parse_identifier_name()?;
                    expr = self.member(start, expr, MemberProp::Ident(property), false);
                }
                TokenKind::LeftBracket => {
                    let property = self.parse_computed_member()?;
                    expr = self.member(start, expr, property, false);
                }
                TokenKind::LeftParen => {
                    let arguments = self.parse_arguments()?;
                    expr = self.call(start, expr, arguments, false);
                }
                TokenKind::QuestionDot => {
                    in_optional_chain = true;
                    self.advance()?;
                    match self.lookahead.kind {
                        TokenKind::LeftParen => {
                            let arguments = self.parse_arguments()?;
                            expr = self.call(start, expr, arguments, true);
                        }
                        TokenKind::LeftBracket => {
                            let property = self.parse_computed_member()?;
                            expr = self.member(start, expr, property, true);
                        }
                        k if k.is_template() => {
                            return Err(QuillError::syntax(
                                "Invalid tagged template on optional chain",
                                self.start(),
                            ));
                        }
                        _ => {
                            let property = self.parse_identifier_name()?;
                            expr = self.member(start, expr, MemberProp::Ident(property), true);
                        }
                    }
                }
                TokenKind::NoSubstitutionTemplate | TokenKind::TemplateHead => {
                    if in_optional_chain {
                        return Err(QuillError::syntax(
                            "Invalid tagged template on optional chain",
                            self.start(),
                        ));
                    }
                    let quasi = self.parse_template()?;
                    expr = Expr::TaggedTemplate(Box::new(TaggedTemplateExpr {
                        loc: self.span_from(start),
                        tag: Box::new(expr),
                        quasi,
                        cache: EvalCache::default(),
                    }));
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    /// `new callee args?`.  The callee is a member expression; calls and
    /// optional links bind to the result of `new`, not to the callee.
    fn parse_new(&mut self) -> QuillResult<Expr> {
        let start = self.start();
        self.expect(TokenKind::New)?;
        if self.at(TokenKind::Dot) {
            return Err(self.unexpected());
        }
        let mut callee = if self.at(TokenKind::New) {
            self.parse_new()?
        } else {
            self.parse_primary()?
        };
        let callee_start = callee.loc().start;
        loop {
            match self.lookahead.kind {
                TokenKind::Dot => {
                    self.advance()?;
                    let property = self.parse_identifier_name()?;
                    callee = self.member(callee_start, callee, MemberProp::Ident(property), false);
                }
                TokenKind::LeftBracket => {
                    let property = self.parse_computed_member()?;
                    callee = self.member(callee_start, callee, property, false);
                }
                TokenKind::NoSubstitutionTemplate | TokenKind::TemplateHead => {
                    let quasi = self.parse_template()?;
                    callee = Expr::TaggedTemplate(Box::new(TaggedTemplateExpr {
                        loc: self.span_from(callee_start),
                        tag: Box::new(callee),
                        quasi,
                        cache: EvalCache::default(),
                    }));
                }
                TokenKind::QuestionDot => {
                    return Err(QuillError::syntax(
                        "Invalid optional chain from new expression",
                        self.start(),
                    ));
                }
                _ => break,
            }
        }
        let arguments = if self.at(TokenKind::LeftParen) {
            self.parse_arguments()?
        } else {
            Vec::new()
        };
        Ok(Expr::New(Box::new(NewExpr {
            loc: self.span_from(start),
            callee: Box::new(callee),
            arguments,
            cache: EvalCache::default(),
        })))
    }

    fn member(&self, start: Position, object: Expr, property: MemberProp, optional: bool) -> Expr {
        Expr::Member(Box::new(MemberExpr {
            loc: self.span_from(start),
            object: Box::new(object),
            property,
            optional,
            cache: EvalCache::default(),
        }))
    }

    fn call(&self, start: Position, callee: Expr, arguments: Vec<Expr>, optional: bool) -> Expr {
        Expr::Call(Box::new(CallExpr {
            loc: self.span_from(start),
            callee: Box::new(callee),
            arguments,
            optional,
            cache: EvalCache::default(),
        }))
    }

    /// `[ expression ]` after an object.
    fn parse_computed_member(&mut self) -> QuillResult<MemberProp> {
        self.expect(TokenKind::LeftBracket)?;
        let property = self.isolate_cover_grammar(Self::parse_expression)?;
        self.expect(TokenKind::RightBracket)?;
        Ok(MemberProp::Computed(Box::new(property)))
    }

    /// `( arg, ...spread, )`
    fn parse_arguments(&mut self) -> QuillResult<Vec<Expr>> {
        self.expect(TokenKind::LeftParen)?;
        let mut arguments = Vec::new();
        while !self.at(TokenKind::RightParen) {
            let argument = if self.at(TokenKind::DotDotDot) {
                let start = self.start();
                self.advance()?;
                let inner = self.isolate_cover_grammar(Self::parse_assignment)?;
                Expr::Spread(Box::new(SpreadElement {
                    loc: self.span_from(start),
                    argument: Box::new(inner),
                }))
            } else {
                self.isolate_cover_grammar(Self::parse_assignment)?
            };
            arguments.push(argument);
            if !self.at(TokenKind::RightParen) {
                self.expect(TokenKind::Comma)?;
            }
        }
        self.expect(TokenKind::RightParen)?;
        Ok(arguments)
    }

    /// Any *IdentifierName*, reserved words included (after `.` and as
    /// object keys).
    fn parse_identifier_name(&mut self) -> QuillResult<Ident> {
        if !self.lookahead.is_identifier_name() {
            return Err(self.unexpected());
        }
        let token = self.advance()?;
        Ok(Ident {
            loc: token.span,
            name: token_name(&token),
        })
    }

    // ── Primary expressions ─────────────────────────────────────────────────

    fn parse_primary(&mut self) -> QuillResult<Expr> {
        let start = self.start();
        match self.lookahead.kind {
            TokenKind::Identifier => {
                if self.lookahead.span.start.offset == self.assignment_start
                    && self.peek_second()?.kind == TokenKind::Arrow
                {
                    let param = self.parse_binding_identifier()?;
                    return self.parse_arrow(start, vec![Expr::Ident(param)]);
                }
                Ok(Expr::Ident(self.parse_binding_identifier()?))
            }
            TokenKind::NumericLiteral => {
                let token = self.advance()?;
                if token.octal && self.options.strict {
                    let message = if token.raw.contains(['8', '9']) {
                        "Decimals with leading zeros are not allowed in strict mode."
                    } else {
                        "Octal literals are not allowed in strict mode."
                    };
                    return Err(QuillError::syntax(message, token.span.start));
                }
                let value = match token.value {
                    TokenValue::Number(n) => n,
                    _ => f64::NAN,
                };
                Ok(Expr::Num(NumLit {
                    loc: token.span,
                    value,
                    raw: token.raw,
                }))
            }
            TokenKind::StringLiteral => Ok(Expr::Str(self.parse_string_literal()?)),
            TokenKind::True | TokenKind::False => {
                let token = self.advance()?;
                Ok(Expr::Bool(BoolLit {
                    loc: token.span,
                    value: token.kind == TokenKind::True,
                }))
            }
            TokenKind::Null => {
                let token = self.advance()?;
                Ok(Expr::Null(NullLit { loc: token.span }))
            }
            TokenKind::This => {
                let token = self.advance()?;
                Ok(Expr::This(ThisExpr { loc: token.span }))
            }
            TokenKind::NoSubstitutionTemplate | TokenKind::TemplateHead => {
                Ok(Expr::Template(Box::new(self.parse_template()?)))
            }
            TokenKind::LeftBracket => self.parse_array_literal(),
            TokenKind::LeftBrace => self.parse_object_literal(),
            TokenKind::LeftParen => self.parse_group_or_arrow(),
            TokenKind::Slash | TokenKind::SlashEqual => {
                let token = self.scanner.rescan_regexp(&self.lookahead)?;
                self.lookahead = token;
                let token = self.advance()?;
                let TokenValue::RegExp { pattern, flags } = token.value else {
                    return Err(unexpected_token(&token));
                };
                validate_regexp_flags(&flags, token.span.start)?;
                Ok(Expr::Regexp(RegExpLit {
                    loc: token.span,
                    pattern,
                    flags,
                }))
            }
            _ => Err(self.unexpected()),
        }
    }

    /// An identifier in reference or binding position.
    fn parse_binding_identifier(&mut self) -> QuillResult<Ident> {
        if !self.at(TokenKind::Identifier) {
            return Err(self.unexpected());
        }
        let token = self.advance()?;
        let name = token_name(&token);
        if self.options.strict && STRICT_RESERVED_WORDS.contains(&name.as_str()) {
            return Err(QuillError::syntax(
                "Unexpected strict mode reserved word",
                token.span.start,
            ));
        }
        Ok(Ident {
            loc: token.span,
            name,
        })
    }

    fn parse_string_literal(&mut self) -> QuillResult<StringLit> {
        let token = self.expect(TokenKind::StringLiteral)?;
        if token.octal && self.options.strict {
            return Err(QuillError::syntax(
                "Octal escape sequences are not allowed in strict mode.",
                token.span.start,
            ));
        }
        Ok(StringLit {
            loc: token.span,
            value: token_name(&token),
        })
    }

    /// A template literal starting at the lookahead.  The scanner produces
    /// the middle and tail spans itself when it reaches the `}` closing a
    /// substitution.
    fn parse_template(&mut self) -> QuillResult<TemplateLit> {
        let start = self.start();
        let mut token = self.advance()?;
        let mut quasis = vec![template_element(&token)];
        let mut expressions = Vec::new();
        while !token.is_template_tail() {
            expressions.push(self.parse_expression()?);
            if !matches!(
                self.lookahead.kind,
                TokenKind::TemplateMiddle | TokenKind::TemplateTail
            ) {
                return Err(self.unexpected());
            }
            token = self.advance()?;
            quasis.push(template_element(&token));
        }
        Ok(TemplateLit {
            loc: self.span_from(start),
            quasis,
            expressions,
            cache: EvalCache::default(),
        })
    }

    /// `[ a, , ...b ]`
    fn parse_array_literal(&mut self) -> QuillResult<Expr> {
        let start = self.start();
        self.expect(TokenKind::LeftBracket)?;
        let mut elements = Vec::new();
        while !self.at(TokenKind::RightBracket) {
            if self.eat(TokenKind::Comma)? {
                elements.push(None);
                continue;
            }
            let element = if self.at(TokenKind::DotDotDot) {
                let spread_start = self.start();
                self.advance()?;
                let argument = self.inherit_cover_grammar(Self::parse_assignment)?;
                Expr::Spread(Box::new(SpreadElement {
                    loc: self.span_from(spread_start),
                    argument: Box::new(argument),
                }))
            } else {
                self.inherit_cover_grammar(Self::parse_assignment)?
            };
            let spread_start = match &element {
                Expr::Spread(spread) => Some(spread.loc.start),
                _ => None,
            };
            elements.push(Some(element));
            if !self.at(TokenKind::RightBracket) {
                let comma = self.expect(TokenKind::Comma)?;
                if let Some(spread_start) = spread_start
                    && self.at(TokenKind::RightBracket)
                {
                    self.spread_trailing_commas
                        .push((spread_start, comma.span.start));
                }
            }
        }
        self.expect(TokenKind::RightBracket)?;
        Ok(Expr::Array(Box::new(ArrayExpr {
            loc: self.span_from(start),
            elements,
        })))
    }

    /// `{ a, b: 1, [c]: 2, "d": 3, 4: 5, ...e }`
    fn parse_object_literal(&mut self) -> QuillResult<Expr> {
        let start = self.start();
        self.expect(TokenKind::LeftBrace)?;
        let mut properties = Vec::new();
        while !self.at(TokenKind::RightBrace) {
            properties.push(self.parse_object_property()?);
            if !self.at(TokenKind::RightBrace) {
                self.expect(TokenKind::Comma)?;
            }
        }
        self.expect(TokenKind::RightBrace)?;
        Ok(Expr::Object(Box::new(ObjectExpr {
            loc: self.span_from(start),
            properties,
        })))
    }

    fn parse_object_property(&mut self) -> QuillResult<ObjectProp> {
        let start = self.start();
        if self.at(TokenKind::DotDotDot) {
            self.advance()?;
            let argument = self.inherit_cover_grammar(Self::parse_assignment)?;
            return Ok(ObjectProp::Spread(SpreadElement {
                loc: self.span_from(start),
                argument: Box::new(argument),
            }));
        }

        let key = match self.lookahead.kind {
            TokenKind::LeftBracket => {
                self.advance()?;
                let key = self.isolate_cover_grammar(Self::parse_assignment)?;
                self.expect(TokenKind::RightBracket)?;
                PropKey::Computed(Box::new(key))
            }
            TokenKind::StringLiteral => PropKey::Str(self.parse_string_literal()?),
            TokenKind::NumericLiteral => match self.parse_primary()? {
                Expr::Num(n) => PropKey::Num(n),
                _ => return Err(QuillError::syntax("Invalid property key", start)),
            },
            TokenKind::Identifier
                if matches!(
                    self.peek_second()?.kind,
                    TokenKind::Comma | TokenKind::RightBrace | TokenKind::Equal
                ) =>
            {
                return self.parse_shorthand_property(start);
            }
            _ if self.lookahead.is_identifier_name() => {
                PropKey::Ident(self.parse_identifier_name()?)
            }
            _ => return Err(self.unexpected()),
        };

        self.expect(TokenKind::Colon)?;
        let value = self.inherit_cover_grammar(Self::parse_assignment)?;
        Ok(ObjectProp::Prop(Box::new(Prop {
            loc: self.span_from(start),
            key,
            value,
            shorthand: false,
        })))
    }

    /// `{ a }` or the pattern-only `{ a = 1 }`.
    fn parse_shorthand_property(&mut self, start: Position) -> QuillResult<ObjectProp> {
        let id = self.parse_binding_identifier()?;
        let key = PropKey::Ident(id.clone());
        let value = if self.at(TokenKind::Equal) {
            let eq = self.advance()?;
            if self.first_cover_initialized_name_error.is_none() {
                self.first_cover_initialized_name_error = Some(eq.span.start);
            }
            let default = self.isolate_cover_grammar(Self::parse_assignment)?;
            Expr::Assign(Box::new(AssignExpr {
                loc: self.span_from(start),
                op: AssignOp::Assign,
                left: AssignTarget::Expr(Box::new(Expr::Ident(id))),
                right: Box::new(default),
            }))
        } else {
            Expr::Ident(id)
        };
        Ok(ObjectProp::Prop(Box::new(Prop {
            loc: self.span_from(start),
            key,
            value,
            shorthand: true,
        })))
    }

    // ── Parentheses and arrows ──────────────────────────────────────────────

    /// `( … )` as a parenthesized expression, or the parameter list of an
    /// arrow function when `=>` follows.
    fn parse_group_or_arrow(&mut self) -> QuillResult<Expr> {
        let start = self.start();
        let may_be_arrow = start.offset == self.assignment_start;
        self.expect(TokenKind::LeftParen)?;

        if self.at(TokenKind::RightParen) {
            let close = self.advance()?;
            if !may_be_arrow || !self.at(TokenKind::Arrow) {
                return Err(unexpected_token(&close));
            }
            return self.parse_arrow(start, Vec::new());
        }

        let mut items = Vec::new();
        // Set by constructs only legal in a parameter list: `...rest` and a
        // trailing comma.
        let mut params_only: Option<Position> = None;
        loop {
            if self.at(TokenKind::DotDotDot) {
                let rest_start = self.start();
                self.advance()?;
                let argument = self.inherit_cover_grammar(Self::parse_assignment)?;
                items.push(Expr::Spread(Box::new(SpreadElement {
                    loc: self.span_from(rest_start),
                    argument: Box::new(argument),
                })));
                params_only = params_only.or(Some(rest_start));
                if !self.at(TokenKind::RightParen) {
                    return Err(QuillError::syntax(
                        "Rest parameter must be last formal parameter",
                        self.start(),
                    ));
                }
                break;
            }
            items.push(self.inherit_cover_grammar(Self::parse_assignment)?);
            if !self.at(TokenKind::Comma) {
                break;
            }
            let comma = self.advance()?;
            if self.at(TokenKind::RightParen) {
                params_only = params_only.or(Some(comma.span.start));
                break;
            }
        }
        let close = self.expect(TokenKind::RightParen)?;

        if may_be_arrow && self.at(TokenKind::Arrow) {
            return self.parse_arrow(start, items);
        }
        if params_only.is_some() {
            return Err(unexpected_token(&close));
        }

        let expression = if items.len() == 1 {
            items.pop().ok_or_else(|| unexpected_token(&close))?
        } else {
            let inner_start = items.first().map(|e| e.loc().start).unwrap_or(start);
            let inner_end = items.last().map(|e| e.loc().end).unwrap_or(start);
            Expr::Sequence(Box::new(SequenceExpr {
                loc: Span {
                    start: inner_start,
                    end: inner_end,
                },
                expressions: items,
            }))
        };
        Ok(Expr::Paren(Box::new(ParenExpr {
            loc: self.span_from(start),
            expression,
        })))
    }

    /// Finishes an arrow function whose parameters were parsed as `params`.
    /// The lookahead is `=>`.
    fn parse_arrow(&mut self, start: Position, params: Vec<Expr>) -> QuillResult<Expr> {
        let params = pattern::reinterpret_params(params)?;
        for param in &params {
            pattern::check_rest_trailing_commas(param, &self.spread_trailing_commas)?;
        }
        self.first_cover_initialized_name_error = None;
        let arrow = self.expect(TokenKind::Arrow)?;
        if arrow.had_line_terminator_before {
            return Err(unexpected_token(&arrow));
        }
        if self.at(TokenKind::LeftBrace) {
            return Err(QuillError::syntax(
                "Arrow function block bodies are not supported",
                self.start(),
            ));
        }
        let body = self.isolate_cover_grammar(Self::parse_assignment)?;
        Ok(Expr::Arrow(Box::new(ArrowExpr {
            loc: self.span_from(start),
            params: params.into(),
            body: body.into(),
        })))
    }
}

fn unexpected_token(token: &Token) -> QuillError {
    QuillError::syntax(token.unexpected_message(), token.span.start)
}

/// The name carried by an identifier, keyword or string token.
fn token_name(token: &Token) -> String {
    token
        .str_value()
        .map(str::to_string)
        .unwrap_or_else(|| token.raw.clone())
}

fn template_element(token: &Token) -> TemplateElement {
    let (cooked, raw) = match &token.value {
        TokenValue::Template { cooked, raw } => (cooked.clone(), raw.clone()),
        _ => (String::new(), String::new()),
    };
    TemplateElement {
        loc: token.span,
        raw,
        cooked,
        tail: token.is_template_tail(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use crate::parser::ast::{NodeKind, Pat};
    use crate::parser::{ParserOptions, parse, parse_with_options};

    use super::*;

    fn syntax_error(src: &str) -> QuillError {
        let err = parse(src).expect_err(src);
        assert!(err.is_syntax_error(), "{src}: {err}");
        err
    }

    fn strict_error(src: &str) -> String {
        parse_with_options(src, &ParserOptions { strict: true })
            .expect_err(src)
            .message()
            .to_string()
    }

    #[test]
    fn test_precedence_and_associativity() {
        assert_eq!(parse("1 + 2 * 3").unwrap().to_string(), "1 + 2 * 3");
        assert_eq!(parse("(1 + 2) * 3").unwrap().to_string(), "(1 + 2) * 3");
        match parse("a - b - c").unwrap() {
            Expr::Binary(b) => {
                assert_eq!(b.op, BinaryOp::Sub);
                assert_eq!(b.left.kind(), NodeKind::BinaryExpression);
                assert_eq!(b.right.kind(), NodeKind::Identifier);
            }
            other => panic!("unexpected {other:?}"),
        }
        match parse("2 ** 3 ** 2").unwrap() {
            Expr::Binary(b) => {
                assert_eq!(b.op, BinaryOp::Exp);
                assert_eq!(b.left.kind(), NodeKind::NumericLiteral);
                assert_eq!(b.right.kind(), NodeKind::BinaryExpression);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_logical_nodes_are_distinct_from_binary() {
        let expr = parse("a && b || c ?? d").unwrap_err();
        assert_eq!(expr.message(), "Cannot mix ?? with || or && without parentheses");
        match parse("a || b && c").unwrap() {
            Expr::Logical(l) => {
                assert_eq!(l.op, LogicalOp::Or);
                assert_eq!(l.right.kind(), NodeKind::LogicalExpression);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(parse("(a || b) ?? c").is_ok());
        assert!(parse("a ?? (b && c)").is_ok());
    }

    #[test]
    fn test_unary_before_exponent_is_rejected() {
        syntax_error("-x ** 2");
        assert!(parse("(-x) ** 2").is_ok());
        assert!(parse("++x ** 2").is_ok());
    }

    #[test]
    fn test_error_points_at_offending_token() {
        let err = syntax_error("1 + if");
        assert_eq!(err.message(), "Unexpected token 'if'");
        assert_eq!(err.position().offset, 4);
        assert_eq!(err.position().column, 5);

        assert_eq!(syntax_error("").message(), "Unexpected end of input");
        assert_eq!(syntax_error("a b").message(), "Unexpected identifier 'b'");
        assert_eq!(syntax_error("a 1").message(), "Unexpected number");
        assert_eq!(syntax_error("(1").message(), "Unexpected end of input");
    }

    #[test]
    fn test_member_call_and_optional_chain() {
        let expr = parse("a?.b.c(d)?.[e]").unwrap();
        assert_eq!(expr.kind(), NodeKind::MemberExpression);
        assert_eq!(expr.to_string(), "a?.b.c(d)?.[e]");
        syntax_error("a?.b`t`");
        syntax_error("a?.`t`");
        syntax_error("new a?.b()");
    }

    #[test]
    fn test_new_binds_member_chain_only() {
        match parse("new a.b(1).c").unwrap() {
            Expr::Member(m) => match *m.object {
                Expr::New(n) => {
                    assert_eq!(n.callee.kind(), NodeKind::MemberExpression);
                    assert_eq!(n.arguments.len(), 1);
                }
                other => panic!("unexpected {other:?}"),
            },
            other => panic!("unexpected {other:?}"),
        }
        match parse("new new A()()").unwrap() {
            Expr::New(n) => assert_eq!(n.callee.kind(), NodeKind::NewExpression),
            other => panic!("unexpected {other:?}"),
        }
        match parse("new A").unwrap() {
            Expr::New(n) => assert!(n.arguments.is_empty()),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_arrow_functions() {
        match parse("(a, [b], {c}, d = 1, ...e) => a").unwrap() {
            Expr::Arrow(arrow) => {
                assert_eq!(arrow.params.len(), 5);
                assert_eq!(arrow.params[1].kind(), NodeKind::ArrayPattern);
                assert_eq!(arrow.params[3].kind(), NodeKind::AssignmentPattern);
                assert_eq!(arrow.params[4].kind(), NodeKind::RestElement);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(parse("x => y => x + y").unwrap().to_string(), "(x) => (y) => x + y");
        assert_eq!(parse("() => 1").unwrap().kind(), NodeKind::ArrowFunctionExpression);
        assert_eq!(parse("f(x => x, (a, b,) => a)").unwrap().kind(), NodeKind::CallExpression);
    }

    #[test]
    fn test_arrow_errors() {
        assert_eq!(
            syntax_error("(a, a) => 1").message(),
            "Duplicate parameter name not allowed in this context"
        );
        assert_eq!(syntax_error("(a.b) => 1").message(), "Invalid parameter");
        assert_eq!(syntax_error("(1) => 1").message(), "Invalid parameter");
        syntax_error("x => { return x }");
        syntax_error("a + (b) => c");
        syntax_error("(...a, b) => 1");
        syntax_error("(...a)");
        syntax_error("(a,)");
        syntax_error("()");
    }

    #[test]
    fn test_destructuring_assignment() {
        match parse("[a, {b, c: [d] = []}, ...e] = f").unwrap() {
            Expr::Assign(assign) => match assign.left {
                AssignTarget::Pat(Pat::Array(array)) => assert_eq!(array.elements.len(), 3),
                other => panic!("unexpected {other:?}"),
            },
            other => panic!("unexpected {other:?}"),
        }
        assert!(parse("({a = 1} = b)").is_ok());
        assert!(parse("[{a = 1}] = b").is_ok());
        assert!(parse("({a = 1}) => a").is_ok());
    }

    #[test]
    fn test_shorthand_initializer_outside_pattern() {
        let err = syntax_error("({a = 1})");
        assert_eq!(err.message(), "Invalid shorthand property initializer");
        assert_eq!(err.position().offset, 4);
        syntax_error("f({a = 1})");
        syntax_error("[{a = 1}, [b] = c]");
    }

    #[test]
    fn test_invalid_assignment_targets() {
        for src in ["1 = 2", "a + b = c", "f() = 1", "a?.b = 1", "({}) = 1"] {
            assert_eq!(
                syntax_error(src).message(),
                "Invalid left-hand side in assignment",
                "{src}"
            );
        }
        assert_eq!(
            syntax_error("[a] += 1").message(),
            "Invalid left-hand side in assignment"
        );
        assert!(parse("(a) = 1").is_ok());
        assert!(parse("a.b[c] **= 2").is_ok());
        assert!(parse("a ??= b").is_ok());
    }

    #[test]
    fn test_update_expressions() {
        assert!(parse("a++").is_ok());
        assert!(parse("--a.b").is_ok());
        assert_eq!(
            syntax_error("1++").message(),
            "Invalid left-hand side expression in postfix operation"
        );
        assert_eq!(
            syntax_error("++f()").message(),
            "Invalid left-hand side expression in prefix operation"
        );
        // A line break before `++` ends the expression.
        syntax_error("a\n++");
    }

    #[test]
    fn test_templates_and_tagged_templates() {
        match parse("`a${b}c${d + 1}e`").unwrap() {
            Expr::Template(t) => {
                assert_eq!(t.quasis.len(), 3);
                assert_eq!(t.expressions.len(), 2);
                assert!(t.quasis[2].tail);
                assert_eq!(t.quasis[0].cooked, "a");
            }
            other => panic!("unexpected {other:?}"),
        }
        match parse("tag`x${{a: 1}.a}y`").unwrap() {
            Expr::TaggedTemplate(t) => assert_eq!(t.quasi.expressions.len(), 1),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_regexp_literal_in_primary_position() {
        match parse("/ab+c/gi").unwrap() {
            Expr::Regexp(r) => {
                assert_eq!(r.pattern, "ab+c");
                assert_eq!(r.flags, "gi");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(parse("a / b / c").unwrap().kind(), NodeKind::BinaryExpression);
        assert_eq!(parse("x = /=/").unwrap().kind(), NodeKind::AssignmentExpression);
        syntax_error("/a/gg");
        syntax_error("/a/x");
        syntax_error("/a/uv");
    }

    #[test]
    fn test_object_literal_keys() {
        let expr = parse("({ if: 1, 'a b': 2, 3: 4, [k]: 5, get: 6, ...r })").unwrap();
        assert_eq!(expr.kind(), NodeKind::ParenthesizedExpression);
        syntax_error("({ if })");
        syntax_error("({ [a] })");
        syntax_error("({ a b })");
    }

    #[test]
    fn test_sequence_and_conditional() {
        assert_eq!(parse("a, b, c").unwrap().kind(), NodeKind::SequenceExpression);
        assert_eq!(parse("a ? b : c ? d : e").unwrap().to_string(), "a ? b : c ? d : e");
        syntax_error("a ? b");
    }

    #[test]
    fn test_strict_mode_restrictions() {
        assert!(parse("010 + '\\07' + implements").is_ok());
        assert_eq!(strict_error("010"), "Octal literals are not allowed in strict mode.");
        assert_eq!(
            strict_error("09"),
            "Decimals with leading zeros are not allowed in strict mode."
        );
        assert_eq!(
            strict_error("'\\07'"),
            "Octal escape sequences are not allowed in strict mode."
        );
        assert_eq!(strict_error("let + 1"), "Unexpected strict mode reserved word");
        assert_eq!(strict_error("(yield) => 1"), "Unexpected strict mode reserved word");
        assert!(parse_with_options("a.static + { let: 1 }.let", &ParserOptions { strict: true }).is_ok());
    }

    #[test]
    fn test_spans_cover_whole_node() {
        let expr = parse("  foo.bar(1)  ").unwrap();
        assert_eq!(expr.loc().start.offset, 2);
        assert_eq!(expr.loc().end.offset, 12);
    }
}
