//! Tokenizer for Quill source text.
//!
//! Quill has no statements, so the scanner knows the expression operators,
//! literals, templates and identifiers; every statement keyword collapses to
//! [`TokenKind::ReservedWord`].  Regular expressions are only scanned on the
//! parser's request, see [`Scanner::rescan_regexp`].

use smallvec::SmallVec;

use crate::error::{QuillError, QuillResult};

// ─────────────────────────────────────────────────────────────────────────────
// Position / Span
// ─────────────────────────────────────────────────────────────────────────────

/// Where a character sits in the expression source.
///
/// `Position::default()` (all zeros) marks a location the engine could not
/// pin down, e.g. an error raised by a host callback.  Positions from the
/// scanner start at line 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    /// Byte index into the source.
    pub offset: usize,
    /// Line, counting from 1; `\r\n` counts once.
    pub line: u32,
    /// Column in characters, counting from 1.
    pub column: u32,
}

/// The source range a token or AST node covers; `end` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    /// Joins two spans: from the start of `self` to the end of `other`.
    pub fn to(self, other: Span) -> Span {
        Span {
            start: self.start,
            end: other.end,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// TokenKind
// ─────────────────────────────────────────────────────────────────────────────

/// What kind of token the scanner produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // ── Literals ──────────────────────────────────────────────────────────
    /// Any number form; the value is in [`TokenValue::Number`].
    NumericLiteral,
    /// Single- or double-quoted string.
    StringLiteral,
    /// A template without `${}` holes.
    NoSubstitutionTemplate,
    /// Template text up to the first `${`.
    TemplateHead,
    /// Template text between a `}` and the next `${`.
    TemplateMiddle,
    /// Template text after the last `}`.
    TemplateTail,
    /// `/pattern/flags`, from [`Scanner::rescan_regexp`] only.
    RegExpLiteral,

    // ── Identifiers ───────────────────────────────────────────────────────
    /// A variable or property name, including contextual words like `let`.
    Identifier,

    // ── Literal words ─────────────────────────────────────────────────────
    /// `true`
    True,
    /// `false`
    False,
    /// `null`
    Null,

    // ── Keywords ──────────────────────────────────────────────────────────
    /// `in`: property-membership operator.
    In,
    /// `instanceof`: constructor-identity operator.
    Instanceof,
    /// `new`: constructor call.
    New,
    /// `this`: the scope's receiver.
    This,
    /// `typeof`: unary type query, also valid on undeclared names.
    Typeof,
    /// `void`: evaluates its operand and yields `undefined`.
    Void,
    /// Any other reserved word (`if`, `function`, `class`, `delete`, ...).
    /// None of them can be an identifier, and the expression grammar has
    /// no place for them, so the parser reports them as unexpected.  The
    /// word itself is in [`Token::raw`].
    ReservedWord,

    // ── Punctuators ───────────────────────────────────────────────────────
    /// `{`
    LeftBrace,
    /// `}`
    RightBrace,
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `[`
    LeftBracket,
    /// `]`
    RightBracket,
    /// `.`
    Dot,
    /// `...`
    DotDotDot,
    /// `;`
    Semicolon,
    /// `,`
    Comma,
    /// `<`
    Less,
    /// `>`
    Greater,
    /// `<=`
    LessEqual,
    /// `>=`
    GreaterEqual,
    /// `==`
    EqualEqual,
    /// `!=`
    BangEqual,
    /// `===`
    EqualEqualEqual,
    /// `!==`
    BangEqualEqual,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `**`
    StarStar,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `++`
    PlusPlus,
    /// `--`
    MinusMinus,
    /// `<<`
    LessLess,
    /// `>>`
    GreaterGreater,
    /// `>>>`
    GreaterGreaterGreater,
    /// `&`
    Ampersand,
    /// `|`
    Pipe,
    /// `^`
    Caret,
    /// `!`
    Bang,
    /// `~`
    Tilde,
    /// `&&`
    AmpersandAmpersand,
    /// `||`
    PipePipe,
    /// `??`
    QuestionQuestion,
    /// `?`
    Question,
    /// `:`
    Colon,
    /// `=`
    Equal,
    /// `+=`
    PlusEqual,
    /// `-=`
    MinusEqual,
    /// `*=`
    StarEqual,
    /// `**=`
    StarStarEqual,
    /// `/=`
    SlashEqual,
    /// `%=`
    PercentEqual,
    /// `<<=`
    LessLessEqual,
    /// `>>=`
    GreaterGreaterEqual,
    /// `>>>=`
    GreaterGreaterGreaterEqual,
    /// `&=`
    AmpersandEqual,
    /// `|=`
    PipeEqual,
    /// `^=`
    CaretEqual,
    /// `&&=`
    AmpersandAmpersandEqual,
    /// `||=`
    PipePipeEqual,
    /// `??=`
    QuestionQuestionEqual,
    /// `=>`
    Arrow,
    /// `?.`
    QuestionDot,

    // ── End of file ───────────────────────────────────────────────────────
    /// End of input.
    Eof,
}

impl TokenKind {
    /// Returns `true` for words that can never be identifiers: `true`,
    /// `false`, `null`, the operator keywords and [`TokenKind::ReservedWord`].
    pub fn is_keyword(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            True | False | Null | In | Instanceof | New | This | Typeof | Void | ReservedWord
        )
    }

    /// Returns `true` for any of the four template-literal token kinds.
    pub fn is_template(self) -> bool {
        matches!(
            self,
            TokenKind::NoSubstitutionTemplate
                | TokenKind::TemplateHead
                | TokenKind::TemplateMiddle
                | TokenKind::TemplateTail
        )
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// TokenValue
// ─────────────────────────────────────────────────────────────────────────────

/// What a token means beyond its kind.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenValue {
    None,
    /// Name of an identifier or keyword with `\u` escapes resolved, or a
    /// string literal's contents.
    Str(String),
    Number(f64),
    /// Cooked and raw text of one template span, without delimiters.
    Template {
        /// Text with escapes interpreted.
        cooked: String,
        /// Source text with only line terminators normalized to `\n`.
        raw: String,
    },
    /// Body and flags of a regular-expression literal.
    RegExp {
        /// Text between the slashes.
        pattern: String,
        /// Flag letters after the closing slash.
        flags: String,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Token
// ─────────────────────────────────────────────────────────────────────────────

/// One token and everything the parser needs to know about it.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: TokenValue,
    /// Source text, escapes and all.
    pub raw: String,
    pub span: Span,
    /// Byte offset of the first character of the line the token starts on.
    pub line_start: usize,
    /// Set on `017`-style numbers and strings with `\07`-style escapes, which
    /// strict mode rejects.
    pub octal: bool,
    /// A line break separates this token from the previous one, so a `++`
    /// or `--` here cannot be postfix.
    pub had_line_terminator_before: bool,
}

impl Token {
    /// The token's string payload (identifier name, cooked string), if any.
    pub fn str_value(&self) -> Option<&str> {
        match &self.value {
            TokenValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns `true` when the token may name a property: after `.` or `?.`,
    /// and as an object-literal key, reserved words are allowed too.
    pub fn is_identifier_name(&self) -> bool {
        self.kind == TokenKind::Identifier || self.kind.is_keyword()
    }

    /// Returns `true` when the template span ends the template literal.
    pub fn is_template_tail(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::NoSubstitutionTemplate | TokenKind::TemplateTail
        )
    }

    /// The message used when this token appears where it is not allowed.
    pub fn unexpected_message(&self) -> String {
        match self.kind {
            TokenKind::Eof => "Unexpected end of input".to_string(),
            TokenKind::NumericLiteral => "Unexpected number".to_string(),
            TokenKind::StringLiteral => "Unexpected string".to_string(),
            TokenKind::Identifier => format!("Unexpected identifier '{}'", self.raw),
            k if k.is_template() => "Unexpected template string".to_string(),
            _ => format!("Unexpected token '{}'", self.raw),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Character-classification helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Returns `true` for *LineTerminator* code points.
pub(crate) fn is_line_terminator(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

/// Returns `true` for *WhiteSpace* **or** *LineTerminator* characters.
fn is_js_whitespace(c: char) -> bool {
    matches!(
        c,
        '\t'                      // CHARACTER TABULATION
        | '\x0B'                  // LINE TABULATION
        | '\x0C'                  // FORM FEED
        | ' '                     // SPACE
        | '\u{00A0}'              // NO-BREAK SPACE
        | '\u{FEFF}'              // ZERO WIDTH NO-BREAK SPACE (BOM)
        | '\u{1680}'              // OGHAM SPACE MARK
        | '\u{2000}'
            ..='\u{200A}' // EN QUAD … HAIR SPACE
        | '\u{202F}'              // NARROW NO-BREAK SPACE
        | '\u{205F}'              // MEDIUM MATHEMATICAL SPACE
        | '\u{3000}'              // IDEOGRAPHIC SPACE
        | '\n'
        | '\r'
        | '\u{2028}'
        | '\u{2029}'
    )
}

/// Returns `true` for characters that may *start* an identifier.
pub(crate) fn is_id_start(c: char) -> bool {
    c == '$' || c == '_' || c.is_alphabetic()
}

/// Returns `true` for characters that may *continue* an identifier.
pub(crate) fn is_id_continue(c: char) -> bool {
    c == '$' || c == '_' || c == '\u{200C}' || c == '\u{200D}' || c.is_alphanumeric()
}

/// Words that are reserved but never valid in an expression.
const STATEMENT_WORDS: [&str; 27] = [
    "break", "case", "catch", "class", "const", "continue", "debugger", "default", "delete", "do",
    "else", "enum", "export", "extends", "finally", "for", "function", "if", "import", "return",
    "super", "switch", "throw", "try", "var", "while", "with",
];

/// Classifies a word as a keyword kind, or `None` when it is an ordinary
/// identifier.  Contextual words (`let`, `of`, `async`, `yield`, ...) are
/// identifiers here; the parser handles them.
pub(crate) fn keyword_kind(s: &str) -> Option<TokenKind> {
    let kind = match s {
        "true" => TokenKind::True,
        "false" => TokenKind::False,
        "null" => TokenKind::Null,
        "in" => TokenKind::In,
        "instanceof" => TokenKind::Instanceof,
        "new" => TokenKind::New,
        "this" => TokenKind::This,
        "typeof" => TokenKind::Typeof,
        "void" => TokenKind::Void,
        _ if STATEMENT_WORDS.contains(&s) => TokenKind::ReservedWord,
        _ => return None,
    };
    Some(kind)
}

/// Map punctuator text to its [`TokenKind`].
fn punctuator_kind(s: &str) -> Option<TokenKind> {
    use TokenKind::*;
    let kind = match s {
        ">>>=" => GreaterGreaterGreaterEqual,
        "===" => EqualEqualEqual,
        "!==" => BangEqualEqual,
        "**=" => StarStarEqual,
        "<<=" => LessLessEqual,
        ">>=" => GreaterGreaterEqual,
        ">>>" => GreaterGreaterGreater,
        "..." => DotDotDot,
        "&&=" => AmpersandAmpersandEqual,
        "||=" => PipePipeEqual,
        "??=" => QuestionQuestionEqual,
        "=>" => Arrow,
        "==" => EqualEqual,
        "!=" => BangEqual,
        "<=" => LessEqual,
        ">=" => GreaterEqual,
        "&&" => AmpersandAmpersand,
        "||" => PipePipe,
        "??" => QuestionQuestion,
        "?." => QuestionDot,
        "++" => PlusPlus,
        "--" => MinusMinus,
        "+=" => PlusEqual,
        "-=" => MinusEqual,
        "*=" => StarEqual,
        "/=" => SlashEqual,
        "%=" => PercentEqual,
        "&=" => AmpersandEqual,
        "|=" => PipeEqual,
        "^=" => CaretEqual,
        "<<" => LessLess,
        ">>" => GreaterGreater,
        "**" => StarStar,
        "{" => LeftBrace,
        "}" => RightBrace,
        "(" => LeftParen,
        ")" => RightParen,
        "[" => LeftBracket,
        "]" => RightBracket,
        "." => Dot,
        ";" => Semicolon,
        "," => Comma,
        "<" => Less,
        ">" => Greater,
        "+" => Plus,
        "-" => Minus,
        "*" => Star,
        "/" => Slash,
        "%" => Percent,
        "&" => Ampersand,
        "|" => Pipe,
        "^" => Caret,
        "!" => Bang,
        "~" => Tilde,
        "?" => Question,
        ":" => Colon,
        "=" => Equal,
        _ => return None,
    };
    Some(kind)
}

/// Normalize `\r\n` and lone `\r` to `\n` (template raw strings).
fn normalize_line_endings(s: &str) -> String {
    if !s.contains('\r') {
        return s.to_string();
    }
    s.replace("\r\n", "\n").replace('\r', "\n")
}

// ─────────────────────────────────────────────────────────────────────────────
// Scanner
// ─────────────────────────────────────────────────────────────────────────────

/// What an open `{` on the brace stack belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Brace {
    /// An ordinary `{` (object literal).
    Block,
    /// The `${` of a template substitution.
    TemplateHole,
}

/// Pull-based tokenizer: the parser asks for one token at a time with
/// [`Scanner::next_token`]; after the last real token it keeps returning
/// [`TokenKind::Eof`].
///
/// `/` always comes back as division.  When the parser is at the start of
/// an operand it calls [`Scanner::rescan_regexp`] to reread it as a regex.
/// Clones share the source and are used for lookahead.
#[derive(Debug, Clone)]
pub struct Scanner<'src> {
    source: &'src str,
    /// Byte index of the next unread character.
    pos: usize,
    /// Line and column of `pos`, as reported in [`Position`].
    line: u32,
    column: u32,
    /// Byte offset where the current line begins.
    line_start: usize,
    /// Open braces.  A `}` resumes template text only when the top entry is a
    /// [`Brace::TemplateHole`] pushed by this scanner.
    braces: SmallVec<[Brace; 8]>,
}

impl<'src> Scanner<'src> {
    /// Starts scanning at the first character of `source`.
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            pos: 0,
            line: 1,
            column: 1,
            line_start: 0,
            braces: SmallVec::new(),
        }
    }

    /// The source text being scanned.
    pub fn source(&self) -> &'src str {
        self.source
    }

    /// Returns `true` once `pos` has reached the end of the source.
    pub fn is_eof(&self) -> bool {
        self.pos >= self.source.len()
    }

    // ── Low-level character helpers ─────────────────────────────────────────

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn peek2(&self) -> Option<char> {
        let mut it = self.source[self.pos..].chars();
        it.next();
        it.next()
    }

    /// Reads one character and moves the line/column counters.  `\r\n`
    /// is read as one line break and returned as `\r`.
    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        match ch {
            '\r' => {
                if self.source[self.pos..].starts_with('\n') {
                    self.pos += 1;
                }
                self.new_line();
            }
            '\n' | '\u{2028}' | '\u{2029}' => self.new_line(),
            _ => self.column += 1,
        }
        Some(ch)
    }

    fn new_line(&mut self) {
        self.line += 1;
        self.column = 1;
        self.line_start = self.pos;
    }

    fn current_pos(&self) -> Position {
        Position {
            offset: self.pos,
            line: self.line,
            column: self.column,
        }
    }

    fn error<T>(&self, message: impl Into<String>, pos: Position) -> QuillResult<T> {
        Err(QuillError::syntax(message, pos))
    }

    // ── Whitespace and comments ─────────────────────────────────────────────

    /// Skips whitespace and comments.  Returns `true` if a line break was
    /// among them, whether bare or inside a block comment.
    fn skip_trivia(&mut self) -> QuillResult<bool> {
        let mut had_lt = false;
        loop {
            match self.peek() {
                Some(c) if is_js_whitespace(c) => {
                    had_lt |= is_line_terminator(c);
                    self.advance();
                }
                Some('/') if self.peek2() == Some('/') => {
                    while let Some(c) = self.peek() {
                        if is_line_terminator(c) {
                            break;
                        }
                        self.advance();
                    }
                }
                Some('/') if self.peek2() == Some('*') => {
                    let start = self.current_pos();
                    self.advance();
                    self.advance();
                    loop {
                        match self.peek() {
                            None => return self.error("Unterminated block comment", start),
                            Some('*') if self.peek2() == Some('/') => {
                                self.advance();
                                self.advance();
                                break;
                            }
                            Some(c) => {
                                had_lt |= is_line_terminator(c);
                                self.advance();
                            }
                        }
                    }
                }
                _ => return Ok(had_lt),
            }
        }
    }

    // ── Digit-run helpers ───────────────────────────────────────────────────

    /// Consume a run of digits in `radix`, allowing single `_` separators
    /// between digits.  Returns the digits with separators removed (possibly
    /// empty).
    fn scan_digits(&mut self, radix: u32) -> QuillResult<String> {
        let mut digits = String::new();
        let mut last_was_separator = false;
        loop {
            match self.peek() {
                Some('_') => {
                    let pos = self.current_pos();
                    if digits.is_empty() {
                        return self.error("Numeric separators are not allowed here", pos);
                    }
                    if last_was_separator {
                        return self.error(
                            "Only one underscore is allowed as numeric separator",
                            pos,
                        );
                    }
                    last_was_separator = true;
                    self.advance();
                }
                Some(c) if c.is_digit(radix) => {
                    digits.push(c);
                    last_was_separator = false;
                    self.advance();
                }
                _ => break,
            }
        }
        if last_was_separator {
            return self.error(
                "Numeric separators are not allowed at the end of numeric literals",
                self.current_pos(),
            );
        }
        Ok(digits)
    }

    /// Scan `\u` escape bodies after the `u`: `XXXX` or `{X…}`.  Returns the
    /// code point value (which may be a surrogate).
    fn scan_unicode_escape_body(&mut self, esc_start: Position) -> QuillResult<u32> {
        if self.peek() == Some('{') {
            self.advance();
            let mut value: u32 = 0;
            let mut count = 0usize;
            while let Some(d) = self.peek().and_then(|c| c.to_digit(16)) {
                value = value.saturating_mul(16).saturating_add(d);
                count += 1;
                self.advance();
            }
            if count == 0 || self.peek() != Some('}') || value > 0x10FFFF {
                return self.error("Invalid Unicode escape sequence", esc_start);
            }
            self.advance();
            Ok(value)
        } else {
            let mut value: u32 = 0;
            for _ in 0..4 {
                match self.peek().and_then(|c| c.to_digit(16)) {
                    Some(d) => {
                        value = value * 16 + d;
                        self.advance();
                    }
                    None => return self.error("Invalid Unicode escape sequence", esc_start),
                }
            }
            Ok(value)
        }
    }

    /// Consume one escape sequence starting *after* the leading `\` and append
    /// its cooked value to `out`.  Returns `true` for legacy octal escapes.
    fn scan_escape(
        &mut self,
        out: &mut String,
        esc_start: Position,
        in_template: bool,
    ) -> QuillResult<bool> {
        let Some(c) = self.advance() else {
            return self.error("Invalid or unexpected token", esc_start);
        };
        match c {
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{C}'),
            'v' => out.push('\u{B}'),
            // Line continuation: `\` followed by a line terminator (CRLF was
            // folded by `advance`).
            '\r' | '\n' | '\u{2028}' | '\u{2029}' => {}
            'x' => {
                let hi = self.advance().and_then(|c| c.to_digit(16));
                let lo = self.advance().and_then(|c| c.to_digit(16));
                match (hi, lo) {
                    (Some(hi), Some(lo)) => out.push(char::from((hi * 16 + lo) as u8)),
                    _ => return self.error("Invalid hexadecimal escape sequence", esc_start),
                }
            }
            'u' => {
                let code = self.scan_unicode_escape_body(esc_start)?;
                if (0xD800..=0xDBFF).contains(&code)
                    && self.source[self.pos..].starts_with("\\u")
                {
                    // Possible surrogate pair: `\uD83D\uDE00`.
                    let mut lookahead = self.clone();
                    lookahead.advance();
                    lookahead.advance();
                    if let Ok(low) = lookahead.scan_unicode_escape_body(esc_start)
                        && (0xDC00..=0xDFFF).contains(&low)
                    {
                        *self = lookahead;
                        let combined = 0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00);
                        out.push(char::from_u32(combined).unwrap_or('\u{FFFD}'));
                        return Ok(false);
                    }
                }
                out.push(char::from_u32(code).unwrap_or('\u{FFFD}'));
            }
            '0' if !matches!(self.peek(), Some(d) if d.is_ascii_digit()) => out.push('\0'),
            '0'..='7' => {
                if in_template {
                    return self.error(
                        "Octal escape sequences are not allowed in template strings",
                        esc_start,
                    );
                }
                // Up to three digits when the first is 0-3, otherwise two.
                let mut value = c.to_digit(8).unwrap_or(0);
                let max_len = if value <= 3 { 3 } else { 2 };
                let mut len = 1;
                while len < max_len {
                    match self.peek().and_then(|d| d.to_digit(8)) {
                        Some(d) => {
                            value = value * 8 + d;
                            len += 1;
                            self.advance();
                        }
                        None => break,
                    }
                }
                out.push(char::from_u32(value).unwrap_or('\u{FFFD}'));
                return Ok(true);
            }
            '8' | '9' => {
                if in_template {
                    return self.error(
                        "\\8 and \\9 are not allowed in template strings",
                        esc_start,
                    );
                }
                out.push(c);
                return Ok(true);
            }
            other => out.push(other),
        }
        Ok(false)
    }

    // ── String literal ──────────────────────────────────────────────────────

    /// Scan a string literal; the opening quote has not been consumed yet.
    /// Returns `(cooked, octal)`.
    fn scan_string(&mut self, start: Position) -> QuillResult<(String, bool)> {
        let Some(quote) = self.advance() else {
            return self.error("Unterminated string literal", start);
        };
        let mut cooked = String::new();
        let mut octal = false;
        loop {
            match self.peek() {
                None | Some('\n') | Some('\r') => {
                    return self.error("Unterminated string literal", start);
                }
                Some(c) if c == quote => {
                    self.advance();
                    return Ok((cooked, octal));
                }
                Some('\\') => {
                    let esc_start = self.current_pos();
                    self.advance();
                    octal |= self.scan_escape(&mut cooked, esc_start, false)?;
                }
                Some(c) => {
                    cooked.push(c);
                    self.advance();
                }
            }
        }
    }

    // ── Template literal body ───────────────────────────────────────────────

    /// Reads template text up to the next `${` or closing backtick.  Called
    /// after the opening backtick and after the `}` ending each hole.  Returns `(cooked, raw, found_substitution)`;
    /// both texts exclude the delimiters.
    fn scan_template_span(&mut self, start: Position) -> QuillResult<(String, String, bool)> {
        let body_start = self.pos;
        let mut cooked = String::new();
        loop {
            match self.peek() {
                None => return self.error("Unterminated template literal", start),
                Some('`') => {
                    let raw = normalize_line_endings(&self.source[body_start..self.pos]);
                    self.advance();
                    return Ok((cooked, raw, false));
                }
                Some('$') if self.peek2() == Some('{') => {
                    let raw = normalize_line_endings(&self.source[body_start..self.pos]);
                    self.advance();
                    self.advance();
                    self.braces.push(Brace::TemplateHole);
                    return Ok((cooked, raw, true));
                }
                Some('\\') => {
                    let esc_start = self.current_pos();
                    self.advance();
                    self.scan_escape(&mut cooked, esc_start, true)?;
                }
                Some('\r') => {
                    cooked.push('\n');
                    self.advance();
                }
                Some(c) => {
                    cooked.push(c);
                    self.advance();
                }
            }
        }
    }

    // ── Regular-expression literal ──────────────────────────────────────────

    /// Re-scan starting at `slash` (a `/` or `/=` token just returned by
    /// [`Scanner::next_token`]) as a regular-expression literal.
    ///
    /// The parser calls this only when a `/` stands in primary-expression
    /// position, where it cannot be a division operator.
    pub fn rescan_regexp(&mut self, slash: &Token) -> QuillResult<Token> {
        let start = slash.span.start;
        self.pos = start.offset;
        self.line = start.line;
        self.column = start.column;
        self.line_start = slash.line_start;

        self.advance(); // opening '/'
        let body_start = self.pos;
        let mut in_class = false;
        loop {
            match self.peek() {
                None => return self.error("Invalid regular expression: missing /", start),
                Some(c) if is_line_terminator(c) => {
                    return self.error("Invalid regular expression: missing /", start);
                }
                Some('[') => {
                    in_class = true;
                    self.advance();
                }
                Some(']') => {
                    in_class = false;
                    self.advance();
                }
                Some('/') if !in_class => break,
                Some('\\') => {
                    self.advance();
                    match self.peek() {
                        Some(c) if !is_line_terminator(c) => {
                            self.advance();
                        }
                        _ => {
                            return self
                                .error("Invalid regular expression: missing /", start);
                        }
                    }
                }
                Some(_) => {
                    self.advance();
                }
            }
        }
        let pattern = self.source[body_start..self.pos].to_string();
        self.advance(); // closing '/'

        let flags_start = self.pos;
        while matches!(self.peek(), Some(c) if is_id_continue(c)) {
            self.advance();
        }
        let flags = self.source[flags_start..self.pos].to_string();

        Ok(Token {
            kind: TokenKind::RegExpLiteral,
            value: TokenValue::RegExp { pattern, flags },
            raw: self.source[start.offset..self.pos].to_string(),
            span: Span {
                start,
                end: self.current_pos(),
            },
            line_start: slash.line_start,
            octal: false,
            had_line_terminator_before: slash.had_line_terminator_before,
        })
    }

    // ── Numeric literal ─────────────────────────────────────────────────────

    /// Scan a numeric literal starting at the cursor.  Returns
    /// `(value, legacy_octal)`.
    fn scan_numeric(&mut self, start: Position) -> QuillResult<(f64, bool)> {
        let mut legacy = false;
        let value = if self.peek() == Some('0') {
            match self.peek2() {
                Some('x') | Some('X') => self.scan_radix_literal(16, start)?,
                Some('o') | Some('O') => self.scan_radix_literal(8, start)?,
                Some('b') | Some('B') => self.scan_radix_literal(2, start)?,
                Some('_') => {
                    self.advance();
                    return self.error(
                        "Numeric separator can not be used after leading 0",
                        self.current_pos(),
                    );
                }
                Some(c) if c.is_ascii_digit() => {
                    legacy = true;
                    self.scan_legacy_octal_or_decimal()?
                }
                _ => self.scan_decimal()?,
            }
        } else {
            self.scan_decimal()?
        };

        // `3in`, `1n`, `0b12`: a literal must not run into an identifier or
        // another digit.
        if matches!(self.peek(), Some(c) if is_id_start(c) || c.is_ascii_digit() || c == '\\') {
            return self.error("Invalid or unexpected token", start);
        }
        Ok((value, legacy))
    }

    /// `0x…`, `0o…`, `0b…`.
    fn scan_radix_literal(&mut self, radix: u32, start: Position) -> QuillResult<f64> {
        self.advance(); // 0
        self.advance(); // x / o / b
        let digits = self.scan_digits(radix)?;
        if digits.is_empty() {
            return self.error("Invalid or unexpected token", start);
        }
        Ok(digits
            .chars()
            .filter_map(|c| c.to_digit(radix))
            .fold(0.0, |acc, d| acc * f64::from(radix) + f64::from(d)))
    }

    /// `0` followed by digits: octal when every digit is 0-7, otherwise a
    /// decimal literal with a leading zero (`089`).
    fn scan_legacy_octal_or_decimal(&mut self) -> QuillResult<f64> {
        let source = self.source;
        let run: &str = {
            let rest = &source[self.pos..];
            let len = rest
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(rest.len());
            &rest[..len]
        };
        if run.chars().all(|c| matches!(c, '0'..='7')) {
            let value = run
                .chars()
                .filter_map(|c| c.to_digit(8))
                .fold(0.0, |acc, d| acc * 8.0 + f64::from(d));
            for _ in 0..run.len() {
                self.advance();
            }
            return Ok(value);
        }
        // Non-octal decimal: digits, then the usual fraction/exponent.
        let mut text: String = run.to_string();
        for _ in 0..run.len() {
            self.advance();
        }
        if self.peek() == Some('_') {
            return self.error("Numeric separators are not allowed here", self.current_pos());
        }
        self.scan_fraction_and_exponent(&mut text)?;
        Ok(text.parse::<f64>().unwrap_or(f64::NAN))
    }

    /// Decimal literal: `123`, `1_000.5e-3`, `.5`.
    fn scan_decimal(&mut self) -> QuillResult<f64> {
        let mut text = if self.peek() == Some('.') {
            String::from("0")
        } else {
            self.scan_digits(10)?
        };
        self.scan_fraction_and_exponent(&mut text)?;
        Ok(text.parse::<f64>().unwrap_or(f64::NAN))
    }

    fn scan_fraction_and_exponent(&mut self, text: &mut String) -> QuillResult<()> {
        if self.peek() == Some('.') {
            self.advance();
            text.push('.');
            text.push_str(&self.scan_digits(10)?);
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            let exp_start = self.current_pos();
            self.advance();
            text.push('e');
            if let Some(sign @ ('+' | '-')) = self.peek() {
                text.push(sign);
                self.advance();
            }
            let digits = self.scan_digits(10)?;
            if digits.is_empty() {
                return self.error("Invalid or unexpected token", exp_start);
            }
            text.push_str(&digits);
        }
        Ok(())
    }

    // ── Identifier / keyword ────────────────────────────────────────────────

    /// Scan an identifier or keyword.  Returns its kind and unescaped name.
    fn scan_identifier(&mut self, start: Position) -> QuillResult<(TokenKind, String)> {
        let mut name = String::new();
        let mut escaped = false;
        loop {
            match self.peek() {
                Some('\\') => {
                    let esc_start = self.current_pos();
                    self.advance();
                    if self.advance() != Some('u') {
                        return self.error("Invalid Unicode escape sequence", esc_start);
                    }
                    let code = self.scan_unicode_escape_body(esc_start)?;
                    let valid = char::from_u32(code).filter(|&ch| {
                        if name.is_empty() {
                            is_id_start(ch)
                        } else {
                            is_id_continue(ch)
                        }
                    });
                    match valid {
                        Some(ch) => name.push(ch),
                        None => return self.error("Invalid Unicode escape sequence", esc_start),
                    }
                    escaped = true;
                }
                Some(c) if (name.is_empty() && is_id_start(c)) || (!name.is_empty() && is_id_continue(c)) => {
                    name.push(c);
                    self.advance();
                }
                _ => break,
            }
        }
        match keyword_kind(&name) {
            Some(_) if escaped => {
                self.error("Keyword must not contain escaped characters", start)
            }
            Some(kind) => Ok((kind, name)),
            None => Ok((TokenKind::Identifier, name)),
        }
    }

    // ── Punctuators ─────────────────────────────────────────────────────────

    /// Longest match first: 4-, then 3-, 2- and 1-character operators.
    fn scan_punctuator(&mut self, start: Position) -> QuillResult<TokenKind> {
        let source = self.source;
        let rest = &source[self.pos..];
        for len in (1..=4).rev() {
            if rest.len() < len || !rest.is_char_boundary(len) {
                continue;
            }
            let Some(kind) = punctuator_kind(&rest[..len]) else {
                continue;
            };
            // `a?.5:0` is a conditional, not an optional chain.
            if kind == TokenKind::QuestionDot
                && rest[len..].starts_with(|c: char| c.is_ascii_digit())
            {
                continue;
            }
            for _ in 0..len {
                self.advance();
            }
            match kind {
                TokenKind::LeftBrace => self.braces.push(Brace::Block),
                TokenKind::RightBrace => {
                    self.braces.pop();
                }
                _ => {}
            }
            return Ok(kind);
        }
        let c = self.peek().unwrap_or('\0');
        self.error(format!("Invalid or unexpected token '{c}'"), start)
    }

    // ── Main public API ─────────────────────────────────────────────────────

    /// Skips whitespace and comments and reads one token; past the end of
    /// the source this is an [`TokenKind::Eof`] token, every time.
    pub fn next_token(&mut self) -> QuillResult<Token> {
        let had_lt = self.skip_trivia()?;
        let start = self.current_pos();
        let line_start = self.line_start;

        if self.is_eof() {
            return Ok(Token {
                kind: TokenKind::Eof,
                value: TokenValue::None,
                raw: String::new(),
                span: Span { start, end: start },
                line_start,
                octal: false,
                had_line_terminator_before: had_lt,
            });
        }

        let mut octal = false;
        let (kind, value) = match self.peek() {
            Some('"') | Some('\'') => {
                let (cooked, has_octal) = self.scan_string(start)?;
                octal = has_octal;
                (TokenKind::StringLiteral, TokenValue::Str(cooked))
            }
            Some('`') => {
                self.advance();
                let (cooked, raw, has_sub) = self.scan_template_span(start)?;
                let kind = if has_sub {
                    TokenKind::TemplateHead
                } else {
                    TokenKind::NoSubstitutionTemplate
                };
                (kind, TokenValue::Template { cooked, raw })
            }
            Some('}') if self.braces.last() == Some(&Brace::TemplateHole) => {
                self.braces.pop();
                self.advance();
                let (cooked, raw, has_sub) = self.scan_template_span(start)?;
                let kind = if has_sub {
                    TokenKind::TemplateMiddle
                } else {
                    TokenKind::TemplateTail
                };
                (kind, TokenValue::Template { cooked, raw })
            }
            Some(c) if c.is_ascii_digit() => {
                let (n, legacy) = self.scan_numeric(start)?;
                octal = legacy;
                (TokenKind::NumericLiteral, TokenValue::Number(n))
            }
            Some('.') if matches!(self.peek2(), Some(d) if d.is_ascii_digit()) => {
                let (n, _) = self.scan_numeric(start)?;
                (TokenKind::NumericLiteral, TokenValue::Number(n))
            }
            Some(c) if is_id_start(c) || c == '\\' => {
                let (kind, name) = self.scan_identifier(start)?;
                (kind, TokenValue::Str(name))
            }
            _ => (self.scan_punctuator(start)?, TokenValue::None),
        };

        if self.pos == start.offset {
            return self.error("Scanner failed to advance", start);
        }

        Ok(Token {
            kind,
            value,
            raw: self.source[start.offset..self.pos].to_string(),
            span: Span {
                start,
                end: self.current_pos(),
            },
            line_start,
            octal,
            had_line_terminator_before: had_lt,
        })
    }

    /// Every token in `source`, without the trailing [`TokenKind::Eof`].
    /// Used by `quill --tokens`.  `/` is always division here, since
    /// nothing asks for a regex rescan.
    ///
    /// # Errors
    ///
    /// The first [`QuillError::SyntaxError`] the scanner hits.
    pub fn tokenize_all(source: &'src str) -> QuillResult<Vec<Token>> {
        let mut scanner = Scanner::new(source);
        let mut tokens = Vec::new();
        loop {
            let tok = scanner.next_token()?;
            if tok.kind == TokenKind::Eof {
                break;
            }
            tokens.push(tok);
        }
        Ok(tokens)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
