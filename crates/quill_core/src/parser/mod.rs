//! Expression parser infrastructure.
//!
//! - [`scanner`]: lexer that converts raw source text into a stream of
//!   [`scanner::Token`]s.
//! - [`ast`]: expression and pattern node definitions.
//! - [`parser`]: recursive-descent parser producing an [`ast::Expr`].
//! - [`pattern`]: reinterpretation of expressions as destructuring
//!   patterns.
//! - [`printer`]: [`std::fmt::Display`] for nodes, producing re-parseable
//!   source.

use tracing::debug;

use crate::error::QuillResult;

/// Expression and pattern node types.
pub mod ast;
/// Recursive-descent expression parser.
#[allow(clippy::module_inception)]
pub mod parser;
/// Expression-to-pattern reinterpretation and bound-name analysis.
pub mod pattern;
/// Source printing for AST nodes.
pub mod printer;
/// Expression lexer.
pub mod scanner;

/// Options controlling how source text is parsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParserOptions {
    /// Reject legacy octal literals and escapes and the strict-mode reserved
    /// words (`let`, `static`, `yield`, …) used as identifiers.
    pub strict: bool,
}

/// Parses `source` as a single expression with default options.
///
/// # Example
///
/// ```rust
/// let expr = quill_core::parser::parse("a + b * 2").unwrap();
/// assert_eq!(expr.to_string(), "a + b * 2");
/// ```
pub fn parse(source: &str) -> QuillResult<ast::Expr> {
    parse_with_options(source, &ParserOptions::default())
}

/// Parses `source` as a single expression.
///
/// The whole input must be consumed; trailing tokens are a syntax error.
pub fn parse_with_options(source: &str, options: &ParserOptions) -> QuillResult<ast::Expr> {
    debug!(len = source.len(), strict = options.strict, "parsing expression");
    let result = parser::Parser::new(source, *options).and_then(|mut p| p.parse_program());
    if let Err(err) = &result {
        debug!(error = %err, "parse failed");
    }
    result
}
