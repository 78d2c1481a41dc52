//! `quill_core`: lexer, parser, AST and tree-walking evaluator for Quill, a
//! JavaScript expression language embedded by data-binding layers.
//!
//! # Crate layout
//!
//! - [`parser`]: scanner, parser, AST, pattern reinterpretation and printer.
//! - [`interpreter`]: evaluation, operators and destructuring.
//! - [`objects`]: runtime values, objects, functions and scopes.
//! - [`factory`]: validated programmatic construction of expressions.
//! - [`error`]: the error type shared by every stage.
//!
//! # Example
//!
//! ```rust
//! use quill_core::{parse, Scope, Value};
//!
//! let scope = Scope::new();
//! scope.define("name", Value::from("World"));
//! let expr = parse("`Hello ${name}!`").unwrap();
//! assert_eq!(expr.evaluate(&scope, false).unwrap(), Value::from("Hello World!"));
//! ```

/// Errors raised while scanning, parsing and evaluating.
pub mod error;
/// Validated expression construction.
pub mod factory;
/// Tree-walking evaluation.
pub mod interpreter;
/// Runtime value representation.
pub mod objects;
/// Scanner, parser, AST and printer.
pub mod parser;

pub use error::{QuillError, QuillResult};
pub use interpreter::bind_pattern;
pub use objects::{JsArray, JsFunction, JsObject, Scope, Value};
pub use parser::ast::{Expr, NodeKind, Pat};
pub use parser::{ParserOptions, parse, parse_with_options};
