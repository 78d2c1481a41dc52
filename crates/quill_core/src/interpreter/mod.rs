//! Tree-walking evaluation.
//!
//! - [`eval`]: [`Expr::evaluate`](crate::parser::ast::Expr::evaluate) and
//!   arrow closure invocation.
//! - [`ops`]: operators, abstract conversions and property access on
//!   [`Value`](crate::objects::Value)s.
//! - [`binder`]: destructuring of values against patterns.

/// Pattern binding.
pub mod binder;
/// Expression evaluation.
pub mod eval;
/// Operators, comparisons and property access.
pub mod ops;

pub use binder::bind_pattern;
pub(crate) use eval::invoke_closure;
