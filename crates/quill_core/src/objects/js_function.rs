//! Function values.
//!
//! A [`JsFunction`] is one of two flavours, discriminated by
//! [`FunctionKind`]:
//!
//! * **Native functions**: host-side Rust callbacks ([`NativeFn`]) that the
//!   embedding places in the scope.
//!
//! * **Arrow closures**: produced by evaluating an arrow expression.  A
//!   [`Closure`] shares the parameter list and body with the AST node and
//!   captures the defining [`Scope`] by reference.

use std::fmt;
use std::rc::Rc;

use tracing::trace;

use crate::error::QuillResult;
use crate::interpreter;
use crate::parser::ast::{Expr, Pat};
use crate::objects::scope::Scope;
use crate::objects::value::Value;

// ──────────────────────────────────────────────────────────────────────────────
// NativeFn
// ──────────────────────────────────────────────────────────────────────────────

/// A host-side (Rust) callback implementing a function.
///
/// The callback receives the `this` value and the positional arguments, and
/// reports failures with [`QuillError::type_error`][crate::QuillError::type_error].
pub type NativeFn = Rc<dyn Fn(&Value, &[Value]) -> QuillResult<Value>>;

// ──────────────────────────────────────────────────────────────────────────────
// Closure
// ──────────────────────────────────────────────────────────────────────────────

/// The captured state of an arrow function.
#[derive(Clone)]
pub struct Closure {
    /// Formal parameters, shared with the arrow node.
    pub params: Rc<[Pat]>,
    /// Expression body, shared with the arrow node.
    pub body: Rc<Expr>,
    /// The scope the arrow was evaluated in.
    pub scope: Scope,
}

// ──────────────────────────────────────────────────────────────────────────────
// FunctionKind
// ──────────────────────────────────────────────────────────────────────────────

/// Discriminates the flavours a [`JsFunction`] can take.
#[derive(Clone)]
pub enum FunctionKind {
    /// A built-in Rust callback.
    Native(NativeFn),
    /// An arrow function closure.
    Arrow(Closure),
}

// Implement Debug manually: closures don't implement Debug, and printing the
// captured scope could recurse into this function.
impl fmt::Debug for FunctionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native(_) => write!(f, "Native(<fn>)"),
            Self::Arrow(c) => write!(f, "Arrow({} params)", c.params.len()),
        }
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// JsFunction
// ──────────────────────────────────────────────────────────────────────────────

/// A callable value.
///
/// # Example: wrapping a native function
///
/// ```rust
/// use quill_core::objects::{JsFunction, Value};
///
/// let add = JsFunction::new_native("add", |_this, args| {
///     let a = args.first().map(Value::to_number).unwrap_or(0.0);
///     let b = args.get(1).map(Value::to_number).unwrap_or(0.0);
///     Ok(Value::Number(a + b))
/// });
/// assert_eq!(add.name(), "add");
/// let sum = add.call(&Value::Undefined, &[Value::from(1), Value::from(2)]).unwrap();
/// assert_eq!(sum, Value::Number(3.0));
/// ```
#[derive(Debug, Clone)]
pub struct JsFunction {
    /// Name used in error messages and the `name` property.
    name: String,
    /// The specific flavour of this function.
    kind: FunctionKind,
    /// Whether `new` may be applied.
    constructible: bool,
}

impl JsFunction {
    /// Creates a native (Rust callback) function.  Native functions are
    /// constructible; use [`JsFunction::with_constructible`] to opt out.
    pub fn new_native<F>(name: impl Into<String>, callback: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> QuillResult<Value> + 'static,
    {
        Self {
            name: name.into(),
            kind: FunctionKind::Native(Rc::new(callback)),
            constructible: true,
        }
    }

    /// Creates an arrow closure.  Arrow functions are never constructible.
    pub fn new_arrow(params: Rc<[Pat]>, body: Rc<Expr>, scope: Scope) -> Self {
        Self {
            name: String::new(),
            kind: FunctionKind::Arrow(Closure {
                params,
                body,
                scope,
            }),
            constructible: false,
        }
    }

    /// Sets whether `new` may be applied to this function.
    pub fn with_constructible(mut self, constructible: bool) -> Self {
        self.constructible = constructible;
        self
    }

    /// Renames the function.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    /// Returns the function's name (empty for anonymous arrows).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the kind of this function.
    pub fn kind(&self) -> &FunctionKind {
        &self.kind
    }

    /// Returns `true` if this is a native (Rust callback) function.
    pub fn is_native(&self) -> bool {
        matches!(self.kind, FunctionKind::Native(_))
    }

    /// Returns `true` if this is an arrow closure.
    pub fn is_arrow(&self) -> bool {
        matches!(self.kind, FunctionKind::Arrow(_))
    }

    /// Returns `true` if `new` may be applied.
    pub fn is_constructible(&self) -> bool {
        self.constructible
    }

    /// Number of parameters before the first default or rest parameter
    /// (the `length` property).  Native functions report `0`.
    pub fn param_count(&self) -> usize {
        match &self.kind {
            FunctionKind::Native(_) => 0,
            FunctionKind::Arrow(c) => c
                .params
                .iter()
                .take_while(|p| !matches!(p, Pat::Assign(_) | Pat::Rest(_)))
                .count(),
        }
    }

    /// Text produced when the function is converted to a string.
    pub fn source_text(&self) -> String {
        match &self.kind {
            FunctionKind::Native(_) => {
                format!("function {}() {{ [native code] }}", self.name)
            }
            FunctionKind::Arrow(c) => {
                let params: Vec<String> = c.params.iter().map(ToString::to_string).collect();
                format!("({}) => {}", params.join(", "), c.body)
            }
        }
    }

    // ── Call helpers ──────────────────────────────────────────────────────────

    /// Invokes the function.
    ///
    /// Arrow closures ignore `this`; they see the `this` of their defining
    /// scope.
    pub fn call(&self, this: &Value, args: &[Value]) -> QuillResult<Value> {
        match &self.kind {
            FunctionKind::Native(f) => f(this, args),
            FunctionKind::Arrow(closure) => {
                trace!(name = %self.name, argc = args.len(), "invoking arrow closure");
                interpreter::invoke_closure(closure, args)
            }
        }
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QuillError;

    fn identity() -> JsFunction {
        JsFunction::new_native("identity", |_this, args| {
            Ok(args.first().cloned().unwrap_or_default())
        })
    }

    #[test]
    fn test_native_function_metadata() {
        let f = identity();
        assert_eq!(f.name(), "identity");
        assert!(f.is_native());
        assert!(!f.is_arrow());
        assert!(f.is_constructible());
        assert_eq!(f.param_count(), 0);
    }

    #[test]
    fn test_native_call_passes_this_and_args() {
        let f = JsFunction::new_native("thisOf", |this, _| Ok(this.clone()));
        assert_eq!(
            f.call(&Value::from("me"), &[]).unwrap(),
            Value::from("me")
        );
        assert_eq!(
            identity().call(&Value::Undefined, &[Value::from(5)]).unwrap(),
            Value::from(5)
        );
    }

    #[test]
    fn test_native_error_propagates() {
        let f = JsFunction::new_native("fail", |_, _| Err(QuillError::type_error("nope")));
        let err = f.call(&Value::Undefined, &[]).unwrap_err();
        assert_eq!(err.message(), "nope");
    }

    #[test]
    fn test_with_constructible_and_name() {
        let f = identity().with_constructible(false).with_name("id");
        assert!(!f.is_constructible());
        assert_eq!(f.name(), "id");
    }

    #[test]
    fn test_native_source_text() {
        assert_eq!(identity().source_text(), "function identity() { [native code] }");
    }
}
