//! Runtime value representation.
//!
//! This module provides [`Value`], the enum that can hold any value an
//! expression evaluates to, together with type-checking predicates and the
//! abstract conversions the evaluator needs:
//! [`to_boolean`][Value::to_boolean], [`to_number`][Value::to_number],
//! [`to_js_string`][Value::to_js_string] and [`type_of`][Value::type_of].
//!
//! Compound values are shared by reference (`Rc<RefCell<…>>`), so a value
//! read out of a scope aliases the same array or object the scope holds.
//! An array may therefore contain itself; the recursive walks here (string
//! conversion, structural equality, `Debug`) stop at a value they are
//! already inside of.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use smallvec::SmallVec;

use crate::error::{QuillError, QuillResult};
use crate::objects::js_array::JsArray;
use crate::objects::js_function::JsFunction;
use crate::objects::js_object::JsObject;

/// Shared handle to a [`JsObject`].
pub type ObjectRef = Rc<RefCell<JsObject>>;
/// Shared handle to a [`JsArray`].
pub type ArrayRef = Rc<RefCell<JsArray>>;
/// Shared handle to a [`JsFunction`].
pub type FunctionRef = Rc<JsFunction>;

/// A regular-expression literal value.
///
/// The engine does not match regular expressions; the value only carries the
/// pattern source and flags for host functions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegExpValue {
    /// Text between the slashes.
    pub source: String,
    /// Validated flag letters.
    pub flags: String,
}

/// Any runtime value.
#[derive(Clone, Default)]
pub enum Value {
    /// `undefined`
    #[default]
    Undefined,
    /// `null`
    Null,
    /// `true` / `false`
    Bool(bool),
    /// An IEEE-754 double.
    Number(f64),
    /// A string.
    String(String),
    /// An array.
    Array(ArrayRef),
    /// An ordinary object.
    Object(ObjectRef),
    /// A host function or arrow closure.
    Function(FunctionRef),
    /// A regular-expression literal.
    RegExp(Rc<RegExpValue>),
}

// ──────────────────────────────────────────────────────────────────────────────
// Construction helpers
// ──────────────────────────────────────────────────────────────────────────────

impl Value {
    /// Wraps `object` in a fresh shared handle.
    pub fn object(object: JsObject) -> Self {
        Value::Object(Rc::new(RefCell::new(object)))
    }

    /// Wraps `elements` in a fresh array.
    pub fn array(elements: Vec<Value>) -> Self {
        Value::Array(Rc::new(RefCell::new(JsArray::from_vec(elements))))
    }

    /// Wraps `function` in a fresh shared handle.
    pub fn function(function: JsFunction) -> Self {
        Value::Function(Rc::new(function))
    }

    /// Creates a host function value.
    ///
    /// The callback receives the `this` value and the positional arguments.
    pub fn native<F>(name: impl Into<String>, callback: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> QuillResult<Value> + 'static,
    {
        Value::function(JsFunction::new_native(name, callback))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(elements: Vec<Value>) -> Self {
        Value::array(elements)
    }
}

impl From<JsObject> for Value {
    fn from(object: JsObject) -> Self {
        Value::object(object)
    }
}

impl From<JsFunction> for Value {
    fn from(function: JsFunction) -> Self {
        Value::function(function)
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Type-checking predicates
// ──────────────────────────────────────────────────────────────────────────────

impl Value {
    /// Returns `true` if this value is `undefined`.
    #[inline]
    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    /// Returns `true` if this value is `null`.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns `true` if this value is `null` or `undefined`.
    #[inline]
    pub fn is_nullish(&self) -> bool {
        matches!(self, Self::Null | Self::Undefined)
    }

    /// Returns `true` if this value is a number.
    #[inline]
    pub fn is_number(&self) -> bool {
        matches!(self, Self::Number(_))
    }

    /// Returns `true` if this value is a string.
    #[inline]
    pub fn is_string(&self) -> bool {
        matches!(self, Self::String(_))
    }

    /// Returns `true` for arrays, objects, functions and regular expressions.
    #[inline]
    pub fn is_object_like(&self) -> bool {
        matches!(
            self,
            Self::Array(_) | Self::Object(_) | Self::Function(_) | Self::RegExp(_)
        )
    }

    /// Returns `true` if this value can be called.
    #[inline]
    pub fn is_callable(&self) -> bool {
        matches!(self, Self::Function(_))
    }

    /// The function handle, if this value is a function.
    pub fn as_function(&self) -> Option<&FunctionRef> {
        match self {
            Self::Function(f) => Some(f),
            _ => None,
        }
    }

    /// The numeric payload, if this value is a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The string payload, if this value is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Calls this value as a function with the given `this` and arguments.
    ///
    /// # Errors
    ///
    /// Returns a [`QuillError::TypeError`] when the value is not callable, or
    /// whatever error the function body raises.
    pub fn call(&self, this: &Value, args: &[Value]) -> QuillResult<Value> {
        match self {
            Self::Function(f) => f.call(this, args),
            other => Err(QuillError::type_error(format!(
                "{} is not a function",
                other.type_of()
            ))),
        }
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Abstract conversions
// ──────────────────────────────────────────────────────────────────────────────

impl Value {
    /// **ToBoolean**.
    ///
    /// | Value type | Result |
    /// |---|---|
    /// | `Undefined` / `Null` | `false` |
    /// | `Bool` | the boolean itself |
    /// | `Number` | `false` if `+0`, `-0` or `NaN` |
    /// | `String` | `false` if empty |
    /// | compound | `true` |
    pub fn to_boolean(&self) -> bool {
        match self {
            Self::Undefined | Self::Null => false,
            Self::Bool(b) => *b,
            Self::Number(n) => !n.is_nan() && *n != 0.0,
            Self::String(s) => !s.is_empty(),
            Self::Array(_) | Self::Object(_) | Self::Function(_) | Self::RegExp(_) => true,
        }
    }

    /// **ToNumber**.  Compound values go through their string form first, so
    /// `[5]` is `5` and `{}` is `NaN`.
    pub fn to_number(&self) -> f64 {
        match self {
            Self::Undefined => f64::NAN,
            Self::Null => 0.0,
            Self::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Self::Number(n) => *n,
            Self::String(s) => string_to_number(s),
            compound => string_to_number(&compound.to_js_string()),
        }
    }

    /// **ToString**.
    ///
    /// Named `to_js_string` to avoid ambiguity with [`ToString::to_string`].
    /// Arrays join their elements with `,` (holes and nullish elements become
    /// empty strings); objects render as `[object Object]`.
    pub fn to_js_string(&self) -> String {
        match self {
            Self::Undefined => "undefined".to_string(),
            Self::Null => "null".to_string(),
            Self::Bool(b) => (if *b { "true" } else { "false" }).to_string(),
            Self::Number(n) => number_to_string(*n),
            Self::String(s) => s.clone(),
            // A cyclic reference joins as the empty string.
            Self::Array(a) => visiting(Visit::Join(address(a)), || {
                let a = a.borrow();
                let parts: Vec<String> = a
                    .iter()
                    .map(|v| {
                        if v.is_nullish() {
                            String::new()
                        } else {
                            v.to_js_string()
                        }
                    })
                    .collect();
                parts.join(",")
            })
            .unwrap_or_default(),
            Self::Object(_) => "[object Object]".to_string(),
            Self::Function(f) => f.source_text(),
            Self::RegExp(r) => format!("/{}/{}", r.source, r.flags),
        }
    }

    /// **ToPrimitive** with the default hint: primitives are returned as-is,
    /// compound values become their string form.
    pub fn to_primitive(&self) -> Value {
        if self.is_object_like() {
            Value::String(self.to_js_string())
        } else {
            self.clone()
        }
    }

    /// The result of the `typeof` operator.
    pub fn type_of(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Null | Self::Array(_) | Self::Object(_) | Self::RegExp(_) => "object",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Function(_) => "function",
        }
    }
}

/// Structural equality: deep for arrays and objects, identity for functions,
/// IEEE equality for numbers (`NaN != NaN`).  A pair of compound values met
/// again while already being compared is taken as equal.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Undefined, Self::Undefined) | (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => {
                Rc::ptr_eq(a, b)
                    || visiting(Visit::Eq(address(a), address(b)), || {
                        *a.borrow() == *b.borrow()
                    })
                    .unwrap_or(true)
            }
            (Self::Object(a), Self::Object(b)) => {
                Rc::ptr_eq(a, b)
                    || visiting(Visit::Eq(address(a), address(b)), || {
                        *a.borrow() == *b.borrow()
                    })
                    .unwrap_or(true)
            }
            (Self::Function(a), Self::Function(b)) => Rc::ptr_eq(a, b),
            (Self::RegExp(a), Self::RegExp(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => f.write_str("Undefined"),
            Self::Null => f.write_str("Null"),
            Self::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Self::Number(n) => f.debug_tuple("Number").field(n).finish(),
            Self::String(s) => f.debug_tuple("String").field(s).finish(),
            Self::Array(a) => visiting(Visit::Debug(address(a)), || {
                f.debug_tuple("Array").field(&a.borrow().to_vec()).finish()
            })
            .unwrap_or_else(|| f.write_str("Array(<circular>)")),
            Self::Object(o) => visiting(Visit::Debug(address(o)), || {
                f.debug_tuple("Object").field(&*o.borrow()).finish()
            })
            .unwrap_or_else(|| f.write_str("Object(<circular>)")),
            Self::Function(func) => f.debug_tuple("Function").field(func).finish(),
            Self::RegExp(r) => f.debug_tuple("RegExp").field(r).finish(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_js_string())
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Cycle detection
// ──────────────────────────────────────────────────────────────────────────────

/// A recursive walk currently inside a compound value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    Join(usize),
    Eq(usize, usize),
    Debug(usize),
}

thread_local! {
    static VISITING: RefCell<SmallVec<[Visit; 8]>> = RefCell::new(SmallVec::new());
}

fn address<T>(rc: &Rc<T>) -> usize {
    Rc::as_ptr(rc) as *const () as usize
}

/// Pops the entry pushed by [`visiting`], also when `f` unwinds.
struct VisitGuard;

impl Drop for VisitGuard {
    fn drop(&mut self) {
        VISITING.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

/// Runs `f` with `visit` on the walk stack.  Returns `None` without running
/// `f` when the same visit is already in progress further up.
fn visiting<T>(visit: Visit, f: impl FnOnce() -> T) -> Option<T> {
    let entered = VISITING.with(|stack| {
        let mut stack = stack.borrow_mut();
        if stack.contains(&visit) {
            false
        } else {
            stack.push(visit);
            true
        }
    });
    if !entered {
        return None;
    }
    let _guard = VisitGuard;
    Some(f())
}

// ──────────────────────────────────────────────────────────────────────────────
// Helpers
// ──────────────────────────────────────────────────────────────────────────────

/// Formats an `f64` as a JavaScript number string (**Number::toString**).
///
/// Uses the shortest round-tripping digit string, then applies the
/// ECMAScript layout rules: plain integers up to 21 digits, fixed notation
/// down to `1e-7`, exponent notation (`1e+21`, `1.5e-7`) otherwise.
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n == 0.0 {
        // Both +0.0 and -0.0 produce "0".
        return "0".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n < 0.0 {
        return format!("-{}", number_to_string(-n));
    }

    // `{:e}` yields the shortest digits, e.g. "1.2345e6".
    let sci = format!("{n:e}");
    let (mantissa, exponent) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let k = digits.len() as i32;
    let point = exponent + 1;

    if k <= point && point <= 21 {
        let mut out = digits;
        out.extend(std::iter::repeat_n('0', (point - k) as usize));
        out
    } else if 0 < point && point <= 21 {
        let (int, frac) = digits.split_at(point as usize);
        format!("{int}.{frac}")
    } else if -6 < point && point <= 0 {
        format!("0.{}{digits}", "0".repeat((-point) as usize))
    } else {
        let e = point - 1;
        let sign = if e >= 0 { '+' } else { '-' };
        let (first, rest) = digits.split_at(1);
        if rest.is_empty() {
            format!("{first}e{sign}{}", e.abs())
        } else {
            format!("{first}.{rest}e{sign}{}", e.abs())
        }
    }
}

/// **StringToNumber**: whitespace-trimmed decimal, `0x`/`0o`/`0b` integers,
/// `Infinity`; everything else is `NaN`.  The empty string is `0`.
pub fn string_to_number(s: &str) -> f64 {
    let trimmed = s.trim_matches(|c: char| c.is_whitespace() || c == '\u{FEFF}');
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    let radix = match trimmed.get(..2) {
        Some("0x") | Some("0X") => Some(16),
        Some("0o") | Some("0O") => Some(8),
        Some("0b") | Some("0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        let body = &trimmed[2..];
        if body.is_empty() || !body.chars().all(|c| c.is_digit(radix)) {
            return f64::NAN;
        }
        return body
            .chars()
            .filter_map(|c| c.to_digit(radix))
            .fold(0.0, |acc, d| acc * f64::from(radix) + f64::from(d));
    }
    // `f64::from_str` also accepts "inf" and "NaN"; restrict to the
    // characters a decimal literal can contain.
    if !trimmed
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
    {
        return f64::NAN;
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

// ──────────────────────────────────────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────────────────────────────────────
