//! Operator semantics and property access.
//!
//! Everything here works on already-evaluated [`Value`]s.  Functions that can
//! fail return errors without a source position; the evaluator anchors them
//! to the node being evaluated.

use std::cmp::Ordering;
use std::rc::Rc;

use crate::error::{QuillError, QuillResult};
use crate::objects::value::{number_to_string, string_to_number};
use crate::objects::{JsObject, Value};
use crate::parser::ast::BinaryOp;

// ─────────────────────────────────────────────────────────────────────────────
// Integer conversions
// ─────────────────────────────────────────────────────────────────────────────

const TWO_32: f64 = 4_294_967_296.0;
const TWO_31: f64 = 2_147_483_648.0;

/// **ToUint32**: modulo-2³² wrap of the truncated number; non-finite values
/// become `0`.
pub fn to_uint32(n: f64) -> u32 {
    if !n.is_finite() {
        return 0;
    }
    n.trunc().rem_euclid(TWO_32) as u32
}

/// **ToInt32**: like [`to_uint32`] but reinterpreted as signed.
pub fn to_int32(n: f64) -> i32 {
    if !n.is_finite() {
        return 0;
    }
    let m = n.trunc().rem_euclid(TWO_32);
    if m >= TWO_31 {
        (m - TWO_32) as i32
    } else {
        m as i32
    }
}

/// `base ** exponent` with the cases where JavaScript and IEEE `pow`
/// disagree: a `NaN` exponent and `(±1) ** ±Infinity` are both `NaN`.
pub fn exponentiate(base: f64, exponent: f64) -> f64 {
    if exponent.is_nan() || (base.abs() == 1.0 && exponent.is_infinite()) {
        return f64::NAN;
    }
    base.powf(exponent)
}

// ─────────────────────────────────────────────────────────────────────────────
// Equality and comparison
// ─────────────────────────────────────────────────────────────────────────────

/// `===`.  Compound values compare by identity; `NaN` is unequal to itself
/// and `+0 === -0`.
pub fn strict_equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Array(x), Value::Array(y)) => Rc::ptr_eq(x, y),
        (Value::Object(x), Value::Object(y)) => Rc::ptr_eq(x, y),
        (Value::Function(x), Value::Function(y)) => Rc::ptr_eq(x, y),
        (Value::RegExp(x), Value::RegExp(y)) => Rc::ptr_eq(x, y),
        _ => false,
    }
}

/// `==` (abstract equality).
pub fn loose_equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (x, y) if x.is_nullish() || y.is_nullish() => x.is_nullish() && y.is_nullish(),
        (Value::Number(x), Value::String(y)) => *x == string_to_number(y),
        (Value::String(x), Value::Number(y)) => string_to_number(x) == *y,
        (Value::Bool(x), y) => loose_equals(&Value::Number(f64::from(u8::from(*x))), y),
        (x, Value::Bool(y)) => loose_equals(x, &Value::Number(f64::from(u8::from(*y)))),
        (x, y) if x.is_object_like() && !y.is_object_like() => {
            loose_equals(&x.to_primitive(), y)
        }
        (x, y) if !x.is_object_like() && y.is_object_like() => {
            loose_equals(x, &y.to_primitive())
        }
        (x, y) => strict_equals(x, y),
    }
}

/// Abstract relational comparison.  Two strings compare by UTF-16 code
/// units; anything else compares numerically, and `None` means one side was
/// `NaN`.
pub fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    let (a, b) = (a.to_primitive(), b.to_primitive());
    if let (Value::String(x), Value::String(y)) = (&a, &b) {
        return Some(x.encode_utf16().cmp(y.encode_utf16()));
    }
    a.to_number().partial_cmp(&b.to_number())
}

/// `+`: string concatenation when either primitive side is a string,
/// numeric addition otherwise.
pub fn add(a: &Value, b: &Value) -> Value {
    let (a, b) = (a.to_primitive(), b.to_primitive());
    if a.is_string() || b.is_string() {
        let mut s = a.to_js_string();
        s.push_str(&b.to_js_string());
        Value::String(s)
    } else {
        Value::Number(a.to_number() + b.to_number())
    }
}

/// Applies a binary operator to two evaluated operands.
pub fn binary(op: BinaryOp, left: &Value, right: &Value) -> QuillResult<Value> {
    let num = |f: fn(f64, f64) -> f64| Value::Number(f(left.to_number(), right.to_number()));
    let int = |f: fn(i32, i32) -> i32| {
        Value::Number(f64::from(f(
            to_int32(left.to_number()),
            to_int32(right.to_number()),
        )))
    };
    let shift = to_uint32(right.to_number()) & 31;
    Ok(match op {
        BinaryOp::Add => add(left, right),
        BinaryOp::Sub => num(|a, b| a - b),
        BinaryOp::Mul => num(|a, b| a * b),
        BinaryOp::Div => num(|a, b| a / b),
        BinaryOp::Rem => num(|a, b| a % b),
        BinaryOp::Exp => num(exponentiate),
        BinaryOp::BitAnd => int(|a, b| a & b),
        BinaryOp::BitOr => int(|a, b| a | b),
        BinaryOp::BitXor => int(|a, b| a ^ b),
        BinaryOp::Shl => Value::Number(f64::from(
            to_int32(left.to_number()).wrapping_shl(shift),
        )),
        BinaryOp::Shr => Value::Number(f64::from(
            to_int32(left.to_number()).wrapping_shr(shift),
        )),
        BinaryOp::UShr => Value::Number(f64::from(
            to_uint32(left.to_number()).wrapping_shr(shift),
        )),
        BinaryOp::Eq => Value::Bool(loose_equals(left, right)),
        BinaryOp::NotEq => Value::Bool(!loose_equals(left, right)),
        BinaryOp::StrictEq => Value::Bool(strict_equals(left, right)),
        BinaryOp::StrictNotEq => Value::Bool(!strict_equals(left, right)),
        BinaryOp::Lt => Value::Bool(compare(left, right) == Some(Ordering::Less)),
        BinaryOp::Gt => Value::Bool(compare(left, right) == Some(Ordering::Greater)),
        BinaryOp::LtEq => Value::Bool(matches!(
            compare(left, right),
            Some(Ordering::Less | Ordering::Equal)
        )),
        BinaryOp::GtEq => Value::Bool(matches!(
            compare(left, right),
            Some(Ordering::Greater | Ordering::Equal)
        )),
        BinaryOp::In => Value::Bool(has_property(right, &to_property_key(left))?),
        BinaryOp::Instanceof => Value::Bool(instance_of(left, right)?),
    })
}

/// `value instanceof constructor`: `true` when `value` is an object created
/// by `new constructor(…)`.
pub fn instance_of(value: &Value, constructor: &Value) -> QuillResult<bool> {
    let Value::Function(constructor) = constructor else {
        return Err(QuillError::type_error(
            "Right-hand side of 'instanceof' is not callable",
        ));
    };
    Ok(match value {
        Value::Object(o) => o
            .borrow()
            .constructor()
            .is_some_and(|c| Rc::ptr_eq(c, constructor)),
        _ => false,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Property access
// ─────────────────────────────────────────────────────────────────────────────

/// **ToPropertyKey**: the string a value is looked up under.
pub fn to_property_key(value: &Value) -> String {
    match value {
        Value::Number(n) => number_to_string(*n),
        other => other.to_js_string(),
    }
}

/// Parses a canonical array index (`"0"`, `"17"`, not `"01"` or `"-1"`).
pub fn array_index(key: &str) -> Option<usize> {
    if key.is_empty() || (key.len() > 1 && key.starts_with('0')) {
        return None;
    }
    if !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    key.parse::<u32>()
        .ok()
        .filter(|&i| i != u32::MAX)
        .map(|i| i as usize)
}

fn utf16_unit_at(s: &str, index: usize) -> Option<String> {
    s.encode_utf16()
        .nth(index)
        .map(|unit| String::from_utf16_lossy(&[unit]))
}

/// Reads `object[key]`.  Reading from `null` or `undefined` is a TypeError;
/// absent properties are `undefined`.
pub fn get_property(object: &Value, key: &str) -> QuillResult<Value> {
    Ok(match object {
        Value::Undefined | Value::Null => {
            return Err(QuillError::type_error(format!(
                "Cannot read properties of {} (reading '{key}')",
                object.to_js_string()
            )));
        }
        Value::String(s) => {
            if key == "length" {
                Value::Number(s.encode_utf16().count() as f64)
            } else {
                array_index(key)
                    .and_then(|i| utf16_unit_at(s, i))
                    .map(Value::String)
                    .unwrap_or_default()
            }
        }
        Value::Array(a) => {
            let a = a.borrow();
            if key == "length" {
                Value::Number(a.len() as f64)
            } else if let Some(i) = array_index(key) {
                a.get(i)
            } else {
                a.get_property(key).unwrap_or_default()
            }
        }
        Value::Object(o) => o.borrow().get_property(key),
        Value::Function(f) => match key {
            "name" => Value::from(f.name()),
            "length" => Value::Number(f.param_count() as f64),
            _ => Value::Undefined,
        },
        Value::RegExp(r) => match key {
            "source" => Value::from(r.source.as_str()),
            "flags" => Value::from(r.flags.as_str()),
            "global" => Value::Bool(r.flags.contains('g')),
            _ => Value::Undefined,
        },
        Value::Bool(_) | Value::Number(_) => Value::Undefined,
    })
}

/// Writes `object[key] = value`.  Writes to primitives other than `null` and
/// `undefined` are silently dropped.
pub fn set_property(object: &Value, key: &str, value: Value) -> QuillResult<()> {
    match object {
        Value::Undefined | Value::Null => Err(QuillError::type_error(format!(
            "Cannot set properties of {} (setting '{key}')",
            object.to_js_string()
        ))),
        // Converting `value` may read this very array, so it happens before
        // the mutable borrow.
        Value::Array(a) => {
            if key == "length" {
                let n = value.to_number();
                if n < 0.0 || n.fract() != 0.0 || n >= TWO_32 {
                    return Err(QuillError::range_error("Invalid array length"));
                }
                a.borrow_mut().set_len(n as usize)
            } else if let Some(i) = array_index(key) {
                a.borrow_mut().set(i, value)
            } else {
                a.borrow_mut().set_property(key, value);
                Ok(())
            }
        }
        Value::Object(o) => {
            o.borrow_mut().set_property(key, value);
            Ok(())
        }
        _ => Ok(()),
    }
}

/// `key in object`.  Primitives are a TypeError.
pub fn has_property(object: &Value, key: &str) -> QuillResult<bool> {
    Ok(match object {
        Value::Object(o) => o.borrow().has_own_property(key),
        Value::Array(a) => {
            let a = a.borrow();
            key == "length"
                || array_index(key).is_some_and(|i| a.has_index(i))
                || a.has_property(key)
        }
        Value::Function(_) => matches!(key, "name" | "length"),
        Value::RegExp(_) => matches!(key, "source" | "flags" | "global"),
        other => {
            return Err(QuillError::type_error(format!(
                "Cannot use 'in' operator to search for '{key}' in {}",
                other.to_js_string()
            )));
        }
    })
}

/// Values produced by iterating `value` (array elements or string code
/// points), as used by spread and array patterns.
pub fn iterate(value: &Value) -> QuillResult<Vec<Value>> {
    match value {
        Value::Array(a) => Ok(a.borrow().to_vec()),
        Value::String(s) => Ok(s.chars().map(|c| Value::String(c.to_string())).collect()),
        Value::Undefined | Value::Null => Err(QuillError::type_error(format!(
            "{} is not iterable",
            value.to_js_string()
        ))),
        other => Err(QuillError::type_error(format!(
            "{} is not iterable",
            other.type_of()
        ))),
    }
}

/// Own enumerable `(key, value)` pairs of `value`, as copied by object spread
/// and collected by object rest patterns.
pub fn own_entries(value: &Value) -> Vec<(String, Value)> {
    match value {
        Value::Object(o) => o
            .borrow()
            .entries()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect(),
        Value::Array(a) => a
            .borrow()
            .entries()
            .map(|(i, v)| (i.to_string(), v.clone()))
            .collect(),
        Value::String(s) => s
            .encode_utf16()
            .enumerate()
            .map(|(i, unit)| (i.to_string(), Value::String(String::from_utf16_lossy(&[unit]))))
            .collect(),
        _ => Vec::new(),
    }
}

/// Copies the own entries of `source` into `target` (object spread).
pub fn copy_data_properties(target: &mut JsObject, source: &Value) {
    for (key, value) in own_entries(source) {
        target.set_property(key, value);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::JsFunction;

    #[test]
    fn test_int32_conversions_wrap() {
        assert_eq!(to_int32(4_294_967_297.0), 1);
        assert_eq!(to_int32(2_147_483_648.0), -2_147_483_648);
        assert_eq!(to_int32(-1.5), -1);
        assert_eq!(to_int32(f64::NAN), 0);
        assert_eq!(to_uint32(-1.0), 4_294_967_295);
        assert_eq!(to_uint32(f64::INFINITY), 0);
    }

    #[test]
    fn test_exponent_nan_cases() {
        assert!(exponentiate(1.0, f64::INFINITY).is_nan());
        assert!(exponentiate(-1.0, f64::NEG_INFINITY).is_nan());
        assert!(exponentiate(2.0, f64::NAN).is_nan());
        assert_eq!(exponentiate(f64::NAN, 0.0), 1.0);
        assert_eq!(exponentiate(2.0, 10.0), 1024.0);
    }

    #[test]
    fn test_strict_equality() {
        assert!(strict_equals(&Value::from(0.0), &Value::from(-0.0)));
        assert!(!strict_equals(&Value::from(f64::NAN), &Value::from(f64::NAN)));
        assert!(!strict_equals(&Value::from(1), &Value::from("1")));
        let a = Value::array(vec![]);
        assert!(strict_equals(&a, &a.clone()));
        assert!(!strict_equals(&a, &Value::array(vec![])));
    }

    #[test]
    fn test_loose_equality() {
        assert!(loose_equals(&Value::Null, &Value::Undefined));
        assert!(!loose_equals(&Value::Null, &Value::from(0)));
        assert!(loose_equals(&Value::from("1"), &Value::from(1)));
        assert!(loose_equals(&Value::from(true), &Value::from(1)));
        assert!(loose_equals(&Value::from("0"), &Value::from(false)));
        assert!(loose_equals(&Value::array(vec![Value::from(5)]), &Value::from(5)));
        assert!(loose_equals(&Value::array(vec![]), &Value::from("")));
        assert!(!loose_equals(&Value::from(f64::NAN), &Value::from(f64::NAN)));
    }

    #[test]
    fn test_relational_comparison() {
        assert_eq!(compare(&Value::from("a"), &Value::from("b")), Some(Ordering::Less));
        assert_eq!(compare(&Value::from("10"), &Value::from("9")), Some(Ordering::Less));
        assert_eq!(compare(&Value::from("10"), &Value::from(9)), Some(Ordering::Greater));
        assert_eq!(compare(&Value::Undefined, &Value::from(1)), None);
        // U+FF61 sorts after a surrogate pair in UTF-16 order.
        assert_eq!(
            compare(&Value::from("\u{FF61}"), &Value::from("\u{1F600}")),
            Some(Ordering::Greater)
        );
    }

    #[test]
    fn test_add_concatenates_after_primitive_conversion() {
        assert_eq!(add(&Value::from(1), &Value::from(2)), Value::from(3));
        assert_eq!(add(&Value::from("a"), &Value::from(1)), Value::from("a1"));
        assert_eq!(
            add(&Value::array(vec![Value::from(1), Value::from(2)]), &Value::from(3)),
            Value::from("1,23")
        );
        assert_eq!(add(&Value::from(true), &Value::Null), Value::from(1));
    }

    #[test]
    fn test_shifts_and_bitwise() {
        let b = |op, l: f64, r: f64| binary(op, &Value::from(l), &Value::from(r)).unwrap();
        assert_eq!(b(BinaryOp::Shl, 1.0, 33.0), Value::from(2));
        assert_eq!(b(BinaryOp::Shr, -8.0, 1.0), Value::from(-4));
        assert_eq!(b(BinaryOp::UShr, -1.0, 28.0), Value::from(15));
        assert_eq!(b(BinaryOp::BitXor, 5.0, 3.0), Value::from(6));
        assert_eq!(b(BinaryOp::Rem, -7.0, 2.0), Value::from(-1));
    }

    #[test]
    fn test_in_requires_object() {
        let obj = Value::object([("a", Value::from(1))].into_iter().collect());
        assert_eq!(binary(BinaryOp::In, &Value::from("a"), &obj).unwrap(), Value::from(true));
        let err = binary(BinaryOp::In, &Value::from("a"), &Value::from("abc")).unwrap_err();
        assert_eq!(err.message(), "Cannot use 'in' operator to search for 'a' in abc");
        let arr = Value::array(vec![Value::Null]);
        assert!(has_property(&arr, "0").unwrap());
        assert!(!has_property(&arr, "1").unwrap());
    }

    #[test]
    fn test_instanceof_uses_constructor_identity() {
        let ctor = Rc::new(JsFunction::new_native("Point", |_, _| Ok(Value::Undefined)));
        let other = Value::native("Other", |_, _| Ok(Value::Undefined));
        let instance = Value::object(JsObject::with_constructor(Rc::clone(&ctor)));
        let ctor = Value::Function(ctor);
        assert!(instance_of(&instance, &ctor).unwrap());
        assert!(!instance_of(&instance, &other).unwrap());
        assert!(!instance_of(&Value::from(1), &ctor).unwrap());
        assert!(instance_of(&instance, &Value::from(1)).is_err());
    }

    #[test]
    fn test_property_reads() {
        let s = Value::from("h\u{E9}llo");
        assert_eq!(get_property(&s, "length").unwrap(), Value::from(5));
        assert_eq!(get_property(&s, "1").unwrap(), Value::from("\u{E9}"));
        assert_eq!(get_property(&s, "9").unwrap(), Value::Undefined);
        let arr = Value::array(vec![Value::from(1)]);
        assert_eq!(get_property(&arr, "length").unwrap(), Value::from(1));
        assert_eq!(get_property(&arr, "01").unwrap(), Value::Undefined);
        let err = get_property(&Value::Null, "x").unwrap_err();
        assert_eq!(err.message(), "Cannot read properties of null (reading 'x')");
    }

    #[test]
    fn test_array_writes_grow_and_truncate() {
        let arr = Value::array(vec![]);
        set_property(&arr, "2", Value::from(7)).unwrap();
        assert_eq!(get_property(&arr, "length").unwrap(), Value::from(3));
        set_property(&arr, "length", Value::from(1)).unwrap();
        assert_eq!(arr.to_js_string(), "");
        assert!(set_property(&arr, "length", Value::from(-1)).is_err());
        assert!(set_property(&Value::Undefined, "a", Value::Null).is_err());
    }

    #[test]
    fn test_array_writes_convert_before_borrowing() {
        let arr = Value::array(vec![Value::from(1)]);
        set_property(&arr, "length", arr.clone()).unwrap();
        assert_eq!(get_property(&arr, "length").unwrap(), Value::from(1));
        set_property(&arr, "0", arr.clone()).unwrap();
        assert_eq!(arr.to_js_string(), "");
    }

    #[test]
    fn test_huge_array_index_and_length() {
        let arr = Value::array(vec![]);
        set_property(&arr, "100000", Value::from(1)).unwrap();
        assert_eq!(get_property(&arr, "length").unwrap(), Value::from(100_001));
        assert!(has_property(&arr, "100000").unwrap());
        assert!(!has_property(&arr, "99999").unwrap());
        assert_eq!(own_entries(&arr).len(), 1);

        let err = set_property(&arr, "4294967294", Value::from(1)).unwrap_err();
        assert!(matches!(err, QuillError::RangeError { .. }));
        assert_eq!(err.message(), "Invalid array length");
        let err = set_property(&arr, "length", Value::from(4_000_000_000.0)).unwrap_err();
        assert!(matches!(err, QuillError::RangeError { .. }));
        assert_eq!(get_property(&arr, "length").unwrap(), Value::from(100_001));
        // Out-of-range keys that are not array indices stay named properties.
        set_property(&arr, "4294967295", Value::from(2)).unwrap();
        assert_eq!(get_property(&arr, "4294967295").unwrap(), Value::from(2));
    }

    #[test]
    fn test_iterate_arrays_and_strings() {
        assert_eq!(iterate(&Value::from("ab")).unwrap(), vec![Value::from("a"), Value::from("b")]);
        assert_eq!(iterate(&Value::from(1)).unwrap_err().message(), "number is not iterable");
        assert_eq!(iterate(&Value::Null).unwrap_err().message(), "null is not iterable");
    }
}
