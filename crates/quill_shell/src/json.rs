//! Conversion between JSON documents and Quill values.

use std::rc::Rc;

use anyhow::{Result, bail};
use quill_core::{JsObject, Scope, Value};
use serde_json::Value as Json;

/// Converts a JSON value into a Quill value.
pub fn to_value(json: &Json) -> Value {
    match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
        Json::String(s) => Value::String(s.clone()),
        Json::Array(items) => Value::array(items.iter().map(to_value).collect()),
        Json::Object(map) => Value::object(
            map.iter()
                .map(|(k, v)| (k.as_str(), to_value(v)))
                .collect(),
        ),
    }
}

/// Builds a root scope from a JSON object.  A `"this"` member becomes the
/// scope's `this` value.
pub fn scope_from_str(text: &str) -> Result<Scope> {
    let json: Json = serde_json::from_str(text)?;
    let Json::Object(map) = &json else {
        bail!("scope must be a JSON object, got {json}");
    };
    let vars: JsObject = map.iter().map(|(k, v)| (k.as_str(), to_value(v))).collect();
    Ok(Scope::from(vars))
}

/// Renders a value for display: strings are quoted, everything else prints
/// as its string conversion, arrays and objects as JSON-like literals.  A
/// value nested inside itself prints as `[Circular]`.
pub fn render(value: &Value) -> String {
    render_nested(value, &mut Vec::new())
}

fn render_nested(value: &Value, open: &mut Vec<*const ()>) -> String {
    let address = match value {
        Value::Array(a) => Rc::as_ptr(a) as *const (),
        Value::Object(o) => Rc::as_ptr(o) as *const (),
        _ => std::ptr::null(),
    };
    if !address.is_null() && open.contains(&address) {
        return "[Circular]".to_string();
    }
    match value {
        Value::String(s) => Json::String(s.clone()).to_string(),
        Value::Array(a) => {
            open.push(address);
            let items: Vec<String> = a.borrow().iter().map(|v| render_nested(&v, open)).collect();
            open.pop();
            format!("[{}]", items.join(", "))
        }
        Value::Object(o) => {
            let o = o.borrow();
            if o.is_empty() {
                return "{}".to_string();
            }
            open.push(address);
            let entries: Vec<String> = o
                .entries()
                .map(|(k, v)| format!("{}: {}", Json::String(k.to_string()), render_nested(v, open)))
                .collect();
            open.pop();
            format!("{{ {} }}", entries.join(", "))
        }
        Value::Function(f) if f.name().is_empty() => "[Function (anonymous)]".to_string(),
        Value::Function(f) => format!("[Function: {}]", f.name()),
        other => other.to_js_string(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_from_json() {
        let scope = scope_from_str(r#"{"a": 1, "b": [true, null], "c": {"d": "x"}}"#).unwrap();
        assert_eq!(scope.get("a"), Value::from(1));
        assert_eq!(scope.get("b"), Value::array(vec![Value::Bool(true), Value::Null]));
        let expr = quill_core::parse("c.d + b.length").unwrap();
        assert_eq!(expr.evaluate(&scope, false).unwrap(), Value::from("x2"));
    }

    #[test]
    fn test_this_member_binds_this() {
        let scope = scope_from_str(r#"{"this": null}"#).unwrap();
        let expr = quill_core::parse("this?.id").unwrap();
        assert_eq!(expr.evaluate(&scope, false).unwrap(), Value::Undefined);
    }

    #[test]
    fn test_non_object_scope_is_rejected() {
        assert!(scope_from_str("[1, 2]").is_err());
        assert!(scope_from_str("{").is_err());
    }

    #[test]
    fn test_render() {
        let value = to_value(&serde_json::json!({"a": [1, "two"], "b": {}}));
        assert_eq!(render(&value), r#"{ "a": [1, "two"], "b": {} }"#);
        assert_eq!(render(&Value::Undefined), "undefined");
        assert_eq!(render(&Value::native("f", |_, _| Ok(Value::Undefined))), "[Function: f]");
    }

    #[test]
    fn test_render_marks_cycles() {
        let scope = Scope::new();
        let value = quill_core::parse("a = [1], o = { a }, a[1] = o, a")
            .unwrap()
            .evaluate(&scope, false)
            .unwrap();
        assert_eq!(render(&value), r#"[1, { "a": [Circular] }]"#);
        // The same array twice without nesting is not a cycle.
        let twice = quill_core::parse("[o, o]").unwrap().evaluate(&scope, false).unwrap();
        assert_eq!(
            render(&twice),
            r#"[{ "a": [1, [Circular]] }, { "a": [1, [Circular]] }]"#
        );
    }
}
