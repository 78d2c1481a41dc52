//! Destructuring: binds a [`Pat`] against a value.
//!
//! The binder produces a flat name → value mapping rather than writing into
//! a scope; callers decide whether the names are defined (arrow parameters)
//! or assigned (destructuring assignment).

use smallvec::SmallVec;

use crate::error::{QuillError, QuillResult};
use crate::interpreter::eval::Interpreter;
use crate::interpreter::ops;
use crate::objects::value::number_to_string;
use crate::objects::{JsObject, Scope, Value};
use crate::parser::ast::{ArrayPat, Expr, ObjectPat, ObjectPatProp, Pat, PropKey};
use crate::parser::scanner::Position;

/// Binds `pattern` against `value` and returns the resulting bindings.
///
/// `seed` pre-populates the result.  Defaults and computed keys are
/// evaluated in a child of `scope` that already sees the bindings made
/// earlier in the same pattern.  An object rest element collects only the
/// keys that earlier properties of the same pattern did not consume.
///
/// # Errors
///
/// TypeError when destructuring `null`/`undefined` or array-destructuring a
/// non-iterable; any error raised while evaluating a default or computed
/// key.
pub fn bind_pattern(
    pattern: &Pat,
    value: Value,
    scope: &Scope,
    seed: Option<JsObject>,
    use_cache: bool,
) -> QuillResult<JsObject> {
    let mut binder = Binder {
        scope,
        use_cache,
        bindings: seed.unwrap_or_default(),
    };
    binder.bind(pattern, value)?;
    Ok(binder.bindings)
}

struct Binder<'s> {
    scope: &'s Scope,
    use_cache: bool,
    bindings: JsObject,
}

impl Binder<'_> {
    /// Evaluates `expr` where the bindings made so far are visible.
    fn eval(&self, expr: &Expr) -> QuillResult<Value> {
        let scope = self.scope.child_with(self.bindings.clone());
        Interpreter::new(&scope, self.use_cache).eval(expr)
    }

    fn bind(&mut self, pattern: &Pat, value: Value) -> QuillResult<()> {
        match pattern {
            Pat::Ident(id) => {
                self.bindings.set_property(id.name.as_str(), value);
                Ok(())
            }
            Pat::Assign(assign) => {
                let value = if value.is_undefined() {
                    self.eval(&assign.right)?
                } else {
                    value
                };
                self.bind(&assign.left, value)
            }
            Pat::Rest(rest) => self.bind(&rest.argument, value),
            Pat::Array(array) => self.bind_array(array, value),
            Pat::Object(object) => self.bind_object(object, value),
        }
    }

    fn bind_array(&mut self, pattern: &ArrayPat, value: Value) -> QuillResult<()> {
        let items = match &value {
            Value::Undefined | Value::Null => return Err(nullish(&value, pattern.loc.start)),
            other => ops::iterate(other).map_err(|e| e.anchored_at(pattern.loc.start))?,
        };
        for (i, element) in pattern.elements.iter().enumerate() {
            match element {
                None => {}
                Some(Pat::Rest(rest)) => {
                    let tail = items.get(i..).unwrap_or_default().to_vec();
                    self.bind(&rest.argument, Value::array(tail))?;
                }
                Some(element) => {
                    let item = items.get(i).cloned().unwrap_or_default();
                    self.bind(element, item)?;
                }
            }
        }
        Ok(())
    }

    fn bind_object(&mut self, pattern: &ObjectPat, value: Value) -> QuillResult<()> {
        if value.is_nullish() {
            return Err(nullish(&value, pattern.loc.start));
        }
        let mut consumed: SmallVec<[String; 8]> = SmallVec::new();
        for prop in &pattern.properties {
            match prop {
                ObjectPatProp::Prop(p) => {
                    let key = match &p.key {
                        PropKey::Ident(id) => id.name.clone(),
                        PropKey::Str(s) => s.value.clone(),
                        PropKey::Num(n) => number_to_string(n.value),
                        PropKey::Computed(e) => ops::to_property_key(&self.eval(e)?),
                    };
                    let item = ops::get_property(&value, &key)
                        .map_err(|e| e.anchored_at(p.loc.start))?;
                    consumed.push(key);
                    self.bind(&p.value, item)?;
                }
                ObjectPatProp::Rest(rest) => {
                    let remaining: JsObject = ops::own_entries(&value)
                        .into_iter()
                        .filter(|(k, _)| !consumed.contains(k))
                        .collect();
                    self.bind(&rest.argument, Value::object(remaining))?;
                }
            }
        }
        Ok(())
    }
}

fn nullish(value: &Value, pos: Position) -> QuillError {
    let text = value.to_js_string();
    QuillError::type_error_at(format!("Cannot destructure '{text}' as it is {text}."), pos)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ast::AssignTarget;
    use crate::parser::parse;

    /// Parses `<pattern> = 0` and returns the pattern.
    fn pattern(src: &str) -> Pat {
        match parse(&format!("{src} = 0")).unwrap() {
            Expr::Assign(a) => match a.left {
                AssignTarget::Pat(p) => p,
                AssignTarget::Expr(e) => panic!("not a pattern: {e}"),
            },
            other => panic!("not an assignment: {other}"),
        }
    }

    fn value(src: &str) -> Value {
        parse(src).unwrap().evaluate(&Scope::new(), false).unwrap()
    }

    fn bind(pat: &str, val: &str) -> QuillResult<JsObject> {
        bind_pattern(&pattern(pat), value(val), &Scope::new(), None, false)
    }

    #[test]
    fn test_array_pattern_with_rest() {
        let out = bind("[a, ...b]", "[1, 2, 3]").unwrap();
        assert_eq!(out.get_property("a"), Value::from(1));
        assert_eq!(out.get_property("b"), Value::array(vec![Value::from(2), Value::from(3)]));
    }

    #[test]
    fn test_object_pattern_with_default() {
        let out = bind("[{ a = 1, b }]", "[{ b: 2 }]").unwrap();
        assert_eq!(out.get_property("a"), Value::from(1));
        assert_eq!(out.get_property("b"), Value::from(2));
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_holes_and_missing_elements() {
        let out = bind("[, b, c]", "[1, 2]").unwrap();
        assert!(!out.has_own_property("a"));
        assert_eq!(out.get_property("b"), Value::from(2));
        assert!(out.has_own_property("c"));
        assert_eq!(out.get_property("c"), Value::Undefined);
    }

    #[test]
    fn test_object_rest_excludes_consumed_keys() {
        let out = bind("[{ a, ['b']: x, ...rest }]", "[{ a: 1, b: 2, c: 3, d: 4 }]").unwrap();
        assert_eq!(out.get_property("x"), Value::from(2));
        let expected: JsObject = [("c", Value::from(3)), ("d", Value::from(4))].into_iter().collect();
        assert_eq!(out.get_property("rest"), Value::object(expected));
    }

    #[test]
    fn test_defaults_see_earlier_bindings() {
        let out = bind("[a, b = a + 1, { [b]: c = b * 10 }]", "[1, undefined, {}]").unwrap();
        assert_eq!(out.get_property("b"), Value::from(2));
        assert_eq!(out.get_property("c"), Value::from(20));
    }

    #[test]
    fn test_null_default_is_not_replaced() {
        let out = bind("[a = 1]", "[null]").unwrap();
        assert_eq!(out.get_property("a"), Value::Null);
    }

    #[test]
    fn test_strings_destructure() {
        let out = bind("[first, ...others]", "'hey'").unwrap();
        assert_eq!(out.get_property("first"), Value::from("h"));
        assert_eq!(out.get_property("others"), Value::array(vec![Value::from("e"), Value::from("y")]));
        let out = bind("[{ length }]", "['four']").unwrap();
        assert_eq!(out.get_property("length"), Value::from(4));
    }

    #[test]
    fn test_destructuring_nullish_is_type_error() {
        let err = bind("[{ a }]", "[null]").unwrap_err();
        assert!(matches!(err, QuillError::TypeError { .. }));
        assert_eq!(err.message(), "Cannot destructure 'null' as it is null.");
        assert_eq!(err.position().offset, 1);

        let err = bind("[[a]]", "[5]").unwrap_err();
        assert_eq!(err.message(), "number is not iterable");
    }

    #[test]
    fn test_seed_is_preserved() {
        let seed: JsObject = [("z", Value::from(0))].into_iter().collect();
        let out = bind_pattern(&pattern("[a]"), value("[1]"), &Scope::new(), Some(seed), false).unwrap();
        assert_eq!(out.get_property("z"), Value::from(0));
        assert_eq!(out.get_property("a"), Value::from(1));
    }

    #[test]
    fn test_defaults_resolve_through_scope() {
        let scope = Scope::new();
        scope.define("fallback", Value::from("f"));
        let out = bind_pattern(&pattern("[a = fallback]"), value("[]"), &scope, None, false).unwrap();
        assert_eq!(out.get_property("a"), Value::from("f"));
        assert!(!scope.has("a"));
    }
}
