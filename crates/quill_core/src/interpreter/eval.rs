//! Tree-walking evaluation of [`Expr`] nodes.
//!
//! [`Expr::evaluate`] is the public entry point.  Internally an
//! [`Interpreter`] carries the scope and the `use_cache` flag down the tree;
//! member/call chains are evaluated by [`Interpreter::eval_chain`], which
//! reports an optional-chain short circuit as `Ok(None)` so that the whole
//! chain (up to the nearest parentheses) yields `undefined`.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

use crate::error::{QuillError, QuillResult};
use crate::interpreter::binder::bind_pattern;
use crate::interpreter::ops;
use crate::objects::value::number_to_string;
use crate::objects::{Closure, JsArray, JsFunction, JsObject, RegExpValue, Scope, Value};
use crate::parser::ast::{
    AssignExpr, AssignOp, AssignTarget, Expr, LogicalOp, MemberProp, ObjectProp, Pat, PropKey,
    TemplateLit, UnaryOp, UpdateOp,
};
use crate::parser::scanner::Position;

impl Expr {
    /// Evaluates the expression against `scope`.
    ///
    /// Binary, logical, unary, conditional, member, call, `new`, template and
    /// tagged-template nodes remember their last result.  With
    /// `use_cache = true` a node that has a remembered result returns it
    /// without re-evaluating; with `false` everything is recomputed.
    ///
    /// Assignments write into `scope`: an existing binding is updated in the
    /// frame that defines it, a new one lands in the root frame.
    ///
    /// # Example
    ///
    /// ```rust
    /// use quill_core::{parse, Scope, Value};
    ///
    /// let scope = Scope::new();
    /// scope.define("x", Value::from(20));
    /// let value = parse("x * 2 + 2").unwrap().evaluate(&scope, false).unwrap();
    /// assert_eq!(value, Value::from(42));
    /// ```
    pub fn evaluate(&self, scope: &Scope, use_cache: bool) -> QuillResult<Value> {
        let result = Interpreter::new(scope, use_cache).eval(self);
        if let Err(err) = &result {
            debug!(error = %err, kind = ?self.kind(), "evaluation failed");
        }
        result
    }
}

/// Invokes an arrow closure: binds the parameters in a fresh frame over the
/// captured scope and evaluates the body without the node caches.
pub(crate) fn invoke_closure(closure: &Closure, args: &[Value]) -> QuillResult<Value> {
    let frame = closure.scope.child();
    for (i, param) in closure.params.iter().enumerate() {
        let (target, value) = match param {
            Pat::Rest(rest) => (
                rest.argument.as_ref(),
                Value::array(args.get(i..).unwrap_or_default().to_vec()),
            ),
            other => (other, args.get(i).cloned().unwrap_or_default()),
        };
        let bindings = bind_pattern(target, value, &frame, None, false)?;
        for (name, value) in bindings.entries() {
            frame.define(name, value.clone());
        }
    }
    Interpreter::new(&frame, false).eval(&closure.body)
}

// ─────────────────────────────────────────────────────────────────────────────
// References
// ─────────────────────────────────────────────────────────────────────────────

/// A resolved assignment or update target.
enum Reference {
    /// A variable, resolved through the scope chain on access.
    Binding { name: String, pos: Position },
    /// `object[key]`, with object and key already evaluated.
    Property {
        object: Value,
        key: String,
        pos: Position,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Interpreter
// ─────────────────────────────────────────────────────────────────────────────

/// Evaluation context: the scope names resolve against and whether node
/// caches may be consulted.
pub(crate) struct Interpreter<'s> {
    scope: &'s Scope,
    use_cache: bool,
}

impl<'s> Interpreter<'s> {
    pub(crate) fn new(scope: &'s Scope, use_cache: bool) -> Self {
        Self { scope, use_cache }
    }

    /// Evaluates `expr`, consulting and refreshing its cache.
    pub(crate) fn eval(&self, expr: &Expr) -> QuillResult<Value> {
        let cache = expr.cache();
        if self.use_cache
            && let Some(cache) = cache
            && let Some(value) = cache.get()
        {
            return Ok(value);
        }
        let value = self.eval_uncached(expr)?;
        if let Some(cache) = cache {
            cache.set(value.clone());
        }
        Ok(value)
    }

    fn eval_uncached(&self, expr: &Expr) -> QuillResult<Value> {
        match expr {
            Expr::Null(_) => Ok(Value::Null),
            Expr::Bool(b) => Ok(Value::Bool(b.value)),
            Expr::Num(n) => Ok(Value::Number(n.value)),
            Expr::Str(s) => Ok(Value::String(s.value.clone())),
            Expr::Regexp(r) => Ok(Value::RegExp(Rc::new(RegExpValue {
                source: r.pattern.clone(),
                flags: r.flags.clone(),
            }))),
            Expr::Template(t) => self.eval_template(t),
            Expr::Ident(id) => self.lookup(&id.name, id.loc.start),
            Expr::This(_) => Ok(self.scope.this_value()),
            Expr::Array(a) => {
                let mut elements = Vec::with_capacity(a.elements.len());
                for element in &a.elements {
                    match element {
                        None => elements.push(Value::Undefined),
                        Some(Expr::Spread(s)) => elements.extend(self.spread(&s.argument)?),
                        Some(e) => elements.push(self.eval(e)?),
                    }
                }
                Ok(Value::array(elements))
            }
            Expr::Object(o) => {
                let mut object = JsObject::new();
                for prop in &o.properties {
                    match prop {
                        ObjectProp::Prop(p) => {
                            let key = self.prop_key(&p.key)?;
                            let value = self.eval(&p.value)?;
                            object.set_property(key, value);
                        }
                        ObjectProp::Spread(s) => {
                            let source = self.eval(&s.argument)?;
                            ops::copy_data_properties(&mut object, &source);
                        }
                    }
                }
                Ok(Value::object(object))
            }
            Expr::Paren(p) => self.eval(&p.expression),
            Expr::Arrow(a) => Ok(Value::function(JsFunction::new_arrow(
                Rc::clone(&a.params),
                Rc::clone(&a.body),
                self.scope.clone(),
            ))),
            Expr::Unary(u) => {
                if u.op == UnaryOp::Typeof
                    && let Expr::Ident(id) = u.argument.unparenthesized()
                    && id.name != "undefined"
                    && !self.scope.has(&id.name)
                {
                    return Ok(Value::from("undefined"));
                }
                let value = self.eval(&u.argument)?;
                Ok(match u.op {
                    UnaryOp::Minus => Value::Number(-value.to_number()),
                    UnaryOp::Plus => Value::Number(value.to_number()),
                    UnaryOp::Not => Value::Bool(!value.to_boolean()),
                    UnaryOp::BitNot => Value::Number(f64::from(!ops::to_int32(value.to_number()))),
                    UnaryOp::Typeof => Value::from(value.type_of()),
                    UnaryOp::Void => Value::Undefined,
                })
            }
            Expr::Update(u) => {
                let reference = self.resolve_reference(&u.argument)?;
                let old = self.get_reference(&reference)?.to_number();
                let new = match u.op {
                    UpdateOp::Increment => old + 1.0,
                    UpdateOp::Decrement => old - 1.0,
                };
                self.put_reference(&reference, Value::Number(new))?;
                Ok(Value::Number(if u.prefix { new } else { old }))
            }
            Expr::Binary(b) => {
                let left = self.eval(&b.left)?;
                let right = self.eval(&b.right)?;
                ops::binary(b.op, &left, &right).map_err(|e| e.anchored_at(b.loc.start))
            }
            Expr::Logical(l) => {
                let left = self.eval(&l.left)?;
                let short_circuit = match l.op {
                    LogicalOp::And => !left.to_boolean(),
                    LogicalOp::Or => left.to_boolean(),
                    LogicalOp::NullishCoalesce => !left.is_nullish(),
                };
                if short_circuit {
                    Ok(left)
                } else {
                    self.eval(&l.right)
                }
            }
            Expr::Conditional(c) => {
                if self.eval(&c.test)?.to_boolean() {
                    self.eval(&c.consequent)
                } else {
                    self.eval(&c.alternate)
                }
            }
            Expr::Assign(a) => self.eval_assign(a),
            Expr::Sequence(s) => {
                let mut last = Value::Undefined;
                for e in &s.expressions {
                    last = self.eval(e)?;
                }
                Ok(last)
            }
            Expr::Member(_) | Expr::Call(_) => Ok(self.eval_chain(expr)?.unwrap_or_default()),
            Expr::New(n) => {
                let callee = self.eval(&n.callee)?;
                let args = self.eval_arguments(&n.arguments)?;
                let constructor = match &callee {
                    Value::Function(f) if f.is_constructible() => Rc::clone(f),
                    Value::Undefined => {
                        return Err(QuillError::reference(
                            format!("{} is not defined", n.callee),
                            n.loc.start,
                        ));
                    }
                    _ => {
                        return Err(QuillError::type_error_at(
                            format!("{} is not a constructor", n.callee),
                            n.loc.start,
                        ));
                    }
                };
                let this = Value::object(JsObject::with_constructor(Rc::clone(&constructor)));
                let result = constructor
                    .call(&this, &args)
                    .map_err(|e| e.anchored_at(n.loc.start))?;
                Ok(if result.is_object_like() { result } else { this })
            }
            Expr::TaggedTemplate(t) => {
                let (this, tag) = self
                    .eval_callee(&t.tag)?
                    .unwrap_or((Value::Undefined, Value::Undefined));
                let mut strings = JsArray::from_vec(
                    t.quasi
                        .quasis
                        .iter()
                        .map(|q| Value::from(q.cooked.as_str()))
                        .collect(),
                );
                let raw: Vec<Value> = t
                    .quasi
                    .quasis
                    .iter()
                    .map(|q| Value::from(q.raw.as_str()))
                    .collect();
                strings.set_property("raw", Value::array(raw));

                let mut args = Vec::with_capacity(t.quasi.expressions.len() + 1);
                args.push(Value::Array(Rc::new(RefCell::new(strings))));
                for e in &t.quasi.expressions {
                    args.push(self.eval(e)?);
                }
                self.call_value(&tag, &this, &args, &t.tag, t.loc.start)
            }
            Expr::Spread(s) => Err(QuillError::syntax("Unexpected spread element", s.loc.start)),
        }
    }

    // ── Names ───────────────────────────────────────────────────────────────

    fn lookup(&self, name: &str, pos: Position) -> QuillResult<Value> {
        match self.scope.lookup(name) {
            Some(value) => Ok(value),
            None if name == "undefined" => Ok(Value::Undefined),
            None => Err(QuillError::reference(format!("{name} is not defined"), pos)),
        }
    }

    // ── Literals ────────────────────────────────────────────────────────────

    fn eval_template(&self, t: &TemplateLit) -> QuillResult<Value> {
        let mut out = String::new();
        for (i, quasi) in t.quasis.iter().enumerate() {
            out.push_str(&quasi.cooked);
            if let Some(e) = t.expressions.get(i) {
                out.push_str(&self.eval(e)?.to_js_string());
            }
        }
        Ok(Value::String(out))
    }

    /// The string key of an object-literal property.
    fn prop_key(&self, key: &PropKey) -> QuillResult<String> {
        Ok(match key {
            PropKey::Ident(id) => id.name.clone(),
            PropKey::Str(s) => s.value.clone(),
            PropKey::Num(n) => number_to_string(n.value),
            PropKey::Computed(e) => ops::to_property_key(&self.eval(e)?),
        })
    }

    fn member_key(&self, property: &MemberProp) -> QuillResult<String> {
        match property {
            MemberProp::Ident(id) => Ok(id.name.clone()),
            MemberProp::Computed(e) => Ok(ops::to_property_key(&self.eval(e)?)),
        }
    }

    fn spread(&self, argument: &Expr) -> QuillResult<Vec<Value>> {
        let value = self.eval(argument)?;
        ops::iterate(&value).map_err(|e| e.anchored_at(argument.loc().start))
    }

    fn eval_arguments(&self, arguments: &[Expr]) -> QuillResult<Vec<Value>> {
        let mut values = Vec::with_capacity(arguments.len());
        for argument in arguments {
            match argument {
                Expr::Spread(s) => values.extend(self.spread(&s.argument)?),
                other => values.push(self.eval(other)?),
            }
        }
        Ok(values)
    }

    // ── Member / call chains ────────────────────────────────────────────────

    /// Evaluates a member/call chain.  `Ok(None)` means an optional link met
    /// `null` or `undefined` and the rest of the chain was skipped.
    fn eval_chain(&self, expr: &Expr) -> QuillResult<Option<Value>> {
        match expr {
            Expr::Member(m) => {
                let Some(object) = self.eval_chain(&m.object)? else {
                    return Ok(None);
                };
                if m.optional && object.is_nullish() {
                    return Ok(None);
                }
                let key = self.member_key(&m.property)?;
                ops::get_property(&object, &key)
                    .map(Some)
                    .map_err(|e| e.anchored_at(m.loc.start))
            }
            Expr::Call(c) => {
                let Some((this, callee)) = self.eval_callee(&c.callee)? else {
                    return Ok(None);
                };
                if c.optional && callee.is_nullish() {
                    return Ok(None);
                }
                let args = self.eval_arguments(&c.arguments)?;
                self.call_value(&callee, &this, &args, &c.callee, c.loc.start)
                    .map(Some)
            }
            other => self.eval(other).map(Some),
        }
    }

    /// Evaluates a callee, returning the `this` value for the call alongside
    /// the function.  Member callees pass their object as `this`.
    fn eval_callee(&self, callee: &Expr) -> QuillResult<Option<(Value, Value)>> {
        match callee {
            Expr::Member(m) => {
                let Some(object) = self.eval_chain(&m.object)? else {
                    return Ok(None);
                };
                if m.optional && object.is_nullish() {
                    return Ok(None);
                }
                let key = self.member_key(&m.property)?;
                let function =
                    ops::get_property(&object, &key).map_err(|e| e.anchored_at(m.loc.start))?;
                Ok(Some((object, function)))
            }
            Expr::Paren(p) if matches!(p.expression, Expr::Member(_)) => Ok(Some(
                self.eval_callee(&p.expression)?
                    .unwrap_or((Value::Undefined, Value::Undefined)),
            )),
            other => Ok(self.eval_chain(other)?.map(|f| (Value::Undefined, f))),
        }
    }

    fn call_value(
        &self,
        callee: &Value,
        this: &Value,
        args: &[Value],
        callee_expr: &Expr,
        pos: Position,
    ) -> QuillResult<Value> {
        match callee {
            Value::Function(f) => f.call(this, args).map_err(|e| e.anchored_at(pos)),
            Value::Undefined => Err(QuillError::reference(
                format!("{callee_expr} is not defined"),
                pos,
            )),
            _ => Err(QuillError::type_error_at(
                format!("{callee_expr} is not a function"),
                pos,
            )),
        }
    }

    // ── Assignment ──────────────────────────────────────────────────────────

    fn eval_assign(&self, a: &AssignExpr) -> QuillResult<Value> {
        let target = match &a.left {
            AssignTarget::Pat(pat) => {
                let value = self.eval(&a.right)?;
                let bindings = bind_pattern(pat, value.clone(), self.scope, None, self.use_cache)?;
                for (name, bound) in bindings.entries() {
                    self.scope.assign(name, bound.clone());
                }
                return Ok(value);
            }
            AssignTarget::Expr(target) => target,
        };

        let reference = self.resolve_reference(target)?;
        let value = match a.op {
            AssignOp::Assign => self.eval(&a.right)?,
            AssignOp::LogicalAndAssign | AssignOp::LogicalOrAssign | AssignOp::NullishAssign => {
                let current = self.get_reference(&reference)?;
                let keep = match a.op {
                    AssignOp::LogicalAndAssign => !current.to_boolean(),
                    AssignOp::LogicalOrAssign => current.to_boolean(),
                    _ => !current.is_nullish(),
                };
                if keep {
                    return Ok(current);
                }
                self.eval(&a.right)?
            }
            compound => {
                let current = self.get_reference(&reference)?;
                let right = self.eval(&a.right)?;
                match compound.binary_op() {
                    Some(op) => ops::binary(op, &current, &right)
                        .map_err(|e| e.anchored_at(a.loc.start))?,
                    None => right,
                }
            }
        };
        self.put_reference(&reference, value.clone())?;
        Ok(value)
    }

    /// Resolves an identifier or member target.  Member targets evaluate
    /// their object and key here, before any right-hand side.
    fn resolve_reference(&self, target: &Expr) -> QuillResult<Reference> {
        match target.unparenthesized() {
            Expr::Ident(id) => Ok(Reference::Binding {
                name: id.name.clone(),
                pos: id.loc.start,
            }),
            Expr::Member(m) => {
                let object = self.eval(&m.object)?;
                let key = self.member_key(&m.property)?;
                Ok(Reference::Property {
                    object,
                    key,
                    pos: m.loc.start,
                })
            }
            other => Err(QuillError::syntax(
                "Invalid left-hand side in assignment",
                other.loc().start,
            )),
        }
    }

    fn get_reference(&self, reference: &Reference) -> QuillResult<Value> {
        match reference {
            Reference::Binding { name, pos } => self.lookup(name, *pos),
            Reference::Property { object, key, pos } => {
                ops::get_property(object, key).map_err(|e| e.anchored_at(*pos))
            }
        }
    }

    fn put_reference(&self, reference: &Reference, value: Value) -> QuillResult<()> {
        match reference {
            Reference::Binding { name, .. } => {
                self.scope.assign(name, value);
                Ok(())
            }
            Reference::Property { object, key, pos } => {
                ops::set_property(object, key, value).map_err(|e| e.anchored_at(*pos))
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn eval_in(src: &str, scope: &Scope) -> QuillResult<Value> {
        parse(src)?.evaluate(scope, false)
    }

    fn eval(src: &str) -> Value {
        eval_in(src, &Scope::new()).unwrap()
    }

    fn eval_err(src: &str) -> QuillError {
        eval_in(src, &Scope::new()).unwrap_err()
    }

    #[test]
    fn test_arithmetic_and_logic() {
        assert_eq!(eval("1 + 1 * 2 / 2"), Value::from(2));
        assert_eq!(eval("false || true && !false"), Value::from(true));
        assert_eq!(eval("2 ** 3 ** 2"), Value::from(512));
        assert_eq!(eval("7 % 3 - -1"), Value::from(2));
        assert_eq!(eval("'a' + 1 + 2"), Value::from("a12"));
        assert_eq!(eval("~5 | 0"), Value::from(-6));
        assert_eq!(eval("null ?? 'd'"), Value::from("d"));
        assert_eq!(eval("0 ?? 'd'"), Value::from(0));
        assert_eq!(eval("1 < 2 ? 'y' : 'n'"), Value::from("y"));
        assert_eq!(eval("(1, 2, 3)"), Value::from(3));
        assert_eq!(eval("void 0"), Value::Undefined);
    }

    #[test]
    fn test_typeof_undeclared_is_undefined() {
        assert_eq!(eval("typeof nope"), Value::from("undefined"));
        assert_eq!(eval("typeof (nope)"), Value::from("undefined"));
        assert_eq!(eval("typeof 1"), Value::from("number"));
        assert_eq!(eval("typeof (x => x)"), Value::from("function"));
        assert_eq!(eval("typeof null"), Value::from("object"));
    }

    #[test]
    fn test_undeclared_identifier_is_reference_error() {
        let err = eval_err("1 + nope");
        assert!(matches!(err, QuillError::ReferenceError { .. }));
        assert_eq!(err.message(), "nope is not defined");
        assert_eq!(err.position().offset, 4);
        assert_eq!(eval("undefined"), Value::Undefined);
    }

    #[test]
    fn test_member_access_and_errors() {
        let scope = Scope::new();
        scope.define("o", Value::object([("a", Value::array(vec![Value::from(1)]))].into_iter().collect()));
        assert_eq!(eval_in("o.a[0]", &scope).unwrap(), Value::from(1));
        assert_eq!(eval_in("o['a'].length", &scope).unwrap(), Value::from(1));
        assert_eq!(eval_in("o.missing", &scope).unwrap(), Value::Undefined);
        let err = eval_in("o.missing.x", &scope).unwrap_err();
        assert_eq!(err.message(), "Cannot read properties of undefined (reading 'x')");
        assert_eq!(eval("'abc'[1]"), Value::from("b"));
        assert_eq!(eval("/a+/gi.flags"), Value::from("gi"));
    }

    #[test]
    fn test_optional_chain_short_circuits_to_parentheses() {
        let scope = Scope::new();
        scope.define("n", Value::Null);
        assert_eq!(eval_in("n?.a.b.c()", &scope).unwrap(), Value::Undefined);
        assert_eq!(eval_in("n?.[side = 1]", &scope).unwrap(), Value::Undefined);
        assert!(!scope.has("side"));
        assert!(eval_in("(n?.a).b", &scope).is_err());
        assert_eq!(eval_in("n?.()", &scope).unwrap(), Value::Undefined);
    }

    #[test]
    fn test_calls_pass_member_object_as_this() {
        let scope = Scope::new();
        let mut obj = JsObject::new();
        obj.set_property("tag", Value::from("me"));
        obj.set_property("who", Value::native("who", |this, _| ops::get_property(this, "tag")));
        scope.define("obj", Value::object(obj));
        assert_eq!(eval_in("obj.who()", &scope).unwrap(), Value::from("me"));
        assert_eq!(eval_in("(obj.who)()", &scope).unwrap(), Value::from("me"));
    }

    #[test]
    fn test_call_errors() {
        let scope = Scope::new();
        scope.define("o", Value::object(JsObject::new()));
        scope.define("n", Value::from(1));
        let err = eval_in("o.f()", &scope).unwrap_err();
        assert!(matches!(err, QuillError::ReferenceError { .. }));
        assert_eq!(err.message(), "o.f is not defined");
        let err = eval_in("n()", &scope).unwrap_err();
        assert!(matches!(err, QuillError::TypeError { .. }));
        assert_eq!(err.message(), "n is not a function");
        assert_eq!(eval_in("new n()", &scope).unwrap_err().message(), "n is not a constructor");
        assert_eq!(eval_in("new (x => x)()", &scope).unwrap_err().message(), "((x) => x) is not a constructor");
    }

    #[test]
    fn test_native_errors_are_anchored_at_call_site() {
        let scope = Scope::new();
        scope.define("fail", Value::native("fail", |_, _| Err(QuillError::type_error("boom"))));
        let err = eval_in("1 + fail()", &scope).unwrap_err();
        assert_eq!(err.message(), "boom");
        assert_eq!(err.position().offset, 4);
    }

    #[test]
    fn test_spread_in_arrays_calls_and_objects() {
        let scope = Scope::new();
        scope.define("sum", Value::native("sum", |_, args| {
            Ok(Value::Number(args.iter().map(Value::to_number).sum()))
        }));
        assert_eq!(eval_in("sum(...[1, 2], 3, ...'45')", &scope).unwrap(), Value::from(15));
        assert_eq!(eval("[0, ...[1, 2], , 4].length"), Value::from(5));
        assert_eq!(eval("({ ...{ a: 1, b: 2 }, b: 3 }).b"), Value::from(3));
        assert_eq!(eval("({ ...'hi' })[1]"), Value::from("i"));
        assert_eq!(eval_err("[...1]").message(), "number is not iterable");
    }

    #[test]
    fn test_new_and_instanceof() {
        let scope = Scope::new();
        scope.define("Point", Value::native("Point", |this, args| {
            ops::set_property(this, "x", args.first().cloned().unwrap_or_default())?;
            Ok(Value::Undefined)
        }));
        scope.define("Make", Value::native("Make", |_, _| Ok(Value::array(vec![]))));
        assert_eq!(eval_in("new Point(3).x", &scope).unwrap(), Value::from(3));
        assert_eq!(eval_in("new Point(1) instanceof Point", &scope).unwrap(), Value::from(true));
        assert_eq!(eval_in("({}) instanceof Point", &scope).unwrap(), Value::from(false));
        assert_eq!(eval_in("new Make() instanceof Make", &scope).unwrap(), Value::from(false));
        assert_eq!(eval_in("new Make().length", &scope).unwrap(), Value::from(0));
        assert!(eval_in("({}) instanceof 1", &scope).is_err());
    }

    #[test]
    fn test_assignment_operators() {
        let scope = Scope::new();
        scope.define("a", Value::from(5));
        scope.define("o", Value::object(JsObject::new()));
        assert_eq!(eval_in("a += 2", &scope).unwrap(), Value::from(7));
        assert_eq!(eval_in("a **= 2", &scope).unwrap(), Value::from(49));
        assert_eq!(eval_in("a >>>= 1", &scope).unwrap(), Value::from(24));
        assert_eq!(eval_in("o.x ??= 'set'", &scope).unwrap(), Value::from("set"));
        assert_eq!(eval_in("o.x ??= 'again'", &scope).unwrap(), Value::from("set"));
        assert_eq!(eval_in("o.x &&= 0", &scope).unwrap(), Value::from(0));
        assert_eq!(eval_in("o.x ||= 9", &scope).unwrap(), Value::from(9));
        assert_eq!(eval_in("o['y'] = a = 1", &scope).unwrap(), Value::from(1));
        assert_eq!(scope.get("a"), Value::from(1));
        assert!(eval_in("nope += 1", &scope).is_err());
        assert!(eval_in("null.x = 1", &scope).is_err());
    }

    #[test]
    fn test_update_expressions() {
        let scope = Scope::new();
        scope.define("i", Value::from("5"));
        assert_eq!(eval_in("i++", &scope).unwrap(), Value::from(5));
        assert_eq!(scope.get("i"), Value::from(6));
        assert_eq!(eval_in("--i", &scope).unwrap(), Value::from(5));
        assert_eq!(eval_in("[i++, i++, i]", &scope).unwrap(), Value::array(vec![
            Value::from(5),
            Value::from(6),
            Value::from(7),
        ]));
    }

    #[test]
    fn test_destructuring_assignment_writes_scope() {
        let scope = Scope::new();
        let result = eval_in("[a, { b, c: [d] = [4] }, ...e] = [1, { b: 2 }, 5, 6]", &scope).unwrap();
        assert_eq!(result.to_js_string(), "1,[object Object],5,6");
        assert_eq!(scope.get("a"), Value::from(1));
        assert_eq!(scope.get("b"), Value::from(2));
        assert_eq!(scope.get("d"), Value::from(4));
        assert_eq!(scope.get("e"), Value::array(vec![Value::from(5), Value::from(6)]));
    }

    #[test]
    fn test_arrow_closure_does_not_leak_parameters() {
        let scope = Scope::new();
        scope.define("b", Value::from(1));
        let f = eval_in("(a) => a + b", &scope).unwrap();
        assert_eq!(f.call(&Value::Undefined, &[Value::from(1)]).unwrap(), Value::from(2));
        assert!(!scope.has("a"));
        assert_eq!(scope.get("b"), Value::from(1));
    }

    #[test]
    fn test_arrow_parameters_defaults_and_rest() {
        let scope = Scope::new();
        let v = eval_in("((a, b = a * 2, ...rest) => [a, b, rest.length])(3)", &scope).unwrap();
        assert_eq!(v, Value::array(vec![Value::from(3), Value::from(6), Value::from(0)]));
        let v = eval_in("(({ x }, [y]) => x + y)({ x: 1 }, [2])", &scope).unwrap();
        assert_eq!(v, Value::from(3));
        assert_eq!(eval_in("(x => x)()", &scope).unwrap(), Value::Undefined);
    }

    #[test]
    fn test_arrow_sees_lexical_this_and_closes_over_scope() {
        let scope = Scope::new();
        scope.set_this(Value::from("host"));
        assert_eq!(eval_in("(() => this)()", &scope).unwrap(), Value::from("host"));
        assert_eq!(eval_in("(x => y => x + y)(1)(2)", &scope).unwrap(), Value::from(3));
        // Assigning an outer name from inside a closure updates the outer binding.
        scope.define("count", Value::from(0));
        eval_in("(() => count++)()", &scope).unwrap();
        assert_eq!(scope.get("count"), Value::from(1));
    }

    #[test]
    fn test_template_and_tagged_template() {
        let scope = Scope::new();
        scope.define("name", Value::from("World"));
        assert_eq!(eval_in("`Hello ${name}, ${1 + 1}!`", &scope).unwrap(), Value::from("Hello World, 2!"));
        scope.define("tag", Value::native("tag", |_, args| {
            let strings = &args[0];
            let raw = ops::get_property(strings, "raw")?;
            Ok(Value::array(vec![strings.clone(), raw, args[1].clone()]))
        }));
        let v = eval_in(r"tag`\tHello ${name}!!!`", &scope).unwrap();
        assert_eq!(
            v,
            Value::array(vec![
                Value::array(vec![Value::from("\tHello "), Value::from("!!!")]),
                Value::array(vec![Value::from("\\tHello "), Value::from("!!!")]),
                Value::from("World"),
            ])
        );
    }

    #[test]
    fn test_cache_is_consulted_only_when_requested() {
        let scope = Scope::new();
        scope.define("x", Value::from(1));
        let expr = parse("x + 1").unwrap();
        assert_eq!(expr.evaluate(&scope, true).unwrap(), Value::from(2));
        scope.define("x", Value::from(10));
        assert_eq!(expr.evaluate(&scope, true).unwrap(), Value::from(2));
        assert_eq!(expr.evaluate(&scope, false).unwrap(), Value::from(11));
        assert_eq!(expr.clone().evaluate(&scope, true).unwrap(), Value::from(11));
    }

    #[test]
    fn test_array_assigned_into_itself() {
        let scope = Scope::new();
        assert_eq!(eval_in("a = [1], a.length = a", &scope).unwrap().to_js_string(), "1");
        assert_eq!(eval_in("a.length", &scope).unwrap(), Value::from(1));
        assert_eq!(eval_in("a[0] = a, a + ''", &scope).unwrap(), Value::from(""));
        assert_eq!(eval_in("`${[a, 2]}`", &scope).unwrap(), Value::from(",2"));
        assert_eq!(eval_in("a[0][0][0] === a", &scope).unwrap(), Value::from(true));
        assert_eq!(eval_in("o = {}, o.self = o, o + ''", &scope).unwrap(), Value::from("[object Object]"));
    }

    #[test]
    fn test_huge_array_index_and_length() {
        let scope = Scope::new();
        let err = eval_in("a = [], a[4294967294] = 1", &scope).unwrap_err();
        assert!(matches!(err, QuillError::RangeError { .. }));
        assert_eq!(err.position().offset, 8);
        let err = eval_in("a.length = 4000000000", &scope).unwrap_err();
        assert_eq!(err.message(), "Invalid array length");
        assert_eq!(eval_in("a.length", &scope).unwrap(), Value::from(0));

        let v = eval_in("a[100000] = 'x', [a.length, a[100000], a[5], 5 in a]", &scope).unwrap();
        assert_eq!(
            v,
            Value::array(vec![Value::from(100_001), Value::from("x"), Value::Undefined, Value::from(false)])
        );
        assert_eq!(eval_in("a.length = 2 ** 24, a.length", &scope).unwrap(), Value::from(16_777_216));
        assert!(eval_in("a.length = 2 ** 24 + 1", &scope).is_err());
        assert_eq!(eval_in("a.length = 1, a.length", &scope).unwrap(), Value::from(1));
    }

    #[test]
    fn test_regexp_literal_value() {
        match eval("/a\\/b/g") {
            Value::RegExp(r) => {
                assert_eq!(r.source, "a\\/b");
                assert_eq!(r.flags, "g");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
