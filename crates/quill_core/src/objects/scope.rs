//! Variable scopes.
//!
//! A [`Scope`] is a reference-counted chain of frames.  Each frame owns an
//! [`ObjectRef`] of variables; the root frame usually wraps an object owned by
//! the embedding.  `this` is simply the binding named `"this"`, resolved
//! through the chain like any other name, which gives arrow functions a
//! lexical `this`.
//!
//! Reads walk the chain from the innermost frame outwards.  Assignment writes
//! to the nearest frame that already defines the name, and to the root frame
//! otherwise.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::objects::js_object::JsObject;
use crate::objects::value::{ObjectRef, Value};

/// The name under which the `this` value is bound.
pub const THIS_BINDING: &str = "this";

struct Frame {
    vars: ObjectRef,
    parent: Option<Scope>,
}

/// A chain of variable frames.  Cloning a `Scope` shares the frames.
#[derive(Clone)]
pub struct Scope(Rc<Frame>);

impl Scope {
    /// Creates a root scope with no variables.
    pub fn new() -> Self {
        Self::from_object(Rc::new(RefCell::new(JsObject::new())))
    }

    /// Creates a root scope backed by `vars`.  Assignments to undeclared
    /// names land in `vars`.
    pub fn from_object(vars: ObjectRef) -> Self {
        Scope(Rc::new(Frame { vars, parent: None }))
    }

    /// Creates an empty frame whose parent is `self`.
    pub fn child(&self) -> Self {
        self.child_with(JsObject::new())
    }

    /// Creates a frame holding `vars` whose parent is `self`.
    pub fn child_with(&self, vars: JsObject) -> Self {
        Scope(Rc::new(Frame {
            vars: Rc::new(RefCell::new(vars)),
            parent: Some(self.clone()),
        }))
    }

    /// The variables of this frame only.
    pub fn vars(&self) -> &ObjectRef {
        &self.0.vars
    }

    /// The enclosing frame, if any.
    pub fn parent(&self) -> Option<&Scope> {
        self.0.parent.as_ref()
    }

    /// Number of frames from this one to the root, inclusive.
    pub fn depth(&self) -> usize {
        self.frames().count()
    }

    fn frames(&self) -> impl Iterator<Item = &Scope> {
        std::iter::successors(Some(self), |s| s.parent())
    }

    fn root(&self) -> &Scope {
        let mut scope = self;
        while let Some(parent) = scope.parent() {
            scope = parent;
        }
        scope
    }

    // ── Name resolution ──────────────────────────────────────────────────────

    /// Returns `true` when any frame in the chain defines `name`.
    pub fn has(&self, name: &str) -> bool {
        self.frames()
            .any(|s| s.0.vars.borrow().has_own_property(name))
    }

    /// Resolves `name` through the chain.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        self.frames()
            .find_map(|s| s.0.vars.borrow().get_own_property(name))
    }

    /// Resolves `name`, returning `undefined` when it is not defined.
    pub fn get(&self, name: &str) -> Value {
        self.lookup(name).unwrap_or_default()
    }

    /// The current `this` value (`undefined` when unbound).
    pub fn this_value(&self) -> Value {
        self.get(THIS_BINDING)
    }

    // ── Mutation ─────────────────────────────────────────────────────────────

    /// Binds `name` in this frame, shadowing outer bindings.
    pub fn define(&self, name: impl Into<String>, value: Value) {
        self.0.vars.borrow_mut().set_property(name, value);
    }

    /// Binds `this` in this frame.
    pub fn set_this(&self, this: Value) {
        self.define(THIS_BINDING, this);
    }

    /// Writes `name` into the nearest frame that defines it, or into the root
    /// frame when no frame does.
    pub fn assign(&self, name: &str, value: Value) {
        let target = self
            .frames()
            .find(|s| s.0.vars.borrow().has_own_property(name))
            .unwrap_or_else(|| self.root());
        target.0.vars.borrow_mut().set_property(name, value);
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

impl From<JsObject> for Scope {
    fn from(vars: JsObject) -> Self {
        Scope::from_object(Rc::new(RefCell::new(vars)))
    }
}

// The frame contents may contain closures that capture this very scope, so
// only the shape is printed.
impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.0.vars.borrow().keys().map(str::to_string).collect();
        f.debug_struct("Scope")
            .field("names", &names)
            .field("depth", &self.depth())
            .finish()
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_walks_the_chain() {
        let root = Scope::new();
        root.define("a", Value::from(1));
        let child = root.child();
        child.define("b", Value::from(2));

        assert_eq!(child.get("a"), Value::from(1));
        assert_eq!(child.get("b"), Value::from(2));
        assert!(child.has("a"));
        assert!(!root.has("b"));
        assert_eq!(root.lookup("b"), None);
        assert_eq!(child.depth(), 2);
    }

    #[test]
    fn test_child_shadows_parent() {
        let root = Scope::new();
        root.define("x", Value::from("outer"));
        let child = root.child();
        child.define("x", Value::from("inner"));
        assert_eq!(child.get("x"), Value::from("inner"));
        assert_eq!(root.get("x"), Value::from("outer"));
    }

    #[test]
    fn test_assign_updates_nearest_defining_frame() {
        let root = Scope::new();
        root.define("x", Value::from(1));
        let child = root.child();
        child.assign("x", Value::from(2));
        assert_eq!(root.get("x"), Value::from(2));
        assert!(!child.vars().borrow().has_own_property("x"));
    }

    #[test]
    fn test_assign_undeclared_lands_in_root() {
        let root = Scope::new();
        let child = root.child().child();
        child.assign("fresh", Value::from(true));
        assert_eq!(root.get("fresh"), Value::from(true));
    }

    #[test]
    fn test_this_resolves_through_chain() {
        let root = Scope::new();
        root.set_this(Value::from("host"));
        let child = root.child();
        assert_eq!(child.this_value(), Value::from("host"));
        assert_eq!(Scope::new().this_value(), Value::Undefined);
    }

    #[test]
    fn test_from_object_shares_storage() {
        let vars = Rc::new(RefCell::new(JsObject::new()));
        let scope = Scope::from_object(Rc::clone(&vars));
        scope.assign("y", Value::from(3));
        assert_eq!(vars.borrow().get_property("y"), Value::from(3));
    }
}
