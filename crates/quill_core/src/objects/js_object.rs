//! Ordinary objects with insertion-ordered property storage.
//!
//! # Storage model
//!
//! Named properties live in a [`SmallVec`] of `(key, value)` pairs.  The first
//! [`MAX_INLINE_PROPERTIES`] entries are stored inline in the object; larger
//! objects spill to the heap transparently.  Lookup is a linear scan, which
//! beats hashing for the handful of keys expression scopes and literals carry.
//!
//! Key order is insertion order; overwriting an existing key keeps its slot.
//!
//! # Constructor link
//!
//! Objects created by `new F()` remember `F` so that `instanceof` can answer
//! without a prototype chain.

use smallvec::SmallVec;

use crate::objects::value::{FunctionRef, Value};

/// Number of named-property slots stored directly in the object before the
/// property store spills to the heap.
pub const MAX_INLINE_PROPERTIES: usize = 8;

/// An ordinary object: string-keyed properties plus an optional constructor
/// link.
#[derive(Debug, Clone, Default)]
pub struct JsObject {
    /// Backing store for named properties, in insertion order.
    properties: SmallVec<[(String, Value); MAX_INLINE_PROPERTIES]>,
    /// The function this object was constructed by, if any.
    constructor: Option<FunctionRef>,
}

impl JsObject {
    /// Creates an empty object with no constructor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty object recording `constructor` as its creator.
    pub fn with_constructor(constructor: FunctionRef) -> Self {
        Self {
            properties: SmallVec::new(),
            constructor: Some(constructor),
        }
    }

    /// The function this object was constructed by, if any.
    pub fn constructor(&self) -> Option<&FunctionRef> {
        self.constructor.as_ref()
    }

    /// Returns `true` when the property store is still held inline.
    pub fn is_inline(&self) -> bool {
        !self.properties.spilled()
    }

    // ── Named-property access ────────────────────────────────────────────────

    fn slot(&self, key: &str) -> Option<usize> {
        self.properties.iter().position(|(k, _)| k == key)
    }

    /// Returns the value of `key`, or `None` when the property is absent.
    pub fn get_own_property(&self, key: &str) -> Option<Value> {
        self.slot(key).map(|i| self.properties[i].1.clone())
    }

    /// Returns the value of `key`, or `undefined` when the property is absent.
    pub fn get_property(&self, key: &str) -> Value {
        self.get_own_property(key).unwrap_or_default()
    }

    /// Returns `true` if `key` is an own property.
    pub fn has_own_property(&self, key: &str) -> bool {
        self.slot(key).is_some()
    }

    /// Creates or overwrites `key`.
    pub fn set_property(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        match self.slot(&key) {
            Some(i) => self.properties[i].1 = value,
            None => self.properties.push((key, value)),
        }
    }

    /// Removes `key`.  Returns `true` if the property existed.
    pub fn delete_property(&mut self, key: &str) -> bool {
        match self.slot(key) {
            Some(i) => {
                self.properties.remove(i);
                true
            }
            None => false,
        }
    }

    // ── Iteration ────────────────────────────────────────────────────────────

    /// Own keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.properties.iter().map(|(k, _)| k.as_str())
    }

    /// Own `(key, value)` pairs in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of own properties.
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Returns `true` when the object has no own properties.
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

/// Two objects are equal when they hold the same keys with equal values,
/// regardless of insertion order.  The constructor link is ignored.
impl PartialEq for JsObject {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .entries()
                .all(|(k, v)| other.get_own_property(k).is_some_and(|o| o == *v))
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for JsObject {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut object = JsObject::new();
        for (k, v) in iter {
            object.set_property(k, v);
        }
        object
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────────────────────────────────────
