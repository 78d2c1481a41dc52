//! Arrays: a dense element prefix, sparse far indices, and a few named
//! properties.
//!
//! # Storage model
//!
//! Elements near the end of the dense prefix are stored in a `Vec`; a write
//! that lands more than [`MAX_DENSE_GAP`] slots past it goes into an ordered
//! sparse map instead, and is folded back into the prefix once the gap
//! closes.  `length` is tracked separately, so growing it (`a.length = n`)
//! allocates nothing.  Reading an index that holds no element yields
//! `undefined`.
//!
//! Lengths are limited to [`MAX_LENGTH`]; writes past it are a RangeError.
//!
//! Named properties exist for the cooked-strings array passed to template
//! tags, which carries a parallel `raw` array.

use std::collections::BTreeMap;

use smallvec::SmallVec;

use crate::error::{QuillError, QuillResult};
use crate::objects::value::Value;

/// Largest length an array may have.
pub const MAX_LENGTH: usize = 1 << 24;

/// How far past the dense prefix a write may land and still extend it.
pub const MAX_DENSE_GAP: usize = 1024;

fn invalid_length() -> QuillError {
    QuillError::range_error("Invalid array length")
}

/// An array value.
#[derive(Debug, Clone, Default)]
pub struct JsArray {
    /// Elements `0..elements.len()`.
    elements: Vec<Value>,
    /// Elements at or past `elements.len()`, keyed by index.
    sparse: BTreeMap<usize, Value>,
    /// The `length` property; never below the highest stored index + 1.
    length: usize,
    /// Non-index named properties (e.g. `raw`).
    properties: SmallVec<[(String, Value); 2]>,
}

impl JsArray {
    /// Creates an empty array.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an array holding `elements`.
    pub fn from_vec(elements: Vec<Value>) -> Self {
        Self {
            length: elements.len(),
            elements,
            sparse: BTreeMap::new(),
            properties: SmallVec::new(),
        }
    }

    /// The `length` property.
    pub fn len(&self) -> usize {
        self.length
    }

    /// Returns `true` when `length` is zero.
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Returns element `index`, or `undefined` when nothing is stored there.
    pub fn get(&self, index: usize) -> Value {
        match self.elements.get(index) {
            Some(value) => value.clone(),
            None => self.sparse.get(&index).cloned().unwrap_or_default(),
        }
    }

    /// Returns `true` when an element is stored at `index`.
    pub fn has_index(&self, index: usize) -> bool {
        index < self.elements.len() || self.sparse.contains_key(&index)
    }

    /// Stores `value` at `index`, growing `length` past it when needed.
    ///
    /// # Errors
    ///
    /// RangeError when `index + 1` would exceed [`MAX_LENGTH`].
    pub fn set(&mut self, index: usize, value: Value) -> QuillResult<()> {
        if index >= MAX_LENGTH {
            return Err(invalid_length());
        }
        let dense = self.elements.len();
        if index < dense {
            self.elements[index] = value;
        } else if index - dense <= MAX_DENSE_GAP {
            self.elements.resize(index, Value::Undefined);
            self.elements.push(value);
            self.absorb_sparse();
        } else {
            self.sparse.insert(index, value);
        }
        self.length = self.length.max(index + 1);
        Ok(())
    }

    /// Moves sparse entries that the dense prefix now reaches into it.
    fn absorb_sparse(&mut self) {
        let far = self.sparse.split_off(&self.elements.len());
        for (index, value) in std::mem::replace(&mut self.sparse, far) {
            self.elements[index] = value;
        }
        while let Some(value) = self.sparse.remove(&self.elements.len()) {
            self.elements.push(value);
        }
    }

    /// Appends `value`; returns the new length.
    ///
    /// # Errors
    ///
    /// RangeError when the array is already [`MAX_LENGTH`] long.
    pub fn push(&mut self, value: Value) -> QuillResult<usize> {
        self.set(self.length, value)?;
        Ok(self.length)
    }

    /// Sets `length`.  Shrinking drops the elements at or past `new_len`;
    /// growing only records the new length.
    ///
    /// # Errors
    ///
    /// RangeError when `new_len` exceeds [`MAX_LENGTH`].
    pub fn set_len(&mut self, new_len: usize) -> QuillResult<()> {
        if new_len > MAX_LENGTH {
            return Err(invalid_length());
        }
        self.elements.truncate(new_len);
        self.sparse.split_off(&new_len);
        self.length = new_len;
        Ok(())
    }

    /// Iterates over indices `0..length` in order, yielding `undefined` where
    /// nothing is stored.
    pub fn iter(&self) -> impl Iterator<Item = Value> + '_ {
        (0..self.length).map(|i| self.get(i))
    }

    /// Stored `(index, element)` pairs in index order.  Unwritten slots of a
    /// sparse array are skipped.
    pub fn entries(&self) -> impl Iterator<Item = (usize, &Value)> {
        self.elements
            .iter()
            .enumerate()
            .chain(self.sparse.iter().map(|(i, v)| (*i, v)))
    }

    /// Copies indices `0..length` into a vector.
    pub fn to_vec(&self) -> Vec<Value> {
        self.iter().collect()
    }

    // ── Named properties ─────────────────────────────────────────────────────

    /// Returns named property `key`, if set.
    pub fn get_property(&self, key: &str) -> Option<Value> {
        self.properties
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    /// Creates or overwrites named property `key`.
    pub fn set_property(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        match self.properties.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.properties.push((key, value)),
        }
    }

    /// Returns `true` if named property `key` is set.
    pub fn has_property(&self, key: &str) -> bool {
        self.properties.iter().any(|(k, _)| k == key)
    }
}

/// Arrays compare element-wise over their whole length; named properties
/// are ignored.
impl PartialEq for JsArray {
    fn eq(&self, other: &Self) -> bool {
        self.length == other.length && self.iter().eq(other.iter())
    }
}

impl FromIterator<Value> for JsArray {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_array_is_empty() {
        let arr = JsArray::new();
        assert_eq!(arr.len(), 0);
        assert!(arr.is_empty());
    }

    #[test]
    fn test_push_and_get() {
        let mut arr = JsArray::new();
        assert_eq!(arr.push(Value::from(1)).unwrap(), 1);
        assert_eq!(arr.push(Value::from("two")).unwrap(), 2);
        assert_eq!(arr.get(1), Value::from("two"));
        assert_eq!(arr.get(5), Value::Undefined);
    }

    #[test]
    fn test_set_past_end_pads_with_undefined() {
        let mut arr = JsArray::new();
        arr.set(2, Value::from(7)).unwrap();
        assert_eq!(arr.len(), 3);
        assert_eq!(arr.get(0), Value::Undefined);
        assert_eq!(arr.get(2), Value::from(7));
    }

    #[test]
    fn test_far_writes_are_sparse() {
        let mut arr: JsArray = (0..3).map(Value::from).collect();
        let far = MAX_LENGTH - 1;
        arr.set(far, Value::from("end")).unwrap();
        assert_eq!(arr.len(), MAX_LENGTH);
        assert_eq!(arr.elements.len(), 3);
        assert_eq!(arr.get(far), Value::from("end"));
        assert_eq!(arr.get(far - 1), Value::Undefined);
        assert!(arr.has_index(far));
        assert!(!arr.has_index(far - 1));
        let stored: Vec<usize> = arr.entries().map(|(i, _)| i).collect();
        assert_eq!(stored, vec![0, 1, 2, far]);
    }

    #[test]
    fn test_sparse_entries_fold_into_dense_prefix() {
        let mut arr = JsArray::new();
        arr.set(MAX_DENSE_GAP + 5, Value::from("b")).unwrap();
        arr.set(MAX_DENSE_GAP + 6, Value::from("c")).unwrap();
        assert!(arr.elements.is_empty());
        arr.set(MAX_DENSE_GAP, Value::from(0)).unwrap();
        assert_eq!(arr.sparse.len(), 2);
        arr.set(MAX_DENSE_GAP + 4, Value::from("a")).unwrap();
        assert!(arr.sparse.is_empty());
        assert_eq!(arr.elements.len(), MAX_DENSE_GAP + 7);
        assert_eq!(arr.get(MAX_DENSE_GAP + 6), Value::from("c"));
    }

    #[test]
    fn test_writes_past_max_length_are_range_errors() {
        let mut arr = JsArray::new();
        let err = arr.set(MAX_LENGTH, Value::Null).unwrap_err();
        assert!(matches!(err, QuillError::RangeError { .. }));
        assert!(arr.set_len(MAX_LENGTH + 1).is_err());
        assert!(arr.is_empty());
    }

    #[test]
    fn test_set_len_grows_without_storing_and_truncates() {
        let mut arr: JsArray = (1..=4).map(Value::from).collect();
        arr.set(100_000, Value::from(9)).unwrap();
        arr.set_len(2).unwrap();
        assert_eq!(arr.to_vec(), vec![Value::from(1), Value::from(2)]);
        assert!(arr.sparse.is_empty());

        arr.set_len(MAX_LENGTH).unwrap();
        assert_eq!(arr.len(), MAX_LENGTH);
        assert_eq!(arr.elements.len(), 2);
        assert_eq!(arr.entries().count(), 2);
    }

    #[test]
    fn test_equality_covers_whole_length() {
        let mut a: JsArray = vec![Value::from(1)].into_iter().collect();
        let b = a.clone();
        assert_eq!(a, b);
        a.set_len(3).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_named_properties() {
        let mut arr = JsArray::new();
        assert!(!arr.has_property("raw"));
        arr.set_property("raw", Value::array(vec![Value::from("a")]));
        assert!(arr.has_property("raw"));
        assert_eq!(
            arr.get_property("raw"),
            Some(Value::array(vec![Value::from("a")]))
        );
    }
}
