/// Arrays with a dense prefix, sparse far indices and a small named-property store.
pub mod js_array;
/// Native functions and arrow closures.
pub mod js_function;
/// Ordinary objects with insertion-ordered, inline-first property storage.
pub mod js_object;
/// Reference-counted chains of variable frames.
pub mod scope;
/// Top-level runtime value enum and its abstract conversions.
pub mod value;

pub use js_array::JsArray;
pub use js_function::{Closure, FunctionKind, JsFunction, NativeFn};
pub use js_object::JsObject;
pub use scope::Scope;
pub use value::{ArrayRef, FunctionRef, ObjectRef, RegExpValue, Value};
