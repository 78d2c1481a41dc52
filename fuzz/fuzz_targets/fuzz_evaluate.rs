#![no_main]

use libfuzzer_sys::fuzz_target;
use quill_core::{Scope, Value, parse};

// Evaluate arbitrary parsed expressions against a small scope that includes
// a self-containing array.  Errors are fine; panics and aborts are not.
// Arrow functions are skipped since self-application recurses until the
// stack overflows.  `quill.dict` seeds length writes and self references.
fuzz_target!(|data: &[u8]| {
    if data.len() > 256 {
        return;
    }
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };
    if source.contains("=>") {
        return;
    }
    let Ok(expr) = parse(source) else {
        return;
    };
    let scope = Scope::new();
    scope.define("a", Value::from(1));
    scope.define("s", Value::from("str"));
    scope.define("arr", Value::array(vec![Value::from(1), Value::Null]));
    let cyclic = Value::array(vec![Value::from(0)]);
    let _ = quill_core::interpreter::ops::set_property(&cyclic, "1", cyclic.clone());
    scope.define("cyc", cyclic);
    let _ = expr.evaluate(&scope, false);
    let _ = expr.evaluate(&scope, true);
});
