#![no_main]

use libfuzzer_sys::fuzz_target;
use quill_core::parse;

// Whatever parses must print to source that parses again and prints
// identically.
fuzz_target!(|data: &[u8]| {
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(expr) = parse(source) else {
        return;
    };
    let printed = expr.to_string();
    let reparsed = match parse(&printed) {
        Ok(e) => e,
        Err(err) => panic!("{source:?} printed as {printed:?} which fails to parse: {err}"),
    };
    assert_eq!(reparsed.to_string(), printed);
});
