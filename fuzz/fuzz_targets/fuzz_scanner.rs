#![no_main]

use libfuzzer_sys::fuzz_target;
use quill_core::parser::scanner::{Scanner, TokenKind};

// Scan arbitrary UTF-8 input.  The scanner must either produce tokens whose
// spans lie inside the source and advance monotonically, or report a syntax
// error; it must never panic or loop.
fuzz_target!(|data: &[u8]| {
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };
    let mut scanner = Scanner::new(source);
    let mut last_end = 0;
    loop {
        let Ok(token) = scanner.next_token() else {
            return;
        };
        assert!(token.span.start.offset >= last_end);
        assert!(token.span.end.offset <= source.len());
        last_end = token.span.end.offset;
        if token.kind == TokenKind::Eof {
            return;
        }
        // A `/` may start a regular expression; exercise the rescan path too.
        if matches!(token.kind, TokenKind::Slash | TokenKind::SlashEqual) {
            let _ = scanner.clone().rescan_regexp(&token);
        }
    }
});
