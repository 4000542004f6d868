#![no_main]

use libfuzzer_sys::fuzz_target;
use markup_stream::{Formatter, Tokenizer};

fuzz_target!(|data: &[u8]| fuzz_target(data));

fn fuzz_target(data: &[u8]) {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(tokens) = Tokenizer::new().tokenize(input) else {
        return;
    };
    let Ok(formatted) = Formatter::new().format(&tokens) else {
        return;
    };
    // Formatting is idempotent once the stream has been through the
    // formatter.
    let again = Tokenizer::new()
        .tokenize(&formatted)
        .expect("formatter output must tokenize");
    let twice = Formatter::new().format(&again).expect("format");
    assert_eq!(formatted, twice);
}
