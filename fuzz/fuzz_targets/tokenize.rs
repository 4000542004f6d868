#![no_main]

use libfuzzer_sys::fuzz_target;
use markup_stream::{Dialect, Tokenizer};

fuzz_target!(|data: &[u8]| fuzz_target(data));

fn fuzz_target(data: &[u8]) {
    for dialect in [Dialect::Html, Dialect::Xml] {
        let mut input = data;
        let mut tokenizer = Tokenizer::new();
        tokenizer.set_dialect(dialect);
        tokenizer.set_error_recovery(dialect == Dialect::Html);
        tokenizer.set_input(&mut input);

        for token in &mut tokenizer {
            if token.is_err() {
                break;
            }
        }
    }
}
