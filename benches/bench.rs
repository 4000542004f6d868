use criterion::{criterion_group, criterion_main, Criterion};
use markup_stream::{Dialect, Formatter, Tokenizer};

fn large_document() -> String {
    let mut doc = String::from("<!DOCTYPE html>\n<html><body>\n");
    for i in 0..2000 {
        doc.push_str(&format!(
            "<div class=\"row r{i}\" data-id={i}><!-- row {i} -->\
             <p>caf&eacute; &amp; cr&egrave;me &#x20AC;{i}<br>\
             <svg:rect xmlns:svg=\"http://www.w3.org/2000/svg\" width=\"{i}\"/></p>\
             <%= item[{i}] %></div>\n"
        ));
    }
    doc.push_str("<script>if (a < b && c > d) {}</script>\n</body></html>\n");
    doc
}

pub fn tokenizer(c: &mut Criterion) {
    let doc = large_document();
    c.bench_function("tokenize large", |b| {
        b.iter(|| Tokenizer::new().tokenize(&doc).unwrap());
    });

    c.bench_function("tokenize large xml", |b| {
        b.iter(|| {
            let mut tokenizer = Tokenizer::new();
            tokenizer.set_dialect(Dialect::Xml);
            tokenizer.tokenize(&doc).unwrap()
        });
    });
}

pub fn formatter(c: &mut Criterion) {
    let doc = large_document();
    let tokens = Tokenizer::new().tokenize(&doc).unwrap();

    c.bench_function("format large", |b| {
        b.iter(|| Formatter::new().format(&tokens).unwrap());
    });

    c.bench_function("format large to writer", |b| {
        // output shouldn't be much larger than the input, but just to be safe...
        let mut buffer = Vec::with_capacity(doc.len() * 2);
        b.iter(|| {
            buffer.clear();
            let mut formatter = Formatter::new();
            formatter.set_output(&mut buffer);
            for token in &tokens {
                formatter.emit(token).unwrap();
            }
            formatter.finish().unwrap();
        });
    });
}

criterion_group!(benches, tokenizer, formatter);
criterion_main!(benches);
