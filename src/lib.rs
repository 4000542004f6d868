#![doc = include_str!("../README.md")]
#![doc(html_root_url = "https://docs.rs/markup-stream/0.1.0")]
#![warn(clippy::pedantic)]
#![allow(
    clippy::cast_possible_truncation,
    clippy::fn_params_excessive_bools,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::needless_pass_by_value,
    clippy::struct_excessive_bools,
    clippy::too_many_arguments,
    clippy::too_many_lines,
    clippy::unnecessary_wraps,
    clippy::match_wildcard_for_single_variants
)]
#![deny(unsafe_code)]

extern crate alloc;

mod chars;
mod entities;
mod error;
mod formatter;
mod name;
mod reader;
mod scope;
mod token;
mod tokenizer;
mod writer;

pub use crate::entities::{decode as decode_entities, lookup as lookup_entity};
pub use crate::error::*;
pub use crate::formatter::*;
pub use crate::name::*;
pub use crate::scope::*;
pub use crate::token::*;
pub use crate::tokenizer::*;

pub(crate) const OUTPUT_BUFFER_SIZE: usize = 16384;

/// The namespace bound to the reserved `xml` prefix.
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";
/// The namespace of `xmlns` declarations themselves.
pub const XMLNS_NAMESPACE: &str = "http://www.w3.org/2000/xmlns/";

/// Nesting limit applied by tokenizers and formatters unless configured
/// otherwise.
pub const DEFAULT_MAX_DEPTH: usize = 4096;

/// The pointer position.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub struct Mark {
    /// The position index, in bytes.
    pub index: u64,
    /// The position line, starting at 1.
    pub line: u64,
    /// The position column, in characters, starting at 1.
    pub column: u64,
}

impl Default for Mark {
    fn default() -> Self {
        Mark {
            index: 0,
            line: 1,
            column: 1,
        }
    }
}

impl core::fmt::Display for Mark {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "line {} column {}", self.line, self.column)
    }
}

/// The stream encoding.
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[non_exhaustive]
pub enum Encoding {
    /// The default UTF-8 encoding.
    #[default]
    Utf8,
    /// The UTF-16-LE encoding with BOM.
    Utf16Le,
    /// The UTF-16-BE encoding with BOM.
    Utf16Be,
}

/// The markup dialect.
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[non_exhaustive]
pub enum Dialect {
    /// Permissive HTML-like markup. Scanning never fails on mismatched or
    /// undeclared constructs, and the formatter invents prefixes when a
    /// desired one is taken.
    #[default]
    Html,
    /// Strict XML-like markup. Namespace bindings are visible in the stream
    /// as [`Token::PrefixBegin`] and [`Token::PrefixEnd`].
    Xml,
}

/// How the formatter writes an attribute with an empty value.
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[non_exhaustive]
pub enum EmptyAttributes {
    /// A bare name: `<input disabled>`.
    Html,
    /// The name repeated as value: `<input disabled="disabled">`.
    Xhtml,
    /// An explicit empty value: `<input disabled="">`.
    #[default]
    Xml,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tokenize(input: &str) -> Vec<Token> {
        Tokenizer::new().tokenize(input).unwrap()
    }

    fn format(tokens: &[Token]) -> String {
        Formatter::new().format(tokens).unwrap()
    }

    fn assert_tokens(actual: &[Token], expected: &[Token]) {
        assert_eq!(
            actual,
            expected,
            "diff:\n{}",
            zip_longest(
                actual.iter().map(|t| format!("{t:?}")),
                expected.iter().map(|t| format!("{t:?}"))
            )
            .map(|(a, b)| {
                let a = a.unwrap_or_default();
                let b = b.unwrap_or_default();
                format!("{a:<60} {b}")
            })
            .collect::<Vec<_>>()
            .join("\n")
        );
    }

    #[test]
    fn round_trip_is_stable() {
        let input = concat!(
            "<!DOCTYPE html>\n",
            "<html xmlns=\"http://www.w3.org/1999/xhtml\" lang=\"en\">",
            "<head><title>A &amp; B</title></head>\n",
            "<body class='main' hidden>",
            "<!-- a quick note -->",
            "<p>x &lt; y<br>caf&eacute;</p>",
            "<svg:svg xmlns:svg=\"http://www.w3.org/2000/svg\"><svg:rect width=\"10\"/></svg:svg>",
            "<%= DateTime.Now %>",
            "</body></html>"
        );
        let first = tokenize(input);
        let formatted = format(&first);
        let second = tokenize(&formatted);
        assert_tokens(&second, &first);
        assert_eq!(format(&second), formatted);
    }

    #[test]
    fn xml_round_trip_keeps_prefix_brackets() {
        let input = r#"<a:root xmlns:a="urn:a"><a:item key="v">text</a:item><b xmlns="urn:b"/></a:root>"#;
        let mut tokenizer = Tokenizer::new();
        tokenizer.set_dialect(Dialect::Xml);
        tokenizer.set_error_recovery(false);
        let tokens = tokenizer.tokenize(input).unwrap();
        assert_eq!(tokenizer.depth(), 0);

        let mut formatter = Formatter::new();
        formatter.set_dialect(Dialect::Xml);
        let output = formatter.format(&tokens).unwrap();
        assert_eq!(output, input);
    }

    #[test]
    fn auto_balance_closes_intermediate_and_ignores_unknown() {
        let mut tokenizer = Tokenizer::new();
        tokenizer.set_auto_balance_tags(true);
        let tokens = tokenizer
            .tokenize("<odd><b><even></odd></ignored></even>")
            .unwrap();
        assert_tokens(
            &tokens,
            &[
                Token::ElementBegin(Name::new("odd")),
                Token::ElementBegin(Name::new("b")),
                Token::ElementBegin(Name::new("even")),
                Token::ElementEnd(Name::new("even")),
                Token::ElementEnd(Name::new("b")),
                Token::ElementEnd(Name::new("odd")),
            ],
        );
        assert_eq!(tokenizer.depth(), 0);
    }

    #[test]
    fn nested_default_namespace_is_declared_once() {
        let tokens = [
            Token::ElementBegin(Name::with_namespace("foo", "", "U")),
            Token::ElementBegin(Name::with_namespace("child", "", "U")),
            Token::Text(String::from("text")),
            Token::ElementEnd(Name::default()),
            Token::ElementEnd(Name::default()),
        ];
        assert_eq!(format(&tokens), r#"<foo xmlns="U"><child>text</child></foo>"#);
    }

    #[test]
    fn entity_fidelity() {
        assert_tokens(&tokenize("&#65;"), &[Token::Text(String::from("A"))]);
        assert_tokens(&tokenize("&euro;"), &[Token::Text(String::from("€"))]);
        assert_tokens(&tokenize("&#xzz;"), &[Token::Text(String::from("&#xzz;"))]);

        let tokens = tokenize("<p>&lt;b&gt;</p>");
        assert_eq!(tokens[1], Token::Text(String::from("<b>")));
        assert_eq!(format(&tokens), "<p>&lt;b&gt;</p>");
    }

    #[test]
    fn canonical_attribute_order() {
        let tokens = [
            Token::ElementVoid(Name::new("input")),
            Token::Attribute(Name::attribute("whitespace")),
            Token::Whitespace(String::from(" \t")),
            Token::Attribute(Name::attribute("no-value")),
            Token::Text(String::new()),
            Token::Attribute(Name::attribute("anyQuotedText")),
            Token::Text(String::from("'quoted'")),
        ];
        let mut formatter = Formatter::new();
        formatter.set_canonical(true);
        assert_eq!(
            formatter.format(&tokens).unwrap(),
            r#"<input anyQuotedText="&apos;quoted&apos;" no-value="" whitespace=" &#x9;"></input>"#
        );
    }

    #[test]
    fn unparsed_block_fidelity() {
        let input = "<!-- a quick note -->";
        let tokens = tokenize(input);
        assert_tokens(&tokens, &[Token::unparsed("!--{0}--", " a quick note ")]);
        assert_eq!(format(&tokens), input);
    }

    #[test]
    fn undeclared_close_prefix_differs_by_dialect() {
        let input = "<x:a></x:a>";

        let html = tokenize(input);
        assert_tokens(
            &html,
            &[
                Token::ElementBegin(Name::with_namespace("a", "x", "")),
                Token::ElementEnd(Name::with_namespace("a", "x", "")),
            ],
        );
        assert_eq!(html[1].name().unwrap().prefix, "x");

        let mut tokenizer = Tokenizer::new();
        tokenizer.set_dialect(Dialect::Xml);
        let xml = tokenizer.tokenize(input).unwrap();
        assert_tokens(
            &xml,
            &[
                Token::ElementBegin(Name::new("x:a")),
                Token::ElementEnd(Name::new("x:a")),
            ],
        );
        assert_eq!(xml[1].name().unwrap().prefix, "");
    }

    #[test]
    fn strict_errors_are_positioned() {
        let mut tokenizer = Tokenizer::new();
        tokenizer.set_dialect(Dialect::Xml);
        tokenizer.set_error_recovery(false);
        let err = tokenizer.tokenize("<a>\n  <b></c>").unwrap_err();
        let TokenizerError::Problem {
            problem_mark,
            context_mark,
            token,
            ..
        } = err
        else {
            panic!("unexpected error: {err}");
        };
        assert_eq!((problem_mark.index, problem_mark.line, problem_mark.column), (9, 2, 6));
        assert_eq!((context_mark.line, context_mark.column), (2, 3));
        assert_eq!(token, TokenKind::ElementEnd);
    }

    #[test]
    fn lenient_tokenizer_recovers_except_from_unterminated_tags() {
        for input in [
            "<",
            "a < b",
            "</",
            "&",
            "&#",
            "&&;",
            "<<>>",
            "<1>",
            "</p></p>",
            "<a b='c\"d'>",
        ] {
            let result = Tokenizer::new().tokenize(input);
            assert!(result.is_ok(), "{input:?}: {result:?}");
        }
        assert_tokens(&tokenize("a < b"), &[Token::Text(String::from("a < b"))]);
        assert_tokens(
            &tokenize("</p></p>"),
            &[
                Token::ElementEnd(Name::new("p")),
                Token::ElementEnd(Name::new("p")),
            ],
        );

        for input in ["<a href=x", "<a b", "<a b='c", "</p"] {
            let result = Tokenizer::new().tokenize(input);
            assert!(
                matches!(result, Err(TokenizerError::Problem { .. })),
                "{input:?}: {result:?}"
            );
        }
    }

    #[test]
    fn parallel_runs_share_nothing() {
        let inputs: Vec<String> = (0..8)
            .map(|i| format!("<r{i} xmlns:p=\"urn:{i}\"><p:x>&euro;{i}</p:x></r{i}>"))
            .collect();
        let outputs: Vec<String> = std::thread::scope(|s| {
            let handles: Vec<_> = inputs
                .iter()
                .map(|input| s.spawn(move || format(&tokenize(input))))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        for (i, output) in outputs.iter().enumerate() {
            // Html tokens carry no declarations, so the binding moves to the
            // first element that needs it.
            assert_eq!(
                output,
                &format!("<r{i}><p:x xmlns:p=\"urn:{i}\">€{i}</p:x></r{i}>")
            );
        }
    }

    fn zip_longest<A: Iterator, B: Iterator>(
        a: A,
        b: B,
    ) -> impl Iterator<Item = (Option<A::Item>, Option<B::Item>)> {
        let mut a = a.map(Some).collect::<Vec<_>>();
        let mut b = b.map(Some).collect::<Vec<_>>();
        let len = a.len().max(b.len());
        a.resize_with(len, || None);
        b.resize_with(len, || None);
        a.into_iter()
            .zip(b)
            .take_while(|(a, b)| a.is_some() || b.is_some())
    }
}
