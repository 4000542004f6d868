use alloc::borrow::Cow;
use core::fmt;

use crate::chars::is_blank_str;
use crate::Name;

/// The token structure.
///
/// Markup is represented as a flat sequence of tokens. Elements are bracketed
/// by [`Token::ElementBegin`] and [`Token::ElementEnd`]; attributes are a
/// [`Token::Attribute`] key immediately followed by exactly one value token.
#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    /// An opening tag that requires a matching [`Token::ElementEnd`].
    ElementBegin(Name),
    /// A self-closing tag.
    ElementVoid(Name),
    /// A closing tag.
    ///
    /// Tokenizers always fill in the name being closed. Producers feeding a
    /// formatter may pass [`Name::default()`] and rely on its element stack.
    ElementEnd(Name),
    /// An attribute key. The next token carries its value.
    Attribute(Name),
    /// Decoded character data.
    Text(String),
    /// Character data consisting only of whitespace.
    Whitespace(String),
    /// The start of a namespace binding, ahead of the element declaring it.
    PrefixBegin {
        /// The bound prefix, empty for the default namespace.
        prefix: String,
        /// The namespace URI.
        namespace: String,
    },
    /// The end of a namespace binding, after the element declaring it.
    PrefixEnd {
        /// The bound prefix, empty for the default namespace.
        prefix: String,
        /// The namespace URI.
        namespace: String,
    },
    /// An opaque foreign block, such as a comment or embedded code.
    Unparsed {
        /// A template with a single `{0}` hole reproducing the delimiters
        /// inside the surrounding `<` and `>`, e.g. `!--{0}--`.
        format: Cow<'static, str>,
        /// The raw content between the delimiters.
        value: String,
    },
}

/// The kind of a token, without its payload.
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[non_exhaustive]
pub enum TokenKind {
    /// No token: end of stream, or nothing complete yet.
    #[default]
    None,
    /// An ELEMENT-BEGIN token.
    ElementBegin,
    /// An ELEMENT-VOID token.
    ElementVoid,
    /// An ELEMENT-END token.
    ElementEnd,
    /// An ATTRIBUTE token.
    Attribute,
    /// A TEXT token.
    Text,
    /// A WHITESPACE token.
    Whitespace,
    /// A PREFIX-BEGIN token.
    PrefixBegin,
    /// A PREFIX-END token.
    PrefixEnd,
    /// An UNPARSED token.
    Unparsed,
}

impl Token {
    /// Create a TEXT token, or a WHITESPACE token if `value` is all
    /// whitespace.
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if is_blank_str(&value) {
            Token::Whitespace(value)
        } else {
            Token::Text(value)
        }
    }

    /// Create an UNPARSED token from a `{0}` template and its content.
    pub fn unparsed(format: impl Into<Cow<'static, str>>, value: impl Into<String>) -> Self {
        Token::Unparsed {
            format: format.into(),
            value: value.into(),
        }
    }

    /// Create a PREFIX-BEGIN token.
    pub fn prefix_begin(prefix: &str, namespace: &str) -> Self {
        Token::PrefixBegin {
            prefix: String::from(prefix),
            namespace: String::from(namespace),
        }
    }

    /// Create a PREFIX-END token.
    pub fn prefix_end(prefix: &str, namespace: &str) -> Self {
        Token::PrefixEnd {
            prefix: String::from(prefix),
            namespace: String::from(namespace),
        }
    }

    /// The kind of this token.
    pub fn kind(&self) -> TokenKind {
        match self {
            Token::ElementBegin(_) => TokenKind::ElementBegin,
            Token::ElementVoid(_) => TokenKind::ElementVoid,
            Token::ElementEnd(_) => TokenKind::ElementEnd,
            Token::Attribute(_) => TokenKind::Attribute,
            Token::Text(_) => TokenKind::Text,
            Token::Whitespace(_) => TokenKind::Whitespace,
            Token::PrefixBegin { .. } => TokenKind::PrefixBegin,
            Token::PrefixEnd { .. } => TokenKind::PrefixEnd,
            Token::Unparsed { .. } => TokenKind::Unparsed,
        }
    }

    /// The name carried by element and attribute tokens.
    pub fn name(&self) -> Option<&Name> {
        match self {
            Token::ElementBegin(name)
            | Token::ElementVoid(name)
            | Token::ElementEnd(name)
            | Token::Attribute(name) => Some(name),
            _ => None,
        }
    }

    /// Can this token be the value of an attribute?
    pub fn is_value(&self) -> bool {
        matches!(
            self,
            Token::Text(_) | Token::Whitespace(_) | Token::Unparsed { .. }
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TokenKind::None => "NONE",
            TokenKind::ElementBegin => "ELEMENT-BEGIN",
            TokenKind::ElementVoid => "ELEMENT-VOID",
            TokenKind::ElementEnd => "ELEMENT-END",
            TokenKind::Attribute => "ATTRIBUTE",
            TokenKind::Text => "TEXT",
            TokenKind::Whitespace => "WHITESPACE",
            TokenKind::PrefixBegin => "PREFIX-BEGIN",
            TokenKind::PrefixEnd => "PREFIX-END",
            TokenKind::Unparsed => "UNPARSED",
        })
    }
}
