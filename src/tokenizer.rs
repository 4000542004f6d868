use alloc::borrow::Cow;
use alloc::collections::VecDeque;
use std::io::BufRead;

use memchr::{memchr2, memmem};

use crate::chars::{is_attribute_name_char, is_name_char, is_name_start, is_space};
use crate::entities::{scan_reference, Reference};
use crate::reader::read_to_string;
use crate::{
    Dialect, Mark, Name, Scope, ScopeChain, Token, TokenKind, TokenizerError, DEFAULT_MAX_DEPTH,
};

/// Delimiters of the opaque blocks the tokenizer passes through, in the order
/// they are tried: opening delimiter, closing delimiter, format template.
const UNPARSED_BLOCKS: &[(&str, &str, &str)] = &[
    ("<!--", "-->", "!--{0}--"),
    ("<!", ">", "!{0}"),
    ("<?", "?>", "?{0}?"),
    ("<%--", "--%>", "%--{0}--%"),
    ("<%@", "%>", "%@{0}%"),
    ("<%=", "%>", "%={0}%"),
    ("<%!", "%>", "%!{0}%"),
    ("<%#", "%>", "%#{0}%"),
    ("<%$", "%>", "%${0}%"),
    ("<%", "%>", "%{0}%"),
];

const CDATA_OPEN: &str = "<![CDATA[";
const CDATA_CLOSE: &str = "]]>";

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "basefont", "br", "col", "embed", "frame", "hr", "img", "input", "isindex",
    "keygen", "link", "meta", "param", "source", "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Is `local_name` an HTML element that never has content?
pub fn is_void_element(local_name: &str) -> bool {
    VOID_ELEMENTS
        .iter()
        .any(|void| void.eq_ignore_ascii_case(local_name))
}

/// Is `local_name` an HTML element whose content is taken verbatim?
pub fn is_raw_text_element(local_name: &str) -> bool {
    RAW_TEXT_ELEMENTS
        .iter()
        .any(|raw| raw.eq_ignore_ascii_case(local_name))
}

/// The markup tokenizer.
///
/// A tokenizer is configured once and then fed one input at a time, either
/// through [`Tokenizer::tokenize`] or by setting an input and iterating.
/// Every run starts from an empty [`ScopeChain`].
///
/// ```
/// # use markup_stream::{Name, Token, Tokenizer};
/// let tokens = Tokenizer::new().tokenize("<p class=x>hi</p>").unwrap();
/// assert_eq!(tokens[0], Token::ElementBegin(Name::new("p")));
/// assert_eq!(tokens[2], Token::Text(String::from("x")));
/// ```
pub struct Tokenizer<'r> {
    read_handler: Option<&'r mut dyn BufRead>,
    input: Cow<'r, str>,
    /// Byte offset of the next unread character.
    pos: usize,
    dialect: Dialect,
    auto_balance_tags: bool,
    error_recovery: bool,
    max_depth: usize,
    scopes: ScopeChain,
    /// Start offsets of the open elements, parallel to `scopes`.
    marks: Vec<usize>,
    tokens: VecDeque<Token>,
    /// Character data not yet emitted.
    text: String,
    /// Lowercased name of the raw text element whose content comes next.
    raw_text: Option<String>,
    stream_start_produced: bool,
    stream_end_produced: bool,
    failed: bool,
}

/// An attribute as written, before namespace resolution.
struct RawAttribute {
    qname: String,
    value: Token,
}

impl Default for Tokenizer<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'r> Tokenizer<'r> {
    /// Create a tokenizer for the [`Dialect::Html`] dialect.
    pub fn new() -> Tokenizer<'r> {
        Tokenizer {
            read_handler: None,
            input: Cow::Borrowed(""),
            pos: 0,
            dialect: Dialect::default(),
            auto_balance_tags: false,
            error_recovery: true,
            max_depth: DEFAULT_MAX_DEPTH,
            scopes: ScopeChain::new(),
            marks: Vec::with_capacity(16),
            tokens: VecDeque::with_capacity(16),
            text: String::new(),
            raw_text: None,
            stream_start_produced: false,
            stream_end_produced: false,
            failed: false,
        }
    }

    /// Set the markup dialect.
    pub fn set_dialect(&mut self, dialect: Dialect) {
        self.dialect = dialect;
    }

    /// Synthesize close tags for open elements skipped by a close tag, ignore
    /// close tags of elements that are not open, and close everything still
    /// open at the end of input.
    pub fn set_auto_balance_tags(&mut self, auto_balance_tags: bool) {
        self.auto_balance_tags = auto_balance_tags;
    }

    /// In the [`Dialect::Xml`] dialect, raise an error instead of recovering
    /// from mismatched close tags, malformed references, duplicate
    /// declarations and unclosed elements.
    pub fn set_error_recovery(&mut self, error_recovery: bool) {
        self.error_recovery = error_recovery;
    }

    /// Set the nesting limit.
    pub fn set_max_depth(&mut self, max_depth: usize) {
        self.max_depth = max_depth;
    }

    /// Set a string input.
    pub fn set_input_string(&mut self, input: &'r str) {
        self.reset();
        self.input = Cow::Borrowed(input);
    }

    /// Set a byte-stream input. A leading byte order mark selects UTF-16.
    pub fn set_input(&mut self, input: &'r mut dyn BufRead) {
        self.reset();
        self.read_handler = Some(input);
    }

    /// Tokenize `input` to completion.
    pub fn tokenize(&mut self, input: &'r str) -> Result<Vec<Token>, TokenizerError> {
        self.set_input_string(input);
        self.collect_tokens()
    }

    /// Tokenize a byte stream to completion.
    pub fn tokenize_reader(
        &mut self,
        input: &'r mut dyn BufRead,
    ) -> Result<Vec<Token>, TokenizerError> {
        self.set_input(input);
        self.collect_tokens()
    }

    /// Number of elements currently open.
    pub fn depth(&self) -> usize {
        self.scopes.depth()
    }

    /// The open scopes.
    pub fn scopes(&self) -> &ScopeChain {
        &self.scopes
    }

    fn reset(&mut self) {
        self.read_handler = None;
        self.input = Cow::Borrowed("");
        self.pos = 0;
        self.scopes.clear();
        self.marks.clear();
        self.tokens.clear();
        self.text.clear();
        self.raw_text = None;
        self.stream_start_produced = false;
        self.stream_end_produced = false;
        self.failed = false;
    }

    fn collect_tokens(&mut self) -> Result<Vec<Token>, TokenizerError> {
        let mut tokens = Vec::new();
        for token in self.by_ref() {
            tokens.push(token?);
        }
        Ok(tokens)
    }

    fn is_strict(&self) -> bool {
        self.dialect == Dialect::Xml && !self.error_recovery
    }

    /// Position of byte offset `index`.
    fn mark(&self, index: usize) -> Mark {
        let index = index.min(self.input.len());
        let before = &self.input.as_bytes()[..index];
        let line_start = memchr::memrchr(b'\n', before).map_or(0, |newline| newline + 1);
        Mark {
            index: index as u64,
            line: memchr::memchr_iter(b'\n', before).count() as u64 + 1,
            column: self.input[line_start..index].chars().count() as u64 + 1,
        }
    }

    fn set_tokenizer_error<T>(
        &self,
        context: &'static str,
        context_index: usize,
        problem: &'static str,
        problem_index: usize,
        token: TokenKind,
    ) -> Result<T, TokenizerError> {
        Err(TokenizerError::Problem {
            context,
            context_mark: self.mark(context_index),
            problem,
            problem_mark: self.mark(problem_index),
            token,
        })
    }

    fn rest(&self) -> &str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn skip(&mut self) {
        if let Some(ch) = self.peek() {
            self.pos += ch.len_utf8();
        }
    }

    fn skip_space(&mut self) {
        while is_space(self.peek()) {
            self.skip();
        }
    }

    /// Take the run of characters matching `accept`.
    fn scan_while(&mut self, accept: fn(char) -> bool) -> String {
        let length = self
            .rest()
            .char_indices()
            .find(|(_, ch)| !accept(*ch))
            .map_or(self.rest().len(), |(offset, _)| offset);
        let value = String::from(&self.rest()[..length]);
        self.pos += length;
        value
    }

    fn push_token(&mut self, token: Token) {
        self.tokens.push_back(token);
    }

    fn flush_text(&mut self) {
        if !self.text.is_empty() {
            let value = core::mem::take(&mut self.text);
            self.push_token(Token::text(value));
        }
    }

    fn fetch_stream_start(&mut self) -> Result<(), TokenizerError> {
        if let Some(reader) = self.read_handler.take() {
            self.input = Cow::Owned(read_to_string(reader)?);
        }
        self.stream_start_produced = true;
        Ok(())
    }

    fn fetch_more_tokens(&mut self) -> Result<(), TokenizerError> {
        if !self.stream_start_produced {
            return self.fetch_stream_start();
        }
        if let Some(tag_name) = self.raw_text.take() {
            self.scan_raw_text(&tag_name);
            return Ok(());
        }

        match memchr2(b'<', b'&', self.rest().as_bytes()) {
            None => {
                self.text.push_str(&self.input[self.pos..]);
                self.pos = self.input.len();
                self.fetch_stream_end()
            }
            Some(offset) => {
                let end = self.pos + offset;
                self.text.push_str(&self.input[self.pos..end]);
                self.pos = end;
                if self.input.as_bytes()[end] == b'&' {
                    self.scan_reference()
                } else {
                    self.scan_markup()
                }
            }
        }
    }

    fn fetch_stream_end(&mut self) -> Result<(), TokenizerError> {
        self.flush_text();
        if self.auto_balance_tags && !self.is_strict() {
            while !self.scopes.is_empty() {
                log::debug!(target: "markup.tokenizer", "closing unclosed element at end of input");
                self.pop_element();
            }
        } else if self.is_strict() {
            if let Some(&start) = self.marks.last() {
                return self.set_tokenizer_error(
                    "while scanning an element",
                    start,
                    "found unexpected end of stream",
                    self.pos,
                    TokenKind::ElementBegin,
                );
            }
        }
        self.stream_end_produced = true;
        Ok(())
    }

    fn scan_reference(&mut self) -> Result<(), TokenizerError> {
        match scan_reference(self.rest(), self.dialect) {
            Reference::Char(ch, consumed) => {
                self.text.push(ch);
                self.pos += consumed;
            }
            Reference::Literal(consumed) => {
                if self.is_strict() {
                    return self.set_tokenizer_error(
                        "while scanning a character reference",
                        self.pos,
                        "found an unknown or malformed reference",
                        self.pos + consumed,
                        TokenKind::Text,
                    );
                }
                let literal = &self.input[self.pos..self.pos + consumed];
                log::debug!(target: "markup.tokenizer", "keeping malformed reference {literal:?} as text");
                self.text.push_str(literal);
                self.pos += consumed;
            }
        }
        Ok(())
    }

    /// Decode the references in an attribute value whose first byte is at
    /// offset `start` of the input.
    fn decode_value(&self, raw: &str, start: usize) -> Result<String, TokenizerError> {
        let mut value = String::with_capacity(raw.len());
        let mut pos = 0;
        while let Some(offset) = memchr::memchr(b'&', &raw.as_bytes()[pos..]) {
            value.push_str(&raw[pos..pos + offset]);
            pos += offset;
            match scan_reference(&raw[pos..], self.dialect) {
                Reference::Char(ch, consumed) => {
                    value.push(ch);
                    pos += consumed;
                }
                Reference::Literal(consumed) => {
                    if self.is_strict() {
                        return self.set_tokenizer_error(
                            "while scanning an attribute value",
                            start,
                            "found an unknown or malformed reference",
                            start + pos,
                            TokenKind::Attribute,
                        );
                    }
                    value.push_str(&raw[pos..pos + consumed]);
                    pos += consumed;
                }
            }
        }
        value.push_str(&raw[pos..]);
        Ok(value)
    }

    fn scan_markup(&mut self) -> Result<(), TokenizerError> {
        let rest = self.rest();
        if rest.starts_with(CDATA_OPEN) {
            return self.scan_cdata();
        }
        if let Some(&(open, close, format)) = UNPARSED_BLOCKS
            .iter()
            .find(|(open, _, _)| rest.starts_with(open))
        {
            return self.scan_unparsed(open, close, format);
        }
        match (self.peek_at(1), self.peek_at(2)) {
            (Some('/'), Some(ch)) if is_name_start(ch) => self.scan_end_tag(),
            (Some(ch), _) if is_name_start(ch) => self.scan_start_tag(),
            _ => {
                log::debug!(target: "markup.tokenizer", "keeping stray '<' as text");
                self.text.push('<');
                self.pos += 1;
                Ok(())
            }
        }
    }

    fn scan_unparsed(
        &mut self,
        open: &str,
        close: &str,
        format: &'static str,
    ) -> Result<(), TokenizerError> {
        let start = self.pos;
        let content_start = start + open.len();
        let Some(length) = memmem::find(self.input[content_start..].as_bytes(), close.as_bytes())
        else {
            return self.set_tokenizer_error(
                "while scanning an unparsed block",
                start,
                "found unexpected end of stream",
                self.input.len(),
                TokenKind::None,
            );
        };
        self.flush_text();
        let value = String::from(&self.input[content_start..content_start + length]);
        self.push_token(Token::unparsed(format, value));
        self.pos = content_start + length + close.len();
        Ok(())
    }

    fn scan_cdata(&mut self) -> Result<(), TokenizerError> {
        let start = self.pos;
        let content_start = start + CDATA_OPEN.len();
        let Some(length) =
            memmem::find(self.input[content_start..].as_bytes(), CDATA_CLOSE.as_bytes())
        else {
            return self.set_tokenizer_error(
                "while scanning a CDATA section",
                start,
                "found unexpected end of stream",
                self.input.len(),
                TokenKind::None,
            );
        };
        self.text
            .push_str(&self.input[content_start..content_start + length]);
        self.pos = content_start + length + CDATA_CLOSE.len();
        Ok(())
    }

    fn scan_raw_text(&mut self, tag_name: &str) {
        let bytes = self.input.as_bytes();
        let mut search = self.pos;
        let end = loop {
            let Some(offset) = memmem::find(&bytes[search..], b"</") else {
                break self.input.len();
            };
            let candidate = search + offset;
            let name_end = candidate + 2 + tag_name.len();
            let matches = bytes
                .get(candidate + 2..name_end)
                .is_some_and(|name| name.eq_ignore_ascii_case(tag_name.as_bytes()))
                && !self.input[name_end..]
                    .chars()
                    .next()
                    .is_some_and(is_name_char);
            if matches {
                break candidate;
            }
            search = candidate + 2;
        };
        self.text.push_str(&self.input[self.pos..end]);
        self.pos = end;
    }

    fn scan_start_tag(&mut self) -> Result<(), TokenizerError> {
        let start = self.pos;
        self.pos += 1;
        let qname = self.scan_while(is_name_char);

        let mut attributes = Vec::new();
        let mut declarations: Vec<(String, String)> = Vec::new();
        let void = loop {
            self.skip_space();
            match self.peek() {
                None => {
                    return self.set_tokenizer_error(
                        "while scanning a start tag",
                        start,
                        "found unexpected end of stream",
                        self.pos,
                        TokenKind::None,
                    );
                }
                Some('>') => {
                    self.pos += 1;
                    break false;
                }
                Some('/') if self.peek_at(1) == Some('>') => {
                    self.pos += 2;
                    break true;
                }
                Some(ch) if is_attribute_name_char(ch) => {
                    let attribute = self.scan_attribute(start)?;
                    self.divert_declaration(attribute, &mut attributes, &mut declarations)?;
                }
                Some(_) => {
                    if self.is_strict() {
                        return self.set_tokenizer_error(
                            "while scanning a start tag",
                            start,
                            "found unexpected character",
                            self.pos,
                            TokenKind::None,
                        );
                    }
                    self.skip();
                }
            }
        };

        if self.scopes.depth() >= self.max_depth {
            return self.set_tokenizer_error(
                "while scanning a start tag",
                start,
                "exceeded the maximum nesting depth",
                start,
                TokenKind::ElementBegin,
            );
        }

        let mut scope = Scope::new(Name::default());
        for (prefix, namespace) in &declarations {
            scope.bind(prefix, namespace);
        }
        self.scopes.push(scope);
        self.marks.push(start);

        let name = self.resolve_name(&qname, false);
        let is_html = self.dialect == Dialect::Html && name.prefix.is_empty();
        let void = void || (is_html && is_void_element(&name.local_name));
        if is_html && !void && is_raw_text_element(&name.local_name) {
            self.raw_text = Some(name.local_name.to_ascii_lowercase());
        }
        if let Some(scope) = self.scopes.peek_mut() {
            scope.tag_name = name.clone();
        }

        self.flush_text();
        if self.dialect == Dialect::Xml {
            for (prefix, namespace) in &declarations {
                self.push_token(Token::prefix_begin(prefix, namespace));
            }
        }
        self.push_token(if void {
            Token::ElementVoid(name)
        } else {
            Token::ElementBegin(name)
        });
        for attribute in attributes {
            let name = self.resolve_name(&attribute.qname, true);
            self.push_token(Token::Attribute(name));
            self.push_token(attribute.value);
        }
        if void {
            self.pop_scope();
        }
        Ok(())
    }

    fn scan_attribute(&mut self, start: usize) -> Result<RawAttribute, TokenizerError> {
        let qname = self.scan_while(is_attribute_name_char);
        self.skip_space();
        if self.peek() != Some('=') {
            return Ok(RawAttribute {
                qname,
                value: Token::Text(String::new()),
            });
        }
        self.pos += 1;
        self.skip_space();

        let value_start = self.pos;
        let (content_start, raw) = match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                let content_start = self.pos + 1;
                let Some(length) = self.input[content_start..].find(quote) else {
                    return self.set_tokenizer_error(
                        "while scanning an attribute value",
                        value_start,
                        "found unexpected end of stream",
                        self.input.len(),
                        TokenKind::Attribute,
                    );
                };
                self.pos = content_start + length + 1;
                let raw = String::from(&self.input[content_start..content_start + length]);
                (content_start, raw)
            }
            _ => (value_start, self.scan_unquoted_value(start)?),
        };

        let value = match code_block(&raw) {
            Some((format, content)) => Token::unparsed(format, content),
            None => Token::Text(self.decode_value(&raw, content_start)?),
        };
        Ok(RawAttribute { qname, value })
    }

    fn scan_unquoted_value(&mut self, start: usize) -> Result<String, TokenizerError> {
        let value_start = self.pos;
        if self.rest().starts_with("<%") {
            let Some(length) = self.rest().find("%>") else {
                return self.set_tokenizer_error(
                    "while scanning a start tag",
                    start,
                    "found unexpected end of stream",
                    self.input.len(),
                    TokenKind::Attribute,
                );
            };
            self.pos += length + 2;
        }
        while let Some(ch) = self.peek() {
            if is_space(ch) || ch == '>' || (ch == '/' && self.peek_at(1) == Some('>')) {
                break;
            }
            self.pos += ch.len_utf8();
        }
        Ok(String::from(&self.input[value_start..self.pos]))
    }

    /// Move `xmlns` and `xmlns:prefix` attributes into `declarations`.
    fn divert_declaration(
        &self,
        attribute: RawAttribute,
        attributes: &mut Vec<RawAttribute>,
        declarations: &mut Vec<(String, String)>,
    ) -> Result<(), TokenizerError> {
        let prefix = match Name::split_qualified(&attribute.qname) {
            ("", "xmlns") => Some(String::new()),
            ("xmlns", local) => Some(String::from(local)),
            _ => None,
        };
        let namespace = match &attribute.value {
            Token::Text(namespace) => Some(namespace.clone()),
            _ => None,
        };
        let (Some(prefix), Some(namespace)) = (prefix, namespace) else {
            attributes.push(attribute);
            return Ok(());
        };
        if declarations.iter().any(|(declared, _)| *declared == prefix) {
            if self.is_strict() {
                return self.set_tokenizer_error(
                    "while scanning a start tag",
                    self.pos,
                    "found duplicate namespace declaration",
                    self.pos,
                    TokenKind::PrefixBegin,
                );
            }
            log::debug!(target: "markup.tokenizer", "ignoring duplicate declaration of prefix {prefix:?}");
            return Ok(());
        }
        declarations.push((prefix, namespace));
        Ok(())
    }

    /// Resolve a qualified name against the open scopes.
    fn resolve_name(&self, qname: &str, is_attribute: bool) -> Name {
        let (prefix, local_name) = Name::split_qualified(qname);
        let namespace = if prefix.is_empty() {
            if is_attribute {
                ""
            } else {
                self.scopes.get_namespace("").unwrap_or_default()
            }
        } else if let Some(namespace) = self.scopes.get_namespace(prefix) {
            namespace
        } else {
            match self.dialect {
                Dialect::Html => {
                    log::debug!(target: "markup.tokenizer", "prefix {prefix:?} is not declared");
                    ""
                }
                Dialect::Xml => {
                    log::debug!(target: "markup.tokenizer", "keeping undeclared name {qname:?} unresolved");
                    return Name {
                        local_name: String::from(qname),
                        is_attribute,
                        ..Name::default()
                    };
                }
            }
        };
        let mut name = Name::with_namespace(local_name, prefix, namespace);
        name.is_attribute = is_attribute;
        name
    }

    fn scan_end_tag(&mut self) -> Result<(), TokenizerError> {
        let start = self.pos;
        self.pos += 2;
        let qname = self.scan_while(is_name_char);

        // Anything between the name and '>' is discarded.
        loop {
            match self.peek() {
                None => {
                    return self.set_tokenizer_error(
                        "while scanning an end tag",
                        start,
                        "found unexpected end of stream",
                        self.pos,
                        TokenKind::None,
                    );
                }
                Some('>') => {
                    self.pos += 1;
                    break;
                }
                Some(quote @ ('"' | '\'')) => match self.input[self.pos + 1..].find(quote) {
                    Some(length) => self.pos += length + 2,
                    None => self.pos = self.input.len(),
                },
                Some(ch) => self.pos += ch.len_utf8(),
            }
        }

        let name = self.resolve_name(&qname, false);
        self.flush_text();
        self.close_element(name, start)
    }

    fn close_element(&mut self, name: Name, start: usize) -> Result<(), TokenizerError> {
        let distance = self.scopes.find(&name);
        if self.is_strict() && distance != Some(0) {
            let context = self.marks.last().copied().unwrap_or(start);
            return self.set_tokenizer_error(
                "while closing an element",
                context,
                "found mismatched end tag",
                start,
                TokenKind::ElementEnd,
            );
        }
        match distance {
            Some(distance) if self.auto_balance_tags => {
                for _ in 0..distance {
                    log::debug!(target: "markup.tokenizer", "closing element skipped by </{name}>");
                    self.pop_element();
                }
                self.pop_element();
            }
            None if self.auto_balance_tags => {
                log::debug!(target: "markup.tokenizer", "ignoring </{name}> without open element");
            }
            Some(0) => self.pop_element(),
            _ => {
                log::debug!(target: "markup.tokenizer", "keeping unbalanced </{name}>");
                self.push_token(Token::ElementEnd(name));
            }
        }
        Ok(())
    }

    /// Close the innermost element, emitting its end token.
    fn pop_element(&mut self) {
        if let Some(name) = self.scopes.peek().map(|scope| scope.tag_name.clone()) {
            self.push_token(Token::ElementEnd(name));
            self.pop_scope();
        }
    }

    fn pop_scope(&mut self) {
        self.marks.pop();
        let Some(scope) = self.scopes.pop() else {
            return;
        };
        if self.dialect == Dialect::Xml {
            for (prefix, namespace) in scope.bindings().rev() {
                self.tokens.push_back(Token::prefix_end(prefix, namespace));
            }
        }
    }
}

/// Split an attribute value consisting of exactly one code block into its
/// format template and content.
fn code_block(raw: &str) -> Option<(&'static str, &str)> {
    UNPARSED_BLOCKS
        .iter()
        .filter(|(open, _, _)| open.starts_with("<%"))
        .find(|(open, _, _)| raw.starts_with(open))
        .and_then(|&(open, close, format)| {
            let content = raw[open.len()..].strip_suffix(close)?;
            (!content.contains(close)).then_some((format, content))
        })
}

impl Iterator for Tokenizer<'_> {
    type Item = Result<Token, TokenizerError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(token) = self.tokens.pop_front() {
                log::trace!(target: "markup.tokenizer", "{}: {token:?}", token.kind());
                return Some(Ok(token));
            }
            if self.failed || self.stream_end_produced {
                return None;
            }
            if let Err(err) = self.fetch_more_tokens() {
                self.failed = true;
                self.tokens.clear();
                return Some(Err(err));
            }
        }
    }
}

impl core::iter::FusedIterator for Tokenizer<'_> {}
