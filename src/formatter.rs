use crate::chars::is_control;
use crate::writer::Output;
use crate::{
    is_raw_text_element, Dialect, EmptyAttributes, Encoding, FormatterError, Mark, Name, Scope,
    ScopeChain, Token, TokenKind, WriterError, DEFAULT_MAX_DEPTH, OUTPUT_BUFFER_SIZE,
    XMLNS_NAMESPACE, XML_NAMESPACE,
};

/// The formatter states.
#[derive(Copy, Clone, Default, PartialEq, Eq, Debug)]
enum FormatterState {
    /// Expect content: elements, text or blocks.
    #[default]
    Content,
    /// A start tag is open and takes attributes.
    StartTag,
    /// The value of the last attribute comes next.
    AttributeValue,
    /// Expect nothing.
    End,
}

/// A start tag whose attributes are still arriving.
struct PendingTag {
    name: Name,
    void: bool,
    attributes: Vec<(Name, Token)>,
    attribute: Option<Name>,
}

/// The markup formatter, the inverse of [`Tokenizer`](crate::Tokenizer).
///
/// Tokens are fed one at a time through [`Formatter::emit`] and the stream
/// is completed with [`Formatter::finish`], or a whole slice is formatted at
/// once with [`Formatter::format`]. Namespace declarations are computed from
/// the names themselves: a binding is written only on the outermost element
/// that needs it.
///
/// ```
/// # use markup_stream::{Formatter, Name, Token};
/// let tokens = [
///     Token::ElementBegin(Name::with_namespace("doc", "", "urn:d")),
///     Token::ElementVoid(Name::with_namespace("item", "", "urn:d")),
///     Token::ElementEnd(Name::default()),
/// ];
/// let output = Formatter::new().format(&tokens).unwrap();
/// assert_eq!(output, r#"<doc xmlns="urn:d"><item /></doc>"#);
/// ```
pub struct Formatter<'w> {
    output: Output<'w>,
    /// The working buffer, flushed to the output when full.
    buffer: String,
    dialect: Dialect,
    canonical: bool,
    empty_attributes: EmptyAttributes,
    encode_non_ascii: bool,
    max_depth: usize,
    scopes: ScopeChain,
    state: FormatterState,
    pending: Option<PendingTag>,
    /// Bindings announced by `PrefixBegin` for the next element.
    declarations: Vec<(String, String)>,
    /// Index of the next token.
    index: usize,
    /// Position in the output.
    mark: Mark,
}

impl Default for Formatter<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'w> Formatter<'w> {
    /// Create a formatter for the [`Dialect::Html`] dialect.
    pub fn new() -> Formatter<'w> {
        Formatter {
            output: Output::default(),
            buffer: String::with_capacity(OUTPUT_BUFFER_SIZE),
            dialect: Dialect::default(),
            canonical: false,
            empty_attributes: EmptyAttributes::default(),
            encode_non_ascii: false,
            max_depth: DEFAULT_MAX_DEPTH,
            scopes: ScopeChain::new(),
            state: FormatterState::default(),
            pending: None,
            declarations: Vec::new(),
            index: 0,
            mark: Mark::default(),
        }
    }

    /// Set the markup dialect.
    pub fn set_dialect(&mut self, dialect: Dialect) {
        self.dialect = dialect;
    }

    /// Set if the output should be in the canonical form: sorted
    /// attributes, expanded void elements, normalized line endings and
    /// stricter attribute escaping.
    pub fn set_canonical(&mut self, canonical: bool) {
        self.canonical = canonical;
    }

    /// Set how attributes with an empty value are written.
    pub fn set_empty_attributes(&mut self, empty_attributes: EmptyAttributes) {
        self.empty_attributes = empty_attributes;
    }

    /// Set if characters above U+007E are written as character references.
    pub fn set_encode_non_ascii(&mut self, encode_non_ascii: bool) {
        self.encode_non_ascii = encode_non_ascii;
    }

    /// Set the output encoding. Applies to writer output only.
    pub fn set_encoding(&mut self, encoding: Encoding) {
        self.output.set_encoding(encoding);
    }

    /// Set the nesting limit.
    pub fn set_max_depth(&mut self, max_depth: usize) {
        self.max_depth = max_depth;
    }

    /// Set a generic output handler.
    pub fn set_output(&mut self, handler: &'w mut dyn std::io::Write) {
        self.output.set_handler(handler);
    }

    /// Start a new stream, keeping settings and output.
    pub fn reset(&mut self) {
        self.output.reset();
        self.buffer.clear();
        self.scopes.clear();
        self.state = FormatterState::Content;
        self.pending = None;
        self.declarations.clear();
        self.index = 0;
        self.mark = Mark::default();
    }

    /// Number of elements currently open.
    pub fn depth(&self) -> usize {
        self.scopes.depth()
    }

    /// Format a complete token stream.
    ///
    /// Without an output handler the markup is returned; with one it is
    /// written there and the returned string is empty.
    pub fn format(&mut self, tokens: &[Token]) -> Result<String, FormatterError> {
        self.reset();
        for token in tokens {
            self.emit(token)?;
        }
        self.finish()?;
        Ok(core::mem::take(&mut self.buffer))
    }

    /// Emit one token.
    pub fn emit(&mut self, token: &Token) -> Result<(), FormatterError> {
        log::trace!(target: "markup.formatter", "{}: {token:?}", token.kind());
        let result = self.state_machine(token);
        self.index += 1;
        result
    }

    /// Complete the stream and flush the output.
    ///
    /// Elements still open are left open.
    pub fn finish(&mut self) -> Result<(), FormatterError> {
        match self.state {
            FormatterState::StartTag => self.write_start_tag()?,
            FormatterState::AttributeValue => {
                return self.set_formatter_error("expected an attribute value", TokenKind::None);
            }
            FormatterState::Content | FormatterState::End => {}
        }
        self.state = FormatterState::End;
        self.flush()?;
        Ok(())
    }

    /// Flush the working buffer to the output handler, if any.
    pub fn flush(&mut self) -> Result<(), WriterError> {
        self.output.flush(&mut self.buffer)
    }

    fn set_formatter_error<T>(
        &self,
        problem: &'static str,
        token: TokenKind,
    ) -> Result<T, FormatterError> {
        Err(FormatterError::Problem {
            problem,
            index: self.index,
            mark: self.mark,
            token,
        })
    }

    fn state_machine(&mut self, token: &Token) -> Result<(), FormatterError> {
        match self.state {
            FormatterState::Content => self.emit_content(token),
            FormatterState::StartTag => {
                if let Token::Attribute(name) = token {
                    if let Some(pending) = self.pending.as_mut() {
                        let mut name = name.clone();
                        name.is_attribute = true;
                        pending.attribute = Some(name);
                    }
                    self.state = FormatterState::AttributeValue;
                    return Ok(());
                }
                self.write_start_tag()?;
                self.emit_content(token)
            }
            FormatterState::AttributeValue => {
                if !token.is_value() {
                    return self.set_formatter_error("expected an attribute value", token.kind());
                }
                if let Some(pending) = self.pending.as_mut() {
                    if let Some(name) = pending.attribute.take() {
                        pending.attributes.push((name, token.clone()));
                    }
                }
                self.state = FormatterState::StartTag;
                Ok(())
            }
            FormatterState::End => self.set_formatter_error("expected nothing", token.kind()),
        }
    }

    fn emit_content(&mut self, token: &Token) -> Result<(), FormatterError> {
        self.state = FormatterState::Content;
        match token {
            Token::ElementBegin(name) | Token::ElementVoid(name) => {
                if self.scopes.depth() >= self.max_depth {
                    return self
                        .set_formatter_error("exceeded the maximum nesting depth", token.kind());
                }
                self.pending = Some(PendingTag {
                    name: name.clone(),
                    void: matches!(token, Token::ElementVoid(_)),
                    attributes: Vec::new(),
                    attribute: None,
                });
                self.state = FormatterState::StartTag;
                Ok(())
            }
            Token::ElementEnd(name) => self.write_end_tag(name),
            Token::Attribute(_) => {
                self.set_formatter_error("found an attribute outside of a start tag", token.kind())
            }
            Token::Text(value) | Token::Whitespace(value) => {
                if self.in_raw_text_element() {
                    self.write_str(value)?;
                } else {
                    self.write_text(value)?;
                }
                Ok(())
            }
            Token::PrefixBegin { prefix, namespace } => {
                if self.dialect == Dialect::Xml {
                    self.declarations.push((prefix.clone(), namespace.clone()));
                }
                Ok(())
            }
            Token::PrefixEnd { .. } => Ok(()),
            Token::Unparsed { format, value } => {
                self.write_unparsed(format, value)?;
                Ok(())
            }
        }
    }

    fn in_raw_text_element(&self) -> bool {
        self.dialect == Dialect::Html
            && self.scopes.peek().is_some_and(|scope| {
                scope.tag_name.prefix.is_empty() && is_raw_text_element(&scope.tag_name.local_name)
            })
    }

    /// Bind `prefix` in the innermost scope unless it already resolves to
    /// `namespace`.
    fn declare(&mut self, prefix: &str, namespace: &str) -> Result<(), FormatterError> {
        if self.scopes.get_namespace(prefix) == Some(namespace) {
            return Ok(());
        }
        let declared_here = self.scopes.peek().and_then(|scope| scope.get(prefix));
        if declared_here.is_some() {
            if self.dialect == Dialect::Xml {
                return self.set_formatter_error(
                    "found conflicting namespace declarations",
                    TokenKind::PrefixBegin,
                );
            }
            log::debug!(target: "markup.formatter", "dropping conflicting declaration of prefix {prefix:?}");
            return Ok(());
        }
        if let Some(scope) = self.scopes.peek_mut() {
            scope.bind(prefix, namespace);
        }
        Ok(())
    }

    /// Choose the prefix an element or attribute is written with, declaring
    /// it in the innermost scope when needed.
    fn resolve_prefix(&mut self, name: &Name) -> Result<String, FormatterError> {
        let token = if name.is_attribute {
            TokenKind::Attribute
        } else {
            TokenKind::ElementBegin
        };
        let namespace = name.namespace.as_str();
        let prefix = name.prefix.as_str();

        if namespace.is_empty() {
            if prefix.is_empty()
                && !name.is_attribute
                && self
                    .scopes
                    .get_namespace("")
                    .is_some_and(|default| !default.is_empty())
            {
                self.declare("", "")?;
            }
            return Ok(String::from(prefix));
        }
        if namespace == XML_NAMESPACE {
            return Ok(String::from("xml"));
        }
        if (!prefix.is_empty() || !name.is_attribute)
            && self.scopes.get_namespace(prefix) == Some(namespace)
        {
            return Ok(String::from(prefix));
        }

        if name.is_attribute {
            if let Some(found) = self
                .scopes
                .get_prefix(namespace, true)
                .filter(|found| !found.is_empty())
            {
                return Ok(found);
            }
        }

        let free = if prefix.is_empty() {
            !name.is_attribute && self.scopes.peek().is_some_and(|scope| scope.get("").is_none())
        } else {
            !self.scopes.contains_prefix(prefix)
        };
        if free {
            self.declare(prefix, namespace)?;
            return Ok(String::from(prefix));
        }

        // Unprefixed attributes always take a fresh prefix.
        let unprefixed_attribute = name.is_attribute && prefix.is_empty();
        if self.dialect == Dialect::Xml && !unprefixed_attribute {
            return self.set_formatter_error("found a prefix bound to a different namespace", token);
        }
        let invented = if prefix.is_empty() {
            self.scopes.next_prefix()
        } else {
            self.scopes.ensure_prefix(prefix, namespace)
        };
        log::debug!(target: "markup.formatter", "writing {name} with prefix {invented:?}");
        self.declare(&invented, namespace)?;
        Ok(invented)
    }

    fn write_start_tag(&mut self) -> Result<(), FormatterError> {
        let Some(mut pending) = self.pending.take() else {
            return Ok(());
        };
        self.state = FormatterState::Content;
        self.scopes.push(Scope::new(Name::default()));

        for (prefix, namespace) in core::mem::take(&mut self.declarations) {
            self.declare(&prefix, &namespace)?;
        }
        let mut attributes = Vec::with_capacity(pending.attributes.len());
        for (name, value) in core::mem::take(&mut pending.attributes) {
            let declaration = match (declaration_prefix(&name), &value) {
                (Some(prefix), Token::Text(namespace) | Token::Whitespace(namespace)) => {
                    Some((String::from(prefix), namespace.clone()))
                }
                _ => None,
            };
            match declaration {
                Some((prefix, namespace)) => self.declare(&prefix, &namespace)?,
                None => attributes.push((name, value)),
            }
        }

        let mut name = pending.name;
        name.prefix = self.resolve_prefix(&name)?;
        for (attribute, _) in &mut attributes {
            attribute.prefix = self.resolve_prefix(attribute)?;
        }
        if self.canonical {
            attributes.sort_by(|(a, _), (b, _)| a.cmp(b));
        }

        self.write_char('<')?;
        self.write_name(&name)?;
        let mut bindings: Vec<(String, String)> = self
            .scopes
            .peek()
            .map(|scope| {
                scope
                    .bindings()
                    .map(|(prefix, namespace)| (String::from(prefix), String::from(namespace)))
                    .collect()
            })
            .unwrap_or_default();
        bindings.sort();
        for (prefix, namespace) in &bindings {
            if prefix.is_empty() {
                self.write_str(" xmlns=\"")?;
            } else {
                self.write_str(" xmlns:")?;
                self.write_str(prefix)?;
                self.write_str("=\"")?;
            }
            self.write_attribute_value(namespace)?;
            self.write_char('"')?;
        }
        for (attribute, value) in &attributes {
            self.write_attribute(attribute, value)?;
        }

        if let Some(scope) = self.scopes.peek_mut() {
            scope.tag_name = name;
        }
        if pending.void {
            if self.canonical {
                self.write_char('>')?;
                self.write_close_tag()?;
            } else {
                self.write_str(match self.dialect {
                    Dialect::Html => " />",
                    Dialect::Xml => "/>",
                })?;
                self.scopes.pop();
            }
        } else {
            self.write_char('>')?;
        }
        Ok(())
    }

    fn write_attribute(&mut self, name: &Name, value: &Token) -> Result<(), FormatterError> {
        self.write_char(' ')?;
        self.write_name(name)?;
        match value {
            Token::Text(value) | Token::Whitespace(value) if value.is_empty() => {
                match self.empty_attributes {
                    EmptyAttributes::Html => {}
                    EmptyAttributes::Xhtml => {
                        self.write_str("=\"")?;
                        self.write_name(name)?;
                        self.write_char('"')?;
                    }
                    EmptyAttributes::Xml => self.write_str("=\"\"")?,
                }
            }
            Token::Text(value) | Token::Whitespace(value) => {
                self.write_str("=\"")?;
                self.write_attribute_value(value)?;
                self.write_char('"')?;
            }
            Token::Unparsed { format, value } => {
                self.write_str("=\"")?;
                self.write_unparsed(format, value)?;
                self.write_char('"')?;
            }
            _ => {}
        }
        Ok(())
    }

    fn write_end_tag(&mut self, name: &Name) -> Result<(), FormatterError> {
        if !self.scopes.is_empty() {
            return self.write_close_tag();
        }
        match self.dialect {
            Dialect::Html => {
                log::debug!(target: "markup.formatter", "dropping unbalanced end tag </{name}>");
                Ok(())
            }
            Dialect::Xml if name.is_empty() => {
                log::debug!(target: "markup.formatter", "dropping unbalanced unnamed end tag");
                Ok(())
            }
            Dialect::Xml => {
                self.write_str("</")?;
                self.write_name(name)?;
                self.write_char('>')?;
                Ok(())
            }
        }
    }

    /// Close the innermost element.
    fn write_close_tag(&mut self) -> Result<(), FormatterError> {
        let Some(scope) = self.scopes.pop() else {
            return Ok(());
        };
        self.write_str("</")?;
        self.write_name(&scope.tag_name)?;
        self.write_char('>')?;
        Ok(())
    }

    fn write_name(&mut self, name: &Name) -> Result<(), WriterError> {
        if !name.prefix.is_empty() {
            self.write_str(&name.prefix)?;
            self.write_char(':')?;
        }
        self.write_str(&name.local_name)
    }

    fn write_unparsed(&mut self, format: &str, value: &str) -> Result<(), WriterError> {
        self.write_char('<')?;
        self.write_str(&format.replacen("{0}", value, 1))?;
        self.write_char('>')
    }

    fn write_text(&mut self, value: &str) -> Result<(), WriterError> {
        let mut chars = value.chars().peekable();
        while let Some(ch) = chars.next() {
            match ch {
                '<' => self.write_str("&lt;")?,
                '>' => self.write_str("&gt;")?,
                '&' => self.write_str("&amp;")?,
                '\r' if self.canonical => {
                    if chars.peek() != Some(&'\n') {
                        self.write_char('\n')?;
                    }
                }
                ch => self.write_escaped_char(ch)?,
            }
        }
        Ok(())
    }

    fn write_attribute_value(&mut self, value: &str) -> Result<(), WriterError> {
        for ch in value.chars() {
            match ch {
                '<' => self.write_str("&lt;")?,
                '>' => self.write_str("&gt;")?,
                '&' => self.write_str("&amp;")?,
                '"' => self.write_str("&quot;")?,
                '\'' if self.canonical => self.write_str("&apos;")?,
                '\t' if self.canonical => self.write_str("&#x9;")?,
                '\n' if self.canonical => self.write_str("&#xA;")?,
                ch => self.write_escaped_char(ch)?,
            }
        }
        Ok(())
    }

    fn write_escaped_char(&mut self, ch: char) -> Result<(), WriterError> {
        if is_control(ch) || (self.encode_non_ascii && ch >= '\u{7f}') {
            self.write_str(&format!("&#x{:X};", u32::from(ch)))
        } else {
            self.write_char(ch)
        }
    }

    fn flush_if_full(&mut self) -> Result<(), WriterError> {
        if self.buffer.len() < OUTPUT_BUFFER_SIZE - 16 || !self.output.is_attached() {
            Ok(())
        } else {
            self.flush()
        }
    }

    fn advance(&mut self, written: &str) {
        for ch in written.chars() {
            self.mark.index += ch.len_utf8() as u64;
            if ch == '\n' {
                self.mark.line += 1;
                self.mark.column = 1;
            } else {
                self.mark.column += 1;
            }
        }
    }

    fn write_char(&mut self, ch: char) -> Result<(), WriterError> {
        self.flush_if_full()?;
        self.buffer.push(ch);
        self.advance(ch.encode_utf8(&mut [0; 4]));
        Ok(())
    }

    fn write_str(&mut self, string: &str) -> Result<(), WriterError> {
        self.flush_if_full()?;
        self.buffer.push_str(string);
        self.advance(string);
        Ok(())
    }
}

/// The prefix declared by an `xmlns` or `xmlns:prefix` attribute.
fn declaration_prefix(name: &Name) -> Option<&str> {
    if name.namespace == XMLNS_NAMESPACE || name.namespace.is_empty() {
        if name.prefix.is_empty() && name.local_name == "xmlns" {
            return Some("");
        }
        if name.prefix == "xmlns" {
            return Some(&name.local_name);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn format(tokens: &[Token]) -> String {
        Formatter::new().format(tokens).unwrap()
    }

    fn text(value: &str) -> Token {
        Token::Text(String::from(value))
    }

    fn end() -> Token {
        Token::ElementEnd(Name::default())
    }

    #[test]
    fn elements_attributes_and_text() {
        assert_eq!(
            format(&[
                Token::ElementBegin(Name::new("p")),
                Token::Attribute(Name::attribute("title")),
                text("say \"hi\" & 'bye'"),
                text("a < b > c & d"),
                Token::ElementVoid(Name::new("br")),
                end(),
            ]),
            r#"<p title="say &quot;hi&quot; &amp; 'bye'">a &lt; b &gt; c &amp; d<br /></p>"#
        );
    }

    #[test]
    fn unparsed_blocks_are_verbatim() {
        assert_eq!(
            format(&[
                Token::unparsed("!--{0}--", " a quick note "),
                Token::unparsed("%={0}%", " x < y "),
                Token::ElementVoid(Name::new("a")),
                Token::Attribute(Name::attribute("href")),
                Token::unparsed("%={0}%", " url "),
            ]),
            r#"<!-- a quick note --><%= x < y %><a href="<%= url %>" />"#
        );
    }

    #[test]
    fn prefixed_elements_declare_once() {
        let svg = "http://www.w3.org/2000/svg";
        assert_eq!(
            format(&[
                Token::ElementBegin(Name::with_namespace("svg", "s", svg)),
                Token::ElementVoid(Name::with_namespace("rect", "s", svg)),
                Token::Attribute(Name::attribute_with_namespace("href", "x", "urn:link")),
                text("#a"),
                end(),
            ]),
            r##"<s:svg xmlns:s="http://www.w3.org/2000/svg"><s:rect xmlns:x="urn:link" x:href="#a" /></s:svg>"##
        );
    }

    #[test]
    fn empty_namespace_inside_default_namespace() {
        assert_eq!(
            format(&[
                Token::ElementBegin(Name::with_namespace("a", "", "urn:a")),
                Token::ElementVoid(Name::new("b")),
                end(),
            ]),
            r#"<a xmlns="urn:a"><b xmlns="" /></a>"#
        );
    }

    #[test]
    fn default_namespace_may_be_shadowed() {
        assert_eq!(
            format(&[
                Token::ElementBegin(Name::with_namespace("a", "", "urn:a")),
                Token::ElementVoid(Name::with_namespace("b", "", "urn:b")),
                end(),
            ]),
            r#"<a xmlns="urn:a"><b xmlns="urn:b" /></a>"#
        );
    }

    #[test]
    fn second_prefix_for_default_namespace_is_kept() {
        assert_eq!(
            format(&[
                Token::ElementBegin(Name::with_namespace("a", "", "urn:u")),
                Token::ElementVoid(Name::with_namespace("b", "p", "urn:u")),
                end(),
            ]),
            r#"<a xmlns="urn:u"><p:b xmlns:p="urn:u" /></a>"#
        );
    }

    #[test]
    fn conflicting_prefix_is_invented_in_html_and_rejected_in_xml() {
        let tokens = [
            Token::ElementBegin(Name::with_namespace("a", "p", "urn:one")),
            Token::ElementVoid(Name::with_namespace("b", "p", "urn:two")),
            end(),
        ];
        assert_eq!(
            format(&tokens),
            r#"<p:a xmlns:p="urn:one"><q1:b xmlns:q1="urn:two" /></p:a>"#
        );

        let mut formatter = Formatter::new();
        formatter.set_dialect(Dialect::Xml);
        formatter.emit(&tokens[0]).unwrap();
        formatter.emit(&tokens[1]).unwrap();
        let err = formatter.finish().unwrap_err();
        assert_eq!(err.index(), Some(2));
    }

    #[test]
    fn attribute_prefix_conflict_invents_prefix() {
        assert_eq!(
            format(&[
                Token::ElementVoid(Name::with_namespace("a", "p", "urn:one")),
                Token::Attribute(Name::attribute_with_namespace("k", "p", "urn:two")),
                text("v"),
            ]),
            r#"<p:a xmlns:p="urn:one" xmlns:q1="urn:two" q1:k="v" />"#
        );
    }

    #[test]
    fn attribute_token_never_moves_its_element() {
        // The name lacks the attribute flag; the token kind decides.
        let output = format(&[
            Token::ElementVoid(Name::new("foo")),
            Token::Attribute(Name::with_namespace("k", "", "urn:x")),
            text("v"),
        ]);
        assert_eq!(output, r#"<foo xmlns:q1="urn:x" q1:k="v" />"#);

        let tokens = crate::Tokenizer::new().tokenize(&output).unwrap();
        assert_eq!(tokens[0], Token::ElementVoid(Name::new("foo")));
        assert_eq!(
            tokens[1],
            Token::Attribute(Name::attribute_with_namespace("k", "q1", "urn:x"))
        );
    }

    #[test]
    fn xmlns_attributes_are_declarations() {
        assert_eq!(
            format(&[
                Token::ElementBegin(Name::with_namespace("a", "", "urn:a")),
                Token::Attribute(Name::attribute("xmlns")),
                text("urn:a"),
                Token::Attribute(Name::attribute_with_namespace("x", "xmlns", "")),
                text("urn:x"),
                Token::ElementVoid(Name::with_namespace("b", "x", "urn:x")),
                end(),
            ]),
            r#"<a xmlns="urn:a" xmlns:x="urn:x"><x:b /></a>"#
        );
    }

    #[test]
    fn xml_honours_prefix_begin() {
        let mut formatter = Formatter::new();
        formatter.set_dialect(Dialect::Xml);
        let output = formatter
            .format(&[
                Token::prefix_begin("unused", "urn:u"),
                Token::ElementBegin(Name::new("a")),
                Token::ElementVoid(Name::new("b")),
                end(),
                Token::prefix_end("unused", "urn:u"),
            ])
            .unwrap();
        assert_eq!(output, r#"<a xmlns:unused="urn:u"><b/></a>"#);
    }

    #[test]
    fn unbalanced_end_tags_depend_on_dialect() {
        let tokens = [
            Token::ElementVoid(Name::new("a")),
            Token::ElementEnd(Name::new("a")),
            end(),
        ];
        assert_eq!(format(&tokens), "<a />");

        let mut formatter = Formatter::new();
        formatter.set_dialect(Dialect::Xml);
        assert_eq!(formatter.format(&tokens).unwrap(), "<a/></a>");
    }

    #[test]
    fn empty_attribute_styles() {
        let tokens = [
            Token::ElementVoid(Name::new("input")),
            Token::Attribute(Name::attribute("disabled")),
            text(""),
        ];
        let mut formatter = Formatter::new();
        for (style, expected) in [
            (EmptyAttributes::Html, "<input disabled />"),
            (EmptyAttributes::Xhtml, r#"<input disabled="disabled" />"#),
            (EmptyAttributes::Xml, r#"<input disabled="" />"#),
        ] {
            formatter.set_empty_attributes(style);
            assert_eq!(formatter.format(&tokens).unwrap(), expected);
        }
    }

    #[test]
    fn control_and_non_ascii_characters() {
        let tokens = [text("a\u{1}b\tc\u{20ac}")];
        assert_eq!(format(&tokens), "a&#x1;b\tc\u{20ac}");

        let mut formatter = Formatter::new();
        formatter.set_encode_non_ascii(true);
        assert_eq!(formatter.format(&tokens).unwrap(), "a&#x1;b\tc&#x20AC;");
    }

    #[test]
    fn canonical_form() {
        let mut formatter = Formatter::new();
        formatter.set_canonical(true);
        let output = formatter
            .format(&[
                Token::ElementBegin(Name::new("a")),
                Token::Attribute(Name::attribute("z")),
                text("1\n2"),
                Token::Attribute(Name::attribute_with_namespace("b", "p", "urn:p")),
                text("it's"),
                Token::Attribute(Name::attribute("m")),
                text(""),
                text("x\r\ny\rz"),
                Token::ElementVoid(Name::new("br")),
                end(),
            ])
            .unwrap();
        assert_eq!(
            output,
            r#"<a xmlns:p="urn:p" m="" z="1&#xA;2" p:b="it&apos;s">x
y
z<br></br></a>"#
        );
    }

    #[test]
    fn raw_text_elements_are_not_escaped() {
        assert_eq!(
            format(&[
                Token::ElementBegin(Name::new("script")),
                text("if (a < b && c) {}"),
                end(),
                text("a < b"),
            ]),
            "<script>if (a < b && c) {}</script>a &lt; b"
        );
    }

    #[test]
    fn contract_violations() {
        let mut formatter = Formatter::new();
        let err = formatter
            .format(&[
                Token::ElementBegin(Name::new("a")),
                Token::Attribute(Name::attribute("k")),
                Token::ElementEnd(Name::default()),
            ])
            .unwrap_err();
        assert!(matches!(
            err,
            FormatterError::Problem {
                index: 2,
                token: TokenKind::ElementEnd,
                ..
            }
        ));

        let err = formatter
            .format(&[text("x"), Token::Attribute(Name::attribute("k"))])
            .unwrap_err();
        assert_eq!(err.index(), Some(1));

        let err = formatter
            .format(&[
                Token::ElementBegin(Name::new("a")),
                Token::Attribute(Name::attribute("k")),
            ])
            .unwrap_err();
        assert!(matches!(
            err,
            FormatterError::Problem {
                token: TokenKind::None,
                ..
            }
        ));

        formatter.reset();
        formatter.finish().unwrap();
        assert!(formatter.emit(&text("late")).is_err());
    }

    #[test]
    fn error_marks_track_output_position() {
        let mut formatter = Formatter::new();
        let err = formatter
            .format(&[text("ab\ncd"), Token::Attribute(Name::attribute("k"))])
            .unwrap_err();
        let FormatterError::Problem { mark, .. } = err else {
            panic!("unexpected error: {err}");
        };
        assert_eq!((mark.index, mark.line, mark.column), (5, 2, 3));
    }

    #[test]
    fn depth_limit() {
        let mut formatter = Formatter::new();
        formatter.set_max_depth(1);
        let err = formatter
            .format(&[
                Token::ElementBegin(Name::new("a")),
                Token::ElementBegin(Name::new("b")),
            ])
            .unwrap_err();
        assert_eq!(err.index(), Some(1));
    }

    #[test]
    fn writer_output_in_utf16() {
        let mut sink = Vec::new();
        let mut formatter = Formatter::new();
        formatter.set_encoding(Encoding::Utf16Le);
        formatter.set_output(&mut sink);
        let returned = formatter.format(&[text("é")]).unwrap();
        assert_eq!(returned, "");
        drop(formatter);
        assert_eq!(sink, [0xff, 0xfe, 0xe9, 0x00]);
    }

    #[test]
    fn streaming_emit_flushes_large_output() {
        let mut sink = Vec::new();
        let mut formatter = Formatter::new();
        formatter.set_output(&mut sink);
        formatter.emit(&Token::ElementBegin(Name::new("list"))).unwrap();
        for i in 0..4096 {
            formatter.emit(&Token::ElementBegin(Name::new("item"))).unwrap();
            formatter.emit(&text(&i.to_string())).unwrap();
            formatter.emit(&end()).unwrap();
        }
        formatter.emit(&end()).unwrap();
        formatter.finish().unwrap();
        drop(formatter);

        let output = String::from_utf8(sink).unwrap();
        assert!(output.starts_with("<list><item>0</item><item>1</item>"));
        assert!(output.ends_with("<item>4095</item></list>"));
        assert_eq!(output.matches("<item>").count(), 4096);
    }
}
