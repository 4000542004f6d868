//! Character classes shared by the tokenizer and the formatter.

pub(crate) fn is_space(ch: impl Into<Option<char>>) -> bool {
    matches!(ch.into(), Some(' ' | '\t' | '\n' | '\r' | '\x0c'))
}

pub(crate) fn is_space_byte(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | b'\x0c')
}

pub(crate) fn is_blank_str(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(is_space_byte)
}

/// Can `ch` start an element or attribute name?
///
/// This is the XML `NameStartChar` production minus the colon, which the
/// scanner treats as the prefix separator.
pub(crate) fn is_name_start(ch: char) -> bool {
    matches!(ch,
        'A'..='Z' | 'a'..='z' | '_'
        | '\u{c0}'..='\u{d6}'
        | '\u{d8}'..='\u{f6}'
        | '\u{f8}'..='\u{2ff}'
        | '\u{370}'..='\u{37d}'
        | '\u{37f}'..='\u{1fff}'
        | '\u{200c}'..='\u{200d}'
        | '\u{2070}'..='\u{218f}'
        | '\u{2c00}'..='\u{2fef}'
        | '\u{3001}'..='\u{d7ff}'
        | '\u{f900}'..='\u{fdcf}'
        | '\u{fdf0}'..='\u{fffd}'
        | '\u{10000}'..='\u{effff}')
}

pub(crate) fn is_name_char(ch: char) -> bool {
    is_name_start(ch)
        || matches!(ch,
            '-' | '.' | '0'..='9' | ':'
            | '\u{b7}'
            | '\u{300}'..='\u{36f}'
            | '\u{203f}'..='\u{2040}')
}

/// Attribute names in HTML are much looser than XML names: anything but
/// whitespace, quotes and the tag delimiters.
pub(crate) fn is_attribute_name_char(ch: char) -> bool {
    !is_space(ch) && !matches!(ch, '"' | '\'' | '<' | '>' | '/' | '=' | '\0')
}

/// Characters the formatter must escape as numeric references in any
/// context. Tab and line feed are the only control characters written raw.
pub(crate) fn is_control(ch: char) -> bool {
    (ch < ' ' && ch != '\t' && ch != '\n') || ch == '\u{7f}'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names() {
        assert!(is_name_start('a'));
        assert!(is_name_start('_'));
        assert!(is_name_start('é'));
        assert!(!is_name_start('1'));
        assert!(!is_name_start(':'));
        assert!(!is_name_start(' '));
        assert!(is_name_char('1'));
        assert!(is_name_char('-'));
        assert!(is_name_char(':'));
        assert!(!is_name_char('>'));
    }

    #[test]
    fn attribute_names_are_lenient() {
        assert!("data-x@1".chars().all(is_attribute_name_char));
        assert!(!is_attribute_name_char('='));
        assert!(!is_attribute_name_char('/'));
    }

    #[test]
    fn blank_strings() {
        assert!(is_blank_str(" \r\n\t"));
        assert!(!is_blank_str(""));
        assert!(!is_blank_str(" x "));
    }
}
