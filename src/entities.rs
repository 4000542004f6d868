//! Character references.
//!
//! Decodes numeric character references (`&#65;`, `&#x41;`) and named entity
//! references. The named table is the HTML 4 set (253 names including
//! `apos`); the [`Dialect::Xml`] dialect only knows the five XML predefined
//! entities.

use alloc::borrow::Cow;
use std::collections::HashMap;
use std::sync::LazyLock;

use memchr::memchr;

use crate::Dialect;

static NAMED_ENTITIES: LazyLock<HashMap<&'static str, char>> = LazyLock::new(|| {
    HashMap::from([
        // Latin-1
        ("nbsp", '\u{00a0}'),
        ("iexcl", '\u{00a1}'),
        ("cent", '\u{00a2}'),
        ("pound", '\u{00a3}'),
        ("curren", '\u{00a4}'),
        ("yen", '\u{00a5}'),
        ("brvbar", '\u{00a6}'),
        ("sect", '\u{00a7}'),
        ("uml", '\u{00a8}'),
        ("copy", '\u{00a9}'),
        ("ordf", '\u{00aa}'),
        ("laquo", '\u{00ab}'),
        ("not", '\u{00ac}'),
        ("shy", '\u{00ad}'),
        ("reg", '\u{00ae}'),
        ("macr", '\u{00af}'),
        ("deg", '\u{00b0}'),
        ("plusmn", '\u{00b1}'),
        ("sup2", '\u{00b2}'),
        ("sup3", '\u{00b3}'),
        ("acute", '\u{00b4}'),
        ("micro", '\u{00b5}'),
        ("para", '\u{00b6}'),
        ("middot", '\u{00b7}'),
        ("cedil", '\u{00b8}'),
        ("sup1", '\u{00b9}'),
        ("ordm", '\u{00ba}'),
        ("raquo", '\u{00bb}'),
        ("frac14", '\u{00bc}'),
        ("frac12", '\u{00bd}'),
        ("frac34", '\u{00be}'),
        ("iquest", '\u{00bf}'),
        ("Agrave", '\u{00c0}'),
        ("Aacute", '\u{00c1}'),
        ("Acirc", '\u{00c2}'),
        ("Atilde", '\u{00c3}'),
        ("Auml", '\u{00c4}'),
        ("Aring", '\u{00c5}'),
        ("AElig", '\u{00c6}'),
        ("Ccedil", '\u{00c7}'),
        ("Egrave", '\u{00c8}'),
        ("Eacute", '\u{00c9}'),
        ("Ecirc", '\u{00ca}'),
        ("Euml", '\u{00cb}'),
        ("Igrave", '\u{00cc}'),
        ("Iacute", '\u{00cd}'),
        ("Icirc", '\u{00ce}'),
        ("Iuml", '\u{00cf}'),
        ("ETH", '\u{00d0}'),
        ("Ntilde", '\u{00d1}'),
        ("Ograve", '\u{00d2}'),
        ("Oacute", '\u{00d3}'),
        ("Ocirc", '\u{00d4}'),
        ("Otilde", '\u{00d5}'),
        ("Ouml", '\u{00d6}'),
        ("times", '\u{00d7}'),
        ("Oslash", '\u{00d8}'),
        ("Ugrave", '\u{00d9}'),
        ("Uacute", '\u{00da}'),
        ("Ucirc", '\u{00db}'),
        ("Uuml", '\u{00dc}'),
        ("Yacute", '\u{00dd}'),
        ("THORN", '\u{00de}'),
        ("szlig", '\u{00df}'),
        ("agrave", '\u{00e0}'),
        ("aacute", '\u{00e1}'),
        ("acirc", '\u{00e2}'),
        ("atilde", '\u{00e3}'),
        ("auml", '\u{00e4}'),
        ("aring", '\u{00e5}'),
        ("aelig", '\u{00e6}'),
        ("ccedil", '\u{00e7}'),
        ("egrave", '\u{00e8}'),
        ("eacute", '\u{00e9}'),
        ("ecirc", '\u{00ea}'),
        ("euml", '\u{00eb}'),
        ("igrave", '\u{00ec}'),
        ("iacute", '\u{00ed}'),
        ("icirc", '\u{00ee}'),
        ("iuml", '\u{00ef}'),
        ("eth", '\u{00f0}'),
        ("ntilde", '\u{00f1}'),
        ("ograve", '\u{00f2}'),
        ("oacute", '\u{00f3}'),
        ("ocirc", '\u{00f4}'),
        ("otilde", '\u{00f5}'),
        ("ouml", '\u{00f6}'),
        ("divide", '\u{00f7}'),
        ("oslash", '\u{00f8}'),
        ("ugrave", '\u{00f9}'),
        ("uacute", '\u{00fa}'),
        ("ucirc", '\u{00fb}'),
        ("uuml", '\u{00fc}'),
        ("yacute", '\u{00fd}'),
        ("thorn", '\u{00fe}'),
        ("yuml", '\u{00ff}'),
        // Symbols, mathematical symbols and Greek letters
        ("fnof", '\u{0192}'),
        ("Alpha", '\u{0391}'),
        ("Beta", '\u{0392}'),
        ("Gamma", '\u{0393}'),
        ("Delta", '\u{0394}'),
        ("Epsilon", '\u{0395}'),
        ("Zeta", '\u{0396}'),
        ("Eta", '\u{0397}'),
        ("Theta", '\u{0398}'),
        ("Iota", '\u{0399}'),
        ("Kappa", '\u{039a}'),
        ("Lambda", '\u{039b}'),
        ("Mu", '\u{039c}'),
        ("Nu", '\u{039d}'),
        ("Xi", '\u{039e}'),
        ("Omicron", '\u{039f}'),
        ("Pi", '\u{03a0}'),
        ("Rho", '\u{03a1}'),
        ("Sigma", '\u{03a3}'),
        ("Tau", '\u{03a4}'),
        ("Upsilon", '\u{03a5}'),
        ("Phi", '\u{03a6}'),
        ("Chi", '\u{03a7}'),
        ("Psi", '\u{03a8}'),
        ("Omega", '\u{03a9}'),
        ("alpha", '\u{03b1}'),
        ("beta", '\u{03b2}'),
        ("gamma", '\u{03b3}'),
        ("delta", '\u{03b4}'),
        ("epsilon", '\u{03b5}'),
        ("zeta", '\u{03b6}'),
        ("eta", '\u{03b7}'),
        ("theta", '\u{03b8}'),
        ("iota", '\u{03b9}'),
        ("kappa", '\u{03ba}'),
        ("lambda", '\u{03bb}'),
        ("mu", '\u{03bc}'),
        ("nu", '\u{03bd}'),
        ("xi", '\u{03be}'),
        ("omicron", '\u{03bf}'),
        ("pi", '\u{03c0}'),
        ("rho", '\u{03c1}'),
        ("sigmaf", '\u{03c2}'),
        ("sigma", '\u{03c3}'),
        ("tau", '\u{03c4}'),
        ("upsilon", '\u{03c5}'),
        ("phi", '\u{03c6}'),
        ("chi", '\u{03c7}'),
        ("psi", '\u{03c8}'),
        ("omega", '\u{03c9}'),
        ("thetasym", '\u{03d1}'),
        ("upsih", '\u{03d2}'),
        ("piv", '\u{03d6}'),
        ("bull", '\u{2022}'),
        ("hellip", '\u{2026}'),
        ("prime", '\u{2032}'),
        ("Prime", '\u{2033}'),
        ("oline", '\u{203e}'),
        ("frasl", '\u{2044}'),
        ("weierp", '\u{2118}'),
        ("image", '\u{2111}'),
        ("real", '\u{211c}'),
        ("trade", '\u{2122}'),
        ("alefsym", '\u{2135}'),
        ("larr", '\u{2190}'),
        ("uarr", '\u{2191}'),
        ("rarr", '\u{2192}'),
        ("darr", '\u{2193}'),
        ("harr", '\u{2194}'),
        ("crarr", '\u{21b5}'),
        ("lArr", '\u{21d0}'),
        ("uArr", '\u{21d1}'),
        ("rArr", '\u{21d2}'),
        ("dArr", '\u{21d3}'),
        ("hArr", '\u{21d4}'),
        ("forall", '\u{2200}'),
        ("part", '\u{2202}'),
        ("exist", '\u{2203}'),
        ("empty", '\u{2205}'),
        ("nabla", '\u{2207}'),
        ("isin", '\u{2208}'),
        ("notin", '\u{2209}'),
        ("ni", '\u{220b}'),
        ("prod", '\u{220f}'),
        ("sum", '\u{2211}'),
        ("minus", '\u{2212}'),
        ("lowast", '\u{2217}'),
        ("radic", '\u{221a}'),
        ("prop", '\u{221d}'),
        ("infin", '\u{221e}'),
        ("ang", '\u{2220}'),
        ("and", '\u{2227}'),
        ("or", '\u{2228}'),
        ("cap", '\u{2229}'),
        ("cup", '\u{222a}'),
        ("int", '\u{222b}'),
        ("there4", '\u{2234}'),
        ("sim", '\u{223c}'),
        ("cong", '\u{2245}'),
        ("asymp", '\u{2248}'),
        ("ne", '\u{2260}'),
        ("equiv", '\u{2261}'),
        ("le", '\u{2264}'),
        ("ge", '\u{2265}'),
        ("sub", '\u{2282}'),
        ("sup", '\u{2283}'),
        ("nsub", '\u{2284}'),
        ("sube", '\u{2286}'),
        ("supe", '\u{2287}'),
        ("oplus", '\u{2295}'),
        ("otimes", '\u{2297}'),
        ("perp", '\u{22a5}'),
        ("sdot", '\u{22c5}'),
        ("lceil", '\u{2308}'),
        ("rceil", '\u{2309}'),
        ("lfloor", '\u{230a}'),
        ("rfloor", '\u{230b}'),
        ("lang", '\u{2329}'),
        ("rang", '\u{232a}'),
        ("loz", '\u{25ca}'),
        ("spades", '\u{2660}'),
        ("clubs", '\u{2663}'),
        ("hearts", '\u{2665}'),
        ("diams", '\u{2666}'),
        // Markup-significant and internationalization characters
        ("quot", '\u{0022}'),
        ("amp", '\u{0026}'),
        ("lt", '\u{003c}'),
        ("gt", '\u{003e}'),
        ("apos", '\u{0027}'),
        ("OElig", '\u{0152}'),
        ("oelig", '\u{0153}'),
        ("Scaron", '\u{0160}'),
        ("scaron", '\u{0161}'),
        ("Yuml", '\u{0178}'),
        ("circ", '\u{02c6}'),
        ("tilde", '\u{02dc}'),
        ("ensp", '\u{2002}'),
        ("emsp", '\u{2003}'),
        ("thinsp", '\u{2009}'),
        ("zwnj", '\u{200c}'),
        ("zwj", '\u{200d}'),
        ("lrm", '\u{200e}'),
        ("rlm", '\u{200f}'),
        ("ndash", '\u{2013}'),
        ("mdash", '\u{2014}'),
        ("lsquo", '\u{2018}'),
        ("rsquo", '\u{2019}'),
        ("sbquo", '\u{201a}'),
        ("ldquo", '\u{201c}'),
        ("rdquo", '\u{201d}'),
        ("bdquo", '\u{201e}'),
        ("dagger", '\u{2020}'),
        ("Dagger", '\u{2021}'),
        ("permil", '\u{2030}'),
        ("lsaquo", '\u{2039}'),
        ("rsaquo", '\u{203a}'),
        ("euro", '\u{20ac}'),
    ])
});

const XML_ENTITIES: [(&str, char); 5] = [
    ("lt", '<'),
    ("gt", '>'),
    ("amp", '&'),
    ("quot", '"'),
    ("apos", '\''),
];

/// Look up a named entity, without the surrounding `&` and `;`.
pub fn lookup(name: &str, dialect: Dialect) -> Option<char> {
    match dialect {
        Dialect::Html => NAMED_ENTITIES.get(name).copied(),
        Dialect::Xml => XML_ENTITIES
            .iter()
            .find(|(entity, _)| *entity == name)
            .map(|(_, ch)| *ch),
    }
}

/// The outcome of scanning a reference that starts with `&`.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) enum Reference {
    /// The reference decoded to `char`, consuming `usize` bytes including
    /// the `&` and the `;`.
    Char(char, usize),
    /// The reference could not be decoded. The first `usize` bytes must be
    /// kept as literal text and scanning resumes after them.
    Literal(usize),
}

/// Scan the reference at the start of `input`, which must begin with `&`.
pub(crate) fn scan_reference(input: &str, dialect: Dialect) -> Reference {
    debug_assert!(input.starts_with('&'));
    let bytes = input.as_bytes();

    if bytes.get(1) == Some(&b'#') {
        let (hex, start) = match bytes.get(2) {
            Some(b'x' | b'X') => (true, 3),
            _ => (false, 2),
        };
        let digits = bytes[start..]
            .iter()
            .take_while(|b| {
                if hex {
                    b.is_ascii_hexdigit()
                } else {
                    b.is_ascii_digit()
                }
            })
            .count();
        let end = start + digits;
        if digits == 0 || bytes.get(end) != Some(&b';') {
            return Reference::Literal(end);
        }
        return match decode_numeric(&input[start..end], hex) {
            Some(ch) => Reference::Char(ch, end + 1),
            None => Reference::Literal(end + 1),
        };
    }

    let length = input[1..]
        .bytes()
        .take_while(u8::is_ascii_alphanumeric)
        .count();
    let end = 1 + length;
    if length == 0 || bytes.get(end) != Some(&b';') {
        return Reference::Literal(end);
    }
    match lookup(&input[1..end], dialect) {
        Some(ch) => Reference::Char(ch, end + 1),
        None => Reference::Literal(end),
    }
}

/// Decode the digits of a numeric character reference.
///
/// Returns `None` for code points that are not Unicode scalar values, and
/// for NUL.
pub(crate) fn decode_numeric(digits: &str, hex: bool) -> Option<char> {
    let value = u32::from_str_radix(digits, if hex { 16 } else { 10 }).ok()?;
    if value == 0 {
        return None;
    }
    char::from_u32(value)
}

/// Decode all character references in `text`.
///
/// References that cannot be decoded are kept as literal text. Returns
/// `Cow::Borrowed` when `text` contains no `&`.
pub fn decode(text: &str, dialect: Dialect) -> Cow<'_, str> {
    let Some(first) = memchr(b'&', text.as_bytes()) else {
        return Cow::Borrowed(text);
    };

    let mut result = String::with_capacity(text.len());
    result.push_str(&text[..first]);
    let mut pos = first;
    while pos < text.len() {
        match memchr(b'&', &text.as_bytes()[pos..]) {
            Some(0) => match scan_reference(&text[pos..], dialect) {
                Reference::Char(ch, consumed) => {
                    result.push(ch);
                    pos += consumed;
                }
                Reference::Literal(consumed) => {
                    result.push_str(&text[pos..pos + consumed]);
                    pos += consumed;
                }
            },
            Some(offset) => {
                result.push_str(&text[pos..pos + offset]);
                pos += offset;
            }
            None => {
                result.push_str(&text[pos..]);
                break;
            }
        }
    }
    Cow::Owned(result)
}
