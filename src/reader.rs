use std::io::{BufRead, Read};

use crate::{Encoding, ReaderError};

const BOM_UTF8: [u8; 3] = [0xef, 0xbb, 0xbf];
const BOM_UTF16LE: [u8; 2] = [0xff, 0xfe];
const BOM_UTF16BE: [u8; 2] = [0xfe, 0xff];

/// Read the whole of `reader` into a string, honouring a leading byte order
/// mark. Input without a BOM is UTF-8.
pub(crate) fn read_to_string(reader: &mut dyn BufRead) -> Result<String, ReaderError> {
    let mut out = String::new();
    let mut offset = 0;
    let mut head = Vec::new();
    let Some(encoding) = determine_encoding(reader, &mut offset, &mut head)? else {
        return Ok(out);
    };
    match encoding {
        Encoding::Utf8 if !head.is_empty() => {
            reader.read_to_end(&mut head)?;
            read_utf8_bytes(&head, &mut out, offset)?;
        }
        Encoding::Utf8 => while read_utf8_buffered(reader, &mut out, &mut offset)? {},
        Encoding::Utf16Le => read_utf16::<false>(reader, &mut out, &mut offset)?,
        Encoding::Utf16Be => read_utf16::<true>(reader, &mut out, &mut offset)?,
    }
    Ok(out)
}

/// Sniff the byte order mark.
///
/// Bytes that had to be taken from `reader` to rule out a UTF-8 BOM, but do
/// not form one, are left in `head` and belong to the content.
fn determine_encoding(
    reader: &mut dyn BufRead,
    offset: &mut usize,
    head: &mut Vec<u8>,
) -> Result<Option<Encoding>, ReaderError> {
    let initial_bytes = reader.fill_buf()?;
    let Some(&first) = initial_bytes.first() else {
        return Ok(None);
    };

    match first {
        // 0xEF also starts UTF-8 for U+F000 and above.
        0xef if initial_bytes.len() >= BOM_UTF8.len() => {
            if initial_bytes.starts_with(&BOM_UTF8) {
                reader.consume(BOM_UTF8.len());
                *offset += BOM_UTF8.len();
            }
            Ok(Some(Encoding::Utf8))
        }
        0xef => {
            (&mut *reader)
                .take(BOM_UTF8.len() as u64)
                .read_to_end(head)?;
            if *head == BOM_UTF8 {
                head.clear();
                *offset += BOM_UTF8.len();
            }
            Ok(Some(Encoding::Utf8))
        }
        0xff | 0xfe => {
            let mut bom = [0; 2];
            reader.read_exact(&mut bom)?;
            *offset += bom.len();
            if bom == BOM_UTF16LE {
                Ok(Some(Encoding::Utf16Le))
            } else if bom == BOM_UTF16BE {
                Ok(Some(Encoding::Utf16Be))
            } else {
                Err(ReaderError::InvalidBom)
            }
        }
        _ => Ok(Some(Encoding::Utf8)),
    }
}

fn read_utf8_bytes(bytes: &[u8], out: &mut String, offset: usize) -> Result<(), ReaderError> {
    match core::str::from_utf8(bytes) {
        Ok(valid) => {
            out.push_str(valid);
            Ok(())
        }
        Err(err) if err.error_len().is_none() => {
            Err(std::io::Error::from(std::io::ErrorKind::UnexpectedEof).into())
        }
        Err(err) => Err(ReaderError::InvalidUtf8 {
            value: bytes[err.valid_up_to()],
            offset: offset + err.valid_up_to(),
        }),
    }
}

fn read_utf8_buffered(
    reader: &mut dyn BufRead,
    out: &mut String,
    offset: &mut usize,
) -> Result<bool, ReaderError> {
    let available = loop {
        match reader.fill_buf() {
            Ok([]) => return Ok(false),
            Ok(available) => break available,
            Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        }
    };

    match core::str::from_utf8(available) {
        Ok(valid) => {
            let used = valid.len();
            out.push_str(valid);
            *offset += used;
            reader.consume(used);
            Ok(true)
        }
        Err(err) => {
            let valid_bytes = err.valid_up_to();
            if let Ok(valid) = core::str::from_utf8(&available[..valid_bytes]) {
                out.push_str(valid);
            }

            if err.error_len().is_some() {
                return Err(ReaderError::InvalidUtf8 {
                    value: available[valid_bytes],
                    offset: *offset + valid_bytes,
                });
            }
            if valid_bytes != 0 {
                // The tail of the buffer is an incomplete sequence; leave it
                // for the next fill.
                *offset += valid_bytes;
                reader.consume(valid_bytes);
            } else {
                // The buffer starts with an incomplete sequence. `read_exact`
                // reports `UnexpectedEof` if it can never be completed.
                let initial = available[0];
                read_utf8_char_unbuffered(reader, out, initial, offset)?;
            }
            Ok(true)
        }
    }
}

fn read_utf8_char_unbuffered(
    reader: &mut dyn BufRead,
    out: &mut String,
    initial: u8,
    offset: &mut usize,
) -> Result<(), ReaderError> {
    let width = utf8_char_width(initial);
    if width == 0 {
        return Err(ReaderError::InvalidUtf8 {
            value: initial,
            offset: *offset,
        });
    }
    let mut buffer = [0; 4];
    reader.read_exact(&mut buffer[..width])?;
    match core::str::from_utf8(&buffer[..width]) {
        Ok(valid) => {
            out.push_str(valid);
            *offset += width;
            Ok(())
        }
        Err(_) => Err(ReaderError::InvalidUtf8 {
            value: buffer[0],
            offset: *offset,
        }),
    }
}

fn read_utf16<const BIG_ENDIAN: bool>(
    reader: &mut dyn BufRead,
    out: &mut String,
    offset: &mut usize,
) -> Result<(), ReaderError> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    if bytes.len() % 2 != 0 {
        return Err(std::io::Error::from(std::io::ErrorKind::UnexpectedEof).into());
    }

    let units = bytes.chunks_exact(2).map(|chunk| {
        let [a, b] = chunk else { unreachable!() };
        if BIG_ENDIAN {
            u16::from_be_bytes([*a, *b])
        } else {
            u16::from_le_bytes([*a, *b])
        }
    });

    out.reserve(bytes.len() / 2);
    for ch in core::char::decode_utf16(units) {
        match ch {
            Ok(ch) => {
                out.push(ch);
                *offset += ch.len_utf16() * 2;
            }
            Err(err) => {
                return Err(ReaderError::InvalidUtf16 {
                    value: err.unpaired_surrogate(),
                    offset: *offset,
                });
            }
        }
    }
    Ok(())
}

fn utf8_char_width(initial: u8) -> usize {
    if initial & 0x80 == 0 {
        1
    } else if initial & 0xE0 == 0xC0 {
        2
    } else if initial & 0xF0 == 0xE0 {
        3
    } else if initial & 0xF8 == 0xF0 {
        4
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::BufReader;

    fn read(bytes: &[u8]) -> Result<String, ReaderError> {
        let mut input = bytes;
        read_to_string(&mut input)
    }

    #[test]
    fn plain_and_bom_utf8() {
        assert_eq!(read(b"<a>x</a>").unwrap(), "<a>x</a>");
        assert_eq!(read(b"\xef\xbb\xbf<a/>").unwrap(), "<a/>");
        assert_eq!(read(b"").unwrap(), "");
    }

    #[test]
    fn lead_byte_0xef_without_bom_is_content() {
        assert_eq!(read("\u{ff01}<p>".as_bytes()).unwrap(), "\u{ff01}<p>");
        assert_eq!(read("\u{fec0}".as_bytes()).unwrap(), "\u{fec0}");

        // A one-byte buffer cannot show the whole BOM up front.
        let mut reader = BufReader::with_capacity(1, "\u{ff01}x".as_bytes());
        assert_eq!(read_to_string(&mut reader).unwrap(), "\u{ff01}x");
        let mut reader = BufReader::with_capacity(1, &b"\xef\xbb\xbfx"[..]);
        assert_eq!(read_to_string(&mut reader).unwrap(), "x");
        let mut reader = BufReader::with_capacity(1, &b"\xef\xbf"[..]);
        assert!(read_to_string(&mut reader).is_err());
    }

    #[test]
    fn utf16_both_endians() {
        let text = "<p>€</p>";
        let mut le = BOM_UTF16LE.to_vec();
        let mut be = BOM_UTF16BE.to_vec();
        for unit in text.encode_utf16() {
            le.extend(unit.to_le_bytes());
            be.extend(unit.to_be_bytes());
        }
        assert_eq!(read(&le).unwrap(), text);
        assert_eq!(read(&be).unwrap(), text);
    }

    #[test]
    fn split_multibyte_sequence_across_fills() {
        // A one-byte buffer forces every multi-byte character down the
        // unbuffered path.
        let bytes = "a€b".as_bytes();
        let mut reader = BufReader::with_capacity(1, bytes);
        assert_eq!(read_to_string(&mut reader).unwrap(), "a€b");
    }

    #[test]
    fn invalid_input() {
        assert!(matches!(
            read(b"\xef\x00\x00"),
            Err(ReaderError::InvalidUtf8 {
                value: 0xef,
                offset: 0
            })
        ));
        assert!(matches!(read(b"\xfe\x00"), Err(ReaderError::InvalidBom)));
        assert!(matches!(
            read(b"ab\xffcd"),
            Err(ReaderError::InvalidUtf8 {
                value: 0xff,
                offset: 2
            })
        ));
        assert!(matches!(
            read(b"\xff\xfe\x00\xd8a\x00"),
            Err(ReaderError::InvalidUtf16 {
                value: 0xd800,
                offset: 2
            })
        ));
    }
}
