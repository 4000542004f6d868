use std::io::Write;

use crate::{Encoding, WriterError};

/// The sink behind a formatter: an optional writer plus the encoding the
/// UTF-8 working buffer is transcoded to on flush.
#[derive(Default)]
pub(crate) struct Output<'w> {
    write_handler: Option<&'w mut dyn Write>,
    encoding: Encoding,
    raw_buffer: Vec<u8>,
    bom_written: bool,
}

impl<'w> Output<'w> {
    pub(crate) fn set_handler(&mut self, handler: &'w mut dyn Write) {
        self.write_handler = Some(handler);
        self.bom_written = false;
    }

    pub(crate) fn set_encoding(&mut self, encoding: Encoding) {
        self.encoding = encoding;
    }

    pub(crate) fn is_attached(&self) -> bool {
        self.write_handler.is_some()
    }

    /// Start a new stream on the same writer.
    pub(crate) fn reset(&mut self) {
        self.raw_buffer.clear();
        self.bom_written = false;
    }

    /// Flush the accumulated characters to the output.
    ///
    /// Without a writer the buffer is left untouched for the caller to take.
    pub(crate) fn flush(&mut self, buffer: &mut String) -> Result<(), WriterError> {
        let Some(handler) = self.write_handler.as_mut() else {
            return Ok(());
        };
        if buffer.is_empty() {
            return Ok(());
        }

        // TODO: Support partial writes. These calls fail unless the writer is
        // able to write absolutely everything in the buffer.

        let big_endian = match self.encoding {
            Encoding::Utf8 => {
                let to_emit = buffer.as_bytes();
                if handler.write(to_emit)? != to_emit.len() {
                    return Err(WriterError::Incomplete);
                }
                buffer.clear();
                return Ok(());
            }
            Encoding::Utf16Le => false,
            Encoding::Utf16Be => true,
        };

        if !self.bom_written {
            self.raw_buffer
                .extend(if big_endian { [0xfe, 0xff] } else { [0xff, 0xfe] });
            self.bom_written = true;
        }
        for unit in buffer.encode_utf16() {
            let bytes = if big_endian {
                unit.to_be_bytes()
            } else {
                unit.to_le_bytes()
            };
            self.raw_buffer.extend(bytes);
        }

        let to_emit = self.raw_buffer.as_slice();
        if handler.write(to_emit)? != to_emit.len() {
            return Err(WriterError::Incomplete);
        }
        buffer.clear();
        self.raw_buffer.clear();
        Ok(())
    }
}
