use std::{
    io::{self, Write},
    str::from_utf8,
};

use crate::encoding::{XmlCharEncodingHandler, XmlEncoder};

/// The amount of pending UTF-8 kept before it is converted.
const MINLEN: usize = 4000;

/// An output sink with an optional conversion from UTF-8.
///
/// Without an encoder, bytes are written straight to the sink.
/// With one, they are kept until a complete UTF-8 sequence boundary is reached
/// and then converted.
#[doc(alias = "xmlOutputBuffer")]
pub struct XmlOutputBuffer<'a> {
    context: Box<dyn Write + 'a>,
    encoder: Option<XmlEncoder>,
    // Local buffer encoded in UTF-8, only used with an encoder
    buffer: Vec<u8>,
    conv: Vec<u8>,
    // total number of byte written
    written: usize,
}

impl<'a> XmlOutputBuffer<'a> {
    /// Create a buffered output writing to `context`.
    ///
    /// A UTF-8 handler is the same as no handler.
    #[doc(alias = "xmlOutputBufferCreateIO")]
    pub fn from_writer(
        context: impl Write + 'a,
        encoder: Option<XmlCharEncodingHandler>,
    ) -> Self {
        Self {
            context: Box::new(context),
            encoder: encoder
                .filter(|handler| !handler.is_utf8())
                .map(|handler| handler.encoder()),
            buffer: vec![],
            conv: vec![],
            written: 0,
        }
    }

    /// Write the content of the array in the output I/O buffer.
    #[doc(alias = "xmlOutputBufferWrite")]
    pub fn write_bytes(&mut self, buf: &[u8]) -> io::Result<()> {
        if self.encoder.is_none() {
            self.context.write_all(buf)?;
            self.written += buf.len();
            return Ok(());
        }
        self.buffer.extend_from_slice(buf);
        if self.buffer.len() >= MINLEN {
            self.encode(false)?;
        }
        Ok(())
    }

    #[doc(alias = "xmlOutputBufferWriteString")]
    pub fn write_str(&mut self, s: &str) -> io::Result<()> {
        self.write_bytes(s.as_bytes())
    }

    /// Convert and write the pending UTF-8.
    ///
    /// Unless `last` is set, an incomplete sequence at the end of the buffer is kept for later.
    fn encode(&mut self, last: bool) -> io::Result<()> {
        let Some(encoder) = self.encoder.as_mut() else {
            return Ok(());
        };
        let len = match from_utf8(&self.buffer) {
            Err(e) if !last && e.error_len().is_none() => e.valid_up_to(),
            _ => self.buffer.len(),
        };
        if len == 0 && !last {
            return Ok(());
        }
        let pending = self.buffer.drain(..len).collect::<Vec<_>>();
        let src = String::from_utf8_lossy(&pending);
        self.conv.clear();
        encoder.encode(&src, last, &mut self.conv);
        self.context.write_all(&self.conv)?;
        self.written += self.conv.len();
        Ok(())
    }

    /// Flush the buffered output.
    #[doc(alias = "xmlOutputBufferFlush")]
    pub fn flush(&mut self) -> io::Result<()> {
        self.encode(true)?;
        self.context.flush()
    }

    /// The number of bytes handed to the sink so far.
    pub fn written(&self) -> usize {
        self.written
    }
}

impl Write for XmlOutputBuffer<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_bytes(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        XmlOutputBuffer::flush(self)
    }
}
