//! Streaming sink over any `std::io::Write`.

use std::io::{self, ErrorKind, Write};

use crate::error::{Error, Result};
use crate::primitive::Sink;
use crate::sticky::Latch;

/// Writes XDR primitives straight to an output stream.
///
/// [`written`](Sink::written) counts every byte the stream accepted,
/// including those written before a failure.
///
/// ```rust
/// use xdr_marshal::{Sink, Writer};
///
/// let mut w = Writer::new(Vec::new());
/// w.write_string("abc").unwrap();
/// assert_eq!(w.written(), 8);
/// assert_eq!(w.into_inner(), [0, 0, 0, 3, b'a', b'b', b'c', 0]);
/// ```
pub struct Writer<W: Write> {
    inner: W,
    written: usize,
    latch: Latch,
}

impl<W: Write> Writer<W> {
    pub fn new(inner: W) -> Self {
        Writer {
            inner,
            written: 0,
            latch: Latch::new(),
        }
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    /// Clear the latched error and the byte count so the writer can start a
    /// new pass over the same stream.
    pub fn reset(&mut self) {
        self.written = 0;
        self.latch.clear();
    }

    pub fn flush(&mut self) -> Result<()> {
        self.latch.check()?;
        let flushed = self.inner.flush().map_err(Error::from);
        self.latch.guard(flushed)
    }
}

impl<W: Write> Sink for Writer<W> {
    fn put(&mut self, mut bytes: &[u8]) -> Result<()> {
        while !bytes.is_empty() {
            match self.inner.write(bytes) {
                Ok(0) => return Err(io::Error::from(ErrorKind::WriteZero).into()),
                Ok(n) => {
                    self.written += n;
                    bytes = &bytes[n..];
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    fn written(&self) -> usize {
        self.written
    }

    fn latch(&self) -> &Latch {
        &self.latch
    }

    fn latch_mut(&mut self) -> &mut Latch {
        &mut self.latch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("pipe closed"))
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn io_failure_is_latched() {
        let mut w = Writer::new(Broken);
        let err = w.write_u32(1).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(w.write_u64(2), Err(err.clone()));
        assert_eq!(w.flush(), Err(err.clone()));
        assert_eq!(w.error(), Some(&err));
        assert_eq!(w.written(), 0);
    }

    /// Accepts up to `room` bytes, one at a time, then fails.
    struct Cramped {
        out: Vec<u8>,
        room: usize,
    }

    impl Write for Cramped {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if self.out.len() == self.room {
                return Err(std::io::Error::other("disk full"));
            }
            self.out.push(buf[0]);
            Ok(1)
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn partial_writes_are_counted() {
        let mut w = Writer::new(Cramped { out: Vec::new(), room: 6 });
        assert_eq!(w.write_u32(0x0102_0304), Ok(4));
        assert!(matches!(w.write_u32(0x0506_0708), Err(Error::Io(_))));
        assert_eq!(w.written(), 6);
        assert_eq!(w.get_ref().out, [1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn zero_length_write_is_an_error() {
        let mut out = [0u8; 2];
        let mut w = Writer::new(&mut out[..]);
        assert!(matches!(w.write_u32(1), Err(Error::Io(_))));
        assert_eq!(w.written(), 2);
    }

    #[test]
    fn reset_clears_count_and_error() {
        let mut w = Writer::new(Vec::new());
        w.write_u32(7).unwrap();
        w.latch_mut().record(Error::LengthRequired);
        w.reset();
        assert_eq!(w.written(), 0);
        assert!(w.error().is_none());
        assert_eq!(w.write_u32(8), Ok(4));
        assert_eq!(w.into_inner(), [0, 0, 0, 7, 0, 0, 0, 8]);
    }
}
