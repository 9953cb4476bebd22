//! Streaming source over any `std::io::Read`.

use std::borrow::Cow;
use std::io::{ErrorKind, Read};

use crate::error::{Error, Result};
use crate::options::Options;
use crate::primitive::Source;
use crate::sticky::Latch;

/// Upper bound on the buffer reserved up front for one opaque read. Larger
/// payloads grow as bytes actually arrive, so a forged length prefix cannot
/// force a large allocation.
const PREALLOC_LIMIT: usize = 64 * 1024;

/// Reads XDR primitives from an input stream, copying variable-length data.
///
/// [`consumed`](Source::consumed) counts every byte pulled from the stream,
/// including those read before a failure.
pub struct Reader<R: Read> {
    inner: R,
    consumed: usize,
    options: Options,
    latch: Latch,
}

impl<R: Read> Reader<R> {
    pub fn new(inner: R) -> Self {
        Self::with_options(inner, Options::default())
    }

    pub fn with_options(inner: R, options: Options) -> Self {
        Reader {
            inner,
            consumed: 0,
            options,
            latch: Latch::new(),
        }
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Clear the latched error and the byte count before the next pass.
    pub fn reset(&mut self) {
        self.consumed = 0;
        self.latch.clear();
    }
}

impl<'de, R: Read> Source<'de> for Reader<R> {
    fn fill(&mut self, mut buf: &mut [u8]) -> Result<()> {
        while !buf.is_empty() {
            match self.inner.read(buf) {
                Ok(0) => return Err(Error::UnexpectedEof),
                Ok(n) => {
                    self.consumed += n;
                    buf = &mut buf[n..];
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    fn take(&mut self, n: usize) -> Result<Cow<'de, [u8]>> {
        let mut buf = Vec::with_capacity(n.min(PREALLOC_LIMIT));
        // read_to_end keeps whatever arrived before an error.
        let read = Read::take(&mut self.inner, n as u64).read_to_end(&mut buf);
        self.consumed += buf.len();
        read?;
        if buf.len() < n {
            return Err(Error::UnexpectedEof);
        }
        Ok(Cow::Owned(buf))
    }

    fn consumed(&self) -> usize {
        self.consumed
    }

    fn options(&self) -> &Options {
        &self.options
    }

    fn latch(&self) -> &Latch {
        &self.latch
    }

    fn latch_mut(&mut self) -> &mut Latch {
        &mut self.latch
    }
}
