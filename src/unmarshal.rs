//! In-memory source that lends out slices of its input.

use std::borrow::Cow;

use crate::error::{Error, Result};
use crate::options::Options;
use crate::primitive::Source;
use crate::sticky::Latch;

/// Unmarshals XDR primitives from a byte slice without copying.
///
/// Opaque and string reads borrow from the input for `'a`.
///
/// ```rust
/// use xdr_marshal::{Source, Unmarshaller};
///
/// let data = [0, 0, 0, 2, 0xCA, 0xFE, 0, 0];
/// let mut u = Unmarshaller::new(&data);
/// assert_eq!(&*u.read_bytes_max(Some(4)).unwrap(), [0xCA, 0xFE]);
/// assert!(u.remaining().is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct Unmarshaller<'a> {
    data: &'a [u8],
    pos: usize,
    options: Options,
    latch: Latch,
}

impl<'a> Unmarshaller<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_options(data, Options::default())
    }

    pub fn with_options(data: &'a [u8], options: Options) -> Self {
        Unmarshaller {
            data,
            pos: 0,
            options,
            latch: Latch::new(),
        }
    }

    /// Start over on `data`, clearing the cursor and any latched error.
    pub fn reset(&mut self, data: &'a [u8]) {
        self.data = data;
        self.pos = 0;
        self.latch.clear();
    }

    /// The unread tail of the input.
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    fn advance(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(n).ok_or(Error::UnexpectedEof)?;
        let slice = self.data.get(self.pos..end).ok_or(Error::UnexpectedEof)?;
        self.pos = end;
        Ok(slice)
    }
}

impl<'a> Source<'a> for Unmarshaller<'a> {
    fn fill(&mut self, buf: &mut [u8]) -> Result<()> {
        let slice = self.advance(buf.len())?;
        buf.copy_from_slice(slice);
        Ok(())
    }

    fn take(&mut self, n: usize) -> Result<Cow<'a, [u8]>> {
        self.advance(n).map(Cow::Borrowed)
    }

    fn consumed(&self) -> usize {
        self.pos
    }

    fn available(&self) -> Option<usize> {
        Some(self.data.len() - self.pos)
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
