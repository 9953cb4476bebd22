//! In-memory sink backed by a growable buffer.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::Result;
use crate::primitive::Sink;
use crate::sticky::Latch;

/// Marshals XDR primitives into an owned, growable buffer.
///
/// The buffer grows geometrically, so a run of small writes is amortized
/// O(1). [`reset`](Marshaller::reset) keeps the allocation for the next
/// record.
#[derive(Debug, Default)]
pub struct Marshaller {
    buf: BytesMut,
    latch: Latch,
}

impl Marshaller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Marshaller {
            buf: BytesMut::with_capacity(capacity),
            latch: Latch::new(),
        }
    }

    /// The bytes marshalled so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Drop the contents and any latched error, keeping the capacity.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.latch.clear();
    }

    pub fn into_bytes(self) -> Bytes {
        self.buf.freeze()
    }

    pub fn into_vec(self) -> Vec<u8> {
        Vec::from(self.buf)
    }
}

impl Sink for Marshaller {
    fn put(&mut self, bytes: &[u8]) -> Result<()> {
        self.buf.put_slice(bytes);
        Ok(())
    }

    fn written(&self) -> usize {
        self.buf.len()
    }

    fn latch(&self) -> &Latch {
        &self.latch
    }

    fn latch_mut(&mut self) -> &mut Latch {
        &mut self.latch
    }
}
