//! XDR primitive codec (RFC 4506 §4).
//!
//! [`Sink`] and [`Source`] describe where bytes go and come from; the
//! provided methods on each implement the wire rules once for every backing
//! store:
//! - integers are big-endian; 8/16/32-bit values occupy a 4-byte slot,
//!   64-bit values an 8-byte slot
//! - opaque data is followed by `(4 - n % 4) % 4` zero bytes
//! - variable-length opaque and strings carry a 4-byte length prefix
//!
//! Every provided method checks the instance's [`Latch`] first and records
//! its own failure there, so a sequence of calls stops at the first error.

use std::borrow::Cow;

use crate::error::{Error, Result};
use crate::options::{Options, TextPolicy};
use crate::sticky::Latch;

const PADDING: [u8; 3] = [0; 3];

/// Number of zero bytes that follow `len` bytes of opaque data.
#[inline]
pub const fn pad_len(len: usize) -> usize {
    (4 - len % 4) % 4
}

/// `len` rounded up to the next multiple of 4. Saturates at `usize::MAX`.
#[inline]
pub const fn padded_len(len: usize) -> usize {
    len.saturating_add(pad_len(len))
}

/// Encoded size of a length-prefixed opaque or string of `len` bytes.
/// Saturates at `usize::MAX`.
#[inline]
pub const fn opaque_len(len: usize) -> usize {
    padded_len(len).saturating_add(4)
}

/// Validate a variable-length element against `max` and the 32-bit ceiling.
fn element_len(what: &'static str, len: usize, max: Option<u32>) -> Result<u32> {
    let limit = max.unwrap_or(u32::MAX);
    match u32::try_from(len) {
        Ok(l) if l <= limit => Ok(l),
        _ => Err(Error::exceeded(what, len as u64, limit)),
    }
}

// ── Sink ───────────────────────────────────────────────────────────────────

/// A destination that accepts bytes in order.
///
/// Implementors supply [`put`](Sink::put) and access to their latch; every
/// `write_*` method returns the number of bytes it emitted.
pub trait Sink {
    /// Append `bytes` verbatim to the destination.
    fn put(&mut self, bytes: &[u8]) -> Result<()>;

    /// Total bytes accepted so far.
    fn written(&self) -> usize;

    fn latch(&self) -> &Latch;

    fn latch_mut(&mut self) -> &mut Latch;

    /// The first error recorded on this sink.
    fn error(&self) -> Option<&Error> {
        self.latch().get()
    }

    /// XDR unsigned integer: 4 bytes, big-endian
    fn write_u32(&mut self, v: u32) -> Result<usize> {
        emit(self, &v.to_be_bytes())
    }

    /// XDR unsigned hyper integer: 8 bytes, big-endian
    fn write_u64(&mut self, v: u64) -> Result<usize> {
        emit(self, &v.to_be_bytes())
    }

    fn write_u8(&mut self, v: u8) -> Result<usize> {
        self.write_u32(u32::from(v))
    }

    fn write_u16(&mut self, v: u16) -> Result<usize> {
        self.write_u32(u32::from(v))
    }

    fn write_i32(&mut self, v: i32) -> Result<usize> {
        emit(self, &v.to_be_bytes())
    }

    fn write_i64(&mut self, v: i64) -> Result<usize> {
        emit(self, &v.to_be_bytes())
    }

    fn write_bool(&mut self, v: bool) -> Result<usize> {
        self.write_u32(u32::from(v))
    }

    /// Raw bytes followed by zero padding to a 4-byte boundary. No length
    /// prefix is written.
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<usize> {
        let mut n = emit(self, bytes)?;
        let pad = pad_len(bytes.len());
        if pad != 0 {
            n += emit(self, &PADDING[..pad])?;
        }
        Ok(n)
    }

    /// XDR variable-length opaque: 4-byte length, data, padding.
    fn write_opaque(&mut self, bytes: &[u8]) -> Result<usize> {
        self.write_opaque_max(bytes, None)
    }

    /// Like [`write_opaque`](Sink::write_opaque), rejecting data longer than
    /// `max` before anything is written.
    fn write_opaque_max(&mut self, bytes: &[u8], max: Option<u32>) -> Result<usize> {
        write_prefixed(self, "opaque", bytes, max)
    }

    /// XDR string: 4-byte length, UTF-8 bytes, padding.
    fn write_string(&mut self, s: &str) -> Result<usize> {
        self.write_string_max(s, None)
    }

    fn write_string_max(&mut self, s: &str, max: Option<u32>) -> Result<usize> {
        write_prefixed(self, "string", s.as_bytes(), max)
    }
}

fn emit<S: Sink + ?Sized>(sink: &mut S, bytes: &[u8]) -> Result<usize> {
    sink.latch().check()?;
    let put = sink.put(bytes);
    sink.latch_mut().guard(put)?;
    Ok(bytes.len())
}

fn write_prefixed<S: Sink + ?Sized>(
    sink: &mut S,
    what: &'static str,
    bytes: &[u8],
    max: Option<u32>,
) -> Result<usize> {
    sink.latch().check()?;
    let len = sink.latch_mut().guard(element_len(what, bytes.len(), max))?;
    let n = sink.write_u32(len)?;
    Ok(n + sink.write_bytes(bytes)?)
}

// ── Source ─────────────────────────────────────────────────────────────────

/// A source that yields bytes in order.
///
/// `'de` is the lifetime of data that can be lent out without copying; a
/// streaming source hands out owned copies instead.
pub trait Source<'de> {
    /// Fill `buf` completely or fail with [`Error::UnexpectedEof`].
    fn fill(&mut self, buf: &mut [u8]) -> Result<()>;

    /// Consume exactly `n` bytes.
    fn take(&mut self, n: usize) -> Result<Cow<'de, [u8]>>;

    /// Total bytes consumed so far.
    fn consumed(&self) -> usize;

    /// Bytes known to remain, when the source can tell without reading.
    fn available(&self) -> Option<usize> {
        None
    }

    fn options(&self) -> &Options;

    fn latch(&self) -> &Latch;

    fn latch_mut(&mut self) -> &mut Latch;

    /// The first error recorded on this source.
    fn error(&self) -> Option<&Error> {
        self.latch().get()
    }

    fn read_u32(&mut self) -> Result<u32> {
        read_array(self).map(u32::from_be_bytes)
    }

    fn read_u64(&mut self) -> Result<u64> {
        read_array(self).map(u64::from_be_bytes)
    }

    /// A 4-byte slot that must hold a value below 256.
    fn read_u8(&mut self) -> Result<u8> {
        let v = self.read_u32()?;
        let narrowed = u8::try_from(v).map_err(|_| Error::exceeded("uint8", v, u8::MAX));
        self.latch_mut().guard(narrowed)
    }

    /// A 4-byte slot that must hold a value below 65536.
    fn read_u16(&mut self) -> Result<u16> {
        let v = self.read_u32()?;
        let narrowed = u16::try_from(v).map_err(|_| Error::exceeded("uint16", v, u16::MAX));
        self.latch_mut().guard(narrowed)
    }

    fn read_i32(&mut self) -> Result<i32> {
        read_array(self).map(i32::from_be_bytes)
    }

    fn read_i64(&mut self) -> Result<i64> {
        read_array(self).map(i64::from_be_bytes)
    }

    fn read_bool(&mut self) -> Result<bool> {
        let v = self.read_u32()?;
        let b = match v {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(Error::InvalidBool(v)),
        };
        self.latch_mut().guard(b)
    }

    /// `n` bytes of fixed-length opaque data plus their padding.
    ///
    /// Missing padding is an error just like missing payload.
    fn read_fixed(&mut self, n: usize) -> Result<Cow<'de, [u8]>> {
        self.latch().check()?;
        let pad = pad_len(n);
        if let Some(avail) = self.available() {
            if n.checked_add(pad).is_none_or(|need| avail < need) {
                return Err(self.latch_mut().record(Error::UnexpectedEof));
            }
        }
        let data = self.take(n);
        let data = self.latch_mut().guard(data)?;
        read_padding(self, pad)?;
        Ok(data)
    }

    /// Length-prefixed opaque data. A prefix above `max` fails before any
    /// payload is consumed.
    fn read_bytes_max(&mut self, max: Option<u32>) -> Result<Cow<'de, [u8]>> {
        read_prefixed(self, "opaque", max)
    }

    /// [`read_bytes_max`](Source::read_bytes_max) bounded by
    /// [`Options::max_len`].
    fn read_bytes(&mut self) -> Result<Cow<'de, [u8]>> {
        let max = self.options().max_len;
        self.read_bytes_max(max)
    }

    /// Length-prefixed string, interpreted according to
    /// [`Options::text`](crate::Options).
    fn read_string_max(&mut self, max: Option<u32>) -> Result<Cow<'de, str>> {
        let bytes = read_prefixed(self, "string", max)?;
        let text = decode_text(bytes, self.options().text);
        self.latch_mut().guard(text)
    }

    fn read_string(&mut self) -> Result<Cow<'de, str>> {
        let max = self.options().max_len;
        self.read_string_max(max)
    }
}

fn read_array<'de, const N: usize, S: Source<'de> + ?Sized>(source: &mut S) -> Result<[u8; N]> {
    source.latch().check()?;
    let mut buf = [0u8; N];
    let filled = source.fill(&mut buf);
    source.latch_mut().guard(filled)?;
    Ok(buf)
}

fn read_padding<'de, S: Source<'de> + ?Sized>(source: &mut S, pad: usize) -> Result<()> {
    if pad == 0 {
        return Ok(());
    }
    let mut buf = [0u8; 3];
    let filled = source.fill(&mut buf[..pad]);
    source.latch_mut().guard(filled)?;
    if source.options().strict_padding && buf.iter().any(|&b| b != 0) {
        return Err(source.latch_mut().record(Error::InvalidPadding));
    }
    Ok(())
}

fn read_prefixed<'de, S: Source<'de> + ?Sized>(
    source: &mut S,
    what: &'static str,
    max: Option<u32>,
) -> Result<Cow<'de, [u8]>> {
    let len = source.read_u32()?;
    if let Some(limit) = max {
        if len > limit {
            return Err(source.latch_mut().record(Error::exceeded(what, len, limit)));
        }
    }
    source.read_fixed(len as usize)
}

fn decode_text(bytes: Cow<'_, [u8]>, policy: TextPolicy) -> Result<Cow<'_, str>> {
    match bytes {
        Cow::Borrowed(b) => match policy {
            TextPolicy::Lossy => Ok(String::from_utf8_lossy(b)),
            TextPolicy::Strict => std::str::from_utf8(b)
                .map(Cow::Borrowed)
                .map_err(|e| Error::Encoding(e.to_string())),
        },
        Cow::Owned(v) => match String::from_utf8(v) {
            Ok(s) => Ok(Cow::Owned(s)),
            Err(e) => match policy {
                TextPolicy::Lossy => Ok(Cow::Owned(String::from_utf8_lossy(e.as_bytes()).into_owned())),
                TextPolicy::Strict => Err(Error::Encoding(e.utf8_error().to_string())),
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padding_arithmetic() {
        for (len, pad) in [(0, 0), (1, 3), (2, 2), (3, 1), (4, 0), (5, 3)] {
            assert_eq!(pad_len(len), pad, "pad_len({len})");
            assert_eq!(padded_len(len) % 4, 0);
            assert_eq!(opaque_len(len), 4 + len + pad);
        }
    }

    #[test]
    fn lengths_saturate_near_usize_max() {
        assert_eq!(padded_len(usize::MAX), usize::MAX);
        assert_eq!(padded_len(usize::MAX - 1), usize::MAX);
        assert_eq!(opaque_len(usize::MAX - 4), usize::MAX);
        assert_eq!(opaque_len(usize::MAX), usize::MAX);
    }

    #[test]
    fn element_len_bounds() {
        assert_eq!(element_len("opaque", 3, Some(3)), Ok(3));
        assert_eq!(
            element_len("opaque", 4, Some(3)),
            Err(Error::exceeded("opaque", 4u64, 3u32))
        );
        assert_eq!(element_len("string", 0, None), Ok(0));
    }

    #[test]
    fn lossy_text_replaces_invalid_bytes() {
        let bad: &[u8] = &[b'o', 0xFF, b'k'];
        let text = decode_text(Cow::Borrowed(bad), TextPolicy::Lossy).unwrap();
        assert_eq!(text, "o\u{FFFD}k");
        let text = decode_text(Cow::Owned(bad.to_vec()), TextPolicy::Lossy).unwrap();
        assert_eq!(text, "o\u{FFFD}k");
    }

    #[test]
    fn strict_text_rejects_invalid_bytes() {
        let bad: &[u8] = &[0xC3];
        assert!(matches!(
            decode_text(Cow::Borrowed(bad), TextPolicy::Strict),
            Err(Error::Encoding(_))
        ));
        assert!(matches!(
            decode_text(Cow::Owned(bad.to_vec()), TextPolicy::Strict),
            Err(Error::Encoding(_))
        ));
    }

    #[test]
    fn valid_borrowed_text_stays_borrowed() {
        let ok: &[u8] = b"hello";
        assert!(matches!(
            decode_text(Cow::Borrowed(ok), TextPolicy::Strict),
            Ok(Cow::Borrowed("hello"))
        ));
    }
}
