//! Record codecs: whole records composed from primitive calls.
//!
//! A record encodes its fields in declaration order with no framing of its
//! own. [`Encode`] and [`Decode`] are implemented here for the primitive
//! field types; records implement them either by hand or through
//! [`xdr_record!`](crate::xdr_record), which also enforces per-field maximum
//! lengths through [`EncodeBounded`] and [`DecodeBounded`].
//!
//! Nested records share the sink or source of the outer record, and with it
//! its latch, so a failing inner field aborts the whole record.

use std::borrow::Cow;

use crate::error::Result;
use crate::marshal::Marshaller;
use crate::primitive::{Sink, Source, opaque_len, padded_len};
use crate::unmarshal::Unmarshaller;

/// Upper bound on the buffer [`encode`] reserves up front.
const CAPACITY_LIMIT: usize = 1 << 20;

/// Types that can be written as XDR.
pub trait Encode {
    /// Write `self` to `sink`, field by field.
    fn encode_to<S: Sink + ?Sized>(&self, sink: &mut S) -> Result<()>;

    /// Exact number of bytes [`encode_to`](Encode::encode_to) emits.
    fn encoded_len(&self) -> usize;
}

/// Types that can be read back from XDR. `'de` is the lifetime of borrowed
/// input for zero-copy fields.
pub trait Decode<'de>: Sized {
    fn decode_from<S: Source<'de> + ?Sized>(source: &mut S) -> Result<Self>;
}

/// Variable-length values that can be capped by a declared maximum.
pub trait EncodeBounded: Encode {
    /// Fails with [`Error::ElementSizeExceeded`] before writing anything if
    /// the value is longer than `max`.
    fn encode_bounded<S: Sink + ?Sized>(&self, sink: &mut S, max: u32) -> Result<()>;
}

pub trait DecodeBounded<'de>: Decode<'de> {
    /// Fails with [`Error::ElementSizeExceeded`] if the length prefix is above
    /// `max`, without consuming the payload.
    fn decode_bounded<S: Source<'de> + ?Sized>(source: &mut S, max: u32) -> Result<Self>;
}

// ── Entry points ───────────────────────────────────────────────────────────

/// Encode `record` into a freshly allocated buffer.
pub fn encode<T: Encode + ?Sized>(record: &T) -> Result<Vec<u8>> {
    let mut m = Marshaller::with_capacity(record.encoded_len().min(CAPACITY_LIMIT));
    encode_into(&mut m, record)?;
    Ok(m.into_vec())
}

/// Encode `record` into an existing sink, returning the number of bytes it
/// added. On error the sink keeps whatever was written before the failure.
pub fn encode_into<S: Sink + ?Sized, T: Encode + ?Sized>(sink: &mut S, record: &T) -> Result<usize> {
    let start = sink.written();
    let encoded = record.encode_to(sink);
    sink.latch_mut().guard(encoded)?;
    sink.latch().check()?;
    let n = sink.written() - start;
    tracing::trace!(bytes = n, "encoded record");
    Ok(n)
}

/// Decode a record from the start of `bytes`. Variable-length fields typed as
/// `Cow` borrow from `bytes`.
pub fn decode<'de, T: Decode<'de>>(bytes: &'de [u8]) -> Result<T> {
    decode_partial(bytes).map(|(record, _)| record)
}

/// Decode a record and return it with the unconsumed tail of `bytes`.
pub fn decode_partial<'de, T: Decode<'de>>(bytes: &'de [u8]) -> Result<(T, &'de [u8])> {
    let mut u = Unmarshaller::new(bytes);
    let record = decode_from(&mut u)?;
    Ok((record, u.remaining()))
}

/// Decode a record from an existing source.
pub fn decode_from<'de, S: Source<'de> + ?Sized, T: Decode<'de>>(source: &mut S) -> Result<T> {
    let start = source.consumed();
    let decoded = T::decode_from(source);
    let record = source.latch_mut().guard(decoded)?;
    source.latch().check()?;
    tracing::trace!(bytes = source.consumed() - start, "decoded record");
    Ok(record)
}

// ── Integers ───────────────────────────────────────────────────────────────

macro_rules! primitive_codec {
    ($t:ty, $write:ident, $read:ident, $len:expr) => {
        impl Encode for $t {
            fn encode_to<S: Sink + ?Sized>(&self, sink: &mut S) -> Result<()> {
                sink.$write(*self).map(drop)
            }
            fn encoded_len(&self) -> usize {
                $len
            }
        }

        impl<'de> Decode<'de> for $t {
            fn decode_from<S: Source<'de> + ?Sized>(source: &mut S) -> Result<Self> {
                source.$read()
            }
        }
    };
}

primitive_codec!(u8, write_u8, read_u8, 4);
primitive_codec!(u16, write_u16, read_u16, 4);
primitive_codec!(u32, write_u32, read_u32, 4);
primitive_codec!(u64, write_u64, read_u64, 8);
primitive_codec!(i32, write_i32, read_i32, 4);
primitive_codec!(i64, write_i64, read_i64, 8);
primitive_codec!(bool, write_bool, read_bool, 4);

// ── Fixed-length opaque ────────────────────────────────────────────────────

impl<const N: usize> Encode for [u8; N] {
    fn encode_to<S: Sink + ?Sized>(&self, sink: &mut S) -> Result<()> {
        sink.write_bytes(self).map(drop)
    }
    fn encoded_len(&self) -> usize {
        padded_len(N)
    }
}

impl<'de, const N: usize> Decode<'de> for [u8; N] {
    fn decode_from<S: Source<'de> + ?Sized>(source: &mut S) -> Result<Self> {
        let bytes = source.read_fixed(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(&bytes);
        Ok(out)
    }
}

// ── Variable-length opaque and strings ─────────────────────────────────────

macro_rules! opaque_encode {
    ($t:ty, $write:ident) => {
        impl Encode for $t {
            fn encode_to<S: Sink + ?Sized>(&self, sink: &mut S) -> Result<()> {
                sink.$write(self, None).map(drop)
            }
            fn encoded_len(&self) -> usize {
                opaque_len(self.len())
            }
        }

        impl EncodeBounded for $t {
            fn encode_bounded<S: Sink + ?Sized>(&self, sink: &mut S, max: u32) -> Result<()> {
                sink.$write(self, Some(max)).map(drop)
            }
        }
    };
}

opaque_encode!([u8], write_opaque_max);
opaque_encode!(Vec<u8>, write_opaque_max);
opaque_encode!(Cow<'_, [u8]>, write_opaque_max);
opaque_encode!(str, write_string_max);
opaque_encode!(String, write_string_max);
opaque_encode!(Cow<'_, str>, write_string_max);

impl<'de> Decode<'de> for Vec<u8> {
    fn decode_from<S: Source<'de> + ?Sized>(source: &mut S) -> Result<Self> {
        source.read_bytes().map(Cow::into_owned)
    }
}

impl<'de> DecodeBounded<'de> for Vec<u8> {
    fn decode_bounded<S: Source<'de> + ?Sized>(source: &mut S, max: u32) -> Result<Self> {
        source.read_bytes_max(Some(max)).map(Cow::into_owned)
    }
}

impl<'de> Decode<'de> for Cow<'de, [u8]> {
    fn decode_from<S: Source<'de> + ?Sized>(source: &mut S) -> Result<Self> {
        source.read_bytes()
    }
}

impl<'de> DecodeBounded<'de> for Cow<'de, [u8]> {
    fn decode_bounded<S: Source<'de> + ?Sized>(source: &mut S, max: u32) -> Result<Self> {
        source.read_bytes_max(Some(max))
    }
}

impl<'de> Decode<'de> for String {
    fn decode_from<S: Source<'de> + ?Sized>(source: &mut S) -> Result<Self> {
        source.read_string().map(Cow::into_owned)
    }
}

impl<'de> DecodeBounded<'de> for String {
    fn decode_bounded<S: Source<'de> + ?Sized>(source: &mut S, max: u32) -> Result<Self> {
        source.read_string_max(Some(max)).map(Cow::into_owned)
    }
}

impl<'de> Decode<'de> for Cow<'de, str> {
    fn decode_from<S: Source<'de> + ?Sized>(source: &mut S) -> Result<Self> {
        source.read_string()
    }
}

impl<'de> DecodeBounded<'de> for Cow<'de, str> {
    fn decode_bounded<S: Source<'de> + ?Sized>(source: &mut S, max: u32) -> Result<Self> {
        source.read_string_max(Some(max))
    }
}

// ── References ─────────────────────────────────────────────────────────────

impl<T: Encode + ?Sized> Encode for &T {
    fn encode_to<S: Sink + ?Sized>(&self, sink: &mut S) -> Result<()> {
        (**self).encode_to(sink)
    }
    fn encoded_len(&self) -> usize {
        (**self).encoded_len()
    }
}

impl<T: EncodeBounded + ?Sized> EncodeBounded for &T {
    fn encode_bounded<S: Sink + ?Sized>(&self, sink: &mut S, max: u32) -> Result<()> {
        (**self).encode_bounded(sink, max)
    }
}

impl<T: Encode + ?Sized> Encode for Box<T> {
    fn encode_to<S: Sink + ?Sized>(&self, sink: &mut S) -> Result<()> {
        (**self).encode_to(sink)
    }
    fn encoded_len(&self) -> usize {
        (**self).encoded_len()
    }
}

impl<'de, T: Decode<'de>> Decode<'de> for Box<T> {
    fn decode_from<S: Source<'de> + ?Sized>(source: &mut S) -> Result<Self> {
        T::decode_from(source).map(Box::new)
    }
}

// ── Generated codecs ───────────────────────────────────────────────────────

/// Declare a record struct together with its [`Encode`] and [`Decode`]
/// implementations.
///
/// Fields are encoded in declaration order. A variable-length field may
/// declare a maximum with `[max = N]`; encoding rejects longer values before
/// writing them, and decoding rejects longer length prefixes.
///
/// ```rust
/// use xdr_marshal::{decode, encode, xdr_record};
///
/// xdr_record! {
///     #[derive(Debug, PartialEq)]
///     pub struct Announce {
///         pub id: u64,
///         pub port: u16,
///         pub name: String [max = 64],
///         pub key: [u8; 6],
///     }
/// }
///
/// let a = Announce { id: 1, port: 22000, name: "node".into(), key: [7; 6] };
/// let bytes = encode(&a).unwrap();
/// assert_eq!(bytes.len(), 8 + 4 + 8 + 8);
/// assert_eq!(decode::<Announce>(&bytes).unwrap(), a);
/// ```
#[macro_export]
macro_rules! xdr_record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$fmeta:meta])*
                $fvis:vis $field:ident : $ty:ty $([max = $max:expr])?
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[$fmeta])*
                $fvis $field: $ty,
            )*
        }

        impl $crate::Encode for $name {
            fn encode_to<S: $crate::Sink + ?Sized>(&self, sink: &mut S) -> $crate::Result<()> {
                $( $crate::__xdr_encode_field!(sink, &self.$field $(, $max)?); )*
                Ok(())
            }

            fn encoded_len(&self) -> usize {
                0 $( + $crate::Encode::encoded_len(&self.$field) )*
            }
        }

        impl<'de> $crate::Decode<'de> for $name {
            fn decode_from<S: $crate::Source<'de> + ?Sized>(source: &mut S) -> $crate::Result<Self> {
                Ok($name {
                    $( $field: $crate::__xdr_decode_field!('de, source, $ty $(, $max)?), )*
                })
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __xdr_encode_field {
    ($sink:ident, $value:expr) => {
        $crate::Encode::encode_to($value, $sink)?
    };
    ($sink:ident, $value:expr, $max:expr) => {
        $crate::EncodeBounded::encode_bounded($value, $sink, $max)?
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __xdr_decode_field {
    ($de:lifetime, $source:ident, $ty:ty) => {
        <$ty as $crate::Decode<$de>>::decode_from($source)?
    };
    ($de:lifetime, $source:ident, $ty:ty, $max:expr) => {
        <$ty as $crate::DecodeBounded<$de>>::decode_bounded($source, $max)?
    };
}
