//! Opaque and bounded field helpers for the serde layer.
//!
//! serde has no notion of "these bytes have no length prefix" or "this
//! string may not exceed N bytes". The helpers here pass that information to
//! [`Serializer`](crate::Serializer) and [`Deserializer`](crate::Deserializer)
//! through a tuple struct with a reserved name. The tuple struct always holds
//! exactly one field, and its declared length is not a field count: it
//! carries the fixed length or the maximum, which is the only value serde
//! lets a type hand to a deserializer before any data is read.
//!
//! These types are meant for this crate's format. Another serde format sees
//! a single-field tuple struct whose declared length disagrees with its
//! contents, so formats that check that length will reject it, and none of
//! them enforce the bound.
//!
//! # Fixed-length opaque
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use xdr_marshal::{from_bytes, to_bytes};
//!
//! #[derive(Debug, PartialEq, Serialize, Deserialize)]
//! struct Session {
//!     seq: u32,
//!     #[serde(with = "xdr_marshal::opaque::fixed")]
//!     token: [u8; 6],
//! }
//!
//! let s = Session { seq: 1, token: [1, 2, 3, 4, 5, 6] };
//! let bytes = to_bytes(&s).unwrap();
//! // 4 (seq) + 6 raw bytes + 2 padding, no length prefix
//! assert_eq!(bytes.len(), 12);
//! assert_eq!(&bytes[4..], [1, 2, 3, 4, 5, 6, 0, 0]);
//! assert_eq!(from_bytes::<Session>(&bytes).unwrap(), s);
//! ```
//!
//! # Bounded variable-length data
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use xdr_marshal::opaque::BoundedString;
//! use xdr_marshal::{Error, to_bytes};
//!
//! #[derive(Serialize, Deserialize)]
//! struct Label {
//!     text: BoundedString<4>,
//! }
//!
//! let err = to_bytes(&Label { text: "too long".into() }).unwrap_err();
//! assert!(matches!(err, Error::ElementSizeExceeded { limit: 4, .. }));
//! ```

use std::fmt;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};

use serde::de::{self, Deserializer, SeqAccess, Visitor};
use serde::ser::{SerializeTupleStruct, Serializer};
use serde::{Deserialize, Serialize};

pub(crate) const FIXED_TOKEN: &str = "$xdr_marshal::fixed";
pub(crate) const BOUNDED_BYTES_TOKEN: &str = "$xdr_marshal::bounded_bytes";
pub(crate) const BOUNDED_STR_TOKEN: &str = "$xdr_marshal::bounded_str";

/// Raw bytes handed to `serialize_bytes` inside a reserved tuple struct.
struct RawBytes<'a>(&'a [u8]);

impl Serialize for RawBytes<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(self.0)
    }
}

/// One-field tuple struct under `token`; `len` is the fixed length or bound.
fn serialize_framed<S: Serializer, T: Serialize + ?Sized>(
    serializer: S,
    token: &'static str,
    len: usize,
    inner: &T,
) -> Result<S::Ok, S::Error> {
    let mut ts = serializer.serialize_tuple_struct(token, len)?;
    ts.serialize_field(inner)?;
    ts.end()
}

/// Byte visitor shared by the helpers. `F` turns the bytes into the target.
struct BytesVisitor<T, F> {
    expecting: String,
    convert: F,
    marker: PhantomData<T>,
}

impl<T, F> BytesVisitor<T, F> {
    fn new(expecting: String, convert: F) -> Self {
        BytesVisitor {
            expecting,
            convert,
            marker: PhantomData,
        }
    }
}

impl<'de, T, F> Visitor<'de> for BytesVisitor<T, F>
where
    F: FnOnce(Vec<u8>) -> Option<T>,
{
    type Value = T;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expecting)
    }

    fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<T, E> {
        self.visit_byte_buf(v.to_vec())
    }

    fn visit_byte_buf<E: de::Error>(self, v: Vec<u8>) -> Result<T, E> {
        let len = v.len();
        match (self.convert)(v) {
            Some(value) => Ok(value),
            None => Err(E::invalid_length(len, &self.expecting.as_str())),
        }
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<T, E> {
        self.visit_bytes(v.as_bytes())
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<T, E> {
        self.visit_byte_buf(v.into_bytes())
    }

    // Non-XDR formats hand the single tuple-struct field over as a sequence.
    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<T, A::Error> {
        match seq.next_element::<AnyBytes>()? {
            Some(buf) => self.visit_byte_buf(buf.0),
            None => Err(de::Error::invalid_length(0, &self.expecting.as_str())),
        }
    }
}

/// Bytes or a string taken as an owned buffer.
struct AnyBytes(Vec<u8>);

impl<'de> Deserialize<'de> for AnyBytes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let visitor = BytesVisitor::new("bytes or a string".to_owned(), |v: Vec<u8>| Some(AnyBytes(v)));
        deserializer.deserialize_byte_buf(visitor)
    }
}

// ── Fixed-length opaque ────────────────────────────────────────────────────

/// `#[serde(with = "xdr_marshal::opaque::fixed")]` for `[u8; N]` fields:
/// the raw bytes followed by padding, with no length prefix.
pub mod fixed {
    use super::*;

    pub fn serialize<S: Serializer, const N: usize>(
        value: &[u8; N],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serialize_framed(serializer, FIXED_TOKEN, N, &RawBytes(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>, const N: usize>(
        deserializer: D,
    ) -> Result<[u8; N], D::Error> {
        let visitor = BytesVisitor::new(format!("fixed-length opaque ({N} bytes)"), |v: Vec<u8>| {
            <[u8; N]>::try_from(v).ok()
        });
        deserializer.deserialize_tuple_struct(FIXED_TOKEN, N, visitor)
    }
}

// ── Bounded variable-length data ───────────────────────────────────────────

/// Variable-length opaque data of at most `MAX` bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct BoundedBytes<const MAX: u32>(pub Vec<u8>);

/// A string of at most `MAX` bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct BoundedString<const MAX: u32>(pub String);

impl<const MAX: u32> BoundedBytes<MAX> {
    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }
}

impl<const MAX: u32> BoundedString<MAX> {
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl<const MAX: u32> Deref for BoundedBytes<MAX> {
    type Target = Vec<u8>;
    fn deref(&self) -> &Vec<u8> {
        &self.0
    }
}

impl<const MAX: u32> DerefMut for BoundedBytes<MAX> {
    fn deref_mut(&mut self) -> &mut Vec<u8> {
        &mut self.0
    }
}

impl<const MAX: u32> Deref for BoundedString<MAX> {
    type Target = String;
    fn deref(&self) -> &String {
        &self.0
    }
}

impl<const MAX: u32> DerefMut for BoundedString<MAX> {
    fn deref_mut(&mut self) -> &mut String {
        &mut self.0
    }
}

impl<const MAX: u32> From<Vec<u8>> for BoundedBytes<MAX> {
    fn from(v: Vec<u8>) -> Self {
        BoundedBytes(v)
    }
}

impl<const MAX: u32> From<&[u8]> for BoundedBytes<MAX> {
    fn from(v: &[u8]) -> Self {
        BoundedBytes(v.to_vec())
    }
}

impl<const MAX: u32> From<String> for BoundedString<MAX> {
    fn from(s: String) -> Self {
        BoundedString(s)
    }
}

impl<const MAX: u32> From<&str> for BoundedString<MAX> {
    fn from(s: &str) -> Self {
        BoundedString(s.to_owned())
    }
}

impl<const MAX: u32> Serialize for BoundedBytes<MAX> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_framed(serializer, BOUNDED_BYTES_TOKEN, MAX as usize, &RawBytes(&self.0))
    }
}

impl<const MAX: u32> Serialize for BoundedString<MAX> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_framed(serializer, BOUNDED_STR_TOKEN, MAX as usize, self.0.as_str())
    }
}

impl<'de, const MAX: u32> Deserialize<'de> for BoundedBytes<MAX> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let visitor = BytesVisitor::new(format!("opaque of at most {MAX} bytes"), |v: Vec<u8>| {
            (v.len() <= MAX as usize).then_some(BoundedBytes(v))
        });
        deserializer.deserialize_tuple_struct(BOUNDED_BYTES_TOKEN, MAX as usize, visitor)
    }
}

impl<'de, const MAX: u32> Deserialize<'de> for BoundedString<MAX> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // The bound applies to the wire length, which the deserializer checks
        // before decoding. Lossy decoding can grow the text.
        let visitor = BytesVisitor::new(format!("string of at most {MAX} bytes"), |v: Vec<u8>| {
            String::from_utf8(v).ok().map(BoundedString)
        });
        deserializer.deserialize_tuple_struct(BOUNDED_STR_TOKEN, MAX as usize, visitor)
    }
}
