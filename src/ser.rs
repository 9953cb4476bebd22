//! XDR Serializer (RFC 4506)
//!
//! The [`Serializer`] drives any [`Sink`], so the same derived `Serialize`
//! impl marshals into memory (`to_bytes`, through a [`Marshaller`]) or onto a
//! stream (`to_writer`, through a [`Writer`]).
//!
//! ## Wire format summary
//! - All values are big-endian (network byte order)
//! - All items are padded to a multiple of 4 bytes
//! - Integers: 4 bytes (signed or unsigned), Hyper: 8 bytes
//! - Floats: IEEE 754, 4 bytes; Doubles: 8 bytes
//! - Strings/Bytes: 4-byte length prefix + data + 0–3 zero-padding bytes
//! - Sequences: 4-byte count prefix + elements
//! - Structs/Tuples: fields encoded consecutively, no length prefix
//!
//! Options, enums and maps have no encoding here and fail with
//! [`Error::Unsupported`].

use crate::error::{Error, Result};
use crate::marshal::Marshaller;
use crate::opaque::{BOUNDED_BYTES_TOKEN, BOUNDED_STR_TOKEN, FIXED_TOKEN};
use crate::primitive::Sink;
use crate::writer::Writer;
use serde::ser::{self, Impossible, Serialize};
use std::io::Write;

// ── Public entry points ────────────────────────────────────────────────────

/// Serialize `value` into a freshly allocated `Vec<u8>` of XDR bytes.
pub fn to_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let mut ser = Serializer::new(Marshaller::new());
    ser.serialize(value)?;
    Ok(ser.into_sink().into_vec())
}

/// Serialize `value` as XDR bytes, writing directly into `writer`. Returns
/// the number of bytes written.
///
/// Unlike [`to_bytes`], this never allocates an intermediate buffer. Useful
/// when writing to a `TcpStream`, `File`, or any other `Write` sink.
pub fn to_writer<W: Write, T: Serialize + ?Sized>(writer: W, value: &T) -> Result<usize> {
    let mut ser = Serializer::new(Writer::new(writer));
    ser.serialize(value)
}

// ── Serializer ─────────────────────────────────────────────────────────────

/// Framing requested by an [`opaque`](crate::opaque) helper for the next
/// bytes or string.
#[derive(Debug, Clone, Copy)]
enum Framing {
    Fixed(usize),
    Bounded(u32),
}

/// The XDR serializer. Generic over any [`Sink`].
///
/// ```rust
/// use xdr_marshal::{Marshaller, Serializer};
///
/// let mut ser = Serializer::new(Marshaller::new());
/// ser.serialize(&42u32).unwrap();
/// assert_eq!(ser.into_sink().as_bytes(), [0, 0, 0, 42]);
/// ```
pub struct Serializer<S: Sink> {
    sink: S,
    framing: Option<Framing>,
}

impl<S: Sink> Serializer<S> {
    /// Create a new serializer that writes into `sink`.
    pub fn new(sink: S) -> Self {
        Serializer {
            sink,
            framing: None,
        }
    }

    /// Serialize one value and return the number of bytes it added. Fails
    /// with the sink's first error if any write failed along the way.
    pub fn serialize<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<usize> {
        let start = self.sink.written();
        let done = value.serialize(&mut *self);
        self.sink.latch_mut().guard(done)?;
        self.sink.latch().check()?;
        Ok(self.sink.written() - start)
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Consume the serializer and return the inner sink.
    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Take the framing requested for this value. A fixed-length request is
    /// written here and yields `None`.
    fn take_max(&mut self, bytes: &[u8]) -> Result<Option<Option<u32>>> {
        match self.framing.take() {
            None => Ok(Some(None)),
            Some(Framing::Bounded(max)) => Ok(Some(Some(max))),
            Some(Framing::Fixed(len)) if bytes.len() == len => {
                self.sink.write_bytes(bytes)?;
                Ok(None)
            }
            Some(Framing::Fixed(len)) => {
                let err = Error::Message(format!(
                    "fixed-length opaque of {len} bytes given {} bytes",
                    bytes.len()
                ));
                Err(self.sink.latch_mut().record(err))
            }
        }
    }
}

// ── serde::Serializer impl ─────────────────────────────────────────────────

impl<'a, S: Sink> ser::Serializer for &'a mut Serializer<S> {
    type Ok = ();
    type Error = Error;

    type SerializeSeq = Self;
    type SerializeTuple = Self;
    type SerializeTupleStruct = Self;
    type SerializeTupleVariant = Impossible<(), Error>;
    type SerializeMap = Impossible<(), Error>;
    type SerializeStruct = Self;
    type SerializeStructVariant = Impossible<(), Error>;

    // ── Primitives ─────────────────────────────────────────────────────────

    /// XDR Bool → 4-byte unsigned int: 0 (false) or 1 (true)
    fn serialize_bool(self, v: bool) -> Result<()> {
        self.sink.write_bool(v).map(drop)
    }

    fn serialize_i8(self, v: i8) -> Result<()> {
        self.sink.write_i32(i32::from(v)).map(drop)
    }
    fn serialize_i16(self, v: i16) -> Result<()> {
        self.sink.write_i32(i32::from(v)).map(drop)
    }
    /// XDR signed integer — 4 bytes, big-endian, two's complement
    fn serialize_i32(self, v: i32) -> Result<()> {
        self.sink.write_i32(v).map(drop)
    }
    /// XDR hyper integer — 8 bytes, big-endian, two's complement
    fn serialize_i64(self, v: i64) -> Result<()> {
        self.sink.write_i64(v).map(drop)
    }

    fn serialize_u8(self, v: u8) -> Result<()> {
        self.sink.write_u8(v).map(drop)
    }
    fn serialize_u16(self, v: u16) -> Result<()> {
        self.sink.write_u16(v).map(drop)
    }
    /// XDR unsigned integer — 4 bytes, big-endian
    fn serialize_u32(self, v: u32) -> Result<()> {
        self.sink.write_u32(v).map(drop)
    }
    /// XDR unsigned hyper integer — 8 bytes, big-endian
    fn serialize_u64(self, v: u64) -> Result<()> {
        self.sink.write_u64(v).map(drop)
    }

    /// XDR single-precision float — IEEE 754, 4 bytes
    fn serialize_f32(self, v: f32) -> Result<()> {
        self.sink.write_u32(v.to_bits()).map(drop)
    }
    /// XDR double-precision float — IEEE 754, 8 bytes
    fn serialize_f64(self, v: f64) -> Result<()> {
        self.sink.write_u64(v.to_bits()).map(drop)
    }

    /// char → XDR unsigned int (Unicode scalar value, 4 bytes)
    fn serialize_char(self, v: char) -> Result<()> {
        self.sink.write_u32(u32::from(v)).map(drop)
    }

    /// XDR string — 4-byte length + UTF-8 bytes + 0–3 zero-padding bytes
    fn serialize_str(self, v: &str) -> Result<()> {
        match self.take_max(v.as_bytes())? {
            Some(max) => self.sink.write_string_max(v, max).map(drop),
            None => Ok(()),
        }
    }

    /// XDR variable-length opaque — 4-byte length + data + 0–3 padding bytes
    fn serialize_bytes(self, v: &[u8]) -> Result<()> {
        match self.take_max(v)? {
            Some(max) => self.sink.write_opaque_max(v, max).map(drop),
            None => Ok(()),
        }
    }

    fn serialize_none(self) -> Result<()> {
        Err(Error::Unsupported("option"))
    }

    fn serialize_some<T: Serialize + ?Sized>(self, _value: &T) -> Result<()> {
        Err(Error::Unsupported("option"))
    }

    /// XDR void — 0 bytes
    fn serialize_unit(self) -> Result<()> {
        Ok(())
    }
    fn serialize_unit_struct(self, _name: &'static str) -> Result<()> {
        Ok(())
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
    ) -> Result<()> {
        Err(Error::Unsupported("enum"))
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<()> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<()> {
        Err(Error::Unsupported("enum"))
    }

    /// XDR variable-length array → 4-byte element count + elements
    fn serialize_seq(self, len: Option<usize>) -> Result<Self::SerializeSeq> {
        let len = self.sink.latch_mut().guard(len.ok_or(Error::LengthRequired))?;
        let count = u32::try_from(len).map_err(|_| Error::exceeded("array", len as u64, u32::MAX));
        let count = self.sink.latch_mut().guard(count)?;
        self.sink.write_u32(count)?;
        Ok(self)
    }

    /// XDR fixed-length array / structure — elements without a length prefix
    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple> {
        Ok(self)
    }

    fn serialize_tuple_struct(
        self,
        name: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        self.framing = if name == FIXED_TOKEN {
            Some(Framing::Fixed(len))
        } else if name == BOUNDED_BYTES_TOKEN || name == BOUNDED_STR_TOKEN {
            Some(Framing::Bounded(u32::try_from(len).unwrap_or(u32::MAX)))
        } else {
            None
        };
        Ok(self)
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Err(Error::Unsupported("enum"))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        Err(Error::Unsupported("map"))
    }

    /// XDR structure — fields encoded consecutively, no count prefix
    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
        Ok(self)
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        Err(Error::Unsupported("enum"))
    }
}

// ── Compound serializer impls ──────────────────────────────────────────────

macro_rules! forward_serialize_element {
    ($t:ty, $method:ident) => {
        impl<'a, S: Sink> $t for &'a mut Serializer<S> {
            type Ok = ();
            type Error = Error;
            fn $method<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
                value.serialize(&mut **self)
            }
            fn end(self) -> Result<()> {
                Ok(())
            }
        }
    };
}

forward_serialize_element!(ser::SerializeSeq, serialize_element);
forward_serialize_element!(ser::SerializeTuple, serialize_element);
forward_serialize_element!(ser::SerializeTupleStruct, serialize_field);

impl<'a, S: Sink> ser::SerializeStruct for &'a mut Serializer<S> {
    type Ok = ();
    type Error = Error;
    fn serialize_field<T: Serialize + ?Sized>(&mut self, _key: &'static str, value: &T) -> Result<()> {
        value.serialize(&mut **self)
    }
    fn end(self) -> Result<()> {
        Ok(())
    }
}
