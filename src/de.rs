//! XDR Deserializer (RFC 4506)
//!
//! The [`Deserializer`] reads from any [`Source`]. Over an [`Unmarshaller`]
//! strings and byte slices borrow from the input; over a [`Reader`] they are
//! copied out of the stream.

use std::borrow::Cow;
use std::io::Read;

use crate::error::{Error, Result};
use crate::opaque::{BOUNDED_BYTES_TOKEN, BOUNDED_STR_TOKEN, FIXED_TOKEN};
use crate::primitive::Source;
use crate::reader::Reader;
use crate::unmarshal::Unmarshaller;
use serde::de::{self, Deserialize, DeserializeOwned, SeqAccess, Visitor};

/// Deserialize a value from XDR bytes. Borrowed fields point into `input`.
pub fn from_bytes<'de, T: Deserialize<'de>>(input: &'de [u8]) -> Result<T> {
    from_bytes_partial(input).map(|(value, _)| value)
}

/// Deserialize a value from XDR bytes, also returning remaining unconsumed bytes.
pub fn from_bytes_partial<'de, T: Deserialize<'de>>(input: &'de [u8]) -> Result<(T, &'de [u8])> {
    let mut de = Deserializer::new(Unmarshaller::new(input));
    let value = de.deserialize()?;
    Ok((value, de.source().remaining()))
}

/// Deserialize a value from a stream of XDR bytes.
pub fn from_reader<R: Read, T: DeserializeOwned>(reader: R) -> Result<T> {
    Deserializer::new(Reader::new(reader)).deserialize()
}

/// The XDR deserializer. Generic over any [`Source`].
pub struct Deserializer<S> {
    source: S,
}

impl<S> Deserializer<S> {
    pub fn new(source: S) -> Self {
        Deserializer { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn into_source(self) -> S {
        self.source
    }
}

impl<'de, S: Source<'de>> Deserializer<S> {
    /// Deserialize one value. Fails with the source's first error if any read
    /// failed along the way.
    pub fn deserialize<T: Deserialize<'de>>(&mut self) -> Result<T> {
        let value = T::deserialize(&mut *self);
        let value = self.source.latch_mut().guard(value)?;
        self.source.latch().check()?;
        Ok(value)
    }

    fn read_i32_narrow<T: TryFrom<i32>>(&mut self, what: &'static str, max: u64) -> Result<T> {
        let v = self.source.read_i32()?;
        let narrowed =
            T::try_from(v).map_err(|_| Error::exceeded(what, u64::from(v.unsigned_abs()), max));
        self.source.latch_mut().guard(narrowed)
    }

    fn read_count(&mut self, what: &'static str) -> Result<usize> {
        let count = self.source.read_u32()?;
        if let Some(max) = self.source.options().max_len {
            if count > max {
                let err = Error::exceeded(what, count, max);
                return Err(self.source.latch_mut().record(err));
            }
        }
        Ok(count as usize)
    }
}

fn visit_bytes<'de, V: Visitor<'de>>(bytes: Cow<'de, [u8]>, visitor: V) -> Result<V::Value> {
    match bytes {
        Cow::Borrowed(b) => visitor.visit_borrowed_bytes(b),
        Cow::Owned(v) => visitor.visit_byte_buf(v),
    }
}

fn visit_str<'de, V: Visitor<'de>>(text: Cow<'de, str>, visitor: V) -> Result<V::Value> {
    match text {
        Cow::Borrowed(s) => visitor.visit_borrowed_str(s),
        Cow::Owned(s) => visitor.visit_string(s),
    }
}

// ── Main Deserializer impl ─────────────────────────────────────────────────

impl<'de, 'a, S: Source<'de>> de::Deserializer<'de> for &'a mut Deserializer<S> {
    type Error = Error;

    fn deserialize_any<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value> {
        Err(Error::Unsupported(
            "deserialize_any (XDR is not self-describing)",
        ))
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_bool(self.source.read_bool()?)
    }

    fn deserialize_i8<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_i8(self.read_i32_narrow("int8", i8::MAX as u64)?)
    }

    fn deserialize_i16<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_i16(self.read_i32_narrow("int16", i16::MAX as u64)?)
    }

    fn deserialize_i32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_i32(self.source.read_i32()?)
    }

    fn deserialize_i64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_i64(self.source.read_i64()?)
    }

    fn deserialize_u8<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_u8(self.source.read_u8()?)
    }

    fn deserialize_u16<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_u16(self.source.read_u16()?)
    }

    fn deserialize_u32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_u32(self.source.read_u32()?)
    }

    fn deserialize_u64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_u64(self.source.read_u64()?)
    }

    fn deserialize_f32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_f32(f32::from_bits(self.source.read_u32()?))
    }

    fn deserialize_f64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_f64(f64::from_bits(self.source.read_u64()?))
    }

    fn deserialize_char<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        let v = self.source.read_u32()?;
        let c = char::from_u32(v)
            .ok_or_else(|| Error::Encoding(format!("{v:#x} is not a Unicode scalar value")));
        visitor.visit_char(self.source.latch_mut().guard(c)?)
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visit_str(self.source.read_string()?, visitor)
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visit_str(self.source.read_string()?, visitor)
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visit_bytes(self.source.read_bytes()?, visitor)
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visit_bytes(self.source.read_bytes()?, visitor)
    }

    fn deserialize_option<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value> {
        Err(Error::Unsupported("option"))
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        visitor.visit_unit()
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        let count = self.read_count("array")?;
        visitor.visit_seq(SeqDeserializer::new(self, count))
    }

    fn deserialize_tuple<V: Visitor<'de>>(self, len: usize, visitor: V) -> Result<V::Value> {
        // Fixed-length: no count prefix
        visitor.visit_seq(SeqDeserializer::new(self, len))
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        len: usize,
        visitor: V,
    ) -> Result<V::Value> {
        let max = u32::try_from(len).unwrap_or(u32::MAX);
        if name == FIXED_TOKEN {
            visit_bytes(self.source.read_fixed(len)?, visitor)
        } else if name == BOUNDED_BYTES_TOKEN {
            visit_bytes(self.source.read_bytes_max(Some(max))?, visitor)
        } else if name == BOUNDED_STR_TOKEN {
            visit_str(self.source.read_string_max(Some(max))?, visitor)
        } else {
            visitor.visit_seq(SeqDeserializer::new(self, len))
        }
    }

    fn deserialize_map<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value> {
        Err(Error::Unsupported("map"))
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        // XDR structure: fields in order, no count prefix
        visitor.visit_seq(SeqDeserializer::new(self, fields.len()))
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value> {
        Err(Error::Unsupported("enum"))
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value> {
        Err(Error::Unsupported("identifier"))
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value> {
        Err(Error::Unsupported(
            "deserialize_ignored_any (XDR is not self-describing)",
        ))
    }
}

// ── SeqDeserializer: fixed count ───────────────────────────────────────────

struct SeqDeserializer<'a, S> {
    de: &'a mut Deserializer<S>,
    remaining: usize,
}

impl<'a, S> SeqDeserializer<'a, S> {
    fn new(de: &'a mut Deserializer<S>, count: usize) -> Self {
        SeqDeserializer {
            de,
            remaining: count,
        }
    }
}

impl<'de, 'a, S: Source<'de>> SeqAccess<'de> for SeqDeserializer<'a, S> {
    type Error = Error;

    fn next_element_seed<T: de::DeserializeSeed<'de>>(
        &mut self,
        seed: T,
    ) -> Result<Option<T::Value>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;
        seed.deserialize(&mut *self.de).map(Some)
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.remaining)
    }
}
