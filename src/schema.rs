//! Schema-driven record codec.
//!
//! A [`Schema`] is an ordered list of [`Field`] descriptors supplied at run
//! time. Encoding walks the fields in order and issues one primitive call per
//! field; decoding walks them in the same order and produces one [`Value`]
//! per field.
//!
//! ```rust
//! use xdr_marshal::schema::{Field, FieldKind, Schema, Value};
//!
//! let schema = Schema::new("device", vec![
//!     Field::new("id", FieldKind::U64),
//!     Field::new("name", FieldKind::String).max(64),
//! ]).unwrap();
//!
//! let values = vec![Value::U64(7), Value::from("laptop")];
//! let bytes = schema.encode(&values).unwrap();
//! assert_eq!(bytes.len(), 8 + 4 + 8);
//! assert_eq!(schema.decode(&bytes).unwrap(), values);
//! ```

use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::primitive::{Sink, Source, opaque_len, padded_len};
use crate::record::{self, Encode};
use crate::unmarshal::Unmarshaller;

/// Wire type of one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    U8,
    U16,
    U32,
    U64,
    /// Opaque data of a length both sides know; no prefix on the wire.
    Fixed(usize),
    /// Length-prefixed opaque data.
    Bytes,
    /// Length-prefixed UTF-8 text.
    String,
    /// Another record, encoded inline.
    Record(Box<Schema>),
}

impl FieldKind {
    /// Whether a declared maximum length applies to this kind.
    pub fn is_variable(&self) -> bool {
        matches!(self, FieldKind::Bytes | FieldKind::String)
    }

    fn describe(&self) -> String {
        match self {
            FieldKind::U8 => "uint8".into(),
            FieldKind::U16 => "uint16".into(),
            FieldKind::U32 => "uint32".into(),
            FieldKind::U64 => "uint64".into(),
            FieldKind::Fixed(n) => format!("fixed[{n}]"),
            FieldKind::Bytes => "bytes".into(),
            FieldKind::String => "string".into(),
            FieldKind::Record(schema) => format!("record `{}`", schema.name),
        }
    }
}

/// One entry of a record schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    name: String,
    kind: FieldKind,
    max: Option<u32>,
}

impl Field {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Field {
            name: name.into(),
            kind,
            max: None,
        }
    }

    /// Declare a maximum length. Only valid on `Bytes` and `String` fields;
    /// [`Schema::new`] rejects it elsewhere.
    pub fn max(mut self, max: u32) -> Self {
        self.max = Some(max);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn max_len(&self) -> Option<u32> {
        self.max
    }
}

/// A decoded or to-be-encoded field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    /// Payload of a `Fixed` or `Bytes` field.
    Bytes(Vec<u8>),
    String(String),
    Record(Vec<Value>),
}

impl Value {
    fn describe(&self) -> String {
        match self {
            Value::U8(_) => "uint8".into(),
            Value::U16(_) => "uint16".into(),
            Value::U32(_) => "uint32".into(),
            Value::U64(_) => "uint64".into(),
            Value::Bytes(b) => format!("bytes[{}]", b.len()),
            Value::String(_) => "string".into(),
            Value::Record(v) => format!("record of {} values", v.len()),
        }
    }
}

macro_rules! value_from {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::$variant(v.into())
                }
            }
        )*
    };
}

value_from! {
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    Vec<u8> => Bytes,
    &[u8] => Bytes,
    String => String,
    &str => String,
    Vec<Value> => Record,
}

/// Ordered field list of one record kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    name: String,
    fields: Vec<Field>,
}

impl Schema {
    /// Build a schema, rejecting duplicate field names, maxima declared on
    /// fields that are not variable-length, and fixed widths above `u32::MAX`.
    pub fn new(name: impl Into<String>, fields: Vec<Field>) -> Result<Self> {
        let name = name.into();
        let mut seen = HashSet::new();
        for field in &fields {
            if !seen.insert(field.name.as_str()) {
                return Err(Error::Schema(format!(
                    "record `{name}`: duplicate field `{}`",
                    field.name
                )));
            }
            if field.max.is_some() && !field.kind.is_variable() {
                return Err(Error::Schema(format!(
                    "record `{name}`: field `{}` of kind {} cannot declare a maximum length",
                    field.name,
                    field.kind.describe()
                )));
            }
            if let FieldKind::Fixed(n) = field.kind {
                if u32::try_from(n).is_err() {
                    return Err(Error::Schema(format!(
                        "record `{name}`: fixed field `{}` is {n} bytes, above the XDR limit of {}",
                        field.name,
                        u32::MAX
                    )));
                }
            }
        }
        tracing::debug!(schema = %name, fields = fields.len(), "built record schema");
        Ok(Schema { name, fields })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Pair this schema with values so they can go through the generic
    /// [`Encode`] entry points.
    pub fn bind<'a>(&'a self, values: &'a [Value]) -> Bound<'a> {
        Bound {
            schema: self,
            values,
        }
    }

    pub fn encode(&self, values: &[Value]) -> Result<Vec<u8>> {
        record::encode(&self.bind(values))
    }

    pub fn encode_into<S: Sink + ?Sized>(&self, sink: &mut S, values: &[Value]) -> Result<usize> {
        record::encode_into(sink, &self.bind(values))
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<Vec<Value>> {
        self.decode_from(&mut Unmarshaller::new(bytes))
    }

    pub fn decode_from<'de, S: Source<'de> + ?Sized>(&self, source: &mut S) -> Result<Vec<Value>> {
        let decoded = self.read_fields(source);
        let values = source.latch_mut().guard(decoded)?;
        source.latch().check()?;
        Ok(values)
    }

    fn write_fields<S: Sink + ?Sized>(&self, sink: &mut S, values: &[Value]) -> Result<()> {
        if values.len() != self.fields.len() {
            let err = Error::Schema(format!(
                "record `{}`: expected {} values, found {}",
                self.name,
                self.fields.len(),
                values.len()
            ));
            return Err(sink.latch_mut().record(err));
        }
        for (field, value) in self.fields.iter().zip(values) {
            write_field(sink, field, value)?;
        }
        Ok(())
    }

    fn read_fields<'de, S: Source<'de> + ?Sized>(&self, source: &mut S) -> Result<Vec<Value>> {
        self.fields
            .iter()
            .map(|field| read_field(source, field))
            .collect()
    }

    fn len_of(&self, values: &[Value]) -> usize {
        self.fields
            .iter()
            .zip(values)
            .map(|(field, value)| match (&field.kind, value) {
                (FieldKind::U64, _) => 8,
                (FieldKind::Fixed(n), _) => padded_len(*n),
                (FieldKind::Bytes, Value::Bytes(b)) => opaque_len(b.len()),
                (FieldKind::String, Value::String(s)) => opaque_len(s.len()),
                (FieldKind::Record(schema), Value::Record(inner)) => schema.len_of(inner),
                _ => 4,
            })
            .fold(0, usize::saturating_add)
    }
}

fn write_field<S: Sink + ?Sized>(sink: &mut S, field: &Field, value: &Value) -> Result<()> {
    match (&field.kind, value) {
        (FieldKind::U8, Value::U8(v)) => sink.write_u8(*v).map(drop),
        (FieldKind::U16, Value::U16(v)) => sink.write_u16(*v).map(drop),
        (FieldKind::U32, Value::U32(v)) => sink.write_u32(*v).map(drop),
        (FieldKind::U64, Value::U64(v)) => sink.write_u64(*v).map(drop),
        (FieldKind::Fixed(n), Value::Bytes(b)) if b.len() == *n => sink.write_bytes(b).map(drop),
        (FieldKind::Bytes, Value::Bytes(b)) => sink.write_opaque_max(b, field.max).map(drop),
        (FieldKind::String, Value::String(s)) => sink.write_string_max(s, field.max).map(drop),
        (FieldKind::Record(schema), Value::Record(values)) => schema.write_fields(sink, values),
        (kind, value) => {
            let err = Error::Schema(format!(
                "field `{}`: expected {}, found {}",
                field.name,
                kind.describe(),
                value.describe()
            ));
            Err(sink.latch_mut().record(err))
        }
    }
}

fn read_field<'de, S: Source<'de> + ?Sized>(source: &mut S, field: &Field) -> Result<Value> {
    let value = match &field.kind {
        FieldKind::U8 => Value::U8(source.read_u8()?),
        FieldKind::U16 => Value::U16(source.read_u16()?),
        FieldKind::U32 => Value::U32(source.read_u32()?),
        FieldKind::U64 => Value::U64(source.read_u64()?),
        FieldKind::Fixed(n) => Value::Bytes(source.read_fixed(*n)?.into_owned()),
        FieldKind::Bytes => {
            let max = field.max.or(source.options().max_len);
            Value::Bytes(source.read_bytes_max(max)?.into_owned())
        }
        FieldKind::String => {
            let max = field.max.or(source.options().max_len);
            Value::String(source.read_string_max(max)?.into_owned())
        }
        FieldKind::Record(schema) => Value::Record(schema.read_fields(source)?),
    };
    Ok(value)
}

/// A schema paired with the values of one record.
#[derive(Debug, Clone, Copy)]
pub struct Bound<'a> {
    schema: &'a Schema,
    values: &'a [Value],
}

impl Encode for Bound<'_> {
    fn encode_to<S: Sink + ?Sized>(&self, sink: &mut S) -> Result<()> {
        self.schema.write_fields(sink, self.values)
    }

    fn encoded_len(&self) -> usize {
        self.schema.len_of(self.values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_max_on_fixed_width_fields() {
        let err = Schema::new("bad", vec![Field::new("n", FieldKind::U32).max(4)]).unwrap_err();
        assert!(matches!(err, Error::Schema(msg) if msg.contains("`n`")));

        let err = Schema::new("bad", vec![Field::new("k", FieldKind::Fixed(4)).max(4)]);
        assert!(err.is_err());
    }

    #[test]
    fn rejects_duplicate_names() {
        let err = Schema::new(
            "dup",
            vec![Field::new("a", FieldKind::U8), Field::new("a", FieldKind::U16)],
        );
        assert!(matches!(err, Err(Error::Schema(_))));
    }

    #[test]
    fn encoded_len_is_exact_for_matching_values() {
        let inner = Schema::new("inner", vec![Field::new("s", FieldKind::String)]).unwrap();
        let schema = Schema::new(
            "outer",
            vec![
                Field::new("a", FieldKind::U64),
                Field::new("b", FieldKind::Fixed(5)),
                Field::new("c", FieldKind::Bytes),
                Field::new("d", FieldKind::Record(Box::new(inner))),
            ],
        )
        .unwrap();
        let values = vec![
            Value::U64(1),
            Value::from(&[1u8, 2, 3, 4, 5][..]),
            Value::from(vec![9u8; 2]),
            Value::Record(vec![Value::from("xyz")]),
        ];
        let bound = schema.bind(&values);
        assert_eq!(bound.encoded_len(), schema.encode(&values).unwrap().len());
    }
}
