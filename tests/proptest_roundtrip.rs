//! Property-based tests for the wire rules and codec equivalence.

#![allow(clippy::expect_used)]

use std::io::Cursor;

use proptest::prelude::*;
use serde::{Deserialize, Serialize};
use xdr_marshal::schema::{Field, FieldKind, Schema, Value};
use xdr_marshal::{
    Error, Marshaller, Reader, Sink, Source, Unmarshaller, Writer, decode, encode, from_bytes,
    from_reader, opaque_len, to_bytes, xdr_record,
};

xdr_record! {
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Sample {
        i1: u64,
        i2: u32,
        i3: u16,
        i4: u8,
        #[serde(with = "serde_bytes")]
        bs0: Vec<u8> [max = 128],
        #[serde(with = "serde_bytes")]
        bs1: Vec<u8>,
        s0: String [max = 128],
        s1: String,
    }
}

fn arb_sample() -> impl Strategy<Value = Sample> {
    (
        any::<u64>(),
        any::<u32>(),
        any::<u16>(),
        any::<u8>(),
        prop::collection::vec(any::<u8>(), 0..=128),
        prop::collection::vec(any::<u8>(), 0..200),
        "\\PC{0,32}",
        ".{0,64}",
    )
        .prop_map(|(i1, i2, i3, i4, bs0, bs1, s0, s1)| Sample { i1, i2, i3, i4, bs0, bs1, s0, s1 })
        // A multi-byte string of 32 chars can exceed the 128-byte bound.
        .prop_filter("s0 within bound", |s| s.s0.len() <= 128)
}

fn sample_schema() -> Schema {
    Schema::new(
        "sample",
        vec![
            Field::new("i1", FieldKind::U64),
            Field::new("i2", FieldKind::U32),
            Field::new("i3", FieldKind::U16),
            Field::new("i4", FieldKind::U8),
            Field::new("bs0", FieldKind::Bytes).max(128),
            Field::new("bs1", FieldKind::Bytes),
            Field::new("s0", FieldKind::String).max(128),
            Field::new("s1", FieldKind::String),
        ],
    )
    .expect("valid schema")
}

fn sample_values(s: &Sample) -> Vec<Value> {
    vec![
        Value::U64(s.i1),
        Value::U32(s.i2),
        Value::U16(s.i3),
        Value::U8(s.i4),
        Value::from(s.bs0.clone()),
        Value::from(s.bs1.clone()),
        Value::from(s.s0.clone()),
        Value::from(s.s1.clone()),
    ]
}

proptest! {
    #[test]
    fn opaque_is_aligned_and_zero_padded(data in prop::collection::vec(any::<u8>(), 0..64)) {
        let mut m = Marshaller::new();
        let n = m.write_opaque(&data).expect("write");
        let bytes = m.as_bytes();
        prop_assert_eq!(n, opaque_len(data.len()));
        prop_assert_eq!(bytes.len() % 4, 0);
        prop_assert_eq!(&bytes[..4], &(data.len() as u32).to_be_bytes()[..]);
        prop_assert_eq!(&bytes[4..4 + data.len()], &data[..]);
        prop_assert!(bytes[4 + data.len()..].iter().all(|&b| b == 0));

        let mut u = Unmarshaller::new(bytes);
        prop_assert_eq!(&*u.read_bytes().expect("read"), &data[..]);
        prop_assert!(u.remaining().is_empty());
    }

    #[test]
    fn integers_roundtrip_on_both_sources(a in any::<u32>(), b in any::<u64>(), c in any::<u16>(), d in any::<u8>()) {
        let mut w = Writer::new(Vec::new());
        w.write_u32(a).expect("u32");
        w.write_u64(b).expect("u64");
        w.write_u16(c).expect("u16");
        w.write_u8(d).expect("u8");
        let bytes = w.into_inner();
        prop_assert_eq!(bytes.len(), 20);

        let mut u = Unmarshaller::new(&bytes);
        let mut r = Reader::new(Cursor::new(&bytes));
        prop_assert_eq!(u.read_u32(), Ok(a));
        prop_assert_eq!(r.read_u32(), Ok(a));
        prop_assert_eq!(u.read_u64(), Ok(b));
        prop_assert_eq!(r.read_u64(), Ok(b));
        prop_assert_eq!(u.read_u16(), Ok(c));
        prop_assert_eq!(r.read_u16(), Ok(c));
        prop_assert_eq!(u.read_u8(), Ok(d));
        prop_assert_eq!(r.read_u8(), Ok(d));
    }

    #[test]
    fn record_roundtrip(s in arb_sample()) {
        let bytes = encode(&s).expect("encode");
        prop_assert_eq!(bytes.len(), xdr_marshal::Encode::encoded_len(&s));
        prop_assert_eq!(decode::<Sample>(&bytes).expect("decode"), s);
    }

    #[test]
    fn all_three_codecs_agree(s in arb_sample()) {
        let generated = encode(&s).expect("encode");
        let via_schema = sample_schema().encode(&sample_values(&s)).expect("schema encode");
        let via_serde = to_bytes(&s).expect("serde encode");
        prop_assert_eq!(&generated, &via_schema);
        prop_assert_eq!(&generated, &via_serde);

        prop_assert_eq!(from_bytes::<Sample>(&generated).expect("serde decode"), s.clone());
        prop_assert_eq!(from_reader::<_, Sample>(&generated[..]).expect("serde stream"), s.clone());
        prop_assert_eq!(sample_schema().decode(&generated).expect("schema decode"), sample_values(&s));
    }

    #[test]
    fn truncation_is_always_eof(s in arb_sample(), cut in any::<prop::sample::Index>()) {
        let bytes = encode(&s).expect("encode");
        let cut = cut.index(bytes.len());
        prop_assert_eq!(decode::<Sample>(&bytes[..cut]), Err(Error::UnexpectedEof));
    }

    #[test]
    fn decoding_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        let _ = decode::<Sample>(&bytes);
        let _ = from_bytes::<Sample>(&bytes);
        let _ = sample_schema().decode(&bytes);
    }
}
