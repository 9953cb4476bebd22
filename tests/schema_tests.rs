use std::io::Cursor;

use xdr_marshal::schema::{Field, FieldKind, Schema, Value};
use xdr_marshal::{Encode, Error, Marshaller, Options, Reader, Sink, Source, Unmarshaller, Writer, encode};

fn bench_schema() -> Schema {
    Schema::new(
        "XDRBenchStruct",
        vec![
            Field::new("I1", FieldKind::U64),
            Field::new("I2", FieldKind::U32),
            Field::new("I3", FieldKind::U16),
            Field::new("I4", FieldKind::U8),
            Field::new("Bs0", FieldKind::Bytes).max(128),
            Field::new("Bs1", FieldKind::Bytes),
            Field::new("S0", FieldKind::String).max(128),
            Field::new("S1", FieldKind::String),
        ],
    )
    .unwrap()
}

fn bench_values() -> Vec<Value> {
    vec![
        Value::U64(1),
        Value::U32(2),
        Value::U16(3),
        Value::U8(4),
        Value::from(vec![0xAA; 10]),
        Value::from(vec![0xBB; 10]),
        Value::from("Hello world! It's a beautiful day."),
        Value::from("Hello world! It's a beautiful day."),
    ]
}

#[test]
fn roundtrip_through_buffer_and_stream() {
    let schema = bench_schema();
    let values = bench_values();
    let bytes = schema.encode(&values).unwrap();
    assert_eq!(bytes.len() % 4, 0);

    assert_eq!(schema.decode(&bytes).unwrap(), values);

    let mut r = Reader::new(Cursor::new(&bytes));
    assert_eq!(schema.decode_from(&mut r).unwrap(), values);
    assert_eq!(r.consumed(), bytes.len());

    let mut w = Writer::new(Vec::new());
    assert_eq!(schema.encode_into(&mut w, &values).unwrap(), bytes.len());
    assert_eq!(w.into_inner(), bytes);
}

#[test]
fn schema_and_generic_entry_points_agree() {
    let schema = bench_schema();
    let values = bench_values();
    let bound = schema.bind(&values);
    assert_eq!(encode(&bound).unwrap(), schema.encode(&values).unwrap());
    assert_eq!(bound.encoded_len(), schema.encode(&values).unwrap().len());
}

#[test]
fn declared_max_applies_in_both_directions() {
    let schema = bench_schema();
    let mut values = bench_values();
    values[6] = Value::from("x".repeat(129));
    let mut m = Marshaller::new();
    let err = schema.encode_into(&mut m, &values).unwrap_err();
    assert_eq!(err, Error::ElementSizeExceeded { what: "string", size: 129, limit: 128 });
    // Everything up to the oversized field was written.
    assert_eq!(m.len(), 8 + 4 + 4 + 4 + 16 + 16);

    // A peer without the bound produces bytes this schema must refuse.
    let unbounded = Schema::new(
        "loose",
        bench_schema()
            .fields()
            .iter()
            .map(|f| Field::new(f.name(), f.kind().clone()))
            .collect(),
    )
    .unwrap();
    let bytes = unbounded.encode(&values).unwrap();
    assert_eq!(
        schema.decode(&bytes),
        Err(Error::ElementSizeExceeded { what: "string", size: 129, limit: 128 })
    );
}

#[test]
fn options_bound_fields_without_declared_max() {
    let schema = Schema::new("blob", vec![Field::new("data", FieldKind::Bytes)]).unwrap();
    let bytes = schema.encode(&[Value::from(vec![1u8; 40])]).unwrap();

    let mut u = Unmarshaller::with_options(&bytes, Options::new().max_len(32));
    assert!(matches!(
        schema.decode_from(&mut u),
        Err(Error::ElementSizeExceeded { limit: 32, .. })
    ));
    assert_eq!(u.position(), 4);
}

#[test]
fn fixed_fields_have_no_prefix() {
    let schema = Schema::new(
        "stateid",
        vec![Field::new("seq", FieldKind::U32), Field::new("other", FieldKind::Fixed(5))],
    )
    .unwrap();
    let values = vec![Value::U32(9), Value::from(&[1u8, 2, 3, 4, 5][..])];
    let bytes = schema.encode(&values).unwrap();
    assert_eq!(bytes, [0, 0, 0, 9, 1, 2, 3, 4, 5, 0, 0, 0]);
    assert_eq!(schema.decode(&bytes).unwrap(), values);

    // Truncated padding
    assert_eq!(schema.decode(&bytes[..10]), Err(Error::UnexpectedEof));
}

#[test]
fn widest_fixed_field_fails_cleanly() {
    #[cfg(target_pointer_width = "64")]
    assert!(matches!(
        Schema::new("s", vec![Field::new("k", FieldKind::Fixed(usize::MAX))]),
        Err(Error::Schema(msg)) if msg.contains("`k`")
    ));

    let schema =
        Schema::new("s", vec![Field::new("k", FieldKind::Fixed(u32::MAX as usize))]).unwrap();
    assert!(matches!(schema.encode(&[Value::from(vec![1u8, 2, 3])]), Err(Error::Schema(_))));
    assert_eq!(schema.decode(&[0, 0, 0, 0]), Err(Error::UnexpectedEof));
}

#[test]
fn nested_schema_encodes_inline() {
    let endpoint = Schema::new(
        "endpoint",
        vec![Field::new("port", FieldKind::U16), Field::new("host", FieldKind::String).max(16)],
    )
    .unwrap();
    let peer = Schema::new(
        "peer",
        vec![
            Field::new("id", FieldKind::Fixed(6)),
            Field::new("endpoint", FieldKind::Record(Box::new(endpoint))),
            Field::new("seen", FieldKind::U64),
        ],
    )
    .unwrap();

    let values = vec![
        Value::from(vec![1u8, 2, 3, 4, 5, 6]),
        Value::Record(vec![Value::U16(22000), Value::from("10.0.0.1")]),
        Value::U64(99),
    ];
    let bytes = peer.encode(&values).unwrap();
    assert_eq!(bytes.len(), 8 + 4 + 12 + 8);
    assert_eq!(peer.decode(&bytes).unwrap(), values);
}

#[test]
fn mismatched_values_are_schema_errors() {
    let schema = bench_schema();

    let mut wrong_kind = bench_values();
    wrong_kind[1] = Value::U64(2);
    assert!(matches!(schema.encode(&wrong_kind), Err(Error::Schema(msg)) if msg.contains("`I2`")));

    let short = &bench_values()[..3];
    assert!(matches!(schema.encode(short), Err(Error::Schema(_))));

    let fixed = Schema::new("f", vec![Field::new("k", FieldKind::Fixed(4))]).unwrap();
    assert!(matches!(fixed.encode(&[Value::from(vec![0u8; 3])]), Err(Error::Schema(_))));
}

#[test]
fn first_error_is_sticky_across_records() {
    let schema = Schema::new("n", vec![Field::new("v", FieldKind::U32)]).unwrap();
    let bytes = [0, 0, 0, 1, 0, 0];
    let mut u = Unmarshaller::new(&bytes);
    assert_eq!(schema.decode_from(&mut u).unwrap(), [Value::U32(1)]);
    assert_eq!(schema.decode_from(&mut u), Err(Error::UnexpectedEof));
    assert_eq!(schema.decode_from(&mut u), Err(Error::UnexpectedEof));

    u.reset(&bytes);
    assert_eq!(schema.decode_from(&mut u).unwrap(), [Value::U32(1)]);
}

#[test]
fn out_of_range_narrow_fields_fail() {
    let schema = Schema::new("narrow", vec![Field::new("b", FieldKind::U8)]).unwrap();
    let mut m = Marshaller::new();
    m.write_u32(300).unwrap();
    assert!(matches!(
        schema.decode(m.as_bytes()),
        Err(Error::ElementSizeExceeded { what: "uint8", size: 300, .. })
    ));
}
