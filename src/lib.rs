//! # xdr-marshal
//!
//! XDR (eXternal Data Representation, RFC 4506) primitives with sticky-error
//! marshalling and schema-driven record codecs.
//!
//! ## Overview
//!
//! XDR is the wire encoding used by ONC RPC protocols such as NFS. All values
//! are big-endian (network byte order), and every item occupies a multiple of
//! 4 bytes (padded with zeroes as needed).
//!
//! The crate is layered:
//!
//! - [`Sink`] and [`Source`] implement the wire rules for integers, fixed
//!   opaque data, variable-length opaque data and strings.
//! - [`Writer`] and [`Reader`] bind them to `std::io` streams;
//!   [`Marshaller`] and [`Unmarshaller`] to in-memory buffers. Decoding from
//!   an [`Unmarshaller`] can borrow strings and opaque data from the input.
//! - Each instance carries a [`Latch`]: the first error is kept and every
//!   later call on the same instance fails with it, so a record codec can
//!   issue a run of calls and check once at the end.
//! - Records are encoded through the [`Encode`] / [`Decode`] traits (written
//!   by hand or generated by [`xdr_record!`]), through a run-time
//!   [`Schema`](schema::Schema), or through serde derives.
//!
//! ## Serde type mapping
//!
//! | Rust / serde type | XDR encoding |
//! |-------------------|--------------|
//! | `bool`            | 4-byte unsigned int: 0 (false) or 1 (true) |
//! | `i8`, `i16`, `i32` | 4-byte signed int (sign-extended) |
//! | `i64`             | 8-byte hyper integer |
//! | `u8`, `u16`, `u32` | 4-byte unsigned int (zero-extended) |
//! | `u64`             | 8-byte unsigned hyper integer |
//! | `f32`             | 4-byte IEEE 754 single-precision float |
//! | `f64`             | 8-byte IEEE 754 double-precision float |
//! | `char`            | 4-byte unsigned int (Unicode scalar) |
//! | `&str`, `String`  | 4-byte length + UTF-8 bytes + 0-3 zero-padding bytes |
//! | `&[u8]`, `Vec<u8>` (via `serde_bytes`) | 4-byte length + bytes + 0-3 zero-padding bytes |
//! | `[u8; N]` (via [`opaque::fixed`]) | N bytes + 0-3 zero-padding bytes |
//! | [`opaque::BoundedBytes`], [`opaque::BoundedString`] | as above, length checked against the bound |
//! | `()` / unit struct | 0 bytes (XDR void) |
//! | `Vec<T>` / seq    | 4-byte count + encoded elements |
//! | Tuple / tuple struct | fields encoded consecutively (no count prefix) |
//! | Struct            | fields encoded consecutively (no count prefix) |
//!
//! `Option`, enums and maps fail with [`Error::Unsupported`].
//!
//! ## Example
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use xdr_marshal::{from_bytes, to_bytes};
//!
//! #[derive(Debug, PartialEq, Serialize, Deserialize)]
//! struct FileHandle {
//!     inode: u64,
//!     generation: u32,
//!     flags: u32,
//! }
//!
//! let fh = FileHandle {
//!     inode: 0x0102030405060708,
//!     generation: 42,
//!     flags: 0,
//! };
//!
//! // Serialize to XDR bytes
//! let bytes = to_bytes(&fh).unwrap();
//! assert_eq!(bytes.len(), 16); // 8 + 4 + 4
//!
//! // Deserialize back
//! let decoded: FileHandle = from_bytes(&bytes).unwrap();
//! assert_eq!(fh, decoded);
//! ```
//!
//! ## Primitives
//!
//! ```rust
//! use xdr_marshal::{Marshaller, Sink, Source, Unmarshaller};
//!
//! let mut m = Marshaller::new();
//! m.write_u32(7).unwrap();
//! m.write_string("abc").unwrap();
//! assert_eq!(m.as_bytes(), [0, 0, 0, 7, 0, 0, 0, 3, b'a', b'b', b'c', 0]);
//!
//! let mut u = Unmarshaller::new(m.as_bytes());
//! assert_eq!(u.read_u32().unwrap(), 7);
//! assert_eq!(u.read_string().unwrap(), "abc");
//! assert!(u.remaining().is_empty());
//! ```

pub mod de;
pub mod error;
pub mod opaque;
pub mod primitive;
pub mod record;
pub mod schema;
pub mod ser;

mod marshal;
mod options;
mod reader;
mod sticky;
mod unmarshal;
mod writer;

pub use de::{Deserializer, from_bytes, from_bytes_partial, from_reader};
pub use error::{Error, Result};
pub use marshal::Marshaller;
pub use options::{Options, TextPolicy};
pub use primitive::{Sink, Source, opaque_len, pad_len, padded_len};
pub use reader::Reader;
pub use record::{
    Decode, DecodeBounded, Encode, EncodeBounded, decode, decode_from, decode_partial, encode,
    encode_into,
};
pub use ser::{Serializer, to_bytes, to_writer};
pub use sticky::Latch;
pub use unmarshal::Unmarshaller;
pub use writer::Writer;

pub use serde::{Deserialize, Serialize};
