use serde::{de, ser};
use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while marshalling or unmarshalling XDR data.
///
/// Errors are cloneable so that a [`Latch`](crate::Latch) can hand the first
/// recorded error back to every later caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A custom error message from serde
    #[error("{0}")]
    Message(String),

    /// Fewer bytes were available than the current field (including its
    /// padding) requires
    #[error("unexpected end of input")]
    UnexpectedEof,

    /// A length prefix or value exceeded its declared or format bound
    #[error("{what} exceeds size limit; {size} > {limit}")]
    ElementSizeExceeded {
        what: &'static str,
        size: u64,
        limit: u64,
    },

    /// A value could not be represented in its text form
    #[error("invalid encoding: {0}")]
    Encoding(String),

    /// Padding bytes were non-zero (strict mode violation)
    #[error("non-zero padding bytes")]
    InvalidPadding,

    /// The boolean encoding was neither 0 nor 1
    #[error("invalid boolean encoding: {0} (must be 0 or 1)")]
    InvalidBool(u32),

    /// A sequence length was not known ahead of time (XDR requires it)
    #[error("sequence length must be known before serialization (XDR requires a length prefix)")]
    LengthRequired,

    /// A schema is malformed, or a value does not match its field descriptor
    #[error("schema error: {0}")]
    Schema(String),

    /// XDR does not support this serde data model type
    #[error("XDR does not support type: {0}")]
    Unsupported(&'static str),

    /// The underlying stream failed
    #[error("I/O error: {0}")]
    Io(String),
}

impl Error {
    pub(crate) fn exceeded(what: &'static str, size: impl Into<u64>, limit: impl Into<u64>) -> Self {
        Error::ElementSizeExceeded {
            what,
            size: size.into(),
            limit: limit.into(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::UnexpectedEof => Error::UnexpectedEof,
            _ => Error::Io(err.to_string()),
        }
    }
}

impl ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Message(msg.to_string())
    }
}

impl de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Message(msg.to_string())
    }
}
