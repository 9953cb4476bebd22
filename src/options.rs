//! Decoding options carried by every [`Source`](crate::Source).

/// How string payloads that are not valid UTF-8 are handled on decode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextPolicy {
    /// Replace invalid sequences with U+FFFD. Decoding stays total.
    #[default]
    Lossy,
    /// Fail with [`Error::Encoding`](crate::Error::Encoding).
    Strict,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Options {
    /// Bound for variable-length reads that carry no declared maximum.
    /// `None` leaves only the 32-bit length prefix ceiling.
    pub max_len: Option<u32>,
    pub text: TextPolicy,
    /// Reject non-zero padding bytes instead of skipping them.
    pub strict_padding: bool,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_len(mut self, max: u32) -> Self {
        self.max_len = Some(max);
        self
    }

    pub fn text(mut self, policy: TextPolicy) -> Self {
        self.text = policy;
        self
    }

    pub fn strict_padding(mut self, strict: bool) -> Self {
        self.strict_padding = strict;
        self
    }
}
