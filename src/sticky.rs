//! First-error-wins latch shared by every primitive on one sink or source.
//!
//! A [`Latch`] lets a record codec issue a run of primitive calls without
//! checking each one: after the first failure every later primitive on the
//! same instance does no I/O and returns that first error again.

use crate::error::{Error, Result};

/// A single error slot. Once set it is never overwritten.
#[derive(Debug, Default, Clone)]
pub struct Latch {
    first: Option<Error>,
}

impl Latch {
    pub fn new() -> Self {
        Latch { first: None }
    }

    /// The latched error, if any.
    pub fn get(&self) -> Option<&Error> {
        self.first.as_ref()
    }

    pub fn is_set(&self) -> bool {
        self.first.is_some()
    }

    /// Guard run by every primitive before doing work.
    pub fn check(&self) -> Result<()> {
        match &self.first {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    /// Record `err` unless an error is already latched. Returns the error
    /// that is latched after the call, which is the first one ever recorded.
    pub fn record(&mut self, err: Error) -> Error {
        match &self.first {
            Some(first) => first.clone(),
            None => {
                tracing::trace!(error = %err, "latching first xdr error");
                self.first = Some(err.clone());
                err
            }
        }
    }

    /// Pass `result` through, latching its error.
    pub fn guard<T>(&mut self, result: Result<T>) -> Result<T> {
        result.map_err(|err| self.record(err))
    }

    /// Reset the latch for reuse, returning the error it held.
    pub fn clear(&mut self) -> Option<Error> {
        self.first.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_error_wins() {
        let mut latch = Latch::new();
        assert!(latch.check().is_ok());

        let first = latch.record(Error::UnexpectedEof);
        assert_eq!(first, Error::UnexpectedEof);

        let again = latch.record(Error::InvalidPadding);
        assert_eq!(again, Error::UnexpectedEof);
        assert_eq!(latch.get(), Some(&Error::UnexpectedEof));
        assert_eq!(latch.check(), Err(Error::UnexpectedEof));
    }

    #[test]
    fn guard_latches_and_passes_values() {
        let mut latch = Latch::new();
        assert_eq!(latch.guard(Ok(7)), Ok(7));
        assert!(!latch.is_set());

        let r: Result<u32> = latch.guard(Err(Error::InvalidBool(3)));
        assert_eq!(r, Err(Error::InvalidBool(3)));
        let r: Result<u32> = latch.guard(Err(Error::UnexpectedEof));
        assert_eq!(r, Err(Error::InvalidBool(3)));
    }

    #[test]
    fn clear_allows_reuse() {
        let mut latch = Latch::new();
        latch.record(Error::LengthRequired);
        assert_eq!(latch.clear(), Some(Error::LengthRequired));
        assert!(latch.check().is_ok());
        assert_eq!(latch.record(Error::InvalidPadding), Error::InvalidPadding);
    }
}
