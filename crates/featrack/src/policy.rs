//! Warn-or-throw failure reporting.

use crate::config::ErrorMode;
use crate::Error;
use tracing::warn;

impl ErrorMode {
    /// Report a failure according to this mode.
    ///
    /// Throw mode hands the error back to the caller. Warn mode logs it and
    /// resolves the operation to `Ok(None)`.
    pub fn report<T>(self, error: Error) -> Result<Option<T>, Error> {
        match self {
            ErrorMode::Throw => Err(error),
            ErrorMode::Warn => {
                warn!(error = %error, kind = ?error.kind(), "featrack operation failed");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warn_swallows_error() {
        let result: Result<Option<()>, Error> = ErrorMode::Warn.report(Error::SessionNotStarted);
        assert!(matches!(result, Ok(None)));
    }

    #[test]
    fn test_throw_propagates_error() {
        let result: Result<Option<()>, Error> = ErrorMode::Throw.report(Error::NotIdentified);
        assert!(matches!(result, Err(Error::NotIdentified)));
    }
}
