//! Shared result type.
//!
//! Errors in this workspace are `rootcause` reports over small per-crate
//! enums. A layer that catches a lower-level report wraps it with
//! `report.context(..)` so the chain keeps both causes.

use rootcause::Report;

/// Result whose error is a report with current context `C`.
pub type Result<T, C = ()> = std::result::Result<T, Report<C>>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug)]
    struct Lower;

    impl fmt::Display for Lower {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("lower")
        }
    }

    impl std::error::Error for Lower {}

    #[derive(Debug, PartialEq, Eq)]
    struct Upper;

    impl fmt::Display for Upper {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("upper")
        }
    }

    impl std::error::Error for Upper {}

    fn fail() -> Result<(), Lower> {
        Err(Lower.into())
    }

    #[test]
    fn context_replaces_current_context() {
        let err: Result<(), Upper> = fail().map_err(|report| report.context(Upper));
        assert_eq!(err.unwrap_err().current_context(), &Upper);
    }
}
