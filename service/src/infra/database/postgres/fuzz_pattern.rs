//! [`FuzzPattern`] definition.

use derive_more::Display;
use postgres_types::{FromSql, ToSql};

/// `ILIKE` pattern matching any text containing the given input as a
/// substring.
#[derive(Clone, Debug, Display, Eq, FromSql, PartialEq, ToSql)]
#[postgres(transparent)]
pub struct FuzzPattern(String);

impl FuzzPattern {
    /// Creates a new [`FuzzPattern`] out of the given `input`.
    ///
    /// `LIKE` wildcards in the `input` are matched literally.
    #[must_use]
    pub fn new(input: &str) -> Self {
        let escaped = input
            .replace('\\', r"\\")
            .replace('%', r"\%")
            .replace('_', r"\_");
        Self(format!("%{escaped}%"))
    }
}

#[cfg(test)]
mod spec {
    use super::FuzzPattern;

    #[test]
    fn escapes_wildcards() {
        assert_eq!(FuzzPattern::new("Kyiv").to_string(), "%Kyiv%");
        assert_eq!(FuzzPattern::new("50%_off").to_string(), r"%50\%\_off%");
        assert_eq!(FuzzPattern::new(r"a\b").to_string(), r"%a\\b%");
    }
}
