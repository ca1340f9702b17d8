use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::{AppError, AppResult};

/// Opaque pagination continuation token.
///
/// The token encodes an upstream offset as a decimal string. An empty token
/// means "start" when passed in and "no further pages" when handed back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageCursor(String);

impl PageCursor {
    /// Creates a cursor from a raw token received from a caller.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the cursor that starts a listing, which is also the exhausted cursor.
    #[must_use]
    pub fn start() -> Self {
        Self(String::new())
    }

    /// Creates a cursor pointing at the given offset.
    #[must_use]
    pub fn from_offset(offset: u64) -> Self {
        Self(offset.to_string())
    }

    /// Returns true when the token is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the raw token.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Decodes the offset carried by this cursor.
    ///
    /// Fails with [`AppError::InvalidCursor`] when the token is not a
    /// non-negative decimal integer. Callers must not retry with the same token.
    pub fn offset(&self) -> AppResult<u64> {
        if self.0.is_empty() {
            return Ok(0);
        }

        if !self.0.bytes().all(|byte| byte.is_ascii_digit()) {
            return Err(AppError::InvalidCursor(format!(
                "page token '{}' is not a non-negative integer",
                self.0
            )));
        }

        self.0.parse::<u64>().map_err(|error| {
            AppError::InvalidCursor(format!("page token '{}' is out of range: {error}", self.0))
        })
    }
}

impl Display for PageCursor {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

impl From<PageCursor> for String {
    fn from(value: PageCursor) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::PageCursor;
    use crate::AppError;

    #[test]
    fn empty_cursor_starts_at_zero() {
        assert!(matches!(PageCursor::start().offset(), Ok(0)));
    }

    #[test]
    fn rejects_negative_and_non_numeric_tokens() {
        for token in ["-1", "abc", "1.5", " 3", "+4"] {
            let result = PageCursor::new(token).offset();
            assert!(
                matches!(result, Err(AppError::InvalidCursor(_))),
                "token {token:?} should be rejected"
            );
        }
    }

    proptest! {
        #[test]
        fn offset_round_trips_for_any_valid_token(offset in any::<u64>()) {
            let cursor = PageCursor::from_offset(offset);
            prop_assert_eq!(cursor.offset().ok(), Some(offset));
            prop_assert!(!cursor.is_empty());
        }
    }
}
