//! ISO 3166-1 alpha-2 country code type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`CountryCode`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CountryCodeError {
    /// The input string is empty.
    #[error("country cannot be empty")]
    Empty,
    /// The input is not exactly two characters.
    #[error("country must be a two-letter code")]
    WrongLength,
    /// The input contains something other than ASCII letters.
    #[error("country must only contain letters A-Z")]
    NotAlphabetic,
}

/// A two-letter ISO 3166-1 country code, always stored uppercase.
///
/// ## Examples
///
/// ```
/// use pantry_core::CountryCode;
///
/// assert_eq!(CountryCode::parse(" de ").unwrap().as_str(), "DE");
/// assert!(CountryCode::parse("").is_err());
/// assert!(CountryCode::parse("DEU").is_err());
/// assert!(CountryCode::parse("1A").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct CountryCode(String);

impl CountryCode {
    /// Parse a `CountryCode`, trimming whitespace and normalizing case.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty, not two characters
    /// long, or contains non-letters.
    pub fn parse(s: &str) -> Result<Self, CountryCodeError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(CountryCodeError::Empty);
        }

        if trimmed.chars().count() != 2 {
            return Err(CountryCodeError::WrongLength);
        }

        if !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(CountryCodeError::NotAlphabetic);
        }

        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for CountryCode {
    type Err = CountryCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CountryCode {
    type Error = CountryCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CountryCode> for String {
    fn from(code: CountryCode) -> Self {
        code.0
    }
}

// SQLx support (with postgres feature)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for CountryCode {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for CountryCode {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::parse(&s)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for CountryCode {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalizes_case() {
        assert_eq!(CountryCode::parse("us").unwrap().as_str(), "US");
        assert_eq!(CountryCode::parse("Gb").unwrap().as_str(), "GB");
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(CountryCode::parse("  "), Err(CountryCodeError::Empty));
        assert_eq!(CountryCode::parse("U"), Err(CountryCodeError::WrongLength));
        assert_eq!(
            CountryCode::parse("U5"),
            Err(CountryCodeError::NotAlphabetic)
        );
    }

    #[test]
    fn test_deserialize_validates() {
        let code: CountryCode = serde_json::from_str("\"fr\"").unwrap();
        assert_eq!(code.as_str(), "FR");
        assert!(serde_json::from_str::<CountryCode>("\"France\"").is_err());
    }
}
