use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{CoreError, CoreResult};

/// Provider location identifier: 3-letter IATA airport/city code, or a
/// 4-letter variant some providers use for metropolitan areas.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LocationCode(String);

impl LocationCode {
    pub const MIN_LEN: usize = 3;
    pub const MAX_LEN: usize = 4;

    /// Normalize to uppercase and reject anything that is not 3-4 ASCII letters.
    pub fn parse(raw: &str) -> CoreResult<Self> {
        let trimmed = raw.trim();
        let len = trimmed.len();

        if !(Self::MIN_LEN..=Self::MAX_LEN).contains(&len)
            || !trimmed.chars().all(|c| c.is_ascii_alphabetic())
        {
            return Err(CoreError::InvalidInput(format!(
                "'{}' is not a valid location code",
                raw
            )));
        }

        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison against a provider-supplied code.
    pub fn matches(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other.trim())
    }
}

impl fmt::Display for LocationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for LocationCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for LocationCode {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<LocationCode> for String {
    fn from(code: LocationCode) -> Self {
        code.0
    }
}

impl std::str::FromStr for LocationCode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
