//! Driver license number validation.
//!
//! A license number has the shape `AAA99999`: exactly eight characters,
//! three uppercase ASCII letters followed by five ASCII digits. Violations
//! are reported in a fixed order (length, letters, digits) and only the
//! first one is returned.

use std::fmt;
use std::str::FromStr;

use rkyv::{Archive, Deserialize, Serialize};
use serde::{Serialize as SerdeSerialize, Serializer};
use thiserror::Error;

/// Total length of a license number, in characters.
pub const LICENSE_LENGTH: usize = 8;

/// Number of leading uppercase letters.
pub const LICENSE_PREFIX_LETTERS: usize = 3;

/// A license number format violation.
///
/// The display strings are shown to users as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LicenseError {
    #[error("License number should consist of 8 characters")]
    Length,

    #[error("First 3 characters should be uppercase letters")]
    Uppercase,

    #[error("Last 5 characters should be digits")]
    Digits,
}

/// A validated license number.
///
/// Can only be built through [`LicenseNumber::parse`], so holding one means
/// the format invariant holds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Archive, Serialize, Deserialize)]
pub struct LicenseNumber(String);

impl LicenseNumber {
    /// Validate `candidate` and wrap it.
    pub fn parse(candidate: &str) -> Result<Self, LicenseError> {
        validate_license_number(candidate)?;
        Ok(Self(candidate.to_string()))
    }

    /// The license number as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for LicenseNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for LicenseNumber {
    type Err = LicenseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for LicenseNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl SerdeSerialize for LicenseNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// Check a candidate license number, returning the first violation.
pub fn validate_license_number(candidate: &str) -> Result<(), LicenseError> {
    let chars: Vec<char> = candidate.chars().collect();

    if chars.len() != LICENSE_LENGTH {
        return Err(LicenseError::Length);
    }

    let (prefix, suffix) = chars.split_at(LICENSE_PREFIX_LETTERS);

    if !prefix.iter().all(|c| c.is_ascii_uppercase()) {
        return Err(LicenseError::Uppercase);
    }

    if !suffix.iter().all(|c| c.is_ascii_digit()) {
        return Err(LicenseError::Digits);
    }

    Ok(())
}
