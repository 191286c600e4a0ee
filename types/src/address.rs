//! Account address type with `0x` prefix.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TypeError;

/// An account address: `0x` followed by 40 hex digits.
///
/// Addresses arrive from untrusted wire responses, so deserialization runs
/// the same validation as [`Address::parse`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// The standard prefix for all account addresses.
    pub const PREFIX: &'static str = "0x";

    /// Total length of a well-formed address string.
    pub const LEN: usize = 42;

    /// Create an address from a raw string.
    ///
    /// # Panics
    /// Panics if the string is not a well-formed address. Use
    /// [`Address::parse`] for untrusted input.
    pub fn new(raw: impl Into<String>) -> Self {
        Self::parse(raw).expect("malformed address literal")
    }

    /// Validate and wrap a raw address string.
    pub fn parse(raw: impl Into<String>) -> Result<Self, TypeError> {
        let s = raw.into();
        let well_formed = s.len() == Self::LEN
            && s.starts_with(Self::PREFIX)
            && s[Self::PREFIX.len()..].chars().all(|c| c.is_ascii_hexdigit());
        if !well_formed {
            return Err(TypeError::InvalidAddress(s));
        }
        Ok(Self(s))
    }

    /// Return the raw address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated display form: first 6 and last 4 characters.
    pub fn short(&self) -> String {
        format!("{}...{}", &self.0[..6], &self.0[self.0.len() - 4..])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Address {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl From<Address> for String {
    fn from(a: Address) -> Self {
        a.0
    }
}
