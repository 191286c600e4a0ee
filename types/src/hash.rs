//! Transaction hash type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TypeError;

/// A transaction hash: `0x` followed by 64 hex digits.
///
/// Hashes are opaque to the client; they are only displayed and turned into
/// explorer links. Validation still runs on every decode so a mangled wire
/// response cannot masquerade as a confirmed transaction.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TxHash(String);

impl TxHash {
    /// Total length of a well-formed hash string.
    pub const LEN: usize = 66;

    /// Validate and wrap a raw hash string.
    pub fn parse(raw: impl Into<String>) -> Result<Self, TypeError> {
        let s = raw.into();
        let well_formed = s.len() == Self::LEN
            && s.starts_with("0x")
            && s[2..].chars().all(|c| c.is_ascii_hexdigit());
        if !well_formed {
            return Err(TypeError::InvalidTxHash(s));
        }
        Ok(Self(s))
    }

    /// Return the raw hash string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TxHash {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TxHash {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl From<TxHash> for String {
    fn from(h: TxHash) -> Self {
        h.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn good() -> String {
        format!("0x{}", "ab".repeat(32))
    }

    #[test]
    fn parse_accepts_well_formed_hash() {
        let hash = TxHash::parse(good()).unwrap();
        assert_eq!(hash.as_str(), good());
    }

    #[test]
    fn parse_rejects_short_and_non_hex() {
        assert!(TxHash::parse("0xabcd").is_err());
        assert!(TxHash::parse(format!("0x{}", "xy".repeat(32))).is_err());
    }

    #[test]
    fn display_round_trips() {
        let hash = TxHash::parse(good()).unwrap();
        assert_eq!(hash.to_string().parse::<TxHash>().unwrap(), hash);
    }
}
