//! Account identities
//!
//! An identity is a 20-byte account address written as `0x` + 40 hex digits.
//! The all-zero identity is the null identity and can never hold a legacy.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Length of an identity in bytes
pub const IDENTITY_LEN: usize = 20;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("Identity must start with 0x")]
    MissingPrefix,

    #[error("Identity must be {expected} hex digits, got {got}")]
    InvalidLength { expected: usize, got: usize },

    #[error("Invalid hex in identity: {0}")]
    InvalidHex(String),
}

/// A 20-byte account identity
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Identity([u8; IDENTITY_LEN]);

impl Identity {
    /// The null identity (`0x000…000`)
    pub const ZERO: Identity = Identity([0u8; IDENTITY_LEN]);

    pub const fn from_bytes(bytes: [u8; IDENTITY_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; IDENTITY_LEN] {
        &self.0
    }

    /// True for the null identity
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; IDENTITY_LEN]
    }
}

impl FromStr for Identity {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .ok_or(IdentityError::MissingPrefix)?;

        if digits.len() != IDENTITY_LEN * 2 {
            return Err(IdentityError::InvalidLength {
                expected: IDENTITY_LEN * 2,
                got: digits.len(),
            });
        }

        let mut bytes = [0u8; IDENTITY_LEN];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|e| IdentityError::InvalidHex(e.to_string()))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({})", self)
    }
}

impl Serialize for Identity {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Identity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Identity::from_str(&s).map_err(serde::de::Error::custom)
    }
}
