//! Fixed-width (20-byte) account address.
//!
//! Every address entering the system (log topics, call results, lookup input)
//! is parsed into an [`Address`], so comparisons never depend on the casing a
//! client or node happened to use. The canonical text form is lowercase
//! `0x`-hex; responses use the EIP-55 checksum form.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::IndexerError;

/// A 20-byte Ethereum address.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(alloy_primitives::Address);

impl Address {
    /// The zero address, used as the "not a minipool" sentinel.
    pub const ZERO: Address = Address(alloy_primitives::Address::ZERO);

    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(alloy_primitives::Address::new(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0 .0 .0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Parse `0x` followed by exactly 40 hex digits (any case).
    ///
    /// Stricter than `alloy_primitives::Address::from_str`, which also takes
    /// unprefixed hex.
    pub fn parse(s: &str) -> Result<Self, IndexerError> {
        let digits = s
            .strip_prefix("0x")
            .ok_or_else(|| IndexerError::Validation(format!("{s:?} is missing the 0x prefix")))?;
        if digits.len() != 40 {
            return Err(IndexerError::Validation(format!(
                "{s:?} is not a 20-byte hex address"
            )));
        }
        alloy_primitives::Address::from_str(s)
            .map(Self)
            .map_err(|e| IndexerError::Validation(format!("{s:?}: {e}")))
    }

    /// Lowercase `0x`-prefixed form. This is the storage key format.
    pub fn to_canonical(&self) -> String {
        format!("0x{}", hex::encode(self.0.as_slice()))
    }

    /// EIP-55 mixed-case checksum form.
    pub fn to_checksum(&self) -> String {
        self.0.to_checksum(None)
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self::new(bytes)
    }
}

impl From<alloy_primitives::Address> for Address {
    fn from(address: alloy_primitives::Address) -> Self {
        Self(address)
    }
}

impl From<Address> for alloy_primitives::Address {
    fn from(address: Address) -> Self {
        address.0
    }
}

impl FromStr for Address {
    type Err = IndexerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_canonical())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_canonical())
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_canonical())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// `serialize_with` helper that renders an address in checksum form.
pub fn serialize_checksum<S: Serializer>(address: &Address, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&address.to_checksum())
}
