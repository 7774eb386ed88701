//! Shared newtypes and utilities used across all domain modules.
//!
//! These types are serialization-transparent: they serialize identically to the
//! raw format the backend expects, so they can be used directly in wire types
//! without conversion overhead.

pub mod serde_util;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;

// ─── GiveawayId ──────────────────────────────────────────────────────────────

/// Newtype for giveaway identifiers.
///
/// The giveaway service issues numeric ids, while some responses and live
/// events carry them as strings. Both forms deserialize into the same value;
/// serialization always produces a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GiveawayId(String);

impl GiveawayId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for GiveawayId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for GiveawayId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for GiveawayId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<u64> for GiveawayId {
    fn from(n: u64) -> Self {
        Self(n.to_string())
    }
}

impl FromStr for GiveawayId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(GiveawayId(s.to_string()))
    }
}

impl Serialize for GiveawayId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for GiveawayId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        serde_util::string_or_number(deserializer).map(GiveawayId)
    }
}

// ─── AccountId ───────────────────────────────────────────────────────────────

/// The dashboard account that owns giveaways (one per authenticated bot).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AccountId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for AccountId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Serialize for AccountId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for AccountId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        serde_util::string_or_number(deserializer).map(AccountId)
    }
}
