//! Shard identifiers
//!
//! Shards and leases are keyed by the shard ID assigned by the stream,
//! e.g. `shardId-000000000001`. Lease keys use the same value.
//!
//! IDs are opaque: ordering never parses them, it only compares them.
//! Validation rejects values that could not have come from a lease table
//! (empty, oversized, or containing whitespace/control characters).

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Longest key a lease table accepts
pub const MAX_SHARD_ID_LEN: usize = 256;

#[derive(Debug, Error, PartialEq)]
pub enum IdError {
    #[error("Shard ID cannot be empty")]
    Empty,

    #[error("Shard ID is {0} characters long, maximum is 256")]
    TooLong(usize),

    #[error("Invalid character {1:?} in shard ID '{0}'")]
    InvalidCharacter(String, char),
}

/// Shard ID, also used as the lease key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ShardId(String);

impl ShardId {
    /// Creates a shard ID, validating its format
    pub fn new(value: impl Into<String>) -> Result<Self, IdError> {
        let value = value.into();

        if value.is_empty() {
            return Err(IdError::Empty);
        }

        let len = value.chars().count();
        if len > MAX_SHARD_ID_LEN {
            return Err(IdError::TooLong(len));
        }

        if let Some(c) = value.chars().find(|c| c.is_whitespace() || c.is_control()) {
            return Err(IdError::InvalidCharacter(value, c));
        }

        Ok(Self(value))
    }

    /// Returns the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ShardId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.trim())
    }
}

impl TryFrom<String> for ShardId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ShardId> for String {
    fn from(id: ShardId) -> Self {
        id.0
    }
}

impl AsRef<str> for ShardId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// Lets `HashMap<ShardId, _>` / `BTreeSet<ShardId>` be queried with `&str`
impl Borrow<str> for ShardId {
    fn borrow(&self) -> &str {
        &self.0
    }
}
