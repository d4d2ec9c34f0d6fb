//! Checkpoint positions within a shard
//!
//! A checkpoint is either a sentinel position (`TRIM_HORIZON`, `LATEST`,
//! `AT_TIMESTAMP`, `SHARD_END`) or a concrete sequence number, optionally
//! qualified by a sub-sequence number for aggregated records.
//!
//! String form:
//! - Sentinels: their upper-case names
//! - Sequence: `{digits}` or `{digits}:{sub}` (e.g. `4959033827149:3`)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum CheckpointError {
    #[error("Invalid checkpoint '{0}': expected a sentinel or a decimal sequence number")]
    InvalidSequence(String),

    #[error("Invalid sub-sequence number in checkpoint '{0}'")]
    InvalidSubSequence(String),
}

/// Position a worker has processed up to in a shard
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(try_from = "String", into = "String")]
pub enum Checkpoint {
    /// Oldest record still retained by the stream
    #[default]
    TrimHorizon,
    /// Tip of the shard
    Latest,
    /// Position resolved from a timestamp at startup
    AtTimestamp,
    /// Every record of a closed shard has been processed
    ShardEnd,
    /// A concrete record position
    Sequence {
        sequence_number: String,
        sub_sequence_number: u64,
    },
}

impl Checkpoint {
    /// Creates a checkpoint at a concrete sequence number
    pub fn sequence(sequence_number: &str) -> Result<Self, CheckpointError> {
        Self::sequence_with_sub(sequence_number, 0)
    }

    /// Creates a checkpoint at a sub-record of an aggregated record
    pub fn sequence_with_sub(
        sequence_number: &str,
        sub_sequence_number: u64,
    ) -> Result<Self, CheckpointError> {
        if sequence_number.is_empty() || !sequence_number.chars().all(|c| c.is_ascii_digit()) {
            return Err(CheckpointError::InvalidSequence(sequence_number.to_string()));
        }

        Ok(Checkpoint::Sequence {
            sequence_number: sequence_number.to_string(),
            sub_sequence_number,
        })
    }

    /// Returns true once the shard has been read to its end
    pub fn is_shard_end(&self) -> bool {
        matches!(self, Checkpoint::ShardEnd)
    }
}

impl fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Checkpoint::TrimHorizon => f.write_str("TRIM_HORIZON"),
            Checkpoint::Latest => f.write_str("LATEST"),
            Checkpoint::AtTimestamp => f.write_str("AT_TIMESTAMP"),
            Checkpoint::ShardEnd => f.write_str("SHARD_END"),
            Checkpoint::Sequence {
                sequence_number,
                sub_sequence_number: 0,
            } => f.write_str(sequence_number),
            Checkpoint::Sequence {
                sequence_number,
                sub_sequence_number,
            } => write!(f, "{}:{}", sequence_number, sub_sequence_number),
        }
    }
}

impl FromStr for Checkpoint {
    type Err = CheckpointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s {
            "TRIM_HORIZON" => Ok(Checkpoint::TrimHorizon),
            "LATEST" => Ok(Checkpoint::Latest),
            "AT_TIMESTAMP" => Ok(Checkpoint::AtTimestamp),
            "SHARD_END" => Ok(Checkpoint::ShardEnd),
            _ => match s.split_once(':') {
                Some((seq, sub)) => {
                    let sub = sub
                        .parse::<u64>()
                        .map_err(|_| CheckpointError::InvalidSubSequence(s.to_string()))?;
                    Self::sequence_with_sub(seq, sub)
                }
                None => Self::sequence(s),
            },
        }
    }
}

impl TryFrom<String> for Checkpoint {
    type Error = CheckpointError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Checkpoint> for String {
    fn from(checkpoint: Checkpoint) -> Self {
        checkpoint.to_string()
    }
}
