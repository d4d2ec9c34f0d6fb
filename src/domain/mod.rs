//! Domain models for shard ordering
//!
//! Contains the records being ordered without any I/O concerns.

mod id;
mod checkpoint;
mod shard;
mod lease;

pub use id::{ShardId, IdError, MAX_SHARD_ID_LEN};
pub use checkpoint::{Checkpoint, CheckpointError};
pub use shard::{Prioritizable, ShardInfo};
pub use lease::Lease;
