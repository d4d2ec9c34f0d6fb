//! Shard Order - parents-first ordering for shard lease assignment
//!
//! When a stream shard splits or merges, its children must not be processed
//! before the parents are read to the end. This crate decides the order in
//! which a worker picks up the shards of a lease snapshot: ancestors before
//! descendants, optionally leaving out shards that sit too many unfinished
//! generations deep. A random order is available where dependency order
//! does not matter.

pub mod domain;
pub mod order;
pub mod storage;
pub mod cli;

pub use domain::{Checkpoint, Lease, Prioritizable, ShardId, ShardInfo};
pub use order::{OrderError, Orderer, ParentsFirst, ShardOrderer, Shuffle};
