//! Lease records
//!
//! A lease is the lease-table row that grants one worker the right to
//! process one shard. Besides ownership bookkeeping it carries the shard's
//! checkpoint and its parent shards, which is all ordering needs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::checkpoint::Checkpoint;
use super::id::ShardId;
use super::shard::Prioritizable;

/// A row of the lease table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lease {
    /// Shard the lease covers
    pub lease_key: ShardId,

    /// Worker currently holding the lease
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lease_owner: Option<String>,

    /// Incremented on every renewal; used for optimistic concurrency
    #[serde(default)]
    pub lease_counter: u64,

    /// Last durable checkpoint
    #[serde(default)]
    pub checkpoint: Checkpoint,

    /// Checkpoint a worker has prepared but not yet committed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_checkpoint: Option<Checkpoint>,

    /// Ownership changes since the last checkpoint
    #[serde(default)]
    pub owner_switches_since_checkpoint: u64,

    /// Parent shards (deduplicated and sorted)
    #[serde(default)]
    pub parent_shard_ids: BTreeSet<ShardId>,
}

impl Lease {
    /// Creates an unowned lease for a shard
    pub fn new(lease_key: ShardId) -> Self {
        Self {
            lease_key,
            lease_owner: None,
            lease_counter: 0,
            checkpoint: Checkpoint::default(),
            pending_checkpoint: None,
            owner_switches_since_checkpoint: 0,
            parent_shard_ids: BTreeSet::new(),
        }
    }

    /// Sets the parent shards
    pub fn with_parents(mut self, parents: impl IntoIterator<Item = ShardId>) -> Self {
        self.parent_shard_ids = parents.into_iter().collect();
        self
    }

    /// Sets the checkpoint
    pub fn with_checkpoint(mut self, checkpoint: Checkpoint) -> Self {
        self.checkpoint = checkpoint;
        self
    }
}

impl Prioritizable for Lease {
    fn shard_id(&self) -> &str {
        self.lease_key.as_str()
    }

    fn parent_shard_ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.parent_shard_ids.iter().map(ShardId::as_str)
    }

    fn is_completed(&self) -> bool {
        self.checkpoint.is_shard_end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> ShardId {
        ShardId::new(s).unwrap()
    }

    #[test]
    fn new_lease_is_unowned_and_open() {
        let lease = Lease::new(id("shardId-0"));
        assert_eq!(lease.lease_owner, None);
        assert_eq!(lease.lease_counter, 0);
        assert!(!lease.is_completed());
    }

    #[test]
    fn completed_only_at_shard_end() {
        let lease =
            Lease::new(id("shardId-0")).with_checkpoint(Checkpoint::sequence("10").unwrap());
        assert!(!lease.is_completed());

        let lease = lease.with_checkpoint(Checkpoint::ShardEnd);
        assert!(lease.is_completed());
    }

    #[test]
    fn exposes_parents_through_contract() {
        let lease = Lease::new(id("shardId-2")).with_parents([id("shardId-0"), id("shardId-1")]);
        let parents: Vec<_> = lease.parent_shard_ids().collect();
        assert_eq!(parents, vec!["shardId-0", "shardId-1"]);
        assert_eq!(lease.shard_id(), "shardId-2");
    }

    #[test]
    fn deserialize_minimal_row() {
        let lease: Lease = serde_json::from_str(
            r#"{"lease_key": "shardId-1", "parent_shard_ids": ["shardId-0"], "checkpoint": "SHARD_END"}"#,
        )
        .unwrap();

        assert_eq!(lease.lease_key, id("shardId-1"));
        assert!(lease.is_completed());
        assert!(lease.parent_shard_ids.contains("shardId-0"));
    }

    #[test]
    fn rejects_invalid_lease_key() {
        let result: Result<Lease, _> = serde_json::from_str(r#"{"lease_key": ""}"#);
        assert!(result.is_err());
    }
}
