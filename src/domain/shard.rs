//! Shard descriptors and the contract for orderable work items
//!
//! Anything that can report its own ID, the IDs of its parent shards and
//! whether it has been read to the end can be ordered. Lease rows and
//! worker-side shard descriptors both qualify without sharing a type.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::checkpoint::Checkpoint;
use super::id::ShardId;

/// A work item that can be placed in a parents-first order
///
/// A split produces one parent, a merge produces two. Parents that are not
/// part of the batch being ordered are treated as already retired.
pub trait Prioritizable {
    /// Unique ID of this item within a batch
    fn shard_id(&self) -> &str;

    /// IDs of the direct parents of this item
    fn parent_shard_ids(&self) -> impl Iterator<Item = &str> + '_;

    /// Returns true once this item no longer blocks its children
    fn is_completed(&self) -> bool;
}

impl<T: Prioritizable + ?Sized> Prioritizable for &T {
    fn shard_id(&self) -> &str {
        (**self).shard_id()
    }

    fn parent_shard_ids(&self) -> impl Iterator<Item = &str> + '_ {
        (**self).parent_shard_ids()
    }

    fn is_completed(&self) -> bool {
        (**self).is_completed()
    }
}

/// Worker-side view of a shard it holds a lease on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardInfo {
    /// The shard this describes
    pub shard_id: ShardId,

    /// Token of the lease the worker holds, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concurrency_token: Option<String>,

    /// Parent shards (deduplicated and sorted)
    #[serde(default)]
    pub parent_shard_ids: BTreeSet<ShardId>,

    /// Last checkpoint recorded for the shard
    #[serde(default)]
    pub checkpoint: Checkpoint,
}

impl ShardInfo {
    /// Creates a shard descriptor without parents at `TRIM_HORIZON`
    pub fn new(shard_id: ShardId) -> Self {
        Self {
            shard_id,
            concurrency_token: None,
            parent_shard_ids: BTreeSet::new(),
            checkpoint: Checkpoint::default(),
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

    /// Adds a parent shard
    pub fn add_parent(&mut self, parent: ShardId) -> bool {
        self.parent_shard_ids.insert(parent)
    }
}

impl Prioritizable for ShardInfo {
    fn shard_id(&self) -> &str {
        self.shard_id.as_str()
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
    fn new_shard_has_no_parents_and_is_open() {
        let shard = ShardInfo::new(id("shardId-0"));
        assert_eq!(shard.shard_id(), "shardId-0");
        assert_eq!(shard.parent_shard_ids().count(), 0);
        assert!(!shard.is_completed());
    }

    #[test]
    fn parents_are_deduplicated_and_sorted() {
        let shard = ShardInfo::new(id("shardId-9"))
            .with_parents([id("shardId-2"), id("shardId-1"), id("shardId-2")]);

        let parents: Vec<_> = shard.parent_shard_ids().collect();
        assert_eq!(parents, vec!["shardId-1", "shardId-2"]);
    }

    #[test]
    fn add_parent_reports_novelty() {
        let mut shard = ShardInfo::new(id("shardId-3"));
        assert!(shard.add_parent(id("shardId-1")));
        assert!(!shard.add_parent(id("shardId-1")));
    }

    #[test]
    fn shard_end_checkpoint_means_completed() {
        let shard = ShardInfo::new(id("shardId-0")).with_checkpoint(Checkpoint::ShardEnd);
        assert!(shard.is_completed());

        let shard = ShardInfo::new(id("shardId-0")).with_checkpoint(Checkpoint::Latest);
        assert!(!shard.is_completed());
    }

    #[test]
    fn references_are_prioritizable() {
        fn ids<T: Prioritizable>(item: T) -> (String, Vec<String>) {
            (
                item.shard_id().to_string(),
                item.parent_shard_ids().map(str::to_string).collect(),
            )
        }

        let shard = ShardInfo::new(id("shardId-1")).with_parents([id("shardId-0")]);
        assert_eq!(
            ids(&shard),
            ("shardId-1".to_string(), vec!["shardId-0".to_string()])
        );
    }

    #[test]
    fn deserialize_with_defaults() {
        let shard: ShardInfo = serde_json::from_str(r#"{"shard_id": "shardId-4"}"#).unwrap();
        assert_eq!(shard.shard_id, id("shardId-4"));
        assert!(shard.parent_shard_ids.is_empty());
        assert_eq!(shard.checkpoint, Checkpoint::TrimHorizon);
        assert_eq!(shard.concurrency_token, None);
    }

    #[test]
    fn serde_roundtrip() {
        let mut shard = ShardInfo::new(id("shardId-5"))
            .with_parents([id("shardId-1"), id("shardId-2")])
            .with_checkpoint(Checkpoint::sequence("42").unwrap());
        shard.concurrency_token = Some("token-1".to_string());

        let json = serde_json::to_string(&shard).unwrap();
        let parsed: ShardInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(shard, parsed);
    }
}
