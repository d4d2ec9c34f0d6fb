//! Parents-first prioritization
//!
//! Orders shards so that every shard comes after its unfinished parents,
//! and leaves out shards with too many unfinished generations above them.
//! There is little point starting a shard whose parents will keep it
//! blocked for a long time. Completed shards are left out as well; they
//! have nothing left to assign.

use tracing::{debug, trace};

use super::depth::DepthResolver;
use super::OrderError;
use crate::domain::Prioritizable;

/// Orders shards by ascending dependency depth
///
/// Shards of equal depth keep the order they had in the input batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParentsFirst {
    max_depth: usize,
}

impl ParentsFirst {
    /// Creates a strategy that drops shards deeper than `max_depth`
    ///
    /// Depth 0 belongs to shards that are completed or unknown, which can
    /// never be started, so `max_depth` must be at least 1.
    pub fn new(max_depth: i64) -> Result<Self, OrderError> {
        if max_depth <= 0 {
            return Err(OrderError::InvalidMaxDepth(max_depth));
        }

        Ok(Self {
            max_depth: usize::try_from(max_depth).unwrap_or(usize::MAX),
        })
    }

    /// Creates a strategy that keeps every shard
    pub fn unbounded() -> Self {
        Self {
            max_depth: usize::MAX,
        }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn is_unbounded(&self) -> bool {
        self.max_depth == usize::MAX
    }

    /// Orders the batch parents-first
    ///
    /// Completed shards and shards deeper than `max_depth` are left out.
    pub fn prioritize<T: Prioritizable>(&self, batch: Vec<T>) -> Result<Vec<T>, OrderError> {
        Ok(self
            .prioritize_ranked(batch)?
            .into_iter()
            .map(|(_, item)| item)
            .collect())
    }

    /// Like [`prioritize`](Self::prioritize), keeping each shard's depth
    pub fn prioritize_ranked<T: Prioritizable>(
        &self,
        batch: Vec<T>,
    ) -> Result<Vec<(usize, T)>, OrderError> {
        let depths = DepthResolver::new(&batch).resolve()?;
        let total = batch.len();
        let mut excluded = 0usize;
        let mut completed = 0usize;

        let mut ranked = Vec::with_capacity(total);
        for (position, item) in batch.into_iter().enumerate() {
            // Repeated shard IDs carry no depth; the first occurrence is kept
            let Some(depth) = depths.get(position) else {
                continue;
            };

            // Read to the end, nothing left to assign
            if item.is_completed() {
                completed += 1;
                continue;
            }

            if depth > self.max_depth {
                trace!(
                    shard_id = item.shard_id(),
                    depth,
                    max_depth = self.max_depth,
                    "Excluding shard deeper than max depth"
                );
                excluded += 1;
                continue;
            }

            ranked.push((depth, item));
        }

        // sort_by_key is stable: equal depths stay in input order
        ranked.sort_by_key(|(depth, _)| *depth);

        debug!(
            batch = total,
            ordered = ranked.len(),
            completed,
            excluded,
            max_depth = self.max_depth,
            "Prioritized shards parents-first"
        );

        Ok(ranked)
    }
}

impl Default for ParentsFirst {
    fn default() -> Self {
        Self::unbounded()
    }
}
