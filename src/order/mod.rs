//! # Shard Ordering
//!
//! Decides in which order a worker should pick up the shards of a lease
//! snapshot.
//!
//! ## Strategies
//!
//! | Strategy | Order | Filtering |
//! |----------|-------|-----------|
//! | [`ParentsFirst`] | By depth, ties keep input order | Completed, or deeper than `max_depth` |
//! | [`Shuffle`] | Uniformly random | None |
//!
//! Both sit behind [`ShardOrderer`]; the lease-assignment loop only ever
//! calls [`ShardOrderer::order`]. [`Orderer`] selects one of them from
//! configuration.
//!
//! ## Depth
//!
//! A shard that is completed, or that is not part of the batch, has depth 0.
//! Any other shard is one deeper than its deepest parent. See
//! [`DepthResolver`].
//!
//! Each call works on its own snapshot. Nothing is cached between calls.

mod depth;
mod parents_first;
mod shuffle;

use thiserror::Error;

use crate::domain::Prioritizable;

pub use depth::{resolve_depths, DepthResolver, Depths};
pub use parents_first::ParentsFirst;
pub use shuffle::Shuffle;

#[derive(Debug, Error, PartialEq)]
pub enum OrderError {
    #[error("Invalid configuration: max depth must be positive, got {0}")]
    InvalidMaxDepth(i64),

    #[error("Circular dependency detected: shard {0} is its own ancestor")]
    CircularDependency(String),

    #[error("Internal consistency failure: {0}")]
    InconsistentState(String),
}

/// Orders a batch of shards for processing
///
/// The result only contains items of the input, each at most once.
pub trait ShardOrderer {
    fn order<T: Prioritizable>(&self, batch: Vec<T>) -> Result<Vec<T>, OrderError>;
}

impl ShardOrderer for ParentsFirst {
    fn order<T: Prioritizable>(&self, batch: Vec<T>) -> Result<Vec<T>, OrderError> {
        self.prioritize(batch)
    }
}

impl ShardOrderer for Shuffle {
    fn order<T: Prioritizable>(&self, batch: Vec<T>) -> Result<Vec<T>, OrderError> {
        Ok(self.shuffle(batch))
    }
}

/// The ordering strategy selected by configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Orderer {
    ParentsFirst(ParentsFirst),
    Shuffle(Shuffle),
}

impl Orderer {
    /// Returns the configuration name of the selected strategy
    pub fn name(&self) -> &'static str {
        match self {
            Orderer::ParentsFirst(_) => "parents_first",
            Orderer::Shuffle(_) => "shuffle",
        }
    }
}

/// Parents-first without a depth bound
impl Default for Orderer {
    fn default() -> Self {
        Orderer::ParentsFirst(ParentsFirst::unbounded())
    }
}

impl From<ParentsFirst> for Orderer {
    fn from(strategy: ParentsFirst) -> Self {
        Orderer::ParentsFirst(strategy)
    }
}

impl From<Shuffle> for Orderer {
    fn from(strategy: Shuffle) -> Self {
        Orderer::Shuffle(strategy)
    }
}

impl ShardOrderer for Orderer {
    fn order<T: Prioritizable>(&self, batch: Vec<T>) -> Result<Vec<T>, OrderError> {
        match self {
            Orderer::ParentsFirst(strategy) => strategy.order(batch),
            Orderer::Shuffle(strategy) => strategy.order(batch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Checkpoint, Lease, ShardId};

    fn lease(id: &str, parents: &[&str]) -> Lease {
        Lease::new(ShardId::new(id).unwrap())
            .with_parents(parents.iter().map(|p| ShardId::new(*p).unwrap()))
    }

    fn ids(leases: &[Lease]) -> Vec<&str> {
        leases.iter().map(|l| l.lease_key.as_str()).collect()
    }

    /// Caller written only against the port
    fn assign<O: ShardOrderer>(orderer: &O, leases: Vec<Lease>) -> Result<Vec<Lease>, OrderError> {
        orderer.order(leases)
    }

    #[test]
    fn default_orderer_is_unbounded_parents_first() {
        let orderer = Orderer::default();
        assert_eq!(orderer.name(), "parents_first");
        assert_eq!(orderer, Orderer::ParentsFirst(ParentsFirst::unbounded()));
    }

    #[test]
    fn strategies_are_interchangeable_behind_the_port() {
        let batch = vec![
            lease("shardId-2", &["shardId-1"]),
            lease("shardId-1", &["shardId-0"]),
            lease("shardId-0", &[]),
        ];

        let parents_first: Orderer = ParentsFirst::unbounded().into();
        let ordered = assign(&parents_first, batch.clone()).unwrap();
        assert_eq!(ids(&ordered), vec!["shardId-0", "shardId-1", "shardId-2"]);

        let shuffle: Orderer = Shuffle::seeded(7).into();
        let mut shuffled = ids(&assign(&shuffle, batch.clone()).unwrap())
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>();
        shuffled.sort();
        assert_eq!(shuffled, vec!["shardId-0", "shardId-1", "shardId-2"]);
    }

    #[test]
    fn shuffle_ignores_cycles() {
        let batch = vec![lease("shardId-0", &["shardId-1"]), lease("shardId-1", &["shardId-0"])];

        let shuffle = Orderer::from(Shuffle::new());
        assert_eq!(assign(&shuffle, batch.clone()).unwrap().len(), 2);

        let parents_first = Orderer::default();
        assert!(matches!(
            assign(&parents_first, batch),
            Err(OrderError::CircularDependency(_))
        ));
    }

    #[test]
    fn orders_borrowed_snapshot() {
        let snapshot = vec![
            lease("shardId-1", &["shardId-0"]),
            lease("shardId-0", &[]).with_checkpoint(Checkpoint::Latest),
        ];

        let ordered = Orderer::default().order(snapshot.iter().collect()).unwrap();
        let ordered: Vec<_> = ordered.iter().map(|l| l.lease_key.as_str()).collect();
        assert_eq!(ordered, vec!["shardId-0", "shardId-1"]);
        assert_eq!(snapshot.len(), 2);
    }

    #[test]
    fn error_messages() {
        assert_eq!(
            OrderError::InvalidMaxDepth(0).to_string(),
            "Invalid configuration: max depth must be positive, got 0"
        );
        assert_eq!(
            OrderError::CircularDependency("shardId-5".to_string()).to_string(),
            "Circular dependency detected: shard shardId-5 is its own ancestor"
        );
    }
}
