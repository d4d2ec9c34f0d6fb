//! Ordering commands (order, depths)

use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::output::Output;
use crate::domain::{Lease, Prioritizable, ShardInfo};
use crate::order::{DepthResolver, Orderer, ShardOrderer};
use crate::storage::{BatchStore, OrderingConfig};

/// Record type stored in a batch file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum RecordKind {
    /// Lease-table rows (`lease_key`, `parent_shard_ids`, `checkpoint`, ...)
    #[default]
    Lease,
    /// Worker shard descriptors (`shard_id`, `parent_shard_ids`, `checkpoint`, ...)
    Shard,
}

/// Orders a batch with the configured strategy
pub fn order(
    output: &Output,
    ordering: &OrderingConfig,
    input: &Path,
    kind: RecordKind,
    dest: Option<&Path>,
) -> Result<()> {
    let orderer = ordering.orderer()?;

    match kind {
        RecordKind::Lease => order_batch::<Lease>(output, &orderer, input, dest),
        RecordKind::Shard => order_batch::<ShardInfo>(output, &orderer, input, dest),
    }
}

fn order_batch<R>(
    output: &Output,
    orderer: &Orderer,
    input: &Path,
    dest: Option<&Path>,
) -> Result<()>
where
    R: Prioritizable + Serialize + DeserializeOwned,
{
    let store = BatchStore::new(input);
    let batch: Vec<R> = store.read_all()?;
    let total = batch.len();
    debug!(source = %store, records = total, strategy = orderer.name(), "Ordering batch");

    let ordered = orderer
        .order(batch)
        .with_context(|| format!("Failed to order batch from {}", store))?;

    if let Some(dest) = dest {
        BatchStore::new(dest).write_all(&ordered)?;
        output.success(&format!(
            "Wrote {} of {} records to {}",
            ordered.len(),
            total,
            dest.display()
        ));
    } else if output.is_json() {
        output.data(&ordered);
    } else if ordered.is_empty() {
        println!("No shards to process.");
    } else {
        println!("{:<6} {:<30} PARENTS", "#", "SHARD");
        println!("{}", "-".repeat(60));
        for (position, item) in ordered.iter().enumerate() {
            let parents: Vec<_> = item.parent_shard_ids().collect();
            println!("{:<6} {:<30} {}", position + 1, item.shard_id(), parents.join(", "));
        }

        println!();
        println!("Ordered {} of {} shard(s)", ordered.len(), total);
    }

    Ok(())
}

#[derive(Serialize)]
struct DepthRow<'a> {
    shard_id: &'a str,
    depth: usize,
    completed: bool,
}

/// Shows the resolved depth of every shard in a batch
pub fn depths(output: &Output, input: &Path, kind: RecordKind) -> Result<()> {
    match kind {
        RecordKind::Lease => depths_of::<Lease>(output, input),
        RecordKind::Shard => depths_of::<ShardInfo>(output, input),
    }
}

fn depths_of<R>(output: &Output, input: &Path) -> Result<()>
where
    R: Prioritizable + DeserializeOwned,
{
    let store = BatchStore::new(input);
    let batch: Vec<R> = store.read_all()?;

    let depths = DepthResolver::new(&batch)
        .resolve()
        .with_context(|| format!("Failed to resolve depths for {}", store))?;
    debug!(
        source = %store,
        records = batch.len(),
        max_depth = depths.max_depth(),
        "Resolved depths"
    );

    let rows: Vec<_> = batch
        .iter()
        .zip(depths.iter())
        .filter_map(|(item, depth)| {
            depth.map(|depth| DepthRow {
                shard_id: item.shard_id(),
                depth,
                completed: item.is_completed(),
            })
        })
        .collect();

    if output.is_json() {
        output.data(&rows);
    } else if rows.is_empty() {
        println!("No shards in batch.");
    } else {
        println!("{:<30} {:<6} COMPLETED", "SHARD", "DEPTH");
        println!("{}", "-".repeat(50));
        for row in &rows {
            let completed = if row.completed { "yes" } else { "no" };
            println!("{:<30} {:<6} {}", row.shard_id, row.depth, completed);
        }

        println!();
        println!("Max depth: {}", depths.max_depth());
    }

    Ok(())
}
