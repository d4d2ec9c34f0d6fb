//! # Storage Layer
//!
//! File formats around the ordering core.
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Batches | JSONL (one lease or shard per line) | any file, or stdin via `-` |
//! | Config | TOML | `--config`, `SHARD_ORDER_CONFIG`, or `~/.config/shard-order/config.toml` |
//!
//! [`BatchStore`] locks batch files with `fs2` while reading, and writes
//! through a temp file + rename.

mod jsonl;
mod config;

pub use jsonl::BatchStore;
pub use config::{Config, ConfigError, OrderingConfig, OutputFormat, StrategyKind};
