//! # Command-Line Interface
//!
//! Inspect how a lease snapshot would be handed out to workers.
//!
//! ## Commands
//!
//! | Command | Purpose |
//! |---------|---------|
//! | `order` | Order a JSONL batch with the configured strategy |
//! | `depths` | Show each shard's dependency depth |
//! | `config` | Show the effective configuration |
//!
//! ## Output Formats
//!
//! All commands support `--format` flag:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! ## Logging
//!
//! Logs go to stderr. `RUST_LOG` sets the filter; `--verbose` (or `-v`)
//! forces debug output:
//! ```bash
//! shard-order --verbose order leases.jsonl --max-depth 2
//! ```
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod output;
mod order_cmd;

pub use app::{Cli, Commands, StrategyArgs, run};
pub use order_cmd::RecordKind;
pub use output::{Output, OutputFormat};
