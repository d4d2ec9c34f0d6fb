//! shard-order - parents-first ordering for shard leases

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = shard_order::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
