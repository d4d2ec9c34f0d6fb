//! JSONL batch files
//!
//! A batch is a snapshot of lease or shard records with one JSON object per
//! line, as dumped from a lease table. Reading from a file holds a shared
//! lock so a concurrent dump is never read half-written; `-` reads stdin.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Where a batch is read from
#[derive(Debug, Clone, PartialEq, Eq)]
enum Source {
    File(PathBuf),
    Stdin,
}

/// Reads and writes batches in JSONL format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchStore {
    source: Source,
}

impl BatchStore {
    /// Creates a store for the given path; `-` means stdin
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if path.as_os_str() == "-" {
            Self::stdin()
        } else {
            Self {
                source: Source::File(path),
            }
        }
    }

    /// Creates a store reading from stdin
    pub fn stdin() -> Self {
        Self {
            source: Source::Stdin,
        }
    }

    /// Returns the file path, or `None` for stdin
    pub fn path(&self) -> Option<&Path> {
        match &self.source {
            Source::File(path) => Some(path),
            Source::Stdin => None,
        }
    }

    /// Reads every record of the batch, in file order
    pub fn read_all<R: DeserializeOwned>(&self) -> Result<Vec<R>> {
        match &self.source {
            Source::Stdin => {
                let stdin = io::stdin();
                parse_lines(stdin.lock())
            }
            Source::File(path) => {
                let file = File::open(path)
                    .with_context(|| format!("Failed to open batch: {}", path.display()))?;

                // Acquire shared lock for reading
                file.lock_shared()
                    .context("Failed to acquire read lock on batch")?;

                // Lock is released when file is dropped
                parse_lines(BufReader::new(&file))
                    .with_context(|| format!("Failed to read batch: {}", path.display()))
            }
        }
    }

    /// Writes records to the store's file (full rewrite, atomic)
    pub fn write_all<R: Serialize>(&self, records: &[R]) -> Result<()> {
        let path = self
            .path()
            .ok_or_else(|| anyhow::anyhow!("Cannot write a batch to stdin"))?;

        // Ensure parent directory exists
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        // Write to temp file first
        let temp_path = path.with_extension("jsonl.tmp");

        {
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp_path)
                .with_context(|| format!("Failed to create temp file: {}", temp_path.display()))?;

            // Acquire exclusive lock
            file.lock_exclusive()
                .context("Failed to acquire write lock on batch")?;

            let mut writer = BufWriter::new(&file);
            for record in records {
                let line = serde_json::to_string(record).context("Failed to serialize record")?;
                writeln!(writer, "{}", line).context("Failed to write record")?;
            }

            writer.flush().context("Failed to flush batch")?;
        }

        // Atomic rename
        fs::rename(&temp_path, path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                temp_path.display(),
                path.display()
            )
        })?;

        Ok(())
    }
}

impl fmt::Display for BatchStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Source::File(path) => write!(f, "{}", path.display()),
            Source::Stdin => f.write_str("<stdin>"),
        }
    }
}

/// Parses one record per non-blank line
fn parse_lines<R: DeserializeOwned, B: BufRead>(reader: B) -> Result<Vec<R>> {
    let mut records = Vec::new();

    for (line_num, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read line {}", line_num + 1))?;

        if line.trim().is_empty() {
            continue;
        }

        let record = serde_json::from_str(&line)
            .with_context(|| format!("Failed to parse record at line {}", line_num + 1))?;
        records.push(record);
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Checkpoint, Lease, ShardId, ShardInfo};
    use tempfile::TempDir;

    fn id(s: &str) -> ShardId {
        ShardId::new(s).unwrap()
    }

    #[test]
    fn dash_means_stdin() {
        let store = BatchStore::new("-");
        assert_eq!(store, BatchStore::stdin());
        assert_eq!(store.path(), None);
        assert_eq!(store.to_string(), "<stdin>");
    }

    #[test]
    fn read_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let store = BatchStore::new(dir.path().join("absent.jsonl"));
        assert!(store.read_all::<Lease>().is_err());
    }

    #[test]
    fn write_and_read_leases() {
        let dir = TempDir::new().unwrap();
        let store = BatchStore::new(dir.path().join("out").join("leases.jsonl"));

        let leases = vec![
            Lease::new(id("shardId-0")).with_checkpoint(Checkpoint::ShardEnd),
            Lease::new(id("shardId-1")).with_parents([id("shardId-0")]),
        ];
        store.write_all(&leases).unwrap();

        let read: Vec<Lease> = store.read_all().unwrap();
        assert_eq!(read, leases);
        assert!(!dir.path().join("out").join("leases.jsonl.tmp").exists());
    }

    #[test]
    fn skips_blank_lines() {
        let input = "\n{\"shard_id\": \"shardId-0\"}\n   \n{\"shard_id\": \"shardId-1\"}\n";
        let shards: Vec<ShardInfo> = parse_lines(input.as_bytes()).unwrap();
        assert_eq!(shards.len(), 2);
        assert_eq!(shards[1].shard_id, id("shardId-1"));
    }

    #[test]
    fn parse_error_names_the_line() {
        let input = "{\"shard_id\": \"shardId-0\"}\nnot json\n";
        let err = parse_lines::<ShardInfo, _>(input.as_bytes()).unwrap_err();
        assert!(format!("{:#}", err).contains("line 2"));
    }

    #[test]
    fn cannot_write_to_stdin() {
        let records: Vec<Lease> = vec![];
        assert!(BatchStore::stdin().write_all(&records).is_err());
    }
}
