//! Staging area for inbound shard payloads.
//!
//! Incoming shard data lands in uniquely numbered sequential files under a
//! dedicated receive directory before a merge cycle promotes it into the
//! live schema stores. The receive directory is recreated clean on startup:
//! parts left behind by a previous process were mid-transfer and cannot be
//! replayed, so they are discarded rather than merged.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{info, warn};

use crate::error::Result;

const RECEIVE_DIR: &str = "receive";
const PART_EXTENSION: &str = "part";
const TMP_EXTENSION: &str = "tmp";

/// Configuration for the staging store.
#[derive(Debug, Clone)]
pub struct StagingConfig {
    /// Root directory; the receive directory is created beneath it.
    pub root_dir: PathBuf,
}

/// The staging store: numbered sequential receive files awaiting merge.
#[derive(Debug)]
pub struct StagingStore {
    receive_dir: PathBuf,
    sequence: AtomicU64,
}

impl StagingStore {
    /// Creates the root and receive directories, discarding any parts left
    /// over from a previous run.
    ///
    /// # Errors
    ///
    /// Any I/O failure creating the directories is fatal at construction.
    pub fn open(config: StagingConfig) -> Result<Self> {
        fs::create_dir_all(&config.root_dir)?;
        let receive_dir = config.root_dir.join(RECEIVE_DIR);

        if receive_dir.exists() {
            for entry in fs::read_dir(&receive_dir)? {
                let path = entry?.path();
                warn!(path = %path.display(), "discarding stale staging file");
                if path.is_dir() {
                    fs::remove_dir_all(&path)?;
                } else {
                    fs::remove_file(&path)?;
                }
            }
        } else {
            fs::create_dir_all(&receive_dir)?;
        }

        info!(dir = %receive_dir.display(), "opened staging store");
        Ok(Self {
            receive_dir,
            sequence: AtomicU64::new(0),
        })
    }

    /// Opens the next sequential part file for writing.
    ///
    /// The part is written under a temporary name and only renamed to its
    /// final name by [`StagedPartWriter::finish`], so an in-flight part is
    /// never visible to [`StagingStore::parts`].
    pub fn begin_part(&self) -> Result<StagedPartWriter> {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        let tmp_path = self.sequence_path(sequence, TMP_EXTENSION);
        let file = File::create(&tmp_path)?;
        Ok(StagedPartWriter {
            sequence,
            tmp_path,
            path: self.sequence_path(sequence, PART_EXTENSION),
            writer: BufWriter::new(file),
            len: 0,
        })
    }

    /// Lists finished parts in sequence order, ready for a merge cycle.
    pub fn parts(&self) -> Result<Vec<StagedPart>> {
        let mut parts = Vec::new();
        for entry in fs::read_dir(&self.receive_dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(PART_EXTENSION) {
                continue;
            }
            let Some(sequence) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| u64::from_str_radix(s, 16).ok())
            else {
                continue;
            };
            let len = entry.metadata()?.len();
            parts.push(StagedPart {
                sequence,
                path,
                len,
            });
        }
        parts.sort_by_key(|part| part.sequence);
        Ok(parts)
    }

    fn sequence_path(&self, sequence: u64, extension: &str) -> PathBuf {
        self.receive_dir.join(format!("{sequence:016x}.{extension}"))
    }
}

/// An open part file receiving shard payload bytes.
#[derive(Debug)]
pub struct StagedPartWriter {
    sequence: u64,
    tmp_path: PathBuf,
    path: PathBuf,
    writer: BufWriter<File>,
    len: u64,
}

impl StagedPartWriter {
    /// The part's sequence number.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Appends payload bytes.
    pub fn write(&mut self, buf: &[u8]) -> Result<()> {
        self.writer.write_all(buf)?;
        self.len += buf.len() as u64;
        Ok(())
    }

    /// Flushes and syncs the part, then renames it to its final name so it
    /// becomes visible as a merge candidate.
    pub fn finish(mut self) -> Result<StagedPart> {
        self.writer.flush()?;
        self.writer.get_ref().sync_all()?;
        fs::rename(&self.tmp_path, &self.path)?;
        Ok(StagedPart {
            sequence: self.sequence,
            path: self.path,
            len: self.len,
        })
    }
}

/// A finished part awaiting merge into the live stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedPart {
    sequence: u64,
    path: PathBuf,
    len: u64,
}

impl StagedPart {
    /// The part's sequence number.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Path of the part file.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Size of the part in bytes.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Deletes the part file after a completed merge.
    pub fn remove(self) -> Result<()> {
        fs::remove_file(&self.path)?;
        Ok(())
    }
}
