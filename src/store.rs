use crate::digest::digest;
use crate::error::{CountError, RecordAction, display_token};
use crate::record;
use rustc_hash::FxHashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::trace;

/// In-memory token counts handed over on every flush.
pub type CountBuffer = FxHashMap<Vec<u8>, u64>;

/// Destination for flushed buffers.
pub trait PartialSums {
    /// Add every count in `buffer` to the running totals.
    fn merge(&mut self, buffer: &CountBuffer) -> Result<(), CountError>;
}

/// What to do when a record file already holds a different token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollisionPolicy {
    /// Fail the run.
    #[default]
    Reject,
    /// Add into the existing record and keep the incoming token.
    Ignore,
}

/// Disk-backed running totals, one record file per token digest.
pub struct PartialSumStore {
    dir: PathBuf,
    collisions: CollisionPolicy,
    sync: bool,
}

impl PartialSumStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            collisions: CollisionPolicy::default(),
            sync: true,
        }
    }

    pub fn with_collision_policy(mut self, policy: CollisionPolicy) -> Self {
        self.collisions = policy;
        self
    }

    /// Fsync each record before it is closed. On by default, since a
    /// dropped `File` discards any deferred write failure.
    pub fn with_sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }

    pub fn syncs(&self) -> bool {
        self.sync
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn record_path(&self, token: &[u8]) -> PathBuf {
        self.dir.join(digest(token))
    }

    /// Current stored total for `token`, if it has a record.
    pub fn stored_count(&self, token: &[u8]) -> Result<Option<u64>, CountError> {
        let contents = match fs::read(self.record_path(token)) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CountError::record(token, RecordAction::Read, e)),
        };
        let stored = record::parse(&contents).map_err(|e| CountError::parse(token, e.to_string()))?;
        Ok(Some(stored.count))
    }

    fn merge_one(&self, token: &[u8], count: u64) -> Result<(), CountError> {
        let path = self.record_path(token);

        let exists = match fs::metadata(&path) {
            Ok(_) => true,
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(e) => return Err(CountError::record(token, RecordAction::Stat, e)),
        };

        let (mut file, total) = if exists {
            self.open_existing(&path, token, count)?
        } else {
            let file = OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .map_err(|e| CountError::record(token, RecordAction::Create, e))?;
            (file, count)
        };

        let line = record::encode(token, total);
        file.write_all(&line)
            .map_err(|e| CountError::record(token, RecordAction::Write, e))?;
        // Counts only grow, but never leave stale bytes past the new record.
        file.set_len(line.len() as u64)
            .map_err(|e| CountError::record(token, RecordAction::Truncate, e))?;
        if self.sync {
            file.sync_all()
                .map_err(|e| CountError::record(token, RecordAction::Sync, e))?;
        }

        trace!(token = %display_token(token), added = count, total, "merged record");
        Ok(())
    }

    /// Open an existing record, add `count` to it and rewind for rewrite.
    fn open_existing(&self, path: &Path, token: &[u8], count: u64) -> Result<(File, u64), CountError> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| CountError::record(token, RecordAction::Open, e))?;

        let mut contents = Vec::new();
        file.read_to_end(&mut contents)
            .map_err(|e| CountError::record(token, RecordAction::Read, e))?;

        let stored = record::parse(&contents).map_err(|e| CountError::parse(token, e.to_string()))?;

        if stored.token != token && self.collisions == CollisionPolicy::Reject {
            return Err(CountError::Collision {
                token: display_token(token),
                stored: display_token(stored.token),
            });
        }

        let total = stored.count.checked_add(count).ok_or_else(|| CountError::Overflow {
            token: display_token(token),
        })?;

        file.seek(SeekFrom::Start(0))
            .map_err(|e| CountError::record(token, RecordAction::Write, e))?;

        Ok((file, total))
    }
}

impl PartialSums for PartialSumStore {
    fn merge(&mut self, buffer: &CountBuffer) -> Result<(), CountError> {
        for (token, &count) in buffer {
            self.merge_one(token, count)?;
        }
        Ok(())
    }
}
