//! Checkpoint log: the append-only record of fetched pools.
//!
//! Every fetched pool is appended as one flat row. On restart the last row
//! gives the resume cursor; when the fetch completes the log is read back
//! into the final snapshot and then discarded.
//!
//! A crash mid-append leaves a torn trailing row. Recovery drops it (and a
//! last complete row that fails to parse), never anything before it.

use std::collections::HashSet;

use async_trait::async_trait;

use crate::error::PoolsError;
use crate::flat::{split_log, FlatRecord};
use crate::paginator::PageSink;
use crate::types::{PoolRecord, SchemaVersion};

/// Where a fetch should resume.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recovery {
    /// `createdAtBlockNumber` of the last logged pool, or 0 for a fresh log.
    pub cursor: u64,
    /// Ids of logged pools created at `cursor`; they will be served again.
    pub seen_ids: HashSet<String>,
    /// Number of intact rows in the log.
    pub rows: usize,
}

/// Result of scanning raw log text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveredLog {
    pub recovery: Recovery,
    /// Length of the intact prefix. Bytes past it must be truncated before
    /// the next append.
    pub valid_len: usize,
}

/// Scan a log for the resume position.
pub fn recover_text(version: SchemaVersion, text: &str) -> Result<RecoveredLog, PoolsError> {
    let log = split_log(text);
    let mut rows = log.rows;
    let mut valid_len = log.complete_len;

    let Some(last) = rows.last() else {
        return Ok(RecoveredLog {
            recovery: Recovery::default(),
            valid_len: 0,
        });
    };
    let last_index = rows.len();
    let last_record = match version.from_flat(&FlatRecord::decode(last), last_index) {
        Ok(record) => record,
        Err(e) => {
            tracing::warn!(row = last_index, error = %e, "dropping unreadable trailing checkpoint row");
            valid_len = log.offsets[last_index - 1];
            rows.pop();
            match rows.last() {
                Some(prev) => version.from_flat(&FlatRecord::decode(prev), rows.len())?,
                None => {
                    return Ok(RecoveredLog {
                        recovery: Recovery::default(),
                        valid_len,
                    })
                }
            }
        }
    };

    let cursor = last_record.created_at_block_number();
    let mut seen_ids = HashSet::new();
    for (i, row) in rows.iter().enumerate().rev() {
        let record = version.from_flat(&FlatRecord::decode(row), i + 1)?;
        if record.created_at_block_number() != cursor {
            break;
        }
        seen_ids.insert(record.id().to_string());
    }

    Ok(RecoveredLog {
        recovery: Recovery {
            cursor,
            seen_ids,
            rows: rows.len(),
        },
        valid_len,
    })
}

/// Decode every intact row of a log, in file order.
pub fn materialize_text(version: SchemaVersion, text: &str) -> Result<Vec<PoolRecord>, PoolsError> {
    let rows = split_log(text).rows;
    let mut records = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        match version.from_flat(&FlatRecord::decode(row), i + 1) {
            Ok(record) => records.push(record),
            Err(e) if i + 1 == rows.len() => {
                tracing::warn!(row = i + 1, error = %e, "skipping unreadable trailing checkpoint row");
            }
            Err(e) => return Err(e),
        }
    }
    Ok(records)
}

/// Encode a run of records as contiguous log rows.
pub fn encode_rows(version: SchemaVersion, records: &[PoolRecord]) -> Result<String, PoolsError> {
    let mut out = String::new();
    for record in records {
        out.push_str(&version.to_flat(record)?.encode()?);
    }
    Ok(out)
}

/// Durable, append-only log of fetched pools for one (network, version).
#[async_trait]
pub trait CheckpointLog: Send + Sync {
    /// Schema version of the rows in this log.
    fn version(&self) -> SchemaVersion;

    /// Find the resume position, repairing a torn tail if there is one.
    async fn recover(&mut self) -> Result<Recovery, PoolsError>;

    /// Resume cursor only; 0 when the log is absent or empty.
    async fn recover_cursor(&mut self) -> Result<u64, PoolsError> {
        Ok(self.recover().await?.cursor)
    }

    /// Append one record. It is durable once this returns.
    async fn append(&mut self, record: &PoolRecord) -> Result<(), PoolsError>;

    /// Append a page of records; all are durable once this returns.
    async fn append_all(&mut self, records: &[PoolRecord]) -> Result<(), PoolsError> {
        for record in records {
            self.append(record).await?;
        }
        Ok(())
    }

    /// Read every logged record back in fetch order.
    async fn materialize(&self) -> Result<Vec<PoolRecord>, PoolsError>;

    /// Delete the log. Only call after the snapshot has been written.
    async fn discard(&mut self) -> Result<(), PoolsError>;
}

/// [`PageSink`] that appends every delivered page to a checkpoint log.
pub struct CheckpointSink<'a> {
    log: &'a mut dyn CheckpointLog,
}

impl<'a> CheckpointSink<'a> {
    pub fn new(log: &'a mut dyn CheckpointLog) -> Self {
        Self { log }
    }
}

#[async_trait]
impl PageSink for CheckpointSink<'_> {
    async fn accept(&mut self, page: &[PoolRecord]) -> Result<(), PoolsError> {
        self.log.append_all(page).await
    }
}

// ─── In-memory log (for testing) ─────────────────────────────────────────────

/// In-memory checkpoint log holding the same text a file log would.
///
/// Survives nothing; use it for tests and runs that never resume.
#[derive(Debug, Clone)]
pub struct MemoryCheckpointLog {
    version: SchemaVersion,
    text: Option<String>,
}

impl MemoryCheckpointLog {
    pub fn new(version: SchemaVersion) -> Self {
        Self { version, text: None }
    }

    /// Start from existing log text (e.g. a torn write).
    pub fn with_text(version: SchemaVersion, text: impl Into<String>) -> Self {
        Self {
            version,
            text: Some(text.into()),
        }
    }

    /// Raw log text, or `None` once discarded / before the first append.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }
}

#[async_trait]
impl CheckpointLog for MemoryCheckpointLog {
    fn version(&self) -> SchemaVersion {
        self.version
    }

    async fn recover(&mut self) -> Result<Recovery, PoolsError> {
        let Some(text) = self.text.as_mut() else {
            return Ok(Recovery::default());
        };
        let recovered = recover_text(self.version, text)?;
        text.truncate(recovered.valid_len);
        Ok(recovered.recovery)
    }

    async fn append(&mut self, record: &PoolRecord) -> Result<(), PoolsError> {
        let row = self.version.to_flat(record)?.encode()?;
        self.text.get_or_insert_with(String::new).push_str(&row);
        Ok(())
    }

    async fn materialize(&self) -> Result<Vec<PoolRecord>, PoolsError> {
        match &self.text {
            Some(text) => materialize_text(self.version, text),
            None => Ok(vec![]),
        }
    }

    async fn discard(&mut self) -> Result<(), PoolsError> {
        self.text = None;
        Ok(())
    }
}
