//! File-backed checkpoint log.
//!
//! Rows are appended through a single handle opened in append mode, and
//! every append is followed by `fdatasync`. A torn tail found during
//! recovery is cut off with `set_len` so the next row starts cleanly.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;

use chainpools_core::checkpoint::{encode_rows, materialize_text, recover_text, CheckpointLog, Recovery};
use chainpools_core::error::PoolsError;
use chainpools_core::flat::ROW_DELIMITER;
use chainpools_core::types::{PoolRecord, SchemaVersion};

/// Append-only checkpoint log stored in a single file.
pub struct FileCheckpointLog {
    path: PathBuf,
    version: SchemaVersion,
    file: Option<File>,
}

impl FileCheckpointLog {
    pub fn new(path: impl Into<PathBuf>, version: SchemaVersion) -> Self {
        Self {
            path: path.into(),
            version,
            file: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whole log as text, or `None` if the file does not exist.
    async fn read(&self) -> Result<Option<String>, PoolsError> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        decode_log_bytes(bytes).map(Some)
    }

    async fn write_durable(&mut self, bytes: &[u8]) -> Result<(), PoolsError> {
        let file = match self.file.take() {
            Some(file) => file,
            None => {
                if let Some(parent) = self.path.parent() {
                    fs::create_dir_all(parent).await?;
                }
                OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&self.path)
                    .await?
            }
        };
        let file = self.file.insert(file);
        file.write_all(bytes).await?;
        file.sync_data().await?;
        Ok(())
    }
}

/// Decode the log text. A last row holding invalid UTF-8 is dropped like a
/// torn row; invalid bytes in any earlier row are corruption.
fn decode_log_bytes(bytes: Vec<u8>) -> Result<String, PoolsError> {
    let err = match String::from_utf8(bytes) {
        Ok(text) => return Ok(text),
        Err(e) => e,
    };
    let valid_up_to = err.utf8_error().valid_up_to();
    let mut bytes = err.into_bytes();
    let delim = ROW_DELIMITER.as_bytes();

    let row_start = bytes[..valid_up_to]
        .windows(delim.len())
        .rposition(|w| w == delim)
        .map_or(0, |i| i + delim.len());
    let row_end = bytes[valid_up_to..]
        .windows(delim.len())
        .position(|w| w == delim)
        .map(|i| valid_up_to + i + delim.len());

    if matches!(row_end, Some(end) if end < bytes.len()) {
        let row = bytes[..row_start]
            .windows(delim.len())
            .filter(|w| *w == delim)
            .count()
            + 1;
        return Err(PoolsError::CorruptRow {
            row,
            reason: format!("invalid UTF-8 at byte {valid_up_to}"),
        });
    }

    tracing::warn!(row_start, byte = valid_up_to, "dropping trailing checkpoint row with invalid UTF-8");
    bytes.truncate(row_start);
    String::from_utf8(bytes).map_err(|e| PoolsError::Storage(e.to_string()))
}

#[async_trait]
impl CheckpointLog for FileCheckpointLog {
    fn version(&self) -> SchemaVersion {
        self.version
    }

    async fn recover(&mut self) -> Result<Recovery, PoolsError> {
        let on_disk = match fs::metadata(&self.path).await {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Recovery::default()),
            Err(e) => return Err(e.into()),
        };
        let Some(text) = self.read().await? else {
            return Ok(Recovery::default());
        };
        let recovered = recover_text(self.version, &text)?;

        if (recovered.valid_len as u64) < on_disk {
            tracing::warn!(
                path = %self.path.display(),
                kept = recovered.valid_len,
                dropped = on_disk - recovered.valid_len as u64,
                "Truncating torn checkpoint tail"
            );
            self.file = None;
            let file = OpenOptions::new().write(true).open(&self.path).await?;
            file.set_len(recovered.valid_len as u64).await?;
            file.sync_all().await?;
        }

        if recovered.recovery.rows > 0 {
            tracing::info!(
                path = %self.path.display(),
                rows = recovered.recovery.rows,
                cursor = recovered.recovery.cursor,
                "Resuming from checkpoint log"
            );
        }
        Ok(recovered.recovery)
    }

    async fn append(&mut self, record: &PoolRecord) -> Result<(), PoolsError> {
        let row = self.version.to_flat(record)?.encode()?;
        self.write_durable(row.as_bytes()).await
    }

    async fn append_all(&mut self, records: &[PoolRecord]) -> Result<(), PoolsError> {
        if records.is_empty() {
            return Ok(());
        }
        let rows = encode_rows(self.version, records)?;
        self.write_durable(rows.as_bytes()).await
    }

    async fn materialize(&self) -> Result<Vec<PoolRecord>, PoolsError> {
        match self.read().await? {
            Some(text) => materialize_text(self.version, &text),
            None => Ok(vec![]),
        }
    }

    async fn discard(&mut self) -> Result<(), PoolsError> {
        self.file = None;
        match fs::remove_file(&self.path).await {
            Ok(()) => {
                tracing::info!(path = %self.path.display(), "Checkpoint log removed");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainpools_core::types::{PoolV3, TokenRef};

    fn pool(id: &str, block: u64) -> PoolRecord {
        PoolRecord::V3(PoolV3 {
            id: id.into(),
            token0: TokenRef::new("0xa"),
            token1: TokenRef::new("0xb"),
            created_at_block_number: block,
            fee_tier: "3000".into(),
            liquidity: "12345".into(),
            tvl_eth: 1.25,
            tvl_usd: 4000.5,
        })
    }

    #[tokio::test]
    async fn missing_file_recovers_to_zero() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = FileCheckpointLog::new(dir.path().join("v3/mainnet.csv"), SchemaVersion::V3);
        assert_eq!(log.recover_cursor().await.unwrap(), 0);
        assert!(log.materialize().await.unwrap().is_empty());
        log.discard().await.unwrap();
    }

    #[tokio::test]
    async fn append_creates_parent_dirs_and_persists_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("v3/mainnet.csv");
        let mut log = FileCheckpointLog::new(&path, SchemaVersion::V3);
        log.append(&pool("0x1", 5)).await.unwrap();
        log.append_all(&[pool("0x2", 6), pool("0x3", 6)]).await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.matches("\r\n").count(), 3);
        assert!(text.starts_with("0x1;0xa;0xb;5;3000;12345;1.25;4000.5\r\n"));

        // A fresh handle sees the same state.
        let mut reopened = FileCheckpointLog::new(&path, SchemaVersion::V3);
        let recovery = reopened.recover().await.unwrap();
        assert_eq!(recovery.cursor, 6);
        assert_eq!(recovery.rows, 3);
        assert_eq!(recovery.seen_ids.len(), 2);
    }

    #[tokio::test]
    async fn torn_tail_is_truncated_on_recover() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mainnet.csv");
        std::fs::write(
            &path,
            "0x1;0xa;0xb;5;3000;1;1;1\r\n0x2;0xa;0xb;7;3000;1;1;1\r\n0x3;0xa;0xb;9;30",
        )
        .unwrap();

        let mut log = FileCheckpointLog::new(&path, SchemaVersion::V3);
        assert_eq!(log.recover_cursor().await.unwrap(), 7);
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "0x1;0xa;0xb;5;3000;1;1;1\r\n0x2;0xa;0xb;7;3000;1;1;1\r\n"
        );

        log.append(&pool("0x3", 9)).await.unwrap();
        let ids: Vec<String> = log
            .materialize()
            .await
            .unwrap()
            .iter()
            .map(|r| r.id().to_string())
            .collect();
        assert_eq!(ids, vec!["0x1", "0x2", "0x3"]);
    }

    #[tokio::test]
    async fn invalid_utf8_in_torn_tail_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mainnet.csv");
        let mut bytes = b"0x1;0xa;0xb;5;3000;1;1;1\r\n0x2;".to_vec();
        bytes.extend_from_slice(&[0xE2, 0x82]);
        std::fs::write(&path, bytes).unwrap();

        let mut log = FileCheckpointLog::new(&path, SchemaVersion::V3);
        assert_eq!(log.recover_cursor().await.unwrap(), 5);
        assert_eq!(std::fs::read(&path).unwrap().len(), 26);
    }

    #[tokio::test]
    async fn invalid_utf8_in_last_complete_row_drops_only_that_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mainnet.csv");
        let mut bytes = b"0x1;0xa;0xb;5;3000;1;1;1\r\n0x2;0xa;0xb;7;3000;1;1;".to_vec();
        bytes.extend_from_slice(b"\xFF\r\n");
        std::fs::write(&path, bytes).unwrap();

        let mut log = FileCheckpointLog::new(&path, SchemaVersion::V3);
        let recovery = log.recover().await.unwrap();
        assert_eq!(recovery.cursor, 5);
        assert_eq!(recovery.rows, 1);
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "0x1;0xa;0xb;5;3000;1;1;1\r\n"
        );
        assert_eq!(log.materialize().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn invalid_utf8_in_middle_row_is_corruption() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mainnet.csv");
        let mut bytes = b"0x1;0xa;0xb;5;3000;1;1;1\r\n0x2;0xa;0xb;7;3000;1;1;".to_vec();
        bytes.extend_from_slice(b"\xFF\r\n0x3;0xa;0xb;9;3000;1;1;1\r\n");
        std::fs::write(&path, &bytes).unwrap();

        let mut log = FileCheckpointLog::new(&path, SchemaVersion::V3);
        let err = log.recover().await.unwrap_err();
        assert!(matches!(err, PoolsError::CorruptRow { row: 2, .. }));
        assert_eq!(std::fs::read(&path).unwrap(), bytes);
    }

    #[tokio::test]
    async fn discard_deletes_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mainnet.csv");
        let mut log = FileCheckpointLog::new(&path, SchemaVersion::V3);
        log.append(&pool("0x1", 1)).await.unwrap();
        assert!(path.exists());
        log.discard().await.unwrap();
        assert!(!path.exists());
    }
}
