//! Final snapshot: one JSON array of normalized pools per target.
//!
//! The document is written to a sibling temp file, synced, then renamed over
//! the destination, so a reader never sees a partial snapshot.

use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;

use chainpools_core::error::PoolsError;
use chainpools_core::types::{PoolRecord, SchemaVersion};

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("snapshot"));
    name.push(".tmp");
    path.with_file_name(name)
}

/// Atomically replace the snapshot at `path`. Returns the bytes written.
pub async fn write_snapshot(path: &Path, records: &[PoolRecord]) -> Result<usize, PoolsError> {
    let json = serde_json::to_vec(records)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let tmp = temp_path(path);
    let mut file = File::create(&tmp).await?;
    file.write_all(&json).await?;
    file.sync_all().await?;
    drop(file);

    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(e.into());
    }

    tracing::info!(path = %path.display(), pools = records.len(), bytes = json.len(), "Snapshot written");
    Ok(json.len())
}

/// Load a snapshot written by [`write_snapshot`]; `None` if absent.
pub async fn read_snapshot(
    path: &Path,
    version: SchemaVersion,
) -> Result<Option<Vec<PoolRecord>>, PoolsError> {
    match fs::read_to_string(path).await {
        Ok(json) => version.parse_snapshot(&json).map(Some),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainpools_core::types::{PoolV4, TokenRef};

    fn pool(id: &str) -> PoolRecord {
        PoolRecord::V4(PoolV4 {
            id: id.into(),
            token0: TokenRef::new("0x0000000000000000000000000000000000000000"),
            token1: TokenRef::new("0xb"),
            created_at_block_number: 42,
            fee_tier: "500".into(),
            tick_spacing: "10".into(),
            hooks: "0x0000000000000000000000000000000000000000".into(),
            liquidity: "99".into(),
            tvl_eth: 0.5,
            tvl_usd: 1500.0,
        })
    }

    #[tokio::test]
    async fn write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("v4/mainnet.json");
        let records = vec![pool("0x1"), pool("0x2")];

        write_snapshot(&path, &records).await.unwrap();
        assert!(!temp_path(&path).exists());

        let loaded = read_snapshot(&path, SchemaVersion::V4).await.unwrap().unwrap();
        assert_eq!(loaded, records);

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json[0]["tickSpacing"], "10");
        assert_eq!(json[1]["tvlUSD"], 1500.0);
    }

    #[tokio::test]
    async fn overwrite_replaces_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mainnet.json");
        write_snapshot(&path, &[pool("0x1"), pool("0x2")]).await.unwrap();
        write_snapshot(&path, &[pool("0x3")]).await.unwrap();

        let loaded = read_snapshot(&path, SchemaVersion::V4).await.unwrap().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id(), "0x3");
    }

    #[tokio::test]
    async fn absent_snapshot_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = read_snapshot(&dir.path().join("nope.json"), SchemaVersion::V2)
            .await
            .unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn temp_path_is_a_sibling() {
        assert_eq!(
            temp_path(Path::new("/a/v2/mainnet.json")),
            PathBuf::from("/a/v2/mainnet.json.tmp")
        );
    }
}
