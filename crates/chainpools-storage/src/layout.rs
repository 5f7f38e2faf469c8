//! On-disk layout: `{root}/v{version}/{network}.csv` for the checkpoint log
//! and `{root}/v{version}/{network}.json` for the snapshot.

use std::path::{Path, PathBuf};

use chainpools_core::config::FetchTarget;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetPaths {
    pub dir: PathBuf,
    pub log: PathBuf,
    pub snapshot: PathBuf,
}

impl TargetPaths {
    pub fn new(root: &Path, target: FetchTarget) -> Self {
        let dir = root.join(format!("v{}", target.version.number()));
        let stem = target.network.name();
        Self {
            log: dir.join(format!("{stem}.csv")),
            snapshot: dir.join(format!("{stem}.json")),
            dir,
        }
    }
}
