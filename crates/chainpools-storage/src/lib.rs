//! chainpools-storage: durable storage for ChainPools.
//!
//! - [`layout`]: where each (version, network) pair lives on disk
//! - [`file_log`]: append-only checkpoint log file
//! - [`snapshot`]: atomic JSON snapshot writer/reader

pub mod file_log;
pub mod layout;
pub mod snapshot;

pub use file_log::FileCheckpointLog;
pub use layout::TargetPaths;
pub use snapshot::{read_snapshot, write_snapshot};
