//! chainpools-core: foundation for the resumable subgraph pool fetcher.
//!
//! # Architecture
//!
//! ```text
//! PoolFetcher (chainpools-subgraph)
//!     ├── CheckpointLog   (recover cursor, append rows, materialize, discard)
//!     └── Paginator       (page loop, cursor advance, boundary dedup)
//!             ├── PoolsQuery      (per-version GraphQL document)
//!             ├── filter          (block / reserve / token predicates)
//!             ├── PageSource      (transport seam)
//!             └── SchemaVersion   (wire → record → flat row transcoding)
//! ```

pub mod checkpoint;
pub mod config;
pub mod error;
pub mod filter;
pub mod flat;
pub mod paginator;
pub mod query;
pub mod tokens;
pub mod transcoder;
pub mod types;

pub use checkpoint::{CheckpointLog, CheckpointSink, MemoryCheckpointLog, Recovery};
pub use config::{FetchConfig, FetchTarget};
pub use error::PoolsError;
pub use filter::FilterParams;
pub use flat::FlatRecord;
pub use paginator::{FetchSummary, PageRequest, PageSink, PageSource, Paginator};
pub use query::PoolsQuery;
pub use tokens::{TokenList, NATIVE_TOKEN_ADDRESS};
pub use types::{Network, PoolRecord, PoolV2, PoolV3, PoolV4, SchemaVersion, TokenRef};
