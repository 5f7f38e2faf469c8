//! chainpools-subgraph: talks to the Uniswap subgraphs and drives fetch runs.
//!
//! - [`client`]: GraphQL page source with rate limiting and retry
//! - [`endpoints`]: deployed subgraph ids per (network, version)
//! - [`fetch_loop`]: resumable single-target run and the batch runner
//! - [`builder`]: fluent [`FetchConfig`](chainpools_core::FetchConfig) builder

pub mod builder;
pub mod client;
pub mod endpoints;
pub mod fetch_loop;
pub mod policy;

pub use builder::FetchConfigBuilder;
pub use client::{SubgraphClient, SubgraphClientConfig};
pub use fetch_loop::{default_plan, run_batch, run_batch_with, FetchReport, PoolFetcher, TargetOutcome};
