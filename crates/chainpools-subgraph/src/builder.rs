//! Fluent builder for [`FetchConfig`].
//!
//! ```rust,no_run
//! use chainpools_core::types::{Network, SchemaVersion};
//! use chainpools_subgraph::FetchConfigBuilder;
//!
//! let config = FetchConfigBuilder::new()
//!     .network(Network::ArbitrumMainnet)
//!     .version(SchemaVersion::V3)
//!     .whitelist(true)
//!     .min_reserve(1.0)
//!     .build()
//!     .unwrap();
//! ```

use std::path::PathBuf;

use chainpools_core::config::{FetchConfig, FetchTarget};
use chainpools_core::error::PoolsError;
use chainpools_core::types::{Network, SchemaVersion};

#[derive(Default)]
pub struct FetchConfigBuilder {
    config: FetchConfig,
}

impl FetchConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing config.
    pub fn from_config(config: FetchConfig) -> Self {
        Self { config }
    }

    pub fn network(mut self, network: Network) -> Self {
        self.config.target.network = network;
        self
    }

    /// Resolve the network from an EVM chain id.
    pub fn chain_id(mut self, chain_id: u64) -> Result<Self, PoolsError> {
        self.config.target.network = Network::from_chain_id(chain_id)?;
        Ok(self)
    }

    pub fn version(mut self, version: SchemaVersion) -> Self {
        self.config.target.version = version;
        self
    }

    pub fn target(mut self, target: FetchTarget) -> Self {
        self.config.target = target;
        self
    }

    pub fn page_size(mut self, size: usize) -> Self {
        self.config.page_size = size;
        self
    }

    pub fn min_reserve(mut self, reserve: f64) -> Self {
        self.config.min_reserve = Some(reserve);
        self
    }

    /// Drop the reserve predicate entirely.
    pub fn no_min_reserve(mut self) -> Self {
        self.config.min_reserve = None;
        self
    }

    pub fn whitelist(mut self, whitelist: bool) -> Self {
        self.config.whitelist = whitelist;
        self
    }

    pub fn token_list(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.token_list = path.into();
        self
    }

    pub fn output_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.output_root = path.into();
        self
    }

    /// Validated config.
    pub fn build(self) -> Result<FetchConfig, PoolsError> {
        self.config.validate()?;
        Ok(self.config)
    }

    /// Config without validation.
    pub fn build_config(self) -> FetchConfig {
        self.config
    }
}
