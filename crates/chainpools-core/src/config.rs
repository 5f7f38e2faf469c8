//! Fetch configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::PoolsError;
use crate::filter::FilterParams;
use crate::tokens::TokenList;
use crate::types::{Network, SchemaVersion};

pub const DEFAULT_PAGE_SIZE: usize = 100;
/// Minimum tracked reserve (native units) when none is given.
pub const DEFAULT_MIN_RESERVE: f64 = 0.1;
pub const DEFAULT_OUTPUT_ROOT: &str = "./public/pools/uniswap";
pub const DEFAULT_TOKEN_LIST: &str = "./public/tokens/lists/zenswap.json";

/// One (network, schema version) combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FetchTarget {
    pub network: Network,
    pub version: SchemaVersion,
}

impl FetchTarget {
    pub fn new(network: Network, version: SchemaVersion) -> Self {
        Self { network, version }
    }
}

impl std::fmt::Display for FetchTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.network, self.version)
    }
}

/// Configuration for fetching one target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    pub target: FetchTarget,
    /// Pools per page request.
    pub page_size: usize,
    /// Minimum reserve/TVL; `None` = no reserve predicate.
    pub min_reserve: Option<f64>,
    /// Restrict both pool tokens to the token list.
    pub whitelist: bool,
    /// Token list consulted when `whitelist` is set.
    pub token_list: PathBuf,
    /// Root of the `v{version}/{network}.*` output tree.
    pub output_root: PathBuf,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            target: FetchTarget::new(Network::EthereumMainnet, SchemaVersion::V3),
            page_size: DEFAULT_PAGE_SIZE,
            min_reserve: Some(DEFAULT_MIN_RESERVE),
            whitelist: false,
            token_list: PathBuf::from(DEFAULT_TOKEN_LIST),
            output_root: PathBuf::from(DEFAULT_OUTPUT_ROOT),
        }
    }
}

impl FetchConfig {
    /// Reject settings that would make the run meaningless.
    pub fn validate(&self) -> Result<(), PoolsError> {
        if self.page_size == 0 {
            return Err(PoolsError::Config("page size must be positive".into()));
        }
        if let Some(reserve) = self.min_reserve {
            if !reserve.is_finite() || reserve < 0.0 {
                return Err(PoolsError::Config(format!(
                    "minimum reserve must be a non-negative number, got {reserve}"
                )));
            }
        }
        Ok(())
    }

    /// Filter inputs for this target, reading the token list when whitelisting.
    pub async fn filter_params(&self) -> Result<FilterParams, PoolsError> {
        let allowed_tokens = if self.whitelist {
            TokenList::load(&self.token_list)
                .await?
                .allowed_tokens(self.target.network, self.target.version)
        } else {
            Default::default()
        };
        Ok(FilterParams {
            cursor: None,
            min_reserve: self.min_reserve,
            allowed_tokens,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = FetchConfig::default();
        assert_eq!(cfg.page_size, 100);
        assert_eq!(cfg.min_reserve, Some(0.1));
        assert!(!cfg.whitelist);
        assert_eq!(cfg.token_list, PathBuf::from("./public/tokens/lists/zenswap.json"));
        cfg.validate().unwrap();
    }

    #[test]
    fn validate_rejects_bad_values() {
        let cfg = FetchConfig {
            page_size: 0,
            ..Default::default()
        };
        assert!(cfg.validate().unwrap_err().is_config());

        let cfg = FetchConfig {
            min_reserve: Some(-1.0),
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[tokio::test]
    async fn filter_params_without_whitelist_skip_token_list() {
        let cfg = FetchConfig {
            whitelist: false,
            token_list: PathBuf::from("/nonexistent.json"),
            min_reserve: None,
            ..Default::default()
        };
        let params = cfg.filter_params().await.unwrap();
        assert!(params.allowed_tokens.is_empty());
        assert_eq!(params.min_reserve, None);
    }

    #[tokio::test]
    async fn whitelist_with_missing_list_fails_fast() {
        let cfg = FetchConfig {
            whitelist: true,
            token_list: PathBuf::from("/nonexistent.json"),
            ..Default::default()
        };
        assert!(cfg.filter_params().await.unwrap_err().is_config());
    }

    #[test]
    fn target_display() {
        let t = FetchTarget::new(Network::ArbitrumMainnet, SchemaVersion::V2);
        assert_eq!(t.to_string(), "arbitrum-mainnet/v2");
    }
}
