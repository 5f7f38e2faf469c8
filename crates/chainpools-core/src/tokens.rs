//! Token allow-list input.
//!
//! The list is an externally maintained document of the form
//! `{ "tokens": [ { "chainId": 1, "address": "0x…", … } ] }`; only the
//! addresses of the fetched chain are used.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::PoolsError;
use crate::types::{Network, SchemaVersion};

/// Address V4 pools use for the chain's native currency.
pub const NATIVE_TOKEN_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenEntry {
    pub chain_id: u64,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenList {
    pub tokens: Vec<TokenEntry>,
}

impl TokenList {
    pub fn from_json(json: &str) -> Result<Self, PoolsError> {
        serde_json::from_str(json)
            .map_err(|e| PoolsError::Config(format!("invalid token list: {e}")))
    }

    pub async fn load(path: &Path) -> Result<Self, PoolsError> {
        let json = tokio::fs::read_to_string(path).await.map_err(|e| {
            PoolsError::Config(format!("cannot read token list {}: {e}", path.display()))
        })?;
        Self::from_json(&json)
    }

    /// Lower-cased addresses allowed on `network`, plus the native asset for V4.
    pub fn allowed_tokens(&self, network: Network, version: SchemaVersion) -> BTreeSet<String> {
        let mut allowed: BTreeSet<String> = self
            .tokens
            .iter()
            .filter(|t| t.chain_id == network.chain_id())
            .map(|t| t.address.to_lowercase())
            .collect();
        if version == SchemaVersion::V4 {
            allowed.insert(NATIVE_TOKEN_ADDRESS.to_string());
        }
        allowed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIST: &str = r#"{
        "name": "zenswap",
        "tokens": [
            { "chainId": 1, "address": "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48", "symbol": "USDC" },
            { "chainId": 1, "address": "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2", "symbol": "WETH" },
            { "chainId": 8453, "address": "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913", "symbol": "USDC" }
        ]
    }"#;

    #[test]
    fn filters_by_chain_and_lowercases() {
        let list = TokenList::from_json(LIST).unwrap();
        let allowed = list.allowed_tokens(Network::EthereumMainnet, SchemaVersion::V3);
        assert_eq!(
            allowed.into_iter().collect::<Vec<_>>(),
            vec![
                "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48".to_string(),
                "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2".to_string(),
            ]
        );
    }

    #[test]
    fn native_asset_only_for_v4() {
        let list = TokenList::from_json(LIST).unwrap();
        let v4 = list.allowed_tokens(Network::BaseMainnet, SchemaVersion::V4);
        assert!(v4.contains(NATIVE_TOKEN_ADDRESS));
        assert_eq!(v4.len(), 2);
        let v2 = list.allowed_tokens(Network::BaseMainnet, SchemaVersion::V2);
        assert!(!v2.contains(NATIVE_TOKEN_ADDRESS));
    }

    #[test]
    fn unknown_chain_yields_empty_set() {
        let list = TokenList::from_json(LIST).unwrap();
        assert!(list
            .allowed_tokens(Network::CeloMainnet, SchemaVersion::V3)
            .is_empty());
    }

    #[tokio::test]
    async fn missing_file_is_config_error() {
        let err = TokenList::load(Path::new("/nonexistent/zenswap.json"))
            .await
            .unwrap_err();
        assert!(err.is_config());
    }
}
