//! Shared types: networks, schema versions and normalized pool records.

use serde::{Deserialize, Serialize};

use crate::error::PoolsError;

// ─── SchemaVersion ────────────────────────────────────────────────────────────

/// One of the three incompatible subgraph pool schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SchemaVersion {
    V2,
    V3,
    V4,
}

impl SchemaVersion {
    pub const ALL: [SchemaVersion; 3] = [Self::V2, Self::V3, Self::V4];

    pub fn from_number(version: u8) -> Result<Self, PoolsError> {
        match version {
            2 => Ok(Self::V2),
            3 => Ok(Self::V3),
            4 => Ok(Self::V4),
            other => Err(PoolsError::UnsupportedVersion(other)),
        }
    }

    pub fn number(self) -> u8 {
        match self {
            Self::V2 => 2,
            Self::V3 => 3,
            Self::V4 => 4,
        }
    }

    /// Number of cells in a flat row of this version.
    pub fn flat_width(self) -> usize {
        match self {
            Self::V2 => 7,
            Self::V3 => 8,
            Self::V4 => 10,
        }
    }
}

impl std::fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.number())
    }
}

// ─── Network ──────────────────────────────────────────────────────────────────

/// Chains with known pool subgraphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Network {
    EthereumMainnet,
    EthereumSepolia,
    OptimismMainnet,
    BnbMainnet,
    PolygonMainnet,
    BaseMainnet,
    BaseSepolia,
    AvalancheMainnet,
    ArbitrumMainnet,
    ArbitrumSepolia,
    CeloMainnet,
    BlastMainnet,
    UnichainMainnet,
    UnichainSepolia,
}

impl Network {
    pub const ALL: [Network; 14] = [
        Self::EthereumMainnet,
        Self::EthereumSepolia,
        Self::OptimismMainnet,
        Self::BnbMainnet,
        Self::PolygonMainnet,
        Self::BaseMainnet,
        Self::BaseSepolia,
        Self::AvalancheMainnet,
        Self::ArbitrumMainnet,
        Self::ArbitrumSepolia,
        Self::CeloMainnet,
        Self::BlastMainnet,
        Self::UnichainMainnet,
        Self::UnichainSepolia,
    ];

    pub fn chain_id(self) -> u64 {
        match self {
            Self::EthereumMainnet => 1,
            Self::EthereumSepolia => 11_155_111,
            Self::OptimismMainnet => 10,
            Self::BnbMainnet => 56,
            Self::PolygonMainnet => 137,
            Self::BaseMainnet => 8453,
            Self::BaseSepolia => 84_532,
            Self::AvalancheMainnet => 43_114,
            Self::ArbitrumMainnet => 42_161,
            Self::ArbitrumSepolia => 421_614,
            Self::CeloMainnet => 42_220,
            Self::BlastMainnet => 81_457,
            Self::UnichainMainnet => 130,
            Self::UnichainSepolia => 1301,
        }
    }

    pub fn from_chain_id(chain_id: u64) -> Result<Self, PoolsError> {
        Self::ALL
            .into_iter()
            .find(|n| n.chain_id() == chain_id)
            .ok_or(PoolsError::UnknownNetwork(chain_id))
    }

    /// Slug used as the file stem of the log and the snapshot.
    pub fn name(self) -> &'static str {
        match self {
            Self::EthereumMainnet => "mainnet",
            Self::EthereumSepolia => "sepolia",
            Self::OptimismMainnet => "optimism-mainnet",
            Self::BnbMainnet => "bnb-mainnet",
            Self::PolygonMainnet => "polygon-mainnet",
            Self::BaseMainnet => "base-mainnet",
            Self::BaseSepolia => "base-sepolia",
            Self::AvalancheMainnet => "avalanche-mainnet",
            Self::ArbitrumMainnet => "arbitrum-mainnet",
            Self::ArbitrumSepolia => "arbitrum-sepolia",
            Self::CeloMainnet => "celo-mainnet",
            Self::BlastMainnet => "blast-mainnet",
            Self::UnichainMainnet => "unichain-mainnet",
            Self::UnichainSepolia => "unichain-sepolia",
        }
    }

    pub fn is_testnet(self) -> bool {
        matches!(
            self,
            Self::EthereumSepolia
                | Self::BaseSepolia
                | Self::ArbitrumSepolia
                | Self::UnichainSepolia
        )
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ─── Pool records ─────────────────────────────────────────────────────────────

/// Back-reference to a token by lower-cased address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRef {
    pub id: String,
}

impl TokenRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// V2 pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolV2 {
    pub id: String,
    pub token0: TokenRef,
    pub token1: TokenRef,
    pub created_at_block_number: u64,
    pub supply: f64,
    pub reserve: f64,
    #[serde(rename = "reserveUSD")]
    pub reserve_usd: f64,
}

/// V3 pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolV3 {
    pub id: String,
    pub token0: TokenRef,
    pub token1: TokenRef,
    pub created_at_block_number: u64,
    pub fee_tier: String,
    pub liquidity: String,
    #[serde(rename = "tvlETH")]
    pub tvl_eth: f64,
    #[serde(rename = "tvlUSD")]
    pub tvl_usd: f64,
}

/// V4 pool. Same as V3 plus tick spacing and the hook contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolV4 {
    pub id: String,
    pub token0: TokenRef,
    pub token1: TokenRef,
    pub created_at_block_number: u64,
    pub fee_tier: String,
    pub tick_spacing: String,
    pub hooks: String,
    pub liquidity: String,
    #[serde(rename = "tvlETH")]
    pub tvl_eth: f64,
    #[serde(rename = "tvlUSD")]
    pub tvl_usd: f64,
}

/// A normalized pool of any schema version.
///
/// The pagination engine only looks at [`id`](Self::id) and
/// [`created_at_block_number`](Self::created_at_block_number).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PoolRecord {
    V2(PoolV2),
    V3(PoolV3),
    V4(PoolV4),
}

impl PoolRecord {
    pub fn id(&self) -> &str {
        match self {
            Self::V2(p) => &p.id,
            Self::V3(p) => &p.id,
            Self::V4(p) => &p.id,
        }
    }

    pub fn created_at_block_number(&self) -> u64 {
        match self {
            Self::V2(p) => p.created_at_block_number,
            Self::V3(p) => p.created_at_block_number,
            Self::V4(p) => p.created_at_block_number,
        }
    }

    pub fn version(&self) -> SchemaVersion {
        match self {
            Self::V2(_) => SchemaVersion::V2,
            Self::V3(_) => SchemaVersion::V3,
            Self::V4(_) => SchemaVersion::V4,
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
