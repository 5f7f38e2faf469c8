//! Per-version record transcoding: wire JSON → [`PoolRecord`] ⇄ [`FlatRecord`].
//!
//! `from_wire` is the only place that knows subgraph field names. Addresses
//! are lower-cased there; numeric strings are parsed into numbers. Flat rows
//! are already normalized and are taken as-is.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::PoolsError;
use crate::flat::FlatRecord;
use crate::types::{PoolRecord, PoolV2, PoolV3, PoolV4, SchemaVersion, TokenRef};

// ─── Wire formats ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RawToken {
    id: String,
}

impl RawToken {
    fn normalize(self) -> TokenRef {
        TokenRef::new(self.id.to_lowercase())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPoolV2 {
    id: String,
    token0: RawToken,
    token1: RawToken,
    #[serde(deserialize_with = "scalar")]
    created_at_block_number: String,
    #[serde(deserialize_with = "scalar")]
    total_supply: String,
    #[serde(rename = "trackedReserveETH", deserialize_with = "scalar")]
    tracked_reserve_eth: String,
    #[serde(rename = "reserveUSD", deserialize_with = "scalar")]
    reserve_usd: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPoolV3 {
    id: String,
    token0: RawToken,
    token1: RawToken,
    #[serde(deserialize_with = "scalar")]
    created_at_block_number: String,
    #[serde(deserialize_with = "scalar")]
    fee_tier: String,
    #[serde(deserialize_with = "scalar")]
    liquidity: String,
    // Some subgraphs only expose `totalValueLockedNative`.
    #[serde(
        rename = "totalValueLockedETH",
        alias = "totalValueLockedNative",
        deserialize_with = "scalar"
    )]
    total_value_locked_eth: String,
    #[serde(rename = "totalValueLockedUSD", deserialize_with = "scalar")]
    total_value_locked_usd: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPoolV4 {
    id: String,
    token0: RawToken,
    token1: RawToken,
    #[serde(deserialize_with = "scalar")]
    created_at_block_number: String,
    #[serde(deserialize_with = "scalar")]
    fee_tier: String,
    #[serde(deserialize_with = "scalar")]
    tick_spacing: String,
    hooks: String,
    #[serde(deserialize_with = "scalar")]
    liquidity: String,
    #[serde(rename = "totalValueLockedETH", deserialize_with = "scalar")]
    total_value_locked_eth: String,
    #[serde(rename = "totalValueLockedUSD", deserialize_with = "scalar")]
    total_value_locked_usd: String,
}

/// BigInt/BigDecimal scalars arrive as strings, but accept bare JSON numbers too.
fn scalar<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}

fn parse_block(s: &str) -> Result<u64, String> {
    s.trim()
        .parse::<u64>()
        .map_err(|e| format!("invalid block number {s:?}: {e}"))
}

fn parse_decimal(s: &str) -> Result<f64, String> {
    let value = s
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid decimal {s:?}: {e}"))?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(format!("non-finite decimal {s:?}"))
    }
}

// ─── Transcoding ──────────────────────────────────────────────────────────────

impl SchemaVersion {
    /// Normalize one wire-format record from a page response.
    pub fn from_wire(self, raw: Value) -> Result<PoolRecord, PoolsError> {
        let malformed = |reason: String| PoolsError::MalformedResponse(format!("{self} pool: {reason}"));
        match self {
            Self::V2 => {
                let raw: RawPoolV2 =
                    serde_json::from_value(raw).map_err(|e| malformed(e.to_string()))?;
                Ok(PoolRecord::V2(PoolV2 {
                    id: raw.id.to_lowercase(),
                    token0: raw.token0.normalize(),
                    token1: raw.token1.normalize(),
                    created_at_block_number: parse_block(&raw.created_at_block_number)
                        .map_err(malformed)?,
                    supply: parse_decimal(&raw.total_supply).map_err(malformed)?,
                    reserve: parse_decimal(&raw.tracked_reserve_eth).map_err(malformed)?,
                    reserve_usd: parse_decimal(&raw.reserve_usd).map_err(malformed)?,
                }))
            }
            Self::V3 => {
                let raw: RawPoolV3 =
                    serde_json::from_value(raw).map_err(|e| malformed(e.to_string()))?;
                Ok(PoolRecord::V3(PoolV3 {
                    id: raw.id.to_lowercase(),
                    token0: raw.token0.normalize(),
                    token1: raw.token1.normalize(),
                    created_at_block_number: parse_block(&raw.created_at_block_number)
                        .map_err(malformed)?,
                    fee_tier: raw.fee_tier,
                    liquidity: raw.liquidity,
                    tvl_eth: parse_decimal(&raw.total_value_locked_eth).map_err(malformed)?,
                    tvl_usd: parse_decimal(&raw.total_value_locked_usd).map_err(malformed)?,
                }))
            }
            Self::V4 => {
                let raw: RawPoolV4 =
                    serde_json::from_value(raw).map_err(|e| malformed(e.to_string()))?;
                Ok(PoolRecord::V4(PoolV4 {
                    id: raw.id.to_lowercase(),
                    token0: raw.token0.normalize(),
                    token1: raw.token1.normalize(),
                    created_at_block_number: parse_block(&raw.created_at_block_number)
                        .map_err(malformed)?,
                    fee_tier: raw.fee_tier,
                    tick_spacing: raw.tick_spacing,
                    hooks: raw.hooks.to_lowercase(),
                    liquidity: raw.liquidity,
                    tvl_eth: parse_decimal(&raw.total_value_locked_eth).map_err(malformed)?,
                    tvl_usd: parse_decimal(&raw.total_value_locked_usd).map_err(malformed)?,
                }))
            }
        }
    }

    /// Flatten a record of this version into log cells.
    pub fn to_flat(self, record: &PoolRecord) -> Result<FlatRecord, PoolsError> {
        let cells = match (self, record) {
            (Self::V2, PoolRecord::V2(p)) => vec![
                p.id.clone(),
                p.token0.id.clone(),
                p.token1.id.clone(),
                p.created_at_block_number.to_string(),
                p.supply.to_string(),
                p.reserve.to_string(),
                p.reserve_usd.to_string(),
            ],
            (Self::V3, PoolRecord::V3(p)) => vec![
                p.id.clone(),
                p.token0.id.clone(),
                p.token1.id.clone(),
                p.created_at_block_number.to_string(),
                p.fee_tier.clone(),
                p.liquidity.clone(),
                p.tvl_eth.to_string(),
                p.tvl_usd.to_string(),
            ],
            (Self::V4, PoolRecord::V4(p)) => vec![
                p.id.clone(),
                p.token0.id.clone(),
                p.token1.id.clone(),
                p.created_at_block_number.to_string(),
                p.fee_tier.clone(),
                p.tick_spacing.clone(),
                p.hooks.clone(),
                p.liquidity.clone(),
                p.tvl_eth.to_string(),
                p.tvl_usd.to_string(),
            ],
            (_, other) => {
                return Err(PoolsError::Storage(format!(
                    "{} pool {} cannot be written to a {self} log",
                    other.version(),
                    other.id()
                )))
            }
        };
        Ok(FlatRecord(cells))
    }

    /// Rebuild a record from log cells. `row` is the 1-based row number used
    /// in error messages.
    pub fn from_flat(self, flat: &FlatRecord, row: usize) -> Result<PoolRecord, PoolsError> {
        let corrupt = |reason: String| PoolsError::CorruptRow { row, reason };
        if flat.len() != self.flat_width() {
            return Err(corrupt(format!(
                "expected {} cells for {self}, found {}",
                self.flat_width(),
                flat.len()
            )));
        }
        let c = flat.cells();
        let record = match self {
            Self::V2 => PoolRecord::V2(PoolV2 {
                id: c[0].clone(),
                token0: TokenRef::new(c[1].clone()),
                token1: TokenRef::new(c[2].clone()),
                created_at_block_number: parse_block(&c[3]).map_err(corrupt)?,
                supply: parse_decimal(&c[4]).map_err(corrupt)?,
                reserve: parse_decimal(&c[5]).map_err(corrupt)?,
                reserve_usd: parse_decimal(&c[6]).map_err(corrupt)?,
            }),
            Self::V3 => PoolRecord::V3(PoolV3 {
                id: c[0].clone(),
                token0: TokenRef::new(c[1].clone()),
                token1: TokenRef::new(c[2].clone()),
                created_at_block_number: parse_block(&c[3]).map_err(corrupt)?,
                fee_tier: c[4].clone(),
                liquidity: c[5].clone(),
                tvl_eth: parse_decimal(&c[6]).map_err(corrupt)?,
                tvl_usd: parse_decimal(&c[7]).map_err(corrupt)?,
            }),
            Self::V4 => PoolRecord::V4(PoolV4 {
                id: c[0].clone(),
                token0: TokenRef::new(c[1].clone()),
                token1: TokenRef::new(c[2].clone()),
                created_at_block_number: parse_block(&c[3]).map_err(corrupt)?,
                fee_tier: c[4].clone(),
                tick_spacing: c[5].clone(),
                hooks: c[6].clone(),
                liquidity: c[7].clone(),
                tvl_eth: parse_decimal(&c[8]).map_err(corrupt)?,
                tvl_usd: parse_decimal(&c[9]).map_err(corrupt)?,
            }),
        };
        if record.id().is_empty() {
            return Err(PoolsError::CorruptRow {
                row,
                reason: "empty pool id".into(),
            });
        }
        Ok(record)
    }

    /// Parse a snapshot document written for this version.
    pub fn parse_snapshot(self, json: &str) -> Result<Vec<PoolRecord>, PoolsError> {
        let records = match self {
            Self::V2 => serde_json::from_str::<Vec<PoolV2>>(json)?
                .into_iter()
                .map(PoolRecord::V2)
                .collect(),
            Self::V3 => serde_json::from_str::<Vec<PoolV3>>(json)?
                .into_iter()
                .map(PoolRecord::V3)
                .collect(),
            Self::V4 => serde_json::from_str::<Vec<PoolV4>>(json)?
                .into_iter()
                .map(PoolRecord::V4)
                .collect(),
        };
        Ok(records)
    }
}
