//! Server-side `where` filter composition.
//!
//! An absent parameter means "no restriction"; it never becomes a zero bound.

use std::collections::BTreeSet;

use serde_json::{json, Map, Value};

use crate::query::tvl_native_field;
use crate::types::{Network, SchemaVersion};

/// Inputs to one page filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterParams {
    /// Minimum `createdAtBlockNumber` (inclusive).
    pub cursor: Option<u64>,
    /// Minimum tracked reserve (V2) or native TVL (V3/V4).
    pub min_reserve: Option<f64>,
    /// Both sides of the pair must be in this set; empty = any token.
    pub allowed_tokens: BTreeSet<String>,
}

impl FilterParams {
    pub fn with_cursor(&self, cursor: u64) -> Self {
        Self {
            cursor: Some(cursor),
            ..self.clone()
        }
    }
}

/// Name of the reserve/TVL field the minimum-reserve predicate applies to.
pub fn reserve_field(version: SchemaVersion, network: Network) -> &'static str {
    match version {
        SchemaVersion::V2 => "trackedReserveETH",
        SchemaVersion::V3 => tvl_native_field(network),
        SchemaVersion::V4 => "totalValueLockedETH",
    }
}

/// Build the `$filter` variable for one page request.
pub fn build_filter(version: SchemaVersion, network: Network, params: &FilterParams) -> Value {
    let mut filter = base_predicates(version, network, params);
    if let Some(cursor) = params.cursor {
        filter.insert("createdAtBlockNumber_gte".into(), json!(cursor));
    }
    Value::Object(filter)
}

/// Filter for pools created exactly at `block` whose id is not in `exclude`.
/// The caller's reserve and token predicates still apply; its cursor does not.
pub fn build_block_filter<'a>(
    version: SchemaVersion,
    network: Network,
    params: &FilterParams,
    block: u64,
    exclude: impl IntoIterator<Item = &'a String>,
) -> Value {
    let mut filter = base_predicates(version, network, params);
    let exclude: BTreeSet<&String> = exclude.into_iter().collect();
    filter.insert("createdAtBlockNumber".into(), json!(block));
    filter.insert("id_not_in".into(), json!(exclude));
    Value::Object(filter)
}

fn base_predicates(
    version: SchemaVersion,
    network: Network,
    params: &FilterParams,
) -> Map<String, Value> {
    let mut filter = Map::new();

    // V3 subgraphs index every initialized pool; skip the empty ones.
    if version == SchemaVersion::V3 {
        filter.insert("liquidity_gt".into(), json!(0));
    }
    if let Some(min_reserve) = params.min_reserve.filter(|r| r.is_finite()) {
        filter.insert(
            format!("{}_gte", reserve_field(version, network)),
            json!(min_reserve),
        );
    }
    if !params.allowed_tokens.is_empty() {
        let tokens: Vec<&String> = params.allowed_tokens.iter().collect();
        filter.insert("token0_in".into(), json!(tokens));
        filter.insert("token1_in".into(), json!(tokens));
    }
    filter
}
