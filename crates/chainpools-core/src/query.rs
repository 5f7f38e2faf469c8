//! Paginated GraphQL query documents, one shape per schema version.
//!
//! Every document takes `$pageSize` and `$filter`, orders ascending by
//! `createdAtBlockNumber` and returns the page under the `items` alias.

use crate::types::{Network, SchemaVersion};

/// Name of the native-currency TVL field for a V3 subgraph.
pub fn tvl_native_field(network: Network) -> &'static str {
    // The Unichain Sepolia deployment renamed the field.
    if network == Network::UnichainSepolia {
        "totalValueLockedNative"
    } else {
        "totalValueLockedETH"
    }
}

/// A ready-to-send query document for one (network, version) target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolsQuery {
    pub version: SchemaVersion,
    pub document: String,
}

impl PoolsQuery {
    pub fn build(version: SchemaVersion, network: Network) -> Self {
        let document = match version {
            SchemaVersion::V2 => page_document(
                "pairs",
                "Pair_filter",
                &["totalSupply", "trackedReserveETH", "reserveUSD"],
            ),
            SchemaVersion::V3 => {
                let tvl = match tvl_native_field(network) {
                    "totalValueLockedETH" => "totalValueLockedETH".to_string(),
                    native => format!("totalValueLockedETH: {native}"),
                };
                page_document(
                    "pools",
                    "Pool_filter",
                    &["feeTier", "liquidity", &tvl, "totalValueLockedUSD"],
                )
            }
            SchemaVersion::V4 => page_document(
                "pools",
                "Pool_filter",
                &[
                    "feeTier",
                    "tickSpacing",
                    "hooks",
                    "liquidity",
                    "totalValueLockedETH",
                    "totalValueLockedUSD",
                ],
            ),
        };
        Self { version, document }
    }
}

fn page_document(entity: &str, filter_type: &str, fields: &[&str]) -> String {
    let mut doc = format!(
        "query getPools($pageSize: Int!, $filter: {filter_type}) {{\n  \
         items: {entity}(first: $pageSize, orderBy: createdAtBlockNumber, orderDirection: asc, where: $filter) {{\n    \
         id\n    createdAtBlockNumber\n    token0 {{ id }}\n    token1 {{ id }}\n"
    );
    for field in fields {
        doc.push_str("    ");
        doc.push_str(field);
        doc.push('\n');
    }
    doc.push_str("  }\n}\n");
    doc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn v2_queries_pairs() {
        let q = PoolsQuery::build(SchemaVersion::V2, Network::EthereumMainnet);
        assert!(q.document.contains("$filter: Pair_filter"));
        assert!(q.document.contains("items: pairs(first: $pageSize, orderBy: createdAtBlockNumber, orderDirection: asc"));
        assert!(q.document.contains("trackedReserveETH"));
        assert!(!q.document.contains("feeTier"));
    }

    #[test]
    fn v3_aliases_native_tvl_on_unichain_sepolia() {
        let plain = PoolsQuery::build(SchemaVersion::V3, Network::BaseMainnet);
        assert!(plain.document.contains("    totalValueLockedETH\n"));

        let aliased = PoolsQuery::build(SchemaVersion::V3, Network::UnichainSepolia);
        assert!(aliased
            .document
            .contains("totalValueLockedETH: totalValueLockedNative"));
    }

    #[test]
    fn v4_selects_hooks_and_tick_spacing() {
        let q = PoolsQuery::build(SchemaVersion::V4, Network::UnichainMainnet);
        assert!(q.document.contains("tickSpacing"));
        assert!(q.document.contains("hooks"));
        assert!(q.document.contains("$filter: Pool_filter"));
    }
}
