//! Deployed subgraph ids per (network, schema version).

use chainpools_core::error::PoolsError;
use chainpools_core::types::{Network, SchemaVersion};

pub const DEFAULT_GATEWAY: &str = "https://gateway.thegraph.com";

use Network::*;
use SchemaVersion::*;

static SUBGRAPHS: &[(Network, SchemaVersion, &str)] = &[
    (EthereumMainnet, V2, "A3Np3RQbaBA6oKJgiwDJeo5T3zrYfGHPWFYayMwtNDum"),
    (PolygonMainnet, V2, "EXBcAqmvQi6VAnE9X4MNK83LPeA6c1PsGskffbmThoeK"),
    (ArbitrumMainnet, V2, "CStW6CSQbHoXsgKuVCrk3uShGA4JX3CAzzv2x9zaGf8w"),
    (UnichainMainnet, V2, "8vvhJXc9Fi2xpc3wXtRpYrWVYfcxThU973HhBukmFh83"),
    (EthereumSepolia, V3, "B4QeFHkfWXjKCDzNn3BJtDRDfG6VeHzGXgkf4Jt3fRn5"),
    (EthereumMainnet, V3, "8e4dRt4P4WHXnKbEq7STaQfU2g99WZ5S4w39f2PcUTjD"),
    (OptimismMainnet, V3, "Cghf4LfVqPiFw6fp6Y5X5Ubc8UpmUhSfJL82zwiBFLaj"),
    (BnbMainnet, V3, "G5MUbSBM7Nsrm9tH2tGQUiAF4SZDGf2qeo1xPLYjKr7K"),
    (PolygonMainnet, V3, "EsLGwxyeMMeJuhqWvuLmJEiDKXJ4Z6YsoJreUnyeozco"),
    (BaseMainnet, V3, "GqzP4Xaehti8KSfQmv3ZctFSjnSUYZ4En5NRsiTbvZpz"),
    (BaseSepolia, V3, "4xPAdAuU9HfbQhNdGCfZYBw45Ey6KB71R3dc4qCD5XhQ"),
    (AvalancheMainnet, V3, "GVH9h9KZ9CqheUEL93qMbq7QwgoBu32QXQDPR6bev4Eo"),
    (ArbitrumMainnet, V3, "FbCGRftH4a3yZugY7TnbYgPJVEv2LvMT6oF1fxPe9aJM"),
    (ArbitrumSepolia, V3, "FQQKpdTVHPQtjDwNKpTLrtx8fSeYhHAmvb69UiSHig59"),
    (CeloMainnet, V3, "ESdrTJ3twMwWVoQ1hUE2u7PugEHX3QkenudD6aXCkDQ4"),
    (BlastMainnet, V3, "2LHovKznvo8YmKC9ZprPjsYAZDCc4K5q4AYz8s3cnQn1"),
    (UnichainMainnet, V3, "GZWDNw5b7XH2iqnmG91FLDDkfEVEDQotfPv4GMdraEKY"),
    (UnichainSepolia, V3, "5Tf9s7syYLHQzhmtjukjTjmhFwx7c3hrdVxy4jo3TgCC"),
    (EthereumMainnet, V4, "AdA6Ax3jtct69NnXfxNjWtPTe9gMtSEZx2tTQcT4VHu"),
    (PolygonMainnet, V4, "2UKncUpdgZeJVyh6Dv8ai2fTL2MQnig8ySh7YkYcHCsL"),
    (ArbitrumMainnet, V4, "655x11nEGRudi5Nh4attV1uMt2YnyFRMaSKRM5QndXLK"),
    (UnichainMainnet, V4, "EoCvJ5tyMLMJcTnLQwWpjAtPdn74PcrZgzfcT5bYxNBH"),
];

/// Every mapped (network, version, subgraph id), in table order.
pub fn all() -> impl Iterator<Item = (Network, SchemaVersion, &'static str)> {
    SUBGRAPHS.iter().copied()
}

pub fn subgraph_id(network: Network, version: SchemaVersion) -> Result<&'static str, PoolsError> {
    SUBGRAPHS
        .iter()
        .find(|(n, v, _)| *n == network && *v == version)
        .map(|(_, _, id)| *id)
        .ok_or(PoolsError::UnsupportedTarget {
            chain_id: network.chain_id(),
            version: version.number(),
        })
}

/// Full query URL for a target on `gateway`.
pub fn endpoint_url(
    gateway: &str,
    api_key: &str,
    network: Network,
    version: SchemaVersion,
) -> Result<String, PoolsError> {
    let id = subgraph_id(network, version)?;
    Ok(format!(
        "{}/api/{api_key}/subgraphs/id/{id}",
        gateway.trim_end_matches('/')
    ))
}
