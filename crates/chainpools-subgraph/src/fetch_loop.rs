//! The fetch driver: one resumable run per (network, version) target.
//!
//! ```text
//! validate config → recover log → paginate (append each page to the log)
//!     → materialize log → write snapshot → discard log
//! ```
//!
//! Any failure leaves the log in place; the next run resumes from it.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};

use chainpools_core::checkpoint::{CheckpointLog, CheckpointSink};
use chainpools_core::config::{FetchConfig, FetchTarget, DEFAULT_MIN_RESERVE};
use chainpools_core::error::PoolsError;
use chainpools_core::paginator::{PageSource, Paginator};
use chainpools_core::types::{Network, SchemaVersion};
use chainpools_storage::{write_snapshot, FileCheckpointLog, TargetPaths};

use crate::client::{SubgraphClient, SubgraphClientConfig};

/// Result of one completed target run.
#[derive(Debug, Clone)]
pub struct FetchReport {
    pub target: FetchTarget,
    /// Cursor recovered from an interrupted run; 0 for a fresh one.
    pub resumed_from: u64,
    /// Pools fetched by this run (excludes rows already in the log).
    pub fetched: u64,
    pub pages: u64,
    /// Pools in the final snapshot.
    pub snapshot_len: usize,
    pub snapshot_path: PathBuf,
    pub completed_at: DateTime<Utc>,
}

/// Outcome of one target within a batch.
#[derive(Debug)]
pub struct TargetOutcome {
    pub target: FetchTarget,
    pub result: Result<FetchReport, PoolsError>,
}

/// Runs one target against a page source.
pub struct PoolFetcher<S: PageSource> {
    config: FetchConfig,
    source: S,
}

impl<S: PageSource> PoolFetcher<S> {
    pub fn new(config: FetchConfig, source: S) -> Self {
        Self { config, source }
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    pub async fn run(&self) -> Result<FetchReport, PoolsError> {
        let cfg = &self.config;
        cfg.validate()?;
        let params = cfg.filter_params().await?;
        let target = cfg.target;
        let chain = target.network.chain_id();

        tracing::info!(
            chain,
            version = %target.version,
            whitelist = cfg.whitelist,
            allowed_tokens = params.allowed_tokens.len(),
            min_reserve = ?cfg.min_reserve,
            "Fetch uniswap pools"
        );

        let paths = TargetPaths::new(&cfg.output_root, target);
        let mut log = FileCheckpointLog::new(&paths.log, target.version);
        let recovery = log.recover().await?;
        if recovery.rows > 0 {
            tracing::info!(
                chain,
                version = %target.version,
                cursor = recovery.cursor,
                rows = recovery.rows,
                "Resuming from checkpoint log"
            );
        }
        let resumed_from = recovery.cursor;

        let paginator = Paginator::new(
            &self.source,
            target.network,
            target.version,
            cfg.page_size,
            params,
        )?;
        let summary = {
            let mut sink = CheckpointSink::new(&mut log);
            paginator
                .resume(recovery.cursor, recovery.seen_ids, &mut sink)
                .await?
        };

        let pools = log.materialize().await?;
        write_snapshot(&paths.snapshot, &pools).await?;
        log.discard().await?;

        tracing::info!(
            chain,
            version = %target.version,
            fetched = summary.total,
            pools = pools.len(),
            path = %paths.snapshot.display(),
            "Fetch complete"
        );

        Ok(FetchReport {
            target,
            resumed_from,
            fetched: summary.total,
            pages: summary.pages,
            snapshot_len: pools.len(),
            snapshot_path: paths.snapshot,
            completed_at: Utc::now(),
        })
    }
}

impl PoolFetcher<SubgraphClient> {
    /// Fetcher talking to the deployed subgraph of `config.target`.
    pub fn connect(
        config: FetchConfig,
        api_key: &str,
        client: SubgraphClientConfig,
    ) -> Result<Self, PoolsError> {
        let source =
            SubgraphClient::for_target(config.target.network, config.target.version, api_key, client)?;
        Ok(Self::new(config, source))
    }
}

/// Run every config with up to `concurrency` targets in flight, building
/// each target's source with `make_source`. Outcomes keep input order and
/// one failing target never stops the others.
pub async fn run_batch_with<S, F>(
    configs: Vec<FetchConfig>,
    concurrency: usize,
    make_source: F,
) -> Vec<TargetOutcome>
where
    S: PageSource,
    F: Fn(&FetchConfig) -> Result<S, PoolsError>,
{
    let runs = configs.into_iter().map(|config| {
        let target = config.target;
        let source = make_source(&config);
        async move {
            let result = match source {
                Ok(source) => PoolFetcher::new(config, source).run().await,
                Err(e) => Err(e),
            };
            if let Err(e) = &result {
                tracing::warn!(
                    chain = target.network.chain_id(),
                    version = %target.version,
                    error = %e,
                    "Fetching error, skip"
                );
            }
            TargetOutcome { target, result }
        }
    });
    stream::iter(runs)
        .buffered(concurrency.max(1))
        .collect()
        .await
}

/// [`run_batch_with`] against the live subgraph gateway.
pub async fn run_batch(
    configs: Vec<FetchConfig>,
    concurrency: usize,
    api_key: &str,
    client: SubgraphClientConfig,
) -> Vec<TargetOutcome> {
    run_batch_with(configs, concurrency, |config| {
        SubgraphClient::for_target(
            config.target.network,
            config.target.version,
            api_key,
            client.clone(),
        )
    })
    .await
}

const PLAN_TESTNETS: [Network; 3] = [
    Network::EthereumSepolia,
    Network::ArbitrumSepolia,
    Network::BaseSepolia,
];
const PLAN_MAINNETS: [Network; 3] = [
    Network::EthereumMainnet,
    Network::ArbitrumMainnet,
    Network::BaseMainnet,
];

/// The `all` batch: testnets unfiltered at zero reserve, then mainnets
/// whitelisted at the default reserve, each for every schema version.
pub fn default_plan(base: &FetchConfig) -> Vec<FetchConfig> {
    let testnets = PLAN_TESTNETS.iter().map(|&n| (n, false, 0.0));
    let mainnets = PLAN_MAINNETS.iter().map(|&n| (n, true, DEFAULT_MIN_RESERVE));
    testnets
        .chain(mainnets)
        .flat_map(|(network, whitelist, reserve)| {
            SchemaVersion::ALL.into_iter().map(move |version| FetchConfig {
                target: FetchTarget::new(network, version),
                whitelist,
                min_reserve: Some(reserve),
                ..base.clone()
            })
        })
        .collect()
}
