//! chainpools CLI: fetch Uniswap pool snapshots from the subgraphs.
//!
//! Usage:
//! ```bash
//! # One target; resumes from ./public/pools/uniswap/v3/mainnet.csv if present
//! chainpools fetch --chain-id 1 --version 3 --whitelist --reserve 0.5
//!
//! # The standard testnet + mainnet batch
//! chainpools all --concurrency 2
//!
//! # Which (network, version) pairs have a subgraph
//! chainpools networks
//! ```
//!
//! The gateway API key is read from `--api-key` or `CHAINPOOLS_API_KEY`.

mod tracing_setup;

use std::env;
use std::path::PathBuf;
use std::process;

use chainpools_core::config::{FetchConfig, DEFAULT_MIN_RESERVE};
use chainpools_core::types::{Network, SchemaVersion};
use chainpools_subgraph::endpoints;
use chainpools_subgraph::{
    default_plan, run_batch, FetchConfigBuilder, FetchReport, PoolFetcher, SubgraphClientConfig,
};

use tracing_setup::{init_tracing, LogConfig};

const API_KEY_ENV: &str = "CHAINPOOLS_API_KEY";

#[tokio::main]
async fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let result = match args[1].as_str() {
        "fetch" => cmd_fetch(&args[2..]).await,
        "all" => cmd_all(&args[2..]).await,
        "networks" => {
            cmd_networks();
            Ok(())
        }
        "version" | "--version" | "-V" => {
            println!("chainpools {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            print_usage();
            process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn print_usage() {
    println!("chainpools {}", env!("CARGO_PKG_VERSION"));
    println!("Resumable Uniswap V2/V3/V4 pool fetcher\n");
    println!("USAGE:");
    println!("    chainpools <COMMAND> [FLAGS]\n");
    println!("COMMANDS:");
    println!("    fetch     Fetch all pools of one (chain, version) target");
    println!("    all       Fetch the standard testnet and mainnet batch");
    println!("    networks  List networks and deployed subgraph versions");
    println!("    version   Print version");
    println!("    help      Print this help\n");
    println!("FETCH FLAGS:");
    println!("    --chain-id <ID>      EVM chain id  [required]");
    println!("    --version <2|3|4>    Uniswap schema version  [required]");
    println!("    --whitelist          Keep only pools whose tokens are both in the token list");
    println!("    --reserve <N>        Minimum tracked reserve / TVL in native units  [default: {DEFAULT_MIN_RESERVE}]");
    println!("    --no-reserve         Do not filter by reserve");
    println!("    --page-size <N>      Pools per request  [default: 100]\n");
    println!("COMMON FLAGS:");
    println!("    --out <DIR>          Output root  [default: ./public/pools/uniswap]");
    println!("    --tokens <FILE>      Token list  [default: ./public/tokens/lists/zenswap.json]");
    println!("    --api-key <KEY>      Subgraph gateway key  [env: {API_KEY_ENV}]");
    println!("    --gateway <URL>      Gateway base URL  [default: {}]", endpoints::DEFAULT_GATEWAY);
    println!("    --concurrency <N>    Targets in flight for `all`  [default: 1]");
    println!("    --log-level <LEVEL>  trace | debug | info | warn | error  [default: info]");
    println!("    --log-component <CRATE=LEVEL>  Per-crate level override (repeatable)");
    println!("    --json-logs          Emit JSON log lines");
}

async fn cmd_fetch(args: &[String]) -> Result<(), String> {
    setup_logging(args)?;
    let config = fetch_config(args)?;
    let api_key = api_key(args)?;

    let fetcher = PoolFetcher::connect(config, &api_key, client_config(args))
        .map_err(|e| e.to_string())?;
    let report = fetcher.run().await.map_err(|e| e.to_string())?;
    print_report(&report);
    Ok(())
}

async fn cmd_all(args: &[String]) -> Result<(), String> {
    setup_logging(args)?;
    let base = base_config(args)?;
    let api_key = api_key(args)?;
    let concurrency = parse_number(args, "--concurrency")?.unwrap_or(1);

    let plan = default_plan(&base);
    println!("Fetching all uniswap pools ({} targets)...", plan.len());
    let outcomes = run_batch(plan, concurrency, &api_key, client_config(args)).await;

    let mut failed = Vec::new();
    for outcome in &outcomes {
        match &outcome.result {
            Ok(report) => print_report(report),
            Err(e) => {
                println!("  {:<28} FAILED  {e}", outcome.target.to_string());
                failed.push(outcome.target);
            }
        }
    }

    if failed.is_empty() {
        println!("Fetching completed!");
        Ok(())
    } else {
        let names: Vec<String> = failed.iter().map(ToString::to_string).collect();
        Err(format!(
            "{} of {} targets failed: {}",
            failed.len(),
            outcomes.len(),
            names.join(", ")
        ))
    }
}

fn cmd_networks() {
    println!("{:<20} {:>9}  versions", "network", "chain id");
    for network in Network::ALL {
        let versions: Vec<String> = endpoints::all()
            .filter(|(n, _, _)| *n == network)
            .map(|(_, v, _)| v.to_string())
            .collect();
        println!(
            "{:<20} {:>9}  {}",
            network.name(),
            network.chain_id(),
            versions.join(" ")
        );
    }
}

fn print_report(report: &FetchReport) {
    println!(
        "  {:<28} OK      {} pools ({} new, resumed from block {}) → {}",
        report.target.to_string(),
        report.snapshot_len,
        report.fetched,
        report.resumed_from,
        report.snapshot_path.display()
    );
}

fn setup_logging(args: &[String]) -> Result<(), String> {
    init_tracing(&log_config(args)?);
    Ok(())
}

fn log_config(args: &[String]) -> Result<LogConfig, String> {
    let mut config = LogConfig::default();
    if let Some(level) = parse_flag(args, "--log-level") {
        config.level = level;
    }
    for component in flag_values(args, "--log-component") {
        config.add_component(component)?;
    }
    config.json = has_flag(args, "--json-logs");
    Ok(config)
}

/// Paths shared by `fetch` and `all`.
fn base_config(args: &[String]) -> Result<FetchConfig, String> {
    let mut builder = FetchConfigBuilder::new();
    if let Some(out) = parse_flag(args, "--out") {
        builder = builder.output_root(PathBuf::from(out));
    }
    if let Some(tokens) = parse_flag(args, "--tokens") {
        builder = builder.token_list(PathBuf::from(tokens));
    }
    Ok(builder.build_config())
}

fn fetch_config(args: &[String]) -> Result<FetchConfig, String> {
    let chain_id: u64 = parse_number(args, "--chain-id")?.ok_or("--chain-id is required")?;
    let version: u8 = parse_number(args, "--version")?.ok_or("--version is required")?;
    let version = SchemaVersion::from_number(version).map_err(|e| e.to_string())?;

    let mut builder = FetchConfigBuilder::from_config(base_config(args)?)
        .chain_id(chain_id)
        .map_err(|e| e.to_string())?
        .version(version)
        .whitelist(has_flag(args, "--whitelist"));
    if let Some(page_size) = parse_number(args, "--page-size")? {
        builder = builder.page_size(page_size);
    }
    if has_flag(args, "--no-reserve") {
        builder = builder.no_min_reserve();
    } else if let Some(reserve) = parse_number(args, "--reserve")? {
        builder = builder.min_reserve(reserve);
    }
    builder.build().map_err(|e| e.to_string())
}

fn client_config(args: &[String]) -> SubgraphClientConfig {
    let mut config = SubgraphClientConfig::default();
    if let Some(gateway) = parse_flag(args, "--gateway") {
        config.gateway = gateway;
    }
    config
}

fn api_key(args: &[String]) -> Result<String, String> {
    parse_flag(args, "--api-key")
        .or_else(|| env::var(API_KEY_ENV).ok())
        .filter(|key| !key.trim().is_empty())
        .ok_or_else(|| format!("a subgraph API key is required (--api-key or {API_KEY_ENV})"))
}

fn parse_flag(args: &[String], flag: &str) -> Option<String> {
    let pos = args.iter().position(|a| a == flag)?;
    args.get(pos + 1).cloned()
}

/// Every value given for a repeatable flag.
fn flag_values<'a>(args: &'a [String], flag: &'a str) -> impl Iterator<Item = &'a str> {
    args.windows(2)
        .filter(move |pair| pair[0] == flag)
        .map(|pair| pair[1].as_str())
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

fn parse_number<T: std::str::FromStr>(args: &[String], flag: &str) -> Result<Option<T>, String>
where
    T::Err: std::fmt::Display,
{
    parse_flag(args, flag)
        .map(|raw| raw.parse::<T>().map_err(|e| format!("invalid {flag} {raw:?}: {e}")))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainpools_core::config::FetchTarget;

    fn args(line: &str) -> Vec<String> {
        line.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn fetch_flags() {
        let cfg = fetch_config(&args(
            "--chain-id 42161 --version 2 --whitelist --reserve 2.5 --page-size 50 --out /tmp/p",
        ))
        .unwrap();
        assert_eq!(
            cfg.target,
            FetchTarget::new(Network::ArbitrumMainnet, SchemaVersion::V2)
        );
        assert!(cfg.whitelist);
        assert_eq!(cfg.min_reserve, Some(2.5));
        assert_eq!(cfg.page_size, 50);
        assert_eq!(cfg.output_root, PathBuf::from("/tmp/p"));
    }

    #[test]
    fn reserve_defaults_and_can_be_dropped() {
        let cfg = fetch_config(&args("--chain-id 1 --version 3")).unwrap();
        assert_eq!(cfg.min_reserve, Some(DEFAULT_MIN_RESERVE));
        assert!(!cfg.whitelist);

        let cfg = fetch_config(&args("--chain-id 1 --version 3 --no-reserve")).unwrap();
        assert_eq!(cfg.min_reserve, None);
    }

    #[test]
    fn fetch_rejects_bad_input() {
        assert!(fetch_config(&args("--version 3")).is_err());
        assert!(fetch_config(&args("--chain-id 1")).is_err());
        assert!(fetch_config(&args("--chain-id 1 --version 5")).is_err());
        assert!(fetch_config(&args("--chain-id 999 --version 2")).is_err());
        assert!(fetch_config(&args("--chain-id 1 --version 2 --reserve lots")).is_err());
        assert!(fetch_config(&args("--chain-id 1 --version 2 --page-size 0")).is_err());
    }

    #[test]
    fn api_key_flag_wins() {
        assert_eq!(api_key(&args("--api-key abc")).unwrap(), "abc");
    }

    #[test]
    fn log_flags() {
        let cfg = log_config(&args(
            "--log-level warn --log-component chainpools-subgraph=debug --log-component chainpools-core=trace --json-logs",
        ))
        .unwrap();
        assert_eq!(cfg.level, "warn");
        assert_eq!(cfg.components["chainpools-subgraph"], "debug");
        assert_eq!(cfg.components["chainpools-core"], "trace");
        assert!(cfg.json);

        assert!(log_config(&args("--log-component verbose")).is_err());
    }

    #[test]
    fn parse_number_missing_value() {
        assert_eq!(parse_number::<u64>(&args("--chain-id"), "--chain-id").unwrap(), None);
    }
}
