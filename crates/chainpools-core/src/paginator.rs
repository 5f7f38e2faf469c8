//! The pagination engine.
//!
//! Subgraph results have no cursor, so the engine walks them by
//! `createdAtBlockNumber`:
//!
//! 1. request `first: page_size` pools with `createdAtBlockNumber >= cursor`,
//!    ascending;
//! 2. drop pools whose id was in the previous page (the cursor block is
//!    served again on every request);
//! 3. hand the rest to the sink, then move the cursor to the last block of
//!    the page.
//!
//! A short page with nothing new ends the run. A full page with nothing new
//! is ambiguous: the cursor block holds exactly the pools already seen, or
//! more pools than fit in one page. One extra request for unseen pools at
//! that block tells them apart. If there are none the cursor moves past the
//! block; otherwise the cursor can never advance and the run fails with
//! [`PoolsError::CursorStalled`].

use std::collections::HashSet;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::PoolsError;
use crate::filter::{build_block_filter, build_filter, FilterParams};
use crate::query::PoolsQuery;
use crate::types::{Network, PoolRecord, SchemaVersion};

/// One page request handed to the transport.
#[derive(Debug, Clone)]
pub struct PageRequest<'a> {
    pub query: &'a PoolsQuery,
    pub page_size: usize,
    pub filter: Value,
}

/// Transport seam: executes one page request, returning raw wire records in
/// server order.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, request: &PageRequest<'_>) -> Result<Vec<Value>, PoolsError>;
}

/// Receives each deduplicated page before the next one is requested.
#[async_trait]
pub trait PageSink: Send {
    async fn accept(&mut self, page: &[PoolRecord]) -> Result<(), PoolsError>;
}

#[async_trait]
impl PageSink for Vec<PoolRecord> {
    async fn accept(&mut self, page: &[PoolRecord]) -> Result<(), PoolsError> {
        self.extend_from_slice(page);
        Ok(())
    }
}

/// Outcome of a completed pagination run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchSummary {
    /// Pools delivered to the sink.
    pub total: u64,
    /// Non-empty pages delivered.
    pub pages: u64,
    /// Requests made, including the final empty one.
    pub requests: u64,
    /// Cursor after the last page.
    pub cursor: u64,
}

/// Drives page requests for one (network, version) target.
pub struct Paginator<'s, S: PageSource + ?Sized> {
    source: &'s S,
    network: Network,
    query: PoolsQuery,
    page_size: usize,
    params: FilterParams,
}

impl<'s, S: PageSource + ?Sized> Paginator<'s, S> {
    pub fn new(
        source: &'s S,
        network: Network,
        version: SchemaVersion,
        page_size: usize,
        params: FilterParams,
    ) -> Result<Self, PoolsError> {
        if page_size == 0 {
            return Err(PoolsError::Config("page size must be positive".into()));
        }
        Ok(Self {
            source,
            network,
            query: PoolsQuery::build(version, network),
            page_size,
            params,
        })
    }

    pub fn version(&self) -> SchemaVersion {
        self.query.version
    }

    /// Fetch every pool created at or after `initial_cursor`.
    pub async fn fetch_all(
        &self,
        initial_cursor: u64,
        sink: &mut dyn PageSink,
    ) -> Result<FetchSummary, PoolsError> {
        self.resume(initial_cursor, HashSet::new(), sink).await
    }

    /// Like [`fetch_all`](Self::fetch_all), treating `seen_ids` as already
    /// delivered pools at `initial_cursor`.
    pub async fn resume(
        &self,
        initial_cursor: u64,
        seen_ids: HashSet<String>,
        sink: &mut dyn PageSink,
    ) -> Result<FetchSummary, PoolsError> {
        let version = self.version();
        let chain = self.network.chain_id();
        let mut cursor = initial_cursor;
        let mut seen = seen_ids;
        let mut summary = FetchSummary {
            cursor,
            ..Default::default()
        };

        loop {
            let request = PageRequest {
                query: &self.query,
                page_size: self.page_size,
                filter: build_filter(version, self.network, &self.params.with_cursor(cursor)),
            };
            let raw = self.source.fetch_page(&request).await?;
            summary.requests += 1;

            let received = raw.len();
            let mut page = Vec::with_capacity(received);
            let mut page_ids = HashSet::with_capacity(received);
            let mut last_block = cursor;

            for item in raw {
                let record = version.from_wire(item)?;
                let block = record.created_at_block_number();
                if block < last_block {
                    return Err(PoolsError::MalformedResponse(format!(
                        "pool {} at block {block} is out of order (cursor {cursor}, previous {last_block})",
                        record.id()
                    )));
                }
                last_block = block;
                let fresh = page_ids.insert(record.id().to_string());
                if fresh && !seen.contains(record.id()) {
                    page.push(record);
                }
            }

            if page.is_empty() {
                if received < self.page_size {
                    break;
                }
                summary.requests += 1;
                if self.block_has_unseen(cursor, &seen).await? {
                    return Err(PoolsError::CursorStalled {
                        block: cursor,
                        page_size: self.page_size,
                    });
                }
                tracing::info!(chain, version = %version, block = cursor, "Cursor block exhausted");
                match cursor.checked_add(1) {
                    Some(next) => cursor = next,
                    None => break,
                }
                seen.clear();
                continue;
            }

            sink.accept(&page).await?;
            summary.total += page.len() as u64;
            summary.pages += 1;

            tracing::info!(
                chain,
                version = %version,
                fetched = page.len(),
                from_block = cursor,
                total = summary.total,
                "Fetched pools page"
            );

            cursor = last_block;
            seen = page_ids;
        }

        summary.cursor = cursor;
        tracing::info!(
            chain,
            version = %version,
            total = summary.total,
            requests = summary.requests,
            cursor,
            "Pagination complete"
        );
        Ok(summary)
    }

    /// Whether any pool created at `block` is missing from `seen`.
    async fn block_has_unseen(
        &self,
        block: u64,
        seen: &HashSet<String>,
    ) -> Result<bool, PoolsError> {
        let version = self.version();
        let request = PageRequest {
            query: &self.query,
            page_size: 1,
            filter: build_block_filter(version, self.network, &self.params, block, seen),
        };
        for item in self.source.fetch_page(&request).await? {
            let record = version.from_wire(item)?;
            if record.created_at_block_number() != block {
                return Err(PoolsError::MalformedResponse(format!(
                    "pool {} at block {} returned for block {block}",
                    record.id(),
                    record.created_at_block_number()
                )));
            }
            if !seen.contains(record.id()) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Fetch everything into memory.
    pub async fn collect_all(&self, initial_cursor: u64) -> Result<Vec<PoolRecord>, PoolsError> {
        let mut pools = Vec::new();
        self.fetch_all(initial_cursor, &mut pools).await?;
        Ok(pools)
    }
}
