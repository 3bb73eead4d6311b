//! Paginated fetch-and-normalize pipeline
//!
//! Drains a query page by page, strictly one request in flight, forwarding
//! exactly the continuation token the previous page returned. Pages are
//! transformed as they arrive and concatenated in fetch order. Any failed
//! page fails the whole fetch; fixes from earlier pages are dropped.
//!
//! There is no cap on page count and no timeout here: a store that keeps
//! issuing tokens keeps the fetch going.

use std::sync::Arc;

use futures::stream::{self, Stream, TryStreamExt};
use stirling_common::{metrics, StoreError};
use stirling_store::{ContinuationToken, Query, TableStore};
use tracing::{debug, error, instrument};

use crate::fix::Fix;
use crate::transform::FieldTransform;

/// Where the next page request starts
enum Cursor {
    First,
    Next(ContinuationToken),
    Done,
}

/// Query executor producing normalized fixes
#[derive(Clone)]
pub struct FixPipeline {
    store: Arc<dyn TableStore>,
    table: String,
    transform: FieldTransform,
}

impl FixPipeline {
    pub fn new(
        store: Arc<dyn TableStore>,
        table: impl Into<String>,
        transform: FieldTransform,
    ) -> Self {
        Self {
            store,
            table: table.into(),
            transform,
        }
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Lazily fetch and transform pages. Restart by calling again.
    pub fn pages<'a>(
        &'a self,
        query: &'a Query,
    ) -> impl Stream<Item = Result<Vec<Fix>, StoreError>> + 'a {
        stream::try_unfold(Cursor::First, move |cursor| self.next_page(query, cursor))
    }

    async fn next_page(
        &self,
        query: &Query,
        cursor: Cursor,
    ) -> Result<Option<(Vec<Fix>, Cursor)>, StoreError> {
        let token = match cursor {
            Cursor::Done => return Ok(None),
            Cursor::First => None,
            Cursor::Next(token) => Some(token),
        };

        let page = self
            .store
            .query_page(&self.table, query, token.as_ref())
            .await
            .map_err(|e| {
                metrics::record_store_error(&self.table, e.kind());
                e
            })?;

        metrics::record_page_fetched(&self.table, page.entities.len());
        debug!(
            table = %self.table,
            entities = page.entities.len(),
            truncated = page.continuation.is_some(),
            "Fetched page"
        );

        let fixes = page.entities.iter().map(|e| self.transform.apply(e)).collect();
        let next = match page.continuation {
            Some(token) => Cursor::Next(token),
            None => Cursor::Done,
        };

        Ok(Some((fixes, next)))
    }

    /// Fetch every page and return all fixes, or the first failure
    #[instrument(skip(self, query), fields(table = %self.table))]
    pub async fn fetch_fixes(&self, query: &Query) -> Result<Vec<Fix>, StoreError> {
        let _timer = metrics::LatencyTimer::new("stirling_fetch_duration_ms");
        let mut fixes = Vec::new();
        let mut pages = std::pin::pin!(self.pages(query));

        loop {
            match pages.try_next().await {
                Ok(Some(page)) => fixes.extend(page),
                Ok(None) => break,
                Err(e) => {
                    error!(error = %e, discarded = fixes.len(), "Fix fetch failed");
                    return Err(e);
                }
            }
        }

        Ok(fixes)
    }
}
