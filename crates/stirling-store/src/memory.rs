//! In-memory telemetry table
//!
//! Mirrors the paging behaviour of the table service: rows come back in
//! RowKey order, at most `page_size` per page, and a truncated page carries a
//! `NextRowKey` continuation parameter.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use parking_lot::RwLock;
use stirling_common::StoreError;
use tracing::debug;

use crate::client::{ContinuationToken, Page, TableStore};
use crate::entity::RawEntity;
use crate::query::Query;

const NEXT_ROW_KEY: &str = "NextRowKey";

/// Table store kept entirely in memory
pub struct InMemoryTableStore {
    tables: RwLock<HashMap<String, BTreeMap<String, RawEntity>>>,
    page_size: usize,
}

impl Default for InMemoryTableStore {
    fn default() -> Self {
        // The table service caps a page at 1000 entities
        Self::new(1000)
    }
}

impl InMemoryTableStore {
    #[must_use]
    pub fn new(page_size: usize) -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            page_size: page_size.max(1),
        }
    }

    /// Create an empty table; no-op if it exists
    pub fn create_table(&self, table: &str) {
        self.tables.write().entry(table.to_string()).or_default();
    }

    /// Insert or replace an entity, creating the table on demand
    pub fn insert(&self, table: &str, entity: RawEntity) {
        self.tables
            .write()
            .entry(table.to_string())
            .or_default()
            .insert(entity.row_key().to_string(), entity);
    }

    #[must_use]
    pub fn len(&self, table: &str) -> usize {
        self.tables.read().get(table).map_or(0, BTreeMap::len)
    }

    #[must_use]
    pub fn is_empty(&self, table: &str) -> bool {
        self.len(table) == 0
    }
}

#[async_trait]
impl TableStore for InMemoryTableStore {
    async fn query_page(
        &self,
        table: &str,
        query: &Query,
        continuation: Option<&ContinuationToken>,
    ) -> Result<Page, StoreError> {
        let tables = self.tables.read();
        let rows = tables.get(table).ok_or_else(|| StoreError::Status {
            status: 404,
            message: format!("TableNotFound: {}", table),
        })?;

        let resume_at = match continuation {
            Some(token) => Some(token.get(NEXT_ROW_KEY).ok_or_else(|| StoreError::Status {
                status: 400,
                message: "InvalidInput: continuation token lacks NextRowKey".to_string(),
            })?),
            None => None,
        };

        let mut matching = rows
            .iter()
            .filter(|(row_key, _)| resume_at.map_or(true, |start| row_key.as_str() >= start))
            .filter(|(row_key, _)| query.bound().matches(row_key))
            .map(|(_, entity)| entity);

        let mut entities = Vec::new();
        for entity in matching.by_ref().take(self.page_size) {
            let mut entity = entity.clone();
            entity.retain_columns(query.columns());
            entities.push(entity);
        }

        let page = match matching.next() {
            Some(next) => {
                let token = vec![(NEXT_ROW_KEY.to_string(), next.row_key().to_string())];
                Page::truncated(entities, ContinuationToken::new(token))
            }
            None => Page::last(entities),
        };

        debug!(
            table,
            entities = page.entities.len(),
            truncated = page.continuation.is_some(),
            "In-memory page served"
        );

        Ok(page)
    }
}
