//! Paged access contract for the telemetry table

use async_trait::async_trait;
use stirling_common::StoreError;

use crate::entity::RawEntity;
use crate::query::Query;

/// Opaque cursor issued with a truncated page.
///
/// Only valid for continuing the exact query that produced it. The
/// parameters are meaningful to the issuing store alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContinuationToken {
    parts: Vec<(String, String)>,
}

impl ContinuationToken {
    #[must_use]
    pub fn new(parts: Vec<(String, String)>) -> Self {
        Self { parts }
    }

    #[must_use]
    pub fn parts(&self) -> &[(String, String)] {
        &self.parts
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.parts
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// One page of a query result
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub entities: Vec<RawEntity>,
    /// Absent on the final page
    pub continuation: Option<ContinuationToken>,
}

impl Page {
    #[must_use]
    pub fn last(entities: Vec<RawEntity>) -> Self {
        Self {
            entities,
            continuation: None,
        }
    }

    #[must_use]
    pub fn truncated(entities: Vec<RawEntity>, next: ContinuationToken) -> Self {
        Self {
            entities,
            continuation: Some(next),
        }
    }
}

/// Paginated read access to a wide-column table.
///
/// One instance is shared by every concurrent request, so implementations
/// must support independent queries in parallel.
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Fetch one page. `None` requests the first page.
    async fn query_page(
        &self,
        table: &str,
        query: &Query,
        continuation: Option<&ContinuationToken>,
    ) -> Result<Page, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_lookup() {
        let token = ContinuationToken::new(vec![
            ("NextPartitionKey".into(), "1!8!dHJhY2tlcg--".into()),
            ("NextRowKey".into(), "1!12!MjAyNA--".into()),
        ]);

        assert_eq!(token.get("NextRowKey"), Some("1!12!MjAyNA--"));
        assert_eq!(token.get("Missing"), None);
        assert_eq!(token.parts().len(), 2);
    }

    #[test]
    fn test_page_constructors() {
        assert!(Page::last(Vec::new()).continuation.is_none());
        let next = ContinuationToken::new(vec![("NextRowKey".into(), "r".into())]);
        assert_eq!(Page::truncated(Vec::new(), next.clone()).continuation, Some(next));
    }
}
