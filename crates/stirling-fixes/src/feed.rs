//! Request-scoped entry point: time bound in, fixes out

use std::sync::Arc;
use std::time::Duration;

use stirling_common::config::FeedConfig;
use stirling_common::StoreError;
use stirling_store::{Query, RangeQueryBuilder, TableStore, TimeBound};
use tracing::debug;

use crate::fix::Fix;
use crate::pipeline::FixPipeline;
use crate::transform::FieldTransform;

/// Builds the range query for a request and drains it through the pipeline.
///
/// Holds no per-request state; every call owns its own query and result set.
#[derive(Clone)]
pub struct FixFeed {
    queries: RangeQueryBuilder,
    pipeline: FixPipeline,
}

impl FixFeed {
    #[must_use]
    pub fn new(queries: RangeQueryBuilder, pipeline: FixPipeline) -> Self {
        Self { queries, pipeline }
    }

    /// Wire a feed from configuration around an existing store
    pub fn from_config(config: &FeedConfig, table: &str, store: Arc<dyn TableStore>) -> Self {
        let queries = RangeQueryBuilder::new(Duration::from_secs(config.default_window_secs));
        let pipeline = FixPipeline::new(store, table, FieldTransform::from_config(config));
        Self::new(queries, pipeline)
    }

    #[must_use]
    pub fn query(&self, bound: TimeBound) -> Query {
        self.queries.build(bound)
    }

    /// All fixes within the bound, in store order
    pub async fn fixes(&self, bound: TimeBound) -> Result<Vec<Fix>, StoreError> {
        let query = self.query(bound);
        let fixes = self.pipeline.fetch_fixes(&query).await?;
        debug!(table = self.pipeline.table(), count = fixes.len(), "Fix query complete");
        Ok(fixes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{SecondsFormat, Utc};
    use stirling_store::{InMemoryTableStore, RawEntity};

    fn feed_over(store: Arc<InMemoryTableStore>) -> FixFeed {
        let config = FeedConfig {
            default_window_secs: 3600,
            ..FeedConfig::default()
        };
        FixFeed::from_config(&config, "assettracker", store)
    }

    fn seeded() -> Arc<InMemoryTableStore> {
        let store = Arc::new(InMemoryTableStore::new(2));
        let keys = [
            "2024-05-01T10:00:00.000Z",
            "2024-05-01T11:00:00.000Z",
            "2024-05-01T12:00:00.000Z",
        ];
        for key in keys {
            store.insert("assettracker", RawEntity::new("tracker", key).with_number("x", "100"));
        }
        store
    }

    #[tokio::test]
    async fn test_since_and_before() {
        let feed = feed_over(seeded());

        let since = feed
            .fixes(TimeBound::Since("2024-05-01T11:00:00.000Z".into()))
            .await
            .unwrap();
        assert_eq!(since.len(), 2);

        let before = feed
            .fixes(TimeBound::Before("2024-05-01T11:00:00.000Z".into()))
            .await
            .unwrap();
        assert_eq!(before.len(), 2);
        assert_eq!(before[0].row_key, "2024-05-01T10:00:00.000Z");
        assert_eq!(before[0].heading.unwrap().mag.as_i64(), Some(10));
    }

    #[tokio::test]
    async fn test_recent_window() {
        let store = seeded();
        let fresh = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        store.insert("assettracker", RawEntity::new("tracker", fresh.clone()));
        let feed = feed_over(store);

        let recent = feed.fixes(TimeBound::Recent).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].row_key, fresh);
    }
}
