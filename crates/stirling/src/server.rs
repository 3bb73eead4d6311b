//! Server orchestration

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use tracing::info;

use stirling_api::RestServer;
use stirling_common::config::{Config, CONNECTION_STRING_ENV};
use stirling_common::metrics;
use stirling_fixes::FixFeed;
use stirling_store::AzureTableClient;

/// Wire the fix feed to the configured Azure table
pub fn build_feed(config: &Config) -> Result<FixFeed> {
    let connection_string = config
        .store
        .connection_string
        .as_deref()
        .ok_or_else(|| {
            anyhow!("No storage connection string configured; set {}", CONNECTION_STRING_ENV)
        })?;

    let client = AzureTableClient::from_connection_string(
        connection_string,
        Duration::from_millis(config.store.request_timeout_ms),
    )?;

    info!(
        account = client.account_name(),
        table = %config.store.table_name,
        "Connected telemetry store"
    );

    Ok(FixFeed::from_config(&config.feed, &config.store.table_name, Arc::new(client)))
}

/// Main Stirling server
pub struct StirlingServer {
    rest_server: RestServer,
}

impl StirlingServer {
    pub fn new(config: &Config) -> Result<Self> {
        info!("Initializing Stirling components...");

        metrics::install()?;
        let feed = build_feed(config)?;
        let rest_server = RestServer::new(&config.server, feed);

        info!("All components initialized");
        Ok(Self { rest_server })
    }

    /// Serve until `shutdown` resolves, then drain in-flight requests
    pub async fn run<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.rest_server.run(shutdown).await?;
        info!("Stirling server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_connection_string() {
        let Err(err) = build_feed(&Config::default()) else {
            panic!("feed built without a connection string");
        };
        assert!(err.to_string().contains(CONNECTION_STRING_ENV));
    }

    #[test]
    fn test_build_feed_from_development_storage() {
        let mut config = Config::default();
        config.store.connection_string = Some("UseDevelopmentStorage=true".to_string());

        assert!(build_feed(&config).is_ok());
    }
}
