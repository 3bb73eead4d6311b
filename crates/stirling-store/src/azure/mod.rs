//! Azure Table service client
//!
//! Speaks the Table REST API directly: one signed `GET {table}()` per page,
//! continuation carried in `x-ms-continuation-*` headers.

pub mod auth;
pub mod connection;
pub mod odata;

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{header, Client, Url};
use stirling_common::StoreError;
use tracing::{debug, instrument, warn};

use crate::client::{ContinuationToken, Page, TableStore};
use crate::query::Query;

pub use connection::StorageAccount;

const API_VERSION: &str = "2019-02-02";
const DATA_SERVICE_VERSION: &str = "3.0;NetFx";
const ACCEPT_NO_METADATA: &str = "application/json;odata=nometadata";

/// Table service client, shared by all requests
#[derive(Debug, Clone)]
pub struct AzureTableClient {
    http: Client,
    account: StorageAccount,
}

impl AzureTableClient {
    /// Build a client from an Azure connection string
    pub fn from_connection_string(
        connection_string: &str,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let account = StorageAccount::parse(connection_string)?;
        Self::new(account, timeout)
    }

    pub fn new(account: StorageAccount, timeout: Duration) -> Result<Self, StoreError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { http, account })
    }

    #[must_use]
    pub fn account_name(&self) -> &str {
        &self.account.name
    }

    fn query_url(
        &self,
        table: &str,
        query: &Query,
        continuation: Option<&ContinuationToken>,
    ) -> Url {
        let mut url = self.account.table_endpoint.clone();
        let path = format!("{}/{}()", url.path().trim_end_matches('/'), table);
        url.set_path(&path);

        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("$filter", &odata::filter_expression(query.bound()));
            pairs.append_pair("$select", &odata::select_expression(query.columns()));
            if let Some(token) = continuation {
                for (name, value) in token.parts() {
                    pairs.append_pair(name, value);
                }
            }
        }

        url
    }
}

#[async_trait]
impl TableStore for AzureTableClient {
    #[instrument(
        skip(self, query, continuation),
        fields(account = %self.account.name, continued = continuation.is_some())
    )]
    async fn query_page(
        &self,
        table: &str,
        query: &Query,
        continuation: Option<&ContinuationToken>,
    ) -> Result<Page, StoreError> {
        let url = self.query_url(table, query, continuation);
        let date = auth::request_date(Utc::now());
        let resource = auth::canonicalized_resource(&self.account.name, url.path());
        let authorization =
            auth::authorization_header(&self.account.name, &self.account.key, &date, &resource)?;

        let response = self
            .http
            .get(url)
            .header("x-ms-date", &date)
            .header("x-ms-version", API_VERSION)
            .header("DataServiceVersion", DATA_SERVICE_VERSION)
            .header("MaxDataServiceVersion", DATA_SERVICE_VERSION)
            .header(header::ACCEPT, ACCEPT_NO_METADATA)
            .header(header::AUTHORIZATION, authorization)
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        let status = response.status();
        let next = odata::continuation_from_headers(response.headers());
        let body = response
            .bytes()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        if !status.is_success() {
            let message = odata::error_message(&body);
            warn!(status = status.as_u16(), %message, "Table query rejected");
            return Err(StoreError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let entities = odata::decode_entities(&body)?;
        debug!(entities = entities.len(), truncated = next.is_some(), "Table page received");

        Ok(Page {
            entities,
            continuation: next,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::RowKeyBound;

    fn client(connection_string: &str) -> AzureTableClient {
        AzureTableClient::from_connection_string(connection_string, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_query_url_cloud() {
        let client = client("AccountName=acct;AccountKey=c2VjcmV0");
        let query = Query::new(RowKeyBound::AtLeast("2024-05-01T00:00:00.000Z".into()));

        let url = client.query_url("assettracker", &query, None);
        assert_eq!(url.host_str(), Some("acct.table.core.windows.net"));
        assert_eq!(url.path(), "/assettracker()");

        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs[0].0, "$filter");
        assert_eq!(pairs[0].1, "RowKey ge '2024-05-01T00:00:00.000Z'");
        assert_eq!(pairs[1].0, "$select");
        assert!(pairs[1].1.starts_with("RowKey,Timestamp,lat,lon"));
        assert_eq!(pairs.len(), 2);
    }

    #[test]
    fn test_query_url_forwards_continuation() {
        let client = client("UseDevelopmentStorage=true");
        let query = Query::new(RowKeyBound::AtMost("z".into()));
        let token = ContinuationToken::new(vec![
            ("NextPartitionKey".into(), "1!4!cA--".into()),
            ("NextRowKey".into(), "1!4!cg--".into()),
        ]);

        let url = client.query_url("assettracker", &query, Some(&token));
        assert_eq!(url.path(), "/devstoreaccount1/assettracker()");

        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("NextPartitionKey".to_string(), "1!4!cA--".to_string())));
        assert!(pairs.contains(&("NextRowKey".to_string(), "1!4!cg--".to_string())));
    }

    #[test]
    fn test_rejects_bad_connection_string() {
        let err = AzureTableClient::from_connection_string("nonsense", Duration::from_secs(1))
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidConnectionString(_)));
    }
}
