//! Azure storage connection strings
//!
//! Format: `Key=Value;Key=Value;...` as issued by the portal, e.g.
//! `DefaultEndpointsProtocol=https;AccountName=acct;AccountKey=...;EndpointSuffix=core.windows.net`.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Url;
use stirling_common::StoreError;

/// Well-known account used by the storage emulator
const DEV_ACCOUNT_NAME: &str = "devstoreaccount1";
const DEV_ACCOUNT_KEY: &str =
    "Eby8vdM02xNOcqFlqUwJPLlmEtlCDXJ1OUzFT50uSRZ6IFsuFq2UVErCz4I6tq/K1SZFPTOtr/KBHBeksoGMGw==";
const DEV_TABLE_ENDPOINT: &str = "http://127.0.0.1:10002/devstoreaccount1";

/// Account credentials plus the table service endpoint
#[derive(Clone)]
pub struct StorageAccount {
    pub name: String,
    pub key: Vec<u8>,
    pub table_endpoint: Url,
}

impl std::fmt::Debug for StorageAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageAccount")
            .field("name", &self.name)
            .field("key", &"<redacted>")
            .field("table_endpoint", &self.table_endpoint.as_str())
            .finish()
    }
}

impl StorageAccount {
    /// Parse a connection string
    pub fn parse(connection_string: &str) -> Result<Self, StoreError> {
        let mut name = None;
        let mut key = None;
        let mut protocol = "https".to_string();
        let mut suffix = "core.windows.net".to_string();
        let mut table_endpoint = None;
        let mut development = false;

        for segment in connection_string.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            let (field, value) = segment
                .split_once('=')
                .ok_or_else(|| invalid(format!("segment without '=': {}", segment)))?;

            match field {
                "AccountName" => name = Some(value.to_string()),
                "AccountKey" => key = Some(value.to_string()),
                "DefaultEndpointsProtocol" => protocol = value.to_string(),
                "EndpointSuffix" => suffix = value.to_string(),
                "TableEndpoint" => table_endpoint = Some(value.to_string()),
                "UseDevelopmentStorage" => development = value.eq_ignore_ascii_case("true"),
                // Blob/queue/file endpoints and SAS settings are irrelevant here
                _ => {}
            }
        }

        if development {
            name = name.or_else(|| Some(DEV_ACCOUNT_NAME.to_string()));
            key = key.or_else(|| Some(DEV_ACCOUNT_KEY.to_string()));
            table_endpoint = table_endpoint.or_else(|| Some(DEV_TABLE_ENDPOINT.to_string()));
        }

        let name = name.ok_or_else(|| invalid("missing AccountName"))?;
        let key = key.ok_or_else(|| invalid("missing AccountKey"))?;
        let key = STANDARD
            .decode(key.as_bytes())
            .map_err(|e| invalid(format!("AccountKey is not base64: {}", e)))?;

        let endpoint = table_endpoint
            .unwrap_or_else(|| format!("{}://{}.table.{}", protocol, name, suffix));
        let table_endpoint = Url::parse(endpoint.trim_end_matches('/'))
            .map_err(|e| invalid(format!("bad table endpoint {}: {}", endpoint, e)))?;

        Ok(Self {
            name,
            key,
            table_endpoint,
        })
    }
}

fn invalid(message: impl Into<String>) -> StoreError {
    StoreError::InvalidConnectionString(message.into())
}
