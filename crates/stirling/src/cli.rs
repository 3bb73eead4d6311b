//! CLI utilities

use anyhow::Result;
use stirling_common::config::Config;
use stirling_fixes::FixBatch;
use stirling_store::TimeBound;

use crate::server;

/// Run the pipeline once and print `{count, items}` to stdout
pub async fn fetch(
    config: &Config,
    since: Option<String>,
    before: Option<String>,
    pretty: bool,
) -> Result<()> {
    let bound = TimeBound::from_params(since, before)?;
    let feed = server::build_feed(config)?;

    let batch = FixBatch::from(feed.fixes(bound).await?);
    tracing::info!("fetch returned {} items", batch.count);

    let output = if pretty {
        serde_json::to_string_pretty(&batch)?
    } else {
        serde_json::to_string(&batch)?
    };
    println!("{}", output);

    Ok(())
}
