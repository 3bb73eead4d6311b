//! Configuration loading

use std::path::Path;

use anyhow::Result;
use stirling_common::config::Config;

/// Load configuration from file, then the environment, then validate
pub async fn load(path: &str) -> Result<Config> {
    let path = Path::new(path);

    let mut config = if path.exists() {
        Config::load(path).await?
    } else {
        // Use default configuration
        Config::default()
    };

    config.apply_env()?;
    config.validate()?;

    Ok(config)
}
