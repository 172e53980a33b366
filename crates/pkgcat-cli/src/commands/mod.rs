pub mod catalog;
pub mod delete;
pub mod ui;
pub mod upload;

use anyhow::Result;
use pkgcat_client::{ApiClient, ClientOptions};
use pkgcat_config::Config;
use pkgcat_core::RowIssue;

/// Build the HTTP client, letting `--api-url` override the config file
pub fn connect(config: &Config, api_url: Option<&str>) -> Result<ApiClient> {
    let options = ClientOptions {
        base_url: api_url.unwrap_or(&config.api.base_url).to_string(),
        timeout: config.api.timeout(),
        user_agent: config.api.user_agent.clone(),
    };
    tracing::debug!(base_url = %options.base_url, "connecting to catalog API");
    Ok(ApiClient::new(options)?)
}

pub fn print_rows(heading: &str, rows: &[RowIssue]) {
    if rows.is_empty() {
        return;
    }
    println!("{} ({}):", heading, rows.len());
    for row in rows {
        println!("  {}", row);
    }
}
