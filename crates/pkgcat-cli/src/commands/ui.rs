use anyhow::Result;
use pkgcat_client::ApiClient;
use pkgcat_config::Config;
use pkgcat_core::ViewState;
use std::sync::Arc;

pub async fn handle(api: ApiClient, config: &Config) -> Result<()> {
    let view = ViewState::new(config.catalog.sort, config.catalog.effective_page_size())?;
    pkgcat_tui::run(Arc::new(api), view).await
}
