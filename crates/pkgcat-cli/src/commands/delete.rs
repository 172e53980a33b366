use anyhow::Result;
use pkgcat_client::ApiClient;
use pkgcat_engine::{DeletionState, DeletionWorkflow};

use crate::cli::OutputFormat;

pub async fn handle(api: &ApiClient, format: OutputFormat, id: String, force: bool) -> Result<()> {
    let mut workflow = DeletionWorkflow::new(id.clone());
    workflow.request_delete()?;

    if !force {
        print!("Delete package '{}'? This cannot be undone. [y/N] ", id);
        std::io::Write::flush(&mut std::io::stdout())?;

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;

        if !input.trim().eq_ignore_ascii_case("y") {
            workflow.cancel()?;
            println!("Cancelled.");
            return Ok(());
        }
    }

    let state = workflow.confirm_and_delete(api).await?.clone();
    match state {
        DeletionState::Deleted => {
            if format == OutputFormat::Json {
                println!("{}", serde_json::json!({ "deleted": id }));
            } else {
                println!("✓ Deleted package: {}", id);
            }
            Ok(())
        }
        DeletionState::Closed { error: Some(error) } => anyhow::bail!(error),
        other => anyhow::bail!("Delete did not complete ({:?})", other),
    }
}
