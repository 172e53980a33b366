use anyhow::Result;
use pkgcat_client::ApiClient;
use pkgcat_core::{Severity, UploadFile, UploadForm};
use pkgcat_engine::UploadPipeline;
use std::path::PathBuf;

use super::print_rows;
use crate::cli::OutputFormat;

pub struct UploadArgs {
    pub file: PathBuf,
    pub name: String,
    pub id: Option<String>,
    pub update: bool,
    pub id_type: Option<String>,
    pub id_value: Option<String>,
}

pub async fn handle(api: &ApiClient, format: OutputFormat, args: UploadArgs) -> Result<()> {
    let mut form = if args.update {
        let id = args
            .id
            .ok_or_else(|| anyhow::anyhow!("--update requires --id"))?;
        UploadForm::edit(id, args.name)
    } else {
        let mut form = UploadForm::create();
        form.set_package_id(args.id.unwrap_or_default());
        form.package_name = args.name;
        form
    };
    form.file = Some(UploadFile::from_path(&args.file)?);
    form.identifier_value = args.id_value.unwrap_or_default();

    let mut pipeline = UploadPipeline::new(form);
    pipeline.load_identifier_types(api).await;
    if let Some(kind) = args.id_type {
        let known = pipeline.identifier_types().options();
        if !known.contains(&kind) {
            anyhow::bail!(
                "Unknown identifier type '{}' (available: {})",
                kind,
                known.join(", ")
            );
        }
        pipeline.form_mut().identifier_type = Some(kind);
    }

    pipeline.submit(api).await?;
    let Some(result) = pipeline.result() else {
        anyhow::bail!("Upload did not complete");
    };

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(result)?);
    } else {
        let mark = match result.severity() {
            Severity::Success => "✓",
            Severity::Warning => "⚠",
            Severity::Error => "✗",
        };
        println!("{} {}", mark, result.message());
        if let pkgcat_core::UploadResult::TransportFailure { reason } = result {
            println!("  {}", reason);
        }
        print_rows("Errors", result.errors());
        print_rows("Warnings", result.warnings());
    }

    if !result.is_accepted() {
        anyhow::bail!("Upload was not accepted");
    }
    Ok(())
}
