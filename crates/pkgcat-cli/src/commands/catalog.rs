use anyhow::Result;
use pkgcat_client::ApiClient;
use pkgcat_config::Config;
use pkgcat_core::package::format_date;
use pkgcat_core::{CatalogApi, PackageSummary, SortKey, ViewState};
use pkgcat_engine::{CatalogStore, DetailResolver};

use crate::cli::OutputFormat;

async fn load_catalog(api: &ApiClient, view: ViewState) -> Result<CatalogStore> {
    let mut store = CatalogStore::new(view);
    store.load(api).await?;
    Ok(store)
}

pub async fn list(
    api: &ApiClient,
    config: &Config,
    format: OutputFormat,
    search: Option<String>,
    sort: Option<SortKey>,
    page: usize,
    per_page: Option<usize>,
) -> Result<()> {
    let view = ViewState::new(
        sort.unwrap_or(config.catalog.sort),
        per_page.unwrap_or_else(|| config.catalog.effective_page_size()),
    )?;
    let mut store = load_catalog(api, view).await?;
    if let Some(term) = search {
        store.set_search_term(term);
    }
    store.set_page(page);
    let view = store.visible();

    if format == OutputFormat::Json {
        let out = serde_json::json!({
            "page": view.page,
            "totalPages": view.total_pages,
            "filteredCount": view.filtered_count,
            "totalCount": view.total_count,
            "packages": view.items,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    if let Some(notice) = store.notice() {
        println!("{}", notice);
        return Ok(());
    }
    if view.items.is_empty() {
        println!("No packages match.");
        return Ok(());
    }

    println!("{:>8}  {:<50}  Last Updated", "ID", "Name");
    for pkg in &view.items {
        println!(
            "{:>8}  {:<50}  {}",
            pkg.display_identifier(),
            pkg.display_name(),
            format_date(pkg.last_updated)
        );
    }
    println!(
        "\nPage {} of {} ({} of {} packages)",
        view.page, view.total_pages, view.filtered_count, view.total_count
    );

    Ok(())
}

pub async fn show(
    api: &ApiClient,
    format: OutputFormat,
    id: String,
    titles: Option<String>,
) -> Result<()> {
    let store = load_catalog(api, ViewState::default()).await?;
    let summary: PackageSummary = store
        .packages()
        .iter()
        .find(|pkg| pkg.identifier == id)
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("Package '{}' not found", id))?;

    let mut resolver = DetailResolver::new(summary);
    resolver.fetch(api).await?;
    if let Some(filter) = titles {
        resolver.set_title_filter(filter);
    }

    if format == OutputFormat::Json {
        let out = serde_json::json!({
            "summary": resolver.summary(),
            "detail": resolver.detail(),
            "titles": resolver.visible_titles(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let summary = resolver.summary();
    println!("Package: {}", resolver.display_name());
    println!("  ID: {}", summary.display_identifier());
    println!("  Last updated: {}", format_date(summary.last_updated));
    for (kind, url) in summary.content.links() {
        println!("  {}: {}", kind, url);
    }

    let Some(detail) = resolver.detail() else {
        if let Some(notice) = resolver.notice() {
            println!("\n{}", notice);
        }
        return Ok(());
    };

    println!(
        "  Term: {} to {}",
        format_date(detail.term_start),
        format_date(detail.term_end)
    );
    if !detail.related_orgs.is_empty() {
        println!("\nRelated organisations:");
        for org in &detail.related_orgs {
            println!("  {}: {}", org.role, org.name);
        }
    }

    let visible = resolver.visible_titles();
    println!("\nTitles ({} of {}):", visible.len(), detail.titles.len());
    for title in visible {
        println!(
            "  {} [{}]",
            title.title,
            title.publication_type.as_deref().unwrap_or("Unknown")
        );
        println!(
            "    online: {}  print: {}",
            title.online_identifier().unwrap_or("N/A"),
            title.print_identifier().unwrap_or("N/A")
        );
        for link in title.links() {
            println!("    {}: {}", link.label, link.url);
        }
    }

    Ok(())
}

pub async fn id_types(api: &ApiClient, format: OutputFormat) -> Result<()> {
    let types = api.identifier_types().await?;

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&types)?);
        return Ok(());
    }

    if types.is_empty() {
        println!("No identifier types.");
        return Ok(());
    }
    for kind in types {
        println!("{}", kind);
    }

    Ok(())
}
