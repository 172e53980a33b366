mod cli;
mod commands;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use pkgcat_config::Config;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(matches!(cli.command, Commands::Ui));

    if let Commands::Completions { shell } = cli.command {
        clap_complete::generate(shell, &mut Cli::command(), "pkgcat", &mut std::io::stdout());
        return Ok(());
    }

    let config = Config::load()?;
    let api = commands::connect(&config, cli.api_url.as_deref())?;
    let format = cli.format;

    match cli.command {
        Commands::List {
            search,
            sort,
            page,
            per_page,
        } => commands::catalog::list(&api, &config, format, search, sort, page, per_page).await,
        Commands::Show { id, titles } => commands::catalog::show(&api, format, id, titles).await,
        Commands::IdTypes => commands::catalog::id_types(&api, format).await,
        Commands::Upload {
            file,
            name,
            id,
            update,
            id_type,
            id_value,
        } => {
            let args = commands::upload::UploadArgs {
                file,
                name,
                id,
                update,
                id_type,
                id_value,
            };
            commands::upload::handle(&api, format, args).await
        }
        Commands::Delete { id, force } => commands::delete::handle(&api, format, id, force).await,
        Commands::Ui => commands::ui::handle(api, &config).await,
        Commands::Completions { .. } => Ok(()),
    }
}

/// Logs go to stderr so stdout stays clean for `--format json`. Under the
/// TUI nothing is installed unless `RUST_LOG` asks for it.
fn init_tracing(interactive: bool) {
    let from_env = tracing_subscriber::EnvFilter::try_from_default_env();
    if interactive && from_env.is_err() {
        return;
    }
    tracing_subscriber::fmt()
        .with_env_filter(
            from_env.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}
