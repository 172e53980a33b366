use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use pkgcat_core::SortKey;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pkgcat")]
#[command(about = "Browse and maintain a package catalog", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Catalog API base URL (overrides the config file)
    #[arg(long, global = true, env = "PKGCAT_API_URL")]
    pub api_url: Option<String>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List packages
    List {
        /// Case-insensitive match on name or identifier
        #[arg(long)]
        search: Option<String>,

        /// Sort key: id, name, lastUpdated (default from config)
        #[arg(long)]
        sort: Option<SortKey>,

        /// Page to show (1-based)
        #[arg(long, default_value = "1")]
        page: usize,

        /// Packages per page (default from config)
        #[arg(long)]
        per_page: Option<usize>,
    },

    /// Show package details and titles
    Show {
        /// Package identifier
        id: String,

        /// Only list titles containing this text
        #[arg(long)]
        titles: Option<String>,
    },

    /// Upload a .tsv or .csv package file
    Upload {
        /// File to upload
        file: PathBuf,

        /// Package name
        #[arg(long)]
        name: String,

        /// Package ID (required)
        #[arg(long)]
        id: Option<String>,

        /// Update an existing package instead of creating one
        #[arg(long)]
        update: bool,

        /// Additional identifier type (default: first type the server offers)
        #[arg(long)]
        id_type: Option<String>,

        /// Additional identifier value (whole number)
        #[arg(long)]
        id_value: Option<String>,
    },

    /// Delete a package
    Delete {
        /// Package identifier
        id: String,

        /// Skip confirmation
        #[arg(long)]
        force: bool,
    },

    /// List additional identifier types known to the server
    IdTypes,

    /// Launch interactive TUI
    Ui,

    /// Generate shell completions
    Completions {
        /// Target shell
        shell: Shell,
    },
}
