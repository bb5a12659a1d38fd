use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};

/// Command-line arguments for the `pager` binary.
#[derive(Debug, Parser)]
#[command(
    name = "pager",
    version,
    about = "Debounced, cached loader for remote paginated search APIs"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "PAGER_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Fetch pages of a query and print each outcome as a JSON line.
    Fetch(FetchArgs),
    /// Walk the pages of a query the way an infinite-scroll list would.
    Scroll(ScrollArgs),
}

impl Command {
    pub fn overrides(&self) -> &LoaderOverrides {
        match self {
            Self::Fetch(args) => &args.overrides,
            Self::Scroll(args) => &args.overrides,
        }
    }
}

#[derive(Debug, Args, Clone)]
pub struct FetchArgs {
    #[command(flatten)]
    pub overrides: LoaderOverrides,

    /// Search query substituted for `{query}`.
    #[arg(long, value_name = "QUERY")]
    pub query: String,

    /// Page to fetch; repeat to fetch several pages in order.
    #[arg(long = "page", value_name = "PAGE")]
    pub pages: Vec<u32>,

    /// Route every fetch through the debounce window instead of running it immediately.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub debounced: bool,
}

#[derive(Debug, Args, Clone)]
pub struct ScrollArgs {
    #[command(flatten)]
    pub overrides: LoaderOverrides,

    /// Search query substituted for `{query}`.
    #[arg(long, value_name = "QUERY")]
    pub query: String,

    /// Stop after this many pages even when more are available.
    #[arg(long = "pages", default_value_t = 5, value_name = "COUNT")]
    pub max_pages: u32,
}

#[derive(Debug, Args, Default, Clone)]
pub struct LoaderOverrides {
    /// Override the URL template (`{query}`, `{page}`, `{pageSize}` placeholders).
    #[arg(long = "url", value_name = "TEMPLATE")]
    pub url: Option<String>,

    /// Override the number of items requested per page.
    #[arg(long = "page-size", value_name = "COUNT")]
    pub page_size: Option<u32>,

    /// Override the debounce window in milliseconds.
    #[arg(long = "debounce-ms", value_name = "MILLIS")]
    pub debounce_ms: Option<u64>,

    /// Override the maximum number of cached pages.
    #[arg(long = "cache-pages", value_name = "COUNT")]
    pub cache_pages: Option<usize>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,
}
