use clap::{Parser, Subcommand};
use resultbook_core::config::DEFAULT_CONFIG_PATH;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "resultbook",
    version,
    about = "Store and browse saved calculation results"
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(clap::Args, Debug, Clone)]
pub struct GlobalArgs {
    /// YAML config file (optional; skipped when missing)
    #[arg(long, global = true, env = "RESULTBOOK_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// SQLite database (overrides config and RESULTBOOK_DB)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Use a throwaway in-memory database
    #[arg(long, global = true, conflicts_with = "db")]
    pub memory: bool,

    /// Output format: text | json
    #[arg(long, global = true)]
    pub format: Option<String>,

    /// tracing filter, e.g. "info" or "resultbook_core=debug"
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Map authorization output to lines and save them as a new result
    Save(SaveArgs),
    /// List an application's results, newest first
    List(AppArgs),
    /// Print the lines of one result
    Lines(ResultArgs),
    /// Make a result the active one for its application
    Activate(ActivateArgs),
    /// Print the active result id of an application
    Active(AppArgs),
    /// Render the results panel (selection list + line table)
    Show(ShowArgs),
    /// Print the id the next save would get
    NextId,
    /// Database statistics
    Stats,
    Version,
}

#[derive(clap::Args, Debug, Clone)]
pub struct AppArgs {
    #[arg(long = "app")]
    pub application_id: i64,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ResultArgs {
    #[arg(long = "result")]
    pub result_id: i64,
}

#[derive(clap::Args, Debug, Clone)]
pub struct SaveArgs {
    #[arg(long = "app")]
    pub application_id: i64,

    /// JSON array of authorization records ("-" reads stdin)
    #[arg(long)]
    pub input: PathBuf,

    #[arg(long)]
    pub label: Option<String>,

    /// Mark the result as containing summer lines
    #[arg(long)]
    pub summer: bool,

    /// Make the new result the active one
    #[arg(long)]
    pub activate: bool,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ActivateArgs {
    #[arg(long = "app")]
    pub application_id: i64,

    #[arg(long = "result")]
    pub result_id: i64,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ShowArgs {
    #[arg(long = "app")]
    pub application_id: i64,

    /// Show this result's lines instead of the default selection
    #[arg(long = "select")]
    pub select: Option<i64>,
}
