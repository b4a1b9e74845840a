use crate::browse::{run_listings, run_statuses, ListingsArgs, StatusesArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use estate_portal::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Estate Portal",
    about = "Run the listings proxy or browse listings from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Fetch listings through a running proxy and apply browse filters
    Listings(ListingsArgs),
    /// Show the upstream listing status taxonomy
    Statuses(StatusesArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Listings(args) => run_listings(args).await,
        Command::Statuses(args) => run_statuses(args).await,
    }
}
