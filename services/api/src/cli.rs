use crate::demo::{run_demo, DemoArgs};
use crate::server::{self, SyncArgs};
use clap::{Args, Parser, Subcommand};
use inclinic::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "In-clinic Sharing Service",
    about = "Run the in-clinic collateral sharing service and its reporting migration",
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
    /// Move recorded activity events into the reporting store once and exit
    SyncReporting(SyncArgs),
    /// Walk a share through issue, verify, land, track, and sync against in-memory stores
    Demo(DemoArgs),
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
        Command::SyncReporting(args) => server::run_sync_once(args).await,
        Command::Demo(args) => run_demo(args),
    }
}
