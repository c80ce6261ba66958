use crate::demo::{run_assess, run_demo, run_tables_lint, AssessArgs, DemoArgs, TablesLintArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use care_ai::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Care Level Orchestrator",
    about = "Run the care-level decision service and its tooling from the command line",
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
    /// Evaluate one intake CSV export and print the recommendation
    Assess(AssessArgs),
    /// Inspect the engine tables before deployment
    Tables {
        #[command(subcommand)]
        command: TablesCommand,
    },
    /// Run an end-to-end CLI demo covering intake and evaluation
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum TablesCommand {
    /// Validate the tables and lint every rule condition
    Lint(TablesLintArgs),
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
        Command::Assess(args) => run_assess(args),
        Command::Tables {
            command: TablesCommand::Lint(args),
        } => run_tables_lint(args),
        Command::Demo(args) => run_demo(args),
    }
}
