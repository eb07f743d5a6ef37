//! Adaptest CLI entry point.

use anyhow::Result;
use clap::Parser;
use tracing::debug;

use adaptest::cli::commands;
use adaptest::cli::{AppContext, Cli, Commands};
use adaptest::infrastructure::config::ConfigLoader;
use adaptest::infrastructure::logging::LoggerImpl;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json = cli.json;

    if let Err(err) = run(cli).await {
        adaptest::cli::handle_error(err, json);
    }
}

async fn run(cli: Cli) -> Result<()> {
    // init lays out the config, so it runs before one can be loaded
    let command = match cli.command {
        Commands::Init(args) => return commands::init::execute(args, cli.json).await,
        command => command,
    };

    let config = ConfigLoader::load()?;
    let _logger = LoggerImpl::init(&config.logging)?;
    debug!(data_dir = %config.data_dir, offline = cli.offline, "Configuration loaded");

    let ctx = AppContext::from_config(config, cli.offline)?;
    match command {
        Commands::Init(args) => commands::init::execute(args, cli.json).await,
        Commands::Patterns(args) => commands::patterns::execute(args, &ctx, cli.json).await,
        Commands::Rules(args) => commands::rules::execute(args, &ctx, cli.json).await,
        Commands::Apply(args) => commands::apply::execute(args, &ctx, cli.json).await,
        Commands::History(args) => commands::history::execute(args, &ctx, cli.json).await,
        Commands::Insights(args) => commands::insights::execute(args, &ctx, cli.json).await,
        Commands::Dashboard(args) => commands::dashboard::execute(args, &ctx, cli.json).await,
        Commands::Generate(args) => commands::generate::execute(args, &ctx, cli.json).await,
        Commands::Run(args) => commands::run::execute(args, &ctx, cli.json).await,
        Commands::Cycle(args) => commands::cycle::execute(args, &ctx, cli.json).await,
    }
}
