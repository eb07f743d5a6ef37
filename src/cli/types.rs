//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use clap::{Parser, Subcommand};

use crate::cli::commands::{
    apply::ApplyArgs, cycle::CycleArgs, dashboard::DashboardArgs, generate::GenerateArgs,
    history::HistoryArgs, init::InitArgs, insights::InsightsArgs, patterns::PatternsArgs,
    rules::RulesArgs, run::RunArgs,
};

#[derive(Parser, Debug)]
#[command(name = "adaptest")]
#[command(about = "Adaptest - learns from test failures and adapts the suite", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Never contact the test synthesizer service
    #[arg(long, global = true)]
    pub offline: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize the data directory and default configuration
    Init(InitArgs),

    /// Failure pattern commands
    Patterns(PatternsArgs),

    /// Adaptive rule commands
    Rules(RulesArgs),

    /// Apply eligible rules to test files
    Apply(ApplyArgs),

    /// Test run history commands
    History(HistoryArgs),

    /// Analyze run history
    Insights(InsightsArgs),

    /// Show the latest run and recent trends
    Dashboard(DashboardArgs),

    /// Generate tests from user stories
    Generate(GenerateArgs),

    /// Run tests and learn from the failures
    Run(RunArgs),

    /// Run one full adaptive testing cycle
    Cycle(CycleArgs),
}
