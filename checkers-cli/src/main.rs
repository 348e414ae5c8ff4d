//! Checkers CLI - Command-line interface
//!
//! Commands:
//! - explore: Build the state graph from the initial position
//! - inspect: Show a node of a saved graph with its parents and children
//! - match: Play games between two policies
//! - train: Train a memory policy against an opponent

mod explore_cmd;
mod inspect_cmd;
mod match_cmd;
mod train_cmd;

use clap::{Parser, Subcommand, ValueEnum};
use checkers_tournament::PolicyKind;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "checkers")]
#[command(about = "6x6 checkers engine, explorer and trainer")]
struct Cli {
    /// Random seed (random if omitted)
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Explore the state graph
    Explore(explore_cmd::ExploreArgs),
    /// Inspect a saved state graph
    Inspect(inspect_cmd::InspectArgs),
    /// Play a match between two policies
    Match(match_cmd::MatchArgs),
    /// Train a memory policy
    Train(train_cmd::TrainArgs),
}

/// Policy choice on the command line
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum PolicyArg {
    Random,
    Greedy,
    Memory,
}

impl From<PolicyArg> for PolicyKind {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Random => PolicyKind::Random,
            PolicyArg::Greedy => PolicyKind::Greedy,
            PolicyArg::Memory => PolicyKind::Memory,
        }
    }
}

/// Use the given seed or draw one from entropy
pub fn resolve_seed(seed: Option<u64>) -> u64 {
    seed.unwrap_or_else(|| ChaCha8Rng::from_entropy().gen())
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Explore(args) => explore_cmd::run(args),
        Commands::Inspect(args) => inspect_cmd::run(args),
        Commands::Match(args) => match_cmd::run(args, cli.seed),
        Commands::Train(args) => train_cmd::run(args, cli.seed),
    }
}
