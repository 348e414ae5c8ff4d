//! Train command - improve a memory policy by self-play against an opponent

use std::path::PathBuf;

use anyhow::{Context, Result};
use checkers_core::MemoryPolicy;
use checkers_tournament::{train, PolicyConfig, TrainConfig};
use clap::Args;
use tracing::info;

use crate::{resolve_seed, PolicyArg};

#[derive(Args)]
pub struct TrainArgs {
    /// Memory table to train (created if missing, overwritten on success)
    #[arg(long, value_name = "FILE")]
    pub memory: PathBuf,

    /// Additional memory tables summed into the starting table
    #[arg(long, value_name = "FILE")]
    pub merge: Vec<PathBuf>,

    /// Opponent policy
    #[arg(long, value_enum, default_value = "random")]
    pub opponent: PolicyArg,

    /// Memory table for a `memory` opponent
    #[arg(long, value_name = "FILE")]
    pub opponent_memory: Option<PathBuf>,

    /// Training episodes
    #[arg(long, default_value = "1000")]
    pub episodes: usize,

    /// Maximum moves per episode
    #[arg(long, default_value = "200")]
    pub max_moves: u32,

    /// Episodes between progress lines
    #[arg(long, default_value = "100")]
    pub log_interval: usize,
}

pub fn run(args: TrainArgs, seed: Option<u64>) -> Result<()> {
    let seed = resolve_seed(seed);
    let mut learner = load_learner(&args, seed)?;
    let mut opponent = PolicyConfig {
        kind: args.opponent.into(),
        memory_path: args.opponent_memory.clone(),
        ..Default::default()
    }
    .build(seed.wrapping_add(1))?;

    let config = TrainConfig {
        episodes: args.episodes,
        max_moves: args.max_moves,
        seed,
        log_interval: args.log_interval,
    };
    info!(
        opponent = opponent.name(),
        episodes = config.episodes,
        start_size = learner.len(),
        seed,
        "training memory policy"
    );

    let report = train(&mut learner, &mut opponent, &config)?;
    learner
        .save(&args.memory)
        .with_context(|| format!("failed to save {}", args.memory.display()))?;

    println!("\n=== Training Results ===");
    println!("Episodes:      {}", report.episodes);
    println!(
        "Learner wins:  {} ({:.1}%)",
        report.learner_wins,
        report.learner_win_rate() * 100.0
    );
    println!("Opponent wins: {}", report.opponent_wins);
    println!("Draws:         {}", report.draws);
    println!("Table size:    {}", report.table_size);
    println!("Saved to {}", args.memory.display());
    Ok(())
}

fn load_learner(args: &TrainArgs, seed: u64) -> Result<MemoryPolicy> {
    let base = if args.memory.exists() {
        MemoryPolicy::load(&args.memory, seed)?
    } else {
        MemoryPolicy::new(seed)
    };
    if args.merge.is_empty() {
        return Ok(base);
    }

    let mut tables = vec![base];
    for path in &args.merge {
        tables.push(MemoryPolicy::load(path, seed)?);
    }
    Ok(MemoryPolicy::combine(&tables, seed))
}
