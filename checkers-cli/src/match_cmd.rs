//! Match command - play games between two policies
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: build_policies(), play_match(), report_results()
//! - Level 4: formatting utilities

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use tracing::info;

use checkers_core::{GameState, Policy};
use checkers_tournament::{play_match, MatchConfig, MatchResult, PolicyConfig};

use crate::{resolve_seed, PolicyArg};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct MatchArgs {
    /// First policy
    #[arg(long, value_enum, default_value = "greedy")]
    pub a: PolicyArg,

    /// Second policy
    #[arg(long, value_enum, default_value = "random")]
    pub b: PolicyArg,

    /// Memory table for the first policy (when it is `memory`)
    #[arg(long, value_name = "FILE")]
    pub a_memory: Option<PathBuf>,

    /// Memory table for the second policy (when it is `memory`)
    #[arg(long, value_name = "FILE")]
    pub b_memory: Option<PathBuf>,

    /// Number of games to play (will alternate colours)
    #[arg(long, default_value = "10")]
    pub games: usize,

    /// Maximum moves per game
    #[arg(long, default_value = "200")]
    pub max_moves: u32,

    /// Play without the mandatory capture rule
    #[arg(long)]
    pub no_capture_rule: bool,

    /// Play games one after another
    #[arg(long)]
    pub sequential: bool,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

pub fn run(args: MatchArgs, seed: Option<u64>) -> Result<()> {
    let seed = resolve_seed(seed);
    let (a, b) = build_policies(&args, seed)?;

    let mut config = MatchConfig::new(args.games).with_seed(seed);
    config.max_moves = args.max_moves;
    config.enable_should_capture_rule = !args.no_capture_rule;
    if args.sequential {
        config = config.sequential();
    }

    info!(a = a.name(), b = b.name(), games = args.games, seed, "playing match");
    let result = play_match(&a, &b, &config)?;
    report_results(&args, &a, &b, &result)
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

fn build_policies(args: &MatchArgs, seed: u64) -> Result<(Policy, Policy)> {
    let a = policy_config(args.a, args.a_memory.clone()).build(seed)?;
    let b = policy_config(args.b, args.b_memory.clone()).build(seed.wrapping_add(1))?;
    Ok((a, b))
}

fn report_results(args: &MatchArgs, a: &Policy, b: &Policy, result: &MatchResult) -> Result<()> {
    if args.json {
        print_json_results(a, b, result)
    } else {
        print_text_results(a, b, result);
        Ok(())
    }
}

// ============================================================================
// LEVEL 4 - UTILITIES
// ============================================================================

fn policy_config(kind: PolicyArg, memory: Option<PathBuf>) -> PolicyConfig {
    match kind {
        PolicyArg::Random => PolicyConfig::random(),
        PolicyArg::Greedy => PolicyConfig::greedy(),
        PolicyArg::Memory => PolicyConfig::memory(memory),
    }
}

fn result_label(result: GameState) -> &'static str {
    match result {
        GameState::PositiveWins => "positive",
        GameState::NegativeWins => "negative",
        GameState::Draw => "draw",
        GameState::NotOver => "unfinished",
    }
}

fn print_json_results(a: &Policy, b: &Policy, result: &MatchResult) -> Result<()> {
    #[derive(serde::Serialize)]
    struct JsonResults {
        a: &'static str,
        b: &'static str,
        a_wins: u32,
        b_wins: u32,
        draws: u32,
        unfinished: u32,
        a_win_rate: f32,
        avg_moves: f32,
        total_captures: u32,
        games: Vec<JsonGame>,
    }

    #[derive(serde::Serialize)]
    struct JsonGame {
        result: &'static str,
        moves: usize,
        captures: u32,
        promotions: u32,
    }

    let output = JsonResults {
        a: a.name(),
        b: b.name(),
        a_wins: result.a_wins,
        b_wins: result.b_wins,
        draws: result.draws,
        unfinished: result.unfinished,
        a_win_rate: result.a_win_rate(),
        avg_moves: result.avg_moves,
        total_captures: result.total_captures,
        games: result
            .game_outcomes
            .iter()
            .map(|g| JsonGame {
                result: result_label(g.result),
                moves: g.length(),
                captures: g.captures,
                promotions: g.promotions,
            })
            .collect(),
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_text_results(a: &Policy, b: &Policy, result: &MatchResult) {
    println!("\n=== Match Results ===");
    println!("A ({}) wins: {} ({:.1}%)", a, result.a_wins, result.a_win_rate() * 100.0);
    println!("B ({}) wins: {} ({:.1}%)", b, result.b_wins, result.b_win_rate() * 100.0);
    println!("Draws: {} ({:.1}%), {} unfinished", result.draws, result.draw_rate() * 100.0, result.unfinished);
    println!("Average game length: {:.1} moves", result.avg_moves);
    println!("Captures: {}", result.total_captures);
    println!("Score for A: {:.1}/{}", result.score_for_a(), result.games_played);
}
