//! Explore command - build the state graph of 6x6 checkers

use std::path::PathBuf;
use std::sync::atomic::Ordering;

use anyhow::{Context, Result};
use checkers_core::{Board, GameState};
use checkers_explore::{ExploreSummary, Explorer, ExplorerConfig, FrontierOrder};
use clap::{Args, ValueEnum};
use tracing::{info, warn};

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OrderArg {
    /// Depth-first: newest discoveries first
    Lifo,
    /// Most lopsided material first
    Priority,
}

impl From<OrderArg> for FrontierOrder {
    fn from(arg: OrderArg) -> Self {
        match arg {
            OrderArg::Lifo => FrontierOrder::Lifo,
            OrderArg::Priority => FrontierOrder::Priority,
        }
    }
}

#[derive(Args)]
pub struct ExploreArgs {
    /// Explorer config file (JSON); flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Worker threads
    #[arg(short, long)]
    workers: Option<usize>,

    /// Frontier order
    #[arg(long, value_enum)]
    order: Option<OrderArg>,

    /// Stop after this many nodes
    #[arg(long)]
    max_nodes: Option<usize>,

    /// Do not expand nodes deeper than this
    #[arg(long)]
    max_depth: Option<u32>,

    /// Snapshot file
    #[arg(short, long)]
    snapshot: Option<PathBuf>,

    /// Seconds between snapshots
    #[arg(long)]
    snapshot_interval: Option<u64>,

    /// Continue from the snapshot file instead of the initial position
    #[arg(long)]
    resume: bool,

    /// Play without the mandatory capture rule
    #[arg(long)]
    no_capture_rule: bool,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(args: ExploreArgs) -> Result<()> {
    let config = build_config(&args)?;
    info!(
        workers = config.workers,
        order = ?config.order,
        max_nodes = ?config.max_nodes,
        max_depth = ?config.max_depth,
        "starting exploration"
    );

    let mut explorer = if args.resume {
        let path = config
            .snapshot_path
            .clone()
            .context("--resume needs a snapshot path")?;
        Explorer::resume(&path, config)?
    } else {
        let mut board = Board::new();
        board.set_enable_should_capture_rule(!args.no_capture_rule);
        Explorer::new(&board, config)
    };

    let stop = explorer.stop_flag();
    ctrlc::set_handler(move || {
        warn!("interrupt received, finishing in-flight jobs");
        stop.store(true, Ordering::SeqCst);
    })
    .context("failed to install Ctrl-C handler")?;

    let summary = explorer.run()?;

    if args.json {
        print_json_summary(&summary)?;
    } else {
        print_text_summary(&summary);
    }
    Ok(())
}

fn build_config(args: &ExploreArgs) -> Result<ExplorerConfig> {
    let mut config = match &args.config {
        Some(path) => ExplorerConfig::load(path)?,
        None => ExplorerConfig::default(),
    };
    if let Some(workers) = args.workers {
        config = config.with_workers(workers);
    }
    if let Some(order) = args.order {
        config = config.with_order(order.into());
    }
    if let Some(max_nodes) = args.max_nodes {
        config = config.with_max_nodes(max_nodes);
    }
    if let Some(max_depth) = args.max_depth {
        config = config.with_max_depth(max_depth);
    }
    if let Some(path) = &args.snapshot {
        config.snapshot_path = Some(path.clone());
    }
    if let Some(interval) = args.snapshot_interval {
        config.snapshot_interval_secs = interval;
    }
    Ok(config)
}

fn outcome_label(outcome: Option<GameState>) -> &'static str {
    match outcome {
        Some(GameState::PositiveWins) => "positive wins",
        Some(GameState::NegativeWins) => "negative wins",
        Some(GameState::Draw) => "draw",
        Some(GameState::NotOver) | None => "undecided",
    }
}

fn print_json_summary(summary: &ExploreSummary) -> Result<()> {
    #[derive(serde::Serialize)]
    struct JsonSummary<'a> {
        stop_reason: String,
        nodes: usize,
        decided: usize,
        frontier: usize,
        root_outcome: &'static str,
        elapsed_secs: f64,
        stats: &'a checkers_explore::ExploreStats,
    }

    let output = JsonSummary {
        stop_reason: format!("{:?}", summary.stop_reason),
        nodes: summary.nodes,
        decided: summary.decided,
        frontier: summary.frontier,
        root_outcome: outcome_label(summary.root_outcome),
        elapsed_secs: summary.stats.elapsed().as_secs_f64(),
        stats: &summary.stats,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_text_summary(summary: &ExploreSummary) {
    let stats = &summary.stats;
    println!("\n=== Exploration Summary ===");
    println!("Stopped:        {:?}", summary.stop_reason);
    println!("Nodes:          {}", summary.nodes);
    println!("Decided:        {}", summary.decided);
    println!("Frontier:       {}", summary.frontier);
    println!("Root outcome:   {}", outcome_label(summary.root_outcome));
    println!();
    println!("Expanded:       {}", stats.expanded);
    println!("Transpositions: {}", stats.transpositions);
    println!("Terminals:      {}", stats.terminals);
    println!("Retries:        {}", stats.retries);
    println!("Failures:       {}", stats.failures);
    println!("Max depth:      {}", stats.max_depth);
    println!("Elapsed:        {:.1}s ({:.0} nodes/s)", stats.elapsed().as_secs_f64(), stats.rate());
}
