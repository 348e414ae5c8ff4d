//! Inspect command - browse a saved state graph

use std::path::PathBuf;

use anyhow::{Context, Result};
use checkers_core::{BoardKey, Move};
use checkers_explore::{load_graph, SearchNode, StateGraph};
use clap::Args;

#[derive(Args)]
pub struct InspectArgs {
    /// Snapshot file written by `explore`
    snapshot: PathBuf,

    /// Node key (defaults to the root)
    #[arg(short, long)]
    key: Option<u64>,

    /// Hide the boards of parents and children
    #[arg(long)]
    brief: bool,
}

pub fn run(args: InspectArgs) -> Result<()> {
    let graph = load_graph(&args.snapshot)
        .with_context(|| format!("failed to load {}", args.snapshot.display()))?;
    let key = args.key.map(BoardKey).unwrap_or_else(|| graph.root());
    let node = graph
        .get(key)
        .with_context(|| format!("node {} is not in the graph", key))?;

    println!(
        "Graph: {} nodes, {} decided, root {}",
        graph.len(),
        graph.decided_count(),
        graph.root()
    );
    println!();
    print_node(node)?;

    println!("\n--- Parents ({}) ---", graph.parents(key).len());
    for parent in graph.parents(key) {
        print_neighbour(&graph, *parent, None, args.brief)?;
    }

    match graph.children(key) {
        None => println!("\n--- Children: not expanded ---"),
        Some(children) => {
            println!("\n--- Children ({}) ---", children.len());
            let moves = moves_to_children(key)?;
            for child in children {
                let mv = moves.iter().find(|(k, _)| k == child).map(|(_, mv)| *mv);
                print_neighbour(&graph, *child, mv, args.brief)?;
            }
        }
    }
    Ok(())
}

fn print_node(node: &SearchNode) -> Result<()> {
    let board = node.key.to_board()?;
    println!("=== Node {} ===", node.key);
    println!("Depth:     {}", node.depth);
    println!("To move:   {}", if node.turn_sign > 0 { "positive" } else { "negative" });
    println!("State:     {:?}", node.game_state);
    println!("Outcome:   {}", node.outcome.map_or("undecided".to_string(), |o| format!("{:?}", o)));
    println!(
        "Children:  {} positive wins, {} negative wins, {} draws decided",
        node.stats.positive_wins, node.stats.negative_wins, node.stats.draws
    );
    println!("{}", board);
    Ok(())
}

fn print_neighbour(graph: &StateGraph, key: BoardKey, mv: Option<Move>, brief: bool) -> Result<()> {
    let outcome = graph
        .get(key)
        .and_then(|n| n.outcome)
        .map_or("undecided".to_string(), |o| format!("{:?}", o));
    match mv {
        Some(mv) => println!("{} via {} [{}]", key, mv, outcome),
        None => println!("{} [{}]", key, outcome),
    }
    if !brief {
        println!("{}", key.to_board()?);
    }
    Ok(())
}

/// Legal moves of `key` paired with the keys they lead to
fn moves_to_children(key: BoardKey) -> Result<Vec<(BoardKey, Move)>> {
    let board = key.to_board()?;
    Ok(board
        .legal_moves()
        .into_iter()
        .map(|mv| {
            let mut next = board.clone();
            next.apply(mv);
            (BoardKey::from_board(&next), mv)
        })
        .collect())
}
