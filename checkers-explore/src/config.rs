//! Explorer configuration
//!
//! Level 4 - Utilities and configuration

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Order in which frontier nodes are expanded
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrontierOrder {
    /// Depth-first stack, pure enumeration
    #[default]
    Lifo,
    /// Most unbalanced positions first, ties broken by smallest key
    Priority,
}

/// Explorer configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    /// Worker threads expanding nodes
    pub workers: usize,
    pub order: FrontierOrder,
    /// Stop submitting work once the graph holds this many nodes
    pub max_nodes: Option<usize>,
    /// Nodes deeper than this are recorded but never expanded
    pub max_depth: Option<u32>,
    pub snapshot_path: Option<PathBuf>,
    pub snapshot_interval_secs: u64,
    pub log_interval_secs: u64,
    /// Attempts per node after the first failed expansion
    pub max_retries: u32,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            workers: rayon::current_num_threads(),
            order: FrontierOrder::Lifo,
            max_nodes: None,
            max_depth: None,
            snapshot_path: None,
            snapshot_interval_secs: 60,
            log_interval_secs: 10,
            max_retries: 3,
        }
    }
}

impl ExplorerConfig {
    /// Load a JSON config; missing fields take their defaults
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("reading explorer config {}", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("parsing explorer config {}", path.display()))
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_order(mut self, order: FrontierOrder) -> Self {
        self.order = order;
        self
    }

    pub fn with_max_nodes(mut self, max_nodes: usize) -> Self {
        self.max_nodes = Some(max_nodes);
        self
    }

    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    pub fn with_snapshot(mut self, path: impl Into<PathBuf>, interval_secs: u64) -> Self {
        self.snapshot_path = Some(path.into());
        self.snapshot_interval_secs = interval_secs;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}
