//! Graph snapshots for crash recovery and offline inspection
//!
//! Format: one JSON document holding a version, the root key and every
//! node sorted by key. Writes go to a sibling `.tmp` file that is renamed
//! over the target, so a crash mid-write leaves the previous snapshot.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use checkers_core::BoardKey;
use serde::{Deserialize, Serialize};

use crate::graph::StateGraph;
use crate::node::SearchNode;

const SNAPSHOT_VERSION: u32 = 1;

/// Snapshot errors
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("snapshot io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed snapshot: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported snapshot version {0}")]
    UnsupportedVersion(u32),

    #[error("snapshot root {0} is not among its nodes")]
    MissingRoot(BoardKey),
}

/// Serializable image of a [`StateGraph`]
#[derive(Debug, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    pub root: BoardKey,
    pub nodes: Vec<SearchNode>,
}

impl Snapshot {
    pub fn from_graph(graph: &StateGraph) -> Self {
        let mut nodes: Vec<SearchNode> = graph.nodes().cloned().collect();
        nodes.sort_by_key(|n| n.key);
        Self {
            version: SNAPSHOT_VERSION,
            root: graph.root(),
            nodes,
        }
    }

    pub fn into_graph(self) -> Result<StateGraph, SnapshotError> {
        let root = self.root;
        StateGraph::from_nodes(root, self.nodes).ok_or(SnapshotError::MissingRoot(root))
    }

    /// Write atomically; returns the number of nodes written. A failed
    /// write leaves the previous snapshot and no `.tmp` file behind.
    pub fn save(&self, path: &Path) -> Result<usize, SnapshotError> {
        let io_err = |source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let tmp = path.with_extension("tmp");
        let result = self
            .write_to(&tmp)
            .and_then(|()| fs::rename(&tmp, path).map_err(io_err));
        if result.is_err() {
            let _ = fs::remove_file(&tmp);
        }
        result.map(|()| self.nodes.len())
    }

    fn write_to(&self, path: &Path) -> Result<(), SnapshotError> {
        let io_err = |source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        };
        let file = File::create(path).map_err(io_err)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, self)?;
        writer.flush().map_err(io_err)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let file = File::open(path).map_err(|source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let snapshot: Snapshot = serde_json::from_reader(BufReader::new(file))?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion(snapshot.version));
        }
        Ok(snapshot)
    }
}

/// Snapshot the graph to `path`
pub fn save_graph(graph: &StateGraph, path: &Path) -> Result<usize, SnapshotError> {
    Snapshot::from_graph(graph).save(path)
}

/// Load a graph from a snapshot file
pub fn load_graph(path: &Path) -> Result<StateGraph, SnapshotError> {
    Snapshot::load(path)?.into_graph()
}
