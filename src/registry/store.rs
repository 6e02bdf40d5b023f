//! Persisted registry table.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::registry::node::{Node, Role, SyncState};

/// On-disk row. `is_self` is per-process and never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredNode {
    sequence_number: u64,
    name: String,
    connection_target: String,
    role: Role,
    sync_state: SyncState,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredTable {
    next_sequence: u64,
    nodes: Vec<StoredNode>,
}

/// Registry rows plus the sequence counter, ordered by sequence number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryTable {
    pub next_sequence: u64,
    pub nodes: Vec<Node>,
}

impl Default for RegistryTable {
    fn default() -> Self {
        Self {
            next_sequence: 1,
            nodes: Vec::new(),
        }
    }
}

impl RegistryTable {
    pub fn primary(&self) -> Option<&Node> {
        self.nodes.iter().find(|n| n.is_primary())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.iter().any(|n| n.name == name)
    }

    /// Append a row with the next sequence number.
    pub fn insert(&mut self, name: &str, target: &str, role: Role, sync_state: SyncState) -> Node {
        let node = Node {
            sequence_number: self.next_sequence,
            name: name.to_string(),
            connection_target: target.to_string(),
            role,
            sync_state,
            is_self: false,
        };
        self.next_sequence += 1;
        self.nodes.push(node.clone());
        node
    }
}

/// JSON file holding the registry table.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read the table. A missing file is an empty registry.
    pub fn load(&self) -> Result<RegistryTable> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(RegistryTable::default()),
            Err(e) => return Err(e.into()),
        };
        let stored: StoredTable = serde_json::from_slice(&bytes)
            .map_err(|e| Error::Registry(format!("{}: {}", self.path.display(), e)))?;

        let mut nodes: Vec<Node> = stored
            .nodes
            .into_iter()
            .map(|row| Node {
                sequence_number: row.sequence_number,
                name: row.name,
                connection_target: row.connection_target,
                role: row.role,
                sync_state: row.sync_state,
                is_self: false,
            })
            .collect();
        nodes.sort_by_key(|n| n.sequence_number);

        if let Some(last) = nodes.last() {
            if last.sequence_number >= stored.next_sequence {
                return Err(Error::Registry(format!(
                    "sequence counter {} behind row {}",
                    stored.next_sequence, last.sequence_number
                )));
            }
        }

        Ok(RegistryTable {
            next_sequence: stored.next_sequence,
            nodes,
        })
    }

    /// Write the table atomically (temp file + rename).
    pub fn save(&self, table: &RegistryTable) -> Result<()> {
        let stored = StoredTable {
            next_sequence: table.next_sequence,
            nodes: table
                .nodes
                .iter()
                .map(|n| StoredNode {
                    sequence_number: n.sequence_number,
                    name: n.name.clone(),
                    connection_target: n.connection_target.clone(),
                    role: n.role,
                    sync_state: n.sync_state,
                })
                .collect(),
        };

        let bytes = serde_json::to_vec_pretty(&stored)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
