use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, SortError};

/// Identity of a node in the run, also its partition index.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single member of the cluster and the address its receiver binds to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TopologyEntry {
    pub id: NodeId,
    pub host: String,
    pub port: u16,
}

impl TopologyEntry {
    /// `host:port`, for logging and error messages.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// The ordered, validated node list. `entries[i].id == NodeId(i)` always holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    entries: Vec<TopologyEntry>,
}

impl Topology {
    /// Builds a topology from entries in any order, checking that the ids are
    /// exactly `0..N` with no gaps or duplicates.
    pub fn new(mut entries: Vec<TopologyEntry>) -> Result<Self> {
        if entries.is_empty() {
            return Err(SortError::Config("topology has no servers".to_string()));
        }

        entries.sort_by_key(|entry| entry.id);

        for (expected, entry) in entries.iter().enumerate() {
            if entry.id.0 != expected {
                return Err(SortError::Config(format!(
                    "server ids must be dense and unique starting at 0: expected {}, found {}",
                    expected, entry.id
                )));
            }
            if entry.host.trim().is_empty() {
                return Err(SortError::Config(format!("server {} has an empty host", entry.id)));
            }
            if entry.port == 0 {
                return Err(SortError::Config(format!("server {} has port 0", entry.id)));
            }
        }

        Ok(Self { entries })
    }

    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn address_of(&self, id: NodeId) -> Result<&TopologyEntry> {
        self.entries.get(id.0).ok_or_else(|| {
            SortError::Config(format!(
                "node id {} is out of range for a {}-node topology",
                id,
                self.entries.len()
            ))
        })
    }

    /// Every entry except `id`, in id order.
    pub fn peers_of(&self, id: NodeId) -> impl Iterator<Item = &TopologyEntry> {
        self.entries.iter().filter(move |entry| entry.id != id)
    }
}
