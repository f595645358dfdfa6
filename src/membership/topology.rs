//! Topology Loader
//!
//! Reads the cluster definition from YAML. The document lists every server with
//! its id, host and port:
//!
//! ```yaml
//! servers:
//!   - serverId: 0
//!     host: 127.0.0.1
//!     port: "8080"
//!   - serverId: 1
//!     host: 127.0.0.1
//!     port: 8081
//! ```
//!
//! Ports are accepted both quoted and bare. Any problem with the file is a
//! `SortError::Config`, which aborts the run before anything binds.

use serde::Deserialize;
use std::path::Path;

use super::types::{NodeId, Topology, TopologyEntry};
use crate::error::{Result, SortError};
use crate::storage::partitioner::MAX_NODES;

#[derive(Debug, Deserialize)]
struct ServerConfigs {
    servers: Vec<ServerConfig>,
}

#[derive(Debug, Deserialize)]
struct ServerConfig {
    #[serde(rename = "serverId")]
    server_id: usize,
    host: String,
    port: PortValue,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PortValue {
    Number(u64),
    Text(String),
}

impl PortValue {
    fn resolve(&self, server_id: usize) -> Result<u16> {
        let parsed = match self {
            PortValue::Number(n) => u16::try_from(*n).ok(),
            PortValue::Text(s) => s.trim().parse::<u16>().ok(),
        };

        parsed.ok_or_else(|| {
            SortError::Config(format!("server {} has an invalid port {:?}", server_id, self))
        })
    }
}

/// Loads and validates the topology file at `path`.
pub fn load(path: impl AsRef<Path>) -> Result<Topology> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|e| {
        SortError::Config(format!("could not read config file {}: {}", path.display(), e))
    })?;

    let topology = parse(&contents)?;
    tracing::debug!(
        "Loaded {}-node topology from {}",
        topology.size(),
        path.display()
    );
    Ok(topology)
}

/// Parses a topology from YAML text.
pub fn parse(contents: &str) -> Result<Topology> {
    let configs: ServerConfigs = serde_yaml::from_str(contents)
        .map_err(|e| SortError::Config(format!("malformed topology: {}", e)))?;

    if configs.servers.len() > MAX_NODES {
        return Err(SortError::Config(format!(
            "topology has {} servers, at most {} are supported",
            configs.servers.len(),
            MAX_NODES
        )));
    }

    let entries = configs
        .servers
        .into_iter()
        .map(|server| {
            Ok(TopologyEntry {
                id: NodeId(server.server_id),
                port: server.port.resolve(server.server_id)?,
                host: server.host,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Topology::new(entries)
}
