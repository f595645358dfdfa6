//! Cluster Topology Module
//!
//! Holds the static, pre-shared membership of a sort run: every node's identity
//! and the address its receiver listens on.
//!
//! ## Core Concepts
//! - **Closed membership**: The node list is loaded once from a YAML file and never
//!   changes during the run. There is no join/leave and no failure detection.
//! - **Dense identities**: Node ids are `0..N` and double as partition indices and as
//!   positions in the topology.

pub mod topology;
pub mod types;

#[cfg(test)]
mod tests;
