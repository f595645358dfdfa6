//! Sort Coordinator Module
//!
//! Drives one node through a complete distributed sort run.
//!
//! ## Workflow
//! 1. **Init**: Validate the topology and this node's identity.
//! 2. **Listening**: Bind the shuffle receiver on the node's declared address.
//! 3. **Loaded**: Read the local shard into memory.
//! 4. **Exchanging**: Keep self-owned records, stream the rest to their owners and
//!    collect what the peers send.
//! 5. **Collected / Sorted / Done**: Seal the store, sort by key, write the output file.
//!
//! ## Submodules
//! - **`node`**: The `SortNode` state machine.
//! - **`config`**: Connection tunables with environment overrides.
//! - **`types`**: Phases, the job description and the run report.

pub mod config;
pub mod node;
pub mod types;
