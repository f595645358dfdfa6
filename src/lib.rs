//! Distributed Sort Library
//!
//! A fixed set of nodes, each holding a shard of fixed-size records, redistributes the
//! records by key range so that every record lands on the one node that owns its range,
//! then each node writes its records sorted by key.
//!
//! ## Architecture Modules
//! - **`membership`**: The static cluster topology loaded from YAML.
//! - **`storage`**: Records, the key-range partition function, the in-memory record
//!   store and shard file I/O.
//! - **`exchange`**: The shuffle itself: fixed-size framing, one sender per peer and a
//!   single receiver fanning in every peer's stream.
//! - **`coordinator`**: The per-node state machine tying the pieces together.
//! - **`error`**: The `SortError` taxonomy shared by all of the above.

pub mod coordinator;
pub mod error;
pub mod exchange;
pub mod membership;
pub mod storage;
