//! Shuffle Exchange Module
//!
//! Moves every record to the node that owns its key range.
//!
//! ## Core Concepts
//! - **Fan-out**: One `sender` session per peer, each with its own connection and its own
//!   scan of the local records. Records a node owns itself never leave it.
//! - **Fan-in**: A single `receiver` listener with one reader task per inbound connection,
//!   all appending to the node's `RecordStore`.
//! - **Framing**: Fixed-size frames (`protocol`), with a sentinel frame marking the end of
//!   each directed stream.
//!
//! Within one connection frames arrive in the order they were sent. Across connections
//! there is no ordering, which the final sort makes irrelevant.

pub mod protocol;
pub mod receiver;
pub mod sender;
