//! Local Record Storage Module
//!
//! Everything a node keeps on its own side of the exchange.
//!
//! ## Core Concepts
//! - **Records**: Fixed 100-byte blocks whose first 10 bytes are the sort key.
//! - **Partitioning**: `Partitioner` maps a record's first key byte to the node that owns
//!   its key range.
//! - **Store**: `RecordStore` collects local and received records behind one lock and is
//!   sealed before sorting.
//! - **Shards**: Reading the input shard and writing the sorted output file.

pub mod memory;
pub mod partitioner;
pub mod record;
pub mod shard;
