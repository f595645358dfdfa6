use super::record::Record;
use crate::error::{Result, SortError};
use crate::membership::types::NodeId;

/// Largest cluster the first key byte can address.
pub const MAX_NODES: usize = 256;

/// Key-range partitioning over the high-order bits of the first key byte.
///
/// With `width = ceil(log2(n))` the byte is shifted right by `8 - width`, giving
/// `2^width >= n` equal ranges. When `n` is not a power of two the top ranges are
/// folded into the last node, so ownership stays contiguous and ordered: every key
/// owned by node `i` sorts before every key owned by node `i + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partitioner {
    num_nodes: usize,
    shift: u32,
}

impl Partitioner {
    pub fn new(num_nodes: usize) -> Result<Self> {
        if num_nodes == 0 || num_nodes > MAX_NODES {
            return Err(SortError::Config(format!(
                "cluster size {} is outside the supported range 1..={}",
                num_nodes, MAX_NODES
            )));
        }

        Ok(Self {
            num_nodes,
            shift: 8 - partition_width(num_nodes),
        })
    }

    pub fn shift(&self) -> u32 {
        self.shift
    }

    pub fn owner_of_byte(&self, byte: u8) -> NodeId {
        let bucket = (u32::from(byte) >> self.shift) as usize;
        NodeId(bucket.min(self.num_nodes - 1))
    }

    pub fn owner(&self, record: &Record) -> NodeId {
        self.owner_of_byte(record.first_key_byte())
    }
}

/// Number of high-order bits needed so that `2^width >= num_nodes`.
pub fn partition_width(num_nodes: usize) -> u32 {
    if num_nodes <= 1 {
        0
    } else {
        usize::BITS - (num_nodes - 1).leading_zeros()
    }
}
