use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

use super::config::ExchangeConfig;
use crate::exchange::receiver::PeerReceipt;
use crate::exchange::sender::SendSummary;
use crate::membership::types::{NodeId, Topology};

/// Lifecycle of one node's run. Phases only move forward.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    /// Topology and identity are being validated.
    Init,
    /// The receiver is bound and accepting. Must precede any sender.
    Listening,
    /// The local shard is in memory.
    Loaded,
    /// Senders are streaming and the receiver is collecting.
    Exchanging,
    /// Every send session finished and every peer's sentinel arrived.
    Collected,
    /// The sealed store is sorted by key.
    Sorted,
    /// Output handed to the writer.
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Everything one node needs for a run.
#[derive(Debug, Clone)]
pub struct SortJob {
    pub node_id: NodeId,
    pub input: PathBuf,
    pub output: PathBuf,
    pub topology: Topology,
    pub exchange: ExchangeConfig,
}

/// Record counts for a finished run.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SortReport {
    pub node_id: NodeId,
    /// Records read from the local shard.
    pub loaded: usize,
    /// Local records this node owns, kept without a network hop.
    pub retained: usize,
    pub sent_per_peer: Vec<SendSummary>,
    /// Records received from all peers.
    pub received: u64,
    /// Per inbound connection, ordered by peer address.
    pub received_per_peer: Vec<PeerReceipt>,
    /// Records in the sorted output file.
    pub written: usize,
}

impl SortReport {
    pub fn total_sent(&self) -> u64 {
        self.sent_per_peer.iter().map(|s| s.records).sum()
    }
}
