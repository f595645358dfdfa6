//! Error taxonomy for a sort run.
//!
//! Every variant except `Connect` is fatal to the run. `Connect` is only
//! surfaced by a single dial attempt and is retried by the sender.

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

use crate::membership::types::NodeId;

pub type Result<T> = std::result::Result<T, SortError>;

#[derive(Debug, Error)]
pub enum SortError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to bind {addr}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to connect to {addr}: {reason}")]
    Connect { addr: String, reason: String },

    #[error("gave up connecting to {addr} after {attempts} attempts")]
    ConnectExhausted { addr: String, attempts: u32 },

    #[error("short read from {peer}: got {got} of {expected} frame bytes")]
    ShortRead {
        peer: String,
        got: usize,
        expected: usize,
    },

    #[error("unknown control byte {byte:#04x} from {peer}")]
    UnknownControlByte { peer: String, byte: u8 },

    #[error("peer {peer} disconnected after {records} records without end-of-stream")]
    PeerDisconnected { peer: SocketAddr, records: u64 },

    #[error("send to node {node} failed")]
    Send {
        node: NodeId,
        #[source]
        source: Box<SortError>,
    },

    #[error("shard {} is {len} bytes, not a multiple of {record_len}", .path.display())]
    MalformedShard {
        path: PathBuf,
        len: u64,
        record_len: usize,
    },

    #[error("record store is sealed")]
    StoreSealed,

    #[error("receiver stopped before all peers finished")]
    ReceiverClosed,

    #[error("task failed: {0}")]
    TaskFailed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SortError {
    /// Whether the error came from a peer's byte stream rather than local state.
    pub fn is_stream_corruption(&self) -> bool {
        matches!(
            self,
            SortError::ShortRead { .. }
                | SortError::UnknownControlByte { .. }
                | SortError::PeerDisconnected { .. }
        )
    }

    /// Whether a dial attempt may be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SortError::Connect { .. })
    }
}

impl From<tokio::task::JoinError> for SortError {
    fn from(err: tokio::task::JoinError) -> Self {
        SortError::TaskFailed(err.to_string())
    }
}
