//! Shuffle Receiver
//!
//! Listens on the node's declared address and fans in every peer's stream.
//!
//! ## Responsibilities
//! - **Accepting**: One accept loop owns the listener and a `JoinSet` with one reader
//!   task per accepted connection.
//! - **Reading**: Each reader performs full-frame reads, appending data frames to the
//!   shared `RecordStore` in the order the peer sent them.
//! - **Termination**: A sentinel frame completes a connection. Readers report completion
//!   (or a fatal stream error) over a channel, and `await_all_peers` counts them.
//!
//! Completion is only reported after every earlier frame on that connection has been
//! appended, so once `expected` completions have been seen no data is still in flight.

use dashmap::DashMap;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::BufReader;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};

use super::protocol::{FRAME_LEN, Frame, read_frame};
use crate::error::{Result, SortError};
use crate::storage::memory::RecordStore;

const READ_BUFFER_FRAMES: usize = 512;
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// What the receiver has seen from one inbound connection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeerProgress {
    pub records: u64,
    pub finished: bool,
}

/// Records delivered by one finished inbound connection.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PeerReceipt {
    pub peer: SocketAddr,
    pub records: u64,
}

/// Totals returned once every expected peer has finished.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReceiveSummary {
    pub peers: usize,
    pub records: u64,
    /// One entry per finished connection, ordered by peer address.
    pub per_peer: Vec<PeerReceipt>,
}

#[derive(Debug)]
enum PeerEvent {
    Finished { peer: SocketAddr, records: u64 },
    Failed(SortError),
}

pub struct Receiver {
    local_addr: SocketAddr,
    events: mpsc::UnboundedReceiver<PeerEvent>,
    connections: Arc<DashMap<SocketAddr, PeerProgress>>,
    accept_handle: JoinHandle<()>,
    completed: usize,
    received: u64,
}

impl Receiver {
    /// Binds `host:port` and starts accepting. A bind failure is fatal for the run.
    pub async fn start(host: &str, port: u16, store: Arc<RecordStore>) -> Result<Self> {
        let listener = TcpListener::bind((host, port))
            .await
            .map_err(|source| SortError::Bind {
                addr: format!("{}:{}", host, port),
                source,
            })?;
        let local_addr = listener.local_addr()?;

        let (tx, events) = mpsc::unbounded_channel();
        let connections = Arc::new(DashMap::new());

        let accept_handle = {
            let connections = connections.clone();
            tokio::spawn(async move {
                accept_loop(listener, store, connections, tx).await;
            })
        };

        tracing::info!("Receiver listening on {}", local_addr);

        Ok(Self {
            local_addr,
            events,
            connections,
            accept_handle,
            completed: 0,
            received: 0,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Blocks until `expected` end-of-stream markers have been observed in total.
    ///
    /// Returns the first fatal connection error instead of waiting on a peer that
    /// can no longer finish. There is no timeout.
    pub async fn await_all_peers(&mut self, expected: usize) -> Result<ReceiveSummary> {
        while self.completed < expected {
            match self.events.recv().await {
                Some(PeerEvent::Finished { peer, records }) => {
                    self.completed += 1;
                    self.received += records;
                    tracing::info!(
                        "Peer {} finished after {} records ({}/{} peers done)",
                        peer,
                        records,
                        self.completed,
                        expected
                    );
                }
                Some(PeerEvent::Failed(err)) => {
                    tracing::error!("Inbound stream failed: {}", err);
                    self.log_unfinished(expected);
                    return Err(err);
                }
                None => {
                    self.log_unfinished(expected);
                    return Err(SortError::ReceiverClosed);
                }
            }
        }

        let mut per_peer: Vec<PeerReceipt> = self
            .connections
            .iter()
            .filter(|entry| entry.value().finished)
            .map(|entry| PeerReceipt {
                peer: *entry.key(),
                records: entry.value().records,
            })
            .collect();
        per_peer.sort_by_key(|receipt| receipt.peer);

        Ok(ReceiveSummary {
            peers: self.completed,
            records: self.received,
            per_peer,
        })
    }

    fn log_unfinished(&self, expected: usize) {
        tracing::warn!(
            "{} of {} peers finished before the receive side failed",
            self.completed,
            expected
        );
        for entry in self.connections.iter().filter(|entry| !entry.value().finished) {
            tracing::warn!(
                "Connection from {} unfinished after {} records",
                entry.key(),
                entry.value().records
            );
        }
    }

    /// Stops accepting and aborts every reader task, releasing the port.
    pub fn shutdown(self) {
        tracing::debug!("Shutting down receiver on {}", self.local_addr);
        self.accept_handle.abort();
    }
}

impl Drop for Receiver {
    fn drop(&mut self) {
        self.accept_handle.abort();
    }
}

async fn accept_loop(
    listener: TcpListener,
    store: Arc<RecordStore>,
    connections: Arc<DashMap<SocketAddr, PeerProgress>>,
    tx: mpsc::UnboundedSender<PeerEvent>,
) {
    // Dropping this set (when the loop is aborted) aborts every reader.
    let mut readers = JoinSet::new();

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    tracing::info!("Accepted connection from {}", peer);
                    connections.insert(peer, PeerProgress::default());

                    let store = store.clone();
                    let connections = connections.clone();
                    let tx = tx.clone();
                    readers.spawn(async move {
                        let outcome = read_connection(stream, peer, &store, &connections).await;
                        let event = match outcome {
                            Ok(Some(records)) => PeerEvent::Finished { peer, records },
                            Ok(None) => return,
                            Err(err) => PeerEvent::Failed(err),
                        };
                        let _ = tx.send(event);
                    });
                }
                Err(e) => {
                    tracing::warn!("Failed to accept connection: {}", e);
                    tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                }
            },
            Some(joined) = readers.join_next(), if !readers.is_empty() => {
                if let Err(e) = joined
                    && e.is_panic()
                {
                    let _ = tx.send(PeerEvent::Failed(SortError::from(e)));
                }
            }
        }
    }
}

/// Reads one connection until its sentinel.
///
/// Returns `Ok(None)` for a connection that closed before sending a single byte.
/// Senders flush their first frame as soon as it is written, so such a close is a
/// dial whose timeout fired after the handshake completed, not a shuffle stream.
async fn read_connection(
    stream: TcpStream,
    peer: SocketAddr,
    store: &RecordStore,
    connections: &DashMap<SocketAddr, PeerProgress>,
) -> Result<Option<u64>> {
    let label = peer.to_string();
    let mut reader = BufReader::with_capacity(FRAME_LEN * READ_BUFFER_FRAMES, stream);
    let mut records = 0u64;

    loop {
        match read_frame(&mut reader, &label).await? {
            Some(Frame::Data(record)) => {
                store.append(record)?;
                records += 1;
                if let Some(mut progress) = connections.get_mut(&peer) {
                    progress.records = records;
                }
            }
            Some(Frame::EndOfStream) => {
                if let Some(mut progress) = connections.get_mut(&peer) {
                    progress.finished = true;
                }
                tracing::debug!("End of stream from {} after {} records", peer, records);
                return Ok(Some(records));
            }
            None if records == 0 => {
                tracing::warn!(
                    "Connection from {} closed without sending a frame, treating it as an \
                     abandoned dial",
                    peer
                );
                connections.remove(&peer);
                return Ok(None);
            }
            None => return Err(SortError::PeerDisconnected { peer, records }),
        }
    }
}
