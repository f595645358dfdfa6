//! Shuffle Sender
//!
//! One sender runs per destination peer. It dials the peer's receiver (retrying while
//! the peer may still be starting up), streams the records that partition to that peer
//! from its own full scan of the local shard, then writes the sentinel and closes.

use serde::Serialize;
use std::time::Duration;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::net::TcpStream;

use super::protocol::{FRAME_LEN, Frame, write_frame};
use crate::error::{Result, SortError};
use crate::membership::types::{NodeId, TopologyEntry};
use crate::storage::partitioner::Partitioner;
use crate::storage::record::Record;

const WRITE_BUFFER_FRAMES: usize = 512;
const RETRY_LOG_EVERY: u32 = 20;

/// How long to keep dialing a peer that is not accepting yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Bound on a single dial attempt.
    pub connect_timeout: Duration,
    /// Pause between failed attempts.
    pub retry_delay: Duration,
    /// `None` retries forever. Exceeding the bound is fatal.
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(2),
            retry_delay: Duration::from_millis(250),
            max_attempts: None,
        }
    }
}

/// Outcome of one completed send session.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SendSummary {
    pub destination: NodeId,
    pub records: u64,
    pub attempts: u32,
}

async fn connect_once(host: &str, port: u16, timeout: Duration) -> Result<TcpStream> {
    match tokio::time::timeout(timeout, TcpStream::connect((host, port))).await {
        Ok(Ok(stream)) => Ok(stream),
        Ok(Err(e)) => Err(SortError::Connect {
            addr: format!("{}:{}", host, port),
            reason: e.to_string(),
        }),
        Err(_) => Err(SortError::Connect {
            addr: format!("{}:{}", host, port),
            reason: format!("timed out after {:?}", timeout),
        }),
    }
}

/// Dials `host:port` until it succeeds or the policy's attempt bound is hit.
/// Returns the stream and the number of attempts it took.
pub async fn connect_with_retry(
    host: &str,
    port: u16,
    policy: &RetryPolicy,
) -> Result<(TcpStream, u32)> {
    let mut attempts = 0u32;

    loop {
        attempts += 1;

        match connect_once(host, port, policy.connect_timeout).await {
            Ok(stream) => {
                stream.set_nodelay(true)?;
                tracing::debug!("Connected to {}:{} after {} attempt(s)", host, port, attempts);
                return Ok((stream, attempts));
            }
            Err(e) if e.is_retryable() => {
                if let Some(max) = policy.max_attempts
                    && attempts >= max
                {
                    return Err(SortError::ConnectExhausted {
                        addr: format!("{}:{}", host, port),
                        attempts,
                    });
                }

                if attempts == 1 || attempts % RETRY_LOG_EVERY == 0 {
                    tracing::warn!("{} (attempt {}), retrying", e, attempts);
                } else {
                    tracing::trace!("{} (attempt {}), retrying", e, attempts);
                }

                let jitter = rand::random::<u64>() % 50;
                tokio::time::sleep(policy.retry_delay + Duration::from_millis(jitter)).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Writes every record owned by `destination` as a data frame, then the sentinel,
/// then shuts the writer down. Returns the number of data frames written.
///
/// The first frame is flushed on its own, so a session that dies mid-stream always
/// leaves at least one frame on the wire.
pub async fn stream_partition<W>(
    conn: W,
    records: &[Record],
    destination: NodeId,
    partitioner: &Partitioner,
) -> Result<u64>
where
    W: AsyncWrite + Unpin,
{
    let mut writer = BufWriter::with_capacity(FRAME_LEN * WRITE_BUFFER_FRAMES, conn);
    let mut sent = 0u64;

    for record in records
        .iter()
        .filter(|record| partitioner.owner(record) == destination)
    {
        write_frame(&mut writer, &Frame::Data(*record)).await?;
        sent += 1;
        if sent == 1 {
            writer.flush().await?;
        }
    }

    write_frame(&mut writer, &Frame::EndOfStream).await?;
    writer.flush().await?;
    writer.shutdown().await?;

    Ok(sent)
}

/// Runs one full send session to `peer`.
pub async fn send_to_peer(
    peer: &TopologyEntry,
    records: &[Record],
    partitioner: &Partitioner,
    policy: &RetryPolicy,
) -> Result<SendSummary> {
    let session = async {
        tracing::info!("Connecting to node {} at {}", peer.id, peer.address());
        let (stream, attempts) = connect_with_retry(&peer.host, peer.port, policy).await?;
        tracing::info!("Connected to node {} at {}", peer.id, peer.address());

        let sent = stream_partition(stream, records, peer.id, partitioner).await?;
        tracing::info!("Sent {} records and end-of-stream to node {}", sent, peer.id);

        Ok::<_, SortError>(SendSummary {
            destination: peer.id,
            records: sent,
            attempts,
        })
    };

    session.await.map_err(|source| SortError::Send {
        node: peer.id,
        source: Box::new(source),
    })
}
