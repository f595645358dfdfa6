//! Per-Node Sort Driver
//!
//! Walks one node through `Init -> Listening -> Loaded -> Exchanging -> Collected ->
//! Sorted -> Done`. Any error aborts the run; there is no partial output.
//!
//! ## Ordering constraints
//! - The receiver is bound before the shard is read and before any sender dials, so a
//!   peer dialing this node only ever waits on its retry loop, never on a missing bind.
//! - `Collected` needs both sides: every local send session finished **and** every peer's
//!   end-of-stream received. The two are awaited together so a failure on either side
//!   ends the run instead of leaving the other side waiting.

use anyhow::Context;
use std::sync::Arc;
use tokio::task::JoinSet;

use super::types::{Phase, SortJob, SortReport};
use crate::error::{Result as SortResult, SortError};
use crate::exchange::receiver::Receiver;
use crate::exchange::sender::{SendSummary, send_to_peer};
use crate::storage::memory::RecordStore;
use crate::storage::partitioner::Partitioner;
use crate::storage::record::{Record, sort_records};
use crate::storage::shard::{read_shard, write_output};

pub struct SortNode {
    job: SortJob,
    phase: Phase,
}

impl SortNode {
    pub fn new(job: SortJob) -> Self {
        Self {
            job,
            phase: Phase::Init,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Runs the node to completion. Errors name the node and the phase that failed.
    pub async fn run(mut self) -> anyhow::Result<SortReport> {
        let node_id = self.job.node_id;

        match self.execute().await {
            Ok(report) => Ok(report),
            Err(err) => {
                let phase = self.phase;
                tracing::error!("Node {} failed in phase {}: {:#}", node_id, phase, err);
                if is_stream_corruption(&err) {
                    tracing::error!(
                        "Node {} aborted on a corrupt or truncated peer stream; no output written",
                        node_id
                    );
                }
                Err(err.context(format!("node {} failed in phase {}", node_id, phase)))
            }
        }
    }

    fn enter(&mut self, phase: Phase) {
        tracing::info!("Node {}: {} -> {}", self.job.node_id, self.phase, phase);
        self.phase = phase;
    }

    async fn execute(&mut self) -> anyhow::Result<SortReport> {
        let node_id = self.job.node_id;
        let topology = self.job.topology.clone();
        let local_entry = topology.address_of(node_id)?.clone();
        let partitioner = Partitioner::new(topology.size())?;
        let policy = self.job.exchange.retry_policy();

        tracing::info!(
            "Node {} of {} at {}",
            node_id,
            topology.size(),
            local_entry.address()
        );

        self.enter(Phase::Listening);
        let store = Arc::new(RecordStore::new());
        let mut receiver =
            Receiver::start(&local_entry.host, local_entry.port, store.clone()).await?;

        self.enter(Phase::Loaded);
        let local = read_shard(&self.job.input)
            .await
            .with_context(|| format!("reading shard {}", self.job.input.display()))?;
        let loaded = local.len();
        tracing::info!("Node {} loaded {} records", node_id, loaded);

        self.enter(Phase::Exchanging);
        let retained = store.extend(
            local
                .iter()
                .copied()
                .filter(|record| partitioner.owner(record) == node_id),
        )?;
        tracing::info!("Node {} retained {} of its own records", node_id, retained);

        let local: Arc<[Record]> = local.into();
        let mut senders = JoinSet::new();
        for peer in topology.peers_of(node_id) {
            let peer = peer.clone();
            let local = local.clone();
            let policy = policy.clone();
            senders.spawn(async move { send_to_peer(&peer, &local, &partitioner, &policy).await });
        }

        let expected_peers = topology.size() - 1;
        let (sent_per_peer, received) = tokio::try_join!(
            collect_senders(&mut senders),
            receiver.await_all_peers(expected_peers)
        )?;

        self.enter(Phase::Collected);
        receiver.shutdown();
        let records = store.seal();
        tracing::info!(
            "Node {} collected {} records ({} received from {} peers)",
            node_id,
            records.len(),
            received.records,
            received.peers
        );

        self.enter(Phase::Sorted);
        let records = tokio::task::spawn_blocking(move || {
            let mut records = records;
            sort_records(&mut records);
            records
        })
        .await?;

        self.enter(Phase::Done);
        write_output(&self.job.output, &records)
            .await
            .with_context(|| format!("writing output {}", self.job.output.display()))?;

        let report = SortReport {
            node_id,
            loaded,
            retained,
            sent_per_peer,
            received: received.records,
            received_per_peer: received.per_peer,
            written: records.len(),
        };
        tracing::info!(
            "Node {} done: loaded={} retained={} sent={} received={} written={}",
            node_id,
            report.loaded,
            report.retained,
            report.total_sent(),
            report.received,
            report.written
        );

        Ok(report)
    }
}

/// Waits for every send session, failing on the first error.
async fn collect_senders(
    senders: &mut JoinSet<SortResult<SendSummary>>,
) -> SortResult<Vec<SendSummary>> {
    let mut summaries = Vec::with_capacity(senders.len());

    while let Some(joined) = senders.join_next().await {
        summaries.push(joined??);
    }

    summaries.sort_by_key(|summary| summary.destination);
    Ok(summaries)
}

fn is_stream_corruption(err: &anyhow::Error) -> bool {
    err.chain()
        .filter_map(|cause| cause.downcast_ref::<SortError>())
        .any(SortError::is_stream_corruption)
}
