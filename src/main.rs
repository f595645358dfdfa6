use anyhow::Context;
use clap::Parser;
use netsort::coordinator::config::ExchangeConfig;
use netsort::coordinator::node::SortNode;
use netsort::coordinator::types::SortJob;
use netsort::membership::topology;
use netsort::membership::types::NodeId;
use std::path::PathBuf;

/// Distributed sort of fixed-size records across a static set of nodes.
#[derive(Parser, Debug)]
#[command(name = "netsort", version)]
struct Args {
    /// This node's serverId in the topology file
    server_id: usize,

    /// Local shard of 100-byte records
    input: PathBuf,

    /// Where to write this node's sorted records
    output: PathBuf,

    /// YAML topology listing every server's id, host and port
    config: PathBuf,

    /// Write a JSON run report here after a successful run
    #[arg(long)]
    report: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let level = if std::env::var("NETSORT_LOG_DEBUG").is_ok_and(|v| v == "1") {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    let args = Args::parse();
    let node_id = NodeId(args.server_id);

    let topology = topology::load(&args.config)
        .with_context(|| format!("node {} failed in phase Init", node_id))?;
    let exchange = ExchangeConfig::from_env()
        .with_context(|| format!("node {} failed in phase Init", node_id))?;

    tracing::info!(
        "Starting node {} with {} servers from {}",
        node_id,
        topology.size(),
        args.config.display()
    );

    let node = SortNode::new(SortJob {
        node_id,
        input: args.input,
        output: args.output,
        topology,
        exchange,
    });

    // Ctrl-C drops the run, which releases the listener and aborts every sender.
    let report = tokio::select! {
        result = node.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            anyhow::bail!("node {} aborted by operator", node_id);
        }
    };

    if let Some(path) = args.report {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(&path, json)
            .with_context(|| format!("writing report {}", path.display()))?;
        tracing::info!("Wrote run report to {}", path.display());
    }

    Ok(())
}
