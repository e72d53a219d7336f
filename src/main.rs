use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use trustflow::graph::FlowEngine;
use trustflow::io::read_edges_binary;
use trustflow::ledger::import_from_json;
use trustflow::types::{Address, Int};

/// Computes the maximum transferable value between two participants of a
/// trust-token economy and prints the transfer plan realising it.
#[derive(Parser, Debug)]
#[command(version, long_about = None)]
struct Args {
    /// Sender address (0x-prefixed)
    from: String,

    /// Receiver address (0x-prefixed)
    to: String,

    /// Path to a binary edge file
    #[arg(short, long, conflicts_with = "snapshot")]
    edges: Option<PathBuf>,

    /// Path to a JSON ledger snapshot
    #[arg(short, long)]
    snapshot: Option<PathBuf>,

    /// Amount to transfer (decimal or 0x-hex); unconstrained when omitted
    #[arg(short, long)]
    value: Option<String>,
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let edges = match (&args.edges, &args.snapshot) {
        (Some(path), None) => read_edges_binary(path)?,
        (None, Some(path)) => {
            let mut ledger = import_from_json(path)?;
            ledger.edges().clone()
        }
        _ => return Err("pass exactly one of --edges or --snapshot".into()),
    };

    let source = Address::from(args.from.as_str());
    let sink = Address::from(args.to.as_str());
    let requested = args.value.as_deref().map_or_else(Int::max_value, Int::from);

    println!(
        "Computing flow {source} -> {sink} over {} edges",
        edges.edge_count()
    );
    let (flow, transfers) = FlowEngine::new().compute_flow(&source, &sink, &edges, requested)?;
    println!("Max flow: {flow}");
    for transfer in &transfers {
        println!(
            "{} -> {} [{}] {}",
            transfer.from, transfer.to, transfer.token, transfer.capacity
        );
    }
    Ok(())
}
