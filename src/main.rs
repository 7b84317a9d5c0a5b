use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use dynslice::app::dto::WalkOrder;
use dynslice::app::engine::SliceEngine;
use dynslice::{cli, server};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Query dependency graphs replayed from recorded execution traces.
#[derive(Parser, Debug)]
#[command(name = "slicetool", version, about)]
struct Args {
    /// Path to the trace JSON file
    trace: PathBuf,

    /// Log at debug level (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show node, edge and location counts
    Summary,
    /// List the source nodes a value ultimately came from
    Sources {
        /// Event names or sequence indices (`#N`)
        #[arg(required = true)]
        nodes: Vec<String>,
    },
    /// Walk the backward slice of a node
    Walk {
        node: String,
        /// Depth-first instead of breadth-first order
        #[arg(long)]
        dfs: bool,
        /// Ignore control dependencies
        #[arg(long)]
        no_control: bool,
    },
    /// Export the dependency window [from, to) reachable from a node
    Window {
        node: String,
        #[arg(long)]
        from: u32,
        #[arg(long)]
        to: u32,
    },
    /// Resolve a value path against the captured invocation record
    Resolve {
        /// Value path text, e.g. `param(order).items.elementAt(0)`
        #[arg(long, conflicts_with = "node")]
        path: Option<String>,
        /// Use the value path recorded on this node
        #[arg(long)]
        node: Option<String>,
    },
    /// Serve queries over HTTP
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: IpAddr,
        #[arg(long, default_value_t = 8118)]
        port: u16,
    },
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "dynslice=debug,tower_http=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let engine = SliceEngine::load_from_json(&args.trace)?;
    tracing::info!(trace = %args.trace.display(), "trace replayed");

    match args.command {
        Command::Summary => cli::display_summary(&engine, args.json),
        Command::Sources { nodes } => cli::display_sources(&engine, &nodes, args.json),
        Command::Walk {
            node,
            dfs,
            no_control,
        } => {
            let order = if dfs { WalkOrder::Dfs } else { WalkOrder::Bfs };
            cli::display_walk(&engine, &node, order, !no_control, args.json)
        }
        Command::Window { node, from, to } => {
            cli::display_window(&engine, &node, from, to, args.json)
        }
        Command::Resolve { path, node } => {
            if path.is_none() && node.is_none() {
                bail!("resolve needs --path or --node");
            }
            cli::display_resolved(&engine, node, path, args.json)
        }
        Command::Serve { host, port } => {
            let addr = SocketAddr::new(host, port);
            eprintln!("Serving {} on http://{addr}", args.trace.display());
            tokio::runtime::Runtime::new()?.block_on(server::http::serve(engine, addr))
        }
    }
}
