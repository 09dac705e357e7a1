// crates/blockcli/src/main.rs

use anyhow::{Context, Result};
use blockcore::{
    schema, Block, DirectedGraph, EdgeUpsert, NodeUpsert, WorkflowFull, WorkflowUpdate,
};
use blockruntime::{
    execution_layers, DanglingEdgePolicy, DuplicateVertexPolicy, PreparedGraph, RuntimeConfig,
    WorkflowRuntime,
};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "workflow")]
#[command(about = "Workflow builder schema and graph tools", long_about = None)]
struct Cli {
    /// Show debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PayloadKind {
    /// Client upsert payload (nodes may lack ids)
    Update,
    /// Persisted workflow with resolved nodes and edges
    Full,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a payload file and check its graph
    Validate {
        /// Path to payload JSON file
        file: PathBuf,

        #[arg(short, long, value_enum, default_value_t = PayloadKind::Update)]
        kind: PayloadKind,

        /// Reject dangling edges and duplicate vertex keys (default: warn / merge)
        #[arg(long)]
        strict: bool,

        /// Accept cyclic graphs
        #[arg(long)]
        allow_cycles: bool,
    },

    /// Print the directed graph of a payload
    Graph {
        file: PathBuf,

        #[arg(short, long, value_enum, default_value_t = PayloadKind::Update)]
        kind: PayloadKind,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the execution order of a payload
    Order {
        file: PathBuf,

        #[arg(short, long, value_enum, default_value_t = PayloadKind::Update)]
        kind: PayloadKind,
    },

    /// Assign ids to an upsert payload and print the resolved nodes and edges
    Resolve { file: PathBuf },

    /// Run a single block from a JSON file
    Run {
        /// Path to block JSON file
        file: PathBuf,
    },

    /// List available block types
    Blocks,

    /// Create an example upsert payload
    Init {
        /// Output file path
        #[arg(short, long, default_value = "workflow.json")]
        output: PathBuf,
    },
}

enum Payload {
    Update(WorkflowUpdate),
    Full(WorkflowFull),
}

fn read_file(file: &Path) -> Result<String> {
    std::fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))
}

impl Payload {
    fn load(file: &Path, kind: PayloadKind) -> Result<Self> {
        let json = read_file(file)?;
        let payload = match kind {
            PayloadKind::Update => Payload::Update(schema::parse(&json)?),
            PayloadKind::Full => Payload::Full(schema::parse(&json)?),
        };
        Ok(payload)
    }

    fn to_graph(&self) -> DirectedGraph {
        match self {
            Payload::Update(update) => update.to_graph(),
            Payload::Full(full) => full.to_graph(),
        }
    }

    fn prepare(&self, runtime: &WorkflowRuntime) -> Result<PreparedGraph> {
        let prepared = match self {
            Payload::Update(update) => runtime.prepare_update(update)?,
            Payload::Full(full) => runtime.prepare_full(full)?,
        };
        Ok(prepared)
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Validate {
            file,
            kind,
            strict,
            allow_cycles,
        } => {
            validate_payload(&file, kind, strict, allow_cycles)?;
        }

        Commands::Graph { file, kind, json } => {
            print_graph(&file, kind, json)?;
        }

        Commands::Order { file, kind } => {
            print_order(&file, kind)?;
        }

        Commands::Resolve { file } => {
            resolve_payload(&file)?;
        }

        Commands::Run { file } => {
            run_block(&file).await?;
        }

        Commands::Blocks => {
            list_blocks();
        }

        Commands::Init { output } => {
            create_example_payload(&output)?;
        }
    }

    Ok(())
}

fn validate_payload(
    file: &Path,
    kind: PayloadKind,
    strict: bool,
    allow_cycles: bool,
) -> Result<()> {
    println!("🔍 Validating payload: {}", file.display());

    let payload = Payload::load(file, kind)?;
    let config = if strict {
        RuntimeConfig {
            allow_cycles,
            ..RuntimeConfig::default()
        }
    } else {
        RuntimeConfig {
            dangling_edges: DanglingEdgePolicy::Warn,
            duplicate_vertices: DuplicateVertexPolicy::Merge,
            allow_cycles,
        }
    };
    let runtime = WorkflowRuntime::with_config(config);
    let prepared = payload.prepare(&runtime)?;

    println!("✅ Payload is valid:");
    println!("   Vertices: {}", prepared.graph.vertex_count());
    println!("   Edges: {}", prepared.graph.edge_count());

    for d in &prepared.report.duplicates {
        println!("   ⚠️  vertex '{}' selected by {} nodes", d.key, d.count);
    }
    for d in &prepared.report.dangling {
        println!("   ⚠️  edge {} -> {} references unknown '{}'", d.source, d.target, d.missing);
    }
    if prepared.report.has_cycle {
        println!("   ⚠️  graph contains a cycle");
    }

    Ok(())
}

fn print_graph(file: &Path, kind: PayloadKind, json: bool) -> Result<()> {
    let graph = Payload::load(file, kind)?.to_graph();

    if json {
        println!("{}", serde_json::to_string_pretty(&graph)?);
        return Ok(());
    }

    println!("📋 Vertices ({}):", graph.vertex_count());
    for vertex in graph.vertices() {
        if graph.implicit_vertices().contains(vertex) {
            println!("  • {} (from edge)", vertex);
        } else {
            println!("  • {}", vertex);
        }
    }
    println!("🔗 Edges ({}):", graph.edge_count());
    for (source, target) in graph.edges() {
        println!("  {} -> {}", source, target);
    }

    Ok(())
}

fn print_order(file: &Path, kind: PayloadKind) -> Result<()> {
    let payload = Payload::load(file, kind)?;
    let runtime = WorkflowRuntime::new();
    let prepared = payload.prepare(&runtime)?;

    println!("📊 Execution order:");
    for (i, vertex) in prepared.order.iter().flatten().enumerate() {
        println!("  {}. {}", i + 1, vertex);
    }

    println!("📚 Layers:");
    for (i, layer) in execution_layers(&prepared.graph)?.iter().enumerate() {
        println!("  {}: {}", i, layer.join(", "));
    }

    Ok(())
}

fn resolve_payload(file: &Path) -> Result<()> {
    let update: WorkflowUpdate = schema::parse(&read_file(file)?)?;

    let (nodes, edges) = update.resolve();
    tracing::info!("Resolved {} nodes and {} edges", nodes.len(), edges.len());

    let output = serde_json::json!({ "nodes": nodes, "edges": edges });
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}

async fn run_block(file: &Path) -> Result<()> {
    let block: Block = schema::parse(&read_file(file)?)?;

    let runtime = WorkflowRuntime::new();
    println!("⚡ Running block: {} ({})", block.id, block.block_type);

    let output = runtime.run_block(&block).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}

fn list_blocks() {
    println!("📦 Available Block Types:");
    println!();

    let runtime = WorkflowRuntime::new();
    let registry = runtime.registry();

    for block_type in registry.list_block_types() {
        if let Some(metadata) = registry.get_metadata(&block_type) {
            println!("  • {} ({})", block_type, metadata.category);
            println!("    {}", metadata.description);
        } else {
            println!("  • {}", block_type);
        }
    }
}

fn create_example_payload(output: &Path) -> Result<()> {
    let update = WorkflowUpdate::new(
        vec![
            NodeUpsert::new("trigger").with_position(100.0, 100.0),
            NodeUpsert::new("fetch").with_position(300.0, 100.0),
            NodeUpsert::new("notify").with_position(500.0, 100.0),
        ],
        vec![
            EdgeUpsert::new("trigger", "fetch"),
            EdgeUpsert::new("fetch", "notify"),
        ],
    );

    let json = serde_json::to_string_pretty(&update)?;
    std::fs::write(output, json)?;

    println!("✨ Created example payload: {}", output.display());
    println!();
    println!("Check it with:");
    println!("  workflow validate {}", output.display());

    Ok(())
}
