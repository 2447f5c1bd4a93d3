//! Traverse commands

use clap::{Args, Subcommand};

use crate::output::{load_vertices, print_vertices, OutputFormat};
use crate::{AppContext, Cli};
use cairn_core::{Direction, SeedEmission, TraversalEngine, VertexId};

#[derive(Args)]
pub struct TraverseArgs {
    /// Leave the starting vertex out of closures
    #[arg(long, global = true)]
    pub no_seed: bool,

    #[command(subcommand)]
    pub command: TraverseCommands,
}

#[derive(Subcommand)]
pub enum TraverseCommands {
    /// Every ancestor over containment edges
    Parents {
        /// Starting vertex id
        vertex: VertexId,
    },
    /// Every descendant over containment edges
    Children {
        /// Starting vertex id
        vertex: VertexId,
    },
    /// Everything a delete of the vertex would cascade to
    Deletable {
        /// Starting vertex id
        vertex: VertexId,
    },
    /// Direct neighbors across one edge label
    Related {
        /// Starting vertex id
        vertex: VertexId,
        /// Direction: out, in, both
        #[arg(short, long, default_value = "out")]
        direction: Direction,
        /// Edge label
        #[arg(short, long)]
        label: String,
        /// Node type of the neighbors
        #[arg(short = 't', long)]
        node_type: String,
    },
}

pub fn run(args: &TraverseArgs, cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    let rules = ctx.rules()?;
    let store = ctx.store(&rules)?;
    let seed = if args.no_seed {
        SeedEmission::Exclude
    } else {
        ctx.seed()
    };

    let ids = match &args.command {
        TraverseCommands::Parents { vertex } => {
            TraversalEngine::find_parents(&store, *vertex, seed)?
        }
        TraverseCommands::Children { vertex } => {
            TraversalEngine::find_children(&store, *vertex, seed)?
        }
        TraverseCommands::Deletable { vertex } => {
            TraversalEngine::find_deletable(&store, *vertex, seed)?
        }
        TraverseCommands::Related {
            vertex,
            direction,
            label,
            node_type,
        } => TraversalEngine::find_related_vertices(&store, *vertex, *direction, label, node_type)?,
    };

    tracing::info!("Traversal returned {} vertices", ids.len());
    let vertices = load_vertices(&store, &ids)?;
    print_vertices(&vertices, OutputFormat::from(cli.format.as_str()))
}
