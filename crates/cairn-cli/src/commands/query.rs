//! Query command

use clap::Args;

use crate::output::{load_vertices, print_vertices, OutputFormat};
use crate::{AppContext, Cli};
use cairn_core::{Step, TraversalEngine, TraversalQuery, VertexId};

/// Token that ends the parent part of a query
const PARENT_MARKER: &str = "^";

#[derive(Args)]
pub struct QueryArgs {
    /// Anchor vertex (all vertices when omitted)
    #[arg(short, long)]
    pub start: Option<VertexId>,

    /// Run only the steps before the `^` marker
    #[arg(long)]
    pub parent: bool,

    /// Steps: out[:label], in[:label], both[:label], type:<node-type>,
    /// has:<property>=<value>, and `^` to mark the parent boundary
    #[arg(allow_hyphen_values = true)]
    pub steps: Vec<String>,
}

fn build_query(start: Option<VertexId>, tokens: &[String]) -> anyhow::Result<TraversalQuery> {
    let mut query = TraversalQuery {
        start,
        ..Default::default()
    };
    for token in tokens {
        if token == PARENT_MARKER {
            query = query.mark_parent();
            continue;
        }
        let step: Step = token.parse().map_err(|e: String| anyhow::anyhow!(e))?;
        query = query.step(step);
    }
    Ok(query)
}

pub fn run(args: &QueryArgs, cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    let rules = ctx.rules()?;
    let store = ctx.store(&rules)?;
    let query = build_query(args.start, &args.steps)?;

    let ids = if args.parent {
        TraversalEngine::execute_parent_query(&store, &query)?
    } else {
        TraversalEngine::execute_query(&store, &query)?
    };

    tracing::info!("Query matched {} vertices", ids.len());
    let vertices = load_vertices(&store, &ids)?;
    print_vertices(&vertices, OutputFormat::from(cli.format.as_str()))
}
