//! Resolve command

use clap::Args;
use serde::Serialize;

use crate::output::{to_json, OutputFormat};
use crate::{AppContext, Cli};
use cairn_core::{EntityType, RelationshipResolver, ResolvedPath};

#[derive(Args)]
pub struct ResolveArgs {
    /// Entity type the path is resolved for
    #[arg(short, long)]
    pub start: String,

    /// Assertions as `{type}.{property}=value`
    #[arg(required_unless_present = "link")]
    pub assertions: Vec<String>,

    /// Ready-made link whose path is used when it parses
    #[arg(short, long)]
    pub link: Option<String>,
}

#[derive(Serialize)]
struct ResolveOutput<'a> {
    #[serde(flatten)]
    resolved: &'a ResolvedPath,
    #[serde(skip_serializing_if = "Option::is_none")]
    warning: Option<String>,
}

/// Split `key=value`; the key itself is validated by the resolver
fn split_pair(raw: &str) -> anyhow::Result<(&str, &str)> {
    raw.split_once('=')
        .ok_or_else(|| anyhow::anyhow!("Assertion {:?} is not of the form key=value", raw))
}

pub fn run(args: &ResolveArgs, cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    let schema = ctx.schema()?;
    let rules = ctx.rules()?;
    let resolver = RelationshipResolver::new(&schema, &rules);

    let pairs = args
        .assertions
        .iter()
        .map(|a| split_pair(a))
        .collect::<anyhow::Result<Vec<_>>>()?;

    tracing::info!(
        "Resolving {} assertions for {} (link: {})",
        pairs.len(),
        args.start,
        args.link.is_some()
    );

    let resolution = resolver.resolve(
        &EntityType::new(args.start.as_str()),
        &pairs,
        args.link.as_deref(),
    )?;
    let warning = resolution.link_error.as_ref().map(|e| e.to_string());

    match OutputFormat::from(cli.format.as_str()) {
        OutputFormat::Json => println!(
            "{}",
            to_json(&ResolveOutput {
                resolved: &resolution.resolved,
                warning,
            })?
        ),
        OutputFormat::Table => {
            if let Some(w) = warning {
                if !cli.quiet {
                    eprintln!("warning: {}", w);
                }
            }
            println!("{}", resolution.resolved);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_pair() {
        assert_eq!(
            split_pair("pserver.hostname=h1").unwrap(),
            ("pserver.hostname", "h1")
        );
        assert_eq!(split_pair("a.b=").unwrap(), ("a.b", ""));
        assert!(split_pair("pserver.hostname").is_err());
    }
}
