//! Rules command

use clap::Args;

use crate::output::{to_json, OutputFormat};
use crate::{AppContext, Cli};
use cairn_core::EdgeRule;

#[derive(Args)]
pub struct RulesArgs {
    /// Only rules seen from this entity type
    #[arg(short = 't', long)]
    pub r#type: Option<String>,
}

fn flags(rule: &EdgeRule) -> String {
    let mut flags = Vec::new();
    if rule.is_containment {
        flags.push("containment");
    }
    if rule.cascades_on_delete {
        flags.push("cascade-delete");
    }
    flags.join(",")
}

pub fn run(args: &RulesArgs, cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    let registry = ctx.rules()?;
    let rules: Vec<&EdgeRule> = match &args.r#type {
        Some(t) => registry.rules_for(t),
        None => registry.declared().iter().collect(),
    };

    match OutputFormat::from(cli.format.as_str()) {
        OutputFormat::Json => println!("{}", to_json(&rules)?),
        OutputFormat::Table => {
            if rules.is_empty() {
                println!("(no edge rules)");
            }
            for rule in rules {
                println!(
                    "{} -[{} {}]-> {} {}",
                    rule.from,
                    rule.label,
                    rule.direction,
                    rule.to,
                    flags(rule)
                );
            }
        }
    }

    Ok(())
}
