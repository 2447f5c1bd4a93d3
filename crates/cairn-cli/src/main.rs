//! Cairn CLI - Command line interface for the inventory graph

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod output;

use cairn_core::{EdgeRuleRegistry, Schema, SeedEmission};
use cairn_storage::MemoryStore;
use commands::{completions, query, resolve, rules, traverse};
use config::Config;

#[derive(Parser)]
#[command(name = "cairn")]
#[command(author, version, about = "Resolve and traverse a typed inventory graph")]
pub struct Cli {
    /// Config file
    #[arg(short, long, env = "CAIRN_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Schema file (overrides config)
    #[arg(long, global = true)]
    pub schema: Option<PathBuf>,

    /// Edge rules file (overrides config)
    #[arg(long, global = true)]
    pub rules: Option<PathBuf>,

    /// Graph snapshot file (overrides config)
    #[arg(short, long, global = true)]
    pub graph: Option<PathBuf>,

    /// Output format: table, json
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Path of the config file in effect
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(config::config_file_path)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve relationship assertions into a canonical path
    Resolve(resolve::ResolveArgs),
    /// Walk containment and delete-cascade edges
    Traverse(traverse::TraverseArgs),
    /// Run a traversal expression
    Query(query::QueryArgs),
    /// List edge rules
    Rules(rules::RulesArgs),
    /// Manage configuration
    Config(commands::config::ConfigArgs),
    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

/// Application context: configuration plus the files it points at
pub struct AppContext {
    pub config: Config,
    schema_path: Option<PathBuf>,
    rules_path: Option<PathBuf>,
    graph_path: Option<PathBuf>,
}

impl AppContext {
    pub fn new(cli: &Cli) -> anyhow::Result<Self> {
        let config = Config::load(&cli.config_path())?;
        Ok(Self {
            schema_path: cli.schema.clone().or_else(|| config.schema_path.clone()),
            rules_path: cli.rules.clone().or_else(|| config.edge_rules_path.clone()),
            graph_path: cli.graph.clone().or_else(|| config.graph_path.clone()),
            config,
        })
    }

    pub fn seed(&self) -> SeedEmission {
        self.config.include_seed.into()
    }

    pub fn schema(&self) -> anyhow::Result<Schema> {
        let path = self
            .schema_path
            .as_ref()
            .context("no schema file: pass --schema or set schema_path")?;
        tracing::debug!("Loading schema from {:?}", path);
        Ok(Schema::load(path)?)
    }

    pub fn rules(&self) -> anyhow::Result<EdgeRuleRegistry> {
        let path = self
            .rules_path
            .as_ref()
            .context("no edge rules file: pass --rules or set edge_rules_path")?;
        tracing::debug!("Loading edge rules from {:?}", path);
        Ok(EdgeRuleRegistry::load(path)?)
    }

    pub fn store(&self, rules: &EdgeRuleRegistry) -> anyhow::Result<MemoryStore> {
        let path = self
            .graph_path
            .as_ref()
            .context("no graph file: pass --graph or set graph_path")?;
        tracing::debug!("Loading graph snapshot from {:?}", path);
        MemoryStore::load(path, rules)
            .with_context(|| format!("failed to load graph from {}", path.display()))
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .init();

    tracing::debug!("Starting cairn CLI");

    match &cli.command {
        Commands::Config(args) => commands::config::run(args, &cli)?,
        Commands::Completions(args) => completions::run(args)?,
        command => {
            let ctx = AppContext::new(&cli)?;
            match command {
                Commands::Resolve(args) => resolve::run(args, &cli, &ctx)?,
                Commands::Traverse(args) => traverse::run(args, &cli, &ctx)?,
                Commands::Query(args) => query::run(args, &cli, &ctx)?,
                Commands::Rules(args) => rules::run(args, &cli, &ctx)?,
                Commands::Config(_) | Commands::Completions(_) => {}
            }
        }
    }

    Ok(())
}
