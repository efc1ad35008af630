//! Command-line entry point: reconcile a knowledge base, explain one
//! pair, or validate a configuration document.

mod ttl;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ontorec_core::{Config, DimensionOntology, Interner, LinkingSchema, RelationGraph, RelationshipModel};
use ontorec_sparql::{discover_classes, SparqlClient};

use ttl::TtlWriter;

#[derive(Parser)]
#[command(
    name = "ontorec",
    about = "Relationship reconciliation over RDF knowledge bases",
    version
)]
struct Cli {
    /// Rows fetched per endpoint page
    #[arg(long, global = true, default_value_t = 10_000)]
    max_rows: usize,

    /// Worker threads for batched queries and reconciliation
    /// (defaults to the number of cores)
    #[arg(long, global = true)]
    threads: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Reconcile every relationship pair and write the verdicts as Turtle
    Reconcile {
        /// JSON configuration document
        #[arg(short, long)]
        config: PathBuf,
        /// Linking-predicate schema document
        #[arg(short, long)]
        schema: PathBuf,
        /// Output Turtle file
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Explain the verdict for one relationship pair
    Explain {
        /// JSON configuration document
        #[arg(short, long)]
        config: PathBuf,
        /// Linking-predicate schema document
        #[arg(short, long)]
        schema: PathBuf,
        /// URI of the first relationship
        first: String,
        /// URI of the second relationship
        second: String,
    },
    /// Validate a configuration document and exit
    Validate {
        /// JSON configuration document
        #[arg(short, long)]
        config: PathBuf,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e:#}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("configuring the worker pool")?;
    }

    match cli.command {
        Command::Reconcile {
            config,
            schema,
            output,
        } => {
            let config = load_config(&config)?;
            let (interner, model) = build_model(&config, &schema, cli.max_rows)?;
            let results = model.reconcile();

            let mut writer = TtlWriter::create(&output)
                .with_context(|| format!("creating {}", output.display()))?;
            for result in &results {
                writer.write_verdict(&interner, &config, result)?;
            }
            writer.finish()?;
            println!(
                "{} {} verdicts written to {}",
                "ok:".green().bold(),
                results.len(),
                output.display()
            );
        }
        Command::Explain {
            config,
            schema,
            first,
            second,
        } => {
            let config = load_config(&config)?;
            let (interner, model) = build_model(&config, &schema, cli.max_rows)?;
            let left = interner
                .get(&first)
                .ok_or_else(|| anyhow!("unknown URI: {first}"))?;
            let right = interner
                .get(&second)
                .ok_or_else(|| anyhow!("unknown URI: {second}"))?;
            let verdict = model.explain(left, right)?;
            println!("{first} {} {second}", verdict.to_string().cyan().bold());
        }
        Command::Validate { config } => {
            load_config(&config)?;
            println!("{} configuration is valid", "ok:".green().bold());
        }
    }
    Ok(())
}

fn load_config(path: &Path) -> Result<Config> {
    Config::from_path(path).with_context(|| format!("loading configuration {}", path.display()))
}

/// Runs the full model pipeline against the configured endpoint: schema,
/// relation graph, dimension ontologies, relationship model.
fn build_model(
    config: &Config,
    schema_path: &Path,
    max_rows: usize,
) -> Result<(Interner, RelationshipModel)> {
    let client = SparqlClient::from_config(config)?.with_page_size(max_rows);

    let seeds: Vec<String> = config
        .dimensions
        .iter()
        .flat_map(|dimension| dimension.top_linking_predicates.iter().cloned())
        .collect();
    let schema = LinkingSchema::from_path(schema_path, seeds)
        .with_context(|| format!("loading schema document {}", schema_path.display()))?;

    let mut interner = Interner::new();
    let graph = RelationGraph::build(
        &mut interner,
        &client,
        &schema,
        &config.part_of_predicates,
        &config.has_part_predicates,
        &config.depends_on_predicates,
    )?;

    let mut ontologies = Vec::with_capacity(config.dimensions.len());
    for dimension in &config.dimensions {
        let classes = discover_classes(&client, &dimension.namespace_base_uris)?;
        ontologies.push(DimensionOntology::build(
            &dimension.namespace_base_uris,
            &classes,
            &mut interner,
            &graph,
        ));
    }

    let model = RelationshipModel::build(&graph, &schema, ontologies, config, &mut interner);
    info!(relationships = model.relationship_count(), "model built");
    Ok((interner, model))
}
