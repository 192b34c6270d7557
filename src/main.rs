//! flowdef CLI - validate and inspect workflow definitions

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use flowdef::{
    apply_env_overrides, parse_workflow_with, FixSuggestion, FsLoader, ParseError, ParseOptions,
    WorkflowDef, DEFAULT_ENV_PREFIX, DEFAULT_MAX_INCLUDE_DEPTH, DEFAULT_MAX_NESTING_DEPTH,
};

#[derive(Parser)]
#[command(name = "flowdef")]
#[command(about = "flowdef - workflow definition parser with !include support")]
#[command(version)]
struct Cli {
    /// Maximum number of files on one include chain
    #[arg(
        long,
        global = true,
        env = "FLOWDEF_MAX_INCLUDE_DEPTH",
        default_value_t = DEFAULT_MAX_INCLUDE_DEPTH
    )]
    max_include_depth: usize,

    /// Maximum number of nested blocks, counted through includes
    #[arg(
        long,
        global = true,
        env = "FLOWDEF_MAX_NESTING_DEPTH",
        default_value_t = DEFAULT_MAX_NESTING_DEPTH
    )]
    max_nesting_depth: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a workflow file and report a summary
    Validate {
        /// Path to the workflow file
        file: PathBuf,
    },

    /// Print the parsed workflow
    Show {
        /// Path to the workflow file
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "json")]
        format: Format,

        /// Prefix of environment variables overriding `with:` parameters
        #[arg(long, default_value = DEFAULT_ENV_PREFIX)]
        env_prefix: String,

        /// Do not read parameter overrides from the environment
        #[arg(long)]
        no_env: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Yaml,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let options = ParseOptions::default()
        .with_max_include_depth(cli.max_include_depth)
        .with_max_nesting_depth(cli.max_nesting_depth);

    let result = match cli.command {
        Commands::Validate { file } => validate_workflow(&file, &options),
        Commands::Show {
            file,
            format,
            env_prefix,
            no_env,
        } => {
            let env_prefix = (!no_env).then_some(env_prefix.as_str());
            show_workflow(&file, &options, format, env_prefix)
        }
    };

    if let Err(e) = result {
        report(&e);
        std::process::exit(1);
    }
}

fn load(file: &Path, options: &ParseOptions) -> Result<WorkflowDef, ParseError> {
    parse_workflow_with(file, &FsLoader::new(), options)
}

fn validate_workflow(file: &Path, options: &ParseOptions) -> anyhow::Result<()> {
    let workflow = load(file, options)?;

    println!("{} Workflow '{}' is valid", "✓".green(), file.display());
    println!("  Id: {}", workflow.id);
    println!("  Name: {}", workflow.name);
    println!("  Graphs: {}", workflow.graphs.len());
    println!("  Nodes: {}", workflow.node_count());
    println!("  Edges: {}", workflow.edge_count());
    println!("  Entry graph: {}", entry_graph_label(&workflow));

    Ok(())
}

fn entry_graph_label(workflow: &WorkflowDef) -> String {
    match (&workflow.entry_graph_id, workflow.entry_graph()) {
        (Some(id), _) => id.clone(),
        (None, Some(first)) => format!("{} (default)", first.id),
        (None, None) => "(none)".to_string(),
    }
}

fn show_workflow(
    file: &Path,
    options: &ParseOptions,
    format: Format,
    env_prefix: Option<&str>,
) -> anyhow::Result<()> {
    let mut workflow = load(file, options)?;

    if let Some(prefix) = env_prefix {
        let applied = apply_env_overrides(&mut workflow, prefix);
        info!(applied, prefix, "applied environment overrides");
    }

    let rendered = match format {
        Format::Json => {
            serde_json::to_string_pretty(&workflow).context("Failed to serialize workflow as JSON")?
        }
        Format::Yaml => {
            serde_yaml::to_string(&workflow).context("Failed to serialize workflow as YAML")?
        }
    };
    println!("{}", rendered.trim_end());

    Ok(())
}

fn report(e: &anyhow::Error) {
    let Some(err) = e.downcast_ref::<ParseError>() else {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        return;
    };

    eprintln!("{} {}", "Error:".red().bold(), err.root_cause());
    let chain = err.include_chain();
    if !chain.is_empty() {
        let chain = chain
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(" -> ");
        eprintln!("  {} {}", "In:".cyan(), chain);
    }
    eprintln!("  {} {}", "Stage:".cyan(), err.stage());
    if let Some(suggestion) = err.fix_suggestion() {
        eprintln!("  {} {}", "Fix:".yellow(), suggestion);
    }
}
