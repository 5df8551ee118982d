//! t32 CLI: build T32 training grant tables from a roster and a VIVO graph.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use t32_roster::config::T32Config;
use t32_roster::export::RosterExport;
use t32_roster::pipeline::{Pipeline, open_graph};
use t32_roster::roster::csv::read_roster;

#[derive(Parser)]
#[command(name = "t32", version, about = "T32 training grant table builder")]
struct Cli {
    /// TOML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SPARQL query endpoint (overrides `graph.endpoint`).
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// RDF file to query locally instead of an endpoint. Repeatable.
    #[arg(long = "data", global = true)]
    data: Vec<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Enrich a roster and write the report.
    Build {
        /// Roster CSV file.
        #[arg(long)]
        roster: PathBuf,

        /// Report file (overrides `report.output`).
        #[arg(long)]
        output: Option<PathBuf>,

        /// Report format: rtf or json (overrides `report.format`).
        #[arg(long)]
        format: Option<String>,

        /// Concurrent graph lookups (overrides `enrich.workers`).
        #[arg(long)]
        workers: Option<usize>,

        /// Program director shown in the page header.
        #[arg(long)]
        director: Option<String>,
    },

    /// Check that the knowledge graph answers.
    Check,

    /// Print a roster's partitions and diagnostics as JSON.
    Roster {
        /// Roster CSV file.
        file: PathBuf,

        /// Enrich against the graph before printing.
        #[arg(long)]
        enrich: bool,
    },

    /// Write the effective configuration to a file.
    InitConfig {
        /// Destination path.
        #[arg(default_value = "t32.toml")]
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => T32Config::load(path)?,
        None => T32Config::default(),
    };
    if let Some(endpoint) = cli.endpoint {
        config.graph.endpoint = Some(endpoint);
    }
    if !cli.data.is_empty() {
        config.graph.endpoint = None;
        config.graph.data_files = cli.data;
    }

    match cli.command {
        Commands::Build {
            roster,
            output,
            format,
            workers,
            director,
        } => {
            if let Some(output) = output {
                config.report.output = output;
            }
            if let Some(format) = format {
                config.report.format = format;
            }
            if let Some(workers) = workers {
                config.enrich.workers = workers;
            }
            if let Some(director) = director {
                config.report.program_director = director;
            }

            let pipeline = Pipeline::connect(config)?;
            let outcome = pipeline.build(&roster)?;

            println!(
                "Wrote {} ({} units, {} faculty, {} predocs, {} postdocs)",
                outcome.output.display(),
                outcome.roster.units.len(),
                outcome.roster.faculty.len(),
                outcome.roster.predocs.len(),
                outcome.roster.postdocs.len(),
            );
            for row in &outcome.roster.malformed {
                println!("  skipped: {row}");
            }
            if !outcome.summary.is_complete() {
                println!(
                    "  unresolved: {} units, {} faculty",
                    outcome.summary.unresolved_units.len(),
                    outcome.summary.unresolved_faculty.len(),
                );
            }
        }

        Commands::Check => {
            let graph = open_graph(&config.graph)?;
            graph.probe()?;
            match &config.graph.endpoint {
                Some(url) => println!("SPARQL endpoint {url} is reachable."),
                None => println!("Local RDF snapshot loaded."),
            }
        }

        Commands::Roster { file, enrich } => {
            let roster = if enrich {
                let pipeline = Pipeline::connect(config)?;
                let mut roster = pipeline.read_roster(&file)?;
                pipeline.enrich(&mut roster)?;
                roster
            } else {
                read_roster(&file, &config.roster)?
            };
            println!("{}", RosterExport::from(&roster).to_json()?);
        }

        Commands::InitConfig { path } => {
            if path.exists() {
                miette::bail!("{} already exists", path.display());
            }
            config.save(&path)?;
            let path = std::fs::canonicalize(&path).into_diagnostic()?;
            println!("Wrote configuration to {}", path.display());
        }
    }

    Ok(())
}
