//! Directus Type Generator CLI
//!
//! Usage:
//!   directus-typegen generate --snapshot ./snapshot.json --output ./src/generated
//!   directus-typegen generate --dry-run
//!   directus-typegen graph --snapshot ./snapshot.json --output entities.dot

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use directus_typegen::{Generator, SnapshotSource, TypegenConfig};

#[derive(Parser)]
#[command(name = "directus-typegen")]
#[command(about = "Generate Zod validators and TypeScript types from Directus metadata")]
struct Cli {
    /// Config file layered over the default locations
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the output tree
    Generate {
        /// Snapshot file or directory (overrides source.snapshot)
        #[arg(short, long)]
        snapshot: Option<PathBuf>,

        /// Output root (overrides output.dir)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the files that would be written
        #[arg(long)]
        dry_run: bool,
    },

    /// Export the entity dependency graph as DOT
    Graph {
        /// Snapshot file or directory (overrides source.snapshot)
        #[arg(short, long)]
        snapshot: Option<PathBuf>,

        /// Output file (defaults to entities.dot)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config =
        TypegenConfig::load_from(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Generate {
            snapshot,
            output,
            dry_run,
        } => {
            if let Some(dir) = output {
                config.output.dir = dir;
            }
            let source = load_source(snapshot, &config)?;
            let generation = Generator::from_config(&source, &config).generate()?;

            for skipped in &generation.skipped {
                println!("⚠️  Skipped {}: {}", skipped.name, skipped.reason);
            }
            if !generation.cycles.is_empty() {
                println!(
                    "Deferred {} entities in {} circular reference paths",
                    generation.cycles.entities().len(),
                    generation.cycles.len()
                );
            }

            let root = config.output_dir();
            if dry_run {
                for file in &generation.files {
                    println!("{} ({} bytes)", root.join(&file.path).display(), file.content.len());
                }
                return Ok(());
            }

            let written = generation
                .write(&root)
                .with_context(|| format!("Failed to write output to {}", root.display()))?;
            println!("✅ Wrote {} files to {}", written.len(), root.display());
        }

        Commands::Graph { snapshot, output } => {
            let source = load_source(snapshot, &config)?;
            let generation = Generator::from_config(&source, &config).generate()?;

            println!(
                "Graph built: {} entities, {} edges",
                generation.artifacts.len(),
                generation.graph.edge_count()
            );

            let output_path = output.unwrap_or_else(|| PathBuf::from("entities.dot"));
            std::fs::write(&output_path, generation.graph.to_dot())
                .with_context(|| format!("Failed to write {}", output_path.display()))?;
            println!("✅ Exported DOT to: {:?}", output_path);
        }
    }

    Ok(())
}

fn load_source(snapshot: Option<PathBuf>, config: &TypegenConfig) -> anyhow::Result<SnapshotSource> {
    let Some(path) = snapshot.or_else(|| config.source.snapshot.clone()) else {
        bail!("No metadata snapshot given. Pass --snapshot or set source.snapshot");
    };

    SnapshotSource::from_path(&path)
        .with_context(|| format!("Failed to load snapshot from {}", path.display()))
}
