use anyhow::Context;
use clap::{Parser, Subcommand};
use shapez_assets::{ProceduralLoader, QUARTER_FRAGMENTS, QuarterRegistry, write_fragment};
use shapez_parser::DEFAULT_SHAPE;
use shapez_render::{DebugTextBackend, ManualFrames};
use shapez_viewer::{Headless, MultiShapeViewer, ViewConfig, ViewerConfig};
use std::path::PathBuf;
use std::rc::Rc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "shapez-cli", about = "CLI tool for shape identifiers")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Viewer config (YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Decode an identifier and print its layers
    Decode {
        /// Shape identifier, e.g. "CuCuCuCu:RrRr--Rr"
        #[arg(default_value = DEFAULT_SHAPE)]
        identifier: String,
        /// Print the decoded shape as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check identifiers against the grammar
    Validate {
        #[arg(required = true)]
        identifiers: Vec<String>,
    },
    /// Assemble the configured views headless and print the draw commands
    Layout {
        /// Shapes to lay out in a grid; overrides the config's views
        #[arg(short, long)]
        shape: Vec<String>,
        /// Number of frames to draw
        #[arg(short, long, default_value = "1")]
        frames: u32,
    },
    /// Write the procedural quarter fragments as JSON geometry
    ExportFragments {
        /// Output directory
        dir: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ViewerConfig::load(path)?,
        None => ViewerConfig::default(),
    };

    let filter = match (&config.log_filter, cli.verbose) {
        (_, true) => "debug".to_string(),
        (Some(filter), false) => filter.clone(),
        (None, false) => "info".to_string(),
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("shapez-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", shapez_common::crate_info());
            println!("parser: {}", shapez_parser::crate_info());
            println!("scene: {}", shapez_scene::crate_info());
            println!("assets: {}", shapez_assets::crate_info());
            println!("model: {}", shapez_model::crate_info());
            println!("render: {}", shapez_render::crate_info());
            println!("viewer: {}", shapez_viewer::crate_info());
        }
        Commands::Decode { identifier, json } => {
            let shape = shapez_parser::decode(&identifier)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&shape)?);
            } else {
                println!("{} ({} layers)", shape.identifier(), shape.layers().len());
                for (i, layer) in shape.layers().iter().enumerate() {
                    let quarters: Vec<String> = layer
                        .quarters()
                        .iter()
                        .map(|q| format!("{:?}/{:?}", q.kind, q.color))
                        .collect();
                    println!("  layer {i}: {}", quarters.join(" "));
                }
            }
        }
        Commands::Validate { identifiers } => {
            let mut invalid = 0;
            for identifier in &identifiers {
                match shapez_parser::decode(identifier) {
                    Ok(_) => println!("ok       {identifier}"),
                    Err(e) => {
                        invalid += 1;
                        println!("invalid  {identifier}: {e}");
                    }
                }
            }
            if invalid > 0 {
                anyhow::bail!("{invalid} of {} identifiers invalid", identifiers.len());
            }
        }
        Commands::Layout { shape, frames } => {
            let mut config = config;
            if !shape.is_empty() {
                config.views = shape
                    .into_iter()
                    .map(|s| ViewConfig {
                        shape: Some(s),
                        region: None,
                    })
                    .collect();
            }
            let registry = Rc::new(QuarterRegistry::with_loader(config.fragments.loader()));
            let mut viewer = MultiShapeViewer::new(
                &Headless,
                DebugTextBackend::new(),
                config.surface(),
                config.view_options(),
                registry,
                ManualFrames::new(),
            )?;
            pollster::block_on(viewer.init()).context("loading quarter fragments")?;

            viewer.start();
            let mut drawn = 0;
            while drawn < frames && viewer.render_loop_mut().scheduler_mut().take_request() {
                let stats = viewer.on_frame()?;
                tracing::debug!(?stats, "frame drawn");
                drawn += 1;
            }
            viewer.stop();
            print!("{}", viewer.backend().transcript());
        }
        Commands::ExportFragments { dir } => {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("creating {}", dir.display()))?;
            for (kind, name) in QUARTER_FRAGMENTS {
                let geometry = ProceduralLoader::generate(name)?;
                let path = write_fragment(&dir, &geometry)?;
                println!(
                    "{} {:<16} {:>4} triangles -> {}",
                    kind.as_char(),
                    name,
                    geometry.triangle_count(),
                    path.display()
                );
            }
        }
    }

    Ok(())
}
