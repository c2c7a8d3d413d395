use anyhow::{Context, Result};
use clap::Parser;
use flowkit_editor::{
    load_document, save_document, AutoLayout, FlowConfig, FlowStore, RankDir,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::{prelude::*, EnvFilter};

/// Lay out a node graph document
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Graph document (RON) to lay out
    graph: PathBuf,

    /// Rank direction, LR or TB
    #[arg(short, long, default_value_t = RankDir::LeftToRight)]
    direction: RankDir,

    /// Move the nodes to their new positions over several frames
    #[arg(long)]
    animate: bool,

    /// Frame rate of the animation
    #[arg(long, default_value_t = 60)]
    fps: u32,

    /// Wait between frames instead of simulating them
    #[arg(long)]
    realtime: bool,

    /// Configuration file (RON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Where to write the laid out document, stdout if missing
    #[arg(short, long)]
    output: Option<PathBuf>,
}

async fn run(args: Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => FlowConfig::load(path)?,
        None => FlowConfig::default(),
    };

    let document = load_document(&args.graph)?;
    let mut store = FlowStore::from_document(document, &config)
        .with_context(|| format!("Invalid graph in {:?}", args.graph))?;
    let mut auto_layout = AutoLayout::new(config.layout.clone());

    let nodes = store.node_ids();
    let edges = store.edges();
    let completion = auto_layout.layout(&mut store, &nodes, &edges, args.direction, args.animate)?;

    let frame = Duration::from_secs(1) / args.fps.max(1);
    let mut ticker = tokio::time::interval(frame);
    let mut frames = 0;
    loop {
        if args.realtime {
            ticker.tick().await;
        }
        frames += 1;
        if !store.advance(frame) {
            break;
        }
        debug!("Frame {frames}");
    }

    completion.await.context("Layout did not complete")?;

    let transform = store.viewport().transform();
    info!(
        "Laid out {} nodes in {frames} frames, viewport zoom {:.3} translation {:?}",
        nodes.len(),
        transform.scaling,
        transform.translation
    );

    let document = store.to_document();
    match &args.output {
        Some(path) => save_document(&document, path)?,
        None => println!("{}", document.to_ron()?),
    }

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    run(args).await
}
