mod app;
mod graph;
mod layout;
mod query;
mod render;
mod util;

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::app::{ExplorerApp, ExplorerConfig};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Saved JSON response of a graph query to open on startup.
    #[arg(long)]
    input: Option<PathBuf>,

    /// Query kind that produced the input: node, relationship, cypher, composition or pathfinding.
    #[arg(long, default_value = "cypher")]
    kind: String,

    /// Edge width in screen pixels.
    #[arg(long, default_value_t = 1.5)]
    edge_width: f32,

    /// Force layout iterations; large results run fewer.
    #[arg(long, default_value_t = 220)]
    layout_iterations: usize,
}

fn main() -> eframe::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();
    let config = ExplorerConfig {
        input: args.input,
        kind_tag: args.kind,
        edge_width: args.edge_width,
        layout_iterations: args.layout_iterations,
    };
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "secgraph-explorer",
        options,
        Box::new(move |cc| Ok(Box::new(ExplorerApp::new(cc, config.clone())))),
    )
}
