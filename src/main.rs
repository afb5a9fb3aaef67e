mod app;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use contig_view::settings::Settings;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Assembly graph to open (.gfa or .json)
    graph: PathBuf,

    /// JSON settings file layered over the defaults
    #[arg(long)]
    settings: Option<PathBuf>,

    /// JSON object mapping node ids to display labels
    #[arg(long)]
    labels: Option<PathBuf>,

    /// Hide connected components with fewer nodes than this
    #[arg(long)]
    min_nodes: Option<usize>,

    /// Seed for the initial placement
    #[arg(long, default_value_t = 0)]
    seed: u64,

    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut settings =
        Settings::load(args.settings.as_deref()).context("failed to load settings")?;
    if let Some(min_nodes) = args.min_nodes {
        settings.min_nodes_to_render = min_nodes;
    }
    tracing::info!(graph = %args.graph.display(), seed = args.seed, "starting contig-view");

    let source = app::GraphSource {
        graph: args.graph,
        labels: args.labels,
    };
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "contig-view",
        options,
        Box::new(move |cc| {
            Ok(Box::new(app::ContigViewApp::new(
                cc,
                source,
                settings,
                args.seed,
            )))
        }),
    )
    .map_err(|error| anyhow::anyhow!("failed to run the viewer: {error}"))
}
