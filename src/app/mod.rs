use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use anyhow::Context as _;
use eframe::egui::{self, Context};

use contig_view::assembly::{AssemblyGraph, LogicalNode, load_graph, load_labels_json};
use contig_view::engine::{EngineEvent, LayoutEngine};
use contig_view::settings::Settings;

mod canvas;
mod render_utils;
mod ui;

/// Where the graph (and optional label overrides) are read from.
#[derive(Clone, Debug)]
pub struct GraphSource {
    pub graph: PathBuf,
    pub labels: Option<PathBuf>,
}

impl GraphSource {
    fn load(&self) -> anyhow::Result<AssemblyGraph> {
        let mut graph = load_graph(&self.graph)?;
        if let Some(labels) = &self.labels {
            let labels = load_labels_json(labels)
                .with_context(|| format!("failed to apply labels from {}", labels.display()))?;
            let applied = graph.apply_labels(&labels);
            tracing::info!(applied, "applied label overrides");
        }
        Ok(graph)
    }
}

type LoadResult = Result<AssemblyGraph, String>;

pub struct ContigViewApp {
    source: GraphSource,
    settings: Settings,
    seed: u64,
    state: AppState,
    reload_rx: Option<Receiver<LoadResult>>,
}

enum AppState {
    Loading { rx: Receiver<LoadResult> },
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    engine: LayoutEngine,
    draft: Settings,
    search: String,
    selected: Vec<LogicalNode>,
    needs_centering: bool,
}

impl ViewModel {
    fn new(graph: AssemblyGraph, settings: Settings, seed: u64) -> Self {
        let mut engine = LayoutEngine::new(settings, seed);
        engine.load_graph(graph);
        let draft = engine.settings().clone();
        Self {
            engine,
            draft,
            search: String::new(),
            selected: Vec::new(),
            needs_centering: true,
        }
    }

    /// Swaps in a reloaded graph; surviving contigs keep their positions.
    fn replace_graph(&mut self, graph: AssemblyGraph) {
        self.engine.load_graph(graph);
    }

    fn process_events(&mut self) {
        for event in self.engine.drain_events() {
            match event {
                EngineEvent::SelectionChanged(nodes) => self.selected = nodes,
                EngineEvent::GraphHidden(hidden) => {
                    if hidden {
                        tracing::info!("every component is below the minimum size");
                    }
                }
                EngineEvent::Positions(_) => {}
            }
        }
    }

    fn show(&mut self, ctx: &Context, source: &GraphSource, reload_requested: &mut bool, is_loading: bool) {
        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("contig-view");
                    ui.separator();
                    ui.label(format!("graph: {}", source.graph.display()));
                    let graph = self.engine.graph();
                    ui.label(format!("nodes: {}", graph.node_count()));
                    ui.label(format!("links: {}", graph.link_count()));
                    let stats = self.engine.component_stats();
                    ui.label(format!(
                        "components: {}/{}",
                        stats.kept_components, stats.total_components
                    ));
                    let reload_button = ui.add_enabled(!is_loading, egui::Button::new("Reload graph"));
                    if reload_button.clicked() {
                        *reload_requested = true;
                    }
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default().show(ctx, |ui| self.draw_canvas(ui));

        self.process_events();
    }
}

impl ContigViewApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        source: GraphSource,
        settings: Settings,
        seed: u64,
    ) -> Self {
        let state = Self::start_load(source.clone());
        Self {
            source,
            settings,
            seed,
            state,
            reload_rx: None,
        }
    }

    fn spawn_load(source: GraphSource) -> Receiver<LoadResult> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = source.load().map_err(|error| format!("{error:#}"));
            if let Err(error) = &result {
                tracing::warn!(%error, "graph load failed");
            }
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(source: GraphSource) -> AppState {
        AppState::Loading {
            rx: Self::spawn_load(source),
        }
    }
}

impl eframe::App for ContigViewApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                if let Ok(result) = rx.try_recv() {
                    transition = Some(match result {
                        Ok(graph) => AppState::Ready(Box::new(ViewModel::new(
                            graph,
                            self.settings.clone(),
                            self.seed,
                        ))),
                        Err(error) => AppState::Error(error),
                    });
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading assembly graph...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
                ctx.request_repaint();
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load assembly graph");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        transition = Some(Self::start_load(self.source.clone()));
                    }
                });
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                let is_reloading = self.reload_rx.is_some();
                model.show(ctx, &self.source, &mut reload_requested, is_reloading);

                if reload_requested && self.reload_rx.is_none() {
                    self.reload_rx = Some(Self::spawn_load(self.source.clone()));
                }

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        Ok(Ok(graph)) => model.replace_graph(graph),
                        Ok(Err(error)) => transition = Some(AppState::Error(error)),
                        Err(TryRecvError::Empty) => {
                            self.reload_rx = Some(rx);
                            ctx.request_repaint();
                        }
                        Err(TryRecvError::Disconnected) => {
                            transition =
                                Some(AppState::Error("Background load worker disconnected".to_owned()));
                        }
                    }
                }
            }
        }

        if let Some(next_state) = transition {
            self.reload_rx = None;
            self.state = next_state;
        }
    }
}
