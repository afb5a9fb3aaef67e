//! Headless layout and interaction engine.
//!
//! [`LayoutEngine`] owns the logical graph, the component filter result, the
//! simulated segment graph and the view/selection state. The host drives it
//! with [`LayoutEngine::tick`] once per frame and forwards pointer gestures;
//! everything the UI needs to react to comes back through
//! [`LayoutEngine::drain_events`].

pub mod highlight;
pub mod physics;
pub mod segments;
pub mod selection;
pub mod view;

use std::collections::VecDeque;
use std::time::Instant;

use eframe::egui::{Pos2, Rect};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::assembly::{
    AssemblyGraph, ComponentStats, FilteredGraph, GraphVisibility, LogicalNode,
    filter_small_components,
};
use crate::settings::{Settings, SettingsImpact};
use highlight::Highlight;
use physics::{ForceParams, PositionSnapshot, Simulation};
use segments::{GeometryParams, SegmentGraph, SegmentGraphBuilder, SegmentNode};
use selection::{GestureOutcome, InteractionContext, InteractionMode, SelectionController};
use view::ViewTransform;

const REBUILD_ALPHA: f32 = 0.3;

#[derive(Clone, Debug, PartialEq)]
pub enum EngineEvent {
    SelectionChanged(Vec<LogicalNode>),
    GraphHidden(bool),
    Positions(PositionSnapshot),
}

fn geometry_params(settings: &Settings) -> GeometryParams {
    GeometryParams {
        length_multiplier: settings.node_length_scale,
        node_width: settings.node_width_scale,
        collision_radius: settings.collision_radius,
        link_distance: settings.link_distance,
    }
}

fn force_params(settings: &Settings) -> ForceParams {
    ForceParams {
        charge_strength: settings.charge_strength,
        link_distance: settings.link_distance,
        point_radius: geometry_params(settings).point_radius(),
    }
}

pub struct LayoutEngine<R: Rng = ChaCha8Rng> {
    settings: Settings,
    full: AssemblyGraph,
    filtered: FilteredGraph,
    segments: SegmentGraph,
    simulation: Simulation,
    view: ViewTransform,
    selection: SelectionController,
    rng: R,
    revision: u64,
    hidden: bool,
    last_tick: Option<Instant>,
    events: VecDeque<EngineEvent>,
}

impl LayoutEngine<ChaCha8Rng> {
    /// Engine with reproducible initial placement for a given seed.
    pub fn new(settings: Settings, seed: u64) -> Self {
        Self::with_rng(settings, ChaCha8Rng::seed_from_u64(seed))
    }
}

impl<R: Rng> LayoutEngine<R> {
    pub fn with_rng(settings: Settings, rng: R) -> Self {
        let settings = settings.sanitized();
        let simulation = Simulation::new(force_params(&settings));
        Self {
            settings,
            full: AssemblyGraph::default(),
            filtered: filter_small_components(&AssemblyGraph::default(), 0),
            segments: SegmentGraph::default(),
            simulation,
            view: ViewTransform::default(),
            selection: SelectionController::default(),
            rng,
            revision: 0,
            hidden: false,
            last_tick: None,
            events: VecDeque::new(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn graph(&self) -> &AssemblyGraph {
        &self.full
    }

    pub fn filtered_graph(&self) -> &AssemblyGraph {
        &self.filtered.graph
    }

    pub fn component_stats(&self) -> ComponentStats {
        self.filtered.stats
    }

    pub fn visibility(&self) -> GraphVisibility {
        self.filtered.visibility()
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn segments(&self) -> &SegmentGraph {
        &self.segments
    }

    pub fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    pub fn view(&self) -> &ViewTransform {
        &self.view
    }

    pub fn selection(&self) -> &SelectionController {
        &self.selection
    }

    pub fn mode(&self) -> InteractionMode {
        self.selection.mode()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Replaces the logical graph wholesale. Points whose ids survive keep
    /// their positions and pins. Duplicate nodes and dangling links are
    /// dropped here as well, since the graph fields are public.
    pub fn load_graph(&mut self, graph: AssemblyGraph) {
        let (graph, issues) = AssemblyGraph::from_parts(graph.nodes, graph.links);
        tracing::info!(
            nodes = graph.node_count(),
            links = graph.link_count(),
            skipped = issues.len(),
            "loading graph into layout engine"
        );
        self.full = graph;
        if !self.rebuild() {
            self.events.push_back(EngineEvent::GraphHidden(self.hidden));
        }
    }

    /// Applies new settings, redoing only as much work as the change needs.
    pub fn apply_settings(&mut self, next: Settings) -> SettingsImpact {
        let next = next.sanitized();
        let impact = self.settings.impact(&next);
        self.settings = next;

        if impact.rebuild {
            self.rebuild();
        } else if impact.forces {
            self.simulation
                .update_parameters(&mut self.segments, force_params(&self.settings));
        }
        impact
    }

    /// Rebuilds the segment graph from the full graph. Returns true when the
    /// hidden state flipped and was reported.
    fn rebuild(&mut self) -> bool {
        let prior = self.segments.prior_points();
        self.filtered = filter_small_components(&self.full, self.settings.min_nodes_to_render);
        self.segments = SegmentGraphBuilder::new(
            geometry_params(&self.settings),
            &prior,
            &mut self.rng,
        )
        .build(&self.filtered.graph);
        self.segments.validate_constraints();
        self.revision += 1;

        let reused = self
            .segments
            .points
            .iter()
            .filter(|point| prior.contains_key(&point.id))
            .count();
        self.simulation
            .update_parameters(&mut self.segments, force_params(&self.settings));
        if reused == 0 {
            self.simulation.restart();
        } else {
            self.simulation.reheat(REBUILD_ALPHA);
        }
        if !self.segments.is_empty() {
            self.simulation.mark_dirty();
        }

        tracing::debug!(
            revision = self.revision,
            points = self.segments.points.len(),
            reused,
            kept_components = self.filtered.stats.kept_components,
            "rebuilt segment graph"
        );

        if self.selection.reconcile(&self.segments) {
            self.push_selection_changed();
        }
        let hidden = self.filtered.is_hidden();
        let flipped = hidden != self.hidden;
        if flipped {
            self.hidden = hidden;
            self.events.push_back(EngineEvent::GraphHidden(hidden));
        }
        flipped
    }

    pub fn freeze(&mut self) {
        self.simulation.freeze();
    }

    /// Resumes the simulation. Brush mode keeps the layout frozen until the
    /// mode is left.
    pub fn unfreeze(&mut self) {
        if self.selection.mode() == InteractionMode::FreezeBrush {
            tracing::debug!("ignoring unfreeze while in brush mode");
            return;
        }
        self.simulation.unfreeze();
    }

    pub fn is_frozen(&self) -> bool {
        self.simulation.is_frozen()
    }

    /// Brush mode freezes the layout and locks pan/zoom; navigate mode
    /// releases both.
    pub fn set_mode(&mut self, mode: InteractionMode) {
        if mode == self.selection.mode() {
            return;
        }
        let outcome = self.selection.set_mode(mode, &mut self.segments);
        self.handle_outcome(outcome);

        match mode {
            InteractionMode::FreezeBrush => {
                self.simulation.freeze();
                self.view.set_locked(true);
            }
            InteractionMode::Navigate => {
                self.view.set_locked(false);
                self.simulation.unfreeze();
            }
        }
        tracing::debug!(?mode, "interaction mode changed");
    }

    /// Advances the layout for one frame. Returns true when a position
    /// snapshot was queued.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.last_tick = Some(now);
        let snapshot = self.simulation.tick(
            &mut self.segments,
            self.revision,
            self.settings.steps_per_frame,
            now,
        );
        match snapshot {
            Some(snapshot) => {
                self.events.push_back(EngineEvent::Positions(snapshot));
                true
            }
            None => false,
        }
    }

    pub fn hit_test(&self, screen: Pos2) -> Option<&SegmentNode> {
        selection::hit_test(
            &self.segments,
            &self.view,
            screen,
            self.settings.node_width_scale,
        )
        .and_then(|index| self.segments.nodes.get(index))
    }

    fn context(&mut self) -> (&mut SelectionController, InteractionContext<'_>) {
        (
            &mut self.selection,
            InteractionContext {
                graph: &mut self.segments,
                view: &mut self.view,
                node_width: self.settings.node_width_scale,
            },
        )
    }

    pub fn click(&mut self, screen: Pos2) {
        let (selection, mut ctx) = self.context();
        let outcome = selection.click(&mut ctx, screen);
        self.handle_outcome(outcome);
    }

    pub fn begin_drag(&mut self, screen: Pos2) {
        let (selection, mut ctx) = self.context();
        let outcome = selection.begin_drag(&mut ctx, screen);
        self.handle_outcome(outcome);
    }

    pub fn drag_to(&mut self, screen: Pos2) {
        let (selection, mut ctx) = self.context();
        let outcome = selection.drag_to(&mut ctx, screen);
        self.handle_outcome(outcome);
    }

    pub fn end_drag(&mut self, screen: Pos2) {
        let (selection, mut ctx) = self.context();
        let outcome = selection.end_drag(&mut ctx, screen);
        self.handle_outcome(outcome);
    }

    /// Ends the current gesture where the pointer was last seen, for hosts
    /// that lose the pointer position on release.
    pub fn release_drag(&mut self) {
        if let Some(last) = self.selection.last_pointer() {
            self.end_drag(last);
        }
    }

    pub fn brush_rect(&self) -> Option<Rect> {
        self.selection.brush_rect()
    }

    pub fn zoom_about(&mut self, anchor: Pos2, factor: f32) -> bool {
        self.view.zoom_about(anchor, factor)
    }

    pub fn center_view(&mut self, center: Pos2) {
        self.view.center_on(center);
    }

    pub fn clear_selection(&mut self) {
        if self.selection.clear_selection() {
            self.push_selection_changed();
        }
    }

    pub fn select_matching(&mut self, query: &str) {
        if self.selection.select_matching(&self.segments, query) {
            self.push_selection_changed();
        }
    }

    /// Selected nodes in selection order.
    pub fn selected_nodes(&self) -> Vec<LogicalNode> {
        let index = self.filtered.graph.index_by_id();
        self.selection
            .selected()
            .iter()
            .filter_map(|id| index.get(id.as_str()))
            .filter_map(|&node| self.filtered.graph.nodes.get(node).cloned())
            .collect()
    }

    pub fn highlight(&self) -> Highlight {
        Highlight::compute(&self.segments, self.selection.selected())
    }

    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        self.events.drain(..).collect()
    }

    fn push_selection_changed(&mut self) {
        let nodes = self.selected_nodes();
        self.events.push_back(EngineEvent::SelectionChanged(nodes));
    }

    fn handle_outcome(&mut self, outcome: GestureOutcome) {
        // A new grab can end the previous one in the same step.
        if outcome.node_drag_ended {
            self.simulation.set_dragging(false);
        }
        if outcome.node_drag_started {
            self.simulation.set_dragging(true);
        }
        if outcome.positions_changed {
            self.simulation.mark_dirty();
            // The frozen simulation never steps, so group moves are pushed out here.
            // Stamped with the host's clock so the throttle stays on one time base.
            if self.simulation.is_frozen() {
                let now = self.last_tick.unwrap_or_else(Instant::now);
                let snapshot = self
                    .simulation
                    .force_snapshot(&self.segments, self.revision, now);
                self.events.push_back(EngineEvent::Positions(snapshot));
            }
        }
        if outcome.selection_changed {
            self.push_selection_changed();
        }
    }
}
