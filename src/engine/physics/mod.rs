mod forces;
mod quadtree;

use std::time::{Duration, Instant};

use eframe::egui::Vec2;

use super::segments::SegmentGraph;
use forces::{
    ChargeParams, CollisionParams, accumulate_charge_for_point, accumulate_collision_pairs,
    apply_constraints,
};
use quadtree::QuadNode;

const BARNES_HUT_THETA: f32 = 0.72;
const CHARGE_SOFTENING: f32 = 1.0;
const CENTER_STRENGTH: f32 = 0.02;
const COLLISION_STRENGTH: f32 = 0.7;
const COLLISION_PASSES: usize = 2;
const VELOCITY_DECAY: f32 = 0.4;
const ALPHA_MIN: f32 = 0.001;
const UNFREEZE_ALPHA: f32 = 0.1;
const RETUNE_ALPHA: f32 = 0.3;
const DRAG_ALPHA_TARGET: f32 = 0.3;
pub const SNAPSHOT_INTERVAL: Duration = Duration::from_millis(16);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    Running,
    Frozen,
}

/// Force coefficients that can change without rebuilding the segment graph.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ForceParams {
    pub charge_strength: f32,
    pub link_distance: f32,
    pub point_radius: f32,
}

/// Copy-out of every point position after a complete integration step.
#[derive(Clone, Debug, PartialEq)]
pub struct PositionSnapshot {
    pub revision: u64,
    pub step: u64,
    pub positions: Vec<Vec2>,
}

#[derive(Default)]
struct PhysicsScratch {
    positions: Vec<Vec2>,
    velocities: Vec<Vec2>,
    predicted: Vec<Vec2>,
    corrections: Vec<Vec2>,
    radii: Vec<f32>,
}

/// The running/frozen simulation over a [`SegmentGraph`]. Energy is tracked
/// as `alpha`, which cools toward `alpha_target` each step; once it falls
/// below the minimum the layout is settled and steps become no-ops.
pub struct Simulation {
    state: RunState,
    alpha: f32,
    alpha_target: f32,
    alpha_decay: f32,
    params: ForceParams,
    steps: u64,
    dirty: bool,
    last_emit: Option<Instant>,
    scratch: PhysicsScratch,
}

impl Simulation {
    pub fn new(params: ForceParams) -> Self {
        Self {
            state: RunState::Running,
            alpha: 1.0,
            alpha_target: 0.0,
            alpha_decay: 1.0 - ALPHA_MIN.powf(1.0 / 300.0),
            params,
            steps: 0,
            dirty: false,
            last_emit: None,
            scratch: PhysicsScratch::default(),
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn is_frozen(&self) -> bool {
        self.state == RunState::Frozen
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn params(&self) -> ForceParams {
        self.params
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn is_settled(&self) -> bool {
        self.alpha < ALPHA_MIN && self.alpha_target < ALPHA_MIN
    }

    pub fn freeze(&mut self) {
        if self.state != RunState::Frozen {
            tracing::debug!(alpha = self.alpha, "simulation frozen");
        }
        self.state = RunState::Frozen;
    }

    pub fn unfreeze(&mut self) {
        if self.state == RunState::Frozen {
            self.state = RunState::Running;
            self.reheat(UNFREEZE_ALPHA);
            tracing::debug!(alpha = self.alpha, "simulation resumed");
        }
    }

    pub fn reheat(&mut self, alpha: f32) {
        self.alpha = self.alpha.max(alpha.clamp(0.0, 1.0));
    }

    pub fn restart(&mut self) {
        self.alpha = 1.0;
    }

    pub fn set_dragging(&mut self, dragging: bool) {
        self.alpha_target = if dragging { DRAG_ALPHA_TARGET } else { 0.0 };
        if dragging {
            self.reheat(DRAG_ALPHA_TARGET);
        }
    }

    /// Retunes coefficients in place and applies a bounded amount of energy
    /// so the layout relaxes into the new parameters.
    pub fn update_parameters(&mut self, graph: &mut SegmentGraph, params: ForceParams) {
        if params.link_distance != self.params.link_distance {
            graph.set_link_distance(params.link_distance);
        }
        if params.point_radius != self.params.point_radius {
            graph.set_point_radius(params.point_radius);
        }
        self.params = params;
        self.reheat(RETUNE_ALPHA);
        tracing::debug!(
            charge = params.charge_strength,
            link_distance = params.link_distance,
            radius = params.point_radius,
            "force parameters updated"
        );
    }

    /// Marks that positions changed outside of a step (drag, rebuild) so the
    /// next snapshot opportunity emits them.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// One full integration step. Returns false when nothing was integrated.
    pub fn step(&mut self, graph: &mut SegmentGraph) -> bool {
        if self.state == RunState::Frozen || graph.is_empty() || self.is_settled() {
            return false;
        }

        self.alpha += (self.alpha_target - self.alpha) * self.alpha_decay;
        let alpha = self.alpha;

        let point_count = graph.points.len();
        let scratch = &mut self.scratch;
        scratch.positions.clear();
        scratch.velocities.clear();
        scratch.radii.clear();
        for point in &graph.points {
            scratch.positions.push(point.position);
            scratch.velocities.push(point.velocity);
            scratch.radii.push(point.collision_radius);
        }

        apply_constraints(
            &graph.constraints,
            &scratch.positions,
            &mut scratch.velocities,
            alpha,
        );

        if self.params.charge_strength != 0.0 && point_count > 1 {
            if let Some(tree) = QuadNode::build(&scratch.positions, &scratch.radii) {
                let charge = ChargeParams {
                    strength: self.params.charge_strength * alpha,
                    softening: CHARGE_SOFTENING,
                    theta: BARNES_HUT_THETA,
                };
                for (index, velocity) in scratch.velocities.iter_mut().enumerate() {
                    accumulate_charge_for_point(&tree, index, &scratch.positions, charge, velocity);
                }
            }
        }

        for (position, velocity) in scratch.positions.iter().zip(scratch.velocities.iter_mut()) {
            *velocity -= *position * (CENTER_STRENGTH * alpha);
        }

        for _ in 0..COLLISION_PASSES {
            scratch.predicted.clear();
            scratch.predicted.extend(
                scratch
                    .positions
                    .iter()
                    .zip(&scratch.velocities)
                    .map(|(position, velocity)| *position + *velocity),
            );
            scratch.corrections.clear();
            scratch.corrections.resize(point_count, Vec2::ZERO);

            let Some(tree) = QuadNode::build(&scratch.predicted, &scratch.radii) else {
                break;
            };
            accumulate_collision_pairs(
                &tree,
                &tree,
                true,
                &scratch.predicted,
                &scratch.radii,
                CollisionParams {
                    strength: COLLISION_STRENGTH,
                },
                &mut scratch.corrections,
            );
            for (velocity, correction) in scratch.velocities.iter_mut().zip(&scratch.corrections) {
                *velocity += *correction;
            }
        }

        for (point, velocity) in graph.points.iter_mut().zip(&scratch.velocities) {
            if let Some(fixed) = point.fixed {
                point.position = fixed;
                point.velocity = Vec2::ZERO;
                continue;
            }

            let velocity = *velocity * (1.0 - VELOCITY_DECAY);
            if !velocity.x.is_finite() || !velocity.y.is_finite() {
                tracing::warn!(point = %point.id, "discarding non-finite velocity");
                point.velocity = Vec2::ZERO;
                continue;
            }
            point.velocity = velocity;
            point.position += velocity;
        }

        self.steps += 1;
        self.dirty = true;
        true
    }

    /// Runs up to `max_steps` steps for one frame and returns a snapshot when
    /// positions changed and the emission interval has elapsed. Frames are
    /// independent; time spent frozen is never replayed.
    pub fn tick(
        &mut self,
        graph: &mut SegmentGraph,
        revision: u64,
        max_steps: usize,
        now: Instant,
    ) -> Option<PositionSnapshot> {
        for _ in 0..max_steps.max(1) {
            if !self.step(graph) {
                break;
            }
        }
        self.take_snapshot(graph, revision, now)
    }

    pub fn take_snapshot(
        &mut self,
        graph: &SegmentGraph,
        revision: u64,
        now: Instant,
    ) -> Option<PositionSnapshot> {
        if !self.dirty {
            return None;
        }
        if let Some(last) = self.last_emit
            && now.saturating_duration_since(last) < SNAPSHOT_INTERVAL
        {
            return None;
        }
        Some(self.force_snapshot(graph, revision, now))
    }

    pub fn force_snapshot(
        &mut self,
        graph: &SegmentGraph,
        revision: u64,
        now: Instant,
    ) -> PositionSnapshot {
        self.dirty = false;
        self.last_emit = Some(now);
        PositionSnapshot {
            revision,
            step: self.steps,
            positions: graph.positions(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use eframe::egui::vec2;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::assembly::{AssemblyGraph, LogicalLink, LogicalNode};
    use crate::engine::segments::{GeometryParams, SegmentGraphBuilder};

    fn params() -> ForceParams {
        ForceParams {
            charge_strength: -60.0,
            link_distance: 30.0,
            point_radius: 4.0,
        }
    }

    fn segments(node_count: usize) -> SegmentGraph {
        let nodes = (0..node_count)
            .map(|index| LogicalNode::new(format!("n{index}"), 500 + index as u64 * 100, 1.0))
            .collect();
        let links = (1..node_count)
            .map(|index| {
                LogicalLink::new(
                    format!("l{index}"),
                    format!("n{}", index - 1),
                    format!("n{index}"),
                    0,
                )
            })
            .collect();
        let (graph, _) = AssemblyGraph::from_parts(nodes, links);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        SegmentGraphBuilder::new(
            GeometryParams {
                length_multiplier: 1.0,
                node_width: 4.0,
                collision_radius: 2.0,
                link_distance: 30.0,
            },
            &HashMap::new(),
            &mut rng,
        )
        .build(&graph)
    }

    #[test]
    fn frozen_simulation_holds_positions() {
        let mut graph = segments(6);
        let mut simulation = Simulation::new(params());
        simulation.freeze();
        let before = graph.positions();
        let start = Instant::now();

        for frame in 0..20u64 {
            let snapshot = simulation.tick(
                &mut graph,
                1,
                4,
                start + Duration::from_millis(frame * 20),
            );
            assert!(snapshot.is_none());
        }
        assert_eq!(graph.positions(), before);
        assert_eq!(simulation.steps(), 0);
    }

    #[test]
    fn unfreeze_moves_free_points_even_after_settling() {
        let mut graph = segments(3);
        let mut simulation = Simulation::new(params());
        for _ in 0..2_000 {
            simulation.step(&mut graph);
        }
        assert!(simulation.is_settled());

        simulation.freeze();
        simulation.unfreeze();
        let before = graph.positions();
        assert!(simulation.step(&mut graph));
        assert_ne!(graph.positions(), before);
    }

    #[test]
    fn pinned_points_act_as_anchors() {
        let mut graph = segments(4);
        graph.pin_node(0);
        let pinned = graph.node_endpoints(0).unwrap();
        let mut simulation = Simulation::new(params());

        for _ in 0..50 {
            simulation.step(&mut graph);
        }

        assert_eq!(graph.node_endpoints(0).unwrap(), pinned);
        assert_eq!(graph.points[0].velocity, Vec2::ZERO);
    }

    #[test]
    fn empty_graph_is_a_valid_no_op() {
        let mut graph = SegmentGraph::default();
        let mut simulation = Simulation::new(params());
        assert!(!simulation.step(&mut graph));
        assert!(simulation.tick(&mut graph, 0, 3, Instant::now()).is_none());
    }

    #[test]
    fn snapshots_are_throttled() {
        let mut graph = segments(5);
        let mut simulation = Simulation::new(params());
        let start = Instant::now();

        assert!(simulation.tick(&mut graph, 1, 1, start).is_some());
        assert!(
            simulation
                .tick(&mut graph, 1, 1, start + Duration::from_millis(5))
                .is_none()
        );
        let late = simulation
            .tick(&mut graph, 1, 1, start + Duration::from_millis(21))
            .unwrap();
        assert_eq!(late.step, 3);
        assert_eq!(late.positions, graph.positions());
    }

    #[test]
    fn layout_relaxes_backbones_toward_visual_length() {
        let mut graph = segments(2);
        let (start, _) = graph.node_endpoints(0).unwrap();
        graph.points[1].position = start + vec2(400.0, 0.0);
        let mut simulation = Simulation::new(params());

        for _ in 0..300 {
            simulation.step(&mut graph);
        }

        let (start, end) = graph.node_endpoints(0).unwrap();
        let stretch = ((end - start).length() - graph.nodes[0].visual_length).abs();
        assert!(stretch < 60.0, "backbone still stretched by {stretch}");
    }

    #[test]
    fn retuning_keeps_positions_and_updates_edges() {
        let mut graph = segments(3);
        let mut simulation = Simulation::new(params());
        for _ in 0..1_000 {
            simulation.step(&mut graph);
        }
        let before = graph.positions();

        simulation.update_parameters(
            &mut graph,
            ForceParams {
                link_distance: 80.0,
                ..params()
            },
        );

        assert_eq!(graph.positions(), before);
        assert!(simulation.alpha() <= RETUNE_ALPHA + f32::EPSILON);
        assert!(
            graph
                .constraints
                .iter()
                .filter(|constraint| constraint.kind == crate::engine::segments::ConstraintKind::Edge)
                .all(|constraint| constraint.length == 80.0)
        );
    }
}
