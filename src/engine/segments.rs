use std::collections::HashMap;
use std::f32::consts::TAU;

use eframe::egui::{Vec2, vec2};
use rand::Rng;

use crate::assembly::AssemblyGraph;

pub const LENGTH_EXPONENT: f32 = 0.4;
pub const LENGTH_SCALE: f32 = 0.5;
pub const BASE_OFFSET: f32 = 12.0;
pub const BACKBONE_STRENGTH: f32 = 1.0;
pub const EDGE_STRENGTH: f32 = 0.5;

const MIN_LENGTH_MULTIPLIER: f32 = 0.05;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EndpointRole {
    Start,
    End,
}

impl EndpointRole {
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::End => "end",
        }
    }
}

pub fn point_id(parent_id: &str, role: EndpointRole) -> String {
    format!("{parent_id}_{}", role.suffix())
}

/// Sub-linear mapping from base pairs to on-canvas segment length.
pub fn visual_length(length_bp: u64, length_multiplier: f32) -> f32 {
    let multiplier = length_multiplier.max(MIN_LENGTH_MULTIPLIER);
    BASE_OFFSET + (length_bp as f32).powf(LENGTH_EXPONENT) * LENGTH_SCALE * multiplier
}

#[derive(Clone, Debug, PartialEq)]
pub struct SimPoint {
    pub id: String,
    pub parent: usize,
    pub role: EndpointRole,
    pub position: Vec2,
    pub velocity: Vec2,
    pub fixed: Option<Vec2>,
    pub collision_radius: f32,
}

impl SimPoint {
    pub fn is_pinned(&self) -> bool {
        self.fixed.is_some()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConstraintKind {
    Backbone,
    Edge,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimConstraint {
    pub kind: ConstraintKind,
    pub source: usize,
    pub target: usize,
    pub length: f32,
    pub strength: f32,
}

/// A contig as the engine sees it: logical attributes plus its two points.
#[derive(Clone, Debug, PartialEq)]
pub struct SegmentNode {
    pub id: String,
    pub label: Option<String>,
    pub length: u64,
    pub coverage: f32,
    pub visual_length: f32,
    pub start: usize,
    pub end: usize,
}

impl SegmentNode {
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.id)
    }
}

/// A logical link kept for drawing, from `source`'s end point to `target`'s
/// start point.
#[derive(Clone, Debug, PartialEq)]
pub struct SegmentLink {
    pub id: String,
    pub source: usize,
    pub target: usize,
    pub overlap: i64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeometryParams {
    pub length_multiplier: f32,
    pub node_width: f32,
    pub collision_radius: f32,
    pub link_distance: f32,
}

impl GeometryParams {
    pub fn point_radius(&self) -> f32 {
        self.collision_radius.max(0.0) + self.node_width.max(0.0) * 0.5
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PriorPoint {
    pub position: Vec2,
    pub velocity: Vec2,
    pub fixed: Option<Vec2>,
}

/// Arena of simulation points and constraints. Node `i` owns points `2i`
/// (start) and `2i + 1` (end).
#[derive(Clone, Debug, Default)]
pub struct SegmentGraph {
    pub nodes: Vec<SegmentNode>,
    pub links: Vec<SegmentLink>,
    pub points: Vec<SimPoint>,
    pub constraints: Vec<SimConstraint>,
    pub index_by_node: HashMap<String, usize>,
}

impl SegmentGraph {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn node_index(&self, id: &str) -> Option<usize> {
        self.index_by_node.get(id).copied()
    }

    pub fn node_endpoints(&self, node: usize) -> Option<(Vec2, Vec2)> {
        let node = self.nodes.get(node)?;
        Some((
            self.points.get(node.start)?.position,
            self.points.get(node.end)?.position,
        ))
    }

    pub fn positions(&self) -> Vec<Vec2> {
        self.points.iter().map(|point| point.position).collect()
    }

    pub fn prior_points(&self) -> HashMap<String, PriorPoint> {
        self.points
            .iter()
            .map(|point| {
                (
                    point.id.clone(),
                    PriorPoint {
                        position: point.position,
                        velocity: point.velocity,
                        fixed: point.fixed,
                    },
                )
            })
            .collect()
    }

    /// Drops constraints whose endpoints fall outside the point arena.
    pub fn validate_constraints(&mut self) -> usize {
        let point_count = self.points.len();
        let before = self.constraints.len();
        self.constraints.retain(|constraint| {
            let valid = constraint.source < point_count
                && constraint.target < point_count
                && constraint.source != constraint.target;
            if !valid {
                tracing::warn!(
                    source = constraint.source,
                    target = constraint.target,
                    points = point_count,
                    "dropping constraint with a missing point"
                );
            }
            valid
        });
        before - self.constraints.len()
    }

    pub fn set_link_distance(&mut self, link_distance: f32) {
        for constraint in &mut self.constraints {
            if constraint.kind == ConstraintKind::Edge {
                constraint.length = link_distance;
            }
        }
    }

    pub fn set_point_radius(&mut self, radius: f32) {
        for point in &mut self.points {
            point.collision_radius = radius;
        }
    }

    /// Moves a node's two points by `delta`, carrying pinned coordinates along.
    pub fn translate_node(&mut self, node: usize, delta: Vec2) -> bool {
        let Some(&SegmentNode { start, end, .. }) = self.nodes.get(node) else {
            return false;
        };

        for index in [start, end] {
            if let Some(point) = self.points.get_mut(index) {
                point.position += delta;
                point.velocity = Vec2::ZERO;
                if let Some(fixed) = point.fixed.as_mut() {
                    *fixed += delta;
                }
            }
        }
        true
    }

    pub fn pin_node(&mut self, node: usize) {
        let Some(&SegmentNode { start, end, .. }) = self.nodes.get(node) else {
            return;
        };
        for index in [start, end] {
            if let Some(point) = self.points.get_mut(index) {
                point.fixed = Some(point.position);
                point.velocity = Vec2::ZERO;
            }
        }
    }

    pub fn unpin_node(&mut self, node: usize) {
        let Some(&SegmentNode { start, end, .. }) = self.nodes.get(node) else {
            return;
        };
        for index in [start, end] {
            if let Some(point) = self.points.get_mut(index) {
                point.fixed = None;
            }
        }
    }
}

/// Turns a filtered logical graph into the simulated segment graph.
pub struct SegmentGraphBuilder<'a, R: Rng> {
    params: GeometryParams,
    prior: &'a HashMap<String, PriorPoint>,
    rng: &'a mut R,
}

impl<'a, R: Rng> SegmentGraphBuilder<'a, R> {
    pub fn new(
        params: GeometryParams,
        prior: &'a HashMap<String, PriorPoint>,
        rng: &'a mut R,
    ) -> Self {
        Self { params, prior, rng }
    }

    fn spawn_radius(node_count: usize, link_distance: f32) -> f32 {
        60.0 + (node_count as f32).sqrt() * link_distance.max(1.0)
    }

    fn place_endpoints(&mut self, visual_length: f32, spawn_radius: f32) -> (Vec2, Vec2) {
        let angle = self.rng.gen_range(0.0..TAU);
        let center = vec2(
            self.rng.gen_range(-spawn_radius..=spawn_radius),
            self.rng.gen_range(-spawn_radius..=spawn_radius),
        );
        let half = Vec2::angled(angle) * (visual_length * 0.5);
        (center - half, center + half)
    }

    fn make_point(
        &mut self,
        parent_id: &str,
        parent: usize,
        role: EndpointRole,
        fresh_position: Vec2,
    ) -> SimPoint {
        let id = point_id(parent_id, role);
        let radius = self.params.point_radius();
        match self.prior.get(&id) {
            Some(prior) => SimPoint {
                id,
                parent,
                role,
                position: prior.position,
                velocity: prior.velocity,
                fixed: prior.fixed,
                collision_radius: radius,
            },
            None => SimPoint {
                id,
                parent,
                role,
                position: fresh_position,
                velocity: Vec2::ZERO,
                fixed: None,
                collision_radius: radius,
            },
        }
    }

    pub fn build(mut self, graph: &AssemblyGraph) -> SegmentGraph {
        let node_count = graph.node_count();
        let spawn_radius = Self::spawn_radius(node_count, self.params.link_distance);

        let mut nodes = Vec::with_capacity(node_count);
        let mut points = Vec::with_capacity(node_count * 2);
        let mut constraints = Vec::with_capacity(node_count + graph.link_count());
        let mut index_by_node = HashMap::with_capacity(node_count);

        for (index, logical) in graph.nodes.iter().enumerate() {
            let length = visual_length(logical.length, self.params.length_multiplier);
            let (fresh_start, fresh_end) = self.place_endpoints(length, spawn_radius);

            let start = points.len();
            points.push(self.make_point(&logical.id, index, EndpointRole::Start, fresh_start));
            let end = points.len();
            points.push(self.make_point(&logical.id, index, EndpointRole::End, fresh_end));

            constraints.push(SimConstraint {
                kind: ConstraintKind::Backbone,
                source: start,
                target: end,
                length,
                strength: BACKBONE_STRENGTH,
            });
            index_by_node.insert(logical.id.clone(), index);
            nodes.push(SegmentNode {
                id: logical.id.clone(),
                label: logical.label.clone(),
                length: logical.length,
                coverage: logical.coverage,
                visual_length: length,
                start,
                end,
            });
        }

        let mut links = Vec::with_capacity(graph.link_count());
        for link in &graph.links {
            let (Some(&source), Some(&target)) = (
                index_by_node.get(&link.source),
                index_by_node.get(&link.target),
            ) else {
                tracing::warn!(link = %link.id, "dropping link constraint with a missing point");
                continue;
            };

            links.push(SegmentLink {
                id: link.id.clone(),
                source,
                target,
                overlap: link.overlap,
            });

            if source == target {
                continue;
            }
            constraints.push(SimConstraint {
                kind: ConstraintKind::Edge,
                source: nodes[source].end,
                target: nodes[target].start,
                length: self.params.link_distance,
                strength: EDGE_STRENGTH,
            });
        }

        tracing::debug!(
            nodes = nodes.len(),
            points = points.len(),
            constraints = constraints.len(),
            "built segment graph"
        );

        SegmentGraph {
            nodes,
            links,
            points,
            constraints,
            index_by_node,
        }
    }
}
