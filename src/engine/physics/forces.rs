use eframe::egui::{Vec2, vec2};

use super::quadtree::QuadNode;
use crate::engine::segments::SimConstraint;

const MIN_DISTANCE: f32 = 0.0001;

fn jitter_direction(from: usize, to: usize) -> Vec2 {
    let angle = ((from as f32) * 0.618_034 + (to as f32) * 0.414_214) * std::f32::consts::TAU;
    vec2(angle.cos(), angle.sin())
}

/// Velocity change on point `index` from the single point `other`. Negative
/// `strength` pushes `index` away.
fn charge_between(index: usize, other: usize, positions: &[Vec2], params: ChargeParams) -> Vec2 {
    let delta = positions[other] - positions[index];
    let distance_sq = delta.length_sq();
    if distance_sq <= MIN_DISTANCE * MIN_DISTANCE {
        let direction = jitter_direction(index.min(other), index.max(other));
        let sign = if index < other { 1.0 } else { -1.0 };
        return direction * (sign * params.strength / params.softening.sqrt());
    }
    delta * (params.strength / (distance_sq + params.softening))
}

#[derive(Clone, Copy)]
pub(super) struct ChargeParams {
    pub(super) strength: f32,
    pub(super) softening: f32,
    pub(super) theta: f32,
}

pub(super) fn accumulate_charge_for_point(
    node: &QuadNode,
    index: usize,
    positions: &[Vec2],
    params: ChargeParams,
    velocity: &mut Vec2,
) {
    if node.mass <= 0.0 {
        return;
    }

    let point = positions[index];

    if node.is_leaf() {
        for &other in &node.indices {
            if other != index {
                *velocity += charge_between(index, other, positions, params);
            }
        }
        return;
    }

    let delta = node.center_of_mass - point;
    let distance_sq = delta.length_sq().max(MIN_DISTANCE);
    let far_enough = !node.bounds.contains(point)
        && (node.bounds.side_length() / distance_sq.sqrt()) < params.theta;

    if far_enough {
        *velocity += delta * ((params.strength * node.mass) / (distance_sq + params.softening));
        return;
    }

    for child in node.children() {
        accumulate_charge_for_point(child, index, positions, params, velocity);
    }
}

/// Spring correction toward each constraint's target length, split evenly
/// between the two points and scaled by the constraint's own strength.
pub(super) fn apply_constraints(
    constraints: &[SimConstraint],
    positions: &[Vec2],
    velocities: &mut [Vec2],
    alpha: f32,
) {
    for constraint in constraints {
        let (source, target) = (constraint.source, constraint.target);
        if source >= positions.len() || target >= positions.len() || source == target {
            continue;
        }

        let predicted_source = positions[source] + velocities[source];
        let predicted_target = positions[target] + velocities[target];
        let delta = predicted_target - predicted_source;
        let distance = delta.length();
        let direction = if distance > MIN_DISTANCE {
            delta / distance
        } else {
            jitter_direction(source, target)
        };

        let stretch = (distance - constraint.length) * constraint.strength * alpha;
        let correction = direction * (stretch * 0.5);
        velocities[source] += correction;
        velocities[target] -= correction;
    }
}

#[derive(Clone, Copy)]
pub(super) struct CollisionParams {
    pub(super) strength: f32,
}

fn resolve_pair(
    from: usize,
    to: usize,
    predicted: &[Vec2],
    radii: &[f32],
    params: CollisionParams,
    corrections: &mut [Vec2],
) {
    let min_distance = radii[from] + radii[to];
    if min_distance <= 0.0 {
        return;
    }

    let delta = predicted[from] - predicted[to];
    let distance_sq = delta.length_sq();
    if distance_sq >= min_distance * min_distance {
        return;
    }

    let distance = distance_sq.sqrt();
    let direction = if distance > MIN_DISTANCE {
        delta / distance
    } else {
        jitter_direction(from, to)
    };
    let push = direction * ((min_distance - distance) * params.strength * 0.5);
    corrections[from] += push;
    corrections[to] -= push;
}

/// Dual-tree traversal collecting overlap corrections for every pair of
/// points closer than the sum of their radii.
pub(super) fn accumulate_collision_pairs(
    node_a: &QuadNode,
    node_b: &QuadNode,
    same_node: bool,
    predicted: &[Vec2],
    radii: &[f32],
    params: CollisionParams,
    corrections: &mut [Vec2],
) {
    if node_a.bounds.gap_to(node_b.bounds) > node_a.max_radius + node_b.max_radius {
        return;
    }

    if node_a.is_leaf() && node_b.is_leaf() {
        if same_node {
            for (offset, &from) in node_a.indices.iter().enumerate() {
                for &to in &node_a.indices[offset + 1..] {
                    resolve_pair(from, to, predicted, radii, params, corrections);
                }
            }
        } else {
            for &from in &node_a.indices {
                for &to in &node_b.indices {
                    resolve_pair(from, to, predicted, radii, params, corrections);
                }
            }
        }
        return;
    }

    if same_node {
        let children = node_a.children().collect::<Vec<_>>();
        for (offset, child_a) in children.iter().enumerate() {
            accumulate_collision_pairs(child_a, child_a, true, predicted, radii, params, corrections);
            for child_b in &children[offset + 1..] {
                accumulate_collision_pairs(
                    child_a,
                    child_b,
                    false,
                    predicted,
                    radii,
                    params,
                    corrections,
                );
            }
        }
        return;
    }

    let split_a = if node_a.is_leaf() {
        false
    } else if node_b.is_leaf() {
        true
    } else {
        node_a.bounds.half_extent >= node_b.bounds.half_extent
    };

    if split_a {
        for child in node_a.children() {
            accumulate_collision_pairs(child, node_b, false, predicted, radii, params, corrections);
        }
    } else {
        for child in node_b.children() {
            accumulate_collision_pairs(node_a, child, false, predicted, radii, params, corrections);
        }
    }
}
