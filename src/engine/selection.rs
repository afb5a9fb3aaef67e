use std::collections::HashSet;

use eframe::egui::{Pos2, Rect, Vec2};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use super::segments::SegmentGraph;
use super::view::ViewTransform;

const HIT_SLOP_PX: f32 = 6.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InteractionMode {
    #[default]
    Navigate,
    FreezeBrush,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum Gesture {
    #[default]
    Idle,
    NodeDrag {
        node_id: String,
        last: Pos2,
    },
    Pan {
        last: Pos2,
    },
    Brush {
        origin: Pos2,
        current: Pos2,
    },
    GroupDrag {
        last: Pos2,
    },
}

/// What a gesture step changed, so the engine can emit the matching events.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GestureOutcome {
    pub selection_changed: bool,
    pub positions_changed: bool,
    pub view_changed: bool,
    pub node_drag_started: bool,
    pub node_drag_ended: bool,
}

/// Mutable state a gesture may touch.
pub struct InteractionContext<'a> {
    pub graph: &'a mut SegmentGraph,
    pub view: &'a mut ViewTransform,
    pub node_width: f32,
}

fn distance_to_segment(point: Vec2, start: Vec2, end: Vec2) -> f32 {
    let segment = end - start;
    let length_sq = segment.length_sq();
    if length_sq <= f32::EPSILON {
        return (point - start).length();
    }
    let t = ((point - start).dot(segment) / length_sq).clamp(0.0, 1.0);
    (point - (start + segment * t)).length()
}

/// Index of the segment under `screen`, nearest first.
pub fn hit_test(
    graph: &SegmentGraph,
    view: &ViewTransform,
    screen: Pos2,
    node_width: f32,
) -> Option<usize> {
    let pointer = view.to_sim(screen);
    let tolerance = (node_width * 0.5).max(HIT_SLOP_PX / view.scale());

    (0..graph.nodes.len())
        .filter_map(|index| {
            let (start, end) = graph.node_endpoints(index)?;
            let distance = distance_to_segment(pointer, start, end);
            (distance <= tolerance).then_some((index, distance))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(index, _)| index)
}

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

/// Selection set plus the navigate / freeze-and-brush gesture state machine.
#[derive(Clone, Debug, Default)]
pub struct SelectionController {
    mode: InteractionMode,
    selected: Vec<String>,
    gesture: Gesture,
}

impl SelectionController {
    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.iter().any(|selected| selected == id)
    }

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    /// Screen position the current gesture last saw, if one is in flight.
    pub fn last_pointer(&self) -> Option<Pos2> {
        match &self.gesture {
            Gesture::Idle => None,
            Gesture::NodeDrag { last, .. } | Gesture::Pan { last } | Gesture::GroupDrag { last } => {
                Some(*last)
            }
            Gesture::Brush { current, .. } => Some(*current),
        }
    }

    /// The in-progress brush rectangle in screen space.
    pub fn brush_rect(&self) -> Option<Rect> {
        match &self.gesture {
            Gesture::Brush { origin, current } => Some(Rect::from_two_pos(*origin, *current)),
            _ => None,
        }
    }

    /// Switches mode, abandoning any gesture in flight.
    pub fn set_mode(&mut self, mode: InteractionMode, graph: &mut SegmentGraph) -> GestureOutcome {
        let mut outcome = GestureOutcome::default();
        if self.mode == mode {
            return outcome;
        }
        if let Gesture::NodeDrag { node_id, .. } = std::mem::take(&mut self.gesture)
            && let Some(node) = graph.node_index(&node_id)
        {
            graph.unpin_node(node);
            outcome.node_drag_ended = true;
        }
        self.mode = mode;
        outcome
    }

    pub fn replace_selection(&mut self, ids: Vec<String>) -> bool {
        let mut seen = HashSet::with_capacity(ids.len());
        let next = ids
            .into_iter()
            .filter(|id| seen.insert(id.clone()))
            .collect::<Vec<_>>();
        if next == self.selected {
            return false;
        }
        self.selected = next;
        true
    }

    pub fn clear_selection(&mut self) -> bool {
        self.replace_selection(Vec::new())
    }

    /// Drops selected ids that are no longer part of the rendered graph.
    pub fn reconcile(&mut self, graph: &SegmentGraph) -> bool {
        let before = self.selected.len();
        self.selected.retain(|id| graph.node_index(id).is_some());
        before != self.selected.len()
    }

    pub fn select_matching(&mut self, graph: &SegmentGraph, query: &str) -> bool {
        let query = query.trim();
        if query.is_empty() {
            return self.clear_selection();
        }

        let matcher = SkimMatcherV2::default();
        let matches = graph
            .nodes
            .iter()
            .filter(|node| {
                fuzzy_match_score(&matcher, &node.id, query).is_some()
                    || node
                        .label
                        .as_deref()
                        .is_some_and(|label| fuzzy_match_score(&matcher, label, query).is_some())
            })
            .map(|node| node.id.clone())
            .collect();
        self.replace_selection(matches)
    }

    pub fn click(&mut self, ctx: &mut InteractionContext<'_>, screen: Pos2) -> GestureOutcome {
        let mut outcome = GestureOutcome::default();
        if self.mode != InteractionMode::Navigate {
            return outcome;
        }

        outcome.selection_changed = match hit_test(ctx.graph, ctx.view, screen, ctx.node_width) {
            Some(node) => {
                let id = ctx.graph.nodes[node].id.clone();
                self.replace_selection(vec![id])
            }
            None => self.clear_selection(),
        };
        outcome
    }

    /// Starts a gesture. A node still held by an unfinished drag is released
    /// first; an unfinished brush is dropped without selecting.
    pub fn begin_drag(&mut self, ctx: &mut InteractionContext<'_>, screen: Pos2) -> GestureOutcome {
        let mut outcome = GestureOutcome::default();
        if let Gesture::NodeDrag { node_id, .. } = std::mem::take(&mut self.gesture) {
            if let Some(node) = ctx.graph.node_index(&node_id) {
                ctx.graph.unpin_node(node);
            }
            outcome.node_drag_ended = true;
        }
        self.gesture = match self.mode {
            InteractionMode::Navigate => {
                match hit_test(ctx.graph, ctx.view, screen, ctx.node_width) {
                    Some(node) => {
                        ctx.graph.pin_node(node);
                        outcome.node_drag_started = true;
                        Gesture::NodeDrag {
                            node_id: ctx.graph.nodes[node].id.clone(),
                            last: screen,
                        }
                    }
                    None => Gesture::Pan { last: screen },
                }
            }
            InteractionMode::FreezeBrush if !self.selected.is_empty() => {
                Gesture::GroupDrag { last: screen }
            }
            InteractionMode::FreezeBrush => Gesture::Brush {
                origin: screen,
                current: screen,
            },
        };
        outcome
    }

    pub fn drag_to(&mut self, ctx: &mut InteractionContext<'_>, screen: Pos2) -> GestureOutcome {
        let mut outcome = GestureOutcome::default();
        match &mut self.gesture {
            Gesture::Idle => {}
            Gesture::NodeDrag { node_id, last } => {
                let delta = ctx.view.screen_delta_to_sim(screen - *last);
                *last = screen;
                if let Some(node) = ctx.graph.node_index(node_id) {
                    outcome.positions_changed = ctx.graph.translate_node(node, delta);
                }
            }
            Gesture::Pan { last } => {
                outcome.view_changed = ctx.view.pan(screen - *last);
                *last = screen;
            }
            Gesture::Brush { current, .. } => {
                *current = screen;
            }
            Gesture::GroupDrag { last } => {
                let delta = ctx.view.screen_delta_to_sim(screen - *last);
                *last = screen;
                for id in &self.selected {
                    if let Some(node) = ctx.graph.node_index(id) {
                        outcome.positions_changed |= ctx.graph.translate_node(node, delta);
                    }
                }
            }
        }
        outcome
    }

    pub fn end_drag(&mut self, ctx: &mut InteractionContext<'_>, screen: Pos2) -> GestureOutcome {
        let mut outcome = self.drag_to(ctx, screen);
        match std::mem::take(&mut self.gesture) {
            Gesture::NodeDrag { node_id, .. } => {
                if let Some(node) = ctx.graph.node_index(&node_id) {
                    ctx.graph.unpin_node(node);
                }
                outcome.node_drag_ended = true;
            }
            Gesture::Brush { origin, current } => {
                let hits = brushed_nodes(ctx.graph, ctx.view, Rect::from_two_pos(origin, current));
                let mut next = self.selected.clone();
                next.extend(hits);
                outcome.selection_changed = self.replace_selection(next);
            }
            Gesture::Idle | Gesture::Pan { .. } | Gesture::GroupDrag { .. } => {}
        }
        outcome
    }
}

/// Ids of nodes with either endpoint inside the screen rectangle.
pub fn brushed_nodes(graph: &SegmentGraph, view: &ViewTransform, screen: Rect) -> Vec<String> {
    let (min, max) = view.rect_to_sim(screen);
    let inside = |point: Vec2| {
        point.x >= min.x && point.x <= max.x && point.y >= min.y && point.y <= max.y
    };

    graph
        .nodes
        .iter()
        .enumerate()
        .filter(|(index, _)| {
            graph
                .node_endpoints(*index)
                .is_some_and(|(start, end)| inside(start) || inside(end))
        })
        .map(|(_, node)| node.id.clone())
        .collect()
}
