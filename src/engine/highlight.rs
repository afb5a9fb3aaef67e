use std::collections::HashSet;

use super::segments::SegmentGraph;

pub const DIMMED_OPACITY: f32 = 0.25;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeEmphasis {
    pub opacity: f32,
    pub glow: bool,
}

impl NodeEmphasis {
    pub const NORMAL: Self = Self {
        opacity: 1.0,
        glow: false,
    };
}

/// Presentation state derived from the selection; never touches positions.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Highlight {
    pub emphasis: Vec<NodeEmphasis>,
    /// Node indices back to front, selected nodes last.
    pub draw_order: Vec<usize>,
}

impl Highlight {
    pub fn compute(graph: &SegmentGraph, selected: &[String]) -> Self {
        let selected = selected
            .iter()
            .filter_map(|id| graph.node_index(id))
            .collect::<HashSet<_>>();
        let any_selected = !selected.is_empty();

        let emphasis = (0..graph.nodes.len())
            .map(|index| match (any_selected, selected.contains(&index)) {
                (false, _) => NodeEmphasis::NORMAL,
                (true, true) => NodeEmphasis {
                    opacity: 1.0,
                    glow: true,
                },
                (true, false) => NodeEmphasis {
                    opacity: DIMMED_OPACITY,
                    glow: false,
                },
            })
            .collect();

        let (mut draw_order, raised): (Vec<_>, Vec<_>) =
            (0..graph.nodes.len()).partition(|index| !selected.contains(index));
        draw_order.extend(raised);

        Self {
            emphasis,
            draw_order,
        }
    }

    pub fn for_node(&self, index: usize) -> NodeEmphasis {
        self.emphasis
            .get(index)
            .copied()
            .unwrap_or(NodeEmphasis::NORMAL)
    }
}
