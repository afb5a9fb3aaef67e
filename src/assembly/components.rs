use std::collections::HashSet;

use super::graph::AssemblyGraph;

/// Whether a filtered graph has anything to draw, and why not.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GraphVisibility {
    NoData,
    Hidden,
    Visible,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ComponentStats {
    pub total_components: usize,
    pub kept_components: usize,
    pub total_nodes: usize,
    pub kept_nodes: usize,
}

#[derive(Clone, Debug)]
pub struct FilteredGraph {
    pub graph: AssemblyGraph,
    pub stats: ComponentStats,
}

impl FilteredGraph {
    pub fn visibility(&self) -> GraphVisibility {
        if self.stats.total_nodes == 0 {
            GraphVisibility::NoData
        } else if self.graph.is_empty() {
            GraphVisibility::Hidden
        } else {
            GraphVisibility::Visible
        }
    }

    pub fn is_hidden(&self) -> bool {
        self.visibility() == GraphVisibility::Hidden
    }
}

fn undirected_adjacency(graph: &AssemblyGraph) -> Vec<Vec<usize>> {
    let index_by_id = graph.index_by_id();
    let mut adjacency = vec![Vec::new(); graph.node_count()];

    for link in &graph.links {
        let (Some(&source), Some(&target)) = (
            index_by_id.get(link.source.as_str()),
            index_by_id.get(link.target.as_str()),
        ) else {
            continue;
        };

        adjacency[source].push(target);
        if source != target {
            adjacency[target].push(source);
        }
    }
    adjacency
}

/// Partitions node indices into undirected connected components. Components
/// appear in order of their lowest node index and members are sorted, so the
/// output depends only on the vertex partition.
pub fn connected_components(graph: &AssemblyGraph) -> Vec<Vec<usize>> {
    let adjacency = undirected_adjacency(graph);
    let mut visited = vec![false; adjacency.len()];
    let mut components = Vec::new();
    let mut stack = Vec::new();

    for seed in 0..adjacency.len() {
        if visited[seed] {
            continue;
        }

        let mut members = Vec::new();
        visited[seed] = true;
        stack.push(seed);

        while let Some(current) = stack.pop() {
            members.push(current);
            for &next in &adjacency[current] {
                if !visited[next] {
                    visited[next] = true;
                    stack.push(next);
                }
            }
        }

        members.sort_unstable();
        components.push(members);
    }

    components
}

/// Drops every connected component with fewer than `min_nodes` members.
/// A threshold of zero keeps the graph unchanged.
pub fn filter_small_components(graph: &AssemblyGraph, min_nodes: usize) -> FilteredGraph {
    let components = connected_components(graph);
    let total_components = components.len();
    let total_nodes = graph.node_count();

    if min_nodes == 0 {
        return FilteredGraph {
            graph: graph.clone(),
            stats: ComponentStats {
                total_components,
                kept_components: total_components,
                total_nodes,
                kept_nodes: total_nodes,
            },
        };
    }

    let mut keep = vec![false; total_nodes];
    let mut kept_components = 0usize;
    for component in components.iter().filter(|members| members.len() >= min_nodes) {
        kept_components += 1;
        for &index in component {
            keep[index] = true;
        }
    }

    let nodes = graph
        .nodes
        .iter()
        .zip(&keep)
        .filter(|(_, kept)| **kept)
        .map(|(node, _)| node.clone())
        .collect::<Vec<_>>();
    let kept_ids = nodes
        .iter()
        .map(|node| node.id.as_str())
        .collect::<HashSet<_>>();
    let links = graph
        .links
        .iter()
        .filter(|link| {
            kept_ids.contains(link.source.as_str()) && kept_ids.contains(link.target.as_str())
        })
        .cloned()
        .collect::<Vec<_>>();

    tracing::debug!(
        min_nodes,
        total_components,
        kept_components,
        kept_nodes = nodes.len(),
        "filtered small components"
    );

    let kept_nodes = nodes.len();
    FilteredGraph {
        graph: AssemblyGraph { nodes, links },
        stats: ComponentStats {
            total_components,
            kept_components,
            total_nodes,
            kept_nodes,
        },
    }
}
