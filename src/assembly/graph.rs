use std::collections::{HashMap, HashSet};

use thiserror::Error;

#[derive(Clone, Debug, PartialEq)]
pub struct LogicalNode {
    pub id: String,
    pub length: u64,
    pub coverage: f32,
    pub label: Option<String>,
}

impl LogicalNode {
    pub fn new(id: impl Into<String>, length: u64, coverage: f32) -> Self {
        Self {
            id: id.into(),
            length,
            coverage: coverage.max(0.0),
            label: None,
        }
    }

    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.id)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogicalLink {
    pub id: String,
    pub source: String,
    pub target: String,
    pub overlap: i64,
}

impl LogicalLink {
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
        overlap: i64,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            overlap,
        }
    }
}

/// Data-integrity problems found while accepting a graph snapshot. None of
/// them abort a load; the offending element is skipped.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GraphIssue {
    #[error("duplicate node id '{0}', keeping the first occurrence")]
    DuplicateNode(String),

    #[error("link '{link}' references unknown node '{endpoint}'")]
    DanglingLink { link: String, endpoint: String },
}

/// A complete logical snapshot: contigs and their overlap links.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AssemblyGraph {
    pub nodes: Vec<LogicalNode>,
    pub links: Vec<LogicalLink>,
}

impl AssemblyGraph {
    pub fn from_parts(
        nodes: Vec<LogicalNode>,
        links: Vec<LogicalLink>,
    ) -> (Self, Vec<GraphIssue>) {
        let mut issues = Vec::new();
        let mut seen = HashSet::with_capacity(nodes.len());
        let mut kept_nodes = Vec::with_capacity(nodes.len());

        for node in nodes {
            if seen.insert(node.id.clone()) {
                kept_nodes.push(node);
            } else {
                tracing::warn!(node = %node.id, "skipping duplicate node");
                issues.push(GraphIssue::DuplicateNode(node.id));
            }
        }

        let mut kept_links = Vec::with_capacity(links.len());
        for link in links {
            let missing = [&link.source, &link.target]
                .into_iter()
                .find(|endpoint| !seen.contains(endpoint.as_str()))
                .cloned();

            if let Some(endpoint) = missing {
                tracing::warn!(link = %link.id, endpoint = %endpoint, "skipping dangling link");
                issues.push(GraphIssue::DanglingLink {
                    link: link.id,
                    endpoint,
                });
            } else {
                kept_links.push(link);
            }
        }

        (
            Self {
                nodes: kept_nodes,
                links: kept_links,
            },
            issues,
        )
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn index_by_id(&self) -> HashMap<&str, usize> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (node.id.as_str(), index))
            .collect()
    }

    pub fn node(&self, id: &str) -> Option<&LogicalNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn total_length(&self) -> u64 {
        self.nodes.iter().map(|node| node.length).sum()
    }

    pub fn apply_labels(&mut self, labels: &HashMap<String, String>) -> usize {
        let mut applied = 0usize;
        let known = self
            .nodes
            .iter()
            .map(|node| node.id.as_str())
            .collect::<HashSet<_>>();
        for id in labels.keys() {
            if !known.contains(id.as_str()) {
                tracing::debug!(node = %id, "label override for unknown node ignored");
            }
        }

        for node in &mut self.nodes {
            if let Some(label) = labels.get(&node.id) {
                node.label = Some(label.clone());
                applied += 1;
            }
        }
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_nodes_keep_first_occurrence() {
        let (graph, issues) = AssemblyGraph::from_parts(
            vec![
                LogicalNode::new("a", 100, 1.0),
                LogicalNode::new("a", 999, 9.0),
                LogicalNode::new("b", 50, 2.0),
            ],
            Vec::new(),
        );

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.node("a").map(|node| node.length), Some(100));
        assert_eq!(issues, vec![GraphIssue::DuplicateNode("a".to_owned())]);
    }

    #[test]
    fn dangling_links_are_skipped_not_fatal() {
        let (graph, issues) = AssemblyGraph::from_parts(
            vec![LogicalNode::new("a", 1, 0.0), LogicalNode::new("b", 1, 0.0)],
            vec![
                LogicalLink::new("ab", "a", "b", 5),
                LogicalLink::new("ax", "a", "x", 5),
            ],
        );

        assert_eq!(graph.link_count(), 1);
        assert_eq!(graph.links[0].id, "ab");
        assert_eq!(
            issues,
            vec![GraphIssue::DanglingLink {
                link: "ax".to_owned(),
                endpoint: "x".to_owned()
            }]
        );
    }

    #[test]
    fn labels_override_display_name() {
        let (mut graph, _) = AssemblyGraph::from_parts(
            vec![LogicalNode::new("edge_1", 10, 0.0), LogicalNode::new("edge_2", 10, 0.0)],
            Vec::new(),
        );
        let labels = HashMap::from([
            ("edge_1".to_owned(), "chr1 fragment".to_owned()),
            ("missing".to_owned(), "nobody".to_owned()),
        ]);

        assert_eq!(graph.apply_labels(&labels), 1);
        assert_eq!(graph.nodes[0].display_label(), "chr1 fragment");
        assert_eq!(graph.nodes[1].display_label(), "edge_2");
    }

    #[test]
    fn negative_coverage_is_clamped() {
        assert_eq!(LogicalNode::new("n", 1, -3.0).coverage, 0.0);
    }
}
