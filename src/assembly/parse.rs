use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;

use super::graph::{AssemblyGraph, LogicalLink, LogicalNode};

#[derive(Debug, Deserialize)]
struct RawGraph {
    #[serde(default)]
    nodes: Vec<RawNode>,
    #[serde(default)]
    links: Vec<RawLink>,
}

#[derive(Debug, Deserialize)]
struct RawNode {
    id: String,
    #[serde(default)]
    length: u64,
    #[serde(default)]
    coverage: f32,
    #[serde(default)]
    label: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawLink {
    #[serde(default)]
    id: Option<String>,
    source: String,
    target: String,
    #[serde(default)]
    overlap: i64,
}

pub fn parse_graph_json(raw: &str) -> Result<AssemblyGraph> {
    let parsed: RawGraph = serde_json::from_str(raw).context("invalid graph JSON")?;

    let nodes = parsed
        .nodes
        .into_iter()
        .map(|node| LogicalNode {
            label: node.label,
            ..LogicalNode::new(node.id, node.length, node.coverage)
        })
        .collect::<Vec<_>>();

    let mut ids = LinkIds::default();
    let links = parsed
        .links
        .into_iter()
        .map(|link| {
            let id = link
                .id
                .unwrap_or_else(|| ids.next(&link.source, &link.target));
            LogicalLink::new(id, link.source, link.target, link.overlap)
        })
        .collect::<Vec<_>>();

    let (graph, _issues) = AssemblyGraph::from_parts(nodes, links);
    Ok(graph)
}

#[derive(Default)]
struct LinkIds {
    seen: HashMap<String, usize>,
}

impl LinkIds {
    fn next(&mut self, source: &str, target: &str) -> String {
        let base = format!("{source}->{target}");
        let count = self.seen.entry(base.clone()).or_insert(0);
        *count += 1;
        if *count == 1 {
            base
        } else {
            format!("{base}#{count}")
        }
    }
}

fn tag_value<'a>(fields: &[&'a str], names: &[&str]) -> Option<(&'a str, &'a str)> {
    fields.iter().find_map(|field| {
        let mut parts = field.splitn(3, ':');
        let name = parts.next()?;
        let kind = parts.next()?;
        let value = parts.next()?;
        names.contains(&name).then_some((kind, value))
    })
}

fn cigar_overlap(cigar: &str) -> i64 {
    let digits = cigar
        .chars()
        .take_while(|ch| ch.is_ascii_digit())
        .collect::<String>();
    digits.parse().unwrap_or(0)
}

fn segment_from_fields(fields: &[&str], line_number: usize) -> Result<LogicalNode> {
    let id = fields
        .get(1)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| anyhow!("line {line_number}: segment record without a name"))?;
    let sequence = fields.get(2).copied().unwrap_or("*");
    let tags = fields.get(3..).unwrap_or(&[]);

    let length = match tag_value(tags, &["LN"]) {
        Some((_, value)) => value
            .parse::<u64>()
            .with_context(|| format!("line {line_number}: invalid LN tag '{value}'"))?,
        None if sequence == "*" => 0,
        None => sequence.len() as u64,
    };

    let coverage = if let Some((_, value)) = tag_value(tags, &["dp", "DP"]) {
        value
            .parse::<f32>()
            .with_context(|| format!("line {line_number}: invalid depth tag '{value}'"))?
    } else if let Some((_, value)) = tag_value(tags, &["KC"]) {
        let kmers = value
            .parse::<f64>()
            .with_context(|| format!("line {line_number}: invalid KC tag '{value}'"))?;
        if length > 0 {
            (kmers / length as f64) as f32
        } else {
            0.0
        }
    } else {
        0.0
    };

    Ok(LogicalNode::new(*id, length, coverage))
}

/// Reads segment and link records from GFA text. Header, path and other
/// records are ignored.
pub fn parse_gfa(raw: &str) -> Result<AssemblyGraph> {
    let mut nodes = Vec::new();
    let mut links = Vec::new();
    let mut ids = LinkIds::default();

    for (index, line) in raw.lines().enumerate() {
        let line_number = index + 1;
        let line = line.trim_end();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields = line.split('\t').collect::<Vec<_>>();
        match fields[0] {
            "S" => nodes.push(segment_from_fields(&fields, line_number)?),
            "L" => {
                if fields.len() < 5 {
                    return Err(anyhow!(
                        "line {line_number}: link record needs at least 5 fields"
                    ));
                }
                let source = fields[1];
                let target = fields[3];
                let overlap = fields.get(5).map(|cigar| cigar_overlap(cigar)).unwrap_or(0);
                links.push(LogicalLink::new(
                    ids.next(source, target),
                    source,
                    target,
                    overlap,
                ));
            }
            _ => {}
        }
    }

    let (graph, issues) = AssemblyGraph::from_parts(nodes, links);
    if !issues.is_empty() {
        tracing::warn!(count = issues.len(), "GFA input had data-integrity issues");
    }
    Ok(graph)
}

pub fn load_graph(path: &Path) -> Result<AssemblyGraph> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read graph file {}", path.display()))?;

    let is_json = path
        .extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| extension.eq_ignore_ascii_case("json"));

    let graph = if is_json {
        parse_graph_json(&raw)
    } else {
        parse_gfa(&raw)
    }
    .with_context(|| format!("failed to parse {}", path.display()))?;

    tracing::info!(
        path = %path.display(),
        nodes = graph.node_count(),
        links = graph.link_count(),
        "loaded assembly graph"
    );
    Ok(graph)
}

pub fn load_labels_json(path: &Path) -> Result<HashMap<String, String>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read label file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("label file {} is not a JSON object of strings", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_GFA: &str = "H\tVN:Z:1.0\n\
S\tedge_1\t*\tLN:i:1200\tdp:f:14.5\n\
S\tedge_2\tACGTACGT\n\
S\tedge_3\t*\tLN:i:400\tKC:i:800\n\
L\tedge_1\t+\tedge_2\t-\t55M\n\
L\tedge_1\t+\tedge_2\t+\t*\n\
L\tedge_2\t+\tedge_9\t+\t0M\n\
P\tpath\tedge_1+,edge_2-\t*\n";

    #[test]
    fn gfa_segments_and_links() {
        let graph = parse_gfa(SAMPLE_GFA).unwrap();

        assert_eq!(graph.node_count(), 3);
        let edge_1 = graph.node("edge_1").unwrap();
        assert_eq!(edge_1.length, 1200);
        assert!((edge_1.coverage - 14.5).abs() < 1e-6);
        assert_eq!(graph.node("edge_2").unwrap().length, 8);
        assert!((graph.node("edge_3").unwrap().coverage - 2.0).abs() < 1e-6);

        assert_eq!(graph.link_count(), 2);
        assert_eq!(graph.links[0].id, "edge_1->edge_2");
        assert_eq!(graph.links[0].overlap, 55);
        assert_eq!(graph.links[1].id, "edge_1->edge_2#2");
        assert_eq!(graph.links[1].overlap, 0);
    }

    #[test]
    fn gfa_rejects_bad_length_tag() {
        let error = parse_gfa("S\tx\t*\tLN:i:lots\n").unwrap_err();
        assert!(error.to_string().contains("line 1"));
    }

    #[test]
    fn json_contract_round_trip() {
        let graph = parse_graph_json(
            r#"{
                "nodes": [
                    {"id": "a", "length": 10, "coverage": 3.5, "label": "alpha"},
                    {"id": "b", "length": 20}
                ],
                "links": [
                    {"source": "a", "target": "b", "overlap": 4},
                    {"id": "dangling", "source": "a", "target": "zzz"}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.nodes[0].display_label(), "alpha");
        assert_eq!(graph.link_count(), 1);
        assert_eq!(graph.links[0].id, "a->b");
    }

    #[test]
    fn graph_file_dispatches_on_extension() {
        let dir = tempfile::tempdir().unwrap();
        let gfa_path = dir.path().join("asm.gfa");
        fs::write(&gfa_path, SAMPLE_GFA).unwrap();
        let json_path = dir.path().join("asm.json");
        fs::write(&json_path, r#"{"nodes": [{"id": "only"}]}"#).unwrap();

        assert_eq!(load_graph(&gfa_path).unwrap().node_count(), 3);
        assert_eq!(load_graph(&json_path).unwrap().node_count(), 1);
    }
}
