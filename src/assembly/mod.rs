mod components;
mod graph;
mod parse;

pub use components::{
    ComponentStats, FilteredGraph, GraphVisibility, connected_components,
    filter_small_components,
};
pub use graph::{AssemblyGraph, GraphIssue, LogicalLink, LogicalNode};
pub use parse::{load_graph, load_labels_json, parse_gfa, parse_graph_json};
