use std::io::Write;
use std::time::{Duration, Instant};

use approx::assert_relative_eq;
use contig_view::assembly::{GraphVisibility, load_graph};
use contig_view::engine::selection::InteractionMode;
use contig_view::engine::{EngineEvent, LayoutEngine};
use contig_view::settings::{ColorMode, Settings};
use eframe::egui::pos2;
use tempfile::NamedTempFile;

const SAMPLE_GFA: &str = "H\tVN:Z:1.0
S\tctg1\t*\tLN:i:12000\tdp:f:31.5
S\tctg2\t*\tLN:i:4500\tdp:f:28.0
S\tctg3\t*\tLN:i:900\tdp:f:12.0
S\tctg4\t*\tLN:i:300\tdp:f:4.0
L\tctg1\t+\tctg2\t-\t55M
L\tctg2\t-\tctg3\t+\t55M
L\tctg9\t+\tctg1\t+\t55M
";

fn write_gfa() -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".gfa")
        .tempfile()
        .expect("temp file");
    file.write_all(SAMPLE_GFA.as_bytes()).expect("write gfa");
    file
}

fn run_frames(engine: &mut LayoutEngine, frames: u64) {
    let start = Instant::now();
    for frame in 0..frames {
        engine.tick(start + Duration::from_millis(frame * 17));
    }
}

#[test]
fn gfa_file_to_settled_layout() {
    let file = write_gfa();
    let graph = load_graph(file.path()).expect("load gfa");
    assert_eq!(graph.node_count(), 4);
    assert_eq!(graph.link_count(), 2);

    let mut engine = LayoutEngine::new(Settings::default(), 3);
    engine.load_graph(graph);
    assert_eq!(engine.segments().points.len(), 8);
    assert_eq!(engine.visibility(), GraphVisibility::Visible);

    run_frames(&mut engine, 400);
    let events = engine.drain_events();
    assert!(matches!(events.first(), Some(EngineEvent::GraphHidden(false))));
    let snapshots = events
        .iter()
        .filter_map(|event| match event {
            EngineEvent::Positions(snapshot) => Some(snapshot),
            _ => None,
        })
        .collect::<Vec<_>>();
    assert!(!snapshots.is_empty());
    assert!(snapshots.iter().all(|snapshot| snapshot.positions.len() == 8));
    assert!(
        snapshots
            .windows(2)
            .all(|pair| pair[0].step < pair[1].step)
    );
}

#[test]
fn same_seed_gives_the_same_layout() {
    let file = write_gfa();
    let mut one = LayoutEngine::new(Settings::default(), 99);
    let mut two = LayoutEngine::new(Settings::default(), 99);
    one.load_graph(load_graph(file.path()).expect("load gfa"));
    two.load_graph(load_graph(file.path()).expect("load gfa"));

    run_frames(&mut one, 50);
    run_frames(&mut two, 50);

    assert_eq!(one.segments().positions(), two.segments().positions());
}

#[test]
fn reload_keeps_positions_of_surviving_contigs() {
    let file = write_gfa();
    let mut engine = LayoutEngine::new(Settings::default(), 5);
    engine.load_graph(load_graph(file.path()).expect("load gfa"));
    run_frames(&mut engine, 30);
    engine.freeze();
    let before = engine.segments().prior_points();

    engine.load_graph(load_graph(file.path()).expect("reload gfa"));

    assert!(engine.is_frozen());
    for point in &engine.segments().points {
        assert_eq!(point.position, before[&point.id].position);
    }
}

#[test]
fn cosmetic_changes_keep_the_simulation_running_smoothly() {
    let file = write_gfa();
    let mut engine = LayoutEngine::new(Settings::default(), 8);
    engine.load_graph(load_graph(file.path()).expect("load gfa"));
    run_frames(&mut engine, 20);
    let steps = engine.simulation().steps();
    let positions = engine.segments().positions();

    let impact = engine.apply_settings(Settings {
        color_mode: ColorMode::Random,
        show_labels: true,
        ..engine.settings().clone()
    });

    assert!(impact.is_cosmetic());
    assert_eq!(engine.simulation().steps(), steps);
    assert_eq!(engine.segments().positions(), positions);
}

#[test]
fn brush_then_group_drag_under_zoom() {
    let file = write_gfa();
    let mut engine = LayoutEngine::new(Settings::default(), 12);
    engine.load_graph(load_graph(file.path()).expect("load gfa"));
    engine.center_view(pos2(400.0, 300.0));
    assert!(engine.zoom_about(pos2(400.0, 300.0), 2.0));
    run_frames(&mut engine, 10);

    engine.set_mode(InteractionMode::FreezeBrush);
    engine.begin_drag(pos2(-10_000.0, -10_000.0));
    engine.end_drag(pos2(10_000.0, 10_000.0));
    assert_eq!(engine.selection().selected().len(), 4);

    let k = engine.view().scale();
    let before = engine.segments().positions();
    engine.begin_drag(pos2(100.0, 100.0));
    engine.drag_to(pos2(130.0, 80.0));
    engine.end_drag(pos2(130.0, 80.0));

    for (old, new) in before.iter().zip(engine.segments().positions()) {
        assert_relative_eq!(new.x - old.x, 30.0 / k, epsilon = 1e-3);
        assert_relative_eq!(new.y - old.y, -20.0 / k, epsilon = 1e-3);
    }
}

#[test]
fn threshold_above_every_component_hides_the_graph() {
    let file = write_gfa();
    let mut engine = LayoutEngine::new(
        Settings {
            min_nodes_to_render: 10,
            ..Settings::default()
        },
        1,
    );
    engine.load_graph(load_graph(file.path()).expect("load gfa"));

    assert!(engine.is_hidden());
    assert_eq!(engine.visibility(), GraphVisibility::Hidden);
    assert_eq!(engine.drain_events(), vec![EngineEvent::GraphHidden(true)]);
    run_frames(&mut engine, 5);
    assert!(engine.drain_events().is_empty());
}
