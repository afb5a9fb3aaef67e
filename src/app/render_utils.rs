use eframe::egui::ecolor::Hsva;
use eframe::egui::{Align2, Color32, FontId, Painter, Pos2, Rect, Shape, Stroke, Vec2};

use contig_view::engine::segments::{SegmentGraph, SegmentNode};
use contig_view::settings::{BackgroundTheme, ColorMode};
use contig_view::util::{normalize_log, stable_unit};

pub(super) struct Palette {
    pub(super) background: Color32,
    pub(super) link: Color32,
    pub(super) label: Color32,
    pub(super) outline: Color32,
    pub(super) uniform: Color32,
    pub(super) glow: Color32,
    pub(super) brush_fill: Color32,
    pub(super) brush_stroke: Color32,
}

pub(super) fn palette(theme: BackgroundTheme) -> Palette {
    match theme {
        BackgroundTheme::Dark => Palette {
            background: Color32::from_rgb(19, 23, 29),
            link: Color32::from_rgba_unmultiplied(150, 160, 175, 150),
            label: Color32::from_rgb(225, 230, 236),
            outline: Color32::from_rgb(19, 23, 29),
            uniform: Color32::from_rgb(95, 170, 220),
            glow: Color32::from_rgba_unmultiplied(255, 214, 90, 140),
            brush_fill: Color32::from_rgba_unmultiplied(90, 150, 230, 40),
            brush_stroke: Color32::from_rgb(120, 175, 245),
        },
        BackgroundTheme::Light => Palette {
            background: Color32::from_rgb(246, 246, 242),
            link: Color32::from_rgba_unmultiplied(80, 86, 96, 150),
            label: Color32::from_rgb(30, 32, 38),
            outline: Color32::from_rgb(246, 246, 242),
            uniform: Color32::from_rgb(40, 110, 170),
            glow: Color32::from_rgba_unmultiplied(230, 140, 20, 150),
            brush_fill: Color32::from_rgba_unmultiplied(40, 100, 200, 35),
            brush_stroke: Color32::from_rgb(40, 100, 200),
        },
    }
}

/// Coverage and length extents of the rendered nodes, for color ramps.
#[derive(Clone, Copy, Debug)]
pub(super) struct ValueRanges {
    coverage: (f64, f64),
    length: (f64, f64),
}

impl ValueRanges {
    pub(super) fn of(graph: &SegmentGraph) -> Self {
        let mut coverage = (f64::INFINITY, f64::NEG_INFINITY);
        let mut length = (f64::INFINITY, f64::NEG_INFINITY);
        for node in &graph.nodes {
            let depth = f64::from(node.coverage);
            coverage = (coverage.0.min(depth), coverage.1.max(depth));
            let bp = node.length as f64;
            length = (length.0.min(bp), length.1.max(bp));
        }
        if graph.nodes.is_empty() {
            coverage = (1.0, 1.0);
            length = (1.0, 1.0);
        }
        Self { coverage, length }
    }
}

fn ramp(t: f32) -> Color32 {
    let r = (55.0 + (190.0 * t)) as u8;
    let g = (150.0 - (70.0 * t)) as u8;
    let b = (215.0 - (155.0 * t)) as u8;
    Color32::from_rgb(r, g, b)
}

pub(super) fn node_color(
    mode: ColorMode,
    node: &SegmentNode,
    ranges: ValueRanges,
    palette: &Palette,
) -> Color32 {
    match mode {
        ColorMode::Depth => ramp(normalize_log(
            f64::from(node.coverage),
            ranges.coverage.0,
            ranges.coverage.1,
        )),
        ColorMode::Length => ramp(normalize_log(
            node.length as f64,
            ranges.length.0,
            ranges.length.1,
        )),
        ColorMode::Random => Hsva::new(stable_unit(&node.id), 0.62, 0.88, 1.0).into(),
        ColorMode::Uniform => palette.uniform,
    }
}

pub(super) fn with_opacity(color: Color32, opacity: f32) -> Color32 {
    color.gamma_multiply(opacity.clamp(0.0, 1.0))
}

/// Cheap bounding-box test for a stroked segment against the canvas.
pub(super) fn segment_visible(rect: Rect, start: Pos2, end: Pos2, padding: f32) -> bool {
    Rect::from_two_pos(start, end)
        .expand(padding)
        .intersects(rect)
}

pub(super) fn draw_arrow_head(painter: &Painter, from: Pos2, to: Pos2, size: f32, color: Color32) {
    let direction = to - from;
    let length = direction.length();
    if length <= f32::EPSILON {
        return;
    }
    let direction = direction / length;
    let normal = Vec2::new(-direction.y, direction.x);
    let base = to - direction * size;
    painter.add(Shape::convex_polygon(
        vec![to, base + normal * (size * 0.5), base - normal * (size * 0.5)],
        color,
        Stroke::NONE,
    ));
}

pub(super) fn draw_label(
    painter: &Painter,
    position: Pos2,
    text: &str,
    palette: &Palette,
    outline: bool,
) {
    let font = FontId::proportional(12.0);
    if outline {
        for offset in [
            Vec2::new(-1.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(0.0, -1.0),
            Vec2::new(0.0, 1.0),
        ] {
            painter.text(
                position + offset,
                Align2::CENTER_BOTTOM,
                text,
                font.clone(),
                palette.outline,
            );
        }
    }
    painter.text(position, Align2::CENTER_BOTTOM, text, font, palette.label);
}
