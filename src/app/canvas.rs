use std::time::Instant;

use eframe::egui::{self, Align2, Color32, FontId, Pos2, Rect, Sense, Stroke, StrokeKind, Ui, pos2};

use contig_view::assembly::GraphVisibility;

use super::ViewModel;
use super::render_utils::{
    ValueRanges, draw_arrow_head, draw_label, node_color, palette, segment_visible, with_opacity,
};

impl ViewModel {
    pub(super) fn draw_canvas(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);
        let colors = palette(self.engine.settings().background);
        painter.rect_filled(rect, 0.0, colors.background);

        if self.needs_centering {
            self.engine
                .center_view(pos2(rect.width() * 0.5, rect.height() * 0.5));
            self.needs_centering = false;
        }

        self.handle_canvas_input(ui, rect, &response);

        if self.engine.tick(Instant::now())
            || !(self.engine.simulation().is_settled() || self.engine.is_frozen())
            || response.dragged()
        {
            ui.ctx().request_repaint();
        }

        match self.engine.visibility() {
            GraphVisibility::NoData => {
                centered_message(&painter, rect, "The graph has no contigs.", colors.label);
                return;
            }
            GraphVisibility::Hidden => {
                centered_message(
                    &painter,
                    rect,
                    "Graph hidden: every component is below the minimum size.",
                    colors.label,
                );
                return;
            }
            GraphVisibility::Visible => {}
        }

        let settings = self.engine.settings().clone();
        let segments = self.engine.segments();
        let view = *self.engine.view();
        let to_screen = |sim| rect.min + view.to_screen(sim).to_vec2();
        let stroke_width = (settings.node_width_scale * view.scale()).max(1.0);

        for link in &segments.links {
            let (Some(source), Some(target)) =
                (segments.nodes.get(link.source), segments.nodes.get(link.target))
            else {
                continue;
            };
            let (Some(from), Some(to)) =
                (segments.points.get(source.end), segments.points.get(target.start))
            else {
                continue;
            };
            let (from, to) = (to_screen(from.position), to_screen(to.position));
            if !segment_visible(rect, from, to, stroke_width) {
                continue;
            }

            if link.source == link.target {
                painter.circle_stroke(from, 6.0 * view.scale().sqrt(), Stroke::new(1.0, colors.link));
                continue;
            }
            painter.line_segment([from, to], Stroke::new(1.0, colors.link));
            if settings.show_arrows {
                draw_arrow_head(&painter, from, to, 4.0 + stroke_width, colors.link);
            }
        }

        let highlight = self.engine.highlight();
        let ranges = ValueRanges::of(segments);
        for &index in &highlight.draw_order {
            let (Some(node), Some((start, end))) =
                (segments.nodes.get(index), segments.node_endpoints(index))
            else {
                continue;
            };
            let (start, end) = (to_screen(start), to_screen(end));
            if !segment_visible(rect, start, end, stroke_width) {
                continue;
            }

            let emphasis = highlight.for_node(index);
            if emphasis.glow {
                painter.line_segment([start, end], Stroke::new(stroke_width + 6.0, colors.glow));
            }
            let color = node_color(settings.color_mode, node, ranges, &colors);
            painter.line_segment(
                [start, end],
                Stroke::new(stroke_width, with_opacity(color, emphasis.opacity)),
            );

            if settings.show_labels {
                let anchor = start.lerp(end, 0.5) - egui::vec2(0.0, stroke_width * 0.5 + 2.0);
                draw_label(
                    &painter,
                    anchor,
                    node.display_label(),
                    &colors,
                    settings.label_outline,
                );
            }
        }

        if let Some(brush) = self.engine.brush_rect() {
            let brush = brush.translate(rect.min.to_vec2());
            painter.rect_filled(brush, 0.0, colors.brush_fill);
            painter.rect_stroke(brush, 0.0, Stroke::new(1.0, colors.brush_stroke), StrokeKind::Inside);
        }

        let simulation = self.engine.simulation();
        let status = format!(
            "{} | alpha {:.3} | step {} | zoom {:.2}x",
            if simulation.is_frozen() { "frozen" } else { "running" },
            simulation.alpha(),
            simulation.steps(),
            view.scale(),
        );
        painter.text(
            rect.left_bottom() + egui::vec2(8.0, -8.0),
            Align2::LEFT_BOTTOM,
            status,
            FontId::monospace(11.0),
            with_opacity(colors.label, 0.7),
        );
    }

    fn handle_canvas_input(&mut self, ui: &Ui, rect: Rect, response: &egui::Response) {
        let local = |screen: Pos2| pos2(screen.x - rect.min.x, screen.y - rect.min.y);
        let (press_origin, latest) =
            ui.input(|input| (input.pointer.press_origin(), input.pointer.latest_pos()));

        if response.drag_started_by(egui::PointerButton::Primary)
            && let Some(origin) = press_origin
        {
            self.engine.begin_drag(local(origin));
        }
        if response.dragged_by(egui::PointerButton::Primary)
            && let Some(pointer) = latest
        {
            self.engine.drag_to(local(pointer));
        }
        if response.drag_stopped_by(egui::PointerButton::Primary) {
            match latest {
                Some(pointer) => self.engine.end_drag(local(pointer)),
                None => self.engine.release_drag(),
            }
        }
        if response.clicked()
            && let Some(pointer) = response.interact_pointer_pos()
        {
            self.engine.click(local(pointer));
        }

        if response.hovered() {
            let scroll = ui.input(|input| input.raw_scroll_delta.y);
            if scroll.abs() > f32::EPSILON {
                let anchor = latest.unwrap_or_else(|| rect.center());
                let factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
                self.engine.zoom_about(local(anchor), factor);
            }
        }
    }
}

fn centered_message(painter: &egui::Painter, rect: Rect, text: &str, color: Color32) {
    painter.text(
        rect.center(),
        Align2::CENTER_CENTER,
        text,
        FontId::proportional(16.0),
        color,
    );
}
