use eframe::egui::{self, RichText, Ui};

use contig_view::util::format_bp;

use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Selection");
        ui.add_space(6.0);

        if self.selected.is_empty() {
            ui.label("Click a contig, or draw a brush rectangle in freeze & brush mode.");
            return;
        }

        let total_length = self.selected.iter().map(|node| node.length).sum::<u64>();
        ui.label(format!("{} contigs selected", self.selected.len()));
        ui.label(format!("Total length: {}", format_bp(total_length)));
        if ui.button("Clear selection").clicked() {
            self.engine.clear_selection();
        }

        ui.separator();
        egui::ScrollArea::vertical()
            .id_salt("selected_nodes_scroll")
            .auto_shrink([false, false])
            .show_rows(ui, 36.0, self.selected.len(), |ui, row_range| {
                for node in &self.selected[row_range] {
                    ui.label(RichText::new(node.display_label()).strong())
                        .on_hover_text(node.id.as_str());
                    ui.small(format!(
                        "{}  |  depth {:.1}x",
                        format_bp(node.length),
                        node.coverage
                    ));
                }
            });
    }
}
