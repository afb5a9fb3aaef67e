use eframe::egui::{self, Ui};

use contig_view::engine::selection::InteractionMode;
use contig_view::settings::{BackgroundTheme, ColorMode};

use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Layout Controls");
        ui.separator();
        ui.add_space(4.0);

        let mut mode = self.engine.mode();
        ui.horizontal(|ui| {
            ui.selectable_value(&mut mode, InteractionMode::Navigate, "Navigate")
                .on_hover_text("Pan, zoom, click and drag single contigs.");
            ui.selectable_value(&mut mode, InteractionMode::FreezeBrush, "Freeze & brush")
                .on_hover_text("Freeze the layout, then drag a rectangle to select contigs.");
        });
        if mode != self.engine.mode() {
            self.engine.set_mode(mode);
        }

        ui.add_enabled_ui(mode == InteractionMode::Navigate, |ui| {
            let mut frozen = self.engine.is_frozen();
            if ui
                .checkbox(&mut frozen, "Freeze simulation")
                .on_hover_text("Hold every contig in place without entering brush mode.")
                .changed()
            {
                if frozen {
                    self.engine.freeze();
                } else {
                    self.engine.unfreeze();
                }
            }
        });

        ui.separator();
        ui.label("Search (id or label)");
        let search = ui.text_edit_singleline(&mut self.search);
        if search.changed() {
            self.engine.select_matching(&self.search);
        }
        if ui.button("Clear selection").clicked() {
            self.search.clear();
            self.engine.clear_selection();
        }

        ui.separator();
        ui.collapsing("Geometry", |ui| {
            ui.add(
                egui::Slider::new(&mut self.draft.node_width_scale, 0.5..=60.0)
                    .text("Node width (px)"),
            );
            ui.add(
                egui::Slider::new(&mut self.draft.node_length_scale, 0.05..=20.0)
                    .logarithmic(true)
                    .text("Node length scale"),
            )
            .on_hover_text("Multiplier on the sub-linear base-pair to length mapping.");
            let max_component = self.engine.graph().node_count().max(1);
            ui.add(
                egui::Slider::new(&mut self.draft.min_nodes_to_render, 0..=max_component)
                    .text("Min component size"),
            )
            .on_hover_text("Hide connected components with fewer contigs than this. 0 shows all.");
        });

        ui.collapsing("Forces", |ui| {
            ui.add(
                egui::Slider::new(&mut self.draft.link_distance, 1.0..=600.0)
                    .text("Link distance"),
            );
            ui.add(
                egui::Slider::new(&mut self.draft.charge_strength, -2000.0..=0.0)
                    .text("Repulsion"),
            )
            .on_hover_text("Negative values push contigs apart.");
            ui.add(
                egui::Slider::new(&mut self.draft.collision_radius, 0.0..=80.0)
                    .text("Collision radius"),
            );
            ui.add(
                egui::Slider::new(&mut self.draft.steps_per_frame, 1..=16).text("Steps per frame"),
            );
        });

        ui.collapsing("Appearance", |ui| {
            egui::ComboBox::from_label("Color by")
                .selected_text(self.draft.color_mode.label())
                .show_ui(ui, |ui| {
                    for color_mode in ColorMode::ALL {
                        ui.selectable_value(&mut self.draft.color_mode, color_mode, color_mode.label());
                    }
                });
            ui.checkbox(&mut self.draft.show_labels, "Show labels");
            ui.add_enabled(
                self.draft.show_labels,
                egui::Checkbox::new(&mut self.draft.label_outline, "Outline labels"),
            );
            ui.checkbox(&mut self.draft.show_arrows, "Show link arrows");
            ui.horizontal(|ui| {
                ui.selectable_value(&mut self.draft.background, BackgroundTheme::Dark, "Dark");
                ui.selectable_value(&mut self.draft.background, BackgroundTheme::Light, "Light");
            });
        });

        if self.draft != *self.engine.settings() {
            let impact = self.engine.apply_settings(self.draft.clone());
            tracing::debug!(rebuild = impact.rebuild, forces = impact.forces, "settings applied");
            self.draft = self.engine.settings().clone();
        }

        ui.separator();
        if ui.button("Re-center view").clicked() {
            self.needs_centering = true;
        }
    }
}
