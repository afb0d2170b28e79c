use std::path::Path;

use eframe::egui::{self, RichText, Ui};

use crate::graph::export::write_flat_graph;
use crate::query::{QueryKind, QuerySource};

use super::super::{Selection, ViewModel};

const SEARCH_RESULT_ROWS: usize = 12;

impl ViewModel {
    pub(in crate::app) fn draw_controls(
        &mut self,
        ui: &mut Ui,
        is_pending: bool,
        run_requested: &mut Option<QuerySource>,
    ) {
        ui.heading("Query");
        ui.separator();
        ui.add_space(4.0);

        ui.label("Result file");
        ui.text_edit_singleline(&mut self.input_path)
            .on_hover_text("Saved JSON response of a graph query.");

        egui::ComboBox::from_label("Kind")
            .selected_text(self.kind_tag.as_str())
            .show_ui(ui, |ui| {
                for kind in QueryKind::ALL {
                    ui.selectable_value(&mut self.kind_tag, kind.tag().to_owned(), kind.tag());
                }
            });

        let can_run = !self.input_path.trim().is_empty();
        let run = ui.add_enabled(can_run, egui::Button::new("Run query"));
        if run.clicked() {
            *run_requested = Some(QuerySource::new(
                self.input_path.trim(),
                self.kind_tag.clone(),
            ));
        }
        if is_pending {
            ui.label("Query running...");
        }

        ui.separator();
        ui.heading("View");
        ui.add(
            egui::Slider::new(&mut self.edge_width, 0.5..=6.0)
                .text("Edge width (px)")
                .clamping(egui::SliderClamping::Always),
        )
        .on_hover_text("Edge width stays the same on screen at every zoom level.");
        ui.checkbox(&mut self.show_node_labels, "Show node labels")
            .on_hover_text("Label nodes that are large enough on screen.");
        ui.checkbox(&mut self.show_edge_labels, "Show edge labels")
            .on_hover_text("Label every visible edge at its midpoint.");
        if ui.button("Fit graph to view").clicked() {
            self.fit_pending = true;
        }

        ui.separator();
        ui.label("Search nodes")
            .on_hover_text("Fuzzy match on node labels and ids.");
        ui.text_edit_singleline(&mut self.search);
        self.draw_search_results(ui);

        ui.separator();
        ui.heading("Export");
        ui.text_edit_singleline(&mut self.export_path);
        let can_export = !self.snapshot.graph.is_empty() && !self.export_path.trim().is_empty();
        if ui
            .add_enabled(can_export, egui::Button::new("Export current graph"))
            .clicked()
        {
            let path = Path::new(self.export_path.trim());
            self.export_status = Some(
                write_flat_graph(path, &self.snapshot.graph)
                    .map(|()| format!("Wrote {}", path.display()))
                    .map_err(|error| format!("{error:#}")),
            );
        }
        match &self.export_status {
            Some(Ok(message)) => {
                ui.label(message.as_str());
            }
            Some(Err(error)) => {
                ui.label(RichText::new(error.as_str()).color(ui.visuals().error_fg_color));
            }
            None => {}
        }
    }

    fn draw_search_results(&mut self, ui: &mut Ui) {
        let Some(matches) = self.search_matches() else {
            return;
        };
        if matches.is_empty() {
            ui.label("No matching nodes.");
            return;
        }

        let mut chosen = None;
        if let Some(cache) = &self.draw_cache {
            for &index in matches.iter().take(SEARCH_RESULT_ROWS) {
                let Some(id) = cache.ids.get(index) else {
                    continue;
                };
                let label = self
                    .snapshot
                    .graph
                    .node(id)
                    .map_or(id.as_str(), |node| node.label.as_str());
                if ui.link(label).on_hover_text(id.as_str()).clicked() {
                    chosen = Some(id.clone());
                }
            }
        }
        if matches.len() > SEARCH_RESULT_ROWS {
            ui.small(format!("{} more", matches.len() - SEARCH_RESULT_ROWS));
        }

        if let Some(id) = chosen {
            self.selection = Some(Selection::Node(id));
        }
    }
}
