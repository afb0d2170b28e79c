use eframe::egui::{self, Align, Color32, Context, Layout, RichText};

use crate::graph::RENDER_LIMIT;
use crate::query::QuerySource;

use super::super::ViewModel;

const BANNER_COLOR: Color32 = Color32::from_rgb(245, 206, 93);

impl ViewModel {
    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        is_pending: bool,
        run_requested: &mut Option<QuerySource>,
    ) {
        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("secgraph-explorer");
                    ui.separator();
                    let snapshot = &self.snapshot;
                    if let Some(kind) = snapshot.kind {
                        ui.label(format!("query: {kind}"));
                    }
                    ui.label(format!("nodes: {}", snapshot.graph.node_count()));
                    ui.label(format!("edges: {}", snapshot.graph.edge_count()));
                    if let Some(truncation) = snapshot.truncation {
                        ui.label(
                            RichText::new(format!(
                                "showing {} of {} nodes (limit {RENDER_LIMIT})",
                                truncation.shown, truncation.total
                            ))
                            .color(BANNER_COLOR),
                        );
                    }
                    if is_pending {
                        ui.spinner();
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.label(format!(
                            "in view: {} nodes, {} edges",
                            self.visible_node_count, self.visible_edge_count
                        ));
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| self.draw_controls(ui, is_pending, run_requested));

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(340.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default().show(ctx, |ui| self.draw_graph(ui));
    }
}
