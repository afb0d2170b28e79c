use std::collections::BTreeMap;

use eframe::egui::{self, Color32, RichText, Ui};
use serde_json::Value;

use crate::graph::style::HIGH_VALUE_BORDER;
use crate::graph::{EdgeKey, GraphEdge, GraphNode};
use crate::util::{format_percent, format_property};

use super::super::{Selection, ViewModel};

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Selection Details");
        ui.add_space(6.0);

        let graph = std::sync::Arc::clone(&self.snapshot.graph);
        let next = match self.selection.clone() {
            None => {
                ui.label("Click a node or an edge in the graph.");
                None
            }
            Some(Selection::Node(id)) => match graph.node(&id) {
                Some(node) => self.node_details(ui, node),
                None => {
                    ui.label("Selected node is not part of the current result.");
                    None
                }
            },
            Some(Selection::Edge(key)) => match graph.edge(&key) {
                Some(edge) => edge_details(ui, edge),
                None => {
                    ui.label("Selected edge is not part of the current result.");
                    None
                }
            },
        };

        if let Some(selection) = next {
            self.selection = Some(selection);
        }
    }

    /// Returns a new selection when one of the listed relationships is clicked.
    fn node_details(&self, ui: &mut Ui, node: &GraphNode) -> Option<Selection> {
        ui.label(RichText::new(node.label.as_str()).strong().color(node.color));
        ui.small(node.id.as_str());
        ui.add_space(6.0);

        ui.label(format!("Kinds: {}", node.kinds.join(", ")));
        if let Some(object_id) = &node.object_id {
            ui.label(format!("Object id: {object_id}"));
        }
        if let Some(last_seen) = &node.last_seen {
            ui.label(format!("Last seen: {last_seen}"));
        }
        if node.high_value {
            ui.label(RichText::new("Tier zero / high value").color(HIGH_VALUE_BORDER));
        }

        let mut next = None;
        ui.separator();
        ui.label(RichText::new("Relationships").strong());
        let related = self
            .snapshot
            .graph
            .edges()
            .iter()
            .filter(|edge| edge.source == node.id || edge.target == node.id)
            .collect::<Vec<_>>();
        if related.is_empty() {
            ui.label("No relationships in this result.");
        }
        egui::ScrollArea::vertical()
            .id_salt("node_relationships")
            .max_height(220.0)
            .show(ui, |ui| {
                for edge in related {
                    let (arrow, other) = if edge.source == node.id {
                        ("->", edge.target.as_str())
                    } else {
                        ("<-", edge.source.as_str())
                    };
                    let other_label = self
                        .snapshot
                        .graph
                        .node(other)
                        .map_or(other, |node| node.label.as_str());
                    let text = format!("{arrow} {} {other_label}", edge.label);
                    if ui.link(text).clicked() {
                        next = Some(Selection::Edge(edge.key()));
                    }
                }
            });

        property_grid(ui, "node_properties", &node.properties);
        next
    }
}

fn edge_details(ui: &mut Ui, edge: &GraphEdge) -> Option<Selection> {
    ui.label(RichText::new(edge.label.as_str()).strong().color(edge.color));
    ui.small(edge.kind.as_str());
    ui.add_space(6.0);

    let mut next = None;
    let EdgeKey { source, target, .. } = edge.key();
    ui.horizontal(|ui| {
        ui.label("From");
        if ui.link(source.as_str()).clicked() {
            next = Some(Selection::Node(source.clone()));
        }
    });
    ui.horizontal(|ui| {
        ui.label("To");
        if ui.link(target.as_str()).clicked() {
            next = Some(Selection::Node(target.clone()));
        }
    });

    if let Some(impact) = edge.impact_percent {
        ui.label(format!("Impact: {}", format_percent(impact)));
    }
    if let Some(step) = edge.path_step {
        ui.label(format!("Path step: {}", step + 1));
    }
    if let Some(last_seen) = &edge.last_seen {
        ui.label(format!("Last seen: {last_seen}"));
    }

    property_grid(ui, "edge_properties", &edge.properties);
    next
}

fn property_grid(ui: &mut Ui, id: &str, properties: &BTreeMap<String, Value>) {
    if properties.is_empty() {
        return;
    }

    ui.separator();
    ui.label(RichText::new("Properties").strong());
    egui::ScrollArea::vertical()
        .id_salt(id)
        .auto_shrink([false, true])
        .show(ui, |ui| {
            egui::Grid::new(id).striped(true).show(ui, |ui| {
                for (key, value) in properties {
                    ui.label(RichText::new(key.as_str()).color(Color32::from_gray(170)));
                    ui.label(format_property(value));
                    ui.end_row();
                }
            });
        });
}
