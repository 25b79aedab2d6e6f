use eframe::egui;

use super::part_library::PartDrag;
use crate::catalog::{Category, PartRef};
use crate::engine::ConfigurationEngine;
use crate::gui::constants::*;

/// Actions requested from the canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanvasAction {
    None,
    /// A library card was dropped onto the `target` area
    Drop { dragged: PartDrag, target: Category },
    Remove(Category),
}

/// Drop areas, one per category, listing the installed units
pub fn ui(ui: &mut egui::Ui, engine: &ConfigurationEngine) -> CanvasAction {
    let catalog = engine.catalog();
    if engine.selected_chassis().is_none() {
        ui.vertical_centered(|ui| {
            ui.add_space(ui.available_height() / 3.0);
            ui.heading("Select a server");
            ui.label("Pick the server in the library on the left to start configuring.");
        });
        return CanvasAction::None;
    }

    let server = &catalog.server;
    ui.heading(&server.name);
    ui.label(
        egui::RichText::new(format!(
            "{} | {} sockets | up to {} DIMMs",
            server.form_factor, server.max_cpu_sockets, server.max_memory_slots
        ))
        .color(MUTED_TEXT),
    );
    ui.add_space(SECTION_SPACING);

    let mut action = CanvasAction::None;
    ui.columns(Category::ALL.len(), |columns| {
        for (column, category) in columns.iter_mut().zip(Category::ALL) {
            if let Some(chosen) = drop_zone(column, engine, category) {
                action = chosen;
            }
        }
    });
    action
}

fn drop_zone(ui: &mut egui::Ui, engine: &ConfigurationEngine, category: Category) -> Option<CanvasAction> {
    let mut action = None;
    let count = engine.counts().get(category);
    let limit = engine.limit(category);
    let model = engine
        .catalog()
        .part(category, engine.selection().get(category));

    let frame = egui::Frame::group(ui.style());
    let (_, dropped) = ui.dnd_drop_zone::<PartDrag, ()>(frame, |ui| {
        ui.set_min_height(DROP_ZONE_MIN_HEIGHT);
        ui.set_width(ui.available_width());

        ui.horizontal(|ui| {
            ui.label(egui::RichText::new(category.label()).strong());
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(egui::RichText::new(format!("{count}/{limit}")).color(MUTED_TEXT));
            });
        });
        ui.separator();

        if count == 0 {
            ui.vertical_centered(|ui| {
                ui.add_space(ITEM_SPACING);
                ui.label(
                    egui::RichText::new(format!("Drag a {category} here"))
                        .color(MUTED_TEXT),
                );
            });
            return;
        }

        for slot in 0..count {
            ui.horizontal(|ui| {
                installed_unit(ui, model, slot);
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.small_button("\u{1F5D1}").on_hover_text("Remove").clicked() {
                        action = Some(CanvasAction::Remove(category));
                    }
                });
            });
        }
    });

    if let Some(dragged) = dropped {
        action = Some(CanvasAction::Drop {
            dragged: *dragged,
            target: category,
        });
    }
    action
}

fn installed_unit(ui: &mut egui::Ui, model: Option<PartRef<'_>>, slot: u32) {
    ui.vertical(|ui| match model {
        Some(part) => {
            ui.label(format!("#{} {}", slot + 1, part.name()));
            ui.label(egui::RichText::new(part.summary()).small().color(MUTED_TEXT));
        }
        None => {
            ui.label(format!("#{}", slot + 1));
        }
    });
}
