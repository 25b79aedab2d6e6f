use eframe::egui;

use crate::catalog::Category;
use crate::constants::pricing::CURRENCY_PREFIX;
use crate::engine::{format_amount, ConfigurationEngine, Usage};
use crate::gui::constants::*;

/// Live totals for the current configuration
pub fn ui(ui: &mut egui::Ui, engine: &ConfigurationEngine) {
    ui.heading("Configuration");
    ui.add_space(ITEM_SPACING);

    if engine.selected_chassis().is_none() {
        ui.colored_label(MUTED_TEXT, "No server selected");
        return;
    }

    let usage = match engine.usage() {
        Ok(usage) => usage,
        Err(err) => {
            ui.colored_label(STATUS_ERROR, err.to_string());
            return;
        }
    };

    resources(ui, engine, &usage);
    ui.add_space(SECTION_SPACING);
    cost(ui, &usage);
    ui.add_space(SECTION_SPACING);
    selected_parts(ui, engine);
}

fn resources(ui: &mut egui::Ui, engine: &ConfigurationEngine, usage: &Usage) {
    ui.group(|ui| {
        ui.set_width(ui.available_width());
        ui.label(egui::RichText::new("Resources").strong());
        ui.add_space(ITEM_SPACING);

        ui.label(format!("Power: {}W / {}W", usage.power_watts, usage.power_limit_watts));
        ui.add(egui::ProgressBar::new(usage.power_percent() / 100.0).show_percentage());
        if usage.power_exceeded() {
            ui.colored_label(WARNING_TEXT, "Power budget exceeded");
        }
        if let Some(psu) = engine.power_supply() {
            ui.label(egui::RichText::new(&psu.name).small().color(MUTED_TEXT));
        }
        ui.add_space(ITEM_SPACING);

        ui.label(format!("Memory: {}GB / {}GB", usage.memory_gb, usage.memory_limit_gb));
        ui.add(egui::ProgressBar::new(usage.memory_percent() / 100.0).show_percentage());
        ui.add_space(ITEM_SPACING);

        for category in Category::ALL {
            ui.label(format!(
                "{category}: {} / {}",
                engine.counts().get(category),
                engine.limit(category)
            ));
        }

        let counts = engine.counts();
        if let Some(riser) = &engine.catalog().constraints.requires_second_processor_for {
            if riser.secondary_riser && counts.cpu < 2 && !riser.slots.is_empty() {
                let slots = riser
                    .slots
                    .iter()
                    .map(|slot| slot.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                ui.label(
                    egui::RichText::new(format!("PCIe slots {slots} need a second processor"))
                        .small()
                        .color(MUTED_TEXT),
                );
            }
        }
    });
}

fn cost(ui: &mut egui::Ui, usage: &Usage) {
    ui.group(|ui| {
        ui.set_width(ui.available_width());
        ui.label(egui::RichText::new("Estimated cost").strong());
        ui.label(
            egui::RichText::new(format!("{CURRENCY_PREFIX}{}", format_amount(usage.cost.total())))
                .heading(),
        );
        for category in Category::ALL {
            ui.label(format!(
                "{category}: {CURRENCY_PREFIX}{}",
                format_amount(usage.cost.get(category))
            ));
        }
    });
}

fn selected_parts(ui: &mut egui::Ui, engine: &ConfigurationEngine) {
    let catalog = engine.catalog();
    let selection = engine.selection();

    ui.group(|ui| {
        ui.set_width(ui.available_width());
        ui.label(egui::RichText::new("Selected parts").strong());
        for category in Category::ALL {
            if let Some(part) = catalog.part(category, selection.get(category)) {
                ui.add_space(ITEM_SPACING / 2.0);
                ui.label(format!("{category}: {}", part.name()));
                ui.label(egui::RichText::new(part.summary()).small().color(MUTED_TEXT));
            }
        }
    });
}
