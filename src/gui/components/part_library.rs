use eframe::egui;

use crate::catalog::{Catalog, Category, ChassisId, PartId, PartRef};
use crate::engine::ConfigurationEngine;
use crate::gui::constants::*;

/// Payload carried while a library card is dragged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartDrag {
    pub category: Category,
    pub part: PartId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LibraryTab {
    Server,
    Parts(Category),
}

/// Actions requested from the library panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LibraryAction {
    None,
    SelectChassis(ChassisId),
    ChoosePart(Category, PartId),
    AddPart(Category),
    ChoosePowerSupply(Option<usize>),
}

pub struct PartLibrary {
    tab: LibraryTab,
}

impl Default for PartLibrary {
    fn default() -> Self {
        Self::new()
    }
}

impl PartLibrary {
    pub fn new() -> Self {
        Self {
            tab: LibraryTab::Server,
        }
    }

    pub fn ui(&mut self, ui: &mut egui::Ui, engine: &ConfigurationEngine) -> LibraryAction {
        let mut action = LibraryAction::None;

        ui.heading("Part Library");
        ui.add_space(ITEM_SPACING);

        ui.horizontal(|ui| {
            ui.selectable_value(&mut self.tab, LibraryTab::Server, "Server");
            for category in Category::ALL {
                ui.selectable_value(&mut self.tab, LibraryTab::Parts(category), category.label());
            }
        });
        ui.separator();

        egui::ScrollArea::vertical().show(ui, |ui| match self.tab {
            LibraryTab::Server => action = server_tab(ui, engine),
            LibraryTab::Parts(category) => action = parts_tab(ui, engine, category),
        });

        action
    }
}

fn server_tab(ui: &mut egui::Ui, engine: &ConfigurationEngine) -> LibraryAction {
    let mut action = LibraryAction::None;
    let catalog = engine.catalog();
    let server = &catalog.server;
    let selected = engine.selected_chassis() == Some(server.id);

    ui.group(|ui| {
        ui.label(egui::RichText::new(&server.name).strong());
        ui.label(format!("{} | {}", server.manufacturer, server.form_factor));
        ui.label(egui::RichText::new(&server.description).small().color(MUTED_TEXT));
        ui.add_space(ITEM_SPACING);
        ui.label(format!("CPU sockets: {}", server.max_cpu_sockets));
        ui.label(format!("Memory slots: {}", server.max_memory_slots));
        ui.label(format!("PCIe slots: {}", server.max_pci_slots));
        ui.label(format!("Max power: {}W", server.max_power));
        if !server.chassis_types.is_empty() {
            ui.label(format!("Drive cages: {}", server.chassis_types.join(", ")));
        }
        ui.add_space(ITEM_SPACING);

        let label = if selected { "Start over" } else { "Select server" };
        if ui.button(label).clicked() {
            action = LibraryAction::SelectChassis(server.id);
        }
    });

    if selected {
        ui.add_space(SECTION_SPACING);
        if let Some(choice) = power_supply_picker(ui, engine) {
            action = choice;
        }
    }

    action
}

fn power_supply_picker(ui: &mut egui::Ui, engine: &ConfigurationEngine) -> Option<LibraryAction> {
    let catalog = engine.catalog();
    if catalog.constraints.power_supply_options.is_empty() {
        return None;
    }

    let mut choice = engine.power_supply_index();
    let current = engine
        .power_supply()
        .map_or_else(|| "Chassis maximum".to_string(), |psu| psu.name.clone());

    ui.label(egui::RichText::new("Power supply").strong());
    egui::ComboBox::from_id_salt("power_supply")
        .selected_text(current)
        .show_ui(ui, |ui| {
            ui.selectable_value(&mut choice, None, "Chassis maximum");
            for (index, psu) in catalog.constraints.power_supply_options.iter().enumerate() {
                ui.selectable_value(&mut choice, Some(index), format!("{} ({}W)", psu.name, psu.watts));
            }
        });

    (choice != engine.power_supply_index()).then_some(LibraryAction::ChoosePowerSupply(choice))
}

fn parts_tab(ui: &mut egui::Ui, engine: &ConfigurationEngine, category: Category) -> LibraryAction {
    let mut action = LibraryAction::None;
    let catalog = engine.catalog();

    if engine.selected_chassis().is_none() {
        ui.colored_label(WARNING_TEXT, "Select a server first");
        ui.add_space(ITEM_SPACING);
    } else {
        ui.label(
            egui::RichText::new(format!(
                "Drag a card onto the {category} area. {} more can be added.",
                engine.remaining(category)
            ))
            .small()
            .color(MUTED_TEXT),
        );
    }
    if category == Category::Memory {
        ui.label(
            egui::RichText::new(memory_hint(catalog))
                .small()
                .color(MUTED_TEXT),
        );
    }
    ui.add_space(ITEM_SPACING);

    let selected = engine.selection().get(category);
    for part in catalog.parts(category) {
        if let Some(chosen) = part_card(ui, part, part.id() == selected) {
            action = chosen;
        }
        ui.add_space(ITEM_SPACING);
    }

    action
}

fn memory_hint(catalog: &Catalog) -> String {
    format!(
        "{} modules per installed CPU",
        catalog.constraints.memory_per_processor
    )
}

fn part_card(ui: &mut egui::Ui, part: PartRef<'_>, selected: bool) -> Option<LibraryAction> {
    let mut action = None;
    let category = part.category();
    let payload = PartDrag {
        category,
        part: part.id(),
    };
    let id = egui::Id::new(("library_card", category, part.id()));

    ui.dnd_drag_source(id, payload, |ui| {
        ui.group(|ui| {
            ui.set_width(ui.available_width());
            ui.label(egui::RichText::new(part.name()).strong());
            ui.label(egui::RichText::new(part.summary()).small());
            ui.label(egui::RichText::new(part.manufacturer()).small().color(MUTED_TEXT));
            if let Some(notes) = part.notes() {
                ui.colored_label(WARNING_TEXT, notes);
            }
            if !part.compatible() {
                ui.colored_label(STATUS_ERROR, "Not compatible with this server");
            }
        });
    });

    ui.horizontal(|ui| {
        if selected {
            ui.colored_label(STATUS_OK, "\u{2714} In use");
            if ui.small_button("\u{2795} Add").clicked() {
                action = Some(LibraryAction::AddPart(category));
            }
        } else {
            if ui.small_button("Use this part").clicked() {
                action = Some(LibraryAction::ChoosePart(category, part.id()));
            }
            ui.label(
                egui::RichText::new("Dropping adds the model in use")
                    .small()
                    .color(MUTED_TEXT),
            );
        }
    });

    action
}
