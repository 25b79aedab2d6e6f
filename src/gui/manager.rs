//! Configurator window implemented with egui/eframe

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Result};
use eframe::{egui, CreationContext, NativeOptions};
use tracing::{error, info, warn};

use super::components::{canvas, info_panel, CanvasAction, LibraryAction, PartDrag, PartLibrary};
use super::constants::*;
use crate::catalog::{Catalog, Category};
use crate::config::Config;
use crate::engine::ConfigurationEngine;
use crate::errors::{EngineResult, ExportError, ExportResult};
use crate::report::{self, ExportGate, ReportFont, ReportInput};

struct StatusMessage {
    text: String,
    color: egui::Color32,
}

/// Modal message the user has to acknowledge
struct Notice {
    title: &'static str,
    text: String,
}

/// Message for a drop that installed a different model than the dragged card
fn substitution_hint(engine: &ConfigurationEngine, dragged: &PartDrag) -> Option<String> {
    let in_use = engine.selection().get(dragged.category);
    if in_use == dragged.part {
        return None;
    }
    let catalog = engine.catalog();
    let installed = catalog.part(dragged.category, in_use)?;
    let dropped = catalog.part(dragged.category, dragged.part)?;
    Some(format!(
        "Added {} (the {} in use), not {}. Choose \"Use this part\" to switch models.",
        installed.name(),
        dragged.category,
        dropped.name()
    ))
}

struct ConfiguratorApp {
    engine: ConfigurationEngine,
    library: PartLibrary,
    output_path: PathBuf,
    font: ReportFont,
    gate: ExportGate,
    pending_export: Option<Receiver<ExportResult<PathBuf>>>,
    status_message: Option<StatusMessage>,
    notice: Option<Notice>,
}

impl ConfiguratorApp {
    fn new(_cc: &CreationContext<'_>, config: &Config, catalog: Arc<Catalog>) -> Self {
        info!("Initializing configurator window");

        let mut status_message = None;
        let font = match ReportFont::from_config(config.export.font_path.as_deref()) {
            Ok(font) => font,
            Err(err) => {
                error!(error = ?err, "Failed to load report font, using built-in font");
                status_message = Some(StatusMessage {
                    text: format!("{err}. Using the built-in font."),
                    color: STATUS_ERROR,
                });
                ReportFont::Builtin
            }
        };

        Self {
            engine: ConfigurationEngine::new(catalog, config.engine.power_policy),
            library: PartLibrary::new(),
            output_path: config.export.output_path(),
            font,
            gate: ExportGate::new(),
            pending_export: None,
            status_message,
            notice: None,
        }
    }

    fn show_notice(&mut self, title: &'static str, text: String) {
        self.notice = Some(Notice { title, text });
    }

    /// Surface a rejected operation; the engine state is already unchanged
    fn apply(&mut self, result: EngineResult<()>) {
        if let Err(err) = result {
            self.show_notice("Not allowed", err.to_string());
        }
    }

    fn handle_library(&mut self, action: LibraryAction) {
        let result = match action {
            LibraryAction::None => return,
            LibraryAction::SelectChassis(id) => self.engine.select_chassis(id),
            LibraryAction::ChoosePart(category, id) => self.engine.choose_part(category, id),
            LibraryAction::AddPart(category) => self.engine.add_part(category).map(|_| ()),
            LibraryAction::ChoosePowerSupply(index) => self.engine.choose_power_supply(index),
        };
        self.apply(result);
    }

    fn handle_canvas(&mut self, action: CanvasAction) {
        let result = match action {
            CanvasAction::None => return,
            CanvasAction::Drop { dragged, target } => self.drop_part(dragged, target),
            CanvasAction::Remove(category) => self.engine.remove_part(category).map(|_| ()),
        };
        self.apply(result);
    }

    /// Dropping a card adds one unit of the model currently in use
    fn drop_part(&mut self, dragged: PartDrag, target: Category) -> EngineResult<()> {
        info!(category = %dragged.category, part = dragged.part, %target, "Part dropped");
        self.engine.add_dragged(Some(dragged.category), target)?;
        if let Some(text) = substitution_hint(&self.engine, &dragged) {
            self.status_message = Some(StatusMessage {
                text,
                color: WARNING_TEXT,
            });
        }
        Ok(())
    }

    fn start_export(&mut self) {
        if self.pending_export.is_some() || self.gate.is_busy() {
            self.show_notice("Export", ExportError::Busy.to_string());
            return;
        }
        if self.engine.selected_chassis().is_none() {
            self.show_notice("Export", ExportError::NoChassisSelected.to_string());
            return;
        }
        let permit = match self.gate.try_acquire() {
            Ok(permit) => permit,
            Err(err) => {
                self.show_notice("Export", err.to_string());
                return;
            }
        };

        let input = ReportInput::from_engine(&self.engine);
        let font = self.font.clone();
        let output = self.output_path.clone();
        let (tx, rx) = mpsc::channel();

        info!(path = %output.display(), "Starting export");
        thread::spawn(move || {
            let _permit = permit;
            let result = report::export_to_file(&input, &font, &output);
            let _ = tx.send(result);
        });

        self.pending_export = Some(rx);
        self.status_message = Some(StatusMessage {
            text: "Generating PDF...".to_string(),
            color: STATUS_PENDING,
        });
    }

    fn poll_export(&mut self) {
        let Some(rx) = &self.pending_export else {
            return;
        };
        let outcome = match rx.try_recv() {
            Ok(outcome) => outcome,
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Disconnected) => Err(ExportError::Render(
                "export worker stopped unexpectedly".to_string(),
            )),
        };
        self.pending_export = None;

        match outcome {
            Ok(path) => {
                info!(path = %path.display(), "Export finished");
                self.status_message = Some(StatusMessage {
                    text: format!("Saved {}", path.display()),
                    color: STATUS_OK,
                });
            }
            Err(err) => {
                warn!(error = %err, "Export failed");
                self.status_message = None;
                self.show_notice("Export", err.to_string());
            }
        }
    }

    fn notice_window(&mut self, ctx: &egui::Context) {
        let Some(notice) = &self.notice else {
            return;
        };

        let mut dismissed = false;
        egui::Modal::new(egui::Id::new("notice")).show(ctx, |ui| {
            ui.set_max_width(360.0);
            ui.heading(notice.title);
            ui.add_space(ITEM_SPACING);
            ui.label(&notice.text);
            ui.add_space(SECTION_SPACING);
            if ui.button("OK").clicked() {
                dismissed = true;
            }
        });

        if dismissed {
            self.notice = None;
        }
    }
}

impl eframe::App for ConfiguratorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_export();

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.add_space(PADDING / 2.0);
            ui.horizontal(|ui| {
                ui.heading("Server Configurator");
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let exporting = self.pending_export.is_some();
                    if ui
                        .add_enabled(!exporting, egui::Button::new("\u{1F4C4} Export PDF"))
                        .clicked()
                    {
                        self.start_export();
                    }
                    if exporting {
                        ui.spinner();
                    }
                    if let Some(message) = &self.status_message {
                        ui.colored_label(message.color, &message.text);
                    }
                });
            });
            ui.add_space(PADDING / 2.0);
        });

        let library_action = egui::SidePanel::left("part_library")
            .resizable(true)
            .default_width(LIBRARY_PANEL_WIDTH)
            .show(ctx, |ui| self.library.ui(ui, &self.engine))
            .inner;

        egui::SidePanel::right("info_panel")
            .resizable(true)
            .default_width(INFO_PANEL_WIDTH)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| info_panel::ui(ui, &self.engine));
            });

        let canvas_action = egui::CentralPanel::default()
            .show(ctx, |ui| canvas::ui(ui, &self.engine))
            .inner;

        if self.notice.is_none() {
            self.handle_library(library_action);
            self.handle_canvas(canvas_action);
        }
        self.notice_window(ctx);

        if self.pending_export.is_some() {
            ctx.request_repaint_after(Duration::from_millis(EXPORT_POLL_INTERVAL_MS));
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        if self.pending_export.is_some() {
            warn!("Exiting while an export is still running");
        }
        info!("Configurator exiting");
    }
}

pub fn run_gui(config: &Config, catalog: Arc<Catalog>) -> Result<()> {
    let options = NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([
                f32::from(config.manager.window_width),
                f32::from(config.manager.window_height),
            ])
            .with_min_inner_size([WINDOW_MIN_WIDTH, WINDOW_MIN_HEIGHT])
            .with_title("Server Configurator"),
        ..Default::default()
    };

    let config = config.clone();
    eframe::run_native(
        "Server Configurator",
        options,
        Box::new(move |cc| Ok(Box::new(ConfiguratorApp::new(cc, &config, catalog)))),
    )
    .map_err(|err| anyhow!("Failed to launch configurator window: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::PowerPolicy;

    fn engine() -> ConfigurationEngine {
        let mut engine =
            ConfigurationEngine::new(Arc::new(Catalog::embedded().unwrap()), PowerPolicy::Enforce);
        engine.select_chassis(1).unwrap();
        engine
    }

    #[test]
    fn test_dropping_model_in_use_needs_no_hint() {
        let engine = engine();
        let dragged = PartDrag {
            category: Category::Cpu,
            part: engine.selection().get(Category::Cpu),
        };
        assert_eq!(substitution_hint(&engine, &dragged), None);
    }

    #[test]
    fn test_dropping_other_model_names_both_parts() {
        let engine = engine();
        let catalog = engine.catalog();
        let in_use = engine.selection().get(Category::Cpu);
        let other = catalog
            .compatible_parts
            .cpu
            .iter()
            .find(|cpu| cpu.id != in_use)
            .unwrap();
        let dragged = PartDrag {
            category: Category::Cpu,
            part: other.id,
        };

        let hint = substitution_hint(&engine, &dragged).unwrap();
        assert!(hint.contains(&catalog.cpu(in_use).unwrap().name));
        assert!(hint.contains(&other.name));
    }
}
