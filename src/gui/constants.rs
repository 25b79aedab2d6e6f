//! GUI-specific constants for layout, status colors and intervals

use egui;

/// Configurator window limits (initial size comes from the config file)
pub const WINDOW_MIN_WIDTH: f32 = 960.0;
pub const WINDOW_MIN_HEIGHT: f32 = 600.0;

/// Side panel widths
pub const LIBRARY_PANEL_WIDTH: f32 = 300.0;
pub const INFO_PANEL_WIDTH: f32 = 280.0;

/// Layout spacing
pub const PADDING: f32 = 10.0;
pub const SECTION_SPACING: f32 = 15.0;
pub const ITEM_SPACING: f32 = 8.0;

/// Minimum height of a drop zone on the canvas
pub const DROP_ZONE_MIN_HEIGHT: f32 = 140.0;

/// Status colors
pub const STATUS_OK: egui::Color32 = egui::Color32::from_rgb(0, 170, 0);
pub const STATUS_ERROR: egui::Color32 = egui::Color32::from_rgb(200, 0, 0);
pub const STATUS_PENDING: egui::Color32 = egui::Color32::from_rgb(200, 160, 0);

/// Text colors
pub const MUTED_TEXT: egui::Color32 = egui::Color32::from_rgb(130, 130, 130);
pub const WARNING_TEXT: egui::Color32 = egui::Color32::from_rgb(220, 120, 0);

/// How often a running export is polled
pub const EXPORT_POLL_INTERVAL_MS: u64 = 100;
