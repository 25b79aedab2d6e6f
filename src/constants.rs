//! Application-wide constants
//!
//! This module contains all magic numbers and string literals used throughout
//! the application, providing a single source of truth for constant values.

/// Fixed unit prices used for cost estimation (KRW)
///
/// The catalog carries no pricing of its own, so every model in a category
/// is priced the same.
pub mod pricing {
    /// Price per installed CPU
    pub const CPU_UNIT_PRICE: u64 = 15_000_000;

    /// Price per installed GPU
    pub const GPU_UNIT_PRICE: u64 = 30_000_000;

    /// Price per installed memory module
    pub const MEMORY_UNIT_PRICE: u64 = 2_000_000;

    /// Currency prefix used when rendering amounts
    pub const CURRENCY_PREFIX: &str = "KRW ";
}

/// Power model constants
pub mod power {
    /// Assumed draw of a single memory module in watts
    pub const MEMORY_MODULE_POWER_W: u32 = 10;
}

/// Default part choice per category, as catalog list indices
///
/// Falls back to the last entry when a catalog has fewer parts.
pub mod selection {
    pub const DEFAULT_CPU_INDEX: usize = 0;
    pub const DEFAULT_GPU_INDEX: usize = 0;
    pub const DEFAULT_MEMORY_INDEX: usize = 2;
}

/// Config file location
pub mod config {
    /// Directory under the platform config dir
    pub const APP_DIR: &str = "server-configurator";

    /// Config filename
    pub const FILENAME: &str = "config.toml";
}

/// Export defaults
pub mod export {
    /// Default file name for generated documents
    pub const DEFAULT_FILE_NAME: &str = "server_configuration.pdf";

    /// MIME type of generated documents
    pub const CONTENT_TYPE: &str = "application/pdf";
}

/// HTTP export server defaults
pub mod server {
    /// Default listen address
    pub const DEFAULT_BIND: &str = "0.0.0.0:5000";

    /// Default directory of the built web front end
    pub const DEFAULT_STATIC_DIR: &str = "dist";

    /// SPA entry point served for unknown GET paths
    pub const INDEX_FILE: &str = "index.html";

    /// Maximum accepted request body (1 MB)
    pub const MAX_BODY_BYTES: usize = 1024 * 1024;
}

/// PDF report layout (millimetres unless noted)
pub mod report {
    /// A4 portrait
    pub const PAGE_WIDTH_MM: f32 = 210.0;
    pub const PAGE_HEIGHT_MM: f32 = 297.0;
    pub const MARGIN_MM: f32 = 20.0;

    /// Indent of items and part details below a heading
    pub const ITEM_INDENT_MM: f32 = 5.0;
    pub const DETAIL_INDENT_MM: f32 = 10.0;

    /// Font sizes in points
    pub const TITLE_SIZE: f32 = 20.0;
    pub const HEADING_SIZE: f32 = 14.0;
    pub const ITEM_SIZE: f32 = 11.0;
    pub const DETAIL_SIZE: f32 = 10.0;
    pub const HIGHLIGHT_SIZE: f32 = 16.0;
    pub const SMALL_SIZE: f32 = 9.0;

    /// Line advance as a multiple of the font size
    pub const LINE_SPACING: f32 = 1.5;
    pub const SECTION_GAP_MM: f32 = 5.0;
    pub const BAR_HEIGHT_MM: f32 = 4.0;

    /// Colors as RGB in 0.0..=1.0
    pub const TEXT_COLOR: (f32, f32, f32) = (0.2, 0.2, 0.2);
    pub const HEADING_COLOR: (f32, f32, f32) = (0.17, 0.24, 0.31);
    pub const MUTED_COLOR: (f32, f32, f32) = (0.4, 0.4, 0.4);
    pub const BAR_TRACK_COLOR: (f32, f32, f32) = (0.93, 0.93, 0.93);
    pub const BAR_FILL_COLOR: (f32, f32, f32) = (0.2, 0.6, 0.86);
    pub const DIVIDER_COLOR: (f32, f32, f32) = (0.87, 0.87, 0.87);
}
