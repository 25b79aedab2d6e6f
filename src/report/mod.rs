//! Report generator: configuration snapshot in, PDF document out
//!
//! Generation never touches a live engine. The snapshot is restored into a
//! private engine so only configurations the rules allow are documented.

mod font;
mod gate;
pub mod layout;
mod pdf;

pub use font::ReportFont;
pub use gate::ExportGate;

use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

use crate::catalog::Catalog;
use crate::engine::{ConfigurationEngine, ConfigurationSnapshot, PowerPolicy};
use crate::errors::{ExportError, ExportResult};

/// Everything needed to produce one report
#[derive(Debug, Clone)]
pub struct ReportInput {
    pub snapshot: ConfigurationSnapshot,
    pub catalog: Arc<Catalog>,
    pub policy: PowerPolicy,
}

impl ReportInput {
    pub fn from_engine(engine: &ConfigurationEngine) -> Self {
        Self {
            snapshot: engine.snapshot(),
            catalog: engine.shared_catalog(),
            policy: engine.policy(),
        }
    }
}

/// Render the report to PDF bytes, dated today
pub fn render_report(input: &ReportInput, font: &ReportFont) -> ExportResult<Vec<u8>> {
    let report = layout::compose(input, Local::now().date_naive())?;
    pdf::render(&report, font)
}

/// Render and write the report to `output`
pub fn export_to_file(input: &ReportInput, font: &ReportFont, output: &Path) -> ExportResult<PathBuf> {
    let bytes = render_report(input, font)?;
    write_atomic(output, &bytes)?;
    info!(path = %output.display(), bytes = bytes.len(), "Report written");
    Ok(output.to_path_buf())
}

/// Write via a temporary file in the same directory, then rename into place
pub fn write_atomic(path: &Path, bytes: &[u8]) -> ExportResult<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).map_err(|source| ExportError::Io {
        path: dir.clone(),
        source,
    })?;

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "report".to_string());
    let tmp = dir.join(format!(".{file_name}.tmp"));

    if let Err(source) = fs::write(&tmp, bytes).and_then(|()| fs::rename(&tmp, path)) {
        // Never leave a partial document behind
        let _ = fs::remove_file(&tmp);
        error!(path = %path.display(), error = ?source, "Failed to write report");
        return Err(ExportError::Io {
            path: path.to_path_buf(),
            source,
        });
    }
    Ok(())
}
