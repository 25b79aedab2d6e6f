//! Font selection for generated documents

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::errors::{ExportError, ExportResult};

/// Leading bytes of the font formats printpdf can embed
const FONT_SIGNATURES: [&[u8; 4]; 4] = [b"\x00\x01\x00\x00", b"true", b"OTTO", b"ttcf"];

/// Font used for all report text
#[derive(Debug, Clone, Default)]
pub enum ReportFont {
    /// PDF base-14 Helvetica, nothing embedded
    #[default]
    Builtin,
    /// TrueType/OpenType file embedded into each document
    External { path: PathBuf, data: Arc<Vec<u8>> },
}

impl ReportFont {
    /// Load a TrueType font from a file path
    pub fn from_path(path: &Path) -> ExportResult<Self> {
        info!(path = %path.display(), "Loading report font");

        let font_error = |source| ExportError::Font {
            path: path.to_path_buf(),
            source,
        };

        let data = fs::read(path).map_err(font_error)?;
        let recognised = data
            .get(..4)
            .is_some_and(|head| FONT_SIGNATURES.iter().any(|sig| head == &sig[..]));
        if !recognised {
            return Err(font_error(io::Error::new(
                io::ErrorKind::InvalidData,
                "not a TrueType or OpenType font",
            )));
        }

        debug!(path = %path.display(), bytes = data.len(), "Report font loaded");
        Ok(Self::External {
            path: path.to_path_buf(),
            data: Arc::new(data),
        })
    }

    /// Configured font, or the built-in one when none is set
    pub fn from_config(path: Option<&Path>) -> ExportResult<Self> {
        match path {
            Some(path) => Self::from_path(path),
            None => Ok(Self::Builtin),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Builtin => "Helvetica (built-in)".to_string(),
            Self::External { path, .. } => path.display().to_string(),
        }
    }
}
