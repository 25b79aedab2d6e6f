//! Error types for the catalog, the configuration engine and the export path
//!
//! Domain errors use thiserror so callers can match on the variant; the
//! application edges wrap them in anyhow.

use std::path::PathBuf;
use thiserror::Error;

use crate::catalog::{Category, ChassisId, PartId};

/// Rejected configuration operations
///
/// Every variant leaves the configuration untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Select a server before adding parts")]
    NoChassisSelected,

    #[error("Server {0} is not in the catalog")]
    UnknownChassis(ChassisId),

    #[error("{category} is limited to {limit} unit(s)")]
    CapacityExceeded { category: Category, limit: u32 },

    #[error("{declared} cannot be placed in the {target} area")]
    CategoryMismatch { declared: Category, target: Category },

    #[error("Power budget exceeded: {required}W required, {limit}W available")]
    PowerBudgetExceeded { required: u64, limit: u32 },

    #[error("Removing a CPU would leave {installed} memory modules installed, only {limit} supported")]
    MemoryRequiresProcessor { installed: u32, limit: u32 },

    #[error("{category} part {id} is not in the catalog")]
    UnknownPart { category: Category, id: PartId },

    #[error("Power supply option {0} does not exist")]
    UnknownPowerSupply(usize),
}

/// Catalog loading and validation failures
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Catalog has no {0} parts")]
    EmptyCategory(Category),

    #[error("Catalog lists {category} part {id} more than once")]
    DuplicatePartId { category: Category, id: PartId },

    #[error("Catalog limit '{0}' must be greater than zero")]
    InvalidLimit(&'static str),

    #[error("Memory part {0} has zero capacity")]
    InvalidCapacity(PartId),
}

/// Export failures
///
/// A failed export never leaves a partial document behind.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Export failed: no server selected")]
    NoChassisSelected,

    #[error("Export rejected: {0}")]
    InvalidConfiguration(#[from] EngineError),

    #[error("Export failed: another export is already in progress")]
    Busy,

    #[error("Export failed: could not render document ({0})")]
    Render(String),

    #[error("Export failed: could not load font {path}: {source}")]
    Font {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Export failed: could not write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Result alias for export operations
pub type ExportResult<T> = Result<T, ExportError>;
