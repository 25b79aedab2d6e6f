//! Static catalog: the server chassis and its compatible parts
//!
//! The catalog is parsed into strict types and validated once at load time,
//! so nothing downstream has to second-guess its shape.

mod selection;

pub use selection::{PartSelection, ResolvedSelection};

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::errors::CatalogError;

pub type ChassisId = u32;
pub type PartId = u32;

const EMBEDDED_CATALOG: &str = include_str!("../../assets/catalog.json");

/// Part category, one of the three resource dimensions being filled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Cpu,
    Gpu,
    Memory,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Cpu, Category::Gpu, Category::Memory];

    pub fn label(&self) -> &'static str {
        match self {
            Category::Cpu => "CPU",
            Category::Gpu => "GPU",
            Category::Memory => "Memory",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The server enclosure and its capacity limits
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Chassis {
    #[serde(default = "default_chassis_id")]
    pub id: ChassisId,
    pub name: String,
    pub manufacturer: String,
    pub form_factor: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub chassis_types: Vec<String>,
    pub max_cpu_sockets: u32,
    pub max_memory_slots: u32,
    pub max_pci_slots: u32,
    /// Watts
    pub max_power: u32,
}

fn default_chassis_id() -> ChassisId {
    1
}

fn default_compatible() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CpuSpec {
    pub id: PartId,
    pub name: String,
    pub manufacturer: String,
    #[serde(default)]
    pub series: String,
    pub frequency: String,
    pub cores: u32,
    pub cache: String,
    /// TDP in watts
    pub power: u32,
    #[serde(default = "default_compatible")]
    pub compatible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GpuSpec {
    pub id: PartId,
    pub name: String,
    pub manufacturer: String,
    /// On-board memory, e.g. "40GB HBM2"
    pub memory: String,
    /// TDP in watts
    pub power: u32,
    #[serde(default = "default_compatible")]
    pub compatible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MemorySpec {
    pub id: PartId,
    pub name: String,
    pub manufacturer: String,
    #[serde(rename = "type")]
    pub memory_type: String,
    pub speed: String,
    /// Gigabytes per module
    pub capacity: u32,
    #[serde(default = "default_compatible")]
    pub compatible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompatibleParts {
    pub cpu: Vec<CpuSpec>,
    pub gpu: Vec<GpuSpec>,
    pub memory: Vec<MemorySpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PowerSupplyOption {
    pub name: String,
    pub watts: u32,
}

/// PCIe slots that only become usable with a second processor installed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RiserRequirement {
    pub secondary_riser: bool,
    #[serde(default)]
    pub slots: Vec<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Constraints {
    pub max_cpu: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_memory_modules: Option<u32>,
    pub max_gpu: u32,
    pub memory_per_processor: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires_second_processor_for: Option<RiserRequirement>,
    #[serde(default)]
    pub power_supply_options: Vec<PowerSupplyOption>,
}

/// Borrowed view of one catalog entry, tagged by category
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PartRef<'a> {
    Cpu(&'a CpuSpec),
    Gpu(&'a GpuSpec),
    Memory(&'a MemorySpec),
}

impl<'a> PartRef<'a> {
    pub fn category(&self) -> Category {
        match self {
            PartRef::Cpu(_) => Category::Cpu,
            PartRef::Gpu(_) => Category::Gpu,
            PartRef::Memory(_) => Category::Memory,
        }
    }

    pub fn id(&self) -> PartId {
        match self {
            PartRef::Cpu(p) => p.id,
            PartRef::Gpu(p) => p.id,
            PartRef::Memory(p) => p.id,
        }
    }

    pub fn name(&self) -> &'a str {
        match self {
            PartRef::Cpu(p) => &p.name,
            PartRef::Gpu(p) => &p.name,
            PartRef::Memory(p) => &p.name,
        }
    }

    pub fn manufacturer(&self) -> &'a str {
        match self {
            PartRef::Cpu(p) => &p.manufacturer,
            PartRef::Gpu(p) => &p.manufacturer,
            PartRef::Memory(p) => &p.manufacturer,
        }
    }

    pub fn compatible(&self) -> bool {
        match self {
            PartRef::Cpu(p) => p.compatible,
            PartRef::Gpu(p) => p.compatible,
            PartRef::Memory(p) => p.compatible,
        }
    }

    pub fn notes(&self) -> Option<&'a str> {
        match self {
            PartRef::Cpu(p) => p.notes.as_deref(),
            PartRef::Gpu(p) => p.notes.as_deref(),
            PartRef::Memory(p) => p.notes.as_deref(),
        }
    }

    /// One-line summary of the key figures ("64 cores | 2.2 GHz | 385W")
    pub fn summary(&self) -> String {
        match self {
            PartRef::Cpu(p) => format!("{} cores | {} | {}W", p.cores, p.frequency, p.power),
            PartRef::Gpu(p) => format!("{} | {}W", p.memory, p.power),
            PartRef::Memory(p) => format!("{} | {} | {}GB", p.memory_type, p.speed, p.capacity),
        }
    }
}

/// The full catalog document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    pub server: Chassis,
    pub compatible_parts: CompatibleParts,
    pub constraints: Constraints,
}

impl Catalog {
    /// The catalog compiled into the binary
    pub fn embedded() -> Result<Self, CatalogError> {
        Self::from_json(EMBEDDED_CATALOG)
    }

    /// Parse and validate a catalog document
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let catalog: Catalog = serde_json::from_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Load a catalog from a JSON file
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let contents = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_json(&contents)?;
        info!(
            path = %path.display(),
            server = %catalog.server.name,
            cpus = catalog.compatible_parts.cpu.len(),
            gpus = catalog.compatible_parts.gpu.len(),
            memory = catalog.compatible_parts.memory.len(),
            "Loaded catalog"
        );
        Ok(catalog)
    }

    /// Load from `path` when given, otherwise use the embedded catalog
    pub fn load_or_embedded(path: Option<&Path>) -> Result<Self, CatalogError> {
        match path {
            Some(path) => Self::load(path),
            None => {
                debug!("Using embedded catalog");
                Self::embedded()
            }
        }
    }

    /// Check the invariants the engine relies on
    pub fn validate(&self) -> Result<(), CatalogError> {
        let server = &self.server;
        let limits = [
            ("maxCpuSockets", server.max_cpu_sockets),
            ("maxMemorySlots", server.max_memory_slots),
            ("maxPower", server.max_power),
            ("maxCpu", self.constraints.max_cpu),
            ("memoryPerProcessor", self.constraints.memory_per_processor),
        ];
        for (name, value) in limits {
            if value == 0 {
                return Err(CatalogError::InvalidLimit(name));
            }
        }

        for category in Category::ALL {
            let ids: Vec<PartId> = self.parts(category).iter().map(|p| p.id()).collect();
            if ids.is_empty() {
                return Err(CatalogError::EmptyCategory(category));
            }
            let mut seen = HashSet::new();
            for id in ids {
                if !seen.insert(id) {
                    return Err(CatalogError::DuplicatePartId { category, id });
                }
            }
        }

        if let Some(bad) = self.compatible_parts.memory.iter().find(|m| m.capacity == 0) {
            return Err(CatalogError::InvalidCapacity(bad.id));
        }

        Ok(())
    }

    /// All parts of a category in catalog order
    pub fn parts(&self, category: Category) -> Vec<PartRef<'_>> {
        match category {
            Category::Cpu => self.compatible_parts.cpu.iter().map(PartRef::Cpu).collect(),
            Category::Gpu => self.compatible_parts.gpu.iter().map(PartRef::Gpu).collect(),
            Category::Memory => self.compatible_parts.memory.iter().map(PartRef::Memory).collect(),
        }
    }

    pub fn part(&self, category: Category, id: PartId) -> Option<PartRef<'_>> {
        self.parts(category).into_iter().find(|p| p.id() == id)
    }

    pub fn cpu(&self, id: PartId) -> Option<&CpuSpec> {
        self.compatible_parts.cpu.iter().find(|p| p.id == id)
    }

    pub fn gpu(&self, id: PartId) -> Option<&GpuSpec> {
        self.compatible_parts.gpu.iter().find(|p| p.id == id)
    }

    pub fn memory(&self, id: PartId) -> Option<&MemorySpec> {
        self.compatible_parts.memory.iter().find(|p| p.id == id)
    }

    pub fn power_supply(&self, index: usize) -> Option<&PowerSupplyOption> {
        self.constraints.power_supply_options.get(index)
    }
}
