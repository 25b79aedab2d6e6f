use serde::{Deserialize, Serialize};

use super::{Catalog, Category, CpuSpec, GpuSpec, MemorySpec, PartId};
use crate::constants::selection::{DEFAULT_CPU_INDEX, DEFAULT_GPU_INDEX, DEFAULT_MEMORY_INDEX};
use crate::errors::EngineError;

/// Which catalog model prices and powers the installed units of each category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartSelection {
    pub cpu: PartId,
    pub gpu: PartId,
    pub memory: PartId,
}

impl PartSelection {
    /// Default models: first CPU, first GPU, third memory module.
    /// Catalogs with fewer entries fall back to their last one.
    pub fn defaults_for(catalog: &Catalog) -> Self {
        fn pick<T>(items: &[T], index: usize, id: impl Fn(&T) -> PartId) -> PartId {
            items.get(index).or_else(|| items.last()).map(id).unwrap_or_default()
        }

        let parts = &catalog.compatible_parts;
        Self {
            cpu: pick(parts.cpu.as_slice(), DEFAULT_CPU_INDEX, |p| p.id),
            gpu: pick(parts.gpu.as_slice(), DEFAULT_GPU_INDEX, |p| p.id),
            memory: pick(parts.memory.as_slice(), DEFAULT_MEMORY_INDEX, |p| p.id),
        }
    }

    pub fn get(&self, category: Category) -> PartId {
        match category {
            Category::Cpu => self.cpu,
            Category::Gpu => self.gpu,
            Category::Memory => self.memory,
        }
    }

    pub fn set(&mut self, category: Category, id: PartId) {
        match category {
            Category::Cpu => self.cpu = id,
            Category::Gpu => self.gpu = id,
            Category::Memory => self.memory = id,
        }
    }

    /// Look the selected ids up in the catalog
    pub fn resolve<'a>(&self, catalog: &'a Catalog) -> Result<ResolvedSelection<'a>, EngineError> {
        let unknown = |category, id| EngineError::UnknownPart { category, id };
        Ok(ResolvedSelection {
            cpu: catalog.cpu(self.cpu).ok_or_else(|| unknown(Category::Cpu, self.cpu))?,
            gpu: catalog.gpu(self.gpu).ok_or_else(|| unknown(Category::Gpu, self.gpu))?,
            memory: catalog
                .memory(self.memory)
                .ok_or_else(|| unknown(Category::Memory, self.memory))?,
        })
    }
}

/// Selected specs borrowed from the catalog
#[derive(Debug, Clone, Copy)]
pub struct ResolvedSelection<'a> {
    pub cpu: &'a CpuSpec,
    pub gpu: &'a GpuSpec,
    pub memory: &'a MemorySpec,
}

impl ResolvedSelection<'_> {
    pub fn name(&self, category: Category) -> &str {
        match category {
            Category::Cpu => &self.cpu.name,
            Category::Gpu => &self.gpu.name,
            Category::Memory => &self.memory.name,
        }
    }
}
