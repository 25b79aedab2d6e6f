//! Derived usage: power draw, memory capacity and estimated cost
//!
//! Everything here is a pure function of the part counts and the selected
//! catalog models. Nothing is cached, so the figures can never drift from the
//! counts they were computed from.

use serde::Serialize;

use super::PartCounts;
use crate::catalog::{Category, Chassis, ResolvedSelection};
use crate::constants::power::MEMORY_MODULE_POWER_W;
use crate::constants::pricing::{CPU_UNIT_PRICE, GPU_UNIT_PRICE, MEMORY_UNIT_PRICE};

/// Estimated cost per category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CostBreakdown {
    pub cpu: u64,
    pub gpu: u64,
    pub memory: u64,
}

impl CostBreakdown {
    pub fn total(&self) -> u64 {
        self.cpu + self.gpu + self.memory
    }

    pub fn get(&self, category: Category) -> u64 {
        match category {
            Category::Cpu => self.cpu,
            Category::Gpu => self.gpu,
            Category::Memory => self.memory,
        }
    }
}

/// Resource and cost totals for one configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Usage {
    pub power_watts: u64,
    pub power_limit_watts: u32,
    pub memory_gb: u64,
    pub memory_limit_gb: u64,
    pub cost: CostBreakdown,
}

impl Usage {
    /// Power utilisation for progress bars, clamped to 100
    pub fn power_percent(&self) -> f32 {
        percent(self.power_watts, u64::from(self.power_limit_watts))
    }

    /// Memory utilisation for progress bars, clamped to 100
    pub fn memory_percent(&self) -> f32 {
        percent(self.memory_gb, self.memory_limit_gb)
    }

    /// Only reachable with the advisory power policy
    pub fn power_exceeded(&self) -> bool {
        self.power_watts > u64::from(self.power_limit_watts)
    }
}

fn percent(used: u64, limit: u64) -> f32 {
    if limit == 0 {
        return 100.0;
    }
    (used as f32 / limit as f32 * 100.0).min(100.0)
}

/// Total draw in watts for the given counts
///
/// Summed in `u64`; catalog values are only bounded below.
pub fn power_draw(counts: &PartCounts, selection: &ResolvedSelection<'_>) -> u64 {
    u64::from(counts.cpu) * u64::from(selection.cpu.power)
        + u64::from(counts.gpu) * u64::from(selection.gpu.power)
        + u64::from(counts.memory) * u64::from(MEMORY_MODULE_POWER_W)
}

pub fn estimate_cost(counts: &PartCounts) -> CostBreakdown {
    CostBreakdown {
        cpu: u64::from(counts.cpu) * CPU_UNIT_PRICE,
        gpu: u64::from(counts.gpu) * GPU_UNIT_PRICE,
        memory: u64::from(counts.memory) * MEMORY_UNIT_PRICE,
    }
}

/// Compute all derived figures
pub fn derive_usage(
    counts: &PartCounts,
    selection: &ResolvedSelection<'_>,
    chassis: &Chassis,
    power_limit_watts: u32,
) -> Usage {
    Usage {
        power_watts: power_draw(counts, selection),
        power_limit_watts,
        memory_gb: u64::from(counts.memory) * u64::from(selection.memory.capacity),
        memory_limit_gb: u64::from(chassis.max_memory_slots) * u64::from(selection.memory.capacity),
        cost: estimate_cost(counts),
    }
}

/// Group digits in thousands: 77000000 -> "77,000,000"
pub fn format_amount(amount: u64) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, PartSelection};

    fn counts(cpu: u32, gpu: u32, memory: u32) -> PartCounts {
        PartCounts { cpu, gpu, memory }
    }

    #[test]
    fn test_derive_usage_reference_configuration() {
        let catalog = Catalog::embedded().unwrap();
        let selection = PartSelection::defaults_for(&catalog);
        let resolved = selection.resolve(&catalog).unwrap();

        let usage = derive_usage(&counts(1, 1, 16), &resolved, &catalog.server, 2200);

        // 1*385 + 1*250 + 16*10
        assert_eq!(usage.power_watts, 795);
        // 16 * 128GB
        assert_eq!(usage.memory_gb, 2048);
        // 32 slots * 128GB
        assert_eq!(usage.memory_limit_gb, 4096);
        assert_eq!(usage.cost.cpu, 15_000_000);
        assert_eq!(usage.cost.gpu, 30_000_000);
        assert_eq!(usage.cost.memory, 32_000_000);
        assert_eq!(usage.cost.total(), 77_000_000);
        assert!(!usage.power_exceeded());
    }

    #[test]
    fn test_derive_usage_empty_configuration() {
        let catalog = Catalog::embedded().unwrap();
        let resolved = PartSelection::defaults_for(&catalog).resolve(&catalog).unwrap();

        let usage = derive_usage(&PartCounts::default(), &resolved, &catalog.server, 2200);
        assert_eq!(usage.power_watts, 0);
        assert_eq!(usage.memory_gb, 0);
        assert_eq!(usage.cost.total(), 0);
        assert_eq!(usage.power_percent(), 0.0);
    }

    #[test]
    fn test_power_draw_follows_selected_models() {
        let catalog = Catalog::embedded().unwrap();
        let selection = PartSelection { cpu: 4, gpu: 2, memory: 1 };
        let resolved = selection.resolve(&catalog).unwrap();

        // Silver 4516+ (185W) x2, A40 (300W) x1, 4 modules x 10W
        assert_eq!(power_draw(&counts(2, 1, 4), &resolved), 370 + 300 + 40);
    }

    #[test]
    fn test_percentages_are_clamped() {
        let usage = Usage {
            power_watts: 3000,
            power_limit_watts: 1000,
            memory_gb: 64,
            memory_limit_gb: 128,
            cost: estimate_cost(&PartCounts::default()),
        };
        assert_eq!(usage.power_percent(), 100.0);
        assert_eq!(usage.memory_percent(), 50.0);
        assert!(usage.power_exceeded());
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(0), "0");
        assert_eq!(format_amount(999), "999");
        assert_eq!(format_amount(1000), "1,000");
        assert_eq!(format_amount(2_000_000), "2,000,000");
        assert_eq!(format_amount(77_000_000), "77,000,000");
        assert_eq!(format_amount(123_456_789_012), "123,456,789,012");
    }

    #[test]
    fn test_large_catalog_values_do_not_wrap() {
        let catalog = Catalog::embedded().unwrap();
        let defaults = PartSelection::defaults_for(&catalog).resolve(&catalog).unwrap();
        let mut cpu = defaults.cpu.clone();
        cpu.power = u32::MAX;
        let mut memory = defaults.memory.clone();
        memory.capacity = u32::MAX;
        let resolved = ResolvedSelection {
            cpu: &cpu,
            gpu: defaults.gpu,
            memory: &memory,
        };

        let usage = derive_usage(&counts(2, 0, 4), &resolved, &catalog.server, u32::MAX);
        assert_eq!(usage.power_watts, 2 * u64::from(u32::MAX) + 40);
        assert_eq!(usage.memory_gb, 4 * u64::from(u32::MAX));
        assert!(usage.power_exceeded());
        assert_eq!(usage.power_percent(), 100.0);
    }
}
