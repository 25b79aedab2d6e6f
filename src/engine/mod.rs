//! Configuration engine: constraint-checked part assignment for one chassis
//!
//! The engine owns the live configuration (selected chassis, part counts,
//! selected model per category and power supply). Every mutation either
//! succeeds and changes exactly what it names, or returns an [`EngineError`]
//! and leaves the state as it was.

mod snapshot;
mod usage;

pub use snapshot::ConfigurationSnapshot;
pub use usage::{derive_usage, format_amount, power_draw, Usage};

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::catalog::{Catalog, Category, ChassisId, PartId, PartSelection, PowerSupplyOption};
use crate::errors::{EngineError, EngineResult};

/// Installed units per category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartCounts {
    #[serde(default)]
    pub cpu: u32,
    #[serde(default)]
    pub gpu: u32,
    #[serde(default)]
    pub memory: u32,
}

impl PartCounts {
    pub fn get(&self, category: Category) -> u32 {
        match category {
            Category::Cpu => self.cpu,
            Category::Gpu => self.gpu,
            Category::Memory => self.memory,
        }
    }

    fn slot_mut(&mut self, category: Category) -> &mut u32 {
        match category {
            Category::Cpu => &mut self.cpu,
            Category::Gpu => &mut self.gpu,
            Category::Memory => &mut self.memory,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cpu == 0 && self.gpu == 0 && self.memory == 0
    }
}

/// Whether the power limit blocks additions or is only displayed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerPolicy {
    #[default]
    Enforce,
    Advisory,
}

/// Unit limit for `category` given the other counts
///
/// Memory scales with installed processors: `memoryPerProcessor` modules per
/// CPU, with one processor assumed while none is installed.
pub fn capacity_limit(catalog: &Catalog, category: Category, counts: &PartCounts) -> u32 {
    let server = &catalog.server;
    let constraints = &catalog.constraints;
    match category {
        Category::Cpu => server.max_cpu_sockets.min(constraints.max_cpu),
        Category::Gpu => constraints.max_gpu.min(server.max_pci_slots),
        Category::Memory => {
            let per_processor = constraints.memory_per_processor * counts.cpu.max(1);
            per_processor
                .min(server.max_memory_slots)
                .min(constraints.max_memory_modules.unwrap_or(u32::MAX))
        }
    }
}

/// The live configuration of the selected chassis
#[derive(Debug, Clone)]
pub struct ConfigurationEngine {
    catalog: Arc<Catalog>,
    policy: PowerPolicy,
    selected_chassis: Option<ChassisId>,
    counts: PartCounts,
    selection: PartSelection,
    power_supply: Option<usize>,
}

impl ConfigurationEngine {
    pub fn new(catalog: Arc<Catalog>, policy: PowerPolicy) -> Self {
        let selection = PartSelection::defaults_for(&catalog);
        Self {
            catalog,
            policy,
            selected_chassis: None,
            counts: PartCounts::default(),
            selection,
            power_supply: None,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Handle to the catalog for work that outlives this borrow (exports)
    pub fn shared_catalog(&self) -> Arc<Catalog> {
        Arc::clone(&self.catalog)
    }

    pub fn policy(&self) -> PowerPolicy {
        self.policy
    }

    pub fn selected_chassis(&self) -> Option<ChassisId> {
        self.selected_chassis
    }

    pub fn counts(&self) -> PartCounts {
        self.counts
    }

    pub fn selection(&self) -> PartSelection {
        self.selection
    }

    pub fn power_supply_index(&self) -> Option<usize> {
        self.power_supply
    }

    pub fn power_supply(&self) -> Option<&PowerSupplyOption> {
        self.power_supply.and_then(|i| self.catalog.power_supply(i))
    }

    /// Current unit limit for a category
    pub fn limit(&self, category: Category) -> u32 {
        capacity_limit(&self.catalog, category, &self.counts)
    }

    /// Units that can still be added before the count limit is reached
    pub fn remaining(&self, category: Category) -> u32 {
        self.limit(category).saturating_sub(self.counts.get(category))
    }

    /// Chassis maximum, lowered by the chosen power supply
    pub fn power_limit(&self) -> u32 {
        self.power_limit_with(self.power_supply)
    }

    fn power_limit_with(&self, power_supply: Option<usize>) -> u32 {
        let chassis_max = self.catalog.server.max_power;
        power_supply
            .and_then(|i| self.catalog.power_supply(i))
            .map_or(chassis_max, |psu| psu.watts.min(chassis_max))
    }

    /// Derived totals for the current state
    pub fn usage(&self) -> EngineResult<Usage> {
        let resolved = self.selection.resolve(&self.catalog)?;
        Ok(derive_usage(&self.counts, &resolved, &self.catalog.server, self.power_limit()))
    }

    /// Select the chassis and start over with an empty configuration
    pub fn select_chassis(&mut self, id: ChassisId) -> EngineResult<()> {
        if id != self.catalog.server.id {
            warn!(id, "Rejected unknown chassis");
            return Err(EngineError::UnknownChassis(id));
        }
        self.selected_chassis = Some(id);
        self.counts = PartCounts::default();
        self.selection = PartSelection::defaults_for(&self.catalog);
        self.power_supply = None;
        info!(id, chassis = %self.catalog.server.name, "Chassis selected, configuration reset");
        Ok(())
    }

    /// Add one unit of the selected model
    pub fn add_part(&mut self, category: Category) -> EngineResult<PartCounts> {
        if self.selected_chassis.is_none() {
            warn!(%category, "Rejected add: no chassis selected");
            return Err(EngineError::NoChassisSelected);
        }

        let limit = self.limit(category);
        let mut next = self.counts;
        let slot = next.slot_mut(category);
        if *slot >= limit {
            warn!(%category, limit, "Rejected add: capacity exceeded");
            return Err(EngineError::CapacityExceeded { category, limit });
        }
        *slot += 1;

        self.check_power(&next, &self.selection, self.power_limit())?;

        self.counts = next;
        info!(%category, count = self.counts.get(category), limit, "Part added");
        Ok(self.counts)
    }

    /// Add a part dropped onto the `target` area
    ///
    /// The dragged item's declared category must match the area; a drag that
    /// declares nothing is accepted. The match is checked before anything else.
    pub fn add_dragged(
        &mut self,
        declared: Option<Category>,
        target: Category,
    ) -> EngineResult<PartCounts> {
        if let Some(declared) = declared {
            if declared != target {
                warn!(%declared, %target, "Rejected drop: category mismatch");
                return Err(EngineError::CategoryMismatch { declared, target });
            }
        }
        self.add_part(target)
    }

    /// Remove one unit; removing from an empty category does nothing
    pub fn remove_part(&mut self, category: Category) -> EngineResult<PartCounts> {
        let mut next = self.counts;
        let slot = next.slot_mut(category);
        if *slot == 0 {
            debug!(%category, "Remove ignored: nothing installed");
            return Ok(self.counts);
        }
        *slot -= 1;

        if category == Category::Cpu {
            let limit = capacity_limit(&self.catalog, Category::Memory, &next);
            if next.memory > limit {
                warn!(installed = next.memory, limit, "Rejected CPU removal: memory depends on it");
                return Err(EngineError::MemoryRequiresProcessor {
                    installed: next.memory,
                    limit,
                });
            }
        }

        self.counts = next;
        info!(%category, count = self.counts.get(category), "Part removed");
        Ok(self.counts)
    }

    /// Switch the model used for a category; installed units switch with it
    pub fn choose_part(&mut self, category: Category, id: PartId) -> EngineResult<()> {
        if self.catalog.part(category, id).is_none() {
            return Err(EngineError::UnknownPart { category, id });
        }
        let mut selection = self.selection;
        selection.set(category, id);
        self.check_power(&self.counts, &selection, self.power_limit())?;

        self.selection = selection;
        info!(%category, id, "Part model selected");
        Ok(())
    }

    /// Choose a power supply from the catalog options, or `None` for the chassis maximum
    pub fn choose_power_supply(&mut self, index: Option<usize>) -> EngineResult<()> {
        if let Some(i) = index {
            if self.catalog.power_supply(i).is_none() {
                return Err(EngineError::UnknownPowerSupply(i));
            }
        }
        self.check_power(&self.counts, &self.selection, self.power_limit_with(index))?;

        self.power_supply = index;
        info!(index = ?index, limit = self.power_limit(), "Power supply selected");
        Ok(())
    }

    fn check_power(
        &self,
        counts: &PartCounts,
        selection: &PartSelection,
        limit: u32,
    ) -> EngineResult<()> {
        let resolved = selection.resolve(&self.catalog)?;
        let required = power_draw(counts, &resolved);
        if required <= u64::from(limit) {
            return Ok(());
        }
        match self.policy {
            PowerPolicy::Enforce => {
                warn!(required, limit, "Rejected: power budget exceeded");
                Err(EngineError::PowerBudgetExceeded { required, limit })
            }
            PowerPolicy::Advisory => {
                debug!(required, limit, "Power budget exceeded (advisory)");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn engine() -> ConfigurationEngine {
        ConfigurationEngine::new(Arc::new(Catalog::embedded().unwrap()), PowerPolicy::Enforce)
    }

    fn selected_engine() -> ConfigurationEngine {
        let mut engine = engine();
        engine.select_chassis(1).unwrap();
        engine
    }

    fn add_n(engine: &mut ConfigurationEngine, category: Category, n: u32) {
        for _ in 0..n {
            engine.add_part(category).unwrap();
        }
    }

    #[test]
    fn test_add_requires_chassis() {
        let mut engine = engine();
        assert_eq!(engine.add_part(Category::Cpu), Err(EngineError::NoChassisSelected));
        assert_eq!(engine.counts(), PartCounts::default());
    }

    #[test]
    fn test_unknown_chassis_rejected() {
        let mut engine = engine();
        assert_eq!(engine.select_chassis(7), Err(EngineError::UnknownChassis(7)));
        assert_eq!(engine.selected_chassis(), None);
    }

    #[test]
    fn test_cpu_capacity() {
        let mut engine = selected_engine();
        add_n(&mut engine, Category::Cpu, 2);
        assert_eq!(engine.counts().cpu, 2);

        // Third CPU is rejected and the count stays at 2
        assert_eq!(
            engine.add_part(Category::Cpu),
            Err(EngineError::CapacityExceeded { category: Category::Cpu, limit: 2 })
        );
        assert_eq!(engine.counts().cpu, 2);
    }

    #[test]
    fn test_gpu_capacity() {
        let mut engine = selected_engine();
        add_n(&mut engine, Category::Gpu, 3);
        assert_eq!(
            engine.add_part(Category::Gpu),
            Err(EngineError::CapacityExceeded { category: Category::Gpu, limit: 3 })
        );
        assert_eq!(engine.counts().gpu, 3);
    }

    #[test]
    fn test_memory_capacity_scales_with_cpus() {
        let mut engine = selected_engine();

        // No CPU installed: one processor's worth of slots
        assert_eq!(engine.limit(Category::Memory), 16);

        add_n(&mut engine, Category::Cpu, 2);
        add_n(&mut engine, Category::Memory, 32);
        assert_eq!(engine.counts().memory, 32);
        assert_eq!(engine.remaining(Category::Memory), 0);

        assert_eq!(
            engine.add_part(Category::Memory),
            Err(EngineError::CapacityExceeded { category: Category::Memory, limit: 32 })
        );
        assert_eq!(engine.counts().memory, 32);
    }

    #[test]
    fn test_memory_limit_without_cpu() {
        let mut engine = selected_engine();
        add_n(&mut engine, Category::Memory, 16);
        assert_eq!(
            engine.add_part(Category::Memory),
            Err(EngineError::CapacityExceeded { category: Category::Memory, limit: 16 })
        );
    }

    #[test]
    fn test_remove_from_zero_is_noop() {
        let mut engine = selected_engine();
        assert_eq!(engine.remove_part(Category::Gpu), Ok(PartCounts::default()));
        assert_eq!(engine.counts(), PartCounts::default());
    }

    #[test]
    fn test_remove_decrements_one() {
        let mut engine = selected_engine();
        add_n(&mut engine, Category::Gpu, 2);
        let counts = engine.remove_part(Category::Gpu).unwrap();
        assert_eq!(counts, PartCounts { cpu: 0, gpu: 1, memory: 0 });
    }

    #[test]
    fn test_cpu_removal_blocked_by_memory() {
        let mut engine = selected_engine();
        add_n(&mut engine, Category::Cpu, 2);
        add_n(&mut engine, Category::Memory, 20);

        // One CPU only supports 16 modules
        assert_eq!(
            engine.remove_part(Category::Cpu),
            Err(EngineError::MemoryRequiresProcessor { installed: 20, limit: 16 })
        );
        assert_eq!(engine.counts().cpu, 2);

        // After trimming memory the CPU can go
        remove_n(&mut engine, Category::Memory, 4);
        assert_eq!(engine.remove_part(Category::Cpu).unwrap().cpu, 1);
    }

    fn remove_n(engine: &mut ConfigurationEngine, category: Category, n: u32) {
        for _ in 0..n {
            engine.remove_part(category).unwrap();
        }
    }

    #[test]
    fn test_reselect_resets_counts() {
        let mut engine = selected_engine();
        add_n(&mut engine, Category::Cpu, 2);
        add_n(&mut engine, Category::Gpu, 3);
        add_n(&mut engine, Category::Memory, 10);
        engine.choose_part(Category::Gpu, 2).unwrap();
        engine.choose_power_supply(Some(3)).unwrap();

        engine.select_chassis(1).unwrap();
        assert_eq!(engine.counts(), PartCounts::default());
        assert_eq!(engine.selection(), PartSelection::defaults_for(engine.catalog()));
        assert_eq!(engine.power_supply_index(), None);
    }

    #[test]
    fn test_category_mismatch_blocks_drop() {
        let mut engine = selected_engine();
        assert_eq!(
            engine.add_dragged(Some(Category::Gpu), Category::Cpu),
            Err(EngineError::CategoryMismatch { declared: Category::Gpu, target: Category::Cpu })
        );
        assert_eq!(engine.counts().cpu, 0);
        assert_eq!(engine.counts().gpu, 0);
    }

    #[test]
    fn test_mismatch_checked_before_capacity_and_chassis() {
        // No chassis selected, yet the mismatch is what gets reported
        let mut engine = engine();
        assert!(matches!(
            engine.add_dragged(Some(Category::Memory), Category::Gpu),
            Err(EngineError::CategoryMismatch { .. })
        ));

        let mut engine = selected_engine();
        add_n(&mut engine, Category::Cpu, 2);
        assert!(matches!(
            engine.add_dragged(Some(Category::Gpu), Category::Cpu),
            Err(EngineError::CategoryMismatch { .. })
        ));
    }

    #[test]
    fn test_matching_or_undeclared_drop_adds() {
        let mut engine = selected_engine();
        engine.add_dragged(Some(Category::Memory), Category::Memory).unwrap();
        engine.add_dragged(None, Category::Memory).unwrap();
        assert_eq!(engine.counts().memory, 2);
    }

    #[test]
    fn test_power_supply_lowers_limit() {
        let mut engine = selected_engine();
        assert_eq!(engine.power_limit(), 2200);

        // 800W Flex Slot
        engine.choose_power_supply(Some(0)).unwrap();
        assert_eq!(engine.power_limit(), 800);
        assert_eq!(engine.power_supply().unwrap().watts, 800);

        // 385 + 385 = 770W fits, a GPU on top (250W) does not
        add_n(&mut engine, Category::Cpu, 2);
        assert_eq!(
            engine.add_part(Category::Gpu),
            Err(EngineError::PowerBudgetExceeded { required: 1020, limit: 800 })
        );
        assert_eq!(engine.counts().gpu, 0);

        // Three memory modules (30W) still fit, a fourth does not
        add_n(&mut engine, Category::Memory, 3);
        assert!(matches!(
            engine.add_part(Category::Memory),
            Err(EngineError::PowerBudgetExceeded { required: 810, limit: 800 })
        ));
    }

    #[test]
    fn test_power_gate_holds_for_huge_catalog_values() {
        let mut value: serde_json::Value =
            serde_json::from_str(include_str!("../../assets/catalog.json")).unwrap();
        value["compatibleParts"]["cpu"][0]["power"] = serde_json::json!(3_000_000_000u32);
        value["server"]["maxPower"] = serde_json::json!(4_000_000_000u32);
        let catalog = Catalog::from_json(&value.to_string()).unwrap();

        let mut engine = ConfigurationEngine::new(Arc::new(catalog), PowerPolicy::Enforce);
        engine.select_chassis(1).unwrap();
        engine.add_part(Category::Cpu).unwrap();
        assert_eq!(
            engine.add_part(Category::Cpu),
            Err(EngineError::PowerBudgetExceeded {
                required: 6_000_000_000,
                limit: 4_000_000_000
            })
        );
        assert_eq!(engine.counts().cpu, 1);
        assert_eq!(engine.usage().unwrap().power_watts, 3_000_000_000);
    }

    #[test]
    fn test_power_supply_rejected_when_draw_too_high() {
        let mut engine = selected_engine();
        add_n(&mut engine, Category::Cpu, 2);
        add_n(&mut engine, Category::Gpu, 1);

        // 1020W installed, 1000W supply is too small
        assert_eq!(
            engine.choose_power_supply(Some(1)),
            Err(EngineError::PowerBudgetExceeded { required: 1020, limit: 1000 })
        );
        assert_eq!(engine.power_supply_index(), None);

        assert_eq!(engine.choose_power_supply(Some(9)), Err(EngineError::UnknownPowerSupply(9)));
        engine.choose_power_supply(Some(2)).unwrap();
        engine.choose_power_supply(None).unwrap();
        assert_eq!(engine.power_limit(), 2200);
    }

    #[test]
    fn test_advisory_policy_allows_overdraw() {
        let catalog = Arc::new(Catalog::embedded().unwrap());
        let mut engine = ConfigurationEngine::new(catalog, PowerPolicy::Advisory);
        engine.select_chassis(1).unwrap();
        engine.choose_power_supply(Some(0)).unwrap();

        add_n(&mut engine, Category::Cpu, 2);
        add_n(&mut engine, Category::Gpu, 3);

        let usage = engine.usage().unwrap();
        assert_eq!(usage.power_watts, 770 + 750);
        assert!(usage.power_exceeded());
    }

    #[test]
    fn test_choose_part_switches_model() {
        let mut engine = selected_engine();
        add_n(&mut engine, Category::Cpu, 1);
        engine.choose_part(Category::Cpu, 5).unwrap();

        let usage = engine.usage().unwrap();
        // Bronze 3508U is 125W
        assert_eq!(usage.power_watts, 125);
        assert_eq!(engine.counts().cpu, 1);

        assert_eq!(
            engine.choose_part(Category::Memory, 8),
            Err(EngineError::UnknownPart { category: Category::Memory, id: 8 })
        );
        assert_eq!(engine.selection().memory, 3);
    }

    #[test]
    fn test_choose_part_respects_power_limit() {
        let mut engine = selected_engine();
        engine.choose_power_supply(Some(0)).unwrap();
        engine.choose_part(Category::Gpu, 1).unwrap();
        add_n(&mut engine, Category::Gpu, 3);

        // 3 x A40 = 900W does not fit an 800W supply
        assert_eq!(
            engine.choose_part(Category::Gpu, 2),
            Err(EngineError::PowerBudgetExceeded { required: 900, limit: 800 })
        );
        assert_eq!(engine.selection().gpu, 1);
    }

    #[test]
    fn test_usage_reference_scenario() {
        let mut engine = selected_engine();
        add_n(&mut engine, Category::Cpu, 1);
        add_n(&mut engine, Category::Gpu, 1);
        add_n(&mut engine, Category::Memory, 16);

        let usage = engine.usage().unwrap();
        assert_eq!(usage.power_watts, 795);
        assert_eq!(usage.memory_gb, 2048);
        assert_eq!(usage.cost.total(), 77_000_000);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Add(Category),
        Remove(Category),
        Drag(Option<Category>, Category),
        ChoosePsu(Option<usize>),
        Reselect,
    }

    fn category_strategy() -> impl Strategy<Value = Category> {
        prop_oneof![Just(Category::Cpu), Just(Category::Gpu), Just(Category::Memory)]
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            6 => category_strategy().prop_map(Op::Add),
            4 => category_strategy().prop_map(Op::Remove),
            2 => (proptest::option::of(category_strategy()), category_strategy())
                .prop_map(|(declared, target)| Op::Drag(declared, target)),
            1 => proptest::option::of(0usize..5).prop_map(Op::ChoosePsu),
            1 => Just(Op::Reselect),
        ]
    }

    fn apply(engine: &mut ConfigurationEngine, op: &Op) -> EngineResult<()> {
        match op {
            Op::Add(c) => engine.add_part(*c).map(|_| ()),
            Op::Remove(c) => engine.remove_part(*c).map(|_| ()),
            Op::Drag(declared, target) => engine.add_dragged(*declared, *target).map(|_| ()),
            Op::ChoosePsu(index) => engine.choose_power_supply(*index),
            Op::Reselect => engine.select_chassis(1),
        }
    }

    proptest! {
        #[test]
        fn prop_counts_stay_within_limits(ops in prop::collection::vec(op_strategy(), 0..200)) {
            let mut engine = selected_engine();
            for op in &ops {
                let _ = apply(&mut engine, op);
                let counts = engine.counts();
                for category in Category::ALL {
                    prop_assert!(counts.get(category) <= engine.limit(category));
                }
                let usage = engine.usage().unwrap();
                prop_assert!(usage.power_watts <= u64::from(usage.power_limit_watts));
                prop_assert!(usage.memory_gb <= usage.memory_limit_gb);
            }
        }

        #[test]
        fn prop_rejected_operations_leave_state_unchanged(ops in prop::collection::vec(op_strategy(), 0..200)) {
            let mut engine = selected_engine();
            for op in &ops {
                let before = (engine.counts(), engine.selection(), engine.power_supply_index());
                if apply(&mut engine, op).is_err() {
                    let after = (engine.counts(), engine.selection(), engine.power_supply_index());
                    prop_assert_eq!(before, after);
                }
            }
        }

        #[test]
        fn prop_successful_add_and_remove_change_one_count_by_one(ops in prop::collection::vec(op_strategy(), 0..200)) {
            let mut engine = selected_engine();
            for op in &ops {
                let before = engine.counts();
                let result = apply(&mut engine, op);
                let after = engine.counts();
                let delta = |c: Category| i64::from(after.get(c)) - i64::from(before.get(c));
                match op {
                    Op::Add(target) | Op::Drag(_, target) if result.is_ok() => {
                        for c in Category::ALL {
                            prop_assert_eq!(delta(c), if c == *target { 1 } else { 0 });
                        }
                    }
                    Op::Remove(target) if result.is_ok() && before.get(*target) > 0 => {
                        for c in Category::ALL {
                            prop_assert_eq!(delta(c), if c == *target { -1 } else { 0 });
                        }
                    }
                    Op::Remove(_) if result.is_ok() => prop_assert_eq!(before, after),
                    _ => {}
                }
            }
        }

        #[test]
        fn prop_reselect_always_resets(ops in prop::collection::vec(op_strategy(), 0..100)) {
            let mut engine = selected_engine();
            for op in &ops {
                let _ = apply(&mut engine, op);
            }
            engine.select_chassis(1).unwrap();
            prop_assert_eq!(engine.counts(), PartCounts::default());
        }

        #[test]
        fn prop_usage_is_deterministic(ops in prop::collection::vec(op_strategy(), 0..100)) {
            let mut engine = selected_engine();
            for op in &ops {
                let _ = apply(&mut engine, op);
            }
            prop_assert_eq!(engine.usage().unwrap(), engine.usage().unwrap());
        }
    }
}
