//! Export snapshot of a configuration
//!
//! This is also the wire shape of the export request, so restoring a snapshot
//! replays it through the engine instead of trusting the numbers.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use super::{ConfigurationEngine, PartCounts, PowerPolicy};
use crate::catalog::{Catalog, Category, ChassisId, PartSelection};
use crate::errors::{EngineError, EngineResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationSnapshot {
    pub selected_server_id: Option<ChassisId>,
    #[serde(rename = "addedParts", default)]
    pub counts: PartCounts,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection: Option<PartSelection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power_supply: Option<usize>,
}

impl ConfigurationEngine {
    pub fn snapshot(&self) -> ConfigurationSnapshot {
        ConfigurationSnapshot {
            selected_server_id: self.selected_chassis,
            counts: self.counts,
            selection: Some(self.selection),
            power_supply: self.power_supply,
        }
    }

    /// Rebuild an engine from a snapshot, applying every rule on the way
    ///
    /// Processors go in first so the memory limit has grown before modules are
    /// added; any state the engine could have produced restores cleanly.
    pub fn restore(
        catalog: Arc<Catalog>,
        policy: PowerPolicy,
        snapshot: &ConfigurationSnapshot,
    ) -> EngineResult<Self> {
        let mut engine = Self::new(catalog, policy);

        let Some(chassis) = snapshot.selected_server_id else {
            if snapshot.counts.is_empty() {
                return Ok(engine);
            }
            return Err(EngineError::NoChassisSelected);
        };
        engine.select_chassis(chassis)?;

        if let Some(selection) = snapshot.selection {
            for category in Category::ALL {
                engine.choose_part(category, selection.get(category))?;
            }
        }
        engine.choose_power_supply(snapshot.power_supply)?;

        for category in Category::ALL {
            for _ in 0..snapshot.counts.get(category) {
                engine.add_part(category)?;
            }
        }

        debug!(counts = ?engine.counts(), "Restored configuration snapshot");
        Ok(engine)
    }
}
