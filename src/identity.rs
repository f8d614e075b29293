use std::collections::HashMap;

use serde::Serialize;
use uuid::Uuid;

/// Source-side id to target-side id, for one entity kind, for one run.
///
/// Entries are only ever added. Later passes resolve foreign keys through it and
/// pass unmapped ids through unchanged.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IdentityMap {
    entries: HashMap<Uuid, Uuid>,
}

impl IdentityMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, source_id: Uuid, target_id: Uuid) {
        if let Some(previous) = self.entries.insert(source_id, target_id) {
            if previous != target_id {
                log::debug!(
                    "Identity {} remapped from {} to {} by a later source",
                    source_id,
                    previous,
                    target_id
                );
            }
        }
    }

    pub fn get(&self, source_id: &Uuid) -> Option<Uuid> {
        self.entries.get(source_id).copied()
    }

    /// Mapped id, or the source id itself when nothing was recorded for it.
    pub fn resolve(&self, source_id: Uuid) -> Uuid {
        self.get(&source_id).unwrap_or(source_id)
    }

    pub fn resolve_opt(&self, source_id: Option<Uuid>) -> Option<Uuid> {
        source_id.map(|id| self.resolve(id))
    }

    /// Distinct target ids, sorted for stable statement order.
    pub fn target_ids(&self) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = self.entries.values().copied().collect();
        ids.sort();
        ids.dedup();
        ids
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
