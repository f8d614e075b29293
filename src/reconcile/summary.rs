use serde::Serialize;

use crate::models::TargetTable;

/// Tally for one reconciler pass.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PassReport {
    pub entity: &'static str,
    pub seen: u64,
    pub inserted: u64,
    pub updated: u64,
    pub skipped: u64,
}

impl PassReport {
    pub fn new(entity: &'static str) -> Self {
        Self {
            entity,
            seen: 0,
            inserted: 0,
            updated: 0,
            skipped: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct TableCount {
    pub table: TargetTable,
    pub rows: i64,
}

/// Everything a run reports back to its caller.
#[derive(Debug, Clone, Serialize)]
pub struct MigrationSummary {
    pub passes: Vec<PassReport>,
    pub profile_identities: usize,
    pub company_identities: usize,
    pub service_identities: usize,
    pub company_links_resolved: usize,
    pub role_assignments_created: u64,
    pub permissions_view_refreshed: bool,
    pub table_counts: Vec<TableCount>,
}

impl MigrationSummary {
    pub fn skipped_rows(&self) -> u64 {
        self.passes.iter().map(|p| p.skipped).sum()
    }

    pub fn log(&self) {
        log::info!("📊 Migration summary");
        for count in &self.table_counts {
            log::info!("  {}: {} rows", count.table.as_str(), count.rows);
        }
        log::info!(
            "  identity mappings: {} profiles, {} companies, {} services",
            self.profile_identities,
            self.company_identities,
            self.service_identities
        );
        log::info!("  profile company links resolved: {}", self.company_links_resolved);
        log::info!("  role assignments created: {}", self.role_assignments_created);
        if !self.permissions_view_refreshed {
            log::warn!("  user_permissions view was not refreshed");
        }
        if self.skipped_rows() > 0 {
            log::warn!("  {} rows skipped, see warnings above", self.skipped_rows());
        }
    }
}
