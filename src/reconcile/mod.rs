//! The reconciler passes and the coordinator that runs them in dependency order.
//!
//! Identity maps are plain values: each pass returns the map it built and later
//! passes borrow the maps they need.

use std::fmt::Display;

use uuid::Uuid;

use crate::database::source::LegacySchema;
use crate::error::Result;
use crate::models::TargetTable;
use crate::store::{SourceStore, TargetStore, WriteOutcome};

pub mod bookings;
pub mod companies;
pub mod profiles;
pub mod roles;
pub mod services;
pub mod summary;

pub use summary::{MigrationSummary, PassReport, TableCount};

/// Owns the stores and drives profiles → companies → services → bookings → roles.
pub struct Migrator<S, T> {
    sources: Vec<S>,
    target: T,
}

impl<S: SourceStore, T: TargetStore> Migrator<S, T> {
    pub fn new(sources: Vec<S>, target: T) -> Self {
        Self { sources, target }
    }

    pub async fn run(&self) -> Result<MigrationSummary> {
        if self.sources.is_empty() {
            log::warn!("No legacy sources configured; only roles and views will be refreshed");
        }

        let profile_pass = profiles::reconcile(&self.sources, &self.target).await?;
        let company_pass =
            companies::reconcile(&self.sources, &self.target, &profile_pass.identities).await?;
        let company_links_resolved = profiles::link_companies(
            &self.target,
            &profile_pass.company_links,
            &company_pass.identities,
        )
        .await?;
        let service_pass = services::reconcile(
            &self.sources,
            &self.target,
            &profile_pass.identities,
            &company_pass.identities,
        )
        .await?;
        let booking_report = bookings::reconcile(
            &self.sources,
            &self.target,
            &profile_pass.identities,
            &company_pass.identities,
        )
        .await?;

        let role_assignments_created =
            roles::assign_roles(&self.target, &profile_pass.identities).await?;
        let permissions_view_refreshed = roles::refresh_permissions(&self.target).await;

        let mut table_counts = Vec::with_capacity(TargetTable::ALL.len());
        for table in TargetTable::ALL {
            let rows = self.target.count_rows(table).await?;
            table_counts.push(TableCount { table, rows });
        }

        Ok(MigrationSummary {
            passes: vec![
                profile_pass.report,
                company_pass.report,
                service_pass.report,
                booking_report,
            ],
            profile_identities: profile_pass.identities.len(),
            company_identities: company_pass.identities.len(),
            service_identities: service_pass.identities.len(),
            company_links_resolved,
            role_assignments_created,
            permissions_view_refreshed,
            table_counts,
        })
    }
}

impl PassReport {
    pub(crate) fn record(&mut self, outcome: WriteOutcome) {
        match outcome {
            WriteOutcome::Inserted => self.inserted += 1,
            WriteOutcome::Updated => self.updated += 1,
        }
    }

    pub(crate) fn skip(&mut self, schema: LegacySchema, row_id: Option<Uuid>, reason: &dyn Display) {
        self.skipped += 1;
        match row_id {
            Some(id) => log::warn!(
                "Skipping {} row {} from {}: {}",
                self.entity,
                id,
                schema.label(),
                reason
            ),
            None => log::warn!(
                "Skipping {} row from {}: {}",
                self.entity,
                schema.label(),
                reason
            ),
        }
    }

    /// Keep row-level failures inside the pass; anything else aborts it.
    pub(crate) fn absorb<V>(
        &mut self,
        result: Result<V>,
        schema: LegacySchema,
        row_id: Uuid,
    ) -> Result<Option<V>> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_row_level() => {
                self.skip(schema, Some(row_id), &err);
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    pub(crate) fn log_finished(&self) {
        log::info!(
            "Migrated {} {} ({} inserted, {} updated, {} skipped)",
            self.inserted + self.updated,
            self.entity,
            self.inserted,
            self.updated,
            self.skipped
        );
    }
}
