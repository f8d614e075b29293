//! Store seams between the reconciler passes and the databases they read and write.

use uuid::Uuid;

use crate::database::source::LegacySchema;
use crate::error::{Result, RowError};
use crate::models::{
    LegacyBooking, LegacyCompany, LegacyProfile, LegacyService, NewBooking, NewCompany,
    NewProfile, NewService, TargetTable, UserRole,
};

/// Every row of one entity; rows that failed to decode carry their [`RowError`].
pub type Fetched<T> = Vec<std::result::Result<T, RowError>>;

/// Whether a write created the target row or changed an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Inserted,
    Updated,
}

/// A read-only legacy database.
#[async_trait::async_trait]
pub trait SourceStore: Send + Sync {
    fn schema(&self) -> LegacySchema;

    async fn fetch_profiles(&self) -> Result<Fetched<LegacyProfile>>;

    async fn fetch_companies(&self) -> Result<Fetched<LegacyCompany>>;

    async fn fetch_services(&self) -> Result<Fetched<LegacyService>>;

    /// Schemas without a bookings table return no rows.
    async fn fetch_bookings(&self) -> Result<Fetched<LegacyBooking>>;
}

/// The unified database. Every write commits on its own.
#[async_trait::async_trait]
pub trait TargetStore: Send + Sync {
    /// Existing profile matching `email`, else matching `id`.
    async fn find_profile(&self, email: &str, id: Uuid) -> Result<Option<Uuid>>;

    /// Returns the id of the written row.
    async fn insert_profile(&self, profile: &NewProfile) -> Result<Uuid>;

    /// Writes only the columns currently NULL on `target_id`; `updated_at` keeps the later value.
    async fn fill_profile(&self, target_id: Uuid, profile: &NewProfile) -> Result<Uuid>;

    /// Sets `company_id` when it is still NULL. Returns whether a row changed.
    async fn link_profile_company(&self, profile_id: Uuid, company_id: Uuid) -> Result<bool>;

    /// Existing company matching `slug` or `name`, else matching `id`.
    async fn find_company(&self, slug: &str, name: &str, id: Uuid) -> Result<Option<Uuid>>;

    /// `None` when a conflicting row already exists and nothing was written.
    async fn insert_company(&self, company: &NewCompany) -> Result<Option<Uuid>>;

    /// Fill-null update that never touches `name` or `slug`.
    async fn fill_company(&self, target_id: Uuid, company: &NewCompany) -> Result<Uuid>;

    /// Insert, or overwrite title, description, price and status on id conflict.
    async fn upsert_service(&self, service: &NewService) -> Result<WriteOutcome>;

    /// Insert, or overwrite client, provider, service and status on id conflict.
    async fn upsert_booking(&self, booking: &NewBooking) -> Result<WriteOutcome>;

    /// Grants `role` to each profile in `profile_ids` whose stored role matches.
    /// Existing assignments are left alone. Returns the number of new rows.
    async fn assign_role(&self, role: UserRole, profile_ids: &[Uuid]) -> Result<u64>;

    async fn refresh_permissions_view(&self) -> Result<()>;

    async fn count_rows(&self, table: TargetTable) -> Result<i64>;
}
