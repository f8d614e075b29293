//! In-memory stores for tests. `MemoryTarget` applies the same merge rules as
//! the SQL in `database::target`.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use deadpool_postgres::PoolError;
use uuid::Uuid;

use crate::database::source::{bookings_query, LegacySchema};
use crate::error::{MigrateError, Result};
use crate::models::{
    LegacyBooking, LegacyCompany, LegacyProfile, LegacyService, NewBooking, NewCompany,
    NewProfile, NewService, TargetTable, UserRole,
};
use crate::store::{Fetched, SourceStore, TargetStore, WriteOutcome};

fn fetched<T: Clone>(rows: &[T]) -> Fetched<T> {
    rows.iter().cloned().map(Ok).collect()
}

fn unreachable_store() -> MigrateError {
    MigrateError::Pool(PoolError::Closed)
}

fn rejected(entity: &'static str, id: Uuid) -> MigrateError {
    MigrateError::Rejected { entity, id }
}

fn fill<T: Clone>(current: &mut Option<T>, incoming: &Option<T>) {
    if current.is_none() {
        current.clone_from(incoming);
    }
}

/// NULL-ignoring maximum, like Postgres `GREATEST`.
fn greatest(current: &mut Option<DateTime<Utc>>, incoming: Option<DateTime<Utc>>) {
    *current = match (*current, incoming) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    };
}

pub struct MemorySource {
    schema: LegacySchema,
    pub profiles: Vec<LegacyProfile>,
    pub companies: Vec<LegacyCompany>,
    pub services: Vec<LegacyService>,
    pub bookings: Vec<LegacyBooking>,
    pub fail_companies: bool,
}

impl MemorySource {
    pub fn new(schema: LegacySchema) -> Self {
        Self {
            schema,
            profiles: Vec::new(),
            companies: Vec::new(),
            services: Vec::new(),
            bookings: Vec::new(),
            fail_companies: false,
        }
    }
}

#[async_trait::async_trait]
impl SourceStore for MemorySource {
    fn schema(&self) -> LegacySchema {
        self.schema
    }

    async fn fetch_profiles(&self) -> Result<Fetched<LegacyProfile>> {
        Ok(fetched(&self.profiles))
    }

    async fn fetch_companies(&self) -> Result<Fetched<LegacyCompany>> {
        if self.fail_companies {
            return Err(unreachable_store());
        }
        Ok(fetched(&self.companies))
    }

    async fn fetch_services(&self) -> Result<Fetched<LegacyService>> {
        Ok(fetched(&self.services))
    }

    async fn fetch_bookings(&self) -> Result<Fetched<LegacyBooking>> {
        match bookings_query(self.schema) {
            Some(_) => Ok(fetched(&self.bookings)),
            None => Ok(Vec::new()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredProfile {
    pub profile: NewProfile,
    pub company_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryState {
    pub profiles: Vec<StoredProfile>,
    pub companies: Vec<NewCompany>,
    pub services: Vec<NewService>,
    pub bookings: Vec<NewBooking>,
    pub role_assignments: Vec<(Uuid, UserRole)>,
}

#[derive(Default)]
pub struct MemoryTarget {
    state: Mutex<MemoryState>,
    fail_refresh: AtomicBool,
    hidden_company_lookups: AtomicUsize,
    rejected_rows: Mutex<Vec<Uuid>>,
}

impl MemoryTarget {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().expect("memory target poisoned")
    }

    pub fn seed_profile(&self, profile: NewProfile) {
        self.state().profiles.push(StoredProfile {
            profile,
            company_id: None,
        });
    }

    pub fn seed_company(&self, company: NewCompany) {
        self.state().companies.push(company);
    }

    /// The next `count` company lookups find nothing, as if another writer
    /// committed the row in between.
    pub fn hide_company_lookups(&self, count: usize) {
        self.hidden_company_lookups.store(count, Ordering::SeqCst);
    }

    /// Writes of this row id fail the way a server-side constraint would.
    pub fn reject_row(&self, id: Uuid) {
        self.rejected_rows
            .lock()
            .expect("rejected rows poisoned")
            .push(id);
    }

    fn check_rejected(&self, entity: &'static str, id: Uuid) -> Result<()> {
        let rows = self.rejected_rows.lock().expect("rejected rows poisoned");
        if rows.contains(&id) {
            return Err(rejected(entity, id));
        }
        Ok(())
    }

    pub fn fail_view_refresh(&self) {
        self.fail_refresh.store(true, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> MemoryState {
        self.state().clone()
    }

    pub fn profile(&self, id: Uuid) -> Option<NewProfile> {
        self.state()
            .profiles
            .iter()
            .find(|p| p.profile.id == id)
            .map(|p| p.profile.clone())
    }

    pub fn profile_company(&self, id: Uuid) -> Option<Uuid> {
        self.state()
            .profiles
            .iter()
            .find(|p| p.profile.id == id)
            .and_then(|p| p.company_id)
    }

    pub fn company(&self, id: Uuid) -> Option<NewCompany> {
        self.state().companies.iter().find(|c| c.id == id).cloned()
    }

    pub fn service(&self, id: Uuid) -> Option<NewService> {
        self.state().services.iter().find(|s| s.id == id).cloned()
    }

    pub fn booking(&self, id: Uuid) -> Option<NewBooking> {
        self.state().bookings.iter().find(|b| b.id == id).cloned()
    }

    /// Distinct roles that have at least one assignment.
    pub fn assigned_roles(&self) -> Vec<UserRole> {
        let mut roles: Vec<UserRole> = self
            .state()
            .role_assignments
            .iter()
            .map(|(_, role)| *role)
            .collect();
        roles.sort();
        roles.dedup();
        roles
    }
}

#[async_trait::async_trait]
impl TargetStore for MemoryTarget {
    async fn find_profile(&self, email: &str, id: Uuid) -> Result<Option<Uuid>> {
        let state = self.state();
        let by_email = state.profiles.iter().find(|p| p.profile.email == email);
        let found = by_email.or_else(|| state.profiles.iter().find(|p| p.profile.id == id));
        Ok(found.map(|p| p.profile.id))
    }

    async fn insert_profile(&self, profile: &NewProfile) -> Result<Uuid> {
        self.check_rejected("profile", profile.id)?;
        let mut state = self.state();
        if let Some(existing) = state.profiles.iter_mut().find(|p| p.profile.id == profile.id) {
            greatest(&mut existing.profile.updated_at, profile.updated_at);
            return Ok(profile.id);
        }
        state.profiles.push(StoredProfile {
            profile: profile.clone(),
            company_id: None,
        });
        Ok(profile.id)
    }

    async fn fill_profile(&self, target_id: Uuid, profile: &NewProfile) -> Result<Uuid> {
        let mut state = self.state();
        if let Some(existing) = state.profiles.iter_mut().find(|p| p.profile.id == target_id) {
            let current = &mut existing.profile;
            fill(&mut current.phone, &profile.phone);
            fill(&mut current.avatar_url, &profile.avatar_url);
            fill(&mut current.company_name, &profile.company_name);
            fill(&mut current.country, &profile.country);
            fill(&mut current.is_verified, &profile.is_verified);
            fill(&mut current.address, &profile.address);
            fill(&mut current.preferences, &profile.preferences);
            fill(&mut current.created_at, &profile.created_at);
            greatest(&mut current.updated_at, profile.updated_at);
        }
        Ok(target_id)
    }

    async fn link_profile_company(&self, profile_id: Uuid, company_id: Uuid) -> Result<bool> {
        let mut state = self.state();
        match state.profiles.iter_mut().find(|p| p.profile.id == profile_id) {
            Some(stored) if stored.company_id.is_none() => {
                stored.company_id = Some(company_id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn find_company(&self, slug: &str, name: &str, id: Uuid) -> Result<Option<Uuid>> {
        let hidden = self
            .hidden_company_lookups
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if hidden.is_ok() {
            return Ok(None);
        }
        let state = self.state();
        let found = state
            .companies
            .iter()
            .find(|c| c.slug == slug)
            .or_else(|| state.companies.iter().find(|c| c.name == name))
            .or_else(|| state.companies.iter().find(|c| c.id == id));
        Ok(found.map(|c| c.id))
    }

    async fn insert_company(&self, company: &NewCompany) -> Result<Option<Uuid>> {
        self.check_rejected("company", company.id)?;
        let mut state = self.state();
        let conflict = state
            .companies
            .iter()
            .any(|c| c.id == company.id || c.slug == company.slug);
        if conflict {
            return Ok(None);
        }
        state.companies.push(company.clone());
        Ok(Some(company.id))
    }

    async fn fill_company(&self, target_id: Uuid, company: &NewCompany) -> Result<Uuid> {
        let mut state = self.state();
        if let Some(current) = state.companies.iter_mut().find(|c| c.id == target_id) {
            fill(&mut current.description, &company.description);
            fill(&mut current.logo_url, &company.logo_url);
            fill(&mut current.website, &company.website);
            fill(&mut current.email, &company.email);
            fill(&mut current.phone, &company.phone);
            fill(&mut current.address, &company.address);
            fill(&mut current.cr_number, &company.cr_number);
            fill(&mut current.vat_number, &company.vat_number);
            fill(&mut current.owner_id, &company.owner_id);
            fill(&mut current.created_at, &company.created_at);
            greatest(&mut current.updated_at, company.updated_at);
        }
        Ok(target_id)
    }

    async fn upsert_service(&self, service: &NewService) -> Result<WriteOutcome> {
        self.check_rejected("service", service.id)?;
        let mut state = self.state();
        match state.services.iter_mut().find(|s| s.id == service.id) {
            Some(current) => {
                current.title.clone_from(&service.title);
                current.description.clone_from(&service.description);
                current.price = service.price;
                current.status = service.status;
                Ok(WriteOutcome::Updated)
            }
            None => {
                state.services.push(service.clone());
                Ok(WriteOutcome::Inserted)
            }
        }
    }

    async fn upsert_booking(&self, booking: &NewBooking) -> Result<WriteOutcome> {
        self.check_rejected("booking", booking.id)?;
        let mut state = self.state();
        match state.bookings.iter_mut().find(|b| b.id == booking.id) {
            Some(current) => {
                current.client_id = booking.client_id;
                current.provider_id = booking.provider_id;
                current.service_id = booking.service_id;
                current.status = booking.status;
                Ok(WriteOutcome::Updated)
            }
            None => {
                state.bookings.push(booking.clone());
                Ok(WriteOutcome::Inserted)
            }
        }
    }

    async fn assign_role(&self, role: UserRole, profile_ids: &[Uuid]) -> Result<u64> {
        let mut state = self.state();
        let eligible: Vec<Uuid> = state
            .profiles
            .iter()
            .filter(|p| p.profile.role == role && profile_ids.contains(&p.profile.id))
            .map(|p| p.profile.id)
            .collect();

        let mut inserted = 0;
        for id in eligible {
            if !state.role_assignments.contains(&(id, role)) {
                state.role_assignments.push((id, role));
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn refresh_permissions_view(&self) -> Result<()> {
        if self.fail_refresh.load(Ordering::SeqCst) {
            return Err(unreachable_store());
        }
        Ok(())
    }

    async fn count_rows(&self, table: TargetTable) -> Result<i64> {
        let state = self.state();
        let rows = match table {
            TargetTable::Profiles => state.profiles.len(),
            TargetTable::Companies => state.companies.len(),
            TargetTable::Services => state.services.len(),
            TargetTable::Bookings => state.bookings.len(),
            TargetTable::UserRoleAssignments => state.role_assignments.len(),
        };
        Ok(rows as i64)
    }
}
