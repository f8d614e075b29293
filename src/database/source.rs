//! Legacy source databases.
//!
//! Each legacy schema projects its tables onto the shared legacy record shape
//! with one fixed query per entity. Columns a schema does not have are selected
//! as typed NULLs, so every query decodes the same way.

use serde::Serialize;
use tokio_postgres::Row;

use super::{column, DbPool};
use crate::error::{Result, RowError};
use crate::models::{LegacyBooking, LegacyCompany, LegacyProfile, LegacyService};
use crate::store::{Fetched, SourceStore};

// ============================================================================
// SCHEMAS & SHAPES
// ============================================================================

/// The legacy systems a migration can read from.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LegacySchema {
    /// Contract-Management-System: profiles keyed by a separate auth `user_id`
    ContractManagement,
    /// business-services-hub: provider-owned services with an approval workflow
    ServicesHub,
    /// Single pre-unification project, the only one with bookings
    LegacyProject,
}

impl LegacySchema {
    pub fn label(&self) -> &'static str {
        match self {
            LegacySchema::ContractManagement => "contract-management",
            LegacySchema::ServicesHub => "business-services-hub",
            LegacySchema::LegacyProject => "legacy-project",
        }
    }
}

/// Which column, if any, carries the owning company on a source `services` table.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SourceShape {
    HasProviderCompanyId,
    HasCompanyId,
    Neither,
}

impl SourceShape {
    pub fn from_columns<S: AsRef<str>>(columns: &[S]) -> Self {
        let has = |name: &str| columns.iter().any(|c| c.as_ref() == name);
        if has("provider_company_id") {
            SourceShape::HasProviderCompanyId
        } else if has("company_id") {
            SourceShape::HasCompanyId
        } else {
            SourceShape::Neither
        }
    }
}

const SERVICE_COMPANY_COLUMNS_QUERY: &str = r#"
    SELECT column_name::text AS column_name
    FROM information_schema.columns
    WHERE table_schema = 'public'
      AND table_name = 'services'
      AND column_name IN ('company_id', 'provider_company_id')
"#;

// ============================================================================
// QUERY TEMPLATES
// ============================================================================

const CONTRACT_PROFILES: &str = r#"
    SELECT id, user_id, email, full_name,
           NULL::text AS first_name, NULL::text AS last_name,
           phone, avatar_url, NULL::text AS profile_image_url,
           NULL::uuid AS company_id, NULL::text AS company_name, NULL::text AS company,
           NULL::text AS country, NULL::bool AS is_verified,
           address::text AS address, preferences::jsonb AS preferences,
           NULL::text AS role, NULL::text AS status,
           created_at::timestamptz AS created_at, updated_at::timestamptz AS updated_at
    FROM profiles
"#;

const SERVICES_HUB_PROFILES: &str = r#"
    SELECT id, NULL::uuid AS user_id, email, full_name,
           NULL::text AS first_name, NULL::text AS last_name,
           phone, NULL::text AS avatar_url, NULL::text AS profile_image_url,
           company_id, NULL::text AS company_name, NULL::text AS company,
           country, is_verified,
           NULL::text AS address, NULL::jsonb AS preferences,
           role::text AS role, NULL::text AS status,
           created_at::timestamptz AS created_at, updated_at::timestamptz AS updated_at
    FROM profiles
"#;

const LEGACY_PROJECT_PROFILES: &str = r#"
    SELECT id, NULL::uuid AS user_id, email, full_name,
           first_name, last_name,
           phone, avatar_url, profile_image_url,
           NULL::uuid AS company_id, company_name, company,
           country, is_verified,
           NULL::text AS address, NULL::jsonb AS preferences,
           role::text AS role, status::text AS status,
           created_at::timestamptz AS created_at, updated_at::timestamptz AS updated_at
    FROM profiles
"#;

const CONTRACT_COMPANIES: &str = r#"
    SELECT id, name, slug, description, logo_url, website, email, phone,
           address::text AS address,
           NULL::text AS cr_number, NULL::text AS vat_number, NULL::uuid AS owner_id,
           is_active, NULL::text AS status,
           created_at::timestamptz AS created_at, updated_at::timestamptz AS updated_at
    FROM companies
"#;

const SERVICES_HUB_COMPANIES: &str = r#"
    SELECT id, name, NULL::text AS slug, NULL::text AS description, logo_url,
           NULL::text AS website, NULL::text AS email, NULL::text AS phone,
           NULL::text AS address,
           cr_number, vat_number, owner_id,
           NULL::bool AS is_active, 'active'::text AS status,
           created_at::timestamptz AS created_at, NULL::timestamptz AS updated_at
    FROM companies
"#;

const LEGACY_PROJECT_COMPANIES: &str = r#"
    SELECT id, name, slug, description, logo_url, website, email, phone,
           address::text AS address,
           cr_number, vat_number, owner_id,
           is_active, NULL::text AS status,
           created_at::timestamptz AS created_at, updated_at::timestamptz AS updated_at
    FROM companies
"#;

macro_rules! contract_services {
    ($company:literal) => {
        concat!(
            "SELECT id, NULL::uuid AS provider_id, created_by, ",
            $company,
            " AS company_id, \
             NULL::text AS title, name, description, category, \
             NULL::float8 AS price, NULL::float8 AS base_price, price_base::float8 AS price_base, \
             NULL::text AS currency, price_currency, \
             duration_minutes::int4 AS duration_minutes, max_participants::int4 AS max_participants, \
             NULL::text AS location, NULL::text[] AS tags, NULL::text AS requirements, \
             NULL::text AS cover_image_url, NULL::bool AS featured, NULL::bool AS is_featured, \
             NULL::float8 AS rating, NULL::int4 AS review_count, NULL::int4 AS booking_count, \
             status::text AS status, NULL::text AS approval_status, metadata::jsonb AS metadata, \
             created_at::timestamptz AS created_at, updated_at::timestamptz AS updated_at \
             FROM services"
        )
    };
}

macro_rules! services_hub_services {
    ($company:literal) => {
        concat!(
            "SELECT id, provider_id, NULL::uuid AS created_by, ",
            $company,
            " AS company_id, \
             title, NULL::text AS name, description, category, \
             NULL::float8 AS price, base_price::float8 AS base_price, NULL::float8 AS price_base, \
             currency, NULL::text AS price_currency, \
             NULL::int4 AS duration_minutes, NULL::int4 AS max_participants, \
             location, tags::text[] AS tags, requirements::text AS requirements, \
             cover_image_url, featured, NULL::bool AS is_featured, \
             rating::float8 AS rating, review_count::int4 AS review_count, booking_count::int4 AS booking_count, \
             status::text AS status, approval_status::text AS approval_status, NULL::jsonb AS metadata, \
             created_at::timestamptz AS created_at, updated_at::timestamptz AS updated_at \
             FROM services"
        )
    };
}

macro_rules! legacy_project_services {
    ($company:literal) => {
        concat!(
            "SELECT id, provider_id, NULL::uuid AS created_by, ",
            $company,
            " AS company_id, \
             title, name, description, category, \
             price::float8 AS price, base_price::float8 AS base_price, price_base::float8 AS price_base, \
             currency, price_currency, \
             NULL::int4 AS duration_minutes, NULL::int4 AS max_participants, \
             location, tags::text[] AS tags, requirements::text AS requirements, \
             cover_image_url, featured, is_featured, \
             rating::float8 AS rating, review_count::int4 AS review_count, booking_count::int4 AS booking_count, \
             status::text AS status, approval_status::text AS approval_status, NULL::jsonb AS metadata, \
             created_at::timestamptz AS created_at, updated_at::timestamptz AS updated_at \
             FROM services"
        )
    };
}

/// Expands a services template once per shape, so every variant is a compile-time constant.
macro_rules! by_company_column {
    ($template:ident, $shape:expr) => {
        match $shape {
            SourceShape::HasProviderCompanyId => $template!("provider_company_id"),
            SourceShape::HasCompanyId => $template!("company_id"),
            SourceShape::Neither => $template!("NULL::uuid"),
        }
    };
}

const LEGACY_PROJECT_BOOKINGS: &str = r#"
    SELECT id, client_id, user_id, provider_id, provider_company_id,
           service_id, package_id, status::text AS status,
           scheduled_at::timestamptz AS scheduled_at,
           scheduled_start::timestamptz AS scheduled_start,
           start_time::timestamptz AS start_time,
           created_at::timestamptz AS created_at, updated_at::timestamptz AS updated_at
    FROM bookings
"#;

pub fn profiles_query(schema: LegacySchema) -> &'static str {
    match schema {
        LegacySchema::ContractManagement => CONTRACT_PROFILES,
        LegacySchema::ServicesHub => SERVICES_HUB_PROFILES,
        LegacySchema::LegacyProject => LEGACY_PROJECT_PROFILES,
    }
}

pub fn companies_query(schema: LegacySchema) -> &'static str {
    match schema {
        LegacySchema::ContractManagement => CONTRACT_COMPANIES,
        LegacySchema::ServicesHub => SERVICES_HUB_COMPANIES,
        LegacySchema::LegacyProject => LEGACY_PROJECT_COMPANIES,
    }
}

pub fn services_query(schema: LegacySchema, shape: SourceShape) -> &'static str {
    match schema {
        LegacySchema::ContractManagement => by_company_column!(contract_services, shape),
        LegacySchema::ServicesHub => by_company_column!(services_hub_services, shape),
        LegacySchema::LegacyProject => by_company_column!(legacy_project_services, shape),
    }
}

pub fn bookings_query(schema: LegacySchema) -> Option<&'static str> {
    match schema {
        LegacySchema::LegacyProject => Some(LEGACY_PROJECT_BOOKINGS),
        LegacySchema::ContractManagement | LegacySchema::ServicesHub => None,
    }
}

// ============================================================================
// POSTGRES SOURCE
// ============================================================================

pub struct PgSource {
    schema: LegacySchema,
    pool: DbPool,
}

impl PgSource {
    pub fn new(schema: LegacySchema, pool: DbPool) -> Self {
        Self { schema, pool }
    }

    /// Probe the catalog for the company column on `services`.
    pub async fn detect_shape(&self) -> Result<SourceShape> {
        let client = self.pool.get().await?;
        let rows = client.query(SERVICE_COMPANY_COLUMNS_QUERY, &[]).await?;
        let columns: Vec<String> = rows.iter().map(|r| r.get("column_name")).collect();

        let shape = SourceShape::from_columns(&columns);
        log::debug!("{} services shape: {:?}", self.schema.label(), shape);
        Ok(shape)
    }

    async fn fetch<T>(
        &self,
        sql: &str,
        decode: fn(&Row) -> std::result::Result<T, RowError>,
    ) -> Result<Fetched<T>> {
        let client = self.pool.get().await?;
        let rows = client.query(sql, &[]).await?;
        Ok(rows.iter().map(decode).collect())
    }
}

#[async_trait::async_trait]
impl SourceStore for PgSource {
    fn schema(&self) -> LegacySchema {
        self.schema
    }

    async fn fetch_profiles(&self) -> Result<Fetched<LegacyProfile>> {
        self.fetch(profiles_query(self.schema), row_to_legacy_profile)
            .await
    }

    async fn fetch_companies(&self) -> Result<Fetched<LegacyCompany>> {
        self.fetch(companies_query(self.schema), row_to_legacy_company)
            .await
    }

    async fn fetch_services(&self) -> Result<Fetched<LegacyService>> {
        let shape = self.detect_shape().await?;
        self.fetch(services_query(self.schema, shape), row_to_legacy_service)
            .await
    }

    async fn fetch_bookings(&self) -> Result<Fetched<LegacyBooking>> {
        match bookings_query(self.schema) {
            Some(sql) => self.fetch(sql, row_to_legacy_booking).await,
            None => Ok(Vec::new()),
        }
    }
}

// Row mapping functions
fn row_to_legacy_profile(row: &Row) -> std::result::Result<LegacyProfile, RowError> {
    Ok(LegacyProfile {
        id: column(row, "id")?,
        user_id: column(row, "user_id")?,
        email: column(row, "email")?,
        full_name: column(row, "full_name")?,
        first_name: column(row, "first_name")?,
        last_name: column(row, "last_name")?,
        phone: column(row, "phone")?,
        avatar_url: column(row, "avatar_url")?,
        profile_image_url: column(row, "profile_image_url")?,
        company_id: column(row, "company_id")?,
        company_name: column(row, "company_name")?,
        company: column(row, "company")?,
        country: column(row, "country")?,
        is_verified: column(row, "is_verified")?,
        address: column(row, "address")?,
        preferences: column(row, "preferences")?,
        role: column(row, "role")?,
        status: column(row, "status")?,
        created_at: column(row, "created_at")?,
        updated_at: column(row, "updated_at")?,
    })
}

fn row_to_legacy_company(row: &Row) -> std::result::Result<LegacyCompany, RowError> {
    Ok(LegacyCompany {
        id: column(row, "id")?,
        name: column(row, "name")?,
        slug: column(row, "slug")?,
        description: column(row, "description")?,
        logo_url: column(row, "logo_url")?,
        website: column(row, "website")?,
        email: column(row, "email")?,
        phone: column(row, "phone")?,
        address: column(row, "address")?,
        cr_number: column(row, "cr_number")?,
        vat_number: column(row, "vat_number")?,
        owner_id: column(row, "owner_id")?,
        is_active: column(row, "is_active")?,
        status: column(row, "status")?,
        created_at: column(row, "created_at")?,
        updated_at: column(row, "updated_at")?,
    })
}

fn row_to_legacy_service(row: &Row) -> std::result::Result<LegacyService, RowError> {
    Ok(LegacyService {
        id: column(row, "id")?,
        provider_id: column(row, "provider_id")?,
        created_by: column(row, "created_by")?,
        company_id: column(row, "company_id")?,
        title: column(row, "title")?,
        name: column(row, "name")?,
        description: column(row, "description")?,
        category: column(row, "category")?,
        price: column(row, "price")?,
        base_price: column(row, "base_price")?,
        price_base: column(row, "price_base")?,
        currency: column(row, "currency")?,
        price_currency: column(row, "price_currency")?,
        duration_minutes: column(row, "duration_minutes")?,
        max_participants: column(row, "max_participants")?,
        location: column(row, "location")?,
        tags: column(row, "tags")?,
        requirements: column(row, "requirements")?,
        cover_image_url: column(row, "cover_image_url")?,
        featured: column(row, "featured")?,
        is_featured: column(row, "is_featured")?,
        rating: column(row, "rating")?,
        review_count: column(row, "review_count")?,
        booking_count: column(row, "booking_count")?,
        status: column(row, "status")?,
        approval_status: column(row, "approval_status")?,
        metadata: column(row, "metadata")?,
        created_at: column(row, "created_at")?,
        updated_at: column(row, "updated_at")?,
    })
}

fn row_to_legacy_booking(row: &Row) -> std::result::Result<LegacyBooking, RowError> {
    Ok(LegacyBooking {
        id: column(row, "id")?,
        client_id: column(row, "client_id")?,
        user_id: column(row, "user_id")?,
        provider_id: column(row, "provider_id")?,
        provider_company_id: column(row, "provider_company_id")?,
        service_id: column(row, "service_id")?,
        package_id: column(row, "package_id")?,
        status: column(row, "status")?,
        scheduled_at: column(row, "scheduled_at")?,
        scheduled_start: column(row, "scheduled_start")?,
        start_time: column(row, "start_time")?,
        created_at: column(row, "created_at")?,
        updated_at: column(row, "updated_at")?,
    })
}
