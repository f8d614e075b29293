//! The unified target database.
//!
//! Every statement has a fixed shape with a bound parameter per declared field.
//! Fill-null semantics live in the SQL (`COALESCE(current, $n)`), never in which
//! columns a statement happens to mention.

use uuid::Uuid;

use super::DbPool;
use crate::error::Result;
use crate::models::{NewBooking, NewCompany, NewProfile, NewService, TargetTable, UserRole};
use crate::store::{TargetStore, WriteOutcome};

const FIND_PROFILE: &str = r#"
    SELECT id FROM profiles
    WHERE email = $1 OR id = $2
    ORDER BY COALESCE(email = $1, false) DESC
    LIMIT 1
"#;

const INSERT_PROFILE: &str = r#"
    INSERT INTO profiles (
        id, email, full_name, name, phone, avatar_url, company_name, country,
        is_verified, address, preferences, role, status, created_at, updated_at
    )
    VALUES ($1, $2, $3, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12,
            COALESCE($13, NOW()), COALESCE($14, $13, NOW()))
    ON CONFLICT (id) DO UPDATE SET
        full_name = COALESCE(profiles.full_name, EXCLUDED.full_name),
        updated_at = GREATEST(profiles.updated_at, EXCLUDED.updated_at)
    RETURNING id
"#;

const FILL_PROFILE: &str = r#"
    UPDATE profiles SET
        full_name = COALESCE(profiles.full_name, $2),
        name = COALESCE(profiles.name, $2),
        phone = COALESCE(profiles.phone, $3),
        avatar_url = COALESCE(profiles.avatar_url, $4),
        company_name = COALESCE(profiles.company_name, $5),
        country = COALESCE(profiles.country, $6),
        is_verified = COALESCE(profiles.is_verified, $7),
        address = COALESCE(profiles.address, $8),
        preferences = COALESCE(profiles.preferences, $9),
        role = COALESCE(profiles.role, $10),
        status = COALESCE(profiles.status, $11),
        created_at = COALESCE(profiles.created_at, $12),
        updated_at = GREATEST(profiles.updated_at, $13)
    WHERE id = $1
    RETURNING id
"#;

const LINK_PROFILE_COMPANY: &str = r#"
    UPDATE profiles SET company_id = $2
    WHERE id = $1 AND company_id IS NULL
"#;

const FIND_COMPANY: &str = r#"
    SELECT id FROM companies
    WHERE slug = $1 OR name = $2 OR id = $3
    ORDER BY COALESCE(slug = $1, false) DESC, COALESCE(name = $2, false) DESC
    LIMIT 1
"#;

const INSERT_COMPANY: &str = r#"
    INSERT INTO companies (
        id, name, slug, description, logo_url, website, email, phone, address,
        cr_number, vat_number, owner_id, status, created_at, updated_at
    )
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
            COALESCE($14, NOW()), COALESCE($15, $14, NOW()))
    ON CONFLICT DO NOTHING
    RETURNING id
"#;

const FILL_COMPANY: &str = r#"
    UPDATE companies SET
        description = COALESCE(companies.description, $2),
        logo_url = COALESCE(companies.logo_url, $3),
        website = COALESCE(companies.website, $4),
        email = COALESCE(companies.email, $5),
        phone = COALESCE(companies.phone, $6),
        address = COALESCE(companies.address, $7),
        cr_number = COALESCE(companies.cr_number, $8),
        vat_number = COALESCE(companies.vat_number, $9),
        owner_id = COALESCE(companies.owner_id, $10),
        status = COALESCE(companies.status, $11),
        created_at = COALESCE(companies.created_at, $12),
        updated_at = GREATEST(companies.updated_at, $13)
    WHERE id = $1
    RETURNING id
"#;

const UPSERT_SERVICE: &str = r#"
    INSERT INTO services (
        id, provider_id, provider_company_id, title, description, category,
        price, currency, duration_minutes, max_participants, location, tags,
        requirements, cover_image_url, featured, rating, review_count,
        booking_count, status, metadata, created_at, updated_at
    )
    VALUES ($1, $2, $3, $4, $5, $6, $7::float8, $8, $9::int4, $10::int4, $11, $12,
            $13, $14, $15, $16::float8, $17::int4, $18::int4, $19,
            COALESCE($20, '{}'::jsonb), COALESCE($21, NOW()), COALESCE($22, $21, NOW()))
    ON CONFLICT (id) DO UPDATE SET
        title = EXCLUDED.title,
        description = EXCLUDED.description,
        price = EXCLUDED.price,
        status = EXCLUDED.status
    RETURNING (xmax = 0) AS inserted
"#;

const UPSERT_BOOKING: &str = r#"
    INSERT INTO bookings (
        id, client_id, provider_id, provider_company_id, service_id, package_id,
        status, scheduled_at, created_at, updated_at
    )
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, COALESCE($9, NOW()), COALESCE($10, $9, NOW()))
    ON CONFLICT (id) DO UPDATE SET
        client_id = EXCLUDED.client_id,
        provider_id = EXCLUDED.provider_id,
        service_id = EXCLUDED.service_id,
        status = EXCLUDED.status
    RETURNING (xmax = 0) AS inserted
"#;

const ASSIGN_ROLE: &str = r#"
    INSERT INTO user_role_assignments (user_id, role_id)
    SELECT p.id, r.id
    FROM profiles p
    CROSS JOIN roles r
    WHERE p.role = $1 AND r.name = $1 AND p.id = ANY($2)
    ON CONFLICT DO NOTHING
"#;

const REFRESH_PERMISSIONS_VIEW: &str = "REFRESH MATERIALIZED VIEW user_permissions";

fn count_query(table: TargetTable) -> &'static str {
    match table {
        TargetTable::Profiles => "SELECT COUNT(*) AS count FROM profiles",
        TargetTable::Companies => "SELECT COUNT(*) AS count FROM companies",
        TargetTable::Services => "SELECT COUNT(*) AS count FROM services",
        TargetTable::Bookings => "SELECT COUNT(*) AS count FROM bookings",
        TargetTable::UserRoleAssignments => "SELECT COUNT(*) AS count FROM user_role_assignments",
    }
}

/// `xmax` is zero only on a row version created by a plain insert.
fn write_outcome(row: &tokio_postgres::Row) -> WriteOutcome {
    if row.get::<_, bool>("inserted") {
        WriteOutcome::Inserted
    } else {
        WriteOutcome::Updated
    }
}

pub struct PgTarget {
    pool: DbPool,
}

impl PgTarget {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl TargetStore for PgTarget {
    async fn find_profile(&self, email: &str, id: Uuid) -> Result<Option<Uuid>> {
        let client = self.pool.get().await?;
        let row = client.query_opt(FIND_PROFILE, &[&email, &id]).await?;
        Ok(row.map(|r| r.get("id")))
    }

    async fn insert_profile(&self, profile: &NewProfile) -> Result<Uuid> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                INSERT_PROFILE,
                &[
                    &profile.id,
                    &profile.email,
                    &profile.full_name,
                    &profile.phone,
                    &profile.avatar_url,
                    &profile.company_name,
                    &profile.country,
                    &profile.is_verified,
                    &profile.address,
                    &profile.preferences,
                    &profile.role.as_str(),
                    &profile.status,
                    &profile.created_at,
                    &profile.updated_at,
                ],
            )
            .await?;

        Ok(row.map(|r| r.get("id")).unwrap_or(profile.id))
    }

    async fn fill_profile(&self, target_id: Uuid, profile: &NewProfile) -> Result<Uuid> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                FILL_PROFILE,
                &[
                    &target_id,
                    &profile.full_name,
                    &profile.phone,
                    &profile.avatar_url,
                    &profile.company_name,
                    &profile.country,
                    &profile.is_verified,
                    &profile.address,
                    &profile.preferences,
                    &profile.role.as_str(),
                    &profile.status,
                    &profile.created_at,
                    &profile.updated_at,
                ],
            )
            .await?;

        Ok(row.map(|r| r.get("id")).unwrap_or(target_id))
    }

    async fn link_profile_company(&self, profile_id: Uuid, company_id: Uuid) -> Result<bool> {
        let client = self.pool.get().await?;
        let changed = client
            .execute(LINK_PROFILE_COMPANY, &[&profile_id, &company_id])
            .await?;
        Ok(changed > 0)
    }

    async fn find_company(&self, slug: &str, name: &str, id: Uuid) -> Result<Option<Uuid>> {
        let client = self.pool.get().await?;
        let row = client.query_opt(FIND_COMPANY, &[&slug, &name, &id]).await?;
        Ok(row.map(|r| r.get("id")))
    }

    async fn insert_company(&self, company: &NewCompany) -> Result<Option<Uuid>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                INSERT_COMPANY,
                &[
                    &company.id,
                    &company.name,
                    &company.slug,
                    &company.description,
                    &company.logo_url,
                    &company.website,
                    &company.email,
                    &company.phone,
                    &company.address,
                    &company.cr_number,
                    &company.vat_number,
                    &company.owner_id,
                    &company.status.as_str(),
                    &company.created_at,
                    &company.updated_at,
                ],
            )
            .await?;

        Ok(row.map(|r| r.get("id")))
    }

    async fn fill_company(&self, target_id: Uuid, company: &NewCompany) -> Result<Uuid> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                FILL_COMPANY,
                &[
                    &target_id,
                    &company.description,
                    &company.logo_url,
                    &company.website,
                    &company.email,
                    &company.phone,
                    &company.address,
                    &company.cr_number,
                    &company.vat_number,
                    &company.owner_id,
                    &company.status.as_str(),
                    &company.created_at,
                    &company.updated_at,
                ],
            )
            .await?;

        Ok(row.map(|r| r.get("id")).unwrap_or(target_id))
    }

    async fn upsert_service(&self, service: &NewService) -> Result<WriteOutcome> {
        let client = self.pool.get().await?;
        let row = client
            .query_one(
                UPSERT_SERVICE,
                &[
                    &service.id,
                    &service.provider_id,
                    &service.provider_company_id,
                    &service.title,
                    &service.description,
                    &service.category,
                    &service.price,
                    &service.currency,
                    &service.duration_minutes,
                    &service.max_participants,
                    &service.location,
                    &service.tags,
                    &service.requirements,
                    &service.cover_image_url,
                    &service.featured,
                    &service.rating,
                    &service.review_count,
                    &service.booking_count,
                    &service.status,
                    &service.metadata,
                    &service.created_at,
                    &service.updated_at,
                ],
            )
            .await?;

        Ok(write_outcome(&row))
    }

    async fn upsert_booking(&self, booking: &NewBooking) -> Result<WriteOutcome> {
        let client = self.pool.get().await?;
        let row = client
            .query_one(
                UPSERT_BOOKING,
                &[
                    &booking.id,
                    &booking.client_id,
                    &booking.provider_id,
                    &booking.provider_company_id,
                    &booking.service_id,
                    &booking.package_id,
                    &booking.status,
                    &booking.scheduled_at,
                    &booking.created_at,
                    &booking.updated_at,
                ],
            )
            .await?;

        Ok(write_outcome(&row))
    }

    async fn assign_role(&self, role: UserRole, profile_ids: &[Uuid]) -> Result<u64> {
        let client = self.pool.get().await?;
        let ids = profile_ids.to_vec();
        let inserted = client.execute(ASSIGN_ROLE, &[&role.as_str(), &ids]).await?;
        Ok(inserted)
    }

    async fn refresh_permissions_view(&self) -> Result<()> {
        let client = self.pool.get().await?;
        client.execute(REFRESH_PERMISSIONS_VIEW, &[]).await?;
        Ok(())
    }

    async fn count_rows(&self, table: TargetTable) -> Result<i64> {
        let client = self.pool.get().await?;
        let row = client.query_one(count_query(table), &[]).await?;
        Ok(row.get("count"))
    }
}
