use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

// ============================================================================
// ENUMS
// ============================================================================

/// Account role stored as plain text on `profiles.role`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Provider,
    Client,
}

impl UserRole {
    pub const ALL: [UserRole; 3] = [UserRole::Admin, UserRole::Provider, UserRole::Client];

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Provider => "provider",
            UserRole::Client => "client",
        }
    }
}

/// Profile lifecycle status (Postgres enum)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, postgres_types::ToSql, postgres_types::FromSql)]
#[postgres(name = "user_status_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    Active,
    Suspended,
    Inactive,
}

/// Company status stored as plain text on `companies.status`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CompanyStatus {
    Active,
    Inactive,
}

impl CompanyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompanyStatus::Active => "active",
            CompanyStatus::Inactive => "inactive",
        }
    }
}

/// Service listing status (Postgres enum)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, postgres_types::ToSql, postgres_types::FromSql)]
#[postgres(name = "service_status_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    Active,
    Pending,
    Inactive,
    Draft,
}

/// Booking lifecycle status (Postgres enum)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, postgres_types::ToSql, postgres_types::FromSql)]
#[postgres(name = "booking_status_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
    Draft,
}

/// Target tables reported in the final tally
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TargetTable {
    Profiles,
    Companies,
    Services,
    Bookings,
    UserRoleAssignments,
}

impl TargetTable {
    pub const ALL: [TargetTable; 5] = [
        TargetTable::Profiles,
        TargetTable::Companies,
        TargetTable::Services,
        TargetTable::Bookings,
        TargetTable::UserRoleAssignments,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TargetTable::Profiles => "profiles",
            TargetTable::Companies => "companies",
            TargetTable::Services => "services",
            TargetTable::Bookings => "bookings",
            TargetTable::UserRoleAssignments => "user_role_assignments",
        }
    }
}

// ============================================================================
// LEGACY RECORDS (as read from a source schema)
// ============================================================================

/// Profile row projected from any legacy schema. Columns a schema lacks are NULL.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LegacyProfile {
    pub id: Uuid,
    /// Cross-reference to a separate user-account table, when the schema has one
    pub user_id: Option<Uuid>,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub profile_image_url: Option<String>,
    pub company_id: Option<Uuid>,
    pub company_name: Option<String>,
    pub company: Option<String>,
    pub country: Option<String>,
    pub is_verified: Option<bool>,
    pub address: Option<String>,
    pub preferences: Option<Value>,
    pub role: Option<String>,
    pub status: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LegacyCompany {
    pub id: Uuid,
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    pub website: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub cr_number: Option<String>,
    pub vat_number: Option<String>,
    pub owner_id: Option<Uuid>,
    pub is_active: Option<bool>,
    /// Already-enumerated status, for schemas that store one
    pub status: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LegacyService {
    pub id: Uuid,
    pub provider_id: Option<Uuid>,
    pub created_by: Option<Uuid>,
    pub company_id: Option<Uuid>,
    pub title: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: Option<f64>,
    pub base_price: Option<f64>,
    pub price_base: Option<f64>,
    pub currency: Option<String>,
    pub price_currency: Option<String>,
    pub duration_minutes: Option<i32>,
    pub max_participants: Option<i32>,
    pub location: Option<String>,
    pub tags: Option<Vec<String>>,
    pub requirements: Option<String>,
    pub cover_image_url: Option<String>,
    pub featured: Option<bool>,
    pub is_featured: Option<bool>,
    pub rating: Option<f64>,
    pub review_count: Option<i32>,
    pub booking_count: Option<i32>,
    pub status: Option<String>,
    pub approval_status: Option<String>,
    pub metadata: Option<Value>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LegacyBooking {
    pub id: Uuid,
    pub client_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub provider_id: Option<Uuid>,
    pub provider_company_id: Option<Uuid>,
    pub service_id: Option<Uuid>,
    pub package_id: Option<Uuid>,
    pub status: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub scheduled_start: Option<DateTime<Utc>>,
    pub start_time: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

// ============================================================================
// CANONICAL RECORDS (as written to the unified schema)
// ============================================================================

/// Profile ready to be written to `profiles`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProfile {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub company_name: Option<String>,
    pub country: Option<String>,
    pub is_verified: Option<bool>,
    pub address: Option<String>,
    pub preferences: Option<Value>,
    pub role: UserRole,
    pub status: UserStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Company ready to be written to `companies`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCompany {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    pub website: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub cr_number: Option<String>,
    pub vat_number: Option<String>,
    pub owner_id: Option<Uuid>,
    pub status: CompanyStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Service ready to be upserted into `services`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewService {
    pub id: Uuid,
    pub provider_id: Option<Uuid>,
    pub provider_company_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: f64,
    pub currency: String,
    pub duration_minutes: Option<i32>,
    pub max_participants: Option<i32>,
    pub location: Option<String>,
    pub tags: Option<Vec<String>>,
    pub requirements: Option<String>,
    pub cover_image_url: Option<String>,
    pub featured: bool,
    pub rating: f64,
    pub review_count: i32,
    pub booking_count: i32,
    pub status: ServiceStatus,
    pub metadata: Option<Value>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Booking ready to be upserted into `bookings`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBooking {
    pub id: Uuid,
    pub client_id: Option<Uuid>,
    pub provider_id: Option<Uuid>,
    pub provider_company_id: Option<Uuid>,
    pub service_id: Option<Uuid>,
    pub package_id: Option<Uuid>,
    pub status: BookingStatus,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Profile whose source row referenced a company that only exists after the company pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyLink {
    pub profile_id: Uuid,
    pub source_company_id: Uuid,
}
