//! Field reconciliation rules shared by every pass: alias resolution and the
//! legacy-vocabulary translation tables.

use crate::models::{BookingStatus, CompanyStatus, ServiceStatus, UserRole, UserStatus};

pub const DEFAULT_CURRENCY: &str = "USD";

/// First present value among legacy column aliases, in priority order.
pub fn first_present<T: Clone>(candidates: &[&Option<T>]) -> Option<T> {
    candidates.iter().find_map(|c| (*c).clone())
}

/// Like [`first_present`] but treats blank strings as absent.
pub fn first_text(candidates: &[&Option<String>]) -> Option<String> {
    candidates
        .iter()
        .filter_map(|c| c.as_deref())
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

pub fn normalize_role(raw: Option<&str>) -> UserRole {
    match raw.map(|r| r.trim().to_ascii_lowercase()).as_deref() {
        Some("admin") => UserRole::Admin,
        Some("provider") | Some("promoter") => UserRole::Provider,
        Some("client") | Some("user") | None => UserRole::Client,
        Some(other) => {
            log::debug!("Unknown legacy role '{}', defaulting to client", other);
            UserRole::Client
        }
    }
}

pub fn normalize_user_status(raw: Option<&str>) -> UserStatus {
    match raw.map(str::trim) {
        Some("suspended") => UserStatus::Suspended,
        Some("deleted") => UserStatus::Inactive,
        // pending and approved accounts are both usable
        _ => UserStatus::Active,
    }
}

pub fn company_status_from_flag(is_active: Option<bool>) -> CompanyStatus {
    match is_active {
        Some(true) => CompanyStatus::Active,
        _ => CompanyStatus::Inactive,
    }
}

/// An explicit status column wins over the boolean flag when it holds a known value.
pub fn normalize_company_status(status: Option<&str>, is_active: Option<bool>) -> CompanyStatus {
    match status.map(str::trim) {
        Some("active") => CompanyStatus::Active,
        Some("inactive") => CompanyStatus::Inactive,
        _ => company_status_from_flag(is_active),
    }
}

/// Lowercase, collapse every run of characters outside `[a-z0-9]` into one `-`,
/// and trim separators from both ends.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_separator = false;

    for c in name.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(c);
        } else {
            pending_separator = true;
        }
    }

    slug
}

fn is_review_state(value: &str) -> bool {
    matches!(value, "pending" | "under_review" | "in_review")
}

/// Combine a lifecycle status with an optional, independent approval status.
pub fn derive_service_status(status: Option<&str>, approval: Option<&str>) -> ServiceStatus {
    let status = status.map(str::trim).unwrap_or("");
    let approval = approval.map(str::trim).unwrap_or("approved");

    if matches!(status, "active" | "approved") && approval == "approved" {
        return ServiceStatus::Active;
    }
    if is_review_state(status) || is_review_state(approval) {
        return ServiceStatus::Pending;
    }
    if approval == "rejected" {
        return ServiceStatus::Inactive;
    }

    match status {
        "inactive" | "archived" | "rejected" => ServiceStatus::Inactive,
        "draft" => ServiceStatus::Draft,
        _ => ServiceStatus::Active,
    }
}

pub fn normalize_booking_status(raw: Option<&str>) -> BookingStatus {
    match raw.map(str::trim) {
        Some("approved") | Some("confirmed") => BookingStatus::Confirmed,
        Some("declined") | Some("cancelled") => BookingStatus::Cancelled,
        Some("in_progress") => BookingStatus::InProgress,
        Some("completed") => BookingStatus::Completed,
        Some("draft") => BookingStatus::Draft,
        _ => BookingStatus::Pending,
    }
}

/// Full name, else "first last", else the local part of the email.
pub fn display_name(
    full_name: &Option<String>,
    first_name: &Option<String>,
    last_name: &Option<String>,
    email: &str,
) -> String {
    if let Some(name) = first_text(&[full_name]) {
        return name;
    }

    let joined = [first_name, last_name]
        .iter()
        .filter_map(|part| part.as_deref().map(str::trim))
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if !joined.is_empty() {
        return joined;
    }

    email.split('@').next().unwrap_or(email).to_string()
}
