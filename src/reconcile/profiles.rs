//! Pass 1: profiles, matched on email (then id), merged fill-null-only.

use uuid::Uuid;
use validator::ValidateEmail;

use super::PassReport;
use crate::error::{Result, RowError};
use crate::identity::IdentityMap;
use crate::models::{CompanyLink, LegacyProfile, NewProfile};
use crate::normalize::{display_name, first_text, normalize_role, normalize_user_status};
use crate::store::{SourceStore, TargetStore, WriteOutcome};

pub struct ProfilePass {
    pub report: PassReport,
    pub identities: IdentityMap,
    /// Source company references waiting for the company pass.
    pub company_links: Vec<CompanyLink>,
}

/// Derive the canonical profile. A missing or malformed email rejects the row.
pub fn canonical_profile(legacy: &LegacyProfile) -> std::result::Result<NewProfile, RowError> {
    let email = first_text(&[&legacy.email]).ok_or(RowError::MissingField {
        id: legacy.id,
        field: "email",
    })?;
    if !email.validate_email() {
        return Err(RowError::InvalidEmail { id: legacy.id, email });
    }

    Ok(NewProfile {
        id: legacy.user_id.unwrap_or(legacy.id),
        full_name: display_name(
            &legacy.full_name,
            &legacy.first_name,
            &legacy.last_name,
            &email,
        ),
        phone: first_text(&[&legacy.phone]),
        avatar_url: first_text(&[&legacy.avatar_url, &legacy.profile_image_url]),
        company_name: first_text(&[&legacy.company_name, &legacy.company]),
        country: first_text(&[&legacy.country]),
        is_verified: legacy.is_verified,
        address: first_text(&[&legacy.address]),
        preferences: legacy.preferences.clone(),
        role: normalize_role(legacy.role.as_deref()),
        status: normalize_user_status(legacy.status.as_deref()),
        created_at: legacy.created_at,
        updated_at: legacy.updated_at,
        email,
    })
}

async fn write_profile<T: TargetStore>(
    target: &T,
    profile: &NewProfile,
) -> Result<(Uuid, WriteOutcome)> {
    match target.find_profile(&profile.email, profile.id).await? {
        Some(existing) => {
            let id = target.fill_profile(existing, profile).await?;
            Ok((id, WriteOutcome::Updated))
        }
        None => {
            let id = target.insert_profile(profile).await?;
            Ok((id, WriteOutcome::Inserted))
        }
    }
}

pub async fn reconcile<S: SourceStore, T: TargetStore>(
    sources: &[S],
    target: &T,
) -> Result<ProfilePass> {
    log::info!("📋 Migrating profiles...");

    let mut report = PassReport::new("profiles");
    let mut identities = IdentityMap::new();
    let mut company_links = Vec::new();

    for source in sources {
        let schema = source.schema();
        for fetched in source.fetch_profiles().await? {
            report.seen += 1;

            let legacy = match fetched {
                Ok(legacy) => legacy,
                Err(err) => {
                    report.skip(schema, None, &err);
                    continue;
                }
            };
            let profile = match canonical_profile(&legacy) {
                Ok(profile) => profile,
                Err(err) => {
                    report.skip(schema, Some(legacy.id), &err);
                    continue;
                }
            };

            let Some((target_id, outcome)) =
                report.absorb(write_profile(target, &profile).await, schema, legacy.id)?
            else {
                continue;
            };
            report.record(outcome);

            identities.record(legacy.id, target_id);
            if let Some(user_id) = legacy.user_id {
                identities.record(user_id, target_id);
            }
            if let Some(source_company_id) = legacy.company_id {
                company_links.push(CompanyLink {
                    profile_id: target_id,
                    source_company_id,
                });
            }
        }
    }

    report.log_finished();
    Ok(ProfilePass {
        report,
        identities,
        company_links,
    })
}

/// Point profiles at their companies once the company identity map exists.
/// Returns how many profiles gained a company.
pub async fn link_companies<T: TargetStore>(
    target: &T,
    links: &[CompanyLink],
    companies: &IdentityMap,
) -> Result<usize> {
    let mut linked = 0;
    for link in links {
        let company_id = companies.resolve(link.source_company_id);
        match target.link_profile_company(link.profile_id, company_id).await {
            Ok(true) => linked += 1,
            Ok(false) => {}
            Err(err) if err.is_row_level() => {
                log::warn!(
                    "Could not link profile {} to company {}: {}",
                    link.profile_id,
                    company_id,
                    err
                );
            }
            Err(err) => return Err(err),
        }
    }

    if !links.is_empty() {
        log::info!("🔄 Linked {} of {} profiles to their companies", linked, links.len());
    }
    Ok(linked)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::database::source::LegacySchema;
    use crate::models::{UserRole, UserStatus};
    use crate::testing::{MemorySource, MemoryTarget};

    fn legacy(email: &str) -> LegacyProfile {
        LegacyProfile {
            id: Uuid::new_v4(),
            email: Some(email.into()),
            ..Default::default()
        }
    }

    #[test]
    fn cross_reference_id_becomes_the_identity() {
        let user_id = Uuid::new_v4();
        let row = LegacyProfile {
            user_id: Some(user_id),
            profile_image_url: Some("https://cdn/x.png".into()),
            company: Some("Acme".into()),
            role: Some("promoter".into()),
            status: Some("deleted".into()),
            ..legacy("ana@example.com")
        };

        let profile = canonical_profile(&row).unwrap();

        assert_eq!(profile.id, user_id);
        assert_eq!(profile.full_name, "ana");
        assert_eq!(profile.avatar_url.as_deref(), Some("https://cdn/x.png"));
        assert_eq!(profile.company_name.as_deref(), Some("Acme"));
        assert_eq!(profile.role, UserRole::Provider);
        assert_eq!(profile.status, UserStatus::Inactive);
    }

    #[test]
    fn rows_without_a_usable_email_are_rejected() {
        let missing = LegacyProfile::default();
        assert!(matches!(
            canonical_profile(&missing),
            Err(RowError::MissingField { field: "email", .. })
        ));
        assert!(matches!(
            canonical_profile(&legacy("not-an-email")),
            Err(RowError::InvalidEmail { .. })
        ));
    }

    #[tokio::test]
    async fn existing_phone_survives_a_null_source_value() {
        let target = MemoryTarget::new();
        let seeded = canonical_profile(&LegacyProfile {
            phone: Some("555-1234".into()),
            ..legacy("carol@example.com")
        })
        .unwrap();
        target.seed_profile(seeded.clone());

        let mut source = MemorySource::new(LegacySchema::ContractManagement);
        source.profiles = vec![LegacyProfile {
            phone: None,
            country: Some("OM".into()),
            ..legacy("carol@example.com")
        }];

        let pass = reconcile(&[source], &target).await.unwrap();

        let stored = target.profile(seeded.id).unwrap();
        assert_eq!(stored.phone.as_deref(), Some("555-1234"));
        assert_eq!(stored.country.as_deref(), Some("OM"));
        assert_eq!(pass.report.updated, 1);
    }

    #[tokio::test]
    async fn email_match_beats_id_match() {
        let target = MemoryTarget::new();
        let by_email = canonical_profile(&legacy("dana@example.com")).unwrap();
        let by_id = canonical_profile(&legacy("someone-else@example.com")).unwrap();
        target.seed_profile(by_email.clone());
        target.seed_profile(by_id.clone());

        let mut source = MemorySource::new(LegacySchema::ServicesHub);
        source.profiles = vec![LegacyProfile {
            id: by_id.id,
            phone: Some("+968 9000 0000".into()),
            ..legacy("dana@example.com")
        }];

        let pass = reconcile(&[source], &target).await.unwrap();

        assert_eq!(pass.identities.resolve(by_id.id), by_email.id);
        assert_eq!(
            target.profile(by_email.id).unwrap().phone.as_deref(),
            Some("+968 9000 0000")
        );
        assert_eq!(target.profile(by_id.id).unwrap().phone, None);
    }

    #[tokio::test]
    async fn first_source_wins_for_shared_emails() {
        let target = MemoryTarget::new();

        let mut first = MemorySource::new(LegacySchema::ContractManagement);
        let first_row = LegacyProfile {
            full_name: Some("Dana From Contracts".into()),
            phone: Some("111".into()),
            updated_at: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            ..legacy("dana@example.com")
        };
        first.profiles = vec![first_row.clone()];

        let mut second = MemorySource::new(LegacySchema::ContractManagement);
        let second_row = LegacyProfile {
            full_name: Some("Dana From Services".into()),
            phone: Some("222".into()),
            avatar_url: Some("https://cdn/dana.png".into()),
            updated_at: Some(Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()),
            ..legacy("dana@example.com")
        };
        second.profiles = vec![second_row.clone()];

        let pass = reconcile(&[first, second], &target).await.unwrap();

        let stored = target.profile(first_row.id).unwrap();
        assert_eq!(stored.full_name, "Dana From Contracts");
        assert_eq!(stored.phone.as_deref(), Some("111"));
        assert_eq!(stored.avatar_url.as_deref(), Some("https://cdn/dana.png"));
        assert_eq!(stored.updated_at, second_row.updated_at);
        assert_eq!(pass.identities.resolve(second_row.id), first_row.id);
        assert_eq!(target.snapshot().profiles.len(), 1);
    }

    #[tokio::test]
    async fn company_links_resolve_through_the_company_map() {
        let target = MemoryTarget::new();
        let old_company = Uuid::new_v4();
        let new_company = Uuid::new_v4();

        let mut source = MemorySource::new(LegacySchema::ServicesHub);
        let row = LegacyProfile {
            company_id: Some(old_company),
            ..legacy("erin@example.com")
        };
        source.profiles = vec![row.clone()];

        let pass = reconcile(&[source], &target).await.unwrap();
        assert_eq!(pass.company_links.len(), 1);

        let mut companies = IdentityMap::new();
        companies.record(old_company, new_company);
        let linked = link_companies(&target, &pass.company_links, &companies)
            .await
            .unwrap();

        assert_eq!(linked, 1);
        assert_eq!(target.profile_company(row.id), Some(new_company));
    }
}
