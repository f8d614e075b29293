//! Pass 2: companies, matched on slug or name, merged fill-null-only.
//!
//! Two unrelated companies that slugify to the same value are treated as one.
//! There is no tie-break for that case. Names with no ASCII alphanumerics
//! (Arabic names, punctuation) get `company-<id>` so they still migrate.

use uuid::Uuid;

use super::PassReport;
use crate::error::{MigrateError, Result, RowError};
use crate::identity::IdentityMap;
use crate::models::{LegacyCompany, NewCompany};
use crate::normalize::{first_text, normalize_company_status, slugify};
use crate::store::{SourceStore, TargetStore, WriteOutcome};

pub struct CompanyPass {
    pub report: PassReport,
    pub identities: IdentityMap,
}

pub fn canonical_company(
    legacy: &LegacyCompany,
    profiles: &IdentityMap,
) -> std::result::Result<NewCompany, RowError> {
    let name = first_text(&[&legacy.name]).ok_or(RowError::MissingField {
        id: legacy.id,
        field: "name",
    })?;
    let slug = first_text(&[&legacy.slug])
        .or_else(|| Some(slugify(&name)).filter(|slug| !slug.is_empty()))
        .unwrap_or_else(|| fallback_slug(legacy.id));

    Ok(NewCompany {
        id: legacy.id,
        name,
        slug,
        description: first_text(&[&legacy.description]),
        logo_url: first_text(&[&legacy.logo_url]),
        website: first_text(&[&legacy.website]),
        email: first_text(&[&legacy.email]),
        phone: first_text(&[&legacy.phone]),
        address: first_text(&[&legacy.address]),
        cr_number: first_text(&[&legacy.cr_number]),
        vat_number: first_text(&[&legacy.vat_number]),
        owner_id: profiles.resolve_opt(legacy.owner_id),
        status: normalize_company_status(legacy.status.as_deref(), legacy.is_active),
        created_at: legacy.created_at,
        updated_at: legacy.updated_at,
    })
}

fn fallback_slug(id: Uuid) -> String {
    format!("company-{}", id.simple())
}

async fn fill_existing<T: TargetStore>(
    target: &T,
    company: &NewCompany,
) -> Result<Option<(Uuid, WriteOutcome)>> {
    match target
        .find_company(&company.slug, &company.name, company.id)
        .await?
    {
        Some(existing) => {
            let id = target.fill_company(existing, company).await?;
            Ok(Some((id, WriteOutcome::Updated)))
        }
        None => Ok(None),
    }
}

async fn write_company<T: TargetStore>(
    target: &T,
    company: &NewCompany,
) -> Result<(Uuid, WriteOutcome)> {
    if let Some(written) = fill_existing(target, company).await? {
        return Ok(written);
    }
    if let Some(id) = target.insert_company(company).await? {
        return Ok((id, WriteOutcome::Inserted));
    }

    // The insert lost to a row the first lookup did not see.
    log::debug!("Company {} conflicted on insert, looking it up again", company.id);
    fill_existing(target, company)
        .await?
        .ok_or(MigrateError::Rejected {
            entity: "company",
            id: company.id,
        })
}

pub async fn reconcile<S: SourceStore, T: TargetStore>(
    sources: &[S],
    target: &T,
    profiles: &IdentityMap,
) -> Result<CompanyPass> {
    log::info!("🏢 Migrating companies...");

    let mut report = PassReport::new("companies");
    let mut identities = IdentityMap::new();

    for source in sources {
        let schema = source.schema();
        for fetched in source.fetch_companies().await? {
            report.seen += 1;

            let legacy = match fetched {
                Ok(legacy) => legacy,
                Err(err) => {
                    report.skip(schema, None, &err);
                    continue;
                }
            };
            let company = match canonical_company(&legacy, profiles) {
                Ok(company) => company,
                Err(err) => {
                    report.skip(schema, Some(legacy.id), &err);
                    continue;
                }
            };

            let Some((target_id, outcome)) =
                report.absorb(write_company(target, &company).await, schema, company.id)?
            else {
                continue;
            };
            report.record(outcome);
            identities.record(company.id, target_id);
        }
    }

    report.log_finished();
    Ok(CompanyPass { report, identities })
}
