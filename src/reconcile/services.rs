//! Pass 3: services. Provider and company references are remapped through the
//! profile and company identity maps; unmapped ids pass through unchanged.
//! Writes are last-writer-wins on id conflict.

use super::PassReport;
use crate::error::{Result, RowError};
use crate::identity::IdentityMap;
use crate::models::{LegacyService, NewService};
use crate::normalize::{derive_service_status, first_present, first_text, DEFAULT_CURRENCY};
use crate::store::{SourceStore, TargetStore};

pub struct ServicePass {
    pub report: PassReport,
    pub identities: IdentityMap,
}

pub fn canonical_service(
    legacy: &LegacyService,
    profiles: &IdentityMap,
    companies: &IdentityMap,
) -> std::result::Result<NewService, RowError> {
    let title = first_text(&[&legacy.title, &legacy.name]).ok_or(RowError::MissingField {
        id: legacy.id,
        field: "title",
    })?;

    Ok(NewService {
        id: legacy.id,
        provider_id: profiles.resolve_opt(legacy.provider_id.or(legacy.created_by)),
        provider_company_id: companies.resolve_opt(legacy.company_id),
        title,
        description: first_text(&[&legacy.description]),
        category: first_text(&[&legacy.category]),
        price: first_present(&[&legacy.price, &legacy.base_price, &legacy.price_base])
            .unwrap_or(0.0),
        currency: first_text(&[&legacy.currency, &legacy.price_currency])
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
        duration_minutes: legacy.duration_minutes,
        max_participants: legacy.max_participants,
        location: first_text(&[&legacy.location]),
        tags: legacy.tags.clone(),
        requirements: first_text(&[&legacy.requirements]),
        cover_image_url: first_text(&[&legacy.cover_image_url]),
        featured: first_present(&[&legacy.featured, &legacy.is_featured]).unwrap_or(false),
        rating: legacy.rating.unwrap_or(0.0),
        review_count: legacy.review_count.unwrap_or(0),
        booking_count: legacy.booking_count.unwrap_or(0),
        status: derive_service_status(
            legacy.status.as_deref(),
            legacy.approval_status.as_deref(),
        ),
        metadata: legacy.metadata.clone(),
        created_at: legacy.created_at,
        updated_at: legacy.updated_at,
    })
}

pub async fn reconcile<S: SourceStore, T: TargetStore>(
    sources: &[S],
    target: &T,
    profiles: &IdentityMap,
    companies: &IdentityMap,
) -> Result<ServicePass> {
    log::info!("🔧 Migrating services...");

    let mut report = PassReport::new("services");
    let mut identities = IdentityMap::new();

    for source in sources {
        let schema = source.schema();
        for fetched in source.fetch_services().await? {
            report.seen += 1;

            let legacy = match fetched {
                Ok(legacy) => legacy,
                Err(err) => {
                    report.skip(schema, None, &err);
                    continue;
                }
            };
            let service = match canonical_service(&legacy, profiles, companies) {
                Ok(service) => service,
                Err(err) => {
                    report.skip(schema, Some(legacy.id), &err);
                    continue;
                }
            };

            let Some(outcome) =
                report.absorb(target.upsert_service(&service).await, schema, service.id)?
            else {
                continue;
            };
            report.record(outcome);
            identities.record(service.id, service.id);
        }
    }

    report.log_finished();
    Ok(ServicePass { report, identities })
}
