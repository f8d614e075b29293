//! Pass 4: bookings. Client, provider and company are remapped; service and
//! package ids are copied as-is, since services keep their source ids.

use super::PassReport;
use crate::error::Result;
use crate::identity::IdentityMap;
use crate::models::{LegacyBooking, NewBooking};
use crate::normalize::{first_present, normalize_booking_status};
use crate::store::{SourceStore, TargetStore};

pub fn canonical_booking(
    legacy: &LegacyBooking,
    profiles: &IdentityMap,
    companies: &IdentityMap,
) -> NewBooking {
    NewBooking {
        id: legacy.id,
        client_id: profiles.resolve_opt(legacy.client_id.or(legacy.user_id)),
        provider_id: profiles.resolve_opt(legacy.provider_id),
        provider_company_id: companies.resolve_opt(legacy.provider_company_id),
        service_id: legacy.service_id,
        package_id: legacy.package_id,
        status: normalize_booking_status(legacy.status.as_deref()),
        scheduled_at: first_present(&[
            &legacy.scheduled_at,
            &legacy.scheduled_start,
            &legacy.start_time,
        ]),
        created_at: legacy.created_at,
        updated_at: legacy.updated_at,
    }
}

pub async fn reconcile<S: SourceStore, T: TargetStore>(
    sources: &[S],
    target: &T,
    profiles: &IdentityMap,
    companies: &IdentityMap,
) -> Result<PassReport> {
    log::info!("📅 Migrating bookings...");

    let mut report = PassReport::new("bookings");

    for source in sources {
        let schema = source.schema();
        for fetched in source.fetch_bookings().await? {
            report.seen += 1;

            let booking = match fetched {
                Ok(legacy) => canonical_booking(&legacy, profiles, companies),
                Err(err) => {
                    report.skip(schema, None, &err);
                    continue;
                }
            };

            if let Some(outcome) =
                report.absorb(target.upsert_booking(&booking).await, schema, booking.id)?
            {
                report.record(outcome);
            }
        }
    }

    report.log_finished();
    Ok(report)
}
