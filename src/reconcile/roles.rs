//! Role assignment for migrated profiles and the permissions view refresh.

use crate::error::Result;
use crate::identity::IdentityMap;
use crate::models::UserRole;
use crate::store::TargetStore;

/// Grant each migrated profile the role matching its stored role.
/// Returns the number of assignments created by this run.
pub async fn assign_roles<T: TargetStore>(target: &T, profiles: &IdentityMap) -> Result<u64> {
    log::info!("🔐 Assigning roles...");

    if profiles.is_empty() {
        log::info!("No migrated profiles, nothing to assign");
        return Ok(0);
    }
    let profile_ids = profiles.target_ids();

    let mut created = 0;
    for role in UserRole::ALL {
        let inserted = target.assign_role(role, &profile_ids).await?;
        log::debug!("Assigned role {} to {} profiles", role.as_str(), inserted);
        created += inserted;
    }

    log::info!("Created {} role assignments", created);
    Ok(created)
}

/// Best effort. Returns whether the view was refreshed.
pub async fn refresh_permissions<T: TargetStore>(target: &T) -> bool {
    match target.refresh_permissions_view().await {
        Ok(()) => {
            log::info!("🔄 user_permissions view refreshed");
            true
        }
        Err(err) => {
            log::warn!("Could not refresh user_permissions view: {err}");
            false
        }
    }
}
