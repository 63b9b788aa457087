//! Preference projector: keeps the user embedding in sync with the
//! preference row.
//!
//! Invoked after every successful preference write. Idempotent and safe to
//! retry: the profile text is a pure function of the stored preferences.

use anyhow::Result;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domains::delivery::messages::preference_confirmation;
use crate::domains::embeddings::profile::user_profile_text;
use crate::domains::users::models::{PreferenceDocument, User, UserPreferences};
use crate::kernel::deps::ServerDeps;

/// Persist a preference document for a user.
///
/// The write path for preferences: parse (dropping unknown fields), upsert
/// the row, refresh the user embedding, and, while the preferences are
/// still unconfirmed, echo them back with a yes/no prompt.
pub async fn save_preferences(
    deps: &ServerDeps,
    user_id: Uuid,
    document: serde_json::Value,
) -> Result<UserPreferences> {
    let (doc, _dropped) = PreferenceDocument::parse(document)?;
    let prefs = UserPreferences::upsert(user_id, &doc, &deps.db_pool).await?;

    project_preferences(deps, user_id).await?;

    if !prefs.confirmed {
        if let Some(user) = User::find_by_id(user_id, &deps.db_pool).await? {
            let body = preference_confirmation(&prefs);
            if let Err(e) = deps.messenger.send_text(&user.phone_number, &body).await {
                warn!(user_id = %user_id, error = %e, "confirmation send failed");
            }
        }
    }

    Ok(prefs)
}

/// Re-materialize the user's profile text and refresh their embedding.
///
/// Returns true when the embedding was refreshed. On embedding-service
/// failure the prior vector is left intact and a warning is surfaced;
/// stale is better than absent for matching.
pub async fn project_preferences(deps: &ServerDeps, user_id: Uuid) -> Result<bool> {
    let Some(prefs) = UserPreferences::find_by_user(user_id, &deps.db_pool).await? else {
        warn!(user_id = %user_id, "no preferences to project");
        return Ok(false);
    };

    let profile_text = user_profile_text(&prefs);

    let vector = match deps.embeddings.embed(&profile_text).await {
        Ok(vector) => vector,
        Err(e) => {
            warn!(
                user_id = %user_id,
                error = %e,
                "embedding refresh failed; keeping prior embedding"
            );
            return Ok(false);
        }
    };

    UserPreferences::set_embedding(
        user_id,
        &vector,
        &profile_text,
        deps.embeddings.version(),
        deps.clock.now(),
        &deps.db_pool,
    )
    .await?;

    info!(user_id = %user_id, "user embedding refreshed");
    Ok(true)
}
