//! Inbound message handling.
//!
//! The conversational front-end that parses intent into structured
//! preferences lives outside this system; what belongs here is the part the
//! pipeline depends on: user upsert, window open/refresh, and the welcome
//! prompt for users with no preferences yet.

use anyhow::Result;
use tracing::{info, warn};

use crate::domains::delivery::messages::welcome;
use crate::domains::users::models::{User, UserPreferences};
use crate::domains::windows::manager::WindowManager;
use crate::kernel::deps::ServerDeps;

/// Process one inbound text message from a handle.
pub async fn handle_inbound_message(deps: &ServerDeps, from: &str, body: &str) -> Result<()> {
    let user = User::get_or_create(from, deps.clock.now(), &deps.db_pool).await?;

    let manager = WindowManager::new(
        deps.db_pool.clone(),
        deps.clock.clone(),
        deps.settings.window_hours,
    );
    let window = manager.register_inbound(user.id).await?;

    info!(
        user_id = %user.id,
        window_id = window.id,
        chars = body.len(),
        "inbound message"
    );

    // No preferences yet: greet and invite them to set some up
    if UserPreferences::find_by_user(user.id, &deps.db_pool)
        .await?
        .is_none()
    {
        if let Err(e) = deps.messenger.send_text(from, &welcome()).await {
            // The user sees silence rather than an internal error
            warn!(user_id = %user.id, error = %e, "welcome send failed");
        }
    }

    Ok(())
}
