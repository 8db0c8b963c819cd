use axum::{extract::State, Extension, Json};

use crate::auth::middleware::AuthUser;
use crate::db::journal::evaluate_for_user;
use crate::db::writes::persist_unlocks;
use crate::dto::ShareResponse;
use crate::error::AppResult;
use crate::models::reward::REWARDS;
use crate::services::streak::JournalStats;
use crate::AppState;

/// Shareable text. Only counts and reward names, never diary text.
fn share_summary(name: &str, stats: &JournalStats, rewards: &[&str]) -> String {
    let days = if stats.current_streak == 1 { "day" } else { "days" };
    let mut summary = format!(
        "{} has checked in with their feelings {} times and is on a {}-{} streak!",
        name, stats.total_entries, stats.current_streak, days
    );
    if !rewards.is_empty() {
        summary.push_str(&format!(" Spirit animals met: {}.", rewards.join(", ")));
    }
    summary
}

pub async fn share_progress(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<ShareResponse>> {
    sqlx::query("UPDATE profiles SET has_shared = true, updated_at = NOW() WHERE user_id = $1")
        .bind(auth_user.id)
        .execute(&state.db)
        .await?;

    let (profile, stats, outcome) = evaluate_for_user(&state.db, auth_user.id).await?;
    persist_unlocks(&state, auth_user.id, &outcome);

    let rewards: Vec<&'static str> = REWARDS
        .iter()
        .filter(|r| outcome.unlocked.contains(r.id))
        .map(|r| r.name)
        .collect();

    Ok(Json(ShareResponse {
        summary: share_summary(&profile.name, &stats, &rewards),
        name: profile.name,
        current_streak: stats.current_streak,
        total_entries: stats.total_entries,
        rewards,
        newly_unlocked: outcome.newly_unlocked,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_share_summary() {
        let stats = JournalStats {
            current_streak: 1,
            longest_streak: 4,
            total_entries: 12,
            distinct_emotions: 3,
        };
        let text = share_summary("Mia", &stats, &["Sprout Bunny", "Wise Owl"]);
        assert_eq!(
            text,
            "Mia has checked in with their feelings 12 times and is on a 1-day streak! \
             Spirit animals met: Sprout Bunny, Wise Owl."
        );
        assert!(!share_summary("Mia", &stats, &[]).contains("Spirit"));
    }
}
