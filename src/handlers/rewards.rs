use axum::{extract::State, Extension, Json};

use crate::auth::middleware::AuthUser;
use crate::db::journal::evaluate_for_user;
use crate::db::writes::persist_unlocks;
use crate::dto::{EvaluateRewardsResponse, RewardView, RewardsResponse};
use crate::error::AppResult;
use crate::models::reward::REWARDS;
use crate::AppState;

/// Catalog with unlock state. Also unlocks anything earned but not yet stored.
pub async fn list_rewards(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<RewardsResponse>> {
    let (_, stats, outcome) = evaluate_for_user(&state.db, auth_user.id).await?;
    persist_unlocks(&state, auth_user.id, &outcome);

    let rewards: Vec<RewardView> = REWARDS
        .iter()
        .map(|r| RewardView {
            reward: *r,
            unlocked: outcome.unlocked.contains(r.id),
        })
        .collect();
    let unlocked_count = rewards.iter().filter(|r| r.unlocked).count();

    Ok(Json(RewardsResponse {
        rewards,
        unlocked_count,
        stats,
    }))
}

pub async fn evaluate_rewards(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<EvaluateRewardsResponse>> {
    let (_, _, outcome) = evaluate_for_user(&state.db, auth_user.id).await?;
    persist_unlocks(&state, auth_user.id, &outcome);

    Ok(Json(EvaluateRewardsResponse {
        unlocked: outcome.unlocked.iter().cloned().collect(),
        newly_unlocked: outcome.newly_unlocked,
    }))
}
