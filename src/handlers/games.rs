use axum::{
    extract::{Path, State},
    Extension, Json,
};

use crate::auth::middleware::AuthUser;
use crate::db::journal::{evaluate_for_user, fetch_profile};
use crate::db::writes::{award_points, persist_unlocks};
use crate::dto::{GameCompletedResponse, GameView};
use crate::error::{AppError, AppResult};
use crate::models::game::{find_game, GAMES};
use crate::AppState;

pub async fn list_games(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<Vec<GameView>>> {
    let profile = fetch_profile(&state.db, auth_user.id).await?;

    let games = GAMES
        .iter()
        .map(|game| GameView {
            game: *game,
            completed: profile.special_flags.contains(&game.flag()),
        })
        .collect();

    Ok(Json(games))
}

/// Record a finished game. Points are paid every time; the flag is set once
/// and can unlock a special reward.
pub async fn complete_game(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(game_id): Path<String>,
) -> AppResult<Json<GameCompletedResponse>> {
    let game = find_game(&game_id).ok_or(AppError::NotFound("Game not found".into()))?;
    let flag = game.flag();

    // Returns a row only when the flag was not there yet
    let first_completion = sqlx::query_scalar::<_, bool>(
        r#"
        UPDATE profiles SET
            special_flags = array_append(special_flags, $2),
            updated_at = NOW()
        WHERE user_id = $1 AND NOT ($2 = ANY(special_flags))
        RETURNING true
        "#,
    )
    .bind(auth_user.id)
    .bind(&flag)
    .fetch_optional(&state.db)
    .await?
    .unwrap_or(false);

    let (_, _, outcome) = evaluate_for_user(&state.db, auth_user.id).await?;
    persist_unlocks(&state, auth_user.id, &outcome);
    award_points(&state, auth_user.id, game.points);

    tracing::debug!(user_id = %auth_user.id, game_id = %game.id, first_completion, "Game completed");

    Ok(Json(GameCompletedResponse {
        game_id: game.id,
        points_awarded: game.points,
        first_completion,
        newly_unlocked: outcome.newly_unlocked,
    }))
}
