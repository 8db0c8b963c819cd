use axum::{
    extract::{Path, State},
    Extension, Json,
};
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::db::journal::fetch_profile;
use crate::dto::{ChatRequest, ChatResponse, ReplySource};
use crate::error::{AppError, AppResult};
use crate::models::companion::{find_companion, Companion, COMPANIONS};
use crate::services::flows;
use crate::services::safety::{screen_message, SAFETY_SCRIPT};
use crate::AppState;

pub async fn list_companions() -> Json<&'static [Companion]> {
    Json(COMPANIONS)
}

/// One chat turn with a companion. Messages that look like a disclosure get
/// the safety script and never reach the model.
pub async fn chat(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(companion_id): Path<String>,
    Json(body): Json<ChatRequest>,
) -> AppResult<Json<ChatResponse>> {
    let companion =
        find_companion(&companion_id).ok_or(AppError::NotFound("Companion not found".into()))?;
    body.validate()?;

    if let Some(kind) = screen_message(&body.message) {
        // Message text is not logged
        tracing::warn!(user_id = %auth_user.id, companion_id = %companion.id, ?kind, "Safety script returned");
        return Ok(Json(ChatResponse {
            companion_id: companion.id,
            reply: SAFETY_SCRIPT.to_string(),
            source: ReplySource::Safety,
        }));
    }

    let profile = fetch_profile(&state.db, auth_user.id).await?;

    let (reply, source) = match flows::companion_reply(
        &state.genai,
        companion,
        &profile.name,
        &body.history,
        &body.message,
    )
    .await
    {
        Ok(reply) => (reply, ReplySource::Model),
        Err(e) => {
            tracing::warn!(companion_id = %companion.id, error = %e, "Companion reply unavailable");
            (flows::fallback_reply(companion), ReplySource::Fallback)
        }
    };

    Ok(Json(ChatResponse {
        companion_id: companion.id,
        reply,
        source,
    }))
}
