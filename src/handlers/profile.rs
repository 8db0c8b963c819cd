use axum::{extract::State, Extension, Json};
use serde::Serialize;
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::db::journal::{fetch_profile, load_stats};
use crate::dto::{GenerateAvatarRequest, UpdateProfileRequest};
use crate::error::{AppError, AppResult};
use crate::models::profile::{AvatarKind, Profile, ProfileView};
use crate::services::flows;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct AvatarResponse {
    pub generated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub profile: Profile,
}

/// Trimmed name. Whitespace alone doesn't count as a name.
fn trimmed_name(name: Option<&str>) -> AppResult<Option<&str>> {
    match name.map(str::trim) {
        Some("") => Err(AppError::Validation("Name can't be blank".into())),
        other => Ok(other),
    }
}

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<ProfileView>> {
    let profile = fetch_profile(&state.db, auth_user.id).await?;
    let stats = load_stats(&state.db, auth_user.id).await?;
    Ok(Json(ProfileView::new(profile, &stats)))
}

/// Merge write: only provided fields change.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<UpdateProfileRequest>,
) -> AppResult<Json<ProfileView>> {
    body.validate()?;

    let name = trimmed_name(body.name.as_deref())?;
    let profile = sqlx::query_as::<_, Profile>(
        r#"
        UPDATE profiles SET
            name = COALESCE($2, name),
            avatar = COALESCE($3, avatar),
            avatar_kind = CASE WHEN $3 IS NULL THEN avatar_kind ELSE 'emoji'::avatar_kind END,
            updated_at = NOW()
        WHERE user_id = $1
        RETURNING *
        "#,
    )
    .bind(auth_user.id)
    .bind(name)
    .bind(&body.avatar_emoji)
    .fetch_one(&state.db)
    .await?;

    let stats = load_stats(&state.db, auth_user.id).await?;
    Ok(Json(ProfileView::new(profile, &stats)))
}

/// Generate an avatar image. If the model is unavailable the current avatar is kept.
pub async fn generate_avatar(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<GenerateAvatarRequest>,
) -> AppResult<Json<AvatarResponse>> {
    body.validate()?;

    let image = match flows::generate_avatar(&state.genai, &body.description).await {
        Ok(uri) => uri,
        Err(e) => {
            tracing::warn!(user_id = %auth_user.id, error = %e, "Avatar generation unavailable");
            let profile = fetch_profile(&state.db, auth_user.id).await?;
            return Ok(Json(AvatarResponse {
                generated: false,
                message: Some("Our artist is busy right now. Try again in a little while!".into()),
                profile,
            }));
        }
    };

    let profile = sqlx::query_as::<_, Profile>(
        r#"
        UPDATE profiles SET avatar = $2, avatar_kind = $3, updated_at = NOW()
        WHERE user_id = $1
        RETURNING *
        "#,
    )
    .bind(auth_user.id)
    .bind(&image)
    .bind(AvatarKind::Generated)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(AvatarResponse {
        generated: true,
        message: None,
        profile,
    }))
}
