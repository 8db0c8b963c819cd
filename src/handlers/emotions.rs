use axum::{
    extract::{Path, State},
    Extension, Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::db::guard::{ensure_owned, Collection};
use crate::dto::{validate_color, CreateEmotionRequest, DeleteEmotionResponse, UpdateEmotionRequest};
use crate::error::{AppError, AppResult, Operation};
use crate::models::emotion::{Emotion, DEFAULT_CUSTOM_COLOR, DEFAULT_CUSTOM_ICON};
use crate::services::flows;
use crate::AppState;

pub async fn list_emotions(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<Vec<Emotion>>> {
    let emotions = sqlx::query_as::<_, Emotion>(
        r#"
        SELECT * FROM emotions
        WHERE user_id = $1
        ORDER BY is_custom ASC, created_at ASC
        "#,
    )
    .bind(auth_user.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(emotions))
}

pub async fn get_emotion(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(emotion_id): Path<Uuid>,
) -> AppResult<Json<Emotion>> {
    ensure_owned(&state, auth_user.id, Collection::Emotions, emotion_id, Operation::Get).await?;

    let emotion = sqlx::query_as::<_, Emotion>("SELECT * FROM emotions WHERE id = $1")
        .bind(emotion_id)
        .fetch_one(&state.db)
        .await?;

    Ok(Json(emotion))
}

async fn name_taken(
    state: &AppState,
    user_id: Uuid,
    name: &str,
    except: Option<Uuid>,
) -> AppResult<bool> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM emotions
        WHERE user_id = $1 AND lower(name) = lower($2) AND ($3::uuid IS NULL OR id <> $3)
        "#,
    )
    .bind(user_id)
    .bind(name)
    .bind(except)
    .fetch_one(&state.db)
    .await?;
    Ok(count > 0)
}

/// Ask the model whether `name` is a feeling. A clear "no" blocks the save;
/// an unreachable model lets it through with no description.
async fn checked_description(state: &AppState, name: &str) -> AppResult<String> {
    match flows::check_emotion(&state.genai, name).await {
        Ok(check) if !check.is_emotion => Err(AppError::Validation(format!(
            "Hmm, \"{}\" doesn't look like a feeling. Try another word!",
            name
        ))),
        Ok(check) => Ok(check.description()),
        Err(e) => {
            tracing::warn!(error = %e, "Emotion check unavailable, saving without description");
            Ok(String::new())
        }
    }
}

pub async fn create_emotion(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<CreateEmotionRequest>,
) -> AppResult<Json<Emotion>> {
    body.validate()?;
    validate_color(body.color.as_deref())?;

    let name = body.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Feeling name is required".into()));
    }
    if name_taken(&state, auth_user.id, name, None).await? {
        return Err(AppError::Conflict(format!("You already have a feeling called \"{}\"", name)));
    }

    let description = checked_description(&state, name).await?;

    let emotion = sqlx::query_as::<_, Emotion>(
        r#"
        INSERT INTO emotions (id, user_id, name, icon, color, description, is_custom)
        VALUES ($1, $2, $3, $4, $5, $6, true)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(auth_user.id)
    .bind(name)
    .bind(body.icon.as_deref().unwrap_or(DEFAULT_CUSTOM_ICON))
    .bind(body.color.as_deref().unwrap_or(DEFAULT_CUSTOM_COLOR))
    .bind(&description)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(emotion))
}

pub async fn update_emotion(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(emotion_id): Path<Uuid>,
    Json(body): Json<UpdateEmotionRequest>,
) -> AppResult<Json<Emotion>> {
    body.validate()?;
    validate_color(body.color.as_deref())?;
    ensure_owned(&state, auth_user.id, Collection::Emotions, emotion_id, Operation::Update).await?;

    let existing = sqlx::query_as::<_, Emotion>("SELECT * FROM emotions WHERE id = $1")
        .bind(emotion_id)
        .fetch_one(&state.db)
        .await?;

    let name = body.name.as_deref().map(str::trim).filter(|n| !n.is_empty());
    let mut description = body.description.clone();

    if let Some(name) = name {
        let renamed = !name.eq_ignore_ascii_case(&existing.name);
        if renamed && name_taken(&state, auth_user.id, name, Some(emotion_id)).await? {
            return Err(AppError::Conflict(format!("You already have a feeling called \"{}\"", name)));
        }
        // A renamed custom feeling goes through the same check as a new one
        if renamed && existing.is_custom && description.is_none() {
            let checked = checked_description(&state, name).await?;
            if !checked.is_empty() {
                description = Some(checked);
            }
        }
    }

    let emotion = sqlx::query_as::<_, Emotion>(
        r#"
        UPDATE emotions SET
            name = COALESCE($3, name),
            icon = COALESCE($4, icon),
            color = COALESCE($5, color),
            description = COALESCE($6, description)
        WHERE id = $1 AND user_id = $2
        RETURNING *
        "#,
    )
    .bind(emotion_id)
    .bind(auth_user.id)
    .bind(name)
    .bind(&body.icon)
    .bind(&body.color)
    .bind(&description)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(emotion))
}

/// Delete an emotion and every diary entry tagged with it, atomically.
pub async fn delete_emotion(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(emotion_id): Path<Uuid>,
) -> AppResult<Json<DeleteEmotionResponse>> {
    ensure_owned(&state, auth_user.id, Collection::Emotions, emotion_id, Operation::Delete).await?;

    let mut tx = state.db.begin().await?;

    // Emotion row first: its lock orders this against guarded diary inserts
    let removed = sqlx::query("DELETE FROM emotions WHERE id = $1 AND user_id = $2")
        .bind(emotion_id)
        .bind(auth_user.id)
        .execute(&mut *tx)
        .await?;

    if removed.rows_affected() == 0 {
        return Err(AppError::NotFound("Emotion not found".into()));
    }

    let entries = sqlx::query("DELETE FROM diary_entries WHERE user_id = $1 AND emotion_id = $2")
        .bind(auth_user.id)
        .bind(emotion_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::debug!(
        user_id = %auth_user.id,
        emotion_id = %emotion_id,
        deleted_entries = entries.rows_affected(),
        "Emotion deleted"
    );

    Ok(Json(DeleteEmotionResponse {
        deleted: true,
        id: emotion_id,
        deleted_entries: entries.rows_affected(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::journal::bootstrap_user;
    use chrono::Utc;
    use sqlx::PgPool;

    async fn emotions_of(db: &PgPool, user_id: Uuid) -> Vec<Uuid> {
        sqlx::query_scalar::<_, Uuid>("SELECT id FROM emotions WHERE user_id = $1 ORDER BY name")
            .bind(user_id)
            .fetch_all(db)
            .await
            .unwrap()
    }

    async fn add_entries(db: &PgPool, user_id: Uuid, emotion_id: Uuid, n: usize) {
        for _ in 0..n {
            sqlx::query(
                r#"
                INSERT INTO diary_entries (id, user_id, emotion_id, entry_date, reflection)
                VALUES ($1, $2, $3, $4, '')
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(emotion_id)
            .bind(Utc::now())
            .execute(db)
            .await
            .unwrap();
        }
    }

    async fn entries_for(db: &PgPool, emotion_id: Uuid) -> i64 {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM diary_entries WHERE emotion_id = $1")
            .bind(emotion_id)
            .fetch_one(db)
            .await
            .unwrap()
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_delete_emotion_removes_exactly_its_entries(db: PgPool) {
        let state = AppState::for_tests(db.clone());
        let user_id = Uuid::new_v4();
        bootstrap_user(&db, user_id).await.unwrap();
        let emotions = emotions_of(&db, user_id).await;
        let (doomed, kept) = (emotions[0], emotions[1]);
        add_entries(&db, user_id, doomed, 3).await;
        add_entries(&db, user_id, kept, 2).await;

        let Json(resp) = delete_emotion(
            State(state),
            Extension(AuthUser { id: user_id }),
            Path(doomed),
        )
        .await
        .unwrap();

        assert!(resp.deleted);
        assert_eq!(resp.deleted_entries, 3);
        assert_eq!(entries_for(&db, doomed).await, 0);
        assert_eq!(entries_for(&db, kept).await, 2);
        assert_eq!(emotions_of(&db, user_id).await.len(), emotions.len() - 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_deleting_someone_elses_emotion_is_refused(db: PgPool) {
        let state = AppState::for_tests(db.clone());
        let mut rx = state.events.subscribe();
        let (me, owner) = (Uuid::new_v4(), Uuid::new_v4());
        bootstrap_user(&db, me).await.unwrap();
        bootstrap_user(&db, owner).await.unwrap();
        let target = emotions_of(&db, owner).await[0];
        add_entries(&db, owner, target, 1).await;

        let result = delete_emotion(State(state), Extension(AuthUser { id: me }), Path(target)).await;

        assert!(matches!(result, Err(AppError::Permission(_))));
        assert_eq!(entries_for(&db, target).await, 1);
        assert!(matches!(
            rx.try_recv(),
            Ok(crate::events::AppEvent::PermissionDenied { .. })
        ));
    }
}
